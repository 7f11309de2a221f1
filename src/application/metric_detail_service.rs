// Metric detail service - KPI, location bars, corridor trends and map for one metric
use crate::application::map_service::{MapService, SOURCE};
use crate::application::metrics_repository::MetricsRepository;
use crate::domain::chart::{ChartData, ChartKind, KpiCard, SeriesData, SeriesPoint};
use crate::domain::filter::FilterState;
use crate::domain::map::MapRangeConfig;
use crate::domain::measure::{self, format_value, FormatType, NOT_AVAILABLE};
use crate::domain::metric::{MetricRecord, TimeSeriesRow};
use crate::domain::view::{DataSource, MetricDetailView, ViewKind, ViewState};
use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::sync::Arc;

const BAR_COLOR: &str = "#0070ed";

#[derive(Clone)]
pub struct MetricDetailService {
    repository: Arc<dyn MetricsRepository>,
    map_service: Arc<MapService>,
}

impl MetricDetailService {
    pub fn new(repository: Arc<dyn MetricsRepository>, map_service: Arc<MapService>) -> Self {
        Self {
            repository,
            map_service,
        }
    }

    pub async fn get_metric(
        &self,
        kind: ViewKind,
        token: u64,
        range: &MapRangeConfig,
        filter: &FilterState,
    ) -> ViewState<MetricDetailView> {
        let code = range.field;
        let percent = range.format_type == FormatType::Percent;

        let (kpi, locations, series, map) = futures::join!(
            self.repository.straight_average(SOURCE, code, filter),
            self.repository.metrics_average(SOURCE, code, false, filter),
            self.repository.metrics_filter(SOURCE, code, filter),
            self.map_service.build_map(range, filter),
        );

        let mut errors = Vec::new();

        let kpi = match kpi {
            Ok(average) => {
                let mut card = kpi_card(range, average.avg);
                card.delta = average.delta;
                card
            }
            Err(e) => {
                tracing::warn!("Error fetching {} average: {:#}", code, e);
                errors.push(format!("Unable to load {} average", range.label));
                let mut card = kpi_card(range, None);
                card.error = Some(format!("Unable to load {}", range.label));
                card
            }
        };

        let locations = locations.unwrap_or_else(|e| {
            tracing::warn!("Error fetching {} by location: {:#}", code, e);
            errors.push(format!("Unable to load {} by location", range.label));
            Vec::new()
        });
        let series = series.unwrap_or_else(|e| {
            tracing::warn!("Error fetching {} over time: {:#}", code, e);
            errors.push(format!("Unable to load {} over time", range.label));
            Vec::new()
        });
        if let Some(error) = &map.error {
            errors.push(error.clone());
        }

        let mut by_location = location_chart(range, &locations);
        by_location.percent = percent;
        let mut over_time = trend_chart(range, &series);
        over_time.percent = percent;

        let nothing_live = kpi.error.is_some()
            && by_location.is_empty()
            && over_time.is_empty()
            && map.source == DataSource::Fallback;
        let view = MetricDetailView {
            metric: range.key.to_string(),
            title: range.label.to_string(),
            kpi,
            by_location,
            over_time,
            map,
        };

        match errors.into_iter().next() {
            Some(error) if nothing_live => ViewState::fallback(kind, token, view, error),
            error => ViewState::live(kind, token, view).with_error(error),
        }
    }
}

fn kpi_card(range: &MapRangeConfig, value: Option<f64>) -> KpiCard {
    let (label, unit) = measure::find(range.field)
        .map(|m| (m.label, m.unit))
        .unwrap_or((range.label, ""));
    let formatted = match value {
        Some(v) if v.is_finite() => format_value(v, range.format_type, range.decimals),
        _ => NOT_AVAILABLE.to_string(),
    };
    KpiCard::new(range.field.to_string(), label.to_string(), unit.to_string(), formatted, value)
}

/// Percent feeds occasionally report 0-100 instead of a fraction.
fn normalise(range: &MapRangeConfig, value: f64) -> f64 {
    if range.format_type == FormatType::Percent && value > 1.0 {
        value / 100.0
    } else {
        value
    }
}

fn location_chart(range: &MapRangeConfig, records: &[MetricRecord]) -> ChartData {
    let points = records
        .iter()
        .filter_map(|r| {
            let avg = r.avg.filter(|v| v.is_finite())?;
            Some(SeriesPoint::new(r.label.clone(), normalise(range, avg)))
        })
        .collect();

    ChartData::new(
        format!("{}-by-location", range.key),
        range.label.to_string(),
        ChartKind::HorizontalBar,
        vec![SeriesData::new(range.label.to_string(), Some(BAR_COLOR.to_string()), points)],
    )
}

/// One line per corridor, months in ascending order.
fn trend_chart(range: &MapRangeConfig, rows: &[TimeSeriesRow]) -> ChartData {
    let mut by_corridor: BTreeMap<&str, Vec<(String, SeriesPoint)>> = BTreeMap::new();
    for row in rows {
        let Some(value) = row.value_for(range.field).filter(|v| v.is_finite()) else {
            continue;
        };
        by_corridor
            .entry(row.corridor.as_str())
            .or_default()
            .push((row.month.clone(), SeriesPoint::new(month_label(&row.month), normalise(range, value))));
    }

    let series = by_corridor
        .into_iter()
        .map(|(corridor, mut points)| {
            points.sort_by(|a, b| a.0.cmp(&b.0));
            SeriesData::new(
                corridor.to_string(),
                None,
                points.into_iter().map(|(_, point)| point).collect(),
            )
        })
        .collect();

    ChartData::new(
        format!("{}-over-time", range.key),
        range.label.to_string(),
        ChartKind::Line,
        series,
    )
}

/// "2024-01-01T00:00:00" becomes "Jan 2024"; anything unparseable is kept.
pub fn month_label(month: &str) -> String {
    month
        .get(..10)
        .and_then(|date| NaiveDate::parse_from_str(date, "%Y-%m-%d").ok())
        .map(|date| date.format("%b %Y").to_string())
        .unwrap_or_else(|| month.to_string())
}
