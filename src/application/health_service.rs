// Health service - Corridor health tables, trend and region averages
use crate::application::map_service::SOURCE;
use crate::application::metric_detail_service::month_label;
use crate::application::metrics_repository::{HealthQuery, MetricsRepository};
use crate::domain::chart::{ChartData, ChartKind, SeriesData, SeriesPoint};
use crate::domain::filter::FilterState;
use crate::domain::health::{month_average_percent, HealthCategory};
use crate::domain::metric::{value_as_f64, HealthMetricRow, TimeSeriesRow};
use crate::domain::view::{HealthRow, HealthView, RegionAverage, ViewKind, ViewState};
use chrono::{Datelike, Local, Months, NaiveDate};
use std::collections::BTreeMap;
use std::sync::Arc;

const LEVEL: &str = "cor";
const INTERVAL: &str = "mo";
const PERCENT_HEALTH: &str = "percent Health";

#[derive(Clone)]
pub struct HealthService {
    repository: Arc<dyn MetricsRepository>,
}

impl HealthService {
    pub fn new(repository: Arc<dyn MetricsRepository>) -> Self {
        Self { repository }
    }

    pub async fn get_health(
        &self,
        token: u64,
        category: HealthCategory,
        month: NaiveDate,
        filter: &FilterState,
    ) -> ViewState<HealthView> {
        let month = first_of_month(month);
        let next = month.checked_add_months(Months::new(1)).unwrap_or(month);
        let query = HealthQuery {
            source: SOURCE.to_string(),
            level: LEVEL.to_string(),
            interval: INTERVAL.to_string(),
            measure: category.table_measure().to_string(),
            start: month.format("%Y-%m-%d").to_string(),
            end: next.format("%Y-%m-%d").to_string(),
        };

        let (rows, trend, region) = futures::join!(
            self.repository.health_metrics(&query),
            self.repository.metrics_filter(SOURCE, category.plot_measure(), filter),
            self.region_average(month, filter),
        );

        let mut errors = Vec::new();

        let rows = match rows {
            Ok(rows) => rows
                .iter()
                .filter(|row| in_scope(row, filter))
                .map(|row| health_row(row, category))
                .collect(),
            Err(e) => {
                tracing::warn!("Error fetching {} health: {:#}", category, e);
                errors.push(format!("Unable to load {}", category.title()));
                Vec::new()
            }
        };

        let trend = match trend {
            Ok(series) => trend_chart(category, &series),
            Err(e) => {
                tracing::warn!("Error fetching {} health trend: {:#}", category, e);
                errors.push(format!("Unable to load {} trend", category.title()));
                trend_chart(category, &[])
            }
        };

        let region_average = match region {
            Ok(region) => region,
            Err(e) => {
                tracing::warn!("Error fetching region averages: {:#}", e);
                errors.push("Unable to load region averages".to_string());
                None
            }
        };

        let nothing_live = rows.is_empty() && trend.is_empty() && region_average.is_none() && !errors.is_empty();
        let view = HealthView {
            category,
            title: category.title().to_string(),
            month: month.format("%Y-%m").to_string(),
            rows,
            region_average,
            trend,
        };

        match errors.into_iter().next() {
            Some(error) if nothing_live => ViewState::fallback(ViewKind::HealthMetrics, token, view, error),
            error => ViewState::live(ViewKind::HealthMetrics, token, view).with_error(error),
        }
    }

    /// Operations, maintenance and safety for the selected zone group, as
    /// percentages. `None` when no zone group is selected.
    async fn region_average(
        &self,
        month: NaiveDate,
        filter: &FilterState,
    ) -> anyhow::Result<Option<RegionAverage>> {
        let Some(zone_group) = filter.zone_group.as_deref() else {
            return Ok(None);
        };

        let values = self
            .repository
            .month_averages(zone_group, &month.format("%m-01-%Y").to_string())
            .await?;

        match values.as_slice() {
            [operations, maintenance, safety, ..] => Ok(Some(RegionAverage {
                operations: month_average_percent(*operations),
                maintenance: month_average_percent(*maintenance),
                safety: month_average_percent(*safety),
            })),
            other => anyhow::bail!("expected three month averages, got {}", other.len()),
        }
    }
}

fn in_scope(row: &HealthMetricRow, filter: &FilterState) -> bool {
    let matches = |selected: &Option<String>, value: &str| selected.as_deref().is_none_or(|s| s == value);
    matches(&filter.zone_group, &row.zone_group) && matches(&filter.corridor, &row.corridor)
}

fn health_row(row: &HealthMetricRow, category: HealthCategory) -> HealthRow {
    HealthRow {
        zone_group: row.zone_group.clone(),
        corridor: row.corridor.clone(),
        month: row.month.clone(),
        percent_health: format!("{:.2}%", row.percent_health.unwrap_or(0.0) * 100.0),
        missing_data: row.missing_data.unwrap_or(0.0),
        scores: category
            .score_columns()
            .iter()
            .map(|column| (column.to_string(), row.column(column)))
            .collect(),
    }
}

/// Percent health per zone group (or corridor) per month; duplicate months
/// are averaged.
fn trend_chart(category: HealthCategory, rows: &[TimeSeriesRow]) -> ChartData {
    let mut groups: BTreeMap<String, BTreeMap<String, (f64, u32)>> = BTreeMap::new();
    for row in rows {
        let Some(value) = row.columns.get(PERCENT_HEALTH).and_then(value_as_f64) else {
            continue;
        };
        let group = row
            .zone_group
            .clone()
            .filter(|g| !g.is_empty())
            .or_else(|| Some(row.corridor.clone()).filter(|c| !c.is_empty()))
            .unwrap_or_else(|| "Unknown".to_string());
        let month_key = row.month.get(..7).unwrap_or(row.month.as_str()).to_string();

        let entry = groups.entry(group).or_default().entry(month_key).or_insert((0.0, 0));
        entry.0 += value;
        entry.1 += 1;
    }

    let series = groups
        .into_iter()
        .map(|(group, months)| {
            let points = months
                .into_iter()
                .map(|(month, (sum, count))| SeriesPoint::new(month_label(&format!("{}-01", month)), sum / count as f64))
                .collect();
            SeriesData::new(group, None, points)
        })
        .collect();

    let mut chart = ChartData::new(
        format!("{}-health-trend", category),
        format!("{} Metrics", category.title()),
        ChartKind::Line,
        series,
    );
    chart.percent = true;
    chart
}

fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// Accepts `YYYY-MM` or a full `YYYY-MM-DD`.
pub fn parse_month(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(&format!("{}-01", value.trim()), "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d"))
        .ok()
        .map(first_of_month)
}

/// The most recent complete month.
pub fn previous_month() -> NaiveDate {
    let today = first_of_month(Local::now().date_naive());
    today.checked_sub_months(Months::new(1)).unwrap_or(today)
}
