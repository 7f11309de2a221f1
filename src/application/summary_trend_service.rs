// Summary trend service - One monthly trend chart per KPI
use crate::application::metric_detail_service::month_label;
use crate::application::metrics_repository::MetricsRepository;
use crate::domain::chart::{ChartData, ChartKind, SeriesData, SeriesPoint};
use crate::domain::filter::FilterState;
use crate::domain::measure::{self, hourly_variant, FormatType, PERFORMANCE_MEASURES, VOLUME_MEASURES};
use crate::domain::metric::SummaryTrends;
use crate::domain::view::{SummaryTrendView, ViewKind, ViewState};
use crate::infrastructure::config::Goals;
use std::sync::Arc;

const LINE_COLOR: &str = "#1e88e5";

#[derive(Clone)]
pub struct SummaryTrendService {
    repository: Arc<dyn MetricsRepository>,
    goals: Goals,
}

impl SummaryTrendService {
    pub fn new(repository: Arc<dyn MetricsRepository>, goals: Goals) -> Self {
        Self { repository, goals }
    }

    pub async fn get_trends(&self, token: u64, filter: &FilterState) -> ViewState<SummaryTrendView> {
        let hourly = filter.aggregation.is_sub_daily();

        let (trends, error) = match self.repository.summary_trends(filter).await {
            Ok(trends) => (trends, None),
            Err(e) => {
                tracing::warn!("Error fetching summary trends: {:#}", e);
                (SummaryTrends::new(), Some("Unable to load summary trends".to_string()))
            }
        };

        let charts = |codes: &[&'static str]| -> Vec<ChartData> {
            codes
                .iter()
                .map(|&code| if hourly { hourly_variant(code) } else { code })
                .filter_map(|code| self.trend_chart(code, &trends))
                .collect()
        };
        let view = SummaryTrendView {
            performance: charts(&PERFORMANCE_MEASURES),
            volumes: charts(&VOLUME_MEASURES),
        };

        match error {
            Some(error) => ViewState::fallback(ViewKind::SummaryTrend, token, view, error),
            None => ViewState::live(ViewKind::SummaryTrend, token, view),
        }
    }

    fn trend_chart(&self, code: &str, trends: &SummaryTrends) -> Option<ChartData> {
        let measure = measure::find(code)?;
        let points = trends
            .get(code)
            .map(|months| {
                months
                    .iter()
                    .filter_map(|m| {
                        let average = m.average.filter(|v| v.is_finite())?;
                        Some(SeriesPoint::new(month_label(&m.month), average))
                    })
                    .collect()
            })
            .unwrap_or_default();

        let mut chart = ChartData::new(
            code.to_string(),
            measure.label.to_string(),
            ChartKind::Line,
            vec![SeriesData::new(measure.label.to_string(), Some(LINE_COLOR.to_string()), points)],
        );
        chart.unit = Some(measure.unit.to_string()).filter(|u| !u.is_empty());
        chart.percent = measure.format_type == FormatType::Percent;
        chart.goal = measure.goal.map(|goal| self.goals.value(goal));
        Some(chart)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::fake_repository::FakeRepository;
    use crate::domain::filter::Aggregation;
    use crate::domain::metric::MonthlyAverage;
    use crate::domain::view::DataSource;

    fn month(month: &str, average: Option<f64>) -> MonthlyAverage {
        MonthlyAverage {
            month: month.to_string(),
            average,
        }
    }

    #[tokio::test]
    async fn test_one_chart_per_measure_with_goals() {
        let mut repo = FakeRepository::default();
        repo.trends.insert(
            "tti".to_string(),
            vec![month("2024-01-01", Some(1.21)), month("2024-02-01", None)],
        );
        let service = SummaryTrendService::new(Arc::new(repo), Goals::default());

        let view = service.get_trends(4, &FilterState::default()).await;

        assert_eq!(view.source, DataSource::Live);
        assert_eq!(view.data.performance.len(), 8);
        assert_eq!(view.data.volumes.len(), 8);

        let tti = view.data.performance.iter().find(|c| c.id == "tti").unwrap();
        assert_eq!(tti.goal, Some(1.2));
        assert_eq!(tti.series[0].points.len(), 1);
        assert_eq!(tti.series[0].points[0].x, "Jan 2024");

        let cu = view.data.volumes.iter().find(|c| c.id == "cu").unwrap();
        assert_eq!(cu.goal, Some(0.95));
        assert!(cu.percent);
        assert!(cu.is_empty());
    }

    #[tokio::test]
    async fn test_hourly_codes_for_sub_daily_aggregation() {
        let service = SummaryTrendService::new(Arc::new(FakeRepository::default()), Goals::default());
        let mut filter = FilterState::default();
        filter.aggregation = Aggregation::Hourly;

        let view = service.get_trends(1, &filter).await;

        let ids: Vec<&str> = view.data.performance.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["tp", "aogh", "prh", "qsh", "sfh", "sfo", "tti", "pti"]);
    }

    #[tokio::test]
    async fn test_failure_is_flagged() {
        let repo = FakeRepository::default().fail("summarytrends");
        let service = SummaryTrendService::new(Arc::new(repo), Goals::default());

        let view = service.get_trends(1, &FilterState::default()).await;

        assert_eq!(view.source, DataSource::Fallback);
        assert!(view.error.is_some());
        assert!(view.data.performance.iter().all(|c| c.is_empty()));
    }
}
