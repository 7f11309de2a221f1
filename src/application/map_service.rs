// Map service - Signal inventory plus per-signal metric overlays
use crate::application::map_bucketing::{bucket_points, fallback_traces, join_signals, mappable_points, viewport};
use crate::application::metrics_repository::MetricsRepository;
use crate::domain::filter::FilterState;
use crate::domain::map::{MapRangeConfig, MapViewport};
use crate::domain::signal::Signal;
use crate::domain::view::{DataSource, MapView};
use std::sync::Arc;
use tokio::sync::OnceCell;

pub const SOURCE: &str = "main";

pub struct MapService {
    repository: Arc<dyn MetricsRepository>,
    signals: OnceCell<Vec<Signal>>,
    default_viewport: MapViewport,
}

impl MapService {
    pub fn new(repository: Arc<dyn MetricsRepository>, default_viewport: MapViewport) -> Self {
        Self {
            repository,
            signals: OnceCell::new(),
            default_viewport,
        }
    }

    /// Fetched once per process; a failed fetch is retried on the next call.
    pub async fn signals(&self) -> anyhow::Result<&[Signal]> {
        let signals = self
            .signals
            .get_or_try_init(|| async {
                let signals = self.repository.list_signals().await?;
                tracing::info!("Loaded {} signals", signals.len());
                Ok::<_, anyhow::Error>(signals)
            })
            .await?;
        Ok(signals.as_slice())
    }

    pub async fn build_map(&self, range: &MapRangeConfig, filter: &FilterState) -> MapView {
        let signals = match self.signals().await {
            Ok(signals) => signals,
            Err(e) => {
                tracing::warn!("Failed to load signal inventory: {:#}", e);
                return self.fallback(range, &[], format!("Unable to load signals: {}", e));
            }
        };

        let records = match self
            .repository
            .signals_filter_average(SOURCE, range.field, filter)
            .await
        {
            Ok(records) => records,
            Err(e) => {
                tracing::warn!("Failed to load map data for {}: {:#}", range.field, e);
                return self.fallback(range, signals, format!("Unable to load {} map data: {}", range.label, e));
            }
        };

        let points = join_signals(signals, &records);
        MapView {
            metric: range.key.to_string(),
            label: range.label.to_string(),
            traces: bucket_points(&points, range),
            viewport: viewport(&points, self.default_viewport),
            source: DataSource::Live,
            error: None,
        }
    }

    fn fallback(&self, range: &MapRangeConfig, signals: &[Signal], error: String) -> MapView {
        let points = mappable_points(signals);
        MapView {
            metric: range.key.to_string(),
            label: range.label.to_string(),
            traces: fallback_traces(&points),
            viewport: viewport(&points, self.default_viewport),
            source: DataSource::Fallback,
            error: Some(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::fake_repository::FakeRepository;
    use crate::domain::map::find_range;
    use crate::domain::metric::MetricRecord;

    const DEFAULT: MapViewport = MapViewport {
        center_lat: 33.757776,
        center_lon: -84.391578,
        zoom: 12.0,
    };

    fn repo_with_signals() -> FakeRepository {
        let mut repo = FakeRepository::default();
        repo.signals = vec![Signal::new("1", 33.8, -84.4), Signal::new("2", 33.9, -84.3)];
        repo
    }

    #[tokio::test]
    async fn test_signal_inventory_is_fetched_once() {
        let repo = Arc::new(repo_with_signals());
        let service = MapService::new(repo.clone(), DEFAULT);
        let range = find_range("cctvUptime").unwrap();

        service.build_map(range, &FilterState::default()).await;
        service.build_map(range, &FilterState::default()).await;

        assert_eq!(repo.calls_to("signals").len(), 1);
        assert_eq!(repo.calls_to("signalsaverage").len(), 2);
    }

    #[tokio::test]
    async fn test_failed_inventory_is_not_cached() {
        let repo = Arc::new(FakeRepository::default().fail("signals"));
        let service = MapService::new(repo.clone(), DEFAULT);
        let range = find_range("cctvUptime").unwrap();

        let map = service.build_map(range, &FilterState::default()).await;
        assert_eq!(map.source, DataSource::Fallback);
        assert!(map.traces.is_empty());
        assert_eq!(map.viewport, DEFAULT);

        service.build_map(range, &FilterState::default()).await;
        assert_eq!(repo.calls_to("signals").len(), 2);
    }

    #[tokio::test]
    async fn test_live_map_buckets_values() {
        let mut repo = repo_with_signals();
        repo.signals.push(Signal::new("3", 31.0, -81.0));
        repo.signal_averages.insert(
            "vpd".to_string(),
            vec![MetricRecord::new("1", 15000.0), MetricRecord::new("2", 45000.0)],
        );
        let service = MapService::new(Arc::new(repo), DEFAULT);

        let map = service
            .build_map(find_range("dailyTrafficVolume").unwrap(), &FilterState::default())
            .await;

        assert_eq!(map.source, DataSource::Live);
        let names: Vec<&str> = map.traces.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["10,001 - 20,000 vpd", "40,001+ vpd"]);
        assert_eq!(map.traces.iter().map(|t| t.len()).sum::<usize>(), 2);
        assert!((map.viewport.center_lat - 33.85).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_metric_failure_returns_flagged_fallback() {
        let repo = repo_with_signals().fail("signalsaverage");
        let service = MapService::new(Arc::new(repo), DEFAULT);

        let map = service
            .build_map(find_range("detectorUptime").unwrap(), &FilterState::default())
            .await;

        assert_eq!(map.source, DataSource::Fallback);
        assert!(map.error.is_some());
        assert_eq!(map.traces.len(), 1);
        assert_eq!(map.traces[0].name, "No data");
        assert_eq!(map.traces[0].len(), 2);
    }
}
