// Dashboard service - Use case for building the KPI dashboard
use crate::application::map_service::{MapService, SOURCE};
use crate::application::metrics_repository::MetricsRepository;
use crate::domain::chart::KpiCard;
use crate::domain::filter::FilterState;
use crate::domain::map::MapRangeConfig;
use crate::domain::measure::{self, hourly_variant, NOT_AVAILABLE, PERFORMANCE_MEASURES, VOLUME_MEASURES};
use crate::domain::view::{DashboardView, DataSource, ViewKind, ViewState};
use futures::future::join_all;
use std::sync::Arc;

#[derive(Clone)]
pub struct DashboardService {
    repository: Arc<dyn MetricsRepository>,
    map_service: Arc<MapService>,
}

impl DashboardService {
    pub fn new(repository: Arc<dyn MetricsRepository>, map_service: Arc<MapService>) -> Self {
        Self {
            repository,
            map_service,
        }
    }

    pub async fn get_dashboard(
        &self,
        token: u64,
        filter: &FilterState,
        map_range: &MapRangeConfig,
    ) -> ViewState<DashboardView> {
        let hourly = filter.aggregation.is_sub_daily();
        let codes = |codes: &[&'static str]| -> Vec<&'static str> {
            codes
                .iter()
                .map(|&code| if hourly { hourly_variant(code) } else { code })
                .collect()
        };
        let performance_codes = codes(&PERFORMANCE_MEASURES);
        let volume_codes = codes(&VOLUME_MEASURES);

        let (performance, volumes, map) = futures::join!(
            self.fetch_kpis(&performance_codes, filter),
            self.fetch_kpis(&volume_codes, filter),
            self.map_service.build_map(map_range, filter),
        );

        let failed = performance
            .iter()
            .chain(volumes.iter())
            .filter(|card| card.error.is_some())
            .count();
        let total = performance.len() + volumes.len();
        let error = performance
            .iter()
            .chain(volumes.iter())
            .find_map(|card| card.error.clone())
            .or_else(|| map.error.clone());

        let all_failed = failed == total && map.source == DataSource::Fallback;
        let view = DashboardView {
            title: dashboard_title(filter),
            performance,
            volumes,
            map,
        };

        match error {
            Some(error) if all_failed => ViewState::fallback(ViewKind::Dashboard, token, view, error),
            error => ViewState::live(ViewKind::Dashboard, token, view).with_error(error),
        }
    }

    async fn fetch_kpis(&self, codes: &[&'static str], filter: &FilterState) -> Vec<KpiCard> {
        join_all(codes.iter().map(|&code| self.fetch_kpi(code, filter))).await
    }

    async fn fetch_kpi(&self, code: &'static str, filter: &FilterState) -> KpiCard {
        let Some(measure) = measure::find(code) else {
            tracing::warn!("No catalogue entry for measure {}", code);
            let mut card = KpiCard::new(code.into(), code.into(), String::new(), NOT_AVAILABLE.into(), None);
            card.error = Some(format!("Unknown measure {}", code));
            return card;
        };

        let mut card = KpiCard::new(
            measure.code.to_string(),
            measure.label.to_string(),
            measure.unit.to_string(),
            NOT_AVAILABLE.to_string(),
            None,
        );

        match self.repository.straight_average(SOURCE, code, filter).await {
            Ok(average) => {
                card.value = measure.format(average.avg);
                card.raw = average.avg;
                card.delta = average.delta;
            }
            Err(e) => {
                tracing::warn!("Error fetching KPI {}: {:#}", code, e);
                card.error = Some(format!("Unable to load {}", measure.label));
            }
        }
        card
    }
}

fn dashboard_title(filter: &FilterState) -> String {
    match (&filter.signal_id, &filter.zone_group) {
        (Some(signal), _) => format!("Signal {}", signal),
        (None, Some(zone_group)) => zone_group.clone(),
        (None, None) => "All Regions".to_string(),
    }
}
