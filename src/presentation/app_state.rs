// Application state for HTTP handlers
use crate::application::dashboard_service::DashboardService;
use crate::application::filter_cascade::{AppliedFilter, FilterCascade};
use crate::application::filter_defaults::FilterDefaultsStore;
use crate::application::health_service::HealthService;
use crate::application::map_service::MapService;
use crate::application::metric_detail_service::MetricDetailService;
use crate::application::metrics_repository::MetricsRepository;
use crate::application::signal_inventory::SignalInventoryService;
use crate::application::summary_trend_service::SummaryTrendService;
use crate::application::view_registry::{RequestTokens, ViewSlot};
use crate::domain::filter::FilterState;
use crate::domain::view::{
    DashboardView, HealthView, MapView, MetricDetailView, SignalTable, SummaryTrendView, ViewKind,
};
use crate::infrastructure::config::AppSettings;
use std::sync::Arc;
use tokio::sync::{watch, RwLock};

/// Latest committed result per view.
pub struct ViewSlots {
    pub dashboard: ViewSlot<DashboardView>,
    pub operations: ViewSlot<MetricDetailView>,
    pub maintenance: ViewSlot<MetricDetailView>,
    pub health: ViewSlot<HealthView>,
    pub summary_trend: ViewSlot<SummaryTrendView>,
    pub map: ViewSlot<MapView>,
    pub signals: ViewSlot<SignalTable>,
}

impl ViewSlots {
    fn new(tokens: Arc<RequestTokens>) -> Self {
        Self {
            dashboard: ViewSlot::new(ViewKind::Dashboard, tokens.clone()),
            operations: ViewSlot::new(ViewKind::Operations, tokens.clone()),
            maintenance: ViewSlot::new(ViewKind::Maintenance, tokens.clone()),
            health: ViewSlot::new(ViewKind::HealthMetrics, tokens.clone()),
            summary_trend: ViewSlot::new(ViewKind::SummaryTrend, tokens.clone()),
            map: ViewSlot::new(ViewKind::Map, tokens.clone()),
            signals: ViewSlot::new(ViewKind::Signals, tokens),
        }
    }
}

pub struct AppState {
    pub settings: AppSettings,
    pub cascade: RwLock<FilterCascade>,
    applied: watch::Receiver<AppliedFilter>,
    pub map_service: Arc<MapService>,
    pub dashboard_service: DashboardService,
    pub metric_detail_service: MetricDetailService,
    pub health_service: HealthService,
    pub summary_trend_service: SummaryTrendService,
    pub signal_inventory_service: SignalInventoryService,
    pub views: ViewSlots,
}

impl AppState {
    pub fn new(
        settings: AppSettings,
        repository: Arc<dyn MetricsRepository>,
        defaults_store: Arc<dyn FilterDefaultsStore>,
    ) -> Self {
        let cascade = FilterCascade::new(
            repository.clone(),
            defaults_store,
            settings.filters.default_filter(),
        );
        let applied = cascade.subscribe();

        let map_service = Arc::new(MapService::new(
            repository.clone(),
            settings.map.default_viewport(),
        ));

        Self {
            dashboard_service: DashboardService::new(repository.clone(), map_service.clone()),
            metric_detail_service: MetricDetailService::new(repository.clone(), map_service.clone()),
            health_service: HealthService::new(repository.clone()),
            summary_trend_service: SummaryTrendService::new(repository, settings.goals),
            signal_inventory_service: SignalInventoryService::new(map_service.clone()),
            views: ViewSlots::new(Arc::new(RequestTokens::default())),
            map_service,
            cascade: RwLock::new(cascade),
            applied,
            settings,
        }
    }

    /// The filter views query with. Changes only on apply.
    pub fn applied_filter(&self) -> FilterState {
        self.applied.borrow().filter.clone()
    }
}
