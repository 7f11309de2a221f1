// View models served to the browser
use super::chart::{ChartData, KpiCard};
use super::health::HealthCategory;
use super::map::{MapTrace, MapViewport};
use super::signal::Signal;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ViewKind {
    Dashboard,
    Operations,
    Maintenance,
    HealthMetrics,
    SummaryTrend,
    Map,
    Signals,
}

impl ViewKind {
    pub const ALL: [ViewKind; 7] = [
        ViewKind::Dashboard,
        ViewKind::Operations,
        ViewKind::Maintenance,
        ViewKind::HealthMetrics,
        ViewKind::SummaryTrend,
        ViewKind::Map,
        ViewKind::Signals,
    ];

    pub fn index(self) -> usize {
        self as usize
    }
}

/// Whether a payload came from the metrics API or is placeholder content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DataSource {
    Live,
    Fallback,
}

/// Envelope for every view: the payload plus the flags a client needs to tell
/// a spinner, a live render and a degraded render apart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewState<T> {
    pub kind: ViewKind,
    pub token: u64,
    pub loading: bool,
    pub error: Option<String>,
    pub source: DataSource,
    pub data: T,
}

impl<T> ViewState<T> {
    pub fn live(kind: ViewKind, token: u64, data: T) -> Self {
        Self {
            kind,
            token,
            loading: false,
            error: None,
            source: DataSource::Live,
            data,
        }
    }

    /// Keeps the live source but records a partial failure.
    pub fn with_error(mut self, error: Option<String>) -> Self {
        self.error = error;
        self
    }

    pub fn fallback(kind: ViewKind, token: u64, data: T, error: String) -> Self {
        Self {
            kind,
            token,
            loading: false,
            error: Some(error),
            source: DataSource::Fallback,
            data,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapView {
    pub metric: String,
    pub label: String,
    pub traces: Vec<MapTrace>,
    pub viewport: MapViewport,
    pub source: DataSource,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardView {
    pub title: String,
    pub performance: Vec<KpiCard>,
    pub volumes: Vec<KpiCard>,
    pub map: MapView,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricDetailView {
    pub metric: String,
    pub title: String,
    pub kpi: KpiCard,
    pub by_location: ChartData,
    pub over_time: ChartData,
    pub map: MapView,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthRow {
    pub zone_group: String,
    pub corridor: String,
    pub month: String,
    pub percent_health: String,
    pub missing_data: f64,
    pub scores: Vec<(String, Option<f64>)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RegionAverage {
    pub operations: f64,
    pub maintenance: f64,
    pub safety: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthView {
    pub category: HealthCategory,
    pub title: String,
    pub month: String,
    pub rows: Vec<HealthRow>,
    pub region_average: Option<RegionAverage>,
    pub trend: ChartData,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryTrendView {
    pub performance: Vec<ChartData>,
    pub volumes: Vec<ChartData>,
}

/// One page of the signal inventory after column filters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignalTable {
    pub rows: Vec<Signal>,
    pub total: usize,
    pub page: usize,
    pub per_page: usize,
    pub pages: usize,
}
