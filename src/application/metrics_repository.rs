// Repository trait for the remote signal and metrics API
use crate::domain::filter::{CorridorQuery, FilterState};
use crate::domain::metric::{HealthMetricRow, MetricRecord, StraightAverage, SummaryTrends, TimeSeriesRow};
use crate::domain::signal::Signal;
use async_trait::async_trait;
use serde::Serialize;

/// Dropdown lists served under `GET /signals/{list}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum OptionList {
    ZoneGroups,
    Zones,
    Agencies,
    Counties,
    Cities,
    Corridors,
    Subcorridors,
    Priorities,
    Classifications,
}

impl OptionList {
    pub const ALL: [OptionList; 9] = [
        OptionList::ZoneGroups,
        OptionList::Zones,
        OptionList::Agencies,
        OptionList::Counties,
        OptionList::Cities,
        OptionList::Corridors,
        OptionList::Subcorridors,
        OptionList::Priorities,
        OptionList::Classifications,
    ];

    pub fn path(self) -> &'static str {
        match self {
            OptionList::ZoneGroups => "zonegroups",
            OptionList::Zones => "zones",
            OptionList::Agencies => "agencies",
            OptionList::Counties => "counties",
            OptionList::Cities => "cities",
            OptionList::Corridors => "corridors",
            OptionList::Subcorridors => "subcorridors",
            OptionList::Priorities => "priorities",
            OptionList::Classifications => "classifications",
        }
    }
}

/// Parameters of the corridor-level health table (`GET /metrics`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthQuery {
    pub source: String,
    pub level: String,
    pub interval: String,
    pub measure: String,
    pub start: String,
    pub end: String,
}

#[async_trait]
pub trait MetricsRepository: Send + Sync {
    /// Full signal inventory
    async fn list_signals(&self) -> anyhow::Result<Vec<Signal>>;

    /// Unscoped dropdown values
    async fn list_options(&self, list: OptionList) -> anyhow::Result<Vec<String>>;

    async fn zones_by_zone_group(&self, zone_group: &str) -> anyhow::Result<Vec<String>>;

    async fn corridors_by_filter(&self, query: &CorridorQuery) -> anyhow::Result<Vec<String>>;

    async fn subcorridors_by_corridor(&self, corridor: &str) -> anyhow::Result<Vec<String>>;

    /// Time series per location (`POST /metrics/filter`)
    async fn metrics_filter(
        &self,
        source: &str,
        measure: &str,
        filter: &FilterState,
    ) -> anyhow::Result<Vec<TimeSeriesRow>>;

    /// Per-location averages (`POST /metrics/average`)
    async fn metrics_average(
        &self,
        source: &str,
        measure: &str,
        dashboard: bool,
        filter: &FilterState,
    ) -> anyhow::Result<Vec<MetricRecord>>;

    /// Single scalar plus delta (`POST /metrics/straightaverage`)
    async fn straight_average(
        &self,
        source: &str,
        measure: &str,
        filter: &FilterState,
    ) -> anyhow::Result<StraightAverage>;

    /// Per-signal averages (`POST /metrics/signals/filter/average`)
    async fn signals_filter_average(
        &self,
        source: &str,
        measure: &str,
        filter: &FilterState,
    ) -> anyhow::Result<Vec<MetricRecord>>;

    /// Multi-metric monthly series (`POST /metrics/summarytrends`)
    async fn summary_trends(&self, filter: &FilterState) -> anyhow::Result<SummaryTrends>;

    /// Operations, maintenance and safety health for a zone group and month
    async fn month_averages(&self, zone_group: &str, month: &str) -> anyhow::Result<Vec<f64>>;

    async fn health_metrics(&self, query: &HealthQuery) -> anyhow::Result<Vec<HealthMetricRow>>;
}
