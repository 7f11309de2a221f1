// In-memory repository for service tests
use crate::application::metrics_repository::{HealthQuery, MetricsRepository, OptionList};
use crate::domain::filter::{CorridorQuery, FilterState};
use crate::domain::metric::{HealthMetricRow, MetricRecord, StraightAverage, SummaryTrends, TimeSeriesRow};
use crate::domain::signal::Signal;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

#[derive(Default)]
pub struct FakeRepository {
    pub signals: Vec<Signal>,
    pub options: HashMap<OptionList, Vec<String>>,
    pub zones_by_group: HashMap<String, Vec<String>>,
    pub corridors_by_filter: Vec<String>,
    pub subcorridors_by_corridor: HashMap<String, Vec<String>>,
    pub straight_averages: HashMap<String, StraightAverage>,
    pub location_averages: Vec<MetricRecord>,
    pub signal_averages: HashMap<String, Vec<MetricRecord>>,
    pub series: Vec<TimeSeriesRow>,
    pub trends: SummaryTrends,
    pub month_averages: Vec<f64>,
    pub health_rows: Vec<HealthMetricRow>,
    /// Endpoint names (or `name:arg`) that return an error.
    pub failing: HashSet<String>,
    calls: Mutex<Vec<String>>,
    /// Zone group of the filter each POST endpoint was called with.
    sent_zone_groups: Mutex<Vec<(String, Option<String>)>>,
}

impl FakeRepository {
    pub fn fail(mut self, endpoint: &str) -> Self {
        self.failing.insert(endpoint.to_string());
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, endpoint: &str) -> Vec<String> {
        let prefix = format!("{}:", endpoint);
        self.calls()
            .into_iter()
            .filter(|c| c.starts_with(&prefix))
            .collect()
    }

    pub fn zone_groups_sent(&self, endpoint: &str) -> Vec<Option<String>> {
        self.sent_zone_groups
            .lock()
            .unwrap()
            .iter()
            .filter(|(e, _)| e == endpoint)
            .map(|(_, group)| group.clone())
            .collect()
    }

    fn record_post(&self, endpoint: &str, arg: &str, filter: &FilterState) -> anyhow::Result<()> {
        self.sent_zone_groups
            .lock()
            .unwrap()
            .push((endpoint.to_string(), filter.zone_group.clone()));
        self.record(endpoint, arg)
    }

    fn record(&self, endpoint: &str, arg: &str) -> anyhow::Result<()> {
        let call = format!("{}:{}", endpoint, arg);
        self.calls.lock().unwrap().push(call.clone());
        if self.failing.contains(endpoint) || self.failing.contains(&call) {
            anyhow::bail!("{} unavailable", call);
        }
        Ok(())
    }
}

#[async_trait]
impl MetricsRepository for FakeRepository {
    async fn list_signals(&self) -> anyhow::Result<Vec<Signal>> {
        self.record("signals", "all")?;
        Ok(self.signals.clone())
    }

    async fn list_options(&self, list: OptionList) -> anyhow::Result<Vec<String>> {
        self.record("options", list.path())?;
        Ok(self.options.get(&list).cloned().unwrap_or_default())
    }

    async fn zones_by_zone_group(&self, zone_group: &str) -> anyhow::Result<Vec<String>> {
        self.record("zonesbyzonegroup", zone_group)?;
        Ok(self.zones_by_group.get(zone_group).cloned().unwrap_or_default())
    }

    async fn corridors_by_filter(&self, query: &CorridorQuery) -> anyhow::Result<Vec<String>> {
        self.record("corridorsbyfilter", &query.to_query_string())?;
        Ok(self.corridors_by_filter.clone())
    }

    async fn subcorridors_by_corridor(&self, corridor: &str) -> anyhow::Result<Vec<String>> {
        self.record("subcorridorsbycorridor", corridor)?;
        Ok(self
            .subcorridors_by_corridor
            .get(corridor)
            .cloned()
            .unwrap_or_default())
    }

    async fn metrics_filter(
        &self,
        _source: &str,
        measure: &str,
        filter: &FilterState,
    ) -> anyhow::Result<Vec<TimeSeriesRow>> {
        self.record_post("filter", measure, filter)?;
        Ok(self.series.clone())
    }

    async fn metrics_average(
        &self,
        _source: &str,
        measure: &str,
        _dashboard: bool,
        filter: &FilterState,
    ) -> anyhow::Result<Vec<MetricRecord>> {
        self.record_post("average", measure, filter)?;
        Ok(self.location_averages.clone())
    }

    async fn straight_average(
        &self,
        _source: &str,
        measure: &str,
        filter: &FilterState,
    ) -> anyhow::Result<StraightAverage> {
        self.record_post("straightaverage", measure, filter)?;
        Ok(self
            .straight_averages
            .get(measure)
            .copied()
            .unwrap_or(StraightAverage { avg: None, delta: None }))
    }

    async fn signals_filter_average(
        &self,
        _source: &str,
        measure: &str,
        filter: &FilterState,
    ) -> anyhow::Result<Vec<MetricRecord>> {
        self.record_post("signalsaverage", measure, filter)?;
        Ok(self.signal_averages.get(measure).cloned().unwrap_or_default())
    }

    async fn summary_trends(&self, filter: &FilterState) -> anyhow::Result<SummaryTrends> {
        self.record_post("summarytrends", "main", filter)?;
        Ok(self.trends.clone())
    }

    async fn month_averages(&self, zone_group: &str, month: &str) -> anyhow::Result<Vec<f64>> {
        self.record("monthaverages", &format!("{}@{}", zone_group, month))?;
        Ok(self.month_averages.clone())
    }

    async fn health_metrics(&self, query: &HealthQuery) -> anyhow::Result<Vec<HealthMetricRow>> {
        self.record("health", &query.measure)?;
        Ok(self.health_rows.clone())
    }
}
