// Signal inventory - column filters, paging and CSV export over the cached signal list
use crate::application::map_service::MapService;
use crate::domain::signal::{display_date, Signal, COLUMNS};
use crate::domain::view::{SignalTable, ViewKind, ViewState};
use anyhow::Context;
use csv::WriterBuilder;
use serde::Deserialize;
use std::sync::Arc;

pub const DEFAULT_PER_PAGE: usize = 10;
pub const MAX_PER_PAGE: usize = 500;

/// Case-insensitive "contains" filters, one per inventory column. Blank
/// filters match everything.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SignalColumnFilters {
    #[serde(alias = "signalID")]
    pub signal_id: Option<String>,
    pub zone_group: Option<String>,
    pub zone: Option<String>,
    pub corridor: Option<String>,
    pub subcorridor: Option<String>,
    pub agency: Option<String>,
    pub main_street_name: Option<String>,
    pub side_street_name: Option<String>,
    pub milepost: Option<String>,
    pub as_of: Option<String>,
    pub duplicate: Option<String>,
    pub include: Option<String>,
    pub modified: Option<String>,
    pub note: Option<String>,
    pub county: Option<String>,
    pub city: Option<String>,
    pub latitude: Option<String>,
    pub longitude: Option<String>,
    pub priority: Option<String>,
    pub classification: Option<String>,
}

impl SignalColumnFilters {
    pub fn matches(&self, signal: &Signal) -> bool {
        let latitude = signal.latitude.map(|v| v.to_string());
        let longitude = signal.longitude.map(|v| v.to_string());
        let as_of = signal.as_of.as_deref().map(display_date);
        let modified = signal.modified.as_deref().map(display_date);

        contains(&self.signal_id, Some(&signal.signal_id))
            && contains(&self.zone_group, signal.zone_group.as_deref())
            && contains(&self.zone, signal.zone.as_deref())
            && contains(&self.corridor, signal.corridor.as_deref())
            && contains(&self.subcorridor, signal.subcorridor.as_deref())
            && contains(&self.agency, signal.agency.as_deref())
            && contains(&self.main_street_name, signal.main_street_name.as_deref())
            && contains(&self.side_street_name, signal.side_street_name.as_deref())
            && contains(&self.milepost, signal.milepost.as_deref())
            && contains(&self.as_of, as_of.as_deref())
            && contains(&self.duplicate, signal.duplicate.as_deref())
            && contains(&self.include, signal.include.as_deref())
            && contains(&self.modified, modified.as_deref())
            && contains(&self.note, signal.note.as_deref())
            && contains(&self.county, signal.county.as_deref())
            && contains(&self.city, signal.city.as_deref())
            && contains(&self.latitude, latitude.as_deref())
            && contains(&self.longitude, longitude.as_deref())
            && contains(&self.priority, signal.priority.as_deref())
            && contains(&self.classification, signal.classification.as_deref())
    }
}

fn contains(filter: &Option<String>, value: Option<&str>) -> bool {
    let needle = match filter.as_deref().map(str::trim) {
        Some(needle) if !needle.is_empty() => needle.to_lowercase(),
        _ => return true,
    };
    value.is_some_and(|v| v.to_lowercase().contains(&needle))
}

/// Zero-based page selection.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(default)]
pub struct Paging {
    pub page: usize,
    pub per_page: Option<usize>,
}

pub fn filter_signals<'a>(signals: &'a [Signal], filters: &SignalColumnFilters) -> Vec<&'a Signal> {
    signals.iter().filter(|signal| filters.matches(signal)).collect()
}

/// Pages past the end come back empty rather than clamped.
pub fn paginate(rows: &[&Signal], paging: Paging) -> SignalTable {
    let per_page = paging.per_page.unwrap_or(DEFAULT_PER_PAGE).clamp(1, MAX_PER_PAGE);
    let total = rows.len();
    SignalTable {
        rows: rows
            .iter()
            .skip(paging.page.saturating_mul(per_page))
            .take(per_page)
            .map(|signal| (*signal).clone())
            .collect(),
        total,
        page: paging.page,
        per_page,
        pages: total.div_ceil(per_page),
    }
}

pub fn to_csv(rows: &[&Signal]) -> anyhow::Result<String> {
    let mut writer = WriterBuilder::new().has_headers(false).from_writer(Vec::new());
    writer.write_record(COLUMNS)?;
    for signal in rows {
        writer.serialize(signal)?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("Failed to flush CSV: {}", e))?;
    String::from_utf8(bytes).context("CSV export is not valid UTF-8")
}

pub struct SignalInventoryService {
    map_service: Arc<MapService>,
}

impl SignalInventoryService {
    pub fn new(map_service: Arc<MapService>) -> Self {
        Self { map_service }
    }

    pub async fn get_table(
        &self,
        token: u64,
        filters: &SignalColumnFilters,
        paging: Paging,
    ) -> ViewState<SignalTable> {
        match self.map_service.signals().await {
            Ok(signals) => {
                let rows = filter_signals(signals, filters);
                ViewState::live(ViewKind::Signals, token, paginate(&rows, paging))
            }
            Err(e) => {
                tracing::warn!("Error fetching signal inventory: {:#}", e);
                ViewState::fallback(
                    ViewKind::Signals,
                    token,
                    paginate(&[], paging),
                    "Unable to load signals".to_string(),
                )
            }
        }
    }

    /// Every row matching the filters, ignoring paging.
    pub async fn export_csv(&self, filters: &SignalColumnFilters) -> anyhow::Result<String> {
        let signals = self
            .map_service
            .signals()
            .await
            .context("Failed to load signal inventory")?;
        to_csv(&filter_signals(signals, filters))
    }
}
