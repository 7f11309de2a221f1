// Filter cascade - keeps dependent dropdowns consistent with upstream picks
use crate::application::filter_defaults::FilterDefaultsStore;
use crate::application::metrics_repository::{MetricsRepository, OptionList};
use crate::domain::filter::{Aggregation, DateRange, FilterState};
use chrono::NaiveDate;
use futures::future::join_all;
use serde::{Deserialize, Deserializer, Serialize};
use std::sync::Arc;
use tokio::sync::watch;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum CascadeState {
    Idle,
    LoadingOptions,
    LoadingZones,
    LoadingCorridors,
    LoadingSubcorridors,
    Ready,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CascadeEvent {
    LoadOptions,
    OptionsLoaded,
    ZoneGroupChanged,
    ZonesLoaded,
    CorridorChanged,
    SubcorridorsLoaded,
    ApplyRequested,
    CorridorsLoaded,
    FetchFailed,
    Reset,
}

#[derive(Debug, thiserror::Error)]
pub enum CascadeError {
    #[error("cannot handle {event:?} while {from:?}")]
    InvalidTransition { from: CascadeState, event: CascadeEvent },

    #[error("failed to persist filter defaults: {0}")]
    Defaults(String),
}

/// The cascade's transition table. Loading states only accept their own
/// completion or a failure; settled states accept any new request.
pub fn transition(from: CascadeState, event: CascadeEvent) -> Result<CascadeState, CascadeError> {
    use CascadeEvent as E;
    use CascadeState as S;

    let settled = matches!(from, S::Idle | S::Ready | S::Error);
    let next = match (from, event) {
        (_, E::Reset) => S::Idle,
        (_, E::LoadOptions) if settled => S::LoadingOptions,
        (_, E::ZoneGroupChanged) if settled => S::LoadingZones,
        (_, E::CorridorChanged) if settled => S::LoadingSubcorridors,
        (_, E::ApplyRequested) if settled => S::LoadingCorridors,
        (S::LoadingOptions, E::OptionsLoaded) => S::Ready,
        (S::LoadingZones, E::ZonesLoaded) => S::Ready,
        (S::LoadingSubcorridors, E::SubcorridorsLoaded) => S::Ready,
        (S::LoadingCorridors, E::CorridorsLoaded) => S::Ready,
        (S::LoadingOptions | S::LoadingZones | S::LoadingSubcorridors | S::LoadingCorridors, E::FetchFailed) => {
            S::Error
        }
        _ => return Err(CascadeError::InvalidTransition { from, event }),
    };
    Ok(next)
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DropdownOptions {
    pub zone_groups: Vec<String>,
    pub zones: Vec<String>,
    pub agencies: Vec<String>,
    pub counties: Vec<String>,
    pub cities: Vec<String>,
    pub corridors: Vec<String>,
    pub subcorridors: Vec<String>,
    pub priorities: Vec<String>,
    pub classifications: Vec<String>,
}

impl DropdownOptions {
    pub fn set(&mut self, list: OptionList, values: Vec<String>) {
        let slot = match list {
            OptionList::ZoneGroups => &mut self.zone_groups,
            OptionList::Zones => &mut self.zones,
            OptionList::Agencies => &mut self.agencies,
            OptionList::Counties => &mut self.counties,
            OptionList::Cities => &mut self.cities,
            OptionList::Corridors => &mut self.corridors,
            OptionList::Subcorridors => &mut self.subcorridors,
            OptionList::Priorities => &mut self.priorities,
            OptionList::Classifications => &mut self.classifications,
        };
        *slot = values;
    }
}

/// Selections that don't trigger any dependent fetch. An absent key leaves a
/// field alone; an explicit `null` (or blank string) clears it.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterPatch {
    pub date_range: Option<DateRange>,
    pub aggregation: Option<Aggregation>,
    #[serde(default, deserialize_with = "present")]
    pub custom_start: Option<Option<NaiveDate>>,
    #[serde(default, deserialize_with = "present")]
    pub custom_end: Option<Option<NaiveDate>>,
    #[serde(default, deserialize_with = "present")]
    pub start_time: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub end_time: Option<Option<String>>,
    pub all_day: Option<bool>,
    #[serde(default, deserialize_with = "present")]
    pub days_of_week: Option<Option<Vec<u8>>>,
    #[serde(default, deserialize_with = "present")]
    pub zone: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub agency: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub county: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub city: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub subcorridor: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub priority: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub classification: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub signal_id: Option<Option<String>>,
}

/// Marks a key that was sent, so `null` becomes `Some(None)`.
fn present<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// The filter views query with, stamped with how many applies produced it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AppliedFilter {
    pub generation: u64,
    pub filter: FilterState,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterSnapshot {
    pub state: CascadeState,
    pub filter: FilterState,
    pub options: DropdownOptions,
    pub error_banner: Option<String>,
    pub is_filtering: bool,
    pub applied_generation: u64,
}

pub struct FilterCascade {
    repository: Arc<dyn MetricsRepository>,
    defaults_store: Arc<dyn FilterDefaultsStore>,
    default_filter: FilterState,
    state: CascadeState,
    filter: FilterState,
    options: DropdownOptions,
    error_banner: Option<String>,
    is_filtering: bool,
    applied: watch::Sender<AppliedFilter>,
}

/// Lists fetched when the sidebar first opens.
const INITIAL_LISTS: [OptionList; 8] = [
    OptionList::ZoneGroups,
    OptionList::Zones,
    OptionList::Agencies,
    OptionList::Counties,
    OptionList::Cities,
    OptionList::Corridors,
    OptionList::Priorities,
    OptionList::Classifications,
];

impl FilterCascade {
    /// Starts from saved defaults when present, otherwise `default_filter`.
    /// The starting filter is also the first applied filter.
    pub fn new(
        repository: Arc<dyn MetricsRepository>,
        defaults_store: Arc<dyn FilterDefaultsStore>,
        default_filter: FilterState,
    ) -> Self {
        let filter = match defaults_store.load() {
            Ok(Some(saved)) => {
                tracing::info!("Restored saved filter defaults");
                saved
            }
            Ok(None) => default_filter.clone(),
            Err(e) => {
                tracing::warn!("Could not load saved filter defaults: {:#}", e);
                default_filter.clone()
            }
        };
        let (applied, _) = watch::channel(AppliedFilter {
            generation: 0,
            filter: filter.clone(),
        });

        Self {
            repository,
            defaults_store,
            default_filter,
            state: CascadeState::Idle,
            filter,
            options: DropdownOptions::default(),
            error_banner: None,
            is_filtering: false,
            applied,
        }
    }

    pub fn state(&self) -> CascadeState {
        self.state
    }

    pub fn filter(&self) -> &FilterState {
        &self.filter
    }

    pub fn options(&self) -> &DropdownOptions {
        &self.options
    }

    pub fn error_banner(&self) -> Option<&str> {
        self.error_banner.as_deref()
    }

    pub fn subscribe(&self) -> watch::Receiver<AppliedFilter> {
        self.applied.subscribe()
    }

    pub fn snapshot(&self) -> FilterSnapshot {
        FilterSnapshot {
            state: self.state,
            filter: self.filter.clone(),
            options: self.options.clone(),
            error_banner: self.error_banner.clone(),
            is_filtering: self.is_filtering,
            applied_generation: self.applied.borrow().generation,
        }
    }

    fn fire(&mut self, event: CascadeEvent) -> Result<(), CascadeError> {
        let next = transition(self.state, event)?;
        tracing::debug!("Filter cascade {:?} --{:?}--> {:?}", self.state, event, next);
        self.state = next;
        Ok(())
    }

    /// Empties the list whose fetch failed and raises the banner. No retry.
    fn record_failure(&mut self, list: OptionList, error: anyhow::Error) {
        tracing::warn!("Failed to load {} options: {:#}", list.path(), error);
        self.options.set(list, Vec::new());
        self.error_banner = Some(format!("Unable to load {} options", list.path()));
    }

    /// Fetches every dropdown list concurrently.
    pub async fn load_options(&mut self) -> Result<(), CascadeError> {
        self.load_lists(&INITIAL_LISTS).await
    }

    async fn load_lists(&mut self, lists: &[OptionList]) -> Result<(), CascadeError> {
        self.fire(CascadeEvent::LoadOptions)?;

        let repository = self.repository.clone();
        let results = join_all(lists.iter().map(|list| repository.list_options(*list))).await;

        let mut failed = false;
        for (list, result) in lists.iter().zip(results) {
            match result {
                Ok(values) => self.options.set(*list, values),
                Err(e) => {
                    self.record_failure(*list, e);
                    failed = true;
                }
            }
        }

        self.fire(if failed {
            CascadeEvent::FetchFailed
        } else {
            CascadeEvent::OptionsLoaded
        })
    }

    /// Clears zone, corridor and subcorridor, then fetches the zones of the
    /// new group (all zones when the group is cleared).
    pub async fn select_zone_group(&mut self, zone_group: Option<String>) -> Result<(), CascadeError> {
        self.fire(CascadeEvent::ZoneGroupChanged)?;

        self.filter.zone_group = zone_group;
        self.filter.zone = None;
        self.filter.corridor = None;
        self.filter.subcorridor = None;
        self.is_filtering = true;

        let result = match self.filter.zone_group.as_deref() {
            Some(group) => self.repository.zones_by_zone_group(group).await,
            None => self.repository.list_options(OptionList::Zones).await,
        };

        match result {
            Ok(zones) => {
                self.options.zones = zones;
                self.fire(CascadeEvent::ZonesLoaded)
            }
            Err(e) => {
                self.record_failure(OptionList::Zones, e);
                self.fire(CascadeEvent::FetchFailed)
            }
        }
    }

    /// Clears the subcorridor and fetches the subcorridors of the new
    /// corridor (all subcorridors when the corridor is cleared).
    pub async fn select_corridor(&mut self, corridor: Option<String>) -> Result<(), CascadeError> {
        self.fire(CascadeEvent::CorridorChanged)?;

        self.filter.corridor = corridor;
        self.filter.subcorridor = None;
        self.is_filtering = true;

        let result = match self.filter.corridor.as_deref() {
            Some(corridor) => self.repository.subcorridors_by_corridor(corridor).await,
            None => self.repository.list_options(OptionList::Subcorridors).await,
        };

        match result {
            Ok(subcorridors) => {
                self.options.subcorridors = subcorridors;
                self.fire(CascadeEvent::SubcorridorsLoaded)
            }
            Err(e) => {
                self.record_failure(OptionList::Subcorridors, e);
                self.fire(CascadeEvent::FetchFailed)
            }
        }
    }

    /// Applies selections that have no dependent lists.
    pub fn update(&mut self, patch: FilterPatch) {
        let f = &mut self.filter;

        if let Some(date_range) = patch.date_range {
            f.set_date_range(date_range);
        }
        if let Some(aggregation) = patch.aggregation {
            f.aggregation = aggregation;
        }
        if let Some(start) = patch.custom_start {
            f.custom_start = start;
        }
        if let Some(end) = patch.custom_end {
            f.custom_end = end;
        }
        if let Some(all_day) = patch.all_day {
            f.set_all_day(all_day);
        }
        if let Some(start_time) = patch.start_time {
            f.start_time = clean(start_time);
        }
        if let Some(end_time) = patch.end_time {
            f.end_time = clean(end_time);
        }
        if let Some(days) = patch.days_of_week {
            f.days_of_week = days;
        }
        if let Some(zone) = patch.zone {
            f.zone = clean(zone);
        }
        if let Some(agency) = patch.agency {
            f.agency = clean(agency);
        }
        if let Some(county) = patch.county {
            f.county = clean(county);
        }
        if let Some(city) = patch.city {
            f.city = clean(city);
        }
        if let Some(subcorridor) = patch.subcorridor {
            f.subcorridor = clean(subcorridor);
        }
        if let Some(priority) = patch.priority {
            f.priority = clean(priority);
        }
        if let Some(classification) = patch.classification {
            f.classification = clean(classification);
        }
        if let Some(signal_id) = patch.signal_id {
            f.signal_id = clean(signal_id);
        }

        self.is_filtering = true;
    }

    /// Re-resolves dependent lists against the full selection, then publishes
    /// the filter to the views. Fetch failures leave the banner up but do not
    /// block the apply.
    pub async fn apply(&mut self) -> Result<AppliedFilter, CascadeError> {
        self.fire(CascadeEvent::ApplyRequested)?;
        self.error_banner = None;

        let mut failed = false;

        if let Some(group) = self.filter.zone_group.clone() {
            match self.repository.zones_by_zone_group(&group).await {
                Ok(zones) => self.options.zones = zones,
                Err(e) => {
                    self.record_failure(OptionList::Zones, e);
                    failed = true;
                }
            }
        }

        if let Some(corridor) = self.filter.corridor.clone() {
            match self.repository.subcorridors_by_corridor(&corridor).await {
                Ok(subcorridors) => self.options.subcorridors = subcorridors,
                Err(e) => {
                    self.record_failure(OptionList::Subcorridors, e);
                    failed = true;
                }
            }
        }

        match self
            .repository
            .corridors_by_filter(&self.filter.corridor_query())
            .await
        {
            Ok(corridors) => self.options.corridors = corridors,
            Err(e) => {
                self.record_failure(OptionList::Corridors, e);
                failed = true;
            }
        }

        self.fire(if failed {
            CascadeEvent::FetchFailed
        } else {
            CascadeEvent::CorridorsLoaded
        })?;

        self.is_filtering = false;
        let applied = AppliedFilter {
            generation: self.applied.borrow().generation + 1,
            filter: self.filter.clone(),
        };
        self.applied.send_replace(applied.clone());
        tracing::info!("Applied filter generation {}", applied.generation);
        Ok(applied)
    }

    /// Back to the configured defaults with every list reloaded. Saved
    /// defaults are not consulted.
    pub async fn reset(&mut self) -> Result<(), CascadeError> {
        self.fire(CascadeEvent::Reset)?;
        self.filter = self.default_filter.clone();
        self.options = DropdownOptions::default();
        self.error_banner = None;
        self.is_filtering = false;
        self.load_lists(&OptionList::ALL).await
    }

    pub async fn save_defaults(&mut self) -> Result<AppliedFilter, CascadeError> {
        self.defaults_store
            .save(&self.filter)
            .map_err(|e| CascadeError::Defaults(format!("{:#}", e)))?;
        tracing::info!("Saved filter defaults");
        self.apply().await
    }
}

fn clean(value: Option<String>) -> Option<String> {
    value.and_then(|v| crate::domain::filter::non_empty(&v))
}
