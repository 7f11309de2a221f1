use crate::domain::filter::{FilterState, DEFAULT_ZONE_GROUP};
use crate::domain::map::MapViewport;
use crate::domain::measure::Goal;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const ENV_VAR: &str = "SIGOPS_ENV";

#[derive(Debug, Deserialize, Clone)]
pub struct AppSettings {
    pub server: ServerSettings,
    pub api: ApiSettings,
    pub map: MapSettings,
    #[serde(default)]
    pub filters: FilterSettings,
    #[serde(default)]
    pub features: FeatureFlags,
    #[serde(default)]
    pub goals: Goals,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// Built front end to serve; unset serves the API only.
    #[serde(default)]
    pub static_dir: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ApiSettings {
    pub base_url: String,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl ApiSettings {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy)]
pub struct MapSettings {
    pub center_lat: f64,
    pub center_lon: f64,
    #[serde(default = "default_zoom")]
    pub default_zoom: f64,
}

fn default_zoom() -> f64 {
    12.0
}

impl MapSettings {
    pub fn default_viewport(&self) -> MapViewport {
        MapViewport {
            center_lat: self.center_lat,
            center_lon: self.center_lon,
            zoom: self.default_zoom,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct FilterSettings {
    #[serde(default = "default_zone_group")]
    pub default_zone_group: String,
    /// Where "save as defaults" writes; unset keeps defaults in memory.
    #[serde(default)]
    pub defaults_path: Option<String>,
}

fn default_zone_group() -> String {
    DEFAULT_ZONE_GROUP.to_string()
}

impl Default for FilterSettings {
    fn default() -> Self {
        Self {
            default_zone_group: default_zone_group(),
            defaults_path: None,
        }
    }
}

impl FilterSettings {
    pub fn default_filter(&self) -> FilterState {
        FilterState::with_zone_group(&self.default_zone_group)
    }
}

/// Pages the front end should offer.
#[derive(Debug, Deserialize, Serialize, Clone, Copy)]
#[serde(default)]
pub struct FeatureFlags {
    pub has_page_operations: bool,
    pub has_page_maintenance: bool,
    pub has_page_watchdog: bool,
    pub has_page_teams_tasks: bool,
    pub has_page_reports: bool,
    pub has_page_health_metrics: bool,
    pub has_page_summary_trend: bool,
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self {
            has_page_operations: true,
            has_page_maintenance: true,
            has_page_watchdog: true,
            has_page_teams_tasks: true,
            has_page_reports: false,
            has_page_health_metrics: true,
            has_page_summary_trend: true,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy)]
#[serde(default)]
pub struct Goals {
    pub tti: f64,
    pub pti: f64,
    pub du: f64,
    pub ppu: f64,
    pub cctv: f64,
    pub cu: f64,
}

impl Default for Goals {
    fn default() -> Self {
        Self {
            tti: 1.2,
            pti: 1.3,
            du: 0.95,
            ppu: 0.95,
            cctv: 0.95,
            cu: 0.95,
        }
    }
}

impl Goals {
    pub fn value(&self, goal: Goal) -> f64 {
        match goal {
            Goal::TravelTimeIndex => self.tti,
            Goal::PlanningTimeIndex => self.pti,
            Goal::DetectorUptime => self.du,
            Goal::PedestrianUptime => self.ppu,
            Goal::CctvUptime => self.cctv,
            Goal::CommunicationUptime => self.cu,
        }
    }
}

/// Layers `config/default`, then `config/<SIGOPS_ENV>` (dev when unset), then
/// `SIGOPS__SECTION__KEY` environment overrides.
pub fn load_settings() -> anyhow::Result<AppSettings> {
    let env = std::env::var(ENV_VAR).unwrap_or_else(|_| "dev".to_string());
    load_settings_from("config", &env)
}

pub fn load_settings_from(dir: &str, env: &str) -> anyhow::Result<AppSettings> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name(&format!("{}/default", dir)))
        .add_source(config::File::with_name(&format!("{}/{}", dir, env)).required(false))
        .add_source(config::Environment::with_prefix("SIGOPS").separator("__"))
        .build()?;

    Ok(settings.try_deserialize()?)
}
