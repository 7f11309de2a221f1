// Corridor health categories and their score columns
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthCategory {
    Maintenance,
    Operations,
    Safety,
}

impl HealthCategory {
    /// Measure code for the corridor table.
    pub fn table_measure(self) -> &'static str {
        match self {
            Self::Maintenance => "maint",
            Self::Operations => "ops",
            Self::Safety => "safety",
        }
    }

    /// Measure code for the trend plot.
    pub fn plot_measure(self) -> &'static str {
        match self {
            Self::Maintenance => "maint_plot",
            Self::Operations => "ops_plot",
            Self::Safety => "safety_plot",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::Maintenance => "Maintenance Health",
            Self::Operations => "Operations Health",
            Self::Safety => "Safety Health",
        }
    }

    pub fn score_columns(self) -> &'static [&'static str] {
        match self {
            Self::Maintenance => &[
                "detection Uptime Score",
                "ped Actuation Uptime Score",
                "comm Uptime Score",
                "cctv Uptime Score",
                "flash Events Score",
            ],
            Self::Operations => &[
                "platoon Ratio Score",
                "ped Delay Score",
                "split Failures Score",
                "travel Time Index Score",
                "buffer Index Score",
            ],
            Self::Safety => &[
                "crash Rate Index Score",
                "kabco Crash Severity Index Score",
                "high Speed Index Score",
                "ped Injury Exposure Index Score",
            ],
        }
    }
}

impl FromStr for HealthCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "maintenance" => Ok(Self::Maintenance),
            "operations" => Ok(Self::Operations),
            "safety" => Ok(Self::Safety),
            other => Err(format!("unknown health category {other}")),
        }
    }
}

impl fmt::Display for HealthCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Maintenance => "maintenance",
            Self::Operations => "operations",
            Self::Safety => "safety",
        };
        f.write_str(name)
    }
}

/// `/metrics/monthaverages` answers `-1` for "no data".
pub fn month_average_percent(raw: f64) -> f64 {
    if raw == -1.0 { 0.0 } else { raw * 100.0 }
}
