// Metric records returned by the remote metrics API
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;

/// A labeled observation: a signal ID or corridor name with its average.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricRecord {
    #[serde(default, deserialize_with = "label_or_empty")]
    pub label: String,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub avg: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub delta: Option<f64>,
    #[serde(rename = "zoneGroup", default)]
    pub zone_group: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub weight: Option<f64>,
}

impl MetricRecord {
    pub fn new(label: impl Into<String>, avg: f64) -> Self {
        Self {
            label: label.into(),
            avg: Some(avg),
            delta: None,
            zone_group: None,
            weight: None,
        }
    }
}

/// `POST /metrics/straightaverage` answers either a bare number or an
/// object carrying `avg` and `delta`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StraightAverage {
    pub avg: Option<f64>,
    pub delta: Option<f64>,
}

impl<'de> Deserialize<'de> for StraightAverage {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        match &value {
            serde_json::Value::Object(map) => Ok(Self {
                avg: map.get("avg").and_then(value_as_f64),
                delta: map.get("delta").and_then(value_as_f64),
            }),
            other => Ok(Self {
                avg: value_as_f64(other),
                delta: None,
            }),
        }
    }
}

/// One row of `POST /metrics/filter`: a corridor's value for a month. The
/// value column is named after the measure, or `uptime` for some feeds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeriesRow {
    #[serde(default, deserialize_with = "label_or_empty")]
    pub corridor: String,
    #[serde(rename = "zone_Group", default)]
    pub zone_group: Option<String>,
    #[serde(default, deserialize_with = "label_or_empty")]
    pub month: String,
    #[serde(flatten)]
    pub columns: HashMap<String, serde_json::Value>,
}

impl TimeSeriesRow {
    pub fn value_for(&self, measure: &str) -> Option<f64> {
        self.columns
            .get(measure)
            .and_then(value_as_f64)
            .or_else(|| self.columns.get("uptime").and_then(value_as_f64))
    }
}

/// One corridor's row from the health metrics endpoint (`GET /metrics`).
/// Score columns differ per category and are kept as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthMetricRow {
    #[serde(rename = "zone_Group", default, deserialize_with = "label_or_empty")]
    pub zone_group: String,
    #[serde(default, deserialize_with = "label_or_empty")]
    pub corridor: String,
    #[serde(default, deserialize_with = "label_or_empty")]
    pub month: String,
    #[serde(rename = "percent Health", default, deserialize_with = "lenient_f64")]
    pub percent_health: Option<f64>,
    #[serde(rename = "missing Data", default, deserialize_with = "lenient_f64")]
    pub missing_data: Option<f64>,
    #[serde(flatten)]
    pub columns: HashMap<String, serde_json::Value>,
}

impl HealthMetricRow {
    pub fn column(&self, name: &str) -> Option<f64> {
        self.columns.get(name).and_then(value_as_f64)
    }
}

/// One month of a summary trend series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyAverage {
    pub month: String,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub average: Option<f64>,
}

/// `POST /metrics/summarytrends` keyed by measure code.
pub type SummaryTrends = HashMap<String, Vec<MonthlyAverage>>;

/// Accepts numbers, numeric strings and null.
pub fn value_as_f64(value: &serde_json::Value) -> Option<f64> {
    match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

pub(crate) fn lenient_f64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(value_as_f64))
}

fn label_or_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => s,
        Some(serde_json::Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    })
}
