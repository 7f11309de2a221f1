// Traffic signal inventory records from `GET /signals/all`
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    #[serde(rename = "signalID", deserialize_with = "id_as_string")]
    pub signal_id: String,
    #[serde(default, deserialize_with = "crate::domain::metric::lenient_f64")]
    pub latitude: Option<f64>,
    #[serde(default, deserialize_with = "crate::domain::metric::lenient_f64")]
    pub longitude: Option<f64>,
    #[serde(rename = "mainStreetName", default)]
    pub main_street_name: Option<String>,
    #[serde(rename = "sideStreetName", default)]
    pub side_street_name: Option<String>,
    #[serde(rename = "zone_Group", alias = "zoneGroup", default)]
    pub zone_group: Option<String>,
    #[serde(default)]
    pub zone: Option<String>,
    #[serde(default)]
    pub corridor: Option<String>,
    #[serde(default)]
    pub agency: Option<String>,
    #[serde(default)]
    pub county: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub subcorridor: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub milepost: Option<String>,
    #[serde(rename = "asOf", default, deserialize_with = "lenient_text")]
    pub as_of: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub duplicate: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub include: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub modified: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub note: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub priority: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub classification: Option<String>,
}

/// Inventory column headers, in serialization order.
pub const COLUMNS: [&str; 20] = [
    "signalID",
    "latitude",
    "longitude",
    "mainStreetName",
    "sideStreetName",
    "zone_Group",
    "zone",
    "corridor",
    "agency",
    "county",
    "city",
    "subcorridor",
    "milepost",
    "asOf",
    "duplicate",
    "include",
    "modified",
    "note",
    "priority",
    "classification",
];

impl Signal {
    pub fn new(signal_id: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        Self {
            signal_id: signal_id.into(),
            latitude: Some(latitude),
            longitude: Some(longitude),
            main_street_name: None,
            side_street_name: None,
            zone_group: None,
            zone: None,
            corridor: None,
            agency: None,
            county: None,
            city: None,
            subcorridor: None,
            milepost: None,
            as_of: None,
            duplicate: None,
            include: None,
            modified: None,
            note: None,
            priority: None,
            classification: None,
        }
    }

    /// Coordinates usable on a map; the inventory uses 0 for "unknown".
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) if lat != 0.0 && lon != 0.0 && lat.is_finite() && lon.is_finite() => {
                Some((lat, lon))
            }
            _ => None,
        }
    }

    /// "Main St @ Side St", tolerating either name being absent.
    pub fn intersection(&self) -> String {
        let main = self.main_street_name.as_deref().unwrap_or("").trim();
        let side = self.side_street_name.as_deref().unwrap_or("").trim();
        match (main.is_empty(), side.is_empty()) {
            (false, false) => format!("{} @ {}", main, side),
            (false, true) => main.to_string(),
            (true, false) => format!("@ {}", side),
            (true, true) => String::new(),
        }
    }
}

/// Dates as the inventory table shows them (MM/DD/YYYY); anything that isn't
/// an ISO date is passed through.
pub fn display_date(raw: &str) -> String {
    raw.get(..10)
        .and_then(|day| NaiveDate::parse_from_str(day, "%Y-%m-%d").ok())
        .map(|day| day.format("%m/%d/%Y").to_string())
        .unwrap_or_else(|| raw.to_string())
}

/// Free-text columns arrive as strings, numbers or booleans depending on the row.
fn lenient_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Null => None,
        serde_json::Value::String(s) => Some(s),
        other => Some(other.to_string()),
    })
}

fn id_as_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let value = serde_json::Value::deserialize(deserializer)?;
    match value {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!("unexpected signal id {}", other))),
    }
}
