// Filter domain model - date range, aggregation and location selections
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};

pub const DEFAULT_ZONE_GROUP: &str = "Central Metro";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum DateRange {
    PriorDay,
    PriorWeek,
    PriorMonth,
    PriorQuarter,
    #[default]
    PriorYear,
    Custom,
}

impl TryFrom<u8> for DateRange {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::PriorDay),
            1 => Ok(Self::PriorWeek),
            2 => Ok(Self::PriorMonth),
            3 => Ok(Self::PriorQuarter),
            4 => Ok(Self::PriorYear),
            5 => Ok(Self::Custom),
            other => Err(format!("unknown date range option {other}")),
        }
    }
}

impl From<DateRange> for u8 {
    fn from(value: DateRange) -> Self {
        match value {
            DateRange::PriorDay => 0,
            DateRange::PriorWeek => 1,
            DateRange::PriorMonth => 2,
            DateRange::PriorQuarter => 3,
            DateRange::PriorYear => 4,
            DateRange::Custom => 5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Aggregation {
    FifteenMinutes,
    Hourly,
    Daily,
    Weekly,
    #[default]
    Monthly,
    Quarterly,
}

impl Aggregation {
    /// Sub-daily aggregations switch several KPIs to their hourly measure codes.
    pub fn is_sub_daily(self) -> bool {
        matches!(self, Self::FifteenMinutes | Self::Hourly)
    }
}

impl TryFrom<u8> for Aggregation {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::FifteenMinutes),
            1 => Ok(Self::Hourly),
            2 => Ok(Self::Daily),
            3 => Ok(Self::Weekly),
            4 => Ok(Self::Monthly),
            5 => Ok(Self::Quarterly),
            other => Err(format!("unknown aggregation option {other}")),
        }
    }
}

impl From<Aggregation> for u8 {
    fn from(value: Aggregation) -> Self {
        match value {
            Aggregation::FifteenMinutes => 0,
            Aggregation::Hourly => 1,
            Aggregation::Daily => 2,
            Aggregation::Weekly => 3,
            Aggregation::Monthly => 4,
            Aggregation::Quarterly => 5,
        }
    }
}

/// The session's filter selections.
///
/// Serializes to the request body every `POST /metrics/...` endpoint expects,
/// so field names follow the remote API rather than Rust conventions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterState {
    #[serde(rename = "dateRange")]
    pub date_range: DateRange,
    #[serde(rename = "timePeriod")]
    pub aggregation: Aggregation,
    #[serde(rename = "customStart", default)]
    pub custom_start: Option<NaiveDate>,
    #[serde(rename = "customEnd", default)]
    pub custom_end: Option<NaiveDate>,
    #[serde(rename = "daysOfWeek", default)]
    pub days_of_week: Option<Vec<u8>>,
    #[serde(rename = "startTime", default)]
    pub start_time: Option<String>,
    #[serde(rename = "endTime", default)]
    pub end_time: Option<String>,
    #[serde(rename = "allDay", default = "default_all_day", skip_serializing)]
    pub all_day: bool,
    #[serde(rename = "zone_Group", default)]
    pub zone_group: Option<String>,
    #[serde(default)]
    pub zone: Option<String>,
    #[serde(default)]
    pub agency: Option<String>,
    #[serde(default)]
    pub county: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub corridor: Option<String>,
    #[serde(default)]
    pub subcorridor: Option<String>,
    #[serde(rename = "signalId", default)]
    pub signal_id: Option<String>,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default)]
    pub classification: Option<String>,
}

fn default_all_day() -> bool {
    true
}

impl Default for FilterState {
    fn default() -> Self {
        Self::with_zone_group(DEFAULT_ZONE_GROUP)
    }
}

impl FilterState {
    pub fn with_zone_group(zone_group: &str) -> Self {
        Self {
            date_range: DateRange::default(),
            aggregation: Aggregation::default(),
            custom_start: None,
            custom_end: None,
            days_of_week: None,
            start_time: None,
            end_time: None,
            all_day: true,
            zone_group: non_empty(zone_group),
            zone: None,
            agency: None,
            county: None,
            city: None,
            corridor: None,
            subcorridor: None,
            signal_id: None,
            priority: None,
            classification: None,
        }
    }

    pub fn has_signal_id(&self) -> bool {
        self.signal_id.is_some()
    }

    /// Custom dates only survive while the custom range is selected; picking
    /// it seeds both ends with today.
    pub fn set_date_range(&mut self, date_range: DateRange) {
        self.date_range = date_range;
        if date_range == DateRange::Custom {
            let today = Local::now().date_naive();
            self.custom_start.get_or_insert(today);
            self.custom_end.get_or_insert(today);
        } else {
            self.custom_start = None;
            self.custom_end = None;
        }
    }

    /// Checking "all day" drops any explicit time window.
    pub fn set_all_day(&mut self, all_day: bool) {
        self.all_day = all_day;
        if all_day {
            self.start_time = None;
            self.end_time = None;
        }
    }

    /// Body sent to the metrics API. A signal ID selection and the attribute
    /// filters are mutually exclusive; the signal ID wins.
    pub fn to_request(&self) -> FilterState {
        let mut request = self.clone();
        if request.has_signal_id() {
            request.zone_group = None;
            request.zone = None;
            request.agency = None;
            request.county = None;
            request.city = None;
            request.corridor = None;
            request.subcorridor = None;
            request.priority = None;
            request.classification = None;
        }
        request
    }

    pub fn corridor_query(&self) -> CorridorQuery {
        CorridorQuery {
            zone_group: self.zone_group.clone(),
            zone: self.zone.clone(),
            agency: self.agency.clone(),
            county: self.county.clone(),
            city: self.city.clone(),
        }
    }
}

/// Selections that scope `GET /signals/corridorsbyfilter`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CorridorQuery {
    pub zone_group: Option<String>,
    pub zone: Option<String>,
    pub agency: Option<String>,
    pub county: Option<String>,
    pub city: Option<String>,
}

impl CorridorQuery {
    pub fn to_query_string(&self) -> String {
        let part = |value: &Option<String>| {
            value
                .as_deref()
                .map(|v| urlencoding::encode(v).into_owned())
                .unwrap_or_default()
        };
        format!(
            "zoneGroup={}&zone={}&agency={}&county={}&city={}",
            part(&self.zone_group),
            part(&self.zone),
            part(&self.agency),
            part(&self.county),
            part(&self.city)
        )
    }
}

/// Blank dropdown values mean "no selection".
pub fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_payload_shape() {
        let filter = FilterState::default();
        let json = serde_json::to_value(filter.to_request()).unwrap();

        assert_eq!(json["dateRange"], 4);
        assert_eq!(json["timePeriod"], 4);
        assert_eq!(json["zone_Group"], "Central Metro");
        assert!(json["customStart"].is_null());
        assert!(json.get("allDay").is_none());
    }

    #[test]
    fn test_signal_id_drops_attribute_filters() {
        let mut filter = FilterState::default();
        filter.corridor = Some("SR-10".to_string());
        filter.priority = Some("High".to_string());
        filter.signal_id = Some("1001".to_string());

        let request = filter.to_request();
        assert_eq!(request.signal_id.as_deref(), Some("1001"));
        assert!(request.zone_group.is_none());
        assert!(request.corridor.is_none());
        assert!(request.priority.is_none());

        // The stored selections are untouched.
        assert_eq!(filter.corridor.as_deref(), Some("SR-10"));
    }

    #[test]
    fn test_custom_range_seeds_and_clears_dates() {
        let mut filter = FilterState::default();
        filter.set_date_range(DateRange::Custom);
        assert!(filter.custom_start.is_some());
        assert!(filter.custom_end.is_some());

        filter.set_date_range(DateRange::PriorWeek);
        assert!(filter.custom_start.is_none());
        assert!(filter.custom_end.is_none());
    }

    #[test]
    fn test_corridor_query_string_encodes_values() {
        let mut filter = FilterState::default();
        filter.county = Some("De Kalb".to_string());
        let query = filter.corridor_query().to_query_string();
        assert_eq!(
            query,
            "zoneGroup=Central%20Metro&zone=&agency=&county=De%20Kalb&city="
        );
    }

    #[test]
    fn test_enum_codes_round_trip_through_json() {
        let json = r#"{"dateRange":5,"timePeriod":1,"customStart":"2024-03-01","customEnd":"2024-03-31"}"#;
        let filter: FilterState = serde_json::from_str(json).unwrap();
        assert_eq!(filter.date_range, DateRange::Custom);
        assert_eq!(filter.aggregation, Aggregation::Hourly);
        assert!(filter.aggregation.is_sub_daily());
        assert!(filter.all_day);

        assert!(serde_json::from_str::<FilterState>(r#"{"dateRange":9,"timePeriod":1}"#).is_err());
    }
}
