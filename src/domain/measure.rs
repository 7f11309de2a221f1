// KPI catalogue - labels, units and display formatting per measure code
use serde::{Deserialize, Serialize};

pub const NOT_AVAILABLE: &str = "N/A";
pub const UNAVAILABLE: &str = "Unavailable";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormatType {
    Number,
    Percent,
}

/// Which configured goal a measure is plotted against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Goal {
    TravelTimeIndex,
    PlanningTimeIndex,
    DetectorUptime,
    PedestrianUptime,
    CctvUptime,
    CommunicationUptime,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Measure {
    pub code: &'static str,
    pub label: &'static str,
    pub unit: &'static str,
    pub format_type: FormatType,
    pub decimals: usize,
    pub goal: Option<Goal>,
}

const fn measure(
    code: &'static str,
    label: &'static str,
    unit: &'static str,
    format_type: FormatType,
    decimals: usize,
) -> Measure {
    Measure {
        code,
        label,
        unit,
        format_type,
        decimals,
        goal: None,
    }
}

const fn with_goal(mut m: Measure, goal: Goal) -> Measure {
    m.goal = Some(goal);
    m
}

use FormatType::{Number, Percent};

pub static MEASURES: &[Measure] = &[
    measure("tp", "Throughput", "vph", Number, 0),
    measure("aogd", "Arrivals on Green", "%", Percent, 1),
    measure("aogh", "Arrivals on Green", "%", Percent, 1),
    measure("prd", "Progression Ratio", "", Number, 2),
    measure("prh", "Progression Ratio", "", Number, 2),
    measure("qsd", "Queue Spillback Ratio", "%", Percent, 1),
    measure("qsh", "Queue Spillback Ratio", "%", Percent, 1),
    measure("sfd", "Peak Period Split Failures", "%", Percent, 1),
    measure("sfh", "Peak Period Split Failures", "%", Percent, 1),
    measure("sfo", "Off Peak Split Failures", "%", Percent, 1),
    with_goal(
        measure("tti", "Travel Time Index", "", Number, 2),
        Goal::TravelTimeIndex,
    ),
    with_goal(
        measure("pti", "Planning Time Index", "", Number, 2),
        Goal::PlanningTimeIndex,
    ),
    measure("vpd", "Traffic Volume", "vpd", Number, 0),
    measure("vph", "Traffic Volume", "vph", Number, 0),
    measure("vphpa", "AM Peak Volume", "vph", Number, 0),
    measure("vphpp", "PM Peak Volume", "vph", Number, 0),
    measure("papd", "Pedestrian Activations", "", Number, 0),
    measure("paph", "Pedestrian Activations", "", Number, 0),
    with_goal(
        measure("du", "Vehicle Detector Uptime", "%", Percent, 1),
        Goal::DetectorUptime,
    ),
    with_goal(
        measure("pau", "Pedestrian Detector Uptime", "%", Percent, 1),
        Goal::PedestrianUptime,
    ),
    with_goal(
        measure("cctv", "CCTV Uptime", "%", Percent, 1),
        Goal::CctvUptime,
    ),
    with_goal(
        measure("cu", "Communications Uptime", "%", Percent, 1),
        Goal::CommunicationUptime,
    ),
];

pub const PERFORMANCE_MEASURES: [&str; 8] = ["tp", "aogd", "prd", "qsd", "sfd", "sfo", "tti", "pti"];
pub const VOLUME_MEASURES: [&str; 8] = ["vpd", "vphpa", "vphpp", "papd", "du", "pau", "cctv", "cu"];

pub fn find(code: &str) -> Option<&'static Measure> {
    MEASURES.iter().find(|m| m.code == code)
}

/// Daily measure codes that have an hourly counterpart.
pub fn hourly_variant(code: &str) -> &str {
    match code {
        "aogd" => "aogh",
        "prd" => "prh",
        "qsd" => "qsh",
        "sfd" => "sfh",
        "vpd" => "vph",
        "papd" => "paph",
        other => other,
    }
}

impl Measure {
    /// Formats a raw API value for a KPI card. Missing values render "N/A".
    pub fn format(&self, value: Option<f64>) -> String {
        match value {
            Some(v) if v.is_finite() => format_value(v, self.format_type, self.decimals),
            _ => NOT_AVAILABLE.to_string(),
        }
    }
}

/// Percent values arrive as fractions; numbers with no decimals get
/// thousands separators.
pub fn format_value(value: f64, format_type: FormatType, decimals: usize) -> String {
    match format_type {
        FormatType::Percent => format!("{:.*}", decimals, value * 100.0),
        FormatType::Number if decimals == 0 => group_thousands(value.round() as i64),
        FormatType::Number => format!("{:.*}", decimals, value),
    }
}

/// Map tooltips use -1 as the "no data" sentinel.
pub fn format_map_value(value: Option<f64>, format_type: FormatType, decimals: usize) -> String {
    match value {
        Some(v) if v.is_finite() && v != -1.0 => match format_type {
            FormatType::Percent => format!("{}%", format_value(v, format_type, decimals)),
            FormatType::Number => format_value(v, format_type, decimals),
        },
        _ => UNAVAILABLE.to_string(),
    }
}

pub fn group_thousands(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if value < 0 {
        grouped.insert(0, '-');
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent_measures_scale_by_hundred() {
        for m in MEASURES.iter().filter(|m| m.format_type == FormatType::Percent) {
            let raw = 0.6987;
            let expected = format!("{:.*}", m.decimals, raw * 100.0);
            assert_eq!(m.format(Some(raw)), expected, "measure {}", m.code);
        }
        assert_eq!(find("aogd").unwrap().format(Some(0.699)), "69.9");
    }

    #[test]
    fn test_number_formatting() {
        assert_eq!(find("vpd").unwrap().format(Some(16863.4)), "16,863");
        assert_eq!(find("prd").unwrap().format(Some(1.0712)), "1.07");
        assert_eq!(find("tp").unwrap().format(Some(999.5)), "1,000");
    }

    #[test]
    fn test_missing_values_render_not_available() {
        let tp = find("tp").unwrap();
        assert_eq!(tp.format(None), "N/A");
        assert_eq!(tp.format(Some(f64::NAN)), "N/A");
    }

    #[test]
    fn test_group_thousands() {
        assert_eq!(group_thousands(0), "0");
        assert_eq!(group_thousands(999), "999");
        assert_eq!(group_thousands(1000), "1,000");
        assert_eq!(group_thousands(1234567), "1,234,567");
        assert_eq!(group_thousands(-45000), "-45,000");
    }

    #[test]
    fn test_map_value_sentinel() {
        assert_eq!(format_map_value(Some(-1.0), FormatType::Number, 0), "Unavailable");
        assert_eq!(format_map_value(None, FormatType::Number, 0), "Unavailable");
        assert_eq!(format_map_value(Some(0.5), FormatType::Percent, 1), "50.0%");
    }

    #[test]
    fn test_hourly_variants_exist_in_catalogue() {
        for code in PERFORMANCE_MEASURES.iter().chain(VOLUME_MEASURES.iter()) {
            assert!(find(code).is_some());
            assert!(find(hourly_variant(code)).is_some());
        }
    }
}
