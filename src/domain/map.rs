// Map domain models - per-metric range tables and marker groups
use super::measure::FormatType;
use serde::Serialize;

pub mod colors {
    pub const LIGHT_TEAL: &str = "#b2dfdb";
    pub const TEAL: &str = "#26a69a";
    pub const BLUE: &str = "#1e88e5";
    pub const DARK_BLUE: &str = "#1a237e";
    pub const PURPLE: &str = "#6a1b9a";
    pub const RED: &str = "#d32f2f";
    pub const RED_ORANGE: &str = "#f4511e";
    pub const ORANGE: &str = "#fb8c00";
    pub const YELLOW: &str = "#fdd835";
    pub const YELLOW_GREEN: &str = "#c0ca33";
    pub const GREEN_YELLOW: &str = "#9ccc65";
    pub const GREEN: &str = "#43a047";
    pub const GRAY: &str = "#9e9e9e";
    pub const FALLBACK_BLUE: &str = "#3b82f6";
}

/// Static bucket table for one map metric.
///
/// Bucket `i` covers `[lower_bounds[i], lower_bounds[i + 1])`. The first
/// bucket also takes anything below its lower edge and the last bucket is
/// unbounded above, so every finite value lands in exactly one bucket.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapRangeConfig {
    pub key: &'static str,
    pub field: &'static str,
    pub label: &'static str,
    pub format_type: FormatType,
    pub decimals: usize,
    pub lower_bounds: &'static [f64],
    pub legend_labels: &'static [&'static str],
    pub legend_colors: &'static [&'static str],
}

impl MapRangeConfig {
    pub fn bucket_count(&self) -> usize {
        self.lower_bounds.len()
    }

    /// Bucket for a finite value; `None` for NaN and infinities.
    pub fn bucket_index(&self, value: f64) -> Option<usize> {
        if !value.is_finite() || self.lower_bounds.is_empty() {
            return None;
        }
        let above = self
            .lower_bounds
            .iter()
            .skip(1)
            .take_while(|&&lower| value >= lower)
            .count();
        Some(above)
    }
}

use colors::*;
use FormatType::{Number, Percent};

const CONGESTION_SCALE: &[&str] = &[LIGHT_TEAL, TEAL, BLUE, DARK_BLUE, PURPLE];
const GOOD_HIGH_SCALE: &[&str] = &[PURPLE, RED_ORANGE, YELLOW, GREEN_YELLOW, GREEN];
const GOOD_LOW_SCALE: &[&str] = &[GREEN, GREEN_YELLOW, YELLOW, RED_ORANGE, RED];
const UPTIME_SCALE: &[&str] = &[RED, RED_ORANGE, YELLOW, GREEN_YELLOW, GREEN];

const SPLIT_FAILURE_BOUNDS: &[f64] = &[0.0, 0.051, 0.101, 0.151, 0.201];
const SPLIT_FAILURE_LABELS: &[&str] = &["0% - 5%", "5.1% - 10%", "10.1% - 15%", "15.1% - 20%", "20.1%+"];
const UPTIME_BOUNDS: &[f64] = &[0.0, 0.5, 0.7, 0.85, 0.95];
const UPTIME_LABELS: &[&str] = &["0% - 50%", "50% - 70%", "70% - 85%", "85% - 95%", "95% - 100%"];

pub static MAP_RANGES: &[MapRangeConfig] = &[
    MapRangeConfig {
        key: "dailyTrafficVolume",
        field: "vpd",
        label: "Daily Traffic Volume",
        format_type: Number,
        decimals: 0,
        lower_bounds: &[0.0, 10001.0, 20001.0, 30001.0, 40001.0],
        legend_labels: &[
            "0 - 10,000 vpd",
            "10,001 - 20,000 vpd",
            "20,001 - 30,000 vpd",
            "30,001 - 40,000 vpd",
            "40,001+ vpd",
        ],
        legend_colors: CONGESTION_SCALE,
    },
    MapRangeConfig {
        key: "throughput",
        field: "tp",
        label: "Throughput",
        format_type: Number,
        decimals: 0,
        lower_bounds: &[0.0, 2001.0, 4001.0, 6001.0, 8001.0],
        legend_labels: &[
            "0 - 2,000 vph",
            "2,001 - 4,000 vph",
            "4,001 - 6,000 vph",
            "6,001 - 8,000 vph",
            "8,001+ vph",
        ],
        legend_colors: CONGESTION_SCALE,
    },
    MapRangeConfig {
        key: "arrivalsOnGreen",
        field: "aogd",
        label: "Arrivals on Green",
        format_type: Percent,
        decimals: 1,
        lower_bounds: &[0.0, 0.21, 0.41, 0.61, 0.81],
        legend_labels: &["0% - 20%", "21% - 40%", "41% - 60%", "61% - 80%", "81% - 100%"],
        legend_colors: GOOD_HIGH_SCALE,
    },
    MapRangeConfig {
        key: "progressionRate",
        field: "prd",
        label: "Progression Ratio",
        format_type: Number,
        decimals: 2,
        lower_bounds: &[0.0, 0.41, 0.81, 1.01, 1.21],
        legend_labels: &["0 - 0.4", "0.41 - 0.8", "0.81 - 1", "1.01 - 1.2", "1.2+"],
        legend_colors: &[RED, RED_ORANGE, ORANGE, YELLOW, YELLOW_GREEN],
    },
    MapRangeConfig {
        key: "spillbackRate",
        field: "qsd",
        label: "Queue Spillback",
        format_type: Percent,
        decimals: 1,
        lower_bounds: &[0.0, 0.21, 0.41, 0.61, 0.81],
        legend_labels: &["0% - 20%", "20.01% - 40%", "40.01% - 60%", "60.01% - 80%", "80.01% - 100%"],
        legend_colors: GOOD_LOW_SCALE,
    },
    MapRangeConfig {
        key: "peakPeriodSplitFailures",
        field: "sfd",
        label: "Peak Split Failures",
        format_type: Percent,
        decimals: 1,
        lower_bounds: SPLIT_FAILURE_BOUNDS,
        legend_labels: SPLIT_FAILURE_LABELS,
        legend_colors: GOOD_LOW_SCALE,
    },
    MapRangeConfig {
        key: "offPeakSplitFailures",
        field: "sfo",
        label: "Off-Peak Split Failures",
        format_type: Percent,
        decimals: 1,
        lower_bounds: SPLIT_FAILURE_BOUNDS,
        legend_labels: SPLIT_FAILURE_LABELS,
        legend_colors: GOOD_LOW_SCALE,
    },
    MapRangeConfig {
        key: "travelTimeIndex",
        field: "tti",
        label: "Travel Time Index",
        format_type: Number,
        decimals: 2,
        lower_bounds: &[1.0, 1.1, 1.3, 1.5, 2.0],
        legend_labels: &["1.0 - 1.1", "1.1 - 1.3", "1.3 - 1.5", "1.5 - 2.0", "2.0+"],
        legend_colors: GOOD_LOW_SCALE,
    },
    MapRangeConfig {
        key: "planningTimeIndex",
        field: "pti",
        label: "Planning Time Index",
        format_type: Number,
        decimals: 2,
        lower_bounds: &[1.0, 1.2, 1.5, 2.0, 2.5],
        legend_labels: &["1.0 - 1.2", "1.2 - 1.5", "1.5 - 2.0", "2.0 - 2.5", "2.5+"],
        legend_colors: GOOD_LOW_SCALE,
    },
    MapRangeConfig {
        key: "detectorUptime",
        field: "du",
        label: "Detector Uptime",
        format_type: Percent,
        decimals: 1,
        lower_bounds: UPTIME_BOUNDS,
        legend_labels: UPTIME_LABELS,
        legend_colors: UPTIME_SCALE,
    },
    MapRangeConfig {
        key: "pedestrianPushbuttonActivity",
        field: "papd",
        label: "Daily Pedestrian Pushbutton Activity",
        format_type: Number,
        decimals: 0,
        lower_bounds: &[0.0, 100.0, 250.0, 500.0, 750.0],
        legend_labels: &["0 - 99", "100 - 249", "250 - 499", "500 - 749", "750+"],
        legend_colors: CONGESTION_SCALE,
    },
    MapRangeConfig {
        key: "pedestrianPushbuttonUptime",
        field: "pau",
        label: "Pedestrian Pushbutton Uptime",
        format_type: Percent,
        decimals: 1,
        lower_bounds: UPTIME_BOUNDS,
        legend_labels: UPTIME_LABELS,
        legend_colors: UPTIME_SCALE,
    },
    MapRangeConfig {
        key: "cctvUptime",
        field: "cctv",
        label: "CCTV Uptime",
        format_type: Percent,
        decimals: 1,
        lower_bounds: UPTIME_BOUNDS,
        legend_labels: UPTIME_LABELS,
        legend_colors: UPTIME_SCALE,
    },
    MapRangeConfig {
        key: "communicationUptime",
        field: "cu",
        label: "Communication Uptime",
        format_type: Percent,
        decimals: 1,
        lower_bounds: UPTIME_BOUNDS,
        legend_labels: UPTIME_LABELS,
        legend_colors: UPTIME_SCALE,
    },
];

/// Metrics offered on the Operations page, in tab order.
pub const OPERATIONS_METRICS: [&str; 9] = [
    "dailyTrafficVolume",
    "throughput",
    "arrivalsOnGreen",
    "progressionRate",
    "spillbackRate",
    "peakPeriodSplitFailures",
    "offPeakSplitFailures",
    "travelTimeIndex",
    "planningTimeIndex",
];

/// Metrics offered on the Maintenance page, in tab order.
pub const MAINTENANCE_METRICS: [&str; 5] = [
    "detectorUptime",
    "pedestrianPushbuttonActivity",
    "pedestrianPushbuttonUptime",
    "cctvUptime",
    "communicationUptime",
];

pub fn find_range(key: &str) -> Option<&'static MapRangeConfig> {
    MAP_RANGES.iter().find(|r| r.key == key)
}

/// A signal joined with its metric value, ready to place on the map.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapPoint {
    pub signal_id: String,
    pub lat: f64,
    pub lon: f64,
    pub name: String,
    pub value: Option<f64>,
}

/// One legend entry's worth of markers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapTrace {
    pub name: String,
    pub color: String,
    pub lat: Vec<f64>,
    pub lon: Vec<f64>,
    pub text: Vec<String>,
}

impl MapTrace {
    pub fn new(name: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            color: color.into(),
            lat: Vec::new(),
            lon: Vec::new(),
            text: Vec::new(),
        }
    }

    pub fn push(&mut self, point: &MapPoint, text: String) {
        self.lat.push(point.lat);
        self.lon.push(point.lon);
        self.text.push(text);
    }

    pub fn len(&self) -> usize {
        self.lat.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lat.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MapViewport {
    pub center_lat: f64,
    pub center_lon: f64,
    pub zoom: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tables_are_well_formed() {
        for range in MAP_RANGES {
            assert_eq!(range.legend_labels.len(), range.bucket_count(), "{}", range.key);
            assert_eq!(range.legend_colors.len(), range.bucket_count(), "{}", range.key);
            assert!(
                range.lower_bounds.windows(2).all(|w| w[0] < w[1]),
                "{} bounds must ascend",
                range.key
            );
        }
    }

    #[test]
    fn test_every_finite_value_has_exactly_one_bucket() {
        let samples = [-1e9, -0.5, 0.0, 0.05, 0.2, 0.205, 0.21, 1.0, 1.005, 10000.0, 10000.5, 10001.0, 40001.0, 1e12];
        for range in MAP_RANGES {
            for &lower in range.lower_bounds {
                for value in [lower, lower - 1e-9, lower + 1e-9] {
                    let idx = range.bucket_index(value).unwrap();
                    assert!(idx < range.bucket_count());
                }
            }
            for value in samples {
                let idx = range.bucket_index(value).unwrap();
                let containing: Vec<usize> = (0..range.bucket_count())
                    .filter(|&i| {
                        let lo = if i == 0 { f64::NEG_INFINITY } else { range.lower_bounds[i] };
                        let hi = range.lower_bounds.get(i + 1).copied().unwrap_or(f64::INFINITY);
                        value >= lo && value < hi
                    })
                    .collect();
                assert_eq!(containing, vec![idx], "{} value {}", range.key, value);
            }
        }
    }

    #[test]
    fn test_boundaries_are_lower_inclusive() {
        let vpd = find_range("dailyTrafficVolume").unwrap();
        assert_eq!(vpd.bucket_index(10000.0), Some(0));
        assert_eq!(vpd.bucket_index(10001.0), Some(1));
        assert_eq!(vpd.bucket_index(15000.0), Some(1));
        assert_eq!(vpd.bucket_index(5_000_000.0), Some(4));
        assert_eq!(vpd.bucket_index(f64::NAN), None);
    }
}
