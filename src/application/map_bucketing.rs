// Map bucketing - joins signals with metric values and groups them by range
use crate::domain::map::{colors, MapPoint, MapRangeConfig, MapTrace, MapViewport};
use crate::domain::measure::{format_map_value, UNAVAILABLE};
use crate::domain::metric::MetricRecord;
use crate::domain::signal::Signal;
use std::collections::HashMap;

/// Latitude/longitude spans below this are treated as a single location.
const DEGENERATE_SPAN: f64 = 1e-6;
const SINGLE_CLUSTER_ZOOM: f64 = 15.0;
const MIN_ZOOM: f64 = 1.0;
const MAX_ZOOM: f64 = 18.0;

pub const NO_DATA: &str = "No data";

/// Inner join of mappable signals with the records returned for the current
/// filter. Signals without a record are left off the map; a record without a
/// usable average lands in the "Unavailable" group.
pub fn join_signals(signals: &[Signal], records: &[MetricRecord]) -> Vec<MapPoint> {
    let mut by_label: HashMap<&str, Option<f64>> = HashMap::with_capacity(records.len());
    for record in records {
        by_label.entry(record.label.as_str()).or_insert(record.avg);
    }

    signals
        .iter()
        .filter_map(|signal| {
            let value = *by_label.get(signal.signal_id.as_str())?;
            let (lat, lon) = signal.coordinates()?;
            Some(MapPoint {
                signal_id: signal.signal_id.clone(),
                lat,
                lon,
                name: signal.intersection(),
                value,
            })
        })
        .collect()
}

pub fn tooltip(point: &MapPoint, range: &MapRangeConfig) -> String {
    format!(
        "ID: {}<br>{}<br>{}: {}",
        point.signal_id,
        point.name,
        range.label,
        format_map_value(point.value, range.format_type, range.decimals)
    )
}

fn is_unavailable(value: Option<f64>) -> bool {
    match value {
        Some(v) => !v.is_finite() || v == -1.0,
        None => true,
    }
}

/// One trace per non-empty bucket in ascending order, preceded by the
/// "Unavailable" trace when any point lacks a usable value.
pub fn bucket_points(points: &[MapPoint], range: &MapRangeConfig) -> Vec<MapTrace> {
    let mut unavailable = MapTrace::new(UNAVAILABLE, colors::GRAY);
    let mut buckets: Vec<MapTrace> = range
        .legend_labels
        .iter()
        .zip(range.legend_colors)
        .map(|(label, color)| MapTrace::new(*label, *color))
        .collect();

    for point in points {
        let text = tooltip(point, range);
        let index = if is_unavailable(point.value) {
            None
        } else {
            point.value.and_then(|v| range.bucket_index(v))
        };
        match index.and_then(|i| buckets.get_mut(i)) {
            Some(trace) => trace.push(point, text),
            None => unavailable.push(point, text),
        }
    }

    std::iter::once(unavailable)
        .chain(buckets)
        .filter(|trace| !trace.is_empty())
        .collect()
}

/// Centre on the mean of the points and zoom to fit their spread.
pub fn viewport(points: &[MapPoint], default: MapViewport) -> MapViewport {
    if points.is_empty() {
        return default;
    }

    let n = points.len() as f64;
    let center_lat = points.iter().map(|p| p.lat).sum::<f64>() / n;
    let center_lon = points.iter().map(|p| p.lon).sum::<f64>() / n;

    let zoom = if points.len() < 2 {
        default.zoom
    } else {
        fit_zoom(points)
    };

    MapViewport {
        center_lat,
        center_lon,
        zoom,
    }
}

fn fit_zoom(points: &[MapPoint]) -> f64 {
    let span = |values: Vec<f64>| {
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        max - min
    };
    let d_lat = span(points.iter().map(|p| p.lat).collect());
    let d_lon = span(points.iter().map(|p| p.lon).collect());

    let lat_zoom = -1.446 * d_lat.ln() + 8.2753;
    let lon_zoom = -1.415 * d_lon.ln() + 9.7068;

    let zoom = match (d_lat <= DEGENERATE_SPAN, d_lon <= DEGENERATE_SPAN) {
        (true, true) => SINGLE_CLUSTER_ZOOM,
        (true, false) => lon_zoom,
        (false, true) => lat_zoom,
        (false, false) => lat_zoom.min(lon_zoom),
    };
    zoom.clamp(MIN_ZOOM, MAX_ZOOM)
}

/// Every mappable signal with no value attached.
pub fn mappable_points(signals: &[Signal]) -> Vec<MapPoint> {
    signals
        .iter()
        .filter_map(|signal| {
            let (lat, lon) = signal.coordinates()?;
            Some(MapPoint {
                signal_id: signal.signal_id.clone(),
                lat,
                lon,
                name: signal.intersection(),
                value: None,
            })
        })
        .collect()
}

/// Placeholder markers for when the metric fetch failed: every mappable
/// signal in one plainly labelled trace.
pub fn fallback_traces(points: &[MapPoint]) -> Vec<MapTrace> {
    let mut trace = MapTrace::new(NO_DATA, colors::FALLBACK_BLUE);
    for point in points {
        let text = format!("ID: {}<br>{}", point.signal_id, point.name);
        trace.push(point, text);
    }
    if trace.is_empty() { Vec::new() } else { vec![trace] }
}
