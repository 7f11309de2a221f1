// Chart-ready view building blocks
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KpiCard {
    pub measure: String,
    pub label: String,
    pub unit: String,
    pub value: String,
    pub raw: Option<f64>,
    pub delta: Option<f64>,
    pub error: Option<String>,
}

impl KpiCard {
    pub fn new(measure: String, label: String, unit: String, value: String, raw: Option<f64>) -> Self {
        Self {
            measure,
            label,
            unit,
            value,
            raw,
            delta: None,
            error: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub x: String,
    pub y: f64,
}

impl SeriesPoint {
    pub fn new(x: String, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesData {
    pub name: String,
    pub color: Option<String>,
    pub points: Vec<SeriesPoint>,
}

impl SeriesData {
    pub fn new(name: String, color: Option<String>, points: Vec<SeriesPoint>) -> Self {
        Self { name, color, points }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ChartKind {
    Line,
    HorizontalBar,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartData {
    pub id: String,
    pub title: String,
    pub unit: Option<String>,
    pub kind: ChartKind,
    pub percent: bool,
    pub goal: Option<f64>,
    pub series: Vec<SeriesData>,
}

impl ChartData {
    pub fn new(id: String, title: String, kind: ChartKind, series: Vec<SeriesData>) -> Self {
        Self {
            id,
            title,
            unit: None,
            kind,
            percent: false,
            goal: None,
            series,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.series.iter().all(|s| s.points.is_empty())
    }
}
