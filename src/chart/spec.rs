//! The assembled chart description handed to the renderer and the exporter.

use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A CSS colour string such as `"blue"` or `"#1f77b4"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Color(pub String);

impl Color {
    pub fn new(css: impl Into<String>) -> Self {
        Color(css.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Index of a y-axis, 0 being the primary axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AxisId(pub usize);

impl AxisId {
    pub const PRIMARY: AxisId = AxisId(0);

    pub fn is_primary(self) -> bool {
        self.0 == 0
    }

    /// Plotly trace reference: `y`, `y2`, `y3`, ...
    pub fn trace_ref(self) -> String {
        match self.0 {
            0 => "y".to_string(),
            n => format!("y{}", n + 1),
        }
    }

    /// Plotly layout key: `yaxis`, `yaxis2`, ...
    pub fn layout_key(self) -> String {
        match self.0 {
            0 => "yaxis".to_string(),
            n => format!("yaxis{}", n + 1),
        }
    }
}

/// Axis names are 1-based: `y1`, `y2`, ...
impl fmt::Display for AxisId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "y{}", self.0 + 1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AxisSide {
    Left,
    Right,
}

/// Plotly drawing mode of a trace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TraceMode {
    #[default]
    Lines,
}

impl TraceMode {
    pub fn as_str(self) -> &'static str {
        match self {
            TraceMode::Lines => "lines",
        }
    }
}

/// One plotted series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trace {
    /// Legend label.
    pub name: String,
    /// Shared-axis timestamps; `None` for rows without one.
    pub x: Vec<Option<NaiveDateTime>>,
    /// Values; `None` where the cell is empty or not numeric.
    pub y: Vec<Option<f64>>,
    pub color: Color,
    pub axis: AxisId,
    pub mode: TraceMode,
}

/// One y-axis configuration record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AxisConfig {
    pub id: AxisId,
    pub title: String,
    pub side: AxisSide,
    /// Axis this one is drawn on top of; `None` for the primary axis.
    pub overlaying: Option<AxisId>,
    /// Fractional horizontal offset; `None` for the primary axis.
    pub position: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct XAxisConfig {
    pub title: String,
}

/// Complete, immutable description of a multi-axis line chart.
///
/// `y_axes[i]` and `traces[i]` belong to selection `i`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSpec {
    pub title: String,
    pub x_axis: XAxisConfig,
    pub y_axes: Vec<AxisConfig>,
    pub traces: Vec<Trace>,
}

impl ChartSpec {
    /// Traces drawn against `id`.
    pub fn traces_on(&self, id: AxisId) -> impl Iterator<Item = &Trace> + '_ {
        self.traces.iter().filter(move |t| t.axis == id)
    }
}
