//! Renderer-agnostic chart descriptions.
//!
//! A [`VisualizationSpec`] is always stored in normalized form: the
//! `horizontalBar` kind never survives construction. It becomes a `bar` chart
//! whose `indexAxis` option is `"y"`, whether the spec was built in code or
//! decoded from a remote payload.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Title used when a spec arrives without one.
pub const DEFAULT_TITLE: &str = "Visualization";

/// Option key that swaps the index axis onto the value axis.
pub const INDEX_AXIS_OPTION: &str = "indexAxis";

/// Chart kinds understood by the rendering collaborator.
///
/// The set is open: a name outside the known kinds is kept verbatim as
/// [`ChartKind::Other`] and handed to the renderer unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ChartKind {
    /// Vertical bars.
    Bar,
    /// Bars along the y axis; normalized to [`ChartKind::Bar`] on construction.
    HorizontalBar,
    /// Line chart.
    Line,
    /// Scatter plot of `{x, y}` points.
    Scatter,
    /// Pie chart.
    Pie,
    /// Doughnut chart.
    Doughnut,
    /// Radar chart.
    Radar,
    /// Any other renderer kind (`polarArea`, `bubble`, ...), by wire name.
    Other(String),
}

impl ChartKind {
    /// Wire name of the kind.
    pub fn as_str(&self) -> &str {
        match self {
            ChartKind::Bar => "bar",
            ChartKind::HorizontalBar => "horizontalBar",
            ChartKind::Line => "line",
            ChartKind::Scatter => "scatter",
            ChartKind::Pie => "pie",
            ChartKind::Doughnut => "doughnut",
            ChartKind::Radar => "radar",
            ChartKind::Other(name) => name,
        }
    }
}

impl std::fmt::Display for ChartKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<String> for ChartKind {
    fn from(name: String) -> Self {
        match name.as_str() {
            "bar" => ChartKind::Bar,
            "horizontalBar" => ChartKind::HorizontalBar,
            "line" => ChartKind::Line,
            "scatter" => ChartKind::Scatter,
            "pie" => ChartKind::Pie,
            "doughnut" => ChartKind::Doughnut,
            "radar" => ChartKind::Radar,
            _ => ChartKind::Other(name),
        }
    }
}

impl From<ChartKind> for String {
    fn from(kind: ChartKind) -> Self {
        match kind {
            ChartKind::Other(name) => name,
            known => known.as_str().to_string(),
        }
    }
}

impl std::str::FromStr for ChartKind {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(ChartKind::from(s.to_string()))
    }
}

/// A single plotted value: a bare number, an `{x, y}` point, or anything
/// else the renderer understands (`null` gaps, bubble radii), kept verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged, deny_unknown_fields)]
pub enum DataPoint {
    /// Value aligned with the label at the same index.
    Value(f64),
    /// Free-standing coordinate (scatter plots).
    Point {
        /// Horizontal coordinate.
        x: f64,
        /// Vertical coordinate.
        y: f64,
    },
    /// Unrecognized shape, passed through untouched.
    Raw(Value),
}

impl DataPoint {
    /// The plotted magnitude (`y` for points), `None` for gaps and shapes
    /// without a number.
    pub fn magnitude(&self) -> Option<f64> {
        match self {
            DataPoint::Value(v) => Some(*v),
            DataPoint::Point { y, .. } => Some(*y),
            DataPoint::Raw(value) => value
                .as_f64()
                .or_else(|| value.get("y").and_then(Value::as_f64)),
        }
    }
}

impl From<f64> for DataPoint {
    fn from(value: f64) -> Self {
        DataPoint::Value(value)
    }
}

/// One dataset within a chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub data: Vec<DataPoint>,
    /// Renderer styling (colors, tension, ...), passed through untouched.
    #[serde(flatten)]
    pub style: Map<String, Value>,
}

impl Series {
    /// Create a series from plain values.
    pub fn new(label: impl Into<String>, values: &[f64]) -> Self {
        Self {
            label: Some(label.into()),
            data: values.iter().copied().map(DataPoint::from).collect(),
            style: Map::new(),
        }
    }

    /// Create an unlabeled series from plain values.
    pub fn unlabeled(values: &[f64]) -> Self {
        Self {
            label: None,
            data: values.iter().copied().map(DataPoint::from).collect(),
            style: Map::new(),
        }
    }

    /// Create a series of `{x, y}` points.
    pub fn points(label: impl Into<String>, points: &[(f64, f64)]) -> Self {
        Self {
            label: Some(label.into()),
            data: points
                .iter()
                .map(|&(x, y)| DataPoint::Point { x, y })
                .collect(),
            style: Map::new(),
        }
    }

    /// Set a styling property.
    pub fn with_style(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.style.insert(key.into(), value.into());
        self
    }
}

/// Dataset-shaped chart payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChartData {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<String>,
    #[serde(default)]
    pub datasets: Vec<Series>,
}

impl ChartData {
    /// Create chart data from labels and series.
    pub fn new<S: Into<String>>(labels: impl IntoIterator<Item = S>, datasets: Vec<Series>) -> Self {
        Self {
            labels: labels.into_iter().map(Into::into).collect(),
            datasets,
        }
    }

    /// Chart data without category labels (scatter plots).
    pub fn unlabeled(datasets: Vec<Series>) -> Self {
        Self {
            labels: Vec::new(),
            datasets,
        }
    }
}

/// Normalized, renderer-agnostic description of a chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawSpec")]
pub struct VisualizationSpec {
    #[serde(rename = "type")]
    kind: ChartKind,
    title: String,
    data: ChartData,
    #[serde(skip_serializing_if = "Map::is_empty")]
    options: Map<String, Value>,
}

/// Wire shape before normalization.
#[derive(Deserialize)]
struct RawSpec {
    #[serde(rename = "type", default)]
    kind: Option<ChartKind>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    data: ChartData,
    #[serde(default)]
    options: Option<Map<String, Value>>,
}

impl From<RawSpec> for VisualizationSpec {
    fn from(raw: RawSpec) -> Self {
        let title = raw
            .title
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_TITLE.to_string());
        VisualizationSpec::new(raw.kind.unwrap_or(ChartKind::Bar), title, raw.data)
            .with_options(raw.options.unwrap_or_default())
    }
}

impl VisualizationSpec {
    /// Build a spec, normalizing `horizontalBar` into `bar` + `indexAxis: "y"`.
    pub fn new(kind: ChartKind, title: impl Into<String>, data: ChartData) -> Self {
        let mut options = Map::new();
        let kind = match kind {
            ChartKind::HorizontalBar => {
                options.insert(INDEX_AXIS_OPTION.to_string(), Value::from("y"));
                ChartKind::Bar
            }
            other => other,
        };

        Self {
            kind,
            title: title.into(),
            data,
            options,
        }
    }

    /// Merge renderer options. The normalized index axis is kept unless the
    /// caller sets `indexAxis` explicitly.
    pub fn with_options(mut self, options: Map<String, Value>) -> Self {
        self.options.extend(options);
        self
    }

    /// Set a single renderer option.
    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    /// Render kind. Never [`ChartKind::HorizontalBar`].
    pub fn kind(&self) -> ChartKind {
        self.kind.clone()
    }

    /// The kind as authored, recovering `horizontalBar` from the index axis.
    pub fn authored_kind(&self) -> ChartKind {
        if self.is_horizontal() {
            ChartKind::HorizontalBar
        } else {
            self.kind.clone()
        }
    }

    /// Whether bars are laid out along the y axis.
    pub fn is_horizontal(&self) -> bool {
        self.kind == ChartKind::Bar
            && self.options.get(INDEX_AXIS_OPTION).and_then(Value::as_str) == Some("y")
    }

    /// Chart title.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Chart payload.
    pub fn data(&self) -> &ChartData {
        &self.data
    }

    /// Category labels.
    pub fn labels(&self) -> &[String] {
        &self.data.labels
    }

    /// Renderer options as set on the spec.
    pub fn options(&self) -> &Map<String, Value> {
        &self.options
    }

    /// Renderer options, falling back to a responsive layout when none were set.
    pub fn render_options(&self) -> Map<String, Value> {
        if self.options.is_empty() {
            let mut defaults = Map::new();
            defaults.insert("responsive".to_string(), Value::Bool(true));
            defaults.insert("maintainAspectRatio".to_string(), Value::Bool(false));
            defaults
        } else {
            self.options.clone()
        }
    }
}
