//! Declarative chart descriptions handed to the external renderer.
//!
//! A chart is a list of named series plus a layout. Styling is typed: series
//! kind, color, stacking group and axis side are enumerated rather than free
//! form. Every point is sanitized so the renderer never sees NaN or infinity.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Replaces non-finite values with `0`.
#[must_use]
pub fn finite_or_zero(v: f64) -> f64 {
    if v.is_finite() {
        v
    } else {
        0.0
    }
}

/// RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    /// Actor saliency series color.
    pub const ACTOR: Self = Self::rgb(24, 12, 205);
    /// Critic saliency series color.
    pub const CRITIC: Self = Self::rgb(205, 12, 24);
    /// Neutral color for markers and summaries.
    pub const NEUTRAL: Self = Self::rgb(90, 90, 90);

    #[must_use]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgb({}, {}, {})", self.r, self.g, self.b)
    }
}

/// How a series is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeriesKind {
    Line,
    Area,
    Bar,
    Markers,
}

/// Which y axis a series is plotted against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AxisSide {
    #[default]
    Primary,
    Secondary,
}

/// Style hints for one series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesStyle {
    pub kind: SeriesKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<Color>,
    /// Series sharing a stack group are stacked on top of each other.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack_group: Option<String>,
    #[serde(default)]
    pub axis: AxisSide,
    /// `(row, col)` subplot cell, 1-based, for multi-panel charts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subplot: Option<(u8, u8)>,
}

impl SeriesStyle {
    #[must_use]
    pub const fn new(kind: SeriesKind) -> Self {
        Self {
            kind,
            color: None,
            stack_group: None,
            axis: AxisSide::Primary,
            subplot: None,
        }
    }

    #[must_use]
    pub const fn color(mut self, color: Color) -> Self {
        self.color = Some(color);
        self
    }

    #[must_use]
    pub fn stacked(mut self, group: impl Into<String>) -> Self {
        self.stack_group = Some(group.into());
        self
    }

    #[must_use]
    pub const fn secondary(mut self) -> Self {
        self.axis = AxisSide::Secondary;
        self
    }

    #[must_use]
    pub const fn subplot(mut self, row: u8, col: u8) -> Self {
        self.subplot = Some((row, col));
        self
    }
}

/// A named, ordered list of `(x, y)` points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    pub name: String,
    pub points: Vec<(f64, f64)>,
    pub style: SeriesStyle,
}

impl Series {
    /// Builds a series from explicit points.
    #[must_use]
    pub fn new(name: impl Into<String>, points: impl IntoIterator<Item = (f64, f64)>, style: SeriesStyle) -> Self {
        Self {
            name: name.into(),
            points: points
                .into_iter()
                .map(|(x, y)| (finite_or_zero(x), finite_or_zero(y)))
                .collect(),
            style,
        }
    }

    /// Builds a series whose x values are the frame indices `0..len`.
    #[must_use]
    pub fn indexed(name: impl Into<String>, values: &[f64], style: SeriesStyle) -> Self {
        #[allow(clippy::cast_precision_loss)]
        let points = values.iter().enumerate().map(|(t, &y)| (t as f64, y));
        Self::new(name, points, style)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Axis title and optional fixed range.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Axis {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<(f64, f64)>,
}

impl Axis {
    #[must_use]
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            range: None,
        }
    }

    #[must_use]
    pub const fn range(mut self, lo: f64, hi: f64) -> Self {
        self.range = Some((lo, hi));
        self
    }
}

/// Chart-level layout.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Layout {
    pub title: String,
    pub x_axis: Axis,
    pub y_axis: Axis,
    /// Clicks on this chart are routed back as events.
    pub click_enabled: bool,
    /// Titles of subplot panels, row-major.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subplot_titles: Vec<String>,
}

/// Everything the renderer needs to draw one chart.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChartDescription {
    /// Chart identity; click events from this chart carry it as their source.
    pub id: String,
    pub series: Vec<Series>,
    pub layout: Layout,
}

impl ChartDescription {
    /// Starts a chart with the given id and title.
    #[must_use]
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            series: Vec::new(),
            layout: Layout {
                title: title.into(),
                ..Layout::default()
            },
        }
    }

    #[must_use]
    pub fn x_axis(mut self, axis: Axis) -> Self {
        self.layout.x_axis = axis;
        self
    }

    #[must_use]
    pub fn y_axis(mut self, axis: Axis) -> Self {
        self.layout.y_axis = axis;
        self
    }

    #[must_use]
    pub const fn clickable(mut self) -> Self {
        self.layout.click_enabled = true;
        self
    }

    #[must_use]
    pub fn subplot_titles(mut self, titles: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.layout.subplot_titles = titles.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_series(mut self, series: Series) -> Self {
        self.series.push(series);
        self
    }

    pub fn push(&mut self, series: Series) {
        self.series.push(series);
    }

    /// Looks up a series by name.
    #[must_use]
    pub fn series_named(&self, name: &str) -> Option<&Series> {
        self.series.iter().find(|s| s.name == name)
    }

    /// Serializes for the renderer.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
