//! State cells and the values they hold.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::aggregate::RegionSeries;
use crate::archive::Array;
use crate::chart::ChartDescription;

/// Value held by a state cell.
///
/// Cells are loosely typed so that one engine can carry control values,
/// intermediate series and finished charts alike; computations check the
/// variants they expect and treat anything else (typically `Empty` before the
/// first wave) as "no data".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum CellValue {
    #[default]
    Empty,
    Int(i64),
    Float(f64),
    Text(String),
    /// One value per frame.
    Series(Vec<f64>),
    /// One row per frame (e.g. a policy distribution).
    Matrix(Vec<Vec<f64>>),
    Regions(RegionSeries),
    Frame(Array),
    Chart(ChartDescription),
}

impl CellValue {
    pub const fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    pub const fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Numeric view of `Int` and `Float` values.
    #[allow(clippy::cast_precision_loss)]
    pub const fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(v) => Some(*v as f64),
            Self::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_series(&self) -> Option<&[f64]> {
        match self {
            Self::Series(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_matrix(&self) -> Option<&[Vec<f64>]> {
        match self {
            Self::Matrix(v) => Some(v),
            _ => None,
        }
    }

    pub const fn as_regions(&self) -> Option<&RegionSeries> {
        match self {
            Self::Regions(v) => Some(v),
            _ => None,
        }
    }

    pub const fn as_frame(&self) -> Option<&Array> {
        match self {
            Self::Frame(v) => Some(v),
            _ => None,
        }
    }

    pub const fn as_chart(&self) -> Option<&ChartDescription> {
        match self {
            Self::Chart(v) => Some(v),
            _ => None,
        }
    }
}

/// Who may write a cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CellKind {
    /// Written from outside the graph (by the interaction router).
    Source,
    /// Written only by the named computation.
    Derived { producer: String },
}

/// Named, versioned container for a single current value.
#[derive(Debug, Clone)]
pub struct StateCell {
    name: String,
    kind: CellKind,
    value: CellValue,
    version: u64,
    updated_at: Option<DateTime<Utc>>,
}

impl StateCell {
    pub(crate) fn new(name: impl Into<String>, kind: CellKind, initial: CellValue) -> Self {
        Self {
            name: name.into(),
            kind,
            value: initial,
            version: 0,
            updated_at: None,
        }
    }

    pub(crate) fn set(&mut self, value: CellValue) {
        self.value = value;
        self.version += 1;
        self.updated_at = Some(Utc::now());
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn kind(&self) -> &CellKind {
        &self.kind
    }

    #[must_use]
    pub const fn is_source(&self) -> bool {
        matches!(self.kind, CellKind::Source)
    }

    #[must_use]
    pub const fn value(&self) -> &CellValue {
        &self.value
    }

    /// Number of writes since creation. The initial value is version 0.
    #[must_use]
    pub const fn version(&self) -> u64 {
        self.version
    }

    /// Time of the last write, `None` if never written.
    #[must_use]
    pub const fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_bumps_version_and_timestamp() {
        let mut cell = StateCell::new("selected_frame", CellKind::Source, CellValue::Int(0));
        assert_eq!(cell.version(), 0);
        assert!(cell.updated_at().is_none());
        cell.set(CellValue::Int(5));
        cell.set(CellValue::Int(5));
        assert_eq!(cell.version(), 2);
        assert_eq!(cell.value().as_int(), Some(5));
        assert!(cell.updated_at().is_some());
    }

    #[test]
    fn test_accessors_are_variant_checked() {
        assert_eq!(CellValue::Int(3).as_f64(), Some(3.0));
        assert_eq!(CellValue::Float(0.5).as_int(), None);
        assert!(CellValue::Empty.as_series().is_none());
        assert_eq!(CellValue::Text("x".to_string()).as_text(), Some("x"));
    }

    #[test]
    fn test_cell_value_serializes_tagged() {
        let json = serde_json::to_string(&CellValue::Int(7)).unwrap();
        assert_eq!(json, r#"{"type":"int","value":7}"#);
    }
}
