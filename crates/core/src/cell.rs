use serde::{Deserialize, Serialize};
use std::fmt;

/// Number format applied to cells that were never formatted.
pub const GENERAL_FORMAT: &str = "General";

/// A literal cell value as the host reports it.
///
/// Serializes untagged so a grid of values round-trips as a plain JSON
/// array (`null`, numbers, strings, booleans).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    #[default]
    Empty,
    Number(f64),
    Text(String),
    Bool(bool),
}

impl CellValue {
    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.is_empty(),
            _ => false,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) if n.is_finite() => Some(*n),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::Number(n) => write!(f, "{}", n),
            CellValue::Text(s) => write!(f, "{}", s),
            CellValue::Bool(true) => write!(f, "TRUE"),
            CellValue::Bool(false) => write!(f, "FALSE"),
        }
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::Text(s)
    }
}

/// What to write into a cell: a literal or a formula source (`=C2*0.21`).
#[derive(Debug, Clone, PartialEq)]
pub enum CellInput {
    Value(CellValue),
    Formula(String),
}

impl CellInput {
    pub fn text(s: impl Into<String>) -> Self {
        CellInput::Value(CellValue::Text(s.into()))
    }

    pub fn number(n: f64) -> Self {
        CellInput::Value(CellValue::Number(n))
    }

    pub fn empty() -> Self {
        CellInput::Value(CellValue::Empty)
    }
}

/// Contents of a rectangular block, row-major.
///
/// All three grids share the block's dimensions. `formulas[r][c]` is `None`
/// for literal cells.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RangeData {
    pub values: Vec<Vec<CellValue>>,
    pub formulas: Vec<Vec<Option<String>>>,
    pub number_formats: Vec<Vec<String>>,
}

impl RangeData {
    pub fn rows(&self) -> usize {
        self.values.len()
    }

    pub fn cols(&self) -> usize {
        self.values.first().map_or(0, |r| r.len())
    }

    pub fn value(&self, row: usize, col: usize) -> Option<&CellValue> {
        self.values.get(row).and_then(|r| r.get(col))
    }

    /// Per-cell restore instructions: the formula wins over the literal value.
    pub fn to_inputs(&self) -> Vec<Vec<CellInput>> {
        self.values
            .iter()
            .enumerate()
            .map(|(r, row)| {
                row.iter()
                    .enumerate()
                    .map(|(c, value)| {
                        let formula = self
                            .formulas
                            .get(r)
                            .and_then(|f| f.get(c))
                            .and_then(|f| f.as_ref())
                            .filter(|f| !f.is_empty());
                        match formula {
                            Some(f) => CellInput::Formula(f.clone()),
                            None => CellInput::Value(value.clone()),
                        }
                    })
                    .collect()
            })
            .collect()
    }
}
