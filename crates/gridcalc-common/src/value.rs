//! Value-level errors and the cell value sum.
//!
//! `FormulaError` values travel *inside* evaluation results — they are
//! data, not failures. Operation-level failures live in
//! [`crate::error::SheetError`].

use std::{error::Error, fmt};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The error kinds a formula can evaluate to.
///
/// Names are CamelCase while `Display` renders the spreadsheet spelling
/// (`#REF!`, ...).
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum FormulaError {
    /// A referenced position is out of bounds.
    Ref,
    /// A referenced cell holds text that is not a number.
    Value,
    /// Arithmetic produced a non-finite result.
    Div0,
}

impl fmt::Display for FormulaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Ref => "#REF!",
            Self::Value => "#VALUE!",
            Self::Div0 => "#DIV/0!",
        })
    }
}

impl Error for FormulaError {}

/// What a cell presents to readers: raw text, a computed number, or the
/// error its formula evaluated to.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(String),
    Number(f64),
    Error(FormulaError),
}

impl Default for CellValue {
    fn default() -> Self {
        CellValue::Text(String::new())
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Text(s) => write!(f, "{s}"),
            CellValue::Number(n) => write!(f, "{n}"),
            CellValue::Error(e) => write!(f, "{e}"),
        }
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

impl From<FormulaError> for CellValue {
    fn from(error: FormulaError) -> Self {
        CellValue::Error(error)
    }
}

impl From<Result<f64, FormulaError>> for CellValue {
    fn from(value: Result<f64, FormulaError>) -> Self {
        match value {
            Ok(n) => CellValue::Number(n),
            Err(e) => CellValue::Error(e),
        }
    }
}
