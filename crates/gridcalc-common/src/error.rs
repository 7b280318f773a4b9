//! Operation-level failures raised by the sheet's public operations.
//!
//! Every variant leaves the sheet unchanged; callers can catch and retry.
//! These never appear inside evaluation results — that is the job of
//! [`crate::value::FormulaError`].

use std::{error::Error, fmt};

use crate::position::{Position, Size};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SheetError {
    /// A position outside the `MAX_ROWS`/`MAX_COLS` grid was passed to a
    /// sheet operation.
    InvalidPosition(Position),
    /// A row/column insertion would grow the table past its limits.
    TableTooBig(Size),
    /// Installing the cell would close a reference cycle.
    CircularDependency(Position),
    /// The formula source did not parse; carries the original expression
    /// text (without the leading formula sign).
    Formula { expression: String, message: String },
}

impl fmt::Display for SheetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SheetError::InvalidPosition(pos) => {
                write!(f, "position ({}, {}) is out of bounds", pos.row, pos.col)
            }
            SheetError::TableTooBig(size) => write!(
                f,
                "table would grow to {}x{}, limit is {}x{}",
                size.rows,
                size.cols,
                Position::MAX_ROWS,
                Position::MAX_COLS
            ),
            SheetError::CircularDependency(pos) => {
                write!(f, "setting {pos} would create a circular dependency")
            }
            SheetError::Formula {
                expression,
                message,
            } => {
                write!(f, "cannot parse formula {expression:?}: {message}")
            }
        }
    }
}

impl Error for SheetError {}
