//! Meta crate that re-exports the gridcalc building blocks. Downstream
//! users can depend on this crate alone while keeping access to the
//! underlying layers when deeper integration is required.

pub use gridcalc_common as common;
pub use gridcalc_engine as engine;
pub use gridcalc_parse as parse;

pub use gridcalc_common::{
    CellValue, ESCAPE_SIGN, FORMULA_SIGN, FormulaError, Position, SheetError, Size,
};
pub use gridcalc_engine::{Cell, Sheet};

pub mod doc_examples;
