pub mod error;
pub mod position;
pub mod value;

pub use error::*;
pub use position::*;
pub use value::*;

/// Leading character that marks cell text as literal even when the rest
/// looks like a formula. Retained by `text()`, stripped by `value()`.
pub const ESCAPE_SIGN: char = '\'';

/// Leading character that marks cell text as formula source.
pub const FORMULA_SIGN: char = '=';
