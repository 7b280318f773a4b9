use crate::{CellValue, Position, Sheet, SheetError};

/// Evaluate a formula in a scratch sheet and return the resulting value.
///
/// This helper is intended for documentation examples to avoid repetitive
/// setup.
///
/// # Example
///
/// ```rust
/// # use gridcalc::doc_examples::eval_scalar;
/// let value = eval_scalar("=1+2*3")?;
/// assert_eq!(value, gridcalc::CellValue::Number(7.0));
/// # Ok::<(), gridcalc::SheetError>(())
/// ```
pub fn eval_scalar(text: &str) -> Result<CellValue, SheetError> {
    let mut sheet = Sheet::new();
    let pos = Position::new(0, 0);
    sheet.set_cell(pos, text)?;
    Ok(sheet
        .value(pos)?
        .expect("the cell was just written"))
}
