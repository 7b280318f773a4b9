//! Expression evaluation against a sheet.
//!
//! The value domain during evaluation is `Result<f64, FormulaError>`:
//! formulas compute numbers, and the three value-level errors travel
//! through arithmetic as data. Nothing in here raises.

use gridcalc_common::{CellValue, FormulaError, Position};
use gridcalc_parse::{BinaryOp, Expr, UnaryOp};

/// Read access the interpreter needs from the cell store.
///
/// `None` means no cell is materialized at the position; references to
/// such cells evaluate as `0.0`.
pub trait SheetView {
    fn cell_value(&self, pos: Position) -> Option<CellValue>;
}

/// Evaluate `expr` against `sheet`.
///
/// Error propagation: unary operators pass errors through unchanged; a
/// binary operator reports its left operand's error before its right
/// one; finite arithmetic only, anything else is `#DIV/0!`.
pub fn evaluate(expr: &Expr, sheet: &dyn SheetView) -> Result<f64, FormulaError> {
    match expr {
        Expr::Number { value, .. } => Ok(*value),
        Expr::Ref(pos) => evaluate_reference(*pos, sheet),
        Expr::Unary { op, expr } => {
            let value = evaluate(expr, sheet)?;
            Ok(match op {
                UnaryOp::Plus => value,
                UnaryOp::Minus => -value,
            })
        }
        Expr::Binary { op, left, right } => {
            let left = evaluate(left, sheet);
            let right = evaluate(right, sheet);
            let (left, right) = (left?, right?);
            let result = match op {
                BinaryOp::Add => left + right,
                BinaryOp::Sub => left - right,
                BinaryOp::Mul => left * right,
                BinaryOp::Div => left / right,
            };
            if result.is_finite() {
                Ok(result)
            } else {
                Err(FormulaError::Div0)
            }
        }
    }
}

fn evaluate_reference(pos: Position, sheet: &dyn SheetView) -> Result<f64, FormulaError> {
    if !pos.is_valid() {
        return Err(FormulaError::Ref);
    }
    match sheet.cell_value(pos) {
        None => Ok(0.0),
        Some(CellValue::Number(n)) => Ok(n),
        Some(CellValue::Error(e)) => Err(e),
        Some(CellValue::Text(text)) => coerce_text(&text),
    }
}

/// Empty text reads as zero; otherwise the whole string must parse as a
/// number.
fn coerce_text(text: &str) -> Result<f64, FormulaError> {
    if text.is_empty() {
        return Ok(0.0);
    }
    text.parse::<f64>().map_err(|_| FormulaError::Value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridcalc_parse::parse;
    use std::collections::HashMap;

    #[derive(Default)]
    struct StubSheet {
        cells: HashMap<Position, CellValue>,
    }

    impl StubSheet {
        fn with(mut self, label: &str, value: CellValue) -> Self {
            self.cells.insert(Position::parse(label), value);
            self
        }
    }

    impl SheetView for StubSheet {
        fn cell_value(&self, pos: Position) -> Option<CellValue> {
            self.cells.get(&pos).cloned()
        }
    }

    fn eval(input: &str, sheet: &StubSheet) -> Result<f64, FormulaError> {
        evaluate(&parse(input).unwrap(), sheet)
    }

    #[test]
    fn arithmetic() {
        let sheet = StubSheet::default();
        assert_eq!(eval("1+2*3", &sheet), Ok(7.0));
        assert_eq!(eval("(1+2)*3", &sheet), Ok(9.0));
        assert_eq!(eval("-2-3", &sheet), Ok(-5.0));
        assert_eq!(eval("7/2", &sheet), Ok(3.5));
        assert_eq!(eval("--1", &sheet), Ok(1.0));
        assert_eq!(eval("+5", &sheet), Ok(5.0));
    }

    #[test]
    fn division_by_zero() {
        let sheet = StubSheet::default();
        assert_eq!(eval("1/0", &sheet), Err(FormulaError::Div0));
        assert_eq!(eval("0/0", &sheet), Err(FormulaError::Div0));
        assert_eq!(eval("1/(1-1)", &sheet), Err(FormulaError::Div0));
    }

    #[test]
    fn absent_cells_read_as_zero() {
        let sheet = StubSheet::default();
        assert_eq!(eval("A1", &sheet), Ok(0.0));
        assert_eq!(eval("A1+3", &sheet), Ok(3.0));
    }

    #[test]
    fn text_coercion() {
        let sheet = StubSheet::default()
            .with("A1", CellValue::Text("3.5".into()))
            .with("A2", CellValue::Text(String::new()))
            .with("A3", CellValue::Text("3x".into()))
            .with("A4", CellValue::Text(" 3".into()));
        assert_eq!(eval("A1*2", &sheet), Ok(7.0));
        assert_eq!(eval("A2+1", &sheet), Ok(1.0));
        assert_eq!(eval("A3", &sheet), Err(FormulaError::Value));
        assert_eq!(eval("A4", &sheet), Err(FormulaError::Value));
    }

    #[test]
    fn errors_pass_through_unary() {
        let sheet = StubSheet::default().with("A1", CellValue::Error(FormulaError::Div0));
        assert_eq!(eval("-A1", &sheet), Err(FormulaError::Div0));
        assert_eq!(eval("+A1", &sheet), Err(FormulaError::Div0));
    }

    #[test]
    fn left_error_wins_in_binary() {
        let sheet = StubSheet::default()
            .with("A1", CellValue::Error(FormulaError::Value))
            .with("B1", CellValue::Error(FormulaError::Div0));
        assert_eq!(eval("A1+B1", &sheet), Err(FormulaError::Value));
        assert_eq!(eval("B1+A1", &sheet), Err(FormulaError::Div0));
        assert_eq!(eval("1/0+A1", &sheet), Err(FormulaError::Div0));
    }

    #[test]
    fn invalid_reference_is_ref_error() {
        let sheet = StubSheet::default();
        let expr = Expr::Ref(Position::INVALID);
        assert_eq!(evaluate(&expr, &sheet), Err(FormulaError::Ref));
    }

    #[test]
    fn error_cells_propagate() {
        let sheet = StubSheet::default().with("A1", CellValue::Error(FormulaError::Ref));
        assert_eq!(eval("A1*2", &sheet), Err(FormulaError::Ref));
    }
}
