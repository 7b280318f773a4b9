//! Reference adjustment for structural sheet edits.
//!
//! Row and column insertions/deletions rewrite every stored [`Position`]
//! in place. Each rewrite reports how much it disturbed the formula that
//! owns it, and composite expressions join child reports with `max`, so
//! the caller learns the *worst* disturbance in one pass.

use gridcalc_common::Position;
use gridcalc_parse::Expr;

/// Severity of a structural edit as seen by one formula, ordered so the
/// join of two results is their `max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum HandlingResult {
    NothingChanged,
    /// References moved with the table; they still name the same cells,
    /// so cached values stay correct.
    ReferencesRenamedOnly,
    /// At least one reference now points at a deleted cell.
    ReferencesChanged,
}

/// One structural edit, in the coordinates of the table *before* the
/// edit. `before`/`first` and `count` follow the sheet operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShiftOp {
    InsertRows { before: i32, count: i32 },
    InsertCols { before: i32, count: i32 },
    DeleteRows { first: i32, count: i32 },
    DeleteCols { first: i32, count: i32 },
}

enum DeletedDim {
    Untouched,
    Renumbered(i32),
    Removed,
}

fn inserted_dim(dim: i32, before: i32, count: i32) -> Option<i32> {
    (dim >= before).then_some(dim + count)
}

fn deleted_dim(dim: i32, first: i32, count: i32) -> DeletedDim {
    if dim < first {
        DeletedDim::Untouched
    } else if dim < first + count {
        DeletedDim::Removed
    } else {
        DeletedDim::Renumbered(dim - count)
    }
}

impl ShiftOp {
    /// Rewrite `pos` for this edit. A position inside a deleted range
    /// becomes [`Position::INVALID`]; invalid positions are left alone.
    pub fn apply_to(self, pos: &mut Position) -> HandlingResult {
        if !pos.is_valid() {
            return HandlingResult::NothingChanged;
        }
        match self {
            ShiftOp::InsertRows { before, count } => {
                match inserted_dim(pos.row, before, count) {
                    Some(row) => {
                        pos.row = row;
                        HandlingResult::ReferencesRenamedOnly
                    }
                    None => HandlingResult::NothingChanged,
                }
            }
            ShiftOp::InsertCols { before, count } => {
                match inserted_dim(pos.col, before, count) {
                    Some(col) => {
                        pos.col = col;
                        HandlingResult::ReferencesRenamedOnly
                    }
                    None => HandlingResult::NothingChanged,
                }
            }
            ShiftOp::DeleteRows { first, count } => match deleted_dim(pos.row, first, count) {
                DeletedDim::Untouched => HandlingResult::NothingChanged,
                DeletedDim::Renumbered(row) => {
                    pos.row = row;
                    HandlingResult::ReferencesRenamedOnly
                }
                DeletedDim::Removed => {
                    *pos = Position::INVALID;
                    HandlingResult::ReferencesChanged
                }
            },
            ShiftOp::DeleteCols { first, count } => match deleted_dim(pos.col, first, count) {
                DeletedDim::Untouched => HandlingResult::NothingChanged,
                DeletedDim::Renumbered(col) => {
                    pos.col = col;
                    HandlingResult::ReferencesRenamedOnly
                }
                DeletedDim::Removed => {
                    *pos = Position::INVALID;
                    HandlingResult::ReferencesChanged
                }
            },
        }
    }
}

/// Rewrite every reference in `expr` for `op`, returning the worst
/// per-reference result.
pub fn adjust_expr(expr: &mut Expr, op: ShiftOp) -> HandlingResult {
    match expr {
        Expr::Number { .. } => HandlingResult::NothingChanged,
        Expr::Ref(pos) => op.apply_to(pos),
        Expr::Unary { expr, .. } => adjust_expr(expr, op),
        Expr::Binary { left, right, .. } => adjust_expr(left, op).max(adjust_expr(right, op)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridcalc_parse::{canonical_expression, parse};

    fn shifted(input: &str, op: ShiftOp) -> (String, HandlingResult) {
        let mut expr = parse(input).unwrap();
        let result = adjust_expr(&mut expr, op);
        (canonical_expression(&expr), result)
    }

    #[test]
    fn insert_rows_shifts_at_and_below() {
        let op = ShiftOp::InsertRows { before: 1, count: 2 };
        assert_eq!(
            shifted("B2+C3", op),
            ("B4+C5".to_string(), HandlingResult::ReferencesRenamedOnly)
        );
        // Row 0 sits above the insertion point.
        assert_eq!(
            shifted("A1", op),
            ("A1".to_string(), HandlingResult::NothingChanged)
        );
        // The boundary row shifts too.
        assert_eq!(
            shifted("A2", op),
            ("A4".to_string(), HandlingResult::ReferencesRenamedOnly)
        );
    }

    #[test]
    fn insert_cols_shifts_at_and_right() {
        let op = ShiftOp::InsertCols { before: 1, count: 1 };
        assert_eq!(
            shifted("A1+B1", op),
            ("A1+C1".to_string(), HandlingResult::ReferencesRenamedOnly)
        );
    }

    #[test]
    fn delete_rows_invalidates_the_range() {
        let op = ShiftOp::DeleteRows { first: 1, count: 1 };
        assert_eq!(
            shifted("B2", op),
            ("#REF!".to_string(), HandlingResult::ReferencesChanged)
        );
        // The first deleted row index is inside the range.
        assert_eq!(
            shifted("A2", op),
            ("#REF!".to_string(), HandlingResult::ReferencesChanged)
        );
        // Below the range renumbers only.
        assert_eq!(
            shifted("A3", op),
            ("A2".to_string(), HandlingResult::ReferencesRenamedOnly)
        );
        assert_eq!(
            shifted("A1", op),
            ("A1".to_string(), HandlingResult::NothingChanged)
        );
    }

    #[test]
    fn delete_cols_mirror_the_row_rules() {
        let op = ShiftOp::DeleteCols { first: 0, count: 2 };
        assert_eq!(
            shifted("B5", op),
            ("#REF!".to_string(), HandlingResult::ReferencesChanged)
        );
        assert_eq!(
            shifted("C5", op),
            ("A5".to_string(), HandlingResult::ReferencesRenamedOnly)
        );
    }

    #[test]
    fn composite_result_is_the_worst_child() {
        let op = ShiftOp::DeleteRows { first: 1, count: 1 };
        let (expr, result) = shifted("A1+A2+A3", op);
        assert_eq!(expr, "A1+#REF!+A2");
        assert_eq!(result, HandlingResult::ReferencesChanged);

        let (_, result) = shifted("1+2", op);
        assert_eq!(result, HandlingResult::NothingChanged);
    }

    #[test]
    fn invalid_positions_stay_invalid() {
        let mut pos = Position::INVALID;
        let op = ShiftOp::InsertRows { before: 0, count: 5 };
        assert_eq!(op.apply_to(&mut pos), HandlingResult::NothingChanged);
        assert_eq!(pos, Position::INVALID);
    }

    #[test]
    fn severity_order() {
        use HandlingResult::*;
        assert!(NothingChanged < ReferencesRenamedOnly);
        assert!(ReferencesRenamedOnly < ReferencesChanged);
        assert_eq!(NothingChanged.max(ReferencesChanged), ReferencesChanged);
    }
}
