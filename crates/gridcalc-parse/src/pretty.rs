//! Canonical rendering of expression trees.
//!
//! Emits the minimal parenthesization that survives a re-parse: rendering
//! the output again yields the same string, and parsing it yields a tree
//! that evaluates identically. The rules are driven by operator
//! precedence and associativity only; redundant source parentheses are
//! not reproduced.

use gridcalc_common::FormulaError;

use crate::parser::{BinaryOp, Expr};

#[derive(Clone, Copy, PartialEq, Eq)]
enum ChildSide {
    Left,
    Right,
}

fn is_additive(expr: &Expr) -> bool {
    matches!(
        expr,
        Expr::Binary {
            op: BinaryOp::Add | BinaryOp::Sub,
            ..
        }
    )
}

fn is_multiplicative(expr: &Expr) -> bool {
    matches!(
        expr,
        Expr::Binary {
            op: BinaryOp::Mul | BinaryOp::Div,
            ..
        }
    )
}

/// Whether `child` must be wrapped when it sits on `side` of `parent`.
///
/// - `a-b`: the right operand loses to left associativity, so additive
///   right children need parentheses (`1-(2-3)`).
/// - `a*b`: additive children on either side.
/// - `a/b`: additive children on either side, plus multiplicative right
///   children (`1/(2*3)`).
/// - `a+b`: never.
fn needs_parens(parent: BinaryOp, child: &Expr, side: ChildSide) -> bool {
    match parent {
        BinaryOp::Add => false,
        BinaryOp::Sub => side == ChildSide::Right && is_additive(child),
        BinaryOp::Mul => is_additive(child),
        BinaryOp::Div => {
            is_additive(child) || (side == ChildSide::Right && is_multiplicative(child))
        }
    }
}

fn write_child(out: &mut String, child: &Expr, wrap: bool) {
    if wrap {
        out.push('(');
        write_expr(out, child);
        out.push(')');
    } else {
        write_expr(out, child);
    }
}

fn write_expr(out: &mut String, expr: &Expr) {
    match expr {
        Expr::Number { literal, .. } => out.push_str(literal),
        Expr::Ref(pos) => {
            if pos.is_valid() {
                out.push_str(&pos.to_string());
            } else {
                out.push_str(&FormulaError::Ref.to_string());
            }
        }
        Expr::Unary { op, expr } => {
            out.push(op.symbol());
            // Only additive binaries bind looser than a unary sign; a
            // nested unary needs no wrapping (`--1`).
            write_child(out, expr, is_additive(expr));
        }
        Expr::Binary { op, left, right } => {
            write_child(out, left, needs_parens(*op, left, ChildSide::Left));
            out.push(op.symbol());
            write_child(out, right, needs_parens(*op, right, ChildSide::Right));
        }
    }
}

/// Render `expr` in canonical minimal-parentheses form.
pub fn canonical_expression(expr: &Expr) -> String {
    let mut out = String::new();
    write_expr(&mut out, expr);
    out
}
