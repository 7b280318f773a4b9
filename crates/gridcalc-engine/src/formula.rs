//! The formula a cell owns: one expression tree plus three caches.
//!
//! The caches are independent on purpose. A structural edit that only
//! renumbers references invalidates the serialized form and the
//! reference list but keeps the computed value, because the whole table
//! shifted with the references and the value cannot have changed.

use std::cell::RefCell;

use gridcalc_common::{FormulaError, Position, SheetError};
use gridcalc_parse::{Expr, canonical_expression, parser};

use crate::adjuster::{HandlingResult, ShiftOp, adjust_expr};
use crate::interpreter::{SheetView, evaluate};

#[derive(Debug)]
pub struct Formula {
    root: Expr,
    value_cache: RefCell<Option<Result<f64, FormulaError>>>,
    expression_cache: RefCell<Option<String>>,
    references_cache: RefCell<Option<Vec<Position>>>,
}

impl Formula {
    pub fn new(root: Expr) -> Self {
        Formula {
            root,
            value_cache: RefCell::new(None),
            expression_cache: RefCell::new(None),
            references_cache: RefCell::new(None),
        }
    }

    /// Parse formula source (without the leading formula sign). Any
    /// failure — lexing, syntax, an invalid cell label, a non-finite
    /// number literal — is reported as [`SheetError::Formula`] carrying
    /// the original text.
    pub fn parse(expression: &str) -> Result<Self, SheetError> {
        match parser::parse(expression) {
            Ok(root) => Ok(Formula::new(root)),
            Err(err) => Err(SheetError::Formula {
                expression: expression.to_string(),
                message: err.to_string(),
            }),
        }
    }

    pub fn evaluate(&self, sheet: &dyn SheetView) -> Result<f64, FormulaError> {
        {
            let cache = self.value_cache.borrow();
            if let Some(value) = *cache {
                return value;
            }
        }
        let value = evaluate(&self.root, sheet);
        *self.value_cache.borrow_mut() = Some(value);
        value
    }

    /// Canonical minimal-parentheses form of the expression.
    pub fn expression(&self) -> String {
        {
            let cache = self.expression_cache.borrow();
            if let Some(expression) = cache.as_ref() {
                return expression.clone();
            }
        }
        let expression = canonical_expression(&self.root);
        *self.expression_cache.borrow_mut() = Some(expression.clone());
        expression
    }

    /// Sorted, deduplicated positions this formula reads.
    pub fn referenced_cells(&self) -> Vec<Position> {
        {
            let cache = self.references_cache.borrow();
            if let Some(refs) = cache.as_ref() {
                return refs.clone();
            }
        }
        let refs = self.root.referenced_cells();
        *self.references_cache.borrow_mut() = Some(refs.clone());
        refs
    }

    /// Rewrite references for a structural edit and invalidate caches
    /// according to the result.
    pub fn apply_shift(&mut self, op: ShiftOp) -> HandlingResult {
        let result = adjust_expr(&mut self.root, op);
        if result >= HandlingResult::ReferencesRenamedOnly {
            self.expression_cache.get_mut().take();
            self.references_cache.get_mut().take();
        }
        if result == HandlingResult::ReferencesChanged {
            self.value_cache.get_mut().take();
        }
        result
    }

    /// Drop all three caches; called when a referenced cell's value
    /// changes.
    pub fn invalidate_cache(&self) {
        self.value_cache.borrow_mut().take();
        self.expression_cache.borrow_mut().take();
        self.references_cache.borrow_mut().take();
    }
}
