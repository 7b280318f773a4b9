//! One cell: text or formula, plus the bookkeeping the sheet needs.
//!
//! A cell memoizes the value it presents and records which positions
//! reference it (back edges). Back edges are plain [`Position`]s resolved
//! through the sheet on every traversal — cells never point at each
//! other directly, which is what keeps the ownership story flat and the
//! reference graph verifiably acyclic.

use std::cell::RefCell;

use gridcalc_common::{CellValue, ESCAPE_SIGN, FORMULA_SIGN, Position, SheetError};

use crate::adjuster::{HandlingResult, ShiftOp};
use crate::formula::Formula;
use crate::sheet::Sheet;

#[derive(Debug)]
enum CellData {
    Text(String),
    Formula(Formula),
}

#[derive(Debug)]
pub struct Cell {
    data: CellData,
    /// Positions of cells whose formulas read this one; sorted, unique.
    incoming_refs: Vec<Position>,
    value_cache: RefCell<Option<CellValue>>,
}

impl Cell {
    /// Build a cell from raw text. Text that is empty, starts with the
    /// escape sign, or does not start with the formula sign stays text
    /// verbatim; everything else parses as a formula.
    ///
    /// Formula cells are checked for reference cycles before the sheet
    /// commits to them. `has_incoming_refs` is the fast-path hint: a
    /// fresh cell nobody depends on can only close a cycle through a
    /// direct self-reference, so the transitive walk is skipped.
    pub(crate) fn new(
        sheet: &Sheet,
        pos: Position,
        text: String,
        has_incoming_refs: bool,
    ) -> Result<Self, SheetError> {
        let is_text =
            text.is_empty() || text.starts_with(ESCAPE_SIGN) || !text.starts_with(FORMULA_SIGN);
        let data = if is_text {
            CellData::Text(text)
        } else {
            CellData::Formula(Formula::parse(&text[FORMULA_SIGN.len_utf8()..])?)
        };

        let cell = Cell {
            data,
            incoming_refs: Vec::new(),
            value_cache: RefCell::new(None),
        };
        if let CellData::Formula(formula) = &cell.data {
            if sheet.creates_cycle(pos, &formula.referenced_cells(), has_incoming_refs) {
                return Err(SheetError::CircularDependency(pos));
            }
        }
        Ok(cell)
    }

    /// An empty text cell, used as the placeholder that referenced but
    /// never-written positions materialize into.
    pub(crate) fn empty() -> Self {
        Cell {
            data: CellData::Text(String::new()),
            incoming_refs: Vec::new(),
            value_cache: RefCell::new(None),
        }
    }

    /// The value this cell presents, memoized. Text cells shed one
    /// leading escape sign; formula cells evaluate.
    pub fn value(&self, sheet: &Sheet) -> CellValue {
        {
            let cache = self.value_cache.borrow();
            if let Some(value) = cache.as_ref() {
                return value.clone();
            }
        }
        let value = match &self.data {
            CellData::Text(text) => {
                CellValue::Text(text.strip_prefix(ESCAPE_SIGN).unwrap_or(text).to_string())
            }
            CellData::Formula(formula) => CellValue::from(formula.evaluate(sheet)),
        };
        *self.value_cache.borrow_mut() = Some(value.clone());
        value
    }

    /// The text this cell would be re-entered as: raw text for text
    /// cells, the formula sign plus the canonical expression otherwise.
    pub fn text(&self) -> String {
        match &self.data {
            CellData::Text(text) => text.clone(),
            CellData::Formula(formula) => format!("{FORMULA_SIGN}{}", formula.expression()),
        }
    }

    /// Sorted unique positions this cell's formula reads; empty for text.
    pub fn referenced_cells(&self) -> Vec<Position> {
        match &self.data {
            CellData::Text(_) => Vec::new(),
            CellData::Formula(formula) => formula.referenced_cells(),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(&self.data, CellData::Text(text) if text.is_empty())
    }

    pub fn has_incoming_refs(&self) -> bool {
        !self.incoming_refs.is_empty()
    }

    pub fn incoming_refs(&self) -> &[Position] {
        &self.incoming_refs
    }

    pub(crate) fn add_incoming_ref(&mut self, pos: Position) {
        if let Err(idx) = self.incoming_refs.binary_search(&pos) {
            self.incoming_refs.insert(idx, pos);
        }
    }

    pub(crate) fn remove_incoming_ref(&mut self, pos: Position) {
        if let Ok(idx) = self.incoming_refs.binary_search(&pos) {
            self.incoming_refs.remove(idx);
        }
    }

    pub(crate) fn set_incoming_refs(&mut self, refs: Vec<Position>) {
        self.incoming_refs = refs;
    }

    pub(crate) fn take_incoming_refs(&mut self) -> Vec<Position> {
        std::mem::take(&mut self.incoming_refs)
    }

    /// Demote to an empty text cell. The slot (and its back edges) stays
    /// alive; the sheet decides separately whether to drop it.
    pub(crate) fn clear(&mut self) {
        self.data = CellData::Text(String::new());
        self.value_cache.get_mut().take();
    }

    /// Drop the cached value (and the owned formula's caches). Returns
    /// whether anything was cached, so invalidation walks can stop at
    /// cells that were already clean.
    pub(crate) fn invalidate(&self) -> bool {
        if self.value_cache.borrow().is_none() {
            return false;
        }
        if let CellData::Formula(formula) = &self.data {
            formula.invalidate_cache();
        }
        self.value_cache.borrow_mut().take();
        true
    }

    /// Rewrite back edges and the formula for a structural edit. Back
    /// edges inside a deleted range disappear; the rest renumber. The
    /// returned result is the formula's, so the sheet knows which cells
    /// need transitive invalidation afterwards.
    pub(crate) fn apply_shift(&mut self, op: ShiftOp) -> HandlingResult {
        self.incoming_refs.retain_mut(|pos| {
            op.apply_to(pos);
            pos.is_valid()
        });
        match &mut self.data {
            CellData::Text(_) => HandlingResult::NothingChanged,
            CellData::Formula(formula) => formula.apply_shift(op),
        }
    }
}
