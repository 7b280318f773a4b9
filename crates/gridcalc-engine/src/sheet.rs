//! The sheet: sole owner of every cell and of the reference graph.
//!
//! Storage is a jagged `Vec<Vec<Option<Cell>>>`. A row exists only while
//! some cell in it is non-null, and trailing nulls are trimmed from rows
//! and trailing empty rows from the table after every mutation that can
//! create them.
//!
//! Forward edges live inside each formula's expression tree; the inverse
//! edges are materialized per cell as sorted position vectors, and this
//! module is the only code that rewires either side.

use std::io::{self, Write};

use rustc_hash::FxHashSet;

use gridcalc_common::{CellValue, Position, SheetError, Size};

use crate::adjuster::{HandlingResult, ShiftOp};
use crate::cell::Cell;
use crate::interpreter::SheetView;

#[derive(Debug, Default)]
pub struct Sheet {
    table: Vec<Vec<Option<Cell>>>,
}

fn shrink_row(row: &mut Vec<Option<Cell>>) {
    while row.last().is_some_and(|slot| slot.is_none()) {
        row.pop();
    }
}

impl SheetView for Sheet {
    fn cell_value(&self, pos: Position) -> Option<CellValue> {
        self.cell_at(pos).map(|cell| cell.value(self))
    }
}

impl Sheet {
    pub fn new() -> Self {
        Sheet::default()
    }

    fn validate(pos: Position) -> Result<(), SheetError> {
        if pos.is_valid() {
            Ok(())
        } else {
            Err(SheetError::InvalidPosition(pos))
        }
    }

    fn cell_at(&self, pos: Position) -> Option<&Cell> {
        self.table
            .get(pos.row as usize)?
            .get(pos.col as usize)?
            .as_ref()
    }

    fn cell_at_mut(&mut self, pos: Position) -> Option<&mut Cell> {
        self.table
            .get_mut(pos.row as usize)?
            .get_mut(pos.col as usize)?
            .as_mut()
    }

    /// Materialize the slot for `pos`, growing the jagged store as
    /// needed.
    fn slot_mut(&mut self, pos: Position) -> &mut Option<Cell> {
        let (row_idx, col_idx) = (pos.row as usize, pos.col as usize);
        if self.table.len() <= row_idx {
            self.table.resize_with(row_idx + 1, Vec::new);
        }
        let row = &mut self.table[row_idx];
        if row.len() <= col_idx {
            row.resize_with(col_idx + 1, || None);
        }
        &mut row[col_idx]
    }

    /// The cell stored at `pos`, or `None` if the slot is empty or
    /// outside the materialized shape.
    pub fn cell(&self, pos: Position) -> Result<Option<&Cell>, SheetError> {
        Self::validate(pos)?;
        Ok(self.cell_at(pos))
    }

    /// Convenience: the memoized value at `pos`, if a cell exists there.
    pub fn value(&self, pos: Position) -> Result<Option<CellValue>, SheetError> {
        Self::validate(pos)?;
        Ok(self.cell_at(pos).map(|cell| cell.value(self)))
    }

    /// Convenience: the canonical text at `pos`, if a cell exists there.
    pub fn text(&self, pos: Position) -> Result<Option<String>, SheetError> {
        Self::validate(pos)?;
        Ok(self.cell_at(pos).map(|cell| cell.text()))
    }

    /// Store `text` at `pos`, parsing formulas and rewiring both edge
    /// directions. Setting the text a cell already renders as is a no-op.
    ///
    /// Fails without touching the sheet if the position is invalid, the
    /// formula does not parse, or installing it would close a cycle.
    pub fn set_cell(&mut self, pos: Position, text: &str) -> Result<(), SheetError> {
        Self::validate(pos)?;

        let existing = self.cell_at(pos);
        if existing.is_some_and(|cell| cell.text() == text) {
            return Ok(());
        }
        let had_incoming = existing.is_some_and(Cell::has_incoming_refs);

        // Parse and cycle-check before mutating anything.
        let mut new_cell = Cell::new(self, pos, text.to_string(), had_incoming)?;

        if self.cell_at(pos).is_some() {
            self.invalidate_from(pos);
            let old_refs = self
                .cell_at(pos)
                .expect("cell present above")
                .referenced_cells();
            self.delete_references_for(pos, &old_refs);
            let old_cell = self.cell_at_mut(pos).expect("cell present above");
            new_cell.set_incoming_refs(old_cell.take_incoming_refs());
        }

        let new_refs = new_cell.referenced_cells();
        *self.slot_mut(pos) = Some(new_cell);

        for target in new_refs {
            let slot = self.slot_mut(target);
            slot.get_or_insert_with(Cell::empty).add_incoming_ref(pos);
        }
        Ok(())
    }

    /// Empty the cell at `pos`. The slot survives as an empty text cell
    /// while other formulas still reference it, so their back edges stay
    /// coherent; otherwise it is removed and the store shrinks.
    pub fn clear_cell(&mut self, pos: Position) -> Result<(), SheetError> {
        Self::validate(pos)?;
        let Some(cell) = self.cell_at(pos) else {
            return Ok(());
        };

        let refs = cell.referenced_cells();
        self.delete_references_for(pos, &refs);

        let keep_slot = self
            .cell_at(pos)
            .expect("cell present above")
            .has_incoming_refs();
        if keep_slot {
            self.invalidate_from(pos);
            self.cell_at_mut(pos)
                .expect("cell present above")
                .clear();
        } else {
            let row = &mut self.table[pos.row as usize];
            row[pos.col as usize] = None;
            shrink_row(row);
            self.shrink_table();
        }
        Ok(())
    }

    /// Insert `count` empty rows before row index `before`.
    pub fn insert_rows(&mut self, before: i32, count: i32) -> Result<(), SheetError> {
        debug_assert!(before >= 0 && count >= 0);
        let rows = self.table.len() as i32;
        let in_the_middle = rows > before;
        let new_rows = if in_the_middle { rows + count } else { before + count };
        if new_rows > Position::MAX_ROWS {
            return Err(SheetError::TableTooBig(Size {
                rows: new_rows,
                cols: self.max_cols(),
            }));
        }
        if !in_the_middle || count == 0 {
            return Ok(());
        }

        self.apply_shift_to_cells(ShiftOp::InsertRows { before, count });
        self.table.splice(
            before as usize..before as usize,
            std::iter::repeat_with(Vec::new).take(count as usize),
        );
        Ok(())
    }

    /// Insert `count` empty columns before column index `before`.
    pub fn insert_cols(&mut self, before: i32, count: i32) -> Result<(), SheetError> {
        debug_assert!(before >= 0 && count >= 0);
        let cols = self.max_cols();
        let in_the_middle = cols > before;
        let new_cols = if in_the_middle { cols + count } else { before + count };
        if new_cols > Position::MAX_COLS {
            return Err(SheetError::TableTooBig(Size {
                rows: self.table.len() as i32,
                cols: new_cols,
            }));
        }
        if !in_the_middle || count == 0 {
            return Ok(());
        }

        self.apply_shift_to_cells(ShiftOp::InsertCols { before, count });
        for row in &mut self.table {
            if row.len() > before as usize {
                row.splice(
                    before as usize..before as usize,
                    std::iter::repeat_with(|| None).take(count as usize),
                );
            }
        }
        Ok(())
    }

    /// Delete `count` rows starting at row index `first`. References
    /// into the range become `#REF!` at their next evaluation.
    pub fn delete_rows(&mut self, first: i32, count: i32) -> Result<(), SheetError> {
        debug_assert!(first >= 0 && count >= 0);
        let in_the_middle = self.table.len() as i32 > first;
        if !in_the_middle || count == 0 {
            return Ok(());
        }

        let start = first as usize;
        let end = (start + count as usize).min(self.table.len());
        self.table.drain(start..end);

        let changed = self.apply_shift_to_cells(ShiftOp::DeleteRows { first, count });
        self.drop_orphaned_cells();
        for pos in changed {
            self.invalidate_from(pos);
        }
        Ok(())
    }

    /// Delete `count` columns starting at column index `first`.
    pub fn delete_cols(&mut self, first: i32, count: i32) -> Result<(), SheetError> {
        debug_assert!(first >= 0 && count >= 0);
        if count == 0 {
            return Ok(());
        }

        let mut in_the_middle = false;
        for row in &mut self.table {
            let start = (first as usize).min(row.len());
            let end = (start + count as usize).min(row.len());
            if start < row.len() {
                in_the_middle = true;
            }
            row.drain(start..end);
        }
        if !in_the_middle {
            return Ok(());
        }

        let changed = self.apply_shift_to_cells(ShiftOp::DeleteCols { first, count });
        self.drop_orphaned_cells();
        for pos in changed {
            self.invalidate_from(pos);
        }
        Ok(())
    }

    /// Smallest bounding box covering every cell with visible content.
    /// Placeholder cells (empty text kept alive by back edges) do not
    /// count.
    pub fn printable_size(&self) -> Size {
        let mut size = Size::default();
        for (row_idx, row) in self.table.iter().enumerate() {
            for (col_idx, slot) in row.iter().enumerate() {
                if slot.as_ref().is_some_and(|cell| !cell.is_empty()) {
                    size.rows = row_idx as i32 + 1;
                    size.cols = size.cols.max(col_idx as i32 + 1);
                }
            }
        }
        size
    }

    /// Render evaluated values, tab-separated, one LF-terminated line per
    /// row of the printable area.
    pub fn print_values<W: Write>(&self, out: &mut W) -> io::Result<()> {
        self.print_with(out, |cell, sheet| cell.value(sheet).to_string())
    }

    /// Render canonical cell texts in the same layout.
    pub fn print_texts<W: Write>(&self, out: &mut W) -> io::Result<()> {
        self.print_with(out, |cell, _| cell.text())
    }

    fn print_with<W: Write>(
        &self,
        out: &mut W,
        render: impl Fn(&Cell, &Sheet) -> String,
    ) -> io::Result<()> {
        let size = self.printable_size();
        for row in self.table.iter().take(size.rows as usize) {
            for col in 0..size.cols as usize {
                if col != 0 {
                    out.write_all(b"\t")?;
                }
                if let Some(cell) = row.get(col).and_then(Option::as_ref) {
                    out.write_all(render(cell, self).as_bytes())?;
                }
            }
            out.write_all(b"\n")?;
        }
        Ok(())
    }

    /// Would a formula at `target` reading `refs` close a cycle?
    ///
    /// With no incoming references the only possible cycle is a direct
    /// self-reference; otherwise walk forward references depth-first.
    pub(crate) fn creates_cycle(
        &self,
        target: Position,
        refs: &[Position],
        has_incoming_refs: bool,
    ) -> bool {
        if !has_incoming_refs {
            return refs.binary_search(&target).is_ok();
        }

        let mut visited = FxHashSet::default();
        let mut stack = refs.to_vec();
        while let Some(pos) = stack.pop() {
            if pos == target {
                return true;
            }
            if !visited.insert(pos) {
                continue;
            }
            if let Some(cell) = self.cell_at(pos) {
                stack.extend(cell.referenced_cells());
            }
        }
        false
    }

    /// Drop cached values starting at `start` and following back edges.
    /// A cell whose cache is already clear stops the walk there: its
    /// dependents cannot be cached either, since evaluating them would
    /// have filled this cache.
    fn invalidate_from(&self, start: Position) {
        let mut queue = vec![start];
        while let Some(pos) = queue.pop() {
            if let Some(cell) = self.cell_at(pos) {
                if cell.invalidate() {
                    queue.extend_from_slice(cell.incoming_refs());
                }
            }
        }
    }

    /// Remove `pos` from the back edges of every cell in `refs`,
    /// dropping targets that end up empty with nobody referencing them.
    fn delete_references_for(&mut self, pos: Position, refs: &[Position]) {
        for &target in refs {
            let row = &mut self.table[target.row as usize];
            let slot = &mut row[target.col as usize];
            if let Some(cell) = slot.as_mut() {
                cell.remove_incoming_ref(pos);
                if cell.is_empty() && !cell.has_incoming_refs() {
                    *slot = None;
                    shrink_row(row);
                }
            }
        }
        self.shrink_table();
    }

    /// Run one shift over every cell; returns the positions (in post-edit
    /// coordinates) whose formulas lost a reference.
    fn apply_shift_to_cells(&mut self, op: ShiftOp) -> Vec<Position> {
        let mut changed = Vec::new();
        for (row_idx, row) in self.table.iter_mut().enumerate() {
            for (col_idx, slot) in row.iter_mut().enumerate() {
                if let Some(cell) = slot.as_mut() {
                    if cell.apply_shift(op) == HandlingResult::ReferencesChanged {
                        changed.push(Position::new(row_idx as i32, col_idx as i32));
                    }
                }
            }
        }
        changed
    }

    /// After a delete: drop cells that became empty with no back edges,
    /// then restore the trimmed-shape invariant.
    fn drop_orphaned_cells(&mut self) {
        for row in &mut self.table {
            for slot in row.iter_mut() {
                if slot
                    .as_ref()
                    .is_some_and(|cell| cell.is_empty() && !cell.has_incoming_refs())
                {
                    *slot = None;
                }
            }
            shrink_row(row);
        }
        self.shrink_table();
    }

    fn shrink_table(&mut self) {
        while self.table.last().is_some_and(|row| row.is_empty()) {
            self.table.pop();
        }
    }

    fn max_cols(&self) -> i32 {
        self.table.iter().map(|row| row.len()).max().unwrap_or(0) as i32
    }
}
