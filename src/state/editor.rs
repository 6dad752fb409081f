use std::collections::{BTreeMap, BTreeSet};

use serde_json::Value;
use tokio::time::Instant;

use crate::state::column_kind::CellError;
use crate::state::controller::{Damage, GridController};
use crate::state::data_model::Quiver;
use crate::state::selection::GridSelection;
use crate::state::sync::SyncChannel;

#[derive(Clone, Debug, PartialEq)]
pub enum EditOutcome {
    Applied,
    Rejected(CellError),
    /// Read-only grid or cell, or a position outside the grid.
    Ignored,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct PasteOutcome {
    pub applied: usize,
    /// Display `(row, col)` of each cell that failed validation.
    pub rejected: Vec<((usize, usize), CellError)>,
}

enum CellInput<'a> {
    Value(Value),
    Text(&'a str),
}

impl<Q: Quiver> GridController<Q> {
    pub fn is_editable(&self) -> bool {
        self.element.is_editable()
    }

    pub fn on_cell_edited(
        &mut self,
        display_row: usize,
        display_col: usize,
        value: Value,
        now: Instant,
    ) -> EditOutcome {
        if !self.is_editable() {
            return EditOutcome::Ignored;
        }
        let outcome = self.write_cell(display_row, display_col, CellInput::Value(value));
        self.finish_edits(outcome == EditOutcome::Applied, now);
        outcome
    }

    /// Like [`Self::on_cell_edited`] for raw text from an in-cell editor.
    pub fn on_cell_input(
        &mut self,
        display_row: usize,
        display_col: usize,
        input: &str,
        now: Instant,
    ) -> EditOutcome {
        if !self.is_editable() {
            return EditOutcome::Ignored;
        }
        let outcome = self.write_cell(display_row, display_col, CellInput::Text(input));
        self.finish_edits(outcome == EditOutcome::Applied, now);
        outcome
    }

    /// Applies a block of pasted text starting at the target cell. The block
    /// is clipped at the grid bounds and invalid cells are skipped.
    pub fn on_paste(
        &mut self,
        target_row: usize,
        target_col: usize,
        values: &[Vec<String>],
        now: Instant,
    ) -> PasteOutcome {
        let mut outcome = PasteOutcome::default();
        if !self.is_editable() {
            return outcome;
        }
        let num_rows = self.num_rows();
        let num_cols = self.model.columns.len();
        for (r, row_values) in values.iter().enumerate() {
            let row = target_row + r;
            if row >= num_rows {
                break;
            }
            for (c, text) in row_values.iter().enumerate() {
                let col = target_col + c;
                if col >= num_cols {
                    break;
                }
                match self.write_cell(row, col, CellInput::Text(text)) {
                    EditOutcome::Applied => outcome.applied += 1,
                    EditOutcome::Rejected(err) => outcome.rejected.push(((row, col), err)),
                    EditOutcome::Ignored => {}
                }
            }
        }
        self.finish_edits(outcome.applied > 0, now);
        outcome
    }

    /// Appends an empty row in dynamic mode and returns its display row.
    pub fn on_row_appended(&mut self, now: Instant) -> Option<usize> {
        if !self.is_editable() || !self.element.is_dynamic() {
            return None;
        }
        let values: BTreeMap<String, Value> = self
            .model
            .all_columns
            .iter()
            .map(|c| (c.id.clone(), c.default_value()))
            .filter(|(_, value)| !value.is_null())
            .collect();
        let original = self.editing.add_row(values);
        self.resort();

        let display = self.display_row_of(original)?;
        log::debug!("appended row {original} at display row {display}");
        self.scroll_target = Some(display);
        self.damage = Damage::Full;
        self.sync.schedule(SyncChannel::Editing, now);
        Some(display)
    }

    /// Deletes what `selection` covers. Selected rows are removed in dynamic
    /// mode; otherwise selected cells, rows and columns are reset to empty.
    pub fn on_delete(&mut self, selection: &GridSelection, now: Instant) -> bool {
        if !self.is_editable() {
            return false;
        }

        if !selection.rows.is_empty() && self.element.is_dynamic() {
            let logical: Vec<usize> = selection
                .rows
                .iter()
                .filter(|row| **row < self.num_rows())
                .map(|row| self.sort.original_index(*row))
                .collect();
            let removed: BTreeSet<usize> = logical
                .iter()
                .filter_map(|row| self.editing.original_row_index(*row))
                .collect();
            let deleted = self.editing.delete_rows(logical);
            if deleted == 0 {
                return false;
            }
            self.remap_cell_errors(&removed);
            self.resort();
            self.selection.clear_selection(false, false);
            self.damage = Damage::Full;
            self.sync.schedule(SyncChannel::Selection, now);
            self.sync.schedule(SyncChannel::Editing, now);
            return true;
        }

        let num_rows = self.num_rows();
        let num_cols = self.model.columns.len();
        let mut cells = BTreeSet::new();
        if let Some(current) = selection.current.as_ref() {
            cells.extend(current.range.cells());
        }
        for col in &selection.columns {
            cells.extend((0..num_rows).map(|row| (row, *col)));
        }
        for row in &selection.rows {
            cells.extend((0..num_cols).map(|col| (*row, col)));
        }

        let mut cleared = 0;
        for (row, col) in cells {
            if self.clear_cell(row, col) {
                cleared += 1;
            }
        }
        self.finish_edits(cleared > 0, now);
        cleared > 0
    }

    // Appended rows after a removed one shift down, so their errors follow.
    fn remap_cell_errors(&mut self, removed: &BTreeSet<usize>) {
        let first_added = self.editing.num_original_rows();
        self.cell_errors = std::mem::take(&mut self.cell_errors)
            .into_iter()
            .filter(|(row, _)| !removed.contains(row))
            .map(|(row, cells)| {
                if row < first_added {
                    (row, cells)
                } else {
                    (row - removed.range(first_added..row).count(), cells)
                }
            })
            .collect();
    }

    fn clear_cell(&mut self, display_row: usize, display_col: usize) -> bool {
        let Some(column) = self.model.column(display_col).cloned() else {
            return false;
        };
        let Some(row) = self.original_row(display_row) else {
            return false;
        };
        if !self.cell_is_editable(row, &column) {
            return false;
        }
        self.editing.set_cell(row, &column.id, column.kind.empty_value());
        self.clear_cell_error(row, &column.id);
        self.damage_cell(display_row, display_col);
        true
    }

    fn write_cell(&mut self, display_row: usize, display_col: usize, input: CellInput<'_>) -> EditOutcome {
        let Some(column) = self.model.column(display_col).cloned() else {
            return EditOutcome::Ignored;
        };
        let Some(row) = self.original_row(display_row) else {
            return EditOutcome::Ignored;
        };
        if !self.cell_is_editable(row, &column) {
            return EditOutcome::Ignored;
        }

        let result = match input {
            CellInput::Value(value) => column.validate(&value),
            CellInput::Text(text) => column.parse_input(text),
        };
        self.damage_cell(display_row, display_col);
        match result {
            Ok(value) => {
                self.editing.set_cell(row, &column.id, value);
                self.clear_cell_error(row, &column.id);
                EditOutcome::Applied
            }
            Err(err) => {
                log::warn!("rejected edit in column {} row {row}: {err}", column.id);
                self.cell_errors
                    .entry(row)
                    .or_default()
                    .insert(column.id.clone(), err.clone());
                EditOutcome::Rejected(err)
            }
        }
    }

    fn clear_cell_error(&mut self, row: usize, column_id: &str) {
        if let Some(cells) = self.cell_errors.get_mut(&row) {
            cells.remove(column_id);
            if cells.is_empty() {
                self.cell_errors.remove(&row);
            }
        }
    }

    /// Re-sorts if needed and schedules the editing sync after a batch of writes.
    fn finish_edits(&mut self, applied: bool, now: Instant) {
        if !applied {
            return;
        }
        if self.sort.is_sorted() {
            self.resort();
            self.damage = Damage::Full;
        }
        self.sync.schedule(SyncChannel::Editing, now);
    }
}
