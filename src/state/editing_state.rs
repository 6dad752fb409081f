use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::state::columns::Column;

#[derive(Debug, thiserror::Error)]
pub enum StateRestoreError {
    #[error("state parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Serialized form of an [`EditingState`], keyed by column id.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EditingPayload {
    #[serde(default)]
    pub edited_rows: BTreeMap<usize, BTreeMap<String, Value>>,
    #[serde(default)]
    pub added_rows: Vec<BTreeMap<String, Value>>,
    #[serde(default)]
    pub deleted_rows: Vec<usize>,
}

/// Edits, appended rows and deletions layered over an immutable dataset.
///
/// Rows are addressed two ways. An *original* index is stable: source rows
/// keep their dataset position and appended rows follow at
/// `num_original_rows + n`. A *logical* index is the position after deleted
/// rows are removed and before any sorting.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EditingState {
    num_original_rows: usize,
    edited_cells: BTreeMap<usize, BTreeMap<String, Value>>,
    added_rows: Vec<BTreeMap<String, Value>>,
    deleted_rows: BTreeSet<usize>,
    // Logical to original for source rows; empty while nothing is deleted.
    row_map: Vec<usize>,
}

impl EditingState {
    pub fn new(num_original_rows: usize) -> Self {
        Self {
            num_original_rows,
            ..Self::default()
        }
    }

    pub fn num_original_rows(&self) -> usize {
        self.num_original_rows
    }

    pub fn num_rows(&self) -> usize {
        self.num_original_rows - self.deleted_rows.len() + self.added_rows.len()
    }

    pub fn num_added_rows(&self) -> usize {
        self.added_rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edited_cells.is_empty() && self.added_rows.is_empty() && self.deleted_rows.is_empty()
    }

    pub fn is_added_row(&self, original_row: usize) -> bool {
        original_row >= self.num_original_rows
            && original_row - self.num_original_rows < self.added_rows.len()
    }

    pub fn is_deleted(&self, original_row: usize) -> bool {
        self.deleted_rows.contains(&original_row)
    }

    pub fn original_row_index(&self, logical_row: usize) -> Option<usize> {
        let kept = self.num_original_rows - self.deleted_rows.len();
        if logical_row < kept {
            Some(if self.row_map.is_empty() {
                logical_row
            } else {
                self.row_map[logical_row]
            })
        } else if logical_row - kept < self.added_rows.len() {
            Some(self.num_original_rows + logical_row - kept)
        } else {
            None
        }
    }

    pub fn logical_row_index(&self, original_row: usize) -> Option<usize> {
        if original_row < self.num_original_rows {
            if self.is_deleted(original_row) {
                return None;
            }
            Some(original_row - self.deleted_rows.range(..original_row).count())
        } else if self.is_added_row(original_row) {
            Some(original_row - self.deleted_rows.len())
        } else {
            None
        }
    }

    /// Edited value for a cell, `None` to defer to the source dataset.
    pub fn get_cell(&self, original_row: usize, column_id: &str) -> Option<&Value> {
        if original_row >= self.num_original_rows {
            return self
                .added_rows
                .get(original_row - self.num_original_rows)?
                .get(column_id);
        }
        self.edited_cells.get(&original_row)?.get(column_id)
    }

    pub fn set_cell(&mut self, original_row: usize, column_id: &str, value: Value) -> bool {
        if original_row >= self.num_original_rows {
            let Some(row) = self.added_rows.get_mut(original_row - self.num_original_rows) else {
                return false;
            };
            row.insert(column_id.to_string(), value);
            return true;
        }
        if self.is_deleted(original_row) {
            return false;
        }
        self.edited_cells
            .entry(original_row)
            .or_default()
            .insert(column_id.to_string(), value);
        true
    }

    /// Appends a row and returns its original index.
    pub fn add_row(&mut self, values: BTreeMap<String, Value>) -> usize {
        self.added_rows.push(values);
        self.num_original_rows + self.added_rows.len() - 1
    }

    /// Deletes rows by logical index. Appended rows are removed outright,
    /// source rows are tombstoned and lose their edits.
    pub fn delete_rows(&mut self, logical_rows: impl IntoIterator<Item = usize>) -> usize {
        let originals: BTreeSet<usize> = logical_rows
            .into_iter()
            .filter_map(|row| self.original_row_index(row))
            .collect();

        let mut deleted = 0;
        for original in originals.iter().rev() {
            if *original >= self.num_original_rows {
                self.added_rows.remove(original - self.num_original_rows);
            } else {
                self.deleted_rows.insert(*original);
                self.edited_cells.remove(original);
            }
            deleted += 1;
        }
        if deleted > 0 {
            self.rebuild_row_map();
        }
        deleted
    }

    fn rebuild_row_map(&mut self) {
        self.row_map = if self.deleted_rows.is_empty() {
            Vec::new()
        } else {
            (0..self.num_original_rows)
                .filter(|row| !self.deleted_rows.contains(row))
                .collect()
        };
    }

    pub fn to_payload(&self, columns: &[Column]) -> EditingPayload {
        let known: BTreeSet<&str> = columns.iter().map(|c| c.id.as_str()).collect();
        let keep = |row: &BTreeMap<String, Value>| -> BTreeMap<String, Value> {
            row.iter()
                .filter(|(id, _)| known.contains(id.as_str()))
                .map(|(id, value)| (id.clone(), value.clone()))
                .collect()
        };

        EditingPayload {
            edited_rows: self
                .edited_cells
                .iter()
                .map(|(row, cells)| (*row, keep(cells)))
                .filter(|(_, cells)| !cells.is_empty())
                .collect(),
            added_rows: self.added_rows.iter().map(keep).collect(),
            deleted_rows: self.deleted_rows.iter().copied().collect(),
        }
    }

    pub fn to_json(&self, columns: &[Column]) -> String {
        // A map of plain JSON values cannot fail to serialize.
        serde_json::to_string(&self.to_payload(columns)).unwrap_or_default()
    }

    /// Replaces the current edits with a restored payload. Unknown column ids
    /// and rows outside the dataset are skipped.
    pub fn apply_payload(&mut self, payload: EditingPayload, columns: &[Column]) {
        let known: BTreeSet<&str> = columns.iter().map(|c| c.id.as_str()).collect();
        let num_original_rows = self.num_original_rows;
        *self = Self::new(num_original_rows);

        for (row, cells) in payload.edited_rows {
            if row >= num_original_rows {
                continue;
            }
            for (id, value) in cells {
                if known.contains(id.as_str()) {
                    self.set_cell(row, &id, value);
                }
            }
        }
        for row in payload.added_rows {
            self.add_row(
                row.into_iter()
                    .filter(|(id, _)| known.contains(id.as_str()))
                    .collect(),
            );
        }
        for row in payload.deleted_rows {
            if row < num_original_rows {
                self.deleted_rows.insert(row);
                self.edited_cells.remove(&row);
            }
        }
        self.rebuild_row_map();
    }

    pub fn from_json(&mut self, json: &str, columns: &[Column]) -> Result<(), StateRestoreError> {
        let payload: EditingPayload = serde_json::from_str(json)?;
        self.apply_payload(payload, columns);
        Ok(())
    }
}
