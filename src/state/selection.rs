use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::state::columns::Column;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SelectionMode {
    SingleRow,
    MultiRow,
    SingleColumn,
    MultiColumn,
    SingleCell,
    MultiCell,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Multiplicity {
    Single,
    Multi,
}

/// Which selection axes are active, and how many items each accepts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SelectionConfig {
    pub row: Option<Multiplicity>,
    pub column: Option<Multiplicity>,
    pub cell: Option<Multiplicity>,
}

impl SelectionConfig {
    pub fn from_modes(modes: &[SelectionMode]) -> Self {
        let mut config = Self::default();
        for mode in modes {
            match mode {
                SelectionMode::SingleRow => {
                    config.row.get_or_insert(Multiplicity::Single);
                }
                SelectionMode::MultiRow => config.row = Some(Multiplicity::Multi),
                SelectionMode::SingleColumn => {
                    config.column.get_or_insert(Multiplicity::Single);
                }
                SelectionMode::MultiColumn => config.column = Some(Multiplicity::Multi),
                SelectionMode::SingleCell => {
                    config.cell.get_or_insert(Multiplicity::Single);
                }
                SelectionMode::MultiCell => config.cell = Some(Multiplicity::Multi),
            }
        }
        config
    }

    pub fn is_active(&self) -> bool {
        self.row.is_some() || self.column.is_some() || self.cell.is_some()
    }
}

/// How two selection axes interact when one of them changes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Blending {
    /// Selecting on one axis clears the other.
    #[default]
    Exclusive,
    Mixed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SelectionBlending {
    pub row_column: Blending,
    pub row_cell: Blending,
    pub column_cell: Blending,
}

impl SelectionBlending {
    /// Rows and columns may be combined when both are active; cell ranges
    /// never mix with either.
    pub fn for_config(config: &SelectionConfig) -> Self {
        let row_column = if config.row.is_some() && config.column.is_some() {
            Blending::Mixed
        } else {
            Blending::Exclusive
        };
        Self {
            row_column,
            row_cell: Blending::Exclusive,
            column_cell: Blending::Exclusive,
        }
    }
}

/// Rectangle of cells in display coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CellRange {
    pub x: usize,
    pub y: usize,
    pub width: usize,
    pub height: usize,
}

impl CellRange {
    pub fn single(row: usize, col: usize) -> Self {
        Self {
            x: col,
            y: row,
            width: 1,
            height: 1,
        }
    }

    /// `(row, col)` pairs in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        (self.y..self.y + self.height)
            .flat_map(move |row| (self.x..self.x + self.width).map(move |col| (row, col)))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CellSelection {
    /// Anchor cell as `(row, col)`.
    pub cell: (usize, usize),
    pub range: CellRange,
}

impl CellSelection {
    pub fn single(row: usize, col: usize) -> Self {
        Self {
            cell: (row, col),
            range: CellRange::single(row, col),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GridSelection {
    pub rows: BTreeSet<usize>,
    pub columns: BTreeSet<usize>,
    pub current: Option<CellSelection>,
}

impl GridSelection {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty() && self.columns.is_empty() && self.current.is_none()
    }
}

/// Wire shape of the selection sync payload.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionPayload {
    #[serde(default)]
    pub rows: Vec<usize>,
    #[serde(default)]
    pub columns: Vec<String>,
    #[serde(default)]
    pub cells: Vec<(usize, String)>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SelectionHandler {
    config: SelectionConfig,
    blending: SelectionBlending,
    selection: GridSelection,
}

impl SelectionHandler {
    pub fn new(config: SelectionConfig) -> Self {
        Self::with_blending(config, SelectionBlending::for_config(&config))
    }

    pub fn with_blending(config: SelectionConfig, blending: SelectionBlending) -> Self {
        Self {
            config,
            blending,
            selection: GridSelection::default(),
        }
    }

    pub fn config(&self) -> &SelectionConfig {
        &self.config
    }

    pub fn selection(&self) -> &GridSelection {
        &self.selection
    }

    pub fn is_row_selection_activated(&self) -> bool {
        self.config.row.is_some()
    }

    pub fn is_column_selection_activated(&self) -> bool {
        self.config.column.is_some()
    }

    pub fn is_cell_selection_activated(&self) -> bool {
        self.config.cell.is_some()
    }

    /// Normalizes a selection reported by the grid engine and stores it.
    /// Returns whether the stored selection changed.
    pub fn on_selection_change(&mut self, incoming: GridSelection) -> bool {
        let previous = &self.selection;

        let mut rows = match self.config.row {
            Some(multiplicity) => limit(&previous.rows, incoming.rows, multiplicity),
            None => BTreeSet::new(),
        };
        let mut columns = match self.config.column {
            Some(multiplicity) => limit(&previous.columns, incoming.columns, multiplicity),
            None => BTreeSet::new(),
        };
        let mut current = match self.config.cell {
            Some(Multiplicity::Multi) => incoming.current,
            Some(Multiplicity::Single) => incoming
                .current
                .map(|sel| CellSelection::single(sel.cell.0, sel.cell.1)),
            None => None,
        };

        let rows_changed = !rows.is_empty() && rows != previous.rows;
        let columns_changed = !columns.is_empty() && columns != previous.columns;
        let cell_changed = current.is_some() && current != previous.current;

        if self.blending.row_cell == Blending::Exclusive {
            if rows_changed {
                current = None;
            } else if cell_changed {
                rows.clear();
            }
        }
        if self.blending.column_cell == Blending::Exclusive {
            if columns_changed {
                current = None;
            } else if cell_changed {
                columns.clear();
            }
        }
        if self.blending.row_column == Blending::Exclusive {
            if rows_changed {
                columns.clear();
            } else if columns_changed {
                rows.clear();
            }
        }

        let next = GridSelection {
            rows,
            columns,
            current,
        };
        if next == self.selection {
            return false;
        }
        log::debug!(
            "selection changed: {} rows, {} columns, cell range: {}",
            next.rows.len(),
            next.columns.len(),
            next.current.is_some()
        );
        self.selection = next;
        true
    }

    pub fn clear_selection(&mut self, keep_rows: bool, keep_columns: bool) -> bool {
        let before = self.selection.clone();
        if !keep_rows {
            self.selection.rows.clear();
        }
        if !keep_columns {
            self.selection.columns.clear();
        }
        self.selection.current = None;
        before != self.selection
    }

    /// Builds the sync payload. `original_row` maps display rows to the
    /// indices reported to the backend.
    pub fn to_payload(
        &self,
        columns: &[Column],
        original_row: impl Fn(usize) -> usize,
    ) -> SelectionPayload {
        let column_id = |col: usize| columns.get(col).map(|c| c.id.clone());
        let mut cells = Vec::new();
        if let Some(current) = self.selection.current.as_ref() {
            for (row, col) in current.range.cells() {
                if let Some(id) = column_id(col) {
                    cells.push((original_row(row), id));
                }
            }
        }
        let mut rows: Vec<usize> = self.selection.rows.iter().map(|r| original_row(*r)).collect();
        rows.sort_unstable();

        SelectionPayload {
            rows,
            columns: self
                .selection
                .columns
                .iter()
                .filter_map(|c| column_id(*c))
                .collect(),
            cells,
        }
    }

    /// Restores a persisted selection. Columns are matched by id since their
    /// order may have changed; `display_row` maps stored rows back to display
    /// positions and rejects rows that no longer exist.
    pub fn restore(
        &mut self,
        payload: &SelectionPayload,
        columns: &[Column],
        display_row: impl Fn(usize) -> Option<usize>,
    ) {
        let position = |id: &str| columns.iter().position(|c| c.id == id);

        let rows = payload.rows.iter().filter_map(|r| display_row(*r)).collect();
        let column_set = payload
            .columns
            .iter()
            .filter_map(|id| position(id.as_str()))
            .collect();
        let cells: Vec<(usize, usize)> = payload
            .cells
            .iter()
            .filter_map(|(row, id)| Some((display_row(*row)?, position(id.as_str())?)))
            .collect();
        let current = cells.first().map(|first| {
            let min_row = cells.iter().map(|c| c.0).min().unwrap_or(first.0);
            let max_row = cells.iter().map(|c| c.0).max().unwrap_or(first.0);
            let min_col = cells.iter().map(|c| c.1).min().unwrap_or(first.1);
            let max_col = cells.iter().map(|c| c.1).max().unwrap_or(first.1);
            CellSelection {
                cell: *first,
                range: CellRange {
                    x: min_col,
                    y: min_row,
                    width: max_col - min_col + 1,
                    height: max_row - min_row + 1,
                },
            }
        });

        self.selection = GridSelection::default();
        self.on_selection_change(GridSelection {
            rows,
            columns: column_set,
            current,
        });
    }
}

/// Applies single/multi limits. In single mode the newest item wins.
fn limit(
    previous: &BTreeSet<usize>,
    incoming: BTreeSet<usize>,
    multiplicity: Multiplicity,
) -> BTreeSet<usize> {
    if multiplicity == Multiplicity::Multi || incoming.len() <= 1 {
        return incoming;
    }
    let newest = incoming
        .difference(previous)
        .last()
        .or_else(|| incoming.iter().next_back())
        .copied();
    newest.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(items: &[usize]) -> BTreeSet<usize> {
        items.iter().copied().collect()
    }

    #[test]
    fn single_row_mode_keeps_newest_row() {
        let mut handler = SelectionHandler::new(SelectionConfig::from_modes(&[SelectionMode::SingleRow]));
        handler.on_selection_change(GridSelection {
            rows: rows(&[2]),
            ..GridSelection::default()
        });
        handler.on_selection_change(GridSelection {
            rows: rows(&[2, 5]),
            ..GridSelection::default()
        });
        assert_eq!(handler.selection().rows, rows(&[5]));
    }

    #[test]
    fn inactive_axes_stay_empty() {
        let mut handler = SelectionHandler::new(SelectionConfig::from_modes(&[SelectionMode::MultiRow]));
        handler.on_selection_change(GridSelection {
            rows: rows(&[1]),
            columns: rows(&[0]),
            current: Some(CellSelection::single(1, 1)),
        });
        assert_eq!(handler.selection().rows, rows(&[1]));
        assert!(handler.selection().columns.is_empty());
        assert!(handler.selection().current.is_none());
    }
}
