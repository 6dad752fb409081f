use std::collections::BTreeMap;
use std::time::Duration;

use serde_json::{Map, Value};
use tokio::time::Instant;

use crate::state::column_config::{ColumnConfig, ColumnConfigOverrides, ColumnWidth, TypeConfigPatch};
use crate::state::column_kind::CellError;
use crate::state::columns::{self, Column, ColumnLoadRequest, ColumnModel};
use crate::state::data_model::{Dimensions, Quiver};
use crate::state::editing_state::{EditingPayload, EditingState};
use crate::state::element::{DataFrameElement, GridOptions};
use crate::state::export::{self, ExportError};
use crate::state::selection::{
    GridSelection, SelectionConfig, SelectionHandler, SelectionPayload,
};
use crate::state::sort::{ColumnSort, SortDirection, SortSpec};
use crate::state::sync::{SyncChannel, SyncPoll, WidgetStateManager, WidgetStateSync};

/// Resolved content of one visible cell.
#[derive(Clone, Debug, PartialEq)]
pub struct GridCell {
    pub value: Value,
    pub display: String,
    pub is_editable: bool,
    pub is_added: bool,
    pub error: Option<CellError>,
}

/// Cells the rendering engine must repaint.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Damage {
    #[default]
    None,
    Cells(Vec<(usize, usize)>),
    Full,
}

/// Per-table owner of editing, sort, selection and column state.
pub struct GridController<Q: Quiver> {
    pub(crate) element: DataFrameElement,
    pub(crate) options: GridOptions,
    pub(crate) data: Q,
    pub(crate) overrides: ColumnConfigOverrides,
    pub(crate) column_order: Vec<String>,
    pub(crate) model: ColumnModel,
    pub(crate) editing: EditingState,
    pub(crate) sort: ColumnSort,
    pub(crate) selection: SelectionHandler,
    pub(crate) sync: WidgetStateSync,
    // Keyed by original row, then column id.
    pub(crate) cell_errors: BTreeMap<usize, BTreeMap<String, CellError>>,
    pub(crate) damage: Damage,
    pub(crate) scroll_target: Option<usize>,
    is_fullscreen: bool,
}

impl<Q: Quiver> GridController<Q> {
    /// Builds the controller, restores state persisted under the element's
    /// widget id, and pushes the initial state once.
    pub fn new(
        element: DataFrameElement,
        data: Q,
        options: GridOptions,
        manager: &mut dyn WidgetStateManager,
    ) -> Self {
        let num_rows = data.dimensions().num_data_rows;
        let mut controller = Self {
            overrides: ColumnConfigOverrides::new(),
            column_order: element.column_order.clone(),
            model: ColumnModel::default(),
            editing: EditingState::new(num_rows),
            sort: ColumnSort::new(),
            selection: SelectionHandler::new(SelectionConfig::from_modes(&element.selection_mode)),
            sync: WidgetStateSync::new(
                element.id.clone(),
                element.fragment_id.clone(),
                options.debounce,
            ),
            cell_errors: BTreeMap::new(),
            damage: Damage::Full,
            scroll_target: None,
            is_fullscreen: false,
            element,
            options,
            data,
        };
        controller.reload_columns();
        controller.restore(manager);

        let selection = controller.render_part(SyncChannel::Selection);
        let editing = controller.render_part(SyncChannel::Editing);
        controller.sync.establish_initial(manager, selection, editing);
        controller
    }

    fn restore(&mut self, manager: &dyn WidgetStateManager) {
        let Some(raw) = manager.get_string_value(&self.element.id) else {
            return;
        };
        let stored: Value = match serde_json::from_str(&raw) {
            Ok(value) => value,
            Err(err) => {
                log::warn!("discarding unreadable state for widget {}: {err}", self.element.id);
                return;
            }
        };

        match serde_json::from_value::<EditingPayload>(stored.clone()) {
            Ok(payload) => {
                self.editing.apply_payload(payload, &self.model.all_columns);
            }
            Err(err) => {
                log::warn!("discarding editing state for widget {}: {err}", self.element.id);
                self.editing = EditingState::new(self.data.dimensions().num_data_rows);
            }
        }

        if let Some(selection) = stored.get("selection") {
            match serde_json::from_value::<SelectionPayload>(selection.clone()) {
                Ok(payload) => {
                    let editing = &self.editing;
                    let sort = &self.sort;
                    self.selection.restore(&payload, &self.model.columns, |original| {
                        editing
                            .logical_row_index(original)
                            .map(|logical| sort.display_index(logical))
                    });
                }
                Err(err) => {
                    log::warn!("discarding selection for widget {}: {err}", self.element.id);
                }
            }
        }
    }

    /// Swaps in a new element and dataset. A changed row count starts editing,
    /// sort and selection over in the same step.
    pub fn replace_data(&mut self, element: DataFrameElement, data: Q, now: Instant) {
        let num_rows = data.dimensions().num_data_rows;
        if num_rows != self.editing.num_original_rows() {
            self.editing = EditingState::new(num_rows);
            self.sort.clear();
            self.selection.clear_selection(false, false);
            self.cell_errors.clear();
            self.scroll_target = None;
        }
        if element.column_order != self.element.column_order {
            self.column_order = element.column_order.clone();
        }
        if element.selection_mode != self.element.selection_mode {
            self.selection =
                SelectionHandler::new(SelectionConfig::from_modes(&element.selection_mode));
        }
        self.element = element;
        self.data = data;
        self.reload_columns();
        let model = &self.model;
        self.cell_errors.retain(|_, cells| {
            cells.retain(|id, _| model.all_columns.iter().any(|c| &c.id == id));
            !cells.is_empty()
        });
        self.resort();
        self.damage = Damage::Full;
        self.sync.schedule(SyncChannel::Selection, now);
        self.sync.schedule(SyncChannel::Editing, now);
    }

    pub(crate) fn reload_columns(&mut self) {
        let sortable = self.is_sortable();
        self.model = columns::load_columns(&ColumnLoadRequest {
            schema: self.data.schema(),
            element: &self.element,
            column_order: &self.column_order,
            overrides: &self.overrides,
            sortable,
        });
        if let Some(spec) = self.sort.spec() {
            if self.model.display_index_of(&spec.column).is_none() {
                self.sort.clear();
            }
        }
        self.damage = Damage::Full;
    }

    pub fn element(&self) -> &DataFrameElement {
        &self.element
    }

    pub fn options(&self) -> &GridOptions {
        &self.options
    }

    pub fn data(&self) -> &Q {
        &self.data
    }

    pub fn dimensions(&self) -> Dimensions {
        self.data.dimensions()
    }

    pub fn editing_state(&self) -> &EditingState {
        &self.editing
    }

    pub fn num_rows(&self) -> usize {
        self.editing.num_rows()
    }

    pub fn columns(&self) -> &[Column] {
        &self.model.columns
    }

    pub fn all_columns(&self) -> &[Column] {
        &self.model.all_columns
    }

    pub fn overrides(&self) -> &ColumnConfigOverrides {
        &self.overrides
    }

    pub fn is_empty(&self) -> bool {
        self.num_rows() == 0
    }

    pub fn is_sortable(&self) -> bool {
        let num_rows = self.editing.num_rows();
        num_rows > 0
            && num_rows <= self.options.large_table_rows
            && !(self.element.is_dynamic() && self.element.is_editable())
    }

    // ---- cell content ----

    /// Original row index shown at `display_row`.
    pub fn original_row(&self, display_row: usize) -> Option<usize> {
        if display_row >= self.editing.num_rows() {
            return None;
        }
        self.editing
            .original_row_index(self.sort.original_index(display_row))
    }

    pub(crate) fn effective_value(&self, original_row: usize, column: &Column) -> Value {
        if let Some(value) = self.editing.get_cell(original_row, &column.id) {
            return value.clone();
        }
        if original_row >= self.editing.num_original_rows() {
            return Value::Null;
        }
        self.data
            .cell(original_row, column.original_index)
            .cloned()
            .unwrap_or(Value::Null)
    }

    pub(crate) fn cell_is_editable(&self, original_row: usize, column: &Column) -> bool {
        if column.is_editable {
            return true;
        }
        column.is_index
            && column.kind.is_editable()
            && self.element.is_editable()
            && self.editing.is_added_row(original_row)
    }

    pub fn get_cell_content(&self, display_row: usize, display_col: usize) -> Option<GridCell> {
        let column = self.model.column(display_col)?;
        let row = self.original_row(display_row)?;
        let value = self.effective_value(row, column);
        Some(GridCell {
            display: column.format(&value),
            is_editable: self.cell_is_editable(row, column),
            is_added: self.editing.is_added_row(row),
            error: self
                .cell_errors
                .get(&row)
                .and_then(|cells| cells.get(&column.id))
                .cloned(),
            value,
        })
    }

    pub fn cell_error(&self, display_row: usize, display_col: usize) -> Option<&CellError> {
        let column = self.model.column(display_col)?;
        let row = self.original_row(display_row)?;
        self.cell_errors.get(&row)?.get(&column.id)
    }

    pub fn take_damage(&mut self) -> Damage {
        std::mem::take(&mut self.damage)
    }

    pub(crate) fn damage_cell(&mut self, display_row: usize, display_col: usize) {
        match &mut self.damage {
            Damage::Full => {}
            Damage::Cells(cells) => cells.push((display_row, display_col)),
            Damage::None => self.damage = Damage::Cells(vec![(display_row, display_col)]),
        }
    }

    pub fn take_scroll_target(&mut self) -> Option<usize> {
        self.scroll_target.take()
    }

    // ---- sorting ----

    pub fn sort_spec(&self) -> Option<&SortSpec> {
        self.sort.spec()
    }

    /// Sorts by the visible column at `display_col`. Clears the selection,
    /// since display rows no longer point at the same data.
    pub fn sort_column(
        &mut self,
        display_col: usize,
        direction: SortDirection,
        reset_direction_cycle: bool,
        now: Instant,
    ) -> bool {
        if !self.is_sortable() {
            return false;
        }
        let Some(column) = self.model.column(display_col) else {
            return false;
        };
        let spec = self.sort.next_spec(&column.id, direction, reset_direction_cycle);
        let keys = spec
            .as_ref()
            .map(|spec| self.sort_keys(&spec.column))
            .unwrap_or_default();
        log::debug!("sorting by {spec:?}");
        self.sort.apply(spec, keys);
        self.clear_selection(false, false, now);
        self.damage = Damage::Full;
        true
    }

    /// Effective values of `column_id` for every logical row.
    fn sort_keys(&self, column_id: &str) -> Vec<Value> {
        let Some(column) = self.model.find(column_id) else {
            return Vec::new();
        };
        (0..self.editing.num_rows())
            .map(|logical| {
                self.editing
                    .original_row_index(logical)
                    .map(|row| self.effective_value(row, column))
                    .unwrap_or(Value::Null)
            })
            .collect()
    }

    pub(crate) fn resort(&mut self) {
        let Some(column) = self.sort.spec().map(|spec| spec.column.clone()) else {
            return;
        };
        if !self.is_sortable() {
            self.sort.clear();
            return;
        }
        let keys = self.sort_keys(&column);
        self.sort.resort(keys);
    }

    pub fn display_row_of(&self, original_row: usize) -> Option<usize> {
        self.editing
            .logical_row_index(original_row)
            .map(|logical| self.sort.display_index(logical))
    }

    // ---- selection ----

    pub fn selection(&self) -> &GridSelection {
        self.selection.selection()
    }

    pub fn selection_handler(&self) -> &SelectionHandler {
        &self.selection
    }

    pub fn on_selection_change(&mut self, mut incoming: GridSelection, now: Instant) -> bool {
        let columns = &self.model.columns;
        incoming
            .columns
            .retain(|col| columns.get(*col).is_some_and(|c| !c.is_index));
        let num_rows = self.editing.num_rows();
        incoming.rows.retain(|row| *row < num_rows);

        let changed = self.selection.on_selection_change(incoming);
        if changed {
            self.sync.schedule(SyncChannel::Selection, now);
        }
        changed
    }

    pub fn clear_selection(&mut self, keep_rows: bool, keep_columns: bool, now: Instant) -> bool {
        let changed = self.selection.clear_selection(keep_rows, keep_columns);
        if changed {
            self.sync.schedule(SyncChannel::Selection, now);
        }
        changed
    }

    /// Drops only the cell range, leaving row and column selection alone.
    pub fn on_focus_lost(&mut self, now: Instant) -> bool {
        self.clear_selection(true, true, now)
    }

    pub fn is_fullscreen(&self) -> bool {
        self.is_fullscreen
    }

    pub fn set_fullscreen(&mut self, fullscreen: bool, now: Instant) {
        if self.is_fullscreen != fullscreen {
            self.is_fullscreen = fullscreen;
            self.clear_selection(true, true, now);
            self.damage = Damage::Full;
        }
    }

    // ---- column operations ----

    fn apply_override(&mut self, column_id: &str, patch: ColumnConfig, now: Instant) -> bool {
        if self.model.find(column_id).is_none() {
            return false;
        }
        self.overrides.apply(column_id, &patch);
        self.reload_columns();
        self.clear_selection(true, false, now);
        true
    }

    pub fn on_column_resize(&mut self, display_col: usize, width: u32, now: Instant) -> bool {
        let Some(id) = self.model.column(display_col).map(|c| c.id.clone()) else {
            return false;
        };
        let width = width.clamp(self.options.min_column_width, self.options.max_column_width);
        self.apply_override(
            &id,
            ColumnConfig {
                width: Some(ColumnWidth::Pixels(width)),
                ..ColumnConfig::default()
            },
            now,
        )
    }

    pub fn column_width_px(&self, display_col: usize) -> Option<u32> {
        self.model
            .column(display_col)
            .map(|c| self.options.width_px(c.width))
    }

    pub fn set_column_pinned(&mut self, column_id: &str, pinned: bool, now: Instant) -> bool {
        self.apply_override(
            column_id,
            ColumnConfig {
                pinned: Some(pinned),
                ..ColumnConfig::default()
            },
            now,
        )
    }

    pub fn set_column_hidden(&mut self, column_id: &str, hidden: bool, now: Instant) -> bool {
        self.apply_override(
            column_id,
            ColumnConfig {
                hidden: Some(hidden),
                ..ColumnConfig::default()
            },
            now,
        )
    }

    pub fn set_column_format(&mut self, column_id: &str, format: &str, now: Instant) -> bool {
        self.apply_override(
            column_id,
            ColumnConfig {
                type_config: Some(TypeConfigPatch {
                    format: Some(format.to_string()),
                    ..TypeConfigPatch::default()
                }),
                ..ColumnConfig::default()
            },
            now,
        )
    }

    /// Moves a visible column. Dropping into the pinned area pins it, and
    /// dropping outside unpins it.
    pub fn on_column_moved(&mut self, from: usize, to: usize, now: Instant) -> bool {
        let visible = &self.model.columns;
        if from >= visible.len() || to >= visible.len() || from == to {
            return false;
        }
        let moved = visible[from].id.clone();
        let target_pinned = visible[to].is_pinned;
        let pin_change = (visible[from].is_pinned != target_pinned).then_some(target_pinned);

        let mut order: Vec<String> = visible.iter().map(|c| c.id.clone()).collect();
        let id = order.remove(from);
        order.insert(to, id);
        order.extend(
            self.model
                .all_columns
                .iter()
                .filter(|c| c.is_hidden)
                .map(|c| c.id.clone()),
        );
        self.column_order = order;

        if let Some(pinned) = pin_change {
            self.overrides.apply(
                &moved,
                &ColumnConfig {
                    pinned: Some(pinned),
                    ..ColumnConfig::default()
                },
            );
        }
        self.reload_columns();
        self.clear_selection(true, false, now);
        true
    }

    // ---- sync ----

    pub(crate) fn render_part(&self, channel: SyncChannel) -> Map<String, Value> {
        match channel {
            SyncChannel::Selection => {
                let payload = self.selection.to_payload(&self.model.columns, |display_row| {
                    self.original_row(display_row).unwrap_or(display_row)
                });
                let mut part = Map::new();
                part.insert(
                    "selection".to_string(),
                    serde_json::to_value(payload).unwrap_or(Value::Null),
                );
                part
            }
            SyncChannel::Editing => {
                match serde_json::to_value(self.editing.to_payload(&self.model.all_columns)) {
                    Ok(Value::Object(map)) => map,
                    _ => Map::new(),
                }
            }
        }
    }

    pub fn sync_poll(&self) -> SyncPoll {
        if self.sync.is_unmounted() {
            return SyncPoll::Stopped;
        }
        match self.sync.next_deadline() {
            Some(deadline) => SyncPoll::At(deadline),
            None => SyncPoll::Idle,
        }
    }

    pub fn sync_interval(&self) -> Duration {
        self.options.debounce
    }

    /// Pushes every channel whose debounce window has passed, reading state as
    /// it is now. Returns the number of writes.
    pub fn flush_due_syncs(&mut self, now: Instant, manager: &mut dyn WidgetStateManager) -> usize {
        let mut writes = 0;
        for channel in self.sync.take_due(now) {
            let part = self.render_part(channel);
            if self.sync.push(channel, manager, part) {
                writes += 1;
            }
        }
        writes
    }

    pub fn is_sync_pending(&self, channel: SyncChannel) -> bool {
        self.sync.is_pending(channel)
    }

    /// Cancels pending pushes. Later state changes are never sent.
    pub fn unmount(&mut self) {
        log::debug!("unmounting grid {}", self.element.id);
        self.sync.unmount();
    }

    // ---- export ----

    /// Visible columns and rows, in display order, as CSV.
    pub fn export_csv(&self) -> Result<String, ExportError> {
        export::to_csv(&self.model.columns, self.num_rows(), |row, col| {
            self.get_cell_content(row, col).map(|cell| cell.value)
        })
    }
}
