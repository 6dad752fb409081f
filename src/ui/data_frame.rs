use std::time::Duration;

use dioxus::prelude::{Key, *};
use tokio::time::Instant;

use crate::state::controller::GridController;
use crate::state::data_model::Frame;
use crate::state::selection::{CellSelection, GridSelection};
use crate::state::sort::SortDirection;
use crate::state::sync::{self, InMemoryWidgetState};

/// Rows rendered at once; the grid pages through larger tables.
pub const PAGE_ROWS: usize = 200;

const SYNC_IDLE_INTERVAL: Duration = Duration::from_millis(50);

#[derive(Clone, PartialEq)]
struct EditingCell {
    row: usize,
    col: usize,
    draft: String,
}

#[component]
pub fn DataFrame(
    controller: Signal<GridController<Frame>>,
    widget_state: Signal<InMemoryWidgetState>,
    first_row: Signal<usize>,
) -> Element {
    let editing = use_signal::<Option<EditingCell>>(|| None);

    use_future(move || async move {
        sync::run_sync_loop(
            SYNC_IDLE_INTERVAL,
            move || controller.read().sync_poll(),
            move |now| {
                let mut controller = controller;
                let mut widget_state = widget_state;
                controller.with_mut(|grid| {
                    widget_state.with_mut(|store| grid.flush_due_syncs(now, store));
                });
            },
        )
        .await;
    });

    use_drop(move || {
        if let Ok(mut grid) = controller.try_write() {
            grid.unmount();
        }
    });

    let grid = controller.read();
    let columns = grid.columns().to_vec();
    let num_rows = grid.num_rows();
    let start = (*first_row.read()).min(num_rows);
    let end = (start + PAGE_ROWS).min(num_rows);
    let sort_spec = grid.sort_spec().cloned();
    let selection = grid.selection().clone();
    let sortable = grid.is_sortable();
    let widths: Vec<u32> = (0..columns.len())
        .map(|col| grid.column_width_px(col).unwrap_or(0))
        .collect();
    drop(grid);

    if columns.is_empty() {
        return rsx! {
            p { class: "empty-message", id: "empty-message", "No columns to display." }
        };
    }

    rsx! {
        div {
            class: "table-container",
            id: "table-container",
            tabindex: "0",
            onfocusout: move |_| {
                let mut controller = controller;
                controller.with_mut(|grid| grid.on_focus_lost(Instant::now()));
            },
            onkeydown: move |evt| {
                if evt.key() == Key::Delete || evt.key() == Key::Backspace {
                    if editing.read().is_some() {
                        return;
                    }
                    let mut controller = controller;
                    controller.with_mut(|grid| {
                        let selection = grid.selection().clone();
                        grid.on_delete(&selection, Instant::now())
                    });
                }
            },
            table {
                thead {
                    tr {
                        th { class: "row-number", "#" }
                        for (col_idx, column) in columns.iter().enumerate() {
                            th {
                                class: header_class(col_idx, column.is_pinned, &selection),
                                id: format!("col-{}", sanitize_id(&column.id)),
                                title: column.help.clone().unwrap_or_default(),
                                style: "min-width: {widths[col_idx]}px;",
                                onclick: move |_| {
                                    let mut controller = controller;
                                    controller.with_mut(|grid| {
                                        grid.sort_column(col_idx, SortDirection::Auto, true, Instant::now());
                                    });
                                },
                                "{column.label}{sort_indicator(&sort_spec, &column.id, sortable)}"
                            }
                        }
                    }
                }
                tbody {
                    for display_row in start..end {
                        tr {
                            class: row_class(display_row, &selection),
                            id: format!("row-{display_row}"),
                            td {
                                class: "row-number",
                                onclick: move |_| {
                                    let mut controller = controller;
                                    controller.with_mut(|grid| {
                                        let mut next = grid.selection().clone();
                                        if !next.rows.remove(&display_row) {
                                            next.rows.insert(display_row);
                                        }
                                        grid.on_selection_change(next, Instant::now());
                                    });
                                },
                                "{display_row + 1}"
                            }
                            for col_idx in 0..columns.len() {
                                if editing
                                    .read()
                                    .as_ref()
                                    .map(|cell| cell.row == display_row && cell.col == col_idx)
                                    .unwrap_or(false)
                                {
                                    td { class: "editing-cell",
                                        input {
                                            class: "cell-input",
                                            id: format!("cell-input-{display_row}-{col_idx}"),
                                            value: "{editing.read().as_ref().map(|cell| cell.draft.clone()).unwrap_or_default()}",
                                            autofocus: true,
                                            oninput: move |evt| {
                                                let value = evt.value();
                                                let mut editing = editing;
                                                editing.with_mut(|cell| {
                                                    if let Some(cell) = cell {
                                                        cell.draft = value;
                                                    }
                                                });
                                            },
                                            onblur: move |_| {
                                                commit_edit(controller, editing);
                                            },
                                            onkeydown: move |evt| {
                                                match evt.key() {
                                                    Key::Enter => commit_edit(controller, editing),
                                                    Key::Escape => {
                                                        let mut editing = editing;
                                                        editing.set(None);
                                                    }
                                                    _ => {}
                                                }
                                            }
                                        }
                                    }
                                } else {
                                    GridCellView {
                                        controller,
                                        editing,
                                        display_row,
                                        col_idx,
                                        selected: cell_selected(display_row, col_idx, &selection),
                                    }
                                }
                            }
                        }
                    }
                }
            }
            div { class: "pager",
                button {
                    class: "toolbar-btn",
                    id: "btn-prev-page",
                    disabled: start == 0,
                    onclick: move |_| {
                        let mut first_row = first_row;
                        let current = *first_row.read();
                        first_row.set(current.saturating_sub(PAGE_ROWS));
                    },
                    "\u{25B2}"
                }
                span { class: "toolbar-label", "{start + 1}-{end} / {num_rows}" }
                button {
                    class: "toolbar-btn",
                    id: "btn-next-page",
                    disabled: end >= num_rows,
                    onclick: move |_| {
                        let mut first_row = first_row;
                        let current = *first_row.read();
                        first_row.set(current + PAGE_ROWS);
                    },
                    "\u{25BC}"
                }
            }
        }
    }
}

#[component]
fn GridCellView(
    controller: Signal<GridController<Frame>>,
    editing: Signal<Option<EditingCell>>,
    display_row: usize,
    col_idx: usize,
    selected: bool,
) -> Element {
    let Some(cell) = controller.read().get_cell_content(display_row, col_idx) else {
        return rsx! { td { class: "cell" } };
    };

    let mut class = String::from("cell");
    if selected {
        class.push_str(" selected-cell");
    }
    if cell.is_added {
        class.push_str(" added-row");
    }
    if !cell.is_editable {
        class.push_str(" read-only");
    }
    if cell.error.is_some() {
        class.push_str(" cell-error");
    }
    let title = cell.error.as_ref().map(|err| err.to_string()).unwrap_or_default();
    let is_editable = cell.is_editable;
    let draft = crate::state::data_model::display_value(&cell.value);

    rsx! {
        td {
            class: "{class}",
            id: format!("cell-{display_row}-{col_idx}"),
            title: "{title}",
            onclick: move |_| {
                let mut controller = controller;
                controller.with_mut(|grid| {
                    let mut next = grid.selection().clone();
                    next.current = Some(CellSelection::single(display_row, col_idx));
                    grid.on_selection_change(next, Instant::now());
                });
            },
            ondoubleclick: move |_| {
                if is_editable {
                    let mut editing = editing;
                    editing.set(Some(EditingCell {
                        row: display_row,
                        col: col_idx,
                        draft: draft.clone(),
                    }));
                }
            },
            "{cell.display}"
        }
    }
}

fn commit_edit(
    mut controller: Signal<GridController<Frame>>,
    mut editing: Signal<Option<EditingCell>>,
) {
    let edit = editing.read().as_ref().cloned();
    if let Some(edit) = edit {
        controller.with_mut(|grid| {
            grid.on_cell_input(edit.row, edit.col, &edit.draft, Instant::now());
        });
    }
    editing.set(None);
}

fn sort_indicator(
    sort_spec: &Option<crate::state::sort::SortSpec>,
    column_id: &str,
    sortable: bool,
) -> &'static str {
    if !sortable {
        return "";
    }
    match sort_spec.as_ref() {
        Some(spec) if spec.column == column_id => match spec.direction {
            SortDirection::Desc => " \u{25BC}",
            _ => " \u{25B2}",
        },
        _ => "",
    }
}

fn header_class(col_idx: usize, pinned: bool, selection: &GridSelection) -> String {
    let selected = if selection.columns.contains(&col_idx) {
        "selected-col"
    } else {
        ""
    };
    let pinned = if pinned { "pinned" } else { "" };
    join_classes(selected, pinned)
}

fn row_class(display_row: usize, selection: &GridSelection) -> String {
    let parity = if display_row % 2 == 0 { "even" } else { "odd" };
    if selection.rows.contains(&display_row) {
        join_classes(parity, "selected-row")
    } else {
        parity.to_string()
    }
}

fn cell_selected(display_row: usize, col_idx: usize, selection: &GridSelection) -> bool {
    selection.columns.contains(&col_idx)
        || selection.current.as_ref().is_some_and(|current| {
            let range = current.range;
            (range.y..range.y + range.height).contains(&display_row)
                && (range.x..range.x + range.width).contains(&col_idx)
        })
}

fn join_classes(a: &str, b: &str) -> String {
    if a.is_empty() {
        return b.to_string();
    }
    if b.is_empty() {
        return a.to_string();
    }
    format!("{a} {b}")
}

fn sanitize_id(value: &str) -> String {
    value
        .chars()
        .map(|ch| if ch.is_ascii_alphanumeric() { ch } else { '_' })
        .collect()
}
