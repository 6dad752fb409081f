use dioxus::prelude::*;
use tokio::time::Instant;

use crate::state::controller::GridController;
use crate::state::data_model::Frame;
use crate::state::sync::{InMemoryWidgetState, WidgetStateManager};
use crate::ui::actions;
use crate::ui::data_frame::PAGE_ROWS;

#[component]
pub fn Toolbar(
    controller: Signal<GridController<Frame>>,
    widget_state: Signal<InMemoryWidgetState>,
    first_row: Signal<usize>,
    error_message: Signal<Option<String>>,
    export_success: Signal<bool>,
) -> Element {
    let mut show_columns = use_signal(|| false);

    let grid = controller.read();
    let is_editable = grid.is_editable();
    let is_dynamic = grid.element().is_dynamic();
    let has_selection = !grid.selection().is_empty();
    let is_fullscreen = grid.is_fullscreen();
    let all_columns: Vec<(String, String, bool, bool)> = grid
        .all_columns()
        .iter()
        .map(|c| (c.id.clone(), c.label.clone(), c.is_hidden, c.is_pinned))
        .collect();
    let widget_value = widget_state
        .read()
        .get_string_value(&grid.element().id)
        .unwrap_or_default();
    drop(grid);

    rsx! {
        div { class: "toolbar",
            // File group
            div { class: "toolbar-group",
                button {
                    class: "toolbar-btn",
                    id: "btn-open",
                    onclick: move |_| {
                        spawn(async move {
                            actions::open_file(controller, first_row, error_message).await;
                        });
                    },
                    "\u{1F4C2} Open"
                }
                button {
                    class: "toolbar-btn",
                    id: "btn-download-csv",
                    onclick: move |_| {
                        spawn(async move {
                            let mut export_success = export_success;
                            if actions::download_csv(controller, error_message).await {
                                export_success.set(true);
                                tokio::time::sleep(std::time::Duration::from_secs(2)).await;
                                export_success.set(false);
                            }
                        });
                    },
                    "\u{2B07} Download CSV"
                }
                if *export_success.read() {
                    span { class: "save-success", "\u{2714} Exported" }
                }
            }
            div { class: "toolbar-separator" }

            // Edit group
            div { class: "toolbar-group",
                if is_dynamic {
                    button {
                        class: "toolbar-btn",
                        id: "btn-add-row",
                        disabled: !is_editable,
                        onclick: move |_| {
                            let mut controller = controller;
                            let mut first_row = first_row;
                            let target = controller.with_mut(|grid| {
                                grid.on_row_appended(Instant::now());
                                grid.take_scroll_target()
                            });
                            if let Some(target) = target {
                                let current = *first_row.read();
                                if target < current || target >= current + PAGE_ROWS {
                                    first_row.set(target.saturating_sub(PAGE_ROWS / 2));
                                }
                            }
                        },
                        "\u{2795} Add row"
                    }
                }
                button {
                    class: "toolbar-btn toolbar-btn-danger",
                    id: "btn-delete",
                    disabled: !is_editable || !has_selection,
                    onclick: move |_| {
                        let mut controller = controller;
                        let mut error_message = error_message;
                        let deleted = controller.with_mut(|grid| {
                            let selection = grid.selection().clone();
                            grid.on_delete(&selection, Instant::now())
                        });
                        if deleted {
                            error_message.set(None);
                        } else {
                            error_message.set(Some("Nothing to delete in the selection".to_string()));
                        }
                    },
                    "\u{1F5D1} Delete"
                }
                button {
                    class: "toolbar-btn",
                    id: "btn-clear-selection",
                    disabled: !has_selection,
                    onclick: move |_| {
                        let mut controller = controller;
                        controller.with_mut(|grid| grid.clear_selection(false, false, Instant::now()));
                    },
                    "\u{2715} Clear selection"
                }
            }
            div { class: "toolbar-separator" }

            // View group
            div { class: "toolbar-group",
                button {
                    class: "toolbar-btn",
                    id: "btn-fullscreen",
                    onclick: move |_| {
                        let mut controller = controller;
                        controller.with_mut(|grid| grid.set_fullscreen(!is_fullscreen, Instant::now()));
                    },
                    if is_fullscreen { "\u{2199} Exit fullscreen" } else { "\u{2197} Fullscreen" }
                }
                button {
                    class: "toolbar-btn",
                    id: "btn-columns",
                    onclick: move |_| {
                        let visible = *show_columns.read();
                        show_columns.set(!visible);
                    },
                    "\u{2630} Columns"
                }
                if *show_columns.read() {
                    div { class: "column-menu", id: "column-menu",
                        for (id, label, hidden, pinned) in all_columns {
                            div { class: "column-menu-item",
                                input {
                                    r#type: "checkbox",
                                    id: format!("toggle-{id}"),
                                    checked: !hidden,
                                    onchange: {
                                        let id = id.clone();
                                        move |_| {
                                            let mut controller = controller;
                                            controller.with_mut(|grid| {
                                                grid.set_column_hidden(&id, !hidden, Instant::now());
                                            });
                                        }
                                    }
                                }
                                span { class: "toolbar-label", "{label}" }
                                button {
                                    class: "toolbar-btn toolbar-btn-sm",
                                    onclick: {
                                        let id = id.clone();
                                        move |_| {
                                            let mut controller = controller;
                                            controller.with_mut(|grid| {
                                                grid.set_column_pinned(&id, !pinned, Instant::now());
                                            });
                                        }
                                    },
                                    if pinned { "Unpin" } else { "Pin" }
                                }
                            }
                        }
                    }
                }
            }

            // Info area (right-aligned)
            div { class: "toolbar-info",
                span { class: "widget-value", id: "label-widget-value", "{widget_value}" }
                if let Some(err) = error_message.read().as_ref() {
                    span { class: "error-message", "{err}" }
                }
            }
        }
    }
}
