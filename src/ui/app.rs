use dioxus::prelude::*;
use std::path::PathBuf;

use crate::io::json_io;
use crate::state::controller::GridController;
use crate::state::data_model::Frame;
use crate::state::element::{DataFrameElement, EditingMode, GridOptions};
use crate::state::selection::SelectionMode;
use crate::state::sync::InMemoryWidgetState;
use crate::ui::data_frame::DataFrame;
use crate::ui::toolbar::Toolbar;

const STYLES: Asset = asset!("/assets/styles.css");

fn default_element() -> DataFrameElement {
    DataFrameElement {
        editing_mode: EditingMode::Dynamic,
        selection_mode: vec![SelectionMode::MultiRow, SelectionMode::MultiCell],
        ..DataFrameElement::new("grid")
    }
}

/// Reads the startup element and dataset named by `FRAMEGRID_ELEMENT` and
/// `FRAMEGRID_OPEN`. Load failures fall back to defaults and are reported.
fn load_startup() -> (DataFrameElement, Frame, Option<String>) {
    let mut error = None;

    let element = match std::env::var("FRAMEGRID_ELEMENT") {
        Ok(path) => match json_io::load_element(&PathBuf::from(&path)) {
            Ok(element) => element,
            Err(err) => {
                log::error!("failed to load element {path}: {err}");
                error = Some(err.to_string());
                default_element()
            }
        },
        Err(_) => default_element(),
    };

    let index = std::env::var("FRAMEGRID_INDEX").ok();
    let frame = match std::env::var("FRAMEGRID_OPEN") {
        Ok(path) => match json_io::load_frame(&PathBuf::from(&path), index.as_deref()) {
            Ok(frame) => frame,
            Err(err) => {
                log::error!("failed to open {path}: {err}");
                error = Some(err.to_string());
                Frame::new()
            }
        },
        Err(_) => Frame::new(),
    };

    (element, frame, error)
}

#[component]
pub fn App() -> Element {
    let (widget_state, controller, error_message) = use_hook(|| {
        let (element, frame, error) = load_startup();
        let mut store = InMemoryWidgetState::new();
        let grid = GridController::new(element, frame, GridOptions::default(), &mut store);
        (Signal::new(store), Signal::new(grid), Signal::new(error))
    });
    let first_row = use_signal(|| 0usize);
    let export_success = use_signal(|| false);

    let app_class = if controller.read().is_fullscreen() {
        "app fullscreen"
    } else {
        "app"
    };

    rsx! {
        document::Stylesheet { href: STYLES }
        div { class: app_class,
            Toolbar { controller, widget_state, first_row, error_message, export_success }
            DataFrame { controller, widget_state, first_row }
        }
    }
}
