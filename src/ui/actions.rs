use dioxus::prelude::*;
use tokio::time::Instant;

use crate::io::{self, json_io};
use crate::state::controller::GridController;
use crate::state::data_model::Frame;

/// Picks a JSON file and swaps it into the grid, keeping the current element.
pub async fn open_file(
    mut controller: Signal<GridController<Frame>>,
    mut first_row: Signal<usize>,
    mut error_message: Signal<Option<String>>,
) {
    let task = rfd::AsyncFileDialog::new()
        .add_filter("JSON", &["json"])
        .pick_file()
        .await;

    let Some(handle) = task else {
        return;
    };
    let path = handle.path().to_path_buf();
    let index = std::env::var("FRAMEGRID_INDEX").ok();
    match json_io::load_frame(&path, index.as_deref()) {
        Ok(frame) => {
            log::info!("opened {}", path.display());
            controller.with_mut(|grid| {
                let element = grid.element().clone();
                grid.replace_data(element, frame, Instant::now());
            });
            first_row.set(0);
            error_message.set(None);
        }
        Err(err) => {
            log::error!("failed to open {}: {err}", path.display());
            error_message.set(Some(err.to_string()));
        }
    }
}

/// Asks for a target path and writes the visible grid as CSV. Returns true
/// once the file is written.
pub async fn download_csv(
    controller: Signal<GridController<Frame>>,
    mut error_message: Signal<Option<String>>,
) -> bool {
    let file_name = format!("{}.csv", controller.read().element().id);
    let Some(handle) = rfd::AsyncFileDialog::new()
        .add_filter("CSV", &["csv"])
        .set_file_name(file_name)
        .save_file()
        .await
    else {
        return false;
    };

    let csv = match controller.read().export_csv() {
        Ok(csv) => csv,
        Err(err) => {
            error_message.set(Some(err.to_string()));
            return false;
        }
    };

    if let Err(err) = io::save_csv(handle.path(), &csv) {
        error_message.set(Some(err.to_string()));
        return false;
    }

    error_message.set(None);
    true
}
