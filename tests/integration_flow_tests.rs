use std::time::Duration;

use serde_json::json;
use tokio::time::Instant;

use framegrid::io::{self, json_io};
use framegrid::state::columns::INDEX_COLUMN_ID;
use framegrid::state::controller::GridController;
use framegrid::state::data_model::Frame;
use framegrid::state::element::{DataFrameElement, GridOptions};
use framegrid::state::selection::GridSelection;
use framegrid::state::sync::InMemoryWidgetState;

fn load_fixture() -> (DataFrameElement, Frame) {
    let data = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("data");
    let element = json_io::load_element(&data.join("element.json")).unwrap();
    let frame = json_io::load_frame(&data.join("orders.json"), Some("id")).unwrap();
    (element, frame)
}

#[test]
fn test_e2e_open_configure_and_render() {
    let (element, frame) = load_fixture();
    let mut store = InMemoryWidgetState::new();
    let grid = GridController::new(element, frame, GridOptions::default(), &mut store);

    let ids: Vec<&str> = grid.columns().iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, vec![INDEX_COLUMN_ID, "customer", "amount", "paid"]);
    assert_eq!(grid.all_columns().len(), 5);
    assert_eq!(grid.columns()[2].label, "Amount");
    assert_eq!(grid.column_width_px(2), Some(75));

    let amount = grid.get_cell_content(0, 2).unwrap();
    assert_eq!(amount.value, json!(250.5));
    assert_eq!(amount.display, "$250.50");
    assert!(amount.is_editable);
    assert!(!grid.get_cell_content(0, 0).unwrap().is_editable);
    assert!(!grid.is_sortable());
}

#[test]
fn test_e2e_edit_sync_remount_and_export() {
    let (element, frame) = load_fixture();
    let mut store = InMemoryWidgetState::new();
    let mut grid = GridController::new(element.clone(), frame.clone(), GridOptions::default(), &mut store);
    let now = Instant::now();

    // Amount has a minimum of zero.
    assert!(grid.on_cell_input(1, 2, "-5", now) != framegrid::state::editor::EditOutcome::Applied);
    grid.on_cell_input(1, 2, "95", now);
    let row = grid.on_row_appended(now).unwrap();
    grid.on_paste(row, 0, &[vec!["104".into(), "Umbrella".into(), "12".into()]], now);
    grid.on_delete(
        &GridSelection {
            rows: [0].into_iter().collect(),
            ..GridSelection::default()
        },
        now,
    );
    assert_eq!(grid.flush_due_syncs(now + Duration::from_secs(1), &mut store), 1);

    let stored = store.value_json("orders").unwrap();
    assert_eq!(stored["edited_rows"]["1"]["amount"], json!(95));
    assert_eq!(stored["deleted_rows"], json!([0]));
    assert_eq!(stored["added_rows"][0]["_index"], json!(104));
    assert_eq!(stored["added_rows"][0]["customer"], json!("Umbrella"));
    assert_eq!(store.writes().last().unwrap().fragment_id.as_deref(), Some("frag-1"));
    grid.unmount();

    let remounted = GridController::new(element, frame, GridOptions::default(), &mut store);
    assert_eq!(remounted.num_rows(), 3);
    assert_eq!(remounted.get_cell_content(0, 1).unwrap().value, json!("Globex"));
    assert_eq!(remounted.get_cell_content(0, 2).unwrap().value, json!(95));
    assert_eq!(remounted.get_cell_content(2, 1).unwrap().value, json!("Umbrella"));

    let csv = remounted.export_csv().unwrap();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("orders.csv");
    io::save_csv(&path, &csv).unwrap();
    let written = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = written.trim_start_matches('\u{feff}').lines().collect();
    assert_eq!(lines[0], "id,customer,Amount,paid");
    assert_eq!(lines[1], "102,Globex,95,false");
    assert_eq!(lines[3], "104,Umbrella,12,false");
}
