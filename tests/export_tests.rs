use std::collections::BTreeMap;

use serde_json::json;
use tokio::time::Instant;

use framegrid::state::column_config::ColumnConfig;
use framegrid::state::controller::GridController;
use framegrid::state::data_model::Frame;
use framegrid::state::element::{DataFrameElement, EditingMode, GridOptions};
use framegrid::state::sort::SortDirection;
use framegrid::state::sync::InMemoryWidgetState;

fn frame() -> Frame {
    Frame::from_columns(vec![
        ("name", vec![json!("Smith, J"), json!("say \"hi\""), json!("plain")]),
        ("amount", vec![json!(3), json!(1), json!(2)]),
        ("secret", vec![json!("x"), json!("y"), json!("z")]),
    ])
}

fn grid(mode: EditingMode) -> GridController<Frame> {
    let element = DataFrameElement {
        editing_mode: mode,
        column_config: BTreeMap::from([
            (
                "name".to_string(),
                ColumnConfig {
                    label: Some("Name".into()),
                    ..ColumnConfig::default()
                },
            ),
            (
                "secret".to_string(),
                ColumnConfig {
                    hidden: Some(true),
                    ..ColumnConfig::default()
                },
            ),
        ]),
        ..DataFrameElement::new("grid")
    };
    let mut store = InMemoryWidgetState::new();
    GridController::new(element, frame(), GridOptions::default(), &mut store)
}

fn body(csv: &str) -> Vec<&str> {
    csv.trim_start_matches('\u{feff}').lines().collect()
}

#[test]
fn test_csv_starts_with_bom_and_quotes_fields() {
    let csv = grid(EditingMode::ReadOnly).export_csv().unwrap();

    assert!(csv.starts_with('\u{feff}'));
    assert_eq!(
        body(&csv),
        vec![
            "Name,amount",
            "\"Smith, J\",3",
            "\"say \"\"hi\"\"\",1",
            "plain,2",
        ]
    );
}

#[test]
fn test_csv_follows_display_order_and_edits() {
    let mut grid = grid(EditingMode::Fixed);
    let now = Instant::now();
    grid.on_cell_edited(2, 0, json!("edited"), now);
    grid.sort_column(1, SortDirection::Asc, true, now);

    let csv = grid.export_csv().unwrap();
    assert_eq!(
        body(&csv),
        vec!["Name,amount", "\"say \"\"hi\"\"\",1", "edited,2", "\"Smith, J\",3"]
    );
}

#[test]
fn test_csv_includes_appended_rows() {
    let mut grid = grid(EditingMode::Dynamic);
    let now = Instant::now();
    let row = grid.on_row_appended(now).unwrap();
    grid.on_cell_input(row, 1, "4", now);

    let csv = grid.export_csv().unwrap();
    assert_eq!(body(&csv).last().copied(), Some(",4"));
    assert_eq!(body(&csv).len(), 5);
}
