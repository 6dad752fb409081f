use serde_json::{json, Value};

use framegrid::io::{self, json_io, json_io::JsonIoError};
use framegrid::state::column_config::ColumnWidth;
use framegrid::state::column_kind::{ColumnKind, WidthPreset};
use framegrid::state::data_model::{DataType, Quiver};
use framegrid::state::element::EditingMode;
use framegrid::state::selection::SelectionMode;

fn data_path(name: &str) -> std::path::PathBuf {
    std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("data")
        .join(name)
}

#[test]
fn test_load_json_valid() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("test.json");
    std::fs::write(&path, r#"[{"name":"Alice","age":30},{"name":"Bob"}]"#).unwrap();

    let rows = json_io::load_json(&path).unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["name"], Value::String("Alice".to_string()));
    assert!(!rows[1].contains_key("age"));
}

#[test]
fn test_load_json_not_array() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("object.json");
    std::fs::write(&path, r#"{"name":"Alice"}"#).unwrap();

    assert!(matches!(json_io::load_json(&path), Err(JsonIoError::NotAnArray)));
}

#[test]
fn test_load_json_non_object_rows() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("numbers.json");
    std::fs::write(&path, "[1, 2, 3]").unwrap();

    assert!(matches!(
        json_io::load_json(&path),
        Err(JsonIoError::NotArrayOfObjects)
    ));
}

#[test]
fn test_load_json_invalid_and_missing() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.json");
    std::fs::write(&path, "[{").unwrap();

    assert!(matches!(json_io::load_json(&path), Err(JsonIoError::Parse(_))));
    assert!(matches!(
        json_io::load_json(&dir.path().join("absent.json")),
        Err(JsonIoError::Io(_))
    ));
}

#[test]
fn test_load_frame_with_index() {
    let frame = json_io::load_frame(&data_path("orders.json"), Some("id")).unwrap();
    let schema = frame.schema();

    assert_eq!(frame.dimensions().num_data_rows, 3);
    assert_eq!(frame.dimensions().num_data_columns, 5);
    assert_eq!(schema[0].name, "id");
    assert!(schema[0].is_index);
    assert_eq!(frame.cell(2, 0), Some(&json!(103)));

    let tags = schema.iter().position(|c| c.name == "tags").unwrap();
    assert_eq!(schema[tags].data_type, DataType::List);
}

#[test]
fn test_load_element() {
    let element = json_io::load_element(&data_path("element.json")).unwrap();

    assert_eq!(element.id, "orders");
    assert_eq!(element.fragment_id.as_deref(), Some("frag-1"));
    assert_eq!(element.editing_mode, EditingMode::Dynamic);
    assert_eq!(
        element.selection_mode,
        vec![SelectionMode::MultiRow, SelectionMode::SingleCell]
    );
    let amount = &element.column_config["amount"];
    assert_eq!(amount.width, Some(ColumnWidth::Preset(WidthPreset::Small)));
    let type_config = amount.type_config.as_ref().unwrap();
    assert_eq!(type_config.kind, Some(ColumnKind::Number));
    assert_eq!(type_config.min, Some(0.0));
    assert_eq!(element.column_config["tags"].hidden, Some(true));
}

#[test]
fn test_load_element_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("element.json");
    std::fs::write(&path, r#"{"id":"bare"}"#).unwrap();

    let element = json_io::load_element(&path).unwrap();
    assert_eq!(element.editing_mode, EditingMode::ReadOnly);
    assert!(element.selection_mode.is_empty());
    assert!(!element.is_editable());
}

#[test]
fn test_save_csv_replaces_existing_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.csv");
    std::fs::write(&path, "stale").unwrap();

    io::save_csv(&path, "a,b\n1,2\n").unwrap();
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "a,b\n1,2\n");
}
