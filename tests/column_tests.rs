use std::collections::BTreeMap;

use serde_json::json;

use framegrid::state::column_config::{
    ColumnConfig, ColumnConfigOverrides, ColumnWidth, TypeConfigPatch,
};
use framegrid::state::column_kind::{ColumnKind, TypeConfig, WidthPreset};
use framegrid::state::columns::{self, ColumnLoadRequest, ColumnModel, INDEX_COLUMN_ID};
use framegrid::state::controller::GridController;
use framegrid::state::data_model::{Frame, Quiver};
use framegrid::state::element::{DataFrameElement, EditingMode, GridOptions};
use framegrid::state::sync::InMemoryWidgetState;

fn frame() -> Frame {
    Frame::from_columns(vec![
        ("a", vec![json!("x"), json!("y")]),
        ("b", vec![json!(1), json!(2)]),
        ("c", vec![json!(true), json!(false)]),
    ])
}

fn load(frame: &Frame, element: &DataFrameElement, overrides: &ColumnConfigOverrides) -> ColumnModel {
    columns::load_columns(&ColumnLoadRequest {
        schema: frame.schema(),
        element,
        column_order: &element.column_order,
        overrides,
        sortable: true,
    })
}

fn ids(model: &ColumnModel) -> Vec<&str> {
    model.columns.iter().map(|c| c.id.as_str()).collect()
}

#[test]
fn test_declared_order_drops_unknown_and_appends_missing() {
    let element = DataFrameElement {
        column_order: vec!["b".into(), "missing".into(), "a".into(), "b".into()],
        ..DataFrameElement::new("grid")
    };
    let model = load(&frame(), &element, &ColumnConfigOverrides::new());
    assert_eq!(ids(&model), vec!["b", "a", "c"]);
    assert_eq!(model.columns[2].index, Some(2));
    assert_eq!(model.columns[0].original_index, 1);
}

#[test]
fn test_pinned_columns_come_first() {
    let element = DataFrameElement {
        column_config: BTreeMap::from([(
            "c".to_string(),
            ColumnConfig {
                pinned: Some(true),
                ..ColumnConfig::default()
            },
        )]),
        ..DataFrameElement::new("grid")
    };
    let model = load(&frame(), &element, &ColumnConfigOverrides::new());
    assert_eq!(ids(&model), vec!["c", "a", "b"]);
    assert!(model.columns[0].is_pinned);
}

#[test]
fn test_index_column_is_pinned_and_can_be_hidden() {
    let indexed = frame().with_index("b");
    let element = DataFrameElement::new("grid");
    let model = load(&indexed, &element, &ColumnConfigOverrides::new());
    assert_eq!(model.columns[0].id, INDEX_COLUMN_ID);
    assert!(model.columns[0].is_pinned);
    assert_eq!(model.columns[0].label, "b");

    let hidden = DataFrameElement {
        hide_index: Some(true),
        ..DataFrameElement::new("grid")
    };
    let model = load(&indexed, &hidden, &ColumnConfigOverrides::new());
    assert_eq!(ids(&model), vec!["a", "c"]);
    assert_eq!(model.all_columns.len(), 3);
}

#[test]
fn test_hidden_columns_stay_in_all_columns() {
    let mut overrides = ColumnConfigOverrides::new();
    overrides.apply(
        "a",
        &ColumnConfig {
            hidden: Some(true),
            ..ColumnConfig::default()
        },
    );
    let model = load(&frame(), &DataFrameElement::new("grid"), &overrides);
    assert_eq!(ids(&model), vec!["b", "c"]);
    let a = model.find("a").unwrap();
    assert!(a.is_hidden);
    assert_eq!(a.index, None);
    assert_eq!(model.display_index_of("a"), None);
}

#[test]
fn test_width_priority() {
    let element = DataFrameElement {
        column_width: Some(ColumnWidth::Preset(WidthPreset::Large)),
        column_config: BTreeMap::from([(
            "a".to_string(),
            ColumnConfig {
                width: Some(ColumnWidth::Pixels(120)),
                ..ColumnConfig::default()
            },
        )]),
        ..DataFrameElement::new("grid")
    };
    let model = load(&frame(), &element, &ColumnConfigOverrides::new());
    assert_eq!(model.find("a").unwrap().width, ColumnWidth::Pixels(120));
    assert_eq!(model.find("b").unwrap().width, ColumnWidth::from(WidthPreset::Large));

    let model = load(&frame(), &DataFrameElement::new("grid"), &ColumnConfigOverrides::new());
    assert_eq!(model.find("b").unwrap().width, ColumnWidth::from(WidthPreset::Small));
    assert_eq!(model.find("a").unwrap().width, ColumnWidth::from(WidthPreset::Medium));
}

#[test]
fn test_kind_follows_data_type_unless_configured() {
    let element = DataFrameElement {
        column_config: BTreeMap::from([(
            "a".to_string(),
            ColumnConfig {
                type_config: Some(TypeConfigPatch {
                    kind: Some(ColumnKind::Selectbox),
                    options: Some(vec!["x".into(), "y".into()]),
                    ..TypeConfigPatch::default()
                }),
                ..ColumnConfig::default()
            },
        )]),
        ..DataFrameElement::new("grid")
    };
    let model = load(&frame(), &element, &ColumnConfigOverrides::new());
    assert_eq!(model.find("a").unwrap().kind, ColumnKind::Selectbox);
    assert_eq!(model.find("b").unwrap().kind, ColumnKind::Number);
    assert_eq!(model.find("c").unwrap().kind, ColumnKind::Checkbox);
    assert!(model.find("a").unwrap().parse_input("z").is_err());
}

#[test]
fn test_override_merge_keeps_type_config_bounds() {
    let element_config = BTreeMap::from([(
        "b".to_string(),
        ColumnConfig {
            type_config: Some(TypeConfigPatch {
                min: Some(0.0),
                max: Some(10.0),
                ..TypeConfigPatch::default()
            }),
            ..ColumnConfig::default()
        },
    )]);
    let patch = ColumnConfig {
        type_config: Some(TypeConfigPatch {
            format: Some("percent".into()),
            ..TypeConfigPatch::default()
        }),
        ..ColumnConfig::default()
    };

    let mut overrides = ColumnConfigOverrides::new();
    overrides.apply("b", &patch);
    let once = overrides.effective("b", &element_config);
    overrides.apply("b", &patch);
    let twice = overrides.effective("b", &element_config);

    assert_eq!(once, twice);
    let type_config = once.type_config.unwrap();
    assert_eq!(type_config.min, Some(0.0));
    assert_eq!(type_config.max, Some(10.0));
    assert_eq!(type_config.format.as_deref(), Some("percent"));
}

#[test]
fn test_empty_options_fall_back() {
    let mut base = TypeConfigPatch {
        options: Some(vec!["a".into(), "b".into()]),
        ..TypeConfigPatch::default()
    };
    base.merge(&TypeConfigPatch {
        options: Some(Vec::new()),
        ..TypeConfigPatch::default()
    });
    assert_eq!(base.options, Some(vec!["a".to_string(), "b".to_string()]));

    let defaults = TypeConfig {
        options: vec!["z".into()],
        ..TypeConfig::default()
    };
    let resolved = TypeConfigPatch {
        options: Some(Vec::new()),
        ..TypeConfigPatch::default()
    }
    .resolve(&defaults);
    assert_eq!(resolved.options, vec!["z".to_string()]);
}

#[test]
fn test_column_editability() {
    let read_only = load(&frame(), &DataFrameElement::new("grid"), &ColumnConfigOverrides::new());
    assert!(read_only.columns.iter().all(|c| !c.is_editable));

    let element = DataFrameElement {
        editing_mode: EditingMode::Fixed,
        column_config: BTreeMap::from([(
            "b".to_string(),
            ColumnConfig {
                disabled: Some(true),
                ..ColumnConfig::default()
            },
        )]),
        ..DataFrameElement::new("grid")
    };
    let model = load(&frame(), &element, &ColumnConfigOverrides::new());
    assert!(model.find("a").unwrap().is_editable);
    assert!(!model.find("b").unwrap().is_editable);
}

#[test]
fn test_all_columns_hidden_still_works() {
    let config: BTreeMap<String, ColumnConfig> = ["a", "b", "c"]
        .iter()
        .map(|id| {
            (
                id.to_string(),
                ColumnConfig {
                    hidden: Some(true),
                    ..ColumnConfig::default()
                },
            )
        })
        .collect();
    let element = DataFrameElement {
        column_config: config,
        ..DataFrameElement::new("grid")
    };
    let mut store = InMemoryWidgetState::new();
    let grid = GridController::new(element, frame(), GridOptions::default(), &mut store);

    assert!(grid.columns().is_empty());
    assert_eq!(grid.all_columns().len(), 3);
    assert_eq!(grid.num_rows(), 2);
    assert!(grid.get_cell_content(0, 0).is_none());
}

#[test]
fn test_runtime_hide_and_pin() {
    let mut store = InMemoryWidgetState::new();
    let mut grid = GridController::new(
        DataFrameElement::new("grid"),
        frame(),
        GridOptions::default(),
        &mut store,
    );
    let now = tokio::time::Instant::now();

    assert!(grid.set_column_pinned("c", true, now));
    assert_eq!(grid.columns()[0].id, "c");
    assert!(grid.set_column_hidden("a", true, now));
    assert_eq!(
        grid.columns().iter().map(|c| c.id.as_str()).collect::<Vec<_>>(),
        vec!["c", "b"]
    );
    assert!(!grid.set_column_hidden("nope", true, now));
    assert!(grid.overrides().get("a").is_some());
}

#[test]
fn test_column_resize_is_clamped() {
    let mut store = InMemoryWidgetState::new();
    let mut grid = GridController::new(
        DataFrameElement::new("grid"),
        frame(),
        GridOptions::default(),
        &mut store,
    );
    let now = tokio::time::Instant::now();

    grid.on_column_resize(0, 5000, now);
    assert_eq!(grid.column_width_px(0), Some(1000));
    grid.on_column_resize(0, 10, now);
    assert_eq!(grid.column_width_px(0), Some(50));
}

#[test]
fn test_moving_into_pinned_area_pins() {
    let element = DataFrameElement {
        column_config: BTreeMap::from([(
            "a".to_string(),
            ColumnConfig {
                pinned: Some(true),
                ..ColumnConfig::default()
            },
        )]),
        ..DataFrameElement::new("grid")
    };
    let mut store = InMemoryWidgetState::new();
    let mut grid = GridController::new(element, frame(), GridOptions::default(), &mut store);
    let now = tokio::time::Instant::now();

    assert!(grid.on_column_moved(2, 0, now));
    let ids: Vec<&str> = grid.columns().iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, vec!["c", "a", "b"]);
    assert!(grid.columns()[0].is_pinned);
}
