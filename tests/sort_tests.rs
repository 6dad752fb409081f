use serde_json::json;
use tokio::time::Instant;

use framegrid::state::controller::GridController;
use framegrid::state::data_model::Frame;
use framegrid::state::editor::EditOutcome;
use framegrid::state::element::{DataFrameElement, EditingMode, GridOptions};
use framegrid::state::sort::{ColumnSort, SortDirection, SortSpec};
use framegrid::state::sync::InMemoryWidgetState;

fn frame() -> Frame {
    Frame::from_columns(vec![
        ("name", vec![json!("b"), json!("a"), json!("c")]),
        ("amount", vec![json!(10), json!(20), json!(30)]),
    ])
}

fn grid_with(mode: EditingMode, options: GridOptions) -> GridController<Frame> {
    let element = DataFrameElement {
        editing_mode: mode,
        ..DataFrameElement::new("grid")
    };
    let mut store = InMemoryWidgetState::new();
    GridController::new(element, frame(), options, &mut store)
}

fn column_values(grid: &GridController<Frame>, col: usize) -> Vec<serde_json::Value> {
    (0..grid.num_rows())
        .map(|row| grid.get_cell_content(row, col).unwrap().value)
        .collect()
}

#[test]
fn test_permutation_is_a_bijection() {
    let mut sort = ColumnSort::new();
    sort.apply(
        Some(SortSpec {
            column: "k".into(),
            direction: SortDirection::Asc,
        }),
        vec![json!(3), json!(1), json!(2), json!(1), json!(null)],
    );

    let mut seen: Vec<usize> = (0..5).map(|d| sort.original_index(d)).collect();
    for display in 0..5 {
        assert_eq!(sort.display_index(sort.original_index(display)), display);
    }
    assert_eq!(seen, vec![4, 1, 3, 2, 0]);
    seen.sort_unstable();
    assert_eq!(seen, vec![0, 1, 2, 3, 4]);
}

#[test]
fn test_auto_direction_cycle() {
    let mut sort = ColumnSort::new();
    let first = sort.next_spec("a", SortDirection::Auto, true);
    assert_eq!(first.as_ref().unwrap().direction, SortDirection::Asc);
    sort.apply(first, Vec::new());

    let second = sort.next_spec("a", SortDirection::Auto, true);
    assert_eq!(second.as_ref().unwrap().direction, SortDirection::Desc);
    sort.apply(second, Vec::new());

    assert_eq!(sort.next_spec("a", SortDirection::Auto, true), None);
    assert_eq!(
        sort.next_spec("a", SortDirection::Auto, false).unwrap().direction,
        SortDirection::Asc
    );
}

#[test]
fn test_new_column_starts_ascending() {
    let mut sort = ColumnSort::new();
    sort.apply(
        Some(SortSpec {
            column: "a".into(),
            direction: SortDirection::Desc,
        }),
        Vec::new(),
    );
    let next = sort.next_spec("b", SortDirection::Auto, true).unwrap();
    assert_eq!(next.column, "b");
    assert_eq!(next.direction, SortDirection::Asc);
}

#[test]
fn test_sorting_disabled_for_dynamic_editing() {
    let mut grid = grid_with(EditingMode::Dynamic, GridOptions::default());
    assert!(!grid.is_sortable());
    assert!(!grid.sort_column(0, SortDirection::Asc, true, Instant::now()));
    assert!(grid.sort_spec().is_none());
}

#[test]
fn test_sorting_disabled_for_large_and_empty_tables() {
    let options = GridOptions {
        large_table_rows: 2,
        ..GridOptions::default()
    };
    let grid = grid_with(EditingMode::ReadOnly, options);
    assert!(!grid.is_sortable());

    let mut store = InMemoryWidgetState::new();
    let empty = GridController::new(
        DataFrameElement::new("grid"),
        Frame::new(),
        GridOptions::default(),
        &mut store,
    );
    assert!(empty.is_empty());
    assert!(!empty.is_sortable());
}

#[test]
fn test_sort_by_text_column() {
    let mut grid = grid_with(EditingMode::ReadOnly, GridOptions::default());
    assert!(grid.sort_column(0, SortDirection::Asc, true, Instant::now()));
    assert_eq!(column_values(&grid, 0), vec![json!("a"), json!("b"), json!("c")]);
    assert_eq!(column_values(&grid, 1), vec![json!(20), json!(10), json!(30)]);
    assert_eq!(grid.original_row(0), Some(1));
    assert_eq!(grid.display_row_of(1), Some(0));

    grid.sort_column(0, SortDirection::Auto, true, Instant::now());
    assert_eq!(column_values(&grid, 0), vec![json!("c"), json!("b"), json!("a")]);

    grid.sort_column(0, SortDirection::Auto, true, Instant::now());
    assert!(grid.sort_spec().is_none());
    assert_eq!(column_values(&grid, 0), vec![json!("b"), json!("a"), json!("c")]);
}

#[test]
fn test_sort_uses_edited_values() {
    let mut grid = grid_with(EditingMode::Fixed, GridOptions::default());
    let now = Instant::now();
    assert_eq!(grid.on_cell_edited(1, 1, json!(42), now), EditOutcome::Applied);

    assert!(grid.sort_column(1, SortDirection::Desc, true, now));
    assert_eq!(column_values(&grid, 1), vec![json!(42), json!(30), json!(10)]);
    assert_eq!(grid.original_row(0), Some(1));

    // Editing inside a sorted view re-sorts.
    assert_eq!(grid.on_cell_edited(2, 1, json!(99), now), EditOutcome::Applied);
    assert_eq!(column_values(&grid, 1), vec![json!(99), json!(42), json!(30)]);
    assert_eq!(grid.original_row(0), Some(0));
}

#[test]
fn test_sort_clears_selection() {
    let element = DataFrameElement {
        selection_mode: vec![framegrid::state::selection::SelectionMode::MultiRow],
        ..DataFrameElement::new("grid")
    };
    let mut store = InMemoryWidgetState::new();
    let mut grid = GridController::new(element, frame(), GridOptions::default(), &mut store);
    let now = Instant::now();

    let mut selection = grid.selection().clone();
    selection.rows.insert(0);
    assert!(grid.on_selection_change(selection, now));
    grid.sort_column(1, SortDirection::Desc, true, now);
    assert!(grid.selection().is_empty());
}
