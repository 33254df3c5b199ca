use super::*;
use crate::grid::column::{CellValue, CellView};

struct Row;

fn name_column() -> ColumnDescriptor<Row> {
    ColumnDescriptor::accessor("name", "Name", |_: &Row| CellValue::Empty)
}

fn actions_column() -> ColumnDescriptor<Row> {
    ColumnDescriptor::display("actions", "", |_: &Row, _| CellView::Empty)
}

// =============================================================
// Sorting
// =============================================================

#[test]
fn sort_cycles_asc_desc_none() {
    let mut state = GridState::default();
    let column = name_column();
    state.toggle_sort(&column);
    assert_eq!(state.sort_direction("name"), Some(SortDirection::Asc));
    state.toggle_sort(&column);
    assert_eq!(state.sort_direction("name"), Some(SortDirection::Desc));
    state.toggle_sort(&column);
    assert_eq!(state.sorting, None);
}

#[test]
fn new_sort_column_replaces_the_old_one() {
    let mut state = GridState::default();
    state.toggle_sort(&name_column());
    state.toggle_sort(&name_column());
    let store = ColumnDescriptor::accessor("store", "Store", |_: &Row| CellValue::Empty);
    state.toggle_sort(&store);
    assert_eq!(state.sorting, Some(Sort { column: "store".into(), direction: SortDirection::Asc }));
}

#[test]
fn unsortable_columns_ignore_clicks() {
    let mut state = GridState::default();
    state.toggle_sort(&actions_column());
    state.toggle_sort(&name_column().not_sortable());
    assert_eq!(state.sorting, None);
}

// =============================================================
// Pagination
// =============================================================

#[test]
fn page_size_must_be_offered() {
    let mut state = GridState::default();
    assert_eq!(state.set_page_size(25), Err(GridError::InvalidPageSize(25)));
    assert_eq!(state.pagination.page_size, 10);
    assert!(GridState::with_page_size(40).is_ok());
}

#[test]
fn page_size_change_keeps_first_visible_row() {
    let mut state = GridState::default();
    state.pagination.page_index = 3;
    state.set_page_size(20).unwrap();
    assert_eq!(state.pagination, Pagination { page_index: 1, page_size: 20 });
    state.set_page_size(10).unwrap();
    assert_eq!(state.pagination.page_index, 2);
}

#[test]
fn navigation_respects_bounds() {
    let mut state = GridState::default();
    state.previous_page();
    assert_eq!(state.pagination.page_index, 0);
    state.next_page(2);
    state.next_page(2);
    assert_eq!(state.pagination.page_index, 1);
    assert!(!state.can_next(2));
    state.first_page();
    assert!(!state.can_previous());
    state.last_page(5);
    assert_eq!(state.pagination.page_index, 4);
    state.last_page(0);
    assert_eq!(state.pagination.page_index, 0);
}

#[test]
fn text_filter_leaves_page_index() {
    let mut state = GridState::default();
    state.pagination.page_index = 2;
    state.set_text_filter("milk");
    assert_eq!(state.pagination.page_index, 2);
}

// =============================================================
// Visibility & selection
// =============================================================

#[test]
fn only_hideable_columns_toggle() {
    let mut state = GridState::default();
    assert!(!state.toggle_visibility(&name_column()));
    assert!(!state.is_visible("name"));
    assert!(state.toggle_visibility(&name_column()));
    assert!(state.toggle_visibility(&actions_column()));
    assert!(state.is_visible("actions"));
}

#[test]
fn column_filters_clear_on_empty_text() {
    let mut state = GridState::default();
    state.set_column_filter("name", "mi");
    assert_eq!(state.column_filters.get("name").map(String::as_str), Some("mi"));
    state.set_column_filter("name", "");
    assert!(state.column_filters.is_empty());
}

#[test]
fn selection_toggles_by_index() {
    let mut state = GridState::default();
    state.toggle_row(3);
    state.select_rows([1, 2]);
    assert!(state.is_selected(3));
    state.toggle_row(3);
    assert!(!state.is_selected(3));
    assert_eq!(state.selection.len(), 2);
    state.clear_selection();
    assert!(state.selection.is_empty());
}
