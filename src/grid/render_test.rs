use super::*;
use crate::grid::column::{CellValue, RowAction};
use crate::grid::state::PAGE_SIZES;

#[derive(Debug)]
struct Receipt {
    name: &'static str,
    store: &'static str,
    total: f64,
}

fn receipts() -> Vec<Receipt> {
    vec![
        Receipt { name: "Weekly", store: "Corner", total: 40.0 },
        Receipt { name: "Party", store: "Market", total: 12.5 },
        Receipt { name: "weekend", store: "Corner", total: 12.5 },
        Receipt { name: "Lunch", store: "Deli", total: 8.0 },
    ]
}

fn columns() -> Vec<ColumnDescriptor<Receipt>> {
    vec![
        ColumnDescriptor::accessor("name", "Name", |r: &Receipt| CellValue::from(r.name)),
        ColumnDescriptor::accessor("store", "Store", |r: &Receipt| CellValue::from(r.store)),
        ColumnDescriptor::accessor("total", "Total", |r: &Receipt| CellValue::Number(r.total)),
        ColumnDescriptor::display("actions", "", |_: &Receipt, _| {
            CellView::Actions(vec![RowAction::Edit, RowAction::Delete])
        }),
    ]
}

fn indices(page: &GridPage) -> Vec<usize> {
    page.rows.iter().map(|r| r.index).collect()
}

#[test]
fn renders_every_row_unsorted_in_original_order() {
    let page = render(&receipts(), &columns(), &GridState::default());
    assert_eq!(indices(&page), vec![0, 1, 2, 3]);
    assert_eq!(page.headers.len(), 4);
    assert_eq!(page.rows[0].cells[0], CellView::Text("Weekly".into()));
    assert_eq!(page.rows[0].cells[3], CellView::Actions(vec![RowAction::Edit, RowAction::Delete]));
    assert_eq!(page.page_count, 1);
    assert!(!page.can_next);
}

#[test]
fn sort_cycle_restores_original_order() {
    let rows = receipts();
    let columns = columns();
    let mut state = GridState::default();

    state.toggle_sort(&columns[0]);
    assert_eq!(indices(&render(&rows, &columns, &state)), vec![3, 1, 2, 0]);
    state.toggle_sort(&columns[0]);
    assert_eq!(indices(&render(&rows, &columns, &state)), vec![0, 2, 1, 3]);
    state.toggle_sort(&columns[0]);
    assert_eq!(indices(&render(&rows, &columns, &state)), vec![0, 1, 2, 3]);
}

#[test]
fn descending_sort_keeps_ties_stable() {
    let rows = receipts();
    let columns = columns();
    let mut state = GridState::default();
    state.toggle_sort(&columns[1]);
    state.toggle_sort(&columns[1]);
    let page = render(&rows, &columns, &state);
    assert_eq!(indices(&page), vec![1, 3, 0, 2]);
    assert_eq!(page.headers[1].sorted, Some(SortDirection::Desc));
}

#[test]
fn numeric_sort_orders_by_value() {
    let rows = receipts();
    let columns = columns();
    let mut state = GridState::default();
    state.toggle_sort(&columns[2]);
    assert_eq!(indices(&render(&rows, &columns, &state)), vec![3, 1, 2, 0]);
}

#[test]
fn global_filter_is_case_insensitive_over_visible_columns() {
    let rows = receipts();
    let columns = columns();
    let mut state = GridState::default();
    state.set_text_filter("WEEK");
    assert_eq!(indices(&render(&rows, &columns, &state)), vec![0, 2]);

    state.set_text_filter("corner");
    assert_eq!(render(&rows, &columns, &state).filtered_count, 2);
    state.toggle_visibility(&columns[1]);
    let page = render(&rows, &columns, &state);
    assert!(page.is_empty());
    assert_eq!(page.headers.len(), 3);
}

#[test]
fn numeric_cells_filter_by_their_text() {
    let mut state = GridState::default();
    state.set_text_filter("12.5");
    assert_eq!(indices(&render(&receipts(), &columns(), &state)), vec![1, 2]);
}

#[test]
fn column_filters_combine_with_global_filter() {
    let rows = receipts();
    let columns = columns();
    let mut state = GridState::default();
    state.set_column_filter("store", "corner");
    assert_eq!(indices(&render(&rows, &columns, &state)), vec![0, 2]);
    state.set_text_filter("end");
    assert_eq!(indices(&render(&rows, &columns, &state)), vec![2]);
}

#[test]
fn pages_rows_and_reports_counts() {
    let rows: Vec<Receipt> = (0..23)
        .map(|_| Receipt { name: "r", store: "s", total: 1.0 })
        .collect();
    let mut state = GridState::default();
    state.next_page(3);
    state.next_page(3);
    let page = render(&rows, &columns(), &state);
    assert_eq!(page.page_count, 3);
    assert_eq!(page.rows.len(), 3);
    assert_eq!(page.rows[0].index, 20);
    assert!(page.can_previous);
    assert!(!page.can_next);
    assert_eq!(page.page_label(), "Page 3 of 3");
    assert_eq!(page.page_size, PAGE_SIZES[0]);
}

#[test]
fn stale_page_index_after_filtering_renders_empty() {
    let rows: Vec<Receipt> = (0..15)
        .map(|i| Receipt { name: if i == 0 { "only" } else { "other" }, store: "s", total: 1.0 })
        .collect();
    let mut state = GridState::default();
    state.next_page(2);
    state.set_text_filter("only");
    let page = render(&rows, &columns(), &state);
    assert_eq!(page.filtered_count, 1);
    assert_eq!(page.page_index, 1);
    assert!(page.is_empty());
}

#[test]
fn empty_store_reports_no_results() {
    let page = render(&[], &columns(), &GridState::default());
    assert!(page.is_empty());
    assert_eq!(page.page_count, 0);
    assert_eq!(page.page_label(), "Page 1 of 1");
    assert!(!page.can_next);
}

#[test]
fn selection_marks_rows_by_original_index() {
    let rows = receipts();
    let columns = columns();
    let mut state = GridState::default();
    state.toggle_row(2);
    state.toggle_row(9);
    state.toggle_sort(&columns[2]);
    let page = render(&rows, &columns, &state);
    let selected: Vec<usize> = page.rows.iter().filter(|r| r.selected).map(|r| r.index).collect();
    assert_eq!(selected, vec![2]);
    assert_eq!(page.selected_count, 1);
}
