//! Pure page derivation: filter, sort, paginate.

#[cfg(test)]
#[path = "render_test.rs"]
mod render_test;

use super::column::{CellView, ColumnDescriptor};
use super::state::{GridState, SortDirection};

/// Shown in place of rows when nothing matches.
pub const EMPTY_MESSAGE: &str = "No results.";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HeaderView {
    pub id: String,
    pub header: String,
    pub sortable: bool,
    pub sorted: Option<SortDirection>,
    pub width: Option<u16>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RowView {
    /// Index into the unfiltered rows; stable across sorting and filtering.
    pub index: usize,
    pub selected: bool,
    pub cells: Vec<CellView>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct GridPage {
    pub headers: Vec<HeaderView>,
    pub rows: Vec<RowView>,
    pub filtered_count: usize,
    pub total_count: usize,
    pub page_index: usize,
    pub page_size: usize,
    pub page_count: usize,
    pub can_previous: bool,
    pub can_next: bool,
    pub selected_count: usize,
}

impl GridPage {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// "Page 2 of 5"; a store with no rows reads "Page 1 of 1".
    #[must_use]
    pub fn page_label(&self) -> String {
        format!("Page {} of {}", self.page_index + 1, self.page_count.max(1))
    }
}

/// Derive the visible page. Filters apply over visible data columns, the
/// sort is stable, and the page index is used as is even when stale.
pub fn render<R>(rows: &[R], columns: &[ColumnDescriptor<R>], state: &GridState) -> GridPage {
    let visible: Vec<&ColumnDescriptor<R>> = columns.iter().filter(|c| state.is_visible(&c.id)).collect();

    let needle = state.text_filter.trim().to_lowercase();
    let column_filters: Vec<(&ColumnDescriptor<R>, String)> = state
        .column_filters
        .iter()
        .filter_map(|(id, text)| {
            let column = columns.iter().find(|c| &c.id == id && c.has_accessor())?;
            Some((column, text.trim().to_lowercase()))
        })
        .collect();

    let mut indices: Vec<usize> = (0..rows.len())
        .filter(|&i| {
            let row = &rows[i];
            let global = needle.is_empty()
                || visible
                    .iter()
                    .filter(|c| c.has_accessor())
                    .any(|c| c.value(row).normalized().to_lowercase().contains(&needle));
            global
                && column_filters
                    .iter()
                    .all(|(c, text)| c.value(row).normalized().to_lowercase().contains(text.as_str()))
        })
        .collect();

    if let Some(sort) = &state.sorting
        && let Some(column) = columns.iter().find(|c| c.id == sort.column && c.is_sortable())
    {
        indices.sort_by(|&a, &b| {
            let (a, b) = (column.value(&rows[a]), column.value(&rows[b]));
            match sort.direction {
                SortDirection::Asc => a.compare(&b),
                SortDirection::Desc => b.compare(&a),
            }
        });
    }

    let filtered_count = indices.len();
    let page_size = state.pagination.page_size.max(1);
    let page_index = state.pagination.page_index;
    let page_count = filtered_count.div_ceil(page_size);

    let page_rows = indices
        .iter()
        .skip(page_index.saturating_mul(page_size))
        .take(page_size)
        .map(|&index| RowView {
            index,
            selected: state.is_selected(index),
            cells: visible.iter().map(|c| c.render_cell(&rows[index], index)).collect(),
        })
        .collect();

    GridPage {
        headers: visible
            .iter()
            .map(|c| HeaderView {
                id: c.id.clone(),
                header: c.header.clone(),
                sortable: c.is_sortable(),
                sorted: state.sort_direction(&c.id),
                width: c.width(),
            })
            .collect(),
        rows: page_rows,
        filtered_count,
        total_count: rows.len(),
        page_index,
        page_size,
        page_count,
        can_previous: state.can_previous(),
        can_next: state.can_next(page_count),
        selected_count: state.selection.iter().filter(|&&i| i < rows.len()).count(),
    }
}
