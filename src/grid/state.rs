//! Grid state: sorting, filters, pagination, column visibility, selection.
//!
//! Page navigation takes the current page count as an argument because the
//! state does not know how many rows survive filtering; `render` reports it.

#[cfg(test)]
#[path = "state_test.rs"]
mod state_test;

use std::collections::{BTreeMap, BTreeSet};

use super::column::ColumnDescriptor;

/// Page sizes offered by the page-size picker.
pub const PAGE_SIZES: [usize; 5] = [10, 20, 30, 40, 50];

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GridError {
    #[error("page size {0} is not one of {sizes:?}", sizes = PAGE_SIZES)]
    InvalidPageSize(usize),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Sort {
    pub column: String,
    pub direction: SortDirection,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pagination {
    pub page_index: usize,
    pub page_size: usize,
}

impl Default for Pagination {
    fn default() -> Self {
        Self { page_index: 0, page_size: PAGE_SIZES[0] }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GridState {
    /// One active sort column at most.
    pub sorting: Option<Sort>,
    /// Global free-text filter over every visible data column.
    pub text_filter: String,
    /// Column id -> substring filter.
    pub column_filters: BTreeMap<String, String>,
    /// Column id -> visible; columns not listed are visible.
    pub column_visibility: BTreeMap<String, bool>,
    pub pagination: Pagination,
    /// Selected rows by index into the unfiltered row list.
    pub selection: BTreeSet<usize>,
}

impl GridState {
    /// State with a non-default page size.
    ///
    /// # Errors
    ///
    /// Returns `InvalidPageSize` when `page_size` is not in `PAGE_SIZES`.
    pub fn with_page_size(page_size: usize) -> Result<Self, GridError> {
        let mut state = Self::default();
        state.set_page_size(page_size)?;
        Ok(state)
    }

    // =========================================================================
    // SORTING
    // =========================================================================

    /// Header click: a new column sorts ascending, the same column cycles
    /// ascending, descending, unsorted. Non-sortable columns are ignored.
    pub fn toggle_sort<R>(&mut self, column: &ColumnDescriptor<R>) {
        if !column.is_sortable() {
            return;
        }
        self.sorting = match self.sorting.take() {
            Some(sort) if sort.column == column.id => match sort.direction {
                SortDirection::Asc => Some(Sort { direction: SortDirection::Desc, ..sort }),
                SortDirection::Desc => None,
            },
            _ => Some(Sort { column: column.id.clone(), direction: SortDirection::Asc }),
        };
    }

    #[must_use]
    pub fn sort_direction(&self, column_id: &str) -> Option<SortDirection> {
        self.sorting
            .as_ref()
            .filter(|sort| sort.column == column_id)
            .map(|sort| sort.direction)
    }

    // =========================================================================
    // FILTERING
    // =========================================================================

    /// Replace the global filter. The page index is left alone, so a stale
    /// index may point past the filtered rows.
    pub fn set_text_filter(&mut self, text: impl Into<String>) {
        self.text_filter = text.into();
    }

    /// Set or, with an empty string, clear one column filter.
    pub fn set_column_filter(&mut self, column_id: impl Into<String>, text: impl Into<String>) {
        let (column_id, text) = (column_id.into(), text.into());
        if text.is_empty() {
            self.column_filters.remove(&column_id);
        } else {
            self.column_filters.insert(column_id, text);
        }
    }

    // =========================================================================
    // PAGINATION
    // =========================================================================

    /// Change the page size, keeping the first visible row on screen.
    ///
    /// # Errors
    ///
    /// Returns `InvalidPageSize` when `page_size` is not in `PAGE_SIZES`.
    pub fn set_page_size(&mut self, page_size: usize) -> Result<(), GridError> {
        if !PAGE_SIZES.contains(&page_size) {
            return Err(GridError::InvalidPageSize(page_size));
        }
        let first_row = self.pagination.page_index * self.pagination.page_size;
        self.pagination = Pagination { page_index: first_row / page_size, page_size };
        Ok(())
    }

    #[must_use]
    pub fn can_previous(&self) -> bool {
        self.pagination.page_index > 0
    }

    #[must_use]
    pub fn can_next(&self, page_count: usize) -> bool {
        self.pagination.page_index + 1 < page_count
    }

    pub fn next_page(&mut self, page_count: usize) {
        if self.can_next(page_count) {
            self.pagination.page_index += 1;
        }
    }

    pub fn previous_page(&mut self) {
        if self.can_previous() {
            self.pagination.page_index -= 1;
        }
    }

    pub fn first_page(&mut self) {
        self.pagination.page_index = 0;
    }

    pub fn last_page(&mut self, page_count: usize) {
        self.pagination.page_index = page_count.saturating_sub(1);
    }

    // =========================================================================
    // VISIBILITY & SELECTION
    // =========================================================================

    #[must_use]
    pub fn is_visible(&self, column_id: &str) -> bool {
        self.column_visibility.get(column_id).copied().unwrap_or(true)
    }

    /// Flip a hideable column's visibility. Returns the new visibility.
    pub fn toggle_visibility<R>(&mut self, column: &ColumnDescriptor<R>) -> bool {
        let visible = self.is_visible(&column.id);
        if !column.is_hideable() {
            return visible;
        }
        self.column_visibility.insert(column.id.clone(), !visible);
        !visible
    }

    pub fn toggle_row(&mut self, index: usize) {
        if !self.selection.remove(&index) {
            self.selection.insert(index);
        }
    }

    #[must_use]
    pub fn is_selected(&self, index: usize) -> bool {
        self.selection.contains(&index)
    }

    pub fn select_rows(&mut self, indices: impl IntoIterator<Item = usize>) {
        self.selection.extend(indices);
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }
}
