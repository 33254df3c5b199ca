//! Headless data grid: column descriptors, grid state, and a pure render
//! step that turns rows plus state into one page of cells.

pub mod column;
pub mod render;
pub mod state;

pub use column::{Accessor, CellRenderer, CellValue, CellView, ColumnDescriptor, RowAction};
pub use render::{EMPTY_MESSAGE, GridPage, HeaderView, RowView, render};
pub use state::{GridError, GridState, PAGE_SIZES, Pagination, Sort, SortDirection};
