//! Column descriptors and cell values.

#[cfg(test)]
#[path = "column_test.rs"]
mod column_test;

use std::cmp::Ordering;
use std::fmt;
use std::rc::Rc;

use time::Date;

use crate::controls::select::SelectView;
use crate::form::value::format_date;

/// Sortable, filterable value extracted from a row.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum CellValue {
    #[default]
    Empty,
    Text(String),
    Number(f64),
    Date(Date),
}

impl CellValue {
    /// Display text; also what the text filter matches against.
    #[must_use]
    pub fn normalized(&self) -> String {
        match self {
            Self::Empty => String::new(),
            Self::Text(text) => text.clone(),
            Self::Number(n) => n.to_string(),
            Self::Date(date) => format_date(*date),
        }
    }

    /// Total order used for sorting. Values of different variants order as
    /// empty, number, date, text.
    #[must_use]
    pub fn compare(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Number(a), Self::Number(b)) => a.total_cmp(b),
            (Self::Date(a), Self::Date(b)) => a.cmp(b),
            (Self::Text(a), Self::Text(b)) => a.to_lowercase().cmp(&b.to_lowercase()).then_with(|| a.cmp(b)),
            _ => self.rank().cmp(&other.rank()),
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Self::Empty => 0,
            Self::Number(_) => 1,
            Self::Date(_) => 2,
            Self::Text(_) => 3,
        }
    }
}

impl From<&str> for CellValue {
    fn from(text: &str) -> Self {
        Self::Text(text.to_owned())
    }
}

impl From<String> for CellValue {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<Option<String>> for CellValue {
    fn from(text: Option<String>) -> Self {
        text.map_or(Self::Empty, Self::Text)
    }
}

/// Per-row actions offered by an actions column.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RowAction {
    Edit,
    Delete,
}

/// What a cell renders as.
#[derive(Clone, Debug, PartialEq)]
pub enum CellView {
    Empty,
    Text(String),
    /// An inline select, e.g. editing an item's category from the grid.
    Select(SelectView),
    Actions(Vec<RowAction>),
}

pub type Accessor<R> = Rc<dyn Fn(&R) -> CellValue>;
pub type CellRenderer<R> = Rc<dyn Fn(&R, usize) -> CellView>;

pub struct ColumnDescriptor<R> {
    pub id: String,
    pub header: String,
    accessor: Option<Accessor<R>>,
    cell: Option<CellRenderer<R>>,
    sortable: bool,
    hideable: bool,
    width: Option<u16>,
}

impl<R> ColumnDescriptor<R> {
    /// Data column: sortable, filterable, rendered as its normalized value.
    pub fn accessor(id: impl Into<String>, header: impl Into<String>, accessor: impl Fn(&R) -> CellValue + 'static) -> Self {
        Self {
            id: id.into(),
            header: header.into(),
            accessor: Some(Rc::new(accessor)),
            cell: None,
            sortable: true,
            hideable: true,
            width: None,
        }
    }

    /// Display-only column (actions, selection). Never sorted or filtered.
    pub fn display(id: impl Into<String>, header: impl Into<String>, cell: impl Fn(&R, usize) -> CellView + 'static) -> Self {
        Self {
            id: id.into(),
            header: header.into(),
            accessor: None,
            cell: Some(Rc::new(cell)),
            sortable: false,
            hideable: false,
            width: None,
        }
    }

    /// Custom cell rendering; the accessor still drives sort and filter.
    #[must_use]
    pub fn with_cell(mut self, cell: impl Fn(&R, usize) -> CellView + 'static) -> Self {
        self.cell = Some(Rc::new(cell));
        self
    }

    #[must_use]
    pub fn not_sortable(mut self) -> Self {
        self.sortable = false;
        self
    }

    #[must_use]
    pub fn not_hideable(mut self) -> Self {
        self.hideable = false;
        self
    }

    #[must_use]
    pub fn with_width(mut self, width: u16) -> Self {
        self.width = Some(width);
        self
    }

    #[must_use]
    pub fn is_sortable(&self) -> bool {
        self.sortable && self.accessor.is_some()
    }

    #[must_use]
    pub fn is_hideable(&self) -> bool {
        self.hideable
    }

    #[must_use]
    pub fn width(&self) -> Option<u16> {
        self.width
    }

    #[must_use]
    pub fn has_accessor(&self) -> bool {
        self.accessor.is_some()
    }

    /// Accessor value, or `Empty` for display columns.
    pub fn value(&self, row: &R) -> CellValue {
        self.accessor.as_ref().map_or(CellValue::Empty, |accessor| accessor(row))
    }

    pub fn render_cell(&self, row: &R, index: usize) -> CellView {
        if let Some(cell) = &self.cell {
            return cell(row, index);
        }
        match self.value(row) {
            CellValue::Empty => CellView::Empty,
            value => CellView::Text(value.normalized()),
        }
    }
}

impl<R> fmt::Debug for ColumnDescriptor<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ColumnDescriptor")
            .field("id", &self.id)
            .field("header", &self.header)
            .field("sortable", &self.is_sortable())
            .field("hideable", &self.hideable)
            .finish_non_exhaustive()
    }
}
