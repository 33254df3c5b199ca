//! Render models produced by `FormEngine::render`.

use time::Date;

use crate::controls::{ListView, RelationView, SelectView};

/// Whole dialog body: one control per descriptor in schema order, then the
/// submit action.
#[derive(Clone, Debug, PartialEq)]
pub struct FormView {
    pub controls: Vec<ControlView>,
    pub submit: SubmitView,
}

impl FormView {
    #[must_use]
    pub fn control(&self, key: &str) -> Option<&ControlView> {
        self.controls.iter().find(|c| c.key == key)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubmitView {
    pub label: String,
    /// A commit is in flight; the action is disabled.
    pub busy: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ControlView {
    pub key: String,
    pub label: String,
    pub placeholder: Option<String>,
    pub errors: Vec<String>,
    pub widget: WidgetView,
}

#[derive(Clone, Debug, PartialEq)]
pub enum WidgetView {
    Text { value: String },
    Number { value: Option<f64> },
    Date { value: Option<Date> },
    Select(SelectView),
    MultiSelect(SelectView),
    StructuredList(ListView),
    RelationDual(RelationView),
}
