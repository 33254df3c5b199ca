//! Categories page: a flat list with create, edit and delete.

#[cfg(test)]
#[path = "categories_test.rs"]
mod categories_test;

use serde_json::json;
use uuid::Uuid;

use super::controller::{CollectionPage, DialogKind, DialogSession, PageError, actions_column, id_column};
use crate::config::ApiConfig;
use crate::form::{FieldDescriptor, FieldSchema, FieldValue, FormEngine, RecordId, Rules, Snapshot};
use crate::grid::{ColumnDescriptor, GridPage, render};
use crate::net::{Category, Collection};

/// Entity tag for categories created from this page.
pub const DEFAULT_ENTITY: &str = "item";

/// Single `name` field shared by every category dialog.
///
/// # Errors
///
/// Propagates schema and form construction errors.
pub fn category_form(name: &str) -> Result<FormEngine, PageError> {
    let schema = FieldSchema::new(vec![FieldDescriptor::text("name", "Name").with_placeholder("Health")])?;
    let defaults = Snapshot::new().with("name", FieldValue::Text(name.to_owned()));
    Ok(FormEngine::new(schema, defaults, Rules::new().required_text("name", "Name is required"))?)
}

/// "Create Category" dialog writing categories tagged with `entity`.
///
/// # Errors
///
/// Propagates form construction errors.
pub fn create_category_dialog(entity: &str) -> Result<DialogSession, PageError> {
    Ok(DialogSession::new(
        DialogKind::Create,
        Collection::Categories,
        "Create Category",
        "Create a category for your items.",
        category_form("")?,
    )
    .with_fixed("entity", json!(entity)))
}

pub struct CategoriesPage {
    pub page: CollectionPage<Category>,
}

impl CategoriesPage {
    /// # Errors
    ///
    /// Returns `Grid` for an unsupported configured page size.
    pub fn new(config: &ApiConfig) -> Result<Self, PageError> {
        Ok(Self { page: CollectionPage::new(Collection::Categories, config)? })
    }

    /// # Errors
    ///
    /// Propagates form construction errors.
    pub fn open_create(&mut self) -> Result<Uuid, PageError> {
        Ok(self.page.open_dialog(create_category_dialog(DEFAULT_ENTITY)?))
    }

    /// Open the edit dialog for a loaded row. Its entity tag is sent back
    /// unchanged.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when `id` is not among the loaded rows.
    pub fn open_edit(&mut self, id: RecordId) -> Result<Uuid, PageError> {
        let category = self
            .page
            .rows
            .iter()
            .find(|c| c.id == id)
            .ok_or(PageError::NotFound { collection: Collection::Categories, id })?;
        let entity = category.entity.clone();
        let mut session = DialogSession::new(
            DialogKind::Edit(id),
            Collection::Categories,
            "Edit Category",
            "Edit a category for your items.",
            category_form(&category.name)?,
        );
        if let Some(entity) = entity {
            session = session.with_fixed("entity", json!(entity));
        }
        Ok(self.page.open_dialog(session))
    }

    #[must_use]
    pub fn columns() -> Vec<ColumnDescriptor<Category>> {
        vec![
            id_column(|c: &Category| c.id),
            ColumnDescriptor::accessor("name", "Name", |c: &Category| c.name.as_str().into()),
            actions_column(),
        ]
    }

    #[must_use]
    pub fn grid(&self) -> GridPage {
        render(&self.page.rows, &Self::columns(), &self.page.grid)
    }
}
