//! Field values and the form value snapshot.

#[cfg(test)]
#[path = "value_test.rs"]
mod value_test;

use std::collections::BTreeMap;

use serde_json::{Map, Value, json};
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, OffsetDateTime};

/// Server-assigned identifier of a record.
pub type RecordId = i64;

/// Key -> value map used for nested records and staged rows.
pub type ValueMap = BTreeMap<String, FieldValue>;

static EMPTY: FieldValue = FieldValue::Empty;

/// One field value. The variant in use is fixed by the field's kind.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum FieldValue {
    #[default]
    Empty,
    Text(String),
    Number(f64),
    Date(Date),
    /// Single-select value.
    Id(RecordId),
    /// Multi-select value; kept free of duplicates.
    Ids(Vec<RecordId>),
    /// Committed rows of a structured list.
    List(Vec<ListItemRecord>),
    /// Nested create payload of a relation editor.
    Record(ValueMap),
}

impl FieldValue {
    /// True when the value carries no user input.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Text(text) => text.is_empty(),
            Self::Ids(ids) => ids.is_empty(),
            Self::List(rows) => rows.is_empty(),
            Self::Record(map) => map.values().all(FieldValue::is_empty),
            Self::Number(_) | Self::Date(_) | Self::Id(_) => false,
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_date(&self) -> Option<Date> {
        match self {
            Self::Date(date) => Some(*date),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_id(&self) -> Option<RecordId> {
        match self {
            Self::Id(id) => Some(*id),
            _ => None,
        }
    }

    /// Selected ids of a multi-select; empty for every other variant.
    #[must_use]
    pub fn as_ids(&self) -> &[RecordId] {
        match self {
            Self::Ids(ids) => ids,
            _ => &[],
        }
    }

    #[must_use]
    pub fn as_rows(&self) -> &[ListItemRecord] {
        match self {
            Self::List(rows) => rows,
            _ => &[],
        }
    }

    /// JSON wire form. Dates go out as RFC 3339 midnight UTC.
    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            Self::Empty => Value::Null,
            Self::Text(text) => json!(text),
            Self::Number(n) => json!(n),
            Self::Date(date) => date_to_json(*date),
            Self::Id(id) => json!(id),
            Self::Ids(ids) => json!(ids),
            Self::List(rows) => Value::Array(rows.iter().map(ListItemRecord::to_json).collect()),
            Self::Record(map) => map_to_json(map),
        }
    }
}

/// `YYYY-MM-DD` display form of a date.
#[must_use]
pub fn format_date(date: Date) -> String {
    date.format(format_description!("[year]-[month]-[day]"))
        .unwrap_or_default()
}

/// Parse `YYYY-MM-DD`.
#[must_use]
pub fn parse_date(text: &str) -> Option<Date> {
    Date::parse(text.trim(), format_description!("[year]-[month]-[day]")).ok()
}

fn date_to_json(date: Date) -> Value {
    let midnight: OffsetDateTime = date.midnight().assume_utc();
    midnight
        .format(&Rfc3339)
        .map_or(Value::Null, Value::String)
}

/// Serialize a value map, omitting empty entries.
fn map_to_json(map: &ValueMap) -> Value {
    let object: Map<String, Value> = map
        .iter()
        .filter(|(_, v)| !matches!(v, FieldValue::Empty))
        .map(|(k, v)| (k.clone(), v.to_json()))
        .collect();
    Value::Object(object)
}

// =============================================================================
// LIST ROWS
// =============================================================================

/// A committed row of a structured list.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ListItemRecord {
    values: ValueMap,
}

impl ListItemRecord {
    #[must_use]
    pub fn new(values: ValueMap) -> Self {
        Self { values }
    }

    #[must_use]
    pub fn get(&self, key: &str) -> &FieldValue {
        self.values.get(key).unwrap_or(&EMPTY)
    }

    pub fn set(&mut self, key: impl Into<String>, value: FieldValue) {
        self.values.insert(key.into(), value);
    }

    #[must_use]
    pub fn values(&self) -> &ValueMap {
        &self.values
    }

    /// True when at least one value carries input.
    #[must_use]
    pub fn has_input(&self) -> bool {
        self.values.values().any(|v| !v.is_empty())
    }

    #[must_use]
    pub fn to_json(&self) -> Value {
        map_to_json(&self.values)
    }
}

impl<K: Into<String>> FromIterator<(K, FieldValue)> for ListItemRecord {
    fn from_iter<I: IntoIterator<Item = (K, FieldValue)>>(iter: I) -> Self {
        Self { values: iter.into_iter().map(|(k, v)| (k.into(), v)).collect() }
    }
}

// =============================================================================
// SNAPSHOT
// =============================================================================

/// Field key -> value mapping for one form session.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Snapshot {
    values: ValueMap,
}

impl Snapshot {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder used for default values.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: FieldValue) -> Self {
        self.set(key, value);
        self
    }

    /// Value at `key`, or `Empty` when absent.
    #[must_use]
    pub fn get(&self, key: &str) -> &FieldValue {
        self.values.get(key).unwrap_or(&EMPTY)
    }

    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn set(&mut self, key: impl Into<String>, value: FieldValue) {
        self.values.insert(key.into(), value);
    }

    /// Reset `key` to `Empty`, keeping the key present.
    pub fn clear(&mut self, key: &str) {
        self.values.insert(key.to_owned(), FieldValue::Empty);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &FieldValue)> {
        self.values.iter()
    }

    /// Rows of a structured list field, created on first access.
    pub(crate) fn list_mut(&mut self, key: &str) -> &mut Vec<ListItemRecord> {
        let slot = self
            .values
            .entry(key.to_owned())
            .or_insert_with(|| FieldValue::List(Vec::new()));
        if !matches!(slot, FieldValue::List(_)) {
            *slot = FieldValue::List(Vec::new());
        }
        let FieldValue::List(rows) = slot else {
            unreachable!("slot was just normalized to a list");
        };
        rows
    }

    /// Request body form: a JSON object without the empty entries.
    #[must_use]
    pub fn to_json(&self) -> Value {
        map_to_json(&self.values)
    }
}

impl<K: Into<String>> FromIterator<(K, FieldValue)> for Snapshot {
    fn from_iter<I: IntoIterator<Item = (K, FieldValue)>>(iter: I) -> Self {
        Self { values: iter.into_iter().map(|(k, v)| (k.into(), v)).collect() }
    }
}
