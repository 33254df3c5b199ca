//! In-memory `DataAccess` for controller tests.

use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{Value, json};

use super::api::{ApiError, DataAccess};
use super::types::{Collection, Relation};
use crate::form::value::RecordId;

#[derive(Default)]
struct StoreState {
    records: BTreeMap<Collection, Vec<Value>>,
    next_id: RecordId,
    fail_next: Option<ApiError>,
    calls: Vec<String>,
}

/// Records keyed by collection, ids assigned on create. Nested create
/// payloads (`category` on items) become category records, the way the
/// service expands them.
#[derive(Default)]
pub struct FakeStore {
    state: Mutex<StoreState>,
}

impl FakeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record as is; it must carry an `id`.
    pub fn seed(&self, collection: Collection, record: Value) -> &Self {
        let mut state = self.state.lock().unwrap();
        if let Some(id) = record["id"].as_i64() {
            state.next_id = state.next_id.max(id);
        }
        state.records.entry(collection).or_default().push(record);
        self
    }

    /// Make the next call fail with `error`.
    pub fn fail_next(&self, error: ApiError) {
        self.state.lock().unwrap().fail_next = Some(error);
    }

    pub fn records(&self, collection: Collection) -> Vec<Value> {
        self.state.lock().unwrap().records.get(&collection).cloned().unwrap_or_default()
    }

    pub fn record(&self, collection: Collection, id: RecordId) -> Option<Value> {
        self.records(collection).into_iter().find(|r| r["id"] == json!(id))
    }

    /// `"list items"`, `"create categories"`, ... in call order.
    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }
}

impl StoreState {
    fn enter(&mut self, call: String) -> Result<(), ApiError> {
        self.calls.push(call);
        self.fail_next.take().map_or(Ok(()), Err)
    }

    fn insert(&mut self, collection: Collection, mut body: Value) -> Value {
        self.next_id += 1;
        body["id"] = json!(self.next_id);
        if collection == Collection::Items {
            if let Some(payload) = body.get("category").cloned().filter(Value::is_object) {
                let mut category = payload;
                category["entity"] = json!("item");
                let category = self.insert(Collection::Categories, category);
                body["categoryId"] = category["id"].clone();
                body["category"] = category;
            }
        }
        self.records.entry(collection).or_default().push(body.clone());
        body
    }

    fn find_mut(&mut self, collection: Collection, id: RecordId) -> Option<&mut Value> {
        self.records
            .get_mut(&collection)?
            .iter_mut()
            .find(|r| r["id"] == json!(id))
    }
}

#[async_trait]
impl DataAccess for FakeStore {
    async fn list(&self, collection: Collection, params: &[(&str, &str)]) -> Result<Vec<Value>, ApiError> {
        let mut state = self.state.lock().unwrap();
        state.enter(format!("list {}", collection.path()))?;
        let records = state.records.get(&collection).cloned().unwrap_or_default();
        Ok(records
            .into_iter()
            .filter(|r| params.iter().all(|(k, v)| r[*k].as_str() == Some(*v)))
            .collect())
    }

    async fn get(&self, collection: Collection, id: RecordId) -> Result<Option<Value>, ApiError> {
        let mut state = self.state.lock().unwrap();
        state.enter(format!("get {} {id}", collection.path()))?;
        Ok(state.find_mut(collection, id).map(|r| r.clone()))
    }

    async fn create(&self, collection: Collection, body: &Value) -> Result<Option<Value>, ApiError> {
        let mut state = self.state.lock().unwrap();
        state.enter(format!("create {}", collection.path()))?;
        Ok(Some(state.insert(collection, body.clone())))
    }

    async fn update(&self, collection: Collection, id: RecordId, body: &Value) -> Result<Option<Value>, ApiError> {
        let mut state = self.state.lock().unwrap();
        state.enter(format!("update {} {id}", collection.path()))?;
        let record = state
            .find_mut(collection, id)
            .ok_or_else(|| ApiError::Status { status: 404, body: "not found".into() })?;
        if let (Some(target), Some(fields)) = (record.as_object_mut(), body.as_object()) {
            for (key, value) in fields {
                target.insert(key.clone(), value.clone());
            }
        }
        Ok(Some(record.clone()))
    }

    async fn delete(&self, collection: Collection, id: RecordId) -> Result<bool, ApiError> {
        let mut state = self.state.lock().unwrap();
        state.enter(format!("delete {} {id}", collection.path()))?;
        let records = state.records.entry(collection).or_default();
        let before = records.len();
        records.retain(|r| r["id"] != json!(id));
        Ok(records.len() < before)
    }

    async fn connect_relation(&self, relation: Relation, owner: RecordId, related: RecordId) -> Result<bool, ApiError> {
        let mut state = self.state.lock().unwrap();
        state.enter(format!("connect {} {owner} {related}", relation.owner().path()))?;
        let Some(category) = state.find_mut(Collection::Categories, related).map(|c| c.clone()) else {
            return Err(ApiError::Status { status: 404, body: "category not found".into() });
        };
        let Some(record) = state.find_mut(relation.owner(), owner) else {
            return Err(ApiError::Status { status: 404, body: "owner not found".into() });
        };
        match relation {
            Relation::ItemCategory => {
                record["categoryId"] = json!(related);
                record["category"] = category;
            }
            Relation::ReceiptCategory => {
                if !record["categories"].is_array() {
                    record["categories"] = json!([]);
                }
                if let Some(categories) = record["categories"].as_array_mut() {
                    if !categories.iter().any(|c| c["id"] == json!(related)) {
                        categories.push(category);
                    }
                }
            }
        }
        Ok(true)
    }

    async fn disconnect_relation(
        &self,
        relation: Relation,
        owner: RecordId,
        related: RecordId,
    ) -> Result<bool, ApiError> {
        let mut state = self.state.lock().unwrap();
        state.enter(format!("disconnect {} {owner} {related}", relation.owner().path()))?;
        let Some(record) = state.find_mut(relation.owner(), owner) else {
            return Ok(false);
        };
        match relation {
            Relation::ItemCategory => {
                record["categoryId"] = Value::Null;
                record["category"] = Value::Null;
            }
            Relation::ReceiptCategory => {
                if let Some(categories) = record["categories"].as_array_mut() {
                    categories.retain(|c| c["id"] != json!(related));
                }
            }
        }
        Ok(true)
    }
}
