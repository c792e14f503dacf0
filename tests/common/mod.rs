//! Shared record types and adapters for integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use record_graph::{
    assign, to_value, GraphState, Identifiable, MemoryAdapter, Record, RecordAdapter, Representable,
    StorageError, Tracked, Value, ValueError,
};
use serde::Serialize;

// =============================================================================
// Records
// =============================================================================

#[derive(Debug, Default, Serialize)]
pub struct Person {
    pub id: Option<u64>,
    pub name: String,
    pub rating: i64,
    pub favorite_color: Option<String>,
    #[serde(skip)]
    pub state: GraphState,
}

impl Person {
    pub fn new(id: u64, name: &str) -> Self {
        Self {
            id: Some(id),
            name: name.to_string(),
            ..Self::default()
        }
    }

    pub fn unsaved(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    /// A copy as storage would hand it back.
    pub fn loaded(id: u64, name: &str, rating: i64) -> Self {
        Self {
            id: Some(id),
            name: name.to_string(),
            rating,
            state: GraphState::persisted(),
            ..Self::default()
        }
    }
}

impl Identifiable for Person {
    type Id = u64;

    fn id(&self) -> Option<u64> {
        self.id
    }

    fn set_id(&mut self, id: u64) {
        self.id = Some(id);
    }
}

impl Representable for Person {
    fn to_value(&self) -> Result<Value, ValueError> {
        to_value(self)
    }

    fn apply_value(&mut self, value: &Value) -> Result<(), ValueError> {
        assign(&mut self.id, value.get("id"))?;
        assign(&mut self.name, value.get("name"))?;
        assign(&mut self.rating, value.get("rating"))?;
        assign(&mut self.favorite_color, value.get("favorite_color"))
    }
}

impl Tracked for Person {
    fn graph_state(&self) -> &GraphState {
        &self.state
    }

    fn graph_state_mut(&mut self) -> &mut GraphState {
        &mut self.state
    }
}

impl Record for Person {
    const KIND: &'static str = "person";
}

#[derive(Debug, Default, Serialize)]
pub struct Car {
    pub id: Option<String>,
    pub make: String,
    pub model: String,
    pub owner: Option<u64>,
    #[serde(skip)]
    pub state: GraphState,
}

impl Car {
    pub fn new(id: &str, make: &str, model: &str) -> Self {
        Self {
            id: Some(id.to_string()),
            make: make.to_string(),
            model: model.to_string(),
            ..Self::default()
        }
    }
}

impl Identifiable for Car {
    type Id = String;

    fn id(&self) -> Option<String> {
        self.id.clone()
    }

    fn set_id(&mut self, id: String) {
        self.id = Some(id);
    }
}

impl Representable for Car {
    fn to_value(&self) -> Result<Value, ValueError> {
        to_value(self)
    }

    fn apply_value(&mut self, value: &Value) -> Result<(), ValueError> {
        assign(&mut self.id, value.get("id"))?;
        assign(&mut self.make, value.get("make"))?;
        assign(&mut self.model, value.get("model"))?;
        assign(&mut self.owner, value.get("owner"))
    }
}

impl Tracked for Car {
    fn graph_state(&self) -> &GraphState {
        &self.state
    }

    fn graph_state_mut(&mut self) -> &mut GraphState {
        &mut self.state
    }
}

impl Record for Car {
    const KIND: &'static str = "car";
}

/// A record whose body is free-form, so its shape can change between loads.
#[derive(Debug, Default)]
pub struct Document {
    pub id: u64,
    pub body: Value,
    pub state: GraphState,
}

impl Document {
    pub fn new(id: u64, body: Value) -> Self {
        Self {
            id,
            body,
            state: GraphState::new(),
        }
    }
}

impl Identifiable for Document {
    type Id = u64;

    fn id(&self) -> Option<u64> {
        Some(self.id)
    }

    fn set_id(&mut self, id: u64) {
        self.id = id;
    }
}

impl Representable for Document {
    fn to_value(&self) -> Result<Value, ValueError> {
        Ok(Value::object([("id", Value::from(self.id)), ("body", self.body.clone())]))
    }

    fn apply_value(&mut self, value: &Value) -> Result<(), ValueError> {
        assign(&mut self.id, value.get("id"))?;
        if let Some(body) = value.get("body") {
            self.body = body.clone();
        }
        Ok(())
    }
}

impl Tracked for Document {
    fn graph_state(&self) -> &GraphState {
        &self.state
    }

    fn graph_state_mut(&mut self) -> &mut GraphState {
        &mut self.state
    }
}

impl Record for Document {
    const KIND: &'static str = "document";
}

/// Claims the `person` kind with a different Rust type.
#[derive(Debug, Default, Serialize)]
pub struct Impostor {
    pub id: Option<u64>,
    #[serde(skip)]
    pub state: GraphState,
}

impl Identifiable for Impostor {
    type Id = u64;

    fn id(&self) -> Option<u64> {
        self.id
    }

    fn set_id(&mut self, id: u64) {
        self.id = Some(id);
    }
}

impl Representable for Impostor {
    fn to_value(&self) -> Result<Value, ValueError> {
        to_value(self)
    }

    fn apply_value(&mut self, value: &Value) -> Result<(), ValueError> {
        assign(&mut self.id, value.get("id"))
    }
}

impl Tracked for Impostor {
    fn graph_state(&self) -> &GraphState {
        &self.state
    }

    fn graph_state_mut(&mut self) -> &mut GraphState {
        &mut self.state
    }
}

impl Record for Impostor {
    const KIND: &'static str = "person";
}

// =============================================================================
// Adapters
// =============================================================================

/// Shared log of adapter calls, as `op:kind:id`.
pub type CallLog = Arc<Mutex<Vec<String>>>;

pub fn call_log() -> CallLog {
    Arc::new(Mutex::new(Vec::new()))
}

/// Wraps a [`MemoryAdapter`] and records every write into a shared log,
/// so tests can check ordering across kinds.
pub struct RecordingAdapter<R: Record + Default> {
    pub inner: MemoryAdapter<R>,
    log: CallLog,
}

impl<R: Record + Default> RecordingAdapter<R> {
    pub fn new(log: CallLog) -> Self {
        Self {
            inner: MemoryAdapter::new(),
            log,
        }
    }

    fn note(&self, op: &str, record: &R) {
        self.log
            .lock()
            .push(format!("{op}:{}:{:?}", R::KIND, record.id()));
    }
}

impl<R: Record + Default> RecordAdapter<R> for RecordingAdapter<R> {
    fn persist(&self, record: &R) -> Result<(), StorageError> {
        self.note("persist", record);
        self.inner.persist(record)
    }

    fn delete(&self, record: &R) -> Result<(), StorageError> {
        self.note("delete", record);
        self.inner.delete(record)
    }

    fn find_by_id(&self, id: &R::Id) -> Result<Option<R>, StorageError> {
        self.inner.find_by_id(id)
    }

    fn query_by_field(&self, field: &str, value: &Value) -> Result<Vec<R>, StorageError> {
        self.inner.query_by_field(field, value)
    }
}

/// Log entries grouped by kind, in call order.
pub fn kinds_in_order(log: &CallLog) -> Vec<String> {
    let mut kinds: Vec<String> = Vec::new();
    for entry in log.lock().iter() {
        let kind = entry.split(':').nth(1).unwrap_or_default().to_string();
        if kinds.last() != Some(&kind) {
            kinds.push(kind);
        }
    }
    kinds
}

/// Count log entries per operation.
pub fn op_counts(log: &CallLog) -> HashMap<String, usize> {
    let mut counts = HashMap::new();
    for entry in log.lock().iter() {
        let op = entry.split(':').next().unwrap_or_default().to_string();
        *counts.entry(op).or_insert(0) += 1;
    }
    counts
}
