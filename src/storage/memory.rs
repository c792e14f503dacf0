// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;

use super::traits::{RecordAdapter, StorageError};
use crate::record::{GraphState, Record};
use crate::value::Value;

/// In-memory record storage keyed by identifier.
///
/// Rows are kept as representations, so every load builds a fresh record
/// the way a real backend would. Call counters let tests observe exactly
/// what the graph sent to storage.
pub struct MemoryAdapter<R: Record> {
    rows: DashMap<R::Id, Value>,
    persists: AtomicU64,
    deletes: AtomicU64,
    lookups: AtomicU64,
    _record: PhantomData<fn() -> R>,
}

impl<R: Record + Default> MemoryAdapter<R> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            rows: DashMap::new(),
            persists: AtomicU64::new(0),
            deletes: AtomicU64::new(0),
            lookups: AtomicU64::new(0),
            _record: PhantomData,
        }
    }

    /// Seed a row directly, bypassing the counters.
    pub fn insert_raw(&self, id: R::Id, value: Value) {
        self.rows.insert(id, value);
    }

    /// The stored representation for `id`.
    #[must_use]
    pub fn row(&self, id: &R::Id) -> Option<Value> {
        self.rows.get(id).map(|r| r.value().clone())
    }

    /// Get current row count
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Check if empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Clear all rows
    pub fn clear(&self) {
        self.rows.clear();
    }

    #[must_use]
    pub fn persist_count(&self) -> u64 {
        self.persists.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn delete_count(&self) -> u64 {
        self.deletes.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn lookup_count(&self) -> u64 {
        self.lookups.load(Ordering::Relaxed)
    }

    fn load(&self, id: &R::Id, row: &Value) -> Result<R, StorageError> {
        let mut record = R::default();
        record.apply_value(row)?;
        record.set_id(id.clone());
        *record.graph_state_mut() = GraphState::persisted();
        Ok(record)
    }
}

impl<R: Record + Default> Default for MemoryAdapter<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Record + Default> RecordAdapter<R> for MemoryAdapter<R> {
    fn persist(&self, record: &R) -> Result<(), StorageError> {
        let id = record.id().ok_or_else(|| StorageError::Rejected {
            id: String::from("<none>"),
            reason: String::from("record has no identifier"),
        })?;
        let row = record.to_value()?;
        self.rows.insert(id, row);
        self.persists.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn delete(&self, record: &R) -> Result<(), StorageError> {
        if let Some(id) = record.id() {
            self.rows.remove(&id);
        }
        self.deletes.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn find_by_id(&self, id: &R::Id) -> Result<Option<R>, StorageError> {
        self.lookups.fetch_add(1, Ordering::Relaxed);
        let Some(row) = self.row(id) else {
            return Ok(None);
        };
        self.load(id, &row).map(Some)
    }

    fn query_by_field(&self, field: &str, value: &Value) -> Result<Vec<R>, StorageError> {
        self.lookups.fetch_add(1, Ordering::Relaxed);
        let matches: Vec<(R::Id, Value)> = self
            .rows
            .iter()
            .filter(|r| r.value().get(field) == Some(value))
            .map(|r| (r.key().clone(), r.value().clone()))
            .collect();

        matches.iter().map(|(id, row)| self.load(id, row)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{Identifiable, Representable, Tracked};
    use crate::value::{assign, to_value, ValueError};
    use serde::Serialize;
    use serde_json::json;

    #[derive(Debug, Default, Serialize)]
    struct Item {
        id: Option<String>,
        shelf: String,
        #[serde(skip)]
        state: GraphState,
    }

    impl Identifiable for Item {
        type Id = String;
        fn id(&self) -> Option<String> {
            self.id.clone()
        }
        fn set_id(&mut self, id: String) {
            self.id = Some(id);
        }
    }

    impl Representable for Item {
        fn to_value(&self) -> Result<Value, ValueError> {
            to_value(self)
        }
        fn apply_value(&mut self, value: &Value) -> Result<(), ValueError> {
            assign(&mut self.id, value.get("id"))?;
            assign(&mut self.shelf, value.get("shelf"))
        }
    }

    impl Tracked for Item {
        fn graph_state(&self) -> &GraphState {
            &self.state
        }
        fn graph_state_mut(&mut self) -> &mut GraphState {
            &mut self.state
        }
    }

    impl Record for Item {
        const KIND: &'static str = "item";
    }

    fn item(id: &str, shelf: &str) -> Item {
        Item { id: Some(id.into()), shelf: shelf.into(), ..Item::default() }
    }

    #[test]
    fn test_new_adapter_is_empty() {
        let adapter = MemoryAdapter::<Item>::new();
        assert!(adapter.is_empty());
        assert_eq!(adapter.len(), 0);
    }

    #[test]
    fn test_persist_and_find() {
        let adapter = MemoryAdapter::<Item>::new();
        adapter.persist(&item("item-1", "A")).unwrap();
        assert_eq!(adapter.persist_count(), 1);

        let found = adapter.find_by_id(&"item-1".to_string()).unwrap().unwrap();
        assert_eq!(found.shelf, "A");
        assert!(found.exists_in_storage());
        assert_eq!(adapter.lookup_count(), 1);
    }

    #[test]
    fn test_find_nonexistent_returns_none() {
        let adapter = MemoryAdapter::<Item>::new();
        assert!(adapter.find_by_id(&"missing".to_string()).unwrap().is_none());
    }

    #[test]
    fn test_persist_without_id_is_rejected() {
        let adapter = MemoryAdapter::<Item>::new();
        let result = adapter.persist(&Item::default());
        assert!(matches!(result, Err(StorageError::Rejected { .. })));
        assert!(adapter.is_empty());
    }

    #[test]
    fn test_delete() {
        let adapter = MemoryAdapter::<Item>::new();
        let record = item("to-delete", "B");
        adapter.persist(&record).unwrap();
        adapter.delete(&record).unwrap();

        assert!(adapter.is_empty());
        assert_eq!(adapter.delete_count(), 1);
    }

    #[test]
    fn test_persist_overwrites() {
        let adapter = MemoryAdapter::<Item>::new();
        adapter.persist(&item("same-id", "A")).unwrap();
        adapter.persist(&item("same-id", "B")).unwrap();

        assert_eq!(adapter.len(), 1);
        let row = adapter.row(&"same-id".to_string()).unwrap();
        assert_eq!(row.get("shelf").and_then(Value::as_str), Some("B"));
    }

    #[test]
    fn test_query_by_field() {
        let adapter = MemoryAdapter::<Item>::new();
        adapter.insert_raw("a".into(), Value::from(json!({"id": "a", "shelf": "top"})));
        adapter.insert_raw("b".into(), Value::from(json!({"id": "b", "shelf": "bottom"})));
        adapter.insert_raw("c".into(), Value::from(json!({"id": "c", "shelf": "top"})));

        let mut found = adapter.query_by_field("shelf", &Value::from("top")).unwrap();
        found.sort_by(|a, b| a.id.cmp(&b.id));
        let ids: Vec<_> = found.iter().filter_map(|i| i.id.clone()).collect();
        assert_eq!(ids, vec!["a".to_string(), "c".to_string()]);
    }

    #[test]
    fn test_clear() {
        let adapter = MemoryAdapter::<Item>::new();
        for i in 0..10 {
            adapter.persist(&item(&format!("item-{i}"), "A")).unwrap();
        }
        assert_eq!(adapter.len(), 10);

        adapter.clear();
        assert!(adapter.is_empty());
    }
}
