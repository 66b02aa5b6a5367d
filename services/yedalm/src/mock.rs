//! In-memory store implementation for testing
//!
//! This module provides a [`RemoteStore`] that keeps rows in memory and
//! behaves like the hosted data API closely enough for the console and the
//! site to run without a backend (`"backend": {"url": "memory"}`). Tests can
//! inject failures, hold updates forever and inspect the calls made. The
//! offline site uses [`MemoryStore::demo`], which keeps no call log.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::store::{Filter, Query, RemoteStore};
use crate::YedalmError;

/// A call observed by the store, in arrival order
#[derive(Debug, Clone, PartialEq)]
pub enum StoreCall {
    Select { collection: String },
    Insert { collection: String, row: Value },
    Update { collection: String, filter: Filter, fields: Value },
    Delete { collection: String, filter: Filter },
}

#[derive(Debug, Default)]
struct MemoryState {
    collections: HashMap<String, Vec<Value>>,
    calls: Vec<StoreCall>,
    record_calls: bool,
    failing_selects: HashSet<String>,
    failing_writes: HashSet<String>,
    failing_updates: HashSet<(String, i64)>,
    hold_updates: bool,
}

impl MemoryState {
    fn record(&mut self, call: StoreCall) {
        if self.record_calls {
            self.calls.push(call);
        }
    }
}

/// In-memory [`RemoteStore`]
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MemoryStore {
    /// Empty store that records every call
    pub fn new() -> Self {
        let store = Self::default();
        store.lock().record_calls = true;
        store
    }

    /// Demo content without a call log, for serving the site offline
    pub fn demo() -> Self {
        let store = Self::seeded();
        store.lock().record_calls = false;
        store
    }

    /// Store pre-filled with a small set of demo content
    pub fn seeded() -> Self {
        let store = Self::new();
        store.insert_rows(
            "slide_images",
            vec![
                json!({"id": 1, "title": "Welcome", "image_url": "/static/welcome.jpg",
                       "description": "Sunday worship at 11:00", "order_index": 1, "is_active": true}),
                json!({"id": 2, "title": "Summer Retreat", "image_url": "/static/retreat.jpg",
                       "description": "Registration is open", "order_index": 2, "is_active": true}),
            ],
        );
        store.insert_rows(
            "organization",
            vec![
                json!({"id": 1, "name": "Pastoral Staff", "description": "",
                       "members": [{"name": "Kim", "role": "Pastor", "image_url": ""}], "order_index": 1}),
                json!({"id": 2, "name": "Praise Team", "description": "Sunday worship band",
                       "members": [], "order_index": 2}),
            ],
        );
        store.insert_rows(
            "facilities",
            vec![json!({"id": 1, "name": "Main Hall", "description": "Seats 120",
                        "image_url": "", "order_index": 1, "is_active": true})],
        );
        store.insert_rows(
            "scripture",
            vec![json!({"id": 1, "verse": "The Lord is my shepherd; I shall not want.",
                        "reference": "Psalm 23:1", "description": "", "is_active": true})],
        );
        store.insert_rows(
            "admin_settings",
            vec![json!({"id": 1, "password_hash": "admin"})],
        );
        store
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Append raw rows to a collection
    pub fn insert_rows(&self, collection: &str, rows: Vec<Value>) {
        self.lock()
            .collections
            .entry(collection.to_string())
            .or_default()
            .extend(rows);
    }

    /// Current rows of a collection, in storage order
    pub fn rows(&self, collection: &str) -> Vec<Value> {
        self.lock()
            .collections
            .get(collection)
            .cloned()
            .unwrap_or_default()
    }

    /// Make every select on the collection fail
    pub fn fail_selects(&self, collection: &str) {
        self.lock().failing_selects.insert(collection.to_string());
    }

    /// Make every insert, update and delete on the collection fail
    pub fn fail_writes(&self, collection: &str) {
        self.lock().failing_writes.insert(collection.to_string());
    }

    /// Make updates of one row fail
    pub fn fail_update_of(&self, collection: &str, id: i64) {
        self.lock()
            .failing_updates
            .insert((collection.to_string(), id));
    }

    /// Updates are recorded but never resolve
    pub fn hold_updates(&self) {
        self.lock().hold_updates = true;
    }

    pub fn calls(&self) -> Vec<StoreCall> {
        self.lock().calls.clone()
    }

    /// `(id, order_index)` of every update on the collection that set `order_index`
    pub fn order_updates(&self, collection: &str) -> Vec<(i64, i64)> {
        self.lock()
            .calls
            .iter()
            .filter_map(|call| match call {
                StoreCall::Update {
                    collection: c,
                    filter,
                    fields,
                } if c == collection && filter.column == "id" => {
                    let id = filter.value.parse().ok()?;
                    let order_index = fields.get("order_index")?.as_i64()?;
                    Some((id, order_index))
                }
                _ => None,
            })
            .collect()
    }

    /// Persisted `order_index` per id
    pub fn persisted_order(&self, collection: &str) -> HashMap<i64, i64> {
        self.rows(collection)
            .iter()
            .filter_map(|row| Some((row.get("id")?.as_i64()?, row.get("order_index")?.as_i64()?)))
            .collect()
    }

    /// Highest number of operations that were in progress at the same time
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn enter(&self) -> InFlight<'_> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        InFlight(&self.in_flight)
    }

    fn write_failure(collection: &str, message: &str) -> YedalmError {
        YedalmError::Store {
            collection: collection.to_string(),
            message: message.to_string(),
        }
    }
}

/// Decrements the in-flight counter when the operation finishes
struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

fn column_text(row: &Value, column: &str) -> Option<String> {
    match row.get(column)? {
        Value::String(s) => Some(s.clone()),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

fn matches(row: &Value, filter: &Filter) -> bool {
    column_text(row, &filter.column).as_deref() == Some(filter.value.as_str())
}

fn merge(row: &mut Value, fields: &Value) {
    if let (Some(target), Some(source)) = (row.as_object_mut(), fields.as_object()) {
        for (key, value) in source {
            target.insert(key.clone(), value.clone());
        }
    }
}

#[async_trait]
impl RemoteStore for MemoryStore {
    async fn select(&self, collection: &str, query: &Query) -> crate::Result<Vec<Value>> {
        let _guard = self.enter();
        tokio::task::yield_now().await;

        let mut state = self.lock();
        state.record(StoreCall::Select {
            collection: collection.to_string(),
        });
        if state.failing_selects.contains(collection) {
            return Err(Self::write_failure(collection, "select failed"));
        }

        let mut rows: Vec<Value> = state
            .collections
            .get(collection)
            .map(|rows| {
                rows.iter()
                    .filter(|row| query.filters.iter().all(|f| matches(row, f)))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        if let Some(column) = &query.order_by {
            rows.sort_by_key(|row| row.get(column).and_then(Value::as_i64).unwrap_or(i64::MAX));
        }
        Ok(rows)
    }

    async fn insert(&self, collection: &str, row: &Value) -> crate::Result<Value> {
        let _guard = self.enter();
        tokio::task::yield_now().await;

        let mut state = self.lock();
        state.record(StoreCall::Insert {
            collection: collection.to_string(),
            row: row.clone(),
        });
        if state.failing_writes.contains(collection) {
            return Err(Self::write_failure(collection, "insert failed"));
        }

        let rows = state.collections.entry(collection.to_string()).or_default();
        let next_id = rows
            .iter()
            .filter_map(|r| r.get("id").and_then(Value::as_i64))
            .max()
            .unwrap_or(0)
            + 1;
        let mut stored = json!({ "id": next_id });
        merge(&mut stored, row);
        rows.push(stored.clone());
        Ok(stored)
    }

    async fn update(
        &self,
        collection: &str,
        filter: &Filter,
        fields: &Value,
    ) -> crate::Result<Value> {
        let _guard = self.enter();
        let hold = {
            let mut state = self.lock();
            state.record(StoreCall::Update {
                collection: collection.to_string(),
                filter: filter.clone(),
                fields: fields.clone(),
            });
            state.hold_updates
        };
        if hold {
            std::future::pending::<()>().await;
        }
        tokio::task::yield_now().await;

        let mut state = self.lock();
        let failing_row = filter.column == "id"
            && filter
                .value
                .parse::<i64>()
                .map(|id| state.failing_updates.contains(&(collection.to_string(), id)))
                .unwrap_or(false);
        if failing_row || state.failing_writes.contains(collection) {
            return Err(Self::write_failure(collection, "update failed"));
        }

        let mut first = None;
        if let Some(rows) = state.collections.get_mut(collection) {
            for row in rows.iter_mut().filter(|row| matches(row, filter)) {
                merge(row, fields);
                first.get_or_insert_with(|| row.clone());
            }
        }
        first.ok_or_else(|| {
            YedalmError::NotFound(format!(
                "update where {} on '{}' returned no rows",
                filter, collection
            ))
        })
    }

    async fn delete(&self, collection: &str, filter: &Filter) -> crate::Result<()> {
        let _guard = self.enter();
        tokio::task::yield_now().await;

        let mut state = self.lock();
        state.record(StoreCall::Delete {
            collection: collection.to_string(),
            filter: filter.clone(),
        });
        if state.failing_writes.contains(collection) {
            return Err(Self::write_failure(collection, "delete failed"));
        }
        if let Some(rows) = state.collections.get_mut(collection) {
            rows.retain(|row| !matches(row, filter));
        }
        Ok(())
    }
}
