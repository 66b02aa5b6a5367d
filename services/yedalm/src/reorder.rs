//! Reorder coordinator: optimistic list replacement plus per-row persistence
//!
//! A reorder runs in two phases. The held list is replaced with the new
//! order first, before any network call, and is never rolled back. Then
//! every row gets `order_index = position + 1` written back to the store,
//! one update at a time in list order. A failed write is logged and
//! reported in the [`ReorderOutcome`]; the remaining rows are still written.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::entity::Record;
use crate::state::{is_permutation_of, ListHandle};
use crate::store::{Filter, RemoteStore};
use crate::YedalmError;

/// Result of persisting one row's position
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistResult {
    pub id: i64,
    pub order_index: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PersistResult {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Per-row outcome of the persistence phase, in call order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReorderOutcome {
    pub collection: String,
    pub results: Vec<PersistResult>,
}

impl ReorderOutcome {
    /// True only if every update succeeded
    pub fn is_success(&self) -> bool {
        self.results.iter().all(PersistResult::is_ok)
    }

    pub fn failures(&self) -> impl Iterator<Item = &PersistResult> {
        self.results.iter().filter(|r| !r.is_ok())
    }

    pub fn failed_count(&self) -> usize {
        self.failures().count()
    }
}

/// Applies a new order to a held list and mirrors it to the store
pub struct ReorderCoordinator {
    store: Arc<dyn RemoteStore>,
}

impl std::fmt::Debug for ReorderCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReorderCoordinator").finish()
    }
}

impl ReorderCoordinator {
    pub fn new(store: Arc<dyn RemoteStore>) -> Self {
        Self { store }
    }

    /// Replace `list` with `new_order` and persist dense positions `1..=N`.
    ///
    /// `new_order` must hold exactly the rows currently in `list`; anything
    /// else is rejected before the list or the store is touched. Once the
    /// permutation is accepted this returns `Ok` even when writes failed.
    pub async fn reorder<T: Record>(
        &self,
        list: &ListHandle<T>,
        mut new_order: Vec<T>,
    ) -> crate::Result<ReorderOutcome> {
        {
            let mut held = list.write().await;
            if !is_permutation_of(&held, &new_order) {
                tracing::warn!(
                    "Rejected reorder of '{}': {} submitted rows do not match the {} held rows",
                    T::COLLECTION,
                    new_order.len(),
                    held.len()
                );
                return Err(YedalmError::Reorder(format!(
                    "submitted order for '{}' is not a permutation of the current list",
                    T::COLLECTION
                )));
            }

            for (position, row) in new_order.iter_mut().enumerate() {
                row.set_order_index(position as i32 + 1);
            }
            *held = new_order.clone();
        }

        tracing::debug!(
            "Applied new order for '{}' ({} rows), persisting",
            T::COLLECTION,
            new_order.len()
        );

        let writes: Vec<(i64, i32)> = new_order
            .iter()
            .map(|row| (row.id(), row.order_index()))
            .collect();
        Ok(self.persist(T::COLLECTION, &writes).await)
    }

    /// Re-issue only the writes that failed in `outcome`
    pub async fn retry_failed(&self, outcome: &ReorderOutcome) -> ReorderOutcome {
        let writes: Vec<(i64, i32)> = outcome
            .failures()
            .map(|r| (r.id, r.order_index))
            .collect();
        tracing::debug!(
            "Retrying {} failed order writes on '{}'",
            writes.len(),
            outcome.collection
        );
        self.persist(&outcome.collection, &writes).await
    }

    async fn persist(&self, collection: &str, writes: &[(i64, i32)]) -> ReorderOutcome {
        let mut results = Vec::with_capacity(writes.len());

        for &(id, order_index) in writes {
            let fields = serde_json::json!({ "order_index": order_index });
            let error = match self
                .store
                .update(collection, &Filter::id(id), &fields)
                .await
            {
                Ok(_) => None,
                Err(e) => {
                    tracing::warn!(
                        "Failed to persist order_index {} for id {} in '{}': {}",
                        order_index,
                        id,
                        collection,
                        e
                    );
                    Some(e.to_string())
                }
            };
            results.push(PersistResult {
                id,
                order_index,
                error,
            });
        }

        let outcome = ReorderOutcome {
            collection: collection.to_string(),
            results,
        };
        if outcome.is_success() {
            tracing::debug!("Persisted {} positions in '{}'", writes.len(), collection);
        } else {
            tracing::warn!(
                "{} of {} order writes failed in '{}'",
                outcome.failed_count(),
                writes.len(),
                collection
            );
        }
        outcome
    }
}
