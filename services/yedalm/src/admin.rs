//! Admin console: the held lists of one admin session and the edits on them
//!
//! Single-row edits (add, edit, delete, scripture) are not optimistic: the
//! held list changes only after the store confirms, and a failure leaves it
//! untouched. Reorders are optimistic and go through the
//! [`ReorderCoordinator`].

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::entity::{Facility, Organization, Record, Scripture, ScriptureDraft, Slide, Validate};
use crate::list_view::{DragList, DropResult, RowLayout};
use crate::page::{fetch_list, fetch_scripture};
use crate::reorder::{ReorderCoordinator, ReorderOutcome};
use crate::state::{new_list_handle, remove_row, replace_row, ListHandle};
use crate::store::{Filter, RemoteStore, Table};
use crate::YedalmError;

/// A reorderable kind the console holds a list of
pub trait ConsoleList: Record {
    /// Route segment naming the kind (`slides`, ...)
    const KIND: &'static str;

    fn held(console: &AdminConsole) -> &ListHandle<Self>;
}

impl ConsoleList for Slide {
    const KIND: &'static str = "slides";

    fn held(console: &AdminConsole) -> &ListHandle<Self> {
        &console.slides
    }
}

impl ConsoleList for Organization {
    const KIND: &'static str = "organizations";

    fn held(console: &AdminConsole) -> &ListHandle<Self> {
        &console.organizations
    }
}

impl ConsoleList for Facility {
    const KIND: &'static str = "facilities";

    fn held(console: &AdminConsole) -> &ListHandle<Self> {
        &console.facilities
    }
}

pub struct AdminConsole {
    store: Arc<dyn RemoteStore>,
    coordinator: ReorderCoordinator,
    slides: ListHandle<Slide>,
    organizations: ListHandle<Organization>,
    facilities: ListHandle<Facility>,
    scripture: RwLock<Option<Scripture>>,
    saving: AtomicUsize,
}

impl std::fmt::Debug for AdminConsole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminConsole")
            .field("saving", &self.is_saving())
            .finish()
    }
}

/// Counts one save in flight until dropped
struct Saving<'a>(&'a AtomicUsize);

impl<'a> Saving<'a> {
    fn start(in_flight: &'a AtomicUsize) -> Self {
        in_flight.fetch_add(1, Ordering::SeqCst);
        Self(in_flight)
    }
}

impl Drop for Saving<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl AdminConsole {
    /// Console with empty lists; call [`AdminConsole::load`] to fill it
    pub fn new(store: Arc<dyn RemoteStore>) -> Self {
        Self {
            coordinator: ReorderCoordinator::new(Arc::clone(&store)),
            store,
            slides: new_list_handle(Vec::new()),
            organizations: new_list_handle(Vec::new()),
            facilities: new_list_handle(Vec::new()),
            scripture: RwLock::new(None),
            saving: AtomicUsize::new(0),
        }
    }

    /// Fetch every list concurrently. A failing fetch leaves that list empty.
    pub async fn load(&self) {
        let (slides, organizations, facilities, scripture) = tokio::join!(
            fetch_list::<Slide>(&self.store),
            fetch_list::<Organization>(&self.store),
            fetch_list::<Facility>(&self.store),
            fetch_scripture(&self.store),
        );
        *self.slides.write().await = slides;
        *self.organizations.write().await = organizations;
        *self.facilities.write().await = facilities;
        *self.scripture.write().await = scripture;
        tracing::debug!("Admin console loaded");
    }

    /// True while any add, edit or scripture save is in progress
    pub fn is_saving(&self) -> bool {
        self.saving.load(Ordering::SeqCst) > 0
    }

    pub fn list<T: ConsoleList>(&self) -> &ListHandle<T> {
        T::held(self)
    }

    /// Snapshot of a held list
    pub async fn rows<T: ConsoleList>(&self) -> Vec<T> {
        self.list::<T>().read().await.clone()
    }

    /// Insert a new row at the end of the list
    pub async fn add<T: ConsoleList>(&self, draft: &T::Draft) -> crate::Result<T> {
        draft.validate()?;
        let _saving = Saving::start(&self.saving);

        let count = self.list::<T>().read().await.len();
        let mut row = serde_json::to_value(draft)?;
        let fields = row.as_object_mut().ok_or_else(|| {
            YedalmError::Site(format!("{} draft is not a JSON object", T::KIND))
        })?;
        fields.insert("order_index".to_string(), (count as i64 + 1).into());
        if T::HAS_ACTIVE_FLAG {
            fields.insert("is_active".to_string(), true.into());
        }

        let stored: T = Table::new(Arc::clone(&self.store)).insert(&row).await?;
        tracing::info!("Added {} row {}", T::KIND, stored.id());
        self.list::<T>().write().await.push(stored.clone());
        Ok(stored)
    }

    /// Write the fields present in `patch` to a held row; the rest are kept
    pub async fn edit<T: ConsoleList>(&self, id: i64, patch: &T::Patch) -> crate::Result<T> {
        patch.validate()?;
        self.ensure_held::<T>(id).await?;
        let _saving = Saving::start(&self.saving);

        let stored: T = Table::new(Arc::clone(&self.store))
            .update(id, patch)
            .await?;
        replace_row(&mut *self.list::<T>().write().await, stored.clone());
        tracing::info!("Updated {} row {}", T::KIND, id);
        Ok(stored)
    }

    pub async fn delete<T: ConsoleList>(&self, id: i64) -> crate::Result<()> {
        self.ensure_held::<T>(id).await?;

        Table::<T>::new(Arc::clone(&self.store)).delete(id).await?;
        remove_row(&mut *self.list::<T>().write().await, id);
        tracing::info!("Deleted {} row {}", T::KIND, id);
        Ok(())
    }

    /// Apply a new order to a held list
    pub async fn reorder<T: ConsoleList>(&self, new_order: Vec<T>) -> crate::Result<ReorderOutcome> {
        self.coordinator.reorder(self.list::<T>(), new_order).await
    }

    /// Reorder by ids. Each held id must appear exactly once.
    pub async fn reorder_ids<T: ConsoleList>(&self, ids: &[i64]) -> crate::Result<ReorderOutcome> {
        let new_order = {
            let held = self.list::<T>().read().await;
            let mut seen = HashSet::with_capacity(ids.len());
            let mut rows = Vec::with_capacity(ids.len());
            for &id in ids {
                let row = held.iter().find(|r| r.id() == id).filter(|_| seen.insert(id));
                match row {
                    Some(row) => rows.push(row.clone()),
                    None => {
                        return Err(YedalmError::Reorder(format!(
                            "id {} is unknown or repeated in the {} order",
                            id,
                            T::KIND
                        )))
                    }
                }
            }
            rows
        };
        self.reorder(new_order).await
    }

    pub async fn retry_failed(&self, outcome: &ReorderOutcome) -> ReorderOutcome {
        self.coordinator.retry_failed(outcome).await
    }

    /// Draggable view over the current held list
    pub async fn drag_list<T: ConsoleList>(&self, layout: RowLayout) -> DragList<T> {
        DragList::new(self.rows::<T>().await, layout)
    }

    /// Hand a finished gesture to the coordinator; unchanged drops do nothing
    pub async fn commit_drop<T: ConsoleList>(
        &self,
        drop: DropResult<T>,
    ) -> crate::Result<Option<ReorderOutcome>> {
        match drop {
            DropResult::Reordered(rows) => Ok(Some(self.reorder(rows).await?)),
            DropResult::Unchanged => Ok(None),
        }
    }

    pub async fn scripture(&self) -> Option<Scripture> {
        self.scripture.read().await.clone()
    }

    /// Update the active scripture row
    pub async fn update_scripture(&self, draft: &ScriptureDraft) -> crate::Result<Scripture> {
        draft.validate()?;
        let _saving = Saving::start(&self.saving);

        let stored: Scripture = Table::new(Arc::clone(&self.store))
            .update_where(&Filter::eq("is_active", "true"), draft)
            .await?;
        *self.scripture.write().await = Some(stored.clone());
        tracing::info!("Updated scripture {}", stored.reference);
        Ok(stored)
    }

    async fn ensure_held<T: ConsoleList>(&self, id: i64) -> crate::Result<()> {
        if self.list::<T>().read().await.iter().any(|r| r.id() == id) {
            Ok(())
        } else {
            Err(YedalmError::NotFound(format!("{} row {}", T::KIND, id)))
        }
    }
}
