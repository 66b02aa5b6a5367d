//! In-memory lists held by an admin console

use std::sync::Arc;

use tokio::sync::RwLock;

use crate::entity::Record;

/// Thread-safe handle to one ordered list of rows
pub type ListHandle<T> = Arc<RwLock<Vec<T>>>;

pub fn new_list_handle<T>(rows: Vec<T>) -> ListHandle<T> {
    Arc::new(RwLock::new(rows))
}

/// Replace the row with the same id, returning false if it is not held
pub fn replace_row<T: Record>(rows: &mut [T], row: T) -> bool {
    if let Some(slot) = rows.iter_mut().find(|r| r.id() == row.id()) {
        *slot = row;
        true
    } else {
        false
    }
}

/// Remove the row with the given id, returning false if it is not held
pub fn remove_row<T: Record>(rows: &mut Vec<T>, id: i64) -> bool {
    let before = rows.len();
    rows.retain(|r| r.id() != id);
    rows.len() != before
}

/// Whether `candidate` holds exactly the ids of `held`, in any order
pub fn is_permutation_of<T: Record>(held: &[T], candidate: &[T]) -> bool {
    if held.len() != candidate.len() {
        return false;
    }
    let mut held_ids: Vec<i64> = held.iter().map(Record::id).collect();
    let mut candidate_ids: Vec<i64> = candidate.iter().map(Record::id).collect();
    held_ids.sort_unstable();
    candidate_ids.sort_unstable();
    held_ids == candidate_ids
}

/// Ids in list order
pub fn ids<T: Record>(rows: &[T]) -> Vec<i64> {
    rows.iter().map(Record::id).collect()
}
