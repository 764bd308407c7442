use auth_rbac::RecordId;
use dashmap::{mapref::entry::Entry, DashMap};
use std::hash::Hash;
use std::sync::atomic::{AtomicI64, Ordering};

use crate::{
    error::{DatabaseError, DatabaseResult},
    models::ListQuery,
};

/// One in-memory table with an id sequence
pub(crate) struct Table<T> {
    rows: DashMap<RecordId, T>,
    sequence: AtomicI64,
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Self {
            rows: DashMap::new(),
            sequence: AtomicI64::new(0),
        }
    }
}

impl<T: Clone> Table<T> {
    pub(crate) fn next_id(&self) -> RecordId {
        self.sequence.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub(crate) fn get(&self, id: RecordId) -> Option<T> {
        self.rows.get(&id).map(|row| row.value().clone())
    }

    pub(crate) fn contains(&self, id: RecordId) -> bool {
        self.rows.contains_key(&id)
    }

    pub(crate) fn insert(&self, id: RecordId, row: T) -> T {
        self.rows.insert(id, row.clone());
        row
    }

    pub(crate) fn update(&self, id: RecordId, apply: impl FnOnce(&mut T)) -> Option<T> {
        self.rows.get_mut(&id).map(|mut row| {
            apply(row.value_mut());
            row.value().clone()
        })
    }

    pub(crate) fn remove(&self, id: RecordId) -> Option<T> {
        self.rows.remove(&id).map(|(_, row)| row)
    }

    pub(crate) fn retain(&self, keep: impl FnMut(&RecordId, &mut T) -> bool) {
        self.rows.retain(keep);
    }

    pub(crate) fn for_each_mut(&self, mut apply: impl FnMut(&mut T)) {
        for mut row in self.rows.iter_mut() {
            apply(row.value_mut());
        }
    }

    /// Rows matching `keep`, ordered by id, paginated by `query`
    pub(crate) fn list(&self, query: &ListQuery, keep: impl Fn(&T) -> bool) -> Vec<T> {
        self.list_by(query, keep, |_, _| std::cmp::Ordering::Equal)
    }

    /// Rows matching `keep`, ordered by `order` with ascending id breaking ties
    pub(crate) fn list_by(
        &self,
        query: &ListQuery,
        keep: impl Fn(&T) -> bool,
        order: impl Fn(&T, &T) -> std::cmp::Ordering,
    ) -> Vec<T> {
        let mut rows: Vec<(RecordId, T)> = self
            .rows
            .iter()
            .filter(|row| keep(row.value()))
            .map(|row| (*row.key(), row.value().clone()))
            .collect();
        rows.sort_by(|(a_id, a), (b_id, b)| order(a, b).then(a_id.cmp(b_id)));

        let offset = usize::try_from(query.offset).unwrap_or(0);
        let limit = usize::try_from(query.limit).unwrap_or(0);
        rows.into_iter()
            .skip(offset)
            .take(limit)
            .map(|(_, row)| row)
            .collect()
    }
}

/// Reserve `key` in a unique index for `id`
pub(crate) fn claim<K: Eq + Hash>(
    index: &DashMap<K, RecordId>,
    key: K,
    id: RecordId,
    constraint: &str,
) -> DatabaseResult<()> {
    match index.entry(key) {
        Entry::Occupied(slot) if *slot.get() != id => {
            Err(DatabaseError::Conflict(constraint.to_string()))
        }
        Entry::Occupied(_) => Ok(()),
        Entry::Vacant(slot) => {
            slot.insert(id);
            Ok(())
        }
    }
}

/// Drop `key` from a unique index if `id` holds it
pub(crate) fn release<K: Eq + Hash>(index: &DashMap<K, RecordId>, key: &K, id: RecordId) {
    index.remove_if(key, |_, holder| *holder == id);
}
