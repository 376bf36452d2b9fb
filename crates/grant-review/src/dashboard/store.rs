//! Typed, ordered in-memory collection shared by every dashboard component.

use std::fmt::Debug;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::watch;

use crate::review::domain::{ApplicationId, GrantApplication, Submission, SubmissionId};

/// Anything the store can hold: cloneable rows with a stable identifier.
pub trait Entity: Clone + Send + Sync + 'static {
    type Id: Clone + Eq + Hash + Debug + Send + Sync;

    fn id(&self) -> &Self::Id;
}

impl Entity for GrantApplication {
    type Id = ApplicationId;

    fn id(&self) -> &ApplicationId {
        &self.id
    }
}

impl Entity for Submission {
    type Id = SubmissionId;

    fn id(&self) -> &SubmissionId {
        &self.id
    }
}

/// Single source of truth for a fetched collection.
///
/// Readers either take a snapshot or subscribe; every write publishes a new snapshot and bumps
/// the revision.
pub struct Store<T: Entity> {
    tx: watch::Sender<Arc<Vec<T>>>,
    revision: AtomicU64,
}

impl<T: Entity> Default for Store<T> {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl<T: Entity> Store<T> {
    pub fn new(items: Vec<T>) -> Self {
        let (tx, _rx) = watch::channel(Arc::new(items));
        Self {
            tx,
            revision: AtomicU64::new(0),
        }
    }

    pub fn snapshot(&self) -> Arc<Vec<T>> {
        self.tx.borrow().clone()
    }

    pub fn get(&self, id: &T::Id) -> Option<T> {
        self.tx.borrow().iter().find(|item| item.id() == id).cloned()
    }

    pub fn position(&self, id: &T::Id) -> Option<usize> {
        self.tx.borrow().iter().position(|item| item.id() == id)
    }

    pub fn len(&self) -> usize {
        self.tx.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tx.borrow().is_empty()
    }

    pub fn revision(&self) -> u64 {
        self.revision.load(Ordering::Acquire)
    }

    /// Receiver that observes every committed snapshot.
    pub fn subscribe(&self) -> watch::Receiver<Arc<Vec<T>>> {
        self.tx.subscribe()
    }

    /// Swap in a freshly fetched collection.
    pub fn replace(&self, items: Vec<T>) -> u64 {
        self.tx.send_replace(Arc::new(items));
        self.bump()
    }

    /// Replace the row with the same id in place, or append it.
    pub fn upsert(&self, item: T) -> u64 {
        self.modify(|items| match items.iter_mut().find(|row| row.id() == item.id()) {
            Some(row) => *row = item,
            None => items.push(item),
        })
    }

    /// Overwrite rows that are already present with their fresh values; unknown ids are ignored.
    pub fn merge(&self, fresh: Vec<T>) -> u64 {
        if fresh.is_empty() {
            return self.revision();
        }
        self.modify(|items| {
            for row in fresh {
                if let Some(slot) = items.iter_mut().find(|item| item.id() == row.id()) {
                    *slot = row;
                }
            }
        })
    }

    pub(crate) fn modify<F>(&self, edit: F) -> u64
    where
        F: FnOnce(&mut Vec<T>),
    {
        self.tx.send_modify(|items| edit(Arc::make_mut(items)));
        self.bump()
    }

    fn bump(&self) -> u64 {
        self.revision.fetch_add(1, Ordering::AcqRel) + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::review::tests::common::application;
    use crate::review::GrantApplicationStatus;

    #[test]
    fn upsert_keeps_list_order() {
        let store = Store::new(vec![
            application(1, GrantApplicationStatus::Pending),
            application(2, GrantApplicationStatus::Pending),
        ]);

        let mut changed = application(1, GrantApplicationStatus::Pending);
        changed.application_status = GrantApplicationStatus::Rejected;
        store.upsert(changed);
        store.upsert(application(3, GrantApplicationStatus::Pending));

        let ids: Vec<_> = store.snapshot().iter().map(|row| row.id.0.clone()).collect();
        assert_eq!(ids, vec!["app-01", "app-02", "app-03"]);
        assert_eq!(
            store.get(&application(1, GrantApplicationStatus::Pending).id)
                .map(|row| row.application_status),
            Some(GrantApplicationStatus::Rejected)
        );
        assert_eq!(store.revision(), 2);
    }

    #[test]
    fn merge_ignores_rows_that_are_not_loaded() {
        let store = Store::new(vec![application(1, GrantApplicationStatus::Pending)]);

        store.merge(vec![
            application(1, GrantApplicationStatus::Approved),
            application(5, GrantApplicationStatus::Rejected),
        ]);

        assert_eq!(store.len(), 1);
        assert_eq!(
            store.snapshot()[0].application_status,
            GrantApplicationStatus::Approved
        );
    }

    #[tokio::test]
    async fn subscribers_see_replacements() {
        let store = Store::<GrantApplication>::default();
        let mut rx = store.subscribe();

        store.replace(vec![application(7, GrantApplicationStatus::Pending)]);

        rx.changed().await.expect("sender alive");
        assert_eq!(rx.borrow().len(), 1);
        assert_eq!(store.position(&application(7, GrantApplicationStatus::Pending).id), Some(0));
    }
}
