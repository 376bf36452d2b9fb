//! Snapshot, speculative apply, then commit or revert.

use std::collections::HashSet;

use super::store::{Entity, Store};

/// Pre-mutation values of the rows a speculative edit touched.
///
/// Reverting restores only those rows, so a refresh that replaced unrelated rows in the
/// meantime survives the rollback.
#[must_use = "a speculation must be committed or reverted"]
#[derive(Debug)]
pub struct Speculation<T: Entity> {
    previous: Vec<T>,
}

impl<T: Entity> Store<T> {
    /// Capture the current values of `ids`, then apply `edit` to each of them.
    pub fn speculate<F>(&self, ids: &[T::Id], mut edit: F) -> Speculation<T>
    where
        F: FnMut(&mut T),
    {
        let wanted: HashSet<&T::Id> = ids.iter().collect();
        let mut previous = Vec::with_capacity(ids.len());
        self.modify(|items| {
            for item in items.iter_mut().filter(|item| wanted.contains(item.id())) {
                previous.push(item.clone());
                edit(item);
            }
        });
        Speculation { previous }
    }
}

impl<T: Entity> Speculation<T> {
    pub fn is_empty(&self) -> bool {
        self.previous.is_empty()
    }

    pub fn touched(&self) -> impl Iterator<Item = &T::Id> {
        self.previous.iter().map(|item| item.id())
    }

    /// Value the row had before the speculative edit.
    pub fn previous(&self, id: &T::Id) -> Option<&T> {
        self.previous.iter().find(|item| item.id() == id)
    }

    /// Keep the speculative values.
    pub fn commit(self) {}

    /// Restore the captured rows that are still present; returns how many were restored.
    pub fn revert(self, store: &Store<T>) -> usize {
        if self.previous.is_empty() {
            return 0;
        }
        let mut restored = 0;
        store.modify(|items| {
            for original in self.previous {
                if let Some(slot) = items.iter_mut().find(|item| item.id() == original.id()) {
                    *slot = original;
                    restored += 1;
                }
            }
        });
        restored
    }

    /// Split into `(matching, rest)` so confirmed rows can be committed and the others reverted.
    pub fn partition<F>(self, mut predicate: F) -> (Speculation<T>, Speculation<T>)
    where
        F: FnMut(&T::Id) -> bool,
    {
        let (matching, rest) = self
            .previous
            .into_iter()
            .partition(|item| predicate(item.id()));
        (
            Speculation { previous: matching },
            Speculation { previous: rest },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::review::tests::common::{app_id, application};
    use crate::review::{GrantApplication, GrantApplicationStatus};

    fn store(count: usize) -> Store<GrantApplication> {
        Store::new(
            (1..=count)
                .map(|index| application(index, GrantApplicationStatus::Pending))
                .collect(),
        )
    }

    #[test]
    fn revert_restores_exact_previous_values() {
        let store = store(2);
        let before = store.get(&app_id(1)).expect("row");

        let speculation = store.speculate(&[app_id(1)], |row| {
            row.application_status = GrantApplicationStatus::Approved;
            row.approved_amount = 500;
        });
        assert_eq!(
            store.get(&app_id(1)).map(|row| row.approved_amount),
            Some(500)
        );

        assert_eq!(speculation.revert(&store), 1);
        assert_eq!(store.get(&app_id(1)), Some(before));
    }

    #[test]
    fn revert_does_not_clobber_rows_outside_the_speculation() {
        let store = store(2);
        let speculation = store.speculate(&[app_id(1)], |row| {
            row.application_status = GrantApplicationStatus::Rejected;
        });

        let mut refreshed = application(2, GrantApplicationStatus::Pending);
        refreshed.project_title = "Renamed".to_string();
        store.upsert(refreshed);

        speculation.revert(&store);
        assert_eq!(
            store.get(&app_id(2)).map(|row| row.project_title),
            Some("Renamed".to_string())
        );
    }

    #[test]
    fn partition_commits_confirmed_and_reverts_the_rest() {
        let store = store(3);
        let speculation = store.speculate(&[app_id(1), app_id(2), app_id(3)], |row| {
            row.application_status = GrantApplicationStatus::Rejected;
        });

        let (confirmed, unconfirmed) = speculation.partition(|id| id == &app_id(1));
        confirmed.commit();
        assert_eq!(unconfirmed.revert(&store), 2);

        let statuses: Vec<_> = store
            .snapshot()
            .iter()
            .map(|row| row.application_status)
            .collect();
        assert_eq!(
            statuses,
            vec![
                GrantApplicationStatus::Rejected,
                GrantApplicationStatus::Pending,
                GrantApplicationStatus::Pending
            ]
        );
    }

    #[test]
    fn unknown_ids_are_ignored() {
        let store = store(1);
        let speculation = store.speculate(&[app_id(9)], |row| {
            row.application_status = GrantApplicationStatus::Rejected;
        });
        assert!(speculation.is_empty());
        assert_eq!(speculation.revert(&store), 0);
    }
}
