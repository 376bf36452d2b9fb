//! Multi-select state behind the floating bulk action bar.

use std::collections::HashSet;

use super::store::Entity;
use crate::review::domain::{GrantApplication, Submission, SubmissionStatus};

/// Largest batch a bulk action accepts.
pub const MAX_SELECTION: usize = 100;

/// Rows that can take part in a bulk review action.
pub trait Reviewable: Entity {
    fn is_pending(&self) -> bool;
}

impl Reviewable for GrantApplication {
    fn is_pending(&self) -> bool {
        self.application_status.is_pending()
    }
}

impl Reviewable for Submission {
    fn is_pending(&self) -> bool {
        self.status == SubmissionStatus::Pending
    }
}

/// Ids chosen for a bulk action, kept in the order they were picked.
///
/// Going over [`MAX_SELECTION`] is allowed; bulk actions stay disabled until the set shrinks.
#[derive(Debug, Clone)]
pub struct SelectionSet<T: Reviewable> {
    order: Vec<T::Id>,
    members: HashSet<T::Id>,
}

impl<T: Reviewable> Default for SelectionSet<T> {
    fn default() -> Self {
        Self {
            order: Vec::new(),
            members: HashSet::new(),
        }
    }
}

impl<T: Reviewable> SelectionSet<T> {
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn is_selected(&self, id: &T::Id) -> bool {
        self.members.contains(id)
    }

    pub fn ids(&self) -> Vec<T::Id> {
        self.order.clone()
    }

    /// Flip membership; returns whether `id` is selected afterwards.
    pub fn toggle(&mut self, id: &T::Id) -> bool {
        if self.members.remove(id) {
            self.order.retain(|member| member != id);
            false
        } else {
            self.insert(id.clone());
            true
        }
    }

    /// True when the page has pending rows and every one of them is selected.
    pub fn is_all_selected(&self, page: &[T]) -> bool {
        let mut pending = page.iter().filter(|row| row.is_pending()).peekable();
        pending.peek().is_some() && pending.all(|row| self.members.contains(row.id()))
    }

    /// Select every pending row of the page, or, when they already are, drop every row of the
    /// page from the set.
    pub fn toggle_all(&mut self, page: &[T]) {
        if self.is_all_selected(page) {
            let on_page: HashSet<&T::Id> = page.iter().map(|row| row.id()).collect();
            self.retain(|id| !on_page.contains(id));
        } else {
            for row in page.iter().filter(|row| row.is_pending()) {
                self.insert(row.id().clone());
            }
        }
    }

    /// Drop ids whose row in `rows` is no longer pending. Ids absent from `rows` (other pages)
    /// are kept. Returns how many ids were removed.
    pub fn purge_settled(&mut self, rows: &[T]) -> usize {
        let settled: HashSet<&T::Id> = rows
            .iter()
            .filter(|row| !row.is_pending())
            .map(|row| row.id())
            .collect();
        if settled.is_empty() {
            return 0;
        }
        let before = self.len();
        self.retain(|id| !settled.contains(id));
        before - self.len()
    }

    pub fn clear(&mut self) {
        self.order.clear();
        self.members.clear();
    }

    pub fn is_action_bar_open(&self) -> bool {
        !self.is_empty()
    }

    pub fn exceeds_limit(&self) -> bool {
        self.len() > MAX_SELECTION
    }

    pub fn bulk_actions_enabled(&self) -> bool {
        !self.is_empty() && !self.exceeds_limit()
    }

    pub fn warning(&self) -> Option<String> {
        self.exceeds_limit()
            .then(|| format!("Cannot select more than {MAX_SELECTION} applications"))
    }

    fn insert(&mut self, id: T::Id) {
        if self.members.insert(id.clone()) {
            self.order.push(id);
        }
    }

    fn retain<F>(&mut self, mut keep: F)
    where
        F: FnMut(&T::Id) -> bool,
    {
        let members = &mut self.members;
        self.order.retain(|id| {
            let kept = keep(id);
            if !kept {
                members.remove(id);
            }
            kept
        });
    }
}

/// Selection state of one review list: the bulk set plus the row open in the detail panel.
#[derive(Debug, Clone)]
pub struct ReviewFocus<T: Reviewable> {
    selection: SelectionSet<T>,
    focused: Option<T::Id>,
}

impl<T: Reviewable> Default for ReviewFocus<T> {
    fn default() -> Self {
        Self {
            selection: SelectionSet::default(),
            focused: None,
        }
    }
}

impl<T: Reviewable> ReviewFocus<T> {
    pub fn selection(&self) -> &SelectionSet<T> {
        &self.selection
    }

    pub fn selection_mut(&mut self) -> &mut SelectionSet<T> {
        &mut self.selection
    }

    pub fn focused(&self) -> Option<&T::Id> {
        self.focused.as_ref()
    }

    /// Recompute derived state after the rows changed: settled ids leave the selection and a
    /// focus that is no longer listed falls back to the first row (or nothing).
    pub fn reconcile(&mut self, rows: &[T]) {
        self.selection.purge_settled(rows);
        let still_listed = self
            .focused
            .as_ref()
            .is_some_and(|id| rows.iter().any(|row| row.id() == id));
        if !still_listed {
            self.focused = rows.first().map(|row| row.id().clone());
        }
    }

    /// Select or deselect one row. Only pending rows can join the selection.
    pub fn toggle(&mut self, rows: &[T], id: &T::Id) -> bool {
        if self.selection.is_selected(id) {
            return self.selection.toggle(id);
        }
        let pending = rows
            .iter()
            .any(|row| row.id() == id && row.is_pending());
        pending && self.selection.toggle(id)
    }

    /// Open `id` in the detail panel if it is listed.
    pub fn focus(&mut self, rows: &[T], id: &T::Id) -> bool {
        if rows.iter().any(|row| row.id() == id) {
            self.focused = Some(id.clone());
            true
        } else {
            false
        }
    }

    /// Focus the first pending row listed after `id`, staying on `id` when there is none.
    pub fn advance_from(&mut self, rows: &[T], id: &T::Id) {
        let next = rows
            .iter()
            .skip_while(|row| row.id() != id)
            .skip(1)
            .find(|row| row.is_pending())
            .map(|row| row.id().clone());
        self.focused = Some(next.unwrap_or_else(|| id.clone()));
    }

    /// Clear the selection after a bulk action and focus the first listed row among `ids`.
    pub fn settle_bulk(&mut self, rows: &[T], ids: &[T::Id]) {
        self.selection.clear();
        let acted: HashSet<&T::Id> = ids.iter().collect();
        if let Some(row) = rows.iter().find(|row| acted.contains(row.id())) {
            self.focused = Some(row.id().clone());
        }
    }
}
