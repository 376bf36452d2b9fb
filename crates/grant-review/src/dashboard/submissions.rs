use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{info, warn};

use super::api::ReviewApi;
use super::bulk::send_in_chunks;
use super::inflight::{InFlight, ReviewAction};
use super::notify::{Notification, Notifier};
use super::selection::{ReviewFocus, MAX_SELECTION};
use super::session::{dedup, SessionError};
use super::store::Store;
use crate::review::domain::{ListingId, Submission, SubmissionId, SubmissionStatus};
use crate::review::payload::RejectSubmissionsRequest;

/// Review board for a listing's submissions, with the same optimistic chunked bulk rejection
/// as grant applications.
pub struct SubmissionBoard<A, N> {
    api: A,
    notifier: N,
    listing: ListingId,
    store: Store<Submission>,
    focus: Mutex<ReviewFocus<Submission>>,
    in_flight: InFlight,
}

impl<A, N> SubmissionBoard<A, N>
where
    A: ReviewApi,
    N: Notifier,
{
    pub fn new(api: A, notifier: N, listing: ListingId) -> Self {
        Self {
            api,
            notifier,
            listing,
            store: Store::default(),
            focus: Mutex::new(ReviewFocus::default()),
            in_flight: InFlight::default(),
        }
    }

    pub fn listing(&self) -> &ListingId {
        &self.listing
    }

    pub fn store(&self) -> &Store<Submission> {
        &self.store
    }

    pub fn submissions(&self) -> Arc<Vec<Submission>> {
        self.store.snapshot()
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.contains(&ReviewAction::RejectSubmissions)
    }

    pub async fn load(&self) -> Result<(), SessionError> {
        let submissions = self.api.submissions(&self.listing).await?;
        self.store.replace(submissions);
        self.reconcile();
        Ok(())
    }

    pub fn toggle(&self, id: &SubmissionId) -> bool {
        let rows = self.store.snapshot();
        self.focus().toggle(&rows, id)
    }

    pub fn toggle_all(&self) {
        let rows = self.store.snapshot();
        self.focus().selection_mut().toggle_all(&rows);
    }

    pub fn is_selected(&self, id: &SubmissionId) -> bool {
        self.focus().selection().is_selected(id)
    }

    pub fn is_all_selected(&self) -> bool {
        let rows = self.store.snapshot();
        self.focus().selection().is_all_selected(&rows)
    }

    pub fn selection(&self) -> Vec<SubmissionId> {
        self.focus().selection().ids()
    }

    pub fn select(&self, id: &SubmissionId) -> bool {
        let rows = self.store.snapshot();
        self.focus().focus(&rows, id)
    }

    pub fn selected(&self) -> Option<Submission> {
        let id = self.focus().focused().cloned()?;
        self.store.get(&id)
    }

    pub fn reconcile(&self) {
        let rows = self.store.snapshot();
        self.focus().reconcile(&rows);
    }

    pub async fn reject_selected(&self) -> Result<usize, SessionError> {
        let ids = self.selection();
        self.bulk_reject(&ids).await
    }

    /// Reject submissions in chunks; see [`super::ReviewSession::bulk_reject`].
    pub async fn bulk_reject(&self, ids: &[SubmissionId]) -> Result<usize, SessionError> {
        let _guard = self
            .in_flight
            .acquire(ReviewAction::RejectSubmissions)
            .map_err(SessionError::InFlight)?;

        let ids = dedup(ids);
        if ids.is_empty() {
            return Err(SessionError::Validation(
                "no submissions selected".to_string(),
            ));
        }
        if ids.len() > MAX_SELECTION {
            return Err(SessionError::Validation(format!(
                "Cannot select more than {MAX_SELECTION} submissions"
            )));
        }

        let requested = ids.len();
        let speculation = self.store.speculate(&ids, |row| {
            row.status = SubmissionStatus::Rejected;
        });

        let report = send_in_chunks::<Submission, _, _>(&ids, |chunk| {
            self.api
                .reject_submissions(RejectSubmissionsRequest::new(chunk))
        })
        .await;

        match report.settle(speculation, &self.store) {
            Ok(rejected) => {
                {
                    let rows = self.store.snapshot();
                    self.focus().settle_bulk(&rows, &ids);
                }
                self.reconcile();
                info!(listing = %self.listing, count = rejected, "submissions rejected");
                self.notifier
                    .notify(Notification::success("Submissions rejected"));
                Ok(rejected)
            }
            Err((committed, err)) => {
                self.reconcile();
                warn!(
                    listing = %self.listing,
                    committed,
                    requested,
                    error = %err,
                    "submission rejection incomplete"
                );
                self.notifier.notify(Notification::error(format!(
                    "Failed to reject submissions ({committed} of {requested} rejected)"
                )));
                Err(SessionError::PartialBulk {
                    committed,
                    requested,
                    source: err,
                })
            }
        }
    }

    fn focus(&self) -> MutexGuard<'_, ReviewFocus<Submission>> {
        self.focus.lock().expect("submission focus mutex poisoned")
    }
}
