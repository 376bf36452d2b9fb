use std::collections::HashSet;
use std::slice;
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, info, warn};

use super::api::{ApiError, ReviewApi};
use super::bulk::send_in_chunks;
use super::inflight::{InFlight, ReviewAction};
use super::notify::{Notification, Notifier};
use super::pagination::PageWindow;
use super::selection::{ReviewFocus, MAX_SELECTION};
use super::store::Store;
use crate::review::domain::{ApplicationId, Grant, GrantApplication, GrantApplicationStatus};
use crate::review::payload::{RecordPaymentRequest, UpdateApplicationStatusRequest};

/// Error returned by a review session operation.
///
/// Remote failures are reported after the speculative write was rolled back and the user was
/// notified, so callers are free to ignore them.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("{0} is already in progress")]
    InFlight(ReviewAction),
    #[error("application {0} is not on the current page")]
    UnknownApplication(ApplicationId),
    #[error("{id} cannot move from {from} to {to}")]
    InvalidTransition {
        id: ApplicationId,
        from: &'static str,
        to: &'static str,
    },
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    Remote(#[from] ApiError),
    #[error("{committed} of {requested} items were rejected before a request failed: {source}")]
    PartialBulk {
        committed: usize,
        requested: usize,
        #[source]
        source: ApiError,
    },
}

#[derive(Default)]
struct SessionView {
    grant: Option<Grant>,
    total: u64,
    window: PageWindow,
    focus: ReviewFocus<GrantApplication>,
}

/// One sponsor's review of a grant's applications: the loaded page, the bulk selection, the
/// detail focus and every mutation, applied optimistically and rolled back on failure.
///
/// All operations take `&self`, so navigation and selection keep working while a mutation is
/// awaiting the server.
pub struct ReviewSession<A, N> {
    api: A,
    notifier: N,
    slug: String,
    store: Store<GrantApplication>,
    view: Mutex<SessionView>,
    in_flight: InFlight,
}

impl<A, N> ReviewSession<A, N>
where
    A: ReviewApi,
    N: Notifier,
{
    pub fn new(api: A, notifier: N, slug: impl Into<String>) -> Self {
        Self::with_window(api, notifier, slug, PageWindow::default())
    }

    pub fn with_window(api: A, notifier: N, slug: impl Into<String>, window: PageWindow) -> Self {
        Self {
            api,
            notifier,
            slug: slug.into(),
            store: Store::default(),
            view: Mutex::new(SessionView {
                window,
                ..SessionView::default()
            }),
            in_flight: InFlight::default(),
        }
    }

    pub fn slug(&self) -> &str {
        &self.slug
    }

    pub fn store(&self) -> &Store<GrantApplication> {
        &self.store
    }

    pub fn applications(&self) -> Arc<Vec<GrantApplication>> {
        self.store.snapshot()
    }

    pub fn application(&self, id: &ApplicationId) -> Option<GrantApplication> {
        self.store.get(id)
    }

    pub fn grant(&self) -> Option<Grant> {
        self.view().grant.clone()
    }

    pub fn total(&self) -> u64 {
        self.view().total
    }

    pub fn window(&self) -> PageWindow {
        self.view().window.clone()
    }

    pub fn range_label(&self) -> String {
        let visible = self.store.len();
        let view = self.view();
        view.window.range_label(view.total, visible)
    }

    pub fn is_loading(&self, action: &ReviewAction) -> bool {
        self.in_flight.contains(action)
    }

    /// Fetch the grant and the current window of applications.
    pub async fn load(&self) -> Result<(), SessionError> {
        let query = self.view().window.query();
        let grant = self.api.grant(&self.slug).await?;
        let page = self.api.applications(&self.slug, &query).await?;
        debug!(
            slug = %self.slug,
            skip = query.skip,
            length = query.length,
            rows = page.applications.len(),
            total = page.total,
            "applications loaded"
        );

        self.store.replace(page.applications);
        {
            let mut view = self.view();
            view.grant = Some(grant);
            view.total = page.total;
        }
        self.reconcile();
        Ok(())
    }

    pub async fn next_page(&self) -> Result<bool, SessionError> {
        let moved = {
            let mut view = self.view();
            let total = view.total;
            view.window.next(total)
        };
        if moved {
            self.load().await?;
        }
        Ok(moved)
    }

    pub async fn previous_page(&self) -> Result<bool, SessionError> {
        let moved = self.view().window.previous();
        if moved {
            self.load().await?;
        }
        Ok(moved)
    }

    pub async fn set_search(&self, text: &str) -> Result<bool, SessionError> {
        let changed = self.view().window.set_search(text);
        if changed {
            self.load().await?;
        }
        Ok(changed)
    }

    pub fn toggle(&self, id: &ApplicationId) -> bool {
        let rows = self.store.snapshot();
        self.view().focus.toggle(&rows, id)
    }

    pub fn toggle_all(&self) {
        let rows = self.store.snapshot();
        self.view().focus.selection_mut().toggle_all(&rows);
    }

    pub fn is_selected(&self, id: &ApplicationId) -> bool {
        self.view().focus.selection().is_selected(id)
    }

    pub fn is_all_selected(&self) -> bool {
        let rows = self.store.snapshot();
        self.view().focus.selection().is_all_selected(&rows)
    }

    pub fn selection(&self) -> Vec<ApplicationId> {
        self.view().focus.selection().ids()
    }

    pub fn clear_selection(&self) {
        self.view().focus.selection_mut().clear();
    }

    pub fn is_action_bar_open(&self) -> bool {
        self.view().focus.selection().is_action_bar_open()
    }

    pub fn bulk_actions_enabled(&self) -> bool {
        self.view().focus.selection().bulk_actions_enabled()
    }

    pub fn selection_warning(&self) -> Option<String> {
        self.view().focus.selection().warning()
    }

    /// Open `id` in the detail panel; ignored when the row is not loaded.
    pub fn select(&self, id: &ApplicationId) -> bool {
        let rows = self.store.snapshot();
        self.view().focus.focus(&rows, id)
    }

    pub fn selected(&self) -> Option<GrantApplication> {
        let id = self.view().focus.focused().cloned()?;
        self.store.get(&id)
    }

    /// Re-derive selection and focus from the current rows.
    pub fn reconcile(&self) {
        let rows = self.store.snapshot();
        self.view().focus.reconcile(&rows);
    }

    /// Approve a pending application with `amount`, then move the detail panel to the next
    /// pending row.
    pub async fn approve(&self, id: &ApplicationId, amount: u64) -> Result<(), SessionError> {
        let _guard = self
            .in_flight
            .acquire(ReviewAction::Approve(id.clone()))
            .map_err(SessionError::InFlight)?;

        self.ensure_pending(id, GrantApplicationStatus::Approved)?;
        if amount == 0 {
            return Err(SessionError::Validation(
                "approved amount must be greater than zero".to_string(),
            ));
        }
        if let Some(grant) = self.grant() {
            if !grant.accepts_amount(amount) {
                return Err(SessionError::Validation(format!(
                    "approved amount {amount} {} is outside the grant's reward range",
                    grant.token
                )));
            }
        }

        let speculation = self.store.speculate(slice::from_ref(id), |row| {
            row.application_status = GrantApplicationStatus::Approved;
            row.approved_amount = amount;
        });
        self.advance_from(id);
        self.reconcile();

        let request = UpdateApplicationStatusRequest::approve(id.clone(), amount);
        match self.api.update_application_status(request).await {
            Ok(updated) => {
                speculation.commit();
                self.store.merge(updated);
                self.reconcile();
                info!(application = %id, amount, "application approved");
                self.notifier
                    .notify(Notification::success("Application approved"));
                Ok(())
            }
            Err(err) => {
                speculation.revert(&self.store);
                self.reconcile();
                warn!(application = %id, error = %err, "approval rolled back");
                self.notifier
                    .notify(Notification::error(format!("Failed to approve application: {err}")));
                Err(SessionError::Remote(err))
            }
        }
    }

    /// Reject a pending application, then move the detail panel to the next pending row.
    pub async fn reject(&self, id: &ApplicationId) -> Result<(), SessionError> {
        let _guard = self
            .in_flight
            .acquire(ReviewAction::Reject(id.clone()))
            .map_err(SessionError::InFlight)?;

        self.ensure_pending(id, GrantApplicationStatus::Rejected)?;

        let speculation = self.store.speculate(slice::from_ref(id), |row| {
            row.application_status = GrantApplicationStatus::Rejected;
        });
        self.advance_from(id);
        self.reconcile();

        let request = UpdateApplicationStatusRequest::reject([id.clone()]);
        match self.api.update_application_status(request).await {
            Ok(updated) => {
                speculation.commit();
                self.store.merge(updated);
                self.reconcile();
                info!(application = %id, "application rejected");
                self.notifier
                    .notify(Notification::success("Application rejected"));
                Ok(())
            }
            Err(err) => {
                speculation.revert(&self.store);
                self.reconcile();
                warn!(application = %id, error = %err, "rejection rolled back");
                self.notifier
                    .notify(Notification::error(format!("Failed to reject application: {err}")));
                Err(SessionError::Remote(err))
            }
        }
    }

    /// Reject the current selection.
    pub async fn reject_selected(&self) -> Result<usize, SessionError> {
        let (ids, warning) = {
            let view = self.view();
            let selection = view.focus.selection();
            (selection.ids(), selection.warning())
        };
        if let Some(warning) = warning {
            return Err(SessionError::Validation(warning));
        }
        self.bulk_reject(&ids).await
    }

    /// Reject up to [`MAX_SELECTION`] applications, sent sequentially in chunks.
    ///
    /// When a chunk fails, rows confirmed by earlier chunks stay rejected, the rest are rolled
    /// back and remain selected, and one error covering the whole batch is reported.
    pub async fn bulk_reject(&self, ids: &[ApplicationId]) -> Result<usize, SessionError> {
        let _guard = self
            .in_flight
            .acquire(ReviewAction::BulkReject)
            .map_err(SessionError::InFlight)?;

        let ids = dedup(ids);
        if ids.is_empty() {
            return Err(SessionError::Validation(
                "no applications selected".to_string(),
            ));
        }
        if ids.len() > MAX_SELECTION {
            return Err(SessionError::Validation(format!(
                "Cannot select more than {MAX_SELECTION} applications"
            )));
        }

        let requested = ids.len();
        let speculation = self.store.speculate(&ids, |row| {
            row.application_status = GrantApplicationStatus::Rejected;
        });

        let report = send_in_chunks::<GrantApplication, _, _>(&ids, |chunk| {
            self.api
                .update_application_status(UpdateApplicationStatusRequest::reject(chunk))
        })
        .await;
        let requests = report.requests;

        match report.settle(speculation, &self.store) {
            Ok(rejected) => {
                {
                    let rows = self.store.snapshot();
                    self.view().focus.settle_bulk(&rows, &ids);
                }
                self.reconcile();
                info!(count = rejected, requests, "applications rejected in bulk");
                self.notifier.notify(Notification::success(format!(
                    "{rejected} applications rejected"
                )));
                Ok(rejected)
            }
            Err((committed, err)) => {
                self.reconcile();
                warn!(committed, requested, error = %err, "bulk rejection incomplete");
                self.notifier.notify(Notification::error(format!(
                    "Failed to reject applications ({committed} of {requested} rejected)"
                )));
                Err(SessionError::PartialBulk {
                    committed,
                    requested,
                    source: err,
                })
            }
        }
    }

    /// Record a payout against an approved application. `on_recorded` receives the row as
    /// stored by the server.
    pub async fn record_payment<F>(
        &self,
        id: &ApplicationId,
        amount: u64,
        on_recorded: F,
    ) -> Result<GrantApplication, SessionError>
    where
        F: FnOnce(&GrantApplication) + Send,
    {
        let _guard = self
            .in_flight
            .acquire(ReviewAction::RecordPayment(id.clone()))
            .map_err(SessionError::InFlight)?;

        let current = self
            .store
            .get(id)
            .ok_or_else(|| SessionError::UnknownApplication(id.clone()))?;
        if current.application_status != GrantApplicationStatus::Approved {
            return Err(SessionError::InvalidTransition {
                id: id.clone(),
                from: current.application_status.label(),
                to: "Paid",
            });
        }
        if current.is_fully_paid() {
            return Err(SessionError::Validation(format!(
                "application {id} is already fully paid"
            )));
        }
        let outstanding = current.outstanding();
        if amount == 0 || amount > outstanding {
            return Err(SessionError::Validation(format!(
                "payment must be between 1 and {outstanding}"
            )));
        }

        let speculation = self
            .store
            .speculate(slice::from_ref(id), |row| row.total_paid += amount);

        let request = RecordPaymentRequest {
            id: id.clone(),
            paid_amount: amount,
        };
        match self.api.record_payment(request).await {
            Ok(updated) => {
                speculation.commit();
                self.store.upsert(updated.clone());
                {
                    let rows = self.store.snapshot();
                    self.view().focus.focus(&rows, id);
                }
                self.reconcile();
                info!(
                    application = %id,
                    amount,
                    total_paid = updated.total_paid,
                    "payment recorded"
                );
                self.notifier
                    .notify(Notification::success("Payment recorded"));
                on_recorded(&updated);
                Ok(updated)
            }
            Err(err) => {
                speculation.revert(&self.store);
                self.reconcile();
                warn!(application = %id, error = %err, "payment rolled back");
                self.notifier
                    .notify(Notification::error(format!("Failed to record payment: {err}")));
                Err(SessionError::Remote(err))
            }
        }
    }

    fn ensure_pending(
        &self,
        id: &ApplicationId,
        target: GrantApplicationStatus,
    ) -> Result<(), SessionError> {
        let current = self
            .store
            .get(id)
            .ok_or_else(|| SessionError::UnknownApplication(id.clone()))?;
        if current.is_pending() {
            Ok(())
        } else {
            Err(SessionError::InvalidTransition {
                id: id.clone(),
                from: current.application_status.label(),
                to: target.label(),
            })
        }
    }

    fn advance_from(&self, id: &ApplicationId) {
        let rows = self.store.snapshot();
        self.view().focus.advance_from(&rows, id);
    }

    fn view(&self) -> MutexGuard<'_, SessionView> {
        self.view.lock().expect("session view mutex poisoned")
    }
}

/// Keep the first occurrence of each id.
pub(crate) fn dedup<I: Clone + Eq + std::hash::Hash>(ids: &[I]) -> Vec<I> {
    let mut seen = HashSet::with_capacity(ids.len());
    ids.iter()
        .filter(|id| seen.insert((*id).clone()))
        .cloned()
        .collect()
}
