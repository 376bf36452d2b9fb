use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Notify;

use crate::dashboard::api::{ApiError, InProcessReviewApi, ReviewApi};
use crate::dashboard::notify::MemoryNotifier;
use crate::dashboard::pagination::PageWindow;
use crate::dashboard::session::ReviewSession;
use crate::dashboard::submissions::SubmissionBoard;
use crate::review::domain::{
    ApplicationId, Grant, GrantApplication, ListingId, Submission, SubmissionId,
};
use crate::review::memory::{MemoryApplicantNotifier, MemoryReviewRepository};
use crate::review::payload::{
    ApplicationPage, ApplicationQuery, RecordPaymentRequest, RejectSubmissionsRequest,
    UpdateApplicationStatusRequest,
};
use crate::review::tests::common::{build_service, sponsor, GRANT_SLUG, LISTING};

type InProcess = InProcessReviewApi<MemoryReviewRepository, MemoryApplicantNotifier>;

/// In-process API that records every mutation and can be told to fail or stall.
pub(crate) struct ScriptedApi {
    inner: InProcess,
    status_batches: Mutex<Vec<Vec<ApplicationId>>>,
    submission_batches: Mutex<Vec<Vec<SubmissionId>>>,
    payments: AtomicUsize,
    fail_from: Mutex<Option<usize>>,
    fail_payments: AtomicBool,
    gate: Mutex<Option<Arc<Notify>>>,
}

impl ScriptedApi {
    pub(crate) fn new(inner: InProcess) -> Self {
        Self {
            inner,
            status_batches: Mutex::new(Vec::new()),
            submission_batches: Mutex::new(Vec::new()),
            payments: AtomicUsize::new(0),
            fail_from: Mutex::new(None),
            fail_payments: AtomicBool::new(false),
            gate: Mutex::new(None),
        }
    }

    /// Fail every status or submission call from the `index`th (zero based) onwards.
    pub(crate) fn fail_from(&self, index: usize) {
        *self.fail_from.lock().expect("script mutex poisoned") = Some(index);
    }

    pub(crate) fn fail_payments(&self) {
        self.fail_payments.store(true, Ordering::SeqCst);
    }

    /// Stall mutations until the returned handle is notified.
    pub(crate) fn hold(&self) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        *self.gate.lock().expect("script mutex poisoned") = Some(notify.clone());
        notify
    }

    pub(crate) fn status_batches(&self) -> Vec<Vec<ApplicationId>> {
        self.status_batches
            .lock()
            .expect("script mutex poisoned")
            .clone()
    }

    pub(crate) fn submission_batches(&self) -> Vec<Vec<SubmissionId>> {
        self.submission_batches
            .lock()
            .expect("script mutex poisoned")
            .clone()
    }

    pub(crate) fn payments(&self) -> usize {
        self.payments.load(Ordering::SeqCst)
    }

    async fn wait_for_gate(&self) {
        let gate = self.gate.lock().expect("script mutex poisoned").clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
    }

    fn should_fail(&self, call: usize) -> bool {
        self.fail_from
            .lock()
            .expect("script mutex poisoned")
            .is_some_and(|from| call >= from)
    }
}

pub(crate) fn unavailable() -> ApiError {
    ApiError::Status {
        endpoint: "/api/sponsor-dashboard/grants/update-application-status".to_string(),
        status: 503,
        message: "upstream unavailable".to_string(),
    }
}

#[async_trait]
impl ReviewApi for ScriptedApi {
    async fn grant(&self, slug: &str) -> Result<Grant, ApiError> {
        self.inner.grant(slug).await
    }

    async fn applications(
        &self,
        slug: &str,
        query: &ApplicationQuery,
    ) -> Result<ApplicationPage, ApiError> {
        self.inner.applications(slug, query).await
    }

    async fn update_application_status(
        &self,
        request: UpdateApplicationStatusRequest,
    ) -> Result<Vec<GrantApplication>, ApiError> {
        let call = {
            let mut batches = self.status_batches.lock().expect("script mutex poisoned");
            batches.push(request.data.iter().map(|row| row.id.clone()).collect());
            batches.len() - 1
        };
        self.wait_for_gate().await;
        if self.should_fail(call) {
            return Err(unavailable());
        }
        self.inner.update_application_status(request).await
    }

    async fn record_payment(
        &self,
        request: RecordPaymentRequest,
    ) -> Result<GrantApplication, ApiError> {
        self.payments.fetch_add(1, Ordering::SeqCst);
        self.wait_for_gate().await;
        if self.fail_payments.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        self.inner.record_payment(request).await
    }

    async fn submissions(&self, listing: &ListingId) -> Result<Vec<Submission>, ApiError> {
        self.inner.submissions(listing).await
    }

    async fn reject_submissions(
        &self,
        request: RejectSubmissionsRequest,
    ) -> Result<Vec<Submission>, ApiError> {
        let call = {
            let mut batches = self
                .submission_batches
                .lock()
                .expect("script mutex poisoned");
            batches.push(request.data.iter().map(|row| row.id.clone()).collect());
            batches.len() - 1
        };
        self.wait_for_gate().await;
        if self.should_fail(call) {
            return Err(unavailable());
        }
        self.inner.reject_submissions(request).await
    }
}

pub(crate) type TestSession = ReviewSession<Arc<ScriptedApi>, MemoryNotifier>;

pub(crate) struct Harness {
    pub(crate) session: TestSession,
    pub(crate) api: Arc<ScriptedApi>,
    pub(crate) notifier: MemoryNotifier,
    pub(crate) repository: Arc<MemoryReviewRepository>,
    pub(crate) alerts: Arc<MemoryApplicantNotifier>,
}

fn scripted(pending: usize) -> (
    Arc<ScriptedApi>,
    Arc<MemoryReviewRepository>,
    Arc<MemoryApplicantNotifier>,
) {
    let (service, repository, alerts) = build_service(pending);
    let api = InProcessReviewApi::new(Arc::new(service), sponsor());
    (Arc::new(ScriptedApi::new(api)), repository, alerts)
}

/// Session over `pending` pending applications with the default window, not yet loaded.
pub(crate) fn harness(pending: usize) -> Harness {
    harness_with_window(pending, PageWindow::default())
}

pub(crate) fn harness_with_window(pending: usize, window: PageWindow) -> Harness {
    let (api, repository, alerts) = scripted(pending);
    let notifier = MemoryNotifier::default();
    let session = ReviewSession::with_window(api.clone(), notifier.clone(), GRANT_SLUG, window);
    Harness {
        session,
        api,
        notifier,
        repository,
        alerts,
    }
}

pub(crate) async fn loaded(pending: usize) -> Harness {
    let harness = harness(pending);
    harness.session.load().await.expect("session loads");
    harness
}

/// Session whose window holds every application at once.
pub(crate) async fn loaded_unpaged(pending: usize) -> Harness {
    let harness = harness_with_window(pending, PageWindow::new(pending.max(1) + 1));
    harness.session.load().await.expect("session loads");
    harness
}

pub(crate) struct BoardHarness {
    pub(crate) board: SubmissionBoard<Arc<ScriptedApi>, MemoryNotifier>,
    pub(crate) api: Arc<ScriptedApi>,
    pub(crate) notifier: MemoryNotifier,
    pub(crate) repository: Arc<MemoryReviewRepository>,
}

pub(crate) async fn loaded_board(pending: usize) -> BoardHarness {
    let (api, repository, _alerts) = scripted(pending);
    let notifier = MemoryNotifier::default();
    let board = SubmissionBoard::new(
        api.clone(),
        notifier.clone(),
        ListingId(LISTING.to_string()),
    );
    board.load().await.expect("board loads");
    BoardHarness {
        board,
        api,
        notifier,
        repository,
    }
}
