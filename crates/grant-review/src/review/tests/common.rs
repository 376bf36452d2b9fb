use std::sync::Arc;

use axum::response::Response;
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::Value;

use crate::review::domain::{
    Applicant, ApplicationId, Grant, GrantApplication, GrantApplicationStatus, GrantId, Listing,
    ListingId, SponsorId, Submission, SubmissionId, SubmissionStatus,
};
use crate::review::memory::{MemoryApplicantNotifier, MemoryReviewRepository};
use crate::review::repository::{RepositoryError, ReviewRepository};
use crate::review::service::GrantReviewService;

pub(crate) const GRANT_SLUG: &str = "solana-builders";
pub(crate) const LISTING: &str = "listing-bounty-1";

pub(crate) fn sponsor() -> SponsorId {
    SponsorId("sponsor-superteam".to_string())
}

pub(crate) fn other_sponsor() -> SponsorId {
    SponsorId("sponsor-elsewhere".to_string())
}

fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0)
        .single()
        .expect("valid timestamp")
}

pub(crate) fn applicant(index: usize) -> Applicant {
    Applicant {
        id: format!("user-{index:02}"),
        name: format!("Builder {index:02}"),
        username: format!("builder{index:02}"),
        email: format!("builder{index:02}@example.com"),
        telegram: Some(format!("https://t.me/builder{index:02}")),
        twitter: None,
        discord: None,
    }
}

pub(crate) fn grant() -> Grant {
    Grant {
        id: GrantId("grant-1".to_string()),
        slug: GRANT_SLUG.to_string(),
        title: "Solana Builders Grant".to_string(),
        sponsor_id: sponsor(),
        token: "USDC".to_string(),
        min_reward: 100,
        max_reward: 10_000,
        total_applications: 0,
        total_approved: 0,
        total_paid: 0,
    }
}

pub(crate) fn app_id(index: usize) -> ApplicationId {
    ApplicationId(format!("app-{index:02}"))
}

/// Lower indices are newer, so list order is `app-01, app-02, ...`.
pub(crate) fn application(index: usize, status: GrantApplicationStatus) -> GrantApplication {
    GrantApplication {
        id: app_id(index),
        grant_id: grant().id,
        applicant: applicant(index),
        application_status: status,
        ask: 1_000,
        approved_amount: 0,
        total_paid: 0,
        project_title: format!("Project {index:02}"),
        project_one_liner: "Indexer for on-chain grants".to_string(),
        project_details: "Ships an open-source indexer.".to_string(),
        project_timeline: "6 weeks".to_string(),
        proof_of_work: "https://github.com/example".to_string(),
        milestones: "M1 design, M2 build".to_string(),
        kpi: "1k monthly users".to_string(),
        wallet_address: format!("wallet{index:02}"),
        created_at: base_time() - Duration::minutes(index as i64),
    }
}

pub(crate) fn approved_application(index: usize, approved: u64, paid: u64) -> GrantApplication {
    let mut application = application(index, GrantApplicationStatus::Approved);
    application.approved_amount = approved;
    application.total_paid = paid;
    application
}

pub(crate) fn listing() -> Listing {
    Listing {
        id: ListingId(LISTING.to_string()),
        title: "Write a Solana deep dive".to_string(),
        sponsor_id: sponsor(),
    }
}

pub(crate) fn submission_id(index: usize) -> SubmissionId {
    SubmissionId(format!("sub-{index:02}"))
}

pub(crate) fn submission(index: usize, status: SubmissionStatus) -> Submission {
    Submission {
        id: submission_id(index),
        listing_id: listing().id,
        user: applicant(index),
        status,
        link: format!("https://example.com/post/{index}"),
        created_at: base_time() - Duration::minutes(index as i64),
    }
}

/// Repository holding the fixture grant with `pending` pending applications and the fixture
/// listing with `pending` pending submissions.
pub(crate) fn seeded_repository(pending: usize) -> Arc<MemoryReviewRepository> {
    let repository = Arc::new(MemoryReviewRepository::default());
    repository.insert_grant(grant()).expect("grant inserts");
    repository.insert_listing(listing()).expect("listing inserts");
    for index in 1..=pending {
        repository
            .insert_application(application(index, GrantApplicationStatus::Pending))
            .expect("application inserts");
        repository
            .insert_submission(submission(index, SubmissionStatus::Pending))
            .expect("submission inserts");
    }
    repository
}

pub(crate) type MemoryService = GrantReviewService<MemoryReviewRepository, MemoryApplicantNotifier>;

pub(crate) fn build_service(
    pending: usize,
) -> (
    MemoryService,
    Arc<MemoryReviewRepository>,
    Arc<MemoryApplicantNotifier>,
) {
    let repository = seeded_repository(pending);
    let alerts = Arc::new(MemoryApplicantNotifier::default());
    let service = GrantReviewService::new(repository.clone(), alerts.clone());
    (service, repository, alerts)
}

pub(crate) fn stored(repository: &MemoryReviewRepository, index: usize) -> GrantApplication {
    repository
        .fetch_application(&app_id(index))
        .expect("fetch succeeds")
        .expect("application present")
}

pub(crate) struct UnavailableRepository;

impl ReviewRepository for UnavailableRepository {
    fn grant(&self, _id: &GrantId) -> Result<Option<Grant>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn grant_by_slug(&self, _slug: &str) -> Result<Option<Grant>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn update_grant(&self, _grant: Grant) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn applications(&self, _grant_id: &GrantId) -> Result<Vec<GrantApplication>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch_application(
        &self,
        _id: &ApplicationId,
    ) -> Result<Option<GrantApplication>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn update_applications(&self, _rows: Vec<GrantApplication>) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn listing(&self, _id: &ListingId) -> Result<Option<Listing>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn submissions(&self, _listing_id: &ListingId) -> Result<Vec<Submission>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch_submission(&self, _id: &SubmissionId) -> Result<Option<Submission>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn update_submissions(&self, _rows: Vec<Submission>) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

pub(crate) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
