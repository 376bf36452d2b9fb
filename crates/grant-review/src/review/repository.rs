use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::domain::{
    ApplicationId, Grant, GrantApplication, GrantId, Listing, ListingId, Submission, SubmissionId,
};

/// Storage abstraction so the review service can be exercised in isolation.
///
/// Batch writes (`update_applications`, `update_submissions`) must apply every row or none.
pub trait ReviewRepository: Send + Sync {
    fn grant(&self, id: &GrantId) -> Result<Option<Grant>, RepositoryError>;
    fn grant_by_slug(&self, slug: &str) -> Result<Option<Grant>, RepositoryError>;
    fn update_grant(&self, grant: Grant) -> Result<(), RepositoryError>;
    /// All applications of a grant, newest first.
    fn applications(&self, grant_id: &GrantId) -> Result<Vec<GrantApplication>, RepositoryError>;
    fn fetch_application(
        &self,
        id: &ApplicationId,
    ) -> Result<Option<GrantApplication>, RepositoryError>;
    fn update_applications(&self, rows: Vec<GrantApplication>) -> Result<(), RepositoryError>;
    fn listing(&self, id: &ListingId) -> Result<Option<Listing>, RepositoryError>;
    /// All submissions of a listing, newest first.
    fn submissions(&self, listing_id: &ListingId) -> Result<Vec<Submission>, RepositoryError>;
    fn fetch_submission(&self, id: &SubmissionId) -> Result<Option<Submission>, RepositoryError>;
    fn update_submissions(&self, rows: Vec<Submission>) -> Result<(), RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Outbound applicant notifications (e-mail adapters and similar).
pub trait ApplicantNotifier: Send + Sync {
    fn publish(&self, alert: ApplicantAlert) -> Result<(), AlertError>;
}

/// Templated message addressed to the talent behind an application or submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicantAlert {
    pub template: String,
    pub recipient: String,
    pub reference: String,
    pub details: BTreeMap<String, String>,
}

impl ApplicantAlert {
    pub fn for_application(template: &str, application: &GrantApplication) -> Self {
        Self {
            template: template.to_string(),
            recipient: application.applicant.email.clone(),
            reference: application.id.0.clone(),
            details: BTreeMap::new(),
        }
    }

    pub fn for_submission(template: &str, submission: &Submission) -> Self {
        Self {
            template: template.to_string(),
            recipient: submission.user.email.clone(),
            reference: submission.id.0.clone(),
            details: BTreeMap::new(),
        }
    }

    pub fn with_detail(mut self, key: &str, value: impl ToString) -> Self {
        self.details.insert(key.to_string(), value.to_string());
        self
    }
}

/// Alert dispatch error.
#[derive(Debug, thiserror::Error)]
pub enum AlertError {
    #[error("alert transport unavailable: {0}")]
    Transport(String),
}
