//! Sponsor-side review of grant applications and listing submissions: domain model, wire
//! payloads, storage seam, review rules and the HTTP surface the dashboard talks to.

pub mod domain;
pub mod memory;
pub mod payload;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
pub(crate) mod tests;

pub use domain::{
    Applicant, ApplicationId, Grant, GrantApplication, GrantApplicationStatus, GrantId, Listing,
    ListingId, SponsorId, Submission, SubmissionId, SubmissionStatus,
};
pub use memory::{MemoryApplicantNotifier, MemoryReviewRepository};
pub use payload::{
    ApplicationPage, ApplicationQuery, ApplicationStatusUpdate, RecordPaymentRequest,
    RejectSubmissionsRequest, StatusUpdateResponse, SubmissionRef, UpdateApplicationStatusRequest,
};
pub use repository::{
    AlertError, ApplicantAlert, ApplicantNotifier, RepositoryError, ReviewRepository,
};
pub use router::{review_router, SPONSOR_HEADER};
pub use service::{GrantReviewService, ReviewServiceError};
