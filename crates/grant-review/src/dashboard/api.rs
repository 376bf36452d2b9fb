use std::sync::Arc;

use async_trait::async_trait;

use crate::review::domain::{Grant, GrantApplication, ListingId, SponsorId, Submission};
use crate::review::payload::{
    ApplicationPage, ApplicationQuery, RecordPaymentRequest, RejectSubmissionsRequest,
    UpdateApplicationStatusRequest,
};
use crate::review::repository::{ApplicantNotifier, ReviewRepository};
use crate::review::service::{GrantReviewService, ReviewServiceError};

/// Remote data API the dashboard reads from and mutates through.
#[async_trait]
pub trait ReviewApi: Send + Sync {
    async fn grant(&self, slug: &str) -> Result<Grant, ApiError>;

    async fn applications(
        &self,
        slug: &str,
        query: &ApplicationQuery,
    ) -> Result<ApplicationPage, ApiError>;

    async fn update_application_status(
        &self,
        request: UpdateApplicationStatusRequest,
    ) -> Result<Vec<GrantApplication>, ApiError>;

    async fn record_payment(
        &self,
        request: RecordPaymentRequest,
    ) -> Result<GrantApplication, ApiError>;

    async fn submissions(&self, listing: &ListingId) -> Result<Vec<Submission>, ApiError>;

    async fn reject_submissions(
        &self,
        request: RejectSubmissionsRequest,
    ) -> Result<Vec<Submission>, ApiError>;
}

#[async_trait]
impl<T: ReviewApi + ?Sized> ReviewApi for Arc<T> {
    async fn grant(&self, slug: &str) -> Result<Grant, ApiError> {
        (**self).grant(slug).await
    }

    async fn applications(
        &self,
        slug: &str,
        query: &ApplicationQuery,
    ) -> Result<ApplicationPage, ApiError> {
        (**self).applications(slug, query).await
    }

    async fn update_application_status(
        &self,
        request: UpdateApplicationStatusRequest,
    ) -> Result<Vec<GrantApplication>, ApiError> {
        (**self).update_application_status(request).await
    }

    async fn record_payment(
        &self,
        request: RecordPaymentRequest,
    ) -> Result<GrantApplication, ApiError> {
        (**self).record_payment(request).await
    }

    async fn submissions(&self, listing: &ListingId) -> Result<Vec<Submission>, ApiError> {
        (**self).submissions(listing).await
    }

    async fn reject_submissions(
        &self,
        request: RejectSubmissionsRequest,
    ) -> Result<Vec<Submission>, ApiError> {
        (**self).reject_submissions(request).await
    }
}

/// Error returned by a [`ReviewApi`] call.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("invalid endpoint '{path}': {source}")]
    Endpoint {
        path: String,
        #[source]
        source: url::ParseError,
    },
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("request to {endpoint} failed: {source}")]
    Transport {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{endpoint} responded with {status}: {message}")]
    Status {
        endpoint: String,
        status: u16,
        message: String,
    },
    #[error("unexpected response from {endpoint}: {source}")]
    Decode {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },
    #[error(transparent)]
    Service(#[from] ReviewServiceError),
}

/// Talks to a [`GrantReviewService`] in the same process, acting as one sponsor.
pub struct InProcessReviewApi<R, P> {
    service: Arc<GrantReviewService<R, P>>,
    sponsor: SponsorId,
}

impl<R, P> InProcessReviewApi<R, P>
where
    R: ReviewRepository + 'static,
    P: ApplicantNotifier + 'static,
{
    pub fn new(service: Arc<GrantReviewService<R, P>>, sponsor: SponsorId) -> Self {
        Self { service, sponsor }
    }

    pub fn sponsor(&self) -> &SponsorId {
        &self.sponsor
    }
}

#[async_trait]
impl<R, P> ReviewApi for InProcessReviewApi<R, P>
where
    R: ReviewRepository + 'static,
    P: ApplicantNotifier + 'static,
{
    async fn grant(&self, slug: &str) -> Result<Grant, ApiError> {
        Ok(self.service.grant(&self.sponsor, slug)?)
    }

    async fn applications(
        &self,
        slug: &str,
        query: &ApplicationQuery,
    ) -> Result<ApplicationPage, ApiError> {
        Ok(self.service.applications(&self.sponsor, slug, query)?)
    }

    async fn update_application_status(
        &self,
        request: UpdateApplicationStatusRequest,
    ) -> Result<Vec<GrantApplication>, ApiError> {
        Ok(self
            .service
            .update_application_status(&self.sponsor, request)?)
    }

    async fn record_payment(
        &self,
        request: RecordPaymentRequest,
    ) -> Result<GrantApplication, ApiError> {
        Ok(self.service.record_payment(&self.sponsor, request)?)
    }

    async fn submissions(&self, listing: &ListingId) -> Result<Vec<Submission>, ApiError> {
        Ok(self.service.submissions(&self.sponsor, listing)?)
    }

    async fn reject_submissions(
        &self,
        request: RejectSubmissionsRequest,
    ) -> Result<Vec<Submission>, ApiError> {
        Ok(self.service.reject_submissions(&self.sponsor, request)?)
    }
}
