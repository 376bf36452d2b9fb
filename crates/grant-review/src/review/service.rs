use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::{info, warn};

use super::domain::{
    ApplicationId, Grant, GrantApplication, GrantApplicationStatus, GrantId, ListingId, SponsorId,
    Submission, SubmissionId, SubmissionStatus,
};
use super::payload::{
    ApplicationPage, ApplicationQuery, RecordPaymentRequest, RejectSubmissionsRequest,
    UpdateApplicationStatusRequest,
};
use super::repository::{ApplicantAlert, ApplicantNotifier, RepositoryError, ReviewRepository};

/// Server-side review rules: ownership, status transitions, reward bounds and payouts.
pub struct GrantReviewService<R, P> {
    repository: Arc<R>,
    alerts: Arc<P>,
}

impl<R, P> GrantReviewService<R, P>
where
    R: ReviewRepository + 'static,
    P: ApplicantNotifier + 'static,
{
    pub fn new(repository: Arc<R>, alerts: Arc<P>) -> Self {
        Self {
            repository,
            alerts,
        }
    }

    /// Fetch a grant the sponsor owns.
    pub fn grant(&self, sponsor: &SponsorId, slug: &str) -> Result<Grant, ReviewServiceError> {
        let grant = self
            .repository
            .grant_by_slug(slug)?
            .ok_or_else(|| ReviewServiceError::GrantNotFound(slug.to_string()))?;
        ensure_owner(sponsor, &grant.sponsor_id)?;
        Ok(grant)
    }

    /// One window of the grant's applications, newest first, optionally filtered by search text.
    pub fn applications(
        &self,
        sponsor: &SponsorId,
        slug: &str,
        query: &ApplicationQuery,
    ) -> Result<ApplicationPage, ReviewServiceError> {
        if query.length == 0 {
            return Err(ReviewServiceError::Validation(
                "length must be at least 1".to_string(),
            ));
        }

        let grant = self.grant(sponsor, slug)?;
        let applications = self
            .repository
            .applications(&grant.id)?
            .into_iter()
            .filter(|application| application.matches_search(&query.search_text))
            .skip(query.skip)
            .take(query.length)
            .collect();

        Ok(ApplicationPage {
            applications,
            total: grant.total_applications,
        })
    }

    /// Apply one status to a batch of applications. Every row is validated before anything is
    /// written; rejecting an already rejected row is a no-op.
    pub fn update_application_status(
        &self,
        sponsor: &SponsorId,
        request: UpdateApplicationStatusRequest,
    ) -> Result<Vec<GrantApplication>, ReviewServiceError> {
        let target = request.application_status;
        if target == GrantApplicationStatus::Pending {
            return Err(ReviewServiceError::Validation(
                "applications cannot be moved back to Pending".to_string(),
            ));
        }
        if request.data.is_empty() {
            return Err(ReviewServiceError::Validation(
                "no applications supplied".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        let mut grants: HashMap<GrantId, Grant> = HashMap::new();
        let mut results = Vec::with_capacity(request.data.len());
        let mut changed = Vec::new();

        for update in request.data {
            if !seen.insert(update.id.clone()) {
                return Err(ReviewServiceError::Validation(format!(
                    "application {} appears more than once",
                    update.id
                )));
            }

            let mut application = self
                .repository
                .fetch_application(&update.id)?
                .ok_or_else(|| ReviewServiceError::ApplicationNotFound(update.id.clone()))?;

            if !grants.contains_key(&application.grant_id) {
                let grant = self
                    .repository
                    .grant(&application.grant_id)?
                    .ok_or_else(|| {
                        ReviewServiceError::GrantNotFound(application.grant_id.0.clone())
                    })?;
                ensure_owner(sponsor, &grant.sponsor_id)?;
                grants.insert(grant.id.clone(), grant);
            }

            let from = application.application_status;
            match (from, target) {
                (GrantApplicationStatus::Rejected, GrantApplicationStatus::Rejected) => {
                    results.push(application);
                    continue;
                }
                (GrantApplicationStatus::Pending, GrantApplicationStatus::Rejected) => {}
                (GrantApplicationStatus::Pending, GrantApplicationStatus::Approved) => {
                    let amount = update.approved_amount.ok_or_else(|| {
                        ReviewServiceError::Validation(format!(
                            "approvedAmount is required to approve {}",
                            application.id
                        ))
                    })?;
                    let grant = grants.get_mut(&application.grant_id).ok_or_else(|| {
                        ReviewServiceError::GrantNotFound(application.grant_id.0.clone())
                    })?;
                    if !grant.accepts_amount(amount) {
                        return Err(ReviewServiceError::Validation(format!(
                            "approved amount {amount} {} is outside the grant's reward range",
                            grant.token
                        )));
                    }
                    grant.total_approved =
                        grant.total_approved.checked_add(amount).ok_or_else(|| {
                            ReviewServiceError::Validation(format!(
                                "approving {} would overflow the grant's approved total",
                                application.id
                            ))
                        })?;
                    application.approved_amount = amount;
                }
                _ => {
                    return Err(ReviewServiceError::InvalidTransition {
                        id: application.id.0.clone(),
                        from: from.label(),
                        to: target.label(),
                    })
                }
            }

            application.application_status = target;
            changed.push(application.clone());
            results.push(application);
        }

        if changed.is_empty() {
            return Ok(results);
        }

        self.repository.update_applications(changed.clone())?;

        if target == GrantApplicationStatus::Approved {
            for grant in grants.into_values() {
                self.repository.update_grant(grant)?;
            }
        }

        info!(
            count = changed.len(),
            status = target.label(),
            "application statuses updated"
        );

        let template = match target {
            GrantApplicationStatus::Approved => "application_approved",
            _ => "application_rejected",
        };
        for application in &changed {
            let mut alert = ApplicantAlert::for_application(template, application);
            if target == GrantApplicationStatus::Approved {
                alert = alert.with_detail("approved_amount", application.approved_amount);
            }
            self.publish(alert);
        }

        Ok(results)
    }

    /// Record a payout against an approved application.
    pub fn record_payment(
        &self,
        sponsor: &SponsorId,
        request: RecordPaymentRequest,
    ) -> Result<GrantApplication, ReviewServiceError> {
        let mut application = self
            .repository
            .fetch_application(&request.id)?
            .ok_or_else(|| ReviewServiceError::ApplicationNotFound(request.id.clone()))?;
        let mut grant = self
            .repository
            .grant(&application.grant_id)?
            .ok_or_else(|| ReviewServiceError::GrantNotFound(application.grant_id.0.clone()))?;
        ensure_owner(sponsor, &grant.sponsor_id)?;

        if application.application_status != GrantApplicationStatus::Approved {
            return Err(ReviewServiceError::InvalidTransition {
                id: application.id.0.clone(),
                from: application.application_status.label(),
                to: "Paid",
            });
        }
        if request.paid_amount == 0 {
            return Err(ReviewServiceError::Validation(
                "paidAmount must be greater than zero".to_string(),
            ));
        }
        let outstanding = application.outstanding();
        if request.paid_amount > outstanding {
            return Err(ReviewServiceError::Validation(format!(
                "paidAmount {} exceeds the outstanding {outstanding} {}",
                request.paid_amount, grant.token
            )));
        }

        grant.total_paid = grant
            .total_paid
            .checked_add(request.paid_amount)
            .ok_or_else(|| {
                ReviewServiceError::Validation(format!(
                    "paying {} would overflow the grant's paid total",
                    application.id
                ))
            })?;
        application.total_paid += request.paid_amount;
        self.repository.update_applications(vec![application.clone()])?;
        self.repository.update_grant(grant)?;

        info!(
            application = %application.id,
            paid = request.paid_amount,
            total_paid = application.total_paid,
            "payment recorded"
        );
        self.publish(
            ApplicantAlert::for_application("payment_recorded", &application)
                .with_detail("paid_amount", request.paid_amount)
                .with_detail("total_paid", application.total_paid),
        );

        Ok(application)
    }

    /// Submissions of a listing the sponsor owns, newest first.
    pub fn submissions(
        &self,
        sponsor: &SponsorId,
        listing_id: &ListingId,
    ) -> Result<Vec<Submission>, ReviewServiceError> {
        let listing = self
            .repository
            .listing(listing_id)?
            .ok_or_else(|| ReviewServiceError::ListingNotFound(listing_id.clone()))?;
        ensure_owner(sponsor, &listing.sponsor_id)?;
        Ok(self.repository.submissions(listing_id)?)
    }

    /// Reject a batch of submissions with the same all-or-nothing validation as applications.
    pub fn reject_submissions(
        &self,
        sponsor: &SponsorId,
        request: RejectSubmissionsRequest,
    ) -> Result<Vec<Submission>, ReviewServiceError> {
        if request.data.is_empty() {
            return Err(ReviewServiceError::Validation(
                "no submissions supplied".to_string(),
            ));
        }

        let mut owned: HashSet<ListingId> = HashSet::new();
        let mut seen: HashSet<SubmissionId> = HashSet::new();
        let mut results = Vec::with_capacity(request.data.len());
        let mut changed = Vec::new();

        for reference in request.data {
            if !seen.insert(reference.id.clone()) {
                return Err(ReviewServiceError::Validation(format!(
                    "submission {} appears more than once",
                    reference.id
                )));
            }

            let mut submission = self
                .repository
                .fetch_submission(&reference.id)?
                .ok_or_else(|| ReviewServiceError::SubmissionNotFound(reference.id.clone()))?;

            if !owned.contains(&submission.listing_id) {
                let listing = self
                    .repository
                    .listing(&submission.listing_id)?
                    .ok_or_else(|| {
                        ReviewServiceError::ListingNotFound(submission.listing_id.clone())
                    })?;
                ensure_owner(sponsor, &listing.sponsor_id)?;
                owned.insert(listing.id);
            }

            match submission.status {
                SubmissionStatus::Rejected => {}
                SubmissionStatus::Pending => {
                    submission.status = SubmissionStatus::Rejected;
                    changed.push(submission.clone());
                }
                SubmissionStatus::Approved => {
                    return Err(ReviewServiceError::InvalidTransition {
                        id: submission.id.0.clone(),
                        from: submission.status.label(),
                        to: SubmissionStatus::Rejected.label(),
                    })
                }
            }
            results.push(submission);
        }

        if !changed.is_empty() {
            self.repository.update_submissions(changed.clone())?;
            info!(count = changed.len(), "submissions rejected");
            for submission in &changed {
                self.publish(ApplicantAlert::for_submission(
                    "submission_rejected",
                    submission,
                ));
            }
        }

        Ok(results)
    }

    // Status changes are already committed when alerts go out, so a transport failure is
    // logged instead of failing the request.
    fn publish(&self, alert: ApplicantAlert) {
        let reference = alert.reference.clone();
        if let Err(err) = self.alerts.publish(alert) {
            warn!(%reference, error = %err, "applicant alert dropped");
        }
    }
}

fn ensure_owner(sponsor: &SponsorId, owner: &SponsorId) -> Result<(), ReviewServiceError> {
    if sponsor == owner {
        Ok(())
    } else {
        Err(ReviewServiceError::Forbidden(sponsor.clone()))
    }
}

/// Error raised by the review service.
#[derive(Debug, thiserror::Error)]
pub enum ReviewServiceError {
    #[error("grant '{0}' not found")]
    GrantNotFound(String),
    #[error("listing '{0}' not found")]
    ListingNotFound(ListingId),
    #[error("application {0} not found")]
    ApplicationNotFound(ApplicationId),
    #[error("submission {0} not found")]
    SubmissionNotFound(SubmissionId),
    #[error("sponsor {0} does not own this listing")]
    Forbidden(SponsorId),
    #[error("{id} cannot move from {from} to {to}")]
    InvalidTransition {
        id: String,
        from: &'static str,
        to: &'static str,
    },
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
