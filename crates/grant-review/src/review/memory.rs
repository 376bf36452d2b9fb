use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use super::domain::{
    ApplicationId, Grant, GrantApplication, GrantId, Listing, ListingId, Submission, SubmissionId,
};
use super::repository::{
    AlertError, ApplicantAlert, ApplicantNotifier, RepositoryError, ReviewRepository,
};

#[derive(Default)]
struct Tables {
    grants: HashMap<GrantId, Grant>,
    applications: HashMap<ApplicationId, GrantApplication>,
    listings: HashMap<ListingId, Listing>,
    submissions: HashMap<SubmissionId, Submission>,
}

/// Process-local repository backing the API service and demos.
#[derive(Default, Clone)]
pub struct MemoryReviewRepository {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryReviewRepository {
    fn lock(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().expect("repository mutex poisoned")
    }

    pub fn insert_grant(&self, grant: Grant) -> Result<Grant, RepositoryError> {
        let mut tables = self.lock();
        if tables.grants.contains_key(&grant.id) {
            return Err(RepositoryError::Conflict);
        }
        tables.grants.insert(grant.id.clone(), grant.clone());
        Ok(grant)
    }

    /// Store a new application and bump the owning grant's application count.
    pub fn insert_application(
        &self,
        application: GrantApplication,
    ) -> Result<GrantApplication, RepositoryError> {
        let mut tables = self.lock();
        if tables.applications.contains_key(&application.id) {
            return Err(RepositoryError::Conflict);
        }
        let grant = tables
            .grants
            .get_mut(&application.grant_id)
            .ok_or(RepositoryError::NotFound)?;
        grant.total_applications += 1;
        tables
            .applications
            .insert(application.id.clone(), application.clone());
        Ok(application)
    }

    pub fn insert_listing(&self, listing: Listing) -> Result<Listing, RepositoryError> {
        let mut tables = self.lock();
        if tables.listings.contains_key(&listing.id) {
            return Err(RepositoryError::Conflict);
        }
        tables.listings.insert(listing.id.clone(), listing.clone());
        Ok(listing)
    }

    pub fn insert_submission(&self, submission: Submission) -> Result<Submission, RepositoryError> {
        let mut tables = self.lock();
        if tables.submissions.contains_key(&submission.id) {
            return Err(RepositoryError::Conflict);
        }
        if !tables.listings.contains_key(&submission.listing_id) {
            return Err(RepositoryError::NotFound);
        }
        tables
            .submissions
            .insert(submission.id.clone(), submission.clone());
        Ok(submission)
    }
}

impl ReviewRepository for MemoryReviewRepository {
    fn grant(&self, id: &GrantId) -> Result<Option<Grant>, RepositoryError> {
        Ok(self.lock().grants.get(id).cloned())
    }

    fn grant_by_slug(&self, slug: &str) -> Result<Option<Grant>, RepositoryError> {
        Ok(self
            .lock()
            .grants
            .values()
            .find(|grant| grant.slug == slug)
            .cloned())
    }

    fn update_grant(&self, grant: Grant) -> Result<(), RepositoryError> {
        let mut tables = self.lock();
        match tables.grants.get_mut(&grant.id) {
            Some(slot) => {
                *slot = grant;
                Ok(())
            }
            None => Err(RepositoryError::NotFound),
        }
    }

    fn applications(&self, grant_id: &GrantId) -> Result<Vec<GrantApplication>, RepositoryError> {
        let tables = self.lock();
        let mut rows: Vec<GrantApplication> = tables
            .applications
            .values()
            .filter(|application| &application.grant_id == grant_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(rows)
    }

    fn fetch_application(
        &self,
        id: &ApplicationId,
    ) -> Result<Option<GrantApplication>, RepositoryError> {
        Ok(self.lock().applications.get(id).cloned())
    }

    fn update_applications(&self, rows: Vec<GrantApplication>) -> Result<(), RepositoryError> {
        let mut tables = self.lock();
        if rows
            .iter()
            .any(|row| !tables.applications.contains_key(&row.id))
        {
            return Err(RepositoryError::NotFound);
        }
        for row in rows {
            tables.applications.insert(row.id.clone(), row);
        }
        Ok(())
    }

    fn listing(&self, id: &ListingId) -> Result<Option<Listing>, RepositoryError> {
        Ok(self.lock().listings.get(id).cloned())
    }

    fn submissions(&self, listing_id: &ListingId) -> Result<Vec<Submission>, RepositoryError> {
        let tables = self.lock();
        let mut rows: Vec<Submission> = tables
            .submissions
            .values()
            .filter(|submission| &submission.listing_id == listing_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(rows)
    }

    fn fetch_submission(&self, id: &SubmissionId) -> Result<Option<Submission>, RepositoryError> {
        Ok(self.lock().submissions.get(id).cloned())
    }

    fn update_submissions(&self, rows: Vec<Submission>) -> Result<(), RepositoryError> {
        let mut tables = self.lock();
        if rows
            .iter()
            .any(|row| !tables.submissions.contains_key(&row.id))
        {
            return Err(RepositoryError::NotFound);
        }
        for row in rows {
            tables.submissions.insert(row.id.clone(), row);
        }
        Ok(())
    }
}

/// Notifier that keeps every alert in memory; used by the demo service and tests.
#[derive(Default, Clone)]
pub struct MemoryApplicantNotifier {
    events: Arc<Mutex<Vec<ApplicantAlert>>>,
}

impl MemoryApplicantNotifier {
    pub fn events(&self) -> Vec<ApplicantAlert> {
        self.events.lock().expect("alert mutex poisoned").clone()
    }
}

impl ApplicantNotifier for MemoryApplicantNotifier {
    fn publish(&self, alert: ApplicantAlert) -> Result<(), AlertError> {
        tracing::debug!(template = %alert.template, reference = %alert.reference, "applicant alert queued");
        self.events
            .lock()
            .expect("alert mutex poisoned")
            .push(alert);
        Ok(())
    }
}
