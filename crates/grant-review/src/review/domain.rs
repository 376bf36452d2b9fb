use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier wrapper for grant applications.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApplicationId(pub String);

/// Identifier wrapper for grants.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GrantId(pub String);

/// Acting sponsor, as supplied by the session provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SponsorId(pub String);

/// Identifier wrapper for listing submissions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubmissionId(pub String);

/// Identifier wrapper for bounty/project listings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ListingId(pub String);

macro_rules! display_id {
    ($($name:ident),+) => {
        $(impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        })+
    };
}

display_id!(ApplicationId, GrantId, SponsorId, SubmissionId, ListingId);

/// Review status of a grant application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GrantApplicationStatus {
    Pending,
    Approved,
    Rejected,
}

impl GrantApplicationStatus {
    pub const fn label(self) -> &'static str {
        match self {
            GrantApplicationStatus::Pending => "Pending",
            GrantApplicationStatus::Approved => "Approved",
            GrantApplicationStatus::Rejected => "Rejected",
        }
    }

    pub const fn is_pending(self) -> bool {
        matches!(self, GrantApplicationStatus::Pending)
    }
}

/// Review status of a listing submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SubmissionStatus {
    Pending,
    Approved,
    Rejected,
}

impl SubmissionStatus {
    pub const fn label(self) -> &'static str {
        match self {
            SubmissionStatus::Pending => "Pending",
            SubmissionStatus::Approved => "Approved",
            SubmissionStatus::Rejected => "Rejected",
        }
    }
}

/// Talent profile attached to applications and submissions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Applicant {
    pub id: String,
    pub name: String,
    pub username: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub telegram: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub twitter: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discord: Option<String>,
}

/// Funding listing that receives applications.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Grant {
    pub id: GrantId,
    pub slug: String,
    pub title: String,
    pub sponsor_id: SponsorId,
    /// Token symbol every amount on the grant is denominated in.
    pub token: String,
    pub min_reward: u64,
    /// Zero means the grant has no upper bound.
    pub max_reward: u64,
    pub total_applications: u64,
    pub total_approved: u64,
    pub total_paid: u64,
}

impl Grant {
    pub fn accepts_amount(&self, amount: u64) -> bool {
        amount > 0 && amount >= self.min_reward && (self.max_reward == 0 || amount <= self.max_reward)
    }
}

/// A talent's application to a grant. Amounts are whole token units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrantApplication {
    pub id: ApplicationId,
    pub grant_id: GrantId,
    pub applicant: Applicant,
    pub application_status: GrantApplicationStatus,
    /// Amount the applicant asked for.
    pub ask: u64,
    pub approved_amount: u64,
    pub total_paid: u64,
    pub project_title: String,
    pub project_one_liner: String,
    pub project_details: String,
    pub project_timeline: String,
    pub proof_of_work: String,
    pub milestones: String,
    pub kpi: String,
    pub wallet_address: String,
    pub created_at: DateTime<Utc>,
}

impl GrantApplication {
    pub fn is_pending(&self) -> bool {
        self.application_status.is_pending()
    }

    /// Approved amount still owed to the applicant.
    pub fn outstanding(&self) -> u64 {
        self.approved_amount.saturating_sub(self.total_paid)
    }

    pub fn is_fully_paid(&self) -> bool {
        self.application_status == GrantApplicationStatus::Approved && self.outstanding() == 0
    }

    /// Case-insensitive match used by the applications search box.
    pub fn matches_search(&self, needle: &str) -> bool {
        let needle = needle.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }
        [
            self.applicant.name.as_str(),
            self.applicant.username.as_str(),
            self.applicant.email.as_str(),
            self.project_title.as_str(),
        ]
        .iter()
        .any(|field| field.to_lowercase().contains(&needle))
    }
}

/// Work submitted to a bounty or project listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub id: SubmissionId,
    pub listing_id: ListingId,
    pub user: Applicant,
    pub status: SubmissionStatus,
    pub link: String,
    pub created_at: DateTime<Utc>,
}

/// Bounty or project listing owning submissions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
    pub id: ListingId,
    pub title: String,
    pub sponsor_id: SponsorId,
}
