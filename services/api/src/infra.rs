use chrono::{Duration, Utc};
use grant_review::review::{
    Applicant, ApplicationId, Grant, GrantApplication, GrantApplicationStatus, GrantId,
    GrantReviewService, Listing, ListingId, MemoryApplicantNotifier, MemoryReviewRepository,
    RepositoryError, SponsorId, Submission, SubmissionId, SubmissionStatus,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

pub(crate) const DEMO_SPONSOR: &str = "sponsor-superteam";
pub(crate) const DEMO_GRANT_SLUG: &str = "solana-builders";
pub(crate) const DEMO_LISTING: &str = "listing-deep-dive";

const BUILDERS: [&str; 8] = [
    "Ada Okafor",
    "Bilal Khan",
    "Chen Wei",
    "Dana Ruiz",
    "Eitan Levi",
    "Farah Haddad",
    "Goran Petrov",
    "Hana Sato",
];

const PROJECTS: [&str; 6] = [
    "On-chain payroll",
    "Validator health dashboard",
    "Wallet onboarding kit",
    "DAO treasury reports",
    "Mobile NFT minting",
    "Rust SDK examples",
];

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

pub(crate) type DemoService = GrantReviewService<MemoryReviewRepository, MemoryApplicantNotifier>;

pub(crate) fn demo_sponsor() -> SponsorId {
    SponsorId(DEMO_SPONSOR.to_string())
}

pub(crate) fn demo_grant() -> Grant {
    Grant {
        id: GrantId("grant-solana-builders".to_string()),
        slug: DEMO_GRANT_SLUG.to_string(),
        title: "Solana Builders Grant".to_string(),
        sponsor_id: demo_sponsor(),
        token: "USDC".to_string(),
        min_reward: 250,
        max_reward: 10_000,
        total_applications: 0,
        total_approved: 0,
        total_paid: 0,
    }
}

fn demo_applicant(index: usize) -> Applicant {
    let name = BUILDERS[index % BUILDERS.len()];
    let handle = format!(
        "{}{index}",
        name.split_whitespace()
            .next()
            .unwrap_or("builder")
            .to_lowercase()
    );
    Applicant {
        id: format!("user-{index:03}"),
        name: name.to_string(),
        username: handle.clone(),
        email: format!("{handle}@example.com"),
        telegram: Some(format!("https://t.me/{handle}")),
        twitter: (index % 2 == 0).then(|| format!("https://x.com/{handle}")),
        discord: None,
    }
}

fn demo_application(index: usize, grant: &Grant) -> GrantApplication {
    let project = PROJECTS[index % PROJECTS.len()];
    GrantApplication {
        id: ApplicationId(format!("app-{index:03}")),
        grant_id: grant.id.clone(),
        applicant: demo_applicant(index),
        application_status: GrantApplicationStatus::Pending,
        ask: 500 + (index as u64 % 8) * 250,
        approved_amount: 0,
        total_paid: 0,
        project_title: format!("{project} #{index}"),
        project_one_liner: format!("{project} for the Solana ecosystem"),
        project_details: "Open-source deliverable maintained for twelve months.".to_string(),
        project_timeline: "8 weeks".to_string(),
        proof_of_work: "https://github.com/example/proof".to_string(),
        milestones: "M1 prototype, M2 audit, M3 launch".to_string(),
        kpi: "500 weekly active wallets".to_string(),
        wallet_address: format!("Demo{index:03}Wallet1111111111111111111111111"),
        created_at: Utc::now() - Duration::hours(index as i64),
    }
}

fn demo_submission(index: usize, listing: &Listing) -> Submission {
    Submission {
        id: SubmissionId(format!("sub-{index:03}")),
        listing_id: listing.id.clone(),
        user: demo_applicant(index + 3),
        status: SubmissionStatus::Pending,
        link: format!("https://example.com/deep-dive/{index}"),
        created_at: Utc::now() - Duration::hours(index as i64),
    }
}

/// In-memory store holding one grant with `applications` pending applications and one listing
/// with `submissions` pending submissions, all owned by [`DEMO_SPONSOR`].
pub(crate) fn seeded_repository(
    applications: usize,
    submissions: usize,
) -> Result<Arc<MemoryReviewRepository>, RepositoryError> {
    let repository = Arc::new(MemoryReviewRepository::default());
    let grant = repository.insert_grant(demo_grant())?;
    for index in 1..=applications {
        repository.insert_application(demo_application(index, &grant))?;
    }

    let listing = repository.insert_listing(Listing {
        id: ListingId(DEMO_LISTING.to_string()),
        title: "Write a Solana deep dive".to_string(),
        sponsor_id: demo_sponsor(),
    })?;
    for index in 1..=submissions {
        repository.insert_submission(demo_submission(index, &listing))?;
    }
    Ok(repository)
}

pub(crate) fn demo_service(
    applications: usize,
    submissions: usize,
) -> Result<(Arc<DemoService>, Arc<MemoryApplicantNotifier>), RepositoryError> {
    let repository = seeded_repository(applications, submissions)?;
    let alerts = Arc::new(MemoryApplicantNotifier::default());
    let service = Arc::new(GrantReviewService::new(repository, alerts.clone()));
    Ok((service, alerts))
}
