use crate::infra::{demo_service, demo_sponsor, DemoService, DEMO_GRANT_SLUG, DEMO_LISTING};
use clap::Args;
use grant_review::dashboard::{
    InProcessReviewApi, MemoryNotifier, NotificationLevel, PageWindow, ReviewSession,
    SubmissionBoard, DEFAULT_PAGE_LENGTH,
};
use grant_review::error::AppError;
use grant_review::review::{
    GrantApplication, ListingId, MemoryApplicantNotifier, MemoryReviewRepository,
    ReviewServiceError, SubmissionStatus,
};
use std::sync::Arc;

#[derive(Args, Debug)]
pub(crate) struct DemoArgs {
    /// Pending applications seeded into the demo grant
    #[arg(long, default_value_t = 45)]
    pub(crate) applications: usize,
    /// Pending submissions seeded into the demo listing
    #[arg(long, default_value_t = 12)]
    pub(crate) submissions: usize,
    /// Rows per page
    #[arg(long, default_value_t = DEFAULT_PAGE_LENGTH)]
    pub(crate) page_length: usize,
    /// Search text used in the search step
    #[arg(long, default_value = "wallet")]
    pub(crate) search: String,
}

type DemoApi = Arc<InProcessReviewApi<MemoryReviewRepository, MemoryApplicantNotifier>>;
type DemoSession = ReviewSession<DemoApi, MemoryNotifier>;

pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        applications,
        submissions,
        page_length,
        search,
    } = args;

    let (service, alerts) =
        demo_service(applications, submissions).map_err(ReviewServiceError::from)?;
    let api: DemoApi = Arc::new(InProcessReviewApi::new(service.clone(), demo_sponsor()));
    let toasts = MemoryNotifier::default();

    println!("Grant review demo");
    let session = ReviewSession::with_window(
        api,
        toasts.clone(),
        DEMO_GRANT_SLUG,
        PageWindow::new(page_length),
    );
    session.load().await?;
    render_grant(&session);
    render_page("First page", &session);

    if session.next_page().await? {
        render_page("Next page", &session);
        session.previous_page().await?;
    }

    session.set_search(&search).await?;
    render_page(&format!("Search for \"{search}\""), &session);
    session.set_search("").await?;

    println!("\nSingle decisions");
    if let Some(first) = session.selected() {
        let amount = first.ask;
        match session.approve(&first.id, amount).await {
            Ok(()) => println!("  Approved {} for {amount}", first.id),
            Err(err) => println!("  Approval failed: {err}"),
        }
    }
    if let Some(next) = session.selected() {
        match session.reject(&next.id).await {
            Ok(()) => println!("  Rejected {}", next.id),
            Err(err) => println!("  Rejection failed: {err}"),
        }
    }
    if let Some(current) = session.selected() {
        println!("  Detail view now on {} ({})", current.id, current.applicant.name);
    }

    println!("\nBulk rejection");
    session.toggle_all();
    let selected = session.selection().len();
    match session.reject_selected().await {
        Ok(count) => println!("  {count} of {selected} selected applications rejected"),
        Err(err) => println!("  Bulk rejection failed: {err}"),
    }
    render_page("After bulk rejection", &session);

    println!("\nPayments");
    let approved = session
        .applications()
        .iter()
        .find(|row| row.outstanding() > 0)
        .cloned();
    match approved {
        Some(row) => record_installments(&session, &row).await,
        None => println!("  No approved application with an outstanding balance"),
    }

    run_submission_board(&service, &toasts).await?;

    println!("\nToasts");
    for toast in toasts.notifications() {
        let marker = match toast.level {
            NotificationLevel::Success => "ok",
            NotificationLevel::Error => "error",
        };
        println!("  [{marker}] {}", toast.message);
    }

    let events = alerts.events();
    if events.is_empty() {
        println!("\nApplicant alerts: none dispatched");
    } else {
        println!("\nApplicant alerts");
        for alert in events {
            println!(
                "  - {} -> {} ({})",
                alert.template, alert.recipient, alert.reference
            );
        }
    }

    Ok(())
}

async fn record_installments(session: &DemoSession, row: &GrantApplication) {
    let first = (row.outstanding() / 2).max(1);
    for amount in [first, row.outstanding() - first, 1] {
        if amount == 0 {
            continue;
        }
        let outcome = session
            .record_payment(&row.id, amount, |updated| {
                println!(
                    "  Paid {amount} to {} | {} of {} settled",
                    updated.id, updated.total_paid, updated.approved_amount
                );
            })
            .await;
        if let Err(err) = outcome {
            println!("  Payment of {amount} refused: {err}");
        }
    }
}

async fn run_submission_board(
    service: &Arc<DemoService>,
    toasts: &MemoryNotifier,
) -> Result<(), AppError> {
    let api: DemoApi = Arc::new(InProcessReviewApi::new(service.clone(), demo_sponsor()));
    let board = SubmissionBoard::new(api, toasts.clone(), ListingId(DEMO_LISTING.to_string()));
    board.load().await?;

    println!("\nListing submissions ({})", board.listing());
    board.toggle_all();
    let selected = board.selection().len();
    match board.reject_selected().await {
        Ok(count) => println!("  {count} of {selected} submissions rejected"),
        Err(err) => println!("  Submission rejection failed: {err}"),
    }
    let pending = board
        .submissions()
        .iter()
        .filter(|submission| submission.status == SubmissionStatus::Pending)
        .count();
    println!("  {pending} submissions still pending");
    Ok(())
}

fn render_grant(session: &DemoSession) {
    if let Some(grant) = session.grant() {
        println!(
            "{} | {} to {} {} | {} applications",
            grant.title, grant.min_reward, grant.max_reward, grant.token, grant.total_applications
        );
    }
}

fn render_page(heading: &str, session: &DemoSession) {
    println!("\n{heading}: {}", session.range_label());
    for row in session.applications().iter().take(5) {
        println!(
            "  - {} | {} | {} | ask {}",
            row.id,
            row.application_status.label(),
            row.project_title,
            row.ask
        );
    }
    let visible = session.applications().len();
    if visible > 5 {
        println!("  ... {} more on this page", visible - 5);
    }
}
