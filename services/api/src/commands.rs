use clap::{Args, Subcommand};
use grant_review::config::{AppConfig, DashboardConfig};
use grant_review::dashboard::{
    HttpReviewApi, PageWindow, ReviewSession, TracingNotifier, DEFAULT_PAGE_LENGTH,
    SEARCH_PAGE_LENGTH,
};
use grant_review::error::AppError;
use grant_review::review::{ApplicationId, GrantApplication, SponsorId};
use grant_review::telemetry;

#[derive(Subcommand, Debug)]
pub(crate) enum ApplicationsCommand {
    /// Print one page of a grant's applications
    List(ListArgs),
    /// Approve a pending application for an amount
    Approve(ApproveArgs),
    /// Reject one or more pending applications
    Reject(RejectArgs),
    /// Record a payout against an approved application
    RecordPayment(PaymentArgs),
}

#[derive(Args, Debug)]
pub(crate) struct RemoteArgs {
    /// Base URL of the review API (defaults to DASHBOARD_API_URL)
    #[arg(long)]
    pub(crate) api_url: Option<String>,
    /// Sponsor acting on the grant (defaults to DASHBOARD_SPONSOR_ID)
    #[arg(long)]
    pub(crate) sponsor: Option<String>,
    /// Grant slug
    #[arg(long)]
    pub(crate) slug: String,
}

#[derive(Args, Debug)]
pub(crate) struct ListArgs {
    #[command(flatten)]
    pub(crate) remote: RemoteArgs,
    /// Zero-based page number
    #[arg(long, default_value_t = 0)]
    pub(crate) page: usize,
    /// Rows per page
    #[arg(long, default_value_t = DEFAULT_PAGE_LENGTH)]
    pub(crate) length: usize,
    /// Case-insensitive search over applicant and project fields
    #[arg(long)]
    pub(crate) search: Option<String>,
}

#[derive(Args, Debug)]
pub(crate) struct ApproveArgs {
    #[command(flatten)]
    pub(crate) remote: RemoteArgs,
    /// Application id
    #[arg(long)]
    pub(crate) id: String,
    /// Approved amount in token units
    #[arg(long)]
    pub(crate) amount: u64,
}

#[derive(Args, Debug)]
pub(crate) struct RejectArgs {
    #[command(flatten)]
    pub(crate) remote: RemoteArgs,
    /// Application ids; more than one is sent as a bulk rejection
    #[arg(long = "id", required = true)]
    pub(crate) ids: Vec<String>,
}

#[derive(Args, Debug)]
pub(crate) struct PaymentArgs {
    #[command(flatten)]
    pub(crate) remote: RemoteArgs,
    /// Application id
    #[arg(long)]
    pub(crate) id: String,
    /// Paid amount in token units
    #[arg(long)]
    pub(crate) amount: u64,
}

type RemoteSession = ReviewSession<HttpReviewApi, TracingNotifier>;

pub(crate) async fn run_applications(command: ApplicationsCommand) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    telemetry::init_cli(&config.telemetry)?;

    match command {
        ApplicationsCommand::List(args) => {
            let window = list_window(&args);
            let searching = window.is_search_mode();
            let session = connect(&config.dashboard, &args.remote, window)?;
            session.load().await?;
            if !searching {
                for _ in 0..args.page {
                    if !session.next_page().await? {
                        break;
                    }
                }
            }
            render_page(&session);
        }
        ApplicationsCommand::Approve(args) => {
            let session = connect(&config.dashboard, &args.remote, full_window())?;
            let id = ApplicationId(args.id);
            load_rows(&session, std::slice::from_ref(&id)).await?;
            session.approve(&id, args.amount).await?;
            render_row(&session, &id);
        }
        ApplicationsCommand::Reject(args) => {
            let session = connect(&config.dashboard, &args.remote, full_window())?;
            let ids: Vec<ApplicationId> = args.ids.into_iter().map(ApplicationId).collect();
            load_rows(&session, &ids).await?;
            if let [id] = ids.as_slice() {
                session.reject(id).await?;
                render_row(&session, id);
            } else {
                let rejected = session.bulk_reject(&ids).await?;
                println!("Rejected {rejected} applications");
            }
        }
        ApplicationsCommand::RecordPayment(args) => {
            let session = connect(&config.dashboard, &args.remote, full_window())?;
            let id = ApplicationId(args.id);
            load_rows(&session, std::slice::from_ref(&id)).await?;
            session
                .record_payment(&id, args.amount, |row| {
                    println!(
                        "Payment recorded for {}: {} of {} paid",
                        row.id, row.total_paid, row.approved_amount
                    );
                })
                .await?;
        }
    }

    Ok(())
}

fn connect(
    dashboard: &DashboardConfig,
    remote: &RemoteArgs,
    window: PageWindow,
) -> Result<RemoteSession, AppError> {
    let mut dashboard = dashboard.clone();
    if let Some(url) = remote.api_url.as_deref() {
        dashboard.api_base_url = DashboardConfig::parse_base_url(url)?;
    }
    let sponsor = remote
        .sponsor
        .clone()
        .or_else(|| dashboard.sponsor_id.clone())
        .ok_or_else(|| {
            AppError::Usage("pass --sponsor or set DASHBOARD_SPONSOR_ID".to_string())
        })?;

    let api = HttpReviewApi::new(&dashboard, SponsorId(sponsor))?;
    Ok(ReviewSession::with_window(
        api,
        TracingNotifier,
        remote.slug.clone(),
        window,
    ))
}

/// The search is part of the first request, so a searched listing loads once.
fn list_window(args: &ListArgs) -> PageWindow {
    let mut window = PageWindow::new(args.length);
    if let Some(search) = args.search.as_deref() {
        window.set_search(search);
    }
    window
}

/// A window wide enough to hold every application the mutation commands act on.
fn full_window() -> PageWindow {
    PageWindow::new(SEARCH_PAGE_LENGTH)
}

async fn load_rows(session: &RemoteSession, ids: &[ApplicationId]) -> Result<(), AppError> {
    session.load().await?;
    match ids.iter().find(|id| session.application(id).is_none()) {
        Some(missing) => Err(AppError::Usage(format!(
            "application {missing} was not found in grant {}",
            session.slug()
        ))),
        None => Ok(()),
    }
}

fn render_page(session: &RemoteSession) {
    if let Some(grant) = session.grant() {
        println!(
            "{} ({}) | {} applications | {} approved | {} {} paid",
            grant.title,
            grant.slug,
            grant.total_applications,
            grant.total_approved,
            grant.total_paid,
            grant.token
        );
    }
    println!("{}", session.range_label());
    for row in session.applications().iter() {
        println!("  {}", describe(row));
    }
}

fn render_row(session: &RemoteSession, id: &ApplicationId) {
    if let Some(row) = session.application(id) {
        println!("{}", describe(&row));
    }
    if let Some(next) = session.selected() {
        println!("Next up: {} ({})", next.id, next.applicant.name);
    }
}

fn describe(row: &GrantApplication) -> String {
    format!(
        "{} | {:<9} | {} | ask {} | approved {} | paid {}",
        row.id,
        row.application_status.label(),
        row.applicant.name,
        row.ask,
        row.approved_amount,
        row.total_paid
    )
}
