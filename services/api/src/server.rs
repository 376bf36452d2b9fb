use crate::cli::ServeArgs;
use crate::infra::{demo_service, AppState, DEMO_GRANT_SLUG, DEMO_SPONSOR};
use crate::routes::with_review_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use grant_review::config::AppConfig;
use grant_review::error::AppError;
use grant_review::telemetry;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let (review_service, _alerts) = demo_service(args.seed_applications, args.seed_submissions)
        .map_err(|err| AppError::Review(err.into()))?;

    let app = with_review_routes(review_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        grant = DEMO_GRANT_SLUG,
        sponsor = DEMO_SPONSOR,
        applications = args.seed_applications,
        "grant review api ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
