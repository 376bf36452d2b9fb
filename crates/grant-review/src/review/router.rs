use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use tracing::warn;

use super::domain::{ListingId, SponsorId};
use super::payload::{
    ApplicationQuery, RecordPaymentRequest, RejectSubmissionsRequest, StatusUpdateResponse,
    UpdateApplicationStatusRequest,
};
use super::repository::{ApplicantNotifier, RepositoryError, ReviewRepository};
use super::service::{GrantReviewService, ReviewServiceError};

/// Header carrying the acting sponsor; set by the session layer in front of this service.
pub const SPONSOR_HEADER: &str = "x-sponsor-id";

/// Router exposing the sponsor dashboard review endpoints.
pub fn review_router<R, P>(service: Arc<GrantReviewService<R, P>>) -> Router
where
    R: ReviewRepository + 'static,
    P: ApplicantNotifier + 'static,
{
    Router::new()
        .route(
            "/api/sponsor-dashboard/grants/update-application-status",
            post(update_status_handler::<R, P>),
        )
        .route(
            "/api/sponsor-dashboard/grants/record-payment",
            post(record_payment_handler::<R, P>),
        )
        .route(
            "/api/sponsor-dashboard/grants/:slug",
            get(grant_handler::<R, P>),
        )
        .route(
            "/api/sponsor-dashboard/grants/:slug/applications",
            get(applications_handler::<R, P>),
        )
        .route(
            "/api/sponsor-dashboard/listings/:listing_id/submissions",
            get(submissions_handler::<R, P>),
        )
        .route(
            "/api/sponsor-dashboard/submission/reject",
            post(reject_submissions_handler::<R, P>),
        )
        .with_state(service)
}

pub(crate) async fn grant_handler<R, P>(
    State(service): State<Arc<GrantReviewService<R, P>>>,
    headers: HeaderMap,
    Path(slug): Path<String>,
) -> Response
where
    R: ReviewRepository + 'static,
    P: ApplicantNotifier + 'static,
{
    let sponsor = match sponsor_from(&headers) {
        Ok(sponsor) => sponsor,
        Err(response) => return response,
    };
    match service.grant(&sponsor, &slug) {
        Ok(grant) => (StatusCode::OK, Json(grant)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn applications_handler<R, P>(
    State(service): State<Arc<GrantReviewService<R, P>>>,
    headers: HeaderMap,
    Path(slug): Path<String>,
    Query(query): Query<ApplicationQuery>,
) -> Response
where
    R: ReviewRepository + 'static,
    P: ApplicantNotifier + 'static,
{
    let sponsor = match sponsor_from(&headers) {
        Ok(sponsor) => sponsor,
        Err(response) => return response,
    };
    match service.applications(&sponsor, &slug, &query) {
        Ok(page) => (StatusCode::OK, Json(page)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn update_status_handler<R, P>(
    State(service): State<Arc<GrantReviewService<R, P>>>,
    headers: HeaderMap,
    Json(request): Json<UpdateApplicationStatusRequest>,
) -> Response
where
    R: ReviewRepository + 'static,
    P: ApplicantNotifier + 'static,
{
    let sponsor = match sponsor_from(&headers) {
        Ok(sponsor) => sponsor,
        Err(response) => return response,
    };
    match service.update_application_status(&sponsor, request) {
        Ok(updated) => (StatusCode::OK, Json(StatusUpdateResponse { updated })).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn record_payment_handler<R, P>(
    State(service): State<Arc<GrantReviewService<R, P>>>,
    headers: HeaderMap,
    Json(request): Json<RecordPaymentRequest>,
) -> Response
where
    R: ReviewRepository + 'static,
    P: ApplicantNotifier + 'static,
{
    let sponsor = match sponsor_from(&headers) {
        Ok(sponsor) => sponsor,
        Err(response) => return response,
    };
    match service.record_payment(&sponsor, request) {
        Ok(application) => (StatusCode::OK, Json(application)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn submissions_handler<R, P>(
    State(service): State<Arc<GrantReviewService<R, P>>>,
    headers: HeaderMap,
    Path(listing_id): Path<String>,
) -> Response
where
    R: ReviewRepository + 'static,
    P: ApplicantNotifier + 'static,
{
    let sponsor = match sponsor_from(&headers) {
        Ok(sponsor) => sponsor,
        Err(response) => return response,
    };
    match service.submissions(&sponsor, &ListingId(listing_id)) {
        Ok(submissions) => (StatusCode::OK, Json(submissions)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn reject_submissions_handler<R, P>(
    State(service): State<Arc<GrantReviewService<R, P>>>,
    headers: HeaderMap,
    Json(request): Json<RejectSubmissionsRequest>,
) -> Response
where
    R: ReviewRepository + 'static,
    P: ApplicantNotifier + 'static,
{
    let sponsor = match sponsor_from(&headers) {
        Ok(sponsor) => sponsor,
        Err(response) => return response,
    };
    match service.reject_submissions(&sponsor, request) {
        Ok(submissions) => (StatusCode::OK, Json(submissions)).into_response(),
        Err(err) => error_response(err),
    }
}

fn sponsor_from(headers: &HeaderMap) -> Result<SponsorId, Response> {
    headers
        .get(SPONSOR_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(|value| SponsorId(value.to_string()))
        .ok_or_else(|| {
            let payload = json!({ "error": "missing sponsor identity" });
            (StatusCode::UNAUTHORIZED, Json(payload)).into_response()
        })
}

fn error_response(err: ReviewServiceError) -> Response {
    let status = match &err {
        ReviewServiceError::Forbidden(_) => StatusCode::FORBIDDEN,
        ReviewServiceError::GrantNotFound(_)
        | ReviewServiceError::ListingNotFound(_)
        | ReviewServiceError::ApplicationNotFound(_)
        | ReviewServiceError::SubmissionNotFound(_)
        | ReviewServiceError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
        ReviewServiceError::InvalidTransition { .. } | ReviewServiceError::Validation(_) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        ReviewServiceError::Repository(RepositoryError::Conflict) => StatusCode::CONFLICT,
        ReviewServiceError::Repository(RepositoryError::Unavailable(_)) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };

    if status.is_server_error() {
        warn!(error = %err, "review request failed");
    }

    let payload = json!({ "error": err.to_string() });
    (status, Json(payload)).into_response()
}
