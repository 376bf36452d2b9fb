use super::common::*;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use serde_json::json;
use std::sync::Arc;
use tower::ServiceExt;

use crate::review::router::{review_router, SPONSOR_HEADER};
use crate::review::{GrantApplicationStatus, GrantReviewService, MemoryApplicantNotifier};

fn router(pending: usize) -> (axum::Router, Arc<crate::review::MemoryReviewRepository>) {
    let (service, repository, _) = build_service(pending);
    (review_router(Arc::new(service)), repository)
}

fn post_json(uri: &str, sponsor: Option<&str>, body: serde_json::Value) -> Request<Body> {
    let mut builder = Request::post(uri).header(header::CONTENT_TYPE, "application/json");
    if let Some(sponsor) = sponsor {
        builder = builder.header(SPONSOR_HEADER, sponsor);
    }
    builder
        .body(Body::from(serde_json::to_vec(&body).expect("serialize")))
        .expect("request builds")
}

fn get(uri: &str, sponsor: &str) -> Request<Body> {
    Request::get(uri)
        .header(SPONSOR_HEADER, sponsor)
        .body(Body::empty())
        .expect("request builds")
}

#[tokio::test]
async fn update_status_route_accepts_wire_payload() {
    let (router, repository) = router(2);

    let response = router
        .oneshot(post_json(
            "/api/sponsor-dashboard/grants/update-application-status",
            Some(&sponsor().0),
            json!({
                "data": [{ "id": "app-01", "approvedAmount": 750 }],
                "applicationStatus": "Approved"
            }),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["updated"][0]["applicationStatus"], json!("Approved"));
    assert_eq!(payload["updated"][0]["approvedAmount"], json!(750));
    assert_eq!(
        stored(&repository, 1).application_status,
        GrantApplicationStatus::Approved
    );
}

#[tokio::test]
async fn missing_sponsor_header_is_unauthorized() {
    let (router, _) = router(1);

    let response = router
        .oneshot(post_json(
            "/api/sponsor-dashboard/grants/update-application-status",
            None,
            json!({ "data": [{ "id": "app-01" }], "applicationStatus": "Rejected" }),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn foreign_sponsor_gets_forbidden() {
    let (router, _) = router(1);

    let response = router
        .oneshot(get(
            &format!("/api/sponsor-dashboard/grants/{GRANT_SLUG}"),
            &other_sponsor().0,
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn applications_route_reads_query_window() {
    let (router, _) = router(30);

    let response = router
        .oneshot(get(
            &format!(
                "/api/sponsor-dashboard/grants/{GRANT_SLUG}/applications?searchText=&length=20&skip=20"
            ),
            &sponsor().0,
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["total"], json!(30));
    assert_eq!(payload["applications"].as_array().map(Vec::len), Some(10));
    assert_eq!(payload["applications"][0]["id"], json!("app-21"));
}

#[tokio::test]
async fn invalid_transition_maps_to_unprocessable() {
    let (router, _) = router(1);

    let response = router
        .oneshot(post_json(
            "/api/sponsor-dashboard/grants/record-payment",
            Some(&sponsor().0),
            json!({ "id": "app-01", "paidAmount": 100 }),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let payload = read_json_body(response).await;
    assert!(payload["error"]
        .as_str()
        .unwrap_or_default()
        .contains("Pending"));
}

#[tokio::test]
async fn unknown_grant_is_not_found() {
    let (router, _) = router(0);

    let response = router
        .oneshot(get("/api/sponsor-dashboard/grants/missing", &sponsor().0))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn submission_reject_route_rejects_batch() {
    let (router, _) = router(2);

    let response = router
        .clone()
        .oneshot(post_json(
            "/api/sponsor-dashboard/submission/reject",
            Some(&sponsor().0),
            json!({ "data": [{ "id": "sub-01" }, { "id": "sub-02" }] }),
        ))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::OK);

    let listed = router
        .oneshot(get(
            &format!("/api/sponsor-dashboard/listings/{LISTING}/submissions"),
            &sponsor().0,
        ))
        .await
        .expect("route executes");
    let payload = read_json_body(listed).await;
    let statuses: Vec<_> = payload
        .as_array()
        .expect("array body")
        .iter()
        .map(|row| row["status"].clone())
        .collect();
    assert_eq!(statuses, vec![json!("Rejected"), json!("Rejected")]);
}

#[tokio::test]
async fn repository_outage_is_internal_error() {
    let service = Arc::new(GrantReviewService::new(
        Arc::new(UnavailableRepository),
        Arc::new(MemoryApplicantNotifier::default()),
    ));

    let response = review_router(service)
        .oneshot(get(
            &format!("/api/sponsor-dashboard/grants/{GRANT_SLUG}"),
            &sponsor().0,
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}
