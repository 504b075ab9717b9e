use axum::body::Body;
use axum::extract::State;
use axum::http::{header, Method, Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

use super::common::*;
use crate::assessment::router::{compute_handler, ComputeRequest};
use crate::assessment::assessment_router;

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("request builds")
}

fn risk_ids_of(payload: &Value) -> Vec<String> {
    payload["risks"]
        .as_array()
        .expect("risks array")
        .iter()
        .map(|risk| risk["id"].as_str().expect("risk id").to_string())
        .collect()
}

#[tokio::test]
async fn compute_handler_defaults_sector_and_unit() {
    let request: ComputeRequest = serde_json::from_value(json!({})).expect("empty body parses");
    assert_eq!(request.sector_code, "47");
    assert_eq!(request.unit, "Magasin");

    let response = compute_handler(State(shared_engine()), axum::Json(request)).await;

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(risk_ids_of(&payload), ids(["R-ECRAN", "R-RPS", "R-INCENDIE"]));
}

#[tokio::test]
async fn compute_route_accepts_legacy_field_names() {
    let app = assessment_router(shared_engine());

    let response = app
        .oneshot(post_json(
            "/api/v1/duerp/compute",
            json!({ "nafCode": "47", "unity": "Magasin", "features": { "solvents": true } }),
        ))
        .await
        .expect("route responds");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert!(risk_ids_of(&payload).contains(&"R-SOLVENTS".to_string()));
    assert_eq!(payload["plan"]["accumulation"], "sum");
    assert!(payload["obligations"]
        .as_array()
        .expect("obligations array")
        .iter()
        .any(|obligation| obligation["id"] == "OB-SOLVENTS-DOSSIER"));
}

#[tokio::test]
async fn compute_route_rejects_mistyped_features() {
    let app = assessment_router(shared_engine());

    let response = app
        .oneshot(post_json(
            "/api/v1/duerp/compute",
            json!({ "features": { "solvents": "oui" } }),
        ))
        .await
        .expect("route responds");

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn export_route_serves_the_plan_as_csv() {
    let app = assessment_router(shared_engine());

    let response = app
        .oneshot(post_json(
            "/api/v1/duerp/export/csv",
            json!({ "sector_code": "62", "unit": "Bureau" }),
        ))
        .await
        .expect("route responds");

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(content_type.starts_with("text/csv"));

    let body = read_text_body(response).await;
    assert!(body.starts_with("Action;Score;Risques couverts;Priorite"));
    assert!(body.contains("Amenagement ergonomique des postes ecran"));
}

#[tokio::test]
async fn schedule_route_offsets_from_the_start_date() {
    let app = assessment_router(shared_engine());

    let response = app
        .oneshot(post_json(
            "/api/v1/duerp/schedule",
            json!({ "sector_code": "47", "unit": "Magasin", "start": "2025-03-01" }),
        ))
        .await
        .expect("route responds");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["start"], "2025-03-01");
    assert_eq!(payload["calendar"][0]["date"], "2025-03-02");
    assert_eq!(payload["reminders"][0]["due"], "2025-03-04");
    assert_eq!(payload["gantt"][0]["status"], "in-progress");
    assert_eq!(payload["kanban"].as_array().map(Vec::len), Some(4));
}

#[tokio::test]
async fn document_route_creates_and_validates() {
    let app = assessment_router(shared_engine());

    let created = app
        .clone()
        .oneshot(post_json(
            "/api/v1/duerp/documents",
            json!({
                "company_name": "Clinique des Tilleuls",
                "year": 2025,
                "sector_code": "86.10Z",
                "units": [
                    { "name": "Soins", "features": { "night_work": true } },
                    { "name": "Accueil", "features": { "public_facing": true } }
                ]
            }),
        ))
        .await
        .expect("route responds");

    assert_eq!(created.status(), StatusCode::CREATED);
    let payload = read_json_body(created).await;
    assert!(payload["id"].as_str().expect("id").starts_with("duerp-"));
    assert_eq!(payload["units"].as_array().map(Vec::len), Some(2));
    assert_eq!(payload["history"][0]["user"], "system");

    let rejected = app
        .oneshot(post_json(
            "/api/v1/duerp/documents",
            json!({ "company_name": "Vide", "year": 2025, "sector_code": "47", "units": [] }),
        ))
        .await
        .expect("route responds");

    assert_eq!(rejected.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let payload = read_json_body(rejected).await;
    assert_eq!(payload["error"], "at least one work unit is required");
}

#[tokio::test]
async fn document_export_route_returns_csv() {
    let app = assessment_router(shared_engine());

    let response = app
        .oneshot(post_json(
            "/api/v1/duerp/documents/export/csv",
            json!({
                "company_name": "Garage Central",
                "year": 2025,
                "sector_code": "45.20A",
                "units": [{ "name": "Atelier", "features": { "solvents": true } }]
            }),
        ))
        .await
        .expect("route responds");

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_text_body(response).await;
    assert!(body.contains("Plan d'action consolide"));
    assert!(body.contains("Solvants et COV;Atelier"));
}

#[tokio::test]
async fn sector_route_returns_profile_or_not_found() {
    let app = assessment_router(shared_engine());

    let found = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/v1/catalog/sectors/56.10A")
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("route responds");
    assert_eq!(found.status(), StatusCode::OK);
    let payload = read_json_body(found).await;
    assert_eq!(payload["sector_code"], "5610A");

    let missing = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/catalog/sectors/47")
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("route responds");
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    let payload = read_json_body(missing).await;
    assert_eq!(payload["default_risks"], json!(["R-ECRAN", "R-RPS", "R-INCENDIE"]));
}
