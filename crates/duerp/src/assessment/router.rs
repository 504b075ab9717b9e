use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::document::DocumentRequest;
use super::domain::AssessmentContext;
use super::engine::RiskEngine;
use super::export;
use super::schedule::{self, CalendarEvent, GanttTask, KanbanColumn, Reminder};
use crate::error::AppError;

const DEFAULT_SECTOR: &str = "47";
const DEFAULT_UNIT: &str = "Magasin";

/// Router builder exposing the assessment endpoints.
pub fn assessment_router(engine: Arc<RiskEngine>) -> Router {
    Router::new()
        .route("/api/v1/duerp/compute", post(compute_handler))
        .route("/api/v1/duerp/export/csv", post(export_plan_handler))
        .route("/api/v1/duerp/schedule", post(schedule_handler))
        .route("/api/v1/duerp/documents", post(document_handler))
        .route(
            "/api/v1/duerp/documents/export/csv",
            post(export_document_handler),
        )
        .route("/api/v1/catalog/sectors/:code", get(sector_handler))
        .with_state(engine)
}

/// Body of the compute endpoints. Accepts the camelCase names older clients send.
#[derive(Debug, Clone, Deserialize)]
pub struct ComputeRequest {
    #[serde(default = "default_sector", alias = "nafCode")]
    pub sector_code: String,
    #[serde(default = "default_unit", alias = "unity", alias = "unit_name")]
    pub unit: String,
    #[serde(default)]
    pub features: BTreeMap<String, bool>,
    #[serde(default)]
    pub modifiers: BTreeMap<String, i32>,
}

impl ComputeRequest {
    fn into_context(self) -> AssessmentContext {
        AssessmentContext {
            sector_code: self.sector_code,
            unit_name: self.unit,
            features: self.features,
            modifiers: self.modifiers,
        }
    }
}

fn default_sector() -> String {
    DEFAULT_SECTOR.to_string()
}

fn default_unit() -> String {
    DEFAULT_UNIT.to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScheduleRequest {
    #[serde(flatten)]
    pub compute: ComputeRequest,
    #[serde(default)]
    pub start: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScheduleView {
    pub start: NaiveDate,
    pub calendar: Vec<CalendarEvent>,
    pub reminders: Vec<Reminder>,
    pub gantt: Vec<GanttTask>,
    pub kanban: Vec<KanbanColumn>,
}

pub(crate) async fn compute_handler(
    State(engine): State<Arc<RiskEngine>>,
    axum::Json(request): axum::Json<ComputeRequest>,
) -> Response {
    let bundle = engine.compute_with(&request.into_context());
    (StatusCode::OK, axum::Json(bundle)).into_response()
}

pub(crate) async fn export_plan_handler(
    State(engine): State<Arc<RiskEngine>>,
    axum::Json(request): axum::Json<ComputeRequest>,
) -> Response {
    let bundle = engine.compute_with(&request.into_context());
    match export::plan_to_csv(&bundle.plan) {
        Ok(body) => csv_response(body, "plan-action.csv"),
        Err(error) => AppError::from(error).into_response(),
    }
}

pub(crate) async fn schedule_handler(
    State(engine): State<Arc<RiskEngine>>,
    axum::Json(request): axum::Json<ScheduleRequest>,
) -> Response {
    let start = request.start.unwrap_or_else(|| Utc::now().date_naive());
    let bundle = engine.compute_with(&request.compute.into_context());
    let view = ScheduleView {
        start,
        calendar: schedule::calendar(&bundle.plan, start),
        reminders: schedule::reminders(&bundle.plan, start),
        gantt: schedule::gantt(&bundle.plan, start),
        kanban: schedule::kanban(&bundle.plan),
    };
    (StatusCode::OK, axum::Json(view)).into_response()
}

pub(crate) async fn document_handler(
    State(engine): State<Arc<RiskEngine>>,
    axum::Json(request): axum::Json<DocumentRequest>,
) -> Response {
    match engine.generate_document(request) {
        Ok(document) => (StatusCode::CREATED, axum::Json(document)).into_response(),
        Err(error) => {
            let payload = json!({
                "error": error.to_string(),
            });
            (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(payload)).into_response()
        }
    }
}

pub(crate) async fn export_document_handler(
    State(engine): State<Arc<RiskEngine>>,
    axum::Json(request): axum::Json<DocumentRequest>,
) -> Response {
    let document = match engine.generate_document(request) {
        Ok(document) => document,
        Err(error) => {
            let payload = json!({
                "error": error.to_string(),
            });
            return (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(payload)).into_response();
        }
    };

    match export::document_to_csv(&document, &engine.plan_builder()) {
        Ok(body) => csv_response(body, &format!("{}.csv", document.id)),
        Err(error) => AppError::from(error).into_response(),
    }
}

pub(crate) async fn sector_handler(
    State(engine): State<Arc<RiskEngine>>,
    Path(code): Path<String>,
) -> Response {
    match engine.catalog().sector_profile(&code) {
        Some(profile) => (StatusCode::OK, axum::Json(profile.clone())).into_response(),
        None => {
            let payload = json!({
                "error": format!("no sector profile for '{code}'"),
                "default_risks": super::engine::DEFAULT_RISK_IDS,
            });
            (StatusCode::NOT_FOUND, axum::Json(payload)).into_response()
        }
    }
}

fn csv_response(body: String, file_name: &str) -> Response {
    let disposition = format!("attachment; filename=\"{file_name}\"");
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, mime::TEXT_CSV_UTF_8.as_ref().to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    )
        .into_response()
}
