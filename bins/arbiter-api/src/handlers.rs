// HTTP route handlers for the Arbiter API

use arbiter_common::types::{ExecutionResponse, Language, TestCase};
use arbiter_harness::HarnessError;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteRequest {
    pub source_code: String,
    pub language: String,
    #[serde(default)]
    pub test_cases: Vec<TestCase>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LanguageEntry {
    pub name: String,
    pub backend_id: u32,
}

/// Map a rejected request to a status code and an empty `ExecutionResponse`
fn rejection(request_id: Uuid, err: HarnessError, total_tests: usize) -> Response {
    let status = match &err {
        HarnessError::Input(_) => StatusCode::BAD_REQUEST,
        HarnessError::Configuration(_) => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::BAD_GATEWAY,
    };
    warn!(request_id = %request_id, error = %err, "Request rejected");
    (status, Json(ExecutionResponse::rejected(total_tests, err.to_string()))).into_response()
}

/// POST /execute - Grade against the real backend
pub async fn execute(State(state): State<Arc<AppState>>, Json(payload): Json<ExecuteRequest>) -> Response {
    let request_id = Uuid::new_v4();
    info!(
        request_id = %request_id,
        language = %payload.language,
        test_cases = payload.test_cases.len(),
        "Execution requested"
    );

    match state
        .harness
        .execute_code(&payload.source_code, &payload.language, &payload.test_cases)
        .await
    {
        Ok(response) => {
            info!(
                request_id = %request_id,
                total_passed = response.total_passed,
                total_tests = response.total_tests,
                "Execution finished"
            );
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => rejection(request_id, e, payload.test_cases.len()),
    }
}

/// POST /execute/fallback - Simulated grading, never runs code
pub async fn execute_fallback(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ExecuteRequest>,
) -> Response {
    let request_id = Uuid::new_v4();
    match state
        .harness
        .execute_code_fallback(&payload.source_code, &payload.language, &payload.test_cases)
    {
        Ok(simulated) => {
            info!(request_id = %request_id, "Simulated grading returned");
            (StatusCode::OK, Json(simulated)).into_response()
        }
        Err(e) => rejection(request_id, e, payload.test_cases.len()),
    }
}

/// POST /grade - Real grading when the backend is healthy, simulation otherwise
pub async fn grade(State(state): State<Arc<AppState>>, Json(payload): Json<ExecuteRequest>) -> Response {
    let request_id = Uuid::new_v4();
    match state
        .harness
        .grade(&payload.source_code, &payload.language, &payload.test_cases)
        .await
    {
        Ok(report) => {
            info!(
                request_id = %request_id,
                simulated = report.is_simulated(),
                total_passed = report.response().total_passed,
                "Grading finished"
            );
            (StatusCode::OK, Json(report)).into_response()
        }
        Err(e) => rejection(request_id, e, payload.test_cases.len()),
    }
}

/// GET /health - Backend availability
pub async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let status = state.harness.health_check().await;
    let code = if status.available {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (code, Json(status))
}

/// GET /languages - Configured languages and their backend ids
pub async fn list_languages(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let languages = state.harness.languages();
    let entries: Vec<LanguageEntry> = Language::ALL
        .iter()
        .map(|&language| LanguageEntry {
            name: language.to_string(),
            backend_id: languages.backend_id(language),
        })
        .collect();
    Json(entries)
}
