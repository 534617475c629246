//! HTTP request handlers for the expense engine API.
//!
//! This module contains the handler functions for all advance, claim,
//! approval, and reporting endpoints.

use axum::{
    Json, Router,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::{NaiveDate, Utc};
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::EngineResult;
use crate::models::Stage;
use crate::report;

use super::request::{
    ApprovalActionRequest, ApproveAdvanceRequest, CommentRequest, CreateAdvanceRequest,
    PayClaimRequest, ReleaseAdvanceRequest, SettleAdvanceRequest, SubmitClaimRequest,
};
use super::response::{AdvanceResponse, ApiError, ApiErrorResponse, ClaimResponse, QueueResponse};
use super::state::AppState;

/// Creates the API router with all endpoints.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/advances", post(create_advance))
        .route("/advances/:id", get(get_advance))
        .route("/advances/:id/approve", post(approve_advance))
        .route("/advances/:id/release", post(release_advance))
        .route("/advances/:id/settle", post(settle_advance))
        .route("/advances/:id/close", post(close_advance))
        .route("/claims", post(submit_claim))
        .route("/claims/:id", get(get_claim))
        .route("/claims/:id/comments", post(add_comment))
        .route("/claims/:id/pay", post(pay_claim))
        .route("/approvals/:id/action", post(approval_action))
        .route("/queues/:stage", get(stage_queue))
        .route("/overview", get(overview_report))
        .with_state(state)
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// Unwraps a JSON payload, turning rejections into error responses.
fn parse_payload<T>(
    payload: Result<Json<T>, JsonRejection>,
    correlation_id: Uuid,
) -> Result<T, Response> {
    match payload {
        Ok(Json(request)) => Ok(request),
        Err(rejection) => {
            let error = match rejection {
                JsonRejection::JsonDataError(err) => {
                    // The body text carries the detailed error from serde.
                    let body_text = err.body_text();
                    warn!(
                        correlation_id = %correlation_id,
                        error = %body_text,
                        "JSON data error"
                    );
                    if body_text.contains("missing field") {
                        ApiError::new("VALIDATION_ERROR", body_text)
                    } else {
                        ApiError::malformed_json(body_text)
                    }
                }
                JsonRejection::JsonSyntaxError(err) => {
                    warn!(
                        correlation_id = %correlation_id,
                        error = %err,
                        "JSON syntax error"
                    );
                    ApiError::malformed_json(format!("Invalid JSON syntax: {}", err))
                }
                JsonRejection::MissingJsonContentType(_) => {
                    ApiError::new("MISSING_CONTENT_TYPE", "Content-Type must be application/json")
                }
                _ => ApiError::malformed_json("Failed to parse request body"),
            };
            Err((StatusCode::BAD_REQUEST, Json(error)).into_response())
        }
    }
}

/// Serializes an engine result, mapping errors to their status codes.
fn respond<T: serde::Serialize>(
    result: EngineResult<T>,
    success: StatusCode,
    correlation_id: Uuid,
) -> Response {
    match result {
        Ok(value) => (success, Json(value)).into_response(),
        Err(err) => {
            warn!(correlation_id = %correlation_id, error = %err, "Request failed");
            ApiErrorResponse::from(err).into_response()
        }
    }
}

/// Handler for `POST /advances`.
async fn create_advance(
    State(state): State<AppState>,
    payload: Result<Json<CreateAdvanceRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let request = match parse_payload(payload, correlation_id) {
        Ok(request) => request,
        Err(response) => return response,
    };

    info!(
        correlation_id = %correlation_id,
        employee_id = %request.employee_id,
        amount = %request.requested_amount,
        "Creating advance"
    );
    let result = state
        .ledger()
        .create(
            &request.employee_id,
            request.requested_amount,
            &request.purpose,
            request.mode,
            today(),
        )
        .map(|advance| AdvanceResponse::enrich(advance, state.directory()));
    respond(result, StatusCode::CREATED, correlation_id)
}

/// Handler for `GET /advances/:id`.
async fn get_advance(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let correlation_id = Uuid::new_v4();
    let result = state
        .ledger()
        .get(&id)
        .map(|advance| AdvanceResponse::enrich(advance, state.directory()));
    respond(result, StatusCode::OK, correlation_id)
}

/// Handler for `POST /advances/:id/approve`.
async fn approve_advance(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<ApproveAdvanceRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let request = match parse_payload(payload, correlation_id) {
        Ok(request) => request,
        Err(response) => return response,
    };

    info!(correlation_id = %correlation_id, advance_id = %id, approver = %request.approver_id, "Approving advance");
    let result = state
        .ledger()
        .approve(&id, &request.approver_id)
        .map(|advance| AdvanceResponse::enrich(advance, state.directory()));
    respond(result, StatusCode::OK, correlation_id)
}

/// Handler for `POST /advances/:id/release`.
async fn release_advance(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<ReleaseAdvanceRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let request = match parse_payload(payload, correlation_id) {
        Ok(request) => request,
        Err(response) => return response,
    };

    info!(correlation_id = %correlation_id, advance_id = %id, amount = %request.released_amount, "Releasing advance");
    let result = state
        .ledger()
        .release(&id, request.released_amount)
        .map(|advance| AdvanceResponse::enrich(advance, state.directory()));
    respond(result, StatusCode::OK, correlation_id)
}

/// Handler for `POST /advances/:id/settle`.
async fn settle_advance(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<SettleAdvanceRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let request = match parse_payload(payload, correlation_id) {
        Ok(request) => request,
        Err(response) => return response,
    };

    info!(correlation_id = %correlation_id, advance_id = %id, actual = %request.actual_expense, "Settling advance");
    let result = state
        .ledger()
        .settle(&id, request.actual_expense, today())
        .map(|advance| AdvanceResponse::enrich(advance, state.directory()));
    respond(result, StatusCode::OK, correlation_id)
}

/// Handler for `POST /advances/:id/close`.
async fn close_advance(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let correlation_id = Uuid::new_v4();
    info!(correlation_id = %correlation_id, advance_id = %id, "Closing advance");
    let result = state
        .ledger()
        .close(&id)
        .map(|advance| AdvanceResponse::enrich(advance, state.directory()));
    respond(result, StatusCode::OK, correlation_id)
}

/// Handler for `POST /claims`.
async fn submit_claim(
    State(state): State<AppState>,
    payload: Result<Json<SubmitClaimRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let request = match parse_payload(payload, correlation_id) {
        Ok(request) => request,
        Err(response) => return response,
    };

    info!(
        correlation_id = %correlation_id,
        employee_id = %request.employee_id,
        total = %request.total_expense,
        line_items = request.line_items.len(),
        "Submitting claim"
    );
    let result = state
        .router()
        .submit(request.into_draft(today()))
        .map(|claim| ClaimResponse::enrich(claim, state.directory()));
    respond(result, StatusCode::CREATED, correlation_id)
}

/// Handler for `GET /claims/:id`.
async fn get_claim(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let correlation_id = Uuid::new_v4();
    let result = state
        .router()
        .get(&id)
        .map(|claim| ClaimResponse::enrich(claim, state.directory()));
    respond(result, StatusCode::OK, correlation_id)
}

/// Handler for `POST /claims/:id/comments`.
async fn add_comment(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<CommentRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let request = match parse_payload(payload, correlation_id) {
        Ok(request) => request,
        Err(response) => return response,
    };

    let result = state
        .router()
        .comment(&id, &request.from, &request.message, today())
        .map(|claim| ClaimResponse::enrich(claim, state.directory()));
    respond(result, StatusCode::OK, correlation_id)
}

/// Handler for `POST /claims/:id/pay`.
async fn pay_claim(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<PayClaimRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let request = match parse_payload(payload, correlation_id) {
        Ok(request) => request,
        Err(response) => return response,
    };

    info!(correlation_id = %correlation_id, claim_id = %id, actor = %request.actor_id, "Paying claim");
    let result = state
        .router()
        .mark_paid(&id, &request.actor_id, today())
        .map(|claim| ClaimResponse::enrich(claim, state.directory()));
    respond(result, StatusCode::OK, correlation_id)
}

/// Handler for `POST /approvals/:id/action`.
async fn approval_action(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<ApprovalActionRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let request = match parse_payload(payload, correlation_id) {
        Ok(request) => request,
        Err(response) => return response,
    };

    info!(
        correlation_id = %correlation_id,
        approval_id = %id,
        actor = %request.actor_id,
        decision = ?request.decision,
        "Recording approval decision"
    );
    let result = state
        .router()
        .act(&id, request.decision, &request.actor_id, request.comment, today())
        .map(|claim| ClaimResponse::enrich(claim, state.directory()));
    respond(result, StatusCode::OK, correlation_id)
}

/// Handler for `GET /queues/:stage`.
async fn stage_queue(State(state): State<AppState>, Path(stage): Path<String>) -> Response {
    let correlation_id = Uuid::new_v4();
    let stage: Stage = match stage.parse() {
        Ok(stage) => stage,
        Err(message) => {
            warn!(correlation_id = %correlation_id, error = %message, "Unknown queue stage");
            return (
                StatusCode::BAD_REQUEST,
                Json(ApiError::new("VALIDATION_ERROR", message)),
            )
                .into_response();
        }
    };

    let response = QueueResponse {
        stage: stage.to_string(),
        items: state.router().queue(stage),
    };
    (StatusCode::OK, Json(response)).into_response()
}

/// Handler for `GET /overview`.
async fn overview_report(State(state): State<AppState>) -> Response {
    let advances = state.ledger().snapshot();
    let claims = state.router().snapshot();
    let report = report::overview(&advances, &claims, state.directory());
    (StatusCode::OK, Json(report)).into_response()
}
