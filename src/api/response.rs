//! Response types for the expense engine API.
//!
//! This module defines the enriched entity responses, the error response
//! structures, and the mapping from engine errors to HTTP status codes.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use crate::directory::EmployeeDirectory;
use crate::error::EngineError;
use crate::models::{Advance, ApprovalItem, Claim};

/// An advance with directory enrichment for display.
#[derive(Debug, Clone, Serialize)]
pub struct AdvanceResponse {
    /// The advance record.
    #[serde(flatten)]
    pub advance: Advance,
    /// The employee's display name, when the directory knows them.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub employee_name: Option<String>,
}

impl AdvanceResponse {
    /// Enriches an advance with the employee's display name.
    pub fn enrich(advance: Advance, directory: &dyn EmployeeDirectory) -> Self {
        let employee_name = directory.name(&advance.employee_id);
        Self {
            advance,
            employee_name,
        }
    }
}

/// A claim with directory enrichment for display.
#[derive(Debug, Clone, Serialize)]
pub struct ClaimResponse {
    /// The claim record.
    #[serde(flatten)]
    pub claim: Claim,
    /// The employee's display name, when the directory knows them.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub employee_name: Option<String>,
}

impl ClaimResponse {
    /// Enriches a claim with the employee's display name.
    pub fn enrich(claim: Claim, directory: &dyn EmployeeDirectory) -> Self {
        let employee_name = directory.name(&claim.employee_id);
        Self {
            claim,
            employee_name,
        }
    }
}

/// One stage bucket of the approval queue.
#[derive(Debug, Clone, Serialize)]
pub struct QueueResponse {
    /// The stage the bucket belongs to.
    pub stage: String,
    /// Pending items, oldest first.
    pub items: Vec<ApprovalItem>,
}

/// API error response structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Error code for programmatic handling.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Optional details about the error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    /// Creates a new API error with details.
    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: Some(details.into()),
        }
    }

    /// Creates a malformed JSON error response.
    pub fn malformed_json(message: impl Into<String>) -> Self {
        Self::new("MALFORMED_JSON", message)
    }
}

/// API error with HTTP status code.
pub struct ApiErrorResponse {
    /// The HTTP status code.
    pub status: StatusCode,
    /// The error body.
    pub error: ApiError,
}

impl IntoResponse for ApiErrorResponse {
    fn into_response(self) -> Response {
        (self.status, Json(self.error)).into_response()
    }
}

impl From<EngineError> for ApiErrorResponse {
    fn from(error: EngineError) -> Self {
        match &error {
            EngineError::ConfigNotFound { .. }
            | EngineError::ConfigParseError { .. }
            | EngineError::InvalidPolicy { .. } => ApiErrorResponse {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                error: ApiError::with_details(
                    "CONFIG_ERROR",
                    "Configuration error",
                    error.to_string(),
                ),
            },
            EngineError::CategoryNotFound { name } => ApiErrorResponse {
                status: StatusCode::BAD_REQUEST,
                error: ApiError::with_details(
                    "CATEGORY_NOT_FOUND",
                    error.to_string(),
                    format!("The category '{}' is not configured for this portal", name),
                ),
            },
            EngineError::AdvanceNotFound { .. } => ApiErrorResponse {
                status: StatusCode::NOT_FOUND,
                error: ApiError::new("ADVANCE_NOT_FOUND", error.to_string()),
            },
            EngineError::ClaimNotFound { .. } => ApiErrorResponse {
                status: StatusCode::NOT_FOUND,
                error: ApiError::new("CLAIM_NOT_FOUND", error.to_string()),
            },
            EngineError::ApprovalNotFound { .. } => ApiErrorResponse {
                status: StatusCode::NOT_FOUND,
                error: ApiError::new("APPROVAL_NOT_FOUND", error.to_string()),
            },
            EngineError::Validation { .. } => ApiErrorResponse {
                status: StatusCode::BAD_REQUEST,
                error: ApiError::new("VALIDATION_ERROR", error.to_string()),
            },
            EngineError::InvalidTransition { .. } => ApiErrorResponse {
                status: StatusCode::CONFLICT,
                error: ApiError::new("INVALID_TRANSITION", error.to_string()),
            },
        }
    }
}
