//! HTTP API module for the expense engine.
//!
//! This module provides the REST endpoints for the advance, claim,
//! approval, and reporting workflows.

mod handlers;
mod request;
mod response;
mod state;

pub use handlers::create_router;
pub use request::{
    ApprovalActionRequest, ApproveAdvanceRequest, CommentRequest, CreateAdvanceRequest,
    LineItemRequest, PayClaimRequest, ReleaseAdvanceRequest, SettleAdvanceRequest,
    SubmitClaimRequest,
};
pub use response::{AdvanceResponse, ApiError, ClaimResponse, QueueResponse};
pub use state::AppState;
