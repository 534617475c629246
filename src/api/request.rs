//! Request types for the expense engine API.
//!
//! This module defines the JSON request structures for the advance,
//! claim, and approval endpoints, and their conversions into domain
//! types.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{ApprovalDecision, ClaimKind, ExpenseRecord, ExpenseStatus, PaymentMode};
use crate::router::ClaimDraft;

/// Request body for `POST /advances`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAdvanceRequest {
    /// The employee requesting the advance.
    pub employee_id: String,
    /// The amount requested.
    pub requested_amount: Decimal,
    /// Free-text purpose of the advance.
    pub purpose: String,
    /// How the advance should be disbursed.
    pub mode: PaymentMode,
}

/// Request body for `POST /advances/:id/approve`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApproveAdvanceRequest {
    /// The actor approving the advance.
    pub approver_id: String,
}

/// Request body for `POST /advances/:id/release`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReleaseAdvanceRequest {
    /// The amount to disburse.
    pub released_amount: Decimal,
}

/// Request body for `POST /advances/:id/settle`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettleAdvanceRequest {
    /// The total actual spend reconciled against the advance.
    pub actual_expense: Decimal,
}

/// One line item in a claim submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineItemRequest {
    /// The expense category of the line.
    pub category: String,
    /// The amount spent.
    pub amount: Decimal,
    /// The date the expense was incurred.
    pub date: NaiveDate,
    /// How the expense was paid.
    pub payment_mode: PaymentMode,
    /// Optional project the spend is billed against.
    #[serde(default)]
    pub project_code: Option<String>,
    /// Optional link to the uploaded receipt.
    #[serde(default)]
    pub receipt_url: Option<String>,
}

/// Request body for `POST /claims`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitClaimRequest {
    /// The employee submitting the claim.
    pub employee_id: String,
    /// Whether the claim stands alone or settles an advance.
    pub kind: ClaimKind,
    /// The claim-level expense category.
    pub category: String,
    /// The declared total.
    pub total_expense: Decimal,
    /// The advance being settled, for advance-settlement claims.
    #[serde(default)]
    pub against_advance: Option<String>,
    /// The spend events backing the claim.
    #[serde(default)]
    pub line_items: Vec<LineItemRequest>,
}

impl SubmitClaimRequest {
    /// Converts the request into a domain draft, assigning line item ids
    /// and stamping the submission date.
    pub fn into_draft(self, submitted_on: NaiveDate) -> ClaimDraft {
        let employee_id = self.employee_id;
        let line_items = self
            .line_items
            .into_iter()
            .map(|item| ExpenseRecord {
                id: Uuid::new_v4().to_string(),
                employee_id: employee_id.clone(),
                category: item.category,
                amount: item.amount,
                date: item.date,
                payment_mode: item.payment_mode,
                project_code: item.project_code,
                receipt_url: item.receipt_url,
                status: ExpenseStatus::Pending,
            })
            .collect();

        ClaimDraft {
            employee_id,
            kind: self.kind,
            category: self.category,
            total_expense: self.total_expense,
            against_advance: self.against_advance,
            line_items,
            submitted_on,
        }
    }
}

/// Request body for `POST /approvals/:id/action`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApprovalActionRequest {
    /// The decision to record.
    pub decision: ApprovalDecision,
    /// The actor making the decision.
    pub actor_id: String,
    /// Optional remarks recorded on the claim.
    #[serde(default)]
    pub comment: Option<String>,
}

/// Request body for `POST /claims/:id/comments`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentRequest {
    /// The author of the comment.
    pub from: String,
    /// The comment text.
    pub message: String,
}

/// Request body for `POST /claims/:id/pay`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayClaimRequest {
    /// The actor disbursing the reimbursement.
    pub actor_id: String,
}
