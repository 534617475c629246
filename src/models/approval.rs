//! Approval queue item model.
//!
//! Approval items are derived records owned by the claim router: one per
//! (claim, stage) pair that has reached that stage. They surface in the
//! manager/hr/finance buckets and are never edited by employees.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::claim::Stage;

/// Decision state of an approval item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalStatus {
    /// Awaiting a decision.
    Pending,
    /// Approved by the stage owner.
    Approved,
    /// Rejected by the stage owner.
    Rejected,
}

impl fmt::Display for ApprovalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ApprovalStatus::Pending => "pending",
            ApprovalStatus::Approved => "approved",
            ApprovalStatus::Rejected => "rejected",
        };
        write!(f, "{}", label)
    }
}

/// The decision an actor can take on a pending approval item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalDecision {
    /// Approve the claim at this stage.
    Approved,
    /// Reject the claim, terminating the workflow.
    Rejected,
}

impl From<ApprovalDecision> for ApprovalStatus {
    fn from(decision: ApprovalDecision) -> Self {
        match decision {
            ApprovalDecision::Approved => ApprovalStatus::Approved,
            ApprovalDecision::Rejected => ApprovalStatus::Rejected,
        }
    }
}

/// One pending decision at one approval stage for one claim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApprovalItem {
    /// Unique identifier for the queue entry.
    pub id: String,
    /// The claim awaiting a decision.
    pub claim_id: String,
    /// The employee who submitted the claim, for queue display.
    pub employee_id: String,
    /// The claimed amount, for queue display.
    pub amount: Decimal,
    /// The stage this entry belongs to.
    pub stage: Stage,
    /// Decision state.
    pub status: ApprovalStatus,
    /// Policy violations snapshot taken when the item was created. Never
    /// re-evaluated afterwards, for audit fidelity.
    pub policy_flags: Vec<String>,
    /// The date the item entered the queue.
    pub created_on: NaiveDate,
    /// The actor who decided the item, once decided.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decided_by: Option<String>,
}
