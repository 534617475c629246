//! Claim model: reimbursement requests and their approval history.
//!
//! A claim either stands alone (non-advance) or reconciles a previously
//! released advance. Its status walks a fixed stage sequence decided at
//! submission time and recorded on the claim itself.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::approval::ApprovalStatus;
use super::expense::ExpenseRecord;

/// The two kinds of reimbursement claims.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimKind {
    /// A standalone claim with no prior advance.
    NonAdvance,
    /// A claim reconciling exactly one previously released advance.
    AdvanceSettlement,
}

/// One approval stage in the fixed Manager → HR → Finance sequence.
///
/// The derived ordering follows declaration order, so stage comparisons
/// match the business sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Line-manager review, always first.
    Manager,
    /// HR review, always second.
    Hr,
    /// Finance review; skipped for low-value non-advance claims.
    Finance,
}

impl Stage {
    /// The full stage sequence in business order.
    pub const SEQUENCE: [Stage; 3] = [Stage::Manager, Stage::Hr, Stage::Finance];
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Stage::Manager => "Manager",
            Stage::Hr => "HR",
            Stage::Finance => "Finance",
        };
        write!(f, "{}", label)
    }
}

impl FromStr for Stage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "manager" => Ok(Stage::Manager),
            "hr" => Ok(Stage::Hr),
            "finance" => Ok(Stage::Finance),
            _ => Err(format!("Unknown approval stage: {}", s)),
        }
    }
}

/// Lifecycle status of a claim.
///
/// The portal's free-text stage labels are modelled as a closed enum so
/// that illegal transitions are unrepresentable; `Display` still renders
/// the portal wording.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimStatus {
    /// Awaiting the Manager stage decision.
    PendingManager,
    /// Awaiting the HR stage decision.
    PendingHr,
    /// Awaiting the Finance stage decision.
    PendingFinance,
    /// All required stages approved. Terminal for approval purposes.
    Approved,
    /// Rejected at some stage. Terminal.
    Rejected,
    /// Reimbursement disbursed. Terminal.
    Paid,
}

impl ClaimStatus {
    /// Returns the pending status for the given stage.
    pub fn pending(stage: Stage) -> Self {
        match stage {
            Stage::Manager => ClaimStatus::PendingManager,
            Stage::Hr => ClaimStatus::PendingHr,
            Stage::Finance => ClaimStatus::PendingFinance,
        }
    }

    /// Returns the stage currently awaiting a decision, if any.
    pub fn active_stage(&self) -> Option<Stage> {
        match self {
            ClaimStatus::PendingManager => Some(Stage::Manager),
            ClaimStatus::PendingHr => Some(Stage::Hr),
            ClaimStatus::PendingFinance => Some(Stage::Finance),
            _ => None,
        }
    }

    /// Returns true once the claim can no longer change approval state.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ClaimStatus::Approved | ClaimStatus::Rejected | ClaimStatus::Paid
        )
    }
}

impl fmt::Display for ClaimStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ClaimStatus::PendingManager => "Pending Manager Approval",
            ClaimStatus::PendingHr => "Pending HR Approval",
            ClaimStatus::PendingFinance => "Pending Finance Approval",
            ClaimStatus::Approved => "Approved",
            ClaimStatus::Rejected => "Rejected",
            ClaimStatus::Paid => "Paid",
        };
        write!(f, "{}", label)
    }
}

/// One completed stage decision in a claim's approval history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineEntry {
    /// The stage that was decided.
    pub stage: Stage,
    /// The actor who made the decision.
    pub owner: String,
    /// The decision outcome.
    pub status: ApprovalStatus,
    /// The date of the decision.
    pub date: NaiveDate,
    /// Optional remarks left with the decision.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remarks: Option<String>,
}

/// One append-only audit log entry on a claim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    /// What happened ("Claim Submitted", "Manager Approved", ...).
    pub action: String,
    /// Who did it.
    pub by: String,
    /// When it happened.
    pub date: NaiveDate,
}

/// One message in a claim's comment thread.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    /// The author of the comment.
    pub from: String,
    /// The comment text.
    pub message: String,
    /// The date the comment was left.
    pub date: NaiveDate,
}

/// A reimbursement request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claim {
    /// Unique identifier for the claim.
    pub id: String,
    /// The employee the claim belongs to.
    pub employee_id: String,
    /// Whether the claim stands alone or settles an advance.
    pub kind: ClaimKind,
    /// The claim-level expense category.
    pub category: String,
    /// Total claimed amount. Equals the line item sum when items exist.
    pub total_expense: Decimal,
    /// The advance being settled; required iff kind is AdvanceSettlement.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub against_advance: Option<String>,
    /// Amount still owed to the employee beyond the advance allocation.
    /// Always `max(0, total_expense − released_amount)` for settlement
    /// claims, zero for standalone ones at submission.
    pub pending_amount: Decimal,
    /// Current lifecycle status.
    pub status: ClaimStatus,
    /// The stage set computed at submission. Immutable afterwards.
    pub required_stages: Vec<Stage>,
    /// The spend events backing the claim.
    pub line_items: Vec<ExpenseRecord>,
    /// Completed stage decisions in stage order.
    pub approval_timeline: Vec<TimelineEntry>,
    /// Append-only log of everything done to the claim.
    pub audit_trail: Vec<AuditEntry>,
    /// Discussion thread on the claim.
    pub comments: Vec<Comment>,
    /// The date the claim was submitted.
    pub submitted_on: NaiveDate,
}

impl Claim {
    /// Returns the required stage following `stage`, if any.
    pub fn next_stage_after(&self, stage: Stage) -> Option<Stage> {
        self.required_stages
            .iter()
            .skip_while(|s| **s != stage)
            .nth(1)
            .copied()
    }
}
