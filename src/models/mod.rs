//! Core data models for the expense engine.
//!
//! This module contains all the domain entities used throughout the
//! advance, claim, and approval workflows.

mod advance;
mod approval;
mod claim;
mod expense;

pub use advance::{Advance, AdvanceStatus, BalanceType, Settlement};
pub use approval::{ApprovalDecision, ApprovalItem, ApprovalStatus};
pub use claim::{AuditEntry, Claim, ClaimKind, ClaimStatus, Comment, Stage, TimelineEntry};
pub use expense::{ExpenseRecord, ExpenseStatus, PaymentMode};
