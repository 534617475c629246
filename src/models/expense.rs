//! Expense record model and related types.
//!
//! This module defines the ExpenseRecord struct representing one spend
//! event, used both standalone and as a claim line item.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// How an expense was paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMode {
    /// Paid in cash.
    Cash,
    /// Paid by company or personal card.
    Card,
    /// Paid via UPI transfer.
    Upi,
    /// Paid by bank transfer.
    BankTransfer,
}

/// Lifecycle status of an expense record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpenseStatus {
    /// Recorded but not yet decided.
    Pending,
    /// Approved for reimbursement.
    Approved,
    /// Rejected; will not be reimbursed.
    Rejected,
    /// Reimbursed. A paid record is immutable.
    Paid,
}

/// One spend event.
///
/// Expense records are snapshot into claims at submission time and carry
/// the fields the policy engine evaluates: amount, date, category, and
/// receipt reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseRecord {
    /// Unique identifier for the record.
    pub id: String,
    /// The employee who incurred the expense.
    pub employee_id: String,
    /// The expense category (must exist in the policy configuration).
    pub category: String,
    /// The amount spent. Positive; validated at claim submission.
    pub amount: Decimal,
    /// The date the expense was incurred.
    pub date: NaiveDate,
    /// How the expense was paid.
    pub payment_mode: PaymentMode,
    /// Optional project the spend is billed against.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_code: Option<String>,
    /// Optional link to the uploaded receipt.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receipt_url: Option<String>,
    /// Lifecycle status of the record.
    pub status: ExpenseStatus,
}

impl ExpenseRecord {
    /// Returns true if the record has a receipt attached.
    pub fn has_receipt(&self) -> bool {
        self.receipt_url.is_some()
    }
}
