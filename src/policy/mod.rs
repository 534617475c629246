//! Policy evaluation for expense records.
//!
//! This module contains the pure rule functions that flag policy
//! violations on expense records: daily and monthly category limits,
//! missing receipts, and duplicate spend. Evaluation has no side effects
//! and is idempotent: calling twice on identical input yields identical
//! flags. Malformed rules (negative limits) are rejected when the
//! configuration is loaded, never here.

use chrono::Datelike;
use rust_decimal::Decimal;

use crate::config::{ConfigLoader, PolicyRule};
use crate::error::EngineResult;
use crate::models::ExpenseRecord;

/// Flag raised when a record exceeds its category's daily limit.
pub const FLAG_OVER_LIMIT: &str = "Exceeds Category Limit";

/// Flag raised when a receipt-required category record has no receipt.
pub const FLAG_RECEIPT_MISSING: &str = "Receipt Missing";

/// Flag raised when a sibling record shares amount, date, and category.
pub const FLAG_DUPLICATE: &str = "Duplicate Expense";

/// Flag raised when same-month category spend exceeds the monthly limit.
pub const FLAG_OVER_MONTHLY: &str = "Exceeds Monthly Limit";

/// Evaluates one expense record against its category rule.
///
/// `siblings` is the set of records the duplicate and monthly-limit rules
/// consider; the record itself may be present in it (entries with the
/// record's own id are ignored for duplicate detection).
///
/// Spending exactly at a limit passes: the daily rule fires only when
/// `amount > limit_per_day`, and the monthly rule only when accumulated
/// same-month spend in the category exceeds `limit_per_month`.
///
/// # Example
///
/// ```
/// use expense_engine::config::PolicyRule;
/// use expense_engine::models::{ExpenseRecord, ExpenseStatus, PaymentMode};
/// use expense_engine::policy::{FLAG_OVER_LIMIT, evaluate};
/// use chrono::NaiveDate;
/// use rust_decimal::Decimal;
///
/// let rule = PolicyRule {
///     limit_per_day: Decimal::new(1000, 0),
///     limit_per_month: Decimal::new(12000, 0),
///     requires_receipt: false,
///     line_items_optional: false,
/// };
/// let record = ExpenseRecord {
///     id: "exp_001".to_string(),
///     employee_id: "emp_001".to_string(),
///     category: "Meals".to_string(),
///     amount: Decimal::new(1200, 0),
///     date: NaiveDate::from_ymd_opt(2026, 3, 12).unwrap(),
///     payment_mode: PaymentMode::Cash,
///     project_code: None,
///     receipt_url: None,
///     status: ExpenseStatus::Pending,
/// };
///
/// let flags = evaluate(&record, &rule, &[]);
/// assert_eq!(flags, vec![FLAG_OVER_LIMIT.to_string()]);
/// ```
pub fn evaluate(
    record: &ExpenseRecord,
    rule: &PolicyRule,
    siblings: &[ExpenseRecord],
) -> Vec<String> {
    let mut flags = Vec::new();

    if record.amount > rule.limit_per_day {
        flags.push(FLAG_OVER_LIMIT.to_string());
    }

    if rule.requires_receipt && !record.has_receipt() {
        flags.push(FLAG_RECEIPT_MISSING.to_string());
    }

    let duplicate = siblings.iter().any(|s| {
        s.id != record.id
            && s.employee_id == record.employee_id
            && s.amount == record.amount
            && s.date == record.date
            && s.category == record.category
    });
    if duplicate {
        flags.push(FLAG_DUPLICATE.to_string());
    }

    let monthly_spend: Decimal = siblings
        .iter()
        .filter(|s| {
            s.id != record.id
                && s.employee_id == record.employee_id
                && s.category == record.category
                && same_month(s, record)
        })
        .map(|s| s.amount)
        .sum::<Decimal>()
        + record.amount;
    if monthly_spend > rule.limit_per_month {
        flags.push(FLAG_OVER_MONTHLY.to_string());
    }

    flags
}

/// Evaluates every line item of a claim and merges the flags.
///
/// Each item is evaluated against its own category rule with the other
/// items as siblings. Flags are deduplicated, keeping first-occurrence
/// order, so a claim-level snapshot stays readable when several items
/// violate the same rule.
pub fn evaluate_line_items(
    items: &[ExpenseRecord],
    config: &ConfigLoader,
) -> EngineResult<Vec<String>> {
    let mut flags: Vec<String> = Vec::new();
    for item in items {
        let rule = config.rule(&item.category)?;
        for flag in evaluate(item, rule, items) {
            if !flags.contains(&flag) {
                flags.push(flag);
            }
        }
    }
    Ok(flags)
}

fn same_month(a: &ExpenseRecord, b: &ExpenseRecord) -> bool {
    a.date.year() == b.date.year() && a.date.month() == b.date.month()
}
