//! Advance model and settlement arithmetic.
//!
//! This module defines the Advance struct representing a cash advance
//! issued ahead of spend, its strictly forward-moving lifecycle, and the
//! Settlement record produced when the advance is reconciled against
//! actual spend.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

use super::expense::PaymentMode;

/// Lifecycle status of an advance.
///
/// Transitions move strictly forward: Requested → Approved → Released →
/// Settled → Closed. Any other transition is rejected by the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdvanceStatus {
    /// Requested by the employee, awaiting approval.
    Requested,
    /// Approved, awaiting disbursement.
    Approved,
    /// Cash disbursed; spend may now be claimed against it.
    Released,
    /// Reconciled against actual spend.
    Settled,
    /// Closed after settlement. Terminal.
    Closed,
}

impl fmt::Display for AdvanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            AdvanceStatus::Requested => "requested",
            AdvanceStatus::Approved => "approved",
            AdvanceStatus::Released => "released",
            AdvanceStatus::Settled => "settled",
            AdvanceStatus::Closed => "closed",
        };
        write!(f, "{}", label)
    }
}

/// The direction of a settlement balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BalanceType {
    /// Allocated and actual spend were equal.
    Balanced,
    /// Allocated exceeded actual; the employee returns the difference.
    Refund,
    /// Actual exceeded allocated; the company recovers the shortfall.
    Recover,
}

/// The outcome of reconciling an advance against actual spend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settlement {
    /// The total actual spend reconciled against the advance.
    pub actual_expense: Decimal,
    /// The absolute difference between allocated and actual amounts.
    pub balance: Decimal,
    /// Which direction the balance flows.
    pub balance_type: BalanceType,
    /// The date the settlement was recorded.
    pub settled_on: NaiveDate,
}

impl Settlement {
    /// Computes a settlement from the allocated amount and actual spend.
    ///
    /// The balance is always non-negative: `|allocated − actual|`. The
    /// balance type is Balanced on equality, Refund when the allocation
    /// exceeded actual spend, and Recover when spend exceeded the
    /// allocation. Exactly one of the three holds.
    ///
    /// # Example
    ///
    /// ```
    /// use expense_engine::models::{BalanceType, Settlement};
    /// use chrono::NaiveDate;
    /// use rust_decimal::Decimal;
    ///
    /// let settled_on = NaiveDate::from_ymd_opt(2026, 3, 20).unwrap();
    /// let settlement = Settlement::compute(
    ///     Decimal::new(5000, 0),
    ///     Decimal::new(4600, 0),
    ///     settled_on,
    /// );
    /// assert_eq!(settlement.balance, Decimal::new(400, 0));
    /// assert_eq!(settlement.balance_type, BalanceType::Refund);
    /// ```
    pub fn compute(allocated: Decimal, actual_expense: Decimal, settled_on: NaiveDate) -> Self {
        let balance = (allocated - actual_expense).abs();
        let balance_type = match actual_expense.cmp(&allocated) {
            Ordering::Equal => BalanceType::Balanced,
            Ordering::Less => BalanceType::Refund,
            Ordering::Greater => BalanceType::Recover,
        };
        Self {
            actual_expense,
            balance,
            balance_type,
            settled_on,
        }
    }
}

/// A cash advance issued to an employee ahead of actual spend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Advance {
    /// Unique identifier for the advance.
    pub id: String,
    /// The employee the advance belongs to.
    pub employee_id: String,
    /// The amount originally requested. Positive.
    pub requested_amount: Decimal,
    /// The amount actually disbursed; set on release, never above the
    /// requested amount.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub released_amount: Option<Decimal>,
    /// Free-text purpose stated at request time.
    pub purpose: String,
    /// How the advance is disbursed.
    pub mode: PaymentMode,
    /// Current lifecycle status.
    pub status: AdvanceStatus,
    /// The approver who moved the advance to Approved.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approved_by: Option<String>,
    /// The date the advance was requested.
    pub requested_on: NaiveDate,
    /// Settlement outcome; present once the advance reaches Settled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settlement: Option<Settlement>,
}

impl Advance {
    /// Returns the effective allocation for settlement: the released
    /// amount, or the requested amount if the advance was never released.
    pub fn allocated_amount(&self) -> Decimal {
        self.released_amount.unwrap_or(self.requested_amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn make_date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn make_advance() -> Advance {
        Advance {
            id: "adv_001".to_string(),
            employee_id: "emp_001".to_string(),
            requested_amount: dec("5000"),
            released_amount: None,
            purpose: "Client visit travel".to_string(),
            mode: PaymentMode::BankTransfer,
            status: AdvanceStatus::Requested,
            approved_by: None,
            requested_on: make_date("2026-03-01"),
            settlement: None,
        }
    }

    /// SET-001: actual below allocation produces a refund balance.
    #[test]
    fn test_settlement_refund() {
        let settlement = Settlement::compute(dec("5000"), dec("4600"), make_date("2026-03-20"));
        assert_eq!(settlement.balance, dec("400"));
        assert_eq!(settlement.balance_type, BalanceType::Refund);
    }

    /// SET-002: actual above allocation produces a recovery balance.
    #[test]
    fn test_settlement_recover() {
        let settlement = Settlement::compute(dec("5000"), dec("5400"), make_date("2026-03-20"));
        assert_eq!(settlement.balance, dec("400"));
        assert_eq!(settlement.balance_type, BalanceType::Recover);
    }

    /// SET-003: equal amounts balance exactly.
    #[test]
    fn test_settlement_balanced() {
        let settlement = Settlement::compute(dec("5000"), dec("5000"), make_date("2026-03-20"));
        assert_eq!(settlement.balance, Decimal::ZERO);
        assert_eq!(settlement.balance_type, BalanceType::Balanced);
    }

    /// SET-004: fractional amounts keep exact decimal balances.
    #[test]
    fn test_settlement_fractional() {
        let settlement = Settlement::compute(dec("1250.50"), dec("1100.25"), make_date("2026-03-20"));
        assert_eq!(settlement.balance, dec("150.25"));
        assert_eq!(settlement.balance_type, BalanceType::Refund);
    }

    #[test]
    fn test_allocated_amount_prefers_released() {
        let mut advance = make_advance();
        assert_eq!(advance.allocated_amount(), dec("5000"));

        advance.released_amount = Some(dec("4500"));
        assert_eq!(advance.allocated_amount(), dec("4500"));
    }

    #[test]
    fn test_status_display_is_lowercase() {
        assert_eq!(AdvanceStatus::Requested.to_string(), "requested");
        assert_eq!(AdvanceStatus::Closed.to_string(), "closed");
    }

    #[test]
    fn test_advance_serialization_round_trip() {
        let mut advance = make_advance();
        advance.status = AdvanceStatus::Settled;
        advance.released_amount = Some(dec("5000"));
        advance.settlement = Some(Settlement::compute(
            dec("5000"),
            dec("5400"),
            make_date("2026-03-20"),
        ));

        let json = serde_json::to_string(&advance).unwrap();
        let deserialized: Advance = serde_json::from_str(&json).unwrap();
        assert_eq!(advance, deserialized);
    }

    #[test]
    fn test_unset_optionals_are_skipped() {
        let advance = make_advance();
        let json = serde_json::to_string(&advance).unwrap();
        assert!(!json.contains("released_amount"));
        assert!(!json.contains("approved_by"));
        assert!(!json.contains("settlement"));
    }

    #[test]
    fn test_balance_type_serialization() {
        assert_eq!(
            serde_json::to_string(&BalanceType::Refund).unwrap(),
            "\"refund\""
        );
        assert_eq!(
            serde_json::to_string(&BalanceType::Recover).unwrap(),
            "\"recover\""
        );
    }
}
