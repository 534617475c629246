//! Reconciliation reporting over advances and claims.
//!
//! Read-only aggregation: overview KPIs, category and department
//! breakdowns, and a monthly advance-vs-actual comparison. Reports are
//! recomputed on demand from point-in-time store snapshots and never
//! cached beyond a single query.

use chrono::Datelike;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::directory::EmployeeDirectory;
use crate::models::{Advance, AdvanceStatus, Claim, ClaimStatus};

/// Claim counts by lifecycle bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClaimCounts {
    /// All claims.
    pub total: usize,
    /// Claims awaiting a stage decision.
    pub pending: usize,
    /// Fully approved claims (not yet paid).
    pub approved: usize,
    /// Rejected claims.
    pub rejected: usize,
    /// Paid claims.
    pub paid: usize,
}

/// Claim volume for one expense category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryBreakdown {
    /// The category name.
    pub category: String,
    /// Number of claims in the category.
    pub claim_count: usize,
    /// Sum of claimed totals in the category.
    pub total_expense: Decimal,
}

/// Claim volume for one department.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DepartmentBreakdown {
    /// The department name, or "Unassigned" for unknown employees.
    pub department: String,
    /// Number of claims from the department.
    pub claim_count: usize,
    /// Sum of claimed totals from the department.
    pub total_expense: Decimal,
}

/// Allocated versus actual spend for one settlement month.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyComparison {
    /// The settlement month, formatted YYYY-MM.
    pub month: String,
    /// Sum of allocated amounts settled in the month.
    pub allocated: Decimal,
    /// Sum of actual spend settled in the month.
    pub actual: Decimal,
}

/// The reconciliation overview served to dashboards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverviewReport {
    /// Claim counts by bucket.
    pub claims: ClaimCounts,
    /// Total released amount still outstanding (Released advances).
    pub outstanding_advance_total: Decimal,
    /// Total actual spend across settled and closed advances.
    pub settled_total: Decimal,
    /// Mean calendar days from submission to final decision, over
    /// decided claims. Absent when nothing has been decided.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_turnaround_days: Option<Decimal>,
    /// Claim volume per category, largest total first.
    pub category_breakdown: Vec<CategoryBreakdown>,
    /// Claim volume per department, largest total first.
    pub department_breakdown: Vec<DepartmentBreakdown>,
    /// Advance allocation versus actual spend per settlement month.
    pub monthly_comparison: Vec<MonthlyComparison>,
}

/// Builds the overview report from point-in-time snapshots.
pub fn overview(
    advances: &[Advance],
    claims: &[Claim],
    directory: &dyn EmployeeDirectory,
) -> OverviewReport {
    OverviewReport {
        claims: claim_counts(claims),
        outstanding_advance_total: advances
            .iter()
            .filter(|a| a.status == AdvanceStatus::Released)
            .map(|a| a.allocated_amount())
            .sum(),
        settled_total: advances
            .iter()
            .filter_map(|a| a.settlement.as_ref())
            .map(|s| s.actual_expense)
            .sum(),
        average_turnaround_days: average_turnaround_days(claims),
        category_breakdown: category_breakdown(claims),
        department_breakdown: department_breakdown(claims, directory),
        monthly_comparison: monthly_comparison(advances),
    }
}

fn claim_counts(claims: &[Claim]) -> ClaimCounts {
    let mut counts = ClaimCounts {
        total: claims.len(),
        pending: 0,
        approved: 0,
        rejected: 0,
        paid: 0,
    };
    for claim in claims {
        match claim.status {
            ClaimStatus::Approved => counts.approved += 1,
            ClaimStatus::Rejected => counts.rejected += 1,
            ClaimStatus::Paid => counts.paid += 1,
            _ => counts.pending += 1,
        }
    }
    counts
}

fn average_turnaround_days(claims: &[Claim]) -> Option<Decimal> {
    let turnarounds: Vec<Decimal> = claims
        .iter()
        .filter(|c| c.status.is_terminal())
        .filter_map(|c| {
            c.approval_timeline
                .last()
                .map(|entry| Decimal::from((entry.date - c.submitted_on).num_days()))
        })
        .collect();

    if turnarounds.is_empty() {
        return None;
    }
    let count = Decimal::from(turnarounds.len() as u64);
    Some(turnarounds.into_iter().sum::<Decimal>() / count)
}

fn category_breakdown(claims: &[Claim]) -> Vec<CategoryBreakdown> {
    let mut buckets: BTreeMap<String, (usize, Decimal)> = BTreeMap::new();
    for claim in claims {
        let bucket = buckets
            .entry(claim.category.clone())
            .or_insert((0, Decimal::ZERO));
        bucket.0 += 1;
        bucket.1 += claim.total_expense;
    }

    let mut breakdown: Vec<CategoryBreakdown> = buckets
        .into_iter()
        .map(|(category, (claim_count, total_expense))| CategoryBreakdown {
            category,
            claim_count,
            total_expense,
        })
        .collect();
    breakdown.sort_by(|a, b| b.total_expense.cmp(&a.total_expense));
    breakdown
}

fn department_breakdown(
    claims: &[Claim],
    directory: &dyn EmployeeDirectory,
) -> Vec<DepartmentBreakdown> {
    let mut buckets: BTreeMap<String, (usize, Decimal)> = BTreeMap::new();
    for claim in claims {
        let department = directory
            .department(&claim.employee_id)
            .unwrap_or_else(|| "Unassigned".to_string());
        let bucket = buckets.entry(department).or_insert((0, Decimal::ZERO));
        bucket.0 += 1;
        bucket.1 += claim.total_expense;
    }

    let mut breakdown: Vec<DepartmentBreakdown> = buckets
        .into_iter()
        .map(|(department, (claim_count, total_expense))| DepartmentBreakdown {
            department,
            claim_count,
            total_expense,
        })
        .collect();
    breakdown.sort_by(|a, b| b.total_expense.cmp(&a.total_expense));
    breakdown
}

fn monthly_comparison(advances: &[Advance]) -> Vec<MonthlyComparison> {
    let mut buckets: BTreeMap<String, (Decimal, Decimal)> = BTreeMap::new();
    for advance in advances {
        if let Some(settlement) = &advance.settlement {
            let month = format!(
                "{:04}-{:02}",
                settlement.settled_on.year(),
                settlement.settled_on.month()
            );
            let bucket = buckets
                .entry(month)
                .or_insert((Decimal::ZERO, Decimal::ZERO));
            bucket.0 += advance.allocated_amount();
            bucket.1 += settlement.actual_expense;
        }
    }

    buckets
        .into_iter()
        .map(|(month, (allocated, actual))| MonthlyComparison {
            month,
            allocated,
            actual,
        })
        .collect()
}
