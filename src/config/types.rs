//! Configuration types for expense policy and stage routing.
//!
//! This module contains the strongly-typed configuration structures that
//! are deserialized from YAML configuration files.

use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;

use crate::models::{ClaimKind, Stage};

/// Metadata about the portal the policy belongs to.
#[derive(Debug, Clone, Deserialize)]
pub struct PolicyMetadata {
    /// The human-readable portal name.
    pub name: String,
    /// The version or effective date of the policy.
    pub version: String,
    /// The ISO currency code amounts are denominated in.
    pub currency: String,
}

/// The policy rules for one expense category.
#[derive(Debug, Clone, Deserialize)]
pub struct PolicyRule {
    /// Maximum spend per record per day before a violation is flagged.
    pub limit_per_day: Decimal,
    /// Maximum spend per category per calendar month.
    pub limit_per_month: Decimal,
    /// Whether records in this category must carry a receipt.
    pub requires_receipt: bool,
    /// Whether claims in this category may omit line items and declare a
    /// manual total. Only honoured for non-advance claims.
    #[serde(default)]
    pub line_items_optional: bool,
}

/// Policy configuration file structure (`policy.yaml`).
#[derive(Debug, Clone, Deserialize)]
pub struct PolicyFile {
    /// Portal metadata.
    pub portal: PolicyMetadata,
    /// Map of category name to its policy rule.
    pub categories: HashMap<String, PolicyRule>,
}

/// Stage routing rules.
#[derive(Debug, Clone, Deserialize)]
pub struct RoutingRules {
    /// Non-advance claims at or below this amount skip the Finance stage.
    pub finance_threshold: Decimal,
}

/// Routing configuration file structure (`routing.yaml`).
#[derive(Debug, Clone, Deserialize)]
pub struct RoutingFile {
    /// Stage routing rules.
    pub routing: RoutingRules,
}

/// The complete expense configuration loaded from YAML files.
#[derive(Debug, Clone)]
pub struct ExpenseConfig {
    metadata: PolicyMetadata,
    categories: HashMap<String, PolicyRule>,
    routing: RoutingRules,
}

impl ExpenseConfig {
    /// Creates a new ExpenseConfig from its component parts.
    pub fn new(
        metadata: PolicyMetadata,
        categories: HashMap<String, PolicyRule>,
        routing: RoutingRules,
    ) -> Self {
        Self {
            metadata,
            categories,
            routing,
        }
    }

    /// Returns the portal metadata.
    pub fn metadata(&self) -> &PolicyMetadata {
        &self.metadata
    }

    /// Returns all category rules.
    pub fn categories(&self) -> &HashMap<String, PolicyRule> {
        &self.categories
    }

    /// Returns the routing rules.
    pub fn routing(&self) -> &RoutingRules {
        &self.routing
    }

    /// Computes the required approval stages for a claim.
    ///
    /// Every claim visits Manager then HR. Finance is appended for
    /// advance-settlement claims and for any claim whose total exceeds
    /// the configured finance threshold; low-value non-advance claims
    /// therefore skip Finance. The result is fixed on the claim at
    /// submission and never recomputed.
    pub fn required_stages(&self, kind: ClaimKind, total_expense: Decimal) -> Vec<Stage> {
        let mut stages = vec![Stage::Manager, Stage::Hr];
        if kind == ClaimKind::AdvanceSettlement || total_expense > self.routing.finance_threshold {
            stages.push(Stage::Finance);
        }
        stages
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn make_config() -> ExpenseConfig {
        let mut categories = HashMap::new();
        categories.insert(
            "Meals".to_string(),
            PolicyRule {
                limit_per_day: dec("1000"),
                limit_per_month: dec("12000"),
                requires_receipt: true,
                line_items_optional: false,
            },
        );
        ExpenseConfig::new(
            PolicyMetadata {
                name: "HR Expense Portal".to_string(),
                version: "2026-04-01".to_string(),
                currency: "INR".to_string(),
            },
            categories,
            RoutingRules {
                finance_threshold: dec("2000"),
            },
        )
    }

    #[test]
    fn test_low_value_non_advance_skips_finance() {
        let config = make_config();
        let stages = config.required_stages(ClaimKind::NonAdvance, dec("1500"));
        assert_eq!(stages, vec![Stage::Manager, Stage::Hr]);
    }

    #[test]
    fn test_threshold_is_boundary_inclusive() {
        let config = make_config();
        let stages = config.required_stages(ClaimKind::NonAdvance, dec("2000"));
        assert_eq!(stages, vec![Stage::Manager, Stage::Hr]);
    }

    #[test]
    fn test_high_value_non_advance_includes_finance() {
        let config = make_config();
        let stages = config.required_stages(ClaimKind::NonAdvance, dec("2000.01"));
        assert_eq!(stages, vec![Stage::Manager, Stage::Hr, Stage::Finance]);
    }

    #[test]
    fn test_advance_settlement_always_includes_finance() {
        let config = make_config();
        let stages = config.required_stages(ClaimKind::AdvanceSettlement, dec("100"));
        assert_eq!(stages, vec![Stage::Manager, Stage::Hr, Stage::Finance]);
    }

    #[test]
    fn test_line_items_optional_defaults_to_false() {
        let yaml = r#"
limit_per_day: "1000"
limit_per_month: "12000"
requires_receipt: true
"#;
        let rule: PolicyRule = serde_yaml::from_str(yaml).unwrap();
        assert!(!rule.line_items_optional);
    }
}
