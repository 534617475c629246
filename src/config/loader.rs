//! Configuration loading functionality.
//!
//! This module provides the [`ConfigLoader`] type for loading expense
//! policy and routing configuration from YAML files. All validation
//! happens at load time: a service handed a malformed policy must refuse
//! to start rather than surface config errors per request.

use rust_decimal::Decimal;
use std::fs;
use std::path::Path;

use crate::error::{EngineError, EngineResult};
use crate::models::{ClaimKind, Stage};

use super::types::{ExpenseConfig, PolicyFile, PolicyRule, RoutingFile, RoutingRules};

/// Loads and provides access to expense policy configuration.
///
/// # Directory Structure
///
/// The configuration directory should have the following structure:
/// ```text
/// config/expense/
/// ├── policy.yaml   # Portal metadata + per-category policy rules
/// └── routing.yaml  # Approval-stage routing rules
/// ```
///
/// # Example
///
/// ```no_run
/// use expense_engine::config::ConfigLoader;
///
/// let loader = ConfigLoader::load("./config/expense").unwrap();
/// let rule = loader.rule("Meals").unwrap();
/// println!("Meals daily limit: {}", rule.limit_per_day);
/// ```
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    config: ExpenseConfig,
}

impl ConfigLoader {
    /// Loads configuration from the specified directory.
    ///
    /// Returns an error if any required file is missing, contains invalid
    /// YAML, or declares an invalid rule (negative limits or threshold).
    pub fn load<P: AsRef<Path>>(path: P) -> EngineResult<Self> {
        let path = path.as_ref();

        let policy_path = path.join("policy.yaml");
        let policy = Self::load_yaml::<PolicyFile>(&policy_path)?;

        let routing_path = path.join("routing.yaml");
        let routing = Self::load_yaml::<RoutingFile>(&routing_path)?;

        Self::validate(&policy, &routing.routing)?;

        let config = ExpenseConfig::new(policy.portal, policy.categories, routing.routing);
        Ok(Self { config })
    }

    /// Loads and parses a YAML file.
    fn load_yaml<T: serde::de::DeserializeOwned>(path: &Path) -> EngineResult<T> {
        let path_str = path.display().to_string();

        let content = fs::read_to_string(path).map_err(|_| EngineError::ConfigNotFound {
            path: path_str.clone(),
        })?;

        serde_yaml::from_str(&content).map_err(|e| EngineError::ConfigParseError {
            path: path_str,
            message: e.to_string(),
        })
    }

    /// Rejects malformed rules before the config is ever queried.
    fn validate(policy: &PolicyFile, routing: &RoutingRules) -> EngineResult<()> {
        for (category, rule) in &policy.categories {
            if rule.limit_per_day < Decimal::ZERO {
                return Err(EngineError::InvalidPolicy {
                    scope: category.clone(),
                    message: format!("limit_per_day must not be negative, got {}", rule.limit_per_day),
                });
            }
            if rule.limit_per_month < Decimal::ZERO {
                return Err(EngineError::InvalidPolicy {
                    scope: category.clone(),
                    message: format!(
                        "limit_per_month must not be negative, got {}",
                        rule.limit_per_month
                    ),
                });
            }
        }
        if routing.finance_threshold < Decimal::ZERO {
            return Err(EngineError::InvalidPolicy {
                scope: "routing".to_string(),
                message: format!(
                    "finance_threshold must not be negative, got {}",
                    routing.finance_threshold
                ),
            });
        }
        Ok(())
    }

    /// Returns the underlying expense configuration.
    pub fn config(&self) -> &ExpenseConfig {
        &self.config
    }

    /// Gets the policy rule for a category.
    ///
    /// Returns `CategoryNotFound` when the category is not configured.
    pub fn rule(&self, category: &str) -> EngineResult<&PolicyRule> {
        self.config
            .categories()
            .get(category)
            .ok_or_else(|| EngineError::CategoryNotFound {
                name: category.to_string(),
            })
    }

    /// Returns true when claims in the category may omit line items.
    pub fn line_items_optional(&self, category: &str) -> EngineResult<bool> {
        Ok(self.rule(category)?.line_items_optional)
    }

    /// Computes the required approval stages for a claim.
    pub fn required_stages(&self, kind: ClaimKind, total_expense: Decimal) -> Vec<Stage> {
        self.config.required_stages(kind, total_expense)
    }
}
