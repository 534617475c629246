//! Error types for the expense engine.
//!
//! This module provides strongly-typed errors using the `thiserror` crate
//! for all failure conditions in the advance, claim, and policy workflows.

use thiserror::Error;

/// The main error type for the expense engine.
///
/// All operations in the engine return this error type, making it easy
/// to handle errors consistently throughout the application. Every variant
/// carries enough context (entity id, current status, attempted action) to
/// render an actionable message upstream.
///
/// # Example
///
/// ```
/// use expense_engine::error::EngineError;
///
/// let error = EngineError::AdvanceNotFound {
///     id: "adv_missing".to_string(),
/// };
/// assert_eq!(error.to_string(), "Advance not found: adv_missing");
/// ```
#[derive(Debug, Error)]
pub enum EngineError {
    /// Configuration file was not found at the specified path.
    #[error("Configuration file not found: {path}")]
    ConfigNotFound {
        /// The path that was not found.
        path: String,
    },

    /// Configuration file could not be parsed.
    #[error("Failed to parse configuration file '{path}': {message}")]
    ConfigParseError {
        /// The path to the file that failed to parse.
        path: String,
        /// A description of the parse error.
        message: String,
    },

    /// A policy rule was malformed (e.g. negative limits).
    ///
    /// Raised at configuration-load time only; a service with an invalid
    /// policy must refuse to start rather than fail per request.
    #[error("Invalid policy configuration for '{scope}': {message}")]
    InvalidPolicy {
        /// The category or config section that was invalid.
        scope: String,
        /// A description of what made it invalid.
        message: String,
    },

    /// An expense category was not present in the policy configuration.
    #[error("Expense category not found: {name}")]
    CategoryNotFound {
        /// The category name that was not found.
        name: String,
    },

    /// A referenced advance does not exist.
    #[error("Advance not found: {id}")]
    AdvanceNotFound {
        /// The advance id that was not found.
        id: String,
    },

    /// A referenced claim does not exist.
    #[error("Claim not found: {id}")]
    ClaimNotFound {
        /// The claim id that was not found.
        id: String,
    },

    /// A referenced approval item does not exist.
    #[error("Approval item not found: {id}")]
    ApprovalNotFound {
        /// The approval item id that was not found.
        id: String,
    },

    /// Input was malformed or inconsistent (amount sign, sum mismatch,
    /// missing or incompatible reference). The entity is left unmodified
    /// and the caller may retry with corrected input.
    #[error("Validation failed for {entity}: {message}")]
    Validation {
        /// The entity the input belonged to ("advance", "claim", ...).
        entity: String,
        /// A description of the validation failure.
        message: String,
    },

    /// The requested operation is not legal for the entity's current
    /// status. State is left unchanged; the caller may query current state
    /// and retry.
    #[error("Invalid transition for {entity} '{id}': cannot {attempted} while {current}")]
    InvalidTransition {
        /// The entity kind ("advance", "claim", "approval").
        entity: String,
        /// The id of the entity.
        id: String,
        /// The entity's current status.
        current: String,
        /// The action that was attempted.
        attempted: String,
    },
}

/// A type alias for Results that return EngineError.
pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_not_found_displays_path() {
        let error = EngineError::ConfigNotFound {
            path: "/missing/file.yaml".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Configuration file not found: /missing/file.yaml"
        );
    }

    #[test]
    fn test_config_parse_error_displays_path_and_message() {
        let error = EngineError::ConfigParseError {
            path: "/config/bad.yaml".to_string(),
            message: "invalid YAML syntax".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Failed to parse configuration file '/config/bad.yaml': invalid YAML syntax"
        );
    }

    #[test]
    fn test_invalid_policy_displays_scope() {
        let error = EngineError::InvalidPolicy {
            scope: "Meals".to_string(),
            message: "limit_per_day must not be negative".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Invalid policy configuration for 'Meals': limit_per_day must not be negative"
        );
    }

    #[test]
    fn test_category_not_found_displays_name() {
        let error = EngineError::CategoryNotFound {
            name: "Entertainment".to_string(),
        };
        assert_eq!(error.to_string(), "Expense category not found: Entertainment");
    }

    #[test]
    fn test_validation_displays_entity_and_message() {
        let error = EngineError::Validation {
            entity: "claim".to_string(),
            message: "line item total 4700 does not match declared total 4600".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Validation failed for claim: line item total 4700 does not match declared total 4600"
        );
    }

    #[test]
    fn test_invalid_transition_displays_full_context() {
        let error = EngineError::InvalidTransition {
            entity: "advance".to_string(),
            id: "adv_001".to_string(),
            current: "requested".to_string(),
            attempted: "settle".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Invalid transition for advance 'adv_001': cannot settle while requested"
        );
    }

    #[test]
    fn test_errors_implement_std_error() {
        fn assert_error<T: std::error::Error>() {}
        assert_error::<EngineError>();
    }

    #[test]
    fn test_error_propagation_with_question_mark() {
        fn returns_not_found() -> EngineResult<()> {
            Err(EngineError::ClaimNotFound {
                id: "clm_x".to_string(),
            })
        }

        fn propagates_error() -> EngineResult<()> {
            returns_not_found()?;
            Ok(())
        }

        assert!(propagates_error().is_err());
    }
}
