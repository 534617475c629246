//! Configuration loading and management for the expense engine.
//!
//! This module provides functionality to load expense policy
//! configuration from YAML files, including portal metadata, per-category
//! policy rules, and approval-stage routing.
//!
//! # Example
//!
//! ```no_run
//! use expense_engine::config::ConfigLoader;
//!
//! let config = ConfigLoader::load("./config/expense").unwrap();
//! println!("Loaded policy: {}", config.config().metadata().name);
//! ```

mod loader;
mod types;

pub use loader::ConfigLoader;
pub use types::{
    ExpenseConfig, PolicyFile, PolicyMetadata, PolicyRule, RoutingFile, RoutingRules,
};
