//! Rulespace Core Layer
//!
//! This crate provides the rule data model, the database layer, and the
//! one-shot pack namespacing migration for the Rulespace automation system.
//!
//! # Architecture
//!
//! - **Two rule shapes**: legacy rules (no pack namespace) and namespaced
//!   rules (pack + derived `pack.name` reference)
//! - **libsql**: Embedded SQLite-compatible database, JSON columns for
//!   flexible sub-documents (criteria, action, tags)
//! - **Single-pass migration**: fetch all legacy rules, transform, upsert
//!   by id into the namespaced collection
//!
//! # Modules
//!
//! - [`models`] - Data structures (Rule, LegacyRule, ResourceReference)
//! - [`services`] - Migration service (RuleMigrator)
//! - [`db`] - Database layer with libsql integration
//! - [`constants`] - Pack and table name constants

pub mod constants;
pub mod db;
pub mod models;
pub mod services;

// Re-export commonly used types
pub use constants::DEFAULT_PACK_NAME;
pub use db::{DatabaseService, RuleStore, TursoRuleStore};
pub use models::*;
pub use services::*;
