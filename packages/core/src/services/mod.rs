//! Business Services
//!
//! This module contains the migration service:
//!
//! - `RuleMigrator` - one-shot copy of legacy rules into the
//!   pack-namespaced collection
//!
//! Services coordinate between the database layer and domain models,
//! implementing the migration's fail-fast, no-rollback policy.

pub mod error;
pub mod rule_migration;

pub use error::MigrationError;
pub use rule_migration::RuleMigrator;
