//! Service Layer Error Types
//!
//! This module defines error types for the migration service, providing
//! detailed error handling with proper error chaining.

use crate::db::DatabaseError;
use crate::models::ValidationError;
use thiserror::Error;

/// Migration operation errors
///
/// The migration never recovers from any of these: the first error
/// terminates the run, leaving already-migrated rules in place.
#[derive(Error, Debug)]
pub enum MigrationError {
    /// A legacy record is missing a field the namespaced shape requires
    #[error("Legacy rule {id} cannot be migrated: {source}")]
    InvalidLegacyRule {
        id: String,
        source: ValidationError,
    },

    /// Database operation failed
    #[error("Database operation failed: {0}")]
    DatabaseError(#[from] DatabaseError),

    /// Store read or write failed
    #[error("Store operation failed: {0}")]
    StoreError(#[from] anyhow::Error),
}

impl MigrationError {
    /// Create an invalid legacy rule error
    pub fn invalid_legacy_rule(id: impl Into<String>, source: ValidationError) -> Self {
        Self::InvalidLegacyRule {
            id: id.into(),
            source,
        }
    }
}
