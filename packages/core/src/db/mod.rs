//! Database Layer
//!
//! This module handles all database interactions using libsql:
//!
//! - Database initialization and connection management
//! - Two rule tables: `rules` (legacy, no pack) and `pack_rules`
//!   (pack-namespaced, unique on `(pack, name)`)
//! - JSON columns for flexible sub-documents (criteria, action, tags)
//! - Storage escaping for criteria keys containing reserved characters
//!
//! The `RuleStore` trait is the seam between the migration service and
//! the concrete backend; `TursoRuleStore` is the libsql implementation.

pub mod database;
mod error;
mod escape;
mod rule_store;

pub use database::{
    DatabaseService, DbInsertLegacyRuleParams, DbUpsertRuleParams, LegacyRuleRow, PackRuleRow,
};
pub use error::DatabaseError;
pub use escape::{escape_chars, unescape_chars};
pub use rule_store::{RuleStore, TursoRuleStore};
