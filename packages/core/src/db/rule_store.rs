//! RuleStore Trait - Database Abstraction Layer
//!
//! This module defines the `RuleStore` trait that abstracts rule
//! persistence for the migration, plus `TursoRuleStore`, the libsql
//! implementation.
//!
//! # Design Decisions
//!
//! 1. **Async-First**: All methods are async to match the libsql backend
//! 2. **Ownership Semantics**: Writes take ownership of values (caller
//!    clones if it needs to retain the original)
//! 3. **Error Handling**: `anyhow::Result` at the trait seam for flexible
//!    error context
//! 4. **Pure Delegation**: `TursoRuleStore` delegates all SQL to
//!    `DatabaseService` and only handles row/model conversion and
//!    criteria storage escaping
//!
//! # Examples
//!
//! ```rust,no_run
//! use rulespace_core::db::{DatabaseService, RuleStore, TursoRuleStore};
//! use std::path::PathBuf;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let db = Arc::new(DatabaseService::new(PathBuf::from("./data/rules.db")).await?);
//!     let store: Arc<dyn RuleStore> = Arc::new(TursoRuleStore::new(db));
//!
//!     let legacy = store.get_all_legacy().await?;
//!     println!("{} legacy rules", legacy.len());
//!     Ok(())
//! }
//! ```

use crate::db::database::{
    DbInsertLegacyRuleParams, DbUpsertRuleParams, LegacyRuleRow, PackRuleRow,
};
use crate::db::escape::{escape_chars, unescape_chars};
use crate::db::DatabaseService;
use crate::models::{ActionSpec, LegacyRule, Rule, Tag};
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

/// Abstraction layer for rule persistence operations
///
/// The migration reads the complete legacy set and upserts namespaced
/// rules by identity; the remaining methods support verification and
/// seeding. Implementations must be `Send + Sync`.
#[async_trait]
pub trait RuleStore: Send + Sync {
    /// Fetch the complete set of legacy rules (unbounded, no pagination)
    ///
    /// Legacy rules are read-only inputs: nothing in this crate ever
    /// mutates or deletes them.
    async fn get_all_legacy(&self) -> Result<Vec<LegacyRule>>;

    /// Insert a legacy rule (data import and test seeding only)
    async fn add_legacy(&self, rule: LegacyRule) -> Result<()>;

    /// Upsert a namespaced rule by identity
    ///
    /// If a rule with the same id already exists it is overwritten,
    /// otherwise it is inserted. A different rule occupying the same
    /// `(pack, name)` is a constraint violation and returns an error.
    async fn add_or_update(&self, rule: Rule) -> Result<()>;

    /// Get a namespaced rule by id
    ///
    /// Returns `Ok(None)` if no such rule exists (not an error).
    async fn get_by_id(&self, id: &str) -> Result<Option<Rule>>;

    /// Get a namespaced rule by its `"<pack>.<name>"` reference string
    async fn get_by_ref(&self, rule_ref: &str) -> Result<Option<Rule>>;

    /// Count legacy rules
    async fn count_legacy(&self) -> Result<i64>;

    /// Count namespaced rules
    async fn count_namespaced(&self) -> Result<i64>;

    /// Flush pending writes and release the database
    async fn close(&self) -> Result<()>;
}

/// RuleStore implementation for the libsql backend
///
/// Thin wrapper around [`DatabaseService`]: SQL lives there, this type
/// owns model conversion and the criteria storage escaping boundary.
pub struct TursoRuleStore {
    db: Arc<DatabaseService>,
}

impl TursoRuleStore {
    /// Create a new TursoRuleStore over an open database
    pub fn new(db: Arc<DatabaseService>) -> Self {
        Self { db }
    }

    /// Convert an owned legacy rules row to a `LegacyRule`
    ///
    /// Parses the JSON columns and unescapes criteria keys here so
    /// callers only ever see original key names.
    fn row_to_legacy_rule(row: LegacyRuleRow) -> Result<LegacyRule> {
        let criteria: Value =
            serde_json::from_str(&row.criteria).context("Failed to parse criteria JSON")?;
        let action: ActionSpec =
            serde_json::from_str(&row.action).context("Failed to parse action JSON")?;
        let tags: Vec<Tag> =
            serde_json::from_str(&row.tags).context("Failed to parse tags JSON")?;

        Ok(LegacyRule {
            id: row.id,
            name: row.name,
            description: row.description,
            trigger: row.trigger,
            criteria: unescape_chars(&criteria),
            action,
            enabled: row.enabled != 0,
            tags,
        })
    }

    /// Convert an owned pack_rules row to a `Rule`
    fn row_to_rule(row: PackRuleRow) -> Result<Rule> {
        let criteria: Value =
            serde_json::from_str(&row.criteria).context("Failed to parse criteria JSON")?;
        let action: ActionSpec =
            serde_json::from_str(&row.action).context("Failed to parse action JSON")?;
        let tags: Vec<Tag> =
            serde_json::from_str(&row.tags).context("Failed to parse tags JSON")?;

        Ok(Rule {
            id: row.id,
            name: row.name,
            r#ref: row.rule_ref,
            description: row.description,
            pack: row.pack,
            trigger: row.trigger,
            criteria: unescape_chars(&criteria),
            action,
            enabled: row.enabled != 0,
            tags,
        })
    }
}

#[async_trait]
impl RuleStore for TursoRuleStore {
    async fn get_all_legacy(&self) -> Result<Vec<LegacyRule>> {
        let rows = self
            .db
            .db_get_all_legacy_rules()
            .await
            .context("Failed to fetch legacy rules")?;

        rows.into_iter().map(Self::row_to_legacy_rule).collect()
    }

    async fn add_legacy(&self, rule: LegacyRule) -> Result<()> {
        let criteria_json = serde_json::to_string(&escape_chars(&rule.criteria))
            .context("Failed to serialize criteria")?;
        let action_json =
            serde_json::to_string(&rule.action).context("Failed to serialize action")?;
        let tags_json = serde_json::to_string(&rule.tags).context("Failed to serialize tags")?;

        let params = DbInsertLegacyRuleParams {
            id: &rule.id,
            name: rule.name.as_deref(),
            description: rule.description.as_deref(),
            trigger: &rule.trigger,
            criteria: &criteria_json,
            action: &action_json,
            enabled: rule.enabled,
            tags: &tags_json,
        };

        self.db
            .db_insert_legacy_rule(params)
            .await
            .context("Failed to insert legacy rule")
    }

    async fn add_or_update(&self, rule: Rule) -> Result<()> {
        let criteria_json = serde_json::to_string(&escape_chars(&rule.criteria))
            .context("Failed to serialize criteria")?;
        let action_json =
            serde_json::to_string(&rule.action).context("Failed to serialize action")?;
        let tags_json = serde_json::to_string(&rule.tags).context("Failed to serialize tags")?;

        let params = DbUpsertRuleParams {
            id: &rule.id,
            name: &rule.name,
            rule_ref: &rule.r#ref,
            description: rule.description.as_deref(),
            pack: &rule.pack,
            trigger: &rule.trigger,
            criteria: &criteria_json,
            action: &action_json,
            enabled: rule.enabled,
            tags: &tags_json,
        };

        self.db
            .db_upsert_pack_rule(params)
            .await
            .context("Failed to upsert namespaced rule")
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<Rule>> {
        match self.db.db_get_pack_rule(id).await? {
            Some(row) => Ok(Some(Self::row_to_rule(row)?)),
            None => Ok(None),
        }
    }

    async fn get_by_ref(&self, rule_ref: &str) -> Result<Option<Rule>> {
        match self.db.db_get_pack_rule_by_ref(rule_ref).await? {
            Some(row) => Ok(Some(Self::row_to_rule(row)?)),
            None => Ok(None),
        }
    }

    async fn count_legacy(&self) -> Result<i64> {
        Ok(self.db.db_count_legacy_rules().await?)
    }

    async fn count_namespaced(&self) -> Result<i64> {
        Ok(self.db.db_count_pack_rules().await?)
    }

    async fn close(&self) -> Result<()> {
        Ok(self.db.close().await?)
    }
}
