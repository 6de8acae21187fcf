//! Rule Pack Migration
//!
//! One-time schema migration that copies every rule from the legacy
//! collection into the pack-namespaced collection. Each migrated rule is
//! assigned the default pack and a derived `"<pack>.<name>"` reference;
//! all other fields are copied verbatim.
//!
//! # Semantics
//!
//! - Single linear pass, strictly sequential, no concurrency
//! - Writes are upserts keyed by id, so re-running is idempotent at the
//!   record level
//! - Legacy rules are never mutated or deleted; both collections coexist
//!   after the migration
//! - Fail-fast: the first read or write error aborts the run. There is no
//!   retry and no rollback, so the namespaced collection may be left
//!   partially populated
//!
//! # Examples
//!
//! ```rust,no_run
//! use rulespace_core::db::{DatabaseService, TursoRuleStore};
//! use rulespace_core::services::RuleMigrator;
//! use std::path::PathBuf;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let db = Arc::new(DatabaseService::new(PathBuf::from("./data/rules.db")).await?);
//!     let store = Arc::new(TursoRuleStore::new(db));
//!
//!     RuleMigrator::new(store).migrate().await?;
//!     Ok(())
//! }
//! ```

use crate::db::RuleStore;
use crate::models::Rule;
use crate::services::error::MigrationError;
use std::sync::Arc;

/// One-shot migrator from the legacy rule collection to the
/// pack-namespaced collection.
pub struct RuleMigrator {
    store: Arc<dyn RuleStore>,
}

impl RuleMigrator {
    /// Create a migrator over an open rule store
    pub fn new(store: Arc<dyn RuleStore>) -> Self {
        Self { store }
    }

    /// Migrate every legacy rule into the namespaced collection.
    ///
    /// Fetches the complete legacy set, then for each rule builds the
    /// namespaced counterpart ([`Rule::from_legacy`]) and upserts it by
    /// identity, logging one progress line per rule. Success is implicit
    /// completion of the loop.
    ///
    /// # Errors
    ///
    /// The first failure propagates immediately:
    ///
    /// - [`MigrationError::StoreError`] for read or write failures
    ///   (including a `(pack, name)` uniqueness violation)
    /// - [`MigrationError::InvalidLegacyRule`] for a legacy record whose
    ///   `name` is missing or empty
    ///
    /// Rules migrated before the failure stay written.
    pub async fn migrate(&self) -> Result<(), MigrationError> {
        let existing_rules = self.store.get_all_legacy().await?;

        for rule in existing_rules {
            let rule_with_pack = Rule::from_legacy(&rule)
                .map_err(|e| MigrationError::invalid_legacy_rule(&rule.id, e))?;

            tracing::info!(
                "Migrating rule: {} to rule: {}",
                rule_with_pack.name,
                rule_with_pack.r#ref
            );
            self.store.add_or_update(rule_with_pack).await?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::DEFAULT_PACK_NAME;
    use crate::db::{DatabaseService, TursoRuleStore};
    use crate::models::{ActionSpec, LegacyRule, Tag};
    use serde_json::json;
    use std::path::PathBuf;

    async fn create_test_store() -> Arc<TursoRuleStore> {
        let db = DatabaseService::new(PathBuf::from(":memory:"))
            .await
            .expect("in-memory database");
        Arc::new(TursoRuleStore::new(Arc::new(db)))
    }

    fn legacy_rule(id: &str, name: &str) -> LegacyRule {
        LegacyRule {
            id: id.to_string(),
            name: Some(name.to_string()),
            description: Some(format!("{} description", name)),
            trigger: "core.st2.sensor.x".to_string(),
            criteria: json!({"payload.level": {"type": "gt", "pattern": 5}}),
            action: ActionSpec {
                r#ref: "core.local".to_string(),
                parameters: json!({"cmd": "date"}),
            },
            enabled: true,
            tags: vec![Tag {
                name: "env".to_string(),
                value: "prod".to_string(),
            }],
        }
    }

    #[tokio::test]
    async fn test_migrate_assigns_default_pack_and_ref() {
        let store = create_test_store().await;
        store.add_legacy(legacy_rule("r1", "my_rule")).await.unwrap();

        RuleMigrator::new(store.clone()).migrate().await.unwrap();

        let migrated = store.get_by_id("r1").await.unwrap().expect("migrated rule");
        assert_eq!(migrated.pack, DEFAULT_PACK_NAME);
        assert_eq!(migrated.r#ref, "default.my_rule");
        assert_eq!(migrated.name, "my_rule");
    }

    #[tokio::test]
    async fn test_migrate_copies_shared_fields_verbatim() {
        let store = create_test_store().await;
        let legacy = legacy_rule("r1", "my_rule");
        store.add_legacy(legacy.clone()).await.unwrap();

        RuleMigrator::new(store.clone()).migrate().await.unwrap();

        let migrated = store.get_by_id("r1").await.unwrap().unwrap();
        assert_eq!(migrated.description, legacy.description);
        assert_eq!(migrated.trigger, legacy.trigger);
        assert_eq!(migrated.criteria, legacy.criteria);
        assert_eq!(migrated.action, legacy.action);
        assert_eq!(migrated.enabled, legacy.enabled);
        assert_eq!(migrated.tags, legacy.tags);
    }

    #[tokio::test]
    async fn test_migrate_empty_legacy_set_is_a_noop() {
        let store = create_test_store().await;

        RuleMigrator::new(store.clone()).migrate().await.unwrap();

        assert_eq!(store.count_namespaced().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_migrate_twice_creates_no_duplicates() {
        let store = create_test_store().await;
        store.add_legacy(legacy_rule("r1", "one")).await.unwrap();
        store.add_legacy(legacy_rule("r2", "two")).await.unwrap();

        let migrator = RuleMigrator::new(store.clone());
        migrator.migrate().await.unwrap();
        migrator.migrate().await.unwrap();

        assert_eq!(store.count_namespaced().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_migrate_missing_name_fails_after_prior_writes() {
        let store = create_test_store().await;
        // Legacy rows come back ordered by id, so the malformed record is
        // reached second.
        store.add_legacy(legacy_rule("a1", "good")).await.unwrap();
        let mut malformed = legacy_rule("b2", "ignored");
        malformed.name = None;
        store.add_legacy(malformed).await.unwrap();

        let result = RuleMigrator::new(store.clone()).migrate().await;

        assert!(matches!(
            result,
            Err(MigrationError::InvalidLegacyRule { .. })
        ));
        // No rollback: the rule migrated before the failure stays written.
        assert!(store.get_by_id("a1").await.unwrap().is_some());
        assert_eq!(store.count_namespaced().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_migrate_leaves_legacy_rules_untouched() {
        let store = create_test_store().await;
        store.add_legacy(legacy_rule("r1", "one")).await.unwrap();
        store.add_legacy(legacy_rule("r2", "two")).await.unwrap();

        RuleMigrator::new(store.clone()).migrate().await.unwrap();

        assert_eq!(store.count_legacy().await.unwrap(), 2);
        let legacy = store.get_all_legacy().await.unwrap();
        assert_eq!(legacy.len(), 2);
        assert_eq!(legacy[0].name.as_deref(), Some("one"));
    }

    #[tokio::test]
    async fn test_migrate_duplicate_name_under_different_id_fails() {
        let store = create_test_store().await;
        store.add_legacy(legacy_rule("r1", "same_name")).await.unwrap();
        store.add_legacy(legacy_rule("r2", "same_name")).await.unwrap();

        // Both map to (default, same_name); the second upsert has a
        // different id, so the uniqueness constraint rejects it.
        let result = RuleMigrator::new(store.clone()).migrate().await;

        assert!(matches!(result, Err(MigrationError::StoreError(_))));
        assert_eq!(store.count_namespaced().await.unwrap(), 1);
    }
}
