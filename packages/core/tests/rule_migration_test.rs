//! Integration tests for the rule pack migration
//!
//! Tests cover:
//! - The worked end-to-end example (legacy rule -> namespaced rule)
//! - Verbatim copy of shared fields, including criteria needing escaping
//! - Idempotent reruns against an on-disk database
//! - Coexistence of both collections after migration

use anyhow::Result;
use rulespace_core::db::{DatabaseService, RuleStore, TursoRuleStore};
use rulespace_core::models::{ActionSpec, LegacyRule, Tag};
use rulespace_core::services::RuleMigrator;
use rulespace_core::DEFAULT_PACK_NAME;
use serde_json::json;
use std::sync::Arc;
use tempfile::TempDir;

/// Test helper: Create an on-disk store in a temp directory
async fn create_test_env() -> Result<(Arc<TursoRuleStore>, TempDir)> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("test.db");
    let db = Arc::new(DatabaseService::new(db_path).await?);
    let store = Arc::new(TursoRuleStore::new(db));

    Ok((store, temp_dir))
}

#[tokio::test]
async fn test_worked_example_migrates_exactly() -> Result<()> {
    let (store, _tmp) = create_test_env().await?;

    store
        .add_legacy(LegacyRule {
            id: "abc123".to_string(),
            name: Some("my_rule".to_string()),
            description: None,
            trigger: "core.st2.sensor.x".to_string(),
            criteria: json!({}),
            action: ActionSpec::new("core.local".to_string()),
            enabled: true,
            tags: Vec::new(),
        })
        .await?;

    RuleMigrator::new(store.clone()).migrate().await?;

    let migrated = store.get_by_id("abc123").await?.expect("migrated rule");
    assert_eq!(migrated.id, "abc123");
    assert_eq!(migrated.name, "my_rule");
    assert_eq!(migrated.pack, "default");
    assert_eq!(migrated.r#ref, "default.my_rule");
    assert_eq!(migrated.trigger, "core.st2.sensor.x");
    assert_eq!(migrated.criteria, json!({}));
    assert_eq!(migrated.action.r#ref, "core.local");
    assert!(migrated.enabled);

    Ok(())
}

#[tokio::test]
async fn test_each_legacy_rule_maps_to_exactly_one_namespaced_rule() -> Result<()> {
    let (store, _tmp) = create_test_env().await?;

    for i in 0..5 {
        store
            .add_legacy(LegacyRule::new(
                format!("rule_{}", i),
                "core.st2.sensor.x".to_string(),
                ActionSpec::new("core.local".to_string()),
            ))
            .await?;
    }

    RuleMigrator::new(store.clone()).migrate().await?;

    assert_eq!(store.count_legacy().await?, 5);
    assert_eq!(store.count_namespaced().await?, 5);

    for legacy in store.get_all_legacy().await? {
        let name = legacy.name.as_deref().unwrap();
        let migrated = store.get_by_id(&legacy.id).await?.expect("namespaced rule");
        assert_eq!(migrated.id, legacy.id);
        assert_eq!(migrated.name, name);
        assert_eq!(migrated.pack, DEFAULT_PACK_NAME);
        assert_eq!(migrated.r#ref, format!("{}.{}", DEFAULT_PACK_NAME, name));
    }

    Ok(())
}

#[tokio::test]
async fn test_criteria_with_reserved_key_characters_round_trip() -> Result<()> {
    let (store, _tmp) = create_test_env().await?;

    let criteria = json!({
        "trigger.payload.level": {"type": "gt", "pattern": 5},
        "trigger.payload.host": {"type": "matchregex", "pattern": "web-.*"}
    });

    let mut legacy = LegacyRule::new(
        "escaped_rule".to_string(),
        "core.st2.sensor.x".to_string(),
        ActionSpec::new("core.local".to_string()),
    );
    legacy.criteria = criteria.clone();
    let id = legacy.id.clone();
    store.add_legacy(legacy).await?;

    RuleMigrator::new(store.clone()).migrate().await?;

    // Keys with '.' are escaped in storage but must read back unchanged,
    // both from the legacy table and the namespaced one.
    let legacy_back = store.get_all_legacy().await?;
    assert_eq!(legacy_back[0].criteria, criteria);

    let migrated = store.get_by_id(&id).await?.unwrap();
    assert_eq!(migrated.criteria, criteria);

    Ok(())
}

#[tokio::test]
async fn test_rerun_produces_same_namespaced_set() -> Result<()> {
    let (store, _tmp) = create_test_env().await?;

    let mut legacy = LegacyRule::new(
        "stable_rule".to_string(),
        "core.st2.sensor.x".to_string(),
        ActionSpec::new("core.local".to_string()),
    );
    legacy.description = Some("original".to_string());
    legacy.tags = vec![Tag {
        name: "team".to_string(),
        value: "ops".to_string(),
    }];
    let id = legacy.id.clone();
    store.add_legacy(legacy).await?;

    let migrator = RuleMigrator::new(store.clone());
    migrator.migrate().await?;
    let first = store.get_by_id(&id).await?.unwrap();

    migrator.migrate().await?;
    let second = store.get_by_id(&id).await?.unwrap();

    assert_eq!(first, second);
    assert_eq!(store.count_namespaced().await?, 1);

    Ok(())
}

#[tokio::test]
async fn test_both_collections_coexist_after_migration() -> Result<()> {
    let (store, _tmp) = create_test_env().await?;

    store
        .add_legacy(LegacyRule::new(
            "survivor".to_string(),
            "core.st2.sensor.x".to_string(),
            ActionSpec::new("core.local".to_string()),
        ))
        .await?;

    RuleMigrator::new(store.clone()).migrate().await?;

    // The migration does not remove legacy rules, so both shapes coexist.
    assert_eq!(store.count_legacy().await?, 1);
    assert_eq!(store.count_namespaced().await?, 1);

    let by_ref = store.get_by_ref("default.survivor").await?;
    assert!(by_ref.is_some());

    store.close().await?;
    Ok(())
}

#[tokio::test]
async fn test_disabled_rule_stays_disabled() -> Result<()> {
    let (store, _tmp) = create_test_env().await?;

    let mut legacy = LegacyRule::new(
        "disabled_rule".to_string(),
        "core.st2.sensor.x".to_string(),
        ActionSpec::new("core.local".to_string()),
    );
    legacy.enabled = false;
    let id = legacy.id.clone();
    store.add_legacy(legacy).await?;

    RuleMigrator::new(store.clone()).migrate().await?;

    let migrated = store.get_by_id(&id).await?.unwrap();
    assert!(!migrated.enabled);

    Ok(())
}
