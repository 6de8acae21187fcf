//! Rule Pack Migration Binary
//!
//! One-shot command that copies every legacy rule into the
//! pack-namespaced collection, assigning the default pack and the
//! derived `pack.name` reference. Safe to re-run: writes are upserts
//! keyed by rule id.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin migrate-rules
//!
//! # Custom database location
//! RULESPACE_DB_PATH=/var/lib/rulespace/rules.db cargo run --bin migrate-rules
//! ```
//!
//! # Environment Variables
//!
//! - `RULESPACE_DB_PATH`: Database file path
//!   (default: `~/.rulespace/database/rulespace.db`)
//! - `RUST_LOG`: Logging level (e.g., "info", "debug", "trace")
//!
//! # Exit Status
//!
//! Exits 0 on completion. Any read or write failure aborts the run with
//! a non-zero exit; rules migrated before the failure stay written.

use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use rulespace_core::db::{DatabaseService, RuleStore, TursoRuleStore};
use rulespace_core::services::RuleMigrator;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    tracing::info!("Rulespace rule pack migration");

    // Determine database path
    let db_path = match env::var("RULESPACE_DB_PATH") {
        Ok(path) => PathBuf::from(path),
        Err(_) => {
            let home_dir = dirs::home_dir()
                .ok_or_else(|| anyhow::anyhow!("Failed to get home directory"))?;
            home_dir
                .join(".rulespace")
                .join("database")
                .join("rulespace.db")
        }
    };

    tracing::info!("Database: {}", db_path.display());

    // Connect to the store (creates parent directories as needed)
    let db = Arc::new(DatabaseService::new(db_path).await?);
    let store: Arc<dyn RuleStore> = Arc::new(TursoRuleStore::new(db));

    // Migrate rules
    RuleMigrator::new(store.clone()).migrate().await?;

    // Disconnect from the store
    store.close().await?;

    tracing::info!("Migration complete");

    Ok(())
}
