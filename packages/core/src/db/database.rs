//! Database Connection Management
//!
//! This module provides the core database connection and initialization
//! functionality using libsql for Rulespace's rule storage.
//!
//! # Architecture
//!
//! - **Path-agnostic**: Accepts any valid PathBuf (`:memory:` supported
//!   for tests)
//! - **WAL mode**: Write-Ahead Logging for better concurrency
//! - **Foreign keys**: Enabled for referential integrity
//! - **JSON columns**: criteria, action, and tags stored as JSON text
//!
//! # Connection Pattern
//!
//! The service opens a single connection at construction, applies the
//! pragmas once, and every operation reuses a clone of that handle
//! (`libsql::Connection` is a cheap cloneable reference). This matters
//! for `:memory:` databases, where each fresh `Database::connect()`
//! would otherwise produce a new empty database without the schema.
//!
//! Rows are converted to owned values while the statement cursor is
//! positioned on them. A `libsql::Row` reads from the cursor's current
//! position, so reads deferred past the next `rows.next()` would see
//! the wrong row.

use crate::db::error::DatabaseError;
use libsql::{Builder, Connection, Database};
use std::path::PathBuf;
use std::sync::Arc;

/// Database service for managing the libsql connection and schema
///
/// # Examples
///
/// ```no_run
/// use rulespace_core::db::DatabaseService;
/// use std::path::PathBuf;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let db_path = PathBuf::from("/path/to/rulespace.db");
///     let db_service = DatabaseService::new(db_path).await?;
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct DatabaseService {
    /// libsql database handle (wrapped in Arc for sharing)
    pub db: Arc<Database>,

    /// Connection opened at construction; all operations reuse it
    conn: Connection,

    /// Path to the database file
    pub db_path: PathBuf,
}

/// Owned legacy rules row
///
/// Column values are read out while the statement cursor is on the row,
/// so they stay valid after iteration moves on.
pub struct LegacyRuleRow {
    pub id: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub trigger: String,
    pub criteria: String,
    pub action: String,
    pub enabled: i64,
    pub tags: String,
}

/// Owned pack_rules row
pub struct PackRuleRow {
    pub id: String,
    pub name: String,
    pub rule_ref: String,
    pub description: Option<String>,
    pub pack: String,
    pub trigger: String,
    pub criteria: String,
    pub action: String,
    pub enabled: i64,
    pub tags: String,
}

/// Parameters for a namespaced rule upsert (avoids too-many-arguments lint)
///
/// Sub-documents (criteria, action, tags) are pre-serialized JSON text;
/// criteria keys must already be storage-escaped by the caller.
pub struct DbUpsertRuleParams<'a> {
    pub id: &'a str,
    pub name: &'a str,
    pub rule_ref: &'a str,
    pub description: Option<&'a str>,
    pub pack: &'a str,
    pub trigger: &'a str,
    pub criteria: &'a str,
    pub action: &'a str,
    pub enabled: bool,
    pub tags: &'a str,
}

/// Parameters for a legacy rule insert (test seeding and data import)
pub struct DbInsertLegacyRuleParams<'a> {
    pub id: &'a str,
    pub name: Option<&'a str>,
    pub description: Option<&'a str>,
    pub trigger: &'a str,
    pub criteria: &'a str,
    pub action: &'a str,
    pub enabled: bool,
    pub tags: &'a str,
}

impl DatabaseService {
    /// Create a new DatabaseService with the specified database path
    ///
    /// This will:
    /// 1. Ensure the parent directory exists (create if needed)
    /// 2. Open/create the database file and a connection to it
    /// 3. Enable SQLite features (WAL mode, busy timeout, foreign keys)
    /// 4. Initialize the schema (CREATE TABLE IF NOT EXISTS)
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if:
    /// - Parent directory cannot be created
    /// - Database connection fails
    /// - Schema initialization fails
    pub async fn new(db_path: PathBuf) -> Result<Self, DatabaseError> {
        // Ensure parent directory exists
        if let Some(parent) = db_path.parent() {
            if !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    if e.kind() == std::io::ErrorKind::PermissionDenied {
                        DatabaseError::permission_denied(db_path.clone())
                    } else {
                        DatabaseError::DirectoryCreationFailed(e)
                    }
                })?;
            }
        }

        // Open database connection using Builder pattern
        let db = Builder::new_local(&db_path)
            .build()
            .await
            .map_err(|e| DatabaseError::connection_failed(db_path.clone(), e))?;

        let conn = db.connect().map_err(DatabaseError::LibsqlError)?;

        let service = Self {
            db: Arc::new(db),
            conn,
            db_path,
        };

        service.initialize_schema().await?;

        Ok(service)
    }

    /// Get a handle to the held connection
    ///
    /// Cloning a `libsql::Connection` shares the underlying connection;
    /// a `:memory:` database in particular is only reachable through the
    /// connection opened at construction.
    pub fn connection(&self) -> Connection {
        self.conn.clone()
    }

    /// Execute a PRAGMA statement
    ///
    /// PRAGMA statements return rows, so we must use query() instead of
    /// execute(). This helper encapsulates that pattern.
    async fn execute_pragma(
        &self,
        conn: &Connection,
        pragma: &str,
    ) -> Result<(), DatabaseError> {
        let mut stmt = conn.prepare(pragma).await.map_err(|e| {
            DatabaseError::sql_execution(format!("Failed to execute '{}': {}", pragma, e))
        })?;
        let _ = stmt.query(()).await.map_err(|e| {
            DatabaseError::sql_execution(format!("Failed to execute '{}': {}", pragma, e))
        })?;
        Ok(())
    }

    /// Initialize database schema and configuration
    ///
    /// Creates both rule tables using CREATE TABLE IF NOT EXISTS, ensuring
    /// idempotent initialization (safe to call multiple times).
    ///
    /// # Schema
    ///
    /// - `rules`: legacy rules, no pack column. `name` is intentionally
    ///   nullable: legacy data predates enforcement and malformed records
    ///   must be readable so the migration can reject them per-record
    /// - `pack_rules`: namespaced rules with `pack` and `ref` columns and
    ///   a `(pack, name)` uniqueness constraint
    async fn initialize_schema(&self) -> Result<(), DatabaseError> {
        let conn = self.connection();

        // Enable WAL mode for better concurrency
        self.execute_pragma(&conn, "PRAGMA journal_mode = WAL")
            .await?;

        // Wait up to 5s instead of failing immediately on lock
        self.execute_pragma(&conn, "PRAGMA busy_timeout = 5000")
            .await?;

        // Enable foreign key constraints
        self.execute_pragma(&conn, "PRAGMA foreign_keys = ON")
            .await?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS rules (
                id TEXT PRIMARY KEY,
                name TEXT,
                description TEXT,
                \"trigger\" TEXT NOT NULL DEFAULT '',
                criteria JSON NOT NULL DEFAULT '{}',
                action JSON NOT NULL DEFAULT '{}',
                enabled BOOLEAN NOT NULL DEFAULT TRUE,
                tags JSON NOT NULL DEFAULT '[]'
            )",
            (),
        )
        .await
        .map_err(|e| {
            DatabaseError::initialization_failed(format!("Failed to create rules table: {}", e))
        })?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS pack_rules (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                ref TEXT NOT NULL,
                description TEXT,
                pack TEXT NOT NULL,
                \"trigger\" TEXT NOT NULL DEFAULT '',
                criteria JSON NOT NULL DEFAULT '{}',
                action JSON NOT NULL DEFAULT '{}',
                enabled BOOLEAN NOT NULL DEFAULT TRUE,
                tags JSON NOT NULL DEFAULT '[]',
                UNIQUE (pack, name)
            )",
            (),
        )
        .await
        .map_err(|e| {
            DatabaseError::initialization_failed(format!(
                "Failed to create pack_rules table: {}",
                e
            ))
        })?;

        // Reference lookups are the common read path for namespaced rules
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_pack_rules_ref ON pack_rules(ref)",
            (),
        )
        .await
        .map_err(|e| {
            DatabaseError::initialization_failed(format!("Failed to create ref index: {}", e))
        })?;

        Ok(())
    }

    /// Read a legacy rules row into owned values
    ///
    /// Must be called while the cursor is positioned on the row.
    fn read_legacy_row(row: &libsql::Row) -> Result<LegacyRuleRow, DatabaseError> {
        let read = |column: &str, e: libsql::Error| {
            DatabaseError::sql_execution(format!("Failed to read column '{}': {}", column, e))
        };

        Ok(LegacyRuleRow {
            id: row.get(0).map_err(|e| read("id", e))?,
            name: row.get(1).map_err(|e| read("name", e))?,
            description: row.get(2).map_err(|e| read("description", e))?,
            trigger: row.get(3).map_err(|e| read("trigger", e))?,
            criteria: row.get(4).map_err(|e| read("criteria", e))?,
            action: row.get(5).map_err(|e| read("action", e))?,
            enabled: row.get(6).map_err(|e| read("enabled", e))?,
            tags: row.get(7).map_err(|e| read("tags", e))?,
        })
    }

    /// Read a pack_rules row into owned values
    fn read_pack_row(row: &libsql::Row) -> Result<PackRuleRow, DatabaseError> {
        let read = |column: &str, e: libsql::Error| {
            DatabaseError::sql_execution(format!("Failed to read column '{}': {}", column, e))
        };

        Ok(PackRuleRow {
            id: row.get(0).map_err(|e| read("id", e))?,
            name: row.get(1).map_err(|e| read("name", e))?,
            rule_ref: row.get(2).map_err(|e| read("ref", e))?,
            description: row.get(3).map_err(|e| read("description", e))?,
            pack: row.get(4).map_err(|e| read("pack", e))?,
            trigger: row.get(5).map_err(|e| read("trigger", e))?,
            criteria: row.get(6).map_err(|e| read("criteria", e))?,
            action: row.get(7).map_err(|e| read("action", e))?,
            enabled: row.get(8).map_err(|e| read("enabled", e))?,
            tags: row.get(9).map_err(|e| read("tags", e))?,
        })
    }

    //
    // RULE STORE OPERATIONS
    // These methods contain the SQL logic wrapped by the RuleStore trait
    // implementation.
    //

    /// Fetch every row from the legacy rules table
    ///
    /// Unbounded read, no pagination, no filtering: the migration operates
    /// on the complete legacy set. Returns owned rows (caller converts to
    /// `LegacyRule`).
    pub async fn db_get_all_legacy_rules(&self) -> Result<Vec<LegacyRuleRow>, DatabaseError> {
        let conn = self.connection();

        let mut stmt = conn
            .prepare(
                "SELECT id, name, description, \"trigger\", criteria, action, enabled, tags
                 FROM rules
                 ORDER BY id",
            )
            .await
            .map_err(|e| {
                DatabaseError::sql_execution(format!(
                    "Failed to prepare legacy rules query: {}",
                    e
                ))
            })?;

        let mut rows = stmt.query(()).await.map_err(|e| {
            DatabaseError::sql_execution(format!("Failed to execute legacy rules query: {}", e))
        })?;

        let mut result = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| DatabaseError::sql_execution(e.to_string()))?
        {
            result.push(Self::read_legacy_row(&row)?);
        }

        Ok(result)
    }

    /// Insert a row into the legacy rules table
    ///
    /// The migration never writes legacy rows; this exists for data import
    /// and test seeding.
    pub async fn db_insert_legacy_rule(
        &self,
        params: DbInsertLegacyRuleParams<'_>,
    ) -> Result<(), DatabaseError> {
        let conn = self.connection();

        conn.execute(
            "INSERT INTO rules (id, name, description, \"trigger\", criteria, action, enabled, tags)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
            (
                params.id,
                params.name,
                params.description,
                params.trigger,
                params.criteria,
                params.action,
                params.enabled as i64,
                params.tags,
            ),
        )
        .await
        .map_err(|e| {
            DatabaseError::sql_execution(format!("Failed to insert legacy rule: {}", e))
        })?;

        Ok(())
    }

    /// Upsert a namespaced rule by identity
    ///
    /// `ON CONFLICT(id) DO UPDATE` makes reruns idempotent at the record
    /// level: an existing row with the same id is overwritten in place. A
    /// conflicting `(pack, name)` under a *different* id is a constraint
    /// violation and propagates as an error.
    pub async fn db_upsert_pack_rule(
        &self,
        params: DbUpsertRuleParams<'_>,
    ) -> Result<(), DatabaseError> {
        let conn = self.connection();

        conn.execute(
            "INSERT INTO pack_rules
                 (id, name, ref, description, pack, \"trigger\", criteria, action, enabled, tags)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                 name = excluded.name,
                 ref = excluded.ref,
                 description = excluded.description,
                 pack = excluded.pack,
                 \"trigger\" = excluded.\"trigger\",
                 criteria = excluded.criteria,
                 action = excluded.action,
                 enabled = excluded.enabled,
                 tags = excluded.tags",
            (
                params.id,
                params.name,
                params.rule_ref,
                params.description,
                params.pack,
                params.trigger,
                params.criteria,
                params.action,
                params.enabled as i64,
                params.tags,
            ),
        )
        .await
        .map_err(|e| {
            DatabaseError::sql_execution(format!("Failed to upsert namespaced rule: {}", e))
        })?;

        Ok(())
    }

    /// Retrieve a single namespaced rule row by id
    pub async fn db_get_pack_rule(&self, id: &str) -> Result<Option<PackRuleRow>, DatabaseError> {
        self.query_pack_rule(
            "SELECT id, name, ref, description, pack, \"trigger\", criteria, action, enabled, tags
             FROM pack_rules WHERE id = ?",
            id,
        )
        .await
    }

    /// Retrieve a single namespaced rule row by reference string
    pub async fn db_get_pack_rule_by_ref(
        &self,
        rule_ref: &str,
    ) -> Result<Option<PackRuleRow>, DatabaseError> {
        self.query_pack_rule(
            "SELECT id, name, ref, description, pack, \"trigger\", criteria, action, enabled, tags
             FROM pack_rules WHERE ref = ?",
            rule_ref,
        )
        .await
    }

    async fn query_pack_rule(
        &self,
        sql: &str,
        key: &str,
    ) -> Result<Option<PackRuleRow>, DatabaseError> {
        let conn = self.connection();

        let mut stmt = conn.prepare(sql).await.map_err(|e| {
            DatabaseError::sql_execution(format!("Failed to prepare pack rule query: {}", e))
        })?;

        let mut rows = stmt.query([key]).await.map_err(|e| {
            DatabaseError::sql_execution(format!("Failed to execute pack rule query: {}", e))
        })?;

        match rows
            .next()
            .await
            .map_err(|e| DatabaseError::sql_execution(e.to_string()))?
        {
            Some(row) => Ok(Some(Self::read_pack_row(&row)?)),
            None => Ok(None),
        }
    }

    /// Count rows in the legacy rules table
    pub async fn db_count_legacy_rules(&self) -> Result<i64, DatabaseError> {
        self.count_rows("SELECT COUNT(*) FROM rules").await
    }

    /// Count rows in the namespaced rules table
    pub async fn db_count_pack_rules(&self) -> Result<i64, DatabaseError> {
        self.count_rows("SELECT COUNT(*) FROM pack_rules").await
    }

    async fn count_rows(&self, sql: &str) -> Result<i64, DatabaseError> {
        let conn = self.connection();

        let mut stmt = conn.prepare(sql).await.map_err(|e| {
            DatabaseError::sql_execution(format!("Failed to prepare count query: {}", e))
        })?;

        let mut rows = stmt.query(()).await.map_err(|e| {
            DatabaseError::sql_execution(format!("Failed to execute count query: {}", e))
        })?;

        let row = rows
            .next()
            .await
            .map_err(|e| DatabaseError::sql_execution(e.to_string()))?
            .ok_or_else(|| DatabaseError::sql_execution("Count query returned no rows"))?;

        row.get(0)
            .map_err(|e| DatabaseError::sql_execution(format!("Failed to read count: {}", e)))
    }

    /// Flush pending writes and release the database
    ///
    /// Checkpoints the WAL so the main database file is complete on exit.
    pub async fn close(&self) -> Result<(), DatabaseError> {
        let conn = self.connection();
        self.execute_pragma(&conn, "PRAGMA wal_checkpoint(TRUNCATE)")
            .await?;
        Ok(())
    }
}
