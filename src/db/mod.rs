pub mod migrations;
pub mod schema;

use anyhow::{Context, Result};
use rusqlite::Connection;
use serde::Serialize;
use sqlite_vec::sqlite3_vec_init;
use std::path::Path;
use std::sync::Once;

static SQLITE_VEC_INIT: Once = Once::new();

/// Register the sqlite-vec extension globally. Safe to call multiple times.
pub fn load_sqlite_vec() {
    SQLITE_VEC_INIT.call_once(|| unsafe {
        rusqlite::ffi::sqlite3_auto_extension(Some(std::mem::transmute(
            sqlite3_vec_init as *const (),
        )));
    });
}

/// Open (or create) the journal database at the given path, with all extensions
/// loaded, schema initialized and migrations applied.
pub fn open_database(path: impl AsRef<Path>) -> Result<Connection> {
    let path = path.as_ref();

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.display()))?;
    }

    load_sqlite_vec();

    let conn = Connection::open(path)
        .with_context(|| format!("failed to open database at {}", path.display()))?;

    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "foreign_keys", "ON")?;
    conn.pragma_update(None, "busy_timeout", 5000)?;

    schema::init_schema(&conn).context("failed to initialize schema")?;
    migrations::run_migrations(&conn).context("failed to run migrations")?;

    tracing::info!(path = %path.display(), "database initialized");
    Ok(conn)
}

/// Open an in-memory database with the full schema. Used by tests.
pub fn open_memory_database() -> Result<Connection> {
    load_sqlite_vec();
    let conn = Connection::open_in_memory().context("failed to open in-memory database")?;
    conn.pragma_update(None, "foreign_keys", "ON")?;
    schema::init_schema(&conn).context("failed to initialize schema")?;
    migrations::run_migrations(&conn).context("failed to run migrations")?;
    Ok(conn)
}

/// Result of [`check_database_health`].
#[derive(Debug, Serialize)]
pub struct HealthReport {
    pub schema_version: u32,
    pub sqlite_vec_version: String,
    pub embedding_model: Option<String>,
    pub user_count: u64,
    pub entry_count: u64,
    pub vector_count: u64,
    pub log_count: u64,
    pub integrity_ok: bool,
    pub integrity_details: String,
}

/// Collect schema/extension versions, row counts and the SQLite integrity check.
pub fn check_database_health(conn: &Connection) -> Result<HealthReport> {
    let schema_version = migrations::get_schema_version(conn)?;
    let sqlite_vec_version: String = conn.query_row("SELECT vec_version()", [], |r| r.get(0))?;
    let embedding_model = migrations::get_embedding_model(conn)?;

    let count = |sql: &str| -> Result<u64> {
        let n: i64 = conn.query_row(sql, [], |r| r.get(0))?;
        Ok(n as u64)
    };
    let user_count = count("SELECT COUNT(DISTINCT user_id) FROM entries")?;
    let entry_count = count("SELECT COUNT(*) FROM entries")?;
    let vector_count = count("SELECT COUNT(*) FROM entry_vectors")?;
    let log_count = count("SELECT COUNT(*) FROM entry_log")?;

    let mut integrity_details: String =
        conn.query_row("PRAGMA integrity_check", [], |r| r.get(0))?;
    if integrity_details == "ok" && vector_count != entry_count {
        integrity_details = format!("{entry_count} entries but {vector_count} vectors");
    }
    let integrity_ok = integrity_details == "ok";

    Ok(HealthReport {
        schema_version,
        sqlite_vec_version,
        embedding_model,
        user_count,
        entry_count,
        vector_count,
        log_count,
        integrity_ok,
        integrity_details,
    })
}

/// Record `model` as the database's embedding model, warning when it replaces another.
///
/// Entries keep the model that encoded them, so a switch only narrows the
/// reflection corpus to entries written with the new model.
pub fn sync_embedding_model(conn: &Connection, model: &str) -> Result<()> {
    match migrations::get_embedding_model(conn)? {
        Some(stored) if stored == model => return Ok(()),
        Some(stored) => tracing::warn!(
            stored = %stored,
            configured = %model,
            "embedding model changed; older entries will not be used for reflections"
        ),
        None => {}
    }
    migrations::set_embedding_model(conn, model)?;
    Ok(())
}
