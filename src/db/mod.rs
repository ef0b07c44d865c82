// Database layer — the SQLite game catalog.
//
// We use rusqlite with the "bundled" feature so there's no system SQLite
// dependency. The database file lives wherever KINDRED_DB_PATH points
// (defaults to ./kindred.db).

pub mod import;
pub mod models;
pub mod queries;
pub mod schema;
pub mod sqlite;
pub mod traits;

pub use models::GameId;
pub use traits::{CatalogStore, HierarchyLevel};

use anyhow::{Context, Result};
use rusqlite::Connection;
use std::path::Path;
use std::sync::Arc;

/// Open (or create) the database and run migrations.
///
/// Called by `kindred init` and `kindred import`.
pub fn initialize(db_path: &str) -> Result<Connection> {
    if let Some(parent) = Path::new(db_path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory for database: {}", db_path))?;
        }
    }

    let conn = Connection::open(db_path)
        .with_context(|| format!("Failed to open database at {}", db_path))?;

    conn.pragma_update(None, "journal_mode", "WAL")?;

    schema::create_tables(&conn)?;

    Ok(conn)
}

/// Open an existing catalog (fails if it doesn't exist yet).
///
/// Migrations still run so catalogs built by older tooling gain the newer
/// tables without a separate step.
pub fn open(db_path: &str) -> Result<Connection> {
    if !Path::new(db_path).exists() {
        anyhow::bail!(
            "Catalog not found at {}. Run `kindred init` and `kindred import` first.",
            db_path
        );
    }

    let conn = Connection::open(db_path)
        .with_context(|| format!("Failed to open database at {}", db_path))?;

    conn.pragma_update(None, "journal_mode", "WAL")?;
    schema::create_tables(&conn)?;

    Ok(conn)
}

/// Open an existing catalog behind the async store trait.
pub fn open_catalog(db_path: &str) -> Result<Arc<dyn CatalogStore>> {
    let conn = open(db_path)?;
    Ok(Arc::new(sqlite::SqliteCatalog::new(conn)))
}
