// Database schema — table creation and migrations.
//
// We use a simple version-based migration approach: a `schema_version` table
// tracks which migrations have run, and each migration is a function that
// executes SQL statements. Table and column names match the catalogs produced
// by the tagging pipeline, so an existing catalog file opens as-is.

use anyhow::{Context, Result};
use rusqlite::Connection;

/// Create all tables if they don't exist yet.
///
/// This is idempotent — safe to call on every startup.
pub fn create_tables(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS games (
            steam_appid INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            steam_description TEXT,
            main_genre TEXT NOT NULL,
            sub_genre TEXT NOT NULL,
            sub_sub_genre TEXT NOT NULL,
            art_style TEXT,
            theme TEXT,
            music_style TEXT
        );

        -- Platform tags, kept in their original order
        CREATE TABLE IF NOT EXISTS steam_tags (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            steam_appid INTEGER NOT NULL,
            tag TEXT NOT NULL,
            tag_order INTEGER
        );

        CREATE TABLE IF NOT EXISTS unique_tags (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            steam_appid INTEGER NOT NULL,
            tag TEXT NOT NULL,
            tag_order INTEGER
        );

        CREATE TABLE IF NOT EXISTS subjective_tags (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            steam_appid INTEGER NOT NULL,
            tag TEXT NOT NULL,
            tag_order INTEGER
        );

        CREATE TABLE IF NOT EXISTS tag_ratios (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            steam_appid INTEGER NOT NULL,
            tag TEXT NOT NULL,
            ratio INTEGER NOT NULL             -- percentage 0-100
        );

        -- Dense TF-IDF vectors, little-endian f64 values
        CREATE TABLE IF NOT EXISTS game_vectors (
            steam_appid INTEGER PRIMARY KEY,
            vector_data BLOB,
            vector_dimension INTEGER
        );

        CREATE INDEX IF NOT EXISTS idx_games_hierarchy
            ON games(main_genre, sub_genre, sub_sub_genre);
        CREATE INDEX IF NOT EXISTS idx_steam_tags_game ON steam_tags(steam_appid);
        CREATE INDEX IF NOT EXISTS idx_unique_tags_game ON unique_tags(steam_appid);
        CREATE INDEX IF NOT EXISTS idx_subjective_tags_game ON subjective_tags(steam_appid);
        CREATE INDEX IF NOT EXISTS idx_tag_ratios_game ON tag_ratios(steam_appid);
        ",
    )
    .context("Failed to create database tables")?;

    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [1],
    )?;

    // Migration v2: store listings (imagery, pricing, reviews) live alongside
    // the catalog instead of in a separate store-API database.
    run_migration(conn, 2, |c| {
        c.execute_batch(
            "CREATE TABLE IF NOT EXISTS store_listings (
                steam_appid INTEGER PRIMARY KEY,
                header_image TEXT,
                pricing TEXT,
                steam_url TEXT,
                positive_reviews INTEGER,
                negative_reviews INTEGER
            );",
        )
    })?;

    Ok(())
}

/// Run a migration if it hasn't been applied yet.
/// The migration function receives the connection and should execute its SQL.
fn run_migration<F>(conn: &Connection, version: i64, migrate: F) -> Result<()>
where
    F: FnOnce(&Connection) -> rusqlite::Result<()>,
{
    let already_applied: bool = conn.query_row(
        "SELECT COUNT(*) > 0 FROM schema_version WHERE version = ?1",
        [version],
        |row| row.get(0),
    )?;

    if !already_applied {
        migrate(conn).with_context(|| format!("Migration v{version} failed"))?;
        conn.execute(
            "INSERT INTO schema_version (version) VALUES (?1)",
            [version],
        )?;
    }

    Ok(())
}

/// Count the number of tables in the database (useful for init confirmation).
pub fn table_count(conn: &Connection) -> Result<i64> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'",
        [],
        |row| row.get(0),
    )?;
    Ok(count)
}
