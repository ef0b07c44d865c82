// SqliteCatalog — rusqlite backend implementing the CatalogStore trait.
//
// The Connection is wrapped in tokio::sync::Mutex because Connection is !Sync.
// Trait methods lock the mutex, do synchronous rusqlite work, and return.
// The lock is never held across .await points.
//
// The free functions in queries.rs stay usable on a bare Connection, which
// is how the import path and the query tests use them.

use std::collections::HashSet;

use anyhow::Result;
use async_trait::async_trait;
use rusqlite::Connection;
use tokio::sync::Mutex;

use super::models::{
    Aesthetics, CatalogStats, Game, GameId, Hierarchy, NameMatch, StoreListing,
};
use super::queries::{self, TagTable};
use super::traits::{CatalogStore, HierarchyLevel};

pub struct SqliteCatalog {
    conn: Mutex<Connection>,
}

impl SqliteCatalog {
    /// Wrap an already-opened rusqlite Connection.
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }
}

#[async_trait]
impl CatalogStore for SqliteCatalog {
    async fn table_count(&self) -> Result<i64> {
        let conn = self.conn.lock().await;
        super::schema::table_count(&conn)
    }

    async fn get_game(&self, id: GameId) -> Result<Option<Game>> {
        let conn = self.conn.lock().await;
        queries::get_game(&conn, id)
    }

    async fn get_vector(&self, id: GameId) -> Result<Option<Vec<f64>>> {
        let conn = self.conn.lock().await;
        queries::get_vector(&conn, id)
    }

    async fn get_tags(&self, id: GameId) -> Result<(HashSet<String>, HashSet<String>)> {
        let conn = self.conn.lock().await;
        queries::get_tags(&conn, id)
    }

    async fn get_steam_tags(&self, id: GameId) -> Result<Vec<String>> {
        let conn = self.conn.lock().await;
        queries::get_tag_list(&conn, TagTable::Steam, id)
    }

    async fn get_aesthetics(&self, id: GameId) -> Result<Option<Aesthetics>> {
        let conn = self.conn.lock().await;
        queries::get_aesthetics(&conn, id)
    }

    async fn get_listing(&self, id: GameId) -> Result<Option<StoreListing>> {
        let conn = self.conn.lock().await;
        queries::get_listing(&conn, id)
    }

    async fn find_by_hierarchy(
        &self,
        hierarchy: &Hierarchy,
        level: HierarchyLevel,
        exclude_id: GameId,
        limit: usize,
    ) -> Result<Vec<GameId>> {
        let conn = self.conn.lock().await;
        queries::find_by_hierarchy(&conn, hierarchy, level, exclude_id, limit)
    }

    async fn find_by_name_substring(
        &self,
        substring: &str,
        exclude_id: GameId,
        limit: usize,
    ) -> Result<Vec<GameId>> {
        let conn = self.conn.lock().await;
        queries::find_by_name_substring(&conn, substring, exclude_id, limit)
    }

    async fn search_by_name(&self, query: &str, limit: usize) -> Result<Vec<NameMatch>> {
        let conn = self.conn.lock().await;
        queries::search_by_name(&conn, query, limit)
    }

    async fn catalog_stats(&self) -> Result<CatalogStats> {
        let conn = self.conn.lock().await;
        queries::catalog_stats(&conn)
    }
}
