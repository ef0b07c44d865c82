// Catalog store trait — the engine's only view of the data.
//
// The recommendation engine reads games, tags, and vectors exclusively
// through this trait, so it never depends on rusqlite directly. All methods
// are async so a sync backend (rusqlite behind a Mutex) and a native async
// backend fit behind the same interface.
//
// Any Err returned here is a store failure. The engine propagates it to its
// caller untouched and never retries.

use std::collections::HashSet;

use anyhow::Result;
use async_trait::async_trait;

use super::models::{
    Aesthetics, CatalogStats, Game, GameId, Hierarchy, NameMatch, StoreListing,
};

/// How much of a hierarchy a candidate must share with the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HierarchyLevel {
    /// Same main genre, sub genre, and sub-sub genre.
    Exact,
    /// Same main and sub genre, different sub-sub genre.
    SubGenre,
    /// Same main genre, different sub genre.
    MainGenre,
}

#[async_trait]
pub trait CatalogStore: Send + Sync {
    // --- Lifecycle ---

    /// Count the number of user-created tables in the database.
    async fn table_count(&self) -> Result<i64>;

    // --- Game records ---

    /// Load the full catalog record for a game.
    async fn get_game(&self, id: GameId) -> Result<Option<Game>>;

    /// Load the pre-computed TF-IDF vector, if the game has one.
    async fn get_vector(&self, id: GameId) -> Result<Option<Vec<f64>>>;

    /// Load the (unique, subjective) tag sets.
    async fn get_tags(&self, id: GameId) -> Result<(HashSet<String>, HashSet<String>)>;

    /// Load the platform tags in their original order.
    async fn get_steam_tags(&self, id: GameId) -> Result<Vec<String>>;

    /// Load the aesthetic triple (None if the game is unknown).
    async fn get_aesthetics(&self, id: GameId) -> Result<Option<Aesthetics>>;

    /// Load the store listing (None if the catalog has no store data).
    async fn get_listing(&self, id: GameId) -> Result<Option<StoreListing>>;

    // --- Candidate queries ---

    /// Games matching `hierarchy` at the given level, excluding `exclude_id`,
    /// in ascending id order.
    async fn find_by_hierarchy(
        &self,
        hierarchy: &Hierarchy,
        level: HierarchyLevel,
        exclude_id: GameId,
        limit: usize,
    ) -> Result<Vec<GameId>>;

    /// Games whose name, sub-sub genre, or any unique tag contains
    /// `substring` (case-insensitive), excluding `exclude_id`, in ascending
    /// id order.
    async fn find_by_name_substring(
        &self,
        substring: &str,
        exclude_id: GameId,
        limit: usize,
    ) -> Result<Vec<GameId>>;

    // --- Browsing ---

    /// Search games by name: exact match first, then prefix, then substring.
    async fn search_by_name(&self, query: &str, limit: usize) -> Result<Vec<NameMatch>>;

    /// Aggregate catalog statistics.
    async fn catalog_stats(&self) -> Result<CatalogStats>;
}
