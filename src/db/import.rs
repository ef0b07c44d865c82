// Catalog import — bulk-load a JSON catalog into SQLite.
//
// The tagging pipeline emits one JSON array of game objects. Each object
// carries the catalog attributes, plus an optional dense `vector` (the
// pipeline's TF-IDF output) and an optional `listing` with store data.
// Everything runs in one transaction: a bad file leaves the catalog as it was.

use std::path::Path;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use rusqlite::Connection;
use serde::Deserialize;
use tracing::{info, warn};

use super::models::{store_url, Game, StoreListing, DEFAULT_HEADER_IMAGE, DEFAULT_PRICING};
use super::queries;

/// One game object from the catalog file.
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogEntry {
    #[serde(flatten)]
    pub game: Game,
    /// Dense TF-IDF vector. Absent for games added after the vectorizer fit.
    #[serde(default)]
    pub vector: Option<Vec<f64>>,
    #[serde(default)]
    pub listing: Option<ListingEntry>,
}

/// Store data as the pipeline writes it. Every field is optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListingEntry {
    pub header_image: Option<String>,
    pub pricing: Option<String>,
    pub steam_url: Option<String>,
    pub positive_reviews: Option<i64>,
    pub negative_reviews: Option<i64>,
}

impl ListingEntry {
    fn into_listing(self, steam_appid: i64) -> StoreListing {
        StoreListing {
            header_image: self
                .header_image
                .unwrap_or_else(|| DEFAULT_HEADER_IMAGE.to_string()),
            pricing: self.pricing.unwrap_or_else(|| DEFAULT_PRICING.to_string()),
            steam_url: self.steam_url.unwrap_or_else(|| store_url(steam_appid)),
            positive_reviews: self.positive_reviews.unwrap_or(0),
            negative_reviews: self.negative_reviews.unwrap_or(0),
        }
    }
}

/// What an import did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub games: usize,
    pub vectors: usize,
    pub listings: usize,
    pub skipped: usize,
}

/// Read and parse a catalog file.
pub fn load_catalog_file(path: &Path) -> Result<Vec<CatalogEntry>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read catalog file {}", path.display()))?;
    parse_catalog(&raw).with_context(|| format!("Invalid catalog file {}", path.display()))
}

/// Parse catalog JSON (an array of game objects).
pub fn parse_catalog(json: &str) -> Result<Vec<CatalogEntry>> {
    let entries: Vec<CatalogEntry> = serde_json::from_str(json)?;
    Ok(entries)
}

/// Write entries into the catalog inside a single transaction.
///
/// Entries without a name or main genre can't take part in candidate
/// selection, so they are skipped with a warning. An entry replaces
/// everything stored for its id: without a vector or listing, any stored
/// one is removed.
pub fn import_entries(
    conn: &mut Connection,
    entries: Vec<CatalogEntry>,
    pb: &ProgressBar,
) -> Result<ImportSummary> {
    let mut summary = ImportSummary::default();
    let tx = conn.transaction().context("Failed to start import transaction")?;

    for entry in entries {
        pb.inc(1);
        let id = entry.game.steam_appid;

        if entry.game.name.trim().is_empty() || entry.game.hierarchy.main_genre.trim().is_empty() {
            warn!(steam_appid = id, "Skipping catalog entry without name or main genre");
            summary.skipped += 1;
            continue;
        }

        queries::upsert_game(&tx, &entry.game)
            .with_context(|| format!("Failed to import game {id}"))?;
        summary.games += 1;

        match entry.vector.filter(|v| !v.is_empty()) {
            Some(vector) => {
                queries::set_vector(&tx, id, &vector)?;
                summary.vectors += 1;
            }
            None => queries::delete_vector(&tx, id)?,
        }

        match entry.listing {
            Some(listing) => {
                queries::upsert_listing(&tx, id, &listing.into_listing(id))?;
                summary.listings += 1;
            }
            None => queries::delete_listing(&tx, id)?,
        }
    }

    tx.commit().context("Failed to commit import")?;

    info!(
        games = summary.games,
        vectors = summary.vectors,
        listings = summary.listings,
        skipped = summary.skipped,
        "Catalog import complete"
    );
    Ok(summary)
}

/// Progress bar for the CLI import.
pub fn import_progress(len: usize) -> Result<ProgressBar> {
    let pb = ProgressBar::new(len as u64);
    pb.set_style(ProgressStyle::default_bar().template("  Importing [{bar:30}] {pos}/{len} ({eta})")?);
    Ok(pb)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::schema::create_tables;

    const SAMPLE: &str = r#"[
        {
            "steam_appid": 588650,
            "name": "Dead Cells",
            "main_genre": "Action",
            "sub_genre": "Roguelike",
            "sub_sub_genre": "Roguevania",
            "art_style": "Pixel Art",
            "theme": "Dark Fantasy",
            "unique_tags": ["permadeath", "weapon-variety"],
            "subjective_tags": ["tight-controls"],
            "steam_tags": ["Roguelike", "Metroidvania", "Pixel Graphics"],
            "tag_ratios": {"combat": 80, "exploration": 20},
            "vector": [0.1, 0.0, 0.3],
            "listing": {"pricing": "$24.99", "positive_reviews": 100}
        },
        {
            "steam_appid": 1,
            "name": "",
            "main_genre": "Action",
            "sub_genre": "x",
            "sub_sub_genre": "y"
        }
    ]"#;

    #[test]
    fn test_parse_catalog_reads_flattened_fields() {
        let entries = parse_catalog(SAMPLE).unwrap();
        assert_eq!(entries.len(), 2);
        let dead_cells = &entries[0];
        assert_eq!(dead_cells.game.hierarchy.sub_sub_genre, "Roguevania");
        assert_eq!(dead_cells.game.aesthetics.art_style.as_deref(), Some("Pixel Art"));
        assert_eq!(dead_cells.game.aesthetics.music_style, None);
        assert_eq!(dead_cells.vector.as_ref().map(|v| v.len()), Some(3));
    }

    #[test]
    fn test_import_entries_skips_nameless_and_fills_listing_defaults() {
        let mut conn = Connection::open_in_memory().unwrap();
        create_tables(&conn).unwrap();

        let summary =
            import_entries(&mut conn, parse_catalog(SAMPLE).unwrap(), &ProgressBar::hidden())
                .unwrap();
        assert_eq!(
            summary,
            ImportSummary {
                games: 1,
                vectors: 1,
                listings: 1,
                skipped: 1
            }
        );

        let listing = queries::get_listing(&conn, 588650).unwrap().unwrap();
        assert_eq!(listing.pricing, "$24.99");
        assert_eq!(listing.header_image, DEFAULT_HEADER_IMAGE);
        assert_eq!(listing.negative_reviews, 0);
        assert_eq!(
            queries::get_vector(&conn, 588650).unwrap(),
            Some(vec![0.1, 0.0, 0.3])
        );
        assert!(queries::get_game(&conn, 1).unwrap().is_none());
    }

    #[test]
    fn test_reimport_without_vector_or_listing_clears_them() {
        let mut conn = Connection::open_in_memory().unwrap();
        create_tables(&conn).unwrap();
        import_entries(&mut conn, parse_catalog(SAMPLE).unwrap(), &ProgressBar::hidden())
            .unwrap();

        let bare = r#"[{
            "steam_appid": 588650,
            "name": "Dead Cells",
            "main_genre": "Action",
            "sub_genre": "Roguelike",
            "sub_sub_genre": "Roguevania"
        }]"#;
        let summary =
            import_entries(&mut conn, parse_catalog(bare).unwrap(), &ProgressBar::hidden())
                .unwrap();
        assert_eq!(summary.vectors, 0);
        assert_eq!(summary.listings, 0);

        assert_eq!(queries::get_vector(&conn, 588650).unwrap(), None);
        assert!(queries::get_listing(&conn, 588650).unwrap().is_none());
        let game = queries::get_game(&conn, 588650).unwrap().unwrap();
        assert!(game.unique_tags.is_empty());
        assert_eq!(queries::catalog_stats(&conn).unwrap().total_vectors, 0);
    }

    #[test]
    fn test_malformed_catalog_is_an_error() {
        assert!(parse_catalog(r#"{"not": "an array"}"#).is_err());
    }
}
