// Database queries — catalog reads and the writes used by import.
//
// Every database interaction goes through this module. This keeps SQL
// contained in one place and gives the rest of the app clean Rust interfaces.

use std::collections::{BTreeMap, HashSet};

use anyhow::Result;
use rusqlite::{params, Connection, OptionalExtension};

use super::models::{
    Aesthetics, CatalogStats, Game, GameId, Hierarchy, NameMatch, NameMatchKind, StoreListing,
    store_url, DEFAULT_HEADER_IMAGE, DEFAULT_PRICING,
};
use super::traits::HierarchyLevel;

/// The three tag tables that share the (steam_appid, tag, tag_order) layout.
#[derive(Debug, Clone, Copy)]
pub enum TagTable {
    Steam,
    Unique,
    Subjective,
}

impl TagTable {
    fn name(self) -> &'static str {
        match self {
            TagTable::Steam => "steam_tags",
            TagTable::Unique => "unique_tags",
            TagTable::Subjective => "subjective_tags",
        }
    }
}

// --- Vector encoding ---

/// Decode a vector BLOB of little-endian f64 values.
///
/// Empty or ragged blobs (length not a multiple of 8), and blobs holding a
/// NaN or infinite component, are treated as "no vector" rather than an
/// error, so the pair falls back to tag similarity.
pub fn decode_vector(bytes: &[u8]) -> Option<Vec<f64>> {
    if bytes.is_empty() || bytes.len() % 8 != 0 {
        return None;
    }
    let values: Vec<f64> = bytes
        .chunks_exact(8)
        .map(|chunk| {
            let mut raw = [0u8; 8];
            raw.copy_from_slice(chunk);
            f64::from_le_bytes(raw)
        })
        .collect();
    if !values.iter().all(|v| v.is_finite()) {
        return None;
    }
    Some(values)
}

/// Encode a vector as a BLOB of little-endian f64 values.
pub fn encode_vector(values: &[f64]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_le_bytes()).collect()
}

/// Escape LIKE wildcards so user text matches literally (ESCAPE '\').
fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

// --- Game records ---

/// Load a game's full catalog record, tags included.
pub fn get_game(conn: &Connection, id: GameId) -> Result<Option<Game>> {
    let mut stmt = conn.prepare(
        "SELECT steam_appid, name, steam_description, main_genre, sub_genre, sub_sub_genre,
                art_style, theme, music_style
         FROM games WHERE steam_appid = ?1",
    )?;
    let game = stmt
        .query_row(params![id], |row| {
            Ok(Game {
                steam_appid: row.get(0)?,
                name: row.get(1)?,
                steam_description: row.get(2)?,
                hierarchy: Hierarchy {
                    main_genre: row.get(3)?,
                    sub_genre: row.get(4)?,
                    sub_sub_genre: row.get(5)?,
                },
                aesthetics: Aesthetics {
                    art_style: row.get(6)?,
                    theme: row.get(7)?,
                    music_style: row.get(8)?,
                },
                unique_tags: Vec::new(),
                subjective_tags: Vec::new(),
                steam_tags: Vec::new(),
                tag_ratios: BTreeMap::new(),
            })
        })
        .optional()?;

    let Some(mut game) = game else {
        return Ok(None);
    };

    game.unique_tags = get_tag_list(conn, TagTable::Unique, id)?;
    game.subjective_tags = get_tag_list(conn, TagTable::Subjective, id)?;
    game.steam_tags = get_tag_list(conn, TagTable::Steam, id)?;
    game.tag_ratios = get_tag_ratios(conn, id)?;

    Ok(Some(game))
}

/// Load one tag table's tags for a game, in stored order.
pub fn get_tag_list(conn: &Connection, table: TagTable, id: GameId) -> Result<Vec<String>> {
    let sql = format!(
        "SELECT tag FROM {} WHERE steam_appid = ?1 ORDER BY tag_order, id",
        table.name()
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![id], |row| row.get(0))?;

    let mut tags = Vec::new();
    for row in rows {
        tags.push(row?);
    }
    Ok(tags)
}

/// Load the tag ratio map for a game.
pub fn get_tag_ratios(conn: &Connection, id: GameId) -> Result<BTreeMap<String, i64>> {
    let mut stmt = conn.prepare("SELECT tag, ratio FROM tag_ratios WHERE steam_appid = ?1")?;
    let rows = stmt.query_map(params![id], |row| Ok((row.get(0)?, row.get(1)?)))?;

    let mut ratios = BTreeMap::new();
    for row in rows {
        let (tag, ratio): (String, i64) = row?;
        ratios.insert(tag, ratio);
    }
    Ok(ratios)
}

/// Load the (unique, subjective) tag sets.
pub fn get_tags(conn: &Connection, id: GameId) -> Result<(HashSet<String>, HashSet<String>)> {
    let unique = get_tag_list(conn, TagTable::Unique, id)?.into_iter().collect();
    let subjective = get_tag_list(conn, TagTable::Subjective, id)?
        .into_iter()
        .collect();
    Ok((unique, subjective))
}

/// Load the aesthetic triple for a game.
pub fn get_aesthetics(conn: &Connection, id: GameId) -> Result<Option<Aesthetics>> {
    let mut stmt =
        conn.prepare("SELECT art_style, theme, music_style FROM games WHERE steam_appid = ?1")?;
    let result = stmt
        .query_row(params![id], |row| {
            Ok(Aesthetics {
                art_style: row.get(0)?,
                theme: row.get(1)?,
                music_style: row.get(2)?,
            })
        })
        .optional()?;
    Ok(result)
}

/// Load the pre-computed vector for a game (None if absent or unreadable).
pub fn get_vector(conn: &Connection, id: GameId) -> Result<Option<Vec<f64>>> {
    let mut stmt = conn.prepare("SELECT vector_data FROM game_vectors WHERE steam_appid = ?1")?;
    let blob: Option<Option<Vec<u8>>> = stmt.query_row(params![id], |row| row.get(0)).optional()?;
    Ok(blob.flatten().and_then(|bytes| decode_vector(&bytes)))
}

/// Load the store listing. NULL columns fall back to the same defaults a
/// missing listing gets.
pub fn get_listing(conn: &Connection, id: GameId) -> Result<Option<StoreListing>> {
    let mut stmt = conn.prepare(
        "SELECT header_image, pricing, steam_url, positive_reviews, negative_reviews
         FROM store_listings WHERE steam_appid = ?1",
    )?;
    let result = stmt
        .query_row(params![id], |row| {
            let header_image: Option<String> = row.get(0)?;
            let pricing: Option<String> = row.get(1)?;
            let steam_url: Option<String> = row.get(2)?;
            let positive: Option<i64> = row.get(3)?;
            let negative: Option<i64> = row.get(4)?;
            Ok(StoreListing {
                header_image: non_empty(header_image)
                    .unwrap_or_else(|| DEFAULT_HEADER_IMAGE.to_string()),
                pricing: non_empty(pricing).unwrap_or_else(|| DEFAULT_PRICING.to_string()),
                steam_url: non_empty(steam_url).unwrap_or_else(|| store_url(id)),
                positive_reviews: positive.unwrap_or(0),
                negative_reviews: negative.unwrap_or(0),
            })
        })
        .optional()?;
    Ok(result)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

// --- Candidate queries ---

/// Games sharing the hierarchy at the given level, ascending id order.
pub fn find_by_hierarchy(
    conn: &Connection,
    hierarchy: &Hierarchy,
    level: HierarchyLevel,
    exclude_id: GameId,
    limit: usize,
) -> Result<Vec<GameId>> {
    let limit = limit as i64;
    let (label, ids) = match level {
        HierarchyLevel::Exact => {
            let mut stmt = conn.prepare(
                "SELECT steam_appid FROM games
                 WHERE steam_appid != ?1 AND main_genre = ?2 AND sub_genre = ?3
                   AND sub_sub_genre = ?4
                 ORDER BY steam_appid LIMIT ?5",
            )?;
            let rows = stmt.query_map(
                params![
                    exclude_id,
                    hierarchy.main_genre,
                    hierarchy.sub_genre,
                    hierarchy.sub_sub_genre,
                    limit
                ],
                |row| row.get(0),
            )?;
            ("exact", rows.collect::<rusqlite::Result<Vec<GameId>>>()?)
        }
        HierarchyLevel::SubGenre => {
            let mut stmt = conn.prepare(
                "SELECT steam_appid FROM games
                 WHERE steam_appid != ?1 AND main_genre = ?2 AND sub_genre = ?3
                   AND sub_sub_genre != ?4
                 ORDER BY steam_appid LIMIT ?5",
            )?;
            let rows = stmt.query_map(
                params![
                    exclude_id,
                    hierarchy.main_genre,
                    hierarchy.sub_genre,
                    hierarchy.sub_sub_genre,
                    limit
                ],
                |row| row.get(0),
            )?;
            ("sub", rows.collect::<rusqlite::Result<Vec<GameId>>>()?)
        }
        HierarchyLevel::MainGenre => {
            let mut stmt = conn.prepare(
                "SELECT steam_appid FROM games
                 WHERE steam_appid != ?1 AND main_genre = ?2 AND sub_genre != ?3
                 ORDER BY steam_appid LIMIT ?4",
            )?;
            let rows = stmt.query_map(
                params![exclude_id, hierarchy.main_genre, hierarchy.sub_genre, limit],
                |row| row.get(0),
            )?;
            ("main", rows.collect::<rusqlite::Result<Vec<GameId>>>()?)
        }
    };
    tracing::trace!(level = label, found = ids.len(), "hierarchy query");
    Ok(ids)
}

/// Games whose name, sub-sub genre, or any unique tag contains `substring`.
pub fn find_by_name_substring(
    conn: &Connection,
    substring: &str,
    exclude_id: GameId,
    limit: usize,
) -> Result<Vec<GameId>> {
    let pattern = format!("%{}%", escape_like(&substring.to_lowercase()));
    let mut stmt = conn.prepare(
        "SELECT DISTINCT g.steam_appid
         FROM games g
         LEFT JOIN unique_tags ut ON g.steam_appid = ut.steam_appid
         WHERE g.steam_appid != ?1 AND (
             LOWER(g.name) LIKE ?2 ESCAPE '\\' OR
             LOWER(g.sub_sub_genre) LIKE ?2 ESCAPE '\\' OR
             LOWER(ut.tag) LIKE ?2 ESCAPE '\\'
         )
         ORDER BY g.steam_appid
         LIMIT ?3",
    )?;
    let rows = stmt.query_map(params![exclude_id, pattern, limit as i64], |row| row.get(0))?;

    let mut ids = Vec::new();
    for row in rows {
        ids.push(row?);
    }
    Ok(ids)
}

// --- Browsing ---

/// Search by name. An exact (case-insensitive) match wins outright; otherwise
/// prefix matches rank above substring matches, then alphabetical.
pub fn search_by_name(conn: &Connection, query: &str, limit: usize) -> Result<Vec<NameMatch>> {
    let query = query.trim().to_lowercase();
    if query.chars().count() < 2 {
        return Ok(Vec::new());
    }

    let mut exact_stmt = conn.prepare(
        "SELECT steam_appid, name, main_genre, sub_genre, sub_sub_genre
         FROM games WHERE LOWER(name) = ?1
         ORDER BY steam_appid LIMIT 1",
    )?;
    let exact = exact_stmt
        .query_row(params![query], |row| {
            Ok(NameMatch {
                steam_appid: row.get(0)?,
                name: row.get(1)?,
                hierarchy: Hierarchy {
                    main_genre: row.get(2)?,
                    sub_genre: row.get(3)?,
                    sub_sub_genre: row.get(4)?,
                },
                relevance: 1.0,
                kind: NameMatchKind::Exact,
            })
        })
        .optional()?;
    if let Some(hit) = exact {
        return Ok(vec![hit]);
    }

    let escaped = escape_like(&query);
    let prefix = format!("{escaped}%");
    let contains = format!("%{escaped}%");
    let mut stmt = conn.prepare(
        "SELECT steam_appid, name, main_genre, sub_genre, sub_sub_genre,
                CASE WHEN LOWER(name) LIKE ?1 ESCAPE '\\' THEN 0.9 ELSE 0.7 END AS relevance
         FROM games
         WHERE LOWER(name) LIKE ?2 ESCAPE '\\'
         ORDER BY relevance DESC, name
         LIMIT ?3",
    )?;
    let rows = stmt.query_map(params![prefix, contains, limit as i64], |row| {
        Ok(NameMatch {
            steam_appid: row.get(0)?,
            name: row.get(1)?,
            hierarchy: Hierarchy {
                main_genre: row.get(2)?,
                sub_genre: row.get(3)?,
                sub_sub_genre: row.get(4)?,
            },
            relevance: row.get(5)?,
            kind: NameMatchKind::Fuzzy,
        })
    })?;

    let mut matches = Vec::new();
    for row in rows {
        matches.push(row?);
    }
    Ok(matches)
}

/// Totals plus the most common hierarchies and unique tags.
pub fn catalog_stats(conn: &Connection) -> Result<CatalogStats> {
    let total_games: i64 = conn.query_row("SELECT COUNT(*) FROM games", [], |row| row.get(0))?;
    // Only blobs get_vector can decode, and only for games still in the catalog.
    let total_vectors: i64 = conn.query_row(
        "SELECT COUNT(*) FROM game_vectors v
         JOIN games g ON g.steam_appid = v.steam_appid
         WHERE length(v.vector_data) > 0 AND length(v.vector_data) % 8 = 0",
        [],
        |row| row.get(0),
    )?;

    let mut stmt = conn.prepare(
        "SELECT main_genre, sub_genre, sub_sub_genre, COUNT(*) AS count
         FROM games
         GROUP BY main_genre, sub_genre, sub_sub_genre
         ORDER BY count DESC, main_genre, sub_genre, sub_sub_genre
         LIMIT 20",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok((
            Hierarchy {
                main_genre: row.get(0)?,
                sub_genre: row.get(1)?,
                sub_sub_genre: row.get(2)?,
            },
            row.get(3)?,
        ))
    })?;
    let mut top_hierarchies = Vec::new();
    for row in rows {
        top_hierarchies.push(row?);
    }

    let mut stmt = conn.prepare(
        "SELECT tag, COUNT(*) AS count
         FROM unique_tags
         GROUP BY tag
         ORDER BY count DESC, tag
         LIMIT 20",
    )?;
    let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;
    let mut popular_unique_tags = Vec::new();
    for row in rows {
        popular_unique_tags.push(row?);
    }

    Ok(CatalogStats {
        total_games,
        total_vectors,
        top_hierarchies,
        popular_unique_tags,
    })
}

// --- Writes (import) ---

/// Insert or replace a game and all of its tag rows.
pub fn upsert_game(conn: &Connection, game: &Game) -> Result<()> {
    conn.execute(
        "INSERT INTO games (steam_appid, name, steam_description, main_genre, sub_genre,
                            sub_sub_genre, art_style, theme, music_style)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
         ON CONFLICT(steam_appid) DO UPDATE SET
            name = ?2,
            steam_description = ?3,
            main_genre = ?4,
            sub_genre = ?5,
            sub_sub_genre = ?6,
            art_style = ?7,
            theme = ?8,
            music_style = ?9",
        params![
            game.steam_appid,
            game.name,
            game.steam_description,
            game.hierarchy.main_genre,
            game.hierarchy.sub_genre,
            game.hierarchy.sub_sub_genre,
            game.aesthetics.art_style,
            game.aesthetics.theme,
            game.aesthetics.music_style,
        ],
    )?;

    replace_tags(conn, TagTable::Steam, game.steam_appid, &game.steam_tags)?;
    replace_tags(conn, TagTable::Unique, game.steam_appid, &game.unique_tags)?;
    replace_tags(conn, TagTable::Subjective, game.steam_appid, &game.subjective_tags)?;

    conn.execute(
        "DELETE FROM tag_ratios WHERE steam_appid = ?1",
        params![game.steam_appid],
    )?;
    for (tag, ratio) in &game.tag_ratios {
        conn.execute(
            "INSERT INTO tag_ratios (steam_appid, tag, ratio) VALUES (?1, ?2, ?3)",
            params![game.steam_appid, tag, ratio],
        )?;
    }
    Ok(())
}

fn replace_tags(conn: &Connection, table: TagTable, id: GameId, tags: &[String]) -> Result<()> {
    conn.execute(
        &format!("DELETE FROM {} WHERE steam_appid = ?1", table.name()),
        params![id],
    )?;
    let sql = format!(
        "INSERT INTO {} (steam_appid, tag, tag_order) VALUES (?1, ?2, ?3)",
        table.name()
    );
    let mut stmt = conn.prepare(&sql)?;
    for (order, tag) in tags.iter().enumerate() {
        stmt.execute(params![id, tag, order as i64])?;
    }
    Ok(())
}

/// Store (or replace) a game's vector.
pub fn set_vector(conn: &Connection, id: GameId, values: &[f64]) -> Result<()> {
    conn.execute(
        "INSERT INTO game_vectors (steam_appid, vector_data, vector_dimension)
         VALUES (?1, ?2, ?3)
         ON CONFLICT(steam_appid) DO UPDATE SET vector_data = ?2, vector_dimension = ?3",
        params![id, encode_vector(values), values.len() as i64],
    )?;
    Ok(())
}

/// Remove a game's vector, if it has one.
pub fn delete_vector(conn: &Connection, id: GameId) -> Result<()> {
    conn.execute("DELETE FROM game_vectors WHERE steam_appid = ?1", params![id])?;
    Ok(())
}

/// Remove a game's store listing, if it has one.
pub fn delete_listing(conn: &Connection, id: GameId) -> Result<()> {
    conn.execute("DELETE FROM store_listings WHERE steam_appid = ?1", params![id])?;
    Ok(())
}

/// Store (or replace) a game's store listing.
pub fn upsert_listing(conn: &Connection, id: GameId, listing: &StoreListing) -> Result<()> {
    conn.execute(
        "INSERT INTO store_listings (steam_appid, header_image, pricing, steam_url,
                                     positive_reviews, negative_reviews)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)
         ON CONFLICT(steam_appid) DO UPDATE SET
            header_image = ?2,
            pricing = ?3,
            steam_url = ?4,
            positive_reviews = ?5,
            negative_reviews = ?6",
        params![
            id,
            listing.header_image,
            listing.pricing,
            listing.steam_url,
            listing.positive_reviews,
            listing.negative_reviews,
        ],
    )?;
    Ok(())
}
