// Candidate selection against in-memory catalogs.
//
// Catalogs are seeded through the JSON import path, the same way a real
// catalog gets built.

use std::sync::Arc;

use indicatif::ProgressBar;
use rusqlite::Connection;
use serde_json::{json, Value};

use kindred::db::import::{import_entries, parse_catalog};
use kindred::db::schema::create_tables;
use kindred::db::sqlite::SqliteCatalog;
use kindred::db::CatalogStore;
use kindred::engine::candidates::{
    is_soulslike, CandidateSelector, MatchType, EXACT_CAP, MAIN_GENRE_CAP, MAX_CANDIDATES,
    SOULSLIKE_CAP, SUB_GENRE_CAP,
};

fn catalog(games: Vec<Value>) -> Arc<dyn CatalogStore> {
    let mut conn = Connection::open_in_memory().unwrap();
    create_tables(&conn).unwrap();
    let entries = parse_catalog(&Value::Array(games).to_string()).unwrap();
    import_entries(&mut conn, entries, &ProgressBar::hidden()).unwrap();
    Arc::new(SqliteCatalog::new(conn))
}

fn game(id: i64, name: &str, main: &str, sub: &str, sub_sub: &str) -> Value {
    json!({
        "steam_appid": id,
        "name": name,
        "main_genre": main,
        "sub_genre": sub,
        "sub_sub_genre": sub_sub,
    })
}

fn count(candidates: &[kindred::engine::Candidate], match_type: MatchType) -> usize {
    candidates
        .iter()
        .filter(|c| c.match_type == match_type)
        .count()
}

// ============================================================
// Scenario A: exact stage fills up, broadening contributes nothing
// ============================================================

fn scenario_a_catalog() -> Arc<dyn CatalogStore> {
    let mut games = vec![game(1, "Target", "RPG", "Action RPG", "Soulslike")];
    for id in 100..120 {
        games.push(game(id, &format!("Triple {id}"), "RPG", "Action RPG", "Soulslike"));
    }
    for id in 200..205 {
        games.push(game(id, &format!("Sibling {id}"), "RPG", "Action RPG", "Hack and Slash"));
    }
    catalog(games)
}

#[tokio::test]
async fn scenario_a_exact_cap_leaves_no_room_for_sub_genre() {
    let store = scenario_a_catalog();
    let target = store.get_game(1).await.unwrap().unwrap();
    let selector = CandidateSelector::new(Arc::clone(&store));

    let candidates = selector.select(&target, false).await.unwrap();
    assert_eq!(candidates.len(), EXACT_CAP);
    assert_eq!(count(&candidates, MatchType::Exact), 15);
    assert_eq!(count(&candidates, MatchType::Sub), 0);
    // Ascending id order within a stage.
    let ids: Vec<i64> = candidates.iter().map(|c| c.steam_appid).collect();
    assert_eq!(ids, (100..115).collect::<Vec<_>>());
}

#[tokio::test]
async fn scenario_a_target_is_soulslike_by_sub_sub_genre() {
    let store = scenario_a_catalog();
    let target = store.get_game(1).await.unwrap().unwrap();
    assert!(is_soulslike(&target));

    let candidates = CandidateSelector::new(Arc::clone(&store))
        .select_for(1)
        .await
        .unwrap();
    // The 20 triple games all carry "Soulslike" as sub-sub genre, so the
    // soulslike stage claims them first and broadening still adds nothing.
    assert_eq!(count(&candidates, MatchType::Soulslike), SOULSLIKE_CAP);
    assert_eq!(count(&candidates, MatchType::Exact), 0);
    assert_eq!(count(&candidates, MatchType::Sub), 0);
}

// ============================================================
// Broadening
// ============================================================

#[tokio::test]
async fn short_exact_stage_broadens_to_sub_then_main() {
    let mut games = vec![game(1, "Celeste", "Action", "Platformer", "Precision")];
    games.push(game(2, "Super Meat Boy", "Action", "Platformer", "Precision"));
    games.push(game(3, "Hollow Knight", "Action", "Platformer", "Metroidvania"));
    games.push(game(4, "Ori", "Action", "Platformer", "Metroidvania"));
    games.push(game(5, "Hades", "Action", "Roguelike", "Dungeon Crawler"));
    games.push(game(6, "Stardew Valley", "Simulation", "Farming", "Life Sim"));
    let store = catalog(games);

    let candidates = CandidateSelector::new(store).select_for(1).await.unwrap();
    let summary: Vec<(i64, MatchType)> = candidates
        .iter()
        .map(|c| (c.steam_appid, c.match_type))
        .collect();
    assert_eq!(
        summary,
        vec![
            (2, MatchType::Exact),
            (3, MatchType::Sub),
            (4, MatchType::Sub),
            (5, MatchType::Main),
        ]
    );
}

#[tokio::test]
async fn broadening_stops_once_list_is_long_enough() {
    // 10 exact + 15 sub reaches 25 ≥ 15, so the main stage never runs.
    let mut games = vec![game(1, "Target", "Strategy", "4X", "Space")];
    for id in 10..20 {
        games.push(game(id, &format!("Exact {id}"), "Strategy", "4X", "Space"));
    }
    for id in 20..40 {
        games.push(game(id, &format!("Sub {id}"), "Strategy", "4X", "Fantasy"));
    }
    for id in 40..45 {
        games.push(game(id, &format!("Main {id}"), "Strategy", "RTS", "Historical"));
    }
    let candidates = CandidateSelector::new(catalog(games))
        .select_for(1)
        .await
        .unwrap();
    assert_eq!(count(&candidates, MatchType::Exact), 10);
    assert_eq!(count(&candidates, MatchType::Sub), SUB_GENRE_CAP);
    assert_eq!(count(&candidates, MatchType::Main), 0);
}

#[tokio::test]
async fn main_stage_respects_its_cap() {
    let mut games = vec![game(1, "Target", "Puzzle", "Logic", "Nonogram")];
    for id in 10..30 {
        games.push(game(id, &format!("Other {id}"), "Puzzle", "Physics", "Bridge"));
    }
    let candidates = CandidateSelector::new(catalog(games))
        .select_for(1)
        .await
        .unwrap();
    assert_eq!(candidates.len(), MAIN_GENRE_CAP);
    assert!(candidates.iter().all(|c| c.match_type == MatchType::Main));
}

// ============================================================
// Soulslike stage
// ============================================================

#[tokio::test]
async fn soulslike_stage_runs_first_and_deduplicates() {
    let games = vec![
        game(1, "DARK SOULS III", "RPG", "Action RPG", "Dark Fantasy"),
        game(2, "Demon's Souls", "RPG", "Action RPG", "Dark Fantasy"),
        json!({
            "steam_appid": 3, "name": "Lies of P",
            "main_genre": "RPG", "sub_genre": "Action RPG", "sub_sub_genre": "Dark Fantasy",
            "unique_tags": ["soulslike-combat"]
        }),
        game(4, "Diablo IV", "RPG", "Action RPG", "Dark Fantasy"),
        game(5, "Hollow Knight", "Action", "Platformer", "Metroidvania"),
    ];
    let store = catalog(games);

    let candidates = CandidateSelector::new(store).select_for(1).await.unwrap();
    let summary: Vec<(i64, MatchType)> = candidates
        .iter()
        .map(|c| (c.steam_appid, c.match_type))
        .collect();
    assert_eq!(
        summary,
        vec![
            (2, MatchType::Soulslike),
            (3, MatchType::Soulslike),
            (4, MatchType::Exact),
        ]
    );
}

// ============================================================
// Properties
// ============================================================

#[tokio::test]
async fn candidates_never_include_target_and_stay_bounded() {
    let mut games = vec![game(1, "Souls Target", "RPG", "Action RPG", "Soulslike")];
    for id in 2..120 {
        let sub = if id % 3 == 0 { "Action RPG" } else { "CRPG" };
        let sub_sub = if id % 2 == 0 { "Soulslike" } else { "Isometric" };
        games.push(game(id, &format!("Game {id}"), "RPG", sub, sub_sub));
    }
    let candidates = CandidateSelector::new(catalog(games))
        .select_for(1)
        .await
        .unwrap();

    assert!(candidates.len() <= MAX_CANDIDATES);
    assert!(candidates.iter().all(|c| c.steam_appid != 1));

    let mut ids: Vec<i64> = candidates.iter().map(|c| c.steam_appid).collect();
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), candidates.len(), "no candidate appears twice");
}

#[tokio::test]
async fn hierarchy_bonus_is_tied_to_match_type() {
    let mut games = vec![game(1, "Elden Ring", "RPG", "Action RPG", "Open World")];
    games.push(game(2, "Dark Souls", "RPG", "Action RPG", "Dark Fantasy"));
    games.push(game(3, "Skyrim", "RPG", "Action RPG", "Open World"));
    games.push(game(4, "Diablo", "RPG", "Action RPG", "Loot"));
    games.push(game(5, "Baldur's Gate", "RPG", "CRPG", "Party"));
    let candidates = CandidateSelector::new(catalog(games))
        .select_for(1)
        .await
        .unwrap();

    assert_eq!(candidates.len(), 4);
    for c in &candidates {
        let expected = match c.match_type {
            MatchType::Soulslike => 0.5,
            MatchType::Exact => 0.4,
            MatchType::Sub => 0.25,
            MatchType::Main => 0.15,
        };
        assert_eq!(c.hierarchy_bonus(), expected);
    }
}

#[tokio::test]
async fn unknown_target_yields_no_candidates() {
    let store = catalog(vec![game(1, "Celeste", "Action", "Platformer", "Precision")]);
    let candidates = CandidateSelector::new(store).select_for(42).await.unwrap();
    assert!(candidates.is_empty());
}
