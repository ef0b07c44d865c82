// Data models — Rust structs that map to catalog rows.
//
// These are the types that flow through the engine and the surfaces. They're
// separate from the database queries so other modules can use them without
// depending on rusqlite directly.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

/// Steam application id, the catalog's primary key.
pub type GameId = i64;

/// The three-level genre classification of a game.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Hierarchy {
    pub main_genre: String,
    pub sub_genre: String,
    pub sub_sub_genre: String,
}

impl Hierarchy {
    pub fn new(main: &str, sub: &str, sub_sub: &str) -> Self {
        Self {
            main_genre: main.to_string(),
            sub_genre: sub.to_string(),
            sub_sub_genre: sub_sub.to_string(),
        }
    }
}

impl std::fmt::Display for Hierarchy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} → {} → {}",
            self.main_genre, self.sub_genre, self.sub_sub_genre
        )
    }
}

/// Art style, theme, and music style. Any of them may be unclassified.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Aesthetics {
    pub art_style: Option<String>,
    pub theme: Option<String>,
    pub music_style: Option<String>,
}

/// A game as the catalog knows it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Game {
    pub steam_appid: GameId,
    pub name: String,
    #[serde(default)]
    pub steam_description: Option<String>,
    #[serde(flatten)]
    pub hierarchy: Hierarchy,
    #[serde(flatten)]
    pub aesthetics: Aesthetics,
    /// Objective, distinguishing tags.
    #[serde(default)]
    pub unique_tags: Vec<String>,
    /// Opinionated tags.
    #[serde(default)]
    pub subjective_tags: Vec<String>,
    /// Platform tags in their original order.
    #[serde(default)]
    pub steam_tags: Vec<String>,
    /// Tag name to percentage of the game's identity.
    #[serde(default)]
    pub tag_ratios: BTreeMap<String, i64>,
}

impl Game {
    /// The union of unique and subjective tags. Jaccard similarity and the
    /// tag bonus both work over this set.
    pub fn tag_set(&self) -> HashSet<String> {
        self.unique_tags
            .iter()
            .chain(self.subjective_tags.iter())
            .cloned()
            .collect()
    }
}

pub const DEFAULT_HEADER_IMAGE: &str = "/static/logo.png";
pub const DEFAULT_PRICING: &str = "Unknown";

/// Store-page data: imagery, pricing, review counts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreListing {
    pub header_image: String,
    pub pricing: String,
    pub steam_url: String,
    pub positive_reviews: i64,
    pub negative_reviews: i64,
}

impl StoreListing {
    /// The listing shown when the catalog has no store data for a game.
    pub fn fallback(steam_appid: GameId) -> Self {
        Self {
            header_image: DEFAULT_HEADER_IMAGE.to_string(),
            pricing: DEFAULT_PRICING.to_string(),
            steam_url: store_url(steam_appid),
            positive_reviews: 0,
            negative_reviews: 0,
        }
    }
}

pub fn store_url(steam_appid: GameId) -> String {
    format!("https://store.steampowered.com/app/{steam_appid}/")
}

/// A game joined with its store listing, as the surfaces render it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameDetails {
    #[serde(flatten)]
    pub game: Game,
    #[serde(flatten)]
    pub listing: StoreListing,
}

/// How a name search result matched the query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NameMatchKind {
    Exact,
    Fuzzy,
}

/// One hit from a name search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NameMatch {
    pub steam_appid: GameId,
    pub name: String,
    #[serde(flatten)]
    pub hierarchy: Hierarchy,
    /// 1.0 exact, 0.9 prefix, 0.7 substring.
    pub relevance: f64,
    pub kind: NameMatchKind,
}

/// Aggregate numbers about the catalog.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogStats {
    pub total_games: i64,
    pub total_vectors: i64,
    pub top_hierarchies: Vec<(Hierarchy, i64)>,
    pub popular_unique_tags: Vec<(String, i64)>,
}
