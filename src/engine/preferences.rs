// Preference bonus — rewards candidates that match what the user asked for.
//
// Four additive parts, each computed by a pure function so they can be tested
// without a catalog:
//
//   aesthetics   +0.1 per requested dimension that matches exactly
//   tags         (matched / requested) × 0.15 over unique ∪ subjective tags
//   steam tags   (matched / requested) × 0.25, only when something matched
//   combos       fixed bonus per tag pair present on both sides
//
// Combos only fire inside the steam-tag branch. The table is plain data
// handed to PreferenceScorer::new, so it can be changed without code edits.
//
// Tag and aesthetic matching is case-sensitive. Steam tags are compared
// case-insensitively because the storefront capitalizes them ("Roguelike")
// while users usually don't.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::db::models::{Aesthetics, Game, GameId, Hierarchy};
use crate::db::CatalogStore;

pub const AESTHETIC_MATCH_BONUS: f64 = 0.1;
pub const TAG_MATCH_WEIGHT: f64 = 0.15;
pub const STEAM_TAG_MATCH_WEIGHT: f64 = 0.25;

/// Requested aesthetic values. `None` or an empty string means "don't care".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AestheticPreferences {
    #[serde(default)]
    pub art_style: Option<String>,
    #[serde(default)]
    pub theme: Option<String>,
    #[serde(default)]
    pub music_style: Option<String>,
}

impl AestheticPreferences {
    pub fn is_empty(&self) -> bool {
        [&self.art_style, &self.theme, &self.music_style]
            .iter()
            .all(|v| requested(v).is_none())
    }
}

/// Everything a user can ask for on top of "games like this one".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserPreferences {
    #[serde(default)]
    pub aesthetics: AestheticPreferences,
    #[serde(default)]
    pub preferred_tags: Vec<String>,
    #[serde(default)]
    pub preferred_steam_tags: Vec<String>,
}

impl UserPreferences {
    pub fn is_empty(&self) -> bool {
        self.aesthetics.is_empty()
            && distinct(&self.preferred_tags).is_empty()
            && distinct(&self.preferred_steam_tags).is_empty()
    }
}

/// A set of steam tags that earns an extra bonus when the user prefers all
/// of them and the candidate carries all of them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagCombo {
    pub tags: Vec<String>,
    pub bonus: f64,
}

impl TagCombo {
    pub fn new(tags: &[&str], bonus: f64) -> Self {
        Self {
            tags: tags.iter().map(|t| t.to_string()).collect(),
            bonus,
        }
    }

    /// The stock combo table.
    pub fn defaults() -> Vec<TagCombo> {
        vec![
            TagCombo::new(&["roguelike", "procedural generation"], 0.1),
            TagCombo::new(&["souls-like", "difficult"], 0.1),
            TagCombo::new(&["metroidvania", "exploration"], 0.1),
            TagCombo::new(&["platformer", "pixel graphics"], 0.05),
            TagCombo::new(&["puzzle", "relaxing"], 0.05),
        ]
    }
}

fn requested(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

/// Preferences with blanks and repeats removed, first occurrence wins.
fn distinct(values: &[String]) -> Vec<&str> {
    let mut seen = HashSet::new();
    values
        .iter()
        .map(|v| v.as_str())
        .filter(|v| !v.trim().is_empty())
        .filter(|v| seen.insert(*v))
        .collect()
}

fn lowercase_set<'a>(values: impl IntoIterator<Item = &'a str>) -> HashSet<String> {
    values.into_iter().map(|v| v.to_lowercase()).collect()
}

/// +0.1 for each requested aesthetic dimension the candidate matches.
pub fn aesthetic_bonus(wanted: &AestheticPreferences, candidate: &Aesthetics) -> f64 {
    let pairs = [
        (&wanted.art_style, &candidate.art_style),
        (&wanted.theme, &candidate.theme),
        (&wanted.music_style, &candidate.music_style),
    ];
    let matched = pairs
        .iter()
        .filter(|(want, have)| match requested(want) {
            Some(want) => have.as_deref() == Some(want),
            None => false,
        })
        .count();
    matched as f64 * AESTHETIC_MATCH_BONUS
}

/// (matched / requested) × 0.15 against the candidate's unique ∪ subjective tags.
pub fn tag_bonus(preferred: &[String], candidate_tags: &HashSet<String>) -> f64 {
    let wanted = distinct(preferred);
    if wanted.is_empty() {
        return 0.0;
    }
    let matched = wanted.iter().filter(|t| candidate_tags.contains(**t)).count();
    matched as f64 / wanted.len() as f64 * TAG_MATCH_WEIGHT
}

/// Sum of every combo fully present in both the preferences and the
/// candidate's steam tags.
pub fn combo_bonus(preferred: &[String], candidate_steam_tags: &[String], combos: &[TagCombo]) -> f64 {
    let wanted = lowercase_set(preferred.iter().map(|t| t.as_str()));
    let have = lowercase_set(candidate_steam_tags.iter().map(|t| t.as_str()));

    combos
        .iter()
        .filter(|combo| !combo.tags.is_empty())
        .filter(|combo| {
            combo.tags.iter().all(|tag| {
                let tag = tag.to_lowercase();
                wanted.contains(&tag) && have.contains(&tag)
            })
        })
        .map(|combo| combo.bonus)
        .sum()
}

/// (matched / requested) × 0.25 plus combos. Zero unless at least one
/// preferred steam tag matched.
pub fn steam_tag_bonus(
    preferred: &[String],
    candidate_steam_tags: &[String],
    combos: &[TagCombo],
) -> f64 {
    let wanted = lowercase_set(distinct(preferred));
    if wanted.is_empty() {
        return 0.0;
    }
    let have = lowercase_set(candidate_steam_tags.iter().map(|t| t.as_str()));
    let matched = wanted.iter().filter(|t| have.contains(*t)).count();
    if matched == 0 {
        return 0.0;
    }

    matched as f64 / wanted.len() as f64 * STEAM_TAG_MATCH_WEIGHT
        + combo_bonus(preferred, candidate_steam_tags, combos)
}

pub struct PreferenceScorer {
    store: Arc<dyn CatalogStore>,
    combos: Vec<TagCombo>,
}

impl PreferenceScorer {
    pub fn new(store: Arc<dyn CatalogStore>, combos: Vec<TagCombo>) -> Self {
        Self { store, combos }
    }

    /// Bonus for a candidate id. No preferences, or an unknown candidate,
    /// scores 0.0.
    pub async fn bonus(&self, candidate_id: GameId, prefs: Option<&UserPreferences>) -> Result<f64> {
        let Some(prefs) = prefs.filter(|p| !p.is_empty()) else {
            return Ok(0.0);
        };
        match self.store.get_aesthetics(candidate_id).await? {
            Some(aesthetics) => self.bonus_with(candidate_id, &aesthetics, prefs).await,
            None => Ok(0.0),
        }
    }

    /// Bonus for a candidate whose aesthetics are already loaded. Tag lists
    /// are only fetched for the parts the user actually asked for.
    pub async fn bonus_with(
        &self,
        candidate_id: GameId,
        aesthetics: &Aesthetics,
        prefs: &UserPreferences,
    ) -> Result<f64> {
        let mut bonus = aesthetic_bonus(&prefs.aesthetics, aesthetics);

        if !distinct(&prefs.preferred_tags).is_empty() {
            let (unique, subjective) = self.store.get_tags(candidate_id).await?;
            let tags: HashSet<String> = unique.into_iter().chain(subjective).collect();
            bonus += tag_bonus(&prefs.preferred_tags, &tags);
        }

        if !distinct(&prefs.preferred_steam_tags).is_empty() {
            let steam_tags = self.store.get_steam_tags(candidate_id).await?;
            bonus += steam_tag_bonus(&prefs.preferred_steam_tags, &steam_tags, &self.combos);
        }

        Ok(bonus)
    }
}

/// What a user could filter on for a given reference game: the game's own
/// attributes, offered back as preference options.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PreferenceOptions {
    pub steam_appid: GameId,
    pub name: String,
    pub hierarchy: Hierarchy,
    pub aesthetics: Aesthetics,
    pub unique_tags: Vec<String>,
    pub subjective_tags: Vec<String>,
    pub steam_tags: Vec<String>,
    pub tag_ratios: BTreeMap<String, i64>,
}

impl From<Game> for PreferenceOptions {
    fn from(game: Game) -> Self {
        Self {
            steam_appid: game.steam_appid,
            name: game.name,
            hierarchy: game.hierarchy,
            aesthetics: game.aesthetics,
            unique_tags: game.unique_tags,
            subjective_tags: game.subjective_tags,
            steam_tags: game.steam_tags,
            tag_ratios: game.tag_ratios,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_empty_string_aesthetic_is_unset() {
        let wanted = AestheticPreferences {
            art_style: Some(String::new()),
            ..Default::default()
        };
        assert!(wanted.is_empty());
        let candidate = Aesthetics {
            art_style: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(aesthetic_bonus(&wanted, &candidate), 0.0);
    }

    #[test]
    fn test_aesthetic_match_is_case_sensitive() {
        let wanted = AestheticPreferences {
            theme: Some("dark fantasy".to_string()),
            ..Default::default()
        };
        let candidate = Aesthetics {
            theme: Some("Dark Fantasy".to_string()),
            ..Default::default()
        };
        assert_eq!(aesthetic_bonus(&wanted, &candidate), 0.0);
    }

    #[test]
    fn test_duplicate_preferred_tags_count_once() {
        let candidate: HashSet<String> = strings(&["atmospheric"]).into_iter().collect();
        let bonus = tag_bonus(&strings(&["atmospheric", "atmospheric", "cozy"]), &candidate);
        assert!(approx(bonus, 0.075));
    }

    #[test]
    fn test_combo_requires_both_sides() {
        let combos = TagCombo::defaults();
        // Candidate has both tags but the user only asked for one.
        let bonus = combo_bonus(
            &strings(&["Metroidvania"]),
            &strings(&["Metroidvania", "Exploration"]),
            &combos,
        );
        assert_eq!(bonus, 0.0);
    }

    #[test]
    fn test_steam_tags_ignore_case() {
        let bonus = steam_tag_bonus(
            &strings(&["roguelike"]),
            &strings(&["Roguelike"]),
            &TagCombo::defaults(),
        );
        assert!(approx(bonus, 0.25));
    }

    #[test]
    fn test_user_preferences_deserialize_partial() {
        let prefs: UserPreferences =
            serde_json::from_str(r#"{"preferred_steam_tags": ["Puzzle"]}"#).unwrap();
        assert!(prefs.aesthetics.is_empty());
        assert!(!prefs.is_empty());
    }
}
