// Recommender — the request-level orchestration.
//
// For one target game:
//   1. resolve the target (unknown → empty result, logged at warn)
//   2. run the soulslike detector once
//   3. select candidates
//   4. score each candidate: base similarity + hierarchy bonus + preference
//      bonus, capped at 1.0
//   5. stable sort by final score descending, truncate to the limit
//
// A candidate id that no longer resolves to a catalog record is skipped.
// Store errors abort the whole request; nothing is retried.

use std::sync::Arc;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::candidates::{is_soulslike, CandidateSelector, MatchType};
use super::preferences::{PreferenceOptions, PreferenceScorer, TagCombo, UserPreferences};
use super::similarity::SimilarityScorer;
use crate::db::models::{Game, GameDetails, GameId, StoreListing};
use crate::db::CatalogStore;

/// Score breakdown for one recommended game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredResult {
    pub steam_appid: GameId,
    /// Final score in [0, 1].
    pub score: f64,
    pub base_similarity: f64,
    pub hierarchy_bonus: f64,
    pub preference_bonus: f64,
    pub match_type: MatchType,
}

/// A scored result together with the game's display data.
#[derive(Debug, Clone, Serialize)]
pub struct Recommendation {
    #[serde(flatten)]
    pub scored: ScoredResult,
    pub game: GameDetails,
}

/// Combine the three score parts. The sum is capped at 1.0 before ranking.
pub fn final_score(base_similarity: f64, hierarchy_bonus: f64, preference_bonus: f64) -> f64 {
    (base_similarity + hierarchy_bonus + preference_bonus).min(1.0)
}

/// Stable descending sort by final score. Ties keep candidate order.
pub fn rank(results: &mut [ScoredResult]) {
    results.sort_by(|a, b| b.score.total_cmp(&a.score));
}

pub struct Recommender {
    store: Arc<dyn CatalogStore>,
    selector: CandidateSelector,
    similarity: SimilarityScorer,
    preferences: PreferenceScorer,
    detect_soulslike: fn(&Game) -> bool,
}

impl Recommender {
    /// A recommender with the stock combo table and soulslike heuristic.
    pub fn new(store: Arc<dyn CatalogStore>) -> Self {
        Self::with_combos(store, TagCombo::defaults())
    }

    pub fn with_combos(store: Arc<dyn CatalogStore>, combos: Vec<TagCombo>) -> Self {
        Self {
            selector: CandidateSelector::new(Arc::clone(&store)),
            similarity: SimilarityScorer::new(Arc::clone(&store)),
            preferences: PreferenceScorer::new(Arc::clone(&store), combos),
            store,
            detect_soulslike: is_soulslike,
        }
    }

    /// Swap the soulslike classifier.
    pub fn with_soulslike_detector(mut self, detector: fn(&Game) -> bool) -> Self {
        self.detect_soulslike = detector;
        self
    }

    pub fn store(&self) -> &Arc<dyn CatalogStore> {
        &self.store
    }

    /// Ranked recommendations for `target_id`, at most `limit` of them.
    pub async fn recommend(
        &self,
        target_id: GameId,
        prefs: Option<&UserPreferences>,
        limit: usize,
    ) -> Result<Vec<ScoredResult>> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let Some(target) = self.store.get_game(target_id).await? else {
            warn!(steam_appid = target_id, "Target game not found in catalog");
            return Ok(Vec::new());
        };

        info!(
            steam_appid = target_id,
            name = %target.name,
            hierarchy = %target.hierarchy,
            "Finding similar games"
        );

        let soulslike = (self.detect_soulslike)(&target);
        if soulslike {
            info!(name = %target.name, "Soulslike target, searching soulslike games first");
        }

        let candidates = self.selector.select(&target, soulslike).await?;
        if candidates.is_empty() {
            info!(steam_appid = target_id, "No candidates found");
            return Ok(Vec::new());
        }

        let profile = self.similarity.profile(&target).await?;
        let prefs = prefs.filter(|p| !p.is_empty());

        let mut results = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            let id = candidate.steam_appid;

            let Some(aesthetics) = self.store.get_aesthetics(id).await? else {
                debug!(steam_appid = id, "Candidate missing from catalog, skipping");
                continue;
            };

            let similarity = self.similarity.compare(&profile, id).await?;
            debug!(
                steam_appid = id,
                method = similarity.method(),
                value = similarity.value(),
                "Base similarity"
            );

            let preference_bonus = match prefs {
                Some(prefs) => self.preferences.bonus_with(id, &aesthetics, prefs).await?,
                None => 0.0,
            };

            let base_similarity = similarity.value();
            let hierarchy_bonus = candidate.hierarchy_bonus();
            results.push(ScoredResult {
                steam_appid: id,
                score: final_score(base_similarity, hierarchy_bonus, preference_bonus),
                base_similarity,
                hierarchy_bonus,
                preference_bonus,
                match_type: candidate.match_type,
            });
        }

        rank(&mut results);
        results.truncate(limit);

        info!(
            steam_appid = target_id,
            returned = results.len(),
            "Recommendations ready"
        );
        Ok(results)
    }

    /// Like `recommend`, with each result's display data attached. Results
    /// whose record disappeared between scoring and lookup are dropped.
    pub async fn recommend_detailed(
        &self,
        target_id: GameId,
        prefs: Option<&UserPreferences>,
        limit: usize,
    ) -> Result<Vec<Recommendation>> {
        let scored = self.recommend(target_id, prefs, limit).await?;
        let mut detailed = Vec::with_capacity(scored.len());
        for result in scored {
            match self.game_details(result.steam_appid).await? {
                Some(game) => detailed.push(Recommendation {
                    scored: result,
                    game,
                }),
                None => debug!(
                    steam_appid = result.steam_appid,
                    "Recommended game vanished before lookup"
                ),
            }
        }
        Ok(detailed)
    }

    /// A game's catalog record plus store listing (or listing defaults).
    pub async fn game_details(&self, id: GameId) -> Result<Option<GameDetails>> {
        let Some(game) = self.store.get_game(id).await? else {
            return Ok(None);
        };
        let listing = match self.store.get_listing(id).await? {
            Some(listing) => listing,
            None => StoreListing::fallback(id),
        };
        Ok(Some(GameDetails { game, listing }))
    }

    /// The preference options a reference game offers.
    pub async fn available_preferences(&self, id: GameId) -> Result<Option<PreferenceOptions>> {
        Ok(self.store.get_game(id).await?.map(PreferenceOptions::from))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(id: GameId, score: f64) -> ScoredResult {
        ScoredResult {
            steam_appid: id,
            score,
            base_similarity: 0.0,
            hierarchy_bonus: 0.0,
            preference_bonus: 0.0,
            match_type: MatchType::Exact,
        }
    }

    #[test]
    fn test_final_score_capped() {
        assert_eq!(final_score(0.9, 0.5, 0.35), 1.0);
        assert!((final_score(0.2, 0.15, 0.1) - 0.45).abs() < 1e-9);
    }

    #[test]
    fn test_rank_is_stable_on_ties() {
        let mut results = vec![result(3, 0.5), result(1, 0.9), result(2, 0.5)];
        rank(&mut results);
        let ids: Vec<GameId> = results.iter().map(|r| r.steam_appid).collect();
        assert_eq!(ids, vec![1, 3, 2]);
    }
}
