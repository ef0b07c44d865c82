// Candidate selection — progressive widening over the genre hierarchy.
//
// Stages run in a fixed order and each one only adds games no earlier stage
// chose:
//
//   1. soulslike  (only when the target looks like a soulslike)   cap 20
//   2. exact      (same main / sub / sub-sub genre)               cap 15
//   3. sub        (same main / sub, different sub-sub)            cap 15
//   4. main       (same main, different sub)                      cap 10
//
// Stages 3 and 4 are broadening: they only run while fewer than
// BROADEN_BELOW candidates have been found. The final list is capped at
// MAX_CANDIDATES and keeps discovery order.

use std::collections::HashSet;
use std::sync::Arc;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::db::models::{Game, GameId};
use crate::db::{CatalogStore, HierarchyLevel};

pub const MAX_CANDIDATES: usize = 50;
pub const SOULSLIKE_CAP: usize = 20;
pub const EXACT_CAP: usize = 15;
pub const SUB_GENRE_CAP: usize = 15;
pub const MAIN_GENRE_CAP: usize = 10;

/// Broadening stages run only while the list is shorter than this.
pub const BROADEN_BELOW: usize = EXACT_CAP;

/// Name fragments that mark a soulslike target.
const SOULSLIKE_NAME_MARKERS: [&str; 3] = ["souls", "elden ring", "bloodborne"];
/// Unique-tag fragments that mark a soulslike target.
const SOULSLIKE_TAG_MARKERS: [&str; 4] = ["souls", "soulslike", "stamina", "challenging-but-fair"];
/// Fragment used to find other soulslikes in the catalog. It also matches
/// anything containing "soulslike".
const SOULSLIKE_CANDIDATE_MARKER: &str = "souls";

/// Why a candidate was chosen. Each kind carries a fixed hierarchy bonus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchType {
    Soulslike,
    Exact,
    Sub,
    Main,
}

impl MatchType {
    /// The similarity reward for matching at this level.
    pub const fn hierarchy_bonus(self) -> f64 {
        match self {
            MatchType::Soulslike => 0.5,
            MatchType::Exact => 0.4,
            MatchType::Sub => 0.25,
            MatchType::Main => 0.15,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MatchType::Soulslike => "soulslike",
            MatchType::Exact => "exact",
            MatchType::Sub => "sub",
            MatchType::Main => "main",
        }
    }
}

impl std::fmt::Display for MatchType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A game worth scoring against the target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    pub steam_appid: GameId,
    pub match_type: MatchType,
}

impl Candidate {
    pub fn hierarchy_bonus(&self) -> f64 {
        self.match_type.hierarchy_bonus()
    }
}

/// Substring heuristic for soulslike games.
///
/// Checks the name, the sub-sub genre, and the unique tags, all
/// case-insensitively. Kept as a plain function so a different classifier
/// can be dropped in via `Recommender::with_soulslike_detector`.
pub fn is_soulslike(game: &Game) -> bool {
    let name = game.name.to_lowercase();
    if SOULSLIKE_NAME_MARKERS.iter().any(|m| name.contains(m)) {
        return true;
    }

    if game
        .unique_tags
        .iter()
        .map(|t| t.to_lowercase())
        .any(|t| SOULSLIKE_TAG_MARKERS.iter().any(|m| t.contains(m)))
    {
        return true;
    }

    game.hierarchy.sub_sub_genre.to_lowercase().contains("souls")
}

/// Running state of one selection pass.
struct Selection {
    chosen: Vec<Candidate>,
    seen: HashSet<GameId>,
}

impl Selection {
    fn new(target_id: GameId) -> Self {
        let mut seen = HashSet::new();
        seen.insert(target_id);
        Self {
            chosen: Vec::new(),
            seen,
        }
    }

    /// Add unseen ids in order until `cap` new candidates were added for
    /// this stage. Returns how many were added.
    fn extend(&mut self, ids: Vec<GameId>, match_type: MatchType, cap: usize) -> usize {
        let mut added = 0;
        for id in ids {
            if added >= cap {
                break;
            }
            if self.seen.insert(id) {
                self.chosen.push(Candidate {
                    steam_appid: id,
                    match_type,
                });
                added += 1;
            }
        }
        added
    }

    fn len(&self) -> usize {
        self.chosen.len()
    }
}

pub struct CandidateSelector {
    store: Arc<dyn CatalogStore>,
}

impl CandidateSelector {
    pub fn new(store: Arc<dyn CatalogStore>) -> Self {
        Self { store }
    }

    /// Select candidates for a target id, detecting soulslike mode with the
    /// default heuristic. An unknown target yields an empty list.
    pub async fn select_for(&self, target_id: GameId) -> Result<Vec<Candidate>> {
        match self.store.get_game(target_id).await? {
            Some(target) => self.select(&target, is_soulslike(&target)).await,
            None => Ok(Vec::new()),
        }
    }

    /// Select candidates for an already-resolved target.
    pub async fn select(&self, target: &Game, soulslike: bool) -> Result<Vec<Candidate>> {
        let target_id = target.steam_appid;
        let mut selection = Selection::new(target_id);

        if soulslike {
            let ids = self
                .store
                .find_by_name_substring(SOULSLIKE_CANDIDATE_MARKER, target_id, SOULSLIKE_CAP)
                .await?;
            let added = selection.extend(ids, MatchType::Soulslike, SOULSLIKE_CAP);
            debug!(stage = "soulslike", added, "Candidate stage complete");
        }

        self.run_stage(
            &mut selection,
            target,
            HierarchyLevel::Exact,
            MatchType::Exact,
            EXACT_CAP,
        )
        .await?;

        if selection.len() < BROADEN_BELOW {
            self.run_stage(
                &mut selection,
                target,
                HierarchyLevel::SubGenre,
                MatchType::Sub,
                SUB_GENRE_CAP,
            )
            .await?;
        }

        if selection.len() < BROADEN_BELOW {
            self.run_stage(
                &mut selection,
                target,
                HierarchyLevel::MainGenre,
                MatchType::Main,
                MAIN_GENRE_CAP,
            )
            .await?;
        }

        let mut chosen = selection.chosen;
        chosen.truncate(MAX_CANDIDATES);
        Ok(chosen)
    }

    async fn run_stage(
        &self,
        selection: &mut Selection,
        target: &Game,
        level: HierarchyLevel,
        match_type: MatchType,
        cap: usize,
    ) -> Result<()> {
        // Over-fetch by the number already chosen so de-duplication can't
        // starve the stage.
        let ids = self
            .store
            .find_by_hierarchy(
                &target.hierarchy,
                level,
                target.steam_appid,
                cap + selection.len(),
            )
            .await?;
        let added = selection.extend(ids, match_type, cap);
        debug!(stage = match_type.as_str(), added, "Candidate stage complete");
        Ok(())
    }
}
