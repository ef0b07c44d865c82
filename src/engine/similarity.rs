// Base similarity between a target and a candidate.
//
// Two methods, picked per pair with an explicit check:
//
//   vector — cosine similarity of the pre-computed TF-IDF vectors, used when
//            BOTH games have one
//   tags   — Jaccard similarity of unique ∪ subjective tags otherwise
//
// Both land in [0, 1]. The method is reported back to the caller as part of
// the Similarity value so it can be logged.

use std::collections::HashSet;
use std::sync::Arc;

use anyhow::Result;

use crate::db::models::{Game, GameId};
use crate::db::CatalogStore;

/// Cosine similarity clamped to [0, 1].
///
/// Mismatched lengths, empty input, and zero-norm vectors all score 0.0,
/// as does any NaN or infinite component. TF-IDF vectors are non-negative
/// so the clamp rarely bites, but a negative cosine never becomes a
/// negative score.
pub fn cosine_similarity(a: &[f64], b: &[f64]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f64 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f64>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f64>().sqrt();

    let denom = norm_a * norm_b;
    if !denom.is_finite() || denom < f64::EPSILON {
        return 0.0;
    }
    let cosine = dot / denom;
    // clamp passes NaN through
    if cosine.is_nan() {
        0.0
    } else {
        cosine.clamp(0.0, 1.0)
    }
}

/// |A ∩ B| / |A ∪ B|, or 0.0 when the union is empty.
pub fn jaccard_similarity(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    let union = a.union(b).count();
    if union == 0 {
        return 0.0;
    }
    a.intersection(b).count() as f64 / union as f64
}

/// A similarity score tagged with the method that produced it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Similarity {
    Vector(f64),
    Tags(f64),
}

impl Similarity {
    pub fn value(self) -> f64 {
        match self {
            Similarity::Vector(v) | Similarity::Tags(v) => v,
        }
    }

    pub fn method(self) -> &'static str {
        match self {
            Similarity::Vector(_) => "vector",
            Similarity::Tags(_) => "tags",
        }
    }
}

/// Pick the method and compute it. Tag sets are only consulted when a
/// vector is missing on either side.
pub fn compare(
    target_vector: Option<&[f64]>,
    candidate_vector: Option<&[f64]>,
    target_tags: &HashSet<String>,
    candidate_tags: &HashSet<String>,
) -> Similarity {
    match (target_vector, candidate_vector) {
        (Some(a), Some(b)) => Similarity::Vector(cosine_similarity(a, b)),
        _ => Similarity::Tags(jaccard_similarity(target_tags, candidate_tags)),
    }
}

/// What the scorer needs to know about the target, loaded once per request.
#[derive(Debug, Clone)]
pub struct TargetProfile {
    pub steam_appid: GameId,
    pub vector: Option<Vec<f64>>,
    pub tags: HashSet<String>,
}

pub struct SimilarityScorer {
    store: Arc<dyn CatalogStore>,
}

impl SimilarityScorer {
    pub fn new(store: Arc<dyn CatalogStore>) -> Self {
        Self { store }
    }

    /// Build the target profile from an already-loaded game record.
    pub async fn profile(&self, target: &Game) -> Result<TargetProfile> {
        Ok(TargetProfile {
            steam_appid: target.steam_appid,
            vector: self.store.get_vector(target.steam_appid).await?,
            tags: target.tag_set(),
        })
    }

    /// Score one candidate against a loaded target profile. The candidate's
    /// vector is only fetched when the target has one.
    pub async fn compare(&self, target: &TargetProfile, candidate_id: GameId) -> Result<Similarity> {
        let candidate_vector = match target.vector {
            Some(_) => self.store.get_vector(candidate_id).await?,
            None => None,
        };
        let (unique, subjective) = self.store.get_tags(candidate_id).await?;
        let candidate_tags: HashSet<String> = unique.into_iter().chain(subjective).collect();

        Ok(compare(
            target.vector.as_deref(),
            candidate_vector.as_deref(),
            &target.tags,
            &candidate_tags,
        ))
    }

    /// Score a pair of games by id, loading both sides from the store.
    /// An unknown target scores against empty data (0.0).
    pub async fn score(&self, target_id: GameId, candidate_id: GameId) -> Result<f64> {
        let (unique, subjective) = self.store.get_tags(target_id).await?;
        let profile = TargetProfile {
            steam_appid: target_id,
            vector: self.store.get_vector(target_id).await?,
            tags: unique.into_iter().chain(subjective).collect(),
        };
        Ok(self.compare(&profile, candidate_id).await?.value())
    }
}
