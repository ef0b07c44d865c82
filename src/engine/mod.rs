// Recommendation engine.
//
// candidates  — which games get scored at all
// similarity  — base similarity (TF-IDF cosine, tag Jaccard fallback)
// preferences — bonus for matching what the user asked for
// recommend   — ties the three together per request
//
// The pure scoring functions live next to their store-backed wrappers so
// they can be unit tested without a catalog.

pub mod candidates;
pub mod preferences;
pub mod recommend;
pub mod similarity;

pub use candidates::{is_soulslike, Candidate, CandidateSelector, MatchType};
pub use preferences::{
    AestheticPreferences, PreferenceOptions, PreferenceScorer, TagCombo, UserPreferences,
};
pub use recommend::{Recommendation, Recommender, ScoredResult};
pub use similarity::{Similarity, SimilarityScorer};
