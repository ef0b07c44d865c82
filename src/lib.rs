// Kindred: similar-game recommendations from a tagged catalog
//
// This is the library root. Each module corresponds to a major subsystem:
// the SQLite catalog, the recommendation engine, and the surfaces on top.

pub mod config;
pub mod db;
pub mod engine;
pub mod output;
pub mod status;

#[cfg(feature = "web")]
pub mod web;
