use std::env;
use std::path::Path;

use anyhow::{Context, Result};

/// Default number of recommendations when the caller doesn't ask for a count.
pub const DEFAULT_LIMIT: usize = 10;

/// Central configuration loaded from environment variables.
///
/// The .env file is loaded automatically at startup via dotenvy. Nothing
/// here is secret; every value has a default.
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to the SQLite catalog (KINDRED_DB_PATH, default ./kindred.db)
    pub db_path: String,
    /// Recommendations returned when no limit is given (KINDRED_DEFAULT_LIMIT)
    pub default_limit: usize,
    /// Address the web server binds to (KINDRED_BIND)
    #[cfg(feature = "web")]
    pub bind: String,
    /// Port the web server listens on (KINDRED_PORT)
    #[cfg(feature = "web")]
    pub port: u16,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self> {
        let default_limit = match env::var("KINDRED_DEFAULT_LIMIT") {
            Ok(raw) => parse_limit(&raw)?,
            Err(_) => DEFAULT_LIMIT,
        };

        #[cfg(feature = "web")]
        let port = match env::var("KINDRED_PORT") {
            Ok(raw) => raw
                .trim()
                .parse::<u16>()
                .with_context(|| format!("KINDRED_PORT must be a port number, got {raw:?}"))?,
            Err(_) => 5000,
        };

        Ok(Self {
            db_path: env::var("KINDRED_DB_PATH").unwrap_or_else(|_| "./kindred.db".to_string()),
            default_limit,
            #[cfg(feature = "web")]
            bind: env::var("KINDRED_BIND").unwrap_or_else(|_| "127.0.0.1".to_string()),
            #[cfg(feature = "web")]
            port,
        })
    }

    /// Check that the catalog database exists.
    /// Call this before any command that reads the catalog.
    pub fn require_catalog(&self) -> Result<()> {
        if !Path::new(&self.db_path).exists() {
            anyhow::bail!(
                "Catalog not found at {}\n\
                 Run `kindred init` and `kindred import <catalog.json>` first,\n\
                 or point KINDRED_DB_PATH at an existing catalog.",
                self.db_path
            );
        }
        Ok(())
    }
}

/// Parse a recommendation limit: a positive integer.
pub fn parse_limit(raw: &str) -> Result<usize> {
    let limit: usize = raw
        .trim()
        .parse()
        .with_context(|| format!("KINDRED_DEFAULT_LIMIT must be a positive integer, got {raw:?}"))?;
    if limit == 0 {
        anyhow::bail!("KINDRED_DEFAULT_LIMIT must be at least 1");
    }
    Ok(limit)
}
