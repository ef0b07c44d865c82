use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use tracing::info;

use kindred::config::Config;
use kindred::db;
use kindred::engine::{AestheticPreferences, Recommender, UserPreferences};

/// Kindred: find games like the ones you love.
///
/// Recommends games from a tagged catalog by genre hierarchy, TF-IDF
/// similarity, and the aesthetics and tags you care about.
#[derive(Parser)]
#[command(name = "kindred", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize an empty catalog database
    Init,

    /// Import a JSON catalog (array of tagged games)
    Import {
        /// Path to the catalog file
        file: PathBuf,
    },

    /// Search games by name
    Search {
        /// Name or part of a name
        query: String,

        /// Max results (default: 10)
        #[arg(long, default_value = "10")]
        limit: usize,
    },

    /// Show a game's catalog record and store data
    Show {
        /// Steam app id
        appid: i64,
    },

    /// Recommend games similar to the given one
    Recommend {
        /// Steam app id of the game you liked
        appid: i64,

        /// Number of recommendations (default: KINDRED_DEFAULT_LIMIT or 10)
        #[arg(long)]
        limit: Option<usize>,

        /// Preferred art style (exact match)
        #[arg(long)]
        art_style: Option<String>,

        /// Preferred theme (exact match)
        #[arg(long)]
        theme: Option<String>,

        /// Preferred music style (exact match)
        #[arg(long)]
        music_style: Option<String>,

        /// Preferred unique/subjective tag (repeatable)
        #[arg(long = "tag")]
        tags: Vec<String>,

        /// Preferred Steam tag (repeatable)
        #[arg(long = "steam-tag")]
        steam_tags: Vec<String>,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Show catalog statistics
    Stats,

    /// Start the web API
    #[cfg(feature = "web")]
    Serve {
        /// Port to listen on (overrides KINDRED_PORT)
        #[arg(long)]
        port: Option<u16>,

        /// Address to bind (overrides KINDRED_BIND)
        #[arg(long)]
        bind: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if missing)
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("kindred=info")),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::load()?;

    match cli.command {
        Commands::Init => {
            info!("Initializing catalog database...");
            let conn = db::initialize(&config.db_path)?;
            let table_count = db::schema::table_count(&conn)?;
            println!("Catalog initialized at: {}", config.db_path);
            println!("Tables created: {table_count}");
            println!("\nNext step: kindred import <catalog.json>");
        }

        Commands::Import { file } => {
            let entries = db::import::load_catalog_file(&file)?;
            println!("Importing {} games from {}...", entries.len(), file.display());

            let mut conn = db::initialize(&config.db_path)?;
            let pb = db::import::import_progress(entries.len())?;
            let summary = db::import::import_entries(&mut conn, entries, &pb)?;
            pb.finish_and_clear();

            println!(
                "  {} {} games, {} vectors, {} listings",
                "✓".green(),
                summary.games,
                summary.vectors,
                summary.listings
            );
            if summary.skipped > 0 {
                println!(
                    "  {} {} entries skipped (missing name or genre)",
                    "!".yellow(),
                    summary.skipped
                );
            }
        }

        Commands::Search { query, limit } => {
            config.require_catalog()?;
            let store = db::open_catalog(&config.db_path)?;
            let matches = store.search_by_name(&query, limit).await?;
            kindred::output::terminal::display_search_results(&query, &matches);
        }

        Commands::Show { appid } => {
            config.require_catalog()?;
            let recommender = Recommender::new(db::open_catalog(&config.db_path)?);
            match recommender.game_details(appid).await? {
                Some(details) => kindred::output::terminal::display_game_detail(&details),
                None => anyhow::bail!("No game with app id {appid} in the catalog."),
            }
        }

        Commands::Recommend {
            appid,
            limit,
            art_style,
            theme,
            music_style,
            tags,
            steam_tags,
            json,
        } => {
            config.require_catalog()?;
            let recommender = Recommender::new(db::open_catalog(&config.db_path)?);
            let limit = limit.unwrap_or(config.default_limit);

            let prefs = UserPreferences {
                aesthetics: AestheticPreferences {
                    art_style,
                    theme,
                    music_style,
                },
                preferred_tags: tags,
                preferred_steam_tags: steam_tags,
            };

            let target_name = match recommender.store().get_game(appid).await? {
                Some(game) => game.name,
                None => format!("app {appid}"),
            };

            let recs = recommender
                .recommend_detailed(appid, Some(&prefs), limit)
                .await?;

            if json {
                let out = serde_json::to_string_pretty(&recs)
                    .context("Failed to serialize recommendations")?;
                println!("{out}");
            } else {
                kindred::output::terminal::display_recommendations(&target_name, &recs);
            }
        }

        Commands::Stats => {
            config.require_catalog()?;
            let store = db::open_catalog(&config.db_path)?;
            kindred::status::show(&store, &config.db_path).await?;
        }

        #[cfg(feature = "web")]
        Commands::Serve { port, bind } => {
            config.require_catalog()?;
            let store = db::open_catalog(&config.db_path)?;
            let port = port.unwrap_or(config.port);
            let bind = bind.unwrap_or_else(|| config.bind.clone());
            kindred::web::run_server(store, config, &bind, port).await?;
        }
    }

    Ok(())
}
