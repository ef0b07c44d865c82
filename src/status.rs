// Catalog status display — file size, game and vector counts, top genres.

use anyhow::Result;
use colored::Colorize;
use std::path::Path;
use std::sync::Arc;

use crate::db::CatalogStore;

/// Display catalog statistics to the terminal.
pub async fn show(store: &Arc<dyn CatalogStore>, db_display_path: &str) -> Result<()> {
    let file_size = std::fs::metadata(Path::new(db_display_path))
        .map(|m| format_bytes(m.len()))
        .unwrap_or_else(|_| "unknown".to_string());
    println!("Catalog: {} ({})", db_display_path, file_size);

    let stats = store.catalog_stats().await?;
    if stats.total_games == 0 {
        println!("Games: none imported yet");
        println!("  Run `kindred import <catalog.json>` to load a catalog");
        return Ok(());
    }

    let coverage = stats.total_vectors as f64 / stats.total_games as f64 * 100.0;
    println!("Games: {}", stats.total_games);
    println!(
        "Vectors: {} ({:.0}% coverage, the rest fall back to tag similarity)",
        stats.total_vectors, coverage
    );

    if !stats.top_hierarchies.is_empty() {
        println!("\n{}", "Top genres:".bold());
        for (hierarchy, count) in &stats.top_hierarchies {
            println!("  {:>5}  {}", count, hierarchy);
        }
    }

    if !stats.popular_unique_tags.is_empty() {
        println!("\n{}", "Popular unique tags:".bold());
        for (tag, count) in &stats.popular_unique_tags {
            println!("  {:>5}  {}", count, tag);
        }
    }

    Ok(())
}

fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}
