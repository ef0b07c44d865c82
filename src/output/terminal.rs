// Colored terminal output for search hits, game details, and recommendations.
//
// main.rs only decides *what* to show; everything about colors and column
// layout lives here.

use colored::{ColoredString, Colorize};

use super::truncate_chars;
use crate::db::models::{GameDetails, NameMatch, NameMatchKind};
use crate::engine::{MatchType, Recommendation};

/// Display name search results.
pub fn display_search_results(query: &str, matches: &[NameMatch]) {
    if matches.is_empty() {
        println!("No games matching \"{query}\".");
        return;
    }

    println!(
        "\n{}",
        format!("=== {} match(es) for \"{query}\" ===", matches.len()).bold()
    );
    println!();
    println!(
        "  {:>8}  {:<40} {:>5}  {}",
        "App ID".dimmed(),
        "Name".dimmed(),
        "Rel".dimmed(),
        "Genre".dimmed(),
    );
    println!("  {}", "-".repeat(78).dimmed());

    for m in matches {
        let name = truncate_chars(&m.name, 37);
        let name = match m.kind {
            NameMatchKind::Exact => name.green().bold(),
            NameMatchKind::Fuzzy => name.normal(),
        };
        println!(
            "  {:>8}  {:<40} {:>5.2}  {}",
            m.steam_appid,
            name,
            m.relevance,
            m.hierarchy.to_string().dimmed(),
        );
    }
    println!();
}

/// Display one game's full record.
pub fn display_game_detail(details: &GameDetails) {
    let game = &details.game;
    let listing = &details.listing;

    println!("\n{}", format!("=== {} ===", game.name).bold());
    println!("  App ID:      {}", game.steam_appid);
    println!("  Genre:       {}", game.hierarchy);
    println!(
        "  Aesthetics:  {} / {} / {}",
        game.aesthetics.art_style.as_deref().unwrap_or("-"),
        game.aesthetics.theme.as_deref().unwrap_or("-"),
        game.aesthetics.music_style.as_deref().unwrap_or("-"),
    );
    println!(
        "  Store:       {} ({} {}, {} {})",
        listing.pricing,
        listing.positive_reviews,
        "+".green(),
        listing.negative_reviews,
        "-".red(),
    );
    println!("  URL:         {}", listing.steam_url.dimmed());

    if let Some(desc) = &game.steam_description {
        println!("\n  {}", truncate_chars(desc, 200).italic());
    }

    if !game.unique_tags.is_empty() {
        println!("\n  {}  {}", "Unique:".bold(), game.unique_tags.join(", "));
    }
    if !game.subjective_tags.is_empty() {
        println!("  {}  {}", "Feel:".bold(), game.subjective_tags.join(", "));
    }
    if !game.steam_tags.is_empty() {
        println!("  {}  {}", "Steam:".bold(), game.steam_tags.join(", "));
    }

    if !game.tag_ratios.is_empty() {
        println!("\n  {}", "Tag ratios:".bold());
        let mut ratios: Vec<_> = game.tag_ratios.iter().collect();
        ratios.sort_by(|a, b| b.1.cmp(a.1));
        for (tag, pct) in ratios {
            let bar_len = (*pct).clamp(0, 100) as usize / 5;
            println!("    {:<24} {:>3}% {}", tag, pct, "█".repeat(bar_len).cyan());
        }
    }
    println!();
}

/// Display ranked recommendations with the score breakdown.
pub fn display_recommendations(target: &str, recs: &[Recommendation]) {
    if recs.is_empty() {
        println!("No similar games found for {target}.");
        return;
    }

    println!(
        "\n{}",
        format!("=== {} games like {target} ===", recs.len()).bold()
    );
    println!();
    println!(
        "  {:>4}  {:<36} {:>5}  {:>5}  {:>5}  {:>5}  {:<9}",
        "Rank".dimmed(),
        "Name".dimmed(),
        "Score".dimmed(),
        "Base".dimmed(),
        "Hier".dimmed(),
        "Pref".dimmed(),
        "Match".dimmed(),
    );
    println!("  {}", "-".repeat(82).dimmed());

    for (i, rec) in recs.iter().enumerate() {
        let s = &rec.scored;
        println!(
            "  {:>4}. {:<36} {:>5.2}  {:>5.2}  {:>5.2}  {:>5.2}  {:<9}",
            i + 1,
            truncate_chars(&rec.game.game.name, 33),
            s.score,
            s.base_similarity,
            s.hierarchy_bonus,
            s.preference_bonus,
            colorize_match(s.match_type),
        );
    }
    println!();
}

fn colorize_match(match_type: MatchType) -> ColoredString {
    let label = match_type.as_str();
    match match_type {
        MatchType::Soulslike => label.red().bold(),
        MatchType::Exact => label.green(),
        MatchType::Sub => label.yellow(),
        MatchType::Main => label.dimmed(),
    }
}
