use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{Duration as ChronoDuration, NaiveDate, Utc};

use ultrasafe::logging;
use ultrasafe::settle;

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
    logging::init_tracing();

    let history = parse_arg("--historique")
        .map(PathBuf::from)
        .unwrap_or_else(|| default_data_dir().join("historique.csv"));
    let results_path = parse_arg("--results")
        .map(PathBuf::from)
        .context("--results is required")?;
    // Results usually arrive the morning after.
    let date = match parse_arg("--date") {
        Some(raw) => NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
            .with_context(|| format!("invalid --date `{raw}`"))?,
        None => Utc::now().date_naive() - ChronoDuration::days(1),
    };

    let results = settle::load_results(&results_path)?;
    let summary = settle::settle_history(&history, date, &results)?;

    println!("Settled {date} in {}", history.display());
    println!("Rows for date: {}", summary.rows_for_date);
    println!("Matched results: {}", summary.matched);
    println!("Cells settled: {}", summary.cells_settled);
    if !summary.per_label.is_empty() {
        println!("Hit rate by decision:");
        for (label, hits) in &summary.per_label {
            println!(
                " - {label}: {}/{} ({:.1}%)",
                hits.won,
                hits.settled,
                hits.rate() * 100.0
            );
        }
    }

    Ok(())
}

fn default_data_dir() -> PathBuf {
    std::env::var("ULTRASAFE_DATA_DIR")
        .ok()
        .filter(|v| !v.trim().is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("donnees"))
}

fn parse_arg(name: &str) -> Option<String> {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let prefix = format!("{name}=");
    for (idx, arg) in args.iter().enumerate() {
        if let Some(value) = arg.strip_prefix(&prefix) {
            let trimmed = value.trim();
            if !trimmed.is_empty() {
                return Some(trimmed.to_string());
            }
        }
        if arg == name {
            let Some(next) = args.get(idx + 1) else {
                continue;
            };
            if !next.trim().is_empty() && !next.starts_with("--") {
                return Some(next.clone());
            }
        }
    }
    None
}
