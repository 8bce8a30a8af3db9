use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use chrono::{Datelike, NaiveDate, Utc};
use tracing::{info, warn};

use ultrasafe::evaluator::{MatchEvaluator, MatchVerdict};
use ultrasafe::season_blend::BlendMode;
use ultrasafe::stats::SeasonStatsStore;
use ultrasafe::thresholds::{ThresholdProfile, load_thresholds};
use ultrasafe::{fixtures, logging, report};

const DEFAULT_DATA_DIR: &str = "donnees";
/// Fewer current-season teams than this means the season has barely started.
const PRESEASON_TEAM_MIN: usize = 50;

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
    logging::init_tracing();

    let stats_file = parse_path_arg("--stats-file").context("--stats-file is required")?;
    let fallback_stats = parse_path_arg("--fallback-stats");
    let matches_file = parse_path_arg("--matchs-file").context("--matchs-file is required")?;
    let data_dir = std::env::var("ULTRASAFE_DATA_DIR")
        .ok()
        .filter(|v| !v.trim().is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR));
    let output = parse_path_arg("--output").unwrap_or_else(|| data_dir.join("paris_du_jour.csv"));
    let history = parse_path_arg("--historique").unwrap_or_else(|| data_dir.join("historique.csv"));

    let profile = match parse_arg("--profile") {
        Some(raw) => raw.parse::<ThresholdProfile>()?,
        None => ThresholdProfile::Standard,
    };
    // Fatal before anything is evaluated.
    let config = load_thresholds(parse_path_arg("--seuils").as_deref(), profile)?;
    info!(?config, ?profile, "thresholds resolved");

    let today = Utc::now().date_naive();
    let season = match parse_arg("--season") {
        Some(raw) => raw
            .trim()
            .parse::<u16>()
            .with_context(|| format!("invalid --season `{raw}`"))?,
        None => u16::try_from(today.year()).context("current year out of range")?,
    };
    let run_date = match parse_arg("--date") {
        Some(raw) => NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
            .with_context(|| format!("invalid --date `{raw}`"))?,
        None => today,
    };

    let mut store = SeasonStatsStore::new();
    store.load_jsonl(&stats_file, season)?;
    if let Some(path) = fallback_stats.as_deref() {
        let previous = season
            .checked_sub(1)
            .ok_or_else(|| anyhow!("no season before {season}"))?;
        store.load_jsonl(path, previous)?;
    }
    let current_teams = store.teams_in_season(season);
    if current_teams == 0 {
        warn!(season, "no usable team statistics for the current season");
    }

    let mode = match parse_arg("--preseason").as_deref().map(str::trim) {
        Some("on") => BlendMode::PreSeason,
        Some("auto") if current_teams < PRESEASON_TEAM_MIN => {
            info!(current_teams, "sparse current season, using pre-season weighting");
            BlendMode::PreSeason
        }
        Some("auto") | Some("off") | None => BlendMode::Standard,
        Some(other) => return Err(anyhow!("invalid --preseason `{other}` (auto|on|off)")),
    };

    let matches = fixtures::load_matches(&matches_file)?;
    if matches.is_empty() {
        info!("no fixtures to evaluate");
        report::write_today(&output, &[])?;
        println!("No fixtures to evaluate. Empty table written to {}", output.display());
        return Ok(());
    }

    let evaluator = MatchEvaluator::new(&store, config, season)
        .with_divisions(&store)
        .with_mode(mode);
    let outcomes = evaluator.evaluate_batch(&matches);

    let mut verdicts: Vec<MatchVerdict> = Vec::with_capacity(outcomes.len());
    let mut failures = Vec::new();
    for (input, outcome) in matches.iter().zip(outcomes) {
        match outcome {
            Ok(v) => verdicts.push(v),
            Err(err) => failures.push(format!("{} vs {}: {err}", input.team_a_id, input.team_b_id)),
        }
    }

    let picks = report::write_today(&output, &verdicts)?;
    let logged = report::append_history(&history, &verdicts, run_date)?;

    println!("Season: {} ({mode:?})", evaluator.season());
    println!("Fixtures: {}", matches.len());
    println!("Evaluated: {}", verdicts.len());
    println!(
        "Filtered: {}",
        verdicts.iter().filter(|v| v.is_filtered()).count()
    );
    println!("Picks written: {picks} -> {}", output.display());
    println!("History rows: {logged} -> {}", history.display());
    if !failures.is_empty() {
        println!("Skipped: {}", failures.len());
        for err in failures.iter().take(8) {
            println!(" - {err}");
        }
    }

    Ok(())
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

fn parse_path_arg(name: &str) -> Option<PathBuf> {
    parse_arg(name).map(PathBuf::from)
}
