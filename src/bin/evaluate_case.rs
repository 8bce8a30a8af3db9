use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::{Map, Value};

use ultrasafe::evaluator::{MatchEvaluator, MatchInput};
use ultrasafe::season_blend::BlendMode;
use ultrasafe::stats::{SeasonStatsRecord, SeasonStatsStore};
use ultrasafe::thresholds::ThresholdConfig;

#[derive(Debug, Deserialize)]
struct CaseSide {
    current: SeasonStatsRecord,
    #[serde(default)]
    previous: Option<SeasonStatsRecord>,
}

#[derive(Debug, Deserialize)]
struct EvaluateCase {
    #[serde(default)]
    season: Option<u16>,
    #[serde(default)]
    label: Option<String>,
    #[serde(default)]
    preseason: bool,
    team_a: CaseSide,
    team_b: CaseSide,
    #[serde(default)]
    thresholds: Option<Map<String, Value>>,
}

fn main() -> Result<()> {
    let path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("demos/case_open_game.json"));

    let raw = fs::read_to_string(&path).with_context(|| format!("read {}", path.display()))?;
    let case: EvaluateCase =
        serde_json::from_str(&raw).with_context(|| format!("parse {}", path.display()))?;

    let mut config = ThresholdConfig::default();
    if let Some(overrides) = case.thresholds.as_ref() {
        config = config.apply_override_map(overrides)?;
    }
    config.validate()?;

    let season = case.season.unwrap_or(2025);
    let mut store = SeasonStatsStore::new();
    let mut ids = Vec::with_capacity(2);
    for side in [case.team_a, case.team_b] {
        ids.push(side.current.team_id);
        store.insert(side.current.into_season_stats(season)?);
        if let Some(prev) = side.previous {
            store.insert(prev.into_season_stats(season.saturating_sub(1))?);
        }
    }

    let mut input = MatchInput::new(ids[0], ids[1]);
    input.label = case.label;
    let mode = if case.preseason {
        BlendMode::PreSeason
    } else {
        BlendMode::Standard
    };

    // One snapshot in, one verdict out. No files are written.
    let evaluator = MatchEvaluator::new(&store, config, season)
        .with_divisions(&store)
        .with_mode(mode);
    let verdict = evaluator.evaluate(&input)?;

    println!("Match: {}", verdict.match_label);
    println!("O15I: {:.4}  -> {}", verdict.o15i, verdict.goal);
    println!("RSI_A: {:+.4}  -> {}", verdict.rsi_a, verdict.result);
    println!("Flags: {}", verdict.flags_label());
    println!();
    println!("{}", serde_json::to_string_pretty(&verdict)?);

    Ok(())
}
