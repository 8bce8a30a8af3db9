use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use serde_json::Value;
use tracing::{info, warn};

use crate::evaluator::MatchInput;

/// Loads the day's fixtures. Accepts the hand-written `{"matchs": [...]}` list as well as the
/// `{"fixtures": [...]}` document produced by the daily fixture fetch.
pub fn load_matches(path: &Path) -> Result<Vec<MatchInput>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("read fixtures {}", path.display()))?;
    let matches =
        parse_matches_json(&raw).with_context(|| format!("parse fixtures {}", path.display()))?;
    info!(path = %path.display(), count = matches.len(), "fixtures loaded");
    Ok(matches)
}

pub fn parse_matches_json(raw: &str) -> Result<Vec<MatchInput>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Ok(Vec::new());
    }
    let v: Value = serde_json::from_str(trimmed).context("invalid fixtures json")?;

    let (items, daily_shape) = if let Some(arr) = v.get("matchs").and_then(|x| x.as_array()) {
        (arr, false)
    } else if let Some(arr) = v.get("fixtures").and_then(|x| x.as_array()) {
        (arr, true)
    } else if let Some(arr) = v.as_array() {
        (arr, false)
    } else {
        return Err(anyhow!("expected a `matchs` or `fixtures` array"));
    };

    let mut out = Vec::with_capacity(items.len());
    let mut skipped = 0usize;
    for item in items {
        let parsed = if daily_shape {
            parse_fixture_entry(item)
        } else {
            parse_match_entry(item)
        };
        match parsed {
            Some(m) => out.push(m),
            None => skipped += 1,
        }
    }
    if skipped > 0 {
        warn!(skipped, "fixtures without both team ids were ignored");
    }
    Ok(out)
}

fn parse_match_entry(v: &Value) -> Option<MatchInput> {
    let team_a_id = id_field(v.get("team_a_id")?)?;
    let team_b_id = id_field(v.get("team_b_id")?)?;
    Some(MatchInput {
        team_a_id,
        team_b_id,
        label: str_field(v, "label"),
        league_id: v.get("league_id").and_then(id_field),
        fixture_id: v.get("fixture_id").and_then(|x| x.as_u64()),
        team_a_name: str_field(v, "team_a_name"),
        team_b_name: str_field(v, "team_b_name"),
    })
}

fn parse_fixture_entry(v: &Value) -> Option<MatchInput> {
    let home = v.get("home_team")?;
    let away = v.get("away_team")?;
    Some(MatchInput {
        team_a_id: id_field(home.get("id")?)?,
        team_b_id: id_field(away.get("id")?)?,
        label: None,
        league_id: v.get("league_id").and_then(id_field),
        fixture_id: v.get("fixture_id").and_then(|x| x.as_u64()),
        team_a_name: str_field(home, "name"),
        team_b_name: str_field(away, "name"),
    })
}

fn id_field(v: &Value) -> Option<u32> {
    let id = match v {
        Value::Number(n) => n.as_u64()?,
        Value::String(s) => s.trim().parse::<u64>().ok()?,
        _ => return None,
    };
    // Zero is what the collectors write for "unknown".
    u32::try_from(id).ok().filter(|id| *id > 0)
}

fn str_field(v: &Value, key: &str) -> Option<String> {
    v.get(key)
        .and_then(|x| x.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
