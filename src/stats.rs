use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

/// One team's statistics for one season, already reduced to per-game averages and rates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamSeasonStats {
    pub team_id: u32,
    pub season: u16,
    #[serde(default)]
    pub team_name: Option<String>,
    /// Competition the team played in that season, when known.
    #[serde(default)]
    pub league_id: Option<u32>,
    pub games_played: u32,
    pub gf_avg: f64,
    pub ga_avg: f64,
    pub win_rate: f64,
    /// Per-game goal difference (`gf_avg - ga_avg`).
    pub goal_diff: f64,
    /// Higher is better. Derived from clean sheets or goals conceded.
    pub defense_rate: f64,
    /// Higher is better. Derived from failed-to-score or goals scored.
    pub attack_rate: f64,
    pub fail_rate: f64,
    pub clean_sheet_rate: f64,
    #[serde(default)]
    pub over15_rate: Option<f64>,
}

impl TeamSeasonStats {
    pub fn validate(&self) -> Result<()> {
        let finite = [
            ("gf_avg", self.gf_avg),
            ("ga_avg", self.ga_avg),
            ("goal_diff", self.goal_diff),
        ];
        for (name, v) in finite {
            if !v.is_finite() {
                return Err(anyhow!("{name} is not finite"));
            }
        }
        if self.gf_avg < 0.0 || self.ga_avg < 0.0 {
            return Err(anyhow!("negative goal averages"));
        }
        let rates = [
            ("win_rate", Some(self.win_rate)),
            ("defense_rate", Some(self.defense_rate)),
            ("attack_rate", Some(self.attack_rate)),
            ("fail_rate", Some(self.fail_rate)),
            ("clean_sheet_rate", Some(self.clean_sheet_rate)),
            ("over15_rate", self.over15_rate),
        ];
        for (name, v) in rates {
            let Some(v) = v else { continue };
            if !(0.0..=1.0).contains(&v) {
                return Err(anyhow!("{name} out of [0, 1]: {v}"));
            }
        }
        Ok(())
    }
}

/// A raw line of a season stats JSONL file.
#[derive(Debug, Clone, Deserialize)]
pub struct SeasonStatsRecord {
    pub team_id: u32,
    #[serde(default)]
    pub team_name: Option<String>,
    #[serde(default)]
    pub league_id: Option<u32>,
    pub stats: RawSeasonStats,
}

/// Totals and averages as the stats collector writes them. Numbers may arrive as strings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawSeasonStats {
    #[serde(default, deserialize_with = "lenient_f64")]
    pub played_total: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub wins_total: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub gf_avg: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub ga_avg: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub clean_sheets_total: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub failed_to_score_total: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub over15_rate: Option<f64>,
}

impl SeasonStatsRecord {
    pub fn into_season_stats(self, season: u16) -> Result<TeamSeasonStats> {
        let s = self.stats;
        let played = s
            .played_total
            .ok_or_else(|| anyhow!("team {}: missing played_total", self.team_id))?;
        let gf_avg = s
            .gf_avg
            .ok_or_else(|| anyhow!("team {}: missing gf_avg", self.team_id))?;
        let ga_avg = s
            .ga_avg
            .ok_or_else(|| anyhow!("team {}: missing ga_avg", self.team_id))?;
        if !played.is_finite() || played < 0.0 {
            return Err(anyhow!("team {}: invalid played_total {played}", self.team_id));
        }

        let share = |total: Option<f64>| -> Option<f64> {
            let total = total?;
            (played > 0.0).then(|| (total / played).clamp(0.0, 1.0))
        };

        let win_rate = share(s.wins_total).unwrap_or(0.0);
        let fail_share = share(s.failed_to_score_total);
        let cs_share = share(s.clean_sheets_total);

        let attack_rate = match fail_share {
            Some(f) => 1.0 - f,
            None => (gf_avg / 1.5).min(0.95).max(0.0),
        };
        let defense_rate = match cs_share {
            Some(cs) => cs,
            None => (1.0 - ga_avg / 1.5).max(0.0).min(1.0),
        };

        let stats = TeamSeasonStats {
            team_id: self.team_id,
            season,
            team_name: self.team_name.filter(|n| !n.trim().is_empty()),
            league_id: self.league_id,
            games_played: played.round() as u32,
            gf_avg,
            ga_avg,
            win_rate,
            goal_diff: gf_avg - ga_avg,
            defense_rate,
            attack_rate,
            fail_rate: fail_share.unwrap_or(1.0 - attack_rate),
            clean_sheet_rate: cs_share.unwrap_or(defense_rate),
            over15_rate: s.over15_rate,
        };
        stats
            .validate()
            .with_context(|| format!("team {} season {season}", stats.team_id))?;
        Ok(stats)
    }
}

fn lenient_f64<'de, D>(deserializer: D) -> std::result::Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(raw.as_ref().and_then(value_to_f64))
}

pub(crate) fn value_to_f64(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_stat_cell(s),
        _ => None,
    }
}

fn parse_stat_cell(raw: &str) -> Option<f64> {
    let s = raw.trim();
    if s.is_empty() || s == "-" {
        return None;
    }
    // "58%" is a rate, stored as 0.58.
    let (s, scale) = match s.strip_suffix('%') {
        Some(pct) => (pct.trim_end(), 100.0),
        None => (s, 1.0),
    };
    s.replace(',', ".")
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .map(|v| v / scale)
}

/// Source of per-team, per-season statistics.
pub trait StatsLookup {
    fn season_stats(&self, team_id: u32, season: u16) -> Option<&TeamSeasonStats>;
}

/// Source of the competition a team played in for a given season.
pub trait DivisionLookup {
    fn division(&self, team_id: u32, season: u16) -> Option<u32>;
}

/// Division data is unavailable; the division-change filter never fires.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDivisionData;

impl DivisionLookup for NoDivisionData {
    fn division(&self, _team_id: u32, _season: u16) -> Option<u32> {
        None
    }
}

#[derive(Debug, Clone, Default)]
pub struct LoadSummary {
    pub season: u16,
    pub loaded: usize,
    pub skipped: usize,
    pub errors: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct SeasonStatsStore {
    by_key: HashMap<(u32, u16), TeamSeasonStats>,
}

impl SeasonStatsStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, stats: TeamSeasonStats) {
        self.by_key.insert((stats.team_id, stats.season), stats);
    }

    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }

    pub fn teams_in_season(&self, season: u16) -> usize {
        self.by_key.keys().filter(|(_, s)| *s == season).count()
    }

    pub fn load_jsonl(&mut self, path: &Path, season: u16) -> Result<LoadSummary> {
        let file =
            File::open(path).with_context(|| format!("open stats file {}", path.display()))?;
        let summary = self
            .extend_from_reader(BufReader::new(file), season)
            .with_context(|| format!("read stats file {}", path.display()))?;
        info!(
            path = %path.display(),
            season,
            loaded = summary.loaded,
            skipped = summary.skipped,
            "season stats loaded"
        );
        Ok(summary)
    }

    /// Reads JSONL records for `season`. Malformed or incomplete lines are skipped, not fatal.
    pub fn extend_from_reader(&mut self, reader: impl BufRead, season: u16) -> Result<LoadSummary> {
        let mut summary = LoadSummary {
            season,
            ..LoadSummary::default()
        };
        for (idx, line) in reader.lines().enumerate() {
            let line = line.context("read stats line")?;
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            let parsed = serde_json::from_str::<SeasonStatsRecord>(trimmed)
                .map_err(anyhow::Error::from)
                .and_then(|record| record.into_season_stats(season));
            match parsed {
                Ok(stats) => {
                    self.insert(stats);
                    summary.loaded += 1;
                }
                Err(err) => {
                    debug!(line = idx + 1, season, "skipping stats line: {err:#}");
                    summary.skipped += 1;
                    summary.errors.push(format!("line {}: {err:#}", idx + 1));
                }
            }
        }
        if summary.skipped > 0 {
            warn!(season, skipped = summary.skipped, "some stats lines were unusable");
        }
        Ok(summary)
    }
}

impl StatsLookup for SeasonStatsStore {
    fn season_stats(&self, team_id: u32, season: u16) -> Option<&TeamSeasonStats> {
        self.by_key.get(&(team_id, season))
    }
}

impl DivisionLookup for SeasonStatsStore {
    fn division(&self, team_id: u32, season: u16) -> Option<u32> {
        self.by_key
            .get(&(team_id, season))
            .and_then(|s| s.league_id)
    }
}
