use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use chrono::NaiveDate;
use serde::Deserialize;
use tracing::{info, warn};

use crate::classify::AVOID_LABEL;

pub const RESULT_OVER15_COLUMN: &str = "Resultat_Over15";
pub const RESULT_SIDE_COLUMN: &str = "Resultat_Result";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Win,
    Loss,
}

impl Outcome {
    pub fn as_str(self) -> &'static str {
        match self {
            Outcome::Win => "WIN",
            Outcome::Loss => "LOSS",
        }
    }

    fn from_bool(won: bool) -> Self {
        if won { Outcome::Win } else { Outcome::Loss }
    }
}

/// Full-time score of a finished fixture, oriented as team A vs team B.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct FinalScore {
    pub team_a_id: u32,
    pub team_b_id: u32,
    pub goals_a: u32,
    pub goals_b: u32,
}

impl FinalScore {
    pub fn over15(&self) -> Outcome {
        Outcome::from_bool(self.goals_a + self.goals_b > 1)
    }

    pub fn a_or_draw(&self) -> Outcome {
        Outcome::from_bool(self.goals_a >= self.goals_b)
    }

    pub fn b_or_draw(&self) -> Outcome {
        Outcome::from_bool(self.goals_b >= self.goals_a)
    }

    fn reversed(&self) -> Self {
        Self {
            team_a_id: self.team_b_id,
            team_b_id: self.team_a_id,
            goals_a: self.goals_b,
            goals_b: self.goals_a,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ResultsFile {
    results: Vec<FinalScore>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HitRate {
    pub settled: usize,
    pub won: usize,
}

impl HitRate {
    pub fn rate(&self) -> f64 {
        if self.settled == 0 {
            0.0
        } else {
            self.won as f64 / self.settled as f64
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SettleSummary {
    pub rows_for_date: usize,
    pub matched: usize,
    pub cells_settled: usize,
    /// Hit rate per decision label over the whole history after settling.
    pub per_label: BTreeMap<String, HitRate>,
}

pub fn load_results(path: &Path) -> Result<Vec<FinalScore>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("read results {}", path.display()))?;
    let file: ResultsFile = serde_json::from_str(&raw)
        .with_context(|| format!("parse results {}", path.display()))?;
    Ok(file.results)
}

struct Columns {
    date: usize,
    team_a: usize,
    team_b: usize,
    decision_over15: usize,
    decision_result: usize,
    result_over15: usize,
    result_side: usize,
}

fn column(header: &[String], name: &str) -> Result<usize> {
    header
        .iter()
        .position(|h| h == name)
        .ok_or_else(|| anyhow!("history is missing column `{name}`"))
}

fn ensure_column(header: &mut Vec<String>, rows: &mut [Vec<String>], name: &str) -> usize {
    if let Some(idx) = header.iter().position(|h| h == name) {
        return idx;
    }
    header.push(name.to_string());
    let width = header.len();
    for row in rows.iter_mut() {
        row.resize(width, String::new());
    }
    width - 1
}

fn resolve_columns(header: &mut Vec<String>, rows: &mut [Vec<String>]) -> Result<Columns> {
    let result_over15 = ensure_column(header, rows, RESULT_OVER15_COLUMN);
    let result_side = ensure_column(header, rows, RESULT_SIDE_COLUMN);
    Ok(Columns {
        date: column(header, "Date")?,
        team_a: column(header, "Équipe_A_ID")?,
        team_b: column(header, "Équipe_B_ID")?,
        decision_over15: column(header, "Decision_Over15")?,
        decision_result: column(header, "Decision_Result")?,
        result_over15,
        result_side,
    })
}

fn is_avoid(label: &str) -> bool {
    label.trim().is_empty() || label.starts_with(AVOID_LABEL)
}

/// Fills result cells for rows dated `date`. Cells that already hold a result are kept.
pub fn settle_records(
    header: &mut Vec<String>,
    rows: &mut [Vec<String>],
    date: NaiveDate,
    results: &[FinalScore],
) -> Result<SettleSummary> {
    let cols = resolve_columns(header, rows)?;
    let width = header.len();
    let date = date.format("%Y-%m-%d").to_string();

    let mut by_pair: HashMap<(u32, u32), FinalScore> = HashMap::new();
    for score in results {
        by_pair.insert((score.team_a_id, score.team_b_id), *score);
        by_pair
            .entry((score.team_b_id, score.team_a_id))
            .or_insert_with(|| score.reversed());
    }

    let mut summary = SettleSummary::default();
    for row in rows.iter_mut() {
        row.resize(width, String::new());
        if row[cols.date] != date {
            continue;
        }
        summary.rows_for_date += 1;
        let (Ok(a), Ok(b)) = (
            row[cols.team_a].trim().parse::<u32>(),
            row[cols.team_b].trim().parse::<u32>(),
        ) else {
            continue;
        };
        let Some(score) = by_pair.get(&(a, b)) else {
            continue;
        };
        summary.matched += 1;

        if !is_avoid(&row[cols.decision_over15]) && row[cols.result_over15].is_empty() {
            row[cols.result_over15] = score.over15().as_str().to_string();
            summary.cells_settled += 1;
        }

        let decision = row[cols.decision_result].clone();
        if !is_avoid(&decision) && row[cols.result_side].is_empty() {
            let outcome = if decision.contains("A ou Nul") {
                Some(score.a_or_draw())
            } else if decision.contains("B ou Nul") {
                Some(score.b_or_draw())
            } else {
                None
            };
            if let Some(outcome) = outcome {
                row[cols.result_side] = outcome.as_str().to_string();
                summary.cells_settled += 1;
            }
        }
    }

    summary.per_label = hit_rates_with(&cols, rows);
    Ok(summary)
}

fn hit_rates_with(cols: &Columns, rows: &[Vec<String>]) -> BTreeMap<String, HitRate> {
    let mut out: BTreeMap<String, HitRate> = BTreeMap::new();
    let pairs = [
        (cols.decision_over15, cols.result_over15),
        (cols.decision_result, cols.result_side),
    ];
    for row in rows {
        for (decision, result) in pairs {
            let (Some(label), Some(res)) = (row.get(decision), row.get(result)) else {
                continue;
            };
            if is_avoid(label) || res.is_empty() {
                continue;
            }
            let entry = out.entry(label.clone()).or_default();
            entry.settled += 1;
            if res == Outcome::Win.as_str() {
                entry.won += 1;
            }
        }
    }
    out
}

/// Reads the history CSV, settles `date` against `results` and rewrites it in place.
pub fn settle_history(
    path: &Path,
    date: NaiveDate,
    results: &[FinalScore],
) -> Result<SettleSummary> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("open history {}", path.display()))?;
    let mut header: Vec<String> = reader
        .headers()
        .context("read history header")?
        .iter()
        .map(str::to_string)
        .collect();
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.context("read history row")?;
        rows.push(record.iter().map(str::to_string).collect::<Vec<_>>());
    }

    let summary = settle_records(&mut header, &mut rows, date, results)?;
    if summary.rows_for_date == 0 {
        warn!(date = %date, "no history rows for this date");
    }

    let tmp = path.with_extension("csv.tmp");
    {
        let mut writer = csv::Writer::from_path(&tmp)
            .with_context(|| format!("create {}", tmp.display()))?;
        writer.write_record(&header).context("write history header")?;
        for row in &rows {
            writer.write_record(row).context("write history row")?;
        }
        writer.flush().context("flush history")?;
    }
    fs::rename(&tmp, path).with_context(|| format!("swap {}", path.display()))?;
    info!(
        date = %date,
        matched = summary.matched,
        settled = summary.cells_settled,
        "history settled"
    );
    Ok(summary)
}
