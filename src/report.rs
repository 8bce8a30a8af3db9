use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use tracing::info;

use crate::evaluator::MatchVerdict;

pub const TODAY_HEADER: [&str; 11] = [
    "Type",
    "Match",
    "League_ID",
    "Pari",
    "Fiabilité",
    "Équipe_A",
    "Équipe_B",
    "O15I",
    "RSI_A",
    "RSI_B",
    "Flags",
];

pub const HISTORY_HEADER: [&str; 13] = [
    "Date",
    "Match",
    "League_ID",
    "Decision_Over15",
    "Decision_Result",
    "O15I",
    "RSI_A",
    "RSI_B",
    "Fiabilite_Over15",
    "Fiabilite_Result",
    "Équipe_A_ID",
    "Équipe_B_ID",
    "Flags",
];

fn fmt3(v: f64) -> String {
    format!("{v:.3}")
}

fn league_cell(v: &MatchVerdict) -> String {
    v.league_id.map(|id| id.to_string()).unwrap_or_default()
}

/// One row per actual pick, in verdict order. Matches with no pick produce nothing.
pub fn today_rows(verdicts: &[MatchVerdict]) -> Vec<Vec<String>> {
    let mut rows = Vec::new();
    for v in verdicts {
        let tail = [
            v.team_a_name.clone(),
            v.team_b_name.clone(),
            fmt3(v.o15i),
            fmt3(v.rsi_a),
            fmt3(v.rsi_b()),
            v.flags_label(),
        ];
        if v.goal.is_pick() {
            let mut row = vec![
                "Over15".to_string(),
                v.match_label.clone(),
                league_cell(v),
                v.goal.label(),
                fmt3(v.goal.reliability),
            ];
            row.extend(tail.iter().cloned());
            rows.push(row);
        }
        if v.result.is_pick() {
            let mut row = vec![
                "Result".to_string(),
                v.match_label.clone(),
                league_cell(v),
                v.result.label(),
                fmt3(v.result.reliability),
            ];
            row.extend(tail.iter().cloned());
            rows.push(row);
        }
    }
    rows
}

pub fn history_rows(verdicts: &[MatchVerdict], date: NaiveDate) -> Vec<Vec<String>> {
    let date = date.format("%Y-%m-%d").to_string();
    verdicts
        .iter()
        .map(|v| {
            vec![
                date.clone(),
                v.match_label.clone(),
                league_cell(v),
                v.goal.label(),
                v.result.label(),
                fmt3(v.o15i),
                fmt3(v.rsi_a),
                fmt3(v.rsi_b()),
                fmt3(v.goal.reliability),
                fmt3(v.result.reliability),
                v.team_a_id.to_string(),
                v.team_b_id.to_string(),
                v.flags_label(),
            ]
        })
        .collect()
}

pub fn write_today_to<W: Write>(out: W, verdicts: &[MatchVerdict]) -> Result<usize> {
    let mut writer = csv::Writer::from_writer(out);
    writer
        .write_record(TODAY_HEADER)
        .context("write today header")?;
    let rows = today_rows(verdicts);
    for row in &rows {
        writer.write_record(row).context("write today row")?;
    }
    writer.flush().context("flush today table")?;
    Ok(rows.len())
}

/// Replaces the today table. Written to a temp file first so readers never see half a table.
pub fn write_today(path: &Path, verdicts: &[MatchVerdict]) -> Result<usize> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("create output dir {}", parent.display()))?;
    }
    let tmp = path.with_extension("csv.tmp");
    let file = fs::File::create(&tmp)
        .with_context(|| format!("create {}", tmp.display()))?;
    let written = write_today_to(file, verdicts)?;
    fs::rename(&tmp, path).with_context(|| format!("swap {}", path.display()))?;
    info!(path = %path.display(), picks = written, "today table written");
    Ok(written)
}

/// Appends one row per verdict. The header is written only when the file is new; rows are
/// padded when a settlement pass has already added result columns.
pub fn append_history(path: &Path, verdicts: &[MatchVerdict], date: NaiveDate) -> Result<usize> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("create output dir {}", parent.display()))?;
    }
    let existing_width = existing_header_width(path)?;

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("open history {}", path.display()))?;
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(file);

    let width = match existing_width {
        Some(w) => w.max(HISTORY_HEADER.len()),
        None => {
            writer
                .write_record(HISTORY_HEADER)
                .context("write history header")?;
            HISTORY_HEADER.len()
        }
    };

    let rows = history_rows(verdicts, date);
    for mut row in rows.iter().cloned() {
        row.resize(width, String::new());
        writer.write_record(&row).context("append history row")?;
    }
    writer.flush().context("flush history")?;
    info!(path = %path.display(), rows = rows.len(), "history appended");
    Ok(rows.len())
}

fn existing_header_width(path: &Path) -> Result<Option<usize>> {
    match fs::metadata(path) {
        Ok(meta) if meta.len() > 0 => {}
        _ => return Ok(None),
    }
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("open history {}", path.display()))?;
    let header = reader
        .headers()
        .with_context(|| format!("read history header {}", path.display()))?;
    Ok(Some(header.len()))
}
