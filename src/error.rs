use thiserror::Error;

/// Failure of a single match evaluation. Never aborts a batch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("no statistics for team {team_id} in season {season}")]
    MissingData { team_id: u32, season: u16 },
}

/// Invalid threshold configuration. Fatal for the whole run.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("unknown threshold key `{0}`")]
    UnknownKey(String),
    #[error("threshold key `{0}` has no value")]
    MissingValue(String),
    #[error("threshold key `{key}` is not numeric: {raw}")]
    NotNumeric { key: String, raw: String },
    #[error("threshold key `{key}` out of range: {value} (expected {expected})")]
    OutOfRange {
        key: String,
        value: f64,
        expected: &'static str,
    },
    #[error("`{lower}` ({lower_value}) must not exceed `{upper}` ({upper_value})")]
    Inconsistent {
        lower: &'static str,
        lower_value: f64,
        upper: &'static str,
        upper_value: f64,
    },
    #[error("invalid threshold document: {0}")]
    Parse(String),
}
