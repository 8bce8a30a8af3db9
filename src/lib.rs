pub mod classify;
pub mod error;
pub mod evaluator;
pub mod exclusion;
pub mod fixtures;
pub mod goal_index;
pub mod logging;
pub mod report;
pub mod result_index;
pub mod season_blend;
pub mod settle;
pub mod stats;
pub mod thresholds;

pub use error::{ConfigError, EngineError};
pub use evaluator::{MatchEvaluator, MatchInput, MatchVerdict};
pub use thresholds::ThresholdConfig;
