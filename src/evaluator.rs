use std::env;

use once_cell::sync::OnceCell;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::classify::{GoalCall, ResultCall, classify_goal, classify_result};
use crate::error::EngineError;
use crate::exclusion::{ExclusionFilter, ExclusionFlags, join_flags};
use crate::goal_index::compute_o15i;
use crate::result_index::RsiBreakdown;
use crate::season_blend::{BlendMode, BlendedTeamProfile, SeasonPhase, blend, previous_only};
use crate::stats::{DivisionLookup, StatsLookup};
use crate::thresholds::ThresholdConfig;

static EVAL_POOL: OnceCell<Option<rayon::ThreadPool>> = OnceCell::new();

/// One fixture to evaluate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchInput {
    pub team_a_id: u32,
    pub team_b_id: u32,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub league_id: Option<u32>,
    #[serde(default)]
    pub fixture_id: Option<u64>,
    #[serde(default)]
    pub team_a_name: Option<String>,
    #[serde(default)]
    pub team_b_name: Option<String>,
}

impl MatchInput {
    pub fn new(team_a_id: u32, team_b_id: u32) -> Self {
        Self {
            team_a_id,
            team_b_id,
            label: None,
            league_id: None,
            fixture_id: None,
            team_a_name: None,
            team_b_name: None,
        }
    }

    /// The same fixture seen from the other side.
    pub fn swapped(&self) -> Self {
        Self {
            team_a_id: self.team_b_id,
            team_b_id: self.team_a_id,
            label: None,
            league_id: self.league_id,
            fixture_id: self.fixture_id,
            team_a_name: self.team_b_name.clone(),
            team_b_name: self.team_a_name.clone(),
        }
    }
}

/// Everything the engine decided about one match.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchVerdict {
    pub fixture_id: Option<u64>,
    pub team_a_id: u32,
    pub team_b_id: u32,
    pub team_a_name: String,
    pub team_b_name: String,
    pub match_label: String,
    pub league_id: Option<u32>,
    pub o15i: f64,
    /// RSI from team A's side. Team B's value is the negation.
    pub rsi_a: f64,
    pub rsi_breakdown: RsiBreakdown,
    pub goal: GoalCall,
    pub result: ResultCall,
    pub flags: ExclusionFlags,
    pub phase_a: SeasonPhase,
    pub phase_b: SeasonPhase,
}

impl MatchVerdict {
    pub fn rsi_b(&self) -> f64 {
        -self.rsi_a
    }

    pub fn is_filtered(&self) -> bool {
        !self.flags.is_empty()
    }

    pub fn has_pick(&self) -> bool {
        self.goal.is_pick() || self.result.is_pick()
    }

    pub fn flags_label(&self) -> String {
        join_flags(&self.flags)
    }
}

/// Scores fixtures against one season's statistics.
///
/// Both teams are evaluated whatever league they come from: a cross-league fixture is not
/// skipped, only a team's own division change between seasons is flagged.
pub struct MatchEvaluator<'a> {
    stats: &'a (dyn StatsLookup + Sync),
    divisions: Option<&'a (dyn DivisionLookup + Sync)>,
    config: ThresholdConfig,
    season: u16,
    mode: BlendMode,
}

impl<'a> MatchEvaluator<'a> {
    pub fn new(stats: &'a (dyn StatsLookup + Sync), config: ThresholdConfig, season: u16) -> Self {
        Self {
            stats,
            divisions: None,
            config,
            season,
            mode: BlendMode::Standard,
        }
    }

    pub fn with_divisions(mut self, divisions: &'a (dyn DivisionLookup + Sync)) -> Self {
        self.divisions = Some(divisions);
        self
    }

    pub fn with_mode(mut self, mode: BlendMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn season(&self) -> u16 {
        self.season
    }

    /// Current season blended with the previous one. In pre-season mode a team without a
    /// current-season record is profiled from last season alone.
    pub fn blend_team(&self, team_id: u32) -> Result<BlendedTeamProfile, EngineError> {
        let previous = self
            .season
            .checked_sub(1)
            .and_then(|prev| self.stats.season_stats(team_id, prev));
        match (self.stats.season_stats(team_id, self.season), previous) {
            (Some(current), previous) => Ok(blend(current, previous, self.mode)),
            (None, Some(previous)) if self.mode == BlendMode::PreSeason => {
                Ok(previous_only(previous))
            }
            (None, _) => Err(EngineError::MissingData {
                team_id,
                season: self.season,
            }),
        }
    }

    pub fn evaluate(&self, input: &MatchInput) -> Result<MatchVerdict, EngineError> {
        let a = self.blend_team(input.team_a_id)?;
        let b = self.blend_team(input.team_b_id)?;

        let o15i = compute_o15i(&a, &b);
        let rsi_breakdown = RsiBreakdown::between(&a, &b);
        let rsi_a = rsi_breakdown.index();

        let mut filter = ExclusionFilter::new(&self.config);
        if let Some(divisions) = self.divisions {
            filter = filter.with_divisions(divisions);
        }
        let flags = filter.evaluate(&a, &b, self.season);
        let filtered = !flags.is_empty();

        let goal = classify_goal(o15i, &self.config, filtered);
        let result = classify_result(rsi_a, &self.config, filtered);

        let team_a_name = display_name(input.team_a_name.as_deref(), &a);
        let team_b_name = display_name(input.team_b_name.as_deref(), &b);
        let match_label = input
            .label
            .as_deref()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| format!("{team_a_name} vs {team_b_name}"));
        let league_id = input.league_id.or_else(|| {
            [Some(self.season), self.season.checked_sub(1)]
                .into_iter()
                .flatten()
                .find_map(|season| self.stats.season_stats(input.team_a_id, season))
                .and_then(|s| s.league_id)
        });

        Ok(MatchVerdict {
            fixture_id: input.fixture_id,
            team_a_id: input.team_a_id,
            team_b_id: input.team_b_id,
            team_a_name,
            team_b_name,
            match_label,
            league_id,
            o15i,
            rsi_a,
            rsi_breakdown,
            goal,
            result,
            flags,
            phase_a: a.phase,
            phase_b: b.phase,
        })
    }

    /// Evaluates every match independently. Results come back in input order and a failed
    /// match never affects the others.
    pub fn evaluate_batch(&self, inputs: &[MatchInput]) -> Vec<Result<MatchVerdict, EngineError>> {
        let results: Vec<Result<MatchVerdict, EngineError>> =
            with_eval_pool(|| inputs.par_iter().map(|m| self.evaluate(m)).collect());

        for (input, result) in inputs.iter().zip(&results) {
            match result {
                Ok(v) => debug!(
                    a = input.team_a_id,
                    b = input.team_b_id,
                    o15i = v.o15i,
                    rsi = v.rsi_a,
                    flags = %v.flags_label(),
                    "evaluated"
                ),
                Err(err) => warn!(a = input.team_a_id, b = input.team_b_id, "match skipped: {err}"),
            }
        }
        results
    }
}

fn display_name(input_name: Option<&str>, profile: &BlendedTeamProfile) -> String {
    input_name
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_string)
        .or_else(|| profile.team_name.clone())
        .unwrap_or_else(|| format!("Team {}", profile.team_id))
}

fn with_eval_pool<T>(action: impl FnOnce() -> T + Send) -> T
where
    T: Send,
{
    let pool = EVAL_POOL.get_or_init(|| {
        rayon::ThreadPoolBuilder::new()
            .num_threads(eval_parallelism())
            .thread_name(|idx| format!("ultrasafe-eval-{idx}"))
            .build()
            .ok()
    });
    match pool {
        Some(pool) => pool.install(action),
        None => action(),
    }
}

fn eval_parallelism() -> usize {
    env::var("EVAL_PARALLELISM")
        .ok()
        .and_then(|val| val.parse::<usize>().ok())
        .unwrap_or(4)
        .clamp(1, 32)
}
