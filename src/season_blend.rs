use serde::Serialize;

use crate::stats::TeamSeasonStats;

/// Below this many current-season games the previous season dominates the blend.
pub const EARLY_SEASON_GAMES: u32 = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum BlendMode {
    #[default]
    Standard,
    /// The current-season dataset is too sparse to trust; lean almost entirely on last season.
    PreSeason,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SeasonPhase {
    Early,
    Advanced,
    PreSeason,
    CurrentOnly,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SeasonWeights {
    pub current: f64,
    pub previous: f64,
}

impl SeasonWeights {
    const fn new(current: f64, previous: f64) -> Self {
        Self { current, previous }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BlendedTeamProfile {
    pub team_id: u32,
    pub team_name: Option<String>,
    pub phase: SeasonPhase,
    pub weights: SeasonWeights,
    pub current_games: u32,
    pub games_played: f64,
    pub gf_avg: f64,
    pub ga_avg: f64,
    pub win_rate: f64,
    pub goal_diff: f64,
    pub defense_rate: f64,
    pub attack_rate: f64,
    pub fail_rate: f64,
    pub clean_sheet_rate: f64,
    pub over15_rate: Option<f64>,
}

pub fn season_weights(current_games: u32, mode: BlendMode) -> (SeasonPhase, SeasonWeights) {
    match mode {
        BlendMode::Standard if current_games < EARLY_SEASON_GAMES => {
            (SeasonPhase::Early, SeasonWeights::new(0.30, 0.70))
        }
        BlendMode::Standard => (SeasonPhase::Advanced, SeasonWeights::new(0.70, 0.30)),
        BlendMode::PreSeason if current_games > 0 => {
            (SeasonPhase::PreSeason, SeasonWeights::new(0.20, 0.80))
        }
        BlendMode::PreSeason => (SeasonPhase::PreSeason, SeasonWeights::new(0.0, 1.0)),
    }
}

/// Merges a team's current season with its previous one.
///
/// Rates are blended directly rather than recomputed from blended counts. Without a previous
/// season the current one is used as is.
pub fn blend(
    current: &TeamSeasonStats,
    previous: Option<&TeamSeasonStats>,
    mode: BlendMode,
) -> BlendedTeamProfile {
    let Some(prev) = previous else {
        return single_season(
            current,
            SeasonPhase::CurrentOnly,
            SeasonWeights::new(1.0, 0.0),
            current.games_played,
        );
    };
    debug_assert_eq!(current.team_id, prev.team_id, "blending two different teams");

    let (phase, w) = season_weights(current.games_played, mode);
    let mix = |cur: f64, old: f64| w.current * cur + w.previous * old;

    let over15_rate = match (current.over15_rate, prev.over15_rate) {
        (Some(c), Some(p)) => Some(mix(c, p)),
        (c, p) => c.or(p),
    };

    BlendedTeamProfile {
        team_id: current.team_id,
        team_name: current.team_name.clone().or_else(|| prev.team_name.clone()),
        phase,
        weights: w,
        current_games: current.games_played,
        games_played: mix(current.games_played as f64, prev.games_played as f64),
        gf_avg: mix(current.gf_avg, prev.gf_avg),
        ga_avg: mix(current.ga_avg, prev.ga_avg),
        win_rate: mix(current.win_rate, prev.win_rate),
        goal_diff: mix(current.goal_diff, prev.goal_diff),
        defense_rate: mix(current.defense_rate, prev.defense_rate),
        attack_rate: mix(current.attack_rate, prev.attack_rate),
        fail_rate: mix(current.fail_rate, prev.fail_rate),
        clean_sheet_rate: mix(current.clean_sheet_rate, prev.clean_sheet_rate),
        over15_rate,
    }
}

/// Pre-season profile of a team that has no current-season record yet (promoted, or simply not
/// in the sparse current file). Only meaningful in [`BlendMode::PreSeason`].
pub fn previous_only(previous: &TeamSeasonStats) -> BlendedTeamProfile {
    single_season(
        previous,
        SeasonPhase::PreSeason,
        SeasonWeights::new(0.0, 1.0),
        0,
    )
}

fn single_season(
    stats: &TeamSeasonStats,
    phase: SeasonPhase,
    weights: SeasonWeights,
    current_games: u32,
) -> BlendedTeamProfile {
    BlendedTeamProfile {
        team_id: stats.team_id,
        team_name: stats.team_name.clone(),
        phase,
        weights,
        current_games,
        games_played: stats.games_played as f64,
        gf_avg: stats.gf_avg,
        ga_avg: stats.ga_avg,
        win_rate: stats.win_rate,
        goal_diff: stats.goal_diff,
        defense_rate: stats.defense_rate,
        attack_rate: stats.attack_rate,
        fail_rate: stats.fail_rate,
        clean_sheet_rate: stats.clean_sheet_rate,
        over15_rate: stats.over15_rate,
    }
}
