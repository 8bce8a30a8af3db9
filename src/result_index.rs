//! Signed result index (RSI), always from team A's point of view.
//!
//! Each component is `A - B` (failed-to-score is inverted so that positive still favours A),
//! divided by a fixed scale and clamped to [-1, 1] before weighting:
//!
//! | component        | weight | scale |
//! |------------------|--------|-------|
//! | win rate         | 0.40   | 1.0   |
//! | goal difference  | 0.25   | 2.0   |
//! | defense rate     | 0.15   | 1.0   |
//! | attack rate      | 0.10   | 1.0   |
//! | failed to score  | 0.05   | 1.0   |
//! | clean sheets     | 0.05   | 1.0   |
//!
//! Every step is antisymmetric, so swapping the teams negates the index exactly.

use serde::Serialize;

use crate::goal_index::clamp;
use crate::season_blend::BlendedTeamProfile;

const W_WIN: f64 = 0.40;
const W_GDIFF: f64 = 0.25;
const W_DEF: f64 = 0.15;
const W_ATK: f64 = 0.10;
const W_FAIL: f64 = 0.05;
const W_CS: f64 = 0.05;

/// Goal-difference gap (per game) treated as a maximal edge.
const GDIFF_SCALE: f64 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct RsiBreakdown {
    pub win: f64,
    pub goal_diff: f64,
    pub defense: f64,
    pub attack: f64,
    pub fail: f64,
    pub clean_sheet: f64,
}

impl RsiBreakdown {
    pub fn between(a: &BlendedTeamProfile, b: &BlendedTeamProfile) -> Self {
        Self {
            win: normalized_delta(a.win_rate, b.win_rate, 1.0),
            goal_diff: normalized_delta(a.goal_diff, b.goal_diff, GDIFF_SCALE),
            defense: normalized_delta(a.defense_rate, b.defense_rate, 1.0),
            attack: normalized_delta(a.attack_rate, b.attack_rate, 1.0),
            fail: normalized_delta(b.fail_rate, a.fail_rate, 1.0),
            clean_sheet: normalized_delta(a.clean_sheet_rate, b.clean_sheet_rate, 1.0),
        }
    }

    pub fn index(&self) -> f64 {
        W_WIN * self.win
            + W_GDIFF * self.goal_diff
            + W_DEF * self.defense
            + W_ATK * self.attack
            + W_FAIL * self.fail
            + W_CS * self.clean_sheet
    }
}

fn normalized_delta(a: f64, b: f64, scale: f64) -> f64 {
    clamp((a - b) / scale, -1.0, 1.0)
}

pub fn compute_rsi(a: &BlendedTeamProfile, b: &BlendedTeamProfile) -> f64 {
    RsiBreakdown::between(a, b).index()
}
