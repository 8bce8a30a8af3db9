use crate::season_blend::BlendedTeamProfile;

/// Expected "open" goals per game that maps to a near-certain over 1.5.
const OPEN_GOALS_SCALE: f64 = 3.0;
pub const ESTIMATE_FLOOR: f64 = 0.30;
pub const ESTIMATE_CEIL: f64 = 0.95;

/// Over-1.5 propensity estimated from goals scored plus conceded.
pub fn estimate_over15(gf_avg: f64, ga_avg: f64) -> f64 {
    let open = gf_avg + ga_avg;
    clamp(open / OPEN_GOALS_SCALE, ESTIMATE_FLOOR, ESTIMATE_CEIL)
}

/// The observed rate when the team has one, the estimate otherwise.
pub fn team_over15(observed: Option<f64>, gf_avg: f64, ga_avg: f64) -> f64 {
    observed.unwrap_or_else(|| estimate_over15(gf_avg, ga_avg))
}

pub fn profile_over15(profile: &BlendedTeamProfile) -> f64 {
    team_over15(profile.over15_rate, profile.gf_avg, profile.ga_avg)
}

/// Combines two propensities treating "this team misses" as independent events.
pub fn combine_over15(est_a: f64, est_b: f64) -> f64 {
    1.0 - (1.0 - est_a) * (1.0 - est_b)
}

pub fn compute_o15i(a: &BlendedTeamProfile, b: &BlendedTeamProfile) -> f64 {
    combine_over15(profile_over15(a), profile_over15(b))
}

pub(crate) fn clamp(v: f64, lo: f64, hi: f64) -> f64 {
    v.max(lo).min(hi)
}
