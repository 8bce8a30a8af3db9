use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;

use crate::season_blend::BlendedTeamProfile;
use crate::stats::DivisionLookup;
use crate::thresholds::ThresholdConfig;

/// Blended goal-difference gap beyond which the data is considered suspect.
pub const SUSPECT_GDIFF_GAP: f64 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExclusionFlag {
    EchantillonFaible,
    MelangeDivisions,
    GapNiveauSuspect,
}

impl ExclusionFlag {
    pub fn code(self) -> &'static str {
        match self {
            ExclusionFlag::EchantillonFaible => "echantillon_faible",
            ExclusionFlag::MelangeDivisions => "melange_divisions",
            ExclusionFlag::GapNiveauSuspect => "gap_niveau_suspect",
        }
    }
}

impl fmt::Display for ExclusionFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

pub type ExclusionFlags = BTreeSet<ExclusionFlag>;

pub fn join_flags(flags: &ExclusionFlags) -> String {
    flags
        .iter()
        .map(|f| f.code())
        .collect::<Vec<_>>()
        .join("|")
}

/// Veto checks that run independently of both indices.
pub struct ExclusionFilter<'a> {
    config: &'a ThresholdConfig,
    divisions: Option<&'a (dyn DivisionLookup + Sync)>,
}

impl<'a> ExclusionFilter<'a> {
    pub fn new(config: &'a ThresholdConfig) -> Self {
        Self {
            config,
            divisions: None,
        }
    }

    pub fn with_divisions(mut self, divisions: &'a (dyn DivisionLookup + Sync)) -> Self {
        self.divisions = Some(divisions);
        self
    }

    pub fn evaluate(
        &self,
        a: &BlendedTeamProfile,
        b: &BlendedTeamProfile,
        season: u16,
    ) -> ExclusionFlags {
        let mut flags = ExclusionFlags::new();
        if self.low_sample(a, b) {
            flags.insert(ExclusionFlag::EchantillonFaible);
        }
        if self.changed_division(a.team_id, season) || self.changed_division(b.team_id, season) {
            flags.insert(ExclusionFlag::MelangeDivisions);
        }
        if (a.goal_diff - b.goal_diff).abs() > SUSPECT_GDIFF_GAP {
            flags.insert(ExclusionFlag::GapNiveauSuspect);
        }
        flags
    }

    fn low_sample(&self, a: &BlendedTeamProfile, b: &BlendedTeamProfile) -> bool {
        let min = f64::from(self.config.played_min);
        let combined_min = f64::from(self.config.played_combine_min);
        a.games_played < min
            || b.games_played < min
            || a.games_played + b.games_played < combined_min
    }

    fn changed_division(&self, team_id: u32, season: u16) -> bool {
        let Some(lookup) = self.divisions else {
            return false;
        };
        let Some(previous_season) = season.checked_sub(1) else {
            return false;
        };
        match (
            lookup.division(team_id, season),
            lookup.division(team_id, previous_season),
        ) {
            (Some(now), Some(before)) => now != before,
            _ => false,
        }
    }
}
