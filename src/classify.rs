use std::fmt;

use serde::Serialize;

use crate::thresholds::ThresholdConfig;

pub const AVOID_LABEL: &str = "Éviter";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Tier {
    UltraSafe,
    Safe,
    Avoid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Side {
    A,
    B,
}

impl Side {
    pub fn letter(self) -> &'static str {
        match self {
            Side::A => "A",
            Side::B => "B",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GoalCall {
    pub tier: Tier,
    /// Always the O15I, also when the call is an avoid.
    pub reliability: f64,
    pub filtered: bool,
}

impl GoalCall {
    pub fn label(&self) -> String {
        match self.tier {
            Tier::UltraSafe => "UltraSafe +1.5".to_string(),
            Tier::Safe => "Safe +1.5".to_string(),
            Tier::Avoid => format!("{AVOID_LABEL} +1.5"),
        }
    }

    pub fn is_pick(&self) -> bool {
        self.tier != Tier::Avoid
    }
}

impl fmt::Display for GoalCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ResultCall {
    pub tier: Tier,
    /// Favoured side; `None` exactly when `tier` is `Avoid`.
    pub side: Option<Side>,
    /// `|RSI|`.
    pub reliability: f64,
    pub filtered: bool,
}

impl ResultCall {
    pub fn label(&self) -> String {
        match (self.tier, self.side) {
            (Tier::UltraSafe, Some(side)) => format!("UltraSafe {} ou Nul", side.letter()),
            (Tier::Safe, Some(side)) => format!("Safe {} ou Nul", side.letter()),
            _ => AVOID_LABEL.to_string(),
        }
    }

    pub fn is_pick(&self) -> bool {
        self.tier != Tier::Avoid
    }
}

impl fmt::Display for ResultCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

/// Goal axis. Lower bounds are inclusive, so a tie lands in the stricter tier.
pub fn classify_goal(o15i: f64, config: &ThresholdConfig, filtered: bool) -> GoalCall {
    let tier = if filtered {
        Tier::Avoid
    } else if o15i >= config.ultrasafe_over15 {
        Tier::UltraSafe
    } else if o15i >= config.safe_over15 {
        Tier::Safe
    } else {
        Tier::Avoid
    };
    GoalCall {
        tier,
        reliability: o15i,
        filtered,
    }
}

/// Result axis, symmetric around zero.
pub fn classify_result(rsi: f64, config: &ThresholdConfig, filtered: bool) -> ResultCall {
    let (tier, side) = if filtered {
        (Tier::Avoid, None)
    } else if rsi >= config.ultrasafe_result {
        (Tier::UltraSafe, Some(Side::A))
    } else if rsi >= config.safe_result {
        (Tier::Safe, Some(Side::A))
    } else if rsi <= -config.ultrasafe_result {
        (Tier::UltraSafe, Some(Side::B))
    } else if rsi <= -config.safe_result {
        (Tier::Safe, Some(Side::B))
    } else {
        (Tier::Avoid, None)
    };
    ResultCall {
        tier,
        side,
        reliability: rsi.abs(),
        filtered,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn goal_tiers_follow_cutoffs() {
        let cfg = ThresholdConfig::default();
        assert_eq!(classify_goal(0.9975, &cfg, false).label(), "UltraSafe +1.5");
        assert_eq!(classify_goal(0.70, &cfg, false).label(), "Safe +1.5");
        assert_eq!(classify_goal(0.50, &cfg, false).label(), "Éviter +1.5");
    }

    #[test]
    fn ties_go_to_the_stricter_tier() {
        let cfg = ThresholdConfig::default();
        assert_eq!(classify_goal(cfg.ultrasafe_over15, &cfg, false).tier, Tier::UltraSafe);
        assert_eq!(classify_goal(cfg.safe_over15, &cfg, false).tier, Tier::Safe);
        assert_eq!(classify_result(cfg.ultrasafe_result, &cfg, false).tier, Tier::UltraSafe);
        assert_eq!(classify_result(-cfg.safe_result, &cfg, false).label(), "Safe B ou Nul");
    }

    #[test]
    fn filtered_goal_keeps_reliability() {
        let cfg = ThresholdConfig::default();
        let call = classify_goal(0.95, &cfg, true);
        assert_eq!(call.label(), "Éviter +1.5");
        assert_eq!(call.reliability, 0.95);
        assert!(call.filtered);
    }

    #[test]
    fn result_sides_are_symmetric() {
        let cfg = ThresholdConfig::default();
        let a = classify_result(0.65, &cfg, false);
        let b = classify_result(-0.65, &cfg, false);
        assert_eq!(a.label(), "UltraSafe A ou Nul");
        assert_eq!(b.label(), "UltraSafe B ou Nul");
        assert_eq!(a.reliability, b.reliability);
        assert_eq!(classify_result(0.5, &cfg, false).label(), "Safe A ou Nul");
    }

    #[test]
    fn neutral_and_filtered_results_have_no_pick() {
        let cfg = ThresholdConfig::default();
        let neutral = classify_result(0.0, &cfg, false);
        assert_eq!(neutral.tier, Tier::Avoid);
        assert!(neutral.side.is_none());
        assert_eq!(neutral.label(), "Éviter");
        let vetoed = classify_result(0.9, &cfg, true);
        assert!(!vetoed.is_pick());
        assert_eq!(vetoed.reliability, 0.9);
    }

    #[test]
    fn nan_is_still_classified() {
        let cfg = ThresholdConfig::default();
        assert_eq!(classify_goal(f64::NAN, &cfg, false).tier, Tier::Avoid);
        assert_eq!(classify_result(f64::NAN, &cfg, false).tier, Tier::Avoid);
    }
}
