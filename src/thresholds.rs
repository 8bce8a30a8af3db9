use std::fs;
use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ConfigError;

/// Shift applied to the four index cutoffs by the conservative / aggressive profiles.
pub const PROFILE_SHIFT: f64 = 0.05;

/// Cutoffs used by the classifier and the sample-size filter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdConfig {
    pub ultrasafe_over15: f64,
    pub safe_over15: f64,
    pub ultrasafe_result: f64,
    pub safe_result: f64,
    #[serde(alias = "played_total_min")]
    pub played_min: u32,
    pub played_combine_min: u32,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            ultrasafe_over15: 0.78,
            safe_over15: 0.68,
            ultrasafe_result: 0.60,
            safe_result: 0.45,
            played_min: 6,
            played_combine_min: 10,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ThresholdProfile {
    #[default]
    Standard,
    Conservative,
    Aggressive,
}

impl FromStr for ThresholdProfile {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "standard" | "default" => Ok(Self::Standard),
            "conservative" | "conservateur" => Ok(Self::Conservative),
            "aggressive" | "agressif" => Ok(Self::Aggressive),
            other => Err(ConfigError::Parse(format!("unknown profile `{other}`"))),
        }
    }
}

impl ThresholdConfig {
    pub fn conservative(&self) -> Self {
        self.shifted(PROFILE_SHIFT)
    }

    pub fn aggressive(&self) -> Self {
        self.shifted(-PROFILE_SHIFT)
    }

    pub fn with_profile(&self, profile: ThresholdProfile) -> Self {
        match profile {
            ThresholdProfile::Standard => *self,
            ThresholdProfile::Conservative => self.conservative(),
            ThresholdProfile::Aggressive => self.aggressive(),
        }
    }

    fn shifted(&self, delta: f64) -> Self {
        Self {
            ultrasafe_over15: self.ultrasafe_over15 + delta,
            safe_over15: self.safe_over15 + delta,
            ultrasafe_result: self.ultrasafe_result + delta,
            safe_result: self.safe_result + delta,
            ..*self
        }
    }

    /// Merges a JSON object of overrides. Keys not present keep their current value.
    pub fn apply_override_json(&self, raw: &str) -> Result<Self, ConfigError> {
        let doc: Value =
            serde_json::from_str(raw).map_err(|err| ConfigError::Parse(err.to_string()))?;
        let Value::Object(map) = doc else {
            return Err(ConfigError::Parse("expected a JSON object".to_string()));
        };
        self.apply_override_map(&map)
    }

    pub fn apply_override_map(&self, map: &Map<String, Value>) -> Result<Self, ConfigError> {
        let mut out = *self;
        for (key, value) in map {
            let v = numeric_value(key, value)?;
            match key.as_str() {
                "ultrasafe_over15" => out.ultrasafe_over15 = v,
                "safe_over15" => out.safe_over15 = v,
                "ultrasafe_result" => out.ultrasafe_result = v,
                "safe_result" => out.safe_result = v,
                "played_min" | "played_total_min" => out.played_min = game_count(key, v)?,
                "played_combine_min" => out.played_combine_min = game_count(key, v)?,
                _ => return Err(ConfigError::UnknownKey(key.clone())),
            }
        }
        Ok(out)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let cutoffs = [
            ("ultrasafe_over15", self.ultrasafe_over15),
            ("safe_over15", self.safe_over15),
            ("ultrasafe_result", self.ultrasafe_result),
            ("safe_result", self.safe_result),
        ];
        for (key, value) in cutoffs {
            if !value.is_finite() || value <= 0.0 || value > 1.0 {
                return Err(ConfigError::OutOfRange {
                    key: key.to_string(),
                    value,
                    expected: "a value in (0, 1]",
                });
            }
        }
        if self.safe_over15 > self.ultrasafe_over15 {
            return Err(ConfigError::Inconsistent {
                lower: "safe_over15",
                lower_value: self.safe_over15,
                upper: "ultrasafe_over15",
                upper_value: self.ultrasafe_over15,
            });
        }
        if self.safe_result > self.ultrasafe_result {
            return Err(ConfigError::Inconsistent {
                lower: "safe_result",
                lower_value: self.safe_result,
                upper: "ultrasafe_result",
                upper_value: self.ultrasafe_result,
            });
        }
        Ok(())
    }
}

fn numeric_value(key: &str, value: &Value) -> Result<f64, ConfigError> {
    match value {
        Value::Null => Err(ConfigError::MissingValue(key.to_string())),
        Value::Number(n) => n.as_f64().ok_or_else(|| ConfigError::NotNumeric {
            key: key.to_string(),
            raw: n.to_string(),
        }),
        other => Err(ConfigError::NotNumeric {
            key: key.to_string(),
            raw: other.to_string(),
        }),
    }
}

fn game_count(key: &str, v: f64) -> Result<u32, ConfigError> {
    if !v.is_finite() || v < 0.0 || v.fract() != 0.0 || v > f64::from(u32::MAX) {
        return Err(ConfigError::OutOfRange {
            key: key.to_string(),
            value: v,
            expected: "a non-negative whole number of games",
        });
    }
    Ok(v as u32)
}

/// Resolves the run configuration: defaults, then the override file, then the profile shift.
/// Any problem is fatal because every verdict depends on these numbers.
pub fn load_thresholds(
    override_path: Option<&Path>,
    profile: ThresholdProfile,
) -> Result<ThresholdConfig> {
    let mut config = ThresholdConfig::default();
    if let Some(path) = override_path {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("read thresholds {}", path.display()))?;
        config = config
            .apply_override_json(&raw)
            .with_context(|| format!("apply thresholds {}", path.display()))?;
    }
    let config = config.with_profile(profile);
    config.validate().context("invalid threshold configuration")?;
    Ok(config)
}
