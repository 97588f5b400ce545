//! Session tuning loaded from the bundled `quiz.json` asset.
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{
    BOSS_STAGE_QUESTIONS, DEFAULT_LIVES, LIGHTNING_DURATION_MS, SUDDEN_DEATH_TARGET,
};
use crate::opponent::TieBreak;
use crate::pool::CurveballSourcePolicy;
use crate::question::DifficultyTier;

const DEFAULT_QUIZ_CONFIG: &str = include_str!("../assets/quiz.json");

/// Errors raised when quiz configuration invariants are violated.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{field} must be at least {min} (got {value})")]
    MinViolation {
        field: &'static str,
        min: u64,
        value: u64,
    },
    #[error("default lives must be positive (got {0})")]
    NonPositiveLives(i32),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizConfig {
    #[serde(default = "QuizConfig::default_lives")]
    pub default_lives: i32,
    #[serde(default = "QuizConfig::default_target")]
    pub default_target: u32,
    #[serde(default = "QuizConfig::default_ceiling")]
    pub default_ceiling: DifficultyTier,
    #[serde(default = "QuizConfig::default_curveballs")]
    pub curveballs_enabled: bool,
    #[serde(default)]
    pub curveball_sources: CurveballSourcePolicy,
    #[serde(default = "QuizConfig::default_lightning_ms")]
    pub lightning_ms: u64,
    #[serde(default = "QuizConfig::default_sudden_death_target")]
    pub sudden_death_target: u32,
    #[serde(default = "QuizConfig::default_boss_stage_questions")]
    pub boss_stage_questions: u32,
    #[serde(default)]
    pub tie_break: TieBreak,
}

impl QuizConfig {
    const fn default_lives() -> i32 {
        DEFAULT_LIVES
    }

    const fn default_target() -> u32 {
        10
    }

    const fn default_ceiling() -> DifficultyTier {
        DifficultyTier::Hard
    }

    const fn default_curveballs() -> bool {
        true
    }

    const fn default_lightning_ms() -> u64 {
        LIGHTNING_DURATION_MS
    }

    const fn default_sudden_death_target() -> u32 {
        SUDDEN_DEATH_TARGET
    }

    const fn default_boss_stage_questions() -> u32 {
        BOSS_STAGE_QUESTIONS
    }

    /// Load the bundled configuration, falling back to code defaults.
    #[must_use]
    pub fn load_from_static() -> Self {
        Self::from_json(DEFAULT_QUIZ_CONFIG).unwrap_or_else(|err| {
            log::warn!("bundled quiz config rejected, using defaults: {err}");
            Self::default()
        })
    }

    /// Parse and validate a configuration document.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or violates validation rules.
    pub fn from_json(json: &str) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        let cfg: Self = serde_json::from_str(json)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Check that every tuning value is usable.
    ///
    /// # Errors
    ///
    /// Returns the first violated rule.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_lives <= 0 {
            return Err(ConfigError::NonPositiveLives(self.default_lives));
        }
        ensure_min("default_target", u64::from(self.default_target), 1)?;
        ensure_min("lightning_ms", self.lightning_ms, 1)?;
        ensure_min(
            "sudden_death_target",
            u64::from(self.sudden_death_target),
            1,
        )?;
        ensure_min(
            "boss_stage_questions",
            u64::from(self.boss_stage_questions),
            1,
        )?;
        Ok(())
    }
}

fn ensure_min(field: &'static str, value: u64, min: u64) -> Result<(), ConfigError> {
    if value < min {
        Err(ConfigError::MinViolation { field, min, value })
    } else {
        Ok(())
    }
}

impl Default for QuizConfig {
    fn default() -> Self {
        Self {
            default_lives: Self::default_lives(),
            default_target: Self::default_target(),
            default_ceiling: Self::default_ceiling(),
            curveballs_enabled: Self::default_curveballs(),
            curveball_sources: CurveballSourcePolicy::default(),
            lightning_ms: Self::default_lightning_ms(),
            sudden_death_target: Self::default_sudden_death_target(),
            boss_stage_questions: Self::default_boss_stage_questions(),
            tie_break: TieBreak::default(),
        }
    }
}
