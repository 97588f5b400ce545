//! Game modes and the parameter overlays they apply at session start.
//!
//! Every mode runs the same selector, evaluator, and opponent code; a mode
//! only changes the numbers fed into them.
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::config::QuizConfig;
use crate::constants::{SUBJECT_ALL, SUDDEN_DEATH_MULTIPLIER};
use crate::opponent::BattleRule;
use crate::question::DifficultyTier;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum QuizMode {
    #[default]
    Classic,
    Survival,
    SuddenDeath,
    Lightning,
    BossRush,
    AiBattle,
}

impl QuizMode {
    pub const ALL: [Self; 6] = [
        Self::Classic,
        Self::Survival,
        Self::SuddenDeath,
        Self::Lightning,
        Self::BossRush,
        Self::AiBattle,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Classic => "classic",
            Self::Survival => "survival",
            Self::SuddenDeath => "sudden_death",
            Self::Lightning => "lightning",
            Self::BossRush => "boss_rush",
            Self::AiBattle => "ai_battle",
        }
    }

    /// Modes that run an opponent alongside the player.
    #[must_use]
    pub const fn is_battle(self) -> bool {
        matches!(self, Self::AiBattle | Self::BossRush)
    }
}

impl fmt::Display for QuizMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QuizMode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|mode| mode.as_str() == s)
            .ok_or(())
    }
}

/// How many questions a mode plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestionTarget {
    /// Whatever the player asked for.
    Chosen,
    Fixed(u32),
    Unbounded,
}

/// Parameter overlay for one mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModePolicy {
    pub subject_override: Option<&'static str>,
    pub target: QuestionTarget,
    pub starting_lives: i32,
    pub infinite_lives: bool,
    pub hard_only: bool,
    pub multiplier_override: Option<u32>,
    pub starting_difficulty: DifficultyTier,
    pub ceiling_override: Option<DifficultyTier>,
    pub powerups_enabled: bool,
    pub time_limit_ms: Option<u64>,
}

impl ModePolicy {
    #[must_use]
    pub fn for_mode(mode: QuizMode, cfg: &QuizConfig) -> Self {
        let base = Self {
            subject_override: None,
            target: QuestionTarget::Chosen,
            starting_lives: cfg.default_lives,
            infinite_lives: false,
            hard_only: false,
            multiplier_override: None,
            starting_difficulty: DifficultyTier::Easy,
            ceiling_override: None,
            powerups_enabled: true,
            time_limit_ms: None,
        };
        match mode {
            QuizMode::Classic | QuizMode::AiBattle => base,
            QuizMode::Survival => Self {
                subject_override: Some(SUBJECT_ALL),
                target: QuestionTarget::Unbounded,
                starting_lives: 3,
                ceiling_override: Some(DifficultyTier::MAX),
                powerups_enabled: false,
                ..base
            },
            QuizMode::Lightning => Self {
                target: QuestionTarget::Unbounded,
                infinite_lives: true,
                time_limit_ms: Some(cfg.lightning_ms),
                ..base
            },
            QuizMode::SuddenDeath => Self {
                target: QuestionTarget::Fixed(cfg.sudden_death_target),
                starting_lives: 1,
                hard_only: true,
                multiplier_override: Some(SUDDEN_DEATH_MULTIPLIER),
                starting_difficulty: DifficultyTier::Hard,
                ceiling_override: Some(DifficultyTier::MAX),
                ..base
            },
            QuizMode::BossRush => Self {
                target: QuestionTarget::Fixed(cfg.boss_stage_questions),
                starting_lives: 1,
                powerups_enabled: false,
                ..base
            },
        }
    }

    /// Merge the overlay with the player's request.
    #[must_use]
    pub fn resolve(&self, request: &SessionConfig, cfg: &QuizConfig) -> SessionParams {
        let questions_target = match self.target {
            QuestionTarget::Chosen => Some(request.questions_target.unwrap_or(cfg.default_target)),
            QuestionTarget::Fixed(n) => Some(n),
            QuestionTarget::Unbounded => None,
        };
        let ceiling = self
            .ceiling_override
            .or(request.difficulty_ceiling)
            .unwrap_or(cfg.default_ceiling);
        SessionParams {
            mode: request.mode,
            subject: self
                .subject_override
                .map_or_else(|| request.subject.clone(), str::to_string),
            questions_target,
            starting_lives: self.starting_lives,
            infinite_lives: self.infinite_lives,
            hard_only: self.hard_only,
            multiplier_override: self.multiplier_override,
            starting_difficulty: self.starting_difficulty.min(ceiling),
            ceiling,
            curveballs_enabled: request.curveballs_enabled.unwrap_or(cfg.curveballs_enabled),
            powerups_enabled: self.powerups_enabled,
            time_limit_ms: self.time_limit_ms,
        }
    }
}

/// What the player asked for when starting a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    pub mode: QuizMode,
    pub subject: String,
    #[serde(default)]
    pub questions_target: Option<u32>,
    #[serde(default)]
    pub curveballs_enabled: Option<bool>,
    #[serde(default)]
    pub difficulty_ceiling: Option<DifficultyTier>,
    #[serde(default)]
    pub opponent: Option<String>,
    #[serde(default)]
    pub battle_rule: BattleRule,
}

impl SessionConfig {
    #[must_use]
    pub fn new(mode: QuizMode, subject: impl Into<String>) -> Self {
        Self {
            mode,
            subject: subject.into(),
            questions_target: None,
            curveballs_enabled: None,
            difficulty_ceiling: None,
            opponent: None,
            battle_rule: BattleRule::default(),
        }
    }

    #[must_use]
    pub fn with_target(mut self, target: u32) -> Self {
        self.questions_target = Some(target);
        self
    }

    #[must_use]
    pub fn with_curveballs(mut self, enabled: bool) -> Self {
        self.curveballs_enabled = Some(enabled);
        self
    }

    #[must_use]
    pub fn with_ceiling(mut self, ceiling: DifficultyTier) -> Self {
        self.difficulty_ceiling = Some(ceiling);
        self
    }

    #[must_use]
    pub fn with_opponent(mut self, opponent: impl Into<String>, rule: BattleRule) -> Self {
        self.opponent = Some(opponent.into());
        self.battle_rule = rule;
        self
    }
}

/// Fully resolved parameters for one session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionParams {
    pub mode: QuizMode,
    pub subject: String,
    pub questions_target: Option<u32>,
    pub starting_lives: i32,
    pub infinite_lives: bool,
    pub hard_only: bool,
    pub multiplier_override: Option<u32>,
    pub starting_difficulty: DifficultyTier,
    pub ceiling: DifficultyTier,
    pub curveballs_enabled: bool,
    pub powerups_enabled: bool,
    pub time_limit_ms: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolve(mode: QuizMode, request: SessionConfig) -> SessionParams {
        let cfg = QuizConfig::default();
        ModePolicy::for_mode(mode, &cfg).resolve(&request, &cfg)
    }

    #[test]
    fn survival_forces_all_subjects_and_unbounded_target() {
        let params = resolve(
            QuizMode::Survival,
            SessionConfig::new(QuizMode::Survival, "math").with_target(5),
        );
        assert_eq!(params.subject, SUBJECT_ALL);
        assert_eq!(params.questions_target, None);
        assert_eq!(params.starting_lives, 3);
        assert_eq!(params.ceiling, DifficultyTier::Insane);
        assert!(!params.powerups_enabled);
    }

    #[test]
    fn sudden_death_is_one_life_hard_only() {
        let params = resolve(
            QuizMode::SuddenDeath,
            SessionConfig::new(QuizMode::SuddenDeath, "history"),
        );
        assert_eq!(params.starting_lives, 1);
        assert!(params.hard_only);
        assert_eq!(params.multiplier_override, Some(10));
        assert_eq!(params.questions_target, Some(20));
        assert_eq!(params.starting_difficulty, DifficultyTier::Hard);
    }

    #[test]
    fn lightning_has_infinite_lives_and_deadline() {
        let params = resolve(
            QuizMode::Lightning,
            SessionConfig::new(QuizMode::Lightning, "science"),
        );
        assert!(params.infinite_lives);
        assert_eq!(params.questions_target, None);
        assert_eq!(params.time_limit_ms, Some(60_000));
    }

    #[test]
    fn classic_uses_requested_values_or_defaults() {
        let params = resolve(
            QuizMode::Classic,
            SessionConfig::new(QuizMode::Classic, "math")
                .with_target(5)
                .with_ceiling(DifficultyTier::Medium)
                .with_curveballs(false),
        );
        assert_eq!(params.questions_target, Some(5));
        assert_eq!(params.ceiling, DifficultyTier::Medium);
        assert!(!params.curveballs_enabled);

        let defaults = resolve(QuizMode::Classic, SessionConfig::new(QuizMode::Classic, "math"));
        assert_eq!(defaults.questions_target, Some(10));
        assert_eq!(defaults.starting_lives, 3);
    }

    #[test]
    fn mode_names_round_trip_through_from_str() {
        for mode in QuizMode::ALL {
            assert_eq!(mode.as_str().parse::<QuizMode>(), Ok(mode));
        }
        assert!("arcade".parse::<QuizMode>().is_err());
    }
}
