//! End-of-session payload handed to adapters and the persistence gateway.
use serde::{Deserialize, Serialize};

use crate::evaluator::Termination;
use crate::modes::QuizMode;
use crate::opponent::{BattleOutcome, BattleRule};
use crate::question::DifficultyTier;

/// Battle result attached to a summary when an opponent took part.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BattleReport {
    pub opponent_id: String,
    pub rule: BattleRule,
    pub outcome: BattleOutcome,
    pub opponent_score: u32,
    pub opponent_lives: i32,
    pub opponent_answered: u32,
    /// Completion time the player had to beat in a speed race.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed_race_deadline_ms: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub won: bool,
    pub final_score: u32,
    pub points: u32,
    pub questions_answered: u32,
    pub correct_answers: u32,
    pub lives_remaining: i32,
    pub max_combo: u32,
    pub max_difficulty_reached: DifficultyTier,
    pub duration_seconds: u64,
    pub subject: String,
    pub mode: QuizMode,
    pub termination: Termination,
    #[serde(default)]
    pub powerups_used: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub battle: Option<BattleReport>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub logs: Vec<String>,
}

impl SessionSummary {
    /// Fraction of answered questions that were correct, `0.0` when none were answered.
    #[must_use]
    pub fn accuracy(&self) -> f64 {
        if self.questions_answered == 0 {
            0.0
        } else {
            f64::from(self.correct_answers) / f64::from(self.questions_answered)
        }
    }

    #[must_use]
    pub const fn is_perfect(&self) -> bool {
        self.questions_answered > 0 && self.correct_answers == self.questions_answered
    }

    #[must_use]
    pub fn battle_won(&self) -> Option<bool> {
        self.battle
            .as_ref()
            .map(|report| report.outcome == BattleOutcome::PlayerWins)
    }
}

#[cfg(test)]
pub(crate) fn sample_summary(mode: QuizMode, won: bool) -> SessionSummary {
    use crate::evaluator::VictoryReason;
    SessionSummary {
        won,
        final_score: 8,
        points: 12,
        questions_answered: 10,
        correct_answers: 8,
        lives_remaining: 1,
        max_combo: 5,
        max_difficulty_reached: DifficultyTier::Medium,
        duration_seconds: 42,
        subject: "math".to_string(),
        mode,
        termination: if won {
            Termination::Victory(VictoryReason::TargetReached)
        } else {
            Termination::Defeat
        },
        powerups_used: 0,
        battle: None,
        logs: Vec::new(),
    }
}
