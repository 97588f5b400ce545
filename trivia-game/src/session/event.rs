//! Events the session emits for a presentation adapter to consume.
use serde::{Deserialize, Serialize};

use crate::evaluator::AnswerOutcome;
use crate::question::DifficultyTier;
use crate::session::SessionSummary;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    QuestionPresented {
        /// One-based question number within the session.
        seq: u32,
        text: String,
        subject: Option<String>,
        tier: DifficultyTier,
        curveball: bool,
    },
    CurveballInjected {
        seq: u32,
        source_subject: String,
    },
    AnswerEvaluated {
        seq: u32,
        selected: usize,
        outcome: AnswerOutcome,
    },
    OpponentAnswered {
        seq: u32,
        correct: bool,
        opponent_lives: i32,
        opponent_score: u32,
    },
    PowerUpUsed {
        seq: u32,
        id: String,
        remaining: u32,
    },
    SessionEnded(SessionSummary),
}

impl SessionEvent {
    /// Stable key for log views and i18n lookups.
    #[must_use]
    pub const fn key(&self) -> &'static str {
        match self {
            Self::QuestionPresented { .. } => "event.question.presented",
            Self::CurveballInjected { .. } => "event.curveball.injected",
            Self::AnswerEvaluated { .. } => "event.answer.evaluated",
            Self::OpponentAnswered { .. } => "event.opponent.answered",
            Self::PowerUpUsed { .. } => "event.powerup.used",
            Self::SessionEnded(_) => "event.session.ended",
        }
    }
}
