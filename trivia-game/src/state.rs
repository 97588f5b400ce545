use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_LIVES, SUBJECT_ALL};
use crate::modes::{QuizMode, SessionParams};
use crate::question::{DifficultyTier, DrawnQuestion};

/// Per-run quiz state. Created at quiz start, mutated only by the selector
/// and evaluator, and reset to defaults when the session ends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    pub mode: QuizMode,
    pub subject: String,
    pub difficulty_ceiling: DifficultyTier,
    pub current_difficulty: DifficultyTier,
    pub max_difficulty_reached: DifficultyTier,
    pub lives: i32,
    pub starting_lives: i32,
    pub infinite_lives: bool,
    pub hard_only: bool,
    /// Base points: 1 per correct answer, 3 per correct curveball.
    pub score: u32,
    /// Multiplier-adjusted economy points, including combo bonuses.
    pub points: u32,
    pub questions_answered: u32,
    pub questions_target: Option<u32>,
    pub correct_answers: u32,
    pub combo_count: u32,
    pub max_combo: u32,
    pub multiplier: u32,
    pub multiplier_streak: u32,
    pub multiplier_override: Option<u32>,
    pub curveballs_enabled: bool,
    pub is_curveball_active: bool,
    /// Cosmetic power-ups may be spent during this session.
    pub powerups_enabled: bool,
    pub powerups_used: u32,
    pub start_ms: u64,
    pub queue: Vec<DrawnQuestion>,
    #[serde(default)]
    pub logs: Vec<String>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            mode: QuizMode::Classic,
            subject: SUBJECT_ALL.to_string(),
            difficulty_ceiling: DifficultyTier::Hard,
            current_difficulty: DifficultyTier::Easy,
            max_difficulty_reached: DifficultyTier::Easy,
            lives: DEFAULT_LIVES,
            starting_lives: DEFAULT_LIVES,
            infinite_lives: false,
            hard_only: false,
            score: 0,
            points: 0,
            questions_answered: 0,
            questions_target: None,
            correct_answers: 0,
            combo_count: 0,
            max_combo: 0,
            multiplier: 1,
            multiplier_streak: 0,
            multiplier_override: None,
            curveballs_enabled: false,
            is_curveball_active: false,
            powerups_enabled: false,
            powerups_used: 0,
            start_ms: 0,
            queue: Vec::new(),
            logs: Vec::new(),
        }
    }
}

impl SessionState {
    /// Fresh state for a resolved set of session parameters.
    #[must_use]
    pub fn from_params(params: &SessionParams, start_ms: u64) -> Self {
        Self {
            mode: params.mode,
            subject: params.subject.clone(),
            difficulty_ceiling: params.ceiling,
            current_difficulty: params.starting_difficulty,
            max_difficulty_reached: params.starting_difficulty,
            lives: params.starting_lives,
            starting_lives: params.starting_lives,
            infinite_lives: params.infinite_lives,
            hard_only: params.hard_only,
            questions_target: params.questions_target,
            multiplier: params.multiplier_override.unwrap_or(1),
            multiplier_override: params.multiplier_override,
            curveballs_enabled: params.curveballs_enabled,
            powerups_enabled: params.powerups_enabled,
            start_ms,
            ..Self::default()
        }
    }

    /// Lives are exhausted and nothing protects the player.
    #[must_use]
    pub const fn is_defeated(&self) -> bool {
        !self.infinite_lives && self.lives <= 0
    }

    #[must_use]
    pub fn target_reached(&self) -> bool {
        self.questions_target
            .is_some_and(|target| self.questions_answered >= target)
    }

    #[must_use]
    pub fn unused_remaining(&self) -> usize {
        self.queue.iter().filter(|q| !q.used).count()
    }

    /// Milliseconds since the session started.
    #[must_use]
    pub const fn elapsed_ms(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.start_ms)
    }
}
