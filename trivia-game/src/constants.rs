//! Centralized balance and tuning constants for the quiz engine.
//!
//! Values that designers are expected to tweak per deployment live in
//! `QuizConfig`; the numbers here define the fixed scoring math.

// Log keys -----------------------------------------------------------------
pub(crate) const LOG_SESSION_START: &str = "log.session.start";
pub(crate) const LOG_SESSION_VICTORY: &str = "log.session.victory";
pub(crate) const LOG_SESSION_DEFEAT: &str = "log.session.defeat";
pub(crate) const LOG_POOL_EXHAUSTED: &str = "log.session.pool-exhausted";
pub(crate) const LOG_TIME_EXPIRED: &str = "log.session.time-expired";
pub(crate) const LOG_CURVEBALL_INJECTED: &str = "log.curveball.injected";
pub(crate) const LOG_DIFFICULTY_UP: &str = "log.difficulty.up";
pub(crate) const LOG_COMBO_BONUS: &str = "log.combo.bonus";
pub(crate) const LOG_OPPONENT_DOWN: &str = "log.opponent.down";
pub(crate) const LOG_BAD_ANSWER_KEY: &str = "log.data.bad-answer-key";

// Subjects -----------------------------------------------------------------
pub const SUBJECT_ALL: &str = "all";
pub const SUBJECT_CUSTOM: &str = "custom";
pub const SUBJECT_TRIVIA: &str = "trivia";

// Question shape -----------------------------------------------------------
pub const OPTION_COUNT: usize = 4;

// Scoring ------------------------------------------------------------------
pub(crate) const BASE_POINTS: u32 = 1;
pub(crate) const CURVEBALL_POINTS: u32 = 3;
pub(crate) const BASE_LIFE_LOSS: i32 = 1;
pub(crate) const CURVEBALL_LIFE_LOSS: i32 = 3;
pub(crate) const DIFFICULTY_STEP_EVERY: u32 = 3;
pub(crate) const COMBO_BONUS_EVERY: u32 = 5;

/// Multiplier thresholds, highest first: (minimum streak, multiplier).
pub(crate) const MULTIPLIER_THRESHOLDS: [(u32, u32); 4] = [(50, 10), (20, 5), (10, 3), (5, 2)];

// Curveballs ---------------------------------------------------------------
pub(crate) const CURVEBALL_EVERY: u32 = 5;
pub(crate) const CURVEBALL_MIN_SCORE: u32 = 3;

// Session shape ------------------------------------------------------------
pub(crate) const DEFAULT_LIVES: i32 = 3;
pub(crate) const UNBOUNDED_QUEUE_LEN: usize = 200;
pub(crate) const LIGHTNING_DURATION_MS: u64 = 60_000;
pub(crate) const SUDDEN_DEATH_TARGET: u32 = 20;
pub(crate) const SUDDEN_DEATH_MULTIPLIER: u32 = 10;
pub(crate) const BOSS_STAGE_QUESTIONS: u32 = 3;

// Persistence --------------------------------------------------------------
pub const HISTORY_CAPACITY: usize = 50;
pub(crate) const COINS_WIN_BONUS: u32 = 5;
