//! Trivia Game Engine
//!
//! Platform-agnostic core for a single-player trivia quiz: question pools,
//! selection, scoring, lives and difficulty progression, scripted AI opponent
//! battles, special modes, and profile persistence. No UI or platform code.

pub mod boss;
pub mod config;
pub mod constants;
pub mod daily;
pub mod evaluator;
pub mod modes;
pub mod opponent;
pub mod pool;
pub mod profile;
pub mod question;
pub mod rng;
pub mod scheduler;
pub mod selector;
pub mod session;
pub mod state;
pub mod storage;

use std::convert::Infallible;
use std::sync::Arc;

use chrono::NaiveDate;
use thiserror::Error;

// Re-export commonly used types
pub use boss::{BossRush, BossRushProgress, BossStage};
pub use config::{ConfigError, QuizConfig};
pub use daily::{DailyChallenge, DailyEntry, DailyLog};
pub use evaluator::{AnswerOutcome, Termination, VictoryReason};
pub use modes::{ModePolicy, QuizMode, SessionConfig, SessionParams};
pub use opponent::{
    BattleOutcome, BattleRule, OpponentProfile, OpponentRoster, OpponentState, TickOutcome,
    TieBreak,
};
pub use pool::{
    Category, CategoryNameError, CategoryOrigin, CurveballSourcePolicy, ImportRecord,
    ImportReport, QuestionPool,
};
pub use profile::{HistoryEntry, Inventory, PlayerProfile, PowerUps, QuizHistory, UnlockReport};
pub use question::{CorrectAnswers, DifficultyTier, DrawnQuestion, Question, QuestionTags};
pub use rng::RngBundle;
pub use scheduler::{ScheduledTask, TaskKind};
pub use session::{
    BattleReport, QuizSession, SessionError, SessionEvent, SessionPhase, SessionSummary,
    TimerOutcome,
};
pub use state::SessionState;
pub use storage::{FinalizeReport, KeyValueStore, MemoryStore, ProfileGateway, StorageError};

/// Trait for abstracting data loading operations
/// Platform-specific implementations should provide this
pub trait DataLoader {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Load the builtin question categories
    ///
    /// # Errors
    ///
    /// Returns an error if the question data cannot be loaded.
    fn load_question_pool(&self) -> Result<QuestionPool, Self::Error>;

    /// Load the opponent roster
    ///
    /// # Errors
    ///
    /// Returns an error if the opponent data cannot be loaded.
    fn load_opponents(&self) -> Result<OpponentRoster, Self::Error>;

    /// Load tuning configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be loaded or parsed.
    fn load_config(&self) -> Result<QuizConfig, Self::Error>;
}

/// Loader backed by the assets compiled into the crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticDataLoader;

impl DataLoader for StaticDataLoader {
    type Error = Infallible;

    fn load_question_pool(&self) -> Result<QuestionPool, Self::Error> {
        Ok(QuestionPool::load_from_static())
    }

    fn load_opponents(&self) -> Result<OpponentRoster, Self::Error> {
        Ok(OpponentRoster::load_from_static())
    }

    fn load_config(&self) -> Result<QuizConfig, Self::Error> {
        Ok(QuizConfig::load_from_static())
    }
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("failed to load game data: {0}")]
    Load(#[source] Box<dyn std::error::Error + Send + Sync>),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error("cannot import questions: {0}")]
    Import(#[from] CategoryNameError),
}

/// Main engine: builds sessions against stored player data
pub struct QuizEngine<L, S>
where
    L: DataLoader,
    S: KeyValueStore,
{
    data_loader: L,
    gateway: ProfileGateway<S>,
}

impl<L, S> QuizEngine<L, S>
where
    L: DataLoader,
    S: KeyValueStore,
{
    /// Create a new engine with the provided data loader and storage
    pub const fn new(data_loader: L, store: S) -> Self {
        Self {
            data_loader,
            gateway: ProfileGateway::new(store),
        }
    }

    pub const fn gateway(&self) -> &ProfileGateway<S> {
        &self.gateway
    }

    fn load<T>(result: Result<T, L::Error>) -> Result<T, EngineError> {
        result.map_err(|err| EngineError::Load(Box::new(err)))
    }

    /// Start a session for `request`, gated by the stored profile.
    ///
    /// The profile decides whether the mode is unlocked and caps the
    /// requested difficulty ceiling.
    ///
    /// # Errors
    ///
    /// Returns an error if the mode is locked, data cannot be loaded, stored
    /// data is unreadable, or the session rejects the request.
    pub fn create_session(
        &self,
        seed: u64,
        request: &SessionConfig,
        now_ms: u64,
    ) -> Result<QuizSession, EngineError> {
        let profile = self.gateway.load_profile()?;
        if !profile.is_mode_unlocked(request.mode) {
            return Err(SessionError::ModeLocked(request.mode).into());
        }

        let mut pool = Self::load(self.data_loader.load_question_pool())?;
        pool.restore_custom(self.gateway.load_custom_categories()?);
        let roster = Self::load(self.data_loader.load_opponents())?;
        let config = Self::load(self.data_loader.load_config())?;

        let allowed = profile.difficulty_ceiling();
        let mut request = request.clone();
        request.difficulty_ceiling = Some(
            request
                .difficulty_ceiling
                .map_or(allowed, |asked| asked.min(allowed)),
        );

        let mut session = QuizSession::new(Arc::new(pool), Arc::new(roster), config, seed);
        session.start(&request, now_ms)?;
        Ok(session)
    }

    /// Today's daily challenge, and whether it has already been played.
    ///
    /// # Errors
    ///
    /// Returns an error if the question data or the daily log cannot be loaded.
    pub fn daily_challenge(&self, today: NaiveDate) -> Result<(DailyChallenge, bool), EngineError> {
        let pool = Self::load(self.data_loader.load_question_pool())?;
        let done = self.gateway.load_daily()?.is_completed(today);
        Ok((DailyChallenge::for_date(today, &pool), done))
    }

    /// Validate and store imported questions under a custom category.
    ///
    /// # Errors
    ///
    /// Returns an error if the category name clashes with a builtin or
    /// reserved subject, data cannot be loaded, or the stored categories
    /// cannot be read or written.
    pub fn import_questions(
        &self,
        category: &str,
        records: Vec<ImportRecord>,
    ) -> Result<ImportReport, EngineError> {
        let mut pool = Self::load(self.data_loader.load_question_pool())?;
        pool.restore_custom(self.gateway.load_custom_categories()?);
        let report = pool.import_records(category, records)?;
        if report.accepted > 0 {
            self.gateway.save_custom_categories(&pool.custom_categories())?;
        }
        Ok(report)
    }

    /// Spend a stored power-up in `session` and write the new count back.
    /// Returns how many of `id` are left.
    ///
    /// # Errors
    ///
    /// Returns an error if the session refuses the power-up or the stored
    /// counts cannot be read or written.
    pub fn use_powerup(&self, session: &mut QuizSession, id: &str) -> Result<u32, EngineError> {
        let mut powerups = self.gateway.load_powerups()?;
        let remaining = session.use_powerup(&mut powerups, id)?;
        self.gateway.save_powerups(&powerups)?;
        Ok(remaining)
    }

    /// Equip an owned cosmetic. Returns `false`, writing nothing, when the
    /// item is not owned.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored inventory cannot be read or written.
    pub fn equip(&self, slot: &str, item: &str) -> Result<bool, EngineError> {
        let mut inventory = self.gateway.load_inventory()?;
        if !inventory.equip(slot, item) {
            return Ok(false);
        }
        self.gateway.save_inventory(&inventory)?;
        Ok(true)
    }

    /// Persist a finished session. Call once per summary.
    ///
    /// # Errors
    ///
    /// Returns an error if stored data is unreadable or a write fails.
    pub fn finalize(
        &self,
        summary: &SessionSummary,
        today: NaiveDate,
        daily: bool,
    ) -> Result<FinalizeReport, EngineError> {
        Ok(self.gateway.finalize_session(summary, today, daily)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Copy, Default)]
    struct FixtureLoader;

    impl DataLoader for FixtureLoader {
        type Error = Infallible;

        fn load_question_pool(&self) -> Result<QuestionPool, Self::Error> {
            let questions = (0..6)
                .map(|i| {
                    Question::new(
                        format!("fixture {i}"),
                        ["a", "b", "c", "d"].map(String::from),
                        CorrectAnswers::single(2),
                        DifficultyTier::Easy,
                    )
                })
                .collect();
            Ok(QuestionPool::from_categories(vec![Category {
                name: "math".to_string(),
                origin: CategoryOrigin::Builtin,
                questions,
            }]))
        }

        fn load_opponents(&self) -> Result<OpponentRoster, Self::Error> {
            Ok(OpponentRoster::load_from_static())
        }

        fn load_config(&self) -> Result<QuizConfig, Self::Error> {
            Ok(QuizConfig::default())
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 6, 1).unwrap()
    }

    #[test]
    fn locked_modes_are_refused() {
        let engine = QuizEngine::new(FixtureLoader, MemoryStore::new());
        let err = engine
            .create_session(1, &SessionConfig::new(QuizMode::Survival, "math"), 0)
            .err()
            .unwrap();
        assert!(matches!(
            err,
            EngineError::Session(SessionError::ModeLocked(QuizMode::Survival))
        ));
    }

    #[test]
    fn profile_caps_difficulty_ceiling() {
        let engine = QuizEngine::new(FixtureLoader, MemoryStore::new());
        let request =
            SessionConfig::new(QuizMode::Classic, "math").with_ceiling(DifficultyTier::Insane);
        let session = engine.create_session(1, &request, 0).unwrap();
        assert_eq!(session.state().difficulty_ceiling, DifficultyTier::Hard);
    }

    #[test]
    fn engine_runs_and_finalizes_a_session() {
        let engine = QuizEngine::new(FixtureLoader, MemoryStore::new());
        let request = SessionConfig::new(QuizMode::Classic, "math").with_target(3);
        let mut session = engine.create_session(42, &request, 0).unwrap();
        let mut now = 0;
        while !session.is_finished() {
            now += 1_500;
            session.answer(2, now).unwrap();
        }
        let summary = session.summary().cloned().unwrap();
        assert!(summary.won);
        assert_eq!(summary.final_score, 3);

        let report = engine.finalize(&summary, today(), false).unwrap();
        assert!(report.unlocks.new_achievements.contains(&"first_win".to_string()));
        let profile = engine.gateway().load_profile().unwrap();
        assert_eq!(profile.sessions_won, 1);
    }

    #[test]
    fn imported_questions_become_playable() {
        let engine = QuizEngine::new(FixtureLoader, MemoryStore::new());
        let records = vec![
            ImportRecord {
                question: "2 + 2?".to_string(),
                answers: ["3", "4", "5", "6"].map(String::from).to_vec(),
                correct_index: 1,
                difficulty: 1,
            },
            ImportRecord {
                question: "bad".to_string(),
                answers: vec!["only one".to_string()],
                correct_index: 0,
                difficulty: 1,
            },
        ];
        let report = engine.import_questions("mine", records).unwrap();
        assert_eq!((report.accepted, report.dropped), (1, 1));

        let request =
            SessionConfig::new(QuizMode::Classic, constants::SUBJECT_CUSTOM).with_target(1);
        let session = engine.create_session(5, &request, 0).unwrap();
        assert_eq!(session.current_question().unwrap().question.text, "2 + 2?");
    }

    #[test]
    fn imports_cannot_shadow_builtin_subjects() {
        let engine = QuizEngine::new(FixtureLoader, MemoryStore::new());
        let record = ImportRecord {
            question: "Sneaky?".to_string(),
            answers: ["a", "b", "c", "d"].map(String::from).to_vec(),
            correct_index: 0,
            difficulty: 3,
        };
        let err = engine
            .import_questions("math", vec![record.clone()])
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::Import(CategoryNameError::Builtin(ref name)) if name == "math"
        ));
        let err = engine.import_questions("all", vec![record]).unwrap_err();
        assert!(matches!(err, EngineError::Import(CategoryNameError::Reserved(_))));
        assert!(engine.gateway().load_custom_categories().unwrap().is_empty());
    }
}
