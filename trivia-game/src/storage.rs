//! Key-value persistence: one JSON document per key.
use std::cell::RefCell;
use std::collections::HashMap;
use std::convert::Infallible;
use std::rc::Rc;

use chrono::NaiveDate;
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::daily::DailyLog;
use crate::pool::Category;
use crate::profile::{Inventory, PlayerProfile, PowerUps, QuizHistory, UnlockReport};
use crate::session::SessionSummary;

pub const KEY_PROFILE: &str = "trivia.profile";
pub const KEY_INVENTORY: &str = "trivia.inventory";
pub const KEY_CUSTOM_CATEGORIES: &str = "trivia.custom_categories";
pub const KEY_HISTORY: &str = "trivia.history";
pub const KEY_POWERUPS: &str = "trivia.powerups";
pub const KEY_DAILY: &str = "trivia.daily";

/// Platform storage backend. Browser local storage, a directory of files, or memory.
pub trait KeyValueStore {
    type Error: std::error::Error + Send + Sync + 'static;

    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, Self::Error>;

    /// # Errors
    ///
    /// Returns an error if the backend cannot be written.
    fn set(&self, key: &str, value: &str) -> Result<(), Self::Error>;

    /// # Errors
    ///
    /// Returns an error if the backend cannot be written.
    fn remove(&self, key: &str) -> Result<(), Self::Error>;
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage backend failed: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
    #[error("malformed JSON under '{key}'")]
    Json {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// In-memory store. Clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Rc<RefCell<HashMap<String, String>>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    type Error = Infallible;

    fn get(&self, key: &str) -> Result<Option<String>, Self::Error> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), Self::Error> {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), Self::Error> {
        self.entries.borrow_mut().remove(key);
        Ok(())
    }
}

/// What finalising a session wrote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinalizeReport {
    pub unlocks: UnlockReport,
    pub history_len: usize,
    /// Daily streak after recording, when the session was a daily challenge.
    pub daily_streak: Option<u32>,
}

/// Typed access to the persisted player data.
#[derive(Debug, Clone)]
pub struct ProfileGateway<S> {
    store: S,
}

impl<S: KeyValueStore> ProfileGateway<S> {
    pub const fn new(store: S) -> Self {
        Self { store }
    }

    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Read and decode `key`, falling back to the type's default when absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails or the stored JSON does not decode.
    pub fn load<T>(&self, key: &str) -> Result<T, StorageError>
    where
        T: DeserializeOwned + Default,
    {
        let raw = self
            .store
            .get(key)
            .map_err(|err| StorageError::Backend(Box::new(err)))?;
        match raw {
            Some(json) => serde_json::from_str(&json).map_err(|source| StorageError::Json {
                key: key.to_string(),
                source,
            }),
            None => Ok(T::default()),
        }
    }

    /// # Errors
    ///
    /// Returns an error if the value cannot be encoded or the backend fails.
    pub fn save<T: Serialize>(&self, key: &str, value: &T) -> Result<(), StorageError> {
        let json = serde_json::to_string(value).map_err(|source| StorageError::Json {
            key: key.to_string(),
            source,
        })?;
        self.store
            .set(key, &json)
            .map_err(|err| StorageError::Backend(Box::new(err)))
    }

    /// # Errors
    ///
    /// Returns an error if the backend fails or the stored JSON does not decode.
    pub fn load_profile(&self) -> Result<PlayerProfile, StorageError> {
        self.load(KEY_PROFILE)
    }

    /// # Errors
    ///
    /// Returns an error if the profile cannot be written.
    pub fn save_profile(&self, profile: &PlayerProfile) -> Result<(), StorageError> {
        self.save(KEY_PROFILE, profile)
    }

    /// # Errors
    ///
    /// Returns an error if the backend fails or the stored JSON does not decode.
    pub fn load_inventory(&self) -> Result<Inventory, StorageError> {
        self.load(KEY_INVENTORY)
    }

    /// # Errors
    ///
    /// Returns an error if the inventory cannot be written.
    pub fn save_inventory(&self, inventory: &Inventory) -> Result<(), StorageError> {
        self.save(KEY_INVENTORY, inventory)
    }

    /// # Errors
    ///
    /// Returns an error if the backend fails or the stored JSON does not decode.
    pub fn load_custom_categories(&self) -> Result<Vec<Category>, StorageError> {
        self.load(KEY_CUSTOM_CATEGORIES)
    }

    /// # Errors
    ///
    /// Returns an error if the categories cannot be written.
    pub fn save_custom_categories(&self, categories: &[Category]) -> Result<(), StorageError> {
        self.save(KEY_CUSTOM_CATEGORIES, &categories)
    }

    /// # Errors
    ///
    /// Returns an error if the backend fails or the stored JSON does not decode.
    pub fn load_history(&self) -> Result<QuizHistory, StorageError> {
        self.load(KEY_HISTORY)
    }

    /// # Errors
    ///
    /// Returns an error if the backend fails or the stored JSON does not decode.
    pub fn load_powerups(&self) -> Result<PowerUps, StorageError> {
        self.load(KEY_POWERUPS)
    }

    /// # Errors
    ///
    /// Returns an error if the power-up counts cannot be written.
    pub fn save_powerups(&self, powerups: &PowerUps) -> Result<(), StorageError> {
        self.save(KEY_POWERUPS, powerups)
    }

    /// # Errors
    ///
    /// Returns an error if the backend fails or the stored JSON does not decode.
    pub fn load_daily(&self) -> Result<DailyLog, StorageError> {
        self.load(KEY_DAILY)
    }

    /// Fold a finished session into the profile, history, and (for daily
    /// challenges) the daily log. Each key is written once.
    ///
    /// # Errors
    ///
    /// Returns an error if any stored document is unreadable or a write fails.
    pub fn finalize_session(
        &self,
        summary: &SessionSummary,
        today: NaiveDate,
        daily: bool,
    ) -> Result<FinalizeReport, StorageError> {
        let mut profile = self.load_profile()?;
        let mut history = self.load_history()?;

        let daily_streak = if daily {
            let mut log = self.load_daily()?;
            log.record(today, summary.final_score, summary.won);
            let streak = log.streak_ending(today);
            self.save(KEY_DAILY, &log)?;
            Some(streak)
        } else {
            None
        };

        let mut unlocks = profile.apply_session(summary);
        if let Some(streak) = daily_streak {
            unlocks.merge(profile.record_daily_streak(streak));
        }
        history.push(today, summary);

        self.save(KEY_HISTORY, &history)?;
        self.save_profile(&profile)?;
        log::debug!(
            "finalized session: coins +{} achievements {:?} unlocked {:?}",
            unlocks.coins_earned,
            unlocks.new_achievements,
            unlocks.new_modes
        );
        Ok(FinalizeReport {
            unlocks,
            history_len: history.len(),
            daily_streak,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modes::QuizMode;
    use crate::session::sample_summary;
    use std::cell::Cell;

    /// Counts writes so tests can assert finalisation touches each key once.
    #[derive(Default)]
    struct CountingStore {
        inner: MemoryStore,
        writes: Cell<usize>,
    }

    impl KeyValueStore for CountingStore {
        type Error = Infallible;

        fn get(&self, key: &str) -> Result<Option<String>, Self::Error> {
            self.inner.get(key)
        }

        fn set(&self, key: &str, value: &str) -> Result<(), Self::Error> {
            self.writes.set(self.writes.get() + 1);
            self.inner.set(key, value)
        }

        fn remove(&self, key: &str) -> Result<(), Self::Error> {
            self.inner.remove(key)
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 14).unwrap()
    }

    #[test]
    fn missing_keys_load_defaults() {
        let gateway = ProfileGateway::new(MemoryStore::new());
        assert_eq!(gateway.load_profile().unwrap(), PlayerProfile::default());
        assert!(gateway.load_custom_categories().unwrap().is_empty());
        assert!(gateway.load_history().unwrap().is_empty());
    }

    #[test]
    fn malformed_json_is_reported_with_key() {
        let store = MemoryStore::new();
        store.set(KEY_PROFILE, "{not json").unwrap();
        let gateway = ProfileGateway::new(store);
        let err = gateway.load_profile().unwrap_err();
        assert!(matches!(err, StorageError::Json { ref key, .. } if key == KEY_PROFILE));
    }

    #[test]
    fn finalize_writes_profile_and_history_once() {
        let gateway = ProfileGateway::new(CountingStore::default());
        let summary = sample_summary(QuizMode::Classic, true);
        let report = gateway.finalize_session(&summary, today(), false).unwrap();
        assert_eq!(gateway.store().writes.get(), 2);
        assert_eq!(report.history_len, 1);
        assert_eq!(report.daily_streak, None);
        assert!(report.unlocks.coins_earned > 0);

        let profile = gateway.load_profile().unwrap();
        assert_eq!(profile.sessions_played, 1);
        assert_eq!(profile.total_score, u64::from(summary.final_score));
    }

    #[test]
    fn daily_finalize_also_writes_daily_log() {
        let gateway = ProfileGateway::new(CountingStore::default());
        let summary = sample_summary(QuizMode::Classic, true);
        let report = gateway.finalize_session(&summary, today(), true).unwrap();
        assert_eq!(gateway.store().writes.get(), 3);
        assert_eq!(report.daily_streak, Some(1));
        assert!(gateway.load_daily().unwrap().is_completed(today()));
    }

    #[test]
    fn custom_categories_round_trip() {
        use crate::pool::{CategoryOrigin, ImportRecord, QuestionPool};
        let mut pool = QuestionPool::empty();
        let report = pool
            .import_records(
                "Capitals",
                vec![ImportRecord {
                    question: "Capital of Peru?".to_string(),
                    answers: ["Lima", "Quito", "Bogota", "Santiago"].map(String::from).to_vec(),
                    correct_index: 0,
                    difficulty: 2,
                }],
            )
            .unwrap();
        assert_eq!(report.accepted, 1);
        let gateway = ProfileGateway::new(MemoryStore::new());
        gateway
            .save_custom_categories(&pool.custom_categories())
            .unwrap();
        let restored = gateway.load_custom_categories().unwrap();
        assert_eq!(restored.len(), 1);
        assert_eq!(restored[0].origin, CategoryOrigin::Custom);
        assert_eq!(restored[0].questions.len(), 1);
    }
}
