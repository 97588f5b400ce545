//! Daily challenges: one deterministic quiz per calendar date.
use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::constants::SUBJECT_ALL;
use crate::modes::{QuizMode, SessionConfig};
use crate::pool::QuestionPool;

const DAILY_MIN_TARGET: u32 = 5;
const DAILY_TARGET_SPREAD: u64 = 6;

fn fnv1a64(bytes: &[u8]) -> u64 {
    const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const FNV_PRIME: u64 = 0x0100_0000_01b3;
    let mut hash = FNV_OFFSET;
    for b in bytes {
        hash = (hash ^ u64::from(*b)).wrapping_mul(FNV_PRIME);
    }
    hash
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyChallenge {
    pub date: NaiveDate,
    pub seed: u64,
    pub subject: String,
    pub questions: u32,
}

impl DailyChallenge {
    /// Derive the challenge for `date`. Everyone gets the same one on the same day.
    #[must_use]
    pub fn for_date(date: NaiveDate, pool: &QuestionPool) -> Self {
        let key = format!("TRIVIA-DAILY-{}", date.format("%Y-%m-%d"));
        let seed = fnv1a64(key.as_bytes());
        let subjects = pool.subjects();
        let subject = if subjects.is_empty() {
            SUBJECT_ALL.to_string()
        } else {
            let idx = usize::try_from(seed % subjects.len() as u64).unwrap_or(0);
            subjects[idx].to_string()
        };
        let spread = u32::try_from((seed >> 16) % DAILY_TARGET_SPREAD).unwrap_or(0);
        Self {
            date,
            seed,
            subject,
            questions: DAILY_MIN_TARGET + spread,
        }
    }

    #[must_use]
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig::new(QuizMode::Classic, self.subject.clone()).with_target(self.questions)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyEntry {
    pub score: u32,
    pub won: bool,
}

/// Completion map keyed by `YYYY-MM-DD`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DailyLog {
    completions: BTreeMap<NaiveDate, DailyEntry>,
}

impl DailyLog {
    /// Record a result, keeping the best score if the day was already played.
    pub fn record(&mut self, date: NaiveDate, score: u32, won: bool) {
        self.completions
            .entry(date)
            .and_modify(|entry| {
                entry.score = entry.score.max(score);
                entry.won |= won;
            })
            .or_insert(DailyEntry { score, won });
    }

    #[must_use]
    pub fn is_completed(&self, date: NaiveDate) -> bool {
        self.completions.contains_key(&date)
    }

    #[must_use]
    pub fn entry(&self, date: NaiveDate) -> Option<DailyEntry> {
        self.completions.get(&date).copied()
    }

    /// Consecutive completed days ending at `date`, inclusive.
    #[must_use]
    pub fn streak_ending(&self, date: NaiveDate) -> u32 {
        let mut streak = 0;
        let mut day = Some(date);
        while let Some(current) = day.filter(|d| self.is_completed(*d)) {
            streak += 1;
            day = current.pred_opt();
        }
        streak
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.completions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.completions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn challenge_is_stable_per_date() {
        let pool = QuestionPool::load_from_static();
        let a = DailyChallenge::for_date(date(2026, 5, 1), &pool);
        let b = DailyChallenge::for_date(date(2026, 5, 1), &pool);
        assert_eq!(a, b);
        assert!(pool.subjects().contains(&a.subject.as_str()));
        assert!((5..=10).contains(&a.questions));

        let seeds: std::collections::HashSet<u64> = (1..=10)
            .map(|d| DailyChallenge::for_date(date(2026, 5, d), &pool).seed)
            .collect();
        assert_eq!(seeds.len(), 10);
    }

    #[test]
    fn empty_pool_falls_back_to_all_subjects() {
        let challenge = DailyChallenge::for_date(date(2026, 1, 1), &QuestionPool::empty());
        assert_eq!(challenge.subject, SUBJECT_ALL);
        let cfg = challenge.session_config();
        assert_eq!(cfg.mode, QuizMode::Classic);
        assert_eq!(cfg.questions_target, Some(challenge.questions));
    }

    #[test]
    fn streak_counts_back_until_a_gap() {
        let mut log = DailyLog::default();
        for d in [1, 2, 3, 5, 6] {
            log.record(date(2026, 2, d), 4, true);
        }
        assert_eq!(log.streak_ending(date(2026, 2, 6)), 2);
        assert_eq!(log.streak_ending(date(2026, 2, 3)), 3);
        assert_eq!(log.streak_ending(date(2026, 2, 4)), 0);
    }

    #[test]
    fn replays_keep_best_score() {
        let mut log = DailyLog::default();
        let day = date(2026, 2, 1);
        log.record(day, 7, false);
        log.record(day, 3, true);
        assert_eq!(log.entry(day), Some(DailyEntry { score: 7, won: true }));
        let json = serde_json::to_string(&log).unwrap();
        assert!(json.contains("\"2026-02-01\""));
    }
}
