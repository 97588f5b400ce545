//! Persisted player data: cumulative profile, history, inventory, power-ups.
//!
//! The session core reads the profile only to gate modes and the difficulty
//! ceiling at start, and writes it only at finalisation.
use std::collections::{BTreeMap, BTreeSet, VecDeque};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::constants::{COINS_WIN_BONUS, HISTORY_CAPACITY};
use crate::modes::QuizMode;
use crate::question::DifficultyTier;
use crate::session::SessionSummary;

pub const ACH_FIRST_WIN: &str = "first_win";
pub const ACH_PERFECT_RUN: &str = "perfect_run";
pub const ACH_COMBO_TEN: &str = "combo_10";
pub const ACH_BATTLE_VICTOR: &str = "battle_victor";
pub const ACH_BOSS_SLAYER: &str = "boss_slayer";
pub const ACH_DAILY_WEEK: &str = "daily_week";

const PERFECT_RUN_MIN_QUESTIONS: u32 = 5;
const COMBO_ACHIEVEMENT: u32 = 10;
const DAILY_WEEK: u32 = 7;
const SURVIVAL_UNLOCK_WINS: u32 = 3;

/// Modes available to a fresh profile.
const STARTER_MODES: [QuizMode; 3] = [QuizMode::Classic, QuizMode::Lightning, QuizMode::AiBattle];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SubjectStats {
    pub played: u32,
    pub won: u32,
    pub answered: u32,
    pub correct: u32,
    pub best_score: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerProfile {
    pub total_score: u64,
    pub total_points: u64,
    pub coins: u32,
    pub sessions_played: u32,
    pub sessions_won: u32,
    pub win_streak: u32,
    pub best_win_streak: u32,
    pub daily_streak: u32,
    /// Highest tier reached in a won session.
    pub highest_difficulty: DifficultyTier,
    pub achievements: BTreeSet<String>,
    pub unlocked_modes: BTreeSet<QuizMode>,
    pub subject_stats: BTreeMap<String, SubjectStats>,
}

impl Default for PlayerProfile {
    fn default() -> Self {
        Self {
            total_score: 0,
            total_points: 0,
            coins: 0,
            sessions_played: 0,
            sessions_won: 0,
            win_streak: 0,
            best_win_streak: 0,
            daily_streak: 0,
            highest_difficulty: DifficultyTier::Easy,
            achievements: BTreeSet::new(),
            unlocked_modes: STARTER_MODES.into_iter().collect(),
            subject_stats: BTreeMap::new(),
        }
    }
}

/// What a finished session earned.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UnlockReport {
    pub coins_earned: u32,
    pub new_achievements: Vec<String>,
    pub new_modes: Vec<QuizMode>,
}

impl UnlockReport {
    pub fn merge(&mut self, other: Self) {
        self.coins_earned += other.coins_earned;
        self.new_achievements.extend(other.new_achievements);
        self.new_modes.extend(other.new_modes);
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.coins_earned == 0 && self.new_achievements.is_empty() && self.new_modes.is_empty()
    }
}

impl PlayerProfile {
    #[must_use]
    pub fn is_mode_unlocked(&self, mode: QuizMode) -> bool {
        self.unlocked_modes.contains(&mode)
    }

    /// Ceiling offered at session start. Insane opens once Hard has been reached in a win.
    #[must_use]
    pub fn difficulty_ceiling(&self) -> DifficultyTier {
        if self.highest_difficulty >= DifficultyTier::Hard {
            DifficultyTier::Insane
        } else {
            DifficultyTier::Hard
        }
    }

    pub fn apply_session(&mut self, summary: &SessionSummary) -> UnlockReport {
        let mut report = UnlockReport {
            coins_earned: summary.final_score + if summary.won { COINS_WIN_BONUS } else { 0 },
            ..UnlockReport::default()
        };
        self.coins = self.coins.saturating_add(report.coins_earned);
        self.total_score += u64::from(summary.final_score);
        self.total_points += u64::from(summary.points);
        self.sessions_played += 1;

        let stats = self.subject_stats.entry(summary.subject.clone()).or_default();
        stats.played += 1;
        stats.answered += summary.questions_answered;
        stats.correct += summary.correct_answers;
        stats.best_score = stats.best_score.max(summary.final_score);

        if summary.won {
            stats.won += 1;
            self.sessions_won += 1;
            self.win_streak += 1;
            self.best_win_streak = self.best_win_streak.max(self.win_streak);
            self.highest_difficulty = self.highest_difficulty.max(summary.max_difficulty_reached);
            self.award(&mut report, ACH_FIRST_WIN);
        } else {
            self.win_streak = 0;
        }

        if summary.is_perfect() && summary.questions_answered >= PERFECT_RUN_MIN_QUESTIONS {
            self.award(&mut report, ACH_PERFECT_RUN);
        }
        if summary.max_combo >= COMBO_ACHIEVEMENT {
            self.award(&mut report, ACH_COMBO_TEN);
        }
        if summary.battle_won() == Some(true) {
            self.award(&mut report, ACH_BATTLE_VICTOR);
            if summary.mode == QuizMode::BossRush {
                self.award(&mut report, ACH_BOSS_SLAYER);
            }
        }

        if self.sessions_won >= SURVIVAL_UNLOCK_WINS {
            self.unlock(&mut report, QuizMode::Survival);
        }
        if self.highest_difficulty >= DifficultyTier::Hard {
            self.unlock(&mut report, QuizMode::SuddenDeath);
        }
        if self.achievements.contains(ACH_BATTLE_VICTOR) {
            self.unlock(&mut report, QuizMode::BossRush);
        }
        report
    }

    pub fn record_daily_streak(&mut self, streak: u32) -> UnlockReport {
        let mut report = UnlockReport::default();
        self.daily_streak = streak;
        if streak >= DAILY_WEEK {
            self.award(&mut report, ACH_DAILY_WEEK);
        }
        report
    }

    fn award(&mut self, report: &mut UnlockReport, achievement: &str) {
        if self.achievements.insert(achievement.to_string()) {
            report.new_achievements.push(achievement.to_string());
        }
    }

    fn unlock(&mut self, report: &mut UnlockReport, mode: QuizMode) {
        if self.unlocked_modes.insert(mode) {
            report.new_modes.push(mode);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub played_on: NaiveDate,
    pub mode: QuizMode,
    pub subject: String,
    pub won: bool,
    pub score: u32,
    pub questions_answered: u32,
    pub correct_answers: u32,
    pub duration_seconds: u64,
}

/// Most recent results, oldest first, capped at [`HISTORY_CAPACITY`].
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuizHistory {
    entries: VecDeque<HistoryEntry>,
}

impl QuizHistory {
    pub fn push(&mut self, played_on: NaiveDate, summary: &SessionSummary) {
        self.entries.push_back(HistoryEntry {
            played_on,
            mode: summary.mode,
            subject: summary.subject.clone(),
            won: summary.won,
            score: summary.final_score,
            questions_answered: summary.questions_answered,
            correct_answers: summary.correct_answers,
            duration_seconds: summary.duration_seconds,
        });
        while self.entries.len() > HISTORY_CAPACITY {
            self.entries.pop_front();
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    #[must_use]
    pub fn latest(&self) -> Option<&HistoryEntry> {
        self.entries.back()
    }
}

/// Owned and equipped cosmetics. Opaque to the quiz core.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Inventory {
    pub owned: BTreeSet<String>,
    /// Slot name to item id.
    pub equipped: BTreeMap<String, String>,
}

impl Inventory {
    /// Equip an owned item. Returns `false` if the item is not owned.
    pub fn equip(&mut self, slot: &str, item: &str) -> bool {
        if !self.owned.contains(item) {
            return false;
        }
        self.equipped.insert(slot.to_string(), item.to_string());
        true
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PowerUps {
    counts: BTreeMap<String, u32>,
}

impl PowerUps {
    #[must_use]
    pub fn count(&self, id: &str) -> u32 {
        self.counts.get(id).copied().unwrap_or(0)
    }

    pub fn grant(&mut self, id: &str, amount: u32) {
        let slot = self.counts.entry(id.to_string()).or_default();
        *slot = slot.saturating_add(amount);
    }

    /// Spend one. Returns `false` when none are left.
    pub fn consume(&mut self, id: &str) -> bool {
        match self.counts.get_mut(id) {
            Some(count) if *count > 0 => {
                *count -= 1;
                true
            }
            _ => false,
        }
    }
}
