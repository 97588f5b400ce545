//! Question model shared by the pool, selector, and evaluator.
use serde::{Deserialize, Serialize};
use smallvec::{SmallVec, smallvec};
use std::fmt;
use std::hash::Hasher;
use thiserror::Error;
use twox_hash::XxHash64;

use crate::constants::OPTION_COUNT;

/// Difficulty band of a question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum DifficultyTier {
    Easy = 1,
    Medium = 2,
    Hard = 3,
    Insane = 4,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("difficulty tier must be between 1 and 4 (got {0})")]
pub struct InvalidTier(pub u8);

impl DifficultyTier {
    pub const MAX: Self = Self::Insane;

    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// Clamp an arbitrary level into the valid tier range.
    #[must_use]
    pub const fn saturating_from(level: u8) -> Self {
        match level {
            0 | 1 => Self::Easy,
            2 => Self::Medium,
            3 => Self::Hard,
            _ => Self::Insane,
        }
    }

    /// One step harder, capped at `ceiling`.
    #[must_use]
    pub fn step_up(self, ceiling: Self) -> Self {
        Self::saturating_from(self.as_u8() + 1).min(ceiling)
    }
}

impl TryFrom<u8> for DifficultyTier {
    type Error = InvalidTier;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Easy),
            2 => Ok(Self::Medium),
            3 => Ok(Self::Hard),
            4 => Ok(Self::Insane),
            other => Err(InvalidTier(other)),
        }
    }
}

impl From<DifficultyTier> for u8 {
    fn from(value: DifficultyTier) -> Self {
        value.as_u8()
    }
}

impl fmt::Display for DifficultyTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Easy => "easy",
            Self::Medium => "medium",
            Self::Hard => "hard",
            Self::Insane => "insane",
        };
        f.write_str(label)
    }
}

/// Set of accepted option indices.
///
/// Stored sorted and deduplicated. Serialized data may carry either a bare
/// index or a list of indices for multi-answer questions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "CorrectRepr", into = "CorrectRepr")]
pub struct CorrectAnswers(SmallVec<[usize; 2]>);

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum CorrectRepr {
    One(usize),
    Many(Vec<usize>),
}

impl From<CorrectRepr> for CorrectAnswers {
    fn from(value: CorrectRepr) -> Self {
        match value {
            CorrectRepr::One(idx) => Self::single(idx),
            CorrectRepr::Many(list) => Self::from_iter(list),
        }
    }
}

impl From<CorrectAnswers> for CorrectRepr {
    fn from(value: CorrectAnswers) -> Self {
        match value.0.as_slice() {
            [only] => Self::One(*only),
            many => Self::Many(many.to_vec()),
        }
    }
}

impl FromIterator<usize> for CorrectAnswers {
    fn from_iter<I: IntoIterator<Item = usize>>(iter: I) -> Self {
        let mut indices: SmallVec<[usize; 2]> = iter.into_iter().collect();
        indices.sort_unstable();
        indices.dedup();
        Self(indices)
    }
}

impl CorrectAnswers {
    #[must_use]
    pub fn single(index: usize) -> Self {
        Self(smallvec![index])
    }

    #[must_use]
    pub fn contains(&self, index: usize) -> bool {
        self.0.contains(&index)
    }

    #[must_use]
    pub fn as_slice(&self) -> &[usize] {
        &self.0
    }

    #[must_use]
    pub fn is_multi(&self) -> bool {
        self.0.len() > 1
    }

    /// True when the set is non-empty and every member addresses an option.
    #[must_use]
    pub fn is_valid_for(&self, option_count: usize) -> bool {
        !self.0.is_empty() && self.0.iter().all(|idx| *idx < option_count)
    }
}

/// Optional metadata attached to a question.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct QuestionTags {
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub curveball: bool,
    #[serde(default)]
    pub boss: bool,
}

/// A single multiple-choice question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub text: String,
    pub options: [String; OPTION_COUNT],
    pub correct: CorrectAnswers,
    pub tier: DifficultyTier,
    #[serde(default)]
    pub tags: QuestionTags,
}

impl Question {
    #[must_use]
    pub fn new(
        text: impl Into<String>,
        options: [String; OPTION_COUNT],
        correct: CorrectAnswers,
        tier: DifficultyTier,
    ) -> Self {
        Self {
            text: text.into(),
            options,
            correct,
            tier,
            tags: QuestionTags::default(),
        }
    }

    #[must_use]
    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.tags.subject = Some(subject.into());
        self
    }

    #[must_use]
    pub fn has_valid_answer_key(&self) -> bool {
        self.correct.is_valid_for(self.options.len())
    }

    /// Whether `index` is an accepted answer. A question without a usable
    /// answer key accepts option 0.
    #[must_use]
    pub fn accepts(&self, index: usize) -> bool {
        if self.has_valid_answer_key() {
            self.correct.contains(index)
        } else {
            index == 0
        }
    }

    /// Subject tag, if the question was loaded from a named category.
    #[must_use]
    pub fn subject(&self) -> Option<&str> {
        self.tags.subject.as_deref()
    }

    /// Stable content hash used to detect duplicate imports.
    #[must_use]
    pub fn fingerprint(&self) -> u64 {
        let mut hasher = XxHash64::with_seed(0);
        hasher.write(self.text.trim().to_lowercase().as_bytes());
        hasher.finish()
    }
}

/// Session-local copy of a question drawn from the pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrawnQuestion {
    pub question: Question,
    pub used: bool,
    pub curveball: bool,
}

impl DrawnQuestion {
    #[must_use]
    pub fn fresh(question: Question) -> Self {
        let curveball = question.tags.curveball;
        Self {
            question,
            used: false,
            curveball,
        }
    }

    #[must_use]
    pub fn tier(&self) -> DifficultyTier {
        self.question.tier
    }
}

#[cfg(test)]
pub(crate) fn sample_question(text: &str, correct: usize, tier: DifficultyTier) -> Question {
    Question::new(
        text,
        [
            "A".to_string(),
            "B".to_string(),
            "C".to_string(),
            "D".to_string(),
        ],
        CorrectAnswers::single(correct),
        tier,
    )
}
