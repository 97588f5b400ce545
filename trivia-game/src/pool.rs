//! Categorized question banks and the import path for custom categories.
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{OPTION_COUNT, SUBJECT_ALL, SUBJECT_CUSTOM, SUBJECT_TRIVIA};
use crate::question::{CorrectAnswers, DifficultyTier, Question};

const DEFAULT_QUESTION_DATA: &str = include_str!("../assets/questions.json");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoryOrigin {
    #[default]
    Builtin,
    Custom,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub name: String,
    #[serde(default)]
    pub origin: CategoryOrigin,
    #[serde(default)]
    pub questions: Vec<Question>,
}

/// Raw record accepted by the question importer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportRecord {
    pub question: String,
    pub answers: Vec<String>,
    pub correct_index: i64,
    pub difficulty: i64,
}

impl ImportRecord {
    /// Convert into a question, or `None` when the record is malformed.
    #[must_use]
    pub fn into_question(self) -> Option<Question> {
        if self.question.trim().is_empty() {
            return None;
        }
        let correct = usize::try_from(self.correct_index)
            .ok()
            .filter(|idx| *idx < OPTION_COUNT)?;
        let tier = u8::try_from(self.difficulty)
            .ok()
            .and_then(|level| DifficultyTier::try_from(level).ok())?;
        let options: [String; OPTION_COUNT] = self.answers.try_into().ok()?;
        Some(Question::new(
            self.question,
            options,
            CorrectAnswers::single(correct),
            tier,
        ))
    }
}

/// A custom category name the pool cannot accept.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CategoryNameError {
    #[error("category name is empty")]
    Empty,
    #[error("'{0}' is a reserved subject name")]
    Reserved(String),
    #[error("'{0}' is already a builtin subject")]
    Builtin(String),
}

/// Outcome of an import batch. Invalid records are counted, never surfaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ImportReport {
    pub accepted: usize,
    pub dropped: usize,
    pub duplicates: usize,
}

/// Which categories may donate curveball questions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CurveballSourcePolicy {
    #[serde(default)]
    pub include_custom: bool,
}

/// Read-only question data shared by every session.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct QuestionPool {
    #[serde(default)]
    categories: Vec<Category>,
}

impl QuestionPool {
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Parse a pool from JSON and tag each question with its category.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is not a valid pool document.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let pool: Self = serde_json::from_str(json)?;
        Ok(Self::from_categories(pool.categories))
    }

    #[must_use]
    pub fn from_categories(categories: Vec<Category>) -> Self {
        let mut pool = Self { categories };
        for category in &mut pool.categories {
            for question in &mut category.questions {
                if question.tags.subject.is_none() {
                    question.tags.subject = Some(category.name.clone());
                }
            }
        }
        pool
    }

    /// Load the bundled question banks, falling back to an empty pool.
    #[must_use]
    pub fn load_from_static() -> Self {
        Self::from_json(DEFAULT_QUESTION_DATA).unwrap_or_else(|err| {
            log::warn!("bundled question data failed to parse: {err}");
            Self::empty()
        })
    }

    #[must_use]
    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    #[must_use]
    pub fn category(&self, name: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.name == name)
    }

    /// Names of builtin subjects, in declaration order.
    #[must_use]
    pub fn subjects(&self) -> Vec<&str> {
        self.categories
            .iter()
            .filter(|c| c.origin == CategoryOrigin::Builtin)
            .map(|c| c.name.as_str())
            .collect()
    }

    /// Questions playable under `subject`. `"all"` is every builtin subject,
    /// `"custom"` every custom category.
    #[must_use]
    pub fn questions_for(&self, subject: &str) -> Vec<&Question> {
        let origin_filter = match subject {
            SUBJECT_ALL => Some(CategoryOrigin::Builtin),
            SUBJECT_CUSTOM => Some(CategoryOrigin::Custom),
            _ => None,
        };
        self.categories
            .iter()
            .filter(|c| match origin_filter {
                Some(origin) => c.origin == origin,
                None => c.name == subject,
            })
            .flat_map(|c| c.questions.iter())
            .collect()
    }

    /// Curveball material for `subject`: insane questions for trivia, hard otherwise.
    #[must_use]
    pub fn hard_tier(&self, subject: &str) -> Vec<&Question> {
        let tier = if subject == SUBJECT_TRIVIA {
            DifficultyTier::Insane
        } else {
            DifficultyTier::Hard
        };
        self.category(subject)
            .map(|c| c.questions.iter().filter(|q| q.tier == tier).collect())
            .unwrap_or_default()
    }

    /// Categories other than `active` that can donate curveball questions.
    #[must_use]
    pub fn curveball_sources(&self, active: &str, policy: CurveballSourcePolicy) -> Vec<&str> {
        self.categories
            .iter()
            .filter(|c| c.name != active)
            .filter(|c| policy.include_custom || c.origin == CategoryOrigin::Builtin)
            .filter(|c| !self.hard_tier(&c.name).is_empty())
            .map(|c| c.name.as_str())
            .collect()
    }

    /// Check that `name` can hold custom questions: not blank, not `all`
    /// or `custom`, and not a builtin subject (case-insensitive).
    ///
    /// # Errors
    ///
    /// Returns the reason the name is refused.
    pub fn check_custom_name(&self, name: &str) -> Result<(), CategoryNameError> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(CategoryNameError::Empty);
        }
        if [SUBJECT_ALL, SUBJECT_CUSTOM]
            .iter()
            .any(|reserved| trimmed.eq_ignore_ascii_case(reserved))
        {
            return Err(CategoryNameError::Reserved(trimmed.to_string()));
        }
        if self
            .categories
            .iter()
            .any(|c| c.origin == CategoryOrigin::Builtin && c.name.eq_ignore_ascii_case(trimmed))
        {
            return Err(CategoryNameError::Builtin(trimmed.to_string()));
        }
        Ok(())
    }

    /// Validate and add records to a custom category, creating it if needed.
    ///
    /// # Errors
    ///
    /// Returns an error, importing nothing, when the category name is refused
    /// by [`QuestionPool::check_custom_name`].
    pub fn import_records(
        &mut self,
        category: &str,
        records: impl IntoIterator<Item = ImportRecord>,
    ) -> Result<ImportReport, CategoryNameError> {
        self.check_custom_name(category)?;
        let category = category.trim();
        let mut report = ImportReport::default();
        let idx = match self.categories.iter().position(|c| c.name == category) {
            Some(idx) => idx,
            None => {
                self.categories.push(Category {
                    name: category.to_string(),
                    origin: CategoryOrigin::Custom,
                    questions: Vec::new(),
                });
                self.categories.len() - 1
            }
        };
        let target = &mut self.categories[idx];
        for record in records {
            let Some(question) = record.into_question() else {
                log::debug!("dropping malformed import record for '{category}'");
                report.dropped += 1;
                continue;
            };
            let fingerprint = question.fingerprint();
            if target
                .questions
                .iter()
                .any(|q| q.fingerprint() == fingerprint)
            {
                report.duplicates += 1;
                continue;
            }
            target.questions.push(question.with_subject(category));
            report.accepted += 1;
        }
        Ok(report)
    }

    /// Custom categories, for persistence.
    #[must_use]
    pub fn custom_categories(&self) -> Vec<Category> {
        self.categories
            .iter()
            .filter(|c| c.origin == CategoryOrigin::Custom)
            .cloned()
            .collect()
    }

    /// Replace custom categories with previously persisted ones. Stored
    /// categories whose names are no longer acceptable are skipped.
    pub fn restore_custom(&mut self, custom: Vec<Category>) {
        self.categories.retain(|c| c.origin == CategoryOrigin::Builtin);
        let accepted = custom
            .into_iter()
            .filter(|c| match self.check_custom_name(&c.name) {
                Ok(()) => true,
                Err(err) => {
                    log::warn!("skipping stored custom category: {err}");
                    false
                }
            })
            .map(|mut c| {
                c.origin = CategoryOrigin::Custom;
                c
            })
            .collect();
        let restored = Self::from_categories(accepted);
        self.categories.extend(restored.categories);
    }
}
