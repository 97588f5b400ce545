//! Boss rush: a chain of short, zero-tolerance battles.
use serde::{Deserialize, Serialize};

use crate::config::QuizConfig;
use crate::modes::{QuizMode, SessionConfig};
use crate::opponent::{BattleRule, OpponentRoster};
use crate::session::SessionSummary;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BossStage {
    pub opponent_id: String,
    pub questions: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BossRushProgress {
    NextStage,
    Cleared,
    Failed,
}

/// Progress through a boss chain. Every stage starts at one life, so a
/// single miss ends the chain; there is no recovery between stages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BossRush {
    pub subject: String,
    pub stages: Vec<BossStage>,
    pub current: usize,
    pub failed: bool,
}

impl BossRush {
    /// Chain every boss in the roster, in roster order.
    #[must_use]
    pub fn from_roster(
        roster: &OpponentRoster,
        subject: impl Into<String>,
        cfg: &QuizConfig,
    ) -> Self {
        let stages = roster
            .bosses()
            .map(|boss| BossStage {
                opponent_id: boss.id.clone(),
                questions: cfg.boss_stage_questions,
            })
            .collect();
        Self::new(subject, stages)
    }

    #[must_use]
    pub fn new(subject: impl Into<String>, stages: Vec<BossStage>) -> Self {
        Self {
            subject: subject.into(),
            stages,
            current: 0,
            failed: false,
        }
    }

    #[must_use]
    pub fn current_stage(&self) -> Option<&BossStage> {
        if self.failed {
            None
        } else {
            self.stages.get(self.current)
        }
    }

    /// Session request for the current stage, `None` once the chain is over.
    #[must_use]
    pub fn stage_config(&self) -> Option<SessionConfig> {
        self.current_stage().map(|stage| {
            SessionConfig::new(QuizMode::BossRush, self.subject.clone())
                .with_target(stage.questions)
                .with_opponent(stage.opponent_id.clone(), BattleRule::Boss)
        })
    }

    /// Record a finished stage. Anything short of a perfect, won battle ends the chain.
    pub fn record_stage(&mut self, summary: &SessionSummary) -> BossRushProgress {
        if self.current_stage().is_none() {
            return if self.failed {
                BossRushProgress::Failed
            } else {
                BossRushProgress::Cleared
            };
        }
        let stage_won = summary.won && summary.is_perfect() && summary.battle_won() == Some(true);
        if !stage_won {
            self.failed = true;
            log::info!("boss rush failed at stage {}", self.current + 1);
            return BossRushProgress::Failed;
        }
        self.current += 1;
        if self.current >= self.stages.len() {
            BossRushProgress::Cleared
        } else {
            BossRushProgress::NextStage
        }
    }

    #[must_use]
    pub fn is_cleared(&self) -> bool {
        !self.failed && self.current >= self.stages.len()
    }
}
