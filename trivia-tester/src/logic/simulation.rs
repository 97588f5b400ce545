use anyhow::{Result, anyhow, bail};
use serde::Serialize;
use sha2::{Digest, Sha256};
use trivia_game::{QuizSession, SessionEvent, SessionPhase, SessionSummary};

use super::policy::PlayerPolicy;

/// Hard stop for a runaway session.
const MAX_STEPS: usize = 10_000;

/// One answer given by the scripted player.
#[derive(Debug, Clone, Serialize)]
pub struct DecisionRecord {
    pub question: u32,
    pub answer_index: usize,
    pub correct: bool,
    pub curveball: bool,
    pub policy_name: &'static str,
    pub rationale: Option<String>,
}

/// What a single [`SimulationSession::step`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// The player answered after thinking for this many virtual ms.
    Answered(u64),
    /// The clock jumped this many virtual ms to the next opponent timer.
    Waited(u64),
    Finished,
}

impl StepOutcome {
    #[must_use]
    pub const fn elapsed_ms(self) -> u64 {
        match self {
            Self::Answered(ms) | Self::Waited(ms) => ms,
            Self::Finished => 0,
        }
    }
}

/// Result of driving one session to completion.
#[derive(Debug, Clone)]
pub struct SessionRun {
    pub summary: SessionSummary,
    pub decisions: Vec<DecisionRecord>,
    pub opponent_ticks: u32,
    pub virtual_ms: u64,
    pub events: usize,
    pub event_digest: String,
}

/// Drives a started [`QuizSession`] on a virtual clock with a scripted player.
pub struct SimulationSession<'a> {
    session: QuizSession,
    policy: &'a mut dyn PlayerPolicy,
    now_ms: u64,
    steps: usize,
    decisions: Vec<DecisionRecord>,
    opponent_ticks: u32,
    events: usize,
    hasher: Sha256,
}

impl<'a> SimulationSession<'a> {
    pub fn new(session: QuizSession, policy: &'a mut dyn PlayerPolicy, started_at_ms: u64) -> Self {
        Self {
            session,
            policy,
            now_ms: started_at_ms,
            steps: 0,
            decisions: Vec::new(),
            opponent_ticks: 0,
            events: 0,
            hasher: Sha256::new(),
        }
    }

    /// Advance to the next player decision or opponent timer.
    ///
    /// # Errors
    ///
    /// Returns an error if the session rejects an answer, stalls with nothing
    /// scheduled, or exceeds the step cap.
    pub fn step(&mut self) -> Result<StepOutcome> {
        self.steps += 1;
        if self.steps > MAX_STEPS {
            bail!("session still running after {MAX_STEPS} steps");
        }

        let outcome = match self.session.phase() {
            SessionPhase::Finished => StepOutcome::Finished,
            SessionPhase::Idle => bail!("session was never started"),
            SessionPhase::AwaitingAnswer => {
                let drawn = self
                    .session
                    .current_question()
                    .cloned()
                    .ok_or_else(|| anyhow!("awaiting an answer with no question on screen"))?;
                let think = self.policy.think_ms(&drawn);
                self.now_ms += think;
                self.fire_timers();

                if self.session.phase() == SessionPhase::AwaitingAnswer {
                    let decision = self.policy.pick_answer(&drawn);
                    let question = self.session.question_number();
                    let result = self.session.answer(decision.answer_index, self.now_ms)?;
                    self.decisions.push(DecisionRecord {
                        question,
                        answer_index: decision.answer_index,
                        correct: result.correct,
                        curveball: drawn.curveball,
                        policy_name: self.policy.name(),
                        rationale: decision.rationale,
                    });
                }
                StepOutcome::Answered(think)
            }
            SessionPhase::AwaitingOpponent => {
                let due = self
                    .session
                    .next_due()
                    .ok_or_else(|| anyhow!("waiting on the opponent with nothing scheduled"))?;
                let waited = due.saturating_sub(self.now_ms);
                self.now_ms = self.now_ms.max(due);
                self.fire_timers();
                StepOutcome::Waited(waited)
            }
        };
        self.absorb_events()?;
        Ok(outcome)
    }

    fn fire_timers(&mut self) {
        for outcome in self.session.advance_clock(self.now_ms) {
            log::trace!("timer {outcome:?} at {}ms", self.now_ms);
        }
    }

    /// Opponent ticks are counted here so deferred ones, resolved inside
    /// `answer`, are not missed.
    fn absorb_events(&mut self) -> Result<()> {
        for event in self.session.drain_events() {
            log::trace!("event {} at {}ms", event.key(), self.now_ms);
            if matches!(event, SessionEvent::OpponentAnswered { .. }) {
                self.opponent_ticks += 1;
            }
            self.hasher.update(serde_json::to_vec(&event)?);
            self.events += 1;
        }
        Ok(())
    }

    /// Step until the session ends.
    ///
    /// # Errors
    ///
    /// Propagates the first failing [`step`](Self::step).
    pub fn run_to_end(mut self) -> Result<SessionRun> {
        while self.step()? != StepOutcome::Finished {}
        self.finish()
    }

    /// Collect the results of a finished session.
    ///
    /// # Errors
    ///
    /// Returns an error if the session has not produced a summary.
    pub fn finish(self) -> Result<SessionRun> {
        let summary = self
            .session
            .summary()
            .cloned()
            .ok_or_else(|| anyhow!("session ended without a summary"))?;
        Ok(SessionRun {
            summary,
            decisions: self.decisions,
            opponent_ticks: self.opponent_ticks,
            virtual_ms: self.now_ms,
            events: self.events,
            event_digest: format!("{:x}", self.hasher.finalize()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::policy::AnswerStrategy;
    use std::sync::Arc;
    use trivia_game::{
        BattleRule, OpponentRoster, QuestionPool, QuizConfig, QuizMode, SessionConfig,
    };

    fn started(request: &SessionConfig, seed: u64) -> QuizSession {
        let mut session = QuizSession::new(
            Arc::new(QuestionPool::load_from_static()),
            Arc::new(OpponentRoster::load_from_static()),
            QuizConfig::default(),
            seed,
        );
        session.start(request, 0).unwrap();
        session
    }

    #[test]
    fn perfect_classic_run_wins() {
        let request = SessionConfig::new(QuizMode::Classic, "history").with_target(6);
        let mut policy = AnswerStrategy::Perfect.create_policy(1);
        let run = SimulationSession::new(started(&request, 1), policy.as_mut(), 0)
            .run_to_end()
            .unwrap();
        assert!(run.summary.won);
        assert_eq!(run.decisions.len(), 6);
        assert!(run.decisions.iter().all(|d| d.correct));
        assert_eq!(run.virtual_ms, 6 * 1_500);
        assert_eq!(run.opponent_ticks, 0);
    }

    #[test]
    fn battle_run_counts_opponent_ticks() {
        let request = SessionConfig::new(QuizMode::AiBattle, "math")
            .with_target(5)
            .with_opponent("oracle", BattleRule::Standard);
        let mut policy = AnswerStrategy::Perfect.create_policy(2);
        let run = SimulationSession::new(started(&request, 2), policy.as_mut(), 0)
            .run_to_end()
            .unwrap();
        assert_eq!(run.opponent_ticks, run.summary.questions_answered);
        assert!(run.summary.battle.is_some());
        assert!(run.virtual_ms >= 5 * 3_000);
    }

    #[test]
    fn slow_player_still_counts_deferred_opponent_ticks() {
        let request = SessionConfig::new(QuizMode::AiBattle, "math")
            .with_target(5)
            .with_opponent("oracle", BattleRule::Standard);
        let mut policy = AnswerStrategy::Novice.create_policy(4);
        let run = SimulationSession::new(started(&request, 4), policy.as_mut(), 0)
            .run_to_end()
            .unwrap();
        assert!(run.summary.questions_answered > 0);
        assert_eq!(run.opponent_ticks, run.summary.questions_answered);
        assert_eq!(
            run.summary.battle.as_ref().unwrap().opponent_answered,
            run.opponent_ticks
        );
    }

    #[test]
    fn same_seed_replays_identically() {
        let request = SessionConfig::new(QuizMode::Classic, "all").with_target(10);
        let digest = |seed| {
            let mut policy = AnswerStrategy::Skilled.create_policy(seed);
            SimulationSession::new(started(&request, seed), policy.as_mut(), 0)
                .run_to_end()
                .unwrap()
                .event_digest
        };
        assert_eq!(digest(77), digest(77));
        assert_ne!(digest(77), digest(78));
    }
}
