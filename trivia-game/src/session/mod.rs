//! Quiz session controller.
//!
//! Drives selection, evaluation, opponent ticks, and termination on a virtual
//! clock. Adapters call [`QuizSession::answer`] for player input and
//! [`QuizSession::advance_clock`] as time passes, then drain events to render.
mod event;
mod summary;

use std::sync::Arc;

use thiserror::Error;

pub use event::SessionEvent;
pub use summary::{BattleReport, SessionSummary};
#[cfg(test)]
pub(crate) use summary::sample_summary;

use crate::config::QuizConfig;
use crate::constants::{
    LOG_CURVEBALL_INJECTED, LOG_OPPONENT_DOWN, LOG_POOL_EXHAUSTED, LOG_SESSION_DEFEAT,
    LOG_SESSION_START, LOG_SESSION_VICTORY, LOG_TIME_EXPIRED, OPTION_COUNT, UNBOUNDED_QUEUE_LEN,
};
use crate::evaluator::{self, AnswerOutcome, Termination, VictoryReason};
use crate::modes::{ModePolicy, QuizMode, SessionConfig};
use crate::opponent::{
    self, BattleRule, OpponentProfile, OpponentRoster, OpponentState, PlayerStanding, TickOutcome,
    speed_race_completion_ms,
};
use crate::pool::QuestionPool;
use crate::profile::PowerUps;
use crate::question::DrawnQuestion;
use crate::rng::RngBundle;
use crate::scheduler::{ScheduledTask, Scheduler, TaskKind};
use crate::selector;
use crate::state::SessionState;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("no question is awaiting an answer")]
    NotAwaitingAnswer,
    #[error("answer index {index} is out of range (expected 0..{max})", max = OPTION_COUNT)]
    AnswerOutOfRange { index: usize },
    #[error("unknown opponent '{0}'")]
    UnknownOpponent(String),
    #[error("{0} needs an opponent")]
    MissingOpponent(QuizMode),
    #[error("{0} is locked for this profile")]
    ModeLocked(QuizMode),
    #[error("power-ups are disabled in {0}")]
    PowerUpsDisabled(QuizMode),
    #[error("no '{0}' power-up left")]
    PowerUpUnavailable(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Idle,
    AwaitingAnswer,
    /// The player answered; the opponent's answer to the same question is pending.
    AwaitingOpponent,
    Finished,
}

/// What delivering a scheduled task did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerOutcome {
    /// Scheduled under an earlier generation, or already handled. Nothing changed.
    Stale,
    OpponentAnswered(TickOutcome),
    /// The opponent's answer arrived before the player's; it resolves right
    /// after the player answers.
    Deferred,
    DeadlineReached,
}

#[derive(Debug, Clone)]
struct Battle {
    profile: OpponentProfile,
    state: OpponentState,
    rule: BattleRule,
    /// Questions in presentation order; the opponent answers the same ones.
    presented: Vec<DrawnQuestion>,
    ticks_done: u32,
    deferred: Option<u32>,
}

impl Battle {
    fn awaiting_tick(&self, seq: u32) -> bool {
        self.rule != BattleRule::SpeedRace && self.ticks_done < seq
    }
}

/// One quiz run, from `start` to its summary.
#[derive(Debug)]
pub struct QuizSession {
    pool: Arc<QuestionPool>,
    roster: Arc<OpponentRoster>,
    config: QuizConfig,
    seed: u64,
    rngs: RngBundle,
    state: SessionState,
    phase: SessionPhase,
    current: Option<DrawnQuestion>,
    seq: u32,
    battle: Option<Battle>,
    scheduler: Scheduler,
    generation: u64,
    pending_termination: Option<Termination>,
    events: Vec<SessionEvent>,
    summary: Option<SessionSummary>,
}

impl QuizSession {
    #[must_use]
    pub fn new(
        pool: Arc<QuestionPool>,
        roster: Arc<OpponentRoster>,
        config: QuizConfig,
        seed: u64,
    ) -> Self {
        Self {
            pool,
            roster,
            config,
            seed,
            rngs: RngBundle::from_user_seed(seed),
            state: SessionState::default(),
            phase: SessionPhase::Idle,
            current: None,
            seq: 0,
            battle: None,
            scheduler: Scheduler::new(),
            generation: 0,
            pending_termination: None,
            events: Vec::new(),
            summary: None,
        }
    }

    /// Begin a run. Any run in progress is abandoned first.
    ///
    /// # Errors
    ///
    /// Returns an error when a battle mode names no opponent or an unknown one.
    pub fn start(&mut self, request: &SessionConfig, now_ms: u64) -> Result<(), SessionError> {
        let battle = if request.mode.is_battle() {
            let id = request
                .opponent
                .as_deref()
                .ok_or(SessionError::MissingOpponent(request.mode))?;
            let profile = self
                .roster
                .get_by_id(id)
                .ok_or_else(|| SessionError::UnknownOpponent(id.to_string()))?;
            let rule = if request.mode == QuizMode::BossRush {
                BattleRule::Boss
            } else {
                request.battle_rule
            };
            Some(Battle {
                state: OpponentState::from_profile(profile),
                profile: profile.clone(),
                rule,
                presented: Vec::new(),
                ticks_done: 0,
                deferred: None,
            })
        } else {
            None
        };

        self.reset();
        self.summary = None;
        self.events.clear();

        let params =
            ModePolicy::for_mode(request.mode, &self.config).resolve(request, &self.config);
        let target_count = params
            .questions_target
            .map_or(UNBOUNDED_QUEUE_LEN, |target| target as usize);
        let queue = selector::prepare(
            &self.pool,
            &params.subject,
            target_count,
            params.curveballs_enabled,
            self.rngs.selection(),
        );

        self.state = SessionState::from_params(&params, now_ms);
        self.state.queue = queue;
        self.state.logs.push(LOG_SESSION_START.to_string());
        self.battle = battle;
        log::info!(
            "session start: mode={} subject={} target={:?} queue={} seed={}",
            params.mode,
            params.subject,
            params.questions_target,
            self.state.queue.len(),
            self.seed
        );

        if let Some(limit) = params.time_limit_ms {
            self.scheduler.schedule(
                now_ms.saturating_add(limit),
                self.generation,
                TaskKind::LightningDeadline,
            );
        }

        self.present_next(now_ms);
        Ok(())
    }

    /// Submit the player's answer to the current question.
    ///
    /// # Errors
    ///
    /// Returns an error when no question is awaiting an answer or the index
    /// is not one of the four options.
    pub fn answer(&mut self, selected: usize, now_ms: u64) -> Result<AnswerOutcome, SessionError> {
        if self.phase != SessionPhase::AwaitingAnswer {
            return Err(SessionError::NotAwaitingAnswer);
        }
        if selected >= OPTION_COUNT {
            return Err(SessionError::AnswerOutOfRange { index: selected });
        }
        let Some(drawn) = self.current.take() else {
            return Err(SessionError::NotAwaitingAnswer);
        };

        let outcome = evaluator::submit(&mut self.state, selected, &drawn);
        self.events.push(SessionEvent::AnswerEvaluated {
            seq: self.seq,
            selected,
            outcome,
        });
        if let Some(terminal) = outcome.terminal {
            self.pending_termination.get_or_insert(terminal);
        }
        if let Some(seq) = self.battle.as_mut().and_then(|battle| battle.deferred.take()) {
            self.resolve_opponent(seq);
        }
        self.complete_cycle(now_ms);
        Ok(outcome)
    }

    /// Spend one cosmetic power-up on the current question.
    ///
    /// # Errors
    ///
    /// Returns an error when no question is awaiting an answer, the mode
    /// disables power-ups, or none of `id` are left. `powerups` is untouched
    /// on error.
    pub fn use_powerup(&mut self, powerups: &mut PowerUps, id: &str) -> Result<u32, SessionError> {
        if self.phase != SessionPhase::AwaitingAnswer {
            return Err(SessionError::NotAwaitingAnswer);
        }
        if !self.state.powerups_enabled {
            return Err(SessionError::PowerUpsDisabled(self.state.mode));
        }
        if !powerups.consume(id) {
            return Err(SessionError::PowerUpUnavailable(id.to_string()));
        }
        self.state.powerups_used += 1;
        let remaining = powerups.count(id);
        self.events.push(SessionEvent::PowerUpUsed {
            seq: self.seq,
            id: id.to_string(),
            remaining,
        });
        Ok(remaining)
    }

    /// Deliver every task due at or before `now_ms`, in due order.
    pub fn advance_clock(&mut self, now_ms: u64) -> Vec<TimerOutcome> {
        let mut outcomes = Vec::new();
        while let Some(task) = self.scheduler.pop_due(now_ms) {
            outcomes.push(self.handle_timer(task, task.due_ms));
        }
        outcomes
    }

    /// Deliver one task. Tasks from an earlier generation are ignored.
    pub fn handle_timer(&mut self, task: ScheduledTask, now_ms: u64) -> TimerOutcome {
        if task.generation != self.generation
            || matches!(self.phase, SessionPhase::Idle | SessionPhase::Finished)
        {
            log::debug!(
                "dropping stale task {} ({:?}); generation {} vs {}",
                task.id,
                task.kind,
                task.generation,
                self.generation
            );
            return TimerOutcome::Stale;
        }
        match task.kind {
            TaskKind::LightningDeadline => {
                self.state.logs.push(LOG_TIME_EXPIRED.to_string());
                self.finish(Termination::Victory(VictoryReason::TimeExpired), now_ms);
                TimerOutcome::DeadlineReached
            }
            TaskKind::OpponentAnswer { seq } => {
                if self.phase == SessionPhase::AwaitingAnswer && seq == self.seq {
                    if let Some(battle) = self.battle.as_mut() {
                        battle.deferred = Some(seq);
                    }
                    return TimerOutcome::Deferred;
                }
                let Some(tick) = self.resolve_opponent(seq) else {
                    return TimerOutcome::Stale;
                };
                if self.phase == SessionPhase::AwaitingOpponent && seq == self.seq {
                    self.complete_cycle(now_ms);
                }
                TimerOutcome::OpponentAnswered(tick)
            }
        }
    }

    /// Abandon the run: cancel pending tasks and restore defaults.
    pub fn reset(&mut self) {
        let cancelled = self.scheduler.cancel_all();
        if cancelled > 0 {
            log::debug!("reset cancelled {cancelled} pending task(s)");
        }
        self.generation += 1;
        self.state = SessionState::default();
        self.phase = SessionPhase::Idle;
        self.current = None;
        self.seq = 0;
        self.battle = None;
        self.pending_termination = None;
    }

    #[must_use]
    pub const fn current_question(&self) -> Option<&DrawnQuestion> {
        self.current.as_ref()
    }

    /// One-based number of the question currently presented.
    #[must_use]
    pub const fn question_number(&self) -> u32 {
        self.seq
    }

    #[must_use]
    pub const fn phase(&self) -> SessionPhase {
        self.phase
    }

    #[must_use]
    pub const fn state(&self) -> &SessionState {
        &self.state
    }

    #[must_use]
    pub fn opponent(&self) -> Option<&OpponentState> {
        self.battle.as_ref().map(|battle| &battle.state)
    }

    #[must_use]
    pub const fn summary(&self) -> Option<&SessionSummary> {
        self.summary.as_ref()
    }

    pub fn drain_events(&mut self) -> Vec<SessionEvent> {
        std::mem::take(&mut self.events)
    }

    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    #[must_use]
    pub fn next_due(&self) -> Option<u64> {
        self.scheduler.next_due()
    }

    #[must_use]
    pub fn pending_tasks(&self) -> Vec<ScheduledTask> {
        self.scheduler.pending().copied().collect()
    }

    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    #[must_use]
    pub const fn config(&self) -> &QuizConfig {
        &self.config
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.phase == SessionPhase::Finished
    }

    fn present_next(&mut self, now_ms: u64) {
        let Some(selection) = selector::next(&mut self.state, self.rngs.selection()) else {
            self.state.logs.push(LOG_POOL_EXHAUSTED.to_string());
            self.finish(Termination::Victory(VictoryReason::PoolExhausted), now_ms);
            return;
        };

        self.seq += 1;
        let mut drawn = selection.drawn.clone();
        if selector::should_inject_curveball(
            self.state.curveballs_enabled,
            self.state.questions_answered,
            self.state.score,
            &self.state.subject,
        ) && let Some(draw) = selector::inject_curveball(
            &mut self.state,
            &self.pool,
            &selection,
            self.config.curveball_sources,
            self.rngs.curveball(),
        ) {
            log::debug!(
                "curveball from {} replaces question {}",
                draw.source_subject,
                self.seq
            );
            self.state.logs.push(LOG_CURVEBALL_INJECTED.to_string());
            self.events.push(SessionEvent::CurveballInjected {
                seq: self.seq,
                source_subject: draw.source_subject,
            });
            drawn = draw.drawn;
        }

        self.events.push(SessionEvent::QuestionPresented {
            seq: self.seq,
            text: drawn.question.text.clone(),
            subject: drawn.question.subject().map(str::to_string),
            tier: drawn.tier(),
            curveball: drawn.curveball,
        });

        if let Some(battle) = self.battle.as_mut() {
            battle.presented.push(drawn.clone());
            if battle.rule != BattleRule::SpeedRace {
                let delay = battle.profile.answer_delay_ms(self.rngs.latency());
                self.scheduler.schedule(
                    now_ms.saturating_add(delay),
                    self.generation,
                    TaskKind::OpponentAnswer { seq: self.seq },
                );
            }
        }

        self.current = Some(drawn);
        self.phase = SessionPhase::AwaitingAnswer;
    }

    /// Run the opponent's tick for question `seq`, once.
    fn resolve_opponent(&mut self, seq: u32) -> Option<TickOutcome> {
        let questions_target = self.state.questions_target;
        let battle = self.battle.as_mut()?;
        if seq <= battle.ticks_done {
            return None;
        }
        let drawn = battle.presented.get(seq.checked_sub(1)? as usize)?;

        let tick = opponent::tick(
            &mut battle.state,
            &battle.profile,
            drawn,
            questions_target,
            self.rngs.opponent(),
        );
        battle.ticks_done = seq;
        self.events.push(SessionEvent::OpponentAnswered {
            seq,
            correct: tick.correct,
            opponent_lives: battle.state.lives,
            opponent_score: battle.state.score,
        });
        // A boss stage always runs its full question count.
        if battle.state.is_out() && battle.rule != BattleRule::Boss {
            self.state.logs.push(LOG_OPPONENT_DOWN.to_string());
            self.pending_termination
                .get_or_insert(Termination::Victory(VictoryReason::OpponentDefeated));
        }
        Some(tick)
    }

    /// Close the current question once both sides have answered it.
    fn complete_cycle(&mut self, now_ms: u64) {
        if self
            .battle
            .as_ref()
            .is_some_and(|battle| battle.awaiting_tick(self.seq))
        {
            self.phase = SessionPhase::AwaitingOpponent;
            return;
        }
        match self.pending_termination {
            Some(termination) => self.finish(termination, now_ms),
            None => self.present_next(now_ms),
        }
    }

    fn finish(&mut self, termination: Termination, now_ms: u64) {
        let elapsed_ms = self.state.elapsed_ms(now_ms);
        let battle = self.battle.as_ref().map(|battle| {
            let target = self
                .state
                .questions_target
                .unwrap_or(self.state.questions_answered);
            let standing = PlayerStanding {
                lives: self.state.lives,
                questions_answered: self.state.questions_answered,
                correct_answers: self.state.correct_answers,
                elapsed_ms,
            };
            BattleReport {
                opponent_id: battle.state.profile_id.clone(),
                rule: battle.rule,
                outcome: opponent::resolve_battle(
                    battle.rule,
                    self.config.tie_break,
                    standing,
                    &battle.state,
                    target,
                ),
                opponent_score: battle.state.score,
                opponent_lives: battle.state.lives,
                opponent_answered: battle.state.questions_answered,
                speed_race_deadline_ms: (battle.rule == BattleRule::SpeedRace)
                    .then(|| speed_race_completion_ms(target, battle.state.answer_latency_ms)),
            }
        });
        let won = battle.as_ref().map_or_else(
            || termination.is_victory(),
            |report| report.outcome == opponent::BattleOutcome::PlayerWins,
        );
        self.state.logs.push(
            if won {
                LOG_SESSION_VICTORY
            } else {
                LOG_SESSION_DEFEAT
            }
            .to_string(),
        );

        let summary = SessionSummary {
            won,
            final_score: self.state.score,
            points: self.state.points,
            questions_answered: self.state.questions_answered,
            correct_answers: self.state.correct_answers,
            lives_remaining: self.state.lives,
            max_combo: self.state.max_combo,
            max_difficulty_reached: self.state.max_difficulty_reached,
            duration_seconds: elapsed_ms / 1_000,
            subject: self.state.subject.clone(),
            mode: self.state.mode,
            termination,
            powerups_used: self.state.powerups_used,
            battle,
            logs: std::mem::take(&mut self.state.logs),
        };
        log::info!(
            "session end: mode={} won={} score={} answered={} termination={:?}",
            summary.mode,
            summary.won,
            summary.final_score,
            summary.questions_answered,
            summary.termination
        );

        self.events.push(SessionEvent::SessionEnded(summary.clone()));
        self.summary = Some(summary);
        self.reset();
        self.phase = SessionPhase::Finished;
    }
}
