use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use chrono::NaiveDate;
use trivia_game::{
    BossRush, BossRushProgress, OpponentRoster, ProfileGateway, QuestionPool, QuizConfig,
    QuizMode, QuizSession, SessionConfig, SessionSummary,
};

use super::policy::{AnswerStrategy, PlayerPolicy};
use super::simulation::{DecisionRecord, SessionRun, SimulationSession, StepOutcome};
use crate::store::FileStore;

/// Virtual time runs this many times faster than wall time under `--realtime`.
const REALTIME_SPEEDUP: u64 = 10;

/// Engine data shared by every simulated session.
#[derive(Debug, Clone)]
pub struct TesterAssets {
    pub pool: Arc<QuestionPool>,
    pub roster: Arc<OpponentRoster>,
    pub config: QuizConfig,
}

impl TesterAssets {
    #[must_use]
    pub fn load_default() -> Self {
        Self {
            pool: Arc::new(QuestionPool::load_from_static()),
            roster: Arc::new(OpponentRoster::load_from_static()),
            config: QuizConfig::load_from_static(),
        }
    }

    /// Bundled data, with the tuning config replaced by `config_path` when given.
    ///
    /// # Errors
    ///
    /// Returns an error if the override cannot be read or fails validation.
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let mut assets = Self::load_default();
        if let Some(path) = config_path {
            let raw = fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            assets.config = QuizConfig::from_json(&raw)
                .map_err(|err| anyhow!("invalid quiz config {}: {err}", path.display()))?;
        }
        Ok(assets)
    }
}

/// Declarative plan for running a simulation session.
#[derive(Debug, Clone)]
pub struct SimulationPlan {
    pub request: SessionConfig,
    pub strategy: AnswerStrategy,
    /// Run the whole boss chain instead of a single session.
    pub boss_rush: bool,
    /// Record the result as today's daily challenge.
    pub daily: bool,
    /// Run twice and keep the second event digest for comparison.
    pub verify_replay: bool,
    pub expectations: Vec<SimulationExpectation>,
}

impl SimulationPlan {
    #[must_use]
    pub fn new(request: SessionConfig, strategy: AnswerStrategy) -> Self {
        Self {
            request,
            strategy,
            boss_rush: false,
            daily: false,
            verify_replay: false,
            expectations: Vec::new(),
        }
    }

    #[must_use]
    pub const fn as_boss_rush(mut self) -> Self {
        self.boss_rush = true;
        self
    }

    #[must_use]
    pub const fn as_daily(mut self) -> Self {
        self.daily = true;
        self
    }

    #[must_use]
    pub const fn with_replay_check(mut self) -> Self {
        self.verify_replay = true;
        self
    }

    #[must_use]
    pub fn with_expectation(mut self, expectation: impl Into<SimulationExpectation>) -> Self {
        self.expectations.push(expectation.into());
        self
    }
}

/// Assertion hook run after a simulation completes.
type SimulationExpectationFn =
    Arc<dyn Fn(&SimulationSummary) -> Result<()> + Send + Sync + 'static>;

#[derive(Clone)]
pub struct SimulationExpectation(SimulationExpectationFn);

impl std::fmt::Debug for SimulationExpectation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimulationExpectation").finish()
    }
}

impl SimulationExpectation {
    /// # Errors
    ///
    /// Returns the expectation's failure message.
    pub fn evaluate(&self, summary: &SimulationSummary) -> Result<()> {
        (self.0)(summary)
    }
}

impl<F> From<F> for SimulationExpectation
where
    F: Fn(&SimulationSummary) -> Result<()> + Send + Sync + 'static,
{
    fn from(f: F) -> Self {
        Self(Arc::new(f))
    }
}

/// Complete record of a simulation run.
#[derive(Debug, Clone)]
pub struct SimulationSummary {
    pub seed: u64,
    pub mode: QuizMode,
    pub strategy: AnswerStrategy,
    /// The last session played; for a boss rush, the stage it ended on.
    pub outcome: SessionSummary,
    /// Every boss stage played, in order. Empty outside boss rush.
    pub stages: Vec<SessionSummary>,
    pub boss_rush: Option<BossRushProgress>,
    pub decisions: Vec<DecisionRecord>,
    pub opponent_ticks: u32,
    pub virtual_ms: u64,
    pub events: usize,
    pub event_digest: String,
    pub replay_digest: Option<String>,
}

/// Headless deterministic runner for the quiz engine.
pub struct QuizTester {
    assets: TesterAssets,
    verbose: bool,
    realtime: bool,
    recorder: Option<(ProfileGateway<FileStore>, NaiveDate)>,
}

impl QuizTester {
    #[must_use]
    pub const fn new(assets: TesterAssets, verbose: bool) -> Self {
        Self {
            assets,
            verbose,
            realtime: false,
            recorder: None,
        }
    }

    #[must_use]
    pub const fn with_realtime(mut self, realtime: bool) -> Self {
        self.realtime = realtime;
        self
    }

    /// Persist every finished session into `gateway`, dated `today`.
    #[must_use]
    pub fn with_recorder(mut self, gateway: ProfileGateway<FileStore>, today: NaiveDate) -> Self {
        self.recorder = Some((gateway, today));
        self
    }

    #[must_use]
    pub const fn assets(&self) -> &TesterAssets {
        &self.assets
    }

    /// # Errors
    ///
    /// Returns an error if a session cannot be started or driven, or if a
    /// result cannot be recorded.
    pub async fn run_plan(&self, plan: &SimulationPlan, seed: u64) -> Result<SimulationSummary> {
        let mut summary = if plan.boss_rush {
            self.run_boss_rush(plan, seed).await?
        } else {
            self.run_single(plan, seed).await?
        };

        if plan.verify_replay {
            let replay = if plan.boss_rush {
                self.run_boss_rush(plan, seed).await?
            } else {
                self.run_single(plan, seed).await?
            };
            summary.replay_digest = Some(replay.event_digest);
        }

        self.record(plan, &summary)?;
        Ok(summary)
    }

    async fn run_single(&self, plan: &SimulationPlan, seed: u64) -> Result<SimulationSummary> {
        let mut policy = plan.strategy.create_policy(seed);
        let run = self
            .drive(&plan.request, seed, policy.as_mut())
            .await?;
        Ok(SimulationSummary {
            seed,
            mode: plan.request.mode,
            strategy: plan.strategy,
            outcome: run.summary,
            stages: Vec::new(),
            boss_rush: None,
            decisions: run.decisions,
            opponent_ticks: run.opponent_ticks,
            virtual_ms: run.virtual_ms,
            events: run.events,
            event_digest: run.event_digest,
            replay_digest: None,
        })
    }

    async fn run_boss_rush(&self, plan: &SimulationPlan, seed: u64) -> Result<SimulationSummary> {
        let mut rush = BossRush::from_roster(
            &self.assets.roster,
            plan.request.subject.clone(),
            &self.assets.config,
        );
        let mut policy = plan.strategy.create_policy(seed);
        let mut stages = Vec::new();
        let mut decisions = Vec::new();
        let mut opponent_ticks = 0;
        let mut virtual_ms = 0;
        let mut events = 0;
        let mut digests = Vec::new();
        let mut progress = BossRushProgress::Failed;

        while let Some(request) = rush.stage_config() {
            let stage_seed = seed.wrapping_add(u64::try_from(stages.len()).unwrap_or(u64::MAX));
            let run = self.drive(&request, stage_seed, policy.as_mut()).await?;
            progress = rush.record_stage(&run.summary);
            if self.verbose {
                println!(
                    "     ↳ boss stage {} ({}) -> {progress:?}",
                    stages.len() + 1,
                    request.opponent.as_deref().unwrap_or("-")
                );
            }
            decisions.extend(run.decisions);
            opponent_ticks += run.opponent_ticks;
            virtual_ms += run.virtual_ms;
            events += run.events;
            digests.push(run.event_digest);
            stages.push(run.summary);
        }

        let outcome = stages
            .last()
            .cloned()
            .ok_or_else(|| anyhow!("boss roster has no bosses to fight"))?;
        Ok(SimulationSummary {
            seed,
            mode: QuizMode::BossRush,
            strategy: plan.strategy,
            outcome,
            stages,
            boss_rush: Some(progress),
            decisions,
            opponent_ticks,
            virtual_ms,
            events,
            event_digest: digests.join(":"),
            replay_digest: None,
        })
    }

    async fn drive(
        &self,
        request: &SessionConfig,
        seed: u64,
        policy: &mut (dyn PlayerPolicy + Send),
    ) -> Result<SessionRun> {
        let mut session = QuizSession::new(
            Arc::clone(&self.assets.pool),
            Arc::clone(&self.assets.roster),
            self.assets.config.clone(),
            seed,
        );
        session
            .start(request, 0)
            .with_context(|| format!("failed to start {} session", request.mode))?;

        let mut sim = SimulationSession::new(session, policy, 0);
        loop {
            let step = sim.step()?;
            if step == StepOutcome::Finished {
                break;
            }
            if self.realtime {
                tokio::time::sleep(Duration::from_millis(step.elapsed_ms() / REALTIME_SPEEDUP))
                    .await;
            }
        }
        sim.finish()
    }

    fn record(&self, plan: &SimulationPlan, summary: &SimulationSummary) -> Result<()> {
        let Some((gateway, today)) = &self.recorder else {
            return Ok(());
        };
        let played = if summary.stages.is_empty() {
            std::slice::from_ref(&summary.outcome)
        } else {
            summary.stages.as_slice()
        };
        for session in played {
            let report = gateway
                .finalize_session(session, *today, plan.daily)
                .context("failed to record session result")?;
            if !report.unlocks.is_empty() {
                log::info!(
                    "profile unlocks: coins +{} achievements {:?} modes {:?}",
                    report.unlocks.coins_earned,
                    report.unlocks.new_achievements,
                    report.unlocks.new_modes
                );
            }
        }
        Ok(())
    }
}
