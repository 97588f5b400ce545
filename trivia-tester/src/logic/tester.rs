use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

use trivia_game::SessionSummary;

use crate::common::scenario::TestScenario;
use crate::logic::quiz_tester::{QuizTester, SimulationPlan, SimulationSummary};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub scenario_name: String,
    pub seed: u64,
    pub passed: bool,
    pub iterations_run: usize,
    pub successful_iterations: usize,
    pub failures: Vec<String>,
    #[serde(with = "duration_serde")]
    pub average_duration: Duration,
    #[serde(with = "duration_vec_serde")]
    pub performance_data: Vec<Duration>,
}

pub struct LogicTester {
    tester: QuizTester,
    verbose: bool,
}

impl LogicTester {
    pub const fn new(tester: QuizTester, verbose: bool) -> Self {
        Self { tester, verbose }
    }

    #[must_use]
    pub const fn tester(&self) -> &QuizTester {
        &self.tester
    }

    pub async fn run_scenario(
        &self,
        scenario: &TestScenario,
        seeds: &[u64],
        iterations: usize,
    ) -> Vec<ScenarioResult> {
        let mut results = Vec::new();

        for &seed in seeds {
            if self.verbose {
                println!(
                    "🧪 Testing scenario: {} (mode: {} strategy: {} seed: {})",
                    scenario.name.bright_white(),
                    scenario.plan.request.mode,
                    scenario.plan.strategy,
                    seed
                );
            }

            let result = self.run_single_scenario(scenario, seed, iterations).await;
            results.push(result);
        }

        results
    }

    async fn run_single_scenario(
        &self,
        scenario: &TestScenario,
        seed: u64,
        iterations: usize,
    ) -> ScenarioResult {
        let (successes, failures, performance_data) =
            self.run_simulation_iterations(&scenario.plan, seed, iterations).await;

        let avg_duration = if performance_data.is_empty() {
            Duration::ZERO
        } else {
            performance_data.iter().sum::<Duration>()
                / u32::try_from(performance_data.len()).unwrap_or(1)
        };

        ScenarioResult {
            scenario_name: scenario.name.clone(),
            seed,
            passed: failures.is_empty(),
            iterations_run: iterations,
            successful_iterations: successes,
            failures,
            average_duration: avg_duration,
            performance_data,
        }
    }

    async fn run_simulation_iterations(
        &self,
        plan: &SimulationPlan,
        seed: u64,
        iterations: usize,
    ) -> (usize, Vec<String>, Vec<Duration>) {
        let mut successes = 0;
        let mut failures = Vec::new();
        let mut performance_data = Vec::new();

        for i in 0..iterations {
            let start_time = Instant::now();
            let iteration_seed = seed.wrapping_add(u64::try_from(i).unwrap_or(u64::MAX));

            let summary = match self.tester.run_plan(plan, iteration_seed).await {
                Ok(summary) => summary,
                Err(err) => {
                    failures.push(format!(
                        "Iteration {} (seed {iteration_seed}): simulation error: {err:#}",
                        i + 1
                    ));
                    if self.verbose {
                        println!(
                            "  ❌ Iteration {}/{} aborted: {}",
                            i + 1,
                            iterations,
                            format!("{err:#}").red()
                        );
                    }
                    continue;
                }
            };

            if let Some(err) = evaluate_expectations(plan, &summary) {
                let context = summarize_decision_path(&summary);
                let outcome = &summary.outcome;
                failures.push(format!(
                    "Iteration {} (mode {}, strategy {}, seed {}, {}): {err} | {context}",
                    i + 1,
                    summary.mode,
                    summary.strategy,
                    summary.seed,
                    describe_outcome(outcome)
                ));

                if self.verbose {
                    println!(
                        "  ❌ Iteration {}/{} failed: {}",
                        i + 1,
                        iterations,
                        err.clone().red()
                    );
                    println!(
                        "     ↳ Seed {} | Score {} Points {} | Decisions: {}",
                        summary.seed, outcome.final_score, outcome.points, context
                    );
                }
            } else {
                successes += 1;
                let duration = start_time.elapsed();
                performance_data.push(duration);

                if self.verbose {
                    println!(
                        "  ✅ Iteration {}/{} passed ({duration:?}) score:{} answered:{} won:{}",
                        i + 1,
                        iterations,
                        summary.outcome.final_score,
                        summary.outcome.questions_answered,
                        summary.outcome.won
                    );
                    println!(
                        "     ↳ virtual:{}ms events:{}",
                        summary.virtual_ms, summary.events
                    );
                }
            }
        }

        (successes, failures, performance_data)
    }
}

fn evaluate_expectations(plan: &SimulationPlan, summary: &SimulationSummary) -> Option<String> {
    for expectation in &plan.expectations {
        if let Err(err) = expectation.evaluate(summary) {
            return Some(err.to_string());
        }
    }
    None
}

fn describe_outcome(outcome: &SessionSummary) -> String {
    format!(
        "answered {}, correct {}, lives {}, termination {:?}",
        outcome.questions_answered,
        outcome.correct_answers,
        outcome.lives_remaining,
        outcome.termination
    )
}

fn summarize_decision_path(summary: &SimulationSummary) -> String {
    if summary.decisions.is_empty() {
        return "no decisions recorded".to_string();
    }

    summary
        .decisions
        .iter()
        .rev()
        .take(3)
        .map(|entry| {
            let rationale = entry
                .rationale
                .as_deref()
                .filter(|s| !s.is_empty())
                .unwrap_or("-");
            format!(
                "q{}{} [{}] idx {} {} reason {}",
                entry.question,
                if entry.curveball { " (curveball)" } else { "" },
                entry.policy_name,
                entry.answer_index,
                if entry.correct { "right" } else { "wrong" },
                rationale
            )
        })
        .collect::<Vec<_>>()
        .join(" | ")
}

mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_millis().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u128::deserialize(deserializer)?;
        Ok(Duration::from_millis(u64::try_from(millis).unwrap_or(0)))
    }
}

mod duration_vec_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(durations: &[Duration], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let millis: Vec<u128> = durations.iter().map(Duration::as_millis).collect();
        millis.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis_vec = Vec::<u128>::deserialize(deserializer)?;
        Ok(millis_vec
            .into_iter()
            .map(|m| Duration::from_millis(u64::try_from(m).unwrap_or(0)))
            .collect())
    }
}
