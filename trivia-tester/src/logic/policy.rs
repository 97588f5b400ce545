use std::fmt;

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use serde::{Deserialize, Serialize};
use trivia_game::DrawnQuestion;
use trivia_game::constants::OPTION_COUNT;

/// Decision returned by a [`PlayerPolicy`]
#[derive(Debug, Clone)]
pub struct PolicyDecision {
    pub answer_index: usize,
    pub rationale: Option<String>,
}

impl PolicyDecision {
    #[must_use]
    pub fn new(answer_index: usize, rationale: Option<String>) -> Self {
        Self {
            answer_index,
            rationale,
        }
    }
}

/// Policy interface for automated players.
pub trait PlayerPolicy {
    /// Name used for logging/debug output.
    fn name(&self) -> &'static str;

    /// Virtual milliseconds spent reading `drawn` before answering.
    fn think_ms(&mut self, drawn: &DrawnQuestion) -> u64;

    /// Pick an option for the question on screen.
    fn pick_answer(&mut self, drawn: &DrawnQuestion) -> PolicyDecision;
}

/// Built-in answering strategies for automated runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerStrategy {
    Perfect,
    Skilled,
    Novice,
    Guesser,
}

impl AnswerStrategy {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            AnswerStrategy::Perfect => "Perfect",
            AnswerStrategy::Skilled => "Skilled",
            AnswerStrategy::Novice => "Novice",
            AnswerStrategy::Guesser => "Guesser",
        }
    }

    #[must_use]
    pub fn create_policy(self, seed: u64) -> Box<dyn PlayerPolicy + Send> {
        match self {
            AnswerStrategy::Perfect => Box::new(PerfectPolicy),
            AnswerStrategy::Skilled => Box::new(AccuracyPolicy {
                label: "Skilled",
                accuracy: 0.85,
                curveball_accuracy: 0.6,
                think_base_ms: 2_000,
                think_jitter_ms: 1_000,
                rng: ChaCha20Rng::seed_from_u64(seed),
            }),
            AnswerStrategy::Novice => Box::new(AccuracyPolicy {
                label: "Novice",
                accuracy: 0.55,
                curveball_accuracy: 0.25,
                think_base_ms: 4_000,
                think_jitter_ms: 2_500,
                rng: ChaCha20Rng::seed_from_u64(seed),
            }),
            AnswerStrategy::Guesser => Box::new(GuesserPolicy {
                rng: ChaCha20Rng::seed_from_u64(seed),
            }),
        }
    }
}

impl fmt::Display for AnswerStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

const PERFECT_THINK_MS: u64 = 1_500;
const GUESSER_THINK_MS: u64 = 800;

struct PerfectPolicy;

struct AccuracyPolicy {
    label: &'static str,
    accuracy: f64,
    curveball_accuracy: f64,
    think_base_ms: u64,
    think_jitter_ms: u64,
    rng: ChaCha20Rng,
}

struct GuesserPolicy {
    rng: ChaCha20Rng,
}

impl PlayerPolicy for PerfectPolicy {
    fn name(&self) -> &'static str {
        "Perfect"
    }

    fn think_ms(&mut self, _drawn: &DrawnQuestion) -> u64 {
        PERFECT_THINK_MS
    }

    fn pick_answer(&mut self, drawn: &DrawnQuestion) -> PolicyDecision {
        PolicyDecision::new(accepted_index(drawn), None)
    }
}

impl PlayerPolicy for AccuracyPolicy {
    fn name(&self) -> &'static str {
        self.label
    }

    fn think_ms(&mut self, _drawn: &DrawnQuestion) -> u64 {
        self.think_base_ms + self.rng.gen_range(0..=self.think_jitter_ms)
    }

    fn pick_answer(&mut self, drawn: &DrawnQuestion) -> PolicyDecision {
        let odds = if drawn.curveball {
            self.curveball_accuracy
        } else {
            self.accuracy
        };
        let roll: f64 = self.rng.r#gen();
        if roll < odds {
            PolicyDecision::new(accepted_index(drawn), Some(format!("knew it ({roll:.2})")))
        } else {
            let pick = rejected_index(drawn, &mut self.rng);
            PolicyDecision::new(pick, Some(format!("slipped ({roll:.2})")))
        }
    }
}

impl PlayerPolicy for GuesserPolicy {
    fn name(&self) -> &'static str {
        "Guesser"
    }

    fn think_ms(&mut self, _drawn: &DrawnQuestion) -> u64 {
        GUESSER_THINK_MS
    }

    fn pick_answer(&mut self, _drawn: &DrawnQuestion) -> PolicyDecision {
        PolicyDecision::new(self.rng.gen_range(0..OPTION_COUNT), Some("guess".to_string()))
    }
}

fn accepted_index(drawn: &DrawnQuestion) -> usize {
    (0..OPTION_COUNT)
        .find(|idx| drawn.question.accepts(*idx))
        .unwrap_or(0)
}

fn rejected_index(drawn: &DrawnQuestion, rng: &mut ChaCha20Rng) -> usize {
    let wrong: Vec<usize> = (0..OPTION_COUNT)
        .filter(|idx| !drawn.question.accepts(*idx))
        .collect();
    wrong.choose(rng).copied().unwrap_or(0)
}
