//! Scripted AI opponents: weighted coin-flip answers on a fixed latency.
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::evaluator::{base_points, life_cost};
use crate::question::{DifficultyTier, DrawnQuestion, Question};

const DEFAULT_OPPONENT_DATA: &str = include_str!("../assets/opponents.json");

/// How a battle's winner is decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BattleRule {
    /// Compare remaining lives once someone is out or the questions run out.
    #[default]
    Standard,
    /// Beat the opponent's fixed completion time with lives to spare.
    SpeedRace,
    /// Zero tolerance: every question of the stage answered, any miss loses.
    /// Knocking the boss out does not end the stage early.
    Boss,
}

/// Who takes a standard battle when both sides finish with equal lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TieBreak {
    #[default]
    Opponent,
    Player,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BattleOutcome {
    PlayerWins,
    OpponentWins,
}

/// Static accuracy adjustment for particular subjects or difficulty bands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccuracyModifier {
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub min_tier: Option<DifficultyTier>,
    pub delta: f32,
}

impl AccuracyModifier {
    #[must_use]
    pub fn applies_to(&self, question: &Question) -> bool {
        let subject_ok = self
            .subject
            .as_deref()
            .is_none_or(|subject| question.subject() == Some(subject));
        let tier_ok = self.min_tier.is_none_or(|min| question.tier >= min);
        subject_ok && tier_ok
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpponentProfile {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub desc: String,
    pub accuracy_base: f32,
    pub accuracy_on_curveball: f32,
    pub latency_ms: u64,
    #[serde(default)]
    pub jitter_ms: u64,
    #[serde(default = "OpponentProfile::default_lives")]
    pub lives: i32,
    /// Always answers correctly.
    #[serde(default)]
    pub guaranteed: bool,
    #[serde(default)]
    pub boss: bool,
    #[serde(default)]
    pub modifiers: Vec<AccuracyModifier>,
}

impl OpponentProfile {
    const fn default_lives() -> i32 {
        3
    }

    /// Probability of a correct answer on `question`.
    #[must_use]
    pub fn accuracy_for(&self, question: &Question, curveball: bool) -> f64 {
        let base = if curveball {
            self.accuracy_on_curveball
        } else {
            self.accuracy_base
        };
        let adjusted = self
            .modifiers
            .iter()
            .filter(|m| m.applies_to(question))
            .fold(f64::from(base), |acc, m| acc + f64::from(m.delta));
        adjusted.clamp(0.0, 1.0)
    }

    /// Delay before the opponent answers: base latency plus uniform jitter.
    pub fn answer_delay_ms<R: Rng + ?Sized>(&self, rng: &mut R) -> u64 {
        if self.jitter_ms == 0 {
            self.latency_ms
        } else {
            self.latency_ms + rng.gen_range(0..=self.jitter_ms)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct OpponentRoster(pub Vec<OpponentProfile>);

impl OpponentRoster {
    /// # Errors
    ///
    /// Returns an error if the JSON is not a list of opponent profiles.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    #[must_use]
    pub fn load_from_static() -> Self {
        Self::from_json(DEFAULT_OPPONENT_DATA).unwrap_or_else(|err| {
            log::warn!("bundled opponent data failed to parse: {err}");
            Self::default()
        })
    }

    #[must_use]
    pub fn get_by_id(&self, id: &str) -> Option<&OpponentProfile> {
        self.0.iter().find(|p| p.id == id)
    }

    /// Boss profiles in declaration order.
    pub fn bosses(&self) -> impl Iterator<Item = &OpponentProfile> {
        self.0.iter().filter(|p| p.boss)
    }
}

/// Live opponent bookkeeping for one battle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpponentState {
    pub profile_id: String,
    pub accuracy_base: f32,
    pub accuracy_on_curveball: f32,
    pub answer_latency_ms: u64,
    pub lives: i32,
    pub score: u32,
    pub questions_answered: u32,
    pub guaranteed: bool,
}

impl OpponentState {
    #[must_use]
    pub fn from_profile(profile: &OpponentProfile) -> Self {
        Self {
            profile_id: profile.id.clone(),
            accuracy_base: profile.accuracy_base,
            accuracy_on_curveball: profile.accuracy_on_curveball,
            answer_latency_ms: profile.latency_ms,
            lives: profile.lives,
            score: 0,
            questions_answered: 0,
            guaranteed: profile.guaranteed,
        }
    }

    #[must_use]
    pub const fn is_out(&self) -> bool {
        self.lives <= 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickOutcome {
    pub correct: bool,
    pub terminal: bool,
}

/// Resolve the opponent's answer to the shared question.
///
/// `drawn.curveball` is the player's curveball flag for the same question.
pub fn tick<R: Rng + ?Sized>(
    opponent: &mut OpponentState,
    profile: &OpponentProfile,
    drawn: &DrawnQuestion,
    questions_target: Option<u32>,
    rng: &mut R,
) -> TickOutcome {
    let curveball = drawn.curveball;
    let correct = opponent.guaranteed
        || rng.r#gen::<f64>() < profile.accuracy_for(&drawn.question, curveball);

    opponent.questions_answered += 1;
    if correct {
        opponent.score += base_points(curveball);
    } else {
        opponent.lives -= life_cost(curveball);
    }

    let terminal = opponent.is_out()
        || questions_target.is_some_and(|target| opponent.questions_answered >= target);
    TickOutcome { correct, terminal }
}

/// The player's side of a battle at resolution time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayerStanding {
    pub lives: i32,
    pub questions_answered: u32,
    pub correct_answers: u32,
    pub elapsed_ms: u64,
}

/// Fixed time the opponent needs to finish a speed race.
#[must_use]
pub const fn speed_race_completion_ms(questions_target: u32, per_question_latency_ms: u64) -> u64 {
    questions_target as u64 * per_question_latency_ms
}

/// Decide a finished battle. Called once, at battle end.
#[must_use]
pub fn resolve_battle(
    rule: BattleRule,
    tie_break: TieBreak,
    player: PlayerStanding,
    opponent: &OpponentState,
    questions_target: u32,
) -> BattleOutcome {
    let player_wins = match rule {
        BattleRule::Standard => {
            if opponent.is_out() {
                true
            } else if player.lives <= 0 {
                false
            } else if player.lives != opponent.lives {
                player.lives > opponent.lives
            } else {
                tie_break == TieBreak::Player
            }
        }
        BattleRule::SpeedRace => {
            let deadline =
                speed_race_completion_ms(questions_target, opponent.answer_latency_ms);
            player.lives > 0 && player.elapsed_ms < deadline
        }
        BattleRule::Boss => {
            player.lives > 0
                && player.questions_answered > 0
                && player.questions_answered == questions_target
                && player.correct_answers == player.questions_answered
        }
    };
    if player_wins {
        BattleOutcome::PlayerWins
    } else {
        BattleOutcome::OpponentWins
    }
}
