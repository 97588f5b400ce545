//! Answer evaluation: correctness, scoring, lives, and termination.
use serde::{Deserialize, Serialize};

use crate::constants::{
    BASE_LIFE_LOSS, BASE_POINTS, COMBO_BONUS_EVERY, CURVEBALL_LIFE_LOSS, CURVEBALL_POINTS,
    DIFFICULTY_STEP_EVERY, LOG_BAD_ANSWER_KEY, LOG_COMBO_BONUS, LOG_DIFFICULTY_UP,
    MULTIPLIER_THRESHOLDS,
};
use crate::question::DrawnQuestion;
use crate::state::SessionState;

/// Why a session ended in the player's favour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VictoryReason {
    TargetReached,
    PoolExhausted,
    TimeExpired,
    /// The battle opponent ran out of lives.
    OpponentDefeated,
}

/// Terminal state of a session. Victory and defeat are exclusive by construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    Victory(VictoryReason),
    Defeat,
}

impl Termination {
    #[must_use]
    pub const fn is_victory(self) -> bool {
        matches!(self, Self::Victory(_))
    }
}

/// Result of one submitted answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerOutcome {
    pub correct: bool,
    pub score_delta: u32,
    pub points_delta: u32,
    pub combo_bonus: u32,
    pub lives_delta: i32,
    pub terminal: Option<Termination>,
}

/// Score multiplier for a consecutive-correct streak.
#[must_use]
pub fn multiplier_for_streak(streak: u32) -> u32 {
    MULTIPLIER_THRESHOLDS
        .iter()
        .find(|(min_streak, _)| streak >= *min_streak)
        .map_or(1, |(_, multiplier)| *multiplier)
}

/// Base points a question is worth.
#[must_use]
pub const fn base_points(curveball: bool) -> u32 {
    if curveball { CURVEBALL_POINTS } else { BASE_POINTS }
}

/// Lives lost on a wrong answer.
#[must_use]
pub const fn life_cost(curveball: bool) -> i32 {
    if curveball {
        CURVEBALL_LIFE_LOSS
    } else {
        BASE_LIFE_LOSS
    }
}

/// Evaluate `selected_index` against `drawn` and apply the deltas to `state`.
pub fn submit(
    state: &mut SessionState,
    selected_index: usize,
    drawn: &DrawnQuestion,
) -> AnswerOutcome {
    let question = &drawn.question;
    if !question.has_valid_answer_key() {
        log::warn!(
            "question '{}' has no valid answer key; treating option 0 as correct",
            question.text
        );
        state.logs.push(LOG_BAD_ANSWER_KEY.to_string());
    }
    let correct = question.accepts(selected_index);
    let curveball = drawn.curveball;
    state.questions_answered += 1;
    state.is_curveball_active = curveball;

    let mut outcome = AnswerOutcome {
        correct,
        score_delta: 0,
        points_delta: 0,
        combo_bonus: 0,
        lives_delta: 0,
        terminal: None,
    };

    if correct {
        state.combo_count += 1;
        state.max_combo = state.max_combo.max(state.combo_count);
        state.multiplier_streak += 1;
        state.multiplier = state
            .multiplier_override
            .unwrap_or_else(|| multiplier_for_streak(state.multiplier_streak));

        let base = base_points(curveball);
        outcome.score_delta = base;
        outcome.points_delta = base * state.multiplier;

        if state.combo_count % COMBO_BONUS_EVERY == 0 {
            outcome.combo_bonus = state.combo_count / COMBO_BONUS_EVERY;
            outcome.points_delta += outcome.combo_bonus;
            state.logs.push(LOG_COMBO_BONUS.to_string());
        }

        state.score += outcome.score_delta;
        state.points += outcome.points_delta;
        state.correct_answers += 1;

        if state.correct_answers % DIFFICULTY_STEP_EVERY == 0 {
            let raised = state.current_difficulty.step_up(state.difficulty_ceiling);
            if raised != state.current_difficulty {
                state.current_difficulty = raised;
                state.max_difficulty_reached = state.max_difficulty_reached.max(raised);
                state.logs.push(LOG_DIFFICULTY_UP.to_string());
            }
        }
    } else {
        state.combo_count = 0;
        state.multiplier_streak = 0;
        state.multiplier = state.multiplier_override.unwrap_or(1);
        if !state.infinite_lives {
            let cost = life_cost(curveball);
            state.lives -= cost;
            outcome.lives_delta = -cost;
        }
    }

    outcome.terminal = terminal_state(state);
    outcome
}

/// Defeat is checked before the question target.
#[must_use]
pub fn terminal_state(state: &SessionState) -> Option<Termination> {
    if state.is_defeated() {
        Some(Termination::Defeat)
    } else if state.target_reached() {
        Some(Termination::Victory(VictoryReason::TargetReached))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::question::{CorrectAnswers, DifficultyTier, Question, sample_question};

    fn drawn(curveball: bool) -> DrawnQuestion {
        DrawnQuestion {
            question: sample_question("q", 1, DifficultyTier::Easy),
            used: true,
            curveball,
        }
    }

    fn classic_state(target: u32) -> SessionState {
        SessionState {
            subject: "math".to_string(),
            questions_target: Some(target),
            ..SessionState::default()
        }
    }

    #[test]
    fn multiplier_thresholds() {
        let expected = [
            (0, 1),
            (4, 1),
            (5, 2),
            (9, 2),
            (10, 3),
            (19, 3),
            (20, 5),
            (49, 5),
            (50, 10),
        ];
        for (streak, multiplier) in expected {
            assert_eq!(multiplier_for_streak(streak), multiplier, "streak {streak}");
        }
    }

    #[test]
    fn difficulty_rises_every_third_correct_up_to_ceiling() {
        let mut state = classic_state(20);
        state.difficulty_ceiling = DifficultyTier::Hard;
        let mut levels = Vec::new();
        for _ in 0..9 {
            submit(&mut state, 1, &drawn(false));
            levels.push(state.current_difficulty.as_u8());
        }
        assert_eq!(levels, vec![1, 1, 2, 2, 2, 3, 3, 3, 3]);
        assert_eq!(state.max_difficulty_reached, DifficultyTier::Hard);
    }

    #[test]
    fn wrong_answers_cost_lives_by_question_kind() {
        let mut state = classic_state(10);
        let outcome = submit(&mut state, 0, &drawn(false));
        assert!(!outcome.correct);
        assert_eq!(outcome.lives_delta, -1);
        assert_eq!(state.lives, 2);

        let mut state = classic_state(10);
        state.lives = 5;
        let outcome = submit(&mut state, 0, &drawn(true));
        assert_eq!(outcome.lives_delta, -3);
        assert_eq!(state.lives, 2);

        for curveball in [false, true] {
            let mut state = classic_state(10);
            state.infinite_lives = true;
            let outcome = submit(&mut state, 0, &drawn(curveball));
            assert_eq!(outcome.lives_delta, 0);
            assert_eq!(state.lives, 3);
            assert_eq!(outcome.terminal, None);
        }
    }

    #[test]
    fn wrong_answer_resets_streaks() {
        let mut state = classic_state(20);
        for _ in 0..6 {
            submit(&mut state, 1, &drawn(false));
        }
        assert_eq!(state.multiplier, 2);
        submit(&mut state, 3, &drawn(false));
        assert_eq!(state.combo_count, 0);
        assert_eq!(state.multiplier_streak, 0);
        assert_eq!(state.multiplier, 1);
        assert_eq!(state.max_combo, 6);
    }

    #[test]
    fn points_apply_multiplier_and_combo_bonus() {
        let mut state = classic_state(20);
        let mut bonus_seen = 0;
        for _ in 0..5 {
            let outcome = submit(&mut state, 1, &drawn(false));
            bonus_seen += outcome.combo_bonus;
        }
        // Four answers at x1, the fifth at x2 plus a combo bonus of 1.
        assert_eq!(state.score, 5);
        assert_eq!(state.points, 4 + 2 + 1);
        assert_eq!(bonus_seen, 1);

        let outcome = submit(&mut state, 1, &drawn(true));
        assert_eq!(outcome.score_delta, 3);
        assert_eq!(outcome.points_delta, 6);
    }

    #[test]
    fn multiplier_override_pins_points() {
        let mut state = classic_state(20);
        state.multiplier_override = Some(10);
        let outcome = submit(&mut state, 1, &drawn(false));
        assert_eq!(outcome.points_delta, 10);
        submit(&mut state, 0, &drawn(false));
        assert_eq!(state.multiplier, 10);
    }

    #[test]
    fn defeat_is_checked_before_target() {
        let mut state = classic_state(1);
        state.lives = 1;
        let outcome = submit(&mut state, 0, &drawn(false));
        assert_eq!(outcome.terminal, Some(Termination::Defeat));

        let mut state = classic_state(1);
        let outcome = submit(&mut state, 0, &drawn(false));
        assert_eq!(
            outcome.terminal,
            Some(Termination::Victory(VictoryReason::TargetReached))
        );
    }

    #[test]
    fn multi_answer_questions_accept_any_member() {
        let mut question = sample_question("multi", 0, DifficultyTier::Medium);
        question.correct = CorrectAnswers::from_iter([1, 3]);
        let multi = DrawnQuestion::fresh(question);
        let mut state = classic_state(10);
        assert!(submit(&mut state, 3, &multi).correct);
        assert!(submit(&mut state, 1, &multi).correct);
        assert!(!submit(&mut state, 2, &multi).correct);
    }

    #[test]
    fn broken_answer_key_is_logged_and_defaults_to_first_option() {
        let question = Question {
            correct: CorrectAnswers::from_iter(Vec::<usize>::new()),
            ..sample_question("broken", 0, DifficultyTier::Easy)
        };
        let broken = DrawnQuestion::fresh(question);
        let mut state = classic_state(10);
        assert!(submit(&mut state, 0, &broken).correct);
        assert!(state.logs.iter().any(|l| l == LOG_BAD_ANSWER_KEY));
    }
}
