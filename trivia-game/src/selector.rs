//! Question selection: queue preparation, per-turn draws, and curveballs.
use rand::Rng;
use rand::seq::SliceRandom;

use crate::constants::{CURVEBALL_EVERY, CURVEBALL_MIN_SCORE, SUBJECT_ALL, SUBJECT_CUSTOM};
use crate::pool::{CurveballSourcePolicy, QuestionPool};
use crate::question::{DifficultyTier, DrawnQuestion, Question};
use crate::state::SessionState;

/// A question taken from the session queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    /// Position in `SessionState::queue`.
    pub index: usize,
    pub drawn: DrawnQuestion,
}

/// A curveball replacing a regular selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurveballDraw {
    pub source_subject: String,
    pub drawn: DrawnQuestion,
}

/// Build the session queue for `subject`: a shuffled copy of its questions
/// trimmed or padded to exactly `target_count` entries.
///
/// Padding cycles through the shuffled base again; padded copies are flagged
/// as curveballs when curveballs are enabled. An empty subject yields an
/// empty queue.
pub fn prepare<R: Rng + ?Sized>(
    pool: &QuestionPool,
    subject: &str,
    target_count: usize,
    curveballs_enabled: bool,
    rng: &mut R,
) -> Vec<DrawnQuestion> {
    let mut base: Vec<Question> = pool.questions_for(subject).into_iter().cloned().collect();
    if base.is_empty() {
        return Vec::new();
    }
    base.shuffle(rng);
    base.iter()
        .cycle()
        .take(target_count)
        .enumerate()
        .map(|(position, question)| {
            let mut drawn = DrawnQuestion::fresh(question.clone());
            if position >= base.len() && curveballs_enabled {
                drawn.curveball = true;
            }
            drawn
        })
        .collect()
}

/// Draw the next unused question, or `None` once the queue is exhausted.
pub fn next<R: Rng + ?Sized>(state: &mut SessionState, rng: &mut R) -> Option<Selection> {
    let unused: Vec<usize> = state
        .queue
        .iter()
        .enumerate()
        .filter(|(_, q)| !q.used)
        .map(|(idx, _)| idx)
        .collect();
    if unused.is_empty() {
        return None;
    }

    let in_band = |idx: &&usize| {
        let tier = state.queue[**idx].tier();
        if state.hard_only {
            tier >= DifficultyTier::Hard
        } else {
            tier <= state.current_difficulty.min(state.difficulty_ceiling)
        }
    };
    let band: Vec<usize> = unused.iter().filter(in_band).copied().collect();
    let candidates = if band.is_empty() { &unused } else { &band };

    let index = *candidates.choose(rng)?;
    let entry = &mut state.queue[index];
    entry.used = true;
    Some(Selection {
        index,
        drawn: entry.clone(),
    })
}

/// Whether the upcoming draw should be swapped for a curveball.
#[must_use]
pub fn should_inject_curveball(
    curveballs_enabled: bool,
    questions_answered: u32,
    score: u32,
    subject: &str,
) -> bool {
    curveballs_enabled
        && questions_answered > 0
        && questions_answered % CURVEBALL_EVERY == 0
        && score >= CURVEBALL_MIN_SCORE
        && subject != SUBJECT_ALL
        && subject != SUBJECT_CUSTOM
}

/// Replace `selection` with a hard question from another subject.
///
/// The replaced entry is returned to the queue unused. Returns `None`, and
/// leaves the selection consumed, when no other subject can supply one.
pub fn inject_curveball<R: Rng + ?Sized>(
    state: &mut SessionState,
    pool: &QuestionPool,
    selection: &Selection,
    policy: CurveballSourcePolicy,
    rng: &mut R,
) -> Option<CurveballDraw> {
    let sources = pool.curveball_sources(&state.subject, policy);
    let source = *sources.choose(rng)?;
    let mut question = (*pool.hard_tier(source).choose(rng)?).clone();
    question.tags.curveball = true;

    if let Some(entry) = state.queue.get_mut(selection.index) {
        entry.used = false;
    }
    Some(CurveballDraw {
        source_subject: source.to_string(),
        drawn: DrawnQuestion {
            question,
            used: true,
            curveball: true,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Category, CategoryOrigin};
    use crate::question::sample_question;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    fn tiny_pool() -> QuestionPool {
        let questions = vec![
            sample_question("e1", 0, DifficultyTier::Easy),
            sample_question("e2", 0, DifficultyTier::Easy),
            sample_question("m1", 1, DifficultyTier::Medium),
            sample_question("h1", 2, DifficultyTier::Hard),
            sample_question("i1", 3, DifficultyTier::Insane),
        ];
        QuestionPool::from_categories(vec![Category {
            name: "math".to_string(),
            origin: CategoryOrigin::Builtin,
            questions,
        }])
    }

    fn state_with_queue(queue: Vec<DrawnQuestion>) -> SessionState {
        SessionState {
            subject: "math".to_string(),
            queue,
            ..SessionState::default()
        }
    }

    #[test]
    fn prepare_returns_exactly_target_count() {
        let pool = tiny_pool();
        let mut rng = SmallRng::seed_from_u64(1);
        for target in [0, 1, 3, 5, 6, 12, 40] {
            let queue = prepare(&pool, "math", target, true, &mut rng);
            assert_eq!(queue.len(), target);
            assert!(queue.iter().all(|q| !q.used));
        }
    }

    #[test]
    fn padding_copies_are_curveballs_only_when_enabled() {
        let pool = tiny_pool();
        let mut rng = SmallRng::seed_from_u64(2);
        let padded = prepare(&pool, "math", 8, true, &mut rng);
        assert!(padded[..5].iter().all(|q| !q.curveball));
        assert!(padded[5..].iter().all(|q| q.curveball));
        // Padding repeats the shuffled base in order.
        assert_eq!(padded[5].question, padded[0].question);

        let plain = prepare(&pool, "math", 8, false, &mut rng);
        assert!(plain.iter().all(|q| !q.curveball));
    }

    #[test]
    fn unknown_subject_prepares_nothing_and_next_is_none() {
        let pool = tiny_pool();
        let mut rng = SmallRng::seed_from_u64(3);
        let queue = prepare(&pool, "astronomy", 10, true, &mut rng);
        assert!(queue.is_empty());
        let mut state = state_with_queue(queue);
        assert!(next(&mut state, &mut rng).is_none());
    }

    #[test]
    fn next_never_returns_used_questions() {
        let pool = tiny_pool();
        let mut rng = SmallRng::seed_from_u64(4);
        let queue = prepare(&pool, "math", 12, false, &mut rng);
        let mut state = state_with_queue(queue);
        let mut seen = Vec::new();
        while let Some(selection) = next(&mut state, &mut rng) {
            assert!(!seen.contains(&selection.index));
            assert!(state.queue[selection.index].used);
            seen.push(selection.index);
        }
        assert_eq!(seen.len(), 12);
        assert_eq!(state.unused_remaining(), 0);
    }

    #[test]
    fn next_prefers_questions_within_difficulty_band() {
        let pool = tiny_pool();
        let mut rng = SmallRng::seed_from_u64(5);
        let queue = prepare(&pool, "math", 5, false, &mut rng);
        let mut state = state_with_queue(queue);
        state.current_difficulty = DifficultyTier::Easy;
        for _ in 0..2 {
            let selection = next(&mut state, &mut rng).unwrap();
            assert_eq!(selection.drawn.tier(), DifficultyTier::Easy);
        }
        // Band exhausted: falls back to any unused question.
        let fallback = next(&mut state, &mut rng).unwrap();
        assert!(fallback.drawn.tier() > DifficultyTier::Easy);
    }

    #[test]
    fn hard_only_filters_then_falls_back() {
        let pool = tiny_pool();
        let mut rng = SmallRng::seed_from_u64(6);
        let queue = prepare(&pool, "math", 5, false, &mut rng);
        let mut state = state_with_queue(queue);
        state.hard_only = true;
        let first = next(&mut state, &mut rng).unwrap();
        let second = next(&mut state, &mut rng).unwrap();
        assert!(first.drawn.tier() >= DifficultyTier::Hard);
        assert!(second.drawn.tier() >= DifficultyTier::Hard);
        let third = next(&mut state, &mut rng).unwrap();
        assert!(third.drawn.tier() < DifficultyTier::Hard);
    }

    #[test]
    fn curveball_policy_gates() {
        assert!(should_inject_curveball(true, 5, 4, "physics"));
        assert!(should_inject_curveball(true, 10, 3, "math"));
        assert!(!should_inject_curveball(false, 5, 4, "physics"));
        assert!(!should_inject_curveball(true, 0, 4, "physics"));
        assert!(!should_inject_curveball(true, 6, 4, "physics"));
        assert!(!should_inject_curveball(true, 5, 2, "physics"));
        assert!(!should_inject_curveball(true, 5, 4, SUBJECT_ALL));
        assert!(!should_inject_curveball(true, 5, 4, SUBJECT_CUSTOM));
    }

    #[test]
    fn injected_curveball_comes_from_another_subject_hard_tier() {
        let pool = QuestionPool::load_from_static();
        let mut rng = SmallRng::seed_from_u64(7);
        let queue = prepare(&pool, "physics", 10, true, &mut rng);
        let mut state = SessionState {
            subject: "physics".to_string(),
            queue,
            ..SessionState::default()
        };
        let selection = next(&mut state, &mut rng).unwrap();
        let draw = inject_curveball(
            &mut state,
            &pool,
            &selection,
            CurveballSourcePolicy::default(),
            &mut rng,
        )
        .unwrap();
        assert_ne!(draw.source_subject, "physics");
        assert_eq!(draw.drawn.question.subject(), Some(draw.source_subject.as_str()));
        let expected_tier = if draw.source_subject == crate::constants::SUBJECT_TRIVIA {
            DifficultyTier::Insane
        } else {
            DifficultyTier::Hard
        };
        assert_eq!(draw.drawn.tier(), expected_tier);
        assert!(draw.drawn.curveball);
        assert!(!state.queue[selection.index].used);
    }

    #[test]
    fn curveball_without_sources_keeps_selection() {
        let pool = tiny_pool();
        let mut rng = SmallRng::seed_from_u64(8);
        let queue = prepare(&pool, "math", 5, true, &mut rng);
        let mut state = state_with_queue(queue);
        let selection = next(&mut state, &mut rng).unwrap();
        assert!(
            inject_curveball(
                &mut state,
                &pool,
                &selection,
                CurveballSourcePolicy::default(),
                &mut rng,
            )
            .is_none()
        );
        assert!(state.queue[selection.index].used);
    }
}
