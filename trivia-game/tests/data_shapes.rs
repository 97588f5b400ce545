use std::collections::HashSet;
use std::hash::Hasher;

use trivia_game::constants::{OPTION_COUNT, SUBJECT_TRIVIA};
use trivia_game::{
    DifficultyTier, OpponentRoster, Question, QuestionPool, QuizConfig, QuizMode, QuizSession,
    SessionConfig, SessionEvent, SessionState,
};
use twox_hash::XxHash64;

fn digest(bytes: &[u8]) -> u64 {
    let mut hasher = XxHash64::with_seed(0);
    hasher.write(bytes);
    hasher.finish()
}

#[test]
fn bundled_questions_are_well_formed() {
    let pool = QuestionPool::load_from_static();
    let subjects = pool.subjects();
    assert_eq!(
        subjects,
        vec!["math", "physics", "history", "geography", "science", "trivia"]
    );
    for subject in subjects {
        let questions = pool.questions_for(subject);
        assert!(questions.len() >= 10, "{subject} is too small");
        let mut seen = HashSet::new();
        for question in &questions {
            assert_eq!(question.options.len(), OPTION_COUNT);
            assert!(question.has_valid_answer_key(), "{}", question.text);
            assert_eq!(question.subject(), Some(subject));
            assert!(seen.insert(question.fingerprint()), "duplicate: {}", question.text);
        }
        let hard = pool.hard_tier(subject);
        assert!(!hard.is_empty(), "{subject} has no curveball material");
        let expected = if subject == SUBJECT_TRIVIA {
            DifficultyTier::Insane
        } else {
            DifficultyTier::Hard
        };
        assert!(hard.iter().all(|q| q.tier == expected));
    }
}

#[test]
fn fingerprint_normalises_case_and_whitespace() {
    let pool = QuestionPool::load_from_static();
    let question: &Question = pool.questions_for("history")[0];
    let normalised = question.text.trim().to_lowercase();
    assert_eq!(question.fingerprint(), digest(normalised.as_bytes()));

    let mut shouted = question.clone();
    shouted.text = format!("  {}  ", question.text.to_uppercase());
    assert_eq!(shouted.fingerprint(), question.fingerprint());
}

#[test]
fn pool_serialization_is_stable_across_loads() {
    let a = serde_json::to_string(&QuestionPool::load_from_static()).unwrap();
    let b = serde_json::to_string(&QuestionPool::load_from_static()).unwrap();
    assert_eq!(digest(a.as_bytes()), digest(b.as_bytes()));
    let back: QuestionPool = serde_json::from_str(&a).unwrap();
    assert_eq!(back, QuestionPool::load_from_static());
}

#[test]
fn bundled_opponents_and_config_validate() {
    let roster = OpponentRoster::load_from_static();
    let ids: HashSet<&str> = roster.0.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids.len(), roster.0.len());
    assert!(roster.0.iter().filter(|p| p.guaranteed).count() == 1);
    assert!(roster.bosses().all(|p| p.lives == 1));

    let config = QuizConfig::load_from_static();
    config.validate().unwrap();
    assert_eq!(config, QuizConfig::default());
}

#[test]
fn mid_session_state_round_trips_through_json() {
    let mut session = QuizSession::new(
        std::sync::Arc::new(QuestionPool::load_from_static()),
        std::sync::Arc::new(OpponentRoster::load_from_static()),
        QuizConfig::default(),
        77,
    );
    session
        .start(&SessionConfig::new(QuizMode::Classic, "math").with_target(6), 0)
        .unwrap();
    let idx = session.current_question().unwrap().question.correct.as_slice()[0];
    session.answer(idx, 1_000).unwrap();

    let json = serde_json::to_string(session.state()).unwrap();
    let restored: SessionState = serde_json::from_str(&json).unwrap();
    assert_eq!(&restored, session.state());
    assert_eq!(restored.queue.iter().filter(|q| q.used).count(), 2);

    let events = serde_json::to_value(session.drain_events()).unwrap();
    assert_eq!(events[0]["type"], "question_presented");
    let decoded: Vec<SessionEvent> = serde_json::from_value(events).unwrap();
    assert_eq!(decoded.len(), 3);
}
