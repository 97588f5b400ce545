use std::sync::Arc;

use trivia_game::{
    BattleOutcome, BattleRule, BossRush, BossRushProgress, BossStage, OpponentRoster,
    QuestionPool, QuizConfig, QuizMode, QuizSession, SessionConfig, SessionEvent, SessionPhase,
    Termination, TieBreak, VictoryReason,
};

const TEST_ROSTER: &str = r#"[
    {"id": "dud", "name": "Dud", "accuracy_base": 0.0, "accuracy_on_curveball": 0.0,
     "latency_ms": 1000, "jitter_ms": 0, "lives": 3},
    {"id": "sage", "name": "Sage", "accuracy_base": 1.0, "accuracy_on_curveball": 1.0,
     "latency_ms": 2000, "jitter_ms": 0, "guaranteed": true},
    {"id": "warden", "name": "Warden", "accuracy_base": 1.0, "accuracy_on_curveball": 1.0,
     "latency_ms": 1500, "jitter_ms": 0, "lives": 1, "guaranteed": true, "boss": true},
    {"id": "fumbler", "name": "Fumbler", "accuracy_base": 0.0, "accuracy_on_curveball": 0.0,
     "latency_ms": 1000, "jitter_ms": 0, "lives": 1, "boss": true}
]"#;

fn new_session(config: QuizConfig) -> QuizSession {
    QuizSession::new(
        Arc::new(QuestionPool::load_from_static()),
        Arc::new(OpponentRoster::from_json(TEST_ROSTER).unwrap()),
        config,
        0xBA77_1E,
    )
}

fn battle(opponent: &str, rule: BattleRule, target: u32) -> SessionConfig {
    SessionConfig::new(QuizMode::AiBattle, "math")
        .with_target(target)
        .with_curveballs(false)
        .with_opponent(opponent, rule)
}

fn correct(session: &QuizSession) -> usize {
    session.current_question().unwrap().question.correct.as_slice()[0]
}

fn wrong(session: &QuizSession) -> usize {
    let question = &session.current_question().unwrap().question;
    (0..4).find(|idx| !question.accepts(*idx)).unwrap()
}

/// Play to the end on a virtual clock, answering `think_ms` after each question appears.
fn drive(
    session: &mut QuizSession,
    think_ms: u64,
    mut choose: impl FnMut(&QuizSession) -> usize,
) -> u64 {
    let mut now = 0;
    while !session.is_finished() {
        match session.phase() {
            SessionPhase::AwaitingAnswer => {
                now += think_ms;
                session.advance_clock(now);
                if session.phase() == SessionPhase::AwaitingAnswer {
                    let pick = choose(session);
                    session.answer(pick, now).unwrap();
                }
            }
            SessionPhase::AwaitingOpponent => {
                now = session.next_due().unwrap().max(now);
                session.advance_clock(now);
            }
            other => panic!("unexpected phase {other:?}"),
        }
    }
    now
}

#[test]
fn speed_race_lost_when_slower_than_opponent_completion() {
    let mut session = new_session(QuizConfig::default());
    session
        .start(&battle("sage", BattleRule::SpeedRace, 10), 0)
        .unwrap();
    assert!(session.pending_tasks().is_empty());
    let finished_at = drive(&mut session, 2_100, correct);
    assert_eq!(finished_at, 21_000);

    let summary = session.summary().unwrap();
    let report = summary.battle.as_ref().unwrap();
    assert_eq!(report.speed_race_deadline_ms, Some(20_000));
    assert_eq!(report.outcome, BattleOutcome::OpponentWins);
    assert!(!summary.won);
    assert!(summary.lives_remaining > 0);
}

#[test]
fn speed_race_won_when_strictly_faster() {
    let mut session = new_session(QuizConfig::default());
    session
        .start(&battle("sage", BattleRule::SpeedRace, 10), 0)
        .unwrap();
    drive(&mut session, 1_900, correct);
    let summary = session.summary().unwrap();
    assert_eq!(summary.battle_won(), Some(true));
    assert!(summary.won);
}

#[test]
fn standard_tie_goes_to_opponent_by_default() {
    let mut session = new_session(QuizConfig::default());
    session
        .start(&battle("sage", BattleRule::Standard, 4), 0)
        .unwrap();
    drive(&mut session, 500, correct);
    let summary = session.summary().unwrap();
    let report = summary.battle.as_ref().unwrap();
    assert_eq!(summary.lives_remaining, report.opponent_lives);
    assert_eq!(report.outcome, BattleOutcome::OpponentWins);
    assert!(!summary.won);
}

#[test]
fn tie_break_can_favour_the_player() {
    let config = QuizConfig {
        tie_break: TieBreak::Player,
        ..QuizConfig::default()
    };
    let mut session = new_session(config);
    session
        .start(&battle("sage", BattleRule::Standard, 4), 0)
        .unwrap();
    drive(&mut session, 500, correct);
    assert!(session.summary().unwrap().won);
}

#[test]
fn knocking_out_the_opponent_ends_the_battle_early() {
    let mut session = new_session(QuizConfig::default());
    session
        .start(&battle("dud", BattleRule::Standard, 10), 0)
        .unwrap();
    drive(&mut session, 3_000, correct);
    let summary = session.summary().unwrap();
    assert_eq!(
        summary.termination,
        Termination::Victory(VictoryReason::OpponentDefeated)
    );
    assert_eq!(summary.questions_answered, 3);
    assert!(summary.won);
    assert_eq!(summary.battle.as_ref().unwrap().opponent_lives, 0);
}

#[test]
fn defeat_waits_for_the_opponent_then_shows_nothing_new() {
    let mut session = new_session(QuizConfig::default());
    session
        .start(&battle("sage", BattleRule::Standard, 10), 0)
        .unwrap();
    for step in 1..=3u64 {
        session.answer(wrong(&session), step * 100).unwrap();
        if step < 3 {
            assert_eq!(session.phase(), SessionPhase::AwaitingOpponent);
            let due = session.next_due().unwrap();
            session.advance_clock(due);
        }
    }
    assert_eq!(session.phase(), SessionPhase::AwaitingOpponent);
    assert_eq!(session.state().lives, 0);
    let due = session.next_due().unwrap();
    session.advance_clock(due);
    assert!(session.is_finished());

    let events = session.drain_events();
    let presented = events
        .iter()
        .filter(|e| matches!(e, SessionEvent::QuestionPresented { .. }))
        .count();
    let opponent_answers = events
        .iter()
        .filter(|e| matches!(e, SessionEvent::OpponentAnswered { .. }))
        .count();
    assert_eq!(presented, 3);
    assert_eq!(opponent_answers, 3);
    let summary = session.summary().unwrap();
    assert_eq!(summary.battle_won(), Some(false));
    assert_eq!(summary.termination, Termination::Defeat);
}

#[test]
fn boss_rush_chain_with_perfect_player() {
    let roster = OpponentRoster::from_json(TEST_ROSTER).unwrap();
    let mut rush = BossRush::from_roster(&roster, "history", &QuizConfig::default());
    assert_eq!(rush.stages.len(), 2);

    let mut session = new_session(QuizConfig::default());
    for expected in [BossRushProgress::NextStage, BossRushProgress::Cleared] {
        let stage = rush.stage_config().unwrap();
        session.start(&stage, 0).unwrap();
        assert_eq!(session.state().lives, 1);
        drive(&mut session, 800, correct);
        let summary = session.summary().unwrap().clone();
        assert_eq!(summary.questions_answered, 3);
        assert!(summary.is_perfect());
        assert_eq!(rush.record_stage(&summary), expected);
    }
    assert!(rush.is_cleared());
}

#[test]
fn boss_stage_plays_every_question_after_the_boss_is_out() {
    let mut rush = BossRush::new(
        "history",
        vec![BossStage {
            opponent_id: "fumbler".to_string(),
            questions: 3,
        }],
    );
    let mut session = new_session(QuizConfig::default());
    session.start(&rush.stage_config().unwrap(), 0).unwrap();
    drive(&mut session, 800, correct);

    let summary = session.summary().unwrap().clone();
    assert_eq!(summary.questions_answered, 3);
    assert_eq!(
        summary.termination,
        Termination::Victory(VictoryReason::TargetReached)
    );
    let report = summary.battle.as_ref().unwrap();
    assert_eq!(report.opponent_answered, 3);
    assert!(report.opponent_lives <= 0);
    assert_eq!(report.outcome, BattleOutcome::PlayerWins);
    assert_eq!(rush.record_stage(&summary), BossRushProgress::Cleared);
}

#[test]
fn boss_stage_lost_on_a_late_miss_even_with_the_boss_out() {
    let mut session = new_session(QuizConfig::default());
    let stage = SessionConfig::new(QuizMode::BossRush, "history")
        .with_target(3)
        .with_curveballs(false)
        .with_opponent("fumbler", BattleRule::Boss);
    session.start(&stage, 0).unwrap();
    let mut asked = 0;
    drive(&mut session, 800, |s| {
        asked += 1;
        if asked == 2 { wrong(s) } else { correct(s) }
    });

    let summary = session.summary().unwrap();
    assert_eq!(summary.questions_answered, 2);
    assert_eq!(summary.termination, Termination::Defeat);
    assert_eq!(summary.battle_won(), Some(false));
}

#[test]
fn boss_rush_single_miss_aborts() {
    let mut rush = BossRush::new(
        "history",
        vec![
            BossStage {
                opponent_id: "warden".to_string(),
                questions: 3,
            },
            BossStage {
                opponent_id: "warden".to_string(),
                questions: 3,
            },
        ],
    );
    let mut session = new_session(QuizConfig::default());
    session.start(&rush.stage_config().unwrap(), 0).unwrap();
    let mut first = true;
    drive(&mut session, 800, |s| {
        if first {
            first = false;
            wrong(s)
        } else {
            correct(s)
        }
    });
    let summary = session.summary().unwrap().clone();
    assert!(!summary.won);
    assert_eq!(rush.record_stage(&summary), BossRushProgress::Failed);
    assert!(rush.stage_config().is_none());
}
