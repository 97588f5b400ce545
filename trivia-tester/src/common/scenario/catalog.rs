use anyhow::{Result, ensure};
use trivia_game::{BattleOutcome, BossRushProgress, SessionConfig, Termination, VictoryReason};

use crate::logic::{AnswerStrategy, SimulationPlan, SimulationSummary};

/// Plan with the checks every finished session must pass.
pub fn plan(request: SessionConfig, strategy: AnswerStrategy) -> SimulationPlan {
    SimulationPlan::new(request, strategy).with_expectation(session_consistency)
}

fn session_consistency(summary: &SimulationSummary) -> Result<()> {
    let sessions = if summary.stages.is_empty() {
        std::slice::from_ref(&summary.outcome)
    } else {
        summary.stages.as_slice()
    };

    for outcome in sessions {
        ensure!(
            outcome.correct_answers <= outcome.questions_answered,
            "correct answers {} exceed answered {}",
            outcome.correct_answers,
            outcome.questions_answered
        );
        ensure!(
            outcome.points >= outcome.final_score,
            "points {} below base score {}",
            outcome.points,
            outcome.final_score
        );
        match outcome.battle_won() {
            Some(battle_won) => ensure!(
                outcome.won == battle_won,
                "battle outcome and session result disagree"
            ),
            None => ensure!(
                outcome.won == outcome.termination.is_victory(),
                "won flag disagrees with termination {:?}",
                outcome.termination
            ),
        }
        if outcome.termination == Termination::Defeat {
            ensure!(outcome.lives_remaining <= 0, "defeat with lives remaining");
        }
    }
    Ok(())
}

pub fn flawless_win(summary: &SimulationSummary) -> Result<()> {
    let outcome = &summary.outcome;
    ensure!(outcome.won, "perfect player lost ({:?})", outcome.termination);
    ensure!(outcome.is_perfect(), "perfect player missed a question");
    ensure!(
        outcome.termination == Termination::Victory(VictoryReason::TargetReached),
        "expected to reach the target, ended with {:?}",
        outcome.termination
    );
    Ok(())
}

pub fn survival_runs_until_stopped(summary: &SimulationSummary) -> Result<()> {
    let termination = summary.outcome.termination;
    ensure!(
        matches!(
            termination,
            Termination::Defeat | Termination::Victory(VictoryReason::PoolExhausted)
        ),
        "survival ended with {termination:?}"
    );
    Ok(())
}

pub fn lightning_ends_on_time(summary: &SimulationSummary) -> Result<()> {
    ensure!(
        summary.outcome.termination == Termination::Victory(VictoryReason::TimeExpired),
        "lightning ended with {:?}",
        summary.outcome.termination
    );
    ensure!(
        summary.outcome.lives_remaining > 0,
        "lightning lives should never run out"
    );
    Ok(())
}

pub fn battle_reported(summary: &SimulationSummary) -> Result<()> {
    let Some(report) = summary.outcome.battle.as_ref() else {
        anyhow::bail!("battle session has no battle report");
    };
    ensure!(
        report.opponent_answered <= summary.outcome.questions_answered,
        "opponent answered {} questions, player only {}",
        report.opponent_answered,
        summary.outcome.questions_answered
    );
    ensure!(
        summary.opponent_ticks == report.opponent_answered,
        "saw {} opponent answers, report records {}",
        summary.opponent_ticks,
        report.opponent_answered
    );
    Ok(())
}

pub fn guaranteed_opponent_unscathed(summary: &SimulationSummary) -> Result<()> {
    if let Some(report) = summary.outcome.battle.as_ref() {
        ensure!(
            report.opponent_score >= report.opponent_answered,
            "guaranteed opponent scored {} from {} answers",
            report.opponent_score,
            report.opponent_answered
        );
        ensure!(
            report.outcome == BattleOutcome::OpponentWins || report.opponent_lives > 0,
            "guaranteed opponent was knocked out"
        );
    }
    Ok(())
}

pub fn speed_race_beaten(summary: &SimulationSummary) -> Result<()> {
    let deadline = summary
        .outcome
        .battle
        .as_ref()
        .and_then(|report| report.speed_race_deadline_ms);
    let Some(deadline) = deadline else {
        anyhow::bail!("speed race report has no deadline");
    };
    ensure!(
        summary.virtual_ms < deadline,
        "finished at {}ms, deadline {deadline}ms",
        summary.virtual_ms
    );
    ensure!(summary.outcome.won, "fast perfect player lost the race");
    ensure!(summary.opponent_ticks == 0, "speed race scheduled opponent answers");
    Ok(())
}

pub fn boss_rush_cleared(summary: &SimulationSummary) -> Result<()> {
    ensure!(
        summary.boss_rush == Some(BossRushProgress::Cleared),
        "boss rush ended {:?} after {} stage(s)",
        summary.boss_rush,
        summary.stages.len()
    );
    ensure!(
        summary.stages.iter().all(|stage| stage.won && stage.is_perfect()),
        "a cleared stage was not a perfect win"
    );
    Ok(())
}

pub fn replay_matches(summary: &SimulationSummary) -> Result<()> {
    ensure!(
        summary.replay_digest.as_deref() == Some(summary.event_digest.as_str()),
        "replay with seed {} diverged",
        summary.seed
    );
    Ok(())
}
