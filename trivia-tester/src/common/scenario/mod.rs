use chrono::NaiveDate;
use trivia_game::{BattleRule, DailyChallenge, QuestionPool, QuizMode, SessionConfig};

use crate::logic::{AnswerStrategy, SimulationPlan};

pub mod catalog;

// Logic test scenario
#[derive(Debug, Clone)]
pub struct TestScenario {
    pub name: String,
    pub plan: SimulationPlan,
}

impl TestScenario {
    #[must_use]
    pub fn simulation(name: impl Into<String>, plan: SimulationPlan) -> Self {
        Self {
            name: name.into(),
            plan,
        }
    }
}

/// Every scenario key, in the order `all` runs them.
pub const SCENARIO_KEYS: [&str; 11] = [
    "smoke",
    "classic-skilled",
    "survival-novice",
    "sudden-death",
    "lightning",
    "battle-rookie",
    "battle-oracle",
    "speed-race",
    "boss-rush",
    "deterministic",
    "daily",
];

pub fn get_scenario(name: &str, today: NaiveDate, pool: &QuestionPool) -> Option<TestScenario> {
    let scenario = match name.to_lowercase().as_str() {
        "smoke" => TestScenario::simulation(
            "Smoke Test",
            catalog::plan(
                SessionConfig::new(QuizMode::Classic, "math").with_target(5),
                AnswerStrategy::Perfect,
            )
            .with_expectation(catalog::flawless_win),
        ),
        "classic-skilled" | "classic" => TestScenario::simulation(
            "Classic - Skilled Player",
            catalog::plan(
                SessionConfig::new(QuizMode::Classic, "all").with_target(10),
                AnswerStrategy::Skilled,
            ),
        ),
        "survival-novice" | "survival" => TestScenario::simulation(
            "Survival - Novice Player",
            catalog::plan(
                SessionConfig::new(QuizMode::Survival, "all"),
                AnswerStrategy::Novice,
            )
            .with_expectation(catalog::survival_runs_until_stopped),
        ),
        "sudden-death" => TestScenario::simulation(
            "Sudden Death - Perfect Player",
            catalog::plan(
                SessionConfig::new(QuizMode::SuddenDeath, "science"),
                AnswerStrategy::Perfect,
            )
            .with_expectation(catalog::flawless_win),
        ),
        "lightning" => TestScenario::simulation(
            "Lightning - Guesser",
            catalog::plan(
                SessionConfig::new(QuizMode::Lightning, "all"),
                AnswerStrategy::Guesser,
            )
            .with_expectation(catalog::lightning_ends_on_time),
        ),
        "battle-rookie" | "battle" => TestScenario::simulation(
            "AI Battle - Skilled vs Rookie Bot",
            catalog::plan(
                SessionConfig::new(QuizMode::AiBattle, "history")
                    .with_target(10)
                    .with_opponent("rookie", BattleRule::Standard),
                AnswerStrategy::Skilled,
            )
            .with_expectation(catalog::battle_reported),
        ),
        "battle-oracle" | "oracle" => TestScenario::simulation(
            "AI Battle - Novice vs The Oracle",
            catalog::plan(
                SessionConfig::new(QuizMode::AiBattle, "geography")
                    .with_target(10)
                    .with_opponent("oracle", BattleRule::Standard),
                AnswerStrategy::Novice,
            )
            .with_expectation(catalog::battle_reported)
            .with_expectation(catalog::guaranteed_opponent_unscathed),
        ),
        "speed-race" => TestScenario::simulation(
            "Speed Race - Perfect vs The Oracle",
            catalog::plan(
                SessionConfig::new(QuizMode::AiBattle, "physics")
                    .with_target(10)
                    .with_opponent("oracle", BattleRule::SpeedRace),
                AnswerStrategy::Perfect,
            )
            .with_expectation(catalog::battle_reported)
            .with_expectation(catalog::speed_race_beaten),
        ),
        "boss-rush" | "boss" => TestScenario::simulation(
            "Boss Rush - Perfect Player",
            catalog::plan(
                SessionConfig::new(QuizMode::BossRush, "trivia"),
                AnswerStrategy::Perfect,
            )
            .as_boss_rush()
            .with_expectation(catalog::boss_rush_cleared),
        ),
        "deterministic" => TestScenario::simulation(
            "Deterministic Replay Verification",
            catalog::plan(
                SessionConfig::new(QuizMode::Classic, "all").with_target(15),
                AnswerStrategy::Skilled,
            )
            .with_replay_check()
            .with_expectation(catalog::replay_matches),
        ),
        "daily" => {
            let challenge = DailyChallenge::for_date(today, pool);
            TestScenario::simulation(
                format!("Daily Challenge {}", challenge.date),
                catalog::plan(challenge.session_config(), AnswerStrategy::Skilled).as_daily(),
            )
        }
        _ => return None,
    };
    Some(scenario)
}

pub fn list_scenarios() -> Vec<(&'static str, &'static str)> {
    vec![
        ("smoke", "Smoke Test"),
        ("classic-skilled", "Classic - Skilled Player"),
        ("survival-novice", "Survival - Novice Player"),
        ("sudden-death", "Sudden Death - Perfect Player"),
        ("lightning", "Lightning - Guesser"),
        ("battle-rookie", "AI Battle - Skilled vs Rookie Bot"),
        ("battle-oracle", "AI Battle - Novice vs The Oracle"),
        ("speed-race", "Speed Race - Perfect vs The Oracle"),
        ("boss-rush", "Boss Rush - Perfect Player"),
        ("deterministic", "Deterministic Replay Verification"),
        ("daily", "Today's Daily Challenge"),
    ]
}
