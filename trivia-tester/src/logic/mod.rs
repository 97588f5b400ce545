pub mod policy;
pub mod quiz_tester;
pub mod reports;
pub mod seeds;
pub mod simulation;
pub mod tester;

pub use policy::AnswerStrategy;
pub use quiz_tester::{QuizTester, SimulationPlan, SimulationSummary, TesterAssets};
pub use seeds::resolve_seed_inputs;
pub use tester::*;
