mod common;
mod logic;
mod store;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::Parser;
use colored::Colorize;
use std::fs::File;
use std::io::{BufWriter, Write, stdout};
use std::path::PathBuf;
use std::time::Instant;

use common::scenario::{SCENARIO_KEYS, get_scenario, list_scenarios};
use common::split_csv;
use logic::{LogicTester, QuizTester, TesterAssets, resolve_seed_inputs};
use store::FileStore;
use trivia_game::ProfileGateway;

#[derive(Debug, Parser)]
#[command(name = "trivia-tester", version = "0.1.0")]
#[command(about = "Automated QA testing for the Trivia Rush quiz engine")]
struct Args {
    /// Scenarios to run (comma-separated, `all` for every scenario)
    #[arg(long, default_value = "smoke")]
    scenarios: String,

    /// List all available scenarios and exit
    #[arg(long)]
    list_scenarios: bool,

    /// Seeds to run (comma-separated integers, 0x hex, or `daily`)
    #[arg(long, default_value = "1337")]
    seeds: String,

    /// Number of iterations per scenario and seed
    #[arg(long, default_value_t = 10)]
    iterations: usize,

    /// Output report format
    #[arg(long, default_value = "console")]
    #[arg(value_parser = ["json", "markdown", "console"])]
    report: String,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Optional path to write the report output instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,

    /// JSON file overriding the bundled quiz tuning config
    #[arg(long)]
    config: Option<PathBuf>,

    /// Record every finished session into a profile stored in this directory
    #[arg(long)]
    profile_dir: Option<PathBuf>,

    /// Pace simulated sessions against the wall clock
    #[arg(long)]
    realtime: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    if maybe_list_scenarios(&args)? {
        return Ok(());
    }

    announce_banner();

    let start_time = Instant::now();
    let today = Local::now().date_naive();
    let assets = TesterAssets::load(args.config.as_deref())?;
    let scenarios = expand_scenarios(&args.scenarios);
    let seeds = resolve_seed_inputs(&split_csv(&args.seeds), today, &assets.pool)?;

    let mut quiz_tester = QuizTester::new(assets, args.verbose).with_realtime(args.realtime);
    if let Some(dir) = args.profile_dir.as_ref() {
        let store = FileStore::open(dir)
            .with_context(|| format!("failed to open profile dir {}", dir.display()))?;
        println!("📁 Recording sessions to {}", store.root().display());
        quiz_tester = quiz_tester.with_recorder(ProfileGateway::new(store), today);
    }

    let logic_tester = LogicTester::new(quiz_tester, args.verbose);
    let results = run_logic_scenarios(&args, &scenarios, &seeds, &logic_tester, today).await;

    write_reports(&args, &results, start_time)?;

    if results.iter().any(|r| !r.passed) {
        std::process::exit(1);
    }

    Ok(())
}

fn maybe_list_scenarios(args: &Args) -> Result<bool> {
    if !args.list_scenarios {
        return Ok(false);
    }
    let mut output_target = OutputTarget::new(args.output.clone())?;
    writeln!(output_target.writer(), "Available scenarios:")?;
    for (key, description) in list_scenarios() {
        writeln!(output_target.writer(), "  {key:20} - {description}")?;
    }
    output_target.flush_inner()?;
    Ok(true)
}

fn announce_banner() {
    println!("{}", "🧠 Trivia Rush Automated Tester".bright_cyan().bold());
    println!("{}", "================================".cyan());
}

fn expand_scenarios(scenarios_arg: &str) -> Vec<String> {
    let mut scenarios = split_csv(scenarios_arg);
    if scenarios.iter().any(|s| s.eq_ignore_ascii_case("all")) {
        scenarios.retain(|s| !s.eq_ignore_ascii_case("all"));
        for key in SCENARIO_KEYS {
            if !scenarios.iter().any(|s| s == key) {
                scenarios.push(key.to_string());
            }
        }
    }
    scenarios
}

async fn run_logic_scenarios(
    args: &Args,
    scenarios: &[String],
    seeds: &[u64],
    logic_tester: &LogicTester,
    today: NaiveDate,
) -> Vec<logic::ScenarioResult> {
    let mut results: Vec<logic::ScenarioResult> = Vec::new();

    println!("{}", "🧪 Running Logic Tests".bright_yellow().bold());
    println!("{}", "-".repeat(30).yellow());

    let pool = &logic_tester.tester().assets().pool;
    for scenario_name in scenarios {
        if let Some(scenario) = get_scenario(scenario_name, today, pool) {
            let scenario_results = logic_tester
                .run_scenario(&scenario, seeds, args.iterations)
                .await;
            results.extend(scenario_results);
        } else {
            eprintln!("⚠️  Unknown scenario: {}", scenario_name.yellow());
        }
    }

    results
}

fn write_reports(
    args: &Args,
    results: &[logic::ScenarioResult],
    start_time: Instant,
) -> Result<()> {
    let mut output_target = OutputTarget::new(args.output.clone())?;

    match args.report.as_str() {
        "json" => {
            logic::reports::generate_json_report(&mut output_target, results)?;
        }
        "markdown" => {
            if results.is_empty() {
                writeln!(
                    &mut output_target,
                    "# Trivia Logic Test Results\n\n_No scenarios executed._"
                )?;
            } else {
                logic::reports::generate_markdown_report(&mut output_target, results)?;
            }
        }
        _ => {
            if results.is_empty() {
                writeln!(&mut output_target, "No logic scenarios executed.")?;
            } else {
                logic::reports::generate_console_report(
                    &mut output_target,
                    results,
                    start_time.elapsed(),
                )?;
            }
            let duration = start_time.elapsed();
            writeln!(&mut output_target)?;
            writeln!(&mut output_target, "🏁 Total time: {duration:?}")?;
        }
    }

    output_target.flush_inner()?;
    Ok(())
}

enum OutputTarget {
    Stdout(BufWriter<std::io::Stdout>),
    File(BufWriter<File>),
}

impl OutputTarget {
    fn new(path: Option<PathBuf>) -> Result<Self> {
        if let Some(path) = path {
            let file = File::create(&path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            Ok(Self::File(BufWriter::new(file)))
        } else {
            Ok(Self::Stdout(BufWriter::new(stdout())))
        }
    }

    fn writer(&mut self) -> &mut dyn Write {
        match self {
            Self::Stdout(w) => w,
            Self::File(w) => w,
        }
    }

    fn flush_inner(&mut self) -> std::io::Result<()> {
        match self {
            Self::Stdout(w) => w.flush(),
            Self::File(w) => w.flush(),
        }
    }
}

impl Write for OutputTarget {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.writer().write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.flush_inner()
    }
}
