mod common;
mod logic;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use mazecrawl_game::Difficulty;
use std::fs::File;
use std::io::{BufWriter, Write, stdout};
use std::path::PathBuf;
use std::time::Instant;

use common::scenario::{get_scenario, list_scenarios};
use common::{load_presets, parse_difficulties, split_csv};
use logic::{
    GameTester, LogicTester, PlayabilityAggregate, PlayabilityRecord, SeedInfo,
    aggregate_playability, resolve_seed_inputs, run_playability_analysis,
    validate_playability_targets,
};

#[derive(Debug, Parser)]
#[command(name = "mazecrawl-tester", version = "0.1.0")]
#[command(about = "Headless QA runner for the Mazecrawl engine")]
struct Args {
    /// Scenarios to run (comma-separated, `all` for every scenario)
    #[arg(long, default_value = "smoke")]
    scenarios: String,

    /// List all available scenarios and exit
    #[arg(long)]
    list_scenarios: bool,

    /// Seeds to run (comma-separated numbers or share codes)
    #[arg(long, default_value = "1337")]
    seeds: String,

    /// Number of iterations per scenario and seed
    #[arg(long, default_value_t = 10)]
    iterations: usize,

    /// Difficulty tiers for playability analysis (comma-separated or `all`)
    #[arg(long, default_value = "all")]
    difficulties: String,

    /// JSON file overriding the difficulty presets
    #[arg(long)]
    presets: Option<PathBuf>,

    /// Output report format
    #[arg(long, default_value = "console")]
    #[arg(value_parser = ["json", "markdown", "console", "csv"])]
    report: String,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Optional path to write the report output instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    if maybe_list_scenarios(&args)? {
        return Ok(());
    }

    announce_banner();

    let start_time = Instant::now();
    let scenarios = expand_scenarios(&args.scenarios);
    let seed_tokens = split_csv(&args.seeds);
    let seed_infos = resolve_seed_inputs(&seed_tokens)?;
    let logic_seeds: Vec<u64> = seed_infos.iter().map(|s| s.seed).collect();
    let difficulties = parse_difficulties(&args.difficulties)?;
    let table = load_presets(args.presets.as_deref())?;
    let game_tester = GameTester::new(table, args.verbose);

    let all_results = run_logic_scenarios(&args, &scenarios, &logic_seeds, &game_tester);

    let (playability_records, playability_aggregates) =
        gather_playability(&args, &game_tester, &seed_infos, &difficulties)?;

    write_reports(
        &args,
        &all_results,
        playability_records.as_deref(),
        playability_aggregates.as_deref(),
        start_time,
    )?;

    if let Some(aggregates) = playability_aggregates.as_ref() {
        validate_playability_targets(aggregates)?;
    }

    if all_results.iter().any(|r| !r.passed) {
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
        writeln!(output_target.writer(), "  {key:25} - {description}")?;
    }
    output_target.flush_inner()?;
    Ok(true)
}

fn announce_banner() {
    println!("{}", "🧭 Mazecrawl Automated Tester".bright_cyan().bold());
    println!("{}", "=============================".cyan());
}

fn expand_scenarios(scenarios_arg: &str) -> Vec<String> {
    let mut scenarios = split_csv(scenarios_arg);
    if scenarios.iter().any(|s| s.eq_ignore_ascii_case("all")) {
        scenarios.retain(|s| !s.eq_ignore_ascii_case("all"));
        for (key, _) in list_scenarios() {
            if !scenarios.iter().any(|s| s == key) {
                scenarios.push(key.to_string());
            }
        }
    }
    scenarios
}

fn run_logic_scenarios(
    args: &Args,
    scenarios: &[String],
    logic_seeds: &[u64],
    game_tester: &GameTester,
) -> Vec<logic::ScenarioResult> {
    let mut results: Vec<logic::ScenarioResult> = Vec::new();

    println!("{}", "🧠 Running Logic Tests".bright_yellow().bold());
    println!("{}", "-".repeat(30).yellow());

    let logic_tester = LogicTester::new(game_tester.clone());

    for scenario_name in scenarios {
        if let Some(scenario) = get_scenario(scenario_name) {
            let scenario_results =
                logic_tester.run_scenario(&scenario, logic_seeds, args.iterations);
            results.extend(scenario_results);
        } else {
            eprintln!("⚠️  Unknown scenario: {}", scenario_name.yellow());
        }
    }

    results
}

type PlayabilitySummary = (
    Option<Vec<PlayabilityRecord>>,
    Option<Vec<PlayabilityAggregate>>,
);

fn gather_playability(
    args: &Args,
    game_tester: &GameTester,
    seed_infos: &[SeedInfo],
    difficulties: &[Difficulty],
) -> Result<PlayabilitySummary> {
    if !matches!(args.report.as_str(), "console" | "csv") {
        return Ok((None, None));
    }

    let playability =
        run_playability_analysis(game_tester, seed_infos, difficulties, args.iterations)?;
    let aggregates = aggregate_playability(&playability);
    Ok((Some(playability), Some(aggregates)))
}

fn write_reports(
    args: &Args,
    results: &[logic::ScenarioResult],
    playability_records: Option<&[PlayabilityRecord]>,
    playability_aggregates: Option<&[PlayabilityAggregate]>,
    start_time: Instant,
) -> Result<()> {
    let mut output_target = OutputTarget::new(args.output.clone())?;

    match args.report.as_str() {
        "json" => {
            if results.is_empty() {
                writeln!(&mut output_target, "[]")?;
            } else {
                logic::reports::generate_json_report(&mut output_target, results)?;
            }
        }
        "markdown" => {
            if results.is_empty() {
                writeln!(
                    &mut output_target,
                    "# Mazecrawl Logic Test Results\n\n_No scenarios executed._"
                )?;
            } else {
                logic::reports::generate_markdown_report(&mut output_target, results)?;
            }
        }
        "csv" => {
            if let Some(records) = playability_records {
                logic::reports::generate_csv_report(&mut output_target, records)?;
            } else {
                writeln!(&mut output_target, "[]")?;
            }
        }
        _ => {
            let duration = start_time.elapsed();
            if results.is_empty() {
                writeln!(&mut output_target, "No logic scenarios executed.")?;
            } else if let Some(aggregates) = playability_aggregates {
                logic::reports::generate_console_report(
                    &mut output_target,
                    results,
                    aggregates,
                    duration,
                )?;
            } else {
                writeln!(&mut output_target, "Playability data unavailable.")?;
            }
        }
    }

    if args.report == "console" {
        let duration = start_time.elapsed();
        writeln!(&mut output_target)?;
        writeln!(&mut output_target, "🏁 Total time: {duration:?}")?;
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::game_tester::PlayabilityMetrics;
    use crate::logic::{GameplayStrategy, ScenarioResult};
    use std::io::Write;
    use std::time::Duration;

    fn base_args() -> Args {
        Args {
            scenarios: "smoke".to_string(),
            list_scenarios: false,
            seeds: "1337".to_string(),
            iterations: 1,
            difficulties: "all".to_string(),
            presets: None,
            report: "json".to_string(),
            verbose: false,
            output: None,
        }
    }

    fn temp_path(label: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "mazecrawl-{label}-{}",
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_nanos()
        ))
    }

    fn sample_record() -> PlayabilityRecord {
        PlayabilityRecord {
            scenario_name: "Easy - Planner".to_string(),
            difficulty: Difficulty::Easy,
            strategy: GameplayStrategy::Planner,
            seed_code: "EZ-LANTERN42".to_string(),
            seed_value: 42,
            metrics: PlayabilityMetrics {
                inputs: 80,
                moves: 40,
                turns: 40,
                collected: 2,
                collectible_total: 2,
                completed: true,
                reached_goal: true,
                explored_percent: 70,
                elapsed: Duration::from_secs(20),
                ..PlayabilityMetrics::default()
            },
        }
    }

    fn sample_aggregate() -> PlayabilityAggregate {
        PlayabilityAggregate {
            scenario_name: "Easy - Planner".to_string(),
            difficulty: Difficulty::Easy,
            strategy: GameplayStrategy::Planner,
            iterations: 1,
            completion_rate: 1.0,
            goal_reach_rate: 1.0,
            mean_inputs: 80.0,
            std_inputs: 0.0,
            mean_blocked: 0.0,
            mean_explored_pct: 70.0,
            mean_elapsed_secs: 20.0,
            std_elapsed_secs: 0.0,
        }
    }

    fn sample_result(passed: bool) -> ScenarioResult {
        ScenarioResult {
            scenario_name: "Smoke".to_string(),
            passed,
            iterations_run: 3,
            successful_iterations: if passed { 3 } else { 2 },
            failures: if passed {
                Vec::new()
            } else {
                vec!["failure".to_string()]
            },
            average_duration: Duration::from_millis(10),
            performance_data: vec![Duration::from_millis(10)],
        }
    }

    #[test]
    fn expands_all_scenarios_keyword() {
        let expanded = expand_scenarios("smoke,all");
        assert_eq!(expanded[0], "smoke");
        assert_eq!(expanded.len(), list_scenarios().len());
        assert!(expanded.contains(&"full-run-wall-follower".to_string()));
    }

    #[test]
    fn expand_scenarios_without_all_preserves_order() {
        let expanded = expand_scenarios("goal-gating,smoke");
        assert_eq!(
            expanded,
            vec!["goal-gating".to_string(), "smoke".to_string()]
        );
    }

    #[test]
    fn run_logic_scenarios_skips_unknown_names() {
        let tester = GameTester::try_new(false);
        let args = base_args();
        let results = run_logic_scenarios(
            &args,
            &["smoke".to_string(), "weather".to_string()],
            &[42],
            &tester,
        );
        assert_eq!(results.len(), 1);
        assert!(results[0].passed, "{:?}", results[0].failures);
    }

    #[test]
    fn gather_playability_returns_none_for_json() {
        let tester = GameTester::try_new(false);
        let args = base_args();
        let seeds = vec![SeedInfo::from_numeric(42)];
        let (records, aggregates) =
            gather_playability(&args, &tester, &seeds, &[Difficulty::Easy]).unwrap();
        assert!(records.is_none());
        assert!(aggregates.is_none());
    }

    #[test]
    fn gather_playability_runs_for_csv() {
        let tester = GameTester::try_new(false);
        let args = Args {
            report: "csv".to_string(),
            ..base_args()
        };
        let seeds = vec![SeedInfo::from_numeric(42)];
        let (records, aggregates) =
            gather_playability(&args, &tester, &seeds, &[Difficulty::Easy]).unwrap();
        assert_eq!(records.unwrap().len(), GameplayStrategy::ALL.len());
        assert_eq!(aggregates.unwrap().len(), GameplayStrategy::ALL.len());
    }

    #[test]
    fn write_reports_emits_json_output() {
        let temp = temp_path("report.json");
        let args = Args {
            output: Some(temp.clone()),
            ..base_args()
        };
        write_reports(&args, &[], None, None, Instant::now()).unwrap();
        let content = std::fs::read_to_string(&temp).unwrap();
        assert_eq!(content.trim(), "[]");
        let _ = std::fs::remove_file(temp);
    }

    #[test]
    fn maybe_list_scenarios_writes_output() {
        let temp = temp_path("scenarios.txt");
        let args = Args {
            list_scenarios: true,
            output: Some(temp.clone()),
            ..base_args()
        };
        assert!(maybe_list_scenarios(&args).unwrap());
        let content = std::fs::read_to_string(&temp).unwrap();
        assert!(content.contains("Available scenarios"));
        assert!(content.contains("goal-gating"));
        let _ = std::fs::remove_file(temp);
    }

    #[test]
    fn maybe_list_scenarios_returns_false_when_disabled() {
        let args = base_args();
        assert!(!maybe_list_scenarios(&args).unwrap());
    }

    #[test]
    fn write_reports_markdown_empty_results() {
        let temp = temp_path("report.md");
        let args = Args {
            report: "markdown".to_string(),
            output: Some(temp.clone()),
            ..base_args()
        };
        write_reports(&args, &[], None, None, Instant::now()).unwrap();
        let content = std::fs::read_to_string(&temp).unwrap();
        assert!(content.contains("No scenarios executed"));
        let _ = std::fs::remove_file(temp);
    }

    #[test]
    fn write_reports_emits_markdown_report() {
        let temp = temp_path("report-full.md");
        let args = Args {
            report: "markdown".to_string(),
            output: Some(temp.clone()),
            ..base_args()
        };
        write_reports(&args, &[sample_result(false)], None, None, Instant::now()).unwrap();
        let content = std::fs::read_to_string(&temp).unwrap();
        assert!(content.contains("# Mazecrawl Logic Test Results"));
        assert!(content.contains("Smoke"));
        assert!(content.contains("  - failure"));
        let _ = std::fs::remove_file(temp);
    }

    #[test]
    fn write_reports_emits_json_for_results() {
        let temp = temp_path("report-full.json");
        let args = Args {
            output: Some(temp.clone()),
            ..base_args()
        };
        write_reports(&args, &[sample_result(true)], None, None, Instant::now()).unwrap();
        let content = std::fs::read_to_string(&temp).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(parsed[0]["scenario_name"], "Smoke");
        assert_eq!(parsed[0]["average_duration"], 10);
        let _ = std::fs::remove_file(temp);
    }

    #[test]
    fn write_reports_emits_csv_report() {
        let temp = temp_path("report.csv");
        let args = Args {
            report: "csv".to_string(),
            output: Some(temp.clone()),
            ..base_args()
        };
        write_reports(&args, &[], Some(&[sample_record()]), None, Instant::now()).unwrap();
        let content = std::fs::read_to_string(&temp).unwrap();
        assert!(content.starts_with("scenario,difficulty,strategy"));
        assert!(content.contains("Easy - Planner,easy,Planner,EZ-LANTERN42,42,true"));
        let _ = std::fs::remove_file(temp);
    }

    #[test]
    fn write_reports_emits_console_report_with_playability() {
        let temp = temp_path("report-console.txt");
        let args = Args {
            report: "console".to_string(),
            output: Some(temp.clone()),
            ..base_args()
        };
        write_reports(
            &args,
            &[sample_result(true)],
            None,
            Some(&[sample_aggregate()]),
            Instant::now(),
        )
        .unwrap();
        let content = std::fs::read_to_string(&temp).unwrap();
        assert!(content.contains("Playability Summary"));
        assert!(content.contains("Total time"));
        let _ = std::fs::remove_file(temp);
    }

    #[test]
    fn write_reports_console_without_playability() {
        let temp = temp_path("report.txt");
        let args = Args {
            report: "console".to_string(),
            output: Some(temp.clone()),
            ..base_args()
        };
        write_reports(&args, &[sample_result(true)], None, None, Instant::now()).unwrap();
        let content = std::fs::read_to_string(&temp).unwrap();
        assert!(content.contains("Playability data unavailable"));
        let _ = std::fs::remove_file(temp);
    }

    #[test]
    fn output_target_stdout_writes() {
        let mut target = OutputTarget::new(None).unwrap();
        target.write_all(b"ok").unwrap();
        target.flush().unwrap();
    }

    #[test]
    fn output_target_reports_bad_path() {
        let bad = temp_path("missing-dir").join("nested").join("report.txt");
        assert!(OutputTarget::new(Some(bad)).is_err());
    }
}
