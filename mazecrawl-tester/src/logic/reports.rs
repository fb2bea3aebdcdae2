use anyhow::Result;
use chrono::Utc;
use colored::Colorize;
use std::io::Write;
use std::time::Duration;

use super::ScenarioResult;
use super::playability::{PlayabilityAggregate, PlayabilityRecord};

#[allow(clippy::cast_precision_loss)]
fn success_rate(results: &[ScenarioResult]) -> f64 {
    if results.is_empty() {
        return 0.0;
    }
    let passed = results.iter().filter(|r| r.passed).count();
    (passed as f64 / results.len() as f64) * 100.0
}

pub fn generate_console_report(
    out: &mut dyn Write,
    results: &[ScenarioResult],
    aggregates: &[PlayabilityAggregate],
    total_duration: Duration,
) -> Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", "📊 Logic Test Results Summary".bright_cyan().bold())?;
    writeln!(out, "{}", "==============================".cyan())?;

    let total_tests = results.len();
    let passed_tests = results.iter().filter(|r| r.passed).count();
    let failed_tests = total_tests - passed_tests;

    // Overall stats
    writeln!(out, "Total scenarios: {total_tests}")?;
    writeln!(out, "Passed: {}", passed_tests.to_string().green())?;
    writeln!(out, "Failed: {}", failed_tests.to_string().red())?;
    writeln!(out, "Success rate: {:.1}%", success_rate(results))?;
    writeln!(out, "Total time: {total_duration:?}")?;
    writeln!(out)?;

    // Individual results
    for result in results {
        let status = if result.passed {
            "✅ PASS".green()
        } else {
            "❌ FAIL".red()
        };

        writeln!(out, "{} {}", status, result.scenario_name.bold())?;
        writeln!(
            out,
            "   Iterations: {}/{} successful",
            result.successful_iterations, result.iterations_run
        )?;
        writeln!(out, "   Average time: {:?}", result.average_duration)?;

        if !result.failures.is_empty() {
            writeln!(out, "   Failures:")?;
            for failure in &result.failures {
                writeln!(out, "     • {}", failure.red())?;
            }
        }
        writeln!(out)?;
    }

    let fastest = results.iter().min_by_key(|r| r.average_duration);
    let slowest = results.iter().max_by_key(|r| r.average_duration);
    if let (Some(fastest), Some(slowest)) = (fastest, slowest) {
        writeln!(out, "{}", "⚡ Performance Summary".bright_yellow().bold())?;
        writeln!(out, "{}", "=====================".yellow())?;
        writeln!(
            out,
            "Fastest: {} ({:?})",
            fastest.scenario_name.green(),
            fastest.average_duration
        )?;
        writeln!(
            out,
            "Slowest: {} ({:?})",
            slowest.scenario_name.yellow(),
            slowest.average_duration
        )?;
        writeln!(out)?;
    }

    write_playability_summary(out, aggregates)
}

fn write_playability_summary(out: &mut dyn Write, aggregates: &[PlayabilityAggregate]) -> Result<()> {
    writeln!(out, "{}", "🗺️  Playability Summary".bright_magenta().bold())?;
    writeln!(out, "{}", "======================".magenta())?;
    if aggregates.is_empty() {
        writeln!(out, "No playability runs recorded.")?;
        return Ok(());
    }

    writeln!(
        out,
        "{:<24} {:>5} {:>9} {:>7} {:>10} {:>9} {:>9} {:>10}",
        "scenario", "runs", "complete", "goal", "inputs", "blocked", "explored", "elapsed"
    )?;
    for aggregate in aggregates {
        writeln!(
            out,
            "{:<24} {:>5} {:>8.1}% {:>6.1}% {:>10.1} {:>9.1} {:>8.1}% {:>9.1}s",
            aggregate.scenario_name,
            aggregate.iterations,
            aggregate.completion_rate * 100.0,
            aggregate.goal_reach_rate * 100.0,
            aggregate.mean_inputs,
            aggregate.mean_blocked,
            aggregate.mean_explored_pct,
            aggregate.mean_elapsed_secs
        )?;
    }
    Ok(())
}

pub fn generate_json_report(out: &mut dyn Write, results: &[ScenarioResult]) -> Result<()> {
    let json_output = serde_json::to_string_pretty(results)?;
    writeln!(out, "{json_output}")?;
    Ok(())
}

pub fn generate_markdown_report(out: &mut dyn Write, results: &[ScenarioResult]) -> Result<()> {
    writeln!(out, "# Mazecrawl Logic Test Results\n")?;
    writeln!(
        out,
        "_Generated {}_\n",
        Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
    )?;

    let total_tests = results.len();
    let passed_tests = results.iter().filter(|r| r.passed).count();
    let failed_tests = total_tests - passed_tests;

    writeln!(out, "## Summary\n")?;
    writeln!(out, "- **Total scenarios**: {total_tests}")?;
    writeln!(out, "- **Passed**: {passed_tests}")?;
    writeln!(out, "- **Failed**: {failed_tests}")?;
    writeln!(out, "- **Success rate**: {:.1}%\n", success_rate(results))?;

    writeln!(out, "## Detailed Results\n")?;

    for result in results {
        let status = if result.passed { "✅" } else { "❌" };

        writeln!(out, "### {} {}\n", status, result.scenario_name)?;
        writeln!(
            out,
            "- **Iterations**: {}/{} successful",
            result.successful_iterations, result.iterations_run
        )?;
        writeln!(out, "- **Average time**: {:?}", result.average_duration)?;

        if !result.failures.is_empty() {
            writeln!(out, "- **Failures**:")?;
            for failure in &result.failures {
                writeln!(out, "  - {failure}")?;
            }
        }
        writeln!(out)?;
    }
    Ok(())
}

pub fn generate_csv_report(out: &mut dyn Write, records: &[PlayabilityRecord]) -> Result<()> {
    writeln!(
        out,
        "scenario,difficulty,strategy,seed_code,seed,completed,reached_goal,inputs,moves,turns,blocked,collected,collectible_total,explored_pct,elapsed_ms"
    )?;
    for record in records {
        let metrics = &record.metrics;
        writeln!(
            out,
            "{},{},{},{},{},{},{},{},{},{},{},{},{},{},{}",
            record.scenario_name,
            record.difficulty,
            record.strategy,
            record.seed_code,
            record.seed_value,
            metrics.completed,
            metrics.reached_goal,
            metrics.inputs,
            metrics.moves,
            metrics.turns,
            metrics.blocked,
            metrics.collected,
            metrics.collectible_total,
            metrics.explored_percent,
            metrics.elapsed.as_millis()
        )?;
    }
    Ok(())
}
