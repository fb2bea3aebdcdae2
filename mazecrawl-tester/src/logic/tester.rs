use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

use crate::common::scenario::TestScenario;
use crate::logic::game_tester::{GameTester, SimulationPlan, SimulationSummary};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub scenario_name: String,
    pub passed: bool,
    pub iterations_run: usize,
    pub successful_iterations: usize,
    pub failures: Vec<String>,
    #[serde(with = "duration_serde")]
    pub average_duration: Duration,
    #[serde(with = "duration_vec_serde")]
    pub performance_data: Vec<Duration>,
}

pub struct LogicTester {
    tester: GameTester,
}

impl LogicTester {
    pub const fn new(tester: GameTester) -> Self {
        Self { tester }
    }

    const fn verbose(&self) -> bool {
        self.tester.verbose()
    }

    pub fn run_scenario(
        &self,
        scenario: &TestScenario,
        seeds: &[u64],
        iterations: usize,
    ) -> Vec<ScenarioResult> {
        let mut results = Vec::new();

        for &seed in seeds {
            if self.verbose() {
                println!(
                    "🧪 Testing scenario: {} (difficulty: {} strategy: {} seed: {})",
                    scenario.name.bright_white(),
                    scenario.plan.difficulty,
                    scenario.plan.strategy,
                    seed
                );
            }

            let result = self.run_single_scenario(scenario, seed, iterations);
            results.push(result);
        }

        results
    }

    fn run_single_scenario(
        &self,
        scenario: &TestScenario,
        seed: u64,
        iterations: usize,
    ) -> ScenarioResult {
        let (successes, failures, performance_data) =
            self.run_simulation_iterations(&scenario.plan, seed, iterations);

        let avg_duration = if performance_data.is_empty() {
            Duration::ZERO
        } else {
            performance_data.iter().sum::<Duration>()
                / u32::try_from(performance_data.len()).unwrap_or(1)
        };

        ScenarioResult {
            scenario_name: scenario.name.clone(),
            passed: failures.is_empty(),
            iterations_run: iterations,
            successful_iterations: successes,
            failures,
            average_duration: avg_duration,
            performance_data,
        }
    }

    fn run_simulation_iterations(
        &self,
        plan: &SimulationPlan,
        seed: u64,
        iterations: usize,
    ) -> (usize, Vec<String>, Vec<Duration>) {
        let mut successes = 0;
        let mut failures = Vec::new();
        let mut performance_data = Vec::new();

        for i in 0..iterations {
            let start_time = Instant::now();
            let iteration_seed = seed.wrapping_add(u64::try_from(i).unwrap_or(u64::MAX));

            let summary = match self.tester.run_plan(plan, iteration_seed) {
                Ok(summary) => summary,
                Err(err) => {
                    failures.push(format!(
                        "Iteration {} ({} {}, seed {}): run aborted: {err:#}",
                        i + 1,
                        plan.difficulty,
                        plan.strategy,
                        iteration_seed
                    ));
                    continue;
                }
            };

            if let Some(err) = evaluate_expectations(plan, &summary) {
                let metrics = &summary.metrics;
                failures.push(format!(
                    "Iteration {} ({} {}, seed {}, inputs {}, collected {}/{}, status {}): {} | {}",
                    i + 1,
                    summary.difficulty,
                    summary.strategy,
                    summary.seed,
                    metrics.inputs,
                    metrics.collected,
                    metrics.collectible_total,
                    status_label(&summary),
                    err,
                    summarize_violations(&summary)
                ));

                if self.verbose() {
                    println!(
                        "  ❌ Iteration {}/{} failed: {}",
                        i + 1,
                        iterations,
                        err.clone().red()
                    );
                }
            } else {
                successes += 1;
                let duration = start_time.elapsed();
                performance_data.push(duration);

                if self.verbose() {
                    println!(
                        "  ✅ Iteration {}/{} passed ({duration:?}) inputs:{} explored:{}% status:{}",
                        i + 1,
                        iterations,
                        summary.metrics.inputs,
                        summary.metrics.explored_percent,
                        status_label(&summary)
                    );
                }
            }
        }

        (successes, failures, performance_data)
    }
}

fn evaluate_expectations(plan: &SimulationPlan, summary: &SimulationSummary) -> Option<String> {
    for expectation in &plan.expectations {
        if let Err(err) = expectation.evaluate(summary) {
            return Some(format!("{err:#}"));
        }
    }
    None
}

const fn status_label(summary: &SimulationSummary) -> &'static str {
    if summary.metrics.completed {
        "completed"
    } else {
        "halted"
    }
}

fn summarize_violations(summary: &SimulationSummary) -> String {
    if summary.violations.is_empty() {
        return "no rule violations recorded".to_string();
    }

    summary
        .violations
        .iter()
        .take(3)
        .cloned()
        .collect::<Vec<_>>()
        .join(" | ")
}

mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_millis().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u128::deserialize(deserializer)?;
        Ok(Duration::from_millis(u64::try_from(millis).unwrap_or(0)))
    }
}

mod duration_vec_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(durations: &[Duration], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let millis: Vec<u128> = durations.iter().map(Duration::as_millis).collect();
        millis.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis_vec = Vec::<u128>::deserialize(deserializer)?;
        Ok(millis_vec
            .into_iter()
            .map(|m| Duration::from_millis(u64::try_from(m).unwrap_or(0)))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::scenario::get_scenario;

    #[test]
    fn smoke_scenario_passes_for_each_seed() {
        let tester = LogicTester::new(GameTester::try_new(false));
        let scenario = get_scenario("smoke").unwrap();
        let results = tester.run_scenario(&scenario, &[1, 2], 2);
        assert_eq!(results.len(), 2);
        for result in results {
            assert!(result.passed, "{:?}", result.failures);
            assert_eq!(result.successful_iterations, 2);
            assert_eq!(result.performance_data.len(), 2);
        }
    }

    #[test]
    fn failing_expectation_is_reported_per_iteration() {
        let tester = LogicTester::new(GameTester::try_new(false));
        let plan = SimulationPlan::new(
            mazecrawl_game::Difficulty::Easy,
            crate::logic::GameplayStrategy::RandomWalk,
        )
        .with_max_inputs(1)
        .with_expectation(|_: &SimulationSummary| -> anyhow::Result<()> {
            anyhow::bail!("always fails")
        });
        let scenario = TestScenario::simulation("Always Fails", plan);
        let results = tester.run_scenario(&scenario, &[10], 3);
        let result = &results[0];
        assert!(!result.passed);
        assert_eq!(result.successful_iterations, 0);
        assert_eq!(result.failures.len(), 3);
        assert!(result.failures[0].starts_with("Iteration 1 (easy Random Walk, seed 10"));
        assert!(result.failures[2].contains("seed 12"));
        assert_eq!(result.average_duration, Duration::ZERO);
    }

    #[test]
    fn scenario_result_serializes_durations_as_millis() {
        let result = ScenarioResult {
            scenario_name: "Smoke".to_string(),
            passed: true,
            iterations_run: 1,
            successful_iterations: 1,
            failures: Vec::new(),
            average_duration: Duration::from_millis(42),
            performance_data: vec![Duration::from_millis(42), Duration::from_millis(7)],
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["average_duration"], 42);
        assert_eq!(json["performance_data"][1], 7);
        let back: ScenarioResult = serde_json::from_value(json).unwrap();
        assert_eq!(back.average_duration, Duration::from_millis(42));
    }
}
