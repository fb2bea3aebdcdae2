use anyhow::{Context, Result, ensure};
use std::collections::BTreeMap;

use mazecrawl_game::Difficulty;

use crate::common::scenario::catalog::no_violations_expectation;
use crate::logic::game_tester::{PlayabilityMetrics, SimulationPlan};
use crate::logic::seeds::SeedInfo;
use crate::logic::{GameTester, GameplayStrategy};

#[derive(Debug, Clone)]
pub struct PlayabilityRecord {
    pub scenario_name: String,
    pub difficulty: Difficulty,
    pub strategy: GameplayStrategy,
    pub seed_code: String,
    pub seed_value: u64,
    pub metrics: PlayabilityMetrics,
}

#[derive(Debug, Clone)]
pub struct PlayabilityAggregate {
    pub scenario_name: String,
    pub difficulty: Difficulty,
    pub strategy: GameplayStrategy,
    pub iterations: usize,
    pub completion_rate: f64,
    pub goal_reach_rate: f64,
    pub mean_inputs: f64,
    pub std_inputs: f64,
    pub mean_blocked: f64,
    pub mean_explored_pct: f64,
    pub mean_elapsed_secs: f64,
    pub std_elapsed_secs: f64,
}

fn playability_plan(difficulty: Difficulty, strategy: GameplayStrategy) -> SimulationPlan {
    SimulationPlan::new(difficulty, strategy).with_expectation(no_violations_expectation)
}

/// Play every difficulty × strategy pair for each matching seed.
///
/// # Errors
///
/// Returns an error when a run cannot be built or breaks a movement rule.
pub fn run_playability_analysis(
    tester: &GameTester,
    seeds: &[SeedInfo],
    difficulties: &[Difficulty],
    iterations: usize,
) -> Result<Vec<PlayabilityRecord>> {
    let iterations = iterations.max(1);
    let mut records = Vec::with_capacity(
        seeds.len() * difficulties.len() * GameplayStrategy::ALL.len() * iterations,
    );

    for &difficulty in difficulties {
        for strategy in GameplayStrategy::ALL {
            let plan = playability_plan(difficulty, strategy);
            for seed in seeds.iter().filter(|seed| seed.matches_difficulty(difficulty)) {
                for iteration in 0..iterations {
                    let iteration_offset = u64::try_from(iteration).unwrap_or(0);
                    let iteration_seed = seed.seed.wrapping_add(iteration_offset);
                    #[rustfmt::skip]
                    let context = format!("Playability run failed for {difficulty}, strategy {strategy}, seed {} (iteration {})", seed.seed, iteration + 1);
                    let summary = tester
                        .run_plan(&plan, iteration_seed)
                        .with_context(|| context.clone())?;
                    for expectation in &plan.expectations {
                        expectation
                            .evaluate(&summary)
                            .with_context(|| context.clone())?;
                    }

                    let seed_code = if iteration == 0 {
                        seed.share_code_for(difficulty)
                    } else {
                        mazecrawl_game::encode_friendly(difficulty, iteration_seed)
                    };

                    records.push(PlayabilityRecord {
                        scenario_name: scenario_label(difficulty, strategy),
                        difficulty,
                        strategy,
                        seed_code,
                        seed_value: iteration_seed,
                        metrics: summary.metrics,
                    });
                }
            }
        }
    }

    Ok(records)
}

pub fn aggregate_playability(records: &[PlayabilityRecord]) -> Vec<PlayabilityAggregate> {
    let mut aggregates: BTreeMap<(Difficulty, GameplayStrategy), AggregateBuilder> =
        BTreeMap::new();

    for record in records {
        aggregates
            .entry((record.difficulty, record.strategy))
            .or_insert_with(|| AggregateBuilder::new(record))
            .ingest(&record.metrics);
    }

    aggregates
        .into_values()
        .map(AggregateBuilder::finish)
        .collect()
}

/// The planner must finish every maze it is given.
///
/// # Errors
///
/// Returns an error naming the first tier where a planner run failed to
/// complete.
pub fn validate_playability_targets(aggregates: &[PlayabilityAggregate]) -> Result<()> {
    for aggregate in aggregates
        .iter()
        .filter(|aggregate| aggregate.strategy == GameplayStrategy::Planner)
    {
        ensure!(
            (aggregate.completion_rate - 1.0).abs() < f64::EPSILON,
            "{} completed only {:.1}% of runs",
            aggregate.scenario_name,
            aggregate.completion_rate * 100.0
        );
    }
    Ok(())
}

fn scenario_label(difficulty: Difficulty, strategy: GameplayStrategy) -> String {
    let tier = match difficulty {
        Difficulty::Easy => "Easy",
        Difficulty::Normal => "Normal",
        Difficulty::Hard => "Hard",
    };
    format!("{tier} - {strategy}")
}

#[derive(Debug, Clone)]
struct AggregateBuilder {
    scenario_name: String,
    difficulty: Difficulty,
    strategy: GameplayStrategy,
    iterations: u32,
    completions: u32,
    goal_reaches: u32,
    stats_inputs: RunningStats,
    stats_elapsed: RunningStats,
    blocked_sum: f64,
    explored_sum: f64,
}

impl AggregateBuilder {
    fn new(record: &PlayabilityRecord) -> Self {
        Self {
            scenario_name: record.scenario_name.clone(),
            difficulty: record.difficulty,
            strategy: record.strategy,
            iterations: 0,
            completions: 0,
            goal_reaches: 0,
            stats_inputs: RunningStats::default(),
            stats_elapsed: RunningStats::default(),
            blocked_sum: 0.0,
            explored_sum: 0.0,
        }
    }

    fn ingest(&mut self, metrics: &PlayabilityMetrics) {
        self.iterations += 1;
        if metrics.completed {
            self.completions += 1;
        }
        if metrics.reached_goal {
            self.goal_reaches += 1;
        }
        self.stats_inputs.add(count_f64(metrics.inputs));
        self.stats_elapsed.add(metrics.elapsed.as_secs_f64());
        self.blocked_sum += count_f64(metrics.blocked);
        self.explored_sum += f64::from(metrics.explored_percent);
    }

    fn finish(self) -> PlayabilityAggregate {
        let denom = f64::from(self.iterations.max(1));
        PlayabilityAggregate {
            scenario_name: self.scenario_name,
            difficulty: self.difficulty,
            strategy: self.strategy,
            iterations: usize::try_from(self.iterations).unwrap_or(usize::MAX),
            completion_rate: f64::from(self.completions) / denom,
            goal_reach_rate: f64::from(self.goal_reaches) / denom,
            mean_inputs: self.stats_inputs.mean(),
            std_inputs: self.stats_inputs.std_dev(),
            mean_blocked: self.blocked_sum / denom,
            mean_explored_pct: self.explored_sum / denom,
            mean_elapsed_secs: self.stats_elapsed.mean(),
            std_elapsed_secs: self.stats_elapsed.std_dev(),
        }
    }
}

fn count_f64(value: usize) -> f64 {
    f64::from(u32::try_from(value).unwrap_or(u32::MAX))
}

#[derive(Debug, Default, Clone)]
struct RunningStats {
    count: u32,
    mean: f64,
    m2: f64,
}

impl RunningStats {
    fn add(&mut self, value: f64) {
        self.count += 1;
        let count = f64::from(self.count);
        let delta = value - self.mean;
        self.mean += delta / count;
        let delta2 = value - self.mean;
        self.m2 += delta * delta2;
    }

    const fn mean(&self) -> f64 {
        if self.count == 0 { 0.0 } else { self.mean }
    }

    fn variance(&self) -> f64 {
        if self.count > 1 {
            self.m2 / f64::from(self.count - 1)
        } else {
            0.0
        }
    }

    fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }
}
