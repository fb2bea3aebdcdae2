use anyhow::{Context, Result};
use colored::Colorize;
use std::sync::Arc;
use std::time::Duration;

use mazecrawl_game::{
    CompletionReport, Difficulty, DifficultyTable, Discovery, GameEngine, GameSession,
    MemoryStore, MoveAction, MoveOutcome, PlayerPose, Position, SessionConfig, format_time,
};

use crate::logic::policy::GameplayStrategy;

/// Clock advance applied before every simulated input.
pub const DEFAULT_TICK: Duration = Duration::from_millis(250);
pub const DEFAULT_MAX_INPUTS: usize = 20_000;

#[derive(Debug, Clone)]
pub struct SimulationPlan {
    pub difficulty: Difficulty,
    pub strategy: GameplayStrategy,
    pub max_inputs: usize,
    pub tick: Duration,
    pub transition_ack: bool,
    pub expectations: Vec<SimulationExpectation>,
}

impl SimulationPlan {
    #[must_use]
    pub const fn new(difficulty: Difficulty, strategy: GameplayStrategy) -> Self {
        Self {
            difficulty,
            strategy,
            max_inputs: DEFAULT_MAX_INPUTS,
            tick: DEFAULT_TICK,
            transition_ack: false,
            expectations: Vec::new(),
        }
    }

    #[must_use]
    pub const fn with_max_inputs(mut self, max_inputs: usize) -> Self {
        self.max_inputs = max_inputs;
        self
    }

    #[must_use]
    pub const fn with_tick(mut self, tick: Duration) -> Self {
        self.tick = tick;
        self
    }

    /// Lock input after every move until the runner acknowledges it, the
    /// way an animating front end would.
    #[must_use]
    pub const fn with_transition_ack(mut self, required: bool) -> Self {
        self.transition_ack = required;
        self
    }

    #[must_use]
    pub fn with_expectation(mut self, expectation: impl Into<SimulationExpectation>) -> Self {
        self.expectations.push(expectation.into());
        self
    }
}

/// Assertion hook run after a simulation completes.
type SimulationExpectationFn =
    Arc<dyn Fn(&SimulationSummary) -> Result<()> + Send + Sync + 'static>;

#[derive(Clone)]
pub struct SimulationExpectation(SimulationExpectationFn);

impl std::fmt::Debug for SimulationExpectation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimulationExpectation").finish()
    }
}

impl SimulationExpectation {
    #[must_use]
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&SimulationSummary) -> Result<()> + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    pub fn evaluate(&self, summary: &SimulationSummary) -> Result<()> {
        (self.0)(summary)
    }
}

impl<F> From<F> for SimulationExpectation
where
    F: Fn(&SimulationSummary) -> Result<()> + Send + Sync + 'static,
{
    fn from(f: F) -> Self {
        Self(Arc::new(f))
    }
}

/// Counters collected over one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlayabilityMetrics {
    pub inputs: usize,
    pub moves: usize,
    pub blocked: usize,
    pub turns: usize,
    pub ignored: usize,
    pub collected: usize,
    pub collectible_total: usize,
    pub completed: bool,
    pub reached_goal: bool,
    pub explored_percent: u8,
    pub elapsed: Duration,
}

impl PlayabilityMetrics {
    fn record_turn(&mut self, outcome: &MoveOutcome, goal: Position) {
        self.inputs += 1;
        if outcome.ignored.is_some() {
            self.ignored += 1;
            return;
        }
        if outcome.action.is_turn() {
            self.turns += 1;
        }
        if outcome.moved {
            self.moves += 1;
        }
        if outcome.blocked {
            self.blocked += 1;
        }
        if outcome.pose.position == goal {
            self.reached_goal = true;
        }
    }

    fn finalize(&mut self, session: &GameSession) {
        self.collected = session.collected_count();
        self.collectible_total = session.collectible_total();
        self.completed = session.is_completed();
        self.explored_percent = session.map_stats().explored_percent;
        self.elapsed = session.elapsed();
    }
}

/// Complete record of a simulation run.
#[derive(Debug, Clone)]
pub struct SimulationSummary {
    pub seed: u64,
    pub difficulty: Difficulty,
    pub strategy: GameplayStrategy,
    pub tick: Duration,
    pub actions: Vec<MoveAction>,
    pub metrics: PlayabilityMetrics,
    /// Rule breaches observed while playing, one line each.
    pub violations: Vec<String>,
    pub completion: Option<CompletionReport>,
    pub best_time: Option<Duration>,
    pub final_session: GameSession,
}

/// Headless deterministic runner for the core game logic.
#[derive(Debug, Clone)]
pub struct GameTester {
    verbose: bool,
    table: DifficultyTable,
}

impl GameTester {
    pub const fn new(table: DifficultyTable, verbose: bool) -> Self {
        Self { verbose, table }
    }

    pub fn try_new(verbose: bool) -> Self {
        Self::new(DifficultyTable::default(), verbose)
    }

    pub const fn verbose(&self) -> bool {
        self.verbose
    }

    pub const fn table(&self) -> &DifficultyTable {
        &self.table
    }

    /// Play one session to completion or until `plan.max_inputs` inputs.
    ///
    /// # Errors
    ///
    /// Returns an error when the session cannot be built or the engine
    /// rejects an input.
    pub fn run_plan(&self, plan: &SimulationPlan, seed: u64) -> Result<SimulationSummary> {
        let config = SessionConfig::for_difficulty(&self.table, plan.difficulty)
            .with_transition_ack(plan.transition_ack);
        let mut engine = GameEngine::with_table(self.table, MemoryStore::new());
        engine
            .start_with_config(config, seed)
            .with_context(|| format!("failed to start {} session (seed {seed})", plan.difficulty))?;

        if self.verbose {
            log_initial_state(seed, plan, engine.session());
        }

        let mut policy = plan.strategy.create_policy(seed);
        let mut metrics = PlayabilityMetrics::default();
        let mut violations = Vec::new();
        let mut actions = Vec::new();
        let mut completion = None;

        for step in 1..=plan.max_inputs {
            let session = engine.session().context("session vanished mid-run")?;
            if session.is_completed() {
                break;
            }
            let before = session.pose();
            let known_before = session.discovery().known_count();
            let action = policy.next_action(session);

            engine.tick(plan.tick);
            let turn = engine
                .handle_input(action)
                .with_context(|| format!("input {step} ({action}) failed"))?;
            if plan.transition_ack {
                engine.finish_transition();
            }

            let session = engine.session().context("session vanished mid-run")?;
            check_turn(&mut violations, step, before, known_before, session, &turn.outcome);
            metrics.record_turn(&turn.outcome, session.grid().goal());

            if self.verbose {
                log_turn(step, &turn.outcome, session);
            }

            actions.push(action);
            if turn.completion.is_some() {
                completion = turn.completion;
            }
        }

        let final_session = engine
            .session()
            .cloned()
            .context("session vanished mid-run")?;
        metrics.finalize(&final_session);
        let best_time = engine
            .best_time(plan.difficulty)
            .context("failed to read best time")?;

        Ok(SimulationSummary {
            seed,
            difficulty: plan.difficulty,
            strategy: plan.strategy,
            tick: plan.tick,
            actions,
            metrics,
            violations,
            completion,
            best_time,
            final_session,
        })
    }
}

fn check_turn(
    violations: &mut Vec<String>,
    step: usize,
    before: PlayerPose,
    known_before: usize,
    session: &GameSession,
    outcome: &MoveOutcome,
) {
    let mut flag = |message: String| violations.push(format!("input {step}: {message}"));
    let pose = session.pose();
    let grid = session.grid();

    if let Some(reason) = outcome.ignored {
        flag(format!("input ignored ({reason:?})"));
        return;
    }

    match outcome.action {
        MoveAction::TurnLeft | MoveAction::TurnRight => {
            if pose.position != before.position {
                flag(format!("turn moved the player to {}", pose.position));
            }
            let expected = if outcome.action == MoveAction::TurnLeft {
                before.heading.turn_left()
            } else {
                before.heading.turn_right()
            };
            if pose.heading != expected {
                flag(format!("turn faced {} instead of {expected}", pose.heading));
            }
        }
        MoveAction::Forward | MoveAction::Backward => {
            let target = before.step_target(outcome.action);
            let legal = target.is_some_and(|cell| grid.is_open(cell));
            if outcome.moved != legal || outcome.blocked == legal {
                flag(format!(
                    "{} toward {target:?} reported moved={} blocked={}",
                    outcome.action, outcome.moved, outcome.blocked
                ));
            }
            let expected = if legal { target } else { Some(before.position) };
            if Some(pose.position) != expected {
                flag(format!("player ended on {} instead of {expected:?}", pose.position));
            }
            if pose.heading != before.heading {
                flag("translation changed the heading".to_string());
            }
        }
    }

    if !grid.is_open(pose.position) {
        flag(format!("player stands inside a wall at {}", pose.position));
    }
    if session.discovery().known_count() < known_before {
        flag("discovered cells were forgotten".to_string());
    }
    if session.discovery().get(pose.position) != Discovery::KnownOpen {
        flag(format!("current cell {} is not discovered", pose.position));
    }
    if outcome.completion.is_some() && !session.all_collected() {
        flag("completed with collectibles still pending".to_string());
    }
    if pose.position == grid.goal() && session.all_collected() && !session.is_completed() {
        flag("standing on the goal with everything collected but still playing".to_string());
    }
}

fn log_initial_state(seed: u64, plan: &SimulationPlan, session: Option<&GameSession>) {
    let Some(session) = session else {
        return;
    };
    println!(
        "  🧭 {} seed {} | {}x{} | {} collectibles | strategy {}",
        plan.difficulty.to_string().bright_white(),
        seed,
        session.grid().width(),
        session.grid().height(),
        session.collectible_total(),
        plan.strategy
    );
}

fn log_turn(step: usize, outcome: &MoveOutcome, session: &GameSession) {
    if outcome.blocked {
        println!(
            "    {step:>5} {} {}",
            outcome.action,
            "blocked".yellow()
        );
    }
    if !outcome.collected.is_empty() {
        println!(
            "    {step:>5} collected {:?} ({}/{})",
            outcome.collected.as_slice(),
            session.collected_count(),
            session.collectible_total()
        );
    }
    if let Some(event) = outcome.completion {
        println!(
            "    {step:>5} {} in {}",
            "maze complete".green(),
            format_time(Some(event.elapsed))
        );
    }
}
