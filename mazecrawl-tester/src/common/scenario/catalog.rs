use anyhow::{Context, Result, bail, ensure};
use std::time::Duration;

use mazecrawl_game::maze::loop_count;
use mazecrawl_game::{
    BestTimeStore, CellKind, Difficulty, DifficultyTable, Discovery, GameSession, MemoryStore,
    Position, SeedStreams, SessionPhase, carve_perfect, generate, inject_loops,
};

use crate::common::scenario::TestScenario;
use crate::logic::game_tester::SimulationSummary;
use crate::logic::policy::{actions_along, shortest_route};
use crate::logic::{GameplayStrategy, SimulationPlan};

pub fn smoke() -> TestScenario {
    TestScenario::simulation(
        "Smoke Test",
        SimulationPlan::new(Difficulty::Easy, GameplayStrategy::Planner)
            .with_expectation(no_violations_expectation)
            .with_expectation(completion_expectation),
    )
}

pub fn connectivity() -> TestScenario {
    TestScenario::simulation(
        "Maze Connectivity",
        SimulationPlan::new(Difficulty::Normal, GameplayStrategy::RandomWalk)
            .with_max_inputs(0)
            .with_expectation(connectivity_expectation),
    )
}

pub fn perfect_maze() -> TestScenario {
    TestScenario::simulation(
        "Perfect Maze Carving",
        SimulationPlan::new(Difficulty::Normal, GameplayStrategy::RandomWalk)
            .with_max_inputs(0)
            .with_expectation(perfect_maze_expectation),
    )
}

pub fn loop_injection() -> TestScenario {
    TestScenario::simulation(
        "Loop Injection",
        SimulationPlan::new(Difficulty::Hard, GameplayStrategy::RandomWalk)
            .with_max_inputs(0)
            .with_expectation(loop_injection_expectation),
    )
}

pub fn discovery() -> TestScenario {
    TestScenario::simulation(
        "Fog of War Discovery",
        SimulationPlan::new(Difficulty::Normal, GameplayStrategy::RandomWalk)
            .with_max_inputs(1_500)
            .with_expectation(no_violations_expectation)
            .with_expectation(discovery_expectation),
    )
}

pub fn movement_legality() -> TestScenario {
    TestScenario::simulation(
        "Movement Legality",
        SimulationPlan::new(Difficulty::Hard, GameplayStrategy::RandomWalk)
            .with_max_inputs(3_000)
            .with_expectation(no_violations_expectation)
            .with_expectation(movement_expectation),
    )
}

pub fn collection() -> TestScenario {
    TestScenario::simulation(
        "Collectible Collection",
        SimulationPlan::new(Difficulty::Normal, GameplayStrategy::Planner)
            .with_expectation(no_violations_expectation)
            .with_expectation(collection_expectation),
    )
}

pub fn goal_gating() -> TestScenario {
    TestScenario::simulation(
        "Goal Gating",
        SimulationPlan::new(Difficulty::Easy, GameplayStrategy::Planner)
            .with_expectation(no_violations_expectation)
            .with_expectation(goal_gating_expectation),
    )
}

pub fn best_time() -> TestScenario {
    TestScenario::simulation(
        "Best Time Recording",
        SimulationPlan::new(Difficulty::Easy, GameplayStrategy::Planner)
            .with_expectation(best_time_expectation),
    )
}

pub fn deterministic() -> TestScenario {
    TestScenario::simulation(
        "Deterministic Replay",
        SimulationPlan::new(Difficulty::Normal, GameplayStrategy::RandomWalk)
            .with_max_inputs(1_000)
            .with_transition_ack(true)
            .with_expectation(no_violations_expectation)
            .with_expectation(deterministic_expectation),
    )
}

pub fn full_run_planner() -> TestScenario {
    TestScenario::simulation(
        "Full Run - Planner",
        SimulationPlan::new(Difficulty::Hard, GameplayStrategy::Planner)
            .with_expectation(no_violations_expectation)
            .with_expectation(completion_expectation)
            .with_expectation(elapsed_matches_ticks),
    )
}

pub fn full_run_wall_follower() -> TestScenario {
    TestScenario::simulation(
        "Full Run - Wall Follower",
        SimulationPlan::new(Difficulty::Normal, GameplayStrategy::WallFollower)
            .with_expectation(no_violations_expectation)
            .with_expectation(goal_reached_expectation)
            .with_expectation(elapsed_matches_ticks),
    )
}

pub fn random_walk() -> TestScenario {
    TestScenario::simulation(
        "Random Walk Robustness",
        SimulationPlan::new(Difficulty::Easy, GameplayStrategy::RandomWalk)
            .with_max_inputs(2_000)
            .with_expectation(no_violations_expectation)
            .with_expectation(random_walk_expectation)
            .with_expectation(elapsed_matches_ticks),
    )
}

pub fn no_violations_expectation(summary: &SimulationSummary) -> Result<()> {
    if let Some(first) = summary.violations.first() {
        bail!(
            "{} rule violation(s), first: {first}",
            summary.violations.len()
        );
    }
    Ok(())
}

fn completion_expectation(summary: &SimulationSummary) -> Result<()> {
    let metrics = &summary.metrics;
    ensure!(
        metrics.completed,
        "maze not completed after {} inputs",
        metrics.inputs
    );
    ensure!(
        metrics.collected == metrics.collectible_total,
        "completed holding {}/{} collectibles",
        metrics.collected,
        metrics.collectible_total
    );
    let session = &summary.final_session;
    ensure!(
        session.pose().position == session.grid().goal(),
        "completed away from the goal at {}",
        session.pose().position
    );
    Ok(())
}

/// Preset sizes plus the session's own size.
fn tier_dimensions(summary: &SimulationSummary) -> Vec<(usize, usize)> {
    let table = DifficultyTable::default();
    let mut dims: Vec<(usize, usize)> = Difficulty::ALL
        .into_iter()
        .map(|tier| {
            let preset = table.preset(tier);
            (preset.width, preset.height)
        })
        .collect();
    let config = summary.final_session.config();
    if !dims.contains(&(config.width, config.height)) {
        dims.push((config.width, config.height));
    }
    dims
}

fn connectivity_expectation(summary: &SimulationSummary) -> Result<()> {
    for (width, height) in tier_dimensions(summary) {
        let mut streams = SeedStreams::from_user_seed(summary.seed);
        let grid = generate(width, height, streams.maze())?;
        ensure!(
            grid.is_open(grid.start()) && grid.is_open(grid.goal()),
            "{width}x{height}: start or goal is walled"
        );
        let reachable = grid.reachable_count(grid.start());
        ensure!(
            reachable == grid.open_count(),
            "{width}x{height}: only {reachable} of {} open cells reachable from start",
            grid.open_count()
        );
        let border_open = grid
            .cells()
            .filter(|(pos, _)| {
                pos.x == 0 || pos.y == 0 || pos.x == width - 1 || pos.y == height - 1
            })
            .any(|(_, cell)| cell == CellKind::Open);
        ensure!(!border_open, "{width}x{height}: border is not solid");
    }
    Ok(())
}

fn perfect_maze_expectation(summary: &SimulationSummary) -> Result<()> {
    for (width, height) in tier_dimensions(summary) {
        let mut streams = SeedStreams::from_user_seed(summary.seed);
        let grid = carve_perfect(width, height, streams.maze())?;
        let open = grid.open_count();
        ensure!(
            grid.open_edge_count() + 1 == open,
            "{width}x{height}: {} corridors join {open} cells, not a spanning tree",
            grid.open_edge_count()
        );
        for y in (1..height - 1).step_by(2) {
            for x in (1..width - 1).step_by(2) {
                let room = Position::new(x, y);
                ensure!(grid.is_open(room), "{width}x{height}: room {room} never carved");
            }
        }
    }
    Ok(())
}

fn loop_injection_expectation(summary: &SimulationSummary) -> Result<()> {
    let config = summary.final_session.config();
    let (width, height) = (config.width, config.height);
    let mut streams = SeedStreams::from_user_seed(summary.seed);
    let perfect = carve_perfect(width, height, streams.maze())?;
    let mut looped = perfect.clone();
    let attempts = loop_count(width, height);
    let opened = inject_loops(&mut looped, attempts, streams.maze());

    ensure!(
        looped.fingerprint() == summary.final_session.grid().fingerprint(),
        "carving then injecting does not reproduce the session maze"
    );
    ensure!(
        opened <= attempts,
        "{opened} openings from {attempts} attempts"
    );
    let closed = perfect
        .cells()
        .zip(looped.cells())
        .filter(|((_, before), (_, after))| before.is_open() && !after.is_open())
        .count();
    ensure!(closed == 0, "loop injection walled {closed} open cells");
    ensure!(
        looped.open_count() == perfect.open_count() + opened,
        "open count grew by {} but {opened} openings were reported",
        looped.open_count() - perfect.open_count()
    );
    ensure!(looped.is_connected(), "looped maze is disconnected");
    Ok(())
}

fn discovery_expectation(summary: &SimulationSummary) -> Result<()> {
    let session = &summary.final_session;
    let grid = session.grid();
    for (pos, known) in session.discovery().cells() {
        let truth = grid
            .get(pos)
            .with_context(|| format!("discovery cell {pos} lies outside the maze"))?;
        match known {
            Discovery::KnownOpen => {
                ensure!(truth == CellKind::Open, "{pos} shown open but is a wall");
            }
            Discovery::KnownWall => {
                ensure!(truth == CellKind::Wall, "{pos} shown as wall but is open");
            }
            Discovery::Unknown => {}
        }
    }

    let start = grid.start();
    for dy in -1..=1 {
        for dx in -1..=1 {
            if let Some(cell) = start.offset(dx, dy) {
                ensure!(
                    session.discovery().get(cell).is_known(),
                    "start neighbourhood cell {cell} is still unknown"
                );
            }
        }
    }
    ensure!(
        summary.metrics.explored_percent > 0,
        "nothing explored after {} inputs",
        summary.metrics.inputs
    );
    Ok(())
}

fn movement_expectation(summary: &SimulationSummary) -> Result<()> {
    let metrics = &summary.metrics;
    ensure!(metrics.blocked > 0, "no input ever hit a wall");
    ensure!(metrics.moves > 0, "the player never moved");
    ensure!(metrics.turns > 0, "the player never turned");
    ensure!(
        metrics.moves + metrics.blocked + metrics.turns == metrics.inputs,
        "{} inputs but {} moves, {} blocked, {} turns",
        metrics.inputs,
        metrics.moves,
        metrics.blocked,
        metrics.turns
    );
    Ok(())
}

fn collection_expectation(summary: &SimulationSummary) -> Result<()> {
    completion_expectation(summary)?;
    let session = &summary.final_session;
    let grid = session.grid();
    ensure!(
        session.collectible_total() == session.config().collectible_count,
        "{} collectibles placed, {} configured",
        session.collectible_total(),
        session.config().collectible_count
    );

    let mut seen = Vec::new();
    for item in session.collectibles() {
        ensure!(item.is_collected(), "collectible {} still present", item.id);
        ensure!(
            grid.is_open(item.position)
                && item.position != grid.start()
                && item.position != grid.goal(),
            "collectible {} placed on {}",
            item.id,
            item.position
        );
        ensure!(
            !seen.contains(&item.position),
            "two collectibles share {}",
            item.position
        );
        seen.push(item.position);
    }
    Ok(())
}

/// Walk straight to the goal on a fresh copy of the session.
fn goal_gating_expectation(summary: &SimulationSummary) -> Result<()> {
    let mut session = GameSession::new(*summary.final_session.config(), summary.seed)?;
    let grid = session.grid().clone();
    let route = shortest_route(&grid, grid.start(), grid.goal())
        .context("goal unreachable from start")?;

    for action in actions_along(session.pose(), &route) {
        let outcome = session.try_move(action);
        if outcome.completion.is_some() {
            ensure!(
                session.all_collected(),
                "completion fired with {} collectibles pending",
                session.collectible_total() - session.collected_count()
            );
        }
    }

    ensure!(
        session.pose().position == grid.goal(),
        "direct route ended on {}",
        session.pose().position
    );
    if session.all_collected() {
        ensure!(
            session.phase() == SessionPhase::Completed,
            "everything collected on the goal but still playing"
        );
    } else {
        ensure!(
            session.phase() == SessionPhase::Playing,
            "goal accepted with collectibles pending"
        );
        ensure!(
            session.clock().is_running(),
            "clock stopped before completion"
        );
        ensure!(
            session.check_goal().is_none(),
            "goal check passed with collectibles pending"
        );
    }
    Ok(())
}

fn best_time_expectation(summary: &SimulationSummary) -> Result<()> {
    let report = summary.completion.context("run never completed")?;
    ensure!(
        report.is_new_record,
        "first completion on a fresh store was not a record"
    );
    ensure!(
        report.best == report.elapsed,
        "record best {:?} differs from elapsed {:?}",
        report.best,
        report.elapsed
    );
    ensure!(
        summary.best_time == Some(report.elapsed),
        "stored best {:?} differs from elapsed {:?}",
        summary.best_time,
        report.elapsed
    );

    let mut records = BestTimeStore::new(MemoryStore::new());
    records.record_if_best(report.difficulty, report.elapsed)?;
    let slower = records.record_if_best(report.difficulty, report.elapsed + Duration::from_secs(1))?;
    ensure!(
        !slower.is_new_record && slower.best == report.elapsed,
        "a slower run replaced the record"
    );
    let tie = records.record_if_best(report.difficulty, report.elapsed)?;
    ensure!(!tie.is_new_record, "a tie replaced the record");
    let faster = records.record_if_best(
        report.difficulty,
        report.elapsed.saturating_sub(Duration::from_millis(1)),
    )?;
    ensure!(
        faster.is_new_record || report.elapsed.is_zero(),
        "a faster run did not become the record"
    );
    Ok(())
}

/// Same seed, same maze; replaying the inputs lands in the same state.
fn deterministic_expectation(summary: &SimulationSummary) -> Result<()> {
    let config = *summary.final_session.config();
    let mut replay = GameSession::new(config, summary.seed)?;
    let twin = GameSession::new(config, summary.seed)?;
    let expected = summary.final_session.grid().fingerprint();
    ensure!(
        replay.grid().fingerprint() == expected && twin.grid().fingerprint() == expected,
        "seed {} produced different mazes",
        summary.seed
    );
    ensure!(
        replay.collectibles() == twin.collectibles(),
        "seed {} placed collectibles differently",
        summary.seed
    );

    for &action in &summary.actions {
        replay.tick(summary.tick);
        replay.try_move(action);
        replay.finish_transition();
    }

    let final_session = &summary.final_session;
    ensure!(
        replay.pose() == final_session.pose(),
        "replay ended at {:?}, run ended at {:?}",
        replay.pose(),
        final_session.pose()
    );
    ensure!(
        replay.collected_count() == final_session.collected_count()
            && replay.phase() == final_session.phase()
            && replay.elapsed() == final_session.elapsed(),
        "replay diverged from the recorded run"
    );
    ensure!(
        replay.discovery().known_count() == final_session.discovery().known_count(),
        "replay discovered a different area"
    );
    Ok(())
}

fn elapsed_matches_ticks(summary: &SimulationSummary) -> Result<()> {
    let inputs = u32::try_from(summary.metrics.inputs).context("input count overflow")?;
    let expected = summary.tick * inputs;
    ensure!(
        summary.metrics.elapsed == expected,
        "elapsed {:?} after {inputs} ticks of {:?}",
        summary.metrics.elapsed,
        summary.tick
    );
    if let Some(report) = summary.completion {
        ensure!(
            report.elapsed == expected,
            "completion reported {:?}, clock shows {expected:?}",
            report.elapsed
        );
    }
    Ok(())
}

fn goal_reached_expectation(summary: &SimulationSummary) -> Result<()> {
    ensure!(
        summary.metrics.reached_goal,
        "never reached the goal in {} inputs",
        summary.metrics.inputs
    );
    if summary.metrics.completed {
        ensure!(
            summary.metrics.collected == summary.metrics.collectible_total,
            "completed holding {}/{} collectibles",
            summary.metrics.collected,
            summary.metrics.collectible_total
        );
    }
    Ok(())
}

fn random_walk_expectation(summary: &SimulationSummary) -> Result<()> {
    let metrics = &summary.metrics;
    ensure!(metrics.explored_percent > 0, "random walk explored nothing");
    ensure!(metrics.ignored == 0, "{} inputs were ignored", metrics.ignored);
    if metrics.completed {
        ensure!(
            metrics.collected == metrics.collectible_total,
            "completed holding {}/{} collectibles",
            metrics.collected,
            metrics.collectible_total
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::GameTester;

    fn run(scenario: &TestScenario, seed: u64) -> Result<()> {
        let summary = GameTester::try_new(false).run_plan(&scenario.plan, seed)?;
        for expectation in &scenario.plan.expectations {
            expectation.evaluate(&summary)?;
        }
        Ok(())
    }

    #[test]
    fn structural_scenarios_pass() {
        for seed in [1, 99, 1337] {
            run(&connectivity(), seed).unwrap();
            run(&perfect_maze(), seed).unwrap();
            run(&loop_injection(), seed).unwrap();
        }
    }

    #[test]
    fn play_scenarios_pass() {
        for seed in [3, 1337] {
            for scenario in [
                smoke(),
                discovery(),
                collection(),
                goal_gating(),
                best_time(),
                deterministic(),
                full_run_wall_follower(),
                random_walk(),
            ] {
                run(&scenario, seed).unwrap_or_else(|err| panic!("{}: {err:#}", scenario.name));
            }
        }
    }

    #[test]
    fn hard_scenarios_pass() {
        run(&movement_legality(), 7).unwrap();
        run(&full_run_planner(), 7).unwrap();
    }

    #[test]
    fn violations_fail_the_expectation() {
        let mut summary = GameTester::try_new(false)
            .run_plan(&smoke().plan, 1)
            .unwrap();
        assert!(no_violations_expectation(&summary).is_ok());
        summary.violations.push("input 4: player stands inside a wall".to_string());
        let err = no_violations_expectation(&summary).unwrap_err();
        assert!(err.to_string().contains("player stands inside a wall"));
    }
}
