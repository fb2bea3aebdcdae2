use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use mazecrawl_game::{
    CompletionEvent, Difficulty, GameEngine, GameSession, Grid, Heading, IgnoreReason,
    MemoryStore, MoveAction, Position, SessionConfig, SessionPhase, decode_to_seed,
    encode_friendly,
};

/// Shortest open-cell path from `from` to `to`, excluding `from`.
fn route(grid: &Grid, from: Position, to: Position) -> Vec<Position> {
    let mut parents: HashMap<Position, Position> = HashMap::new();
    let mut queue = VecDeque::from([from]);
    while let Some(pos) = queue.pop_front() {
        if pos == to {
            break;
        }
        for heading in Heading::ALL {
            let (dx, dy) = heading.delta();
            let Some(next) = pos.offset(dx, dy) else {
                continue;
            };
            if grid.is_open(next) && next != from && !parents.contains_key(&next) {
                parents.insert(next, pos);
                queue.push_back(next);
            }
        }
    }
    let mut path = Vec::new();
    let mut cursor = to;
    while cursor != from {
        path.push(cursor);
        cursor = parents[&cursor];
    }
    path.reverse();
    path
}

fn heading_between(from: Position, to: Position) -> Heading {
    Heading::ALL
        .into_iter()
        .find(|heading| {
            let (dx, dy) = heading.delta();
            from.offset(dx, dy) == Some(to)
        })
        .unwrap()
}

/// Inputs that walk the current pose to `target`, turning right as needed.
fn actions_to(
    session: &GameSession,
    start_heading: Heading,
    from: Position,
    target: Position,
) -> (Vec<MoveAction>, Heading) {
    let mut heading = start_heading;
    let mut actions = Vec::new();
    let mut pos = from;
    for next in route(session.grid(), from, target) {
        let wanted = heading_between(pos, next);
        while heading != wanted {
            actions.push(MoveAction::TurnRight);
            heading = heading.turn_right();
        }
        actions.push(MoveAction::Forward);
        pos = next;
    }
    (actions, heading)
}

/// Collect everything in placement order, then head to the goal.
fn full_run_plan(session: &GameSession) -> Vec<MoveAction> {
    let mut waypoints: Vec<Position> =
        session.collectibles().iter().map(|c| c.position).collect();
    waypoints.push(session.grid().goal());
    let mut pos = session.pose().position;
    let mut heading = session.pose().heading;
    let mut plan = Vec::new();
    for waypoint in waypoints {
        let (actions, facing) = actions_to(session, heading, pos, waypoint);
        plan.extend(actions);
        heading = facing;
        pos = waypoint;
    }
    plan
}

fn easy_config() -> SessionConfig {
    SessionConfig {
        difficulty: Difficulty::Easy,
        width: 15,
        height: 11,
        collectible_count: 2,
        require_transition_ack: false,
    }
}

#[test]
fn easy_scenario_blocks_then_completes() {
    let mut session = GameSession::new(easy_config(), 0x5EED).unwrap();
    assert!(session.grid().is_open(Position::new(1, 1)));
    assert!(session.grid().is_open(Position::new(13, 9)));
    assert_eq!(session.collectible_total(), 2);

    let blocked = session.try_move(MoveAction::Forward);
    assert!(blocked.blocked);
    assert_eq!(session.pose().position, Position::new(1, 1));
    assert_eq!(session.pose().heading, Heading::North);

    let plan = full_run_plan(&session);
    let mut completion: Option<CompletionEvent> = None;
    for action in plan {
        session.tick(Duration::from_millis(250));
        let outcome = session.try_move(action);
        assert!(outcome.ignored.is_none());
        if outcome.completion.is_some() {
            assert!(completion.is_none(), "completion fired twice");
            completion = outcome.completion;
        }
    }

    let event = completion.expect("maze should complete");
    assert_eq!(event.difficulty, Difficulty::Easy);
    assert_eq!(session.phase(), SessionPhase::Completed);
    assert_eq!(session.collected_count(), 2);
    assert_eq!(session.pose().position, session.grid().goal());
    assert_eq!(event.elapsed, session.elapsed());
    assert_eq!(session.map_stats().distance_to_goal, 0);

    let after = session.try_move(MoveAction::TurnLeft);
    assert_eq!(after.ignored, Some(IgnoreReason::SessionCompleted));
}

#[test]
fn goal_with_pending_collectibles_stays_playing() {
    let mut exercised = 0;
    for seed in 0..40 {
        let mut session = GameSession::new(easy_config(), seed).unwrap();
        let goal = session.grid().goal();
        let pose = session.pose();
        let (actions, _) = actions_to(&session, pose.heading, pose.position, goal);
        for action in actions {
            let outcome = session.try_move(action);
            if outcome.completion.is_some() {
                assert_eq!(session.collected_count(), session.collectible_total());
            }
        }
        assert_eq!(session.pose().position, goal);
        if session.collected_count() < session.collectible_total() {
            exercised += 1;
            assert_eq!(session.phase(), SessionPhase::Playing);
            assert!(session.check_goal().is_none());
            assert!(session.clock().is_running());
        }
    }
    assert!(exercised > 0, "no seed left a collectible off the direct route");
}

#[test]
fn engine_records_best_times_across_runs() {
    let mut engine = GameEngine::new(MemoryStore::new());

    let run = |engine: &mut GameEngine<MemoryStore>, seed: u64, tick: Duration| {
        let session = engine.start_session(Difficulty::Easy, seed).unwrap();
        let plan = full_run_plan(session);
        let mut report = None;
        for action in plan {
            engine.tick(tick);
            let turn = engine.handle_input(action).unwrap();
            if turn.completion.is_some() {
                report = turn.completion;
            }
        }
        report.expect("run should complete")
    };

    let first = run(&mut engine, 1, Duration::from_secs(1));
    assert!(first.is_new_record);
    assert_eq!(first.best, first.elapsed);

    let slower = run(&mut engine, 1, Duration::from_secs(2));
    assert!(!slower.is_new_record);
    assert_eq!(slower.best, first.elapsed);
    assert!(slower.elapsed > first.elapsed);

    let faster = run(&mut engine, 1, Duration::from_millis(500));
    assert!(faster.is_new_record);
    assert_eq!(
        engine.best_time(Difficulty::Easy).unwrap(),
        Some(faster.elapsed)
    );
    assert_eq!(engine.best_time(Difficulty::Normal).unwrap(), None);
}

#[test]
fn share_code_reproduces_session() {
    let (difficulty, seed) = decode_to_seed("EZ-LANTERN42").unwrap();
    let mut engine = GameEngine::new(MemoryStore::new());
    let a = engine
        .start_session(difficulty, seed)
        .unwrap()
        .grid()
        .fingerprint();
    let b = engine.restart(seed).unwrap().grid().fingerprint();
    assert_eq!(a, b);
    assert_eq!(encode_friendly(difficulty, seed), "EZ-LANTERN42");
}
