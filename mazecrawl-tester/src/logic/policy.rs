use std::collections::{HashMap, VecDeque};
use std::fmt;

use mazecrawl_game::{GameSession, Grid, Heading, MoveAction, PlayerPose, Position};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;

/// Policy interface for automated play strategies.
pub trait PlayerPolicy {
    /// Name used for logging/debug output.
    fn name(&self) -> &'static str;

    /// Pick the next input for the active session.
    fn next_action(&mut self, session: &GameSession) -> MoveAction;
}

/// Built-in gameplay strategies for automated runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum GameplayStrategy {
    Planner,
    WallFollower,
    RandomWalk,
}

impl GameplayStrategy {
    pub const ALL: [Self; 3] = [Self::Planner, Self::WallFollower, Self::RandomWalk];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Planner => "Planner",
            Self::WallFollower => "Wall Follower",
            Self::RandomWalk => "Random Walk",
        }
    }

    #[must_use]
    pub fn create_policy(self, seed: u64) -> Box<dyn PlayerPolicy + Send> {
        match self {
            Self::Planner => Box::new(PlannerPolicy),
            Self::WallFollower => Box::new(WallFollowerPolicy::default()),
            Self::RandomWalk => Box::new(RandomWalkPolicy::new(seed)),
        }
    }
}

impl fmt::Display for GameplayStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Breadth-first route over open cells, excluding `from`, ending at the
/// first cell accepted by `is_target`.
pub fn search<F>(grid: &Grid, from: Position, is_target: F) -> Option<Vec<Position>>
where
    F: Fn(Position) -> bool,
{
    let mut parents: HashMap<Position, Position> = HashMap::new();
    let mut queue = VecDeque::from([from]);
    let mut found = None;

    while let Some(pos) = queue.pop_front() {
        if pos != from && is_target(pos) {
            found = Some(pos);
            break;
        }
        for heading in Heading::ALL {
            let (dx, dy) = heading.delta();
            let Some(next) = pos.offset(dx, dy) else {
                continue;
            };
            if next != from && grid.is_open(next) && !parents.contains_key(&next) {
                parents.insert(next, pos);
                queue.push_back(next);
            }
        }
    }

    let mut path = Vec::new();
    let mut cursor = found?;
    while cursor != from {
        path.push(cursor);
        cursor = *parents.get(&cursor)?;
    }
    path.reverse();
    Some(path)
}

/// Shortest open route from `from` to `to`.
pub fn shortest_route(grid: &Grid, from: Position, to: Position) -> Option<Vec<Position>> {
    search(grid, from, |pos| pos == to)
}

fn heading_toward(from: Position, to: Position) -> Option<Heading> {
    Heading::ALL.into_iter().find(|heading| {
        let (dx, dy) = heading.delta();
        from.offset(dx, dy) == Some(to)
    })
}

/// Single input that makes progress from `pose` toward the adjacent `next`.
fn steer(pose: PlayerPose, next: Position) -> MoveAction {
    match heading_toward(pose.position, next) {
        Some(wanted) if wanted == pose.heading => MoveAction::Forward,
        Some(wanted) if wanted == pose.heading.turn_left() => MoveAction::TurnLeft,
        _ => MoveAction::TurnRight,
    }
}

/// Inputs that walk `pose` along `path`, turning before each step.
pub fn actions_along(pose: PlayerPose, path: &[Position]) -> Vec<MoveAction> {
    let mut pose = pose;
    let mut actions = Vec::new();
    for &next in path {
        loop {
            let action = steer(pose, next);
            actions.push(action);
            match action {
                MoveAction::TurnLeft => pose.heading = pose.heading.turn_left(),
                MoveAction::TurnRight => pose.heading = pose.heading.turn_right(),
                _ => break,
            }
        }
        pose.position = next;
    }
    actions
}

/// Heads for the nearest pending collectible, then the goal.
struct PlannerPolicy;

impl PlayerPolicy for PlannerPolicy {
    fn name(&self) -> &'static str {
        "planner"
    }

    fn next_action(&mut self, session: &GameSession) -> MoveAction {
        let pose = session.pose();
        let grid = session.grid();
        let pending: Vec<Position> = session
            .pending_collectibles()
            .map(|item| item.position)
            .collect();
        let route = if pending.is_empty() {
            shortest_route(grid, pose.position, grid.goal())
        } else {
            search(grid, pose.position, |pos| pending.contains(&pos))
        };
        route
            .and_then(|path| path.first().copied())
            .map_or(MoveAction::TurnRight, |next| steer(pose, next))
    }
}

/// Right-hand rule. The first input faces west so the hand rests on the
/// outer wall next to the start cell.
#[derive(Default)]
struct WallFollowerPolicy {
    anchored: bool,
    advance_next: bool,
}

impl PlayerPolicy for WallFollowerPolicy {
    fn name(&self) -> &'static str {
        "wall_follower"
    }

    fn next_action(&mut self, session: &GameSession) -> MoveAction {
        if !self.anchored {
            self.anchored = true;
            return MoveAction::TurnLeft;
        }

        let pose = session.pose();
        let grid = session.grid();
        let open_toward = |heading: Heading| {
            let (dx, dy) = heading.delta();
            pose.position
                .offset(dx, dy)
                .is_some_and(|pos| grid.is_open(pos))
        };

        if std::mem::take(&mut self.advance_next) && open_toward(pose.heading) {
            return MoveAction::Forward;
        }
        if open_toward(pose.heading.turn_right()) {
            self.advance_next = true;
            MoveAction::TurnRight
        } else if open_toward(pose.heading) {
            MoveAction::Forward
        } else {
            MoveAction::TurnLeft
        }
    }
}

struct RandomWalkPolicy {
    rng: ChaCha20Rng,
}

impl RandomWalkPolicy {
    fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha20Rng::seed_from_u64(seed),
        }
    }
}

impl PlayerPolicy for RandomWalkPolicy {
    fn name(&self) -> &'static str {
        "random_walk"
    }

    fn next_action(&mut self, _session: &GameSession) -> MoveAction {
        MoveAction::ALL[self.rng.gen_range(0..MoveAction::ALL.len())]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mazecrawl_game::{Difficulty, DifficultyTable, SessionConfig};

    fn session(difficulty: Difficulty, seed: u64) -> GameSession {
        let config = SessionConfig::for_difficulty(&DifficultyTable::default(), difficulty);
        GameSession::new(config, seed).unwrap()
    }

    #[test]
    fn steer_turns_toward_the_next_cell() {
        let pose = PlayerPose::new(Position::new(3, 3), Heading::North);
        assert_eq!(steer(pose, Position::new(3, 2)), MoveAction::Forward);
        assert_eq!(steer(pose, Position::new(2, 3)), MoveAction::TurnLeft);
        assert_eq!(steer(pose, Position::new(4, 3)), MoveAction::TurnRight);
        assert_eq!(steer(pose, Position::new(3, 4)), MoveAction::TurnRight);
    }

    #[test]
    fn actions_along_emits_turns_then_steps() {
        let pose = PlayerPose::new(Position::new(1, 1), Heading::North);
        let path = [Position::new(1, 2), Position::new(1, 3)];
        assert_eq!(
            actions_along(pose, &path),
            vec![
                MoveAction::TurnRight,
                MoveAction::TurnRight,
                MoveAction::Forward,
                MoveAction::Forward
            ]
        );
    }

    #[test]
    fn shortest_route_ends_at_goal() {
        let session = session(Difficulty::Easy, 3);
        let grid = session.grid();
        let route = shortest_route(grid, grid.start(), grid.goal()).unwrap();
        assert_eq!(route.last().copied(), Some(grid.goal()));
        assert!(route.iter().all(|pos| grid.is_open(*pos)));
        assert!(shortest_route(grid, grid.start(), grid.start()).is_none());
    }

    #[test]
    fn planner_completes_easy_mazes() {
        for seed in 0..10 {
            let mut session = session(Difficulty::Easy, seed);
            let mut policy = GameplayStrategy::Planner.create_policy(seed);
            for _ in 0..5_000 {
                if session.is_completed() {
                    break;
                }
                let action = policy.next_action(&session);
                session.try_move(action);
            }
            assert!(session.is_completed(), "seed {seed}");
            assert!(session.all_collected());
        }
    }

    #[test]
    fn wall_follower_anchors_then_never_walks_into_walls() {
        let mut session = session(Difficulty::Normal, 9);
        let mut policy = GameplayStrategy::WallFollower.create_policy(9);
        assert_eq!(policy.next_action(&session), MoveAction::TurnLeft);
        session.try_move(MoveAction::TurnLeft);
        for _ in 0..2_000 {
            let action = policy.next_action(&session);
            let outcome = session.try_move(action);
            assert!(!outcome.blocked);
            if session.is_completed() {
                break;
            }
        }
    }

    #[test]
    fn random_walk_is_seeded() {
        let session = session(Difficulty::Easy, 1);
        let mut a = GameplayStrategy::RandomWalk.create_policy(77);
        let mut b = GameplayStrategy::RandomWalk.create_policy(77);
        let first: Vec<MoveAction> = (0..32).map(|_| a.next_action(&session)).collect();
        let second: Vec<MoveAction> = (0..32).map(|_| b.next_action(&session)).collect();
        assert_eq!(first, second);
        assert_eq!(a.name(), "random_walk");
    }
}
