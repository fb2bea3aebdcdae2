pub mod catalog;

use crate::logic::SimulationPlan;

// Logic test scenario
#[derive(Debug, Clone)]
pub struct TestScenario {
    pub name: String,
    pub plan: SimulationPlan,
}

impl TestScenario {
    #[must_use]
    pub fn simulation(name: impl Into<String>, plan: SimulationPlan) -> Self {
        Self {
            name: name.into(),
            plan,
        }
    }
}

pub fn get_scenario(name: &str) -> Option<TestScenario> {
    let scenario = match name.to_lowercase().as_str() {
        "smoke" => catalog::smoke(),
        "connectivity" | "connected" => catalog::connectivity(),
        "perfect-maze" | "perfect" => catalog::perfect_maze(),
        "loop-injection" | "loops" => catalog::loop_injection(),
        "discovery" | "fog" => catalog::discovery(),
        "movement-legality" | "movement" => catalog::movement_legality(),
        "collection" | "collectibles" => catalog::collection(),
        "goal-gating" | "goal" => catalog::goal_gating(),
        "best-time" | "records" => catalog::best_time(),
        "deterministic" | "replay" => catalog::deterministic(),
        "full-run-planner" | "planner" => catalog::full_run_planner(),
        "full-run-wall-follower" | "wall-follower" => catalog::full_run_wall_follower(),
        "random-walk" | "random" => catalog::random_walk(),
        _ => return None,
    };
    Some(scenario)
}

pub fn list_scenarios() -> Vec<(&'static str, &'static str)> {
    vec![
        ("smoke", "Smoke Test"),
        ("connectivity", "Maze Connectivity"),
        ("perfect-maze", "Perfect Maze Carving"),
        ("loop-injection", "Loop Injection"),
        ("discovery", "Fog of War Discovery"),
        ("movement-legality", "Movement Legality"),
        ("collection", "Collectible Collection"),
        ("goal-gating", "Goal Gating"),
        ("best-time", "Best Time Recording"),
        ("deterministic", "Deterministic Replay"),
        ("full-run-planner", "Full Run - Planner"),
        ("full-run-wall-follower", "Full Run - Wall Follower"),
        ("random-walk", "Random Walk Robustness"),
    ]
}
