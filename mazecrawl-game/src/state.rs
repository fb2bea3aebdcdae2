//! Game session state machine: movement, collection, goal gating, and time.
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::time::Duration;

use crate::clock::SessionClock;
use crate::collectibles::{Collectible, CollectibleStatus, place_collectibles};
use crate::constants::LOG_TARGET_SESSION;
use crate::difficulty::{Difficulty, DifficultyTable};
use crate::discovery::DiscoveryGrid;
use crate::error::MazeError;
use crate::maze::{Grid, Position, generate, validate_dimensions};
use crate::numbers::percent_of;
use crate::pose::{Heading, MoveAction, PlayerPose};
use crate::seed::SeedStreams;

/// Fully resolved configuration of one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    pub difficulty: Difficulty,
    pub width: usize,
    pub height: usize,
    pub collectible_count: usize,
    /// Lock motion input after each applied action until
    /// [`GameSession::finish_transition`] is called.
    #[serde(default)]
    pub require_transition_ack: bool,
}

impl SessionConfig {
    /// Resolve a tier against a preset table.
    #[must_use]
    pub const fn for_difficulty(table: &DifficultyTable, difficulty: Difficulty) -> Self {
        let preset = table.preset(difficulty);
        Self {
            difficulty,
            width: preset.width,
            height: preset.height,
            collectible_count: preset.collectible_count,
            require_transition_ack: false,
        }
    }

    #[must_use]
    pub const fn with_transition_ack(mut self, required: bool) -> Self {
        self.require_transition_ack = required;
        self
    }

    /// # Errors
    ///
    /// Returns `MazeError::InvalidDimensions` when the maze size is rejected.
    pub fn validate(&self) -> Result<(), MazeError> {
        validate_dimensions(self.width, self.height)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    #[default]
    Playing,
    Completed,
}

/// Why an input was dropped without touching the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IgnoreReason {
    TransitionPending,
    SessionCompleted,
}

/// Emitted exactly once, when the session enters `Completed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionEvent {
    pub difficulty: Difficulty,
    pub elapsed: Duration,
}

/// Result of one input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveOutcome {
    pub action: MoveAction,
    /// Pose after the input was handled.
    pub pose: PlayerPose,
    pub moved: bool,
    /// A translation hit a wall or the grid edge.
    pub blocked: bool,
    pub revealed: usize,
    pub collected: SmallVec<[usize; 2]>,
    pub completion: Option<CompletionEvent>,
    pub ignored: Option<IgnoreReason>,
}

impl MoveOutcome {
    fn ignored(action: MoveAction, pose: PlayerPose, reason: IgnoreReason) -> Self {
        Self {
            action,
            pose,
            moved: false,
            blocked: false,
            revealed: 0,
            collected: SmallVec::new(),
            completion: None,
            ignored: Some(reason),
        }
    }
}

/// Map panel figures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapStats {
    pub position: Position,
    pub heading: Heading,
    /// Discovered open cells over all open cells, rounded to a whole percent.
    pub explored_percent: u8,
    pub distance_to_goal: usize,
}

/// One maze run. Replaced wholesale on restart or difficulty change.
#[derive(Debug, Clone)]
pub struct GameSession {
    config: SessionConfig,
    seed: u64,
    grid: Grid,
    discovery: DiscoveryGrid,
    pose: PlayerPose,
    collectibles: Vec<Collectible>,
    clock: SessionClock,
    phase: SessionPhase,
    transition_pending: bool,
}

impl GameSession {
    /// Generate a maze, place collectibles, and start playing.
    ///
    /// # Errors
    ///
    /// Returns `MazeError::InvalidDimensions` or `MazeError::PlacementExhausted`
    /// when the session cannot be built.
    pub fn new(config: SessionConfig, seed: u64) -> Result<Self, MazeError> {
        config.validate()?;
        let mut streams = SeedStreams::from_user_seed(seed);
        let grid = generate(config.width, config.height, streams.maze())?;
        let collectibles =
            place_collectibles(&grid, config.collectible_count, streams.placement())?;
        log::debug!(
            target: LOG_TARGET_SESSION,
            "session {} seed={seed} fingerprint={:016x}",
            config.difficulty,
            grid.fingerprint()
        );
        Ok(Self::assemble(config, seed, grid, collectibles))
    }

    fn assemble(
        config: SessionConfig,
        seed: u64,
        grid: Grid,
        collectibles: Vec<Collectible>,
    ) -> Self {
        let pose = PlayerPose::new(grid.start(), Heading::North);
        let mut discovery = DiscoveryGrid::for_grid(&grid);
        discovery.reveal(&grid, pose.position);
        Self {
            config,
            seed,
            grid,
            discovery,
            pose,
            collectibles,
            clock: SessionClock::started(),
            phase: SessionPhase::Playing,
            transition_pending: false,
        }
    }

    /// Replace this session with a fresh one under the same configuration.
    ///
    /// The new session is built before anything is swapped, so on error the
    /// current session is left untouched.
    ///
    /// # Errors
    ///
    /// Propagates construction failures from [`GameSession::new`].
    pub fn reset(&mut self, seed: u64) -> Result<(), MazeError> {
        let next = Self::new(self.config, seed)?;
        self.replace(next);
        Ok(())
    }

    /// Swap in an already built session, stopping this one's clock first.
    pub fn replace(&mut self, next: Self) {
        self.clock.stop();
        *self = next;
    }

    #[must_use]
    pub const fn config(&self) -> &SessionConfig {
        &self.config
    }

    #[must_use]
    pub const fn difficulty(&self) -> Difficulty {
        self.config.difficulty
    }

    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    #[must_use]
    pub const fn grid(&self) -> &Grid {
        &self.grid
    }

    #[must_use]
    pub const fn discovery(&self) -> &DiscoveryGrid {
        &self.discovery
    }

    #[must_use]
    pub const fn pose(&self) -> PlayerPose {
        self.pose
    }

    #[must_use]
    pub fn collectibles(&self) -> &[Collectible] {
        &self.collectibles
    }

    /// Collectibles still on the board.
    pub fn pending_collectibles(&self) -> impl Iterator<Item = &Collectible> {
        self.collectibles.iter().filter(|item| !item.is_collected())
    }

    #[must_use]
    pub fn collected_count(&self) -> usize {
        self.collectibles
            .iter()
            .filter(|item| item.is_collected())
            .count()
    }

    #[must_use]
    pub fn collectible_total(&self) -> usize {
        self.collectibles.len()
    }

    #[must_use]
    pub fn all_collected(&self) -> bool {
        self.collectibles.iter().all(Collectible::is_collected)
    }

    #[must_use]
    pub const fn phase(&self) -> SessionPhase {
        self.phase
    }

    #[must_use]
    pub const fn is_completed(&self) -> bool {
        matches!(self.phase, SessionPhase::Completed)
    }

    #[must_use]
    pub const fn clock(&self) -> &SessionClock {
        &self.clock
    }

    #[must_use]
    pub const fn elapsed(&self) -> Duration {
        self.clock.elapsed()
    }

    #[must_use]
    pub const fn transition_pending(&self) -> bool {
        self.transition_pending
    }

    /// Advance elapsed time. Ignored once the session has completed.
    pub fn tick(&mut self, delta: Duration) {
        self.clock.tick(delta);
    }

    /// Release the motion lock taken by the previous input.
    pub const fn finish_transition(&mut self) {
        self.transition_pending = false;
    }

    /// Apply one input.
    ///
    /// Turns always succeed. Translations move only onto an in-bounds open
    /// cell; a blocked translation leaves the pose unchanged. After the
    /// action the 3x3 block around the player is revealed, collectibles on
    /// the player's cell are collected, and the goal is checked, in that
    /// order.
    pub fn try_move(&mut self, action: MoveAction) -> MoveOutcome {
        if self.is_completed() {
            return MoveOutcome::ignored(action, self.pose, IgnoreReason::SessionCompleted);
        }
        if self.transition_pending {
            return MoveOutcome::ignored(action, self.pose, IgnoreReason::TransitionPending);
        }

        let mut moved = false;
        let mut blocked = false;
        match action {
            MoveAction::TurnLeft => self.pose.heading = self.pose.heading.turn_left(),
            MoveAction::TurnRight => self.pose.heading = self.pose.heading.turn_right(),
            MoveAction::Forward | MoveAction::Backward => {
                match self.pose.step_target(action) {
                    Some(target) if self.grid.is_open(target) => {
                        self.pose.position = target;
                        moved = true;
                    }
                    _ => blocked = true,
                }
            }
        }

        let revealed = self.discovery.reveal(&self.grid, self.pose.position);
        let collected = self.collect();
        let completion = self.check_goal();
        self.transition_pending = self.config.require_transition_ack;

        log::trace!(
            target: LOG_TARGET_SESSION,
            "{action} -> ({}) facing {} moved={moved} revealed={revealed}",
            self.pose.position,
            self.pose.heading
        );

        MoveOutcome {
            action,
            pose: self.pose,
            moved,
            blocked,
            revealed,
            collected,
            completion,
            ignored: None,
        }
    }

    /// Collect every present collectible on the player's cell, returning the
    /// ids collected by this call.
    pub fn collect(&mut self) -> SmallVec<[usize; 2]> {
        let here = self.pose.position;
        let mut collected = SmallVec::new();
        for item in &mut self.collectibles {
            if item.position == here && item.status == CollectibleStatus::Present {
                item.status = CollectibleStatus::Collected;
                collected.push(item.id);
            }
        }
        collected
    }

    /// Enter `Completed` when the player stands on the goal with nothing left
    /// to collect. Returns the completion event on the transition only.
    pub fn check_goal(&mut self) -> Option<CompletionEvent> {
        if self.is_completed() || self.pose.position != self.grid.goal() || !self.all_collected()
        {
            return None;
        }
        self.phase = SessionPhase::Completed;
        self.clock.stop();
        let event = CompletionEvent {
            difficulty: self.config.difficulty,
            elapsed: self.clock.elapsed(),
        };
        log::info!(
            target: LOG_TARGET_SESSION,
            "{} maze completed in {:?}",
            event.difficulty,
            event.elapsed
        );
        Some(event)
    }

    #[must_use]
    pub fn map_stats(&self) -> MapStats {
        MapStats {
            position: self.pose.position,
            heading: self.pose.heading,
            explored_percent: percent_of(
                self.discovery.explored_open_count(),
                self.grid.open_count(),
            ),
            distance_to_goal: self.pose.position.manhattan(self.grid.goal()),
        }
    }
}
