//! Mazecrawl Game Engine
//!
//! Platform-agnostic core of a first-person maze exploration game: maze
//! carving with loop injection, fog-of-war discovery, collision-gated grid
//! movement, collectible and goal gating, and per-difficulty best times.
//! Rendering, input mapping, and timers live with the caller; this crate
//! only consumes discrete inputs and ticks.

pub mod clock;
pub mod collectibles;
pub mod constants;
pub mod difficulty;
pub mod discovery;
pub mod error;
pub mod maze;
pub mod numbers;
pub mod pose;
pub mod records;
pub mod seed;
pub mod state;

use std::time::Duration;
use thiserror::Error;

// Re-export commonly used types
pub use clock::SessionClock;
pub use collectibles::{Collectible, CollectibleStatus, place_collectibles};
pub use difficulty::{Difficulty, DifficultyPreset, DifficultyTable};
pub use discovery::{Discovery, DiscoveryGrid};
pub use error::MazeError;
pub use maze::{CellKind, Grid, Position, carve_perfect, generate, inject_loops};
pub use pose::{Heading, MoveAction, PlayerPose};
pub use records::{
    BestTimeStore, FileStoreError, JsonFileStore, KeyValueStore, MemoryStore, RecordError,
    RecordOutcome, format_time,
};
pub use seed::{SeedStreams, decode_to_seed, encode_friendly, generate_code_from_entropy};
pub use state::{
    CompletionEvent, GameSession, IgnoreReason, MapStats, MoveOutcome, SessionConfig,
    SessionPhase,
};

#[derive(Debug, Error)]
pub enum EngineError<E>
where
    E: std::error::Error + 'static,
{
    #[error(transparent)]
    Session(#[from] MazeError),
    #[error(transparent)]
    Record(#[from] RecordError<E>),
    #[error("no session is active")]
    NoSession,
}

/// Completion event joined with the best-time verdict, as shown to players.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompletionReport {
    pub difficulty: Difficulty,
    pub elapsed: Duration,
    pub is_new_record: bool,
    pub best: Duration,
}

/// Everything the UI needs after one input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnReport {
    pub outcome: MoveOutcome,
    pub completion: Option<CompletionReport>,
}

/// Main game engine owning the active session and best-time storage
pub struct GameEngine<S>
where
    S: KeyValueStore,
{
    table: DifficultyTable,
    records: BestTimeStore<S>,
    session: Option<GameSession>,
    transition_ack: bool,
}

impl<S> GameEngine<S>
where
    S: KeyValueStore,
{
    /// Create an engine with the default difficulty presets.
    pub fn new(store: S) -> Self {
        Self::with_table(DifficultyTable::default(), store)
    }

    pub const fn with_table(table: DifficultyTable, store: S) -> Self {
        Self {
            table,
            records: BestTimeStore::new(store),
            session: None,
            transition_ack: false,
        }
    }

    /// Require [`GameEngine::finish_transition`] between motion inputs in
    /// sessions started from now on.
    #[must_use]
    pub const fn with_transition_ack(mut self, required: bool) -> Self {
        self.transition_ack = required;
        self
    }

    pub const fn table(&self) -> &DifficultyTable {
        &self.table
    }

    pub const fn session(&self) -> Option<&GameSession> {
        self.session.as_ref()
    }

    pub const fn records(&self) -> &BestTimeStore<S> {
        &self.records
    }

    pub fn into_store(self) -> S {
        self.records.into_inner()
    }

    /// Start a session for a difficulty tier.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Session` if the maze or collectibles cannot be
    /// built; the previous session, if any, stays active.
    pub fn start_session(
        &mut self,
        difficulty: Difficulty,
        seed: u64,
    ) -> Result<&GameSession, EngineError<S::Error>> {
        let config = SessionConfig::for_difficulty(&self.table, difficulty)
            .with_transition_ack(self.transition_ack);
        self.start_with_config(config, seed)
    }

    /// Start a session from an explicit configuration.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Session` if the maze or collectibles cannot be
    /// built; the previous session, if any, stays active.
    pub fn start_with_config(
        &mut self,
        config: SessionConfig,
        seed: u64,
    ) -> Result<&GameSession, EngineError<S::Error>> {
        let next = GameSession::new(config, seed)?;
        Ok(&*self.session.insert(next))
    }

    /// New maze under the active session's configuration.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::NoSession` when nothing is active, or
    /// `EngineError::Session` if the replacement cannot be built.
    pub fn restart(&mut self, seed: u64) -> Result<&GameSession, EngineError<S::Error>> {
        let config = *self.session.as_ref().ok_or(EngineError::NoSession)?.config();
        self.start_with_config(config, seed)
    }

    /// Apply one input to the active session and record a best time when it
    /// completes the maze.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::NoSession` when nothing is active, or
    /// `EngineError::Record` if the best-time store fails.
    pub fn handle_input(
        &mut self,
        action: MoveAction,
    ) -> Result<TurnReport, EngineError<S::Error>> {
        let session = self.session.as_mut().ok_or(EngineError::NoSession)?;
        let outcome = session.try_move(action);
        let completion = match outcome.completion {
            Some(event) => {
                let record = self.records.record_if_best(event.difficulty, event.elapsed)?;
                Some(CompletionReport {
                    difficulty: event.difficulty,
                    elapsed: event.elapsed,
                    is_new_record: record.is_new_record,
                    best: record.best,
                })
            }
            None => None,
        };
        Ok(TurnReport {
            outcome,
            completion,
        })
    }

    /// Advance the active session's clock; a no-op without a session.
    pub fn tick(&mut self, delta: Duration) {
        if let Some(session) = self.session.as_mut() {
            session.tick(delta);
        }
    }

    pub fn finish_transition(&mut self) {
        if let Some(session) = self.session.as_mut() {
            session.finish_transition();
        }
    }

    /// Best recorded time for a tier.
    ///
    /// # Errors
    ///
    /// Returns `RecordError` if the store fails or holds an unreadable value.
    pub fn best_time(
        &self,
        difficulty: Difficulty,
    ) -> Result<Option<Duration>, RecordError<S::Error>> {
        self.records.get_best(difficulty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::convert::Infallible;
    use std::rc::Rc;

    #[derive(Clone, Default)]
    struct SharedStore {
        entries: Rc<RefCell<HashMap<String, String>>>,
    }

    impl KeyValueStore for SharedStore {
        type Error = Infallible;

        fn get(&self, key: &str) -> Result<Option<String>, Self::Error> {
            Ok(self.entries.borrow().get(key).cloned())
        }

        fn set(&mut self, key: &str, value: &str) -> Result<(), Self::Error> {
            self.entries
                .borrow_mut()
                .insert(key.to_string(), value.to_string());
            Ok(())
        }
    }

    #[test]
    fn inputs_without_session_are_rejected() {
        let mut engine = GameEngine::new(MemoryStore::new());
        assert!(matches!(
            engine.handle_input(MoveAction::Forward),
            Err(EngineError::NoSession)
        ));
        assert!(matches!(engine.restart(1), Err(EngineError::NoSession)));
        engine.tick(Duration::from_secs(1));
        assert!(engine.session().is_none());
    }

    #[test]
    fn start_session_uses_preset_dimensions() {
        let mut engine = GameEngine::new(MemoryStore::new());
        let session = engine.start_session(Difficulty::Hard, 3).unwrap();
        assert_eq!(session.grid().width(), 51);
        assert_eq!(session.grid().height(), 31);
        assert_eq!(session.collectible_total(), 5);
    }

    #[test]
    fn failed_start_keeps_previous_session() {
        let mut engine = GameEngine::new(MemoryStore::new());
        let fingerprint = engine
            .start_session(Difficulty::Easy, 11)
            .unwrap()
            .grid()
            .fingerprint();
        let bad = SessionConfig {
            difficulty: Difficulty::Easy,
            width: 5,
            height: 5,
            collectible_count: 9,
            require_transition_ack: false,
        };
        let err = engine.start_with_config(bad, 12).unwrap_err();
        assert!(matches!(
            err,
            EngineError::Session(MazeError::PlacementExhausted { requested: 9, .. })
        ));
        let active = engine.session().unwrap();
        assert_eq!(active.seed(), 11);
        assert_eq!(active.grid().fingerprint(), fingerprint);
    }

    #[test]
    fn restart_keeps_configuration_and_resets_time() {
        let mut engine = GameEngine::new(MemoryStore::new()).with_transition_ack(true);
        engine.start_session(Difficulty::Normal, 4).unwrap();
        engine.tick(Duration::from_secs(12));
        assert_eq!(engine.session().unwrap().elapsed(), Duration::from_secs(12));
        let restarted = engine.restart(5).unwrap();
        assert_eq!(restarted.difficulty(), Difficulty::Normal);
        assert!(restarted.config().require_transition_ack);
        assert_eq!(restarted.elapsed(), Duration::ZERO);
        assert_eq!(restarted.seed(), 5);
    }

    #[test]
    fn transition_ack_flows_through_engine() {
        let mut engine = GameEngine::new(MemoryStore::new()).with_transition_ack(true);
        engine.start_session(Difficulty::Easy, 8).unwrap();
        let first = engine.handle_input(MoveAction::TurnRight).unwrap();
        assert!(first.outcome.ignored.is_none());
        let second = engine.handle_input(MoveAction::TurnRight).unwrap();
        assert_eq!(second.outcome.ignored, Some(IgnoreReason::TransitionPending));
        engine.finish_transition();
        let third = engine.handle_input(MoveAction::TurnRight).unwrap();
        assert_eq!(third.outcome.pose.heading, Heading::South);
    }

    #[test]
    fn best_time_reads_shared_store() {
        let store = SharedStore::default();
        store
            .entries
            .borrow_mut()
            .insert("easy".to_string(), "61000".to_string());
        let engine = GameEngine::new(store);
        assert_eq!(
            engine.best_time(Difficulty::Easy).unwrap(),
            Some(Duration::from_secs(61))
        );
        assert_eq!(engine.best_time(Difficulty::Hard).unwrap(), None);
    }
}
