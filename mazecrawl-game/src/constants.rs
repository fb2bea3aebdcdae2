//! Centralized tuning constants for mazecrawl game logic.
//!
//! These values define the deterministic rules of maze construction and
//! session bookkeeping. Keeping them together means a change in behavior is
//! always a reviewed code change.

// Maze construction ---------------------------------------------------------
/// Smallest accepted width or height; carving needs one interior ring.
pub const MIN_MAZE_DIMENSION: usize = 5;
/// Loop injection attempts are `width * height / LOOP_DIVISOR`.
pub const LOOP_DIVISOR: usize = 15;
/// Column of the start cell.
pub const START_X: usize = 1;
/// Row of the start cell.
pub const START_Y: usize = 1;

// Collectible placement -----------------------------------------------------
/// Rejection-sampling draws per collectible before falling back to enumeration.
pub const MAX_PLACEMENT_ATTEMPTS: u32 = 4_096;

// Persistence ---------------------------------------------------------------
/// Placeholder rendered when no best time exists.
pub const NO_RECORD_LABEL: &str = "--:--";

// Logging targets -----------------------------------------------------------
pub(crate) const LOG_TARGET_MAZE: &str = "mazecrawl::maze";
pub(crate) const LOG_TARGET_SESSION: &str = "mazecrawl::session";
pub(crate) const LOG_TARGET_RECORDS: &str = "mazecrawl::records";
