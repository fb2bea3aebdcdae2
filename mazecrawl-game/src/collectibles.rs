//! Collectible items and their placement on a maze.
use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::constants::{LOG_TARGET_MAZE, MAX_PLACEMENT_ATTEMPTS};
use crate::error::MazeError;
use crate::maze::{Grid, Position};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectibleStatus {
    #[default]
    Present,
    Collected,
}

/// A pickup fixed to one open cell that is neither start nor goal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collectible {
    pub id: usize,
    pub position: Position,
    pub status: CollectibleStatus,
}

impl Collectible {
    #[must_use]
    pub const fn is_collected(&self) -> bool {
        matches!(self.status, CollectibleStatus::Collected)
    }
}

/// Open cells reachable from the start, excluding the start and goal.
fn eligible_cells(grid: &Grid) -> Vec<Position> {
    let (start, goal) = (grid.start(), grid.goal());
    let mut cells: Vec<Position> = grid
        .reachable_from(start)
        .into_iter()
        .filter(|pos| *pos != start && *pos != goal)
        .collect();
    cells.sort_unstable_by_key(|pos| (pos.y, pos.x));
    cells
}

/// Place `count` collectibles on distinct eligible cells.
///
/// Each collectible is drawn by rejection sampling over interior cells. A
/// draw is rejected unless it lands on an unoccupied cell that is open,
/// reachable from the start, and neither start nor goal. If a collectible
/// exhausts its draw budget, the remaining eligible cells are enumerated and
/// one is chosen uniformly.
///
/// # Errors
///
/// Returns `MazeError::PlacementExhausted` when fewer than `count` eligible
/// cells exist.
pub fn place_collectibles<R: Rng + ?Sized>(
    grid: &Grid,
    count: usize,
    rng: &mut R,
) -> Result<Vec<Collectible>, MazeError> {
    let eligible = eligible_cells(grid);
    if eligible.len() < count {
        return Err(MazeError::PlacementExhausted {
            requested: count,
            available: eligible.len(),
        });
    }

    let eligible_set: HashSet<Position> = eligible.iter().copied().collect();
    let mut placed: Vec<Collectible> = Vec::with_capacity(count);
    for id in 0..count {
        let occupied = |pos: Position, placed: &[Collectible]| {
            placed.iter().any(|item| item.position == pos)
        };
        let mut chosen = None;
        for _ in 0..MAX_PLACEMENT_ATTEMPTS {
            let candidate = Position::new(
                rng.gen_range(1..grid.width() - 1),
                rng.gen_range(1..grid.height() - 1),
            );
            if eligible_set.contains(&candidate) && !occupied(candidate, &placed)
            {
                chosen = Some(candidate);
                break;
            }
        }
        let position = if let Some(pos) = chosen {
            pos
        } else {
            log::warn!(
                target: LOG_TARGET_MAZE,
                "collectible {id} exhausted {MAX_PLACEMENT_ATTEMPTS} draws; enumerating free cells"
            );
            let free: Vec<Position> = eligible
                .iter()
                .copied()
                .filter(|pos| !occupied(*pos, &placed))
                .collect();
            let Some(pos) = free.choose(rng).copied() else {
                return Err(MazeError::PlacementExhausted {
                    requested: count,
                    available: eligible.len(),
                });
            };
            pos
        };
        placed.push(Collectible {
            id,
            position,
            status: CollectibleStatus::Present,
        });
    }

    log::debug!(
        target: LOG_TARGET_MAZE,
        "placed {count} collectibles among {} eligible cells",
        eligible.len()
    );
    Ok(placed)
}
