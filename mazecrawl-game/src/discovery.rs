//! Fog-of-war tracking over a generated maze.
use serde::{Deserialize, Serialize};

use crate::maze::{CellKind, Grid, Position};

/// What the player knows about a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Discovery {
    #[default]
    Unknown,
    KnownOpen,
    KnownWall,
}

impl Discovery {
    #[must_use]
    pub const fn is_known(self) -> bool {
        !matches!(self, Self::Unknown)
    }

    const fn from_cell(kind: CellKind) -> Self {
        match kind {
            CellKind::Open => Self::KnownOpen,
            CellKind::Wall => Self::KnownWall,
        }
    }
}

/// Per-cell knowledge, parallel to a [`Grid`] of the same size.
///
/// Cells only ever leave `Unknown`; once known they keep the value they were
/// revealed with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveryGrid {
    width: usize,
    height: usize,
    cells: Vec<Discovery>,
}

impl DiscoveryGrid {
    /// All-unknown grid matching the dimensions of `grid`.
    #[must_use]
    pub fn for_grid(grid: &Grid) -> Self {
        Self {
            width: grid.width(),
            height: grid.height(),
            cells: vec![Discovery::Unknown; grid.width() * grid.height()],
        }
    }

    #[must_use]
    pub const fn width(&self) -> usize {
        self.width
    }

    #[must_use]
    pub const fn height(&self) -> usize {
        self.height
    }

    /// Knowledge at `pos`; out-of-bounds cells read as `Unknown`.
    #[must_use]
    pub fn get(&self, pos: Position) -> Discovery {
        if pos.x < self.width && pos.y < self.height {
            self.cells
                .get(pos.y * self.width + pos.x)
                .copied()
                .unwrap_or_default()
        } else {
            Discovery::Unknown
        }
    }

    /// Reveal the 3x3 block centred on `center`, clipped to the grid.
    ///
    /// Only `Unknown` cells change. Returns how many cells were newly
    /// revealed, so a repeat call at the same centre returns 0.
    pub fn reveal(&mut self, grid: &Grid, center: Position) -> usize {
        let mut revealed = 0;
        for dy in -1..=1 {
            for dx in -1..=1 {
                let Some(pos) = center.offset(dx, dy) else {
                    continue;
                };
                let Some(kind) = grid.get(pos) else {
                    continue;
                };
                if pos.x >= self.width || pos.y >= self.height {
                    continue;
                }
                let idx = pos.y * self.width + pos.x;
                if let Some(cell) = self.cells.get_mut(idx)
                    && *cell == Discovery::Unknown
                {
                    *cell = Discovery::from_cell(kind);
                    revealed += 1;
                }
            }
        }
        revealed
    }

    #[must_use]
    pub fn known_count(&self) -> usize {
        self.cells.iter().filter(|cell| cell.is_known()).count()
    }

    /// Number of cells revealed as open.
    #[must_use]
    pub fn explored_open_count(&self) -> usize {
        self.cells
            .iter()
            .filter(|cell| **cell == Discovery::KnownOpen)
            .count()
    }

    /// Row-major iterator over every cell's knowledge.
    pub fn cells(&self) -> impl Iterator<Item = (Position, Discovery)> + '_ {
        self.cells.iter().enumerate().map(|(idx, cell)| {
            (Position::new(idx % self.width, idx / self.width), *cell)
        })
    }
}
