//! Maze grid model and randomized depth-first maze carving.
//!
//! A maze is a `width x height` grid of wall/open cells with odd dimensions.
//! Odd coordinates are "rooms" and the cells between two rooms are the
//! passages carved while the generator walks its explicit stack. After the
//! perfect (tree-shaped) maze exists, loop injection opens extra walls so the
//! player has alternate routes.
use rand::Rng;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::VecDeque;
use std::fmt;
use std::hash::Hasher;
use twox_hash::XxHash64;

use crate::constants::{LOG_TARGET_MAZE, LOOP_DIVISOR, MIN_MAZE_DIMENSION, START_X, START_Y};
use crate::error::MazeError;

/// Value of a single maze cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CellKind {
    Wall,
    Open,
}

impl CellKind {
    #[must_use]
    pub const fn is_open(self) -> bool {
        matches!(self, Self::Open)
    }
}

/// Integer grid coordinate; `x` grows east, `y` grows south.
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Position {
    pub x: usize,
    pub y: usize,
}

impl Position {
    #[must_use]
    pub const fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }

    /// Shift by a signed offset, returning `None` when either axis underflows.
    #[must_use]
    pub const fn offset(self, dx: isize, dy: isize) -> Option<Self> {
        let Some(x) = self.x.checked_add_signed(dx) else {
            return None;
        };
        let Some(y) = self.y.checked_add_signed(dy) else {
            return None;
        };
        Some(Self { x, y })
    }

    /// Taxicab distance between two cells.
    #[must_use]
    pub const fn manhattan(self, other: Self) -> usize {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "X: {}, Y: {}", self.x, self.y)
    }
}

/// Row-major wall/open grid. Immutable once handed to a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid {
    width: usize,
    height: usize,
    cells: Vec<CellKind>,
}

impl Grid {
    fn filled(width: usize, height: usize, kind: CellKind) -> Self {
        Self {
            width,
            height,
            cells: vec![kind; width * height],
        }
    }

    /// Build a grid from rows of cells. Intended for fixtures and replays.
    ///
    /// # Errors
    ///
    /// Returns `MazeError::InvalidDimensions` when rows are ragged, the
    /// dimensions fail the odd/minimum constraint, or the start or goal cell
    /// is a wall.
    pub fn from_rows(rows: &[Vec<CellKind>]) -> Result<Self, MazeError> {
        let height = rows.len();
        let width = rows.first().map_or(0, Vec::len);
        validate_dimensions(width, height)?;
        if rows.iter().any(|row| row.len() != width) {
            return Err(invalid_dimensions(width, height));
        }
        let grid = Self {
            width,
            height,
            cells: rows.iter().flatten().copied().collect(),
        };
        if !grid.is_open(grid.start()) || !grid.is_open(grid.goal()) {
            return Err(invalid_dimensions(width, height));
        }
        Ok(grid)
    }

    #[must_use]
    pub const fn width(&self) -> usize {
        self.width
    }

    #[must_use]
    pub const fn height(&self) -> usize {
        self.height
    }

    /// Fixed start cell, always (1, 1).
    #[must_use]
    pub const fn start(&self) -> Position {
        Position::new(START_X, START_Y)
    }

    /// Fixed goal cell in the opposite interior corner.
    #[must_use]
    pub const fn goal(&self) -> Position {
        Position::new(self.width - 2, self.height - 2)
    }

    #[must_use]
    pub const fn in_bounds(&self, pos: Position) -> bool {
        pos.x < self.width && pos.y < self.height
    }

    /// Cell at `pos`, or `None` outside the grid.
    #[must_use]
    pub fn get(&self, pos: Position) -> Option<CellKind> {
        if self.in_bounds(pos) {
            self.cells.get(self.index(pos)).copied()
        } else {
            None
        }
    }

    /// Whether `pos` is inside the grid and open. Out-of-bounds is never open.
    #[must_use]
    pub fn is_open(&self, pos: Position) -> bool {
        self.get(pos).is_some_and(CellKind::is_open)
    }

    /// Row-major iterator over every cell and its position.
    pub fn cells(&self) -> impl Iterator<Item = (Position, CellKind)> + '_ {
        self.cells.iter().enumerate().map(|(idx, kind)| {
            let pos = Position::new(idx % self.width, idx / self.width);
            (pos, *kind)
        })
    }

    /// Positions of all open cells in row-major order.
    pub fn open_cells(&self) -> impl Iterator<Item = Position> + '_ {
        self.cells()
            .filter(|(_, kind)| kind.is_open())
            .map(|(pos, _)| pos)
    }

    #[must_use]
    pub fn open_count(&self) -> usize {
        self.cells.iter().filter(|kind| kind.is_open()).count()
    }

    /// Number of 4-adjacent open/open pairs, each pair counted once.
    #[must_use]
    pub fn open_edge_count(&self) -> usize {
        self.open_cells()
            .map(|pos| {
                let east = pos.offset(1, 0).is_some_and(|p| self.is_open(p));
                let south = pos.offset(0, 1).is_some_and(|p| self.is_open(p));
                usize::from(east) + usize::from(south)
            })
            .sum()
    }

    /// Open cells reachable from `origin` through open 4-neighbors, in
    /// breadth-first order. Empty when `origin` is not open.
    #[must_use]
    pub fn reachable_from(&self, origin: Position) -> Vec<Position> {
        if !self.is_open(origin) {
            return Vec::new();
        }
        let mut seen = vec![false; self.cells.len()];
        let mut queue = VecDeque::from([origin]);
        seen[self.index(origin)] = true;
        let mut reached = Vec::new();
        while let Some(pos) = queue.pop_front() {
            reached.push(pos);
            for next in self.open_neighbors(pos) {
                if !seen[self.index(next)] {
                    seen[self.index(next)] = true;
                    queue.push_back(next);
                }
            }
        }
        reached
    }

    /// Count of open cells reachable from `origin` through open 4-neighbors.
    #[must_use]
    pub fn reachable_count(&self, origin: Position) -> usize {
        self.reachable_from(origin).len()
    }

    fn open_neighbors(&self, pos: Position) -> SmallVec<[Position; 4]> {
        [(0, -1), (1, 0), (0, 1), (-1, 0)]
            .into_iter()
            .filter_map(|(dx, dy)| pos.offset(dx, dy))
            .filter(|next| self.is_open(*next))
            .collect()
    }

    fn has_open_neighbor(&self, pos: Position) -> bool {
        !self.open_neighbors(pos).is_empty()
    }

    /// True when every open cell is reachable from the start cell.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.reachable_count(self.start()) == self.open_count()
    }

    /// Stable 64-bit digest of the layout, for cheap determinism checks.
    #[must_use]
    pub fn fingerprint(&self) -> u64 {
        let mut hasher = XxHash64::with_seed(0);
        hasher.write_usize(self.width);
        hasher.write_usize(self.height);
        for kind in &self.cells {
            hasher.write_u8(u8::from(kind.is_open()));
        }
        hasher.finish()
    }

    const fn index(&self, pos: Position) -> usize {
        pos.y * self.width + pos.x
    }

    fn set(&mut self, pos: Position, kind: CellKind) {
        let idx = self.index(pos);
        if let Some(cell) = self.cells.get_mut(idx) {
            *cell = kind;
        }
    }
}

/// Text rendering: `#` wall, space open, `S` start, `G` goal.
impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for y in 0..self.height {
            for x in 0..self.width {
                let pos = Position::new(x, y);
                let symbol = if pos == self.start() {
                    'S'
                } else if pos == self.goal() {
                    'G'
                } else if self.is_open(pos) {
                    ' '
                } else {
                    '#'
                };
                write!(f, "{symbol}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

fn invalid_dimensions(width: usize, height: usize) -> MazeError {
    MazeError::InvalidDimensions {
        width,
        height,
        min: MIN_MAZE_DIMENSION,
    }
}

/// Check the odd and minimum-size constraint on maze dimensions.
///
/// # Errors
///
/// Returns `MazeError::InvalidDimensions` when either side is even or below
/// the minimum.
pub fn validate_dimensions(width: usize, height: usize) -> Result<(), MazeError> {
    let valid = |side: usize| side >= MIN_MAZE_DIMENSION && side % 2 == 1;
    if valid(width) && valid(height) {
        Ok(())
    } else {
        Err(invalid_dimensions(width, height))
    }
}

/// Number of loop-injection draws for a maze of the given size.
#[must_use]
pub const fn loop_count(width: usize, height: usize) -> usize {
    width * height / LOOP_DIVISOR
}

/// Generate a maze: carve a perfect maze, then inject loops.
///
/// # Errors
///
/// Returns `MazeError::InvalidDimensions` when the dimensions are rejected.
pub fn generate<R: Rng + ?Sized>(
    width: usize,
    height: usize,
    rng: &mut R,
) -> Result<Grid, MazeError> {
    let mut grid = carve_perfect(width, height, rng)?;
    let opened = inject_loops(&mut grid, loop_count(width, height), rng);
    log::debug!(
        target: LOG_TARGET_MAZE,
        "generated {width}x{height} maze: {} open cells, {opened} loop openings",
        grid.open_count()
    );
    Ok(grid)
}

/// Carve a perfect maze with an explicit-stack recursive backtracker.
///
/// The open cells form a spanning tree: exactly one simple path joins any
/// two of them.
///
/// # Errors
///
/// Returns `MazeError::InvalidDimensions` when the dimensions are rejected.
pub fn carve_perfect<R: Rng + ?Sized>(
    width: usize,
    height: usize,
    rng: &mut R,
) -> Result<Grid, MazeError> {
    validate_dimensions(width, height)?;
    let mut grid = Grid::filled(width, height, CellKind::Wall);
    let start = grid.start();
    grid.set(start, CellKind::Open);
    let mut stack = vec![start];

    while let Some(&current) = stack.last() {
        let candidates = carve_candidates(&grid, current);
        if candidates.is_empty() {
            stack.pop();
            continue;
        }
        let (next, passage) = candidates[rng.gen_range(0..candidates.len())];
        grid.set(passage, CellKind::Open);
        grid.set(next, CellKind::Open);
        stack.push(next);
    }

    let goal = grid.goal();
    grid.set(goal, CellKind::Open);
    Ok(grid)
}

/// Rooms two steps away that are still walled, paired with the wall between.
fn carve_candidates(grid: &Grid, from: Position) -> SmallVec<[(Position, Position); 4]> {
    let mut out = SmallVec::new();
    for (dx, dy) in [(-1, 0), (1, 0), (0, -1), (0, 1)] {
        let (Some(passage), Some(next)) = (from.offset(dx, dy), from.offset(dx * 2, dy * 2))
        else {
            continue;
        };
        let interior = next.x >= 1
            && next.y >= 1
            && next.x <= grid.width - 2
            && next.y <= grid.height - 2;
        if interior
            && grid.get(next) == Some(CellKind::Wall)
            && grid.get(passage) == Some(CellKind::Wall)
        {
            out.push((next, passage));
        }
    }
    out
}

/// Open up to `attempts` random interior walls, returning how many flipped.
///
/// A wall is only opened when one of its 4-neighbors is already open, so
/// every new cell joins the existing open region and connectivity holds.
/// Draws that land on open cells or isolated walls are spent without effect.
pub fn inject_loops<R: Rng + ?Sized>(grid: &mut Grid, attempts: usize, rng: &mut R) -> usize {
    let mut opened = 0;
    for _ in 0..attempts {
        let pos = Position::new(
            rng.gen_range(1..grid.width - 1),
            rng.gen_range(1..grid.height - 1),
        );
        if grid.get(pos) == Some(CellKind::Wall) && grid.has_open_neighbor(pos) {
            grid.set(pos, CellKind::Open);
            opened += 1;
        }
    }
    opened
}
