#![allow(clippy::module_name_repetitions)]
//! A knowledge-based minesweeper player.
//!
//! Every revealed cell tells the player how many mines surround it. The
//! [`KnowledgeBase`] records each of these observations as a [`Clause`] ("N of
//! these cells are mines") and keeps resolving clauses that have become
//! trivial (all safe, or all mines) until nothing more can be learned. Moves
//! are then picked from the proven-safe cells, falling back to a random guess
//! when nothing is known to be safe.
use std::collections::HashSet;
use std::fmt;

use rand::Rng;
use thiserror::Error;
use tracing::info;

mod knowledge;
mod moves;
pub mod util;

pub use knowledge::{Clause, Deductions, KnowledgeBase};

/// A cell on the board, as `(row, column)`
pub type Cell = (usize, usize);

/// The dimensions of a rectangular board
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Grid {
    pub height: usize,
    pub width: usize,
}
impl Grid {
    pub fn new(height: usize, width: usize) -> Self {
        Self {
            height,
            width,
        }
    }

    /// Total number of cells on the board
    pub fn len(&self) -> usize {
        self.height * self.width
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, (row, col): Cell) -> bool {
        row < self.height && col < self.width
    }

    /// Every cell of the board, in row-major order
    pub fn cells(&self) -> impl Iterator<Item = Cell> {
        let width = self.width;
        (0..self.height).flat_map(move |row| (0..width).map(move |col| (row, col)))
    }

    /// Cells within one row and one column of `cell`, not including `cell`
    /// itself. Cells outside the board are skipped.
    pub fn neighbours(&self, (row, col): Cell) -> impl Iterator<Item = Cell> {
        let rows = row.saturating_sub(1)..(row + 2).min(self.height);
        let cols = col.saturating_sub(1)..(col + 2).min(self.width);
        itertools::iproduct!(rows, cols).filter(move |&other| other != (row, col))
    }
}

impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.height, self.width)
    }
}

/// The hidden board the player is probing.
///
/// The engine itself never asks the board anything; the game loop uses it to
/// turn a probe into an observation and to decide whether the game is over.
pub trait Minefield {
    fn grid(&self) -> Grid;

    fn is_mine(&self, cell: Cell) -> bool;

    /// Number of mines among the neighbours of `cell`
    fn nearby_mines(&self, cell: Cell) -> usize;

    /// Whether `flagged` is exactly the set of mines on this board
    fn won(&self, flagged: &HashSet<Cell>) -> bool;
}

/// The accumulated knowledge is logically inconsistent.
///
/// Only happens if the observations fed to the engine contradict each other;
/// the knowledge base refuses any further inference once this is raised.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, Error)]
#[error("inconsistent knowledge{}: {reason}", location(.cell))]
pub struct InconsistencyError {
    /// The cell being processed when the inconsistency surfaced, if any
    pub cell: Option<Cell>,
    pub reason: &'static str,
}
impl InconsistencyError {
    pub(crate) fn new(reason: &'static str) -> Self {
        Self {
            cell: None,
            reason,
        }
    }

    pub(crate) fn at(cell: Cell, reason: &'static str) -> Self {
        Self {
            cell: Some(cell),
            reason,
        }
    }
}

fn location(cell: &Option<Cell>) -> String {
    cell.map(|cell| format!(" at {cell:?}")).unwrap_or_default()
}

/// An observation that can't be applied. Nothing has been changed when one of
/// these is returned.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, Error)]
pub enum ObservationError {
    #[error("cell {cell:?} is outside the {grid} board")]
    OutOfBounds { cell: Cell, grid: Grid },
    #[error("cell {cell:?} can't border {count} mines (allowed {min}..={max})")]
    ImpossibleCount {
        cell: Cell,
        count: usize,
        min: usize,
        max: usize,
    },
    #[error("cell {cell:?} was already observed with {previous} mines, not {count}")]
    Conflicting {
        cell: Cell,
        previous: usize,
        count: usize,
    },
    #[error("cell {0:?} is known to be a mine")]
    KnownMine(Cell),
}

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, Error)]
pub enum InferenceError {
    #[error(transparent)]
    Contradiction(#[from] InconsistencyError),
    #[error(transparent)]
    InvalidObservation(#[from] ObservationError),
    /// A previous contradiction left the knowledge base unusable
    #[error("inference halted by an earlier contradiction")]
    Halted,
}

/// How a game played by [`play`] ended
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub enum Outcome {
    /// Every mine has been identified
    Won,
    /// The player probed a mine
    Lost(Cell),
    /// No move was left to make but not every mine was identified
    Exhausted,
}

/// Play a whole game against `board`, probing proven-safe cells first and
/// guessing only when nothing is known to be safe.
///
/// # Errors
///
/// Propagates any [`InferenceError`] raised by the knowledge base; with an
/// honest board this only happens if `knowledge` was built for a different
/// grid or already holds contradicting observations.
pub fn play<R: Rng + ?Sized>(
    board: &impl Minefield,
    knowledge: &mut KnowledgeBase,
    rng: &mut R,
) -> Result<Outcome, InferenceError> {
    loop {
        if knowledge.is_won(board) {
            info!(moves = knowledge.moves_made().len(), "all mines identified");
            return Ok(Outcome::Won);
        }
        let Some(cell) = knowledge.next_move(rng) else {
            info!(
                moves = knowledge.moves_made().len(),
                mines_found = knowledge.mines().len(),
                "no moves left"
            );
            return Ok(Outcome::Exhausted);
        };
        if board.is_mine(cell) {
            info!(?cell, moves = knowledge.moves_made().len(), "probed a mine");
            return Ok(Outcome::Lost(cell));
        }
        knowledge.observe(cell, board.nearby_mines(cell))?;
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn corner_has_three_neighbours() {
        let grid = Grid::new(3, 3);
        let mut neighbours = grid.neighbours((0, 0)).collect::<Vec<_>>();
        neighbours.sort_unstable();
        assert_eq!(neighbours, vec![(0, 1), (1, 0), (1, 1)]);
    }

    #[test]
    fn centre_has_eight_neighbours() {
        let grid = Grid::new(3, 3);
        let neighbours = grid.neighbours((1, 1)).collect::<HashSet<_>>();
        assert_eq!(neighbours.len(), 8);
        assert!(!neighbours.contains(&(1, 1)));
    }

    #[test]
    fn edge_of_wide_board() {
        let grid = Grid::new(2, 5);
        let mut neighbours = grid.neighbours((1, 4)).collect::<Vec<_>>();
        neighbours.sort_unstable();
        assert_eq!(neighbours, vec![(0, 3), (0, 4), (1, 3)]);
    }

    #[test]
    fn cells_are_row_major() {
        let grid = Grid::new(2, 2);
        assert_eq!(
            grid.cells().collect::<Vec<_>>(),
            vec![(0, 0), (0, 1), (1, 0), (1, 1)]
        );
        assert_eq!(grid.len(), 4);
        assert!(grid.contains((1, 1)));
        assert!(!grid.contains((2, 0)));
    }

    #[test]
    fn inconsistency_message_names_cell() {
        let err = InconsistencyError::at((2, 3), "mine count below zero");
        assert_eq!(
            err.to_string(),
            "inconsistent knowledge at (2, 3): mine count below zero"
        );
        assert_eq!(
            InconsistencyError::new("empty").to_string(),
            "inconsistent knowledge: empty"
        );
    }
}
