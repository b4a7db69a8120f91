use std::collections::HashSet;
use std::fmt;

use either::Either;
use rand::Rng;
use thiserror::Error;

use crate::{Cell, Grid, KnowledgeBase, Minefield};

/// Where the mines go on a new [`Board`]: either a number of mines to scatter
/// uniformly at random, or an explicit set of cells.
///
/// You shouldn't need to construct this type directly - use [`usize`],
/// [`HashSet<Cell>`] or [`Vec<Cell>`]
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MinePlacement(pub Either<usize, HashSet<Cell>>);
impl From<usize> for MinePlacement {
    fn from(count: usize) -> Self {
        Self(Either::Left(count))
    }
}
impl From<HashSet<Cell>> for MinePlacement {
    fn from(cells: HashSet<Cell>) -> Self {
        Self(Either::Right(cells))
    }
}
impl From<Vec<Cell>> for MinePlacement {
    fn from(cells: Vec<Cell>) -> Self {
        Self(Either::Right(cells.into_iter().collect()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BoardError {
    #[error("board must have at least one row and one column")]
    Empty,
    #[error("board must be rectangular (found line with length {found}, expected length {expected})")]
    NotRectangular { found: usize, expected: usize },
    #[error("invalid character {character:?} at {cell:?}")]
    InvalidCharacter { character: char, cell: Cell },
    #[error("can't place {mines} mines on a board of {cells} cells")]
    TooManyMines { mines: usize, cells: usize },
    #[error("mine at {0:?} is outside the board")]
    OutOfBounds(Cell),
}

/// The hidden state of a game: the board dimensions and where the mines are
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Board {
    grid: Grid,
    mines: HashSet<Cell>,
}
impl Board {
    /// # Errors
    ///
    /// Fails if the grid is empty, if more mines are requested than the board
    /// has cells, or if an explicit mine lies outside the board.
    pub fn new<R: Rng + ?Sized>(
        grid: Grid,
        placement: impl Into<MinePlacement>,
        rng: &mut R,
    ) -> Result<Self, BoardError> {
        if grid.is_empty() {
            return Err(BoardError::Empty);
        }
        let mines = match placement.into().0 {
            Either::Left(count) => {
                if count > grid.len() {
                    return Err(BoardError::TooManyMines {
                        mines: count,
                        cells: grid.len(),
                    });
                }
                rand::seq::index::sample(rng, grid.len(), count)
                    .into_iter()
                    .map(|i| (i / grid.width, i % grid.width))
                    .collect()
            },
            Either::Right(cells) => {
                if let Some(&cell) = cells.iter().find(|&&cell| !grid.contains(cell)) {
                    return Err(BoardError::OutOfBounds(cell));
                }
                cells
            },
        };
        Ok(Self {
            grid,
            mines,
        })
    }

    /// Create a board from an ASCII-encoded description, where:
    /// - `*` is a mine
    /// - `.` is a cell without a mine
    /// - Trailing or leading whitespace is ignored
    ///
    /// # Errors
    ///
    /// If the board is not rectangular, has a width or height of 0, or contains
    /// any other character, an error is returned.
    pub fn parse(encoded: &str) -> Result<Self, BoardError> {
        let lines = encoded.trim().lines().map(str::trim).collect::<Vec<_>>();
        let height = lines.len();
        let width = lines.first().map_or(0, |line| line.chars().count());
        if height == 0 || width == 0 {
            return Err(BoardError::Empty);
        }
        if let Some(line) = lines.iter().find(|l| l.chars().count() != width) {
            return Err(BoardError::NotRectangular {
                found: line.chars().count(),
                expected: width,
            });
        }
        let mut mines = HashSet::new();
        for (row, line) in lines.into_iter().enumerate() {
            for (col, c) in line.chars().enumerate() {
                match c {
                    '*' => {
                        mines.insert((row, col));
                    },
                    '.' => (),
                    _ => {
                        return Err(BoardError::InvalidCharacter {
                            character: c,
                            cell: (row, col),
                        });
                    },
                }
            }
        }
        Ok(Self {
            grid: Grid::new(height, width),
            mines,
        })
    }

    pub fn mines(&self) -> &HashSet<Cell> {
        &self.mines
    }

    /// Draw the board as the player currently sees it: the count for each
    /// probed cell, `F` for identified mines, `.` for cells proven safe but
    /// not yet probed and a blank for everything else.
    pub fn render(&self, knowledge: &KnowledgeBase) -> String {
        let rule = format!("{}-\n", "--".repeat(self.grid.width));
        let mut out = String::new();
        for row in 0..self.grid.height {
            out.push_str(&rule);
            for col in 0..self.grid.width {
                let cell = (row, col);
                out.push('|');
                if knowledge.moves_made().contains(&cell) {
                    out.push_str(&self.nearby_mines(cell).to_string());
                } else if knowledge.mines().contains(&cell) {
                    out.push('F');
                } else if knowledge.safes().contains(&cell) {
                    out.push('.');
                } else {
                    out.push(' ');
                }
            }
            out.push_str("|\n");
        }
        out.push_str(&rule);
        out
    }
}

impl Minefield for Board {
    fn grid(&self) -> Grid {
        self.grid
    }

    fn is_mine(&self, cell: Cell) -> bool {
        self.mines.contains(&cell)
    }

    fn nearby_mines(&self, cell: Cell) -> usize {
        self.grid
            .neighbours(cell)
            .filter(|neighbour| self.mines.contains(neighbour))
            .count()
    }

    fn won(&self, flagged: &HashSet<Cell>) -> bool {
        *flagged == self.mines
    }
}

/// Where the mines are, `X` for a mine
impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = format!("{}-", "--".repeat(self.grid.width));
        for row in 0..self.grid.height {
            writeln!(f, "{rule}")?;
            for col in 0..self.grid.width {
                write!(f, "{}", if self.is_mine((row, col)) { "|X" } else { "| " })?;
            }
            writeln!(f, "|")?;
        }
        write!(f, "{rule}")
    }
}
