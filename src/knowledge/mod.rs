use std::collections::{HashMap, HashSet};

use frozenset::FrozenSet;
use tracing::{debug, trace, warn};

use crate::{Cell, Grid, InconsistencyError, InferenceError, Minefield, ObservationError};

mod clause;
mod reduce;

pub use clause::Clause;

/// Facts learned while processing a single observation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Deductions {
    /// Cells newly proven safe (including the observed cell itself, the first
    /// time it is observed)
    pub safes: FrozenSet<Cell>,
    /// Cells newly proven to be mines
    pub mines: FrozenSet<Cell>,
}
impl Deductions {
    pub fn is_empty(&self) -> bool {
        self.safes.is_empty() && self.mines.is_empty()
    }
}

/// Everything the player knows about one game.
///
/// Holds the live clauses, the cells proven safe or mined, and the cells
/// already probed. All three sets only ever grow. After every successful
/// [`observe`](Self::observe) no live clause is trivially resolvable and no
/// clause mentions a cell whose state is already known.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct KnowledgeBase {
    grid: Grid,
    /// Total number of mines on the board, if the game tells us
    total_mines: Option<usize>,
    /// Also combine pairs of clauses where one is a subset of the other
    subset_resolution: bool,
    clauses: Vec<Clause>,
    safes: HashSet<Cell>,
    mines: HashSet<Cell>,
    moves_made: HashSet<Cell>,
    /// Count reported for each probed cell
    observations: HashMap<Cell, usize>,
    /// Set once a contradiction is found; no further inference is allowed
    poisoned: bool,
}
impl KnowledgeBase {
    pub fn new(grid: Grid) -> Self {
        Self {
            grid,
            total_mines: None,
            subset_resolution: false,
            clauses: Vec::new(),
            safes: HashSet::new(),
            mines: HashSet::new(),
            moves_made: HashSet::new(),
            observations: HashMap::new(),
            poisoned: false,
        }
    }

    /// Tell the player how many mines the board holds. Random moves stop once
    /// every remaining unprobed cell would have to be a mine.
    #[must_use]
    pub fn with_total_mines(mut self, total_mines: usize) -> Self {
        self.total_mines = Some(total_mines);
        self
    }

    /// Enable deriving new clauses from pairs where one clause's cells are a
    /// subset of the other's. Strictly stronger than trivial resolution alone.
    #[must_use]
    pub fn with_subset_resolution(mut self, enabled: bool) -> Self {
        self.subset_resolution = enabled;
        self
    }

    pub fn grid(&self) -> Grid {
        self.grid
    }

    pub fn total_mines(&self) -> Option<usize> {
        self.total_mines
    }

    pub fn safes(&self) -> &HashSet<Cell> {
        &self.safes
    }

    pub fn mines(&self) -> &HashSet<Cell> {
        &self.mines
    }

    pub fn moves_made(&self) -> &HashSet<Cell> {
        &self.moves_made
    }

    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    pub fn is_poisoned(&self) -> bool {
        self.poisoned
    }

    /// Whether the mines identified so far are exactly the mines on `board`
    pub fn is_won(&self, board: &impl Minefield) -> bool {
        board.won(&self.mines)
    }

    /// Record that `cell` was probed and borders `count` mines, then deduce
    /// everything that follows from it.
    ///
    /// Repeating an observation already made is a no-op.
    ///
    /// # Errors
    ///
    /// - [`InferenceError::InvalidObservation`] if the observation can't be
    ///   applied; nothing is changed.
    /// - [`InferenceError::Contradiction`] if the new knowledge contradicts
    ///   what was already known. The knowledge base is then poisoned.
    /// - [`InferenceError::Halted`] if it was already poisoned.
    pub fn observe(
        &mut self,
        cell: Cell,
        count: usize,
    ) -> Result<Deductions, InferenceError> {
        if self.poisoned {
            return Err(InferenceError::Halted);
        }
        if let Some(&previous) = self.observations.get(&cell) {
            if previous == count {
                return Ok(Deductions::default());
            }
            return Err(ObservationError::Conflicting {
                cell,
                previous,
                count,
            }
            .into());
        }
        let clause = self.neighbour_clause(cell, count)?;
        debug!(?cell, count, %clause, "observation");

        let known_safes = self.safes.clone();
        let known_mines = self.mines.clone();
        self.guarded(|knowledge| {
            knowledge.moves_made.insert(cell);
            knowledge.observations.insert(cell, count);
            knowledge.learn_safe(cell)?;
            knowledge.add_clause(clause);
            knowledge.resolve()
        })?;

        Ok(Deductions {
            safes: self.safes.difference(&known_safes).copied().collect(),
            mines: self.mines.difference(&known_mines).copied().collect(),
        })
    }

    /// Record that `cell` is safe and remove it from every clause.
    ///
    /// Doesn't run any further inference; that happens on the next
    /// observation. Returns whether the cell was newly learned.
    ///
    /// # Errors
    ///
    /// Fails if `cell` is off the board, or if it contradicts existing
    /// knowledge (in which case the knowledge base is poisoned).
    pub fn mark_safe(&mut self, cell: Cell) -> Result<bool, InferenceError> {
        self.check_bounds(cell)?;
        self.guarded(|knowledge| knowledge.learn_safe(cell))
    }

    /// Record that `cell` is a mine and remove it from every clause,
    /// decrementing their counts.
    ///
    /// # Errors
    ///
    /// As for [`mark_safe`](Self::mark_safe).
    pub fn mark_mine(&mut self, cell: Cell) -> Result<bool, InferenceError> {
        self.check_bounds(cell)?;
        self.guarded(|knowledge| knowledge.learn_mine(cell))
    }

    /// Run `f`, poisoning the knowledge base if it finds a contradiction
    fn guarded<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<T, InconsistencyError>,
    ) -> Result<T, InferenceError> {
        if self.poisoned {
            return Err(InferenceError::Halted);
        }
        f(self).map_err(|err| {
            warn!(error = %err, "contradiction found; halting inference");
            self.poisoned = true;
            err.into()
        })
    }

    fn check_bounds(&self, cell: Cell) -> Result<(), ObservationError> {
        if self.grid.contains(cell) {
            Ok(())
        } else {
            Err(ObservationError::OutOfBounds {
                cell,
                grid: self.grid,
            })
        }
    }

    /// Validate an observation and build the clause it implies over the
    /// neighbours whose state is still unknown.
    fn neighbour_clause(
        &self,
        cell: Cell,
        count: usize,
    ) -> Result<Clause, InferenceError> {
        self.check_bounds(cell)?;
        if self.mines.contains(&cell) {
            return Err(ObservationError::KnownMine(cell).into());
        }
        let mut known_mines = 0;
        let mut unknown = Vec::with_capacity(8);
        for neighbour in self.grid.neighbours(cell) {
            if self.mines.contains(&neighbour) {
                known_mines += 1;
            } else if !self.safes.contains(&neighbour) {
                unknown.push(neighbour);
            }
        }
        let max = known_mines + unknown.len();
        if count < known_mines || count > max {
            return Err(ObservationError::ImpossibleCount {
                cell,
                count,
                min: known_mines,
                max,
            }
            .into());
        }
        Ok(Clause::new(unknown, count - known_mines)?)
    }

    fn add_clause(&mut self, clause: Clause) {
        if !self.clauses.contains(&clause) {
            self.clauses.push(clause);
        }
    }

    fn learn_safe(&mut self, cell: Cell) -> Result<bool, InconsistencyError> {
        if self.mines.contains(&cell) {
            return Err(InconsistencyError::at(cell, "Mine deduced to be safe"));
        }
        let new = self.safes.insert(cell);
        if new {
            trace!(?cell, "safe");
        }
        for clause in &mut self.clauses {
            clause.record_safe(cell)?;
        }
        Ok(new)
    }

    fn learn_mine(&mut self, cell: Cell) -> Result<bool, InconsistencyError> {
        if self.safes.contains(&cell) {
            return Err(InconsistencyError::at(cell, "Safe cell deduced to be a mine"));
        }
        let new = self.mines.insert(cell);
        if new {
            trace!(?cell, "mine");
        }
        for clause in &mut self.clauses {
            clause.record_mine(cell)?;
        }
        Ok(new)
    }

    /// Apply resolution and simplification until no clause changes
    fn resolve(&mut self) -> Result<(), InconsistencyError> {
        loop {
            let (safes, mines) = self.resolution_pass();
            let resolved = !safes.is_empty() || !mines.is_empty();
            for cell in safes {
                self.learn_safe(cell)?;
            }
            for cell in mines {
                self.learn_mine(cell)?;
            }
            let simplified = self.simplification_pass()?;
            if resolved || simplified {
                continue;
            }
            if self.subset_resolution && reduce::reduce_all(&mut self.clauses)? {
                continue;
            }
            return Ok(());
        }
    }

    /// Remove every trivially resolvable clause, returning the cells they
    /// prove safe and the cells they prove to be mines.
    ///
    /// Facts are only collected here; they are applied once the scan is done
    /// so that every clause is examined against the same state.
    fn resolution_pass(&mut self) -> (Vec<Cell>, Vec<Cell>) {
        let mut safes = Vec::new();
        let mut mines = Vec::new();
        self.clauses.retain(|clause| {
            if clause.is_resolved_safe() {
                safes.extend(clause.cells().iter().copied());
                false
            } else if clause.is_resolved_mines() {
                mines.extend(clause.cells().iter().copied());
                false
            } else {
                true
            }
        });
        (safes, mines)
    }

    /// Strip known cells out of every clause. Returns whether any changed.
    fn simplification_pass(&mut self) -> Result<bool, InconsistencyError> {
        let mut changed = false;
        for clause in &mut self.clauses {
            changed |= clause.simplify(&self.safes, &self.mines)?;
        }
        Ok(changed)
    }
}
