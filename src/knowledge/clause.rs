use std::collections::HashSet;
use std::fmt;

use itertools::Itertools;

use crate::{Cell, InconsistencyError};

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
/// A logical statement about the board: exactly `count` of `cells` are mines.
///
/// Cells are removed (and the count adjusted) as facts about them are learned,
/// so a clause only ever talks about cells whose state is still unknown.
pub struct Clause {
    /// Cells the statement is about
    cells: HashSet<Cell>,
    /// How many of them are mines; never more than `cells.len()`
    count: usize,
}
impl Clause {
    /// # Errors
    ///
    /// Fails if `count` is larger than the number of distinct cells.
    pub fn new(
        cells: impl IntoIterator<Item = Cell>,
        count: usize,
    ) -> Result<Self, InconsistencyError> {
        let cells = cells.into_iter().collect::<HashSet<_>>();
        if count > cells.len() {
            return Err(InconsistencyError::new("Clause with more mines than cells"));
        }
        Ok(Self {
            cells,
            count,
        })
    }

    pub fn cells(&self) -> &HashSet<Cell> {
        &self.cells
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn contains(&self, cell: Cell) -> bool {
        self.cells.contains(&cell)
    }

    /// Every remaining cell is safe. Includes the empty clause.
    pub fn is_resolved_safe(&self) -> bool {
        self.count == 0
    }

    /// Every remaining cell is a mine
    pub fn is_resolved_mines(&self) -> bool {
        self.count > 0 && self.count == self.cells.len()
    }

    pub fn is_resolved(&self) -> bool {
        self.is_resolved_safe() || self.is_resolved_mines()
    }

    /// Learn that `cell` is a mine. Returns whether the clause changed.
    ///
    /// # Errors
    ///
    /// Fails, leaving the clause untouched, if the clause mentions `cell` but
    /// has no mines left to account for it.
    pub fn record_mine(&mut self, cell: Cell) -> Result<bool, InconsistencyError> {
        if !self.cells.contains(&cell) {
            return Ok(false);
        }
        if self.count == 0 {
            return Err(InconsistencyError::at(
                cell,
                "Mine found in a clause with no mines left",
            ));
        }
        self.cells.remove(&cell);
        self.count -= 1;
        Ok(true)
    }

    /// Learn that `cell` is safe. Returns whether the clause changed.
    ///
    /// # Errors
    ///
    /// Fails, leaving the clause untouched, if every remaining cell is needed
    /// as a mine (removing one would leave more mines than cells).
    pub fn record_safe(&mut self, cell: Cell) -> Result<bool, InconsistencyError> {
        if !self.cells.contains(&cell) {
            return Ok(false);
        }
        if self.count == self.cells.len() {
            return Err(InconsistencyError::at(
                cell,
                "Safe cell found in a clause where every cell is a mine",
            ));
        }
        self.cells.remove(&cell);
        Ok(true)
    }

    /// Remove every cell already known to be safe or a mine.
    ///
    /// Returns whether the clause changed.
    pub fn simplify(
        &mut self,
        safes: &HashSet<Cell>,
        mines: &HashSet<Cell>,
    ) -> Result<bool, InconsistencyError> {
        let known = self
            .cells
            .iter()
            .copied()
            .filter(|cell| safes.contains(cell) || mines.contains(cell))
            .collect_vec();
        let mut changed = false;
        for cell in known {
            changed |= if mines.contains(&cell) {
                self.record_mine(cell)?
            } else {
                self.record_safe(cell)?
            };
        }
        Ok(changed)
    }

    /// Check if this clause is a sub-clause of `other`
    ///
    /// Being a sub-clause means that this clause's cells are a subset of the
    /// other clause's cells. Equal clauses are sub-clauses of each other.
    pub fn is_subclause_of(&self, other: &Self) -> bool {
        self.cells.is_subset(&other.cells)
    }

    /// If `other` is a sub-clause of this one, the clause covering the cells
    /// this one has and `other` doesn't.
    ///
    /// # Errors
    ///
    /// Fails if `other` isn't a sub-clause, or if the mine counts can't be
    /// reconciled (the difference would need a negative number of mines, or
    /// more mines than it has cells).
    pub fn subtract(&self, other: &Self) -> Result<Self, InconsistencyError> {
        if !other.is_subclause_of(self) {
            return Err(InconsistencyError::new("Subtraction of non-subclause"));
        }
        let count = self.count.checked_sub(other.count).ok_or_else(|| {
            InconsistencyError::new("Sub-clause needs more mines than its superset")
        })?;
        Self::new(self.cells.difference(&other.cells).copied(), count)
    }

    pub fn into_cells(self) -> HashSet<Cell> {
        self.cells
    }
}

impl fmt::Display for Clause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{{}}} = {}",
            self.cells
                .iter()
                .sorted()
                .map(|(row, col)| format!("({row}, {col})"))
                .join(", "),
            self.count
        )
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn clause(count: usize, cells: &[Cell]) -> Clause {
        Clause::new(cells.iter().copied(), count).unwrap()
    }

    #[test]
    fn rejects_more_mines_than_cells() {
        assert!(Clause::new([(0, 0)], 2).is_err());
        // duplicates collapse before the check
        assert!(Clause::new([(0, 0), (0, 0)], 2).is_err());
        assert!(Clause::new([], 0).is_ok());
    }

    #[test]
    fn equality_ignores_order() {
        assert_eq!(
            clause(1, &[(0, 0), (1, 1), (2, 2)]),
            clause(1, &[(2, 2), (0, 0), (1, 1)])
        );
        assert_ne!(clause(1, &[(0, 0), (1, 1)]), clause(2, &[(0, 0), (1, 1)]));
    }

    #[test]
    fn record_mine_decrements() {
        let mut c = clause(2, &[(0, 0), (0, 1), (0, 2)]);
        assert_eq!(c.record_mine((0, 1)), Ok(true));
        assert_eq!(c, clause(1, &[(0, 0), (0, 2)]));
        assert_eq!(c.record_mine((5, 5)), Ok(false));
        assert_eq!(c.count(), 1);
    }

    #[test]
    fn record_mine_on_exhausted_clause_fails() {
        let mut c = clause(0, &[(0, 0), (0, 1)]);
        let err = c.record_mine((0, 0)).unwrap_err();
        assert_eq!(err.cell, Some((0, 0)));
        assert_eq!(c, clause(0, &[(0, 0), (0, 1)]));
    }

    #[test]
    fn record_safe_keeps_count() {
        let mut c = clause(1, &[(0, 0), (0, 1)]);
        assert_eq!(c.record_safe((0, 0)), Ok(true));
        assert_eq!(c, clause(1, &[(0, 1)]));
        assert!(c.is_resolved_mines());
    }

    #[test]
    fn record_safe_on_all_mine_clause_fails() {
        let mut c = clause(2, &[(0, 0), (0, 1)]);
        assert!(c.record_safe((0, 1)).is_err());
        assert_eq!(c.len(), 2);
    }

    #[test]
    fn resolution_predicates() {
        assert!(clause(0, &[]).is_resolved_safe());
        assert!(clause(0, &[(0, 0), (1, 1)]).is_resolved_safe());
        assert!(!clause(0, &[]).is_resolved_mines());
        assert!(clause(2, &[(0, 0), (1, 1)]).is_resolved_mines());
        assert!(!clause(1, &[(0, 0), (1, 1)]).is_resolved());
    }

    #[test]
    fn simplify_against_known_facts() {
        let mut c = clause(2, &[(0, 0), (0, 1), (0, 2), (1, 0)]);
        let safes = [(0, 0)].into_iter().collect();
        let mines = [(0, 2)].into_iter().collect();
        assert_eq!(c.simplify(&safes, &mines), Ok(true));
        assert_eq!(c, clause(1, &[(0, 1), (1, 0)]));
        assert_eq!(c.simplify(&safes, &mines), Ok(false));
    }

    #[test]
    fn subtract_subclause() {
        let sup = clause(2, &[(0, 0), (0, 1), (0, 2)]);
        let sub = clause(1, &[(0, 0), (0, 1)]);
        assert!(sub.is_subclause_of(&sup));
        assert!(!sup.is_subclause_of(&sub));
        assert_eq!(sup.subtract(&sub), Ok(clause(1, &[(0, 2)])));
    }

    #[test]
    fn subtract_inconsistent_counts() {
        let sup = clause(0, &[(0, 0), (0, 1), (0, 2)]);
        let sub = clause(1, &[(0, 0), (0, 1)]);
        assert!(sup.subtract(&sub).is_err());
        let sup = clause(3, &[(0, 0), (0, 1), (0, 2)]);
        let sub = clause(0, &[(0, 0), (0, 1)]);
        assert!(sup.subtract(&sub).is_err());
    }

    #[test]
    fn displays_sorted() {
        let c = clause(1, &[(1, 0), (0, 1)]);
        assert_eq!(c.to_string(), "{(0, 1), (1, 0)} = 1");
    }
}
