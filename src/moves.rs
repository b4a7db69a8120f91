use rand::seq::IteratorRandom;
use rand::Rng;
use tracing::trace;

use crate::{Cell, KnowledgeBase};

impl KnowledgeBase {
    /// A cell known to be safe that hasn't been probed yet.
    ///
    /// Picks the lowest such cell in `(row, column)` order. Never changes
    /// anything.
    pub fn safe_move(&self) -> Option<Cell> {
        self.safes()
            .iter()
            .copied()
            .filter(|cell| !self.moves_made().contains(cell))
            .min()
    }

    /// A uniformly random cell that hasn't been probed and isn't known to be a
    /// mine. It may still be an unidentified mine.
    ///
    /// Returns `None` once no such cell is left, or (if the total number of
    /// mines is known) once every cell that isn't a mine has been probed.
    pub fn random_move<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<Cell> {
        if let Some(total_mines) = self.total_mines() {
            if self.moves_made().len() + total_mines >= self.grid().len() {
                return None;
            }
        }
        self.grid()
            .cells()
            .filter(|cell| !self.moves_made().contains(cell) && !self.mines().contains(cell))
            .choose(rng)
    }

    /// [`safe_move`](Self::safe_move) if there is one, otherwise
    /// [`random_move`](Self::random_move)
    pub fn next_move<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<Cell> {
        if let Some(cell) = self.safe_move() {
            trace!(?cell, "safe move");
            return Some(cell);
        }
        let cell = self.random_move(rng)?;
        trace!(?cell, "random move");
        Some(cell)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use pretty_assertions::assert_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use crate::{Grid, KnowledgeBase};

    #[test]
    fn no_safe_move_at_start() {
        let knowledge = KnowledgeBase::new(Grid::new(3, 3));
        assert_eq!(knowledge.safe_move(), None);
    }

    #[test]
    fn safe_move_skips_probed_cells() {
        let mut knowledge = KnowledgeBase::new(Grid::new(3, 3));
        knowledge.observe((0, 0), 0).unwrap();
        assert_eq!(knowledge.safe_move(), Some((0, 1)));
        knowledge.observe((0, 1), 0).unwrap();
        assert_eq!(knowledge.safe_move(), Some((0, 2)));
    }

    #[test]
    fn safe_move_is_pure() {
        let mut knowledge = KnowledgeBase::new(Grid::new(3, 3));
        knowledge.observe((0, 0), 0).unwrap();
        let before = knowledge.clone();
        knowledge.safe_move();
        knowledge.safe_move();
        assert_eq!(knowledge, before);
    }

    #[test]
    fn random_move_avoids_probed_cells_and_mines() {
        // Mine at (0, 3)
        let mut knowledge = KnowledgeBase::new(Grid::new(4, 4));
        knowledge.observe((0, 0), 0).unwrap();
        knowledge.observe((1, 1), 0).unwrap();
        knowledge.observe((1, 2), 1).unwrap();
        knowledge.observe((2, 2), 0).unwrap();
        knowledge.mark_mine((0, 3)).unwrap();

        let mut rng = StdRng::seed_from_u64(7);
        let mut seen = HashSet::new();
        for _ in 0..500 {
            let cell = knowledge.random_move(&mut rng).unwrap();
            assert!(!knowledge.moves_made().contains(&cell));
            assert!(!knowledge.mines().contains(&cell));
            seen.insert(cell);
        }
        let expected = Grid::new(4, 4)
            .cells()
            .filter(|cell| {
                !knowledge.moves_made().contains(cell) && !knowledge.mines().contains(cell)
            })
            .collect::<HashSet<_>>();
        assert_eq!(seen, expected);
    }

    #[test]
    fn random_move_exhausted_board() {
        let mut knowledge = KnowledgeBase::new(Grid::new(1, 2));
        knowledge.observe((0, 0), 1).unwrap();
        assert!(knowledge.mines().contains(&(0, 1)));
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(knowledge.random_move(&mut rng), None);
        assert_eq!(knowledge.next_move(&mut rng), None);
    }

    #[test]
    fn random_move_respects_mine_total() {
        // Mines at (0, 1) and (0, 2); only the first can be identified
        let mut bounded = KnowledgeBase::new(Grid::new(1, 3)).with_total_mines(2);
        let mut unbounded = KnowledgeBase::new(Grid::new(1, 3));
        bounded.observe((0, 0), 1).unwrap();
        unbounded.observe((0, 0), 1).unwrap();

        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(bounded.random_move(&mut rng), None);
        assert_eq!(unbounded.random_move(&mut rng), Some((0, 2)));
    }

    #[test]
    fn next_move_prefers_safe_cells() {
        let mut knowledge = KnowledgeBase::new(Grid::new(3, 3));
        knowledge.observe((0, 0), 0).unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(knowledge.next_move(&mut rng), Some((0, 1)));
    }
}
