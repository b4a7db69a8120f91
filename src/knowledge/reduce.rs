use itertools::Itertools;
use tracing::trace;

use super::Clause;
use crate::InconsistencyError;

/// A pending reduction: the clause at `sub` is a sub-clause of the one at
/// `sup`, so `sup` can be replaced by the difference of the two
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Reduction {
    sup: usize,
    sub: usize,
}
impl Reduction {
    /// Preference order between candidate reductions; larger is tried first.
    ///
    /// Favour shrinking the biggest clauses, and among those the reductions
    /// whose result is furthest from an even split of mines (those are the
    /// closest to resolving outright).
    fn metric(self, clauses: &[Clause]) -> (usize, usize, usize) {
        let (sup, sub) = (&clauses[self.sup], &clauses[self.sub]);
        let num_reduced_cells = sup.len() - sub.len();
        let num_reduced_mines = sup.count().saturating_sub(sub.count());
        (
            sup.len(),
            sub.len(),
            num_reduced_mines.abs_diff(num_reduced_cells / 2),
        )
    }
}

fn next_reduction(clauses: &[Clause]) -> Option<Reduction> {
    (0..clauses.len())
        .cartesian_product(0..clauses.len())
        .filter(|&(sup, sub)| {
            sup != sub
                && !clauses[sub].is_empty()
                && clauses[sub].is_subclause_of(&clauses[sup])
        })
        .map(|(sup, sub)| {
            Reduction {
                sup,
                sub,
            }
        })
        .max_by_key(|reduction| reduction.metric(clauses))
}

/// Replace clauses by their difference with any sub-clause, until no clause
/// contains another. Returns whether anything changed.
///
/// Each reduction either shrinks a clause or removes it, so this terminates.
pub(super) fn reduce_all(clauses: &mut Vec<Clause>) -> Result<bool, InconsistencyError> {
    let mut changed = false;
    while let Some(reduction) = next_reduction(clauses) {
        let reduced = clauses[reduction.sup].subtract(&clauses[reduction.sub])?;
        trace!(
            sup = %clauses[reduction.sup],
            sub = %clauses[reduction.sub],
            %reduced,
            "reduced clause"
        );
        let duplicate = clauses
            .iter()
            .enumerate()
            .any(|(i, clause)| i != reduction.sup && *clause == reduced);
        if reduced.is_empty() || duplicate {
            clauses.swap_remove(reduction.sup);
        } else {
            clauses[reduction.sup] = reduced;
        }
        changed = true;
    }
    Ok(changed)
}
