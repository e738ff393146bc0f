//! Priority filtering and weighted random draws over story candidates.

use crate::core::random::RandomSource;
use crate::schema::story::{Branch, Ending, StoryNode};

/// Something that competes for selection.
pub trait Candidate {
    fn priority(&self) -> i64;

    fn weight(&self) -> f64 {
        1.0
    }
}

impl Candidate for StoryNode {
    fn priority(&self) -> i64 {
        self.priority
    }

    fn weight(&self) -> f64 {
        self.weight
    }
}

impl Candidate for Branch {
    fn priority(&self) -> i64 {
        self.priority
    }

    fn weight(&self) -> f64 {
        self.weight
    }
}

impl Candidate for Ending {
    fn priority(&self) -> i64 {
        self.priority
    }
}

impl<T: Candidate + ?Sized> Candidate for &T {
    fn priority(&self) -> i64 {
        (**self).priority()
    }

    fn weight(&self) -> f64 {
        (**self).weight()
    }
}

/// Keyed candidates, e.g. `(id, node)` pairs.
impl<K, T: Candidate> Candidate for (K, T) {
    fn priority(&self) -> i64 {
        self.1.priority()
    }

    fn weight(&self) -> f64 {
        self.1.weight()
    }
}

/// Candidates sharing the highest priority, in their original order.
pub fn top_priority<C: Candidate>(candidates: &[C]) -> Vec<&C> {
    let Some(max) = candidates.iter().map(Candidate::priority).max() else {
        return Vec::new();
    };
    candidates.iter().filter(|c| c.priority() == max).collect()
}

/// Weighted draw among the top-priority candidates.
///
/// Draws `r` in `[0, total weight)` and walks the candidates subtracting
/// each weight; the first candidate that brings `r` to zero or below wins.
/// Falls back to the first top-priority candidate when weights never
/// exhaust the draw (for example when every weight is zero).
pub fn select_weighted<'a, C: Candidate>(
    candidates: &'a [C],
    rng: &mut dyn RandomSource,
) -> Option<&'a C> {
    let top = top_priority(candidates);
    let first = *top.first()?;
    let total: f64 = top.iter().map(|c| c.weight()).sum();
    let mut r = rng.next_unit() * total;
    for candidate in top {
        r -= candidate.weight();
        if r <= 0.0 {
            return Some(candidate);
        }
    }
    Some(first)
}

/// First of the top-priority candidates.
pub fn select_top_priority<C: Candidate>(candidates: &[C]) -> Option<&C> {
    top_priority(candidates).into_iter().next()
}
