//! End-of-game winner computation.
//!
//! Towers are spent to claim islands, so fewer towers left ranks higher;
//! professors break ties.

use std::cmp::Ordering;

use crate::engine::models::{Outcome, Standing};

/// Ranking order: towers left ascending, then professors descending.
pub fn compare_standings(a: &Standing, b: &Standing) -> Ordering {
    a.towers_left
        .cmp(&b.towers_left)
        .then_with(|| b.professors.cmp(&a.professors))
}

/// Standings sorted best first. Stable, so equal standings keep join order.
pub fn rank(standings: &[Standing]) -> Vec<Standing> {
    let mut ranked = standings.to_vec();
    ranked.sort_by(compare_standings);
    ranked
}

/// Decide the outcome from the final standings (join order).
pub fn compute_outcome(standings: &[Standing]) -> Outcome {
    if standings.is_empty() {
        return Outcome::NoWinner;
    }
    if let Some(done) = standings.iter().find(|s| s.towers_left == 0) {
        return Outcome::Winner(done.nickname.clone());
    }

    let ranked = rank(standings);
    let first = &ranked[0];
    let Some(second) = ranked.get(1) else {
        return Outcome::Winner(first.nickname.clone());
    };
    if compare_standings(first, second) == Ordering::Less {
        return Outcome::Winner(first.nickname.clone());
    }
    if let Some(third) = ranked.get(2) {
        if compare_standings(first, third) == Ordering::Less {
            return Outcome::Tie(vec![first.nickname.clone(), second.nickname.clone()]);
        }
    }
    Outcome::Tie(ranked.iter().map(|s| s.nickname.clone()).collect())
}
