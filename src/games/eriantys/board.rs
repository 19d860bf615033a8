//! Island ring, mother nature, influence and merging.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use crate::engine::models::{Color, TowerColor};
use crate::games::eriantys::types::{Island, School, ISLAND_COUNT};

#[derive(Debug, Clone, Default)]
pub struct Board {
    pub islands: Vec<Island>,
    pub mother_nature: usize,
}

impl Board {
    /// Twelve islands, mother nature on the first. Two students of each
    /// colour go on the islands other than hers and the one opposite.
    pub fn new(rng: &mut StdRng) -> Self {
        let mut islands: Vec<Island> = (0..ISLAND_COUNT).map(|_| Island::single()).collect();
        let mut initial: Vec<Color> = Color::ALL.into_iter().flat_map(|c| [c, c]).collect();
        initial.shuffle(rng);
        let opposite = ISLAND_COUNT / 2;
        let targets = (1..ISLAND_COUNT).filter(|&i| i != opposite);
        for (island, color) in targets.zip(initial) {
            islands[island].students.add(color, 1);
        }
        Self {
            islands,
            mother_nature: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.islands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.islands.is_empty()
    }

    /// Clockwise steps from mother nature to `target`.
    pub fn steps_to(&self, target: usize) -> usize {
        (target + self.len() - self.mother_nature) % self.len()
    }

    /// Influence of each school on island `index`, in school order.
    pub fn influence(
        &self,
        index: usize,
        schools: &[School],
        professors: &[Option<usize>; 5],
        excluded: Option<Color>,
    ) -> Vec<usize> {
        let island = &self.islands[index];
        schools
            .iter()
            .enumerate()
            .map(|(s, school)| {
                let students: usize = Color::ALL
                    .into_iter()
                    .filter(|&c| Some(c) != excluded && professors[c.index()] == Some(s))
                    .map(|c| island.students.get(c))
                    .sum();
                let towers = if island.owner == Some(school.tower_color) {
                    island.towers()
                } else {
                    0
                };
                students + towers
            })
            .collect()
    }

    /// Merge island `index` with same-owner neighbours. Returns the index of
    /// the merged island; mother nature follows it.
    pub fn merge_around(&mut self, index: usize) -> usize {
        let mut index = index;
        let Some(owner) = self.islands[index].owner else {
            return index;
        };
        // Next neighbour first, then previous; each merge shrinks the ring.
        while self.len() > 1 {
            let next = (index + 1) % self.len();
            if self.islands[next].owner != Some(owner) {
                break;
            }
            index = self.absorb(index, next);
        }
        while self.len() > 1 {
            let prev = (index + self.len() - 1) % self.len();
            if self.islands[prev].owner != Some(owner) {
                break;
            }
            index = self.absorb(index, prev);
        }
        index
    }

    /// Fold island `other` into `keep` and remove it. Returns the new index of `keep`.
    fn absorb(&mut self, keep: usize, other: usize) -> usize {
        let removed = self.islands.remove(other);
        let keep = if other < keep { keep - 1 } else { keep };
        let island = &mut self.islands[keep];
        island.students.merge(&removed.students);
        island.size += removed.size;
        island.no_entry += removed.no_entry;
        self.mother_nature = keep;
        tracing::debug!(island = keep, size = island.size, "islands merged");
        keep
    }

    pub fn owner(&self, index: usize) -> Option<TowerColor> {
        self.islands[index].owner
    }
}

/// Winner of an influence count: the single highest positive score.
pub fn dominant(scores: &[usize]) -> Option<usize> {
    let max = *scores.iter().max()?;
    if max == 0 {
        return None;
    }
    let mut leaders = scores.iter().enumerate().filter(|&(_, &s)| s == max);
    let (leader, _) = leaders.next()?;
    if leaders.next().is_some() {
        return None;
    }
    Some(leader)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn make_board() -> Board {
        Board::new(&mut StdRng::seed_from_u64(1))
    }

    fn make_schools() -> Vec<School> {
        vec![
            School::new("ann".into(), TowerColor::White, 8),
            School::new("bob".into(), TowerColor::Black, 8),
        ]
    }

    #[test]
    fn test_initial_students_skip_mother_nature_and_opposite() {
        let board = make_board();
        assert_eq!(board.len(), 12);
        assert!(board.islands[0].students.is_empty());
        assert!(board.islands[6].students.is_empty());
        let total: usize = board.islands.iter().map(|i| i.students.total()).sum();
        assert_eq!(total, 10);
    }

    #[test]
    fn test_steps_wrap_around() {
        let mut board = make_board();
        board.mother_nature = 10;
        assert_eq!(board.steps_to(1), 3);
        assert_eq!(board.steps_to(10), 0);
    }

    #[test]
    fn test_influence_counts_professors_and_towers() {
        let mut board = make_board();
        let island = &mut board.islands[3];
        island.students = [Color::Red, Color::Red, Color::Blue].into_iter().collect();
        island.owner = Some(TowerColor::Black);
        let mut professors = [None; 5];
        professors[Color::Red.index()] = Some(0);
        professors[Color::Blue.index()] = Some(1);
        let schools = make_schools();

        let red = board.islands[3].students.get(Color::Red);
        let blue = board.islands[3].students.get(Color::Blue);
        assert_eq!(board.influence(3, &schools, &professors, None), vec![red, blue + 1]);
        assert_eq!(
            board.influence(3, &schools, &professors, Some(Color::Red)),
            vec![0, blue + 1]
        );
    }

    #[test]
    fn test_dominant_requires_unique_leader() {
        assert_eq!(dominant(&[2, 3, 1]), Some(1));
        assert_eq!(dominant(&[3, 3]), None);
        assert_eq!(dominant(&[0, 0]), None);
    }

    #[test]
    fn test_merge_joins_both_neighbours() {
        let mut board = make_board();
        for i in [11, 0, 1] {
            board.islands[i].owner = Some(TowerColor::White);
        }
        let merged = board.merge_around(0);
        assert_eq!(board.len(), 10);
        assert_eq!(board.islands[merged].size, 3);
        assert_eq!(board.islands[merged].towers(), 3);
        assert_eq!(board.mother_nature, merged);
    }

    #[test]
    fn test_unowned_island_does_not_merge() {
        let mut board = make_board();
        assert_eq!(board.merge_around(4), 4);
        assert_eq!(board.len(), 12);
    }
}
