//! Domain types for the reference Eriantys rules.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::engine::models::{Color, PlayerName, TowerColor};

pub const ISLAND_COUNT: usize = 12;
pub const STUDENTS_PER_COLOR: usize = 24;
pub const DINING_CAPACITY: usize = 10;
pub const COIN_SUPPLY: usize = 20;
pub const NO_ENTRY_TILES: usize = 4;
pub const MIN_ISLANDS: usize = 3;

/// Student counts by colour.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Students([usize; 5]);

impl Students {
    pub fn get(&self, color: Color) -> usize {
        self.0[color.index()]
    }

    pub fn add(&mut self, color: Color, n: usize) {
        self.0[color.index()] += n;
    }

    /// Remove one student of `color`. False if there is none.
    pub fn take(&mut self, color: Color) -> bool {
        let slot = &mut self.0[color.index()];
        if *slot == 0 {
            return false;
        }
        *slot -= 1;
        true
    }

    pub fn total(&self) -> usize {
        self.0.iter().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    /// Colours with at least one student.
    pub fn colors(&self) -> impl Iterator<Item = Color> + '_ {
        Color::ALL.into_iter().filter(|&c| self.get(c) > 0)
    }

    pub fn merge(&mut self, other: &Students) {
        for color in Color::ALL {
            self.add(color, other.get(color));
        }
    }

    pub fn drain(&mut self) -> Students {
        std::mem::take(self)
    }
}

impl FromIterator<Color> for Students {
    fn from_iter<I: IntoIterator<Item = Color>>(iter: I) -> Self {
        let mut students = Students::default();
        for color in iter {
            students.add(color, 1);
        }
        students
    }
}

/// Shuffled supply of students.
#[derive(Debug, Clone, Default)]
pub struct Bag {
    students: Vec<Color>,
}

impl Bag {
    pub fn filled(per_color: usize, rng: &mut StdRng) -> Self {
        let mut students: Vec<Color> = Color::ALL
            .into_iter()
            .flat_map(|c| std::iter::repeat(c).take(per_color))
            .collect();
        students.shuffle(rng);
        Self { students }
    }

    pub fn len(&self) -> usize {
        self.students.len()
    }

    pub fn is_empty(&self) -> bool {
        self.students.is_empty()
    }

    /// Draw up to `n` students; fewer when the bag runs out.
    pub fn draw(&mut self, n: usize) -> Students {
        let keep = self.students.len().saturating_sub(n);
        self.students.drain(keep..).collect()
    }
}

/// A group of one or more merged island tiles.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Island {
    pub students: Students,
    /// Number of merged tiles; also the number of towers once owned.
    pub size: usize,
    pub owner: Option<TowerColor>,
    pub no_entry: usize,
}

impl Island {
    pub fn single() -> Self {
        Self {
            size: 1,
            ..Self::default()
        }
    }

    pub fn towers(&self) -> usize {
        if self.owner.is_some() {
            self.size
        } else {
            0
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cloud {
    pub students: Students,
    pub taken: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssistantCard {
    pub value: usize,
    pub moves: usize,
}

impl AssistantCard {
    pub fn new(value: usize) -> Self {
        Self {
            value,
            moves: value.div_ceil(2),
        }
    }

    pub fn deck() -> Vec<AssistantCard> {
        (1..=10).map(AssistantCard::new).collect()
    }
}

/// One player's board.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct School {
    pub nickname: PlayerName,
    pub tower_color: TowerColor,
    pub entrance: Students,
    pub dining: Students,
    pub towers_left: usize,
    pub coins: usize,
    pub deck: Vec<AssistantCard>,
    /// Card played in the current round.
    pub played: Option<AssistantCard>,
    pub active: bool,
    /// Ended their action turn in the current round.
    pub finished_turn: bool,
}

impl School {
    pub fn new(nickname: PlayerName, tower_color: TowerColor, towers: usize) -> Self {
        Self {
            nickname,
            tower_color,
            entrance: Students::default(),
            dining: Students::default(),
            towers_left: towers,
            coins: 0,
            deck: AssistantCard::deck(),
            played: None,
            active: true,
            finished_turn: false,
        }
    }
}

/// Per-player-count constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    pub entrance: usize,
    pub cloud_students: usize,
    pub towers: usize,
}

impl Layout {
    pub fn for_players(players: usize) -> Layout {
        match players {
            3 => Layout {
                entrance: 9,
                cloud_students: 4,
                towers: 6,
            },
            _ => Layout {
                entrance: 7,
                cloud_students: 3,
                towers: 8,
            },
        }
    }
}

/// Where the round is.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoundStage {
    #[default]
    Planning,
    Acting,
}

/// State of the action turn in progress.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TurnState {
    pub player: Option<usize>,
    pub character_played: bool,
    /// Character card waiting for its follow-up action.
    pub pending_character: Option<usize>,
    pub extra_moves: usize,
    pub excluded_color: Option<Color>,
}

impl TurnState {
    pub fn for_player(player: usize) -> Self {
        Self {
            player: Some(player),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn test_assistant_moves_round_up() {
        let moves: Vec<usize> = AssistantCard::deck().iter().map(|c| c.moves).collect();
        assert_eq!(moves, vec![1, 1, 2, 2, 3, 3, 4, 4, 5, 5]);
    }

    #[test]
    fn test_bag_draw_stops_when_empty() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut bag = Bag::filled(1, &mut rng);
        assert_eq!(bag.draw(3).total(), 3);
        assert_eq!(bag.draw(3).total(), 2);
        assert!(bag.is_empty());
        assert!(bag.draw(3).is_empty());
    }

    #[test]
    fn test_students_take() {
        let mut s: Students = [Color::Red, Color::Red, Color::Blue].into_iter().collect();
        assert!(s.take(Color::Red));
        assert!(!s.take(Color::Green));
        assert_eq!(s.get(Color::Red), 1);
        assert_eq!(s.colors().collect::<Vec<_>>(), vec![Color::Red, Color::Blue]);
    }
}
