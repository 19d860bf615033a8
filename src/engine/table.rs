//! Seating view shared by the phase machine: join order, turn order and the
//! selected player.

use crate::engine::models::{Player, PlayerName};

/// Which of the two orderings the selected index points into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Seating {
    /// Join order; used by the plan phase.
    Table,
    /// Turn order of the current round; used by every action phase.
    Sorted,
}

/// Roster plus the two orderings over it.
///
/// `sorted` holds table indices. `selected`, once setup completes, always
/// indexes an existing player in the ordering the current phase uses.
#[derive(Debug, Clone, Default)]
pub struct Table {
    players: Vec<Player>,
    sorted: Vec<usize>,
    selected: Option<usize>,
    /// Table index of the player whose turn it is.
    current: Option<usize>,
}

impl Table {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn push(&mut self, player: Player) {
        self.players.push(player);
    }

    pub fn contains(&self, nickname: &str) -> bool {
        self.find(nickname).is_some()
    }

    pub fn find(&self, nickname: &str) -> Option<&Player> {
        self.players.iter().find(|p| p.nickname == nickname)
    }

    pub fn active_count(&self) -> usize {
        self.players.iter().filter(|p| p.active).count()
    }

    pub fn active_players(&self) -> impl Iterator<Item = &Player> {
        self.players.iter().filter(|p| p.active)
    }

    /// Flip the active flag. Returns the previous value, `None` for unknown players.
    pub fn set_active(&mut self, nickname: &str, active: bool) -> Option<bool> {
        let player = self.players.iter_mut().find(|p| p.nickname == nickname)?;
        let previous = player.active;
        player.active = active;
        Some(previous)
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub fn current(&self) -> Option<usize> {
        self.current
    }

    pub fn sorted_order(&self) -> &[usize] {
        &self.sorted
    }

    /// Table index the selected position refers to under `ordering`.
    pub fn selected_table_index(&self, ordering: Seating) -> Option<usize> {
        let selected = self.selected?;
        match ordering {
            Seating::Table => (selected < self.players.len()).then_some(selected),
            Seating::Sorted => self.sorted.get(selected).copied(),
        }
    }

    /// The player designated by the selected position under `ordering`.
    pub fn actor(&self, ordering: Seating) -> Option<&Player> {
        self.selected_table_index(ordering).map(|i| &self.players[i])
    }

    /// Select position `index` in `ordering`. Keeps `current` in step.
    pub fn select(&mut self, ordering: Seating, index: usize) {
        self.selected = Some(index);
        self.current = self.selected_table_index(ordering);
    }

    /// Table position of the first active player, in join order.
    pub fn first_active_table(&self) -> Option<usize> {
        self.players.iter().position(|p| p.active)
    }

    /// Next active player after table position `from`, without wrapping.
    pub fn next_active_table(&self, from: usize) -> Option<usize> {
        (from + 1..self.players.len()).find(|&i| self.players[i].active)
    }

    /// Sorted position of the first active player in turn order.
    pub fn first_active_sorted(&self) -> Option<usize> {
        self.sorted.iter().position(|&i| self.players[i].active)
    }

    /// Next active player after sorted position `from`, without wrapping.
    pub fn next_active_sorted(&self, from: usize) -> Option<usize> {
        (from + 1..self.sorted.len()).find(|&pos| self.players[self.sorted[pos]].active)
    }

    /// Replace the turn order with `nicknames` (as ranked by the rule engine).
    /// Players the rule engine did not rank are appended in table order.
    pub fn set_sorted_order(&mut self, nicknames: &[PlayerName]) {
        let mut sorted: Vec<usize> = Vec::with_capacity(self.players.len());
        for name in nicknames {
            if let Some(i) = self.players.iter().position(|p| &p.nickname == name) {
                if !sorted.contains(&i) {
                    sorted.push(i);
                }
            }
        }
        for i in 0..self.players.len() {
            if !sorted.contains(&i) {
                sorted.push(i);
            }
        }
        for (pos, &i) in sorted.iter().enumerate() {
            self.players[i].sorted_index = Some(pos);
        }
        self.sorted = sorted;
    }
}
