//! Core session data types shared by the phase machine, dispatcher and controller.

use std::fmt;

use serde::{Deserialize, Serialize};

pub type PlayerName = String;

/// Student / professor colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Color {
    Green,
    Red,
    Yellow,
    Pink,
    Blue,
}

impl Color {
    pub const ALL: [Color; 5] = [
        Color::Green,
        Color::Red,
        Color::Yellow,
        Color::Pink,
        Color::Blue,
    ];

    pub fn index(self) -> usize {
        self as usize
    }
}

/// Tower colour, assigned by join order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TowerColor {
    White,
    Black,
    Grey,
}

impl TowerColor {
    const BY_JOIN_ORDER: [TowerColor; 3] = [TowerColor::White, TowerColor::Black, TowerColor::Grey];

    /// Colour for the player joining at `join_index`; `None` once all three are taken.
    pub fn for_join_index(join_index: usize) -> Option<TowerColor> {
        Self::BY_JOIN_ORDER.get(join_index).copied()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub nickname: PlayerName,
    /// Position in join order. Never changes once assigned.
    pub table_index: usize,
    /// Position in the current round's turn order, `None` before the first plan phase ends.
    #[serde(default)]
    pub sorted_index: Option<usize>,
    pub tower_color: TowerColor,
    /// False once the player has disconnected.
    pub active: bool,
}

impl Player {
    pub fn new(nickname: impl Into<PlayerName>, table_index: usize, tower_color: TowerColor) -> Self {
        Self {
            nickname: nickname.into(),
            table_index,
            sorted_index: None,
            tower_color,
            active: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Setup,
    InProgress,
    Ended,
}

/// What the rule engine reports about one player when the game ends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Standing {
    pub nickname: PlayerName,
    pub towers_left: usize,
    pub professors: usize,
}

impl Standing {
    pub fn new(nickname: impl Into<PlayerName>, towers_left: usize, professors: usize) -> Self {
        Self {
            nickname: nickname.into(),
            towers_left,
            professors,
        }
    }
}

/// Supply exhaustion state, logged when a game ends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exhaustion {
    pub islands_left: usize,
    pub bag_empty: bool,
    pub assistant_decks_empty: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Winner(PlayerName),
    Tie(Vec<PlayerName>),
    NoWinner,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Winner(name) => write!(f, "{name} wins the game!"),
            Outcome::Tie(names) => write!(f, "The game ended in a tie between {}.", names.join(", ")),
            Outcome::NoWinner => write!(f, "The game ended without a winner."),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
    /// The rule engine signalled the end of the game.
    Normal,
    /// Every other player stayed disconnected past the suspension timeout.
    Timeout,
    /// Setup was attempted before the roster was full.
    NotEnoughPlayers,
    /// Every player disconnected.
    Abandoned,
    InternalError,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameResult {
    pub outcome: Outcome,
    pub reason: EndReason,
    pub message: String,
}

impl GameResult {
    pub fn new(outcome: Outcome, reason: EndReason) -> Self {
        let message = outcome.to_string();
        Self {
            outcome,
            reason,
            message,
        }
    }

    pub fn with_message(outcome: Outcome, reason: EndReason, message: impl Into<String>) -> Self {
        Self {
            outcome,
            reason,
            message: message.into(),
        }
    }
}
