//! Error taxonomy for the turn engine.
//!
//! The dispatcher surfaces these unmodified; only the session controller turns
//! them into text for players, through `TurnError::player_message`.

use thiserror::Error;

use crate::engine::action::BaseGameAction;

/// A move was submitted before the player chose something it needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MissingSelection {
    #[error("no island selected")]
    Island,
    #[error("no color selected")]
    Color,
    #[error("no assistant card selected")]
    AssistantCard,
    #[error("no student selected")]
    Student,
    #[error("no cloud tile selected")]
    CloudTile,
    #[error("no character card selected")]
    CharacterCard,
}

/// The rule engine refused a move because it breaks a game rule.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleViolation {
    #[error("not enough coins: {required} needed, {available} available")]
    NotEnoughCoins { required: usize, available: usize },
    #[error("mother nature can move at most {max} steps, {requested} requested")]
    InvalidMovement { requested: usize, max: usize },
    #[error("no no-entry tiles left")]
    NoEntryTilesExhausted,
    #[error("unknown assistant card {0}")]
    UnknownAssistantCard(usize),
    #[error("assistant card {0} was already played this round")]
    AssistantCardTaken(usize),
    #[error("unknown character card {0}")]
    UnknownCharacterCard(usize),
    #[error("a character card was already played this turn")]
    CharacterCardAlreadyPlayed,
    #[error("no character card is waiting for an action")]
    NoActiveCharacterCard,
    #[error("the active character card does not support this action")]
    UnsupportedCharacterAction,
    #[error("no {0:?} student in the entrance")]
    UnknownStudent(crate::engine::models::Color),
    #[error("player {0} has no place in the turn order")]
    UnknownTurnOrder(String),
    #[error("{what} index {index} out of bounds (size {len})")]
    IndexOutOfBounds {
        what: &'static str,
        index: usize,
        len: usize,
    },
    #[error("cloud tile {0} is empty")]
    EmptyCloudTile(usize),
    #[error("the dining room is full for this color")]
    DiningRoomFull,
    #[error("character cards are disabled in this game")]
    CharacterCardsDisabled,
}

/// Everything a rule engine operation can fail with.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    #[error(transparent)]
    Missing(#[from] MissingSelection),
    #[error(transparent)]
    Rule(#[from] RuleViolation),
    /// The rule engine reached a state it cannot recover from.
    #[error("rule engine failure: {0}")]
    Internal(String),
}

/// Failure of `TurnDispatcher::handle_action`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TurnError {
    #[error("no action supplied")]
    MissingAction,
    #[error("it is {expected}'s turn, not {actual}'s")]
    WrongPlayer { expected: String, actual: String },
    #[error("{kind} is not allowed during {phase}")]
    NotLegitAction {
        kind: BaseGameAction,
        phase: &'static str,
    },
    #[error("the game is not in progress")]
    NotStarted,
    #[error(transparent)]
    Game(#[from] GameError),
}

impl TurnError {
    /// True for failures that are reported to the acting player only and
    /// leave the session running.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, TurnError::Game(GameError::Internal(_)))
    }

    /// Stable text shown to the player whose move was refused.
    pub fn player_message(&self) -> String {
        match self {
            TurnError::MissingAction => "No action was received.".into(),
            TurnError::WrongPlayer { expected, .. } => {
                format!("It is not your turn: waiting for {expected}.")
            }
            TurnError::NotLegitAction { kind, phase } => {
                format!("You cannot do {kind} during the {phase} phase.")
            }
            TurnError::NotStarted => "The game is not in progress.".into(),
            TurnError::Game(GameError::Missing(m)) => match m {
                MissingSelection::Island => "Select an island first.".into(),
                MissingSelection::Color => "Select a color first.".into(),
                MissingSelection::AssistantCard => "Select an assistant card first.".into(),
                MissingSelection::Student => "Select a student first.".into(),
                MissingSelection::CloudTile => "Select a cloud tile first.".into(),
                MissingSelection::CharacterCard => "Select a character card first.".into(),
            },
            TurnError::Game(GameError::Rule(r)) => match r {
                RuleViolation::NotEnoughCoins { .. } => {
                    "You do not have enough coins for this character card.".into()
                }
                RuleViolation::InvalidMovement { max, .. } => {
                    format!("Mother nature can move at most {max} islands this turn.")
                }
                RuleViolation::NoEntryTilesExhausted => {
                    "There are no no-entry tiles left.".into()
                }
                RuleViolation::UnknownAssistantCard(_) => {
                    "You do not have that assistant card.".into()
                }
                RuleViolation::AssistantCardTaken(_) => {
                    "Another player already played that assistant card this round.".into()
                }
                RuleViolation::UnknownCharacterCard(_) => {
                    "That character card is not on the table.".into()
                }
                RuleViolation::CharacterCardAlreadyPlayed => {
                    "You already played a character card this turn.".into()
                }
                RuleViolation::NoActiveCharacterCard => {
                    "Play a character card before using its effect.".into()
                }
                RuleViolation::UnsupportedCharacterAction => {
                    "The active character card cannot do that.".into()
                }
                RuleViolation::UnknownStudent(_) => {
                    "There is no such student in your entrance.".into()
                }
                RuleViolation::UnknownTurnOrder(_) => "The turn order is not known yet.".into(),
                RuleViolation::IndexOutOfBounds { what, .. } => {
                    format!("That {what} does not exist.")
                }
                RuleViolation::EmptyCloudTile(_) => "That cloud tile has already been taken.".into(),
                RuleViolation::DiningRoomFull => "Your dining room is full for that color.".into(),
                RuleViolation::CharacterCardsDisabled => {
                    "Character cards are not used in this game.".into()
                }
            },
            TurnError::Game(GameError::Internal(_)) => INTERNAL_ERROR_MESSAGE.into(),
        }
    }
}

pub const INTERNAL_ERROR_MESSAGE: &str = "The game was closed because of an internal error.";

/// Roster and lifecycle failures of the session controller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("a nickname is required")]
    MissingNickname,
    #[error("nickname {0} is already taken")]
    NicknameTaken(String),
    #[error("the session is full ({0} players)")]
    SessionFull(usize),
    #[error("the session has already started")]
    AlreadyStarted,
    #[error("unknown player {0}")]
    UnknownPlayer(String),
}

/// Inbound message could not be turned into an `ActionRecord`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    #[error("message has no kind tag")]
    MissingKind,
    #[error("unknown action kind {0}")]
    UnknownKind(String),
    #[error("invalid payload: {0}")]
    InvalidPayload(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    #[error("unsupported player count {0} (expected 2 or 3)")]
    PlayerCount(usize),
    #[error("suspension timeout must be positive")]
    ZeroTimeout,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrong_player_message_names_expected_actor() {
        let err = TurnError::WrongPlayer {
            expected: "alice".into(),
            actual: "bob".into(),
        };
        assert_eq!(err.player_message(), "It is not your turn: waiting for alice.");
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_game_errors_convert_through_from() {
        let err: TurnError = GameError::from(MissingSelection::Island).into();
        assert_eq!(err.player_message(), "Select an island first.");
        let err: TurnError = GameError::from(RuleViolation::NoEntryTilesExhausted).into();
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_internal_errors_are_not_recoverable() {
        let err = TurnError::Game(GameError::Internal("bag desync".into()));
        assert!(!err.is_recoverable());
        assert_eq!(err.player_message(), INTERNAL_ERROR_MESSAGE);
    }
}
