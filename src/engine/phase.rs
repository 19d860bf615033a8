//! Turn-flow state machine.
//!
//! A round is one plan phase (every active player plays an assistant card in
//! join order) followed by one action turn per player in the round's turn
//! order: move students, move mother nature, take a cloud tile, end the turn.
//! Each variant carries only the counter its own transition needs.

use serde::{Deserialize, Serialize};

use crate::engine::action::BaseGameAction;
use crate::engine::error::TurnError;
use crate::engine::models::Player;
use crate::engine::rules::RuleEngine;
use crate::engine::table::{Seating, Table};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum Phase {
    /// `acted` counts plan actions this round, skips included. It is
    /// reported only; completion is decided by the table order running out
    /// of active players.
    Plan { acted: usize },
    MoveStudent { moves: usize },
    MoveMotherNature,
    SelectCloudTile,
    EndTurn,
    EndGame,
    /// Overlay while too few players are connected; holds the phase to resume.
    Suspended { previous: Box<Phase> },
}

/// Students each player moves out of the entrance per turn.
pub fn student_moves_per_turn(players_number: usize) -> usize {
    match players_number {
        3 => 4,
        _ => 3,
    }
}

impl Phase {
    pub fn initial() -> Phase {
        Phase::Plan { acted: 0 }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Phase::Plan { .. } => "plan",
            Phase::MoveStudent { .. } => "move student",
            Phase::MoveMotherNature => "move mother nature",
            Phase::SelectCloudTile => "select cloud tile",
            Phase::EndTurn => "end turn",
            Phase::EndGame => "end game",
            Phase::Suspended { .. } => "suspended",
        }
    }

    /// Which ordering designates this phase's actor. `None` for the terminal phase.
    pub fn seating(&self) -> Option<Seating> {
        match self {
            Phase::Plan { .. } => Some(Seating::Table),
            Phase::MoveStudent { .. }
            | Phase::MoveMotherNature
            | Phase::SelectCloudTile
            | Phase::EndTurn => Some(Seating::Sorted),
            Phase::EndGame => None,
            Phase::Suspended { previous } => previous.seating(),
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Phase::EndGame)
    }

    pub fn is_suspended(&self) -> bool {
        matches!(self, Phase::Suspended { .. })
    }

    /// Whether `kind` may be played in this phase, ignoring who plays it.
    pub fn accepts(&self, kind: BaseGameAction) -> bool {
        match self {
            Phase::Plan { .. } => kind == BaseGameAction::PlayAssistantCard,
            Phase::MoveStudent { .. } => kind.is_student_move() || kind.is_character_card(),
            Phase::MoveMotherNature => {
                kind == BaseGameAction::MoveMotherNature || kind.is_character_card()
            }
            Phase::SelectCloudTile => {
                kind == BaseGameAction::SelectCloudTile || kind.is_character_card()
            }
            Phase::EndTurn => kind == BaseGameAction::EndTurn || kind.is_character_card(),
            Phase::EndGame | Phase::Suspended { .. } => false,
        }
    }

    pub fn accepted_kinds(&self) -> Vec<BaseGameAction> {
        BaseGameAction::ALL
            .into_iter()
            .filter(|&k| self.accepts(k))
            .collect()
    }

    /// The player whose move this phase is waiting for.
    pub fn actor<'t>(&self, table: &'t Table) -> Option<&'t Player> {
        table.actor(self.seating()?)
    }

    /// Legality of `kind` played by `player`.
    ///
    /// A player other than the designated actor gets `WrongPlayer`; a kind
    /// this phase does not accept gets `Ok(false)`. The terminal phase
    /// accepts nothing from anyone.
    pub fn is_legal(
        &self,
        table: &Table,
        kind: BaseGameAction,
        player: &str,
    ) -> Result<bool, TurnError> {
        if self.is_terminal() {
            return Ok(false);
        }
        let Some(actor) = self.actor(table) else {
            return Ok(false);
        };
        if actor.nickname != player {
            return Err(TurnError::WrongPlayer {
                expected: actor.nickname.clone(),
                actual: player.to_string(),
            });
        }
        Ok(self.accepts(kind))
    }

    /// Transition after `kind` was applied successfully by the rule engine.
    pub fn on_valid_action(
        self,
        kind: BaseGameAction,
        table: &mut Table,
        rules: &dyn RuleEngine,
    ) -> Phase {
        match self {
            Phase::Plan { acted } => {
                let acted = (acted + 1).min(table.len());
                let next = table.selected().and_then(|s| table.next_active_table(s));
                match next {
                    Some(next) => {
                        table.select(Seating::Table, next);
                        Phase::Plan { acted }
                    }
                    None => start_action_turns(table, rules),
                }
            }
            Phase::MoveStudent { moves } if kind.is_student_move() => {
                let moves = moves + 1;
                if moves >= student_moves_per_turn(table.len()) {
                    Phase::MoveMotherNature
                } else {
                    Phase::MoveStudent { moves }
                }
            }
            Phase::MoveMotherNature if kind == BaseGameAction::MoveMotherNature => {
                Phase::SelectCloudTile
            }
            Phase::SelectCloudTile if kind == BaseGameAction::SelectCloudTile => Phase::EndTurn,
            Phase::EndTurn if kind == BaseGameAction::EndTurn => advance_turn(table),
            // Character card plays and anything on the overlay or terminal
            // phase leave the phase as it is.
            other => other,
        }
    }

    /// The rule engine reported the end of the game.
    pub fn on_end_game(self) -> Phase {
        Phase::EndGame
    }

    /// Skip the designated actor if they are disconnected.
    ///
    /// In the plan phase this counts as their plan action. In any action
    /// phase their turn is closed as if they had ended it.
    pub fn skip_inactive_actor(self, table: &mut Table, rules: &dyn RuleEngine) -> Phase {
        let skipped = match self.actor(table) {
            Some(actor) if !actor.active => actor.nickname.clone(),
            _ => return self,
        };
        tracing::debug!(player = %skipped, phase = self.name(), "skipping disconnected actor");
        match self {
            Phase::Plan { .. } => self.on_valid_action(BaseGameAction::PlayAssistantCard, table, rules),
            Phase::MoveStudent { .. }
            | Phase::MoveMotherNature
            | Phase::SelectCloudTile
            | Phase::EndTurn => Phase::EndTurn.on_valid_action(BaseGameAction::EndTurn, table, rules),
            other => other,
        }
    }
}

/// Plan phase complete: take the new turn order and hand the first turn over.
fn start_action_turns(table: &mut Table, rules: &dyn RuleEngine) -> Phase {
    let order = rules.turn_order();
    table.set_sorted_order(&order);
    match table.first_active_sorted() {
        Some(first) => {
            table.select(Seating::Sorted, first);
            Phase::MoveStudent { moves: 0 }
        }
        None => {
            tracing::warn!("no active player left to start the action turns");
            Phase::EndGame
        }
    }
}

/// A player ended their turn: next in turn order, or a new round.
fn advance_turn(table: &mut Table) -> Phase {
    let next = table.selected().and_then(|s| table.next_active_sorted(s));
    if let Some(next) = next {
        table.select(Seating::Sorted, next);
        return Phase::MoveStudent { moves: 0 };
    }
    match table.first_active_table() {
        Some(first) => {
            table.select(Seating::Table, first);
            Phase::Plan { acted: 0 }
        }
        None => {
            tracing::warn!("no active player left to start a new round");
            Phase::EndGame
        }
    }
}
