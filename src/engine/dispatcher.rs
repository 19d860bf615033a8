//! Per-session turn dispatcher: legality, rule engine call, transition.

use crate::engine::action::ActionRecord;
use crate::engine::error::{GameError, TurnError};
use crate::engine::phase::Phase;
use crate::engine::rules::RuleEngine;
use crate::engine::table::Table;

/// Result of an accepted action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// Applied; play continues in the (possibly new) current phase.
    Applied,
    /// Applied, and the rule engine now reports the end of the game.
    GameOver,
}

#[derive(Debug, Clone)]
pub struct TurnDispatcher {
    phase: Phase,
}

impl Default for TurnDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl TurnDispatcher {
    pub fn new() -> Self {
        Self {
            phase: Phase::initial(),
        }
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    /// Swap the current phase, returning the one it replaces.
    pub fn replace_phase(&mut self, phase: Phase) -> Phase {
        std::mem::replace(&mut self.phase, phase)
    }

    /// Run one player action through the current phase.
    ///
    /// The phase advances only after the rule engine accepted the action;
    /// rule engine errors come back unchanged.
    pub fn handle_action(
        &mut self,
        record: Option<&ActionRecord>,
        player: &str,
        table: &mut Table,
        rules: &mut dyn RuleEngine,
    ) -> Result<Dispatch, TurnError> {
        let record = record.ok_or(TurnError::MissingAction)?;
        let kind = record.kind();

        if !self.phase.is_legal(table, kind, player)? {
            return Err(TurnError::NotLegitAction {
                kind,
                phase: self.phase.name(),
            });
        }

        apply(rules, record, player)?;
        tracing::debug!(player, %kind, phase = self.phase.name(), "action applied");

        let phase = std::mem::replace(&mut self.phase, Phase::EndGame);
        if rules.is_game_over() {
            self.phase = phase.on_end_game();
            return Ok(Dispatch::GameOver);
        }
        self.phase = phase.on_valid_action(kind, table, rules);
        tracing::debug!(phase = ?self.phase, "phase after action");
        Ok(Dispatch::Applied)
    }
}

/// The rule engine operation for each action tag.
fn apply(rules: &mut dyn RuleEngine, record: &ActionRecord, player: &str) -> Result<(), GameError> {
    match record {
        ActionRecord::PlayAssistantCard { selected_card } => {
            rules.play_assistant_card(player, *selected_card)
        }
        ActionRecord::MoveStudentFromEntranceToIsland {
            selected_colors,
            selected_island,
        } => rules.move_student_to_island(player, selected_colors, *selected_island),
        ActionRecord::MoveStudentFromEntranceToDining { selected_color } => {
            rules.move_student_to_dining(player, *selected_color)
        }
        ActionRecord::MoveMotherNature { selected_island } => {
            rules.move_mother_nature(player, *selected_island)
        }
        ActionRecord::SelectCloudTile {
            selected_cloud_tile,
        } => rules.select_cloud_tile(player, *selected_cloud_tile),
        ActionRecord::PlayCharacterCard {
            selected_character_card,
        } => rules.play_character_card(player, *selected_character_card),
        ActionRecord::CharacterCardAction {
            character_card_action,
            selected_island,
            selected_colors,
        } => rules.character_card_action(
            player,
            *character_card_action,
            *selected_island,
            selected_colors,
        ),
        ActionRecord::EndTurn => rules.end_turn(player),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::action::BaseGameAction;
    use crate::engine::error::{MissingSelection, RuleViolation};
    use crate::engine::models::Color;
    use crate::engine::table::Seating;
    use crate::engine::test_support::{make_table, ScriptedRules};

    fn setup() -> (TurnDispatcher, Table, ScriptedRules) {
        let mut table = make_table(&["ann", "bob"]);
        table.select(Seating::Table, 0);
        (TurnDispatcher::new(), table, ScriptedRules::new())
    }

    #[test]
    fn test_missing_record_is_invalid_argument() {
        let (mut d, mut table, mut rules) = setup();
        assert_eq!(
            d.handle_action(None, "ann", &mut table, &mut rules),
            Err(TurnError::MissingAction)
        );
    }

    #[test]
    fn test_illegal_kind_reported_as_not_legit() {
        let (mut d, mut table, mut rules) = setup();
        let err = d
            .handle_action(Some(&ActionRecord::EndTurn), "ann", &mut table, &mut rules)
            .unwrap_err();
        assert_eq!(
            err,
            TurnError::NotLegitAction {
                kind: BaseGameAction::EndTurn,
                phase: "plan"
            }
        );
        assert!(rules.calls.is_empty());
    }

    #[test]
    fn test_wrong_player_never_reaches_rule_engine() {
        let (mut d, mut table, mut rules) = setup();
        let record = ActionRecord::play_assistant_card(3);
        let err = d
            .handle_action(Some(&record), "bob", &mut table, &mut rules)
            .unwrap_err();
        assert!(matches!(err, TurnError::WrongPlayer { .. }));
        assert!(rules.calls.is_empty());
    }

    #[test]
    fn test_rule_engine_error_keeps_phase() {
        let (mut d, mut table, mut rules) = setup();
        rules.fail_next = Some(RuleViolation::AssistantCardTaken(3).into());
        let record = ActionRecord::play_assistant_card(3);
        let err = d
            .handle_action(Some(&record), "ann", &mut table, &mut rules)
            .unwrap_err();
        assert_eq!(
            err,
            TurnError::Game(GameError::Rule(RuleViolation::AssistantCardTaken(3)))
        );
        assert_eq!(d.phase(), &Phase::Plan { acted: 0 });
        assert_eq!(table.selected(), Some(0));
    }

    #[test]
    fn test_missing_selection_propagates_unmodified() {
        let (mut d, mut table, mut rules) = setup();
        rules.fail_next = Some(MissingSelection::AssistantCard.into());
        let record = ActionRecord::PlayAssistantCard { selected_card: None };
        let err = d
            .handle_action(Some(&record), "ann", &mut table, &mut rules)
            .unwrap_err();
        assert_eq!(err, TurnError::Game(GameError::Missing(MissingSelection::AssistantCard)));
    }

    #[test]
    fn test_full_turn_cycle_two_players() {
        let (mut d, mut table, mut rules) = setup();
        let card = ActionRecord::play_assistant_card(1);
        assert_eq!(d.handle_action(Some(&card), "ann", &mut table, &mut rules), Ok(Dispatch::Applied));
        assert_eq!(d.handle_action(Some(&card), "bob", &mut table, &mut rules), Ok(Dispatch::Applied));
        assert_eq!(d.phase(), &Phase::MoveStudent { moves: 0 });

        for player in ["ann", "bob"] {
            for _ in 0..3 {
                let mv = ActionRecord::move_to_dining(Color::Red);
                d.handle_action(Some(&mv), player, &mut table, &mut rules).unwrap();
            }
            assert_eq!(d.phase(), &Phase::MoveMotherNature);
            let mn = ActionRecord::move_mother_nature(1);
            d.handle_action(Some(&mn), player, &mut table, &mut rules).unwrap();
            let cloud = ActionRecord::select_cloud_tile(0);
            d.handle_action(Some(&cloud), player, &mut table, &mut rules).unwrap();
            assert_eq!(d.phase(), &Phase::EndTurn);
            d.handle_action(Some(&ActionRecord::EndTurn), player, &mut table, &mut rules)
                .unwrap();
        }
        assert_eq!(d.phase(), &Phase::Plan { acted: 0 });
        assert_eq!(table.selected(), Some(0));
        assert_eq!(rules.calls.len(), 2 + 2 * 6);
    }

    #[test]
    fn test_game_over_moves_to_end_game() {
        let (mut d, mut table, _) = setup();
        let mut rules = ScriptedRules::new().end_after(1);
        let card = ActionRecord::play_assistant_card(1);
        assert_eq!(
            d.handle_action(Some(&card), "ann", &mut table, &mut rules),
            Ok(Dispatch::GameOver)
        );
        assert_eq!(d.phase(), &Phase::EndGame);
        let err = d
            .handle_action(Some(&card), "bob", &mut table, &mut rules)
            .unwrap_err();
        assert!(matches!(err, TurnError::NotLegitAction { phase: "end game", .. }));
    }
}
