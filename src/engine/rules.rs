//! RuleEngine trait: the board-game rules the turn engine drives but does not own.

use crate::engine::action::CharacterCardStep;
use crate::engine::error::GameError;
use crate::engine::models::{Color, Exhaustion, Player, PlayerName, Standing};

/// Interface every rule engine must implement.
///
/// One apply operation per `BaseGameAction` tag. Operations must leave the
/// game untouched when they return an error; the turn engine relies on that
/// to keep the phase where it was.
pub trait RuleEngine: Send {
    /// Build the initial board for `players` (join order).
    fn setup(&mut self, players: &[Player]) -> Result<(), GameError>;

    fn play_assistant_card(&mut self, player: &str, card: Option<usize>) -> Result<(), GameError>;

    fn move_student_to_island(
        &mut self,
        player: &str,
        colors: &[Color],
        island: Option<usize>,
    ) -> Result<(), GameError>;

    fn move_student_to_dining(&mut self, player: &str, color: Option<Color>) -> Result<(), GameError>;

    fn move_mother_nature(&mut self, player: &str, island: Option<usize>) -> Result<(), GameError>;

    fn select_cloud_tile(&mut self, player: &str, cloud: Option<usize>) -> Result<(), GameError>;

    fn play_character_card(&mut self, player: &str, card: Option<usize>) -> Result<(), GameError>;

    fn character_card_action(
        &mut self,
        player: &str,
        step: CharacterCardStep,
        island: Option<usize>,
        colors: &[Color],
    ) -> Result<(), GameError>;

    fn end_turn(&mut self, player: &str) -> Result<(), GameError>;

    /// End-of-game predicate, queried after every successful operation.
    fn is_game_over(&self) -> bool;

    /// Turn order for the round whose plan phase just ended, best priority first.
    fn turn_order(&self) -> Vec<PlayerName>;

    /// Towers and professors of every player, in join order.
    fn standings(&self) -> Vec<Standing>;

    fn exhaustion(&self) -> Exhaustion;

    /// Connection changes, for engines that track them. Default: ignored.
    fn set_player_active(&mut self, _player: &str, _active: bool) {}
}
