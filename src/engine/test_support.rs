//! Fixtures shared by the engine's unit tests.

use std::sync::{Arc, Mutex};

use crate::engine::action::{BaseGameAction, CharacterCardStep};
use crate::engine::error::GameError;
use crate::engine::models::{Color, Exhaustion, Player, PlayerName, Standing, TowerColor};
use crate::engine::rules::RuleEngine;
use crate::engine::session::MatchNotifier;
use crate::engine::table::Table;

pub fn make_table(names: &[&str]) -> Table {
    let mut table = Table::new();
    for (i, name) in names.iter().enumerate() {
        table.push(Player::new(*name, i, TowerColor::for_join_index(i).unwrap()));
    }
    table
}

/// Rule engine that accepts everything and lets tests script failures,
/// turn order, standings and the end of the game.
#[derive(Debug, Default)]
pub struct ScriptedRules {
    pub calls: Vec<(BaseGameAction, String)>,
    pub fail_next: Option<GameError>,
    pub panic_next: bool,
    pub game_over: bool,
    pub game_over_after: Option<usize>,
    /// A disconnection completes the game, like a last round closing.
    pub end_on_disconnect: bool,
    pub setup_players: Vec<PlayerName>,
    turn_order: Vec<PlayerName>,
    standings: Vec<Standing>,
}

impl ScriptedRules {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_turn_order(mut self, names: &[&str]) -> Self {
        self.turn_order = names.iter().map(|n| n.to_string()).collect();
        self
    }

    pub fn with_standings(mut self, standings: Vec<Standing>) -> Self {
        self.standings = standings;
        self
    }

    pub fn end_after(mut self, calls: usize) -> Self {
        self.game_over_after = Some(calls);
        self
    }

    fn record(&mut self, kind: BaseGameAction, player: &str) -> Result<(), GameError> {
        if self.panic_next {
            self.panic_next = false;
            panic!("scripted rule engine panic");
        }
        if let Some(err) = self.fail_next.take() {
            return Err(err);
        }
        self.calls.push((kind, player.to_string()));
        Ok(())
    }
}

impl RuleEngine for ScriptedRules {
    fn setup(&mut self, players: &[Player]) -> Result<(), GameError> {
        self.setup_players = players.iter().map(|p| p.nickname.clone()).collect();
        Ok(())
    }

    fn play_assistant_card(&mut self, player: &str, _card: Option<usize>) -> Result<(), GameError> {
        self.record(BaseGameAction::PlayAssistantCard, player)
    }

    fn move_student_to_island(
        &mut self,
        player: &str,
        _colors: &[Color],
        _island: Option<usize>,
    ) -> Result<(), GameError> {
        self.record(BaseGameAction::MoveStudentFromEntranceToIsland, player)
    }

    fn move_student_to_dining(&mut self, player: &str, _color: Option<Color>) -> Result<(), GameError> {
        self.record(BaseGameAction::MoveStudentFromEntranceToDining, player)
    }

    fn move_mother_nature(&mut self, player: &str, _island: Option<usize>) -> Result<(), GameError> {
        self.record(BaseGameAction::MoveMotherNature, player)
    }

    fn select_cloud_tile(&mut self, player: &str, _cloud: Option<usize>) -> Result<(), GameError> {
        self.record(BaseGameAction::SelectCloudTile, player)
    }

    fn play_character_card(&mut self, player: &str, _card: Option<usize>) -> Result<(), GameError> {
        self.record(BaseGameAction::PlayCharacterCard, player)
    }

    fn character_card_action(
        &mut self,
        player: &str,
        _step: CharacterCardStep,
        _island: Option<usize>,
        _colors: &[Color],
    ) -> Result<(), GameError> {
        self.record(BaseGameAction::CharacterCardAction, player)
    }

    fn end_turn(&mut self, player: &str) -> Result<(), GameError> {
        self.record(BaseGameAction::EndTurn, player)
    }

    fn is_game_over(&self) -> bool {
        self.game_over || self.game_over_after.is_some_and(|n| self.calls.len() >= n)
    }

    fn turn_order(&self) -> Vec<PlayerName> {
        self.turn_order.clone()
    }

    fn standings(&self) -> Vec<Standing> {
        if !self.standings.is_empty() {
            return self.standings.clone();
        }
        self.setup_players
            .iter()
            .map(|name| Standing::new(name.clone(), 8, 0))
            .collect()
    }

    fn exhaustion(&self) -> Exhaustion {
        Exhaustion {
            islands_left: 12,
            ..Exhaustion::default()
        }
    }

    fn set_player_active(&mut self, _player: &str, active: bool) {
        if !active && self.end_on_disconnect {
            self.game_over = true;
        }
    }
}

/// Notifier that keeps every message for later assertions.
#[derive(Debug, Clone, Default)]
pub struct RecordingNotifier {
    pub errors: Arc<Mutex<Vec<(String, String)>>>,
    pub endings: Arc<Mutex<Vec<String>>>,
}

impl RecordingNotifier {
    pub fn errors(&self) -> Vec<(String, String)> {
        self.errors.lock().unwrap().clone()
    }

    pub fn endings(&self) -> Vec<String> {
        self.endings.lock().unwrap().clone()
    }
}

impl MatchNotifier for RecordingNotifier {
    fn send_error(&self, player: &str, message: &str) {
        self.errors
            .lock()
            .unwrap()
            .push((player.to_string(), message.to_string()));
    }

    fn end_match(&self, message: &str) {
        self.endings.lock().unwrap().push(message.to_string());
    }
}
