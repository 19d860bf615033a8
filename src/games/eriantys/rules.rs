//! `EriantysRules`: in-memory rule engine for two and three player games.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::engine::action::{ActionRecord, BaseGameAction, CharacterCardStep};
use crate::engine::bot_strategy::ActionSource;
use crate::engine::config::SessionConfig;
use crate::engine::error::{GameError, MissingSelection, RuleViolation};
use crate::engine::models::{Color, Exhaustion, Player, PlayerName, Standing};
use crate::engine::phase::Phase;
use crate::engine::rules::RuleEngine;
use crate::games::eriantys::board::{dominant, Board};
use crate::games::eriantys::characters::{CharacterCard, CharacterKind, CATALOG};
use crate::games::eriantys::types::*;

const CHARACTERS_IN_PLAY: usize = 3;

pub struct EriantysRules {
    expert_mode: bool,
    rng: StdRng,
    board: Board,
    bag: Bag,
    schools: Vec<School>,
    clouds: Vec<Cloud>,
    /// Owning school of each colour's professor.
    professors: [Option<usize>; 5],
    characters: Vec<CharacterCard>,
    coin_supply: usize,
    layout: Layout,
    stage: RoundStage,
    turn: TurnState,
    /// The current round is the last one.
    last_round: bool,
    game_over: bool,
    round: usize,
}

impl EriantysRules {
    pub fn new(expert_mode: bool, seed: u64) -> Self {
        Self {
            expert_mode,
            rng: StdRng::seed_from_u64(seed),
            board: Board::default(),
            bag: Bag::default(),
            schools: Vec::new(),
            clouds: Vec::new(),
            professors: [None; 5],
            characters: Vec::new(),
            coin_supply: 0,
            layout: Layout::for_players(2),
            stage: RoundStage::Planning,
            turn: TurnState::default(),
            last_round: false,
            game_over: false,
            round: 1,
        }
    }

    pub fn from_config(config: &SessionConfig) -> Self {
        let seed = config.seed.unwrap_or_else(rand::random);
        Self::new(config.expert_mode, seed)
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn schools(&self) -> &[School] {
        &self.schools
    }

    pub fn clouds(&self) -> &[Cloud] {
        &self.clouds
    }

    pub fn characters(&self) -> &[CharacterCard] {
        &self.characters
    }

    pub fn professor_owner(&self, color: Color) -> Option<&str> {
        self.professors[color.index()].map(|s| self.schools[s].nickname.as_str())
    }

    pub fn round(&self) -> usize {
        self.round
    }

    pub fn is_last_round(&self) -> bool {
        self.last_round
    }

    fn school_index(&self, player: &str) -> Result<usize, GameError> {
        self.schools
            .iter()
            .position(|s| s.nickname == player)
            .ok_or_else(|| GameError::Internal(format!("player {player} has no school")))
    }

    fn check_island(&self, island: usize) -> Result<(), RuleViolation> {
        if island >= self.board.len() {
            return Err(RuleViolation::IndexOutOfBounds {
                what: "island",
                index: island,
                len: self.board.len(),
            });
        }
        Ok(())
    }

    /// Values other players already played this round.
    fn taken_cards(&self, player: usize) -> Vec<usize> {
        self.schools
            .iter()
            .enumerate()
            .filter(|&(i, _)| i != player)
            .filter_map(|(_, s)| s.played.map(|c| c.value))
            .collect()
    }

    /// First action of a turn switches the round to acting and resets the
    /// per-turn state if the previous actor was skipped.
    fn begin_action(&mut self, player: usize) {
        self.stage = RoundStage::Acting;
        if self.turn.player != Some(player) {
            self.turn = TurnState::for_player(player);
        }
    }

    fn mother_nature_moves(&self, player: usize) -> usize {
        // A player who reconnected after the plan phase has no card and
        // moves as if they had played the lowest one.
        let card_moves = self.schools[player].played.map_or(1, |c| c.moves);
        let extra = if self.turn.player == Some(player) {
            self.turn.extra_moves
        } else {
            0
        };
        card_moves + extra
    }

    fn update_professor(&mut self, color: Color, player: usize) {
        let seats = self.schools[player].dining.get(color);
        let claim = match self.professors[color.index()] {
            None => seats > 0,
            Some(owner) if owner == player => false,
            Some(owner) => seats > self.schools[owner].dining.get(color),
        };
        if claim {
            self.professors[color.index()] = Some(player);
            tracing::debug!(?color, player = %self.schools[player].nickname, "professor moved");
        }
    }

    /// Influence check on the island mother nature just reached.
    fn resolve_island(&mut self, index: usize) {
        if self.board.islands[index].no_entry > 0 {
            self.board.islands[index].no_entry -= 1;
            if let Some(card) = self
                .characters
                .iter_mut()
                .find(|c| c.kind == CharacterKind::Herbalist)
            {
                card.no_entry_tiles += 1;
            }
            tracing::debug!(island = index, "no-entry tile blocked influence");
            return;
        }

        let scores = self.board.influence(
            index,
            &self.schools,
            &self.professors,
            self.turn.excluded_color,
        );
        let Some(winner) = dominant(&scores) else {
            return;
        };
        let tower_color = self.schools[winner].tower_color;
        let island = &self.board.islands[index];
        if island.owner == Some(tower_color) {
            return;
        }
        let size = island.size;
        if let Some(previous) = island.owner {
            if let Some(loser) = self.schools.iter_mut().find(|s| s.tower_color == previous) {
                loser.towers_left += size;
            }
        }
        let school = &mut self.schools[winner];
        school.towers_left -= size.min(school.towers_left);
        self.board.islands[index].owner = Some(tower_color);
        tracing::info!(
            island = index,
            player = %self.schools[winner].nickname,
            towers_left = self.schools[winner].towers_left,
            "island conquered"
        );
        self.board.merge_around(index);
    }

    fn check_immediate_end(&mut self) {
        let out_of_towers = self.schools.iter().any(|s| s.towers_left == 0);
        if out_of_towers || self.board.len() <= MIN_ISLANDS {
            tracing::info!(
                out_of_towers,
                islands_left = self.board.len(),
                "game over condition reached"
            );
            self.game_over = true;
        }
    }

    fn refill_clouds(&mut self) {
        for cloud in &mut self.clouds {
            cloud.students = self.bag.draw(self.layout.cloud_students);
            cloud.taken = false;
        }
        if self.bag.is_empty() && !self.last_round {
            tracing::info!(round = self.round, "bag exhausted, next round is the last");
            self.last_round = true;
        }
    }

    /// Close the round once every player holding a card either ended their
    /// turn or left.
    fn maybe_end_round(&mut self) {
        if self.stage != RoundStage::Acting {
            return;
        }
        let done = self
            .schools
            .iter()
            .filter(|s| s.played.is_some())
            .all(|s| s.finished_turn || !s.active);
        if done {
            self.end_round();
        }
    }

    fn end_round(&mut self) {
        for school in &mut self.schools {
            school.played = None;
            school.finished_turn = false;
        }
        self.turn = TurnState::default();
        self.stage = RoundStage::Planning;
        if self.last_round {
            tracing::info!(round = self.round, "last round complete");
            self.game_over = true;
            return;
        }
        self.round += 1;
        self.refill_clouds();
        tracing::debug!(round = self.round, bag = self.bag.len(), "new round");
    }

}

impl ActionSource for EriantysRules {
    /// Every move `player` could legally submit in `phase`.
    fn candidate_actions(&self, player: &str, phase: &Phase) -> Vec<ActionRecord> {
        let Ok(idx) = self.school_index(player) else {
            return Vec::new();
        };
        let school = &self.schools[idx];
        let own_turn = self.turn.player == Some(idx);
        let mut out = Vec::new();

        for kind in phase.accepted_kinds() {
            match kind {
                BaseGameAction::PlayAssistantCard => {
                    let taken = self.taken_cards(idx);
                    let free: Vec<usize> = school
                        .deck
                        .iter()
                        .map(|c| c.value)
                        .filter(|v| !taken.contains(v))
                        .collect();
                    let options: Vec<usize> = if free.is_empty() {
                        school.deck.iter().map(|c| c.value).collect()
                    } else {
                        free
                    };
                    out.extend(options.into_iter().map(ActionRecord::play_assistant_card));
                }
                BaseGameAction::MoveStudentFromEntranceToDining => {
                    for color in school.entrance.colors() {
                        if school.dining.get(color) < DINING_CAPACITY {
                            out.push(ActionRecord::move_to_dining(color));
                        }
                    }
                }
                BaseGameAction::MoveStudentFromEntranceToIsland => {
                    for color in school.entrance.colors() {
                        for island in 0..self.board.len() {
                            out.push(ActionRecord::move_to_island(color, island));
                        }
                    }
                }
                BaseGameAction::MoveMotherNature => {
                    let len = self.board.len();
                    let max = self.mother_nature_moves(idx).min(len.saturating_sub(1));
                    for step in 1..=max {
                        let target = (self.board.mother_nature + step) % len;
                        out.push(ActionRecord::move_mother_nature(target));
                    }
                }
                BaseGameAction::SelectCloudTile => {
                    for (i, cloud) in self.clouds.iter().enumerate() {
                        if !cloud.taken {
                            out.push(ActionRecord::select_cloud_tile(i));
                        }
                    }
                }
                BaseGameAction::PlayCharacterCard => {
                    if !self.expert_mode || (own_turn && self.turn.character_played) {
                        continue;
                    }
                    for (i, card) in self.characters.iter().enumerate() {
                        if school.coins >= card.cost() {
                            out.push(ActionRecord::play_character_card(i));
                        }
                    }
                }
                BaseGameAction::CharacterCardAction => {
                    let Some(pending) = self.turn.pending_character.filter(|_| own_turn) else {
                        continue;
                    };
                    let card = &self.characters[pending];
                    match card.step() {
                        Some(CharacterCardStep::PlaceNoEntryTile) if card.no_entry_tiles > 0 => {
                            for island in 0..self.board.len() {
                                out.push(ActionRecord::CharacterCardAction {
                                    character_card_action: CharacterCardStep::PlaceNoEntryTile,
                                    selected_island: Some(island),
                                    selected_colors: Vec::new(),
                                });
                            }
                        }
                        Some(CharacterCardStep::ExcludeColor) => {
                            for color in Color::ALL {
                                out.push(ActionRecord::CharacterCardAction {
                                    character_card_action: CharacterCardStep::ExcludeColor,
                                    selected_island: None,
                                    selected_colors: vec![color],
                                });
                            }
                        }
                        _ => {}
                    }
                }
                BaseGameAction::EndTurn => out.push(ActionRecord::EndTurn),
            }
        }
        out
    }
}

impl RuleEngine for EriantysRules {
    fn setup(&mut self, players: &[Player]) -> Result<(), GameError> {
        let count = players.len();
        if !(2..=3).contains(&count) {
            return Err(GameError::Internal(format!(
                "unsupported player count {count}"
            )));
        }
        self.layout = Layout::for_players(count);
        self.board = Board::new(&mut self.rng);
        self.bag = Bag::filled(STUDENTS_PER_COLOR, &mut self.rng);
        self.coin_supply = COIN_SUPPLY;

        self.schools = players
            .iter()
            .map(|p| {
                let mut school = School::new(p.nickname.clone(), p.tower_color, self.layout.towers);
                school.entrance = self.bag.draw(self.layout.entrance);
                school.active = p.active;
                school
            })
            .collect();
        if self.expert_mode {
            for school in &mut self.schools {
                school.coins = 1;
            }
            self.coin_supply -= count;
            let mut kinds: Vec<CharacterKind> = CATALOG.iter().map(|s| s.kind).collect();
            kinds.shuffle(&mut self.rng);
            self.characters = kinds
                .into_iter()
                .take(CHARACTERS_IN_PLAY)
                .map(|k| CharacterCard::new(k, NO_ENTRY_TILES))
                .collect();
        }

        self.clouds = vec![Cloud::default(); count];
        self.refill_clouds();
        tracing::info!(
            players = count,
            expert = self.expert_mode,
            bag = self.bag.len(),
            "eriantys board ready"
        );
        Ok(())
    }

    fn play_assistant_card(&mut self, player: &str, card: Option<usize>) -> Result<(), GameError> {
        let idx = self.school_index(player)?;
        let value = card.ok_or(MissingSelection::AssistantCard)?;
        // The previous round ended without every turn being closed.
        let dangling = self.stage == RoundStage::Acting;

        let school = &self.schools[idx];
        let position = school
            .deck
            .iter()
            .position(|c| c.value == value)
            .ok_or(RuleViolation::UnknownAssistantCard(value))?;
        let taken = if dangling { Vec::new() } else { self.taken_cards(idx) };
        let has_alternative = school.deck.iter().any(|c| !taken.contains(&c.value));
        if taken.contains(&value) && has_alternative {
            return Err(RuleViolation::AssistantCardTaken(value).into());
        }

        if dangling {
            self.end_round();
        }
        let school = &mut self.schools[idx];
        let played = school.deck.remove(position);
        school.played = Some(played);
        if school.deck.is_empty() && !self.last_round {
            tracing::info!(player, "assistant deck empty, this is the last round");
            self.last_round = true;
        }
        Ok(())
    }

    fn move_student_to_island(
        &mut self,
        player: &str,
        colors: &[Color],
        island: Option<usize>,
    ) -> Result<(), GameError> {
        let idx = self.school_index(player)?;
        let color = colors.first().copied().ok_or(MissingSelection::Student)?;
        let island = island.ok_or(MissingSelection::Island)?;
        self.check_island(island)?;
        if self.schools[idx].entrance.get(color) == 0 {
            return Err(RuleViolation::UnknownStudent(color).into());
        }

        self.begin_action(idx);
        self.schools[idx].entrance.take(color);
        self.board.islands[island].students.add(color, 1);
        Ok(())
    }

    fn move_student_to_dining(&mut self, player: &str, color: Option<Color>) -> Result<(), GameError> {
        let idx = self.school_index(player)?;
        let color = color.ok_or(MissingSelection::Color)?;
        let school = &self.schools[idx];
        if school.entrance.get(color) == 0 {
            return Err(RuleViolation::UnknownStudent(color).into());
        }
        if school.dining.get(color) >= DINING_CAPACITY {
            return Err(RuleViolation::DiningRoomFull.into());
        }

        self.begin_action(idx);
        let school = &mut self.schools[idx];
        school.entrance.take(color);
        school.dining.add(color, 1);
        // Every third seat of a colour earns a coin.
        if self.expert_mode && school.dining.get(color) % 3 == 0 && self.coin_supply > 0 {
            school.coins += 1;
            self.coin_supply -= 1;
        }
        self.update_professor(color, idx);
        Ok(())
    }

    fn move_mother_nature(&mut self, player: &str, island: Option<usize>) -> Result<(), GameError> {
        let idx = self.school_index(player)?;
        let target = island.ok_or(MissingSelection::Island)?;
        self.check_island(target)?;
        let steps = self.board.steps_to(target);
        let max = self.mother_nature_moves(idx);
        if steps == 0 || steps > max {
            return Err(RuleViolation::InvalidMovement {
                requested: steps,
                max,
            }
            .into());
        }

        self.begin_action(idx);
        self.board.mother_nature = target;
        self.resolve_island(target);
        self.check_immediate_end();
        Ok(())
    }

    fn select_cloud_tile(&mut self, player: &str, cloud: Option<usize>) -> Result<(), GameError> {
        let idx = self.school_index(player)?;
        let cloud = cloud.ok_or(MissingSelection::CloudTile)?;
        let tile = self.clouds.get(cloud).ok_or(RuleViolation::IndexOutOfBounds {
            what: "cloud tile",
            index: cloud,
            len: self.clouds.len(),
        })?;
        if tile.taken {
            return Err(RuleViolation::EmptyCloudTile(cloud).into());
        }

        self.begin_action(idx);
        let tile = &mut self.clouds[cloud];
        tile.taken = true;
        let students = tile.students.drain();
        self.schools[idx].entrance.merge(&students);
        Ok(())
    }

    fn play_character_card(&mut self, player: &str, card: Option<usize>) -> Result<(), GameError> {
        if !self.expert_mode {
            return Err(RuleViolation::CharacterCardsDisabled.into());
        }
        let idx = self.school_index(player)?;
        let card = card.ok_or(MissingSelection::CharacterCard)?;
        let character = self
            .characters
            .get(card)
            .ok_or(RuleViolation::UnknownCharacterCard(card))?;
        if self.turn.player == Some(idx) && self.turn.character_played {
            return Err(RuleViolation::CharacterCardAlreadyPlayed.into());
        }
        let cost = character.cost();
        let available = self.schools[idx].coins;
        if available < cost {
            return Err(RuleViolation::NotEnoughCoins {
                required: cost,
                available,
            }
            .into());
        }

        self.begin_action(idx);
        self.schools[idx].coins -= cost;
        let character = &mut self.characters[card];
        if character.coin_on_card {
            self.coin_supply += cost;
        } else {
            character.coin_on_card = true;
            self.coin_supply += cost - 1;
        }
        self.turn.character_played = true;
        match character.kind {
            CharacterKind::Courier => self.turn.extra_moves += 2,
            CharacterKind::Herbalist | CharacterKind::MushroomSeller => {
                self.turn.pending_character = Some(card)
            }
        }
        tracing::debug!(player, kind = ?character.kind, cost, "character card played");
        Ok(())
    }

    fn character_card_action(
        &mut self,
        player: &str,
        step: CharacterCardStep,
        island: Option<usize>,
        colors: &[Color],
    ) -> Result<(), GameError> {
        let idx = self.school_index(player)?;
        let pending = self
            .turn
            .pending_character
            .filter(|_| self.turn.player == Some(idx))
            .ok_or(RuleViolation::NoActiveCharacterCard)?;
        let character = &self.characters[pending];
        if !character.accepts(step) {
            return Err(RuleViolation::UnsupportedCharacterAction.into());
        }

        match step {
            CharacterCardStep::PlaceNoEntryTile => {
                let island = island.ok_or(MissingSelection::Island)?;
                self.check_island(island)?;
                if character.no_entry_tiles == 0 {
                    return Err(RuleViolation::NoEntryTilesExhausted.into());
                }
                self.characters[pending].no_entry_tiles -= 1;
                self.board.islands[island].no_entry += 1;
            }
            CharacterCardStep::ExcludeColor => {
                let color = colors.first().copied().ok_or(MissingSelection::Color)?;
                self.turn.excluded_color = Some(color);
            }
        }
        self.turn.pending_character = None;
        Ok(())
    }

    fn end_turn(&mut self, player: &str) -> Result<(), GameError> {
        let idx = self.school_index(player)?;
        self.begin_action(idx);
        self.schools[idx].finished_turn = true;
        self.turn = TurnState::default();
        self.maybe_end_round();
        Ok(())
    }

    fn is_game_over(&self) -> bool {
        self.game_over
    }

    fn turn_order(&self) -> Vec<PlayerName> {
        let mut ranked: Vec<(usize, usize)> = self
            .schools
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.played.map(|c| (c.value, i)))
            .collect();
        ranked.sort();
        ranked
            .into_iter()
            .map(|(_, i)| self.schools[i].nickname.clone())
            .collect()
    }

    fn standings(&self) -> Vec<Standing> {
        self.schools
            .iter()
            .enumerate()
            .map(|(i, s)| {
                let professors = self.professors.iter().filter(|p| **p == Some(i)).count();
                Standing::new(s.nickname.clone(), s.towers_left, professors)
            })
            .collect()
    }

    fn exhaustion(&self) -> Exhaustion {
        Exhaustion {
            islands_left: self.board.len(),
            bag_empty: self.bag.is_empty(),
            assistant_decks_empty: self.schools.iter().any(|s| s.deck.is_empty()),
        }
    }

    fn set_player_active(&mut self, player: &str, active: bool) {
        let Ok(idx) = self.school_index(player) else {
            return;
        };
        self.schools[idx].active = active;
        if !active {
            if self.turn.player == Some(idx) {
                self.turn = TurnState::default();
            }
            self.maybe_end_round();
        }
    }
}
