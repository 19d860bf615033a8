//! Session controller: roster, lifecycle, error routing and game end.
//!
//! This is the only place domain errors become player-facing text, and the
//! boundary past which no failure propagates: anything unexpected ends the
//! whole session with a generic message.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use crate::engine::action::ActionRecord;
use crate::engine::config::SessionConfig;
use crate::engine::dispatcher::{Dispatch, TurnDispatcher};
use crate::engine::error::{ConfigError, SessionError, TurnError, INTERNAL_ERROR_MESSAGE};
use crate::engine::models::*;
use crate::engine::phase::Phase;
use crate::engine::ranking::compute_outcome;
use crate::engine::rules::RuleEngine;
use crate::engine::suspension::{CancelOutcome, SuspensionExpired, SuspensionManager};
use crate::engine::table::{Seating, Table};

/// Outbound messaging boundary.
pub trait MatchNotifier: Send + Sync {
    /// Report a refused action to the player who sent it.
    fn send_error(&self, player: &str, message: &str);
    /// Close the match for everybody with a final message.
    fn end_match(&self, message: &str);
}

/// Notifier that only logs. Used when nobody is listening, e.g. the arena.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl MatchNotifier for LogNotifier {
    fn send_error(&self, player: &str, message: &str) {
        tracing::debug!(player, message, "action refused");
    }

    fn end_match(&self, message: &str) {
        tracing::debug!(message, "match ended");
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    Applied,
    /// Refused; the player was told why and the game goes on.
    Rejected(TurnError),
    GameOver(GameResult),
    /// Unexpected failure; the session was closed.
    Aborted,
}

pub struct GameSession<R: RuleEngine> {
    config: SessionConfig,
    table: Table,
    rules: R,
    dispatcher: Option<TurnDispatcher>,
    status: SessionStatus,
    notifier: Arc<dyn MatchNotifier>,
    suspension: SuspensionManager,
    result: Option<GameResult>,
}

impl<R: RuleEngine> GameSession<R> {
    /// Validate `config` and build the session.
    pub fn try_new(
        config: SessionConfig,
        rules: R,
        notifier: Arc<dyn MatchNotifier>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::new(config, rules, notifier))
    }

    /// Build a session from an already validated config. An unsupported
    /// player count leaves a roster that can never fill; use `try_new` for
    /// configs from outside.
    pub fn new(config: SessionConfig, rules: R, notifier: Arc<dyn MatchNotifier>) -> Self {
        let suspension = SuspensionManager::new(config.suspension_timeout());
        Self {
            config,
            table: Table::new(),
            rules,
            dispatcher: None,
            status: SessionStatus::Setup,
            notifier,
            suspension,
            result: None,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    pub fn rules(&self) -> &R {
        &self.rules
    }

    pub fn rules_mut(&mut self) -> &mut R {
        &mut self.rules
    }

    pub fn phase(&self) -> Option<&Phase> {
        self.dispatcher.as_ref().map(|d| d.phase())
    }

    pub fn result(&self) -> Option<&GameResult> {
        self.result.as_ref()
    }

    pub fn is_suspended(&self) -> bool {
        self.suspension.is_active()
    }

    /// Nickname of the player the current phase waits for.
    pub fn current_actor(&self) -> Option<&str> {
        let phase = self.phase()?;
        phase.actor(&self.table).map(|p| p.nickname.as_str())
    }

    // ------------------------------------------------------------------ //
    //  Roster and setup
    // ------------------------------------------------------------------ //

    /// Add a player to the roster; towers are coloured by join order.
    pub fn add_player(&mut self, nickname: &str) -> Result<TowerColor, SessionError> {
        if self.status != SessionStatus::Setup {
            return Err(SessionError::AlreadyStarted);
        }
        let nickname = nickname.trim();
        if nickname.is_empty() {
            return Err(SessionError::MissingNickname);
        }
        if self.table.contains(nickname) {
            return Err(SessionError::NicknameTaken(nickname.to_string()));
        }
        let join_index = self.table.len();
        if join_index >= self.config.players_number {
            return Err(SessionError::SessionFull(self.config.players_number));
        }
        let tower_color = TowerColor::for_join_index(join_index)
            .ok_or(SessionError::SessionFull(self.config.players_number))?;
        self.table.push(Player::new(nickname, join_index, tower_color));
        tracing::info!(player = nickname, ?tower_color, join_index, "player joined");
        Ok(tower_color)
    }

    /// Start the game once the roster is full. A short roster ends the
    /// session with an explanation instead of failing. Returns whether play
    /// started.
    pub fn setup_game(&mut self) -> bool {
        if self.status != SessionStatus::Setup {
            tracing::warn!(status = ?self.status, "setup requested outside of setup");
            return false;
        }
        let joined = self.table.len();
        let needed = self.config.players_number;
        if joined < needed {
            let message = format!(
                "The game cannot start: {joined} of {needed} players joined."
            );
            self.end(GameResult::with_message(
                Outcome::NoWinner,
                EndReason::NotEnoughPlayers,
                message,
            ));
            return false;
        }
        if let Err(e) = self.rules.setup(self.table.players()) {
            tracing::error!(error = %e, "rule engine setup failed");
            self.abort();
            return false;
        }
        self.table.select(Seating::Table, 0);
        self.dispatcher = Some(TurnDispatcher::new());
        self.status = SessionStatus::InProgress;
        tracing::info!(players = joined, "game started");

        // A player may have dropped while the roster was filling up.
        match self.table.active_count() {
            0 => self.abandon(),
            1 => self.suspend(),
            _ => self.skip_disconnected_actor(),
        }
        self.finish_if_rules_ended();
        self.status == SessionStatus::InProgress
    }

    // ------------------------------------------------------------------ //
    //  Actions
    // ------------------------------------------------------------------ //

    /// Run one player action and report the result to the players.
    pub fn perform_action(&mut self, record: Option<ActionRecord>, player: &str) -> ActionOutcome {
        if self.status != SessionStatus::InProgress || self.dispatcher.is_none() {
            return self.reject(player, TurnError::NotStarted);
        }
        let Some(dispatcher) = self.dispatcher.as_mut() else {
            return ActionOutcome::Aborted;
        };
        let table = &mut self.table;
        let rules = &mut self.rules;
        let dispatched = catch_unwind(AssertUnwindSafe(|| {
            dispatcher.handle_action(record.as_ref(), player, table, rules)
        }));

        match dispatched {
            Ok(Ok(Dispatch::Applied)) => ActionOutcome::Applied,
            Ok(Ok(Dispatch::GameOver)) => {
                let result = self.finish_game();
                ActionOutcome::GameOver(result)
            }
            Ok(Err(e)) if e.is_recoverable() => self.reject(player, e),
            Ok(Err(e)) => {
                tracing::error!(player, error = %e, "unrecoverable error while handling action");
                self.abort();
                ActionOutcome::Aborted
            }
            Err(_) => {
                tracing::error!(player, "rule engine panicked while handling action");
                self.abort();
                ActionOutcome::Aborted
            }
        }
    }

    fn reject(&self, player: &str, error: TurnError) -> ActionOutcome {
        tracing::warn!(player, error = %error, "action rejected");
        self.notifier.send_error(player, &error.player_message());
        ActionOutcome::Rejected(error)
    }

    /// Termination signal: rank the players and close the session.
    fn finish_game(&mut self) -> GameResult {
        let standings = self.rules.standings();
        let exhaustion = self.rules.exhaustion();
        let outcome = compute_outcome(&standings);
        tracing::info!(
            ?outcome,
            islands_left = exhaustion.islands_left,
            bag_empty = exhaustion.bag_empty,
            decks_empty = exhaustion.assistant_decks_empty,
            "game over"
        );
        let result = GameResult::new(outcome, EndReason::Normal);
        self.end(result.clone());
        result
    }

    /// Close the game if the rule engine reached its end outside of an
    /// action, e.g. a disconnection that completed the last round.
    fn finish_if_rules_ended(&mut self) -> bool {
        if self.status != SessionStatus::InProgress || !self.rules.is_game_over() {
            return false;
        }
        if let Some(dispatcher) = self.dispatcher.as_mut() {
            let phase = dispatcher.replace_phase(Phase::EndGame);
            dispatcher.replace_phase(phase.on_end_game());
        }
        self.finish_game();
        true
    }

    fn abort(&mut self) {
        self.end(GameResult::with_message(
            Outcome::NoWinner,
            EndReason::InternalError,
            INTERNAL_ERROR_MESSAGE,
        ));
    }

    fn abandon(&mut self) {
        self.end(GameResult::with_message(
            Outcome::NoWinner,
            EndReason::Abandoned,
            "Every player left the game.",
        ));
    }

    fn end(&mut self, result: GameResult) {
        if self.status == SessionStatus::Ended {
            return;
        }
        self.status = SessionStatus::Ended;
        self.suspension.shutdown();
        if let Some(dispatcher) = self.dispatcher.as_mut() {
            dispatcher.replace_phase(Phase::EndGame);
        }
        tracing::info!(reason = ?result.reason, message = %result.message, "session ended");
        self.notifier.end_match(&result.message);
        self.result = Some(result);
    }

    // ------------------------------------------------------------------ //
    //  Connections and suspension
    // ------------------------------------------------------------------ //

    pub fn disconnect(&mut self, player: &str) -> Result<(), SessionError> {
        let was_active = self
            .table
            .set_active(player, false)
            .ok_or_else(|| SessionError::UnknownPlayer(player.to_string()))?;
        if !was_active {
            return Ok(());
        }
        self.rules.set_player_active(player, false);
        tracing::info!(player, active = self.table.active_count(), "player disconnected");

        if self.status != SessionStatus::InProgress || self.finish_if_rules_ended() {
            return Ok(());
        }
        match self.table.active_count() {
            0 => self.abandon(),
            1 if !self.suspension.is_active() => self.suspend(),
            _ if !self.suspension.is_active() => self.skip_disconnected_actor(),
            _ => {}
        }
        self.finish_if_rules_ended();
        Ok(())
    }

    pub fn reconnect(&mut self, player: &str) -> Result<(), SessionError> {
        let was_active = self
            .table
            .set_active(player, true)
            .ok_or_else(|| SessionError::UnknownPlayer(player.to_string()))?;
        if was_active {
            return Ok(());
        }
        self.rules.set_player_active(player, true);
        tracing::info!(player, active = self.table.active_count(), "player reconnected");

        if self.status != SessionStatus::InProgress || self.finish_if_rules_ended() {
            return Ok(());
        }
        match self.suspension.cancel() {
            CancelOutcome::Resumed => self.resume(),
            CancelOutcome::AlreadyExpired { survivor } => self.resolve_timeout(survivor),
            CancelOutcome::NotSuspended => {}
        }
        self.finish_if_rules_ended();
        Ok(())
    }

    fn suspend(&mut self) {
        let Some(dispatcher) = self.dispatcher.as_mut() else {
            return;
        };
        if dispatcher.phase().is_terminal() || dispatcher.phase().is_suspended() {
            return;
        }
        let previous = dispatcher.replace_phase(Phase::EndGame);
        tracing::info!(phase = previous.name(), "session suspended");
        dispatcher.replace_phase(Phase::Suspended {
            previous: Box::new(previous),
        });
        let survivor = self.table.active_players().next().map(|p| p.nickname.clone());
        self.suspension.begin(survivor);
    }

    /// Restore the suspended phase, skipping its actor if still away.
    fn resume(&mut self) {
        let Some(dispatcher) = self.dispatcher.as_mut() else {
            return;
        };
        let phase = dispatcher.replace_phase(Phase::EndGame);
        let restored = match phase {
            Phase::Suspended { previous } => previous.skip_inactive_actor(&mut self.table, &self.rules),
            other => other,
        };
        tracing::info!(phase = restored.name(), "session resumed");
        dispatcher.replace_phase(restored);
    }

    fn skip_disconnected_actor(&mut self) {
        let Some(dispatcher) = self.dispatcher.as_mut() else {
            return;
        };
        let phase = dispatcher.replace_phase(Phase::EndGame);
        let phase = phase.skip_inactive_actor(&mut self.table, &self.rules);
        dispatcher.replace_phase(phase);
    }

    fn resolve_timeout(&mut self, survivor: Option<PlayerName>) {
        let result = match survivor {
            Some(name) => {
                let message = format!(
                    "{name} wins the game: the other players did not reconnect in time."
                );
                GameResult::with_message(Outcome::Winner(name), EndReason::Timeout, message)
            }
            None => GameResult::with_message(
                Outcome::NoWinner,
                EndReason::Timeout,
                "The game ended: nobody reconnected in time.",
            ),
        };
        self.end(result);
    }

    /// Wait for the suspension timer. Pending forever while nothing is armed.
    pub async fn next_timer_event(&mut self) -> Option<SuspensionExpired> {
        self.suspension.next_event().await
    }

    pub fn try_timer_event(&mut self) -> Option<SuspensionExpired> {
        self.suspension.try_next_event()
    }

    /// Apply a timer expiry; stale events from resolved suspensions are ignored.
    pub fn handle_timer_event(&mut self, event: SuspensionExpired) {
        if self.status != SessionStatus::InProgress {
            return;
        }
        if let Some(survivor) = self.suspension.take_expired(event) {
            self.resolve_timeout(survivor);
        }
    }
}
