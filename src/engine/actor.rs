//! Async front of a session: one task owns the `GameSession` and serializes
//! player commands with suspension timer events.

use tokio::sync::{mpsc, oneshot};

use crate::engine::action::ActionRecord;
use crate::engine::error::SessionError;
use crate::engine::models::{SessionStatus, TowerColor};
use crate::engine::rules::RuleEngine;
use crate::engine::session::{ActionOutcome, GameSession};

#[derive(Debug)]
pub enum SessionCommand {
    Join {
        nickname: String,
        reply: oneshot::Sender<Result<TowerColor, SessionError>>,
    },
    Start {
        reply: oneshot::Sender<bool>,
    },
    Action {
        player: String,
        record: Option<ActionRecord>,
        reply: oneshot::Sender<ActionOutcome>,
    },
    Disconnect {
        player: String,
    },
    Reconnect {
        player: String,
    },
}

/// Drive `session` until it ends or every command sender is dropped.
/// Returns the session so callers can read the final result.
pub async fn run_session<R: RuleEngine>(
    mut session: GameSession<R>,
    mut commands: mpsc::Receiver<SessionCommand>,
) -> GameSession<R> {
    while session.status() != SessionStatus::Ended {
        tokio::select! {
            command = commands.recv() => match command {
                Some(command) => apply(&mut session, command),
                None => {
                    tracing::info!("command channel closed, stopping session");
                    break;
                }
            },
            Some(event) = session.next_timer_event() => session.handle_timer_event(event),
        }
    }
    session
}

fn apply<R: RuleEngine>(session: &mut GameSession<R>, command: SessionCommand) {
    // A dropped reply receiver only means the caller stopped waiting.
    match command {
        SessionCommand::Join { nickname, reply } => {
            let _ = reply.send(session.add_player(&nickname));
        }
        SessionCommand::Start { reply } => {
            let _ = reply.send(session.setup_game());
        }
        SessionCommand::Action {
            player,
            record,
            reply,
        } => {
            let _ = reply.send(session.perform_action(record, &player));
        }
        SessionCommand::Disconnect { player } => {
            if let Err(e) = session.disconnect(&player) {
                tracing::warn!(player = %player, error = %e, "disconnect ignored");
            }
        }
        SessionCommand::Reconnect { player } => {
            if let Err(e) = session.reconnect(&player) {
                tracing::warn!(player = %player, error = %e, "reconnect ignored");
            }
        }
    }
}

/// Cloneable client side of a running session.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    commands: mpsc::Sender<SessionCommand>,
}

/// The session task is gone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("session closed")]
pub struct SessionClosed;

impl SessionHandle {
    pub fn new(commands: mpsc::Sender<SessionCommand>) -> Self {
        Self { commands }
    }

    async fn send(&self, command: SessionCommand) -> Result<(), SessionClosed> {
        self.commands.send(command).await.map_err(|_| SessionClosed)
    }

    pub async fn join(&self, nickname: &str) -> Result<Result<TowerColor, SessionError>, SessionClosed> {
        let (reply, rx) = oneshot::channel();
        self.send(SessionCommand::Join {
            nickname: nickname.to_string(),
            reply,
        })
        .await?;
        rx.await.map_err(|_| SessionClosed)
    }

    pub async fn start(&self) -> Result<bool, SessionClosed> {
        let (reply, rx) = oneshot::channel();
        self.send(SessionCommand::Start { reply }).await?;
        rx.await.map_err(|_| SessionClosed)
    }

    pub async fn act(&self, player: &str, record: ActionRecord) -> Result<ActionOutcome, SessionClosed> {
        let (reply, rx) = oneshot::channel();
        self.send(SessionCommand::Action {
            player: player.to_string(),
            record: Some(record),
            reply,
        })
        .await?;
        rx.await.map_err(|_| SessionClosed)
    }

    pub async fn disconnect(&self, player: &str) -> Result<(), SessionClosed> {
        self.send(SessionCommand::Disconnect {
            player: player.to_string(),
        })
        .await
    }

    pub async fn reconnect(&self, player: &str) -> Result<(), SessionClosed> {
        self.send(SessionCommand::Reconnect {
            player: player.to_string(),
        })
        .await
    }
}

/// Spawn `run_session` on the current runtime.
pub fn spawn_session<R: RuleEngine + 'static>(
    session: GameSession<R>,
) -> (SessionHandle, tokio::task::JoinHandle<GameSession<R>>) {
    let (tx, rx) = mpsc::channel(64);
    let task = tokio::spawn(run_session(session, rx));
    (SessionHandle::new(tx), task)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::config::SessionConfig;
    use crate::engine::models::{EndReason, Outcome};
    use crate::engine::test_support::{RecordingNotifier, ScriptedRules};
    use std::sync::Arc;
    use std::time::Duration;

    fn make_session() -> (GameSession<ScriptedRules>, RecordingNotifier) {
        let notifier = RecordingNotifier::default();
        let session = GameSession::new(
            SessionConfig::for_players(2),
            ScriptedRules::new(),
            Arc::new(notifier.clone()),
        );
        (session, notifier)
    }

    #[tokio::test]
    async fn test_commands_are_applied_in_order() {
        let (session, notifier) = make_session();
        let (handle, task) = spawn_session(session);

        assert_eq!(handle.join("ann").await, Ok(Ok(TowerColor::White)));
        assert_eq!(handle.join("bob").await, Ok(Ok(TowerColor::Black)));
        assert_eq!(handle.start().await, Ok(true));
        let outcome = handle
            .act("bob", ActionRecord::play_assistant_card(2))
            .await
            .unwrap();
        assert!(matches!(outcome, ActionOutcome::Rejected(_)));
        let outcome = handle
            .act("ann", ActionRecord::play_assistant_card(2))
            .await
            .unwrap();
        assert_eq!(outcome, ActionOutcome::Applied);

        drop(handle);
        let session = task.await.unwrap();
        assert_eq!(session.current_actor(), Some("bob"));
        assert_eq!(notifier.errors().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_actor_applies_timeout_while_idle() {
        let (session, notifier) = make_session();
        let (handle, task) = spawn_session(session);
        handle.join("ann").await.unwrap().unwrap();
        handle.join("bob").await.unwrap().unwrap();
        handle.start().await.unwrap();
        handle.disconnect("bob").await.unwrap();

        tokio::time::sleep(Duration::from_secs(61)).await;
        let session = task.await.unwrap();
        let result = session.result().unwrap();
        assert_eq!(result.reason, EndReason::Timeout);
        assert_eq!(result.outcome, Outcome::Winner("ann".into()));
        assert_eq!(notifier.endings().len(), 1);
        assert_eq!(handle.start().await, Err(SessionClosed));
    }
}
