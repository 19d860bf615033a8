//! End-to-end session tests against the reference Eriantys rules.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use eriantys_turn_engine::engine::action::ActionRecord;
use eriantys_turn_engine::engine::actor::spawn_session;
use eriantys_turn_engine::engine::arena::{play_match, run_arena};
use eriantys_turn_engine::engine::bot_strategy::{ActionSource, HoarderBot, RandomBot};
use eriantys_turn_engine::engine::config::SessionConfig;
use eriantys_turn_engine::engine::error::TurnError;
use eriantys_turn_engine::engine::models::{EndReason, Outcome, SessionStatus};
use eriantys_turn_engine::engine::phase::Phase;
use eriantys_turn_engine::engine::session::{ActionOutcome, GameSession, MatchNotifier};
use eriantys_turn_engine::games::eriantys::EriantysRules;

#[derive(Clone, Default)]
struct Inbox {
    errors: Arc<Mutex<Vec<(String, String)>>>,
    endings: Arc<Mutex<Vec<String>>>,
}

impl MatchNotifier for Inbox {
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

fn make_session(players: &[&str], seed: u64) -> (GameSession<EriantysRules>, Inbox) {
    let inbox = Inbox::default();
    let config = SessionConfig {
        seed: Some(seed),
        ..SessionConfig::for_players(players.len())
    };
    let rules = EriantysRules::from_config(&config);
    let mut session = GameSession::new(config, rules, Arc::new(inbox.clone()));
    for name in players {
        session.add_player(name).unwrap();
    }
    assert!(session.setup_game());
    (session, inbox)
}

/// Play the first candidate move of whoever is up.
fn step(session: &mut GameSession<EriantysRules>) -> ActionOutcome {
    let actor = session.current_actor().unwrap().to_string();
    let phase = session.phase().unwrap().clone();
    let action = session
        .rules()
        .candidate_actions(&actor, &phase)
        .into_iter()
        .find(|a| !matches!(a, ActionRecord::PlayCharacterCard { .. }))
        .unwrap();
    session.perform_action(Some(action), &actor)
}

#[test]
fn test_plan_phase_then_turn_order_by_card_value() {
    let (mut session, _) = make_session(&["ann", "bob", "cid"], 11);
    for (player, card) in [("ann", 9), ("bob", 3), ("cid", 5)] {
        assert_eq!(
            session.perform_action(Some(ActionRecord::play_assistant_card(card)), player),
            ActionOutcome::Applied
        );
    }
    assert_eq!(session.phase(), Some(&Phase::MoveStudent { moves: 0 }));
    assert_eq!(session.current_actor(), Some("bob"));
}

#[test]
fn test_duplicate_card_is_refused_privately() {
    let (mut session, inbox) = make_session(&["ann", "bob"], 3);
    session.perform_action(Some(ActionRecord::play_assistant_card(4)), "ann");
    let outcome = session.perform_action(Some(ActionRecord::play_assistant_card(4)), "bob");
    assert!(matches!(outcome, ActionOutcome::Rejected(TurnError::Game(_))));
    assert_eq!(
        inbox.errors.lock().unwrap().as_slice(),
        &[(
            "bob".to_string(),
            "Another player already played that assistant card this round.".to_string()
        )]
    );
    assert_eq!(session.current_actor(), Some("bob"));
}

#[test]
fn test_json_records_drive_the_session() {
    let (mut session, _) = make_session(&["ann", "bob"], 5);
    let message = serde_json::json!({"kind": "PLAY_ASSISTANT_CARD", "selectedCard": 2});
    let record = ActionRecord::decode(&message).unwrap();
    assert_eq!(session.perform_action(Some(record), "ann"), ActionOutcome::Applied);

    let missing = serde_json::json!({"kind": "PLAY_ASSISTANT_CARD"});
    let record = ActionRecord::decode(&missing).unwrap();
    let outcome = session.perform_action(Some(record), "bob");
    assert_eq!(
        outcome,
        ActionOutcome::Rejected(TurnError::Game(
            eriantys_turn_engine::engine::error::MissingSelection::AssistantCard.into()
        ))
    );
}

#[test]
fn test_one_full_round_returns_to_plan() {
    let (mut session, _) = make_session(&["ann", "bob"], 9);
    session.perform_action(Some(ActionRecord::play_assistant_card(1)), "ann");
    session.perform_action(Some(ActionRecord::play_assistant_card(2)), "bob");
    assert_eq!(session.current_actor(), Some("ann"));

    let mut guard = 0;
    while !matches!(session.phase(), Some(Phase::Plan { .. })) {
        assert_eq!(step(&mut session), ActionOutcome::Applied);
        guard += 1;
        assert!(guard < 40, "round did not close");
    }
    assert_eq!(session.rules().round(), 2);
    assert_eq!(session.current_actor(), Some("ann"));
}

#[test]
fn test_simulated_matches_finish_with_a_result() {
    for players in [2, 3] {
        for seed in 0..5 {
            let config = SessionConfig::for_players(players);
            let report = play_match(&config, EriantysRules::new(true, seed), &RandomBot, seed);
            let result = report.result.expect("match should finish");
            assert_eq!(result.reason, EndReason::Normal);
            assert_eq!(report.rejected, 0);
            assert!(!result.message.is_empty());
        }
    }
}

#[test]
fn test_arena_aggregates_every_game() {
    let config = SessionConfig {
        expert_mode: false,
        ..SessionConfig::for_players(2)
    };
    let result = run_arena(&config, 8, 100, |seed| EriantysRules::new(false, seed), &HoarderBot, None);
    let decided: usize = result.wins.values().sum::<usize>() + result.ties + result.no_winner;
    assert_eq!(decided + result.unfinished, 8);
    assert_eq!(result.unfinished, 0);
    assert_eq!(result.actions.len(), 8);
    assert!(result.summary().contains("Arena Results (8 games)"));
}

#[test]
fn test_disconnected_actor_is_skipped_in_action_turns() {
    let (mut session, _) = make_session(&["ann", "bob", "cid"], 21);
    for (player, card) in [("ann", 1), ("bob", 2), ("cid", 3)] {
        session.perform_action(Some(ActionRecord::play_assistant_card(card)), player);
    }
    assert_eq!(session.current_actor(), Some("ann"));
    session.disconnect("ann").unwrap();
    assert_eq!(session.phase(), Some(&Phase::MoveStudent { moves: 0 }));
    assert_eq!(session.current_actor(), Some("bob"));
}

#[tokio::test(start_paused = true)]
async fn test_timeout_survivor_wins_through_actor() {
    let inbox = Inbox::default();
    let config = SessionConfig {
        seed: Some(1),
        ..SessionConfig::for_players(2)
    };
    let session = GameSession::new(
        config.clone(),
        EriantysRules::from_config(&config),
        Arc::new(inbox.clone()),
    );
    let (handle, task) = spawn_session(session);
    handle.join("ann").await.unwrap().unwrap();
    handle.join("bob").await.unwrap().unwrap();
    assert_eq!(handle.start().await, Ok(true));
    handle.act("ann", ActionRecord::play_assistant_card(3)).await.unwrap();
    handle.disconnect("ann").await.unwrap();

    tokio::time::sleep(Duration::from_secs(60)).await;
    let session = task.await.unwrap();
    assert_eq!(session.status(), SessionStatus::Ended);
    let result = session.result().unwrap();
    assert_eq!(result.outcome, Outcome::Winner("bob".into()));
    assert_eq!(result.reason, EndReason::Timeout);
    assert_eq!(inbox.endings.lock().unwrap().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_reconnect_before_timeout_resumes_play() {
    let (mut session, inbox) = make_session(&["ann", "bob"], 2);
    session.perform_action(Some(ActionRecord::play_assistant_card(3)), "ann");
    session.disconnect("ann").unwrap();
    assert!(session.is_suspended());

    tokio::time::advance(Duration::from_secs(59)).await;
    session.reconnect("ann").unwrap();
    assert_eq!(session.phase(), Some(&Phase::Plan { acted: 1 }));
    assert_eq!(session.current_actor(), Some("bob"));

    tokio::time::advance(Duration::from_secs(30)).await;
    tokio::task::yield_now().await;
    assert_eq!(session.try_timer_event(), None);
    assert_eq!(
        session.perform_action(Some(ActionRecord::play_assistant_card(5)), "bob"),
        ActionOutcome::Applied
    );
    assert!(inbox.endings.lock().unwrap().is_empty());
}
