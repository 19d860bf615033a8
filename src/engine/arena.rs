//! Bot-vs-bot arena: full simulated sessions through the session controller.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;

use crate::engine::bot_strategy::{ActionSource, BotStrategy};
use crate::engine::config::SessionConfig;
use crate::engine::models::{EndReason, GameResult, Outcome, SessionStatus};
use crate::engine::rules::RuleEngine;
use crate::engine::session::{ActionOutcome, GameSession, LogNotifier};

/// Hard cap on actions per simulated match.
pub const MAX_ACTIONS: usize = 5_000;

/// One simulated match.
#[derive(Debug, Clone)]
pub struct MatchReport {
    pub seed: u64,
    /// `None` when the match hit the action cap or a bot ran out of moves.
    pub result: Option<GameResult>,
    pub actions: usize,
    pub rejected: usize,
    pub duration_ms: f64,
}

/// Aggregated results from an arena run.
#[derive(Debug, Default)]
pub struct ArenaResult {
    pub num_games: usize,
    pub wins: HashMap<String, usize>,
    pub ties: usize,
    pub no_winner: usize,
    pub unfinished: usize,
    pub reasons: HashMap<EndReason, usize>,
    pub actions: Vec<usize>,
    pub game_durations_ms: Vec<f64>,
}

impl ArenaResult {
    fn record(&mut self, report: &MatchReport) {
        self.actions.push(report.actions);
        self.game_durations_ms.push(report.duration_ms);
        let Some(result) = &report.result else {
            self.unfinished += 1;
            return;
        };
        *self.reasons.entry(result.reason).or_default() += 1;
        match &result.outcome {
            Outcome::Winner(name) => *self.wins.entry(name.clone()).or_default() += 1,
            Outcome::Tie(_) => self.ties += 1,
            Outcome::NoWinner => self.no_winner += 1,
        }
    }

    pub fn win_rate(&self, name: &str) -> f64 {
        *self.wins.get(name).unwrap_or(&0) as f64 / self.num_games.max(1) as f64
    }

    pub fn avg_actions(&self) -> f64 {
        if self.actions.is_empty() {
            return 0.0;
        }
        self.actions.iter().sum::<usize>() as f64 / self.actions.len() as f64
    }

    pub fn summary(&self) -> String {
        let mut lines = vec![format!("Arena Results ({} games)", self.num_games)];
        lines.push("=".repeat(50));
        let mut names: Vec<&String> = self.wins.keys().collect();
        names.sort();
        for name in names {
            lines.push(format!(
                "  {:>10}: {:4} wins ({:5.1}%)",
                name,
                self.wins[name],
                self.win_rate(name) * 100.0
            ));
        }
        lines.push(format!("  {:>10}: {}", "Ties", self.ties));
        lines.push(format!("  {:>10}: {}", "No winner", self.no_winner));
        lines.push(format!("  {:>10}: {}", "Unfinished", self.unfinished));
        let mut reasons: Vec<String> = self
            .reasons
            .iter()
            .map(|(reason, n)| format!("{reason:?}={n}"))
            .collect();
        reasons.sort();
        lines.push(format!("  End reasons: {}", reasons.join(", ")));
        if !self.game_durations_ms.is_empty() {
            let total_ms: f64 = self.game_durations_ms.iter().sum();
            lines.push(format!(
                "  Avg actions: {:.0}  |  Avg game: {:.1}ms  |  Total: {:.2}s",
                self.avg_actions(),
                total_ms / self.game_durations_ms.len() as f64,
                total_ms / 1000.0
            ));
        }
        lines.join("\n")
    }
}

/// Seat names used by simulated matches.
pub fn bot_names(players_number: usize) -> Vec<String> {
    (1..=players_number).map(|i| format!("bot-{i}")).collect()
}

/// Play one match to the end with `strategy` in every seat.
pub fn play_match<R>(
    config: &SessionConfig,
    rules: R,
    strategy: &dyn BotStrategy,
    seed: u64,
) -> MatchReport
where
    R: RuleEngine + ActionSource,
{
    let t0 = Instant::now();
    let mut rng = StdRng::seed_from_u64(seed);
    let mut session = GameSession::new(config.clone(), rules, Arc::new(LogNotifier));
    for name in bot_names(config.players_number) {
        if let Err(e) = session.add_player(&name) {
            tracing::warn!(error = %e, "arena seat refused");
        }
    }
    session.setup_game();

    let mut actions = 0;
    let mut rejected = 0;
    while session.status() == SessionStatus::InProgress && actions < MAX_ACTIONS {
        let (Some(actor), Some(phase)) = (session.current_actor(), session.phase()) else {
            break;
        };
        let actor = actor.to_string();
        let candidates = session.rules().candidate_actions(&actor, phase);
        let Some(action) = strategy.choose_action(&candidates, &mut rng) else {
            tracing::warn!(player = %actor, phase = phase.name(), "bot has no move");
            break;
        };
        actions += 1;
        if let ActionOutcome::Rejected(e) = session.perform_action(Some(action), &actor) {
            rejected += 1;
            tracing::debug!(player = %actor, error = %e, "bot move rejected");
        }
    }
    if session.status() == SessionStatus::InProgress {
        tracing::warn!(seed, actions, "match did not finish");
    }

    MatchReport {
        seed,
        result: session.result().cloned(),
        actions,
        rejected,
        duration_ms: t0.elapsed().as_secs_f64() * 1000.0,
    }
}

/// Run `num_games` matches in parallel and aggregate them. Game `i` uses
/// seed `base_seed + i` for both the rules and the bots.
pub fn run_arena<R, F>(
    config: &SessionConfig,
    num_games: usize,
    base_seed: u64,
    make_rules: F,
    strategy: &dyn BotStrategy,
    progress_callback: Option<&(dyn Fn(usize, usize) + Sync)>,
) -> ArenaResult
where
    R: RuleEngine + ActionSource,
    F: Fn(u64) -> R + Sync,
{
    let done = AtomicUsize::new(0);
    let reports: Vec<MatchReport> = (0..num_games)
        .into_par_iter()
        .map(|game_idx| {
            let seed = base_seed + game_idx as u64;
            let report = play_match(config, make_rules(seed), strategy, seed);
            let finished = done.fetch_add(1, Ordering::Relaxed) + 1;
            if let Some(cb) = progress_callback {
                cb(finished, num_games);
            }
            report
        })
        .collect();

    let mut result = ArenaResult {
        num_games,
        ..ArenaResult::default()
    };
    for report in &reports {
        result.record(report);
    }
    tracing::info!(
        games = num_games,
        ties = result.ties,
        unfinished = result.unfinished,
        "arena finished"
    );
    result
}
