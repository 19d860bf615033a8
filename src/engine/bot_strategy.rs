//! Bot strategies for simulated matches.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use crate::engine::action::ActionRecord;
use crate::engine::phase::Phase;

/// Rule engines that can list the moves available to a player.
pub trait ActionSource {
    fn candidate_actions(&self, player: &str, phase: &Phase) -> Vec<ActionRecord>;
}

/// A bot strategy picks one of the candidate moves.
pub trait BotStrategy: Send + Sync {
    fn name(&self) -> &str;

    fn choose_action(&self, candidates: &[ActionRecord], rng: &mut StdRng) -> Option<ActionRecord>;
}

/// Picks a uniformly random candidate.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomBot;

impl BotStrategy for RandomBot {
    fn name(&self) -> &str {
        "random"
    }

    fn choose_action(&self, candidates: &[ActionRecord], rng: &mut StdRng) -> Option<ActionRecord> {
        candidates.choose(rng).cloned()
    }
}

/// Prefers the dining room and ends turns as soon as it may; otherwise random.
#[derive(Debug, Clone, Copy, Default)]
pub struct HoarderBot;

impl BotStrategy for HoarderBot {
    fn name(&self) -> &str {
        "hoarder"
    }

    fn choose_action(&self, candidates: &[ActionRecord], rng: &mut StdRng) -> Option<ActionRecord> {
        let preferred: Vec<&ActionRecord> = candidates
            .iter()
            .filter(|a| {
                matches!(
                    a,
                    ActionRecord::MoveStudentFromEntranceToDining { .. } | ActionRecord::EndTurn
                )
            })
            .collect();
        match preferred.choose(rng) {
            Some(action) => Some((*action).clone()),
            None => candidates.choose(rng).cloned(),
        }
    }
}
