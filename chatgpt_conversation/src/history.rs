//! Conversation history trimming.
//!
//! History is bounded by a turn count, not by tokens. An optional system
//! turn is pinned at index 0 and sits outside that budget.

use chatgpt_config::{Config, DEFAULT_MAX_TURNS};
use chatgpt_core::{Role, Turn};
use tracing::debug;

/// How much history survives between invocations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrimPolicy {
    max_turns: usize,
    pinned: Option<Turn>,
}

impl Default for TrimPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_TURNS)
    }
}

impl TrimPolicy {
    #[must_use]
    pub const fn new(max_turns: usize) -> Self {
        Self {
            max_turns,
            pinned: None,
        }
    }

    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.max_turns).with_system_prompt(config.system_prompt.clone())
    }

    /// Pin a system turn at the head of every history.
    #[must_use]
    pub fn with_system_prompt(mut self, prompt: Option<String>) -> Self {
        self.pinned = prompt.map(Turn::system);
        self
    }

    /// The history left after a reset.
    #[must_use]
    pub fn empty_history(&self) -> Vec<Turn> {
        self.pinned.iter().cloned().collect()
    }

    fn pinned_len(&self, turns: &[Turn]) -> usize {
        usize::from(
            self.pinned.is_some() && turns.first().is_some_and(|t| t.role() == Role::System),
        )
    }

    /// Drop the oldest non-pinned turns until at most `max_turns` remain.
    pub fn apply(&self, turns: &mut Vec<Turn>) {
        let pinned = self.pinned_len(turns);
        let excess = (turns.len() - pinned).saturating_sub(self.max_turns);
        if excess > 0 {
            turns.drain(pinned..pinned + excess);
            debug!("Trimmed {excess} oldest turns, {} remain", turns.len());
        }
    }

    /// Bring a freshly loaded history in line with this policy.
    ///
    /// The configured system turn replaces any stored leading one, and a
    /// trailing user turn without a reply is discarded.
    #[must_use]
    pub fn normalize(&self, mut turns: Vec<Turn>) -> Vec<Turn> {
        if let Some(pinned) = &self.pinned {
            if turns.first().is_some_and(|t| t.role() == Role::System) {
                turns[0] = pinned.clone();
            } else {
                turns.insert(0, pinned.clone());
            }
        }

        if turns.last().is_some_and(|t| t.role() == Role::User) {
            debug!("Dropping unanswered user turn from stored history");
            turns.pop();
        }

        self.apply(&mut turns);
        turns
    }
}
