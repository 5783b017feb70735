use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{BootError, BootResult};

/// Lifecycle of a composition root.
///
/// `Unstarted → PluginsInstalled → Constructed → Mounted`. Transitions never
/// skip a state and never go back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BootState {
    Unstarted,
    PluginsInstalled,
    Constructed,
    Mounted,
}

impl BootState {
    /// The only state reachable from `self`, or `None` for the terminal state.
    pub fn successor(self) -> Option<BootState> {
        match self {
            BootState::Unstarted => Some(BootState::PluginsInstalled),
            BootState::PluginsInstalled => Some(BootState::Constructed),
            BootState::Constructed => Some(BootState::Mounted),
            BootState::Mounted => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        self.successor().is_none()
    }
}

impl std::fmt::Display for BootState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            BootState::Unstarted => "unstarted",
            BootState::PluginsInstalled => "plugins_installed",
            BootState::Constructed => "constructed",
            BootState::Mounted => "mounted",
        };
        write!(f, "{}", s)
    }
}

/// Tracks the current boot state and every state it has passed through.
#[derive(Debug, Clone)]
pub struct BootStateMachine {
    history: Vec<BootState>,
}

impl BootStateMachine {
    pub fn new() -> Self {
        Self {
            history: vec![BootState::Unstarted],
        }
    }

    pub fn current(&self) -> BootState {
        // history is never empty: it starts with Unstarted and only grows.
        self.history.last().copied().unwrap_or(BootState::Unstarted)
    }

    /// Every state observed so far, oldest first.
    pub fn history(&self) -> &[BootState] {
        &self.history
    }

    /// Move to `next`, which must be the direct successor of the current state.
    pub fn advance(&mut self, next: BootState) -> BootResult<()> {
        let from = self.current();
        if from.successor() != Some(next) {
            return Err(BootError::InvalidTransition { from, to: next });
        }
        info!(from = %from, to = %next, "Boot state transition");
        self.history.push(next);
        Ok(())
    }
}

impl Default for BootStateMachine {
    fn default() -> Self {
        Self::new()
    }
}
