// State management module
//
// This module provides the StateManager which wraps AppState with thread-safe access
// using Arc<RwLock<T>> and emits change events for display refresh.

use crate::models::{
    AppState, GenerationResult, Language, Outcome, PipelinePhase, Stats, Theme, Toast, ToastLevel,
};
use std::sync::{Arc, RwLock};
use tokio::sync::broadcast;

/// Change events emitted when state is modified
///
/// Front ends subscribe to these instead of polling the state.
#[derive(Clone, Debug, PartialEq)]
pub enum StateChange {
    /// The generation pipeline moved to another phase
    PhaseChanged { phase: PipelinePhase },

    /// A new current result is available
    ResultReady { text: String },

    /// Usage counters changed
    StatsUpdated { stats: Stats },

    /// Number of history entries changed
    HistoryChanged { count: usize },

    ThemeChanged { theme: Theme },

    LanguageChanged { language: Language },

    /// A notification should be shown
    ToastShown { level: ToastLevel, message: String },

    /// The active notification was dismissed
    ToastDismissed,
}

/// Thread-safe state manager with event emission
///
/// - Provides thread-safe access to [`AppState`] via `Arc<RwLock<T>>`
/// - Detects state changes and emits [`StateChange`] events
/// - Supports subscribing to state changes via tokio broadcast channels
///
/// # Usage
///
/// - [`read()`](Self::read) for reading individual fields
/// - [`update()`](Self::update) for mutations with automatic event emission
/// - [`subscribe()`](Self::subscribe) for listening to state changes
pub struct StateManager {
    state: Arc<RwLock<AppState>>,
    state_tx: broadcast::Sender<StateChange>,
}

impl StateManager {
    /// Create a new StateManager with default state
    ///
    /// The broadcast channel buffers 100 events.
    pub fn new() -> Self {
        let (state_tx, _) = broadcast::channel(100);
        Self {
            state: Arc::new(RwLock::new(AppState::default())),
            state_tx,
        }
    }

    /// Get a cloned snapshot of the current state
    pub fn snapshot(&self) -> AppState {
        self.state.read().unwrap().clone()
    }

    /// Execute a function with read access to the state
    ///
    /// # Example
    /// ```ignore
    /// let busy = state_manager.read(|state| state.is_generating());
    /// ```
    pub fn read<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&AppState) -> R,
    {
        let state = self.state.read().unwrap();
        f(&state)
    }

    /// Update the state and emit change events
    ///
    /// Captures the old state, applies `update_fn`, diffs the two and
    /// broadcasts one event per detected change.
    ///
    /// # Returns
    /// The events that were emitted
    pub fn update<F>(&self, update_fn: F) -> Vec<StateChange>
    where
        F: FnOnce(&mut AppState),
    {
        let mut state = self.state.write().unwrap();
        let old_state = state.clone();

        update_fn(&mut state);

        let changes = Self::detect_changes(&old_state, &state);

        for change in &changes {
            // No subscribers is fine
            let _ = self.state_tx.send(change.clone());
        }

        changes
    }

    /// Subscribe to state change events
    pub fn subscribe(&self) -> broadcast::Receiver<StateChange> {
        self.state_tx.subscribe()
    }

    fn detect_changes(old: &AppState, new: &AppState) -> Vec<StateChange> {
        let mut changes = Vec::new();

        if old.phase != new.phase {
            changes.push(StateChange::PhaseChanged { phase: new.phase });
        }

        let result_key = |r: &Option<GenerationResult>| {
            r.as_ref().map(|r| (r.text.clone(), r.timestamp))
        };
        if result_key(&old.current_result) != result_key(&new.current_result) {
            if let Some(result) = &new.current_result {
                changes.push(StateChange::ResultReady {
                    text: result.text.clone(),
                });
            }
        }

        if old.stats != new.stats {
            changes.push(StateChange::StatsUpdated { stats: new.stats });
        }

        if old.stats.history_count != new.stats.history_count {
            changes.push(StateChange::HistoryChanged {
                count: new.stats.history_count,
            });
        }

        if old.theme != new.theme {
            changes.push(StateChange::ThemeChanged { theme: new.theme });
        }

        if old.language != new.language {
            changes.push(StateChange::LanguageChanged {
                language: new.language,
            });
        }

        if old.toast != new.toast || old.toast_seq != new.toast_seq {
            match &new.toast {
                Some(toast) => changes.push(StateChange::ToastShown {
                    level: toast.level,
                    message: toast.message.clone(),
                }),
                None => changes.push(StateChange::ToastDismissed),
            }
        }

        changes
    }

    // Convenience methods for common state updates

    /// Enter `Validating` for a freshly submitted text
    pub fn begin_request(&self, text: &str) -> Vec<StateChange> {
        self.update(|state| {
            state.phase = PipelinePhase::Validating;
            state.pending_text = Some(text.to_string());
        })
    }

    pub fn set_phase(&self, phase: PipelinePhase) -> Vec<StateChange> {
        self.update(|state| {
            state.phase = phase;
        })
    }

    /// Settle successfully, replacing the current result
    pub fn settle_success(&self, result: GenerationResult, stats: Stats) -> Vec<StateChange> {
        self.update(|state| {
            state.phase = PipelinePhase::Settled(Outcome::Success);
            state.pending_text = None;
            state.current_result = Some(result);
            state.stats = stats;
        })
    }

    /// Settle with a failure; the current result is left untouched
    pub fn settle_failed(&self, toast: Toast) -> Vec<StateChange> {
        self.update(|state| {
            state.phase = PipelinePhase::Settled(Outcome::Failed);
            state.pending_text = None;
            state.toast = Some(toast);
            state.toast_seq += 1;
        })
    }

    pub fn settle_cancelled(&self) -> Vec<StateChange> {
        self.update(|state| {
            state.phase = PipelinePhase::Settled(Outcome::Cancelled);
            state.pending_text = None;
        })
    }

    pub fn set_stats(&self, stats: Stats) -> Vec<StateChange> {
        self.update(|state| {
            state.stats = stats;
        })
    }

    pub fn set_theme(&self, theme: Theme) -> Vec<StateChange> {
        self.update(|state| {
            state.theme = theme;
        })
    }

    pub fn set_language(&self, language: Language) -> Vec<StateChange> {
        self.update(|state| {
            state.language = language;
        })
    }

    /// Show a notification, replacing any active one
    pub fn show_toast(&self, toast: Toast) -> Vec<StateChange> {
        self.update(|state| {
            state.toast = Some(toast);
            state.toast_seq += 1;
        })
    }

    pub fn dismiss_toast(&self) -> Vec<StateChange> {
        self.update(|state| {
            state.toast = None;
        })
    }
}

impl Default for StateManager {
    fn default() -> Self {
        Self::new()
    }
}

// Clones share the same state and channel
impl Clone for StateManager {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            state_tx: self.state_tx.clone(),
        }
    }
}
