use super::generation::GenerationResult;
use super::history::Stats;
use super::preferences::{Language, Theme};

/// Maximum number of generation requests in flight.
///
/// The pipeline is single-flight: a second submit while one is encoding is
/// rejected rather than interleaved, so two encodes never race on the
/// current result or on history. Enforced by a `tokio::sync::Semaphore`
/// in [`crate::services::GenerationPipeline`].
pub const MAX_CONCURRENT_GENERATIONS: usize = 1;

/// How a request left the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Failed,
    Cancelled,
}

/// Phase of the generation state machine.
///
/// `Idle → Validating → Encoding → Settled(..)`; a validation failure goes
/// straight from `Validating` to `Settled(Failed)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PipelinePhase {
    #[default]
    Idle,
    Validating,
    Encoding,
    Settled(Outcome),
}

impl PipelinePhase {
    pub fn is_busy(self) -> bool {
        matches!(self, Self::Validating | Self::Encoding)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// A transient, dismissible user notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub level: ToastLevel,
    pub message: String,
}

impl Toast {
    pub fn new(level: ToastLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }
}

/// Single source of truth for what the front end displays.
///
/// Persisted records live in the stores; this struct holds their latest
/// projection plus the runtime-only pipeline state. Wrapped in
/// `Arc<RwLock<AppState>>` by [`crate::state::StateManager`]; never mutate it
/// directly, use [`StateManager::update`](crate::state::StateManager::update)
/// so change events are emitted.
#[derive(Clone, Debug, Default)]
pub struct AppState {
    // Pipeline
    pub phase: PipelinePhase,
    pub current_result: Option<GenerationResult>,
    /// Text of the request currently in flight
    pub pending_text: Option<String>,

    // Projections of persisted records
    pub stats: Stats,
    pub theme: Theme,
    pub language: Language,

    // Notifications
    pub toast: Option<Toast>,
    /// Bumped on every shown toast, so repeating the same message is still a change
    pub toast_seq: u64,
}

impl AppState {
    pub fn has_result(&self) -> bool {
        self.current_result.is_some()
    }

    pub fn is_generating(&self) -> bool {
        self.phase.is_busy()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_state() {
        let state = AppState::default();
        assert_eq!(state.phase, PipelinePhase::Idle);
        assert!(!state.has_result());
        assert!(!state.is_generating());
        assert_eq!(state.stats, Stats::default());
        assert_eq!(state.theme, Theme::Light);
        assert_eq!(state.language, Language::En);
        assert!(state.toast.is_none());
    }

    #[test]
    fn test_phase_busy() {
        assert!(!PipelinePhase::Idle.is_busy());
        assert!(PipelinePhase::Validating.is_busy());
        assert!(PipelinePhase::Encoding.is_busy());
        assert!(!PipelinePhase::Settled(Outcome::Success).is_busy());
        assert!(!PipelinePhase::Settled(Outcome::Failed).is_busy());
    }
}
