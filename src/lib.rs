// QR Studio - QR code generation with persisted settings, stats and history
//
// This is the library crate containing the core business logic and data structures.
// The binary crate (main.rs) provides the command line and the interactive session.

pub mod config;
pub mod i18n;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod services;
pub mod state;
pub mod storage;
pub mod stores;
pub mod studio;
pub mod ui;

// Re-export commonly used types for convenience
pub use config::ConfigManager;
pub use metrics::Metrics;
pub use models::{AppConfig, AppState, GenerationResult, HistoryEntry, Settings, Stats};
pub use state::{StateChange, StateManager};
pub use studio::Studio;

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
