//! Data models for qrstudio.
//!
//! - [`Settings`]: Persisted generation preferences (size, colors, error-correction level, autosave)
//! - [`HistoryEntry`] / [`Stats`]: Persisted history records and usage counters
//! - [`GenerationRequest`] / [`GenerationResult`]: Pipeline input and output
//! - [`Theme`] / [`Language`]: Persisted presentation preferences
//! - [`AppConfig`]: Application configuration loaded from `qrstudio.yaml`
//! - [`AppState`]: Runtime state projected to the front end
//!
//! Persisted models derive `Serialize`/`Deserialize` and tolerate missing
//! fields, so records written by older versions keep loading.

pub mod app_state;
pub mod config;
pub mod generation;
pub mod history;
pub mod preferences;
pub mod settings;

pub use app_state::{
    AppState, MAX_CONCURRENT_GENERATIONS, Outcome, PipelinePhase, Toast, ToastLevel,
};
pub use config::AppConfig;
pub use generation::{EncodeParams, GenerationRequest, GenerationResult};
pub use history::{HistoryEntry, Stats};
pub use preferences::{Language, Theme};
pub use settings::{ContentType, ErrorLevel, ImageFormat, ParseEnumError, Settings};
