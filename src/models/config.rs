use serde::{Deserialize, Serialize};

pub const DEFAULT_HISTORY_CAPACITY: usize = 10;
pub const MAX_HISTORY_CAPACITY: usize = 50;

/// Application configuration from `qrstudio.yaml`
///
/// Values can be overridden with `QRSTUDIO_*` environment variables
/// (e.g. `QRSTUDIO_HISTORY_CAPACITY=20`) and then by command-line flags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Directory holding the persisted store files
    pub data_dir: String,

    /// Directory downloads are written to
    pub download_dir: String,

    /// Directory for rotating log files
    pub log_dir: String,

    /// Maximum number of history entries kept
    pub history_capacity: usize,

    /// Cosmetic pause before encoding, in milliseconds
    pub encode_delay_ms: u64,

    pub debug_mode: bool,

    /// External share command, one argv element per item.
    /// `{file}` is replaced with the exported image path, `{text}` with the encoded text.
    pub share_command: Vec<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: "qrstudio-data".to_string(),
            download_dir: ".".to_string(),
            log_dir: "logs".to_string(),
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            encode_delay_ms: 0,
            debug_mode: false,
            share_command: Vec::new(),
        }
    }
}

impl AppConfig {
    /// History capacity clamped to `1..=MAX_HISTORY_CAPACITY`.
    pub fn effective_history_capacity(&self) -> usize {
        self.history_capacity.clamp(1, MAX_HISTORY_CAPACITY)
    }
}
