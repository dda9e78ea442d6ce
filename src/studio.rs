//! Composition root wiring stores, state and the pipeline together.
//!
//! A [`Studio`] owns one [`StoreHandle`] and hands clones of it to every
//! store; front ends talk only to the studio and observe it through
//! [`StateManager::subscribe`].

use crate::i18n::{Catalog, msg};
use crate::metrics::Metrics;
use crate::models::settings::{DEFAULT_DARK_COLOR, DEFAULT_LIGHT_COLOR};
use crate::models::{
    AppConfig, EncodeParams, ErrorLevel, GenerationResult, HistoryEntry, Language, Settings,
    Stats, Theme, Toast, ToastLevel,
};
use crate::services::export;
use crate::services::share::ShareOutcome;
use crate::services::{
    Encoder, EncodingError, GenerationPipeline, PipelineError, QrCodeEncoder, ShareChain,
};
use crate::state::StateManager;
use crate::storage::{FileStore, MemoryStore, StoreHandle};
use crate::stores::{HistoryStore, LanguageStore, SettingsStore, StatsStore, ThemeStore};
use crate::ui::terminal;
use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use std::sync::Arc;
use std::time::Duration;

pub struct Studio {
    config: AppConfig,
    settings: SettingsStore,
    stats: StatsStore,
    history: HistoryStore,
    themes: ThemeStore,
    languages: LanguageStore,
    state: StateManager,
    metrics: Arc<Metrics>,
    encoder: Arc<dyn Encoder>,
    pipeline: GenerationPipeline,
}

impl Studio {
    /// Open the studio on the configured data directory.
    ///
    /// With `ephemeral` nothing touches the disk: records live in memory for
    /// the lifetime of the process.
    pub fn open(config: AppConfig, ephemeral: bool) -> Result<Self> {
        let store: StoreHandle = if ephemeral {
            tracing::info!("Using in-memory store");
            Arc::new(MemoryStore::new())
        } else {
            let store = FileStore::open(&config.data_dir)
                .with_context(|| format!("Failed to open data directory: {}", config.data_dir))?;
            Arc::new(store)
        };

        let share_chain = ShareChain::for_environment(&config);
        Ok(Self::with_parts(
            config,
            store,
            Arc::new(QrCodeEncoder::new()),
            share_chain,
        ))
    }

    /// Assemble a studio from explicit collaborators.
    pub fn with_parts(
        config: AppConfig,
        store: StoreHandle,
        encoder: Arc<dyn Encoder>,
        share_chain: ShareChain,
    ) -> Self {
        let settings = SettingsStore::new(store.clone());
        let stats = StatsStore::new(store.clone());
        let history = HistoryStore::with_capacity(
            store.clone(),
            stats.clone(),
            config.effective_history_capacity(),
        );
        let themes = ThemeStore::theme(store.clone());
        let languages = LanguageStore::language(store);

        // The persisted count can drift if a previous run failed mid-write
        let history_len = history.len();
        if stats.snapshot().history_count != history_len {
            tracing::debug!("Reconciling history count to {}", history_len);
            stats.set_history_count(history_len);
        }

        let state = StateManager::new();
        let (theme, language) = (themes.current(), languages.current());
        let initial_stats = stats.snapshot();
        state.update(|s| {
            s.stats = initial_stats;
            s.theme = theme;
            s.language = language;
        });

        let metrics = Arc::new(Metrics::new());
        let pipeline = GenerationPipeline::new(
            Arc::clone(&encoder),
            settings.clone(),
            history.clone(),
            stats.clone(),
            state.clone(),
            Arc::clone(&metrics),
        )
        .with_share_chain(share_chain)
        .with_encode_delay(Duration::from_millis(config.encode_delay_ms));

        tracing::info!(
            "Studio ready: {} history entries (capacity {}), theme {}, language {}",
            history_len,
            history.capacity(),
            theme,
            language
        );

        Self {
            config,
            settings,
            stats,
            history,
            themes,
            languages,
            state,
            metrics,
            encoder,
            pipeline,
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn state(&self) -> &StateManager {
        &self.state
    }

    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.metrics
    }

    pub fn catalog(&self) -> Catalog {
        Catalog::new(self.state.read(|s| s.language))
    }

    // Generation

    pub async fn generate(&self, text: &str) -> Result<GenerationResult, PipelineError> {
        self.pipeline.generate(text).await
    }

    pub async fn generate_with_settings(
        &self,
        text: &str,
        settings: &Settings,
    ) -> Result<GenerationResult, PipelineError> {
        self.pipeline.generate_with_settings(text, settings).await
    }

    pub fn cancel(&self) -> bool {
        self.pipeline.cancel()
    }

    pub fn is_busy(&self) -> bool {
        self.pipeline.is_busy()
    }

    pub fn current_result(&self) -> Option<GenerationResult> {
        self.pipeline.current_result()
    }

    /// Download the current result into the configured download directory.
    pub async fn download(&self) -> Result<Option<Utf8PathBuf>, PipelineError> {
        let dir = Utf8PathBuf::from(&self.config.download_dir);
        self.pipeline.download(&dir).await
    }

    pub async fn download_to(&self, dir: &Utf8Path) -> Result<Option<Utf8PathBuf>, PipelineError> {
        self.pipeline.download(dir).await
    }

    pub async fn share(&self) -> Result<Option<ShareOutcome>, PipelineError> {
        self.pipeline.share().await
    }

    pub async fn copy(&self) -> Result<Option<ShareOutcome>, PipelineError> {
        self.pipeline.copy().await
    }

    // History

    pub fn history(&self) -> Vec<HistoryEntry> {
        self.history.list()
    }

    pub fn history_entry(&self, id: u64) -> Option<HistoryEntry> {
        self.history.get(id)
    }

    /// Regenerate a history entry's text; dedup moves it to the front.
    ///
    /// # Returns
    /// `None` if no entry has `id`
    pub async fn use_history(&self, id: u64) -> Result<Option<GenerationResult>, PipelineError> {
        let Some(entry) = self.history.get(id) else {
            self.toast(ToastLevel::Warning, msg::HISTORY_NOT_FOUND);
            return Ok(None);
        };
        tracing::info!("Regenerating history entry {}", id);
        self.pipeline.generate(&entry.text).await.map(Some)
    }

    pub fn remove_history(&self, id: u64) -> bool {
        let removed = self.history.remove(id);
        if removed {
            self.state.set_stats(self.stats.snapshot());
        } else {
            self.toast(ToastLevel::Warning, msg::HISTORY_NOT_FOUND);
        }
        removed
    }

    pub fn clear_history(&self) {
        self.history.clear();
        self.state.set_stats(self.stats.snapshot());
        self.toast(ToastLevel::Info, msg::HISTORY_CLEARED);
    }

    /// Write a history entry's stored image to `dir`.
    ///
    /// # Returns
    /// The written path, or `None` if no entry has `id`
    pub async fn save_history_entry(&self, id: u64, dir: &Utf8Path) -> Result<Option<Utf8PathBuf>> {
        let Some(entry) = self.history.get(id) else {
            return Ok(None);
        };

        let (format, bytes) = export::from_data_url(&entry.image)
            .with_context(|| format!("History entry {} has an unreadable image", id))?;
        let path = dir.join(export::download_file_name(format, entry.timestamp));

        tokio::fs::create_dir_all(dir)
            .await
            .with_context(|| format!("Failed to create directory: {}", dir))?;
        tokio::fs::write(&path, bytes)
            .await
            .with_context(|| format!("Failed to write {}", path))?;

        tracing::info!("Saved history entry {} to {}", id, path);
        Ok(Some(path))
    }

    // Stats

    pub fn stats(&self) -> Stats {
        self.stats.snapshot()
    }

    pub fn reset_stats(&self) -> Stats {
        let stats = self.stats.reset();
        self.state.set_stats(stats);
        self.toast(ToastLevel::Info, msg::STATS_RESET);
        stats
    }

    // Settings

    pub fn settings(&self) -> Settings {
        self.settings.load()
    }

    pub fn update_settings<F>(&self, f: F) -> Settings
    where
        F: FnOnce(&mut Settings),
    {
        self.settings.update(f)
    }

    pub fn reset_settings(&self) -> Settings {
        self.settings.reset()
    }

    // Presentation

    pub fn theme(&self) -> Theme {
        self.state.read(|s| s.theme)
    }

    pub fn apply_theme(&self, theme: Theme) -> Theme {
        let theme = self.themes.apply(theme);
        self.state.set_theme(theme);
        let message = self
            .catalog()
            .format(msg::THEME_CHANGED, &[("theme", &theme.to_string())]);
        self.state.show_toast(Toast::new(ToastLevel::Info, message));
        theme
    }

    pub fn toggle_theme(&self) -> Theme {
        self.apply_theme(self.theme().toggled())
    }

    pub fn language(&self) -> Language {
        self.state.read(|s| s.language)
    }

    /// Switch language; the confirmation is already in the new language.
    pub fn apply_language(&self, language: Language) -> Language {
        let language = self.languages.apply(language);
        self.state.set_language(language);
        let message = self
            .catalog()
            .format(msg::LANGUAGE_CHANGED, &[("language", language.native_name())]);
        self.state.show_toast(Toast::new(ToastLevel::Info, message));
        language
    }

    pub fn dismiss_toast(&self) {
        self.state.dismiss_toast();
    }

    /// Terminal drawing of the current result, if any.
    pub fn preview(&self) -> Option<String> {
        let result = self.current_result()?;
        match self.render_text(&result.text, result.error_level) {
            Ok(drawing) => Some(drawing),
            Err(e) => {
                tracing::warn!("Failed to render preview: {}", e);
                None
            }
        }
    }

    /// Terminal drawing of an arbitrary text, one character cell per two modules.
    pub fn render_text(&self, text: &str, level: ErrorLevel) -> Result<String, EncodingError> {
        // Size 1 makes the encoder fall back to one pixel per module
        let params = EncodeParams {
            text: text.to_string(),
            width: 1,
            height: 1,
            color_dark: DEFAULT_DARK_COLOR.to_string(),
            color_light: DEFAULT_LIGHT_COLOR.to_string(),
            correction_level: level,
        };
        let image = self.encoder.encode(&params)?;
        Ok(terminal::render(&image, self.theme()))
    }

    /// Summary line in the active language.
    pub fn stats_summary(&self) -> String {
        let stats = self.stats();
        self.catalog().format(
            msg::STATS_SUMMARY,
            &[
                ("generated", &stats.total_generated.to_string()),
                ("downloaded", &stats.total_downloaded.to_string()),
                ("history", &stats.history_count.to_string()),
            ],
        )
    }

    fn toast(&self, level: ToastLevel, key: &'static str) {
        let message = self.catalog().get(key);
        self.state.show_toast(Toast::new(level, message));
    }
}
