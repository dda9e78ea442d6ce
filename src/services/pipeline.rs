use super::encoder::{Encoder, EncodingError};
use super::export::{self, ExportError};
use super::share::{DEFAULT_SHARE_TIMEOUT, ShareChain, ShareKind, ShareOutcome, SharePayload};
use super::validation::{MAX_SIZE, ValidationError, Validator};
use crate::i18n::{Catalog, msg};
use crate::metrics::Metrics;
use crate::models::{
    GenerationRequest, GenerationResult, PipelinePhase, Settings, Toast, ToastLevel,
};
use crate::models::app_state::MAX_CONCURRENT_GENERATIONS;
use crate::state::StateManager;
use crate::stores::{HistoryStore, SettingsStore, StatsStore};
use camino::{Utf8Path, Utf8PathBuf};
use chrono::Utc;
use image::RgbaImage;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::{Semaphore, watch};

/// Why a request did not produce a result
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("A generation request is already in progress")]
    Busy,

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Encoding(#[from] EncodingError),

    #[error("Generation cancelled")]
    Cancelled,

    #[error(transparent)]
    Export(#[from] ExportError),
}

/// Validate → encode → record pipeline with a single in-flight request.
///
/// Every phase change is published through the [`StateManager`]; failures
/// are also reported as toasts in the active language. Stores are only
/// touched after a successful encode.
pub struct GenerationPipeline {
    encoder: Arc<dyn Encoder>,
    validator: Validator,
    settings: SettingsStore,
    history: HistoryStore,
    stats: StatsStore,
    state: StateManager,
    metrics: Arc<Metrics>,
    share_chain: ShareChain,
    /// One permit: a second submit while encoding is rejected
    gate: Semaphore,
    /// `true` requests cancellation of the in-flight request
    cancel_tx: watch::Sender<bool>,
    encode_delay: Duration,
}

impl GenerationPipeline {
    pub fn new(
        encoder: Arc<dyn Encoder>,
        settings: SettingsStore,
        history: HistoryStore,
        stats: StatsStore,
        state: StateManager,
        metrics: Arc<Metrics>,
    ) -> Self {
        let (cancel_tx, _) = watch::channel(false);
        Self {
            encoder,
            validator: Validator::new(),
            settings,
            history,
            stats,
            state,
            metrics,
            share_chain: ShareChain::new(Vec::new(), DEFAULT_SHARE_TIMEOUT),
            gate: Semaphore::new(MAX_CONCURRENT_GENERATIONS),
            cancel_tx,
            encode_delay: Duration::ZERO,
        }
    }

    pub fn with_share_chain(mut self, share_chain: ShareChain) -> Self {
        self.share_chain = share_chain;
        self
    }

    /// Pause before each encode; purely cosmetic.
    pub fn with_encode_delay(mut self, delay: Duration) -> Self {
        self.encode_delay = delay;
        self
    }

    pub fn is_busy(&self) -> bool {
        self.gate.available_permits() == 0
    }

    /// Generate a code for `text` with the persisted settings.
    pub async fn generate(&self, text: &str) -> Result<GenerationResult, PipelineError> {
        let settings = self.settings.load();
        self.generate_with_settings(text, &settings).await
    }

    /// Generate a code for `text` with explicit settings.
    ///
    /// # Errors
    /// - [`PipelineError::Busy`] if another request is in flight
    /// - [`PipelineError::Validation`] / [`PipelineError::Encoding`] on bad input
    /// - [`PipelineError::Cancelled`] if [`cancel`](Self::cancel) was called
    pub async fn generate_with_settings(
        &self,
        text: &str,
        settings: &Settings,
    ) -> Result<GenerationResult, PipelineError> {
        let Ok(_permit) = self.gate.try_acquire() else {
            tracing::warn!("Rejected submit: a request is already in flight");
            self.metrics.record_busy_rejection();
            self.toast(ToastLevel::Warning, self.catalog().get(msg::BUSY));
            return Err(PipelineError::Busy);
        };

        self.cancel_tx.send_replace(false);
        let mut cancel_rx = self.cancel_tx.subscribe();

        let request = GenerationRequest::from_settings(text, settings);
        self.state.begin_request(&request.text);

        if let Err(e) = self.validator.validate(&request) {
            tracing::warn!("Validation failed: {}", e);
            self.metrics.record_validation_failure();
            let message = self
                .catalog()
                .format(e.message_key(), &[("max", &MAX_SIZE.to_string())]);
            self.state
                .settle_failed(Toast::new(ToastLevel::Warning, message));
            return Err(e.into());
        }

        self.state.set_phase(PipelinePhase::Encoding);
        self.metrics.record_encode_started();
        let started = Instant::now();

        let encoded = tokio::select! {
            result = self.encode(&request) => result,
            _ = cancel_rx.changed() => {
                return Err(self.settle_cancelled(&request));
            }
        };

        if *cancel_rx.borrow() {
            return Err(self.settle_cancelled(&request));
        }

        let image = match encoded {
            Ok(image) => image,
            Err(e) => {
                tracing::error!("Failed to encode {:?}: {}", request.text, e);
                self.metrics.record_encode_failed();
                let message = self.catalog().get(msg::ENCODE_FAILED);
                self.state.settle_failed(Toast::new(ToastLevel::Error, message));
                return Err(e.into());
            }
        };
        self.metrics.record_encode_succeeded(started.elapsed());

        let result = GenerationResult {
            text: request.text.clone(),
            image,
            format: request.format,
            size: request.size,
            error_level: request.error_level,
            timestamp: Utc::now(),
        };

        if settings.auto_save {
            self.save_to_history(&result);
        }
        let stats = self.stats.increment_generated();

        self.state.settle_success(result.clone(), stats);
        self.toast(ToastLevel::Success, self.catalog().get(msg::GENERATED));

        tracing::info!(
            "Generated {}px code for {:?} in {:.2}ms",
            result.size,
            result.text,
            started.elapsed().as_secs_f64() * 1000.0
        );

        Ok(result)
    }

    /// Request cancellation of the in-flight request.
    ///
    /// # Returns
    /// `false` if nothing was in flight
    pub fn cancel(&self) -> bool {
        if !self.is_busy() {
            return false;
        }
        tracing::info!("Cancellation requested");
        self.cancel_tx.send_replace(true);
        true
    }

    async fn encode(&self, request: &GenerationRequest) -> Result<RgbaImage, EncodingError> {
        if !self.encode_delay.is_zero() {
            tokio::time::sleep(self.encode_delay).await;
        }

        let encoder = Arc::clone(&self.encoder);
        let params = request.encode_params();

        tokio::task::spawn_blocking(move || encoder.encode(&params))
            .await
            .map_err(|e| EncodingError::Crashed(e.to_string()))?
    }

    fn settle_cancelled(&self, request: &GenerationRequest) -> PipelineError {
        tracing::info!("Generation of {:?} cancelled", request.text);
        self.metrics.record_cancellation();
        self.state.settle_cancelled();
        self.toast(ToastLevel::Info, self.catalog().get(msg::CANCELLED));
        PipelineError::Cancelled
    }

    fn save_to_history(&self, result: &GenerationResult) {
        match export::encode_image(&result.image, result.format) {
            Ok(bytes) => {
                let image = export::to_data_url(&bytes, result.format);
                self.history
                    .add(&result.text, image, result.format, result.size);
            }
            Err(e) => {
                tracing::warn!("Failed to export history image, entry skipped: {}", e);
            }
        }
    }

    /// Write the current result to `dir` as `qr-code-<epoch-ms>.<ext>`.
    ///
    /// # Returns
    /// The written path, or `None` if there is no current result
    pub async fn download(&self, dir: &Utf8Path) -> Result<Option<Utf8PathBuf>, PipelineError> {
        let Some(result) = self.current_result() else {
            self.toast(ToastLevel::Info, self.catalog().get(msg::NO_RESULT));
            return Ok(None);
        };

        match self.write_download(&result, dir).await {
            Ok(path) => {
                let stats = self.stats.increment_downloaded();
                self.state.set_stats(stats);
                self.metrics.record_download();

                tracing::info!("Downloaded {:?} to {}", result.text, path);
                let message = self.catalog().format(msg::DOWNLOADED, &[("path", path.as_str())]);
                self.toast(ToastLevel::Success, &message);
                Ok(Some(path))
            }
            Err(e) => {
                tracing::error!("Download failed: {}", e);
                self.toast(ToastLevel::Error, self.catalog().get(msg::DOWNLOAD_FAILED));
                Err(e.into())
            }
        }
    }

    async fn write_download(
        &self,
        result: &GenerationResult,
        dir: &Utf8Path,
    ) -> Result<Utf8PathBuf, ExportError> {
        let format = self.settings.load().format;
        let bytes = export::encode_image(&result.image, format)?;
        let path = dir.join(export::download_file_name(format, Utc::now()));

        tokio::fs::create_dir_all(dir).await?;
        tokio::fs::write(&path, &bytes).await?;

        Ok(path)
    }

    /// Share the current result through the share chain.
    pub async fn share(&self) -> Result<Option<ShareOutcome>, PipelineError> {
        self.deliver(true).await
    }

    /// Copy the current result to a clipboard, skipping share commands.
    pub async fn copy(&self) -> Result<Option<ShareOutcome>, PipelineError> {
        self.deliver(false).await
    }

    async fn deliver(&self, include_share: bool) -> Result<Option<ShareOutcome>, PipelineError> {
        let Some(result) = self.current_result() else {
            self.toast(ToastLevel::Info, self.catalog().get(msg::NO_RESULT));
            return Ok(None);
        };

        let format = self.settings.load().format;
        let payload = SharePayload {
            text: result.text.clone(),
            image: export::encode_image(&result.image, format)?,
            format,
            file_name: export::download_file_name(format, Utc::now()),
        };

        let outcome = if include_share {
            self.share_chain.share(&payload).await
        } else {
            self.share_chain.copy(&payload).await
        };

        if let Some(outcome) = outcome {
            self.metrics.record_share();
            let key = match outcome.kind {
                ShareKind::Share => msg::SHARED,
                ShareKind::Clipboard => msg::COPIED,
            };
            self.toast(ToastLevel::Success, self.catalog().get(key));
        }

        Ok(outcome)
    }

    pub fn current_result(&self) -> Option<GenerationResult> {
        self.state.read(|state| state.current_result.clone())
    }

    fn catalog(&self) -> Catalog {
        Catalog::new(self.state.read(|state| state.language))
    }

    fn toast(&self, level: ToastLevel, message: &str) {
        self.state.show_toast(Toast::new(level, message));
    }
}
