//! Services module - the QR generation pipeline and its collaborators.
//!
//! The services are **front-end agnostic**: they publish through the
//! [`StateManager`](crate::state::StateManager) and never print, so the CLI
//! and the interactive session drive the same code.
//!
//! # Components
//!
//! - [`GenerationPipeline`]: single-flight validate → encode → record state
//!   machine, plus download and share of the current result
//! - [`Validator`]: advisory input checks (empty text, size bounds,
//!   content-type shape)
//! - [`Encoder`] / [`QrCodeEncoder`]: text to raster, backed by the `qrcode`
//!   crate and run on a blocking task
//! - [`export`]: PNG/JPEG bytes, data URLs and download file names
//! - [`ShareChain`]: ordered share/clipboard fallbacks
//!
//! # Usage Example
//!
//! ```ignore
//! use qrstudio::services::{GenerationPipeline, QrCodeEncoder};
//!
//! let pipeline = GenerationPipeline::new(
//!     Arc::new(QrCodeEncoder::new()),
//!     settings_store,
//!     history_store,
//!     stats_store,
//!     state_manager,
//!     metrics,
//! );
//!
//! let result = pipeline.generate("https://example.com").await?;
//! let path = pipeline.download(download_dir).await?;
//! ```

pub mod encoder;
pub mod export;
pub mod pipeline;
pub mod share;
pub mod validation;

pub use encoder::{Encoder, EncodingError, QrCodeEncoder};
pub use export::ExportError;
pub use pipeline::{GenerationPipeline, PipelineError};
pub use share::{
    CommandShare, ImageClipboard, Osc52Clipboard, ShareCapability, ShareChain, ShareError,
    ShareFuture, ShareKind, ShareOutcome, SharePayload, TextClipboard,
};
pub use validation::{MAX_SIZE, ValidationError, Validator};
