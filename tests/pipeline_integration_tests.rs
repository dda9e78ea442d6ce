//! Integration tests for the single-flight generation pipeline
//!
//! These tests verify:
//! - A second submit while one is encoding is rejected as Busy
//! - Cancellation settles the request without touching the current result
//! - Encoder failures leave stores untouched
//! - Toasts are raised in the active language

use image::{Rgba, RgbaImage};
use mockall::mock;
use qrstudio::i18n::{Catalog, msg};
use qrstudio::models::{EncodeParams, Language, Outcome, PipelinePhase};
use qrstudio::services::share::DEFAULT_SHARE_TIMEOUT;
use qrstudio::services::{Encoder, EncodingError, PipelineError, ShareChain};
use qrstudio::storage::MemoryStore;
use qrstudio::{AppConfig, Studio};
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;
use tokio::time::timeout;

mock! {
    pub QrEncoder {}

    impl Encoder for QrEncoder {
        fn encode(&self, params: &EncodeParams) -> Result<RgbaImage, EncodingError>;
    }
}

fn studio_with(encoder: MockQrEncoder) -> Arc<Studio> {
    Arc::new(Studio::with_parts(
        AppConfig::default(),
        Arc::new(MemoryStore::new()),
        Arc::new(encoder),
        ShareChain::new(Vec::new(), DEFAULT_SHARE_TIMEOUT),
    ))
}

fn solid(params: &EncodeParams) -> RgbaImage {
    RgbaImage::from_pixel(params.width, params.height, Rgba([0, 0, 0, 255]))
}

/// Encoder that blocks for `delay` before answering.
fn slow_encoder(delay: Duration) -> MockQrEncoder {
    let mut encoder = MockQrEncoder::new();
    encoder.expect_encode().returning(move |params| {
        std::thread::sleep(delay);
        Ok(solid(params))
    });
    encoder
}

async fn wait_until_encoding(studio: &Studio) {
    timeout(Duration::from_secs(2), async {
        while studio.state().read(|s| s.phase) != PipelinePhase::Encoding {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("pipeline never reached Encoding");
}

#[tokio::test]
async fn test_encoder_receives_request_parameters() {
    let mut encoder = MockQrEncoder::new();
    encoder
        .expect_encode()
        .withf(|params| params.text == "hello" && params.width == 200 && params.height == 200)
        .times(1)
        .returning(|params| Ok(solid(params)));
    let studio = studio_with(encoder);

    let result = tokio_test::assert_ok!(studio.generate("  hello ").await);

    assert_eq!(result.text, "hello");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_concurrent_submit_is_rejected() {
    let studio = studio_with(slow_encoder(Duration::from_millis(300)));

    let first = tokio::spawn({
        let studio = Arc::clone(&studio);
        async move { studio.generate("first").await }
    });
    wait_until_encoding(&studio).await;
    assert!(studio.is_busy());

    let second = studio.generate("second").await;
    assert!(matches!(second, Err(PipelineError::Busy)));
    assert_eq!(
        studio.state().snapshot().toast.unwrap().message,
        Catalog::new(Language::En).get(msg::BUSY)
    );

    let first = first.await.unwrap().unwrap();
    assert_eq!(first.text, "first");
    assert_eq!(studio.stats().total_generated, 1);
    assert_eq!(studio.history().len(), 1);
    assert!(!studio.is_busy());
    assert_eq!(studio.metrics().busy_rejections.load(Ordering::Relaxed), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_cancel_keeps_previous_result() {
    let mut encoder = MockQrEncoder::new();
    encoder
        .expect_encode()
        .withf(|params| params.text == "kept")
        .returning(|params| Ok(solid(params)));
    encoder
        .expect_encode()
        .withf(|params| params.text == "dropped")
        .returning(|params| {
            std::thread::sleep(Duration::from_millis(300));
            Ok(solid(params))
        });
    let studio = studio_with(encoder);

    studio.generate("kept").await.unwrap();

    let pending = tokio::spawn({
        let studio = Arc::clone(&studio);
        async move { studio.generate("dropped").await }
    });
    wait_until_encoding(&studio).await;
    assert!(studio.cancel());

    let outcome = pending.await.unwrap();
    assert!(matches!(outcome, Err(PipelineError::Cancelled)));

    let state = studio.state().snapshot();
    assert_eq!(state.phase, PipelinePhase::Settled(Outcome::Cancelled));
    assert_eq!(state.current_result.unwrap().text, "kept");
    assert_eq!(studio.stats().total_generated, 1);
    assert_eq!(studio.history().len(), 1);
}

#[tokio::test]
async fn test_cancel_when_idle_is_noop() {
    let studio = studio_with(MockQrEncoder::new());
    assert!(!studio.cancel());
}

#[tokio::test]
async fn test_encoder_failure_settles_failed() {
    let mut encoder = MockQrEncoder::new();
    encoder
        .expect_encode()
        .returning(|params| Err(EncodingError::CapacityExceeded(params.correction_level)));
    let studio = studio_with(encoder);
    studio.apply_language(Language::Fr);

    let err = studio.generate("too much").await.unwrap_err();

    assert!(matches!(err, PipelineError::Encoding(_)));
    let state = studio.state().snapshot();
    assert_eq!(state.phase, PipelinePhase::Settled(Outcome::Failed));
    assert!(state.current_result.is_none());
    assert_eq!(
        state.toast.unwrap().message,
        Catalog::new(Language::Fr).get(msg::ENCODE_FAILED)
    );
    assert_eq!(studio.stats().total_generated, 0);
    assert!(studio.history().is_empty());
}

#[tokio::test]
async fn test_validation_failure_never_reaches_encoder() {
    let mut encoder = MockQrEncoder::new();
    encoder.expect_encode().never();
    let studio = studio_with(encoder);
    studio.update_settings(|s| s.size = 0);

    let err = tokio_test::assert_err!(studio.generate("sized").await);

    assert!(matches!(err, PipelineError::Validation(_)));
    assert_eq!(studio.stats().total_generated, 0);
}
