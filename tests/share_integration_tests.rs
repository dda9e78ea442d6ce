//! Integration tests for the share fallback chain
//!
//! These tests verify:
//! - Capabilities are tried in order until one succeeds
//! - Unsupported, failing and hanging capabilities fall through
//! - Copy skips share-kind capabilities
//! - The studio reports share outcomes through toasts

use qrstudio::i18n::{Catalog, msg};
use qrstudio::models::{ImageFormat, Language};
use qrstudio::services::share::{
    CommandShare, ShareCapability, ShareChain, ShareError, ShareFuture, ShareKind, SharePayload,
};
use qrstudio::services::QrCodeEncoder;
use qrstudio::storage::MemoryStore;
use qrstudio::{AppConfig, Studio};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

#[derive(Clone, Copy)]
enum Behavior {
    Succeed,
    Unsupported,
    Fail,
    Hang,
}

/// Capability with scripted behavior that counts its attempts.
struct FakeCapability {
    name: &'static str,
    kind: ShareKind,
    behavior: Behavior,
    attempts: Arc<AtomicUsize>,
}

impl FakeCapability {
    fn boxed(
        name: &'static str,
        kind: ShareKind,
        behavior: Behavior,
    ) -> (Box<dyn ShareCapability>, Arc<AtomicUsize>) {
        let attempts = Arc::new(AtomicUsize::new(0));
        let capability = Self {
            name,
            kind,
            behavior,
            attempts: Arc::clone(&attempts),
        };
        (Box::new(capability), attempts)
    }
}

impl ShareCapability for FakeCapability {
    fn name(&self) -> &'static str {
        self.name
    }

    fn kind(&self) -> ShareKind {
        self.kind
    }

    fn attempt<'a>(&'a self, _payload: &'a SharePayload) -> ShareFuture<'a> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        let behavior = self.behavior;
        Box::pin(async move {
            match behavior {
                Behavior::Succeed => Ok(()),
                Behavior::Unsupported => Err(ShareError::Unsupported("fake".to_string())),
                Behavior::Fail => Err(ShareError::CommandFailed {
                    command: "fake".to_string(),
                    code: Some(1),
                }),
                Behavior::Hang => {
                    tokio::time::sleep(Duration::from_secs(60)).await;
                    Ok(())
                }
            }
        })
    }
}

fn payload() -> SharePayload {
    SharePayload {
        text: "hello".to_string(),
        image: vec![0x89, b'P', b'N', b'G'],
        format: ImageFormat::Png,
        file_name: "qr-code-1.png".to_string(),
    }
}

#[tokio::test]
async fn test_falls_through_to_first_working_capability() {
    let (unsupported, unsupported_attempts) =
        FakeCapability::boxed("unsupported", ShareKind::Share, Behavior::Unsupported);
    let (failing, failing_attempts) =
        FakeCapability::boxed("failing", ShareKind::Clipboard, Behavior::Fail);
    let (working, working_attempts) =
        FakeCapability::boxed("working", ShareKind::Clipboard, Behavior::Succeed);
    let (never, never_attempts) =
        FakeCapability::boxed("never", ShareKind::Clipboard, Behavior::Succeed);

    let chain = ShareChain::new(
        vec![unsupported, failing, working, never],
        Duration::from_secs(1),
    );
    let outcome = chain.share(&payload()).await.unwrap();

    assert_eq!(outcome.capability, "working");
    assert_eq!(outcome.kind, ShareKind::Clipboard);
    assert_eq!(unsupported_attempts.load(Ordering::SeqCst), 1);
    assert_eq!(failing_attempts.load(Ordering::SeqCst), 1);
    assert_eq!(working_attempts.load(Ordering::SeqCst), 1);
    assert_eq!(never_attempts.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_hanging_capability_times_out() {
    let (hanging, _) = FakeCapability::boxed("hanging", ShareKind::Share, Behavior::Hang);
    let (working, _) = FakeCapability::boxed("working", ShareKind::Clipboard, Behavior::Succeed);

    let chain = ShareChain::new(vec![hanging, working], Duration::from_millis(50));
    let outcome = tokio::time::timeout(Duration::from_secs(5), chain.share(&payload()))
        .await
        .expect("share chain did not honor its timeout");

    assert_eq!(outcome.unwrap().capability, "working");
}

#[tokio::test]
async fn test_exhausted_chain_returns_none() {
    let (a, _) = FakeCapability::boxed("a", ShareKind::Share, Behavior::Unsupported);
    let (b, _) = FakeCapability::boxed("b", ShareKind::Clipboard, Behavior::Fail);

    let chain = ShareChain::new(vec![a, b], Duration::from_secs(1));
    assert!(chain.share(&payload()).await.is_none());
}

#[tokio::test]
async fn test_copy_skips_share_capabilities() {
    let (share, share_attempts) =
        FakeCapability::boxed("share", ShareKind::Share, Behavior::Succeed);
    let (clipboard, _) =
        FakeCapability::boxed("clipboard", ShareKind::Clipboard, Behavior::Succeed);

    let chain = ShareChain::new(vec![share, clipboard], Duration::from_secs(1));
    let outcome = chain.copy(&payload()).await.unwrap();

    assert_eq!(outcome.capability, "clipboard");
    assert_eq!(share_attempts.load(Ordering::SeqCst), 0);
}

#[cfg(unix)]
#[tokio::test]
async fn test_command_share_exit_status() {
    let ok = CommandShare::new(vec!["true".to_string(), "{file}".to_string()]);
    assert!(ok.attempt(&payload()).await.is_ok());

    let failing = CommandShare::new(vec!["false".to_string()]);
    assert!(matches!(
        failing.attempt(&payload()).await,
        Err(ShareError::CommandFailed { .. })
    ));
}

#[tokio::test]
async fn test_studio_share_toasts() {
    let (share, _) = FakeCapability::boxed("share", ShareKind::Share, Behavior::Succeed);
    let (clipboard, _) =
        FakeCapability::boxed("clipboard", ShareKind::Clipboard, Behavior::Succeed);
    let studio = Studio::with_parts(
        AppConfig::default(),
        Arc::new(MemoryStore::new()),
        Arc::new(QrCodeEncoder::new()),
        ShareChain::new(vec![share, clipboard], Duration::from_secs(1)),
    );
    let catalog = Catalog::new(Language::En);
    let toast = |studio: &Studio| studio.state().snapshot().toast.unwrap().message;

    assert!(studio.share().await.unwrap().is_none());
    assert_eq!(toast(&studio), catalog.get(msg::NO_RESULT));

    studio.generate("share me").await.unwrap();

    let shared = studio.share().await.unwrap().unwrap();
    assert_eq!(shared.capability, "share");
    assert_eq!(toast(&studio), catalog.get(msg::SHARED));

    let copied = studio.copy().await.unwrap().unwrap();
    assert_eq!(copied.capability, "clipboard");
    assert_eq!(toast(&studio), catalog.get(msg::COPIED));
}
