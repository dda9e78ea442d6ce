//! Integration tests for StateManager with state change events
//!
//! These tests verify that the StateManager correctly:
//! - Emits the phase sequence of a generation
//! - Supports multiple subscribers
//! - Handles concurrent access from multiple tasks
//! - Reports presentation changes (theme, language, toasts)

use qrstudio::i18n::msg;
use qrstudio::models::{Language, Outcome, PipelinePhase, Theme, Toast, ToastLevel};
use qrstudio::services::share::DEFAULT_SHARE_TIMEOUT;
use qrstudio::services::{QrCodeEncoder, ShareChain};
use qrstudio::storage::MemoryStore;
use qrstudio::{AppConfig, StateChange, StateManager, Studio};
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::time::{Duration, timeout};

fn create_studio() -> Studio {
    Studio::with_parts(
        AppConfig::default(),
        Arc::new(MemoryStore::new()),
        Arc::new(QrCodeEncoder::new()),
        ShareChain::new(Vec::new(), DEFAULT_SHARE_TIMEOUT),
    )
}

async fn next_event(rx: &mut broadcast::Receiver<StateChange>) -> StateChange {
    timeout(Duration::from_millis(500), rx.recv())
        .await
        .expect("Timeout waiting for event")
        .expect("Channel closed")
}

/// Collect events up to and including the first toast.
async fn events_until_toast(rx: &mut broadcast::Receiver<StateChange>) -> Vec<StateChange> {
    let mut events = Vec::new();
    loop {
        let event = next_event(rx).await;
        let done = matches!(event, StateChange::ToastShown { .. });
        events.push(event);
        if done {
            return events;
        }
    }
}

#[tokio::test]
async fn test_generation_event_sequence() {
    let studio = create_studio();
    let mut rx = studio.state().subscribe();

    studio.generate("events").await.unwrap();
    let events = events_until_toast(&mut rx).await;

    let phases: Vec<PipelinePhase> = events
        .iter()
        .filter_map(|e| match e {
            StateChange::PhaseChanged { phase } => Some(*phase),
            _ => None,
        })
        .collect();
    assert_eq!(
        phases,
        vec![
            PipelinePhase::Validating,
            PipelinePhase::Encoding,
            PipelinePhase::Settled(Outcome::Success),
        ]
    );

    assert!(events.iter().any(
        |e| matches!(e, StateChange::ResultReady { text } if text == "events")
    ));
    assert!(
        events
            .iter()
            .any(|e| matches!(e, StateChange::HistoryChanged { count: 1 }))
    );
    assert!(matches!(
        events.last(),
        Some(StateChange::ToastShown {
            level: ToastLevel::Success,
            ..
        })
    ));
}

#[tokio::test]
async fn test_validation_failure_skips_encoding_phase() {
    let studio = create_studio();
    let mut rx = studio.state().subscribe();

    studio.generate("").await.unwrap_err();
    let events = events_until_toast(&mut rx).await;

    assert!(
        !events
            .iter()
            .any(|e| matches!(e, StateChange::PhaseChanged { phase: PipelinePhase::Encoding }))
    );
    assert!(!events.iter().any(|e| matches!(e, StateChange::ResultReady { .. })));
    assert!(events.iter().any(|e| matches!(
        e,
        StateChange::PhaseChanged {
            phase: PipelinePhase::Settled(Outcome::Failed)
        }
    )));
}

#[tokio::test]
async fn test_every_empty_submit_raises_alert() {
    let studio = create_studio();
    let mut rx = studio.state().subscribe();
    let expected = studio.catalog().get(msg::EMPTY_INPUT);

    for _ in 0..2 {
        studio.generate("   ").await.unwrap_err();
        let events = events_until_toast(&mut rx).await;
        assert!(matches!(
            events.last(),
            Some(StateChange::ToastShown { level: ToastLevel::Warning, message }) if *message == expected
        ));
    }
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn test_multiple_subscribers_receive_events() {
    let studio = create_studio();
    let mut rx1 = studio.state().subscribe();
    let mut rx2 = studio.state().subscribe();

    studio.apply_theme(Theme::Dark);

    for rx in [&mut rx1, &mut rx2] {
        let event = next_event(rx).await;
        assert!(
            matches!(event, StateChange::ThemeChanged { theme: Theme::Dark }),
            "Expected ThemeChanged event, got: {:?}",
            event
        );
    }
}

#[tokio::test]
async fn test_language_change_then_localized_toast() {
    let studio = create_studio();
    let mut rx = studio.state().subscribe();

    studio.apply_language(Language::Es);

    let event = next_event(&mut rx).await;
    assert!(matches!(
        event,
        StateChange::LanguageChanged {
            language: Language::Es
        }
    ));
    let StateChange::ToastShown { message, .. } = next_event(&mut rx).await else {
        panic!("Expected ToastShown event");
    };
    assert!(message.contains("Español"));
}

#[tokio::test]
async fn test_toast_replace_and_dismiss() {
    let state = StateManager::new();
    let mut rx = state.subscribe();

    state.show_toast(Toast::new(ToastLevel::Info, "first"));
    state.show_toast(Toast::new(ToastLevel::Warning, "second"));
    state.dismiss_toast();
    // Dismissing twice emits nothing new
    state.dismiss_toast();

    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }

    assert_eq!(events.len(), 3);
    assert!(matches!(&events[1], StateChange::ToastShown { message, .. } if message == "second"));
    assert!(matches!(events[2], StateChange::ToastDismissed));
    assert!(state.snapshot().toast.is_none());
}

#[tokio::test]
async fn test_concurrent_state_access() {
    let state = Arc::new(StateManager::new());
    let mut handles = Vec::new();

    for i in 0..10 {
        let state = Arc::clone(&state);
        handles.push(tokio::spawn(async move {
            state.show_toast(Toast::new(ToastLevel::Info, format!("toast {i}")));
            state.read(|s| s.toast.is_some())
        }));
    }

    for handle in handles {
        assert!(handle.await.unwrap());
    }
    assert!(state.snapshot().toast.is_some());
}
