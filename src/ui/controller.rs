// Session Controller - Interactive line session over the Studio
//
// This module contains the SessionController which coordinates between:
// - stdin (one command or text per line)
// - Studio (stores, pipeline)
// - StateManager events (toasts, new results) → stdout
//
// Generation runs on a spawned task so the prompt stays responsive; a second
// submit while one is encoding hits the pipeline's Busy rejection.

use crate::i18n::msg;
use crate::models::{Language, Theme};
use crate::state::StateChange;
use crate::studio::Studio;
use crate::ui::terminal;
use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

const HELP: &str = "\
Type any text to generate a QR code. Commands:
  :download, :d      save the current code
  :share             share the current code
  :copy              copy the current code to the clipboard
  :history, :h       list recent codes
  :use <n>           regenerate history entry n
  :clear             clear the history
  :stats             show usage counters
  :theme [dark|light] switch or toggle the theme
  :lang <en|es|fr>   switch language
  :dismiss, Esc      dismiss the notification
  :cancel            cancel the running generation
  :help              show this help
  :quit, :q          leave the session
Start a line with :: to generate text beginning with ':'.";

/// One parsed input line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    Generate(String),
    Download,
    Share,
    Copy,
    History,
    /// 1-based position in the history listing
    Use(usize),
    Clear,
    Stats,
    /// `None` toggles
    Theme(Option<Theme>),
    Language(Language),
    Dismiss,
    Cancel,
    Help,
    Quit,
    /// Line with no characters at all
    Empty,
    /// Unrecognized command or bad argument
    Invalid(String),
}

impl SessionCommand {
    pub fn parse(line: &str) -> Self {
        let line = line.trim_end_matches(['\r', '\n']);

        if line == "\x1b" {
            return Self::Dismiss;
        }
        if let Some(literal) = line.strip_prefix("::") {
            return Self::Generate(format!(":{literal}"));
        }
        if line.is_empty() {
            return Self::Empty;
        }
        // Whitespace-only text still goes to the pipeline, which rejects it with an alert
        let Some(command) = line.strip_prefix(':') else {
            return Self::Generate(line.to_string());
        };

        let mut parts = command.split_whitespace();
        let name = parts.next().unwrap_or_default();
        let arg = parts.next();

        match (name, arg) {
            ("download" | "d", None) => Self::Download,
            ("share", None) => Self::Share,
            ("copy", None) => Self::Copy,
            ("history" | "h", None) => Self::History,
            ("use", Some(n)) => match n.parse::<usize>() {
                Ok(n) if n >= 1 => Self::Use(n),
                _ => Self::Invalid(format!("not a history position: {n}")),
            },
            ("clear", None) => Self::Clear,
            ("stats", None) => Self::Stats,
            ("theme", None) => Self::Theme(None),
            ("theme", Some(value)) => match value.parse() {
                Ok(theme) => Self::Theme(Some(theme)),
                Err(e) => Self::Invalid(format!("{e}")),
            },
            ("lang" | "language", Some(code)) => match code.parse() {
                Ok(language) => Self::Language(language),
                Err(e) => Self::Invalid(format!("{e}")),
            },
            ("dismiss", None) => Self::Dismiss,
            ("cancel", None) => Self::Cancel,
            ("help" | "?", None) => Self::Help,
            ("quit" | "q" | "exit", None) => Self::Quit,
            _ => Self::Invalid(format!("unknown command :{command}")),
        }
    }
}

/// Interactive session over a shared [`Studio`]
///
/// # Example
/// ```ignore
/// let studio = Arc::new(Studio::open(config, false)?);
/// SessionController::new(studio).run().await?;
/// ```
pub struct SessionController {
    studio: Arc<Studio>,
}

impl SessionController {
    pub fn new(studio: Arc<Studio>) -> Self {
        Self { studio }
    }

    /// Read commands from stdin until `:quit` or end of input.
    pub async fn run(&self) -> Result<()> {
        let listener = self.spawn_listener();
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let mut generations: Vec<JoinHandle<()>> = Vec::new();

        println!("{}", self.studio.catalog().get(msg::PROMPT));

        while let Some(line) = lines
            .next_line()
            .await
            .context("Failed to read from stdin")?
        {
            generations.retain(|task| !task.is_finished());

            let command = SessionCommand::parse(&line);
            tracing::debug!("Session command: {:?}", command);

            if command == SessionCommand::Quit {
                break;
            }
            if let Some(task) = self.dispatch(command).await {
                generations.push(task);
            }
        }

        // Let in-flight generations settle so their records are persisted
        for task in generations {
            if let Err(e) = task.await {
                tracing::error!("Generation task join error: {}", e);
            }
        }
        listener.abort();

        tracing::info!("Session ended");
        Ok(())
    }

    /// Execute one command; generation is returned as a task handle.
    async fn dispatch(&self, command: SessionCommand) -> Option<JoinHandle<()>> {
        let studio = &self.studio;

        match command {
            SessionCommand::Generate(text) => {
                let studio = Arc::clone(studio);
                return Some(tokio::spawn(async move {
                    // Failures are reported through toasts
                    if let Err(e) = studio.generate(&text).await {
                        tracing::debug!("Generation ended without result: {}", e);
                    }
                }));
            }
            SessionCommand::Download => {
                if let Err(e) = studio.download().await {
                    tracing::error!("Download failed: {}", e);
                }
            }
            SessionCommand::Share => self.report_share(studio.share().await),
            SessionCommand::Copy => self.report_share(studio.copy().await),
            SessionCommand::History => {
                let entries = studio.history();
                if entries.is_empty() {
                    println!("{}", studio.catalog().get(msg::HISTORY_EMPTY));
                } else {
                    print!("{}", terminal::history_table(&entries));
                }
            }
            SessionCommand::Use(position) => match studio.history().get(position - 1) {
                Some(entry) => {
                    let studio = Arc::clone(studio);
                    let id = entry.id;
                    return Some(tokio::spawn(async move {
                        if let Err(e) = studio.use_history(id).await {
                            tracing::debug!("Regeneration ended without result: {}", e);
                        }
                    }));
                }
                None => println!("{}", studio.catalog().get(msg::HISTORY_NOT_FOUND)),
            },
            SessionCommand::Clear => studio.clear_history(),
            SessionCommand::Stats => println!("{}", studio.stats_summary()),
            SessionCommand::Theme(Some(theme)) => {
                studio.apply_theme(theme);
            }
            SessionCommand::Theme(None) => {
                studio.toggle_theme();
            }
            SessionCommand::Language(language) => {
                studio.apply_language(language);
            }
            SessionCommand::Dismiss => studio.dismiss_toast(),
            SessionCommand::Cancel => {
                studio.cancel();
            }
            SessionCommand::Help => println!("{HELP}"),
            SessionCommand::Invalid(reason) => println!("{reason} (:help for commands)"),
            SessionCommand::Empty | SessionCommand::Quit => {}
        }

        None
    }

    fn report_share<E: std::fmt::Display>(
        &self,
        outcome: Result<Option<crate::services::ShareOutcome>, E>,
    ) {
        match outcome {
            Ok(Some(_)) => {}
            Ok(None) => {
                // The toast covers "no result"; an exhausted chain is only reported here
                if self.studio.current_result().is_some() {
                    println!("{}", self.studio.catalog().get(msg::SHARE_UNAVAILABLE));
                }
            }
            Err(e) => tracing::error!("Share failed: {}", e),
        }
    }

    /// Print toasts and previews as state changes arrive.
    fn spawn_listener(&self) -> JoinHandle<()> {
        let studio = Arc::clone(&self.studio);
        let mut rx = studio.state().subscribe();

        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(change) => {
                        if let Some(output) = describe_change(&studio, &change) {
                            println!("{output}");
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!("Display listener lagged, {} events skipped", skipped);
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        })
    }
}

/// Text to print for a state change, if any.
pub fn describe_change(studio: &Studio, change: &StateChange) -> Option<String> {
    match change {
        StateChange::ToastShown { level, message } => Some(terminal::toast_line(*level, message)),
        StateChange::ResultReady { .. } => studio.preview(),
        _ => None,
    }
}
