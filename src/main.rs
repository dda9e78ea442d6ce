//! QR Studio - QR code generator with persisted settings, stats and history
//!
//! Main entry point for the command line application.
//!
//! # Execution Flow
//!
//! 1. Parse arguments and load `qrstudio.yaml` (plus `QRSTUDIO_*` overrides)
//! 2. Initialize logging → `<log_dir>/qrstudio.<date>`
//! 3. Create the tokio runtime
//! 4. Open the [`Studio`] on the data directory (or in memory with `--ephemeral`)
//! 5. Dispatch the subcommand; `session` runs the interactive loop
//! 6. Log the metrics summary and shut the runtime down
//!
//! Notifications raised by the studio are printed as they occur, so one-shot
//! commands report the same messages the interactive session does.

use anyhow::{Context, Result, bail};
use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};
use qrstudio::i18n::msg;
use qrstudio::models::settings::parse_hex_color;
use qrstudio::models::{ContentType, ErrorLevel, ImageFormat, Language, Settings, Theme};
use qrstudio::services::{MAX_SIZE, PipelineError};
use qrstudio::state::StateChange;
use qrstudio::ui::{SessionController, terminal};
use qrstudio::{APP_NAME, ConfigManager, Studio, VERSION};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

#[derive(Parser)]
#[command(name = "qrstudio")]
#[command(about = "Generate QR codes with persisted settings, stats and history")]
#[command(version = VERSION)]
struct Cli {
    /// Directory holding settings, stats and history
    #[arg(long, global = true)]
    data_dir: Option<Utf8PathBuf>,

    /// Configuration file (default: ./qrstudio.yaml)
    #[arg(long, global = true)]
    config: Option<Utf8PathBuf>,

    /// Debug logging, mirrored to stderr
    #[arg(long, global = true)]
    debug: bool,

    /// Keep everything in memory for this run
    #[arg(long, global = true)]
    ephemeral: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Encode text into a QR code
    Generate(GenerateArgs),
    /// Inspect and manage recent codes
    #[command(subcommand)]
    History(HistoryCommand),
    /// Show usage counters
    Stats {
        /// Zero the generated and downloaded counters
        #[arg(long)]
        reset: bool,
    },
    /// Show or change generation settings
    #[command(subcommand)]
    Settings(SettingsCommand),
    /// Show or change the theme (light, dark, toggle)
    Theme { value: Option<String> },
    /// Show or change the language
    Language { value: Option<Language> },
    /// Interactive session; each line is generated
    Session,
}

#[derive(Args)]
struct GenerateArgs {
    text: String,

    /// Save the image to the download directory
    #[arg(long)]
    download: bool,

    /// Directory for --download (default: download_dir from config)
    #[arg(long)]
    out: Option<Utf8PathBuf>,

    /// Share the result through the first available channel
    #[arg(long)]
    share: bool,

    #[command(flatten)]
    overrides: SettingsArgs,

    /// Do not record this code in history
    #[arg(long)]
    no_save: bool,
}

/// Per-field settings; unset fields keep the stored value.
#[derive(Args, Default)]
struct SettingsArgs {
    /// Image size in pixels
    #[arg(long)]
    size: Option<u32>,

    /// Dark module color (#rgb or #rrggbb)
    #[arg(long, value_parser = parse_color)]
    dark: Option<String>,

    /// Light module color (#rgb or #rrggbb)
    #[arg(long, value_parser = parse_color)]
    light: Option<String>,

    /// Error-correction level (L, M, Q, H)
    #[arg(long)]
    level: Option<ErrorLevel>,

    /// Image format (png, jpg)
    #[arg(long)]
    format: Option<ImageFormat>,

    /// Content type (text, url, email, phone)
    #[arg(long = "type")]
    content_type: Option<ContentType>,
}

impl SettingsArgs {
    fn apply(&self, settings: &mut Settings) {
        if let Some(size) = self.size {
            settings.size = size;
        }
        if let Some(dark) = &self.dark {
            settings.dark_color = dark.clone();
        }
        if let Some(light) = &self.light {
            settings.light_color = light.clone();
        }
        if let Some(level) = self.level {
            settings.error_level = level;
        }
        if let Some(format) = self.format {
            settings.format = format;
        }
        if let Some(content_type) = self.content_type {
            settings.content_type = content_type;
        }
    }
}

#[derive(Subcommand)]
enum HistoryCommand {
    /// List recent codes, most recent first
    List,
    /// Show one entry and draw its code
    Show { id: u64 },
    /// Regenerate an entry with the current settings
    Use { id: u64 },
    /// Remove one entry
    Remove { id: u64 },
    /// Remove every entry
    Clear,
    /// Write an entry's stored image to disk
    Save {
        id: u64,
        /// Target directory (default: download_dir from config)
        #[arg(long)]
        dir: Option<Utf8PathBuf>,
    },
}

#[derive(Subcommand)]
enum SettingsCommand {
    /// Print the stored settings
    Show,
    /// Change stored settings
    Set {
        #[command(flatten)]
        fields: SettingsArgs,
        /// Record generated codes in history
        #[arg(long)]
        auto_save: Option<bool>,
    },
    /// Restore the defaults
    Reset,
}

fn parse_color(value: &str) -> Result<String, String> {
    match parse_hex_color(value) {
        Some(_) if value.starts_with('#') => Ok(value.to_string()),
        Some(_) => Ok(format!("#{value}")),
        None => Err(format!("{value:?} is not a #rgb or #rrggbb color")),
    }
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let config_manager = match &cli.config {
        Some(path) => ConfigManager::from_file(path)?,
        None => ConfigManager::new(".")?,
    };
    let mut config = config_manager.load_config()?;
    if let Some(data_dir) = &cli.data_dir {
        config.data_dir = data_dir.to_string();
    }
    config.debug_mode |= cli.debug;

    let log_options = qrstudio::logging::LoggingOptions::new(&config.log_dir, config.debug_mode)
        .with_console(cli.debug);
    let _guard = qrstudio::logging::setup_logging(&log_options)?;

    tracing::info!("Starting {} v{}", APP_NAME, VERSION);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("qrstudio-worker")
        .build()
        .context("Failed to create tokio runtime")?;

    let studio = Arc::new(Studio::open(config, cli.ephemeral)?);
    let result = runtime.block_on(dispatch(&studio, cli.command));

    studio.metrics().log_summary();
    runtime.shutdown_timeout(Duration::from_secs(5));
    tracing::info!("Application shutdown complete");

    result.inspect_err(|e| tracing::error!("Command failed: {:#}", e))
}

async fn dispatch(studio: &Arc<Studio>, command: Command) -> Result<ExitCode> {
    let mut toasts = studio.state().subscribe();
    let catalog = || studio.catalog();

    let code = match command {
        Command::Generate(args) => {
            let mut settings = studio.settings();
            args.overrides.apply(&mut settings);
            if args.no_save {
                settings.auto_save = false;
            }

            let generated = studio.generate_with_settings(&args.text, &settings).await;
            print_toasts(&mut toasts);
            match generated {
                Ok(_) => {
                    if let Some(drawing) = studio.preview() {
                        print!("{drawing}");
                    }
                }
                Err(PipelineError::Busy | PipelineError::Cancelled) => return Ok(ExitCode::FAILURE),
                Err(e) => {
                    tracing::debug!("Generation failed: {}", e);
                    return Ok(ExitCode::FAILURE);
                }
            }

            if args.download {
                let dir = args
                    .out
                    .unwrap_or_else(|| Utf8PathBuf::from(&studio.config().download_dir));
                let written = studio.download_to(&dir).await;
                print_toasts(&mut toasts);
                if let Some(path) = written? {
                    println!("{path}");
                }
            }
            if args.share {
                let shared = studio.share().await?;
                print_toasts(&mut toasts);
                if shared.is_none() {
                    println!("{}", catalog().get(msg::SHARE_UNAVAILABLE));
                    return Ok(ExitCode::FAILURE);
                }
            }
            ExitCode::SUCCESS
        }

        Command::History(command) => {
            let code = history(studio, command).await?;
            print_toasts(&mut toasts);
            code
        }

        Command::Stats { reset } => {
            if reset {
                studio.reset_stats();
                print_toasts(&mut toasts);
            }
            println!("{}", studio.stats_summary());
            ExitCode::SUCCESS
        }

        Command::Settings(command) => {
            let settings = match command {
                SettingsCommand::Show => studio.settings(),
                SettingsCommand::Set { fields, auto_save } => {
                    if let Some(size) = fields.size {
                        if !(1..=MAX_SIZE).contains(&size) {
                            bail!("Size {} is outside 1..={}", size, MAX_SIZE);
                        }
                    }
                    studio.update_settings(|s| {
                        fields.apply(s);
                        if let Some(auto_save) = auto_save {
                            s.auto_save = auto_save;
                        }
                    })
                }
                SettingsCommand::Reset => studio.reset_settings(),
            };
            println!(
                "{}",
                serde_json::to_string_pretty(&settings).context("Failed to format settings")?
            );
            ExitCode::SUCCESS
        }

        Command::Theme { value } => {
            match value.as_deref() {
                None => println!("{}", studio.theme()),
                Some("toggle") => {
                    studio.toggle_theme();
                }
                Some(other) => {
                    let theme: Theme = other.parse()?;
                    studio.apply_theme(theme);
                }
            }
            print_toasts(&mut toasts);
            ExitCode::SUCCESS
        }

        Command::Language { value } => {
            match value {
                Some(language) => {
                    studio.apply_language(language);
                    print_toasts(&mut toasts);
                }
                None => {
                    let current = studio.language();
                    for language in Language::ALL {
                        let marker = if language == current { '*' } else { ' ' };
                        println!("{marker} {} {}", language.code(), language.native_name());
                    }
                }
            }
            ExitCode::SUCCESS
        }

        Command::Session => {
            drop(toasts);
            SessionController::new(Arc::clone(studio)).run().await?;
            ExitCode::SUCCESS
        }
    };

    Ok(code)
}

async fn history(studio: &Studio, command: HistoryCommand) -> Result<ExitCode> {
    match command {
        HistoryCommand::List => {
            let entries = studio.history();
            if entries.is_empty() {
                println!("{}", studio.catalog().get(msg::HISTORY_EMPTY));
            } else {
                print!("{}", terminal::history_table(&entries));
            }
        }
        HistoryCommand::Show { id } => {
            let Some(entry) = studio.history_entry(id) else {
                println!("{}", studio.catalog().get(msg::HISTORY_NOT_FOUND));
                return Ok(ExitCode::FAILURE);
            };
            println!("{}", entry.text);
            println!(
                "{} · {}px · {}",
                entry.timestamp.format("%Y-%m-%d %H:%M:%S"),
                entry.size,
                entry.format
            );
            let level = studio.settings().error_level;
            match studio.render_text(&entry.text, level) {
                Ok(drawing) => print!("{drawing}"),
                Err(e) => tracing::warn!("Cannot draw history entry {}: {}", id, e),
            }
        }
        HistoryCommand::Use { id } => match studio.use_history(id).await {
            Ok(Some(_)) => {
                if let Some(drawing) = studio.preview() {
                    print!("{drawing}");
                }
            }
            Ok(None) => return Ok(ExitCode::FAILURE),
            Err(e) => {
                tracing::debug!("Regeneration failed: {}", e);
                return Ok(ExitCode::FAILURE);
            }
        },
        HistoryCommand::Remove { id } => {
            if !studio.remove_history(id) {
                return Ok(ExitCode::FAILURE);
            }
        }
        HistoryCommand::Clear => studio.clear_history(),
        HistoryCommand::Save { id, dir } => {
            let dir = dir.unwrap_or_else(|| Utf8PathBuf::from(&studio.config().download_dir));
            match studio.save_history_entry(id, &dir).await? {
                Some(path) => println!("{path}"),
                None => {
                    println!("{}", studio.catalog().get(msg::HISTORY_NOT_FOUND));
                    return Ok(ExitCode::FAILURE);
                }
            }
        }
    }
    Ok(ExitCode::SUCCESS)
}

/// Print notifications raised since the last call.
fn print_toasts(rx: &mut broadcast::Receiver<StateChange>) {
    loop {
        match rx.try_recv() {
            Ok(StateChange::ToastShown { level, message }) => {
                println!("{}", terminal::toast_line(level, &message));
            }
            Ok(_) | Err(broadcast::error::TryRecvError::Lagged(_)) => {}
            Err(_) => break,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_color_normalizes_prefix() {
        assert_eq!(parse_color("fff").unwrap(), "#fff");
        assert_eq!(parse_color("#1a2b3c").unwrap(), "#1a2b3c");
        assert!(parse_color("blue").is_err());
    }

    #[test]
    fn test_settings_args_only_touch_given_fields() {
        let args = SettingsArgs {
            size: Some(512),
            level: Some(ErrorLevel::H),
            ..SettingsArgs::default()
        };
        let mut settings = Settings::default();
        args.apply(&mut settings);

        assert_eq!(settings.size, 512);
        assert_eq!(settings.error_level, ErrorLevel::H);
        assert_eq!(settings.dark_color, Settings::default().dark_color);
    }

    #[test]
    fn test_generate_flags() {
        let cli = Cli::try_parse_from([
            "qrstudio",
            "--ephemeral",
            "generate",
            "hello",
            "--level",
            "q",
            "--type",
            "url",
            "--no-save",
        ])
        .unwrap();

        assert!(cli.ephemeral);
        let Command::Generate(args) = cli.command else {
            panic!("expected generate");
        };
        assert_eq!(args.text, "hello");
        assert_eq!(args.overrides.level, Some(ErrorLevel::Q));
        assert_eq!(args.overrides.content_type, Some(ContentType::Url));
        assert!(args.no_save);
    }
}
