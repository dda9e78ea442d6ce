//! Share and clipboard capabilities.
//!
//! Sharing walks an ordered chain of capabilities and stops at the first one
//! that succeeds. Every attempt runs inside its own failure boundary (errors
//! and timeouts are logged and the next capability is tried), so a broken
//! clipboard tool can never fail the caller. When the whole chain is
//! exhausted the result is `None` and nothing is surfaced as an error.
//!
//! Default order:
//! 1. [`CommandShare`]: configured external share command (`share_command`)
//! 2. [`ImageClipboard`]: image bytes to `wl-copy` / `xclip`
//! 3. [`TextClipboard`]: encoded text to `pbcopy` / `clip` / `wl-copy` / `xclip`
//! 4. [`Osc52Clipboard`]: OSC 52 escape written to the terminal

use crate::models::{AppConfig, ImageFormat};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use camino::Utf8PathBuf;
use std::env;
use std::future::Future;
use std::io::{IsTerminal, Write};
use std::pin::Pin;
use std::process::Stdio;
use std::time::Duration;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::time::timeout;

/// Per-capability time limit.
pub const DEFAULT_SHARE_TIMEOUT: Duration = Duration::from_secs(10);

/// Common OSC 52 size limit (base64 payload bytes).
pub const MAX_OSC52_PAYLOAD: usize = 74_994;

#[derive(Error, Debug)]
pub enum ShareError {
    #[error("{0} is not available")]
    Unsupported(String),

    #[error("{command} exited with status {code:?}")]
    CommandFailed { command: String, code: Option<i32> },

    #[error("Share I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Timed out after {0:?}")]
    Timeout(Duration),
}

/// What gets shared: the exported image plus the encoded text.
#[derive(Debug, Clone)]
pub struct SharePayload {
    pub text: String,
    /// Encoded image bytes in `format`
    pub image: Vec<u8>,
    pub format: ImageFormat,
    /// Suggested file name (`qr-code-<epoch-ms>.<ext>`)
    pub file_name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShareKind {
    /// Hands the image to another application
    Share,
    /// Places the image or text on a clipboard
    Clipboard,
}

/// Which capability handled a share.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShareOutcome {
    pub capability: &'static str,
    pub kind: ShareKind,
}

pub type ShareFuture<'a> = Pin<Box<dyn Future<Output = Result<(), ShareError>> + Send + 'a>>;

/// One link of the share chain.
pub trait ShareCapability: Send + Sync {
    fn name(&self) -> &'static str;

    fn kind(&self) -> ShareKind;

    /// Try to deliver `payload`. `Err(ShareError::Unsupported)` means "skip me".
    fn attempt<'a>(&'a self, payload: &'a SharePayload) -> ShareFuture<'a>;
}

/// Ordered fallback chain of [`ShareCapability`]s.
pub struct ShareChain {
    capabilities: Vec<Box<dyn ShareCapability>>,
    timeout: Duration,
}

impl ShareChain {
    pub fn new(capabilities: Vec<Box<dyn ShareCapability>>, timeout: Duration) -> Self {
        Self {
            capabilities,
            timeout,
        }
    }

    /// Chain for the current machine: share command (if configured), then
    /// clipboards, then OSC 52.
    pub fn for_environment(config: &AppConfig) -> Self {
        let mut capabilities: Vec<Box<dyn ShareCapability>> = Vec::new();

        if !config.share_command.is_empty() {
            capabilities.push(Box::new(CommandShare::new(config.share_command.clone())));
        }
        capabilities.push(Box::new(ImageClipboard::detect()));
        capabilities.push(Box::new(TextClipboard::detect()));
        capabilities.push(Box::new(Osc52Clipboard::new()));

        Self::new(capabilities, DEFAULT_SHARE_TIMEOUT)
    }

    pub fn capability_names(&self) -> Vec<&'static str> {
        self.capabilities.iter().map(|c| c.name()).collect()
    }

    /// Share through the first working capability.
    pub async fn share(&self, payload: &SharePayload) -> Option<ShareOutcome> {
        self.run(payload, true).await
    }

    /// Like [`share`](Self::share) but only clipboard capabilities are tried.
    pub async fn copy(&self, payload: &SharePayload) -> Option<ShareOutcome> {
        self.run(payload, false).await
    }

    async fn run(&self, payload: &SharePayload, include_share: bool) -> Option<ShareOutcome> {
        for capability in &self.capabilities {
            if !include_share && capability.kind() == ShareKind::Share {
                continue;
            }

            let name = capability.name();
            let result = match timeout(self.timeout, capability.attempt(payload)).await {
                Ok(result) => result,
                Err(_) => Err(ShareError::Timeout(self.timeout)),
            };

            match result {
                Ok(()) => {
                    tracing::info!("Shared {:?} via {}", payload.text, name);
                    return Some(ShareOutcome {
                        capability: name,
                        kind: capability.kind(),
                    });
                }
                Err(ShareError::Unsupported(reason)) => {
                    tracing::debug!("Skipping {}: {} is not available", name, reason);
                }
                Err(e) => {
                    tracing::warn!("{} failed, trying next capability: {}", name, e);
                }
            }
        }

        tracing::info!("No share capability succeeded, giving up");
        None
    }
}

/// Runs a user-configured command, e.g. `["xdg-open", "{file}"]`.
///
/// The image is written to the temp directory first; `{file}` expands to its
/// path and `{text}` to the encoded text.
pub struct CommandShare {
    argv: Vec<String>,
}

impl CommandShare {
    pub fn new(argv: Vec<String>) -> Self {
        Self { argv }
    }

    fn expand(&self, file: &str, text: &str) -> Vec<String> {
        self.argv
            .iter()
            .map(|arg| arg.replace("{file}", file).replace("{text}", text))
            .collect()
    }

    async fn run(&self, payload: &SharePayload) -> Result<(), ShareError> {
        let Some(program) = self.argv.first() else {
            return Err(ShareError::Unsupported("share command".to_string()));
        };

        let path = Utf8PathBuf::from_path_buf(env::temp_dir().join(&payload.file_name))
            .map_err(|_| ShareError::Unsupported("UTF-8 temp directory".to_string()))?;
        tokio::fs::write(&path, &payload.image).await?;

        let argv = self.expand(path.as_str(), &payload.text);
        tracing::debug!("Running share command: {:?}", argv);

        let status = Command::new(&argv[0])
            .args(&argv[1..])
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .status()
            .await?;

        if status.success() {
            Ok(())
        } else {
            Err(ShareError::CommandFailed {
                command: program.clone(),
                code: status.code(),
            })
        }
    }
}

impl ShareCapability for CommandShare {
    fn name(&self) -> &'static str {
        "share-command"
    }

    fn kind(&self) -> ShareKind {
        ShareKind::Share
    }

    fn attempt<'a>(&'a self, payload: &'a SharePayload) -> ShareFuture<'a> {
        Box::pin(self.run(payload))
    }
}

/// External clipboard program and its fixed arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipboardTool {
    pub program: &'static str,
    pub args: Vec<&'static str>,
}

impl ClipboardTool {
    fn new(program: &'static str, args: &[&'static str]) -> Self {
        Self {
            program,
            args: args.to_vec(),
        }
    }
}

/// Copies the exported image to a Wayland or X11 clipboard.
pub struct ImageClipboard {
    tool: Option<&'static str>,
}

impl ImageClipboard {
    pub fn detect() -> Self {
        let tool = if env::var_os("WAYLAND_DISPLAY").is_some() && command_exists("wl-copy") {
            Some("wl-copy")
        } else if env::var_os("DISPLAY").is_some() && command_exists("xclip") {
            Some("xclip")
        } else {
            None
        };
        Self { tool }
    }

    /// Command line for `format`, if an image-capable tool was found.
    pub fn command(&self, format: ImageFormat) -> Option<ClipboardTool> {
        match self.tool? {
            "wl-copy" => Some(ClipboardTool {
                program: "wl-copy",
                args: vec!["--type", format.mime_type()],
            }),
            "xclip" => Some(ClipboardTool {
                program: "xclip",
                args: vec!["-selection", "clipboard", "-t", format.mime_type()],
            }),
            _ => None,
        }
    }
}

impl ShareCapability for ImageClipboard {
    fn name(&self) -> &'static str {
        "image-clipboard"
    }

    fn kind(&self) -> ShareKind {
        ShareKind::Clipboard
    }

    fn attempt<'a>(&'a self, payload: &'a SharePayload) -> ShareFuture<'a> {
        Box::pin(async move {
            let tool = self
                .command(payload.format)
                .ok_or_else(|| ShareError::Unsupported("image clipboard tool".to_string()))?;
            pipe_to_command(&tool, &payload.image).await
        })
    }
}

/// Copies the encoded text with the platform's clipboard tool.
pub struct TextClipboard {
    tool: Option<ClipboardTool>,
}

impl TextClipboard {
    pub fn detect() -> Self {
        Self {
            tool: detect_text_tool(),
        }
    }

    pub fn tool(&self) -> Option<&ClipboardTool> {
        self.tool.as_ref()
    }
}

impl ShareCapability for TextClipboard {
    fn name(&self) -> &'static str {
        "text-clipboard"
    }

    fn kind(&self) -> ShareKind {
        ShareKind::Clipboard
    }

    fn attempt<'a>(&'a self, payload: &'a SharePayload) -> ShareFuture<'a> {
        Box::pin(async move {
            let tool = self
                .tool
                .as_ref()
                .ok_or_else(|| ShareError::Unsupported("text clipboard tool".to_string()))?;
            pipe_to_command(tool, payload.text.as_bytes()).await
        })
    }
}

fn detect_text_tool() -> Option<ClipboardTool> {
    if cfg!(target_os = "macos") && command_exists("pbcopy") {
        return Some(ClipboardTool::new("pbcopy", &[]));
    }
    if cfg!(target_os = "windows") && command_exists("clip") {
        return Some(ClipboardTool::new("clip", &[]));
    }
    if env::var_os("WAYLAND_DISPLAY").is_some() && command_exists("wl-copy") {
        return Some(ClipboardTool::new("wl-copy", &[]));
    }
    if env::var_os("DISPLAY").is_some() && command_exists("xclip") {
        return Some(ClipboardTool::new("xclip", &["-selection", "clipboard"]));
    }
    None
}

/// Writes the text through an OSC 52 escape when stdout is a terminal.
pub struct Osc52Clipboard {
    max_payload: usize,
}

impl Osc52Clipboard {
    pub fn new() -> Self {
        Self {
            max_payload: MAX_OSC52_PAYLOAD,
        }
    }

    /// The escape sequence for `text`, or `None` when it exceeds the payload limit.
    pub fn sequence(&self, text: &str) -> Option<String> {
        let encoded = STANDARD.encode(text);
        if encoded.len() > self.max_payload {
            return None;
        }
        Some(format!("\x1b]52;c;{encoded}\x07"))
    }

    fn write(&self, text: &str) -> Result<(), ShareError> {
        let mut stdout = std::io::stdout();
        if !stdout.is_terminal() {
            return Err(ShareError::Unsupported("terminal".to_string()));
        }

        let seq = self
            .sequence(text)
            .ok_or_else(|| ShareError::Unsupported("OSC 52 for this payload size".to_string()))?;

        stdout.write_all(seq.as_bytes())?;
        stdout.flush()?;
        Ok(())
    }
}

impl Default for Osc52Clipboard {
    fn default() -> Self {
        Self::new()
    }
}

impl ShareCapability for Osc52Clipboard {
    fn name(&self) -> &'static str {
        "osc52"
    }

    fn kind(&self) -> ShareKind {
        ShareKind::Clipboard
    }

    fn attempt<'a>(&'a self, payload: &'a SharePayload) -> ShareFuture<'a> {
        Box::pin(async move { self.write(&payload.text) })
    }
}

async fn pipe_to_command(tool: &ClipboardTool, input: &[u8]) -> Result<(), ShareError> {
    let mut child = Command::new(tool.program)
        .args(&tool.args)
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .kill_on_drop(true)
        .spawn()?;

    if let Some(mut stdin) = child.stdin.take() {
        stdin.write_all(input).await?;
        // Closing stdin signals end of input
        drop(stdin);
    }

    let status = child.wait().await?;
    if status.success() {
        Ok(())
    } else {
        Err(ShareError::CommandFailed {
            command: tool.program.to_string(),
            code: status.code(),
        })
    }
}

fn command_exists(command: &str) -> bool {
    let Some(path_var) = env::var_os("PATH") else {
        return false;
    };

    env::split_paths(&path_var).any(|dir| {
        dir.join(command).is_file()
            || (cfg!(target_os = "windows") && dir.join(format!("{command}.exe")).is_file())
    })
}
