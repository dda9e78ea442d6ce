//! Terminal rendering of QR rasters with Unicode half blocks.
//!
//! Each character covers two vertically stacked modules:
//! `▀` top only, `▄` bottom only, `█` both, space neither.

use crate::models::{HistoryEntry, Theme, ToastLevel};
use image::RgbaImage;

/// Characters of the text column in history listings.
const PREVIEW_CHARS: usize = 40;

/// Render a one-pixel-per-module image as half-block text.
///
/// On the light theme dark modules are drawn as blocks; on the dark theme the
/// drawing is inverted so the symbol still scans against a dark background.
pub fn render(image: &RgbaImage, theme: Theme) -> String {
    let (width, height) = image.dimensions();
    let inverted = theme == Theme::Dark;

    let filled = |x: u32, y: u32| -> bool {
        if y >= height {
            // Pad an odd last row with quiet zone
            return inverted;
        }
        let [r, g, b, _] = image.get_pixel(x, y).0;
        let luma = (u32::from(r) * 299 + u32::from(g) * 587 + u32::from(b) * 114) / 1000;
        (luma < 128) != inverted
    };

    let mut out = String::with_capacity(((width + 1) * height.div_ceil(2)) as usize);
    for y in (0..height).step_by(2) {
        for x in 0..width {
            let ch = match (filled(x, y), filled(x, y + 1)) {
                (true, true) => '█',
                (true, false) => '▀',
                (false, true) => '▄',
                (false, false) => ' ',
            };
            out.push(ch);
        }
        out.push('\n');
    }
    out
}

/// One toast as a single output line.
pub fn toast_line(level: ToastLevel, message: &str) -> String {
    let marker = match level {
        ToastLevel::Info => "i",
        ToastLevel::Success => "✓",
        ToastLevel::Warning => "!",
        ToastLevel::Error => "✗",
    };
    format!("[{marker}] {message}")
}

/// Numbered history listing, most recent first.
pub fn history_table(entries: &[HistoryEntry]) -> String {
    entries
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            format!(
                "{:>2}. [{}] {} {:>4}px {}  {}\n",
                i + 1,
                entry.id,
                entry.timestamp.format("%Y-%m-%d %H:%M:%S"),
                entry.size,
                entry.format,
                entry.preview(PREVIEW_CHARS)
            )
        })
        .collect()
}
