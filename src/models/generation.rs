use super::settings::{ContentType, ErrorLevel, ImageFormat, Settings};
use chrono::{DateTime, Utc};
use image::RgbaImage;

/// A submit, resolved against the current settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    /// Trimmed input text
    pub text: String,
    pub size: u32,
    pub dark_color: String,
    pub light_color: String,
    pub error_level: ErrorLevel,
    pub content_type: ContentType,
    pub format: ImageFormat,
}

impl GenerationRequest {
    /// Build a request for `text` using the generation preferences in `settings`.
    ///
    /// The text is trimmed here; emptiness is checked during validation.
    pub fn from_settings(text: &str, settings: &Settings) -> Self {
        Self {
            text: text.trim().to_string(),
            size: settings.size,
            dark_color: settings.dark_color.clone(),
            light_color: settings.light_color.clone(),
            error_level: settings.error_level,
            content_type: settings.content_type,
            format: settings.format,
        }
    }

    /// Parameters handed to the encoder.
    pub fn encode_params(&self) -> EncodeParams {
        EncodeParams {
            text: self.text.clone(),
            width: self.size,
            height: self.size,
            color_dark: self.dark_color.clone(),
            color_light: self.light_color.clone(),
            correction_level: self.error_level,
        }
    }
}

/// Input of the encoder capability.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodeParams {
    pub text: String,
    pub width: u32,
    pub height: u32,
    pub color_dark: String,
    pub color_light: String,
    pub correction_level: ErrorLevel,
}

/// Output of a successful generation, held as the single "current result".
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationResult {
    pub text: String,
    pub image: RgbaImage,
    pub format: ImageFormat,
    pub size: u32,
    /// Level the symbol was built with
    pub error_level: ErrorLevel,
    pub timestamp: DateTime<Utc>,
}
