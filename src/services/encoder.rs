use crate::models::settings::parse_hex_color;
use crate::models::{EncodeParams, ErrorLevel};
use image::{Rgba, RgbaImage};
use qrcode::types::QrError;
use qrcode::{Color, EcLevel, QrCode};
use thiserror::Error;

/// Light modules drawn around the symbol on every side.
pub const QUIET_ZONE_MODULES: u32 = 4;

/// Errors raised while turning text into a QR raster
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodingError {
    #[error("Text is too long for a QR code at error-correction level {0}")]
    CapacityExceeded(ErrorLevel),

    #[error("Invalid color {0:?}")]
    InvalidColor(String),

    #[error("Encoder rejected input: {0}")]
    Rejected(String),

    #[error("Encoder task failed: {0}")]
    Crashed(String),
}

/// Encoder capability: text and rendering parameters in, raster image out.
///
/// Implementations must be callable from a blocking worker thread.
pub trait Encoder: Send + Sync {
    fn encode(&self, params: &EncodeParams) -> Result<RgbaImage, EncodingError>;
}

/// [`Encoder`] backed by the `qrcode` crate.
///
/// The symbol (Reed-Solomon, placement, masking) comes from `qrcode`; this
/// type only rasterizes the module matrix with the requested colors.
#[derive(Debug, Clone, Copy, Default)]
pub struct QrCodeEncoder;

impl QrCodeEncoder {
    pub fn new() -> Self {
        Self
    }
}

impl Encoder for QrCodeEncoder {
    fn encode(&self, params: &EncodeParams) -> Result<RgbaImage, EncodingError> {
        let dark = parse_color(&params.color_dark)?;
        let light = parse_color(&params.color_light)?;

        let code = QrCode::with_error_correction_level(
            params.text.as_bytes(),
            ec_level(params.correction_level),
        )
        .map_err(|e| match e {
            QrError::DataTooLong => EncodingError::CapacityExceeded(params.correction_level),
            other => EncodingError::Rejected(other.to_string()),
        })?;

        let modules = code.width() as u32;
        let colors = code.to_colors();

        tracing::debug!(
            "Encoded {} bytes into {}x{} modules (level {})",
            params.text.len(),
            modules,
            modules,
            params.correction_level
        );

        Ok(rasterize(&colors, modules, params.width, params.height, dark, light))
    }
}

fn parse_color(value: &str) -> Result<Rgba<u8>, EncodingError> {
    parse_hex_color(value)
        .map(|[r, g, b]| Rgba([r, g, b, 255]))
        .ok_or_else(|| EncodingError::InvalidColor(value.to_string()))
}

fn ec_level(level: ErrorLevel) -> EcLevel {
    match level {
        ErrorLevel::L => EcLevel::L,
        ErrorLevel::M => EcLevel::M,
        ErrorLevel::Q => EcLevel::Q,
        ErrorLevel::H => EcLevel::H,
    }
}

/// Draw a `modules`×`modules` matrix (row-major) centered in a `width`×`height` image.
///
/// Modules are scaled by the largest whole factor that fits including the
/// quiet zone. When the requested size is smaller than the symbol, the image
/// grows to one pixel per module.
pub(crate) fn rasterize(
    colors: &[Color],
    modules: u32,
    width: u32,
    height: u32,
    dark: Rgba<u8>,
    light: Rgba<u8>,
) -> RgbaImage {
    let total = modules + 2 * QUIET_ZONE_MODULES;
    let scale = (width.min(height) / total).max(1);
    let symbol_px = total * scale;

    let img_width = width.max(symbol_px);
    let img_height = height.max(symbol_px);
    let offset_x = (img_width - symbol_px) / 2 + QUIET_ZONE_MODULES * scale;
    let offset_y = (img_height - symbol_px) / 2 + QUIET_ZONE_MODULES * scale;

    let mut img = RgbaImage::from_pixel(img_width, img_height, light);

    for (i, color) in colors.iter().enumerate() {
        if *color != Color::Dark {
            continue;
        }

        let x = (i as u32) % modules;
        let y = (i as u32) / modules;

        for dy in 0..scale {
            for dx in 0..scale {
                img.put_pixel(offset_x + x * scale + dx, offset_y + y * scale + dy, dark);
            }
        }
    }

    img
}
