use crate::models::ImageFormat;
use base64::{Engine as _, engine::general_purpose::STANDARD};
use chrono::{DateTime, Utc};
use image::{DynamicImage, RgbaImage};
use std::io::Cursor;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Failed to encode image: {0}")]
    Image(#[from] image::ImageError),

    #[error("Failed to write export: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed data URL")]
    MalformedDataUrl,
}

/// Encode a raster as PNG or JPEG bytes.
///
/// JPEG has no alpha channel, so the image is flattened to RGB first.
pub fn encode_image(image: &RgbaImage, format: ImageFormat) -> Result<Vec<u8>, ExportError> {
    let mut bytes = Vec::new();
    let mut cursor = Cursor::new(&mut bytes);

    match format {
        ImageFormat::Png => {
            DynamicImage::ImageRgba8(image.clone()).write_to(&mut cursor, image::ImageFormat::Png)?;
        }
        ImageFormat::Jpg => {
            let rgb = DynamicImage::ImageRgba8(image.clone()).to_rgb8();
            DynamicImage::ImageRgb8(rgb).write_to(&mut cursor, image::ImageFormat::Jpeg)?;
        }
    }

    Ok(bytes)
}

/// `data:<mime>;base64,<payload>` form used for history thumbnails.
pub fn to_data_url(bytes: &[u8], format: ImageFormat) -> String {
    format!("data:{};base64,{}", format.mime_type(), STANDARD.encode(bytes))
}

/// Decode a data URL produced by [`to_data_url`].
pub fn from_data_url(url: &str) -> Result<(ImageFormat, Vec<u8>), ExportError> {
    let rest = url.strip_prefix("data:").ok_or(ExportError::MalformedDataUrl)?;
    let (mime, payload) = rest.split_once(";base64,").ok_or(ExportError::MalformedDataUrl)?;

    let format = match mime {
        "image/png" => ImageFormat::Png,
        "image/jpeg" => ImageFormat::Jpg,
        _ => return Err(ExportError::MalformedDataUrl),
    };

    let bytes = STANDARD
        .decode(payload)
        .map_err(|_| ExportError::MalformedDataUrl)?;

    Ok((format, bytes))
}

/// Download file name: `qr-code-<epoch-ms>.<ext>`.
pub fn download_file_name(format: ImageFormat, at: DateTime<Utc>) -> String {
    format!("qr-code-{}.{}", at.timestamp_millis(), format.extension())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use image::Rgba;

    fn sample() -> RgbaImage {
        RgbaImage::from_pixel(8, 8, Rgba([10, 20, 30, 255]))
    }

    #[test]
    fn test_encode_png_signature() {
        let bytes = encode_image(&sample(), ImageFormat::Png).unwrap();
        assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
    }

    #[test]
    fn test_encode_jpeg_signature() {
        let bytes = encode_image(&sample(), ImageFormat::Jpg).unwrap();
        assert_eq!(&bytes[..3], &[0xFF, 0xD8, 0xFF]);
    }

    #[test]
    fn test_data_url_round_trip() {
        let bytes = encode_image(&sample(), ImageFormat::Png).unwrap();
        let url = to_data_url(&bytes, ImageFormat::Png);
        assert!(url.starts_with("data:image/png;base64,"));

        let (format, decoded) = from_data_url(&url).unwrap();
        assert_eq!(format, ImageFormat::Png);
        assert_eq!(decoded, bytes);
    }

    #[test]
    fn test_malformed_data_url() {
        assert!(from_data_url("image/png;base64,AAAA").is_err());
        assert!(from_data_url("data:image/gif;base64,AAAA").is_err());
        assert!(from_data_url("data:image/png;base64,!!!").is_err());
    }

    #[test]
    fn test_download_file_name() {
        let at = Utc.timestamp_millis_opt(1_700_000_000_123).unwrap();
        assert_eq!(
            download_file_name(ImageFormat::Jpg, at),
            "qr-code-1700000000123.jpg"
        );
    }
}
