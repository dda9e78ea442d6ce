use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub const DEFAULT_SIZE: u32 = 200;
pub const DEFAULT_DARK_COLOR: &str = "#000000";
pub const DEFAULT_LIGHT_COLOR: &str = "#ffffff";

/// Failure to parse one of the preference enums from user input
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid {kind} {value:?} (expected one of: {expected})")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
    pub expected: &'static str,
}

/// QR error-correction level, trading redundancy for capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ErrorLevel {
    /// ~7% recovery
    L,
    /// ~15% recovery
    #[default]
    M,
    /// ~25% recovery
    Q,
    /// ~30% recovery
    H,
}

impl FromStr for ErrorLevel {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "L" => Ok(Self::L),
            "M" => Ok(Self::M),
            "Q" => Ok(Self::Q),
            "H" => Ok(Self::H),
            _ => Err(ParseEnumError {
                kind: "error-correction level",
                value: s.to_string(),
                expected: "L, M, Q, H",
            }),
        }
    }
}

impl fmt::Display for ErrorLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::L => "L",
            Self::M => "M",
            Self::Q => "Q",
            Self::H => "H",
        };
        f.write_str(s)
    }
}

/// Encoded image format used for downloads, sharing and history thumbnails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    #[default]
    Png,
    #[serde(alias = "jpeg")]
    Jpg,
}

impl ImageFormat {
    /// File extension without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpg => "jpg",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpg => "image/jpeg",
        }
    }
}

impl FromStr for ImageFormat {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "png" => Ok(Self::Png),
            "jpg" | "jpeg" => Ok(Self::Jpg),
            _ => Err(ParseEnumError {
                kind: "image format",
                value: s.to_string(),
                expected: "png, jpg",
            }),
        }
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Kind of content being encoded; selects the advisory shape check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    #[default]
    Text,
    Url,
    Email,
    Phone,
}

impl FromStr for ContentType {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "url" => Ok(Self::Url),
            "email" => Ok(Self::Email),
            "phone" => Ok(Self::Phone),
            _ => Err(ParseEnumError {
                kind: "content type",
                value: s.to_string(),
                expected: "text, url, email, phone",
            }),
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Text => "text",
            Self::Url => "url",
            Self::Email => "email",
            Self::Phone => "phone",
        };
        f.write_str(s)
    }
}

/// Persisted generation preferences.
///
/// Stored as one JSON record under the `settings` key. Every field has a
/// default so records written by older versions still load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    #[serde(deserialize_with = "deserialize_size")]
    pub size: u32,
    pub dark_color: String,
    pub light_color: String,
    pub error_level: ErrorLevel,
    pub auto_save: bool,
    pub format: ImageFormat,
    pub content_type: ContentType,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            size: DEFAULT_SIZE,
            dark_color: DEFAULT_DARK_COLOR.to_string(),
            light_color: DEFAULT_LIGHT_COLOR.to_string(),
            error_level: ErrorLevel::M,
            auto_save: true,
            format: ImageFormat::Png,
            content_type: ContentType::Text,
        }
    }
}

/// Accepts `300` as well as `"300"`; form controls historically stored strings.
fn deserialize_size<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum SizeRepr {
        Number(u32),
        Text(String),
    }

    match SizeRepr::deserialize(deserializer)? {
        SizeRepr::Number(n) => Ok(n),
        SizeRepr::Text(s) => s.trim().parse::<u32>().map_err(serde::de::Error::custom),
    }
}

/// Parse `#rgb` or `#rrggbb` (leading `#` optional) into RGB components.
pub fn parse_hex_color(value: &str) -> Option<[u8; 3]> {
    let hex = value.trim();
    let hex = hex.strip_prefix('#').unwrap_or(hex);

    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }

    match hex.len() {
        3 => {
            let mut rgb = [0u8; 3];
            for (i, c) in hex.chars().enumerate() {
                let v = c.to_digit(16)? as u8;
                rgb[i] = v * 17;
            }
            Some(rgb)
        }
        6 => {
            let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
            let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
            let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
            Some([r, g, b])
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.size, 200);
        assert_eq!(settings.dark_color, "#000000");
        assert_eq!(settings.light_color, "#ffffff");
        assert_eq!(settings.error_level, ErrorLevel::M);
        assert!(settings.auto_save);
    }

    #[test]
    fn test_partial_record_merges_over_defaults() {
        let settings: Settings = serde_json::from_str(r##"{"darkColor":"#222222"}"##).unwrap();
        assert_eq!(settings.dark_color, "#222222");
        assert_eq!(settings.size, 200);
        assert!(settings.auto_save);
    }

    #[test]
    fn test_size_coerced_from_string() {
        let settings: Settings = serde_json::from_str(r#"{"size":"256"}"#).unwrap();
        assert_eq!(settings.size, 256);

        assert!(serde_json::from_str::<Settings>(r#"{"size":"big"}"#).is_err());
    }

    #[test]
    fn test_serialized_field_names() {
        let json = serde_json::to_string(&Settings::default()).unwrap();
        assert!(json.contains("\"darkColor\""));
        assert!(json.contains("\"errorLevel\":\"M\""));
        assert!(json.contains("\"autoSave\":true"));
    }

    #[test]
    fn test_enum_parsing() {
        assert_eq!("h".parse::<ErrorLevel>().unwrap(), ErrorLevel::H);
        assert_eq!("JPEG".parse::<ImageFormat>().unwrap(), ImageFormat::Jpg);
        assert_eq!("phone".parse::<ContentType>().unwrap(), ContentType::Phone);
        assert!("X".parse::<ErrorLevel>().is_err());
        assert!("gif".parse::<ImageFormat>().is_err());
    }

    #[test]
    fn test_parse_hex_color() {
        assert_eq!(parse_hex_color("#000000"), Some([0, 0, 0]));
        assert_eq!(parse_hex_color("#ffffff"), Some([255, 255, 255]));
        assert_eq!(parse_hex_color("1a2B3c"), Some([0x1a, 0x2b, 0x3c]));
        assert_eq!(parse_hex_color("#fff"), Some([255, 255, 255]));
        assert_eq!(parse_hex_color("#f0a"), Some([255, 0, 170]));
        assert_eq!(parse_hex_color("#12345"), None);
        assert_eq!(parse_hex_color("#gggggg"), None);
        assert_eq!(parse_hex_color("red"), None);
    }
}
