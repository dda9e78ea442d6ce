use crate::i18n::msg;
use crate::models::{ContentType, GenerationRequest};
use regex::Regex;
use thiserror::Error;

/// Largest symbol size accepted, in pixels.
pub const MAX_SIZE: u32 = 4096;

/// Input rejected before encoding
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Input text is empty")]
    EmptyInput,

    #[error("Size {0} is outside 1..={MAX_SIZE}")]
    InvalidSize(u32),

    #[error("Not a phone number: {0:?}")]
    InvalidPhone(String),

    #[error("Not an email address: {0:?}")]
    InvalidEmail(String),

    #[error("Not a URL: {0:?}")]
    InvalidUrl(String),
}

impl ValidationError {
    /// Catalog key of the user-facing message.
    pub fn message_key(&self) -> &'static str {
        match self {
            Self::EmptyInput => msg::EMPTY_INPUT,
            Self::InvalidSize(_) => msg::INVALID_SIZE,
            Self::InvalidPhone(_) => msg::INVALID_PHONE,
            Self::InvalidEmail(_) => msg::INVALID_EMAIL,
            Self::InvalidUrl(_) => msg::INVALID_URL,
        }
    }
}

/// Advisory input checks run before encoding.
///
/// The content-type checks only catch obvious mistakes (letters in a phone
/// number, an email without `@`); they are not full format validators.
pub struct Validator {
    phone_pattern: Regex,
    whitespace_pattern: Regex,
}

impl Validator {
    pub fn new() -> Self {
        Self {
            phone_pattern: Regex::new(r"^[0-9+\-().\s]*[0-9][0-9+\-().\s]*$")
                .expect("Invalid phone regex"),
            whitespace_pattern: Regex::new(r"\s").expect("Invalid whitespace regex"),
        }
    }

    /// Check a request whose text has already been trimmed.
    pub fn validate(&self, request: &GenerationRequest) -> Result<(), ValidationError> {
        let text = request.text.as_str();

        if text.is_empty() {
            return Err(ValidationError::EmptyInput);
        }

        if request.size == 0 || request.size > MAX_SIZE {
            return Err(ValidationError::InvalidSize(request.size));
        }

        match request.content_type {
            ContentType::Text => Ok(()),
            ContentType::Phone => {
                let number = text.strip_prefix("tel:").unwrap_or(text);
                if self.phone_pattern.is_match(number) {
                    Ok(())
                } else {
                    Err(ValidationError::InvalidPhone(text.to_string()))
                }
            }
            ContentType::Email => {
                if text.contains('@') || text.starts_with("mailto:") {
                    Ok(())
                } else {
                    Err(ValidationError::InvalidEmail(text.to_string()))
                }
            }
            ContentType::Url => {
                if self.whitespace_pattern.is_match(text) {
                    Err(ValidationError::InvalidUrl(text.to_string()))
                } else {
                    Ok(())
                }
            }
        }
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new()
    }
}
