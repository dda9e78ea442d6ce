use super::settings::ImageFormat;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One past generation, as persisted under the `history` key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Unique, strictly increasing id (epoch milliseconds at creation)
    pub id: u64,
    pub text: String,
    /// Exported image as a `data:<mime>;base64,...` URL
    pub image: String,
    pub format: ImageFormat,
    pub size: u32,
    pub timestamp: DateTime<Utc>,
}

impl HistoryEntry {
    /// Text shortened to `max_chars` characters for list displays.
    pub fn preview(&self, max_chars: usize) -> String {
        if self.text.chars().count() <= max_chars {
            return self.text.clone();
        }

        let truncated: String = self.text.chars().take(max_chars.saturating_sub(1)).collect();
        format!("{}…", truncated)
    }
}

/// Usage counters, persisted under the `stats` key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Stats {
    pub total_generated: u64,
    pub total_downloaded: u64,
    /// Mirrors the number of history entries
    pub history_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(text: &str) -> HistoryEntry {
        HistoryEntry {
            id: 1,
            text: text.to_string(),
            image: String::new(),
            format: ImageFormat::Png,
            size: 200,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn test_preview_short_text_unchanged() {
        assert_eq!(entry("hello").preview(10), "hello");
    }

    #[test]
    fn test_preview_truncates_on_char_boundary() {
        let preview = entry("héllo wörld, this is long").preview(8);
        assert_eq!(preview.chars().count(), 8);
        assert!(preview.ends_with('…'));
        assert!(preview.starts_with("héllo w"));
    }

    #[test]
    fn test_stats_field_names() {
        let stats = Stats {
            total_generated: 3,
            total_downloaded: 1,
            history_count: 2,
        };
        let json = serde_json::to_string(&stats).unwrap();
        assert_eq!(
            json,
            r#"{"totalGenerated":3,"totalDownloaded":1,"historyCount":2}"#
        );
    }
}
