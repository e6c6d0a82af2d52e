use chrono::{DateTime, Utc};
use isolang::Language;
use serde::{Deserialize, Serialize};

/// One successful translation, as kept in the history list.
///
/// Records are immutable once created. The JSON layout (`timestamp` as epoch
/// milliseconds) matches what earlier versions of the widget persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationRecord {
    pub id: String,
    pub original: String,
    pub translated: String,
    #[serde(rename = "timestamp", with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
}

impl TranslationRecord {
    /// Create a record for a translation that just succeeded
    pub fn new(original: String, translated: String) -> Self {
        Self {
            // v7 ids are time-ordered and carry random bits, so two records
            // created in the same millisecond still differ.
            id: uuid::Uuid::now_v7().to_string(),
            original,
            translated,
            created_at: Utc::now(),
        }
    }

    /// Single-line preview for list rendering
    pub fn preview(text: &str, max_chars: usize) -> String {
        let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
        if flat.chars().count() > max_chars {
            let cut: String = flat.chars().take(max_chars).collect();
            format!("{}...", cut)
        } else {
            flat
        }
    }
}

/// The two text panes of the widget
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pane {
    /// English source text
    Input,
    /// Thai translation
    Output,
}

impl Pane {
    pub fn language(self) -> Language {
        match self {
            Pane::Input => Language::Eng,
            Pane::Output => Language::Tha,
        }
    }

    /// BCP-47 tag handed to the speech engine
    pub fn speech_tag(self) -> &'static str {
        match self {
            Pane::Input => "en-US",
            Pane::Output => "th-TH",
        }
    }

    /// Speaking rate relative to the engine default
    pub fn speech_rate(self) -> f32 {
        match self {
            Pane::Input => 1.0,
            Pane::Output => 0.9,
        }
    }

    pub fn label(self) -> &'static str {
        self.language().to_name()
    }
}
