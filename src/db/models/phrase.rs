use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::LocalizedText;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Phrase {
    pub id: i64,
    pub parent_category_id: String,
    pub created_at: DateTime<Utc>,
    /// `None` until first spoken.
    pub last_spoken_at: Option<DateTime<Utc>>,
    pub localized_utterance: LocalizedText,
    pub sort_order: i64,
}

impl Phrase {
    /// Utterance for `locale`, falling back to any available translation.
    pub fn utterance(&self, locale: &str) -> Option<&str> {
        self.localized_utterance
            .get(locale)
            .or_else(|| self.localized_utterance.values().next())
            .map(String::as_str)
    }
}

/// Input for creating a phrase.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPhrase {
    pub parent_category_id: String,
    pub localized_utterance: LocalizedText,
    /// Appended after existing phrases when absent.
    pub sort_order: Option<i64>,
}
