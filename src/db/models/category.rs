//! Category data models.
//!
//! Built-in categories come from [`PresetCategory`]; the user can only
//! customise them through a persisted [`CategoryOverride`]. Categories the
//! user authors are stored as [`UserCategory`] rows.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::LocalizedText;

/// Fixed set of built-in categories, in enumeration order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PresetCategory {
    General,
    BasicNeeds,
    PersonalCare,
    Conversation,
    Environment,
    /// Number pad, rendered by the UI rather than stored.
    Keypad,
    /// Most recently spoken phrases, computed on read.
    Recents,
    /// User-authored bucket, stored with the user categories.
    MySayings,
}

impl PresetCategory {
    pub const ALL: [PresetCategory; 8] = [
        PresetCategory::General,
        PresetCategory::BasicNeeds,
        PresetCategory::PersonalCare,
        PresetCategory::Conversation,
        PresetCategory::Environment,
        PresetCategory::Keypad,
        PresetCategory::Recents,
        PresetCategory::MySayings,
    ];

    pub fn id(self) -> &'static str {
        match self {
            PresetCategory::General => "general",
            PresetCategory::BasicNeeds => "basic_needs",
            PresetCategory::PersonalCare => "personal_care",
            PresetCategory::Conversation => "conversation",
            PresetCategory::Environment => "environment",
            PresetCategory::Keypad => "keypad",
            PresetCategory::Recents => "recents",
            PresetCategory::MySayings => "my_sayings",
        }
    }

    pub fn name_key(self) -> &'static str {
        match self {
            PresetCategory::General => "category_general",
            PresetCategory::BasicNeeds => "category_basic_needs",
            PresetCategory::PersonalCare => "category_personal_care",
            PresetCategory::Conversation => "category_conversation",
            PresetCategory::Environment => "category_environment",
            PresetCategory::Keypad => "category_keypad",
            PresetCategory::Recents => "category_recents",
            PresetCategory::MySayings => "category_my_sayings",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|preset| preset.id() == id)
    }

    /// Categories whose content is computed rather than owned.
    pub fn is_synthetic(self) -> bool {
        matches!(self, PresetCategory::Keypad | PresetCategory::Recents)
    }

    /// Built-ins reconciled through override rows, with their default sort
    /// order.
    pub fn reconciled() -> impl Iterator<Item = (i64, PresetCategory)> {
        Self::ALL
            .into_iter()
            .filter(|preset| *preset != PresetCategory::MySayings)
            .enumerate()
            .map(|(index, preset)| (index as i64, preset))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", tag = "kind", content = "value")]
pub enum CategoryName {
    /// Resource key resolved by the UI.
    Key(String),
    /// Name typed by the user.
    Localized(LocalizedText),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: String,
    pub sort_order: i64,
    pub hidden: bool,
    pub name: CategoryName,
}

/// Persisted customisation of a built-in category.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CategoryOverride {
    pub category_id: String,
    pub hidden: bool,
    pub sort_order: i64,
    pub localized_name: Option<LocalizedText>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserCategory {
    pub category_id: String,
    pub created_at: DateTime<Utc>,
    pub name_key: Option<String>,
    pub localized_name: Option<LocalizedText>,
    pub hidden: bool,
    pub sort_order: i64,
}

impl UserCategory {
    pub fn name(&self) -> CategoryName {
        match (&self.localized_name, &self.name_key) {
            (Some(name), _) => CategoryName::Localized(name.clone()),
            (None, Some(key)) => CategoryName::Key(key.clone()),
            (None, None) => CategoryName::Localized(LocalizedText::new()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CategorySortOrder {
    pub category_id: String,
    pub sort_order: i64,
}

impl CategorySortOrder {
    pub fn new(category_id: impl Into<String>, sort_order: i64) -> Self {
        Self {
            category_id: category_id.into(),
            sort_order,
        }
    }
}
