pub mod category;
pub mod phrase;

use std::collections::BTreeMap;

pub use category::{
    Category, CategoryName, CategoryOverride, CategorySortOrder, PresetCategory, UserCategory,
};
pub use phrase::{NewPhrase, Phrase};

/// Locale tag (e.g. `en_US`) to text.
pub type LocalizedText = BTreeMap<String, String>;
