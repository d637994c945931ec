use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use log::{info, warn};
use tokio::sync::{watch, Mutex};
use uuid::Uuid;

use crate::db::{
    Category, CategoryName, CategoryOverride, CategorySortOrder, Database, LocalizedText,
    NewPhrase, Phrase, PresetCategory,
};

use super::error::StoreError;

pub const RECENT_PHRASES_LIMIT: usize = 8;

/// Categories and phrases, backed by the database.
///
/// Built-in categories are reconciled against their override rows on every
/// category read. That read-then-create runs under `category_lock` so two
/// first-run callers cannot both insert the same override. Phrase reads and
/// writes never take the lock.
#[derive(Clone)]
pub struct PresetsStore {
    db: Database,
    category_lock: Arc<Mutex<()>>,
    categories_tx: Arc<watch::Sender<Vec<Category>>>,
}

impl PresetsStore {
    pub fn new(db: Database) -> Self {
        let (categories_tx, _) = watch::channel(Vec::new());
        Self {
            db,
            category_lock: Arc::new(Mutex::new(())),
            categories_tx: Arc::new(categories_tx),
        }
    }

    /// Snapshot stream of the ordered category list. Holds an empty list
    /// until the first read or category mutation.
    pub fn subscribe_categories(&self) -> watch::Receiver<Vec<Category>> {
        self.categories_tx.subscribe()
    }

    pub async fn get_categories(&self) -> Result<Vec<Category>> {
        let _guard = self.category_lock.lock().await;
        let categories = self.reconcile().await?;
        self.publish(&categories);
        Ok(categories)
    }

    pub async fn get_category_by_id(&self, category_id: &str) -> Result<Category> {
        self.get_categories()
            .await?
            .into_iter()
            .find(|category| category.id == category_id)
            .ok_or_else(|| StoreError::category_not_found(category_id).into())
    }

    pub async fn get_phrases_for_category(&self, category_id: &str) -> Result<Vec<Phrase>> {
        if category_id == PresetCategory::Recents.id() {
            return self.db.get_recent_phrases(RECENT_PHRASES_LIMIT).await;
        }
        self.db.get_phrases_for_category(category_id).await
    }

    pub async fn get_phrase(&self, phrase_id: i64) -> Result<Phrase> {
        self.db
            .get_phrase(phrase_id)
            .await?
            .ok_or_else(|| StoreError::phrase_not_found(phrase_id).into())
    }

    pub async fn update_phrase_last_spoken(&self, phrase_id: i64, spoken_at: DateTime<Utc>) -> Result<()> {
        let touched = self.db.update_phrase_last_spoken(phrase_id, spoken_at).await?;
        ensure_touched(touched, || StoreError::phrase_not_found(phrase_id))
    }

    /// Marks a phrase as spoken now.
    pub async fn phrase_spoken(&self, phrase_id: i64) -> Result<()> {
        self.update_phrase_last_spoken(phrase_id, Utc::now()).await
    }

    pub async fn add_phrase(&self, phrase: NewPhrase) -> Result<Phrase> {
        let category_id = phrase.parent_category_id.as_str();
        match PresetCategory::from_id(category_id) {
            Some(preset) if preset.is_synthetic() => {
                return Err(StoreError::SyntheticCategory(category_id.to_string()).into());
            }
            Some(preset) if preset != PresetCategory::MySayings => {}
            _ => {
                if !self.db.category_exists(category_id).await? {
                    return Err(StoreError::category_not_found(category_id).into());
                }
            }
        }

        let stored = self
            .db
            .insert_phrase(phrase, Utc::now())
            .await
            .context("failed to insert phrase")?;
        info!("Added phrase {} to {}", stored.id, stored.parent_category_id);
        Ok(stored)
    }

    pub async fn update_phrase(&self, phrase_id: i64, utterance: LocalizedText) -> Result<()> {
        let touched = self.db.update_phrase_utterance(phrase_id, utterance).await?;
        ensure_touched(touched, || StoreError::phrase_not_found(phrase_id))
    }

    pub async fn delete_phrase(&self, phrase_id: i64) -> Result<()> {
        let touched = self.db.delete_phrase(phrase_id).await?;
        ensure_touched(touched, || StoreError::phrase_not_found(phrase_id))
    }

    /// Applies all sort orders or none. Fails with `NotFound` naming the
    /// first unknown id.
    pub async fn update_category_sort_orders(&self, batch: Vec<CategorySortOrder>) -> Result<()> {
        let _guard = self.category_lock.lock().await;
        // Overrides must exist before they can be reordered.
        self.reconcile().await?;

        let unknown = self.db.update_category_sort_orders(batch).await?;
        if let Some(first) = unknown.into_iter().next() {
            return Err(StoreError::category_not_found(first).into());
        }

        self.refresh_locked().await
    }

    pub async fn update_category_name(&self, category_id: &str, name: LocalizedText) -> Result<()> {
        let _guard = self.category_lock.lock().await;
        self.reconcile().await?;

        let touched = if is_reconciled_preset(category_id) {
            self.db.update_override_name(category_id, Some(name)).await?
        } else {
            self.db.update_user_category_name(category_id, name).await?
        };
        ensure_touched(touched, || StoreError::category_not_found(category_id))?;

        self.refresh_locked().await
    }

    pub async fn update_category_hidden(&self, category_id: &str, hidden: bool) -> Result<()> {
        let _guard = self.category_lock.lock().await;
        self.reconcile().await?;

        let touched = if is_reconciled_preset(category_id) {
            self.db.update_override_hidden(category_id, hidden).await?
        } else {
            self.db.update_user_category_hidden(category_id, hidden).await?
        };
        ensure_touched(touched, || StoreError::category_not_found(category_id))?;

        self.refresh_locked().await
    }

    pub async fn add_category(&self, name: LocalizedText) -> Result<Category> {
        let _guard = self.category_lock.lock().await;
        self.reconcile().await?;

        let stored = self
            .db
            .insert_user_category(Uuid::new_v4().to_string(), name, Utc::now())
            .await
            .context("failed to insert category")?;
        info!("Added category {}", stored.category_id);

        self.refresh_locked().await?;
        Ok(Category {
            name: stored.name(),
            id: stored.category_id,
            sort_order: stored.sort_order,
            hidden: stored.hidden,
        })
    }

    /// Deletes a user-authored category and its phrases.
    pub async fn delete_category(&self, category_id: &str) -> Result<()> {
        if PresetCategory::from_id(category_id).is_some() {
            return Err(StoreError::BuiltInCategory(category_id.to_string()).into());
        }

        let _guard = self.category_lock.lock().await;
        let touched = self.db.delete_user_category(category_id).await?;
        ensure_touched(touched, || StoreError::category_not_found(category_id))?;

        self.refresh_locked().await
    }

    /// Merges built-in categories with their overrides, creating missing
    /// override rows, then appends user categories. Caller holds
    /// `category_lock`.
    async fn reconcile(&self) -> Result<Vec<Category>> {
        let overrides: HashMap<String, CategoryOverride> = self
            .db
            .get_category_overrides()
            .await
            .context("failed to read category overrides")?
            .into_iter()
            .map(|row| (row.category_id.clone(), row))
            .collect();

        let mut categories = Vec::new();
        for (index, preset) in PresetCategory::reconciled() {
            let row = match overrides.get(preset.id()) {
                Some(row) => row.clone(),
                None => {
                    let row = CategoryOverride {
                        category_id: preset.id().to_string(),
                        hidden: false,
                        sort_order: index,
                        localized_name: None,
                    };
                    self.db
                        .insert_category_override(&row)
                        .await
                        .with_context(|| format!("failed to create override for {}", preset.id()))?;
                    row
                }
            };

            categories.push(Category {
                id: row.category_id,
                sort_order: row.sort_order,
                hidden: row.hidden,
                name: match row.localized_name {
                    Some(name) => CategoryName::Localized(name),
                    None => CategoryName::Key(preset.name_key().to_string()),
                },
            });
        }

        for user in self.db.get_user_categories().await? {
            categories.push(Category {
                name: user.name(),
                id: user.category_id,
                sort_order: user.sort_order,
                hidden: user.hidden,
            });
        }

        // Stable: ties keep enumeration order, then user categories.
        categories.sort_by_key(|category| category.sort_order);
        Ok(categories)
    }

    async fn refresh_locked(&self) -> Result<()> {
        let categories = self.reconcile().await?;
        self.publish(&categories);
        Ok(())
    }

    fn publish(&self, categories: &[Category]) {
        self.categories_tx.send_if_modified(|current| {
            if current.as_slice() == categories {
                return false;
            }
            *current = categories.to_vec();
            true
        });
    }
}

fn is_reconciled_preset(category_id: &str) -> bool {
    PresetCategory::from_id(category_id).is_some_and(|preset| preset != PresetCategory::MySayings)
}

fn ensure_touched(touched: usize, not_found: impl FnOnce() -> StoreError) -> Result<()> {
    if touched == 0 {
        let err = not_found();
        warn!("{err}");
        return Err(err.into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::presets::error::EntityKind;

    fn store() -> PresetsStore {
        PresetsStore::new(Database::open_in_memory().unwrap())
    }

    fn text(value: &str) -> LocalizedText {
        LocalizedText::from([("en_US".to_string(), value.to_string())])
    }

    fn new_phrase(category: &str, value: &str) -> NewPhrase {
        NewPhrase {
            parent_category_id: category.to_string(),
            localized_utterance: text(value),
            sort_order: None,
        }
    }

    fn ids(categories: &[Category]) -> Vec<&str> {
        categories.iter().map(|c| c.id.as_str()).collect()
    }

    #[tokio::test]
    async fn first_read_creates_default_overrides() {
        let store = store();
        let categories = store.get_categories().await.unwrap();

        assert_eq!(
            ids(&categories),
            [
                "general",
                "basic_needs",
                "personal_care",
                "conversation",
                "environment",
                "keypad",
                "recents",
                "my_sayings",
            ]
        );
        assert!(categories.iter().all(|c| !c.hidden));
        assert_eq!(categories[0].name, CategoryName::Key("category_general".into()));
        assert_eq!(store.db.count_category_overrides().await.unwrap(), 7);
    }

    #[tokio::test]
    async fn reconciliation_is_idempotent() {
        let store = store();
        let first = store.get_categories().await.unwrap();
        let second = store.get_categories().await.unwrap();
        assert_eq!(first, second);
        assert_eq!(store.db.count_category_overrides().await.unwrap(), 7);
    }

    #[tokio::test]
    async fn concurrent_first_run_creates_one_row_per_category() {
        let store = store();
        let other = store.clone();
        let (a, b) = tokio::join!(store.get_categories(), other.get_categories());
        assert_eq!(a.unwrap(), b.unwrap());
        assert_eq!(store.db.count_category_overrides().await.unwrap(), 7);
    }

    #[tokio::test]
    async fn existing_override_values_win() {
        let store = store();
        store
            .db
            .insert_category_override(&CategoryOverride {
                category_id: "general".into(),
                hidden: true,
                sort_order: 42,
                localized_name: None,
            })
            .await
            .unwrap();

        let categories = store.get_categories().await.unwrap();
        let general = categories.last().unwrap();
        assert_eq!(general.id, "general");
        assert!(general.hidden);
        assert_eq!(general.sort_order, 42);
    }

    #[tokio::test]
    async fn recents_excludes_never_spoken() {
        let store = store();
        let zero = store.add_phrase(new_phrase("general", "zero")).await.unwrap();
        let spoken = store.add_phrase(new_phrase("general", "spoken")).await.unwrap();
        store.add_phrase(new_phrase("general", "never")).await.unwrap();

        store
            .update_phrase_last_spoken(zero.id, Utc.timestamp_millis_opt(0).unwrap())
            .await
            .unwrap();
        store
            .update_phrase_last_spoken(spoken.id, Utc.timestamp_millis_opt(500).unwrap())
            .await
            .unwrap();

        let recents = store.get_phrases_for_category("recents").await.unwrap();
        assert_eq!(recents.len(), 1);
        assert_eq!(recents[0].id, spoken.id);
    }

    #[tokio::test]
    async fn recents_are_newest_first_and_capped() {
        let store = store();
        for i in 0..(RECENT_PHRASES_LIMIT as i64 + 3) {
            let phrase = store
                .add_phrase(new_phrase("conversation", &format!("p{i}")))
                .await
                .unwrap();
            store
                .update_phrase_last_spoken(phrase.id, Utc.timestamp_millis_opt(1_000 + i).unwrap())
                .await
                .unwrap();
        }

        let recents = store.get_phrases_for_category("recents").await.unwrap();
        assert_eq!(recents.len(), RECENT_PHRASES_LIMIT);
        assert!(recents
            .windows(2)
            .all(|pair| pair[0].last_spoken_at > pair[1].last_spoken_at));
    }

    #[tokio::test]
    async fn phrases_follow_sort_order_within_category() {
        let store = store();
        let first = store.add_phrase(new_phrase("my_sayings", "first")).await.unwrap();
        let second = store.add_phrase(new_phrase("my_sayings", "second")).await.unwrap();
        let pinned = store
            .add_phrase(NewPhrase {
                sort_order: Some(-1),
                ..new_phrase("my_sayings", "pinned")
            })
            .await
            .unwrap();
        store.add_phrase(new_phrase("general", "elsewhere")).await.unwrap();

        assert_eq!((first.sort_order, second.sort_order), (0, 1));
        let phrases = store.get_phrases_for_category("my_sayings").await.unwrap();
        let order: Vec<i64> = phrases.iter().map(|p| p.id).collect();
        assert_eq!(order, [pinned.id, first.id, second.id]);
        assert_eq!(phrases[1].utterance("fr_FR"), Some("first"));
    }

    #[tokio::test]
    async fn add_phrase_validates_parent() {
        let store = store();
        let err = store.add_phrase(new_phrase("recents", "x")).await.unwrap_err();
        assert_eq!(
            err.downcast_ref::<StoreError>(),
            Some(&StoreError::SyntheticCategory("recents".into()))
        );

        let err = store.add_phrase(new_phrase("nope", "x")).await.unwrap_err();
        assert!(StoreError::is_not_found(&err));
    }

    #[tokio::test]
    async fn phrase_mutations_on_unknown_ids_report_not_found() {
        let store = store();
        for err in [
            store.delete_phrase(99).await.unwrap_err(),
            store.update_phrase(99, text("x")).await.unwrap_err(),
            store.phrase_spoken(99).await.unwrap_err(),
            store.get_phrase(99).await.unwrap_err(),
        ] {
            assert_eq!(
                err.downcast_ref::<StoreError>(),
                Some(&StoreError::NotFound {
                    kind: EntityKind::Phrase,
                    id: "99".into()
                })
            );
        }
    }

    #[tokio::test]
    async fn update_and_delete_phrase() {
        let store = store();
        let phrase = store.add_phrase(new_phrase("general", "hello")).await.unwrap();

        store.update_phrase(phrase.id, text("hi")).await.unwrap();
        let stored = store.get_phrase(phrase.id).await.unwrap();
        assert_eq!(stored.utterance("en_US"), Some("hi"));

        store.phrase_spoken(phrase.id).await.unwrap();
        assert!(store.db.get_phrase(phrase.id).await.unwrap().unwrap().last_spoken_at.is_some());

        store.delete_phrase(phrase.id).await.unwrap();
        assert!(store.get_phrases_for_category("general").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn category_mutations_reach_subscribers() {
        let store = store();
        let mut rx = store.subscribe_categories();
        assert!(rx.borrow().is_empty());

        store.update_category_hidden("environment", true).await.unwrap();
        assert!(rx.has_changed().unwrap());
        let snapshot = rx.borrow_and_update().clone();
        assert!(snapshot.iter().find(|c| c.id == "environment").unwrap().hidden);

        store
            .update_category_name("general", text("Everyday"))
            .await
            .unwrap();
        let snapshot = rx.borrow_and_update().clone();
        assert_eq!(
            snapshot[0].name,
            CategoryName::Localized(text("Everyday"))
        );

        // Reading again without changes does not wake subscribers.
        store.get_categories().await.unwrap();
        assert!(!rx.has_changed().unwrap());
    }

    #[tokio::test]
    async fn sort_order_batch_is_all_or_nothing() {
        let store = store();
        store
            .update_category_sort_orders(vec![
                CategorySortOrder::new("recents", -2),
                CategorySortOrder::new("general", 6),
                CategorySortOrder::new("my_sayings", -1),
            ])
            .await
            .unwrap();
        let categories = store.get_categories().await.unwrap();
        assert_eq!(&ids(&categories)[..2], ["recents", "my_sayings"]);

        let err = store
            .update_category_sort_orders(vec![
                CategorySortOrder::new("general", 0),
                CategorySortOrder::new("missing", 1),
            ])
            .await
            .unwrap_err();
        assert_eq!(
            err.downcast_ref::<StoreError>(),
            Some(&StoreError::category_not_found("missing"))
        );
        let general = store.get_category_by_id("general").await.unwrap();
        assert_eq!(general.sort_order, 6, "rolled back");
    }

    #[tokio::test]
    async fn user_categories_can_be_added_and_deleted() {
        let store = store();
        let added = store.add_category(text("Family")).await.unwrap();
        assert_eq!(added.sort_order, 8);
        assert_eq!(store.get_category_by_id(&added.id).await.unwrap(), added);

        let phrase = store.add_phrase(new_phrase(&added.id, "Call mom")).await.unwrap();
        store.update_category_hidden(&added.id, true).await.unwrap();

        store.delete_category(&added.id).await.unwrap();
        assert!(StoreError::is_not_found(
            &store.get_category_by_id(&added.id).await.unwrap_err()
        ));
        assert!(store.db.get_phrase(phrase.id).await.unwrap().is_none());

        let err = store.delete_category("general").await.unwrap_err();
        assert_eq!(
            err.downcast_ref::<StoreError>(),
            Some(&StoreError::BuiltInCategory("general".into()))
        );
        assert!(StoreError::is_not_found(
            &store.delete_category(&added.id).await.unwrap_err()
        ));
    }

    #[tokio::test]
    async fn unknown_category_updates_report_not_found() {
        let store = store();
        assert!(StoreError::is_not_found(
            &store.update_category_hidden("missing", true).await.unwrap_err()
        ));
        assert!(StoreError::is_not_found(
            &store.update_category_name("missing", text("x")).await.unwrap_err()
        ));
    }
}
