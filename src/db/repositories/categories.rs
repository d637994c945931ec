use anyhow::Result;
use rusqlite::{params, OptionalExtension, Row};

use crate::db::{
    helpers::{decode_optional_localized, encode_localized, parse_datetime},
    models::{CategoryOverride, CategorySortOrder, LocalizedText, UserCategory},
    Database,
};

fn row_to_override(row: &Row) -> Result<CategoryOverride> {
    let localized_name: Option<String> = row.get("localized_name")?;

    Ok(CategoryOverride {
        category_id: row.get("category_id")?,
        hidden: row.get("hidden")?,
        sort_order: row.get("sort_order")?,
        localized_name: decode_optional_localized(localized_name, "localized_name")?,
    })
}

fn row_to_user_category(row: &Row) -> Result<UserCategory> {
    let created_at: String = row.get("created_at")?;
    let localized_name: Option<String> = row.get("localized_name")?;

    Ok(UserCategory {
        category_id: row.get("category_id")?,
        created_at: parse_datetime(&created_at, "created_at")?,
        name_key: row.get("name_key")?,
        localized_name: decode_optional_localized(localized_name, "localized_name")?,
        hidden: row.get("hidden")?,
        sort_order: row.get("sort_order")?,
    })
}

fn encode_optional(name: Option<&LocalizedText>) -> Result<Option<String>> {
    name.map(encode_localized).transpose()
}

impl Database {
    pub async fn get_category_overrides(&self) -> Result<Vec<CategoryOverride>> {
        self.execute(|conn| {
            let mut stmt = conn.prepare(
                "SELECT category_id, hidden, sort_order, localized_name
                 FROM category_overrides
                 ORDER BY sort_order ASC",
            )?;

            let mut rows = stmt.query([])?;
            let mut overrides = Vec::new();
            while let Some(row) = rows.next()? {
                overrides.push(row_to_override(row)?);
            }

            Ok(overrides)
        })
        .await
    }

    /// Inserts a new override row. Fails if one already exists for the
    /// category.
    pub async fn insert_category_override(&self, record: &CategoryOverride) -> Result<()> {
        let record = record.clone();
        self.execute(move |conn| {
            conn.execute(
                "INSERT INTO category_overrides (category_id, hidden, sort_order, localized_name)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    record.category_id,
                    record.hidden,
                    record.sort_order,
                    encode_optional(record.localized_name.as_ref())?,
                ],
            )?;
            Ok(())
        })
        .await
    }

    pub async fn count_category_overrides(&self) -> Result<i64> {
        self.execute(|conn| {
            Ok(conn.query_row("SELECT COUNT(*) FROM category_overrides", [], |row| row.get(0))?)
        })
        .await
    }

    /// Returns the number of rows touched.
    pub async fn update_override_hidden(&self, category_id: &str, hidden: bool) -> Result<usize> {
        let category_id = category_id.to_string();
        self.execute(move |conn| {
            Ok(conn.execute(
                "UPDATE category_overrides SET hidden = ?1 WHERE category_id = ?2",
                params![hidden, category_id],
            )?)
        })
        .await
    }

    pub async fn update_override_name(
        &self,
        category_id: &str,
        name: Option<LocalizedText>,
    ) -> Result<usize> {
        let category_id = category_id.to_string();
        self.execute(move |conn| {
            Ok(conn.execute(
                "UPDATE category_overrides SET localized_name = ?1 WHERE category_id = ?2",
                params![encode_optional(name.as_ref())?, category_id],
            )?)
        })
        .await
    }

    pub async fn get_user_categories(&self) -> Result<Vec<UserCategory>> {
        self.execute(|conn| {
            let mut stmt = conn.prepare(
                "SELECT category_id, created_at, name_key, localized_name, hidden, sort_order
                 FROM user_categories
                 ORDER BY sort_order ASC, created_at ASC",
            )?;

            let mut rows = stmt.query([])?;
            let mut categories = Vec::new();
            while let Some(row) = rows.next()? {
                categories.push(row_to_user_category(row)?);
            }

            Ok(categories)
        })
        .await
    }

    /// Inserts a user category at the end of the current ordering and
    /// returns the stored row.
    pub async fn insert_user_category(
        &self,
        category_id: String,
        name: LocalizedText,
        created_at: chrono::DateTime<chrono::Utc>,
    ) -> Result<UserCategory> {
        self.execute(move |conn| {
            let tx = conn.transaction()?;

            let next_sort_order: i64 = tx.query_row(
                "SELECT COALESCE(MAX(sort_order), -1) + 1 FROM (
                     SELECT sort_order FROM category_overrides
                     UNION ALL
                     SELECT sort_order FROM user_categories
                 )",
                [],
                |row| row.get(0),
            )?;

            tx.execute(
                "INSERT INTO user_categories (category_id, created_at, name_key, localized_name, hidden, sort_order)
                 VALUES (?1, ?2, NULL, ?3, 0, ?4)",
                params![
                    category_id,
                    created_at.to_rfc3339(),
                    encode_localized(&name)?,
                    next_sort_order,
                ],
            )?;
            tx.commit()?;

            Ok(UserCategory {
                category_id,
                created_at,
                name_key: None,
                localized_name: Some(name),
                hidden: false,
                sort_order: next_sort_order,
            })
        })
        .await
    }

    pub async fn update_user_category_hidden(&self, category_id: &str, hidden: bool) -> Result<usize> {
        let category_id = category_id.to_string();
        self.execute(move |conn| {
            Ok(conn.execute(
                "UPDATE user_categories SET hidden = ?1 WHERE category_id = ?2",
                params![hidden, category_id],
            )?)
        })
        .await
    }

    pub async fn update_user_category_name(&self, category_id: &str, name: LocalizedText) -> Result<usize> {
        let category_id = category_id.to_string();
        self.execute(move |conn| {
            Ok(conn.execute(
                "UPDATE user_categories SET localized_name = ?1 WHERE category_id = ?2",
                params![encode_localized(&name)?, category_id],
            )?)
        })
        .await
    }

    /// Deletes a user category together with its phrases.
    pub async fn delete_user_category(&self, category_id: &str) -> Result<usize> {
        let category_id = category_id.to_string();
        self.execute(move |conn| {
            let tx = conn.transaction()?;
            let removed = tx.execute(
                "DELETE FROM user_categories WHERE category_id = ?1",
                params![category_id],
            )?;
            if removed > 0 {
                tx.execute(
                    "DELETE FROM phrases WHERE parent_category_id = ?1",
                    params![category_id],
                )?;
            }
            tx.commit()?;
            Ok(removed)
        })
        .await
    }

    /// Applies a batch of sort orders atomically.
    ///
    /// Returns the ids that matched neither an override nor a user category;
    /// when that list is non-empty nothing is written.
    pub async fn update_category_sort_orders(&self, batch: Vec<CategorySortOrder>) -> Result<Vec<String>> {
        self.execute(move |conn| {
            let tx = conn.transaction()?;
            let mut unknown = Vec::new();

            for entry in &batch {
                let mut touched = tx.execute(
                    "UPDATE category_overrides SET sort_order = ?1 WHERE category_id = ?2",
                    params![entry.sort_order, entry.category_id],
                )?;
                if touched == 0 {
                    touched = tx.execute(
                        "UPDATE user_categories SET sort_order = ?1 WHERE category_id = ?2",
                        params![entry.sort_order, entry.category_id],
                    )?;
                }
                if touched == 0 {
                    unknown.push(entry.category_id.clone());
                }
            }

            if unknown.is_empty() {
                tx.commit()?;
            } else {
                tx.rollback()?;
            }
            Ok(unknown)
        })
        .await
    }

    pub async fn category_exists(&self, category_id: &str) -> Result<bool> {
        let category_id = category_id.to_string();
        self.execute(move |conn| {
            let found: Option<i64> = conn
                .query_row(
                    "SELECT 1 FROM category_overrides WHERE category_id = ?1
                     UNION ALL
                     SELECT 1 FROM user_categories WHERE category_id = ?1
                     LIMIT 1",
                    params![category_id],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(found.is_some())
        })
        .await
    }
}
