use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};

use crate::db::{
    helpers::{decode_localized, encode_localized, from_millis, from_optional_millis},
    models::{LocalizedText, NewPhrase, Phrase},
    Database,
};

const PHRASE_COLUMNS: &str =
    "phrase_id, parent_category_id, created_at_ms, last_spoken_ms, localized_utterance, sort_order";

fn row_to_phrase(row: &Row) -> Result<Phrase> {
    let utterance: String = row.get("localized_utterance")?;

    Ok(Phrase {
        id: row.get("phrase_id")?,
        parent_category_id: row.get("parent_category_id")?,
        created_at: from_millis(row.get("created_at_ms")?, "created_at_ms")?,
        last_spoken_at: from_optional_millis(row.get("last_spoken_ms")?, "last_spoken_ms")?,
        localized_utterance: decode_localized(&utterance, "localized_utterance")?,
        sort_order: row.get("sort_order")?,
    })
}

fn query_phrases(conn: &Connection, sql: &str, args: impl rusqlite::Params) -> Result<Vec<Phrase>> {
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query(args)?;
    let mut phrases = Vec::new();
    while let Some(row) = rows.next()? {
        phrases.push(row_to_phrase(row)?);
    }
    Ok(phrases)
}

impl Database {
    pub async fn get_phrases_for_category(&self, category_id: &str) -> Result<Vec<Phrase>> {
        let category_id = category_id.to_string();
        self.execute(move |conn| {
            query_phrases(
                conn,
                &format!(
                    "SELECT {PHRASE_COLUMNS} FROM phrases
                     WHERE parent_category_id = ?1
                     ORDER BY sort_order ASC, created_at_ms ASC, phrase_id ASC"
                ),
                params![category_id],
            )
        })
        .await
    }

    /// Spoken phrases, newest first. A zero timestamp counts as never spoken.
    pub async fn get_recent_phrases(&self, limit: usize) -> Result<Vec<Phrase>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        self.execute(move |conn| {
            query_phrases(
                conn,
                &format!(
                    "SELECT {PHRASE_COLUMNS} FROM phrases
                     WHERE last_spoken_ms IS NOT NULL AND last_spoken_ms > 0
                     ORDER BY last_spoken_ms DESC, phrase_id DESC
                     LIMIT ?1"
                ),
                params![limit],
            )
        })
        .await
    }

    pub async fn get_phrase(&self, phrase_id: i64) -> Result<Option<Phrase>> {
        self.execute(move |conn| {
            let mut phrases = query_phrases(
                conn,
                &format!("SELECT {PHRASE_COLUMNS} FROM phrases WHERE phrase_id = ?1"),
                params![phrase_id],
            )?;
            Ok(phrases.pop())
        })
        .await
    }

    pub async fn insert_phrase(&self, phrase: NewPhrase, created_at: DateTime<Utc>) -> Result<Phrase> {
        self.execute(move |conn| {
            let tx = conn.transaction()?;

            let sort_order = match phrase.sort_order {
                Some(order) => order,
                None => tx.query_row(
                    "SELECT COALESCE(MAX(sort_order), -1) + 1 FROM phrases WHERE parent_category_id = ?1",
                    params![phrase.parent_category_id],
                    |row| row.get(0),
                )?,
            };

            tx.execute(
                "INSERT INTO phrases (parent_category_id, created_at_ms, last_spoken_ms, localized_utterance, sort_order)
                 VALUES (?1, ?2, NULL, ?3, ?4)",
                params![
                    phrase.parent_category_id,
                    created_at.timestamp_millis(),
                    encode_localized(&phrase.localized_utterance)?,
                    sort_order,
                ],
            )?;
            let phrase_id = tx.last_insert_rowid();

            let stored = query_phrases(
                &tx,
                &format!("SELECT {PHRASE_COLUMNS} FROM phrases WHERE phrase_id = ?1"),
                params![phrase_id],
            )?
            .pop()
            .ok_or_else(|| anyhow!("Phrase not found after insert"))?;

            tx.commit()?;
            Ok(stored)
        })
        .await
    }

    /// Returns the number of rows touched.
    pub async fn update_phrase_utterance(&self, phrase_id: i64, utterance: LocalizedText) -> Result<usize> {
        self.execute(move |conn| {
            Ok(conn.execute(
                "UPDATE phrases SET localized_utterance = ?1 WHERE phrase_id = ?2",
                params![encode_localized(&utterance)?, phrase_id],
            )?)
        })
        .await
    }

    pub async fn update_phrase_last_spoken(&self, phrase_id: i64, spoken_at: DateTime<Utc>) -> Result<usize> {
        self.execute(move |conn| {
            Ok(conn.execute(
                "UPDATE phrases SET last_spoken_ms = ?1 WHERE phrase_id = ?2",
                params![spoken_at.timestamp_millis(), phrase_id],
            )?)
        })
        .await
    }

    pub async fn delete_phrase(&self, phrase_id: i64) -> Result<usize> {
        self.execute(move |conn| {
            Ok(conn.execute("DELETE FROM phrases WHERE phrase_id = ?1", params![phrase_id])?)
        })
        .await
    }
}
