use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};

use crate::db::models::LocalizedText;

pub fn parse_datetime(value: &str, field: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .with_context(|| format!("failed to parse {field}"))
}

pub fn from_millis(value: i64, field: &str) -> Result<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp_millis(value)
        .ok_or_else(|| anyhow!("{field} timestamp {value} is out of range"))
}

pub fn from_optional_millis(value: Option<i64>, field: &str) -> Result<Option<DateTime<Utc>>> {
    value.map(|ms| from_millis(ms, field)).transpose()
}

pub fn encode_localized(text: &LocalizedText) -> Result<String> {
    serde_json::to_string(text).context("failed to encode localized text")
}

pub fn decode_localized(value: &str, field: &str) -> Result<LocalizedText> {
    serde_json::from_str(value).with_context(|| format!("failed to decode {field}"))
}

pub fn decode_optional_localized(value: Option<String>, field: &str) -> Result<Option<LocalizedText>> {
    value.map(|raw| decode_localized(&raw, field)).transpose()
}
