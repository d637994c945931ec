use std::fmt;

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Phrase,
    Category,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::Phrase => f.write_str("phrase"),
            EntityKind::Category => f.write_str("category"),
        }
    }
}

/// Conditions callers are expected to branch on. Travels inside
/// `anyhow::Error`; recover it with `downcast_ref::<StoreError>()`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("{kind} {id} not found")]
    NotFound { kind: EntityKind, id: String },
    #[error("category {0} is computed on read and cannot own phrases")]
    SyntheticCategory(String),
    #[error("category {0} is built in and cannot be deleted")]
    BuiltInCategory(String),
}

impl StoreError {
    pub fn phrase_not_found(id: i64) -> Self {
        StoreError::NotFound {
            kind: EntityKind::Phrase,
            id: id.to_string(),
        }
    }

    pub fn category_not_found(id: impl Into<String>) -> Self {
        StoreError::NotFound {
            kind: EntityKind::Category,
            id: id.into(),
        }
    }

    /// Whether `err` carries a [`StoreError::NotFound`].
    pub fn is_not_found(err: &anyhow::Error) -> bool {
        matches!(err.downcast_ref::<StoreError>(), Some(StoreError::NotFound { .. }))
    }
}
