pub mod error;
pub mod store;

pub use error::{EntityKind, StoreError};
pub use store::{PresetsStore, RECENT_PHRASES_LIMIT};
