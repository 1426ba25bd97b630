//! Key-value persistence for the serialized habit document.
//!
//! # Responsibility
//! - Define the byte-oriented `KeyValueStore` contract and its backends.
//! - Wrap one fixed key behind `StoreAdapter` with first-run seeding.
//!
//! # Invariants
//! - Backends never inspect or validate stored payloads.
//! - `set` is a full overwrite of the previous value.

use crate::db::DbError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod adapter;
pub mod memory_store;
pub mod seed;
pub mod sqlite_store;

pub use adapter::{StoreAdapter, HABITS_STORAGE_KEY};
pub use memory_store::MemoryKeyValueStore;
pub use sqlite_store::SqliteKeyValueStore;

pub type StoreResult<T> = Result<T, StoreError>;

/// Backend failure while reading or writing a key.
#[derive(Debug)]
pub enum StoreError {
    Db(DbError),
    /// Backend cannot serve requests right now.
    Unavailable(String),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Unavailable(message) => write!(f, "storage unavailable: {message}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Unavailable(_) => None,
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// String key-value backend.
pub trait KeyValueStore {
    /// Returns the value stored at `key`, or `None` when absent.
    fn get(&self, key: &str) -> StoreResult<Option<String>>;
    /// Stores `value` at `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> StoreResult<()>;
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for &S {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        (**self).set(key, value)
    }
}
