//! Single-key adapter over a key-value backend.
//!
//! # Responsibility
//! - Read and write the serialized habit document under one fixed key.
//! - Seed the bundled default dataset on first run.
//!
//! # Invariants
//! - `initialize` never overwrites an existing value.
//! - No payload validation happens here.

use crate::store::seed::DEFAULT_HABITS_JSON;
use crate::store::{KeyValueStore, StoreResult};
use log::info;

/// Key holding the serialized habit document.
pub const HABITS_STORAGE_KEY: &str = "habits_data";

/// Persistent store adapter bound to [`HABITS_STORAGE_KEY`].
pub struct StoreAdapter<S: KeyValueStore> {
    backend: S,
}

impl<S: KeyValueStore> StoreAdapter<S> {
    pub fn new(backend: S) -> Self {
        Self { backend }
    }

    /// Writes the default dataset when the key is absent. Idempotent.
    ///
    /// Returns whether seeding happened.
    pub fn initialize(&self) -> StoreResult<bool> {
        if self.backend.get(HABITS_STORAGE_KEY)?.is_some() {
            return Ok(false);
        }

        self.backend.set(HABITS_STORAGE_KEY, DEFAULT_HABITS_JSON)?;
        info!(
            "event=store_seed module=store status=ok key={} bytes={}",
            HABITS_STORAGE_KEY,
            DEFAULT_HABITS_JSON.len()
        );
        Ok(true)
    }

    /// Returns the raw stored document, or `None` when absent.
    pub fn read(&self) -> StoreResult<Option<String>> {
        self.backend.get(HABITS_STORAGE_KEY)
    }

    /// Stores `payload`, unconditionally overwriting.
    pub fn write(&self, payload: &str) -> StoreResult<()> {
        self.backend.set(HABITS_STORAGE_KEY, payload)
    }
}
