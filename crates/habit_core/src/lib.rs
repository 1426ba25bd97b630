//! Core domain logic for the habit tracker.
//! This crate is the single source of truth for habit/log invariants.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod store;

pub use logging::{default_log_level, init_logging, logging_status};
pub use model::avatar::{normalize_avatar, AVATAR_PALETTE, DEFAULT_AVATAR};
pub use model::habit::{Habit, HabitId, HabitLog, HabitValidationError, LogOutcome};
pub use repo::habit_repo::{HabitRepository, KvHabitRepository};
pub use repo::{RepoError, RepoResult};
pub use service::calendar::{
    logs_in_month, month_key, month_label, recent_months, shift_month, MONTH_PICKER_SPAN,
};
pub use service::habit_controller::{ControllerError, ControllerPhase, HabitController};
pub use store::{
    KeyValueStore, MemoryKeyValueStore, SqliteKeyValueStore, StoreAdapter, StoreError,
    HABITS_STORAGE_KEY,
};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
