//! Habit domain model.
//!
//! # Responsibility
//! - Define canonical habit/log records used by core business logic.
//! - Keep input normalization rules (names, avatars) next to the data.
//!
//! # Invariants
//! - Every habit and log is identified by a stable string id.
//! - Habits and logs are never hard-deleted by core operations.

pub mod avatar;
pub mod habit;
