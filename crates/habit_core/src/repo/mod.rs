//! Repository layer: habit document persistence and normalization.
//!
//! # Responsibility
//! - Translate between the stored document and canonical `Habit` values.
//! - Keep serialization details out of the controller.
//!
//! # Invariants
//! - Repositories hold no habit state of their own.
//! - Every save is a full-replace write of the whole list.
//! - Read and write paths both enforce `Habit::validate()`.

use crate::model::habit::HabitValidationError;
use crate::store::StoreError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod document;
pub mod habit_repo;

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for loading or saving the habit document.
#[derive(Debug)]
pub enum RepoError {
    Store(StoreError),
    /// Stored text is not valid JSON or does not match the record layout.
    Parse(serde_json::Error),
    InvalidData(String),
    Validation(HabitValidationError),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Store(err) => write!(f, "{err}"),
            Self::Parse(err) => write!(f, "malformed habit document: {err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted habit data: {message}"),
            Self::Validation(err) => write!(f, "{err}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            Self::Parse(err) => Some(err),
            Self::InvalidData(_) => None,
            Self::Validation(err) => Some(err),
        }
    }
}

impl From<StoreError> for RepoError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

impl From<serde_json::Error> for RepoError {
    fn from(value: serde_json::Error) -> Self {
        Self::Parse(value)
    }
}

impl From<HabitValidationError> for RepoError {
    fn from(value: HabitValidationError) -> Self {
        Self::Validation(value)
    }
}
