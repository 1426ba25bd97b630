//! Habit and habit-log domain model.
//!
//! # Responsibility
//! - Define the canonical in-memory records shared by repository,
//!   controller and FFI layers.
//! - Own the same-day merge rule for log entries.
//!
//! # Invariants
//! - `Habit::name` is never blank.
//! - Every log carries its owning habit's id as `habit_id`.
//! - Log ids are unique within one habit.
//! - At most one log per local calendar day is created by `Habit::record_log`,
//!   where "local" is the timezone of the date passed in.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Identifier for habits and logs.
///
/// Plain strings: legacy stores carry timestamp-derived ids, new records
/// use UUID v4 text.
pub type HabitId = String;

/// Generates a fresh collision-resistant identifier.
pub fn new_id() -> HabitId {
    Uuid::new_v4().to_string()
}

/// Validation failures for habit records and user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HabitValidationError {
    /// Habit or log id is empty.
    EmptyId,
    /// Habit name is blank after trim.
    BlankName,
    /// Log note is blank after trim.
    BlankNote,
    /// A log references another habit.
    ForeignLog { log_id: HabitId, habit_id: HabitId },
    /// Two logs in one habit share an id.
    DuplicateLogId(HabitId),
}

impl Display for HabitValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyId => write!(f, "id must not be empty"),
            Self::BlankName => write!(f, "habit name must not be blank"),
            Self::BlankNote => write!(f, "log note must not be blank"),
            Self::ForeignLog { log_id, habit_id } => {
                write!(f, "log {log_id} belongs to habit {habit_id}")
            }
            Self::DuplicateLogId(id) => write!(f, "duplicate log id: {id}"),
        }
    }
}

impl Error for HabitValidationError {}

/// One dated progress entry for a habit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HabitLog {
    pub id: HabitId,
    /// Owning habit id.
    pub habit_id: HabitId,
    /// Instant of the entry. The calendar day depends on the viewer's
    /// timezone, see [`HabitLog::day_in`].
    pub date: DateTime<Utc>,
    pub notes: String,
    pub completed: bool,
}

impl HabitLog {
    /// Creates a completed log with a generated id.
    pub fn new(habit_id: impl Into<HabitId>, notes: impl Into<String>, date: DateTime<Utc>) -> Self {
        Self {
            id: new_id(),
            habit_id: habit_id.into(),
            date,
            notes: notes.into(),
            completed: true,
        }
    }

    /// Calendar day this log counts for, as seen in `tz`.
    pub fn day_in<Tz: TimeZone>(&self, tz: &Tz) -> NaiveDate {
        self.date.with_timezone(tz).date_naive()
    }

    /// Appends `note` after a newline separator.
    pub fn append_note(&mut self, note: &str) {
        self.notes.push('\n');
        self.notes.push_str(note);
    }
}

/// Outcome of recording a note against a habit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogOutcome {
    /// A new log entry was appended.
    Created,
    /// The note was merged into an existing same-day entry.
    Merged,
}

/// A user-defined recurring activity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Habit {
    pub id: HabitId,
    pub name: String,
    /// Single glyph shown next to the name.
    pub avatar: String,
    pub created_at: DateTime<Utc>,
    pub logs: Vec<HabitLog>,
}

impl Habit {
    /// Creates a habit with a generated id, created now, without logs.
    ///
    /// `name` is trimmed; blank names are rejected.
    pub fn new(
        name: impl Into<String>,
        avatar: impl Into<String>,
    ) -> Result<Self, HabitValidationError> {
        Self::with_id(new_id(), name, avatar, Utc::now())
    }

    /// Creates a habit with caller-provided identity and creation time.
    ///
    /// Used by load paths where identity already exists.
    pub fn with_id(
        id: impl Into<HabitId>,
        name: impl Into<String>,
        avatar: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Result<Self, HabitValidationError> {
        let habit = Self {
            id: id.into(),
            name: name.into().trim().to_string(),
            avatar: avatar.into(),
            created_at,
            logs: Vec::new(),
        };
        habit.validate()?;
        Ok(habit)
    }

    /// Checks record invariants.
    pub fn validate(&self) -> Result<(), HabitValidationError> {
        if self.id.is_empty() {
            return Err(HabitValidationError::EmptyId);
        }
        if self.name.trim().is_empty() {
            return Err(HabitValidationError::BlankName);
        }

        let mut seen = HashSet::with_capacity(self.logs.len());
        for log in &self.logs {
            if log.id.is_empty() {
                return Err(HabitValidationError::EmptyId);
            }
            if log.habit_id != self.id {
                return Err(HabitValidationError::ForeignLog {
                    log_id: log.id.clone(),
                    habit_id: log.habit_id.clone(),
                });
            }
            if !seen.insert(log.id.as_str()) {
                return Err(HabitValidationError::DuplicateLogId(log.id.clone()));
            }
        }
        Ok(())
    }

    /// Records `note` for the calendar day of `date` in its own timezone.
    ///
    /// Merges into an existing log on the same local day when present,
    /// otherwise appends a new completed log. Returns the outcome and the
    /// index of the affected log.
    pub fn record_log<Tz: TimeZone>(
        &mut self,
        note: &str,
        date: DateTime<Tz>,
    ) -> (LogOutcome, usize) {
        let tz = date.timezone();
        let day = date.date_naive();
        if let Some(index) = self.logs.iter().position(|log| log.day_in(&tz) == day) {
            self.logs[index].append_note(note);
            return (LogOutcome::Merged, index);
        }

        self.logs
            .push(HabitLog::new(self.id.clone(), note, date.with_timezone(&Utc)));
        (LogOutcome::Created, self.logs.len() - 1)
    }
}
