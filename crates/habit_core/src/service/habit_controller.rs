//! Habit state controller.
//!
//! # Responsibility
//! - Own the authoritative in-memory habit list and loading/error flags.
//! - Apply add-habit and add-log mutations through full-list saves.
//!
//! # Invariants
//! - Memory is replaced only after the repository accepted the save.
//! - A failed `refresh` keeps the previous list; a failed `load` clears it.
//! - Mutations take `&mut self`, so they are serialized by construction.
//! - Every mutation clears the error flag first and records any failure.

use crate::model::avatar::normalize_avatar;
use crate::model::habit::{Habit, HabitId, HabitLog, HabitValidationError, LogOutcome};
use crate::repo::habit_repo::HabitRepository;
use crate::repo::RepoError;
use crate::service::calendar::logs_in_month;
use chrono::{DateTime, Local, NaiveDate, TimeZone};
use log::{error, info};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Errors surfaced by controller operations.
#[derive(Debug)]
pub enum ControllerError {
    /// Input rejected before any persistence.
    Validation(HabitValidationError),
    /// Target habit does not exist in memory.
    HabitNotFound(HabitId),
    /// Stored document could not be read or parsed.
    Load(RepoError),
    /// Stored document could not be written.
    Save(RepoError),
}

impl ControllerError {
    fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::HabitNotFound(_) => "habit_not_found",
            Self::Load(_) => "load_failed",
            Self::Save(_) => "save_failed",
        }
    }
}

impl Display for ControllerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::HabitNotFound(id) => write!(f, "habit not found: {id}"),
            Self::Load(err) => write!(f, "failed to load habits: {err}"),
            Self::Save(err) => write!(f, "failed to save habits: {err}"),
        }
    }
}

impl Error for ControllerError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::HabitNotFound(_) => None,
            Self::Load(err) | Self::Save(err) => Some(err),
        }
    }
}

impl From<HabitValidationError> for ControllerError {
    fn from(value: HabitValidationError) -> Self {
        Self::Validation(value)
    }
}

/// Observable controller phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerPhase {
    /// Initial state and during `load`.
    Loading,
    /// List populated, no error recorded.
    Ready,
    /// Last operation failed; see `error()`.
    Errored,
}

/// In-memory habit state with persistence-backed mutations.
pub struct HabitController<R: HabitRepository> {
    repo: R,
    habits: Vec<Habit>,
    loading: bool,
    error: Option<String>,
}

impl<R: HabitRepository> HabitController<R> {
    /// Creates a controller in the `Loading` phase with no habits.
    pub fn new(repo: R) -> Self {
        Self {
            repo,
            habits: Vec::new(),
            loading: true,
            error: None,
        }
    }

    /// Committed habit list.
    pub fn habits(&self) -> &[Habit] {
        &self.habits
    }

    /// Looks up one committed habit.
    pub fn habit(&self, habit_id: &str) -> Option<&Habit> {
        self.habits.iter().find(|habit| habit.id == habit_id)
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Message of the last recorded failure.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn phase(&self) -> ControllerPhase {
        if self.loading {
            ControllerPhase::Loading
        } else if self.error.is_some() {
            ControllerPhase::Errored
        } else {
            ControllerPhase::Ready
        }
    }

    /// Loads habits from the repository.
    ///
    /// On failure the list is emptied and the error recorded.
    pub fn load(&mut self) -> Result<&[Habit], ControllerError> {
        self.loading = true;
        self.error = None;

        let result = self.repo.load();
        self.loading = false;
        match result {
            Ok(habits) => {
                self.habits = habits;
                Ok(&self.habits)
            }
            Err(err) => {
                self.habits.clear();
                Err(self.record("load", ControllerError::Load(err)))
            }
        }
    }

    /// Reloads habits without entering the `Loading` phase.
    ///
    /// Unlike `load`, a failure keeps the previously committed list.
    pub fn refresh(&mut self) -> Result<&[Habit], ControllerError> {
        self.error = None;
        match self.repo.load() {
            Ok(habits) => {
                self.habits = habits;
                Ok(&self.habits)
            }
            Err(err) => Err(self.record("refresh", ControllerError::Load(err))),
        }
    }

    /// Creates, persists and returns a new habit.
    pub fn add_habit(&mut self, name: &str, avatar: &str) -> Result<Habit, ControllerError> {
        self.error = None;
        let habit = match Habit::new(name, normalize_avatar(avatar)) {
            Ok(habit) => habit,
            Err(err) => return Err(self.record("add_habit", err.into())),
        };

        let mut next = self.habits.clone();
        next.push(habit.clone());
        self.commit("add_habit", next)?;

        info!(
            "event=habit_add module=service status=ok habit_id={} habits={}",
            habit.id,
            self.habits.len()
        );
        Ok(habit)
    }

    /// Records `note` for today in the system timezone.
    pub fn add_log(&mut self, habit_id: &str, note: &str) -> Result<HabitLog, ControllerError> {
        self.add_log_on(habit_id, note, Local::now())
    }

    /// Records `note` for the calendar day of `date` in `date`'s timezone.
    ///
    /// A log already present on that local day gets the note appended on a
    /// new line; otherwise a new completed log is created. The whole list
    /// is saved.
    pub fn add_log_on<Tz: TimeZone>(
        &mut self,
        habit_id: &str,
        note: &str,
        date: DateTime<Tz>,
    ) -> Result<HabitLog, ControllerError> {
        self.error = None;
        let note = note.trim();
        if note.is_empty() {
            return Err(self.record("add_log", HabitValidationError::BlankNote.into()));
        }

        let Some(position) = self.habits.iter().position(|habit| habit.id == habit_id) else {
            return Err(self.record(
                "add_log",
                ControllerError::HabitNotFound(habit_id.to_string()),
            ));
        };

        let mut next = self.habits.clone();
        let (outcome, index) = next[position].record_log(note, date);
        let log = next[position].logs[index].clone();
        self.commit("add_log", next)?;

        info!(
            "event=log_add module=service status=ok habit_id={} log_id={} outcome={}",
            habit_id,
            log.id,
            match outcome {
                LogOutcome::Created => "created",
                LogOutcome::Merged => "merged",
            }
        );
        Ok(log)
    }

    /// Logs of one habit within the month of `month` as seen in `tz`,
    /// newest first.
    pub fn logs_for_month<Tz: TimeZone>(
        &self,
        habit_id: &str,
        month: NaiveDate,
        tz: &Tz,
    ) -> Option<Vec<&HabitLog>> {
        self.habit(habit_id)
            .map(|habit| logs_in_month(&habit.logs, month, tz))
    }

    /// Overwrites storage with the default dataset and reloads it.
    pub fn reset_to_default(&mut self) -> Result<&[Habit], ControllerError> {
        self.error = None;
        if let Err(err) = self.repo.reset_to_default() {
            return Err(self.record("reset", ControllerError::Save(err)));
        }
        self.load()
    }

    fn commit(&mut self, operation: &'static str, next: Vec<Habit>) -> Result<(), ControllerError> {
        match self.repo.save(&next) {
            Ok(()) => {
                self.habits = next;
                Ok(())
            }
            Err(err) => Err(self.record(operation, ControllerError::Save(err))),
        }
    }

    fn record(&mut self, operation: &'static str, err: ControllerError) -> ControllerError {
        error!(
            "event=controller_op module=service status=error op={} error_code={} error={}",
            operation,
            err.code(),
            err
        );
        self.error = Some(err.to_string());
        err
    }
}
