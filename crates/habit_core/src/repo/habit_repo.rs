//! Habit repository contract and key-value implementation.
//!
//! # Responsibility
//! - Load the stored document, seeding defaults on first run.
//! - Save the full habit list as one wrapped document.
//!
//! # Invariants
//! - `load` propagates parse failures; it never substitutes an empty list
//!   for unreadable data.
//! - `reset_to_default` writes the bundled dataset verbatim.

use crate::model::habit::Habit;
use crate::repo::document::{parse_document, render_document};
use crate::repo::RepoResult;
use crate::store::seed::DEFAULT_HABITS_JSON;
use crate::store::{KeyValueStore, StoreAdapter};
use log::{error, info};
use std::time::Instant;

/// Repository interface for the habit list.
pub trait HabitRepository {
    /// Loads and normalizes all stored habits.
    fn load(&self) -> RepoResult<Vec<Habit>>;
    /// Replaces the stored document with `habits`.
    fn save(&self, habits: &[Habit]) -> RepoResult<()>;
    /// Overwrites the stored document with the bundled default dataset.
    fn reset_to_default(&self) -> RepoResult<()>;
}

/// JSON-document repository over a key-value backend.
pub struct KvHabitRepository<S: KeyValueStore> {
    adapter: StoreAdapter<S>,
}

impl<S: KeyValueStore> KvHabitRepository<S> {
    pub fn new(backend: S) -> Self {
        Self {
            adapter: StoreAdapter::new(backend),
        }
    }

    fn load_inner(&self) -> RepoResult<(&'static str, Vec<Habit>)> {
        self.adapter.initialize()?;
        let Some(text) = self.adapter.read()? else {
            return Ok(("absent", Vec::new()));
        };
        let parsed = parse_document(&text)?;
        Ok((parsed.shape, parsed.habits))
    }
}

impl<S: KeyValueStore> HabitRepository for KvHabitRepository<S> {
    fn load(&self) -> RepoResult<Vec<Habit>> {
        let started_at = Instant::now();
        match self.load_inner() {
            Ok((shape, habits)) => {
                info!(
                    "event=habits_load module=repo status=ok shape={} habits={} duration_ms={}",
                    shape,
                    habits.len(),
                    started_at.elapsed().as_millis()
                );
                Ok(habits)
            }
            Err(err) => {
                error!(
                    "event=habits_load module=repo status=error duration_ms={} error={}",
                    started_at.elapsed().as_millis(),
                    err
                );
                Err(err)
            }
        }
    }

    fn save(&self, habits: &[Habit]) -> RepoResult<()> {
        for habit in habits {
            habit.validate()?;
        }

        let payload = render_document(habits)?;
        if let Err(err) = self.adapter.write(&payload) {
            error!(
                "event=habits_save module=repo status=error habits={} error={}",
                habits.len(),
                err
            );
            return Err(err.into());
        }

        info!(
            "event=habits_save module=repo status=ok habits={} bytes={}",
            habits.len(),
            payload.len()
        );
        Ok(())
    }

    fn reset_to_default(&self) -> RepoResult<()> {
        self.adapter.write(DEFAULT_HABITS_JSON)?;
        info!("event=habits_reset module=repo status=ok");
        Ok(())
    }
}

impl<R: HabitRepository + ?Sized> HabitRepository for &R {
    fn load(&self) -> RepoResult<Vec<Habit>> {
        (**self).load()
    }

    fn save(&self, habits: &[Habit]) -> RepoResult<()> {
        (**self).save(habits)
    }

    fn reset_to_default(&self) -> RepoResult<()> {
        (**self).reset_to_default()
    }
}

#[cfg(test)]
mod tests {
    use super::{HabitRepository, KvHabitRepository};
    use crate::store::{MemoryKeyValueStore, HABITS_STORAGE_KEY};

    #[test]
    fn load_from_blank_value_returns_empty_list() {
        let repo = KvHabitRepository::new(MemoryKeyValueStore::with_entry(HABITS_STORAGE_KEY, ""));
        let habits = repo.load().expect("blank value should load");
        assert!(habits.is_empty());
    }

    #[test]
    fn reset_restores_default_dataset() {
        let repo = KvHabitRepository::new(MemoryKeyValueStore::new());
        repo.save(&[]).expect("empty save should succeed");
        assert!(repo.load().expect("empty list should load").is_empty());

        repo.reset_to_default().expect("reset should succeed");
        let names = repo
            .load()
            .expect("default dataset should load")
            .into_iter()
            .map(|habit| habit.name)
            .collect::<Vec<_>>();
        assert_eq!(names, ["Morning Run", "Read", "Drink Water"]);
    }
}
