//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `habit_core` linkage.
//! - Load the bundled default habits from a throwaway in-memory store.

use habit_core::{HabitController, KvHabitRepository, SqliteKeyValueStore};
use std::process::ExitCode;

fn main() -> ExitCode {
    println!("habit_core ping={}", habit_core::ping());
    println!("habit_core version={}", habit_core::core_version());

    let store = match SqliteKeyValueStore::open_in_memory() {
        Ok(store) => store,
        Err(err) => {
            eprintln!("habit_core store_error={err}");
            return ExitCode::FAILURE;
        }
    };
    let mut controller = HabitController::new(KvHabitRepository::new(store));
    match controller.load() {
        Ok(habits) => {
            for habit in habits {
                println!(
                    "habit_core habit={} {} logs={}",
                    habit.avatar,
                    habit.name,
                    habit.logs.len()
                );
            }
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("habit_core load_error={err}");
            ExitCode::FAILURE
        }
    }
}
