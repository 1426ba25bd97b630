//! Bundled default dataset written on first run or explicit reset.

/// Default habit document in the wrapped `{ "habits": [...] }` shape.
pub const DEFAULT_HABITS_JSON: &str = include_str!("default_habits.json");
