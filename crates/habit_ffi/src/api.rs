//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose habit use-cases to Dart via FRB.
//! - Hold the single process-wide habit controller.
//!
//! # Invariants
//! - Exported functions must not panic across FFI boundary.
//! - All controller access is serialized through one mutex.
//! - Dates cross the boundary as UTC epoch milliseconds.
//! - Calendar days are resolved in the caller's timezone, passed as
//!   `offset_minutes` east of UTC.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, TimeZone, Utc};
use habit_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, month_key,
    month_label, ping as ping_inner, recent_months, Habit, HabitController, HabitLog,
    KvHabitRepository, SqliteKeyValueStore, AVATAR_PALETTE, MONTH_PICKER_SPAN,
};
use log::{info, warn};
use std::path::PathBuf;
use std::sync::{Mutex, OnceLock};

const HABIT_DB_FILE_NAME: &str = "habit_tracker.sqlite3";

type SharedController = HabitController<KvHabitRepository<SqliteKeyValueStore>>;

static HABIT_DB_PATH: OnceLock<PathBuf> = OnceLock::new();
static CONTROLLER: OnceLock<Mutex<Option<SharedController>>> = OnceLock::new();

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir`.
/// - Never panics; returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// One log entry as seen by the UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HabitLogItem {
    pub log_id: String,
    pub habit_id: String,
    pub date_epoch_ms: i64,
    pub notes: String,
    pub completed: bool,
}

/// One habit with its logs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HabitItem {
    pub habit_id: String,
    pub name: String,
    pub avatar: String,
    pub created_at_epoch_ms: i64,
    pub logs: Vec<HabitLogItem>,
}

/// Snapshot of controller state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HabitsResponse {
    /// Whether the requested operation succeeded.
    pub ok: bool,
    /// Committed habit list (kept on refresh failure).
    pub items: Vec<HabitItem>,
    pub loading: bool,
    /// Controller error flag.
    pub error: Option<String>,
    /// Human-readable response message for diagnostics.
    pub message: String,
}

/// Result of one mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HabitActionResponse {
    pub ok: bool,
    pub habit_id: Option<String>,
    pub log_id: Option<String>,
    /// Human-readable response message for alerts.
    pub message: String,
}

impl HabitActionResponse {
    fn success(message: impl Into<String>, habit_id: String, log_id: Option<String>) -> Self {
        Self {
            ok: true,
            habit_id: Some(habit_id),
            log_id,
            message: message.into(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            habit_id: None,
            log_id: None,
            message: message.into(),
        }
    }
}

/// Month-filtered logs of one habit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthLogsResponse {
    pub ok: bool,
    /// Newest first.
    pub items: Vec<HabitLogItem>,
    pub message: String,
}

/// Entry of the month picker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthOption {
    /// `YYYY-MM`
    pub key: String,
    /// `March 2025`
    pub label: String,
    /// First day of the month, local midnight.
    pub first_day_epoch_ms: i64,
}

/// Loads habits, entering the loading phase.
///
/// # FFI contract
/// - Opens the store on first call.
/// - On failure, returns an empty list and the error message.
#[flutter_rust_bridge::frb(sync)]
pub fn habits_load() -> HabitsResponse {
    with_controller(|controller| {
        let outcome = controller.load().map(|_| ()).map_err(|err| err.to_string());
        snapshot(controller, outcome)
    })
    .unwrap_or_else(store_unavailable)
}

/// Reloads habits without entering the loading phase.
///
/// On failure the previous list is returned together with the error.
#[flutter_rust_bridge::frb(sync)]
pub fn habits_refresh() -> HabitsResponse {
    with_controller(|controller| {
        let outcome = controller
            .refresh()
            .map(|_| ())
            .map_err(|err| err.to_string());
        snapshot(controller, outcome)
    })
    .unwrap_or_else(store_unavailable)
}

/// Creates a habit from the add-habit form.
#[flutter_rust_bridge::frb(sync)]
pub fn habit_add(name: String, avatar: String) -> HabitActionResponse {
    let result = with_controller(|controller| {
        controller
            .add_habit(name.as_str(), avatar.as_str())
            .map_err(|err| err.to_string())
    })
    .and_then(|inner| inner);

    match result {
        Ok(habit) => HabitActionResponse::success("Habit created.", habit.id, None),
        Err(err) => HabitActionResponse::failure(format!("habit_add failed: {err}")),
    }
}

/// Records a note for one habit.
///
/// `date_epoch_ms = None` means now. A note on a local day that already
/// has a log is appended to that log.
#[flutter_rust_bridge::frb(sync)]
pub fn habit_add_log(
    habit_id: String,
    note: String,
    date_epoch_ms: Option<i64>,
    offset_minutes: i32,
) -> HabitActionResponse {
    let offset = match resolve_offset(offset_minutes) {
        Ok(offset) => offset,
        Err(err) => return HabitActionResponse::failure(format!("habit_add_log failed: {err}")),
    };
    let date = match date_epoch_ms {
        Some(millis) => match local_instant(millis, &offset) {
            Some(date) => date,
            None => {
                return HabitActionResponse::failure(format!(
                    "habit_add_log failed: date out of range: {millis}"
                ))
            }
        },
        None => Utc::now().with_timezone(&offset),
    };

    let result = with_controller(|controller| {
        controller
            .add_log_on(habit_id.as_str(), note.as_str(), date)
            .map_err(|err| err.to_string())
    })
    .and_then(|inner| inner);

    match result {
        Ok(log) => HabitActionResponse::success("Log saved.", log.habit_id, Some(log.id)),
        Err(err) => HabitActionResponse::failure(format!("habit_add_log failed: {err}")),
    }
}

/// Logs of one habit in the local month containing `month_epoch_ms`.
#[flutter_rust_bridge::frb(sync)]
pub fn habit_logs_for_month(
    habit_id: String,
    month_epoch_ms: i64,
    offset_minutes: i32,
) -> MonthLogsResponse {
    let offset = match resolve_offset(offset_minutes) {
        Ok(offset) => offset,
        Err(err) => {
            return MonthLogsResponse {
                ok: false,
                items: Vec::new(),
                message: format!("habit_logs_for_month failed: {err}"),
            }
        }
    };
    let Some(month) = local_instant(month_epoch_ms, &offset).map(|date| date.date_naive()) else {
        return MonthLogsResponse {
            ok: false,
            items: Vec::new(),
            message: format!("habit_logs_for_month failed: date out of range: {month_epoch_ms}"),
        };
    };

    let result = with_controller(|controller| {
        controller
            .logs_for_month(habit_id.as_str(), month, &offset)
            .map(|logs| logs.into_iter().map(to_log_item).collect::<Vec<_>>())
    });

    match result {
        Ok(Some(items)) => MonthLogsResponse {
            message: if items.is_empty() {
                "No logs for this month.".to_string()
            } else {
                format!("Found {} log(s).", items.len())
            },
            ok: true,
            items,
        },
        Ok(None) => MonthLogsResponse {
            ok: false,
            items: Vec::new(),
            message: format!("habit_logs_for_month failed: habit not found: {habit_id}"),
        },
        Err(err) => MonthLogsResponse {
            ok: false,
            items: Vec::new(),
            message: format!("habit_logs_for_month failed: {err}"),
        },
    }
}

/// Month picker entries: the anchor month and the 23 before it.
///
/// `anchor_epoch_ms = None` anchors on the current local month. An
/// invalid `offset_minutes` yields no options.
#[flutter_rust_bridge::frb(sync)]
pub fn habit_month_options(
    anchor_epoch_ms: Option<i64>,
    offset_minutes: i32,
) -> Vec<MonthOption> {
    let offset = match resolve_offset(offset_minutes) {
        Ok(offset) => offset,
        Err(err) => {
            warn!("event=ffi_month_options module=ffi status=error error={err}");
            return Vec::new();
        }
    };
    let anchor = anchor_epoch_ms
        .and_then(|millis| local_instant(millis, &offset))
        .unwrap_or_else(|| Utc::now().with_timezone(&offset))
        .date_naive();

    recent_months(anchor, MONTH_PICKER_SPAN)
        .into_iter()
        .filter_map(|first_day| {
            let first_day_epoch_ms = local_midnight_epoch_ms(first_day, &offset)?;
            Some(MonthOption {
                key: month_key(first_day),
                label: month_label(first_day),
                first_day_epoch_ms,
            })
        })
        .collect()
}

/// Overwrites storage with the bundled default dataset and reloads it.
#[flutter_rust_bridge::frb(sync)]
pub fn habits_reset_to_default() -> HabitsResponse {
    with_controller(|controller| {
        let outcome = controller
            .reset_to_default()
            .map(|_| ())
            .map_err(|err| err.to_string());
        snapshot(controller, outcome)
    })
    .unwrap_or_else(store_unavailable)
}

/// Avatar glyphs offered by the add-habit form.
#[flutter_rust_bridge::frb(sync)]
pub fn avatar_options() -> Vec<String> {
    AVATAR_PALETTE
        .iter()
        .map(|avatar| (*avatar).to_string())
        .collect()
}

fn with_controller<T>(f: impl FnOnce(&mut SharedController) -> T) -> Result<T, String> {
    let cell = CONTROLLER.get_or_init(|| Mutex::new(None));
    // A panic inside a previous call leaves committed state consistent.
    let mut guard = cell.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

    if guard.is_none() {
        let db_path = resolve_habit_db_path();
        let store = SqliteKeyValueStore::open(&db_path)
            .map_err(|err| format!("habit store open failed: {err}"))?;
        let mut controller = HabitController::new(KvHabitRepository::new(store));
        // Load errors stay visible through the controller's error flag.
        let _ = controller.load();
        info!(
            "event=ffi_controller_init module=ffi status=ok habits={}",
            controller.habits().len()
        );
        *guard = Some(controller);
    }

    match guard.as_mut() {
        Some(controller) => Ok(f(controller)),
        None => Err("habit controller unavailable".to_string()),
    }
}

fn resolve_habit_db_path() -> PathBuf {
    HABIT_DB_PATH
        .get_or_init(|| {
            if let Ok(raw) = std::env::var("HABIT_DB_PATH") {
                let trimmed = raw.trim();
                if !trimmed.is_empty() {
                    return PathBuf::from(trimmed);
                }
            }
            std::env::temp_dir().join(HABIT_DB_FILE_NAME)
        })
        .clone()
}

fn snapshot(controller: &SharedController, outcome: Result<(), String>) -> HabitsResponse {
    let items = controller.habits().iter().map(to_habit_item).collect();
    let (ok, message) = match outcome {
        Ok(()) => (true, format!("Loaded {} habit(s).", controller.habits().len())),
        Err(err) => (false, err),
    };
    HabitsResponse {
        ok,
        items,
        loading: controller.is_loading(),
        error: controller.error().map(str::to_string),
        message,
    }
}

fn store_unavailable(message: String) -> HabitsResponse {
    HabitsResponse {
        ok: false,
        items: Vec::new(),
        loading: false,
        error: Some(message.clone()),
        message,
    }
}

fn to_habit_item(habit: &Habit) -> HabitItem {
    HabitItem {
        habit_id: habit.id.clone(),
        name: habit.name.clone(),
        avatar: habit.avatar.clone(),
        created_at_epoch_ms: habit.created_at.timestamp_millis(),
        logs: habit.logs.iter().map(to_log_item).collect(),
    }
}

fn to_log_item(log: &HabitLog) -> HabitLogItem {
    HabitLogItem {
        log_id: log.id.clone(),
        habit_id: log.habit_id.clone(),
        date_epoch_ms: log.date.timestamp_millis(),
        notes: log.notes.clone(),
        completed: log.completed,
    }
}

fn resolve_offset(offset_minutes: i32) -> Result<FixedOffset, String> {
    offset_minutes
        .checked_mul(60)
        .and_then(FixedOffset::east_opt)
        .ok_or_else(|| format!("utc offset out of range: {offset_minutes} minutes"))
}

fn local_instant(millis: i64, offset: &FixedOffset) -> Option<DateTime<FixedOffset>> {
    DateTime::from_timestamp_millis(millis).map(|date| date.with_timezone(offset))
}

fn local_midnight_epoch_ms(day: NaiveDate, offset: &FixedOffset) -> Option<i64> {
    offset
        .from_local_datetime(&day.and_time(NaiveTime::MIN))
        .single()
        .map(|date| date.timestamp_millis())
}

#[cfg(test)]
mod tests {
    use super::{
        avatar_options, core_version, habit_add, habit_add_log, habit_logs_for_month,
        habit_month_options, habits_load, habits_refresh, init_logging, ping,
    };
    use std::time::{SystemTime, UNIX_EPOCH};

    // 2025-03-15T09:00:00Z and 2025-03-15T21:00:00Z
    const MARCH_15_MORNING: i64 = 1_742_029_200_000;
    const MARCH_15_EVENING: i64 = 1_742_072_400_000;
    // 2025-03-31T23:00:00Z and 2025-04-01T01:00:00Z, both April 1st in UTC+09:00.
    const TOKYO_APRIL_1_EARLY: i64 = 1_743_462_000_000;
    const TOKYO_APRIL_1_LATER: i64 = 1_743_469_200_000;
    const TOKYO_OFFSET_MINUTES: i32 = 9 * 60;

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }

    #[test]
    fn init_logging_rejects_empty_log_dir() {
        let error = init_logging("info".to_string(), String::new());
        assert!(!error.is_empty());
    }

    #[test]
    fn init_logging_rejects_unsupported_level() {
        let error = init_logging("verbose".to_string(), "tmp/logs".to_string());
        assert!(!error.is_empty());
    }

    #[test]
    fn habit_add_is_visible_after_refresh() {
        let name = unique_token("ffi-habit");
        let created = habit_add(name.clone(), "📚".to_string());
        assert!(created.ok, "{}", created.message);
        let habit_id = created.habit_id.expect("created habit should return id");

        let response = habits_refresh();
        assert!(response.ok, "{}", response.message);
        assert!(response
            .items
            .iter()
            .any(|item| item.habit_id == habit_id && item.name == name));

        let loaded = habits_load();
        assert!(!loaded.loading);
        assert!(loaded.items.iter().any(|item| item.habit_id == habit_id));
    }

    #[test]
    fn habit_add_log_merges_same_day_notes() {
        let created = habit_add(unique_token("ffi-log"), "🎯".to_string());
        let habit_id = created.habit_id.expect("created habit should return id");

        let first = habit_add_log(
            habit_id.clone(),
            "one".to_string(),
            Some(MARCH_15_MORNING),
            0,
        );
        let second = habit_add_log(
            habit_id.clone(),
            "two".to_string(),
            Some(MARCH_15_EVENING),
            0,
        );
        assert!(first.ok, "{}", first.message);
        assert!(second.ok, "{}", second.message);
        assert_eq!(first.log_id, second.log_id);

        let month = habit_logs_for_month(habit_id, MARCH_15_MORNING, 0);
        assert!(month.ok, "{}", month.message);
        assert_eq!(month.items.len(), 1);
        assert_eq!(month.items[0].notes, "one\ntwo");
    }

    #[test]
    fn habit_add_log_groups_by_caller_local_day() {
        let created = habit_add(unique_token("ffi-tokyo"), "📚".to_string());
        let habit_id = created.habit_id.expect("created habit should return id");

        let first = habit_add_log(
            habit_id.clone(),
            "morning".to_string(),
            Some(TOKYO_APRIL_1_EARLY),
            TOKYO_OFFSET_MINUTES,
        );
        let second = habit_add_log(
            habit_id.clone(),
            "later".to_string(),
            Some(TOKYO_APRIL_1_LATER),
            TOKYO_OFFSET_MINUTES,
        );
        assert!(first.ok, "{}", first.message);
        assert!(second.ok, "{}", second.message);
        assert_eq!(first.log_id, second.log_id);

        let april = habit_logs_for_month(
            habit_id.clone(),
            TOKYO_APRIL_1_EARLY,
            TOKYO_OFFSET_MINUTES,
        );
        assert_eq!(april.items.len(), 1);
        assert_eq!(april.items[0].notes, "morning\nlater");

        let march = habit_logs_for_month(habit_id, MARCH_15_MORNING, TOKYO_OFFSET_MINUTES);
        assert!(march.ok, "{}", march.message);
        assert!(march.items.is_empty());
    }

    #[test]
    fn habit_add_log_rejects_out_of_range_offset() {
        let created = habit_add(unique_token("ffi-offset"), "🎯".to_string());
        let habit_id = created.habit_id.expect("created habit should return id");

        let response = habit_add_log(habit_id, "note".to_string(), None, 48 * 60);
        assert!(!response.ok);
        assert!(response.message.contains("offset"));
    }

    #[test]
    fn habit_add_rejects_blank_name() {
        let response = habit_add("   ".to_string(), "🎯".to_string());
        assert!(!response.ok);
        assert!(response.message.contains("name"));
    }

    #[test]
    fn habit_add_log_rejects_unknown_habit() {
        let response = habit_add_log(unique_token("missing"), "note".to_string(), None, 0);
        assert!(!response.ok);
        assert!(response.message.contains("habit not found"));
    }

    #[test]
    fn habit_logs_for_month_reports_unknown_habit() {
        let response = habit_logs_for_month(unique_token("missing"), MARCH_15_MORNING, 0);
        assert!(!response.ok);
        assert!(response.items.is_empty());
    }

    #[test]
    fn month_options_cover_two_years_newest_first() {
        let options = habit_month_options(Some(MARCH_15_MORNING), 0);
        assert_eq!(options.len(), 24);
        assert_eq!(options[0].key, "2025-03");
        assert_eq!(options[0].label, "March 2025");
        assert_eq!(options[23].key, "2023-04");
        assert!(options
            .windows(2)
            .all(|pair| pair[0].first_day_epoch_ms > pair[1].first_day_epoch_ms));
    }

    #[test]
    fn month_options_anchor_on_local_month() {
        let options = habit_month_options(Some(TOKYO_APRIL_1_EARLY), TOKYO_OFFSET_MINUTES);
        assert_eq!(options[0].key, "2025-04");
        // 2025-04-01T00:00+09:00
        assert_eq!(options[0].first_day_epoch_ms, 1_743_433_200_000);

        assert_eq!(habit_month_options(Some(TOKYO_APRIL_1_EARLY), 0)[0].key, "2025-03");
    }

    #[test]
    fn avatar_options_include_default() {
        assert!(avatar_options().iter().any(|avatar| avatar == "🎯"));
    }

    fn unique_token(prefix: &str) -> String {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("time went backwards")
            .as_nanos();
        format!("{prefix}-{nanos}")
    }
}
