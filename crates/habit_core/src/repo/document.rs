//! Stored habit document codec.
//!
//! # Responsibility
//! - Classify a stored JSON document into one of the accepted shapes.
//! - Convert stored records into canonical `Habit` values and back.
//!
//! # Invariants
//! - Accepted shapes are tried in order: bare list, `{ "habits": [...] }`,
//!   single habit object. Anything else is rejected.
//! - Rendered documents always use the wrapped shape with millisecond
//!   RFC 3339 UTC dates.
//! - Loaded logs always carry their owning habit id.
//! - Loaded log ids are unique within their habit; colliding or empty
//!   legacy ids are replaced with fresh ones.

use crate::model::habit::{new_id, Habit, HabitLog};
use crate::repo::{RepoError, RepoResult};
use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;

/// Top-level layout of a stored document.
#[derive(Debug, Clone, PartialEq)]
pub enum DocumentShape {
    /// `[ habit, ... ]`
    List(Vec<Value>),
    /// `{ "habits": [ habit, ... ] }`
    Wrapped(Vec<Value>),
    /// `{ "id": ..., "name": ..., ... }`
    Single(Map<String, Value>),
}

impl DocumentShape {
    /// Short label used in log events.
    pub fn label(&self) -> &'static str {
        match self {
            Self::List(_) => "list",
            Self::Wrapped(_) => "wrapped",
            Self::Single(_) => "single",
        }
    }

    fn into_entries(self) -> Vec<Value> {
        match self {
            Self::List(items) | Self::Wrapped(items) => items,
            Self::Single(object) => vec![Value::Object(object)],
        }
    }
}

/// Classifies a parsed JSON value into a [`DocumentShape`].
pub fn classify_document(value: Value) -> RepoResult<DocumentShape> {
    match value {
        Value::Array(items) => Ok(DocumentShape::List(items)),
        Value::Object(mut object) => match object.remove("habits") {
            Some(Value::Array(items)) => Ok(DocumentShape::Wrapped(items)),
            Some(other) => {
                // Not a wrapper after all; keep the field for the single-habit parse.
                object.insert("habits".to_string(), other);
                Ok(DocumentShape::Single(object))
            }
            None => Ok(DocumentShape::Single(object)),
        },
        other => Err(RepoError::InvalidData(format!(
            "unsupported document root: expected list or object, got {}",
            json_kind(&other)
        ))),
    }
}

/// Canonical habits decoded from one stored document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedDocument {
    /// Label of the shape the document was stored in.
    pub shape: &'static str,
    pub habits: Vec<Habit>,
}

/// Parses stored text into canonical habits.
///
/// Blank text is treated as an empty store.
pub fn parse_document(text: &str) -> RepoResult<ParsedDocument> {
    if text.trim().is_empty() {
        return Ok(ParsedDocument {
            shape: "empty",
            habits: Vec::new(),
        });
    }

    let value: Value = serde_json::from_str(text)?;
    let shape = classify_document(value)?;
    let label = shape.label();
    let habits = shape
        .into_entries()
        .into_iter()
        .map(habit_from_value)
        .collect::<RepoResult<Vec<_>>>()?;
    Ok(ParsedDocument {
        shape: label,
        habits,
    })
}

/// Renders habits as a wrapped, storage-safe document.
pub fn render_document(habits: &[Habit]) -> RepoResult<String> {
    let document = DocumentRecord {
        habits: habits.iter().map(HabitRecord::from).collect(),
    };
    Ok(serde_json::to_string(&document)?)
}

/// Formats a date-time the way stored documents carry it.
pub fn format_stored_date(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parses a stored date string.
///
/// Accepts RFC 3339, zone-less `YYYY-MM-DDTHH:MM:SS[.fff]` (read as UTC)
/// and bare `YYYY-MM-DD` (UTC midnight).
pub fn parse_stored_date(text: &str) -> Option<DateTime<Utc>> {
    let trimmed = text.trim();
    if let Ok(value) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(value.with_timezone(&Utc));
    }
    if let Ok(value) = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(value.and_utc());
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .and_then(|day| day.and_hms_opt(0, 0, 0))
        .map(|value| value.and_utc())
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum StoredId {
    Text(String),
    Number(serde_json::Number),
}

impl StoredId {
    fn into_string(self) -> String {
        match self {
            Self::Text(text) => text,
            Self::Number(number) => number.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum StoredDate {
    Text(String),
    EpochMillis(i64),
}

impl StoredDate {
    fn resolve(&self, field: &str, owner: &str) -> RepoResult<DateTime<Utc>> {
        let parsed = match self {
            Self::Text(text) => parse_stored_date(text),
            Self::EpochMillis(millis) => DateTime::from_timestamp_millis(*millis),
        };
        parsed.ok_or_else(|| {
            RepoError::InvalidData(format!("invalid {field} value for `{owner}`"))
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredHabit {
    id: StoredId,
    name: String,
    #[serde(default)]
    avatar: Option<String>,
    created_at: StoredDate,
    #[serde(default)]
    logs: Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredLog {
    id: StoredId,
    #[serde(default)]
    habit_id: Option<StoredId>,
    date: StoredDate,
    #[serde(default)]
    notes: Option<String>,
    #[serde(default)]
    completed: Option<bool>,
}

fn habit_from_value(value: Value) -> RepoResult<Habit> {
    let stored: StoredHabit = serde_json::from_value(value)?;
    let id = stored.id.into_string();
    let created_at = stored.created_at.resolve("createdAt", &id)?;

    let mut logs = match stored.logs {
        Value::Array(items) => items
            .into_iter()
            .map(|item| log_from_value(item, &id))
            .collect::<RepoResult<Vec<_>>>()?,
        _ => Vec::new(),
    };
    repair_log_ids(&id, &mut logs);

    let habit = Habit {
        id,
        name: stored.name,
        avatar: stored.avatar.unwrap_or_default(),
        created_at,
        logs,
    };
    habit.validate()?;
    Ok(habit)
}

fn log_from_value(value: Value, habit_id: &str) -> RepoResult<HabitLog> {
    let stored: StoredLog = serde_json::from_value(value)?;
    let id = stored.id.into_string();
    let date = stored.date.resolve("date", &id)?;

    if let Some(declared) = stored.habit_id.map(StoredId::into_string) {
        if declared != habit_id {
            log::warn!(
                "event=log_owner_repaired module=repo status=warn log_id={id} declared={declared} owner={habit_id}"
            );
        }
    }

    Ok(HabitLog {
        id,
        habit_id: habit_id.to_string(),
        date,
        notes: stored.notes.unwrap_or_default(),
        completed: stored.completed.unwrap_or(false),
    })
}

fn repair_log_ids(habit_id: &str, logs: &mut [HabitLog]) {
    let mut seen = HashSet::with_capacity(logs.len());
    for log in logs.iter_mut() {
        if !log.id.is_empty() && seen.insert(log.id.clone()) {
            continue;
        }
        let replacement = new_id();
        log::warn!(
            "event=log_id_repaired module=repo status=warn habit_id={} log_id={} replacement={}",
            habit_id,
            log.id,
            replacement
        );
        seen.insert(replacement.clone());
        log.id = replacement;
    }
}

#[derive(Serialize)]
struct DocumentRecord<'a> {
    habits: Vec<HabitRecord<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HabitRecord<'a> {
    id: &'a str,
    name: &'a str,
    avatar: &'a str,
    created_at: String,
    logs: Vec<LogRecord<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LogRecord<'a> {
    id: &'a str,
    habit_id: &'a str,
    date: String,
    notes: &'a str,
    completed: bool,
}

impl<'a> From<&'a Habit> for HabitRecord<'a> {
    fn from(habit: &'a Habit) -> Self {
        Self {
            id: habit.id.as_str(),
            name: habit.name.as_str(),
            avatar: habit.avatar.as_str(),
            created_at: format_stored_date(&habit.created_at),
            logs: habit.logs.iter().map(LogRecord::from).collect(),
        }
    }
}

impl<'a> From<&'a HabitLog> for LogRecord<'a> {
    fn from(log: &'a HabitLog) -> Self {
        Self {
            id: log.id.as_str(),
            habit_id: log.habit_id.as_str(),
            date: format_stored_date(&log.date),
            notes: log.notes.as_str(),
            completed: log.completed,
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::{
        classify_document, format_stored_date, parse_document, parse_stored_date, DocumentShape,
    };
    use crate::repo::RepoError;
    use chrono::{DateTime, TimeZone, Utc};
    use serde_json::json;
    use std::collections::HashSet;

    fn utc(day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, day, hour, minute, 0)
            .single()
            .expect("valid instant")
    }

    #[test]
    fn classify_prefers_wrapper_only_when_habits_is_a_list() {
        let wrapped =
            classify_document(json!({ "habits": [] })).expect("wrapped document should classify");
        assert!(matches!(wrapped, DocumentShape::Wrapped(items) if items.is_empty()));

        let single = classify_document(json!({ "id": "1", "habits": "nope" }))
            .expect("object document should classify");
        match single {
            DocumentShape::Single(object) => assert_eq!(object["habits"], "nope"),
            other => panic!("unexpected shape: {other:?}"),
        }
    }

    #[test]
    fn classify_rejects_scalar_roots() {
        for value in [json!(null), json!(3), json!("habits"), json!(true)] {
            let err = classify_document(value).expect_err("scalar root must be rejected");
            assert!(matches!(err, RepoError::InvalidData(_)));
        }
    }

    #[test]
    fn parse_stored_date_accepts_legacy_forms() {
        let midnight = utc(15, 0, 0);
        assert_eq!(parse_stored_date("2025-03-15"), Some(midnight));
        assert_eq!(parse_stored_date("2025-03-15T00:00:00.000Z"), Some(midnight));
        assert_eq!(parse_stored_date("2025-03-15T00:00:00"), Some(midnight));
        assert_eq!(
            parse_stored_date("2025-03-15T09:00:00+09:00"),
            Some(midnight)
        );
        assert_eq!(parse_stored_date("not a date"), None);
    }

    #[test]
    fn format_stored_date_uses_millis_and_z_suffix() {
        assert_eq!(
            format_stored_date(&utc(15, 7, 30)),
            "2025-03-15T07:30:00.000Z"
        );
    }

    #[test]
    fn parse_defaults_missing_fields_and_repairs_owner() {
        let text = json!([{
            "id": 17,
            "name": "Stretch",
            "createdAt": 1_741_996_800_000_i64,
            "logs": [
                { "id": "a", "date": "2025-03-15" },
                { "id": "b", "habitId": "someone-else", "date": "2025-03-16", "notes": null }
            ]
        }])
        .to_string();

        let parsed = parse_document(&text).expect("lenient document should parse");
        assert_eq!(parsed.shape, "list");
        let habit = &parsed.habits[0];
        assert_eq!(habit.id, "17");
        assert_eq!(habit.avatar, "");
        assert_eq!(habit.logs.len(), 2);
        assert!(habit.logs.iter().all(|log| log.habit_id == "17"));
        assert!(habit.logs.iter().all(|log| log.notes.is_empty()));
        assert!(!habit.logs[0].completed);
    }

    #[test]
    fn parse_reassigns_colliding_and_empty_log_ids() {
        let text = json!({ "habits": [{
            "id": "2",
            "name": "Read",
            "avatar": "📚",
            "createdAt": "2025-03-01T00:00:00.000Z",
            "logs": [
                { "id": "9", "habitId": "2", "date": "2025-03-14T08:00:00.000Z", "notes": "first" },
                { "id": "9", "habitId": "2", "date": "2025-03-15T08:00:00.000Z", "notes": "second" },
                { "id": "", "habitId": "2", "date": "2025-03-16T08:00:00.000Z", "notes": "third" }
            ]
        }]})
        .to_string();

        let parsed = parse_document(&text).expect("colliding log ids should be repaired");
        let logs = &parsed.habits[0].logs;
        assert_eq!(logs.len(), 3);
        assert_eq!(logs[0].id, "9");
        assert_eq!(logs[1].notes, "second");
        let ids = logs.iter().map(|log| log.id.as_str()).collect::<HashSet<_>>();
        assert_eq!(ids.len(), 3);
        assert!(!ids.contains(""));
        parsed.habits[0]
            .validate()
            .expect("repaired habit should pass validation");
    }

    #[test]
    fn parse_treats_non_list_logs_as_empty() {
        let text = json!({
            "id": "1",
            "name": "Read",
            "avatar": "📚",
            "createdAt": "2025-03-01T00:00:00.000Z",
            "logs": { "broken": true }
        })
        .to_string();

        let parsed = parse_document(&text).expect("single habit should parse");
        assert_eq!(parsed.shape, "single");
        assert!(parsed.habits[0].logs.is_empty());
    }

    #[test]
    fn parse_rejects_invalid_dates_and_malformed_json() {
        let bad_date = json!([{ "id": "1", "name": "x", "createdAt": "yesterday" }]).to_string();
        assert!(matches!(
            parse_document(&bad_date).expect_err("unparsable date must be rejected"),
            RepoError::InvalidData(_)
        ));

        assert!(matches!(
            parse_document("{not json").expect_err("malformed json must be rejected"),
            RepoError::Parse(_)
        ));
    }

    #[test]
    fn blank_text_is_empty_store() {
        let parsed = parse_document("  \n").expect("blank text should parse");
        assert_eq!(parsed.shape, "empty");
        assert!(parsed.habits.is_empty());
    }
}
