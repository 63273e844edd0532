use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

// Event status, kept open: the platform does not enforce the enumeration
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EventStatus {
    #[default]
    Planning,
    InProgress,
    Completed,
    Cancelled,
    Other(String),
}

impl EventStatus {
    pub fn as_str(&self) -> &str {
        match self {
            EventStatus::Planning => "Planning",
            EventStatus::InProgress => "In Progress",
            EventStatus::Completed => "Completed",
            EventStatus::Cancelled => "Cancelled",
            EventStatus::Other(s) => s,
        }
    }

    /// Next status in the planning lifecycle, wrapping around.
    pub fn cycle(&self) -> EventStatus {
        match self {
            EventStatus::Planning => EventStatus::InProgress,
            EventStatus::InProgress => EventStatus::Completed,
            EventStatus::Completed => EventStatus::Cancelled,
            EventStatus::Cancelled | EventStatus::Other(_) => EventStatus::Planning,
        }
    }
}

impl From<String> for EventStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "Planning" => EventStatus::Planning,
            "In Progress" => EventStatus::InProgress,
            "Completed" => EventStatus::Completed,
            "Cancelled" => EventStatus::Cancelled,
            _ => EventStatus::Other(s),
        }
    }
}

impl From<EventStatus> for String {
    fn from(status: EventStatus) -> Self {
        status.as_str().to_string()
    }
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// Owner lookup
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Owner {
    #[serde(rename = "Id")]
    pub id: i64,
    #[serde(rename = "Name", default)]
    pub name: Option<String>,
}

// Event record
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    #[serde(rename = "Id")]
    pub id: i64,
    #[serde(rename = "Name", default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "de_null_default")]
    pub title: String,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub budget: Option<f64>,
    #[serde(default)]
    pub status: Option<EventStatus>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(rename = "Tags", default, deserialize_with = "de_tags")]
    pub tags: Vec<String>,
    #[serde(rename = "Owner", default, deserialize_with = "de_owner")]
    pub owner: Option<Owner>,
}

impl Event {
    /// Title, or the record name when the title is blank.
    pub fn display_title(&self) -> &str {
        display_title(&self.title, self.name.as_deref())
    }

    pub fn starts_at(&self) -> Option<DateTime<Utc>> {
        self.date.as_deref().and_then(parse_timestamp)
    }

    pub fn has_status(&self, status: &EventStatus) -> bool {
        self.status.as_ref() == Some(status)
    }

    /// Dated after `now` and not cancelled.
    pub fn is_upcoming(&self, now: DateTime<Utc>) -> bool {
        let in_future = self.starts_at().map_or(false, |date| date > now);
        in_future && !self.has_status(&EventStatus::Cancelled)
    }
}

fn display_title<'a>(title: &'a str, name: Option<&'a str>) -> &'a str {
    match name {
        Some(name) if title.trim().is_empty() => name,
        _ => title,
    }
}

// Task record
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    #[serde(rename = "Id")]
    pub id: i64,
    #[serde(rename = "Name", default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "de_null_default")]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "de_null_default")]
    pub completed: bool,
    #[serde(default)]
    pub due_date: Option<String>,
    #[serde(default, deserialize_with = "de_reference")]
    pub event_id: Option<i64>,
    #[serde(rename = "Tags", default, deserialize_with = "de_tags")]
    pub tags: Vec<String>,
    #[serde(rename = "Owner", default, deserialize_with = "de_owner")]
    pub owner: Option<Owner>,
}

impl Task {
    pub fn display_title(&self) -> &str {
        display_title(&self.title, self.name.as_deref())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct NewEvent {
    pub title: String,
    pub date: String,
    pub description: String,
    pub budget: f64,
    pub status: Option<EventStatus>,
}

/// Partial update of an event. Only the `Some` fields are sent.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EventPatch {
    pub title: Option<String>,
    pub date: Option<String>,
    pub description: Option<String>,
    pub budget: Option<f64>,
    pub status: Option<EventStatus>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct NewTask {
    pub title: String,
    pub description: String,
    pub due_date: String,
    pub event_id: i64,
}

/// Partial update of a task. Only the `Some` fields are sent.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub completed: Option<bool>,
    pub due_date: Option<String>,
    pub event_id: Option<i64>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventStats {
    pub total_events: usize,
    pub upcoming_events: usize,
    pub completed_events: usize,
    pub active_events: usize,
}

impl EventStats {
    pub fn from_events(events: &[Event], now: DateTime<Utc>) -> EventStats {
        EventStats {
            total_events: events.len(),
            upcoming_events: events.iter().filter(|e| e.is_upcoming(now)).count(),
            completed_events: events
                .iter()
                .filter(|e| e.has_status(&EventStatus::Completed))
                .count(),
            active_events: events
                .iter()
                .filter(|e| e.has_status(&EventStatus::InProgress))
                .count(),
        }
    }
}

/// Accepts RFC 3339, a naive `YYYY-MM-DDTHH:MM[:SS]` (read as UTC) or a bare date.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

// Explicit nulls decode like a missing field
fn de_null_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawTags {
    Csv(String),
    List(Vec<String>),
}

fn de_tags<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<RawTags>::deserialize(deserializer)?;
    let tags = match raw {
        Some(RawTags::Csv(s)) => s
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(String::from)
            .collect(),
        Some(RawTags::List(list)) => list,
        None => Vec::new(),
    };
    Ok(tags)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawReference {
    Id(i64),
    Lookup(Owner),
}

fn de_reference<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<RawReference>::deserialize(deserializer)?.map(|r| match r {
        RawReference::Id(id) => id,
        RawReference::Lookup(owner) => owner.id,
    }))
}

fn de_owner<'de, D>(deserializer: D) -> Result<Option<Owner>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<RawReference>::deserialize(deserializer)?.map(|r| match r {
        RawReference::Id(id) => Owner { id, name: None },
        RawReference::Lookup(owner) => owner,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn event(id: i64, date: &str, status: &str) -> Event {
        serde_json::from_value(json!({
            "Id": id,
            "title": format!("event {}", id),
            "date": date,
            "status": status,
        }))
        .unwrap()
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_decode_full_event() {
        let e: Event = serde_json::from_value(json!({
            "Id": 7,
            "Name": "Summit",
            "title": "Summit",
            "date": "2025-09-01T09:00:00.000Z",
            "description": "Yearly summit",
            "budget": 1200.5,
            "status": "In Progress",
            "createdAt": "2025-01-01T00:00:00Z",
            "updatedAt": "2025-01-02T00:00:00Z",
            "Tags": "work, travel,",
            "Owner": {"Id": 3, "Name": "Ada"}
        }))
        .unwrap();
        assert_eq!(e.id, 7);
        assert_eq!(e.status, Some(EventStatus::InProgress));
        assert_eq!(e.budget, Some(1200.5));
        assert_eq!(e.tags, vec!["work", "travel"]);
        assert_eq!(
            e.owner,
            Some(Owner {
                id: 3,
                name: Some("Ada".to_string())
            })
        );
        assert_eq!(e.created_at.as_deref(), Some("2025-01-01T00:00:00Z"));
    }

    #[test]
    fn test_decode_task_with_lookup_event_reference() {
        let t: Task = serde_json::from_value(json!({
            "Id": 1,
            "title": "Book venue",
            "completed": true,
            "dueDate": "2025-08-01",
            "eventId": {"Id": 42, "Name": "Summit"},
            "Tags": null,
            "Owner": 5
        }))
        .unwrap();
        assert_eq!(t.event_id, Some(42));
        assert!(t.completed);
        assert!(t.tags.is_empty());
        assert_eq!(t.owner, Some(Owner { id: 5, name: None }));

        let t: Task = serde_json::from_value(json!({"Id": 2, "eventId": 9})).unwrap();
        assert_eq!(t.event_id, Some(9));
        assert!(!t.completed);
    }

    #[test]
    fn test_display_title_falls_back_to_name() {
        let e: Event = serde_json::from_value(json!({"Id": 1, "Name": "Gala", "title": ""})).unwrap();
        assert_eq!(e.display_title(), "Gala");
        let t: Task = serde_json::from_value(json!({"Id": 1, "Name": "n", "title": "Call DJ"})).unwrap();
        assert_eq!(t.display_title(), "Call DJ");
    }

    #[test]
    fn test_null_fields_decode_as_defaults() {
        let events: Vec<Event> = serde_json::from_value(json!([
            {"Id": 1, "title": "ok"},
            {"Id": 2, "Name": "Gala", "title": null}
        ]))
        .unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].title, "");
        assert_eq!(events[1].display_title(), "Gala");

        let tasks: Vec<Task> = serde_json::from_value(json!([
            {"Id": 3, "title": null, "completed": null},
            {"Id": 4, "title": "Call DJ", "completed": true}
        ]))
        .unwrap();
        assert_eq!(tasks[0].title, "");
        assert!(!tasks[0].completed);
        assert!(tasks[1].completed);
    }

    #[test]
    fn test_quick_add_time_counts_as_upcoming() {
        let parsed = crate::parser::parse_quick_add("Offsite @2999-07-14T09:30");
        let e: Event = serde_json::from_value(json!({
            "Id": 1,
            "title": parsed.title,
            "date": parsed.date,
            "status": "Planning",
        }))
        .unwrap();
        assert_eq!(
            e.starts_at(),
            Some(Utc.with_ymd_and_hms(2999, 7, 14, 9, 30, 0).unwrap())
        );
        assert!(e.is_upcoming(now()));
        assert_eq!(EventStats::from_events(&[e], now()).upcoming_events, 1);
    }

    #[test]
    fn test_default_status_is_planning() {
        assert_eq!(EventStatus::default(), EventStatus::Planning);
    }

    #[test]
    fn test_unknown_status_is_preserved() {
        let status: EventStatus = serde_json::from_value(json!("Postponed")).unwrap();
        assert_eq!(status, EventStatus::Other("Postponed".to_string()));
        assert_eq!(serde_json::to_value(&status).unwrap(), json!("Postponed"));
        assert_eq!(
            serde_json::to_value(EventStatus::InProgress).unwrap(),
            json!("In Progress")
        );
    }

    #[test]
    fn test_parse_timestamp_formats() {
        let midnight = Utc.with_ymd_and_hms(2025, 3, 4, 0, 0, 0).unwrap();
        assert_eq!(parse_timestamp("2025-03-04"), Some(midnight));
        assert_eq!(parse_timestamp("2025-03-04T00:00:00"), Some(midnight));
        assert_eq!(parse_timestamp("2025-03-04T00:00"), Some(midnight));
        assert_eq!(parse_timestamp("2025-03-04T01:00:00+01:00"), Some(midnight));
        assert_eq!(parse_timestamp("not a date"), None);
    }

    #[test]
    fn test_stats_of_empty_set_are_zero() {
        assert_eq!(EventStats::from_events(&[], now()), EventStats::default());
    }

    #[test]
    fn test_stats_counts() {
        let events = vec![
            event(1, "2025-07-01", "Planning"),
            event(2, "2025-07-01", "Cancelled"),
            event(3, "2025-05-01", "Completed"),
            event(4, "2025-08-01", "In Progress"),
            event(5, "garbage", "Planning"),
        ];
        let stats = EventStats::from_events(&events, now());
        assert_eq!(
            stats,
            EventStats {
                total_events: 5,
                upcoming_events: 2,
                completed_events: 1,
                active_events: 1,
            }
        );
        assert!(stats.total_events >= stats.upcoming_events);
        assert!(stats.completed_events + stats.active_events <= stats.total_events);
    }

    #[test]
    fn test_status_cycle_wraps() {
        let mut status = EventStatus::Planning;
        for _ in 0..4 {
            status = status.cycle();
        }
        assert_eq!(status, EventStatus::Planning);
        assert_eq!(
            EventStatus::Other("x".to_string()).cycle(),
            EventStatus::Planning
        );
    }
}
