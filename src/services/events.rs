use crate::api::{DeleteParams, FetchParams, Operator, RecordStore, SortType, WriteParams};
use crate::error::ServiceError;
use crate::models::{Event, EventPatch, EventStats, EventStatus, NewEvent};
use crate::services::batch::{self, BatchOutcome};
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::json;

pub const TABLE: &str = "event";

const FIELDS: &[&str] = &[
    "Name",
    "title",
    "date",
    "description",
    "budget",
    "status",
    "createdAt",
    "updatedAt",
    "Tags",
    "Owner",
];

const UPCOMING_FIELDS: &[&str] = &[
    "Name",
    "title",
    "date",
    "description",
    "budget",
    "status",
    "createdAt",
    "updatedAt",
];

/// Event records of the `event` hosted table.
pub struct EventService<S> {
    store: S,
}

impl<S: RecordStore> EventService<S> {
    pub fn new(store: S) -> Self {
        EventService { store }
    }

    /// All events, newest first.
    pub async fn list_all(&self) -> Result<Vec<Event>, ServiceError> {
        let params = FetchParams::new(FIELDS).order("createdAt", SortType::Desc);
        let response = self.store.fetch_records(TABLE, &params).await?;
        batch::decode_list(response)
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Event, ServiceError> {
        let params = FetchParams::new(FIELDS);
        let response = self.store.get_record_by_id(TABLE, id, &params).await?;
        batch::decode_one(response, TABLE, id)
    }

    pub async fn create(&self, event: &NewEvent) -> Result<Event, ServiceError> {
        let status = event.status.clone().unwrap_or_default();
        let params = WriteParams {
            records: vec![json!({
                "title": event.title,
                "date": event.date,
                "description": event.description,
                "budget": event.budget,
                "status": status,
            })],
        };

        let response = self.store.create_record(TABLE, &params).await?;
        BatchOutcome::partition(response, TABLE, "create")?.first(TABLE)
    }

    /// Sends exactly the fields set in `patch`, zero and empty values included.
    pub async fn update(&self, id: i64, patch: &EventPatch) -> Result<Event, ServiceError> {
        let mut record = json!({ "Id": id });

        if let Some(title) = &patch.title {
            record["title"] = json!(title);
        }
        if let Some(date) = &patch.date {
            record["date"] = json!(date);
        }
        if let Some(description) = &patch.description {
            record["description"] = json!(description);
        }
        if let Some(budget) = patch.budget {
            record["budget"] = json!(budget);
        }
        if let Some(status) = &patch.status {
            record["status"] = json!(status);
        }

        let params = WriteParams {
            records: vec![record],
        };
        let response = self.store.update_record(TABLE, &params).await?;
        BatchOutcome::partition(response, TABLE, "update")?.first(TABLE)
    }

    /// `Ok(false)` when the platform accepted the call but deleted nothing.
    pub async fn delete(&self, id: i64) -> Result<bool, ServiceError> {
        let params = DeleteParams {
            record_ids: vec![id],
        };
        let response = self.store.delete_record(TABLE, &params).await?;
        Ok(BatchOutcome::partition(response, TABLE, "delete")?.any_succeeded())
    }

    /// Events dated after now that are not cancelled, soonest first.
    pub async fn upcoming(&self) -> Result<Vec<Event>, ServiceError> {
        self.upcoming_after(Utc::now()).await
    }

    pub async fn upcoming_after(&self, now: DateTime<Utc>) -> Result<Vec<Event>, ServiceError> {
        let params = FetchParams::new(UPCOMING_FIELDS)
            .filter(
                "date",
                Operator::GreaterThan,
                json!(now.to_rfc3339_opts(SecondsFormat::Millis, true)),
            )
            .filter(
                "status",
                Operator::NotEqualTo,
                json!(EventStatus::Cancelled),
            )
            .order("date", SortType::Asc);

        let response = self.store.fetch_records(TABLE, &params).await?;
        batch::decode_list(response)
    }

    /// Counts computed locally from one full fetch.
    pub async fn stats(&self) -> Result<EventStats, ServiceError> {
        let events = self.list_all().await?;
        Ok(EventStats::from_events(&events, Utc::now()))
    }
}
