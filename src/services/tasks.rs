use crate::api::{DeleteParams, FetchParams, Operator, RecordStore, SortType, WriteParams};
use crate::error::ServiceError;
use crate::models::{NewTask, Task, TaskPatch};
use crate::services::batch::{self, BatchOutcome};
use serde_json::json;

pub const TABLE: &str = "task";

const FIELDS: &[&str] = &[
    "Name",
    "title",
    "description",
    "completed",
    "dueDate",
    "eventId",
    "Tags",
    "Owner",
];

// Filtered queries leave out Tags and Owner
const FILTERED_FIELDS: &[&str] = &[
    "Name",
    "title",
    "description",
    "completed",
    "dueDate",
    "eventId",
];

/// Task records of the `task` hosted table.
pub struct TaskService<S> {
    store: S,
}

impl<S: RecordStore> TaskService<S> {
    pub fn new(store: S) -> Self {
        TaskService { store }
    }

    pub async fn list_all(&self) -> Result<Vec<Task>, ServiceError> {
        let params = FetchParams::new(FIELDS).order("dueDate", SortType::Asc);
        self.fetch(&params).await
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Task, ServiceError> {
        let params = FetchParams::new(FIELDS);
        let response = self.store.get_record_by_id(TABLE, id, &params).await?;
        batch::decode_one(response, TABLE, id)
    }

    /// Tasks belonging to one event, earliest due first.
    pub async fn by_event(&self, event_id: i64) -> Result<Vec<Task>, ServiceError> {
        let params = FetchParams::new(FILTERED_FIELDS)
            .filter("eventId", Operator::EqualTo, json!(event_id))
            .order("dueDate", SortType::Asc);
        self.fetch(&params).await
    }

    /// Tasks not yet completed, earliest due first.
    pub async fn active(&self) -> Result<Vec<Task>, ServiceError> {
        let params = FetchParams::new(FILTERED_FIELDS)
            .filter("completed", Operator::EqualTo, json!(false))
            .order("dueDate", SortType::Asc);
        self.fetch(&params).await
    }

    pub async fn create(&self, task: &NewTask) -> Result<Task, ServiceError> {
        let params = WriteParams {
            records: vec![json!({
                "title": task.title,
                "description": task.description,
                "completed": false,
                "dueDate": task.due_date,
                "eventId": task.event_id,
            })],
        };

        let response = self.store.create_record(TABLE, &params).await?;
        BatchOutcome::partition(response, TABLE, "create")?.first(TABLE)
    }

    pub async fn update(&self, id: i64, patch: &TaskPatch) -> Result<Task, ServiceError> {
        let mut record = json!({ "Id": id });

        if let Some(title) = &patch.title {
            record["title"] = json!(title);
        }
        if let Some(description) = &patch.description {
            record["description"] = json!(description);
        }
        if let Some(completed) = patch.completed {
            record["completed"] = json!(completed);
        }
        if let Some(due_date) = &patch.due_date {
            record["dueDate"] = json!(due_date);
        }
        if let Some(event_id) = patch.event_id {
            record["eventId"] = json!(event_id);
        }

        let params = WriteParams {
            records: vec![record],
        };
        let response = self.store.update_record(TABLE, &params).await?;
        BatchOutcome::partition(response, TABLE, "update")?.first(TABLE)
    }

    pub async fn delete(&self, id: i64) -> Result<bool, ServiceError> {
        let params = DeleteParams {
            record_ids: vec![id],
        };
        let response = self.store.delete_record(TABLE, &params).await?;
        Ok(BatchOutcome::partition(response, TABLE, "delete")?.any_succeeded())
    }

    async fn fetch(&self, params: &FetchParams) -> Result<Vec<Task>, ServiceError> {
        let response = self.store.fetch_records(TABLE, params).await?;
        batch::decode_list(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::mock::{failed, ok, Call, MockStore};
    use crate::api::Condition;
    use serde_json::Value;
    use std::sync::Arc;

    fn service() -> (Arc<MockStore>, TaskService<Arc<MockStore>>) {
        let store = Arc::new(MockStore::new());
        (Arc::clone(&store), TaskService::new(store))
    }

    fn fetch_params(call: Call) -> FetchParams {
        match call {
            Call::Fetch(TABLE, params) => params,
            other => panic!("unexpected call {:?}", other),
        }
    }

    fn updated_record(call: Call) -> Value {
        match call {
            Call::Update(TABLE, WriteParams { mut records }) => records.remove(0),
            other => panic!("unexpected call {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_list_all_orders_by_due_date() {
        let (store, tasks) = service();
        store.respond_data(json!([
            {"Id": 1, "title": "Send invites", "dueDate": "2025-05-01", "eventId": 3},
            {"Id": 2, "title": "Book band", "dueDate": "2025-06-01", "eventId": 3}
        ]));

        let list = tasks.list_all().await.unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[1].title, "Book band");

        let params = fetch_params(store.last_call());
        assert_eq!(params.fields.len(), FIELDS.len());
        assert_eq!(params.order_by[0].field_name, "dueDate");
        assert_eq!(params.order_by[0].sort_type, SortType::Asc);
    }

    #[tokio::test]
    async fn test_by_event_filters_on_event_id() {
        let (store, tasks) = service();
        store.respond_data(json!([{"Id": 1, "title": "Catering", "eventId": 42}]));

        let list = tasks.by_event(42).await.unwrap();
        assert_eq!(list[0].event_id, Some(42));

        let params = fetch_params(store.last_call());
        assert_eq!(
            params.conditions,
            vec![Condition {
                field_name: "eventId",
                operator: Operator::EqualTo,
                values: vec![json!(42)],
            }]
        );
        assert_eq!(params.fields.len(), FILTERED_FIELDS.len());
    }

    #[tokio::test]
    async fn test_active_filters_incomplete() {
        let (store, tasks) = service();
        store.respond_data(json!([]));

        assert!(tasks.active().await.unwrap().is_empty());

        let params = fetch_params(store.last_call());
        assert_eq!(params.conditions[0].field_name, "completed");
        assert_eq!(params.conditions[0].values, vec![json!(false)]);
        assert_eq!(params.order_by[0].field_name, "dueDate");
    }

    #[tokio::test]
    async fn test_create_starts_incomplete() {
        let (store, tasks) = service();
        store.respond_results(vec![ok(json!({"Id": 9, "title": "Rent chairs", "eventId": 2}))]);

        let task = NewTask {
            title: "Rent chairs".to_string(),
            description: "80 chairs".to_string(),
            due_date: "2025-09-01".to_string(),
            event_id: 2,
        };
        let created = tasks.create(&task).await.unwrap();
        assert_eq!(created.id, 9);

        match store.last_call() {
            Call::Create(TABLE, params) => assert_eq!(
                params.records,
                vec![json!({
                    "title": "Rent chairs",
                    "description": "80 chairs",
                    "completed": false,
                    "dueDate": "2025-09-01",
                    "eventId": 2
                })]
            ),
            other => panic!("unexpected call {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_update_sends_completed_false() {
        let (store, tasks) = service();
        store.respond_results(vec![ok(json!({"Id": 3, "completed": false}))]);

        let patch = TaskPatch {
            completed: Some(false),
            ..Default::default()
        };
        let task = tasks.update(3, &patch).await.unwrap();
        assert!(!task.completed);
        assert_eq!(
            updated_record(store.last_call()),
            json!({"Id": 3, "completed": false})
        );
    }

    #[tokio::test]
    async fn test_update_with_empty_patch_sends_only_id() {
        let (store, tasks) = service();
        store.respond_results(vec![ok(json!({"Id": 3}))]);
        tasks.update(3, &TaskPatch::default()).await.unwrap();
        assert_eq!(updated_record(store.last_call()), json!({"Id": 3}));
    }

    #[tokio::test]
    async fn test_update_rejected() {
        let (store, tasks) = service();
        store.respond_results(vec![failed("invalid eventId")]);
        let patch = TaskPatch {
            event_id: Some(0),
            ..Default::default()
        };
        let err = tasks.update(3, &patch).await.unwrap_err();
        assert!(matches!(err, ServiceError::Rejected { table: TABLE, failed: 1 }));
        assert_eq!(
            updated_record(store.last_call()),
            json!({"Id": 3, "eventId": 0})
        );
    }

    #[tokio::test]
    async fn test_delete() {
        let (store, tasks) = service();
        store.respond_results(vec![]);
        store.respond_results(vec![ok(json!({"Id": 6}))]);

        assert!(!tasks.delete(6).await.unwrap());
        assert!(tasks.delete(6).await.unwrap());
    }

    #[tokio::test]
    async fn test_transport_error_is_propagated() {
        let (store, tasks) = service();
        store.respond(Err(ServiceError::Http {
            status: 502,
            message: "bad gateway".to_string(),
        }));
        let err = tasks.get_by_id(1).await.unwrap_err();
        assert!(matches!(err, ServiceError::Http { status: 502, .. }));
    }
}
