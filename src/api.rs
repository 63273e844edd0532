use crate::config::Config;
use crate::error::ServiceError;
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

// {"field": {"Name": "title"}}
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FieldSpec {
    pub field: FieldName,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FieldName {
    #[serde(rename = "Name")]
    pub name: &'static str,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Operator {
    EqualTo,
    NotEqualTo,
    GreaterThan,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Condition {
    #[serde(rename = "FieldName")]
    pub field_name: &'static str,
    #[serde(rename = "Operator")]
    pub operator: Operator,
    #[serde(rename = "Values")]
    pub values: Vec<Value>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortType {
    Asc,
    Desc,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct OrderBy {
    #[serde(rename = "fieldName")]
    pub field_name: &'static str,
    #[serde(rename = "sorttype")]
    pub sort_type: SortType,
}

/// Query parameters of a read: requested fields, filters and ordering.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct FetchParams {
    pub fields: Vec<FieldSpec>,
    #[serde(rename = "where", skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,
    #[serde(rename = "orderBy", skip_serializing_if = "Vec::is_empty")]
    pub order_by: Vec<OrderBy>,
}

impl FetchParams {
    pub fn new(fields: &[&'static str]) -> Self {
        FetchParams {
            fields: fields
                .iter()
                .map(|&name| FieldSpec {
                    field: FieldName { name },
                })
                .collect(),
            ..Default::default()
        }
    }

    pub fn filter(mut self, field_name: &'static str, operator: Operator, value: Value) -> Self {
        self.conditions.push(Condition {
            field_name,
            operator,
            values: vec![value],
        });
        self
    }

    pub fn order(mut self, field_name: &'static str, sort_type: SortType) -> Self {
        self.order_by.push(OrderBy {
            field_name,
            sort_type,
        });
        self
    }
}

/// Create/update payload: one JSON object per record.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct WriteParams {
    pub records: Vec<Value>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DeleteParams {
    #[serde(rename = "RecordIds")]
    pub record_ids: Vec<i64>,
}

/// Envelope answered by every record operation.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub results: Option<Vec<RecordResult>>,
}

/// Outcome of one record inside a write.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RecordResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// The hosted-table operations the services are written against.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn fetch_records(
        &self,
        table: &'static str,
        params: &FetchParams,
    ) -> Result<RecordResponse, ServiceError>;

    async fn get_record_by_id(
        &self,
        table: &'static str,
        id: i64,
        params: &FetchParams,
    ) -> Result<RecordResponse, ServiceError>;

    async fn create_record(
        &self,
        table: &'static str,
        params: &WriteParams,
    ) -> Result<RecordResponse, ServiceError>;

    async fn update_record(
        &self,
        table: &'static str,
        params: &WriteParams,
    ) -> Result<RecordResponse, ServiceError>;

    async fn delete_record(
        &self,
        table: &'static str,
        params: &DeleteParams,
    ) -> Result<RecordResponse, ServiceError>;
}

#[async_trait]
impl<S: RecordStore + ?Sized> RecordStore for Arc<S> {
    async fn fetch_records(
        &self,
        table: &'static str,
        params: &FetchParams,
    ) -> Result<RecordResponse, ServiceError> {
        (**self).fetch_records(table, params).await
    }

    async fn get_record_by_id(
        &self,
        table: &'static str,
        id: i64,
        params: &FetchParams,
    ) -> Result<RecordResponse, ServiceError> {
        (**self).get_record_by_id(table, id, params).await
    }

    async fn create_record(
        &self,
        table: &'static str,
        params: &WriteParams,
    ) -> Result<RecordResponse, ServiceError> {
        (**self).create_record(table, params).await
    }

    async fn update_record(
        &self,
        table: &'static str,
        params: &WriteParams,
    ) -> Result<RecordResponse, ServiceError> {
        (**self).update_record(table, params).await
    }

    async fn delete_record(
        &self,
        table: &'static str,
        params: &DeleteParams,
    ) -> Result<RecordResponse, ServiceError> {
        (**self).delete_record(table, params).await
    }
}

/// HTTP client for the hosted record platform.
pub struct ApperClient {
    client: Client,
    base_url: String,
    project_id: String,
    public_key: String,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

impl ApperClient {
    pub fn new(base_url: &str, project_id: &str, public_key: &str) -> Self {
        ApperClient {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            project_id: project_id.to_string(),
            public_key: public_key.to_string(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        ApperClient::new(&config.api_url, &config.project_id, &config.public_key)
    }

    fn records_url(&self, table: &str) -> String {
        format!("{}/tables/{}/records", self.base_url, table)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("Authorization", format!("Bearer {}", self.public_key))
            .header("X-Apper-Project-Id", &self.project_id)
    }

    async fn send(&self, request: RequestBuilder) -> Result<RecordResponse, ServiceError> {
        let res = self.authorized(request).send().await?;

        if res.status().is_success() {
            let body = res.json::<RecordResponse>().await?;
            Ok(body)
        } else {
            let status = res.status().as_u16();
            let error_text = res.text().await?;
            // Prefer the platform's {"message": ...} over the raw body
            let message = serde_json::from_str::<ErrorBody>(&error_text)
                .map(|body| body.message)
                .unwrap_or(error_text);
            Err(ServiceError::Http { status, message })
        }
    }
}

#[async_trait]
impl RecordStore for ApperClient {
    async fn fetch_records(
        &self,
        table: &'static str,
        params: &FetchParams,
    ) -> Result<RecordResponse, ServiceError> {
        let url = format!("{}/query", self.records_url(table));
        log::debug!("fetch {} ({} conditions)", table, params.conditions.len());
        self.send(self.client.post(&url).json(params)).await
    }

    async fn get_record_by_id(
        &self,
        table: &'static str,
        id: i64,
        params: &FetchParams,
    ) -> Result<RecordResponse, ServiceError> {
        let url = format!("{}/{}/query", self.records_url(table), id);
        log::debug!("fetch {} #{}", table, id);
        match self.send(self.client.post(&url).json(params)).await {
            Err(ServiceError::Http { status, .. }) if status == StatusCode::NOT_FOUND.as_u16() => {
                Err(ServiceError::NotFound { table, id })
            }
            other => other,
        }
    }

    async fn create_record(
        &self,
        table: &'static str,
        params: &WriteParams,
    ) -> Result<RecordResponse, ServiceError> {
        log::debug!("create {} ({} records)", table, params.records.len());
        let url = self.records_url(table);
        self.send(self.client.post(&url).json(params)).await
    }

    async fn update_record(
        &self,
        table: &'static str,
        params: &WriteParams,
    ) -> Result<RecordResponse, ServiceError> {
        log::debug!("update {} ({} records)", table, params.records.len());
        let url = self.records_url(table);
        self.send(self.client.put(&url).json(params)).await
    }

    async fn delete_record(
        &self,
        table: &'static str,
        params: &DeleteParams,
    ) -> Result<RecordResponse, ServiceError> {
        log::debug!("delete {} {:?}", table, params.record_ids);
        let url = self.records_url(table);
        self.send(self.client.delete(&url).json(params)).await
    }
}

#[cfg(test)]
pub mod mock {
    //! In-memory [`RecordStore`] replaying canned responses and recording every call.

    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    #[derive(Clone, Debug, PartialEq)]
    pub enum Call {
        Fetch(&'static str, FetchParams),
        Get(&'static str, i64, FetchParams),
        Create(&'static str, WriteParams),
        Update(&'static str, WriteParams),
        Delete(&'static str, DeleteParams),
    }

    #[derive(Default)]
    pub struct MockStore {
        responses: Mutex<VecDeque<Result<RecordResponse, ServiceError>>>,
        calls: Mutex<Vec<Call>>,
    }

    impl MockStore {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn respond(&self, response: Result<RecordResponse, ServiceError>) -> &Self {
            self.responses.lock().unwrap().push_back(response);
            self
        }

        pub fn respond_data(&self, data: Value) -> &Self {
            self.respond(Ok(RecordResponse {
                success: true,
                data: Some(data),
                ..Default::default()
            }))
        }

        pub fn respond_results(&self, results: Vec<RecordResult>) -> &Self {
            self.respond(Ok(RecordResponse {
                success: true,
                results: Some(results),
                ..Default::default()
            }))
        }

        pub fn respond_failure(&self, message: &str) -> &Self {
            self.respond(Ok(RecordResponse {
                success: false,
                message: Some(message.to_string()),
                ..Default::default()
            }))
        }

        pub fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }

        pub fn last_call(&self) -> Call {
            self.calls().pop().expect("no call recorded")
        }

        fn next(&self, call: Call) -> Result<RecordResponse, ServiceError> {
            self.calls.lock().unwrap().push(call);
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(RecordResponse::default()))
        }
    }

    pub fn ok(data: Value) -> RecordResult {
        RecordResult {
            success: true,
            data: Some(data),
            message: None,
        }
    }

    pub fn failed(message: &str) -> RecordResult {
        RecordResult {
            success: false,
            data: None,
            message: Some(message.to_string()),
        }
    }

    #[async_trait]
    impl RecordStore for MockStore {
        async fn fetch_records(
            &self,
            table: &'static str,
            params: &FetchParams,
        ) -> Result<RecordResponse, ServiceError> {
            self.next(Call::Fetch(table, params.clone()))
        }

        async fn get_record_by_id(
            &self,
            table: &'static str,
            id: i64,
            params: &FetchParams,
        ) -> Result<RecordResponse, ServiceError> {
            self.next(Call::Get(table, id, params.clone()))
        }

        async fn create_record(
            &self,
            table: &'static str,
            params: &WriteParams,
        ) -> Result<RecordResponse, ServiceError> {
            self.next(Call::Create(table, params.clone()))
        }

        async fn update_record(
            &self,
            table: &'static str,
            params: &WriteParams,
        ) -> Result<RecordResponse, ServiceError> {
            self.next(Call::Update(table, params.clone()))
        }

        async fn delete_record(
            &self,
            table: &'static str,
            params: &DeleteParams,
        ) -> Result<RecordResponse, ServiceError> {
            self.next(Call::Delete(table, params.clone()))
        }
    }
}
