//! Request/response shaping shared by the record services.

use crate::api::{RecordResponse, RecordResult};
use crate::error::ServiceError;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Turns `success: false` into [`ServiceError::Platform`].
pub fn checked(response: RecordResponse) -> Result<RecordResponse, ServiceError> {
    if response.success {
        Ok(response)
    } else {
        let message = response
            .message
            .unwrap_or_else(|| "request was not successful".to_string());
        log::error!("{}", message);
        Err(ServiceError::Platform(message))
    }
}

/// Decodes a list payload; a missing `data` is an empty list.
pub fn decode_list<T: DeserializeOwned>(response: RecordResponse) -> Result<Vec<T>, ServiceError> {
    match checked(response)?.data {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(data) => Ok(serde_json::from_value(data)?),
    }
}

pub fn decode_one<T: DeserializeOwned>(
    response: RecordResponse,
    table: &'static str,
    id: i64,
) -> Result<T, ServiceError> {
    match checked(response)?.data {
        None | Some(Value::Null) => Err(ServiceError::NotFound { table, id }),
        Some(data) => Ok(serde_json::from_value(data)?),
    }
}

/// Per-record outcomes of a write, split by success.
#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub succeeded: Vec<RecordResult>,
    pub failed: Vec<RecordResult>,
}

impl BatchOutcome {
    /// Partitions the results and logs the failed records with their payload.
    pub fn partition(response: RecordResponse, table: &str, action: &str) -> Result<Self, ServiceError> {
        let results = checked(response)?.results.unwrap_or_default();
        let (succeeded, failed): (Vec<_>, Vec<_>) =
            results.into_iter().partition(|result| result.success);

        if !failed.is_empty() {
            let payload = serde_json::to_string(&failed).unwrap_or_default();
            log::error!(
                "Failed to {} {} {} records: {}",
                action,
                table,
                failed.len(),
                payload
            );
        }

        Ok(BatchOutcome { succeeded, failed })
    }

    /// Decodes the first accepted record, or reports the write as rejected.
    pub fn first<T: DeserializeOwned>(self, table: &'static str) -> Result<T, ServiceError> {
        let failed = self.failed.len();
        match self.succeeded.into_iter().next() {
            Some(RecordResult {
                data: Some(data), ..
            }) => Ok(serde_json::from_value(data)?),
            _ => Err(ServiceError::Rejected { table, failed }),
        }
    }

    pub fn any_succeeded(&self) -> bool {
        !self.succeeded.is_empty()
    }
}
