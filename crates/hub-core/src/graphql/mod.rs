//! GraphQL-over-HTTP request and response envelopes.

pub mod documents;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::HubError;

/// JSON body POSTed to the GraphQL endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphqlRequest {
    pub operation_name: &'static str,
    pub query: &'static str,
    pub variables: Value,
}

/// One entry of a response's `errors` array.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GraphqlErrorEntry {
    pub message: String,
}

/// A decoded GraphQL response.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct GraphqlResponse {
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default)]
    pub errors: Option<Vec<GraphqlErrorEntry>>,
}

impl GraphqlRequest {
    #[must_use]
    pub const fn new(operation_name: &'static str, query: &'static str, variables: Value) -> Self {
        Self {
            operation_name,
            query,
            variables,
        }
    }
}

impl GraphqlResponse {
    /// Split the envelope into its `data` payload.
    ///
    /// A non-empty `errors` array fails the whole operation, even when
    /// partial data is present: patches are only applied for clean results.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::Graphql`] when the server reported errors and
    /// [`HubError::Decode`] when `data` is missing or null.
    pub fn into_data(self, operation: &'static str) -> Result<Value, HubError> {
        if let Some(errors) = self.errors.filter(|e| !e.is_empty()) {
            return Err(HubError::Graphql {
                messages: errors.into_iter().map(|e| e.message).collect(),
            });
        }
        match self.data {
            Some(Value::Null) | None => Err(HubError::Decode {
                operation,
                reason: "response has no data".into(),
            }),
            Some(data) => Ok(data),
        }
    }
}
