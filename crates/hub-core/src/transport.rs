//! The seam between the client and the network.
//!
//! The dispatcher only ever talks to a [`Transport`]. The `hub` binary
//! provides an HTTP implementation; tests provide scripted fakes.

use serde_json::Value;

use crate::error::HubError;
use crate::graphql::{GraphqlRequest, GraphqlResponse};

/// Executes one GraphQL request and returns the decoded envelope.
///
/// Implementations must be callable from worker threads.
pub trait Transport: Send + Sync {
    /// # Errors
    ///
    /// Returns [`HubError::Transport`] or [`HubError::Http`] when the request
    /// could not be completed, and [`HubError::Decode`] when the body is not
    /// a GraphQL response.
    fn execute(&self, request: &GraphqlRequest) -> Result<GraphqlResponse, HubError>;

    /// Human-readable endpoint, for logs and error messages.
    fn endpoint(&self) -> &str;
}

/// Execute `request` and unwrap its `data` payload.
///
/// # Errors
///
/// Propagates transport failures and GraphQL errors.
pub fn execute_data(transport: &dyn Transport, request: &GraphqlRequest) -> Result<Value, HubError> {
    let started = std::time::Instant::now();
    let result = transport
        .execute(request)
        .and_then(|resp| resp.into_data(request.operation_name));
    let elapsed = started.elapsed();
    crate::timing::record_sample(&format!("gql.{}", request.operation_name), elapsed);
    match &result {
        Ok(_) => tracing::debug!(
            operation = request.operation_name,
            elapsed_ms = elapsed.as_millis(),
            "graphql request succeeded"
        ),
        Err(err) => tracing::debug!(
            operation = request.operation_name,
            elapsed_ms = elapsed.as_millis(),
            error = %err,
            "graphql request failed"
        ),
    }
    result
}
