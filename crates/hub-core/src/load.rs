//! The single full-tree query.

use serde::Deserialize;
use serde_json::{Value, json};

use crate::error::HubError;
use crate::graphql::{GraphqlRequest, documents};
use crate::model::Organization;
use crate::snapshot::Snapshot;
use crate::transport::{Transport, execute_data};

pub const OPERATION: &str = "GetOrganizations";

#[must_use]
pub fn load_request() -> GraphqlRequest {
    GraphqlRequest::new(OPERATION, documents::GET_ORGANIZATIONS, json!({}))
}

/// Decode the `data` payload of `GetOrganizations`.
///
/// # Errors
///
/// Returns [`HubError::Decode`] when `organizations` is missing or any
/// entity is malformed.
pub fn decode_snapshot(data: &Value) -> Result<Snapshot, HubError> {
    let organizations = data
        .get("organizations")
        .filter(|v| !v.is_null())
        .ok_or_else(|| HubError::Decode {
            operation: "organizations",
            reason: "organizations is missing or null".into(),
        })?;
    let organizations =
        Vec::<Organization>::deserialize(organizations).map_err(|err| HubError::Decode {
            operation: "organizations",
            reason: err.to_string(),
        })?;
    Ok(Snapshot::new(organizations))
}

/// Fetch the whole tree, blocking the calling thread.
///
/// # Errors
///
/// Propagates transport and decode failures.
pub fn fetch_snapshot(transport: &dyn Transport) -> Result<Snapshot, HubError> {
    let data = execute_data(transport, &load_request())?;
    let snapshot = decode_snapshot(&data)?;
    let counts = snapshot.counts();
    tracing::info!(
        organizations = counts.organizations,
        projects = counts.projects,
        tasks = counts.tasks,
        comments = counts.comments,
        "organization tree loaded"
    );
    Ok(snapshot)
}
