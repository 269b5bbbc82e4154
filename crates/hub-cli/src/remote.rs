//! HTTP transport for the GraphQL endpoint.

use std::time::Duration;

use hub_core::HubError;
use hub_core::config::EffectiveConfig;
use hub_core::graphql::{GraphqlRequest, GraphqlResponse};
use hub_core::transport::Transport;

const USER_AGENT: &str = concat!("hub-cli/", env!("CARGO_PKG_VERSION"));
const MAX_ERROR_BODY: usize = 512;

pub struct HttpTransport {
    agent: ureq::Agent,
    endpoint: String,
    token: Option<String>,
}

impl HttpTransport {
    pub fn new(endpoint: impl Into<String>, token: Option<String>, timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build();
        Self {
            agent,
            endpoint: endpoint.into(),
            token,
        }
    }

    pub fn from_config(config: &EffectiveConfig) -> Self {
        Self::new(config.endpoint.clone(), config.token.clone(), config.timeout())
    }
}

impl Transport for HttpTransport {
    fn execute(&self, request: &GraphqlRequest) -> Result<GraphqlResponse, HubError> {
        let mut call = self
            .agent
            .post(&self.endpoint)
            .set("Accept", "application/json");
        if let Some(token) = &self.token {
            call = call.set("Authorization", &format!("Bearer {token}"));
        }

        match call.send_json(request) {
            Ok(response) => response.into_json::<GraphqlResponse>().map_err(|err| HubError::Decode {
                operation: request.operation_name,
                reason: err.to_string(),
            }),
            Err(ureq::Error::Status(status, response)) => {
                let body = response.into_string().unwrap_or_default();
                // GraphQL servers commonly answer validation errors with 400
                // and a regular `errors` envelope.
                match serde_json::from_str::<GraphqlResponse>(&body) {
                    Ok(envelope) if envelope.errors.as_ref().is_some_and(|e| !e.is_empty()) => {
                        Ok(envelope)
                    }
                    _ => Err(HubError::Http {
                        status,
                        body: truncate(&body),
                    }),
                }
            }
            Err(ureq::Error::Transport(err)) => Err(HubError::Transport {
                endpoint: self.endpoint.clone(),
                message: err.to_string(),
            }),
        }
    }

    fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

fn truncate(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.chars().count() <= MAX_ERROR_BODY {
        return trimmed.to_string();
    }
    let mut out: String = trimmed.chars().take(MAX_ERROR_BODY).collect();
    out.push('…');
    out
}
