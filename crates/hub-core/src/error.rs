use std::fmt;

/// Machine-readable error codes for scripted callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ConfigParseError,
    InvalidEndpoint,
    EntityNotFound,
    InvalidInput,
    MutationRejected,
    TransportFailed,
    HttpStatus,
    GraphqlError,
    MalformedResponse,
    InternalUnexpected,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::ConfigParseError => "E1002",
            Self::InvalidEndpoint => "E1003",
            Self::EntityNotFound => "E2001",
            Self::InvalidInput => "E2005",
            Self::MutationRejected => "E2006",
            Self::TransportFailed => "E4001",
            Self::HttpStatus => "E4002",
            Self::GraphqlError => "E4003",
            Self::MalformedResponse => "E4004",
            Self::InternalUnexpected => "E9001",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::ConfigParseError => "Config file parse error",
            Self::InvalidEndpoint => "Invalid GraphQL endpoint",
            Self::EntityNotFound => "Entity not found",
            Self::InvalidInput => "Invalid input",
            Self::MutationRejected => "Mutation rejected by server",
            Self::TransportFailed => "Request failed",
            Self::HttpStatus => "Unexpected HTTP status",
            Self::GraphqlError => "GraphQL error",
            Self::MalformedResponse => "Malformed response",
            Self::InternalUnexpected => "Internal unexpected error",
        }
    }

    /// Optional remediation hint that can be surfaced to users.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::ConfigParseError => Some("Fix syntax in the hub config.toml and retry."),
            Self::InvalidEndpoint => {
                Some("Set --endpoint, HUB_ENDPOINT, or `endpoint` in config to an http(s) URL.")
            }
            Self::EntityNotFound => Some("Run `hub tree` to see current identifiers."),
            Self::InvalidInput => None,
            Self::MutationRejected => Some("Reload with `hub tree`; the entity may already be gone."),
            Self::TransportFailed => Some("Check that the backend is running and reachable."),
            Self::HttpStatus => Some("Check the endpoint path and authentication token."),
            Self::GraphqlError | Self::MalformedResponse => {
                Some("The backend schema may not match this client version.")
            }
            Self::InternalUnexpected => Some("Retry once. If persistent, report a bug with logs."),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Failures surfaced by loads and mutations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HubError {
    #[error("request to {endpoint} failed: {message}")]
    Transport { endpoint: String, message: String },

    #[error("server returned HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("{}", .messages.join("; "))]
    Graphql { messages: Vec<String> },

    #[error("malformed {operation} response: {reason}")]
    Decode {
        operation: &'static str,
        reason: String,
    },

    #[error("{operation} was rejected by the server")]
    Rejected { operation: &'static str },

    #[error("{kind} '{id}' not found")]
    NotFound { kind: &'static str, id: String },

    #[error("invalid {field}: {reason}")]
    InvalidInput {
        field: &'static str,
        reason: String,
    },

    #[error("request worker disconnected before settling")]
    Disconnected,
}

impl HubError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Transport { .. } => ErrorCode::TransportFailed,
            Self::Http { .. } => ErrorCode::HttpStatus,
            Self::Graphql { .. } => ErrorCode::GraphqlError,
            Self::Decode { .. } => ErrorCode::MalformedResponse,
            Self::Rejected { .. } => ErrorCode::MutationRejected,
            Self::NotFound { .. } => ErrorCode::EntityNotFound,
            Self::InvalidInput { .. } => ErrorCode::InvalidInput,
            Self::Disconnected => ErrorCode::InternalUnexpected,
        }
    }

    /// Remediation hint, if the error code has one.
    #[must_use]
    pub const fn hint(&self) -> Option<&'static str> {
        self.code().hint()
    }
}

#[cfg(test)]
mod tests {
    use super::{ErrorCode, HubError};
    use std::collections::HashSet;

    #[test]
    fn all_codes_are_unique() {
        let all = [
            ErrorCode::ConfigParseError,
            ErrorCode::InvalidEndpoint,
            ErrorCode::EntityNotFound,
            ErrorCode::InvalidInput,
            ErrorCode::MutationRejected,
            ErrorCode::TransportFailed,
            ErrorCode::HttpStatus,
            ErrorCode::GraphqlError,
            ErrorCode::MalformedResponse,
            ErrorCode::InternalUnexpected,
        ];

        let mut seen = HashSet::new();
        for code in all {
            assert!(seen.insert(code.code()), "duplicate code {}", code.code());
        }
    }

    #[test]
    fn code_format_is_machine_friendly() {
        let code = ErrorCode::GraphqlError.code();
        assert_eq!(code.len(), 5);
        assert!(code.starts_with('E'));
        assert!(code.chars().skip(1).all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn graphql_messages_are_surfaced_verbatim() {
        let err = HubError::Graphql {
            messages: vec!["Organization not found".into()],
        };
        assert_eq!(err.to_string(), "Organization not found");
        assert_eq!(err.code(), ErrorCode::GraphqlError);

        let err = HubError::Graphql {
            messages: vec!["first".into(), "second".into()],
        };
        assert_eq!(err.to_string(), "first; second");
    }
}
