use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Lifecycle status of a project as reported by the backend.
///
/// Unknown values are preserved verbatim so a newer backend never breaks
/// snapshot decoding.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ProjectStatus {
    #[default]
    Planned,
    Active,
    Completed,
    Other(String),
}

impl ProjectStatus {
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Planned => "PLANNED",
            Self::Active => "ACTIVE",
            Self::Completed => "COMPLETED",
            Self::Other(raw) => raw.as_str(),
        }
    }
}

/// Workflow status of a task. `Done` is the terminal display state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TaskStatus {
    #[default]
    Todo,
    InProgress,
    Done,
    Other(String),
}

impl TaskStatus {
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Todo => "TODO",
            Self::InProgress => "IN_PROGRESS",
            Self::Done => "DONE",
            Self::Other(raw) => raw.as_str(),
        }
    }

    /// Returns true for the terminal display state.
    #[must_use]
    pub const fn is_done(&self) -> bool {
        matches!(self, Self::Done)
    }
}

impl From<String> for ProjectStatus {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "PLANNED" => Self::Planned,
            "ACTIVE" => Self::Active,
            "COMPLETED" => Self::Completed,
            _ => Self::Other(raw),
        }
    }
}

impl From<ProjectStatus> for String {
    fn from(status: ProjectStatus) -> Self {
        match status {
            ProjectStatus::Other(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl From<String> for TaskStatus {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "TODO" => Self::Todo,
            "IN_PROGRESS" => Self::InProgress,
            "DONE" => Self::Done,
            _ => Self::Other(raw),
        }
    }
}

impl From<TaskStatus> for String {
    fn from(status: TaskStatus) -> Self {
        match status {
            TaskStatus::Other(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing a status from user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseStatusError {
    pub expected: &'static str,
    pub got: String,
}

impl fmt::Display for ParseStatusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid {}: '{}'", self.expected, self.got)
    }
}

impl std::error::Error for ParseStatusError {}

fn normalize(input: &str) -> String {
    input.trim().to_ascii_uppercase().replace(['-', ' '], "_")
}

// User input is strict: only the values the backend documents are accepted.
impl FromStr for ProjectStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "PLANNED" => Ok(Self::Planned),
            "ACTIVE" => Ok(Self::Active),
            "COMPLETED" => Ok(Self::Completed),
            _ => Err(ParseStatusError {
                expected: "project status (PLANNED, ACTIVE, COMPLETED)",
                got: s.to_string(),
            }),
        }
    }
}

impl FromStr for TaskStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "TODO" => Ok(Self::Todo),
            "IN_PROGRESS" => Ok(Self::InProgress),
            "DONE" => Ok(Self::Done),
            _ => Err(ParseStatusError {
                expected: "task status (TODO, IN_PROGRESS, DONE)",
                got: s.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ProjectStatus, TaskStatus};
    use std::str::FromStr;

    #[test]
    fn wire_values_roundtrip_through_json() {
        assert_eq!(
            serde_json::to_string(&TaskStatus::InProgress).expect("serialize"),
            "\"IN_PROGRESS\""
        );
        assert_eq!(
            serde_json::from_str::<ProjectStatus>("\"ACTIVE\"").expect("deserialize"),
            ProjectStatus::Active
        );
    }

    #[test]
    fn unknown_wire_values_are_preserved() {
        let status: TaskStatus = serde_json::from_str("\"BLOCKED\"").expect("deserialize");
        assert_eq!(status, TaskStatus::Other("BLOCKED".to_string()));
        assert_eq!(serde_json::to_string(&status).expect("serialize"), "\"BLOCKED\"");
    }

    #[test]
    fn user_input_is_normalized() {
        assert_eq!(TaskStatus::from_str("in-progress"), Ok(TaskStatus::InProgress));
        assert_eq!(TaskStatus::from_str(" done "), Ok(TaskStatus::Done));
        assert_eq!(ProjectStatus::from_str("completed"), Ok(ProjectStatus::Completed));
    }

    #[test]
    fn user_input_rejects_unknown_values() {
        let err = TaskStatus::from_str("blocked").expect_err("should reject");
        assert_eq!(err.got, "blocked");
        assert!(err.to_string().contains("TODO, IN_PROGRESS, DONE"));
    }

    #[test]
    fn defaults_match_backend_defaults() {
        assert_eq!(ProjectStatus::default(), ProjectStatus::Planned);
        assert_eq!(TaskStatus::default(), TaskStatus::Todo);
        assert!(TaskStatus::Done.is_done());
        assert!(!TaskStatus::Other("DONE ".into()).is_done());
    }
}
