use crate::output::CliError;

/// Backend column limits.
pub const MAX_NAME_LEN: usize = 100;
pub const MAX_TITLE_LEN: usize = 200;
pub const MAX_COMMENT_LEN: usize = 8_192;

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub field: &'static str,
    pub value: String,
    pub reason: String,
    pub suggestion: String,
    pub code: &'static str,
}

impl ValidationError {
    pub fn new(
        field: &'static str,
        value: impl Into<String>,
        reason: impl Into<String>,
        suggestion: impl Into<String>,
        code: &'static str,
    ) -> Self {
        Self {
            field,
            value: value.into(),
            reason: reason.into(),
            suggestion: suggestion.into(),
            code,
        }
    }

    pub fn to_cli_error(&self) -> CliError {
        CliError::with_details(
            format!("invalid {} '{}': {}", self.field, preview(&self.value), self.reason),
            self.suggestion.clone(),
            self.code,
        )
    }
}

fn preview(value: &str) -> String {
    const PREVIEW: usize = 40;
    if value.chars().count() <= PREVIEW {
        value.to_string()
    } else {
        let head: String = value.chars().take(PREVIEW).collect();
        format!("{head}…")
    }
}

/// Single-line label check shared by project names and task titles.
/// Returns the trimmed value.
fn validate_label(
    field: &'static str,
    s: &str,
    max: usize,
    code: &'static str,
) -> Result<String, ValidationError> {
    let value = s.trim();
    if value.is_empty() {
        return Err(ValidationError::new(
            field,
            s,
            "must not be empty",
            format!("provide a non-empty {field}"),
            code,
        ));
    }
    if value.chars().count() > max {
        return Err(ValidationError::new(
            field,
            s,
            format!("must be <= {max} characters"),
            format!("shorten the {field}"),
            code,
        ));
    }
    if value.chars().any(char::is_control) {
        return Err(ValidationError::new(
            field,
            s,
            "must not contain control characters",
            format!("remove control characters from the {field}"),
            code,
        ));
    }
    Ok(value.to_string())
}

pub fn validate_project_name(s: &str) -> Result<String, ValidationError> {
    validate_label("name", s, MAX_NAME_LEN, "invalid_name")
}

pub fn validate_task_title(s: &str) -> Result<String, ValidationError> {
    validate_label("title", s, MAX_TITLE_LEN, "invalid_title")
}

/// Comments may span lines; tabs and newlines are allowed.
pub fn validate_comment(s: &str) -> Result<String, ValidationError> {
    if s.trim().is_empty() {
        return Err(ValidationError::new(
            "comment",
            s,
            "must not be empty",
            "write some text before submitting",
            "invalid_comment",
        ));
    }
    if s.chars().count() > MAX_COMMENT_LEN {
        return Err(ValidationError::new(
            "comment",
            s,
            format!("must be <= {MAX_COMMENT_LEN} characters"),
            "split the comment into several",
            "invalid_comment",
        ));
    }
    if s.chars().any(|ch| ch.is_control() && ch != '\n' && ch != '\t') {
        return Err(ValidationError::new(
            "comment",
            s,
            "must not contain control characters",
            "use plain UTF-8 text",
            "invalid_comment",
        ));
    }
    Ok(s.trim().to_string())
}

/// Identifiers are opaque, but never empty or padded.
pub fn validate_id(field: &'static str, s: &str) -> Result<String, ValidationError> {
    let value = s.trim();
    if value.is_empty() || value.chars().any(char::is_whitespace) {
        return Err(ValidationError::new(
            field,
            s,
            "must be a non-empty identifier without spaces",
            "copy the id from `hub tree`",
            "invalid_id",
        ));
    }
    Ok(value.to_string())
}

pub fn validate_slug(s: &str) -> Result<String, ValidationError> {
    let value = s.trim();
    if value.is_empty()
        || !value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::new(
            "org",
            s,
            "must be an organization slug (letters, digits, '-', '_')",
            "list slugs with `hub orgs`",
            "invalid_slug",
        ));
    }
    Ok(value.to_string())
}
