use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_ENDPOINT: &str = "http://localhost:8000/graphql/";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_POLL_MS: u64 = 100;

/// Project-level config location, relative to the project root.
pub const PROJECT_CONFIG: &str = ".hub/config.toml";

/// One `config.toml`, user- or project-level. Every field is optional so
/// the layers can be merged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    #[serde(default)]
    pub output: Option<String>,
    #[serde(default)]
    pub dashboard: DashboardConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DashboardConfig {
    /// How often the dashboard drains completed requests, in milliseconds.
    #[serde(default)]
    pub poll_ms: Option<u64>,
}

/// Values taken from the environment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvOverrides {
    pub endpoint: Option<String>,
    pub token: Option<String>,
    pub format: Option<String>,
}

impl EnvOverrides {
    /// Read `HUB_ENDPOINT`, `HUB_TOKEN` and `FORMAT`. Empty values count as unset.
    #[must_use]
    pub fn from_env() -> Self {
        let var = |name: &str| std::env::var(name).ok().filter(|v| !v.trim().is_empty());
        Self {
            endpoint: var("HUB_ENDPOINT"),
            token: var("HUB_TOKEN"),
            format: var("FORMAT"),
        }
    }
}

/// Values given on the command line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CliOverrides {
    pub endpoint: Option<String>,
    pub output: Option<String>,
}

/// The merged configuration every command runs with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EffectiveConfig {
    pub endpoint: String,
    #[serde(skip_serializing_if = "Option::is_none", serialize_with = "redact")]
    pub token: Option<String>,
    pub timeout_secs: u64,
    pub output: Option<String>,
    pub poll_ms: u64,
    pub user_file: Option<PathBuf>,
    pub project_file: Option<PathBuf>,
}

#[allow(clippy::ref_option)]
fn redact<S: serde::Serializer>(token: &Option<String>, s: S) -> Result<S::Ok, S::Error> {
    match token {
        Some(_) => s.serialize_str("<redacted>"),
        None => s.serialize_none(),
    }
}

impl EffectiveConfig {
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_ms)
    }
}

/// Path of the user-level config file, if the platform has a config dir.
#[must_use]
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("hub/config.toml"))
}

/// Walk upward from `start` looking for `.hub/config.toml`.
#[must_use]
pub fn find_project_config(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .map(|dir| dir.join(PROJECT_CONFIG))
        .find(|candidate| candidate.is_file())
}

/// Load one config file. A missing file is an empty config.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_file_config(path: &Path) -> Result<FileConfig> {
    if !path.exists() {
        return Ok(FileConfig::default());
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<FileConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

/// Merge all layers. Precedence, highest first: flags, environment,
/// project file, user file, defaults.
///
/// # Errors
///
/// Returns an error if the chosen endpoint is not an http(s) URL or the
/// timeout is zero.
pub fn merge(
    cli: &CliOverrides,
    env: &EnvOverrides,
    project: &FileConfig,
    user: &FileConfig,
) -> Result<EffectiveConfig> {
    let endpoint = cli
        .endpoint
        .clone()
        .or_else(|| env.endpoint.clone())
        .or_else(|| project.endpoint.clone())
        .or_else(|| user.endpoint.clone())
        .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());
    validate_endpoint(&endpoint)?;

    let timeout_secs = project
        .timeout_secs
        .or(user.timeout_secs)
        .unwrap_or(DEFAULT_TIMEOUT_SECS);
    if timeout_secs == 0 {
        bail!("timeout_secs must be greater than zero");
    }

    Ok(EffectiveConfig {
        endpoint,
        token: env
            .token
            .clone()
            .or_else(|| project.token.clone())
            .or_else(|| user.token.clone()),
        timeout_secs,
        output: cli
            .output
            .clone()
            .or_else(|| env.format.clone())
            .or_else(|| project.output.clone())
            .or_else(|| user.output.clone()),
        poll_ms: project
            .dashboard
            .poll_ms
            .or(user.dashboard.poll_ms)
            .unwrap_or(DEFAULT_POLL_MS)
            .max(10),
        user_file: None,
        project_file: None,
    })
}

/// Load both config files and merge them with `cli` and the environment.
///
/// # Errors
///
/// Returns an error if a config file is malformed or the result is invalid.
pub fn resolve_config(start_dir: &Path, cli: &CliOverrides) -> Result<EffectiveConfig> {
    let user_path = user_config_path().filter(|p| p.exists());
    let project_path = find_project_config(start_dir);

    let user = match &user_path {
        Some(path) => load_file_config(path)?,
        None => FileConfig::default(),
    };
    let project = match &project_path {
        Some(path) => load_file_config(path)?,
        None => FileConfig::default(),
    };

    let mut effective = merge(cli, &EnvOverrides::from_env(), &project, &user)?;
    effective.user_file = user_path;
    effective.project_file = project_path;
    tracing::debug!(
        endpoint = %effective.endpoint,
        project_file = ?effective.project_file,
        user_file = ?effective.user_file,
        "configuration resolved"
    );
    Ok(effective)
}

fn validate_endpoint(endpoint: &str) -> Result<()> {
    let rest = endpoint
        .strip_prefix("http://")
        .or_else(|| endpoint.strip_prefix("https://"));
    match rest {
        Some(host) if !host.is_empty() && !host.starts_with('/') => Ok(()),
        _ => bail!("endpoint must be an http(s) URL, got '{endpoint}'"),
    }
}
