use anyhow::{Context, Result, anyhow, bail};
use clap::{Args, Subcommand, ValueEnum};
use hub_core::config::{
    CliOverrides, EffectiveConfig, PROJECT_CONFIG, find_project_config, resolve_config,
};
use std::path::{Path, PathBuf};
use toml::Value;

use crate::output::OutputMode;

#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    command: Option<ConfigCommand>,
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Show resolved or raw configuration
    Show(ShowArgs),
    /// Set a configuration key in project or user scope
    Set(SetArgs),
    /// Unset a configuration key in project or user scope
    Unset(UnsetArgs),
}

#[derive(Args, Debug, Default)]
struct ShowArgs {
    /// Show raw project config only
    #[arg(long, conflicts_with = "user")]
    project: bool,

    /// Show raw user config only
    #[arg(long)]
    user: bool,
}

#[derive(Args, Debug)]
struct SetArgs {
    /// Scope to mutate
    #[arg(long, default_value = "user")]
    scope: ConfigScope,

    /// Key (endpoint, token, timeout_secs, output, dashboard.poll_ms)
    key: String,

    /// New value
    value: String,
}

#[derive(Args, Debug)]
struct UnsetArgs {
    /// Scope to mutate
    #[arg(long, default_value = "user")]
    scope: ConfigScope,

    /// Key (endpoint, token, timeout_secs, output, dashboard.poll_ms)
    key: String,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
enum ConfigScope {
    Project,
    User,
}

/// A key `hub` understands, split into optional section and leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct KnownKey {
    section: Option<&'static str>,
    leaf: &'static str,
}

const KNOWN_KEYS: [KnownKey; 5] = [
    KnownKey { section: None, leaf: "endpoint" },
    KnownKey { section: None, leaf: "token" },
    KnownKey { section: None, leaf: "timeout_secs" },
    KnownKey { section: None, leaf: "output" },
    KnownKey { section: Some("dashboard"), leaf: "poll_ms" },
];

pub fn run_config(
    args: &ConfigArgs,
    project_root: &Path,
    cli: &CliOverrides,
    output: OutputMode,
) -> Result<()> {
    match &args.command {
        None => run_show(&ShowArgs::default(), project_root, cli, output),
        Some(ConfigCommand::Show(show)) => run_show(show, project_root, cli, output),
        Some(ConfigCommand::Set(set)) => run_set(set, project_root, output),
        Some(ConfigCommand::Unset(unset)) => run_unset(unset, project_root, output),
    }
}

fn run_show(args: &ShowArgs, project_root: &Path, cli: &CliOverrides, output: OutputMode) -> Result<()> {
    if args.project {
        let value = load_toml_table(&project_config_path(project_root))?;
        print_toml_or_json(&redact_table(value), output);
        return Ok(());
    }

    if args.user {
        let value = load_toml_table(&user_config_path()?)?;
        print_toml_or_json(&redact_table(value), output);
        return Ok(());
    }

    let effective = resolve_config(project_root, cli)?;
    print_effective(&effective, output)?;
    Ok(())
}

fn run_set(args: &SetArgs, project_root: &Path, output: OutputMode) -> Result<()> {
    let path = scope_path(args.scope, project_root)?;
    let mut value = load_toml_table(&path)?;
    apply_set(&mut value, &args.key, &args.value)?;
    write_toml_table(&path, &value)?;
    tracing::debug!(path = %path.display(), key = %args.key, "config key set");
    render_mutation(output, "set", scope_label(args.scope), &args.key)?;
    Ok(())
}

fn run_unset(args: &UnsetArgs, project_root: &Path, output: OutputMode) -> Result<()> {
    let path = scope_path(args.scope, project_root)?;
    let mut value = load_toml_table(&path)?;
    apply_unset(&mut value, &args.key)?;
    write_toml_table(&path, &value)?;
    tracing::debug!(path = %path.display(), key = %args.key, "config key unset");
    render_mutation(output, "unset", scope_label(args.scope), &args.key)?;
    Ok(())
}

fn scope_path(scope: ConfigScope, project_root: &Path) -> Result<PathBuf> {
    match scope {
        ConfigScope::Project => Ok(project_config_path(project_root)),
        ConfigScope::User => user_config_path(),
    }
}

fn apply_set(root: &mut Value, key: &str, raw: &str) -> Result<()> {
    let known = split_known_key(key)?;
    let parsed = parse_value(known, raw)?;

    let table = root
        .as_table_mut()
        .ok_or_else(|| anyhow!("Config root must be a TOML table"))?;

    let target = match known.section {
        None => table,
        Some(section) => table
            .entry(section.to_string())
            .or_insert_with(|| Value::Table(toml::map::Map::new()))
            .as_table_mut()
            .ok_or_else(|| anyhow!("Section {section} must be a TOML table"))?,
    };

    target.insert(known.leaf.to_string(), parsed);
    Ok(())
}

fn apply_unset(root: &mut Value, key: &str) -> Result<()> {
    let known = split_known_key(key)?;
    let table = root
        .as_table_mut()
        .ok_or_else(|| anyhow!("Config root must be a TOML table"))?;

    match known.section {
        None => {
            table.remove(known.leaf);
        }
        Some(section) => {
            if let Some(section_entry) = table.get_mut(section)
                && let Some(section_table) = section_entry.as_table_mut()
            {
                section_table.remove(known.leaf);
                if section_table.is_empty() {
                    table.remove(section);
                }
            }
        }
    }

    Ok(())
}

fn split_known_key(key: &str) -> Result<KnownKey> {
    let (section, leaf) = match key.split_once('.') {
        Some((section, leaf)) => (Some(section), leaf),
        None => (None, key),
    };

    KNOWN_KEYS
        .into_iter()
        .find(|k| k.section == section && k.leaf == leaf)
        .ok_or_else(|| {
            anyhow!(
                "Unsupported key `{key}`; expected one of: endpoint, token, timeout_secs, output, dashboard.poll_ms"
            )
        })
}

fn parse_value(key: KnownKey, raw: &str) -> Result<Value> {
    match (key.section, key.leaf) {
        (None, "timeout_secs") | (Some("dashboard"), "poll_ms") => {
            let number: u32 = raw
                .trim()
                .parse()
                .with_context(|| format!("{} expects a positive integer", key.leaf))?;
            if number == 0 {
                bail!("{} must be greater than zero", key.leaf);
            }
            Ok(Value::Integer(i64::from(number)))
        }
        (None, "output") => match raw.trim().to_ascii_lowercase().as_str() {
            value @ ("pretty" | "text" | "json") => Ok(Value::String(value.to_string())),
            _ => bail!("output expects pretty, text or json"),
        },
        (None, "endpoint") => {
            let trimmed = raw.trim();
            if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
                bail!("endpoint must be an http(s) URL");
            }
            Ok(Value::String(trimmed.to_string()))
        }
        _ => Ok(Value::String(raw.to_string())),
    }
}

fn load_toml_table(path: &Path) -> Result<Value> {
    if !path.exists() {
        return Ok(Value::Table(toml::map::Map::new()));
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let value: Value =
        toml::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))?;

    if !value.is_table() {
        bail!("{} must contain a top-level TOML table", path.display());
    }

    Ok(value)
}

fn write_toml_table(path: &Path, value: &Value) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    let serialized = toml::to_string_pretty(value)?;
    std::fs::write(path, serialized).with_context(|| format!("Failed to write {}", path.display()))
}

/// Raw files may hold a token; never echo it.
fn redact_table(mut value: Value) -> Value {
    if let Some(token) = value.as_table_mut().and_then(|t| t.get_mut("token")) {
        *token = Value::String("<redacted>".to_string());
    }
    value
}

fn print_toml_or_json(value: &Value, output: OutputMode) {
    match output {
        OutputMode::Json => match serde_json::to_string_pretty(value) {
            Ok(json) => println!("{json}"),
            Err(_) => println!("{{}}"),
        },
        OutputMode::Text | OutputMode::Pretty => {
            println!("{}", toml::to_string_pretty(value).unwrap_or_default());
        }
    }
}

fn effective_lines(value: &EffectiveConfig) -> Vec<(&'static str, String)> {
    let path = |p: Option<&PathBuf>| p.map_or_else(|| "-".to_string(), |p| p.display().to_string());
    vec![
        ("endpoint", value.endpoint.clone()),
        (
            "token",
            if value.token.is_some() { "<redacted>" } else { "-" }.to_string(),
        ),
        ("timeout_secs", value.timeout_secs.to_string()),
        ("output", value.output.clone().unwrap_or_else(|| "-".to_string())),
        ("dashboard.poll_ms", value.poll_ms.to_string()),
        ("user_file", path(value.user_file.as_ref())),
        ("project_file", path(value.project_file.as_ref())),
    ]
}

fn print_effective(value: &EffectiveConfig, output: OutputMode) -> Result<()> {
    match output {
        OutputMode::Json => {
            println!("{}", serde_json::to_string_pretty(value)?);
        }
        OutputMode::Text => {
            for (key, val) in effective_lines(value) {
                println!("{key}={val}");
            }
        }
        OutputMode::Pretty => {
            for (key, val) in effective_lines(value) {
                println!("{key:<18} {val}");
            }
        }
    }

    Ok(())
}

fn render_mutation(output: OutputMode, action: &str, scope: &str, key: &str) -> Result<()> {
    match output {
        OutputMode::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(&serde_json::json!({
                    "ok": true,
                    "action": action,
                    "scope": scope,
                    "key": key,
                }))?
            );
        }
        OutputMode::Text => {
            println!("ok=true action={action} scope={scope} key={key}");
        }
        OutputMode::Pretty => {
            println!("{} {} in {} config", action_to_title(action), key, scope);
        }
    }
    Ok(())
}

fn action_to_title(action: &str) -> &'static str {
    match action {
        "set" => "Set",
        "unset" => "Unset",
        _ => "Updated",
    }
}

/// The discovered project file, or `.hub/config.toml` under `project_root`.
fn project_config_path(project_root: &Path) -> PathBuf {
    find_project_config(project_root).unwrap_or_else(|| project_root.join(PROJECT_CONFIG))
}

fn user_config_path() -> Result<PathBuf> {
    hub_core::config::user_config_path()
        .ok_or_else(|| anyhow!("Unable to resolve user config directory"))
}

const fn scope_label(scope: ConfigScope) -> &'static str {
    match scope {
        ConfigScope::Project => "project",
        ConfigScope::User => "user",
    }
}
