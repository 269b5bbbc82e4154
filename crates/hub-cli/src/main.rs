#![forbid(unsafe_code)]

mod cmd;
mod output;
mod present;
mod remote;
mod tui;
mod validate;

use clap::{CommandFactory, Parser, Subcommand};
use hub_core::config::{CliOverrides, EffectiveConfig, EnvOverrides, resolve_config};
use hub_core::error::ErrorCode;
use hub_core::timing;
use output::{CliError, OutputMode, render_error, resolve_output_mode};
use std::env;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

const LOG_VAR: &str = "HUB_LOG";
const LOG_FORMAT_VAR: &str = "HUB_LOG_FORMAT";

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "hub: client for the project hub GraphQL API",
    long_about = None
)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit command timing report to stderr.
    #[arg(long, global = true)]
    timing: bool,

    /// GraphQL endpoint (overrides HUB_ENDPOINT and config files).
    #[arg(long, global = true, value_name = "URL")]
    endpoint: Option<String>,

    /// Output format: pretty, text or json.
    #[arg(long, global = true, value_enum, value_name = "FORMAT")]
    format: Option<OutputMode>,

    /// Shorthand for --format json.
    #[arg(long, global = true, hide = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        next_help_heading = "Read",
        about = "Print the organization tree",
        long_about = "Load every organization with its projects, tasks and comments and print it.",
        after_help = "EXAMPLES:\n    # Everything\n    hub tree\n\n    # One organization, without comments\n    hub tree --org acme --no-comments\n\n    # Emit machine-readable output\n    hub tree --format json"
    )]
    Tree(cmd::tree::TreeArgs),

    #[command(
        next_help_heading = "Read",
        about = "List organizations",
        after_help = "EXAMPLES:\n    # List organizations with project counts\n    hub orgs\n\n    # Emit machine-readable output\n    hub orgs --format json"
    )]
    Orgs,

    #[command(
        next_help_heading = "Read",
        about = "Show one project",
        long_about = "Show a project with its tasks and their comments.",
        after_help = "EXAMPLES:\n    # Show project 12\n    hub show 12\n\n    # Emit machine-readable output\n    hub show 12 --format json"
    )]
    Show(cmd::show::ShowArgs),

    #[command(next_help_heading = "Write", about = "Create or rename projects")]
    Project(cmd::project::ProjectArgs),

    #[command(next_help_heading = "Write", about = "Create tasks and change their status")]
    Task(cmd::task::TaskArgs),

    #[command(next_help_heading = "Write", about = "Add or delete comments")]
    Comment(cmd::comment::CommentArgs),

    #[command(
        next_help_heading = "Interactive",
        about = "Open the dashboard",
        long_about = "Open a full-screen dashboard for browsing and editing projects, tasks and comments.",
        after_help = "EXAMPLES:\n    # Open the dashboard\n    hub dash\n\n    # Against another backend\n    hub --endpoint https://hub.example/graphql/ dash"
    )]
    Dash(cmd::dash::DashArgs),

    #[command(
        next_help_heading = "Setup",
        about = "Show or edit configuration",
        long_about = "Show the effective configuration, or set and unset keys in the user or project config file.",
        after_help = "EXAMPLES:\n    # Effective configuration\n    hub config\n\n    # Point at a different backend for this user\n    hub config set endpoint https://hub.example/graphql/\n\n    # Slow the dashboard poll for this project\n    hub config set --scope project dashboard.poll_ms 250"
    )]
    Config(cmd::config::ConfigArgs),

    #[command(
        next_help_heading = "Setup",
        about = "Generate shell completion scripts",
        long_about = "Generate shell completion scripts for supported shells.",
        after_help = "EXAMPLES:\n    # Generate bash completions\n    hub completions bash\n\n    # Generate zsh completions\n    hub completions zsh"
    )]
    Completions(cmd::completions::CompletionsArgs),
}

impl Commands {
    const fn is_dashboard(&self) -> bool {
        matches!(self, Self::Dash(_))
    }
}

/// Where the dashboard sends its logs while it owns the terminal.
fn dashboard_log_path() -> Option<PathBuf> {
    dirs::cache_dir().map(|dir| dir.join("hub").join("dash.log"))
}

fn default_filter(verbose: bool) -> &'static str {
    if env::var("DEBUG").is_ok() {
        "hub=debug,info"
    } else if verbose {
        "hub=info,warn"
    } else {
        "hub=warn"
    }
}

fn init_tracing(verbose: bool, log_file: Option<&Path>) {
    let filter =
        EnvFilter::try_from_env(LOG_VAR).unwrap_or_else(|_| EnvFilter::new(default_filter(verbose)));

    let format = env::var(LOG_FORMAT_VAR).unwrap_or_else(|_| "compact".to_string());

    let file = log_file.and_then(|path| {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).ok()?;
        }
        std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .ok()
    });

    let registry = tracing_subscriber::registry().with(filter);

    match (file, format.as_str()) {
        (Some(file), "json") => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(Mutex::new(file)))
                .init();
        }
        (Some(file), _) => {
            registry
                .with(fmt::layer().compact().with_ansi(false).with_writer(Mutex::new(file)))
                .init();
        }
        (None, "json") => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        (None, _) => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

/// Output mode before config files are read: flags, then `FORMAT`.
fn early_output_mode(cli: &Cli) -> OutputMode {
    let env = EnvOverrides::from_env();
    resolve_output_mode(cli.format, cli.json, env.format.as_deref())
}

fn load_config(cli: &Cli, cwd: &Path) -> anyhow::Result<EffectiveConfig> {
    let overrides = CliOverrides {
        endpoint: cli.endpoint.clone(),
        output: None,
    };
    resolve_config(cwd, &overrides).map_err(|err| {
        let code = if err.to_string().contains("endpoint") {
            ErrorCode::InvalidEndpoint
        } else {
            ErrorCode::ConfigParseError
        };
        let _ = render_error(
            early_output_mode(cli),
            &CliError::with_details(
                format!("{err:#}"),
                code.hint().unwrap_or("Run `hub config show`."),
                code.code(),
            ),
        );
        err
    })
}

fn open_session(cli: &Cli, cwd: &Path) -> anyhow::Result<cmd::Session> {
    let config = load_config(cli, cwd)?;
    let output = resolve_output_mode(cli.format, cli.json, config.output.as_deref());
    Ok(cmd::Session::new(config, output))
}

fn run(cli: &Cli, cwd: &Path) -> anyhow::Result<()> {
    match &cli.command {
        Commands::Completions(args) => timing::timed("cmd.completions", || {
            let mut command = Cli::command();
            cmd::completions::run_completions(args.shell, &mut command)
        }),
        Commands::Config(args) => timing::timed("cmd.config", || {
            let overrides = CliOverrides {
                endpoint: cli.endpoint.clone(),
                output: None,
            };
            cmd::config::run_config(args, cwd, &overrides, early_output_mode(cli))
        }),
        command => {
            let session = open_session(cli, cwd)?;
            match command {
                Commands::Tree(args) => {
                    timing::timed("cmd.tree", || cmd::tree::run_tree(args, &session))
                }
                Commands::Orgs => timing::timed("cmd.orgs", || cmd::orgs::run_orgs(&session)),
                Commands::Show(args) => {
                    timing::timed("cmd.show", || cmd::show::run_show(args, &session))
                }
                Commands::Project(args) => timing::timed("cmd.project", || {
                    cmd::project::run_project(args, &session)
                }),
                Commands::Task(args) => {
                    timing::timed("cmd.task", || cmd::task::run_task(args, &session))
                }
                Commands::Comment(args) => timing::timed("cmd.comment", || {
                    cmd::comment::run_comment(args, &session)
                }),
                Commands::Dash(args) => cmd::dash::run_dash(args, &session),
                Commands::Completions(_) | Commands::Config(_) => Ok(()),
            }
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_file = cli
        .command
        .is_dashboard()
        .then(dashboard_log_path)
        .flatten();
    init_tracing(cli.verbose, log_file.as_deref());

    let timing_enabled = cli.timing || timing::timing_enabled_from_env();
    timing::set_timing_enabled(timing_enabled);
    timing::clear_timings();

    if cli.verbose {
        info!("Verbose mode enabled");
    }

    let cwd = env::current_dir()?;
    let command_result = run(&cli, &cwd);

    if timing_enabled {
        let report = timing::collect_report();
        if report.is_empty() {
            eprintln!("timing report: no samples recorded");
        } else {
            eprintln!("timing report:");
            eprintln!("{}", report.display_table());
            eprintln!("timing report (json):");
            eprintln!("{}", serde_json::to_string_pretty(&report.to_json())?);
        }
    }

    command_result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timing_flag_parses_before_subcommand() {
        let cli = Cli::parse_from(["hub", "--timing", "orgs"]);
        assert!(cli.timing);
        assert!(matches!(cli.command, Commands::Orgs));
    }

    #[test]
    fn timing_flag_parses_after_subcommand() {
        let cli = Cli::parse_from(["hub", "tree", "--timing", "--no-comments"]);
        assert!(cli.timing);
        assert!(matches!(cli.command, Commands::Tree(ref a) if a.no_comments));
    }

    #[test]
    fn format_flag_is_global() {
        let cli = Cli::parse_from(["hub", "orgs", "--format", "json"]);
        assert_eq!(cli.format, Some(OutputMode::Json));
        let cli = Cli::parse_from(["hub", "--json", "tree"]);
        assert!(cli.json);
    }

    #[test]
    fn endpoint_flag_is_global() {
        let cli = Cli::parse_from(["hub", "show", "12", "--endpoint", "http://h/graphql/"]);
        assert_eq!(cli.endpoint.as_deref(), Some("http://h/graphql/"));
    }

    #[test]
    fn completions_subcommand_parses() {
        let cli = Cli::parse_from(["hub", "completions", "bash"]);
        assert!(matches!(
            cli.command,
            Commands::Completions(cmd::completions::CompletionsArgs {
                shell: clap_complete::Shell::Bash,
            })
        ));
    }

    #[test]
    fn only_dash_logs_to_a_file() {
        assert!(Cli::parse_from(["hub", "dash"]).command.is_dashboard());
        assert!(!Cli::parse_from(["hub", "tree"]).command.is_dashboard());
    }

    #[test]
    fn verbose_raises_the_default_filter() {
        if env::var("DEBUG").is_err() {
            assert_eq!(default_filter(false), "hub=warn");
            assert_eq!(default_filter(true), "hub=info,warn");
        }
    }

    #[test]
    fn all_subcommands_listed() {
        let subcommands = [
            vec!["hub", "tree"],
            vec!["hub", "orgs"],
            vec!["hub", "show", "12"],
            vec!["hub", "project", "create", "--org", "acme", "--name", "Launch"],
            vec!["hub", "project", "create", "--org", "acme", "--name", "L", "--status", "active"],
            vec!["hub", "project", "rename", "12", "Launch v2"],
            vec!["hub", "task", "create", "--project", "12", "--title", "Write spec"],
            vec!["hub", "task", "status", "34", "in_progress"],
            vec!["hub", "task", "done", "34"],
            vec!["hub", "comment", "add", "34", "hello"],
            vec!["hub", "comment", "rm", "56", "--yes"],
            vec!["hub", "comment", "delete", "56"],
            vec!["hub", "dash"],
            vec!["hub", "config"],
            vec!["hub", "config", "show", "--user"],
            vec!["hub", "config", "set", "endpoint", "http://x/graphql/"],
            vec!["hub", "config", "unset", "--scope", "project", "output"],
            vec!["hub", "completions", "zsh"],
        ];
        for args in &subcommands {
            let result = Cli::try_parse_from(args.iter());
            assert!(result.is_ok(), "Failed to parse: {args:?}: {:?}", result.err());
        }
    }

    #[test]
    fn bad_status_is_a_parse_error() {
        assert!(Cli::try_parse_from(["hub", "task", "status", "34", "blocked"]).is_err());
        assert!(
            Cli::try_parse_from(["hub", "project", "create", "--org", "a", "--name", "n", "--status", "x"])
                .is_err()
        );
    }

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }
}
