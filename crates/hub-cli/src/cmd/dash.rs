//! `hub dash`: full-screen dashboard.

use std::io::IsTerminal;

use clap::Args;

use crate::cmd::Session;
use crate::output::{CliError, render_error};
use crate::tui;

#[derive(Args, Debug)]
pub struct DashArgs {
    /// Override `dashboard.poll_ms` for this session.
    #[arg(long, value_name = "MS")]
    pub poll_ms: Option<u64>,
}

pub fn run_dash(args: &DashArgs, session: &Session) -> anyhow::Result<()> {
    if !std::io::stdout().is_terminal() {
        render_error(
            session.output,
            &CliError::with_details(
                "the dashboard needs an interactive terminal",
                "use `hub tree` for non-interactive output",
                "not_a_tty",
            ),
        )?;
        anyhow::bail!("stdout is not a terminal");
    }

    let mut config = session.config.clone();
    if let Some(poll_ms) = args.poll_ms {
        config.poll_ms = poll_ms.max(10);
    }
    tracing::info!(endpoint = %config.endpoint, poll_ms = config.poll_ms, "starting dashboard");
    tui::run_dashboard(&config)
}
