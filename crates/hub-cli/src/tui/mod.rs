//! Terminal user interface (TUI) for hub.
//!
//! ## Entry points
//!
//! - [`run_dashboard`]: full-screen organization/project/task dashboard.
//!
//! The event loop is the single owner of the [`Dispatcher`]: it drains
//! settled requests every `dashboard.poll_ms`, redraws, and turns key
//! presses into submissions.

pub mod dashboard;
mod render;

use std::io::{self, Write};
use std::sync::Arc;

use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use hub_core::config::EffectiveConfig;
use hub_core::{Dispatcher, Mutation, Settled};
use ratatui::{Terminal, backend::CrosstermBackend};

use crate::remote::HttpTransport;
use dashboard::{DashAction, Dashboard};

/// Launch the dashboard against the configured endpoint.
pub fn run_dashboard(config: &EffectiveConfig) -> Result<()> {
    let transport = Arc::new(HttpTransport::from_config(config));
    let mut dispatcher = Dispatcher::new(transport);
    dispatcher.begin_load();

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        let _ = io::stdout().flush();
        original_hook(panic_info);
    }));

    let result = run_event_loop(&mut terminal, &mut dispatcher, config);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    let pending = dispatcher.in_flight();
    if pending > 0 {
        tracing::info!(pending, "waiting for in-flight requests before exit");
        eprintln!("{}", exit_wait_message(pending, config.timeout_secs));
        let _ = dispatcher.wait_all();
    }
    result
}

fn exit_wait_message(pending: usize, timeout_secs: u64) -> String {
    let noun = if pending == 1 { "request" } else { "requests" };
    format!("Waiting for {pending} in-flight {noun} (up to {timeout_secs}s)…")
}

fn run_event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    dispatcher: &mut Dispatcher,
    config: &EffectiveConfig,
) -> Result<()> {
    let mut dash = Dashboard::new();
    let mut loaded_once = false;
    let tick = config.poll_interval();

    loop {
        for settled in dispatcher.poll() {
            loaded_once |= on_settled(&mut dash, &settled);
        }
        dash.sync(dispatcher.snapshot());

        terminal.draw(|frame| render::render(frame, &dash, dispatcher, loaded_once))?;

        if !event::poll(tick)? {
            continue;
        }
        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }

        let action = if render::tree_visible(dispatcher.store().load_state(), loaded_once) {
            dash.handle_key(key, dispatcher.snapshot())
        } else {
            dash.handle_key_without_tree(key)
        };
        match action {
            DashAction::None => {}
            DashAction::Quit => return Ok(()),
            DashAction::Reload => {
                dispatcher.begin_load();
                dash.set_status("Reloading…");
            }
            DashAction::DismissNotice => {
                dispatcher.notices_mut().dismiss_latest();
            }
            DashAction::Submit(mutation) => {
                let summary = mutation.summary();
                let request = dispatcher.submit(mutation);
                tracing::debug!(%request, %summary, "submitted from dashboard");
            }
        }
    }
}

/// Report a settled request in the status bar. Returns true for a
/// successful load.
fn on_settled(dash: &mut Dashboard, settled: &Settled) -> bool {
    match settled {
        Settled::Loaded { result: Ok(counts), .. } => {
            dash.set_status(format!(
                "Loaded {} organizations, {} projects, {} tasks",
                counts.organizations, counts.projects, counts.tasks
            ));
            true
        }
        Settled::Mutated {
            mutation,
            result: Ok(_),
            ..
        } => {
            dash.set_status(done_message(mutation));
            false
        }
        // Failures already raised a notice.
        Settled::Loaded { result: Err(_), .. } | Settled::Mutated { result: Err(_), .. } => false,
    }
}

fn done_message(mutation: &Mutation) -> String {
    match mutation {
        Mutation::CreateProject { name, .. } => format!("Created project '{name}'"),
        Mutation::RenameProject { name, .. } => format!("Renamed project to '{name}'"),
        Mutation::CreateTask { title, .. } => format!("Created task '{title}'"),
        Mutation::UpdateTaskStatus { status, .. } => format!("Task marked {status}"),
        Mutation::CreateComment { .. } => "Comment added".to_string(),
        Mutation::DeleteComment { .. } => "Comment deleted".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hub_core::{HubError, LoadState};
    use hub_core::model::{EntityId, TaskStatus};
    use hub_core::snapshot::SnapshotCounts;
    use hub_core::store::RequestId;

    #[test]
    fn successful_load_is_reported() {
        let mut dash = Dashboard::new();
        let settled = Settled::Loaded {
            request: RequestId(1),
            result: Ok(SnapshotCounts {
                organizations: 2,
                projects: 3,
                tasks: 4,
                comments: 0,
            }),
        };
        assert!(on_settled(&mut dash, &settled));
        assert_eq!(dash.status(), Some("Loaded 2 organizations, 3 projects, 4 tasks"));
    }

    #[test]
    fn failures_leave_the_status_to_notices() {
        let mut dash = Dashboard::new();
        let settled = Settled::Mutated {
            request: RequestId(2),
            mutation: Mutation::UpdateTaskStatus {
                task_id: EntityId::from("t1"),
                status: TaskStatus::Done,
            },
            result: Err(HubError::Disconnected),
        };
        assert!(!on_settled(&mut dash, &settled));
        assert_eq!(dash.status(), None);
    }

    #[test]
    fn keys_reach_the_tree_only_when_it_is_drawn() {
        assert!(!render::tree_visible(&LoadState::Pending, false));
        assert!(render::tree_visible(&LoadState::Pending, true));
        assert!(render::tree_visible(&LoadState::Ready, true));
        assert!(!render::tree_visible(&LoadState::Failed("refused".into()), true));
    }

    #[test]
    fn exit_wait_names_the_request_count() {
        assert_eq!(
            exit_wait_message(1, 30),
            "Waiting for 1 in-flight request (up to 30s)…"
        );
        assert_eq!(
            exit_wait_message(3, 5),
            "Waiting for 3 in-flight requests (up to 5s)…"
        );
    }

    #[test]
    fn done_messages_name_the_entity() {
        let msg = done_message(&Mutation::CreateTask {
            project_id: EntityId::from("p1"),
            title: "Write spec".into(),
            description: None,
            status: None,
        });
        assert_eq!(msg, "Created task 'Write spec'");
    }
}
