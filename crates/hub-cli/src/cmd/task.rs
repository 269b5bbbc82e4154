//! `hub task`: create tasks and move them through their workflow.

use std::str::FromStr;

use clap::{Args, Subcommand};
use hub_core::model::{EntityId, TaskStatus};
use hub_core::{Mutation, Patch, PatchOutcome};
use serde::Serialize;

use crate::cmd::project::optional_text;
use crate::cmd::{Session, invalid, not_found, unexpected};
use crate::output::render_mode;
use crate::validate;

#[derive(Args, Debug)]
pub struct TaskArgs {
    #[command(subcommand)]
    pub command: TaskCommand,
}

#[derive(Subcommand, Debug)]
pub enum TaskCommand {
    #[command(
        about = "Create a task in a project",
        after_help = "EXAMPLES:\n    # Create a task\n    hub task create --project 12 --title \"Write spec\"\n\n    # Start it in progress\n    hub task create --project 12 --title \"Write spec\" --status in-progress"
    )]
    Create(CreateArgs),

    #[command(
        about = "Set a task's status",
        after_help = "EXAMPLES:\n    # Start work\n    hub task status 34 in-progress\n\n    # Emit machine-readable output\n    hub task status 34 todo --format json"
    )]
    Status(StatusArgs),

    #[command(
        about = "Mark a task as complete",
        after_help = "EXAMPLES:\n    # Complete task 34\n    hub task done 34"
    )]
    Done(DoneArgs),
}

#[derive(Args, Debug)]
pub struct CreateArgs {
    /// Project ID (see `hub tree`).
    #[arg(long)]
    pub project: String,

    /// Task title.
    #[arg(long)]
    pub title: String,

    /// Optional description.
    #[arg(long)]
    pub description: Option<String>,

    /// Initial status: todo, in-progress or done.
    #[arg(long, value_parser = TaskStatus::from_str)]
    pub status: Option<TaskStatus>,
}

#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Task ID.
    pub id: String,

    /// New status: todo, in-progress or done.
    #[arg(value_parser = TaskStatus::from_str)]
    pub status: TaskStatus,
}

#[derive(Args, Debug)]
pub struct DoneArgs {
    /// Task ID.
    pub id: String,
}

#[derive(Debug, Serialize)]
struct TaskOutput {
    ok: bool,
    action: &'static str,
    project: String,
    id: String,
    title: String,
    status: String,
    outcome: PatchOutcome,
}

pub fn run_task(args: &TaskArgs, session: &Session) -> anyhow::Result<()> {
    match &args.command {
        TaskCommand::Create(create) => run_create(create, session),
        TaskCommand::Status(status) => run_status(&status.id, status.status.clone(), session),
        TaskCommand::Done(done) => run_status(&done.id, TaskStatus::Done, session),
    }
}

fn run_create(args: &CreateArgs, session: &Session) -> anyhow::Result<()> {
    let output = session.output;
    let project = validate::validate_id("project", &args.project).map_err(|e| invalid(output, &e))?;
    let title = validate::validate_task_title(&args.title).map_err(|e| invalid(output, &e))?;
    let project_id = EntityId::new(project);

    let mut dispatcher = session.loaded()?;
    if dispatcher.snapshot().project(&project_id).is_none() {
        return Err(not_found(output, "project", project_id.as_str()));
    }

    let (patch, outcome) = session.mutate(
        &mut dispatcher,
        Mutation::CreateTask {
            project_id: project_id.clone(),
            title,
            description: optional_text(args.description.as_deref()),
            status: args.status.clone(),
        },
    )?;
    let Patch::AddTask { task, .. } = patch else {
        return Err(unexpected(output, &patch));
    };

    render(
        session,
        &TaskOutput {
            ok: true,
            action: "created",
            project: project_id.to_string(),
            id: task.id.to_string(),
            title: task.title,
            status: task.status.to_string(),
            outcome,
        },
    )
}

fn run_status(id: &str, status: TaskStatus, session: &Session) -> anyhow::Result<()> {
    let output = session.output;
    let id = validate::validate_id("task", id).map_err(|e| invalid(output, &e))?;
    let task_id = EntityId::new(id);

    let mut dispatcher = session.loaded()?;
    let (project, title) = dispatcher
        .snapshot()
        .task(&task_id)
        .map(|(project, task)| (project.id.to_string(), task.title.clone()))
        .ok_or_else(|| not_found(output, "task", task_id.as_str()))?;

    let (patch, outcome) = session.mutate(
        &mut dispatcher,
        Mutation::UpdateTaskStatus {
            task_id: task_id.clone(),
            status,
        },
    )?;
    let Patch::SetTaskStatus { status, .. } = patch else {
        return Err(unexpected(output, &patch));
    };

    render(
        session,
        &TaskOutput {
            ok: true,
            action: "updated",
            project,
            id: task_id.to_string(),
            title,
            status: status.to_string(),
            outcome,
        },
    )
}

fn render(session: &Session, result: &TaskOutput) -> anyhow::Result<()> {
    render_mode(
        session.output,
        result,
        |r, w| {
            writeln!(
                w,
                "task\t{}\t{}\t{}\t{}",
                r.id, r.project, r.status, r.title
            )
        },
        |r, w| {
            if r.action == "created" {
                writeln!(
                    w,
                    "Created task '{}' ({}) in project {} [{}]",
                    r.title, r.id, r.project, r.status
                )
            } else {
                writeln!(w, "Task '{}' ({}) is now {}", r.title, r.id, r.status)
            }
        },
    )
}
