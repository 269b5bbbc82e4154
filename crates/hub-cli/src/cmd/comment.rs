//! `hub comment`: add and delete task comments.

use std::io::{self, BufRead, Write};

use clap::{Args, Subcommand};
use hub_core::model::EntityId;
use hub_core::{Mutation, Patch, PatchOutcome};
use serde::Serialize;

use crate::cmd::{Session, invalid, not_found, unexpected};
use crate::output::render_mode;
use crate::present::one_line;
use crate::validate;

const PROMPT_PREVIEW: usize = 60;

#[derive(Args, Debug)]
pub struct CommentArgs {
    #[command(subcommand)]
    pub command: CommentCommand,
}

#[derive(Subcommand, Debug)]
pub enum CommentCommand {
    #[command(
        about = "Add a comment to a task",
        after_help = "EXAMPLES:\n    # Add a progress note\n    hub comment add 34 \"Draft is up for review\""
    )]
    Add(AddArgs),

    #[command(
        visible_alias = "delete",
        about = "Delete a comment",
        long_about = "Delete a comment. Asks for confirmation unless --yes is given.",
        after_help = "EXAMPLES:\n    # Delete after confirming\n    hub comment rm 56\n\n    # Skip the prompt\n    hub comment rm 56 --yes"
    )]
    Rm(RmArgs),
}

#[derive(Args, Debug)]
pub struct AddArgs {
    /// Task ID.
    pub task: String,

    /// Comment text.
    pub content: String,
}

#[derive(Args, Debug)]
pub struct RmArgs {
    /// Comment ID.
    pub id: String,

    /// Do not ask for confirmation.
    #[arg(long, short)]
    pub yes: bool,
}

#[derive(Debug, Serialize)]
struct CommentOutput {
    ok: bool,
    action: &'static str,
    task: String,
    id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    outcome: PatchOutcome,
}

pub fn run_comment(args: &CommentArgs, session: &Session) -> anyhow::Result<()> {
    match &args.command {
        CommentCommand::Add(add) => run_add(add, session),
        CommentCommand::Rm(rm) => {
            let stdin = io::stdin();
            let mut input = stdin.lock();
            run_rm(rm, session, &mut input, &mut io::stderr())
        }
    }
}

fn run_add(args: &AddArgs, session: &Session) -> anyhow::Result<()> {
    let output = session.output;
    let task = validate::validate_id("task", &args.task).map_err(|e| invalid(output, &e))?;
    let content = validate::validate_comment(&args.content).map_err(|e| invalid(output, &e))?;
    let task_id = EntityId::new(task);

    let mut dispatcher = session.loaded()?;
    if dispatcher.snapshot().task(&task_id).is_none() {
        return Err(not_found(output, "task", task_id.as_str()));
    }

    let (patch, outcome) = session.mutate(
        &mut dispatcher,
        Mutation::CreateComment {
            task_id: task_id.clone(),
            content,
        },
    )?;
    let Patch::AddComment { comment, .. } = patch else {
        return Err(unexpected(output, &patch));
    };

    render(
        session,
        &CommentOutput {
            ok: true,
            action: "added",
            task: task_id.to_string(),
            id: comment.id.to_string(),
            content: Some(comment.content),
            outcome,
        },
    )
}

fn run_rm(
    args: &RmArgs,
    session: &Session,
    input: &mut dyn BufRead,
    prompt_out: &mut dyn Write,
) -> anyhow::Result<()> {
    let output = session.output;
    let id = validate::validate_id("comment", &args.id).map_err(|e| invalid(output, &e))?;
    let comment_id = EntityId::new(id);

    let mut dispatcher = session.loaded()?;
    let content = dispatcher
        .snapshot()
        .comment_owner(&comment_id)
        .and_then(|task| task.comments.iter().find(|c| c.id == comment_id))
        .map(|c| c.content.clone())
        .ok_or_else(|| not_found(output, "comment", comment_id.as_str()))?;

    if !args.yes {
        let prompt = format!(
            "Delete comment {comment_id} \"{}\"? [y/N] ",
            one_line(&content, PROMPT_PREVIEW)
        );
        if !confirm(&prompt, input, prompt_out)? {
            writeln!(prompt_out, "Aborted.")?;
            return Ok(());
        }
    }

    let (patch, outcome) = session.mutate(
        &mut dispatcher,
        Mutation::DeleteComment {
            comment_id: comment_id.clone(),
        },
    )?;
    let Patch::RemoveComment { task_id, .. } = patch else {
        return Err(unexpected(output, &patch));
    };

    render(
        session,
        &CommentOutput {
            ok: true,
            action: "deleted",
            task: task_id.to_string(),
            id: comment_id.to_string(),
            content: None,
            outcome,
        },
    )
}

/// Ask a yes/no question; anything other than `y`/`yes` is a no.
fn confirm(prompt: &str, input: &mut dyn BufRead, out: &mut dyn Write) -> io::Result<bool> {
    write!(out, "{prompt}")?;
    out.flush()?;
    let mut line = String::new();
    input.read_line(&mut line)?;
    Ok(matches!(line.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}

fn render(session: &Session, result: &CommentOutput) -> anyhow::Result<()> {
    render_mode(
        session.output,
        result,
        |r, w| {
            writeln!(
                w,
                "comment\t{}\t{}\t{}",
                r.id,
                r.task,
                r.content.as_deref().map_or_else(|| "-".to_string(), |c| one_line(c, usize::MAX))
            )
        },
        |r, w| match &r.content {
            Some(_) => writeln!(w, "Added comment {} to task {}", r.id, r.task),
            None => writeln!(w, "Deleted comment {} from task {}", r.id, r.task),
        },
    )
}
