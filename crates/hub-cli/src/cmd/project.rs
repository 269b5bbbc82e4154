//! `hub project`: create and rename projects.

use std::str::FromStr;

use clap::{Args, Subcommand};
use hub_core::model::{EntityId, ProjectStatus};
use hub_core::{Mutation, Patch, PatchOutcome};
use serde::Serialize;

use crate::cmd::{Session, invalid, not_found, unexpected};
use crate::output::render_mode;
use crate::validate;

#[derive(Args, Debug)]
pub struct ProjectArgs {
    #[command(subcommand)]
    pub command: ProjectCommand,
}

#[derive(Subcommand, Debug)]
pub enum ProjectCommand {
    #[command(
        about = "Create a project in an organization",
        after_help = "EXAMPLES:\n    # Create a project\n    hub project create --org acme --name Launch\n\n    # With a description and initial status\n    hub project create --org acme --name Launch --description \"Q3 launch\" --status active"
    )]
    Create(CreateArgs),

    #[command(
        about = "Rename a project",
        after_help = "EXAMPLES:\n    # Rename project 12\n    hub project rename 12 \"Launch v2\""
    )]
    Rename(RenameArgs),
}

#[derive(Args, Debug)]
pub struct CreateArgs {
    /// Organization slug (see `hub orgs`).
    #[arg(long)]
    pub org: String,

    /// Project name.
    #[arg(long)]
    pub name: String,

    /// Optional description.
    #[arg(long)]
    pub description: Option<String>,

    /// Initial status: planned, active or completed.
    #[arg(long, value_parser = ProjectStatus::from_str)]
    pub status: Option<ProjectStatus>,
}

#[derive(Args, Debug)]
pub struct RenameArgs {
    /// Project ID.
    pub id: String,

    /// New name.
    pub name: String,
}

#[derive(Debug, Serialize)]
struct ProjectOutput {
    ok: bool,
    action: &'static str,
    organization: String,
    id: String,
    name: String,
    status: String,
    outcome: PatchOutcome,
}

pub fn run_project(args: &ProjectArgs, session: &Session) -> anyhow::Result<()> {
    match &args.command {
        ProjectCommand::Create(create) => run_create(create, session),
        ProjectCommand::Rename(rename) => run_rename(rename, session),
    }
}

/// Empty descriptions are not sent at all.
pub fn optional_text(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim).filter(|s| !s.is_empty()).map(str::to_string)
}

fn run_create(args: &CreateArgs, session: &Session) -> anyhow::Result<()> {
    let output = session.output;
    let slug = validate::validate_slug(&args.org).map_err(|e| invalid(output, &e))?;
    let name = validate::validate_project_name(&args.name).map_err(|e| invalid(output, &e))?;

    let mut dispatcher = session.loaded()?;
    if dispatcher.snapshot().organization_by_slug(&slug).is_none() {
        return Err(not_found(output, "organization", slug));
    }

    let (patch, outcome) = session.mutate(
        &mut dispatcher,
        Mutation::CreateProject {
            organization_slug: slug.clone(),
            name,
            description: optional_text(args.description.as_deref()),
            status: args.status.clone(),
        },
    )?;
    let Patch::AddProject { project, .. } = patch else {
        return Err(unexpected(output, &patch));
    };

    let result = ProjectOutput {
        ok: true,
        action: "created",
        organization: slug,
        id: project.id.to_string(),
        name: project.name,
        status: project.status.to_string(),
        outcome,
    };
    render(session, &result)
}

fn run_rename(args: &RenameArgs, session: &Session) -> anyhow::Result<()> {
    let output = session.output;
    let id = validate::validate_id("project", &args.id).map_err(|e| invalid(output, &e))?;
    let name = validate::validate_project_name(&args.name).map_err(|e| invalid(output, &e))?;
    let project_id = EntityId::new(id);

    let mut dispatcher = session.loaded()?;
    let organization = dispatcher
        .snapshot()
        .organizations
        .iter()
        .find(|o| o.has_project(&project_id))
        .map(|o| o.slug.clone())
        .ok_or_else(|| not_found(output, "project", project_id.as_str()))?;

    let (patch, outcome) = session.mutate(
        &mut dispatcher,
        Mutation::RenameProject {
            project_id: project_id.clone(),
            name,
        },
    )?;
    let Patch::UpdateProject { name, status, .. } = patch else {
        return Err(unexpected(output, &patch));
    };

    let result = ProjectOutput {
        ok: true,
        action: "renamed",
        organization,
        id: project_id.to_string(),
        name,
        status: status.to_string(),
        outcome,
    };
    render(session, &result)
}

fn render(session: &Session, result: &ProjectOutput) -> anyhow::Result<()> {
    render_mode(
        session.output,
        result,
        |r, w| {
            writeln!(
                w,
                "project\t{}\t{}\t{}\t{}",
                r.id,
                r.organization,
                r.status,
                r.name
            )
        },
        |r, w| {
            writeln!(
                w,
                "{} project '{}' ({}) in {} [{}]",
                capitalize(r.action),
                r.name,
                r.id,
                r.organization,
                r.status
            )
        },
    )
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_descriptions_are_dropped() {
        assert_eq!(optional_text(None), None);
        assert_eq!(optional_text(Some("   ")), None);
        assert_eq!(optional_text(Some(" Q3 ")), Some("Q3".to_string()));
    }

    #[test]
    fn capitalize_first_letter() {
        assert_eq!(capitalize("created"), "Created");
        assert_eq!(capitalize(""), "");
    }
}
