//! `hub tree`: print every organization, project, task and comment.

use std::io::{self, Write};

use clap::Args;
use hub_core::Snapshot;
use hub_core::model::{Organization, Project};

use crate::cmd::Session;
use crate::output::{Renderable, pretty_rule, render_item};
use crate::present::{
    active_label, comment_count_label, one_line, project_badge, task_badge, task_count_label,
};

const COMMENT_PREVIEW: usize = 60;

#[derive(Args, Debug)]
pub struct TreeArgs {
    /// Only show this organization (by slug).
    #[arg(long)]
    pub org: Option<String>,

    /// Hide comments.
    #[arg(long)]
    pub no_comments: bool,
}

struct TreeView<'a> {
    organizations: Vec<&'a Organization>,
    comments: bool,
}

/// Pretty block for one project: header line, tasks, optional comments.
pub fn write_project(w: &mut dyn Write, project: &Project, comments: bool) -> io::Result<()> {
    writeln!(
        w,
        "  {} [{}]  {}  · {} · {}",
        project.name,
        project_badge(&project.status),
        project.id,
        task_count_label(project),
        active_label(project),
    )?;
    for task in &project.tasks {
        let mark = if task.status.is_done() { "x" } else { " " };
        writeln!(
            w,
            "    [{mark}] {} ({})  {}  · {}",
            task.title,
            task_badge(&task.status),
            task.id,
            comment_count_label(task),
        )?;
        if comments {
            for comment in &task.comments {
                writeln!(w, "          {}  {}", comment.id, one_line(&comment.content, COMMENT_PREVIEW))?;
            }
        }
    }
    Ok(())
}

/// One text row per entity, parents before children.
pub fn write_project_rows(w: &mut dyn Write, parent: &str, project: &Project) -> io::Result<()> {
    writeln!(w, "project\t{}\t{parent}\t{}\t{}", project.id, project.status, project.name)?;
    for task in &project.tasks {
        writeln!(w, "task\t{}\t{}\t{}\t{}", task.id, project.id, task.status, task.title)?;
        for comment in &task.comments {
            writeln!(
                w,
                "comment\t{}\t{}\t-\t{}",
                comment.id,
                task.id,
                one_line(&comment.content, usize::MAX)
            )?;
        }
    }
    Ok(())
}

impl Renderable for TreeView<'_> {
    fn render_human(&self, w: &mut dyn Write) -> io::Result<()> {
        if self.organizations.is_empty() {
            return writeln!(w, "No organizations.");
        }
        for (i, org) in self.organizations.iter().enumerate() {
            if i > 0 {
                writeln!(w)?;
            }
            writeln!(w, "{} ({})", org.name, org.slug)?;
            pretty_rule(w)?;
            if org.projects.is_empty() {
                writeln!(w, "  no projects yet")?;
            }
            for project in &org.projects {
                write_project(w, project, self.comments)?;
            }
        }
        Ok(())
    }

    fn render_json(&self, w: &mut dyn Write) -> io::Result<()> {
        let body = serde_json::json!({ "organizations": self.organizations });
        serde_json::to_writer_pretty(&mut *w, &body).map_err(io::Error::other)
    }

    fn render_table(&self, w: &mut dyn Write) -> io::Result<()> {
        for org in &self.organizations {
            writeln!(w, "organization\t{}\t-\t-\t{}", org.id, org.slug)?;
            for project in &org.projects {
                write_project_rows(w, &org.slug, project)?;
            }
        }
        Ok(())
    }

    fn table_headers() -> &'static [&'static str] {
        &["KIND", "ID", "PARENT", "STATUS", "NAME"]
    }
}

fn select<'a>(snapshot: &'a Snapshot, org: Option<&str>) -> Vec<&'a Organization> {
    snapshot
        .organizations
        .iter()
        .filter(|o| org.is_none_or(|slug| o.slug == slug))
        .collect()
}

pub fn run_tree(args: &TreeArgs, session: &Session) -> anyhow::Result<()> {
    let dispatcher = session.loaded()?;
    let snapshot = dispatcher.snapshot();

    if let Some(slug) = &args.org
        && snapshot.organization_by_slug(slug).is_none()
    {
        return Err(super::not_found(session.output, "organization", slug.clone()));
    }

    let view = TreeView {
        organizations: select(snapshot, args.org.as_deref()),
        comments: !args.no_comments,
    };
    render_item(&view, session.output)?;
    Ok(())
}
