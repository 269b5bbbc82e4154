//! `hub show`: one project with its tasks and comments.

use std::io::{self, Write};

use clap::Args;
use hub_core::model::{EntityId, Project};

use crate::cmd::tree::{write_project, write_project_rows};
use crate::cmd::{Session, invalid, not_found};
use crate::output::{Renderable, pretty_kv, pretty_section, render_item};
use crate::validate;

#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Project ID (see `hub tree`).
    pub id: String,
}

struct ProjectView<'a> {
    organization: &'a str,
    project: &'a Project,
}

impl Renderable for ProjectView<'_> {
    fn render_human(&self, w: &mut dyn Write) -> io::Result<()> {
        pretty_section(w, &self.project.name)?;
        pretty_kv(w, "ID", self.project.id.as_str())?;
        pretty_kv(w, "Org", self.organization)?;
        pretty_kv(w, "Status", self.project.status.as_str())?;
        writeln!(w)?;
        write_project(w, self.project, true)
    }

    fn render_json(&self, w: &mut dyn Write) -> io::Result<()> {
        let body = serde_json::json!({
            "organization": self.organization,
            "project": self.project,
        });
        serde_json::to_writer_pretty(&mut *w, &body).map_err(io::Error::other)
    }

    fn render_table(&self, w: &mut dyn Write) -> io::Result<()> {
        write_project_rows(w, self.organization, self.project)
    }

    fn table_headers() -> &'static [&'static str] {
        &["KIND", "ID", "PARENT", "STATUS", "NAME"]
    }
}

pub fn run_show(args: &ShowArgs, session: &Session) -> anyhow::Result<()> {
    let id = validate::validate_id("project", &args.id).map_err(|e| invalid(session.output, &e))?;
    let id = EntityId::new(id);

    let dispatcher = session.loaded()?;
    let snapshot = dispatcher.snapshot();
    let (organization, project) = snapshot
        .organizations
        .iter()
        .find_map(|org| {
            org.projects
                .iter()
                .find(|p| p.id == id)
                .map(|p| (org.slug.as_str(), p))
        })
        .ok_or_else(|| not_found(session.output, "project", id.as_str()))?;

    render_item(&ProjectView { organization, project }, session.output)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::{OutputMode, render_item_to};
    use hub_core::model::{ProjectStatus, Task, TaskStatus};

    #[test]
    fn pretty_has_header_fields() {
        let mut project = Project::new("p1", "Launch", ProjectStatus::Active);
        project.tasks.push(Task::new("t1", "Write spec", TaskStatus::Todo));
        let view = ProjectView {
            organization: "acme",
            project: &project,
        };
        let mut out = Vec::new();
        render_item_to(&view, OutputMode::Pretty, &mut out).expect("render");
        let text = String::from_utf8(out).expect("utf8");
        assert!(text.starts_with("Launch\n"));
        assert!(text.contains("Org:         acme"));
        assert!(text.contains("1 task · 1 active"));
    }
}
