//! `hub orgs`: list organizations.

use std::io::{self, Write};

use hub_core::model::Organization;
use serde::Serialize;

use crate::cmd::Session;
use crate::output::{Renderable, pretty_section, render_item};
use crate::present::count_label;

#[derive(Debug, Serialize)]
struct OrgRow {
    id: String,
    slug: String,
    name: String,
    projects: usize,
    tasks: usize,
}

impl From<&Organization> for OrgRow {
    fn from(org: &Organization) -> Self {
        Self {
            id: org.id.to_string(),
            slug: org.slug.clone(),
            name: org.name.clone(),
            projects: org.projects.len(),
            tasks: org.projects.iter().map(|p| p.tasks.len()).sum(),
        }
    }
}

struct OrgList(Vec<OrgRow>);

impl Renderable for OrgList {
    fn render_human(&self, w: &mut dyn Write) -> io::Result<()> {
        pretty_section(w, &format!("Organizations ({})", self.0.len()))?;
        for row in &self.0 {
            writeln!(
                w,
                "{:<16} {:<24} {} · {}",
                row.slug,
                row.name,
                count_label(row.projects, "project"),
                count_label(row.tasks, "task"),
            )?;
        }
        Ok(())
    }

    fn render_json(&self, w: &mut dyn Write) -> io::Result<()> {
        serde_json::to_writer_pretty(&mut *w, &self.0).map_err(io::Error::other)
    }

    fn render_table(&self, w: &mut dyn Write) -> io::Result<()> {
        for row in &self.0 {
            writeln!(w, "{}\t{}\t{}\t{}", row.slug, row.id, row.name, row.projects)?;
        }
        Ok(())
    }

    fn table_headers() -> &'static [&'static str] {
        &["SLUG", "ID", "NAME", "PROJECTS"]
    }
}

pub fn run_orgs(session: &Session) -> anyhow::Result<()> {
    let dispatcher = session.loaded()?;
    let rows = dispatcher
        .snapshot()
        .organizations
        .iter()
        .map(OrgRow::from)
        .collect();
    render_item(&OrgList(rows), session.output)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::{OutputMode, render_item_to};
    use hub_core::model::{EntityId, Project, ProjectStatus};

    fn list() -> OrgList {
        let org = Organization {
            id: EntityId::from(7_u64),
            name: "Acme".into(),
            slug: "acme".into(),
            projects: vec![Project::new("p1", "Launch", ProjectStatus::Planned)],
        };
        OrgList(vec![OrgRow::from(&org)])
    }

    #[test]
    fn text_has_header_and_row() {
        let mut out = Vec::new();
        render_item_to(&list(), OutputMode::Text, &mut out).expect("render");
        let text = String::from_utf8(out).expect("utf8");
        assert_eq!(text, "SLUG\tID\tNAME\tPROJECTS\nacme\t7\tAcme\t1\n");
    }

    #[test]
    fn pretty_pluralizes() {
        let mut out = Vec::new();
        render_item_to(&list(), OutputMode::Pretty, &mut out).expect("render");
        let text = String::from_utf8(out).expect("utf8");
        assert!(text.contains("1 project · 0 tasks"));
    }
}
