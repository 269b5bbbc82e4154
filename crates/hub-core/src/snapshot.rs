//! The denormalized tree returned by the `organizations` query.

use serde::{Deserialize, Serialize};

use crate::model::{EntityId, Organization, Project, Task};

/// Client copy of server-held data, in server order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub organizations: Vec<Organization>,
}

/// Entity totals, used for load summaries and log lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SnapshotCounts {
    pub organizations: usize,
    pub projects: usize,
    pub tasks: usize,
    pub comments: usize,
}

impl Snapshot {
    #[must_use]
    pub const fn new(organizations: Vec<Organization>) -> Self {
        Self { organizations }
    }

    #[must_use]
    pub fn organization_by_slug(&self, slug: &str) -> Option<&Organization> {
        self.organizations.iter().find(|o| o.slug == slug)
    }

    pub fn organization_by_slug_mut(&mut self, slug: &str) -> Option<&mut Organization> {
        self.organizations.iter_mut().find(|o| o.slug == slug)
    }

    #[must_use]
    pub fn project(&self, id: &EntityId) -> Option<&Project> {
        self.organizations
            .iter()
            .flat_map(|o| o.projects.iter())
            .find(|p| &p.id == id)
    }

    pub fn project_mut(&mut self, id: &EntityId) -> Option<&mut Project> {
        self.organizations
            .iter_mut()
            .flat_map(|o| o.projects.iter_mut())
            .find(|p| &p.id == id)
    }

    /// Locate a task anywhere in the tree, together with its owning project.
    #[must_use]
    pub fn task(&self, id: &EntityId) -> Option<(&Project, &Task)> {
        self.organizations
            .iter()
            .flat_map(|o| o.projects.iter())
            .find_map(|p| p.tasks.iter().find(|t| &t.id == id).map(|t| (p, t)))
    }

    pub fn task_mut(&mut self, id: &EntityId) -> Option<&mut Task> {
        self.organizations
            .iter_mut()
            .flat_map(|o| o.projects.iter_mut())
            .flat_map(|p| p.tasks.iter_mut())
            .find(|t| &t.id == id)
    }

    /// Find the task owning a comment, if the comment is in the snapshot.
    #[must_use]
    pub fn comment_owner(&self, comment_id: &EntityId) -> Option<&Task> {
        self.organizations
            .iter()
            .flat_map(|o| o.projects.iter())
            .flat_map(|p| p.tasks.iter())
            .find(|t| t.has_comment(comment_id))
    }

    #[must_use]
    pub fn counts(&self) -> SnapshotCounts {
        let mut counts = SnapshotCounts {
            organizations: self.organizations.len(),
            ..SnapshotCounts::default()
        };
        for project in self.organizations.iter().flat_map(|o| o.projects.iter()) {
            counts.projects += 1;
            counts.tasks += project.tasks.len();
            counts.comments += project.tasks.iter().map(|t| t.comments.len()).sum::<usize>();
        }
        counts
    }
}
