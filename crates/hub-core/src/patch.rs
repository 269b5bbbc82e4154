//! Patch functions: structural edits that reconcile a mutation result into
//! a [`Snapshot`].
//!
//! Every patch is keyed by explicit identifiers. Add-patches check
//! membership before appending, so applying the same patch twice leaves the
//! tree identical to applying it once.

use serde::Serialize;

use crate::model::{Comment, EntityId, Project, ProjectStatus, Task, TaskStatus};
use crate::snapshot::Snapshot;

/// A single edit to the snapshot tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Patch {
    /// Append a project to the organization with this slug.
    AddProject {
        organization_slug: String,
        project: Project,
    },
    /// Overwrite a project's name and status in place.
    UpdateProject {
        project_id: EntityId,
        name: String,
        status: ProjectStatus,
    },
    /// Append a task to the project with this id.
    AddTask { project_id: EntityId, task: Task },
    /// Overwrite a task's status wherever the task lives.
    SetTaskStatus {
        task_id: EntityId,
        status: TaskStatus,
    },
    /// Append a comment to the task with this id.
    AddComment { task_id: EntityId, comment: Comment },
    /// Remove one comment from the task with this id.
    RemoveComment {
        task_id: EntityId,
        comment_id: EntityId,
    },
}

/// What happened when a patch was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PatchOutcome {
    /// The tree changed.
    Applied,
    /// An entity with the same id was already in the target collection.
    AlreadyPresent,
    /// The target exists but already had the requested value (or the entity
    /// to remove was already gone).
    Unchanged,
    /// The parent or target entity is not in the snapshot.
    TargetMissing,
}

impl PatchOutcome {
    #[must_use]
    pub const fn changed(self) -> bool {
        matches!(self, Self::Applied)
    }
}

impl Patch {
    /// Short operation name for logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::AddProject { .. } => "add_project",
            Self::UpdateProject { .. } => "update_project",
            Self::AddTask { .. } => "add_task",
            Self::SetTaskStatus { .. } => "set_task_status",
            Self::AddComment { .. } => "add_comment",
            Self::RemoveComment { .. } => "remove_comment",
        }
    }

    /// Apply this patch to `snapshot` in place.
    pub fn apply(&self, snapshot: &mut Snapshot) -> PatchOutcome {
        match self {
            Self::AddProject {
                organization_slug,
                project,
            } => {
                let Some(org) = snapshot.organization_by_slug_mut(organization_slug) else {
                    return PatchOutcome::TargetMissing;
                };
                if org.has_project(&project.id) {
                    return PatchOutcome::AlreadyPresent;
                }
                org.projects.push(Project {
                    tasks: Vec::new(),
                    ..project.clone()
                });
                PatchOutcome::Applied
            }
            Self::UpdateProject {
                project_id,
                name,
                status,
            } => {
                let Some(project) = snapshot.project_mut(project_id) else {
                    return PatchOutcome::TargetMissing;
                };
                if &project.name == name && &project.status == status {
                    return PatchOutcome::Unchanged;
                }
                project.name.clone_from(name);
                project.status = status.clone();
                PatchOutcome::Applied
            }
            Self::AddTask { project_id, task } => {
                let Some(project) = snapshot.project_mut(project_id) else {
                    return PatchOutcome::TargetMissing;
                };
                if project.has_task(&task.id) {
                    return PatchOutcome::AlreadyPresent;
                }
                project.tasks.push(Task {
                    comments: Vec::new(),
                    ..task.clone()
                });
                PatchOutcome::Applied
            }
            Self::SetTaskStatus { task_id, status } => {
                let Some(task) = snapshot.task_mut(task_id) else {
                    return PatchOutcome::TargetMissing;
                };
                if &task.status == status {
                    return PatchOutcome::Unchanged;
                }
                task.status = status.clone();
                PatchOutcome::Applied
            }
            Self::AddComment { task_id, comment } => {
                let Some(task) = snapshot.task_mut(task_id) else {
                    return PatchOutcome::TargetMissing;
                };
                if task.has_comment(&comment.id) {
                    return PatchOutcome::AlreadyPresent;
                }
                task.comments.push(comment.clone());
                PatchOutcome::Applied
            }
            Self::RemoveComment {
                task_id,
                comment_id,
            } => {
                let Some(task) = snapshot.task_mut(task_id) else {
                    return PatchOutcome::TargetMissing;
                };
                let before = task.comments.len();
                task.comments.retain(|c| &c.id != comment_id);
                if task.comments.len() == before {
                    PatchOutcome::Unchanged
                } else {
                    PatchOutcome::Applied
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Organization;

    fn acme() -> Snapshot {
        Snapshot::new(vec![Organization {
            id: EntityId::from("1"),
            name: "Acme".into(),
            slug: "acme".into(),
            projects: Vec::new(),
        }])
    }

    fn acme_with_task() -> Snapshot {
        let mut snapshot = acme();
        Patch::AddProject {
            organization_slug: "acme".into(),
            project: Project::new("p1", "Launch", ProjectStatus::Planned),
        }
        .apply(&mut snapshot);
        Patch::AddTask {
            project_id: EntityId::from("p1"),
            task: Task::new("t1", "Write spec", TaskStatus::Todo),
        }
        .apply(&mut snapshot);
        snapshot
    }

    #[test]
    fn add_project_appends_with_empty_tasks() {
        let mut snapshot = acme();
        let mut project = Project::new("p1", "Launch", ProjectStatus::Planned);
        project.tasks.push(Task::new("stray", "x", TaskStatus::Todo));

        let outcome = Patch::AddProject {
            organization_slug: "acme".into(),
            project,
        }
        .apply(&mut snapshot);

        assert_eq!(outcome, PatchOutcome::Applied);
        let org = snapshot.organization_by_slug("acme").expect("org");
        assert_eq!(org.projects.len(), 1);
        assert_eq!(org.projects[0].name, "Launch");
        assert_eq!(org.projects[0].status, ProjectStatus::Planned);
        assert!(org.projects[0].tasks.is_empty());
    }

    #[test]
    fn add_project_only_touches_matching_organization() {
        let mut snapshot = acme();
        snapshot.organizations.push(Organization {
            id: EntityId::from("2"),
            name: "Globex".into(),
            slug: "globex".into(),
            projects: Vec::new(),
        });

        Patch::AddProject {
            organization_slug: "globex".into(),
            project: Project::new("p9", "Moonshot", ProjectStatus::Active),
        }
        .apply(&mut snapshot);

        assert!(snapshot.organizations[0].projects.is_empty());
        assert_eq!(snapshot.organizations[1].projects.len(), 1);
    }

    #[test]
    fn add_project_unknown_slug_is_target_missing() {
        let mut snapshot = acme();
        let before = snapshot.clone();
        let outcome = Patch::AddProject {
            organization_slug: "nope".into(),
            project: Project::new("p1", "Launch", ProjectStatus::Planned),
        }
        .apply(&mut snapshot);
        assert_eq!(outcome, PatchOutcome::TargetMissing);
        assert_eq!(snapshot, before);
    }

    #[test]
    fn add_task_is_idempotent() {
        let mut snapshot = acme_with_task();
        let once = snapshot.clone();
        let outcome = Patch::AddTask {
            project_id: EntityId::from("p1"),
            task: Task::new("t1", "Write spec", TaskStatus::Todo),
        }
        .apply(&mut snapshot);
        assert_eq!(outcome, PatchOutcome::AlreadyPresent);
        assert_eq!(snapshot, once);
    }

    #[test]
    fn set_status_overwrites_in_place() {
        let mut snapshot = acme_with_task();
        let patch = Patch::SetTaskStatus {
            task_id: EntityId::from("t1"),
            status: TaskStatus::Done,
        };
        assert_eq!(patch.apply(&mut snapshot), PatchOutcome::Applied);
        assert_eq!(patch.apply(&mut snapshot), PatchOutcome::Unchanged);
        let (_, task) = snapshot.task(&EntityId::from("t1")).expect("task");
        assert_eq!(task.status, TaskStatus::Done);
    }

    #[test]
    fn duplicate_comment_delivery_keeps_one_entry() {
        let mut snapshot = acme_with_task();
        let patch = Patch::AddComment {
            task_id: EntityId::from("t1"),
            comment: Comment::new("c1", "looks good"),
        };
        assert_eq!(patch.apply(&mut snapshot), PatchOutcome::Applied);
        assert_eq!(patch.apply(&mut snapshot), PatchOutcome::AlreadyPresent);
        let (_, task) = snapshot.task(&EntityId::from("t1")).expect("task");
        assert_eq!(task.comments.len(), 1);
    }

    #[test]
    fn remove_comment_leaves_siblings() {
        let mut snapshot = acme_with_task();
        for (id, body) in [("c1", "draft"), ("c2", "second"), ("c3", "third")] {
            Patch::AddComment {
                task_id: EntityId::from("t1"),
                comment: Comment::new(id, body),
            }
            .apply(&mut snapshot);
        }

        let outcome = Patch::RemoveComment {
            task_id: EntityId::from("t1"),
            comment_id: EntityId::from("c2"),
        }
        .apply(&mut snapshot);

        assert_eq!(outcome, PatchOutcome::Applied);
        let (_, task) = snapshot.task(&EntityId::from("t1")).expect("task");
        let ids: Vec<&str> = task.comments.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["c1", "c3"]);
        assert_eq!(task.title, "Write spec");
    }

    #[test]
    fn remove_missing_comment_is_unchanged() {
        let mut snapshot = acme_with_task();
        let outcome = Patch::RemoveComment {
            task_id: EntityId::from("t1"),
            comment_id: EntityId::from("c404"),
        }
        .apply(&mut snapshot);
        assert_eq!(outcome, PatchOutcome::Unchanged);
    }

    #[test]
    fn update_project_renames() {
        let mut snapshot = acme_with_task();
        let outcome = Patch::UpdateProject {
            project_id: EntityId::from("p1"),
            name: "Relaunch".into(),
            status: ProjectStatus::Planned,
        }
        .apply(&mut snapshot);
        assert_eq!(outcome, PatchOutcome::Applied);
        let project = snapshot.project(&EntityId::from("p1")).expect("project");
        assert_eq!(project.name, "Relaunch");
        assert_eq!(project.tasks.len(), 1);
    }

    #[test]
    fn patches_serialize_with_op_tag() {
        let patch = Patch::SetTaskStatus {
            task_id: EntityId::from("t1"),
            status: TaskStatus::Done,
        };
        let json = serde_json::to_value(&patch).expect("serialize");
        assert_eq!(json["op"], "set_task_status");
        assert_eq!(json["status"], "DONE");
    }
}
