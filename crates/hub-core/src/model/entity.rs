//! Organizations, projects, tasks and comments as the client holds them.
//!
//! Child lists keep server order and default to empty when a payload
//! omits them.

use serde::{Deserialize, Serialize};

use super::id::EntityId;
use super::status::{ProjectStatus, TaskStatus};

/// Top-level tenant. Read-only from the client's perspective.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organization {
    pub id: EntityId,
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub projects: Vec<Project>,
}

/// A project inside exactly one organization.
///
/// Mutation payloads omit `tasks`; decoding fills in an empty list so a
/// freshly created project enters the snapshot with no children.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: EntityId,
    pub name: String,
    #[serde(default)]
    pub status: ProjectStatus,
    #[serde(default)]
    pub tasks: Vec<Task>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: EntityId,
    pub title: String,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default)]
    pub comments: Vec<Comment>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: EntityId,
    pub content: String,
}

impl Organization {
    #[must_use]
    pub fn has_project(&self, id: &EntityId) -> bool {
        self.projects.iter().any(|p| &p.id == id)
    }
}

impl Project {
    /// Build a project with an empty task list.
    pub fn new(id: impl Into<EntityId>, name: impl Into<String>, status: ProjectStatus) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            status,
            tasks: Vec::new(),
        }
    }

    #[must_use]
    pub fn has_task(&self, id: &EntityId) -> bool {
        self.tasks.iter().any(|t| &t.id == id)
    }

    /// Number of tasks not yet in the terminal `DONE` state.
    #[must_use]
    pub fn active_task_count(&self) -> usize {
        self.tasks.iter().filter(|t| !t.status.is_done()).count()
    }
}

impl Task {
    /// Build a task with an empty comment list.
    pub fn new(id: impl Into<EntityId>, title: impl Into<String>, status: TaskStatus) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            status,
            comments: Vec::new(),
        }
    }

    #[must_use]
    pub fn has_comment(&self, id: &EntityId) -> bool {
        self.comments.iter().any(|c| &c.id == id)
    }
}

impl Comment {
    pub fn new(id: impl Into<EntityId>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mutation_payload_decodes_with_empty_children() {
        let project: Project =
            serde_json::from_str(r#"{"id":"9","name":"Launch","status":"ACTIVE"}"#)
                .expect("decode project");
        assert!(project.tasks.is_empty());
        assert_eq!(project.status, ProjectStatus::Active);

        let task: Task = serde_json::from_str(r#"{"id":3,"title":"Write spec","status":"TODO"}"#)
            .expect("decode task");
        assert!(task.comments.is_empty());
        assert_eq!(task.id, "3");
    }

    #[test]
    fn active_count_excludes_done_tasks() {
        let mut project = Project::new("1", "Launch", ProjectStatus::Active);
        project.tasks.push(Task::new("1", "a", TaskStatus::Todo));
        project.tasks.push(Task::new("2", "b", TaskStatus::Done));
        project.tasks.push(Task::new("3", "c", TaskStatus::InProgress));
        assert_eq!(project.active_task_count(), 2);
    }

    #[test]
    fn membership_helpers_compare_by_id() {
        let mut task = Task::new("1", "a", TaskStatus::Todo);
        task.comments.push(Comment::new("10", "hello"));
        assert!(task.has_comment(&EntityId::from("10")));
        assert!(!task.has_comment(&EntityId::from("11")));
    }
}
