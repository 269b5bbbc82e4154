//! Typed mutations and the patch each one produces on success.
//!
//! A [`Mutation`] knows how to build its GraphQL request, which optimistic
//! patch (if any) to apply before the request is sent, and how to turn the
//! server's `data` payload into the authoritative [`Patch`]. Parent lookups
//! always use the identifiers the mutation was created with, so a patch
//! lands in the intended parent regardless of what the user is looking at
//! when the response arrives.

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value, json};

use crate::error::HubError;
use crate::graphql::{GraphqlRequest, documents};
use crate::model::{Comment, EntityId, Project, ProjectStatus, Task, TaskStatus};
use crate::patch::Patch;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    CreateProject {
        organization_slug: String,
        name: String,
        description: Option<String>,
        status: Option<ProjectStatus>,
    },
    RenameProject {
        project_id: EntityId,
        name: String,
    },
    CreateTask {
        project_id: EntityId,
        title: String,
        description: Option<String>,
        status: Option<TaskStatus>,
    },
    UpdateTaskStatus {
        task_id: EntityId,
        status: TaskStatus,
    },
    CreateComment {
        task_id: EntityId,
        content: String,
    },
    DeleteComment {
        comment_id: EntityId,
    },
}

#[derive(Debug, Deserialize)]
struct TaskStatusPayload {
    status: TaskStatus,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeleteCommentPayload {
    success: bool,
    #[serde(default)]
    task_id: Option<EntityId>,
}

impl Mutation {
    /// GraphQL operation name, also used as the timing label.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::CreateProject { .. } => "CreateProject",
            Self::RenameProject { .. } => "RenameProject",
            Self::CreateTask { .. } => "CreateTask",
            Self::UpdateTaskStatus { .. } => "UpdateTaskStatus",
            Self::CreateComment { .. } => "CreateComment",
            Self::DeleteComment { .. } => "DeleteComment",
        }
    }

    /// Root field of the mutation in the response `data`.
    #[must_use]
    pub const fn field(&self) -> &'static str {
        match self {
            Self::CreateProject { .. } => "createProject",
            Self::RenameProject { .. } => "renameProject",
            Self::CreateTask { .. } => "createTask",
            Self::UpdateTaskStatus { .. } => "updateTaskStatus",
            Self::CreateComment { .. } => "createComment",
            Self::DeleteComment { .. } => "deleteComment",
        }
    }

    /// One-line description for notices and logs.
    #[must_use]
    pub fn summary(&self) -> String {
        match self {
            Self::CreateProject {
                organization_slug,
                name,
                ..
            } => format!("create project '{name}' in {organization_slug}"),
            Self::RenameProject { project_id, name } => {
                format!("rename project {project_id} to '{name}'")
            }
            Self::CreateTask {
                project_id, title, ..
            } => format!("create task '{title}' in project {project_id}"),
            Self::UpdateTaskStatus { task_id, status } => {
                format!("set task {task_id} to {status}")
            }
            Self::CreateComment { task_id, .. } => format!("comment on task {task_id}"),
            Self::DeleteComment { comment_id } => format!("delete comment {comment_id}"),
        }
    }

    #[must_use]
    pub fn request(&self) -> GraphqlRequest {
        let (query, variables) = match self {
            Self::CreateProject {
                organization_slug,
                name,
                description,
                status,
            } => {
                let mut vars = Map::new();
                vars.insert("organizationSlug".into(), json!(organization_slug));
                vars.insert("name".into(), json!(name));
                insert_optional(&mut vars, "description", description.as_deref());
                insert_optional(&mut vars, "status", status.as_ref().map(ProjectStatus::as_str));
                (documents::CREATE_PROJECT, Value::Object(vars))
            }
            Self::RenameProject { project_id, name } => (
                documents::RENAME_PROJECT,
                json!({ "projectId": project_id, "name": name }),
            ),
            Self::CreateTask {
                project_id,
                title,
                description,
                status,
            } => {
                let mut vars = Map::new();
                vars.insert("projectId".into(), json!(project_id));
                vars.insert("title".into(), json!(title));
                insert_optional(&mut vars, "description", description.as_deref());
                insert_optional(&mut vars, "status", status.as_ref().map(TaskStatus::as_str));
                (documents::CREATE_TASK, Value::Object(vars))
            }
            Self::UpdateTaskStatus { task_id, status } => (
                documents::UPDATE_TASK_STATUS,
                json!({ "taskId": task_id, "status": status.as_str() }),
            ),
            Self::CreateComment { task_id, content } => (
                documents::CREATE_COMMENT,
                json!({ "taskId": task_id, "content": content }),
            ),
            Self::DeleteComment { comment_id } => (
                documents::DELETE_COMMENT,
                json!({ "commentId": comment_id }),
            ),
        };
        GraphqlRequest::new(self.name(), query, variables)
    }

    /// The speculative patch applied before the request is sent.
    ///
    /// Only status updates are optimistic.
    #[must_use]
    pub fn optimistic_patch(&self) -> Option<Patch> {
        match self {
            Self::UpdateTaskStatus { task_id, status } => Some(Patch::SetTaskStatus {
                task_id: task_id.clone(),
                status: status.clone(),
            }),
            _ => None,
        }
    }

    /// Turn a successful response payload into the authoritative patch.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::Decode`] when the payload is missing or has the
    /// wrong shape, and [`HubError::Rejected`] when `deleteComment` reports
    /// `success: false`.
    pub fn reconcile(&self, data: &Value) -> Result<Patch, HubError> {
        let field = self.field();
        match self {
            Self::CreateProject {
                organization_slug, ..
            } => {
                let project: Project = decode(data, field, Some("project"))?;
                Ok(Patch::AddProject {
                    organization_slug: organization_slug.clone(),
                    project,
                })
            }
            Self::RenameProject { project_id, .. } => {
                let project: Project = decode(data, field, Some("project"))?;
                Ok(Patch::UpdateProject {
                    project_id: project_id.clone(),
                    name: project.name,
                    status: project.status,
                })
            }
            Self::CreateTask { project_id, .. } => {
                let task: Task = decode(data, field, Some("task"))?;
                Ok(Patch::AddTask {
                    project_id: project_id.clone(),
                    task,
                })
            }
            Self::UpdateTaskStatus { task_id, .. } => {
                let task: TaskStatusPayload = decode(data, field, Some("task"))?;
                Ok(Patch::SetTaskStatus {
                    task_id: task_id.clone(),
                    status: task.status,
                })
            }
            Self::CreateComment { task_id, .. } => {
                let comment: Comment = decode(data, field, Some("comment"))?;
                Ok(Patch::AddComment {
                    task_id: task_id.clone(),
                    comment,
                })
            }
            Self::DeleteComment { comment_id } => {
                let payload: DeleteCommentPayload = decode(data, field, None)?;
                if !payload.success {
                    return Err(HubError::Rejected { operation: field });
                }
                let task_id = payload.task_id.ok_or_else(|| HubError::Decode {
                    operation: field,
                    reason: "taskId is null".into(),
                })?;
                Ok(Patch::RemoveComment {
                    task_id,
                    comment_id: comment_id.clone(),
                })
            }
        }
    }
}

fn insert_optional(vars: &mut Map<String, Value>, key: &str, value: Option<&str>) {
    if let Some(value) = value {
        vars.insert(key.to_string(), json!(value));
    }
}

/// Pull `data.<field>[.<inner>]` out of a payload and decode it.
fn decode<T: DeserializeOwned>(
    data: &Value,
    field: &'static str,
    inner: Option<&str>,
) -> Result<T, HubError> {
    let missing = |what: &str| HubError::Decode {
        operation: field,
        reason: format!("{what} is missing or null"),
    };

    let mut node = data.get(field).filter(|v| !v.is_null()).ok_or_else(|| missing(field))?;
    if let Some(inner) = inner {
        node = node.get(inner).filter(|v| !v.is_null()).ok_or_else(|| missing(inner))?;
    }
    T::deserialize(node).map_err(|err| HubError::Decode {
        operation: field,
        reason: err.to_string(),
    })
}
