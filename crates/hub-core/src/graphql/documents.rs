//! GraphQL documents sent to the backend.
//!
//! Field selections match what the snapshot needs and nothing more; the
//! decoders in [`crate::load`] and [`crate::mutation`] rely on them.

pub const GET_ORGANIZATIONS: &str = "query GetOrganizations {
  organizations {
    id
    name
    slug
    projects {
      id
      name
      status
      tasks {
        id
        title
        status
        comments {
          id
          content
        }
      }
    }
  }
}";

pub const CREATE_PROJECT: &str = "mutation CreateProject($organizationSlug: String!, $name: String!, $description: String, $status: String) {
  createProject(organizationSlug: $organizationSlug, name: $name, description: $description, status: $status) {
    project {
      id
      name
      status
    }
  }
}";

pub const RENAME_PROJECT: &str = "mutation RenameProject($projectId: ID!, $name: String!) {
  renameProject(projectId: $projectId, name: $name) {
    project {
      id
      name
      status
    }
  }
}";

pub const CREATE_TASK: &str = "mutation CreateTask($projectId: ID!, $title: String!, $description: String, $status: String) {
  createTask(projectId: $projectId, title: $title, description: $description, status: $status) {
    task {
      id
      title
      status
    }
  }
}";

pub const UPDATE_TASK_STATUS: &str = "mutation UpdateTaskStatus($taskId: ID!, $status: String!) {
  updateTaskStatus(taskId: $taskId, status: $status) {
    task {
      id
      status
    }
  }
}";

pub const CREATE_COMMENT: &str = "mutation CreateComment($taskId: ID!, $content: String!) {
  createComment(taskId: $taskId, content: $content) {
    comment {
      id
      content
    }
  }
}";

pub const DELETE_COMMENT: &str = "mutation DeleteComment($commentId: ID!) {
  deleteComment(commentId: $commentId) {
    success
    taskId
  }
}";
