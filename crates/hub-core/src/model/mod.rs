//! Client-side entity model: organizations → projects → tasks → comments.

pub mod entity;
pub mod id;
pub mod status;

pub use entity::{Comment, Organization, Project, Task};
pub use id::EntityId;
pub use status::{ParseStatusError, ProjectStatus, TaskStatus};
