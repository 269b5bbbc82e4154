//! Dashboard view state and key handling.
//!
//! The dashboard owns only ephemeral UI state: cursors, the selected
//! project, which comment panels are open, and unsent drafts. Server data
//! always comes from the dispatcher's snapshot, passed in on every call, so
//! a reload or a settled mutation never leaves stale copies behind.
//!
//! Key handling never talks to the network. It returns a [`DashAction`]
//! that the event loop carries out.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use hub_core::model::{EntityId, TaskStatus};
use hub_core::{Mutation, Snapshot};

use crate::present::one_line;
use crate::validate;

const STATUS_TTL: Duration = Duration::from_secs(3);

/// What the event loop should do after a key press.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DashAction {
    None,
    Submit(Mutation),
    Reload,
    DismissNotice,
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Focus {
    #[default]
    Projects,
    Tasks,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum InputMode {
    #[default]
    Normal,
    /// Typing a new project name for this organization.
    ProjectName { org: String },
    /// Typing a new task title for this project.
    TaskTitle { project: EntityId },
    /// Typing a comment on this task.
    Comment { task: EntityId },
    /// Waiting for y/n before deleting a comment.
    ConfirmDelete { comment: EntityId, preview: String },
    Help,
}

/// One line of the project pane.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProjectRow {
    Org { slug: String },
    Project { org: String, id: EntityId },
}

/// One line of the task pane.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskRow {
    Task(EntityId),
    Comment { task: EntityId, comment: EntityId },
}

impl TaskRow {
    const fn task(&self) -> &EntityId {
        match self {
            Self::Task(task) | Self::Comment { task, .. } => task,
        }
    }
}

#[derive(Debug, Default)]
pub struct Dashboard {
    pub focus: Focus,
    pub mode: InputMode,
    pub project_cursor: usize,
    pub task_cursor: usize,
    /// At most one project is selected; selecting it again clears it.
    pub selected_project: Option<EntityId>,
    pub open_comments: HashMap<EntityId, bool>,
    pub comment_drafts: HashMap<EntityId, String>,
    pub project_draft: String,
    pub task_draft: String,
    status_msg: Option<(String, Instant)>,
}

/// Rows of the project pane: each organization followed by its projects.
pub fn project_rows(snapshot: &Snapshot) -> Vec<ProjectRow> {
    let mut rows = Vec::new();
    for org in &snapshot.organizations {
        rows.push(ProjectRow::Org {
            slug: org.slug.clone(),
        });
        rows.extend(org.projects.iter().map(|p| ProjectRow::Project {
            org: org.slug.clone(),
            id: p.id.clone(),
        }));
    }
    rows
}

impl Dashboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_status(&mut self, msg: impl Into<String>) {
        self.status_msg = Some((msg.into(), Instant::now()));
    }

    /// The transient status message, if it is still fresh.
    pub fn status(&self) -> Option<&str> {
        self.status_msg
            .as_ref()
            .filter(|(_, at)| at.elapsed() < STATUS_TTL)
            .map(|(msg, _)| msg.as_str())
    }

    pub fn comments_open(&self, task: &EntityId) -> bool {
        self.open_comments.get(task).copied().unwrap_or(false)
    }

    pub fn comment_draft(&self, task: &EntityId) -> &str {
        self.comment_drafts.get(task).map_or("", String::as_str)
    }

    /// Rows of the task pane for the selected project. Comments follow their
    /// task when its panel is open.
    pub fn task_rows(&self, snapshot: &Snapshot) -> Vec<TaskRow> {
        let Some(project) = self
            .selected_project
            .as_ref()
            .and_then(|id| snapshot.project(id))
        else {
            return Vec::new();
        };
        let mut rows = Vec::new();
        for task in &project.tasks {
            rows.push(TaskRow::Task(task.id.clone()));
            if self.comments_open(&task.id) {
                rows.extend(task.comments.iter().map(|c| TaskRow::Comment {
                    task: task.id.clone(),
                    comment: c.id.clone(),
                }));
            }
        }
        rows
    }

    /// Bring view state back in line with a changed snapshot.
    pub fn sync(&mut self, snapshot: &Snapshot) {
        if let Some(id) = &self.selected_project
            && snapshot.project(id).is_none()
        {
            self.selected_project = None;
            self.focus = Focus::Projects;
        }
        let projects = project_rows(snapshot).len();
        self.project_cursor = self.project_cursor.min(projects.saturating_sub(1));
        let tasks = self.task_rows(snapshot).len();
        self.task_cursor = self.task_cursor.min(tasks.saturating_sub(1));
    }

    pub fn handle_key(&mut self, key: KeyEvent, snapshot: &Snapshot) -> DashAction {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        if ctrl && key.code == KeyCode::Char('c') {
            return DashAction::Quit;
        }

        match self.mode.clone() {
            InputMode::Normal => self.handle_normal_key(key, snapshot),
            InputMode::Help => {
                self.mode = InputMode::Normal;
                DashAction::None
            }
            InputMode::ConfirmDelete { comment, .. } => match key.code {
                KeyCode::Char('y' | 'Y') | KeyCode::Enter => {
                    self.mode = InputMode::Normal;
                    DashAction::Submit(Mutation::DeleteComment { comment_id: comment })
                }
                KeyCode::Char('n' | 'N') | KeyCode::Esc => {
                    self.mode = InputMode::Normal;
                    self.set_status("Delete cancelled");
                    DashAction::None
                }
                _ => DashAction::None,
            },
            InputMode::ProjectName { .. } | InputMode::TaskTitle { .. } | InputMode::Comment { .. } => {
                self.handle_input_key(key, ctrl)
            }
        }
    }

    /// Handle a key while the tree is hidden behind the loading or error
    /// screen. Only retry, quit and dismiss do anything; a pending delete
    /// confirmation is cancelled by `Esc` like any other popup.
    pub fn handle_key_without_tree(&mut self, key: KeyEvent) -> DashAction {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        if ctrl && key.code == KeyCode::Char('c') {
            return DashAction::Quit;
        }
        match key.code {
            KeyCode::Char('q') => DashAction::Quit,
            KeyCode::Char('r') => DashAction::Reload,
            KeyCode::Esc => {
                self.mode = InputMode::Normal;
                DashAction::DismissNotice
            }
            _ => DashAction::None,
        }
    }

    fn handle_normal_key(&mut self, key: KeyEvent, snapshot: &Snapshot) -> DashAction {
        match key.code {
            KeyCode::Char('q') => return DashAction::Quit,
            KeyCode::Char('r') => return DashAction::Reload,
            KeyCode::Char('?') => self.mode = InputMode::Help,
            KeyCode::Char('j') | KeyCode::Down => self.move_cursor(1, snapshot),
            KeyCode::Char('k') | KeyCode::Up => self.move_cursor(-1, snapshot),
            KeyCode::Tab => {
                self.focus = match self.focus {
                    Focus::Projects if self.selected_project.is_some() => Focus::Tasks,
                    _ => Focus::Projects,
                };
            }
            KeyCode::Esc => {
                if self.focus == Focus::Tasks {
                    self.focus = Focus::Projects;
                } else {
                    return DashAction::DismissNotice;
                }
            }
            _ => {
                return match self.focus {
                    Focus::Projects => self.handle_project_key(key, snapshot),
                    Focus::Tasks => self.handle_task_key(key, snapshot),
                };
            }
        }
        DashAction::None
    }

    fn handle_project_key(&mut self, key: KeyEvent, snapshot: &Snapshot) -> DashAction {
        let rows = project_rows(snapshot);
        let current = rows.get(self.project_cursor);
        match key.code {
            KeyCode::Enter | KeyCode::Char(' ') => {
                if let Some(ProjectRow::Project { id, .. }) = current {
                    self.toggle_project(id.clone());
                }
            }
            KeyCode::Char('n') => {
                let org = match current {
                    Some(ProjectRow::Org { slug } | ProjectRow::Project { org: slug, .. }) => slug.clone(),
                    None => {
                        self.set_status("No organization to add a project to");
                        return DashAction::None;
                    }
                };
                self.mode = InputMode::ProjectName { org };
            }
            KeyCode::Char('t') => return self.open_task_input(),
            _ => {}
        }
        DashAction::None
    }

    fn handle_task_key(&mut self, key: KeyEvent, snapshot: &Snapshot) -> DashAction {
        let rows = self.task_rows(snapshot);
        let current = rows.get(self.task_cursor).cloned();
        match key.code {
            KeyCode::Char('n' | 't') => return self.open_task_input(),
            KeyCode::Enter | KeyCode::Char(' ' | 'c') => {
                if let Some(row) = current {
                    self.toggle_comments(row.task().clone(), snapshot);
                }
            }
            KeyCode::Char('a') => {
                if let Some(row) = current {
                    let task = row.task().clone();
                    self.open_comments.insert(task.clone(), true);
                    self.mode = InputMode::Comment { task };
                }
            }
            KeyCode::Char('d') => {
                if let Some(row) = current {
                    return self.mark_complete(row.task(), snapshot);
                }
            }
            KeyCode::Char('x') => {
                if let Some(TaskRow::Comment { task, comment }) = current {
                    let preview = snapshot
                        .task(&task)
                        .and_then(|(_, t)| t.comments.iter().find(|c| c.id == comment))
                        .map(|c| one_line(&c.content, 40))
                        .unwrap_or_default();
                    self.mode = InputMode::ConfirmDelete { comment, preview };
                } else {
                    self.set_status("Move to a comment to delete it");
                }
            }
            _ => {}
        }
        DashAction::None
    }

    fn handle_input_key(&mut self, key: KeyEvent, ctrl: bool) -> DashAction {
        match key.code {
            KeyCode::Esc => {
                self.mode = InputMode::Normal;
                DashAction::None
            }
            KeyCode::Enter => self.submit(),
            KeyCode::Char('s') if ctrl => self.submit(),
            KeyCode::Backspace => {
                if let Some(draft) = self.draft_mut() {
                    draft.pop();
                }
                DashAction::None
            }
            KeyCode::Char(ch) if !ctrl => {
                if let Some(draft) = self.draft_mut() {
                    draft.push(ch);
                }
                DashAction::None
            }
            _ => DashAction::None,
        }
    }

    fn draft_mut(&mut self) -> Option<&mut String> {
        match &self.mode {
            InputMode::ProjectName { .. } => Some(&mut self.project_draft),
            InputMode::TaskTitle { .. } => Some(&mut self.task_draft),
            InputMode::Comment { task } => Some(self.comment_drafts.entry(task.clone()).or_default()),
            _ => None,
        }
    }

    /// Shared by Enter and the explicit submit key. Empty input does nothing.
    pub fn submit(&mut self) -> DashAction {
        let mutation = match &self.mode {
            InputMode::ProjectName { org } => {
                if self.project_draft.trim().is_empty() {
                    return DashAction::None;
                }
                match validate::validate_project_name(&self.project_draft) {
                    Ok(name) => {
                        let org = org.clone();
                        self.project_draft.clear();
                        Mutation::CreateProject {
                            organization_slug: org,
                            name,
                            description: None,
                            status: None,
                        }
                    }
                    Err(err) => {
                        self.set_status(format!("Project name {}", err.reason));
                        return DashAction::None;
                    }
                }
            }
            InputMode::TaskTitle { project } => {
                if self.task_draft.trim().is_empty() {
                    return DashAction::None;
                }
                match validate::validate_task_title(&self.task_draft) {
                    Ok(title) => {
                        let project = project.clone();
                        self.task_draft.clear();
                        Mutation::CreateTask {
                            project_id: project,
                            title,
                            description: None,
                            status: None,
                        }
                    }
                    Err(err) => {
                        self.set_status(format!("Task title {}", err.reason));
                        return DashAction::None;
                    }
                }
            }
            InputMode::Comment { task } => {
                let task = task.clone();
                let draft = self.comment_draft(&task).to_string();
                if draft.trim().is_empty() {
                    return DashAction::None;
                }
                match validate::validate_comment(&draft) {
                    Ok(content) => {
                        self.comment_drafts.remove(&task);
                        Mutation::CreateComment {
                            task_id: task,
                            content,
                        }
                    }
                    Err(err) => {
                        self.set_status(format!("Comment {}", err.reason));
                        return DashAction::None;
                    }
                }
            }
            _ => return DashAction::None,
        };
        self.mode = InputMode::Normal;
        DashAction::Submit(mutation)
    }

    fn open_task_input(&mut self) -> DashAction {
        match &self.selected_project {
            Some(project) => {
                self.mode = InputMode::TaskTitle {
                    project: project.clone(),
                };
            }
            None => self.set_status("Select a project first"),
        }
        DashAction::None
    }

    fn toggle_project(&mut self, id: EntityId) {
        if self.selected_project.as_ref() == Some(&id) {
            self.selected_project = None;
            self.focus = Focus::Projects;
        } else {
            self.selected_project = Some(id);
            self.task_cursor = 0;
            self.focus = Focus::Tasks;
        }
    }

    fn toggle_comments(&mut self, task: EntityId, snapshot: &Snapshot) {
        let open = !self.comments_open(&task);
        self.open_comments.insert(task.clone(), open);
        if !open {
            // Keep the cursor on the task whose comments just collapsed.
            if let Some(pos) = self
                .task_rows(snapshot)
                .iter()
                .position(|r| r == &TaskRow::Task(task.clone()))
            {
                self.task_cursor = pos;
            }
        }
    }

    fn mark_complete(&mut self, task: &EntityId, snapshot: &Snapshot) -> DashAction {
        match snapshot.task(task) {
            Some((_, t)) if t.status.is_done() => {
                self.set_status(format!("'{}' is already done", t.title));
                DashAction::None
            }
            Some(_) => DashAction::Submit(Mutation::UpdateTaskStatus {
                task_id: task.clone(),
                status: TaskStatus::Done,
            }),
            None => DashAction::None,
        }
    }

    fn move_cursor(&mut self, delta: isize, snapshot: &Snapshot) {
        let (cursor, len) = match self.focus {
            Focus::Projects => (&mut self.project_cursor, project_rows(snapshot).len()),
            Focus::Tasks => {
                let len = self.task_rows(snapshot).len();
                (&mut self.task_cursor, len)
            }
        };
        if len == 0 {
            *cursor = 0;
            return;
        }
        *cursor = cursor.saturating_add_signed(delta).min(len - 1);
    }
}
