//! Labels shared by the one-shot commands and the dashboard.

use hub_core::model::{Project, ProjectStatus, Task, TaskStatus};

/// "1 task", "0 tasks", "3 comments".
pub fn count_label(n: usize, singular: &str) -> String {
    if n == 1 {
        format!("{n} {singular}")
    } else {
        format!("{n} {singular}s")
    }
}

/// "N active": tasks whose status is not `DONE`.
pub fn active_label(project: &Project) -> String {
    format!("{} active", project.active_task_count())
}

pub fn task_count_label(project: &Project) -> String {
    count_label(project.tasks.len(), "task")
}

pub fn comment_count_label(task: &Task) -> String {
    count_label(task.comments.len(), "comment")
}

/// Human badge text for a project status.
pub fn project_badge(status: &ProjectStatus) -> String {
    humanize(status.as_str())
}

/// Human badge text for a task status.
pub fn task_badge(status: &TaskStatus) -> String {
    humanize(status.as_str())
}

fn humanize(raw: &str) -> String {
    raw.replace('_', " ")
}

/// Collapse a comment to one line of at most `max` characters.
pub fn one_line(text: &str, max: usize) -> String {
    let flat: String = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= max {
        return flat;
    }
    let mut out: String = flat.chars().take(max.saturating_sub(1)).collect();
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use hub_core::model::Comment;

    #[test]
    fn counts_are_pluralized() {
        assert_eq!(count_label(0, "task"), "0 tasks");
        assert_eq!(count_label(1, "task"), "1 task");
        assert_eq!(count_label(2, "comment"), "2 comments");
    }

    #[test]
    fn active_excludes_done() {
        let mut project = Project::new("p1", "Launch", ProjectStatus::Active);
        project.tasks.push(Task::new("t1", "a", TaskStatus::Done));
        project.tasks.push(Task::new("t2", "b", TaskStatus::InProgress));
        assert_eq!(active_label(&project), "1 active");
        assert_eq!(task_count_label(&project), "2 tasks");
    }

    #[test]
    fn badges_read_naturally() {
        assert_eq!(task_badge(&TaskStatus::InProgress), "IN PROGRESS");
        assert_eq!(project_badge(&ProjectStatus::Other("ON_HOLD".into())), "ON HOLD");
    }

    #[test]
    fn one_line_flattens_and_truncates() {
        let mut task = Task::new("t1", "a", TaskStatus::Todo);
        task.comments.push(Comment::new("c1", "x"));
        assert_eq!(comment_count_label(&task), "1 comment");
        assert_eq!(one_line("a\n  b", 10), "a b");
        assert_eq!(one_line("abcdefghijkl", 5), "abcd…");
    }
}
