//! Drawing for the dashboard.

use hub_core::model::Task;
use hub_core::{Dispatcher, LoadState, Snapshot};
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
};

use super::dashboard::{Dashboard, Focus, InputMode, ProjectRow, TaskRow, project_rows};
use crate::present::{
    active_label, comment_count_label, one_line, project_badge, task_badge, task_count_label,
};

const KEY_HINTS: [(&str, &str); 6] = [
    ("j/k", "move"),
    ("enter", "select"),
    ("tab", "switch pane"),
    ("n", "new"),
    ("r", "reload"),
    ("?", "help"),
];

const HELP: [(&str, &str); 12] = [
    ("j / k", "move cursor"),
    ("enter / space", "select project, toggle comments"),
    ("tab", "switch between projects and tasks"),
    ("n", "new project (projects) or task (tasks)"),
    ("t", "new task in the selected project"),
    ("c", "show or hide comments"),
    ("a", "add a comment to the task"),
    ("d", "mark task as complete"),
    ("x", "delete the comment under the cursor"),
    ("ctrl+s", "submit the current input"),
    ("esc", "cancel input, dismiss notice"),
    ("r / q", "reload / quit"),
];

/// Whether the project and task panes are on screen. When they are not, a
/// full-screen loading or error message covers them.
pub const fn tree_visible(state: &LoadState, loaded_once: bool) -> bool {
    match state {
        LoadState::Failed(_) => false,
        LoadState::Pending => loaded_once,
        LoadState::Ready => true,
    }
}

pub fn render(frame: &mut Frame<'_>, dash: &Dashboard, dispatcher: &Dispatcher, loaded_once: bool) {
    let area = frame.area();
    match dispatcher.store().load_state() {
        LoadState::Failed(message) => {
            render_full_screen(frame, area, "Could not load organizations", message, Color::Red);
            return;
        }
        LoadState::Pending if !loaded_once => {
            render_full_screen(
                frame,
                area,
                "Loading",
                &format!("Fetching organizations from {}…", dispatcher.endpoint()),
                Color::Cyan,
            );
            return;
        }
        _ => {}
    }

    let input_height = if is_text_input(&dash.mode) { 3 } else { 0 };
    let outer = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(3),
            Constraint::Length(input_height),
            Constraint::Length(1),
        ])
        .split(area);
    let panes = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(outer[0]);

    let snapshot = dispatcher.snapshot();
    render_projects(frame, panes[0], dash, snapshot);
    render_tasks(frame, panes[1], dash, snapshot);
    if input_height > 0 {
        render_input(frame, outer[1], dash, snapshot);
    }
    frame.render_widget(Paragraph::new(build_status_bar(dash, dispatcher)), outer[2]);

    match &dash.mode {
        InputMode::ConfirmDelete { preview, .. } => render_confirm(frame, area, preview),
        InputMode::Help => render_help(frame, area),
        _ => {}
    }
}

const fn is_text_input(mode: &InputMode) -> bool {
    matches!(
        mode,
        InputMode::ProjectName { .. } | InputMode::TaskTitle { .. } | InputMode::Comment { .. }
    )
}

fn pane_block(title: String, focused: bool) -> Block<'static> {
    let border = if focused { Color::Cyan } else { Color::DarkGray };
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border))
        .title(title)
}

fn project_color(badge: &str) -> Color {
    match badge {
        "ACTIVE" => Color::Green,
        "COMPLETED" => Color::DarkGray,
        _ => Color::Yellow,
    }
}

fn render_projects(frame: &mut Frame<'_>, area: Rect, dash: &Dashboard, snapshot: &Snapshot) {
    let rows = project_rows(snapshot);
    let items: Vec<ListItem<'_>> = rows
        .iter()
        .filter_map(|row| match row {
            ProjectRow::Org { slug } => snapshot.organization_by_slug(slug).map(|org| {
                ListItem::new(Line::from(vec![
                    Span::styled(org.name.clone(), Style::default().add_modifier(Modifier::BOLD)),
                    Span::styled(format!(" ({})", org.slug), Style::default().fg(Color::DarkGray)),
                ]))
            }),
            ProjectRow::Project { id, .. } => snapshot.project(id).map(|project| {
                let selected = dash.selected_project.as_ref() == Some(id);
                let badge = project_badge(&project.status);
                ListItem::new(Line::from(vec![
                    Span::raw(if selected { " ▶ " } else { "   " }),
                    Span::raw(project.name.clone()),
                    Span::raw(" "),
                    Span::styled(
                        format!("[{badge}]"),
                        Style::default().fg(project_color(&badge)),
                    ),
                    Span::styled(
                        format!(" {}", task_count_label(project)),
                        Style::default().fg(Color::DarkGray),
                    ),
                ]))
            }),
        })
        .collect();

    let focused = dash.focus == Focus::Projects && dash.mode == InputMode::Normal;
    let list = List::new(items)
        .block(pane_block(" Projects ".to_string(), focused))
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED));
    let mut state = ListState::default();
    if focused && !rows.is_empty() {
        state.select(Some(dash.project_cursor));
    }
    frame.render_stateful_widget(list, area, &mut state);
}

fn task_line(task: &Task, open: bool) -> Line<'static> {
    let done = task.status.is_done();
    let title_style = if done {
        Style::default()
            .fg(Color::DarkGray)
            .add_modifier(Modifier::CROSSED_OUT)
    } else {
        Style::default()
    };
    Line::from(vec![
        Span::raw(if done { "[x] " } else { "[ ] " }),
        Span::styled(task.title.clone(), title_style),
        Span::styled(
            format!("  {}", task_badge(&task.status)),
            Style::default().fg(if done { Color::DarkGray } else { Color::Yellow }),
        ),
        Span::styled(
            format!("  {} {}", if open { "▾" } else { "▸" }, comment_count_label(task)),
            Style::default().fg(Color::DarkGray),
        ),
    ])
}

fn render_tasks(frame: &mut Frame<'_>, area: Rect, dash: &Dashboard, snapshot: &Snapshot) {
    let focused = dash.focus == Focus::Tasks && dash.mode == InputMode::Normal;
    let Some(project) = dash
        .selected_project
        .as_ref()
        .and_then(|id| snapshot.project(id))
    else {
        let hint = Paragraph::new("Select a project to see its tasks.")
            .style(Style::default().fg(Color::DarkGray))
            .block(pane_block(" Tasks ".to_string(), false));
        frame.render_widget(hint, area);
        return;
    };

    let rows = dash.task_rows(snapshot);
    let items: Vec<ListItem<'_>> = rows
        .iter()
        .filter_map(|row| match row {
            TaskRow::Task(id) => snapshot
                .task(id)
                .map(|(_, task)| ListItem::new(task_line(task, dash.comments_open(id)))),
            TaskRow::Comment { task, comment } => snapshot
                .task(task)
                .and_then(|(_, t)| t.comments.iter().find(|c| &c.id == comment))
                .map(|c| {
                    ListItem::new(Line::from(vec![
                        Span::styled("      │ ", Style::default().fg(Color::DarkGray)),
                        Span::raw(one_line(&c.content, usize::from(area.width.saturating_sub(12)))),
                    ]))
                }),
        })
        .collect();

    let title = format!(" {} · {} ", project.name, active_label(project));
    let list = if items.is_empty() {
        List::new(vec![ListItem::new(Span::styled(
            "No tasks yet. Press n to add one.",
            Style::default().fg(Color::DarkGray),
        ))])
    } else {
        List::new(items)
    };
    let list = list
        .block(pane_block(title, focused))
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED));
    let mut state = ListState::default();
    if focused && !rows.is_empty() {
        state.select(Some(dash.task_cursor));
    }
    frame.render_stateful_widget(list, area, &mut state);
}

fn render_input(frame: &mut Frame<'_>, area: Rect, dash: &Dashboard, snapshot: &Snapshot) {
    let (title, draft) = match &dash.mode {
        InputMode::ProjectName { org } => (format!(" New project in {org} "), dash.project_draft.as_str()),
        InputMode::TaskTitle { project } => {
            let name = snapshot.project(project).map_or("?", |p| p.name.as_str());
            (format!(" New task in {name} "), dash.task_draft.as_str())
        }
        InputMode::Comment { task } => {
            let title = snapshot.task(task).map_or("?", |(_, t)| t.title.as_str());
            (format!(" Comment on '{title}' "), dash.comment_draft(task))
        }
        _ => return,
    };
    let input = Paragraph::new(format!("{draft}█"))
        .block(pane_block(title, true))
        .wrap(Wrap { trim: false });
    frame.render_widget(input, area);
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

fn render_confirm(frame: &mut Frame<'_>, area: Rect, preview: &str) {
    let popup = centered(area, 60, 5);
    frame.render_widget(Clear, popup);
    let body = Paragraph::new(vec![
        Line::from(format!("\"{preview}\"")),
        Line::from(vec![
            Span::styled("y", Style::default().fg(Color::Cyan)),
            Span::raw(" delete   "),
            Span::styled("n", Style::default().fg(Color::Cyan)),
            Span::raw(" keep"),
        ]),
    ])
    .alignment(Alignment::Center)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Red))
            .title(" Delete comment? "),
    );
    frame.render_widget(body, popup);
}

fn render_help(frame: &mut Frame<'_>, area: Rect) {
    let height = u16::try_from(HELP.len()).unwrap_or(u16::MAX).saturating_add(2);
    let popup = centered(area, 56, height);
    frame.render_widget(Clear, popup);
    let lines: Vec<Line<'_>> = HELP
        .iter()
        .map(|(key, what)| {
            Line::from(vec![
                Span::styled(format!("{key:>14}  "), Style::default().fg(Color::Cyan)),
                Span::raw(*what),
            ])
        })
        .collect();
    let body = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .title(" Keys (any key closes) "),
    );
    frame.render_widget(body, popup);
}

fn render_full_screen(frame: &mut Frame<'_>, area: Rect, title: &str, message: &str, color: Color) {
    let popup = centered(area, 70, 7);
    let body = Paragraph::new(vec![
        Line::from(Span::styled(message.to_string(), Style::default().fg(color))),
        Line::from(""),
        Line::from(vec![
            Span::styled("r", Style::default().fg(Color::Cyan)),
            Span::raw(" retry   "),
            Span::styled("q", Style::default().fg(Color::Cyan)),
            Span::raw(" quit   "),
            Span::styled("esc", Style::default().fg(Color::Cyan)),
            Span::raw(" dismiss"),
        ]),
    ])
    .alignment(Alignment::Center)
    .wrap(Wrap { trim: true })
    .block(Block::default().borders(Borders::ALL).title(format!(" {title} ")));
    frame.render_widget(body, popup);
}

fn build_status_bar(dash: &Dashboard, dispatcher: &Dispatcher) -> Line<'static> {
    if let Some(notice) = dispatcher.notices().latest() {
        return Line::from(vec![
            Span::styled(
                format!("✗ {}", notice.message),
                Style::default().fg(Color::Red),
            ),
            Span::styled("  (esc to dismiss)", Style::default().fg(Color::DarkGray)),
        ]);
    }
    if let Some(msg) = dash.status() {
        return Line::from(Span::styled(msg.to_string(), Style::default().fg(Color::Cyan)));
    }

    let key_style = Style::default().fg(Color::Cyan);
    let dim_style = Style::default().fg(Color::DarkGray);
    let mut spans: Vec<Span<'static>> = Vec::new();
    match dash.mode {
        InputMode::ProjectName { .. } | InputMode::TaskTitle { .. } | InputMode::Comment { .. } => {
            spans.push(Span::styled("ENTER", key_style));
            spans.push(Span::styled(" submit  ", dim_style));
            spans.push(Span::styled("ESC", key_style));
            spans.push(Span::styled(" cancel (draft kept)", dim_style));
        }
        _ => {
            for (key, label) in KEY_HINTS {
                spans.push(Span::styled(key, key_style));
                spans.push(Span::styled(format!(" {label}  "), dim_style));
            }
        }
    }

    let pending = dispatcher.in_flight();
    if dispatcher.is_loading() {
        spans.push(Span::styled("⟳ reloading  ", Style::default().fg(Color::Yellow)));
    } else if pending > 0 {
        spans.push(Span::styled(
            format!("⟳ {pending} pending"),
            Style::default().fg(Color::Yellow),
        ));
    }
    Line::from(spans)
}
