//! Plain-text rendering of API results.

use std::fmt::Write as _;

use taskdeck_domain::{Task, TaskPage, TaskStats, TaskStatus, UserProfile};

const CHECK_OPEN: &str = "[ ]";
const CHECK_WORKING: &str = "[~]";
const CHECK_DONE: &str = "[x]";

const fn checkbox(status: TaskStatus) -> &'static str {
    match status {
        TaskStatus::Open => CHECK_OPEN,
        TaskStatus::InProgress => CHECK_WORKING,
        TaskStatus::Completed => CHECK_DONE,
    }
}

/// `Ada <ada@example.com>`
#[must_use]
pub fn profile(user: &UserProfile) -> String {
    format!("{} <{}>", user.name, user.email)
}

/// One task on one line.
#[must_use]
pub fn task_line(task: &Task) -> String {
    let mut line = format!("{} {}  {}", checkbox(task.status), task.id, task.title);
    if let Some(due) = task.due_day() {
        let _ = write!(line, "  (due {due})");
    }
    line
}

/// Every field of a task.
#[must_use]
pub fn task_detail(task: &Task) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", task.title);
    let _ = writeln!(out, "  id:       {}", task.id);
    let _ = writeln!(out, "  status:   {}", task.status.label());
    if let Some(description) = task.description.as_deref().filter(|d| !d.is_empty()) {
        let _ = writeln!(out, "  notes:    {description}");
    }
    if let Some(due) = task.due_day() {
        let _ = writeln!(out, "  due:      {due}");
    }
    let _ = writeln!(out, "  created:  {}", task.created_at.format("%Y-%m-%d %H:%M"));
    let _ = write!(out, "  updated:  {}", task.updated_at.format("%Y-%m-%d %H:%M"));
    out
}

/// A page of tasks with its position in the listing.
#[must_use]
pub fn page(page: &TaskPage) -> String {
    if page.tasks.is_empty() {
        return "No tasks found.".to_string();
    }
    let mut out: Vec<String> = page.tasks.iter().map(task_line).collect();
    let p = &page.pagination;
    let mut footer = format!("Page {} of {} ({} tasks)", p.page, p.total_pages, p.total);
    if p.has_prev {
        let _ = write!(footer, "  --page {} for previous", p.page - 1);
    }
    if p.has_next {
        let _ = write!(footer, "  --page {} for next", p.page + 1);
    }
    out.push(String::new());
    out.push(footer);
    out.join("\n")
}

/// Counts per status.
#[must_use]
pub fn stats(stats: &TaskStats) -> String {
    format!(
        "Total: {}\n{}: {}\n{}: {}\n{}: {}",
        stats.total,
        TaskStatus::Open.label(),
        stats.open,
        TaskStatus::InProgress.label(),
        stats.in_progress,
        TaskStatus::Completed.label(),
        stats.completed
    )
}

/// The diagnostics screen.
#[must_use]
pub fn debug_report(api_url: &str, user: Option<&UserProfile>, entries: &[(String, String)]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "API URL:       {api_url}");
    let _ = writeln!(
        out,
        "Authenticated: {}",
        user.map_or_else(|| "no".to_string(), |u| format!("yes, as {}", profile(u)))
    );
    let _ = write!(out, "Stored credentials:");
    if entries.is_empty() {
        let _ = write!(out, " none");
    }
    for (key, value) in entries {
        let _ = write!(out, "\n  {key}: {value}");
    }
    out
}
