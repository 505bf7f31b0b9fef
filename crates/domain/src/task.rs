//! Task records and the shapes used to list, create and edit them.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};

/// Page size used by the dashboard.
pub const DEFAULT_PAGE_SIZE: u32 = 6;

/// Workflow status of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    /// Not started
    #[default]
    Open,
    /// Being worked on
    InProgress,
    /// Done
    Completed,
}

impl TaskStatus {
    /// Returns all statuses in workflow order.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Open, Self::InProgress, Self::Completed]
    }

    /// Wire name, as used in query strings and bodies.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Open => "OPEN",
            Self::InProgress => "IN_PROGRESS",
            Self::Completed => "COMPLETED",
        }
    }

    /// Human-readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Open => "Open",
            Self::InProgress => "In Progress",
            Self::Completed => "Completed",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> DomainResult<Self> {
        match s.trim().to_uppercase().replace(['-', ' '], "_").as_str() {
            "OPEN" => Ok(Self::Open),
            "IN_PROGRESS" => Ok(Self::InProgress),
            "COMPLETED" => Ok(Self::Completed),
            _ => Err(DomainError::UnknownStatus(s.to_string())),
        }
    }
}

/// A task as stored by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Backend identifier
    pub id: String,
    /// Short title
    pub title: String,
    /// Optional longer text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Workflow status
    pub status: TaskStatus,
    /// Due date as sent by the backend (ISO date or date-time)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp
    pub updated_at: DateTime<Utc>,
    /// Owner
    pub user_id: String,
}

impl Task {
    /// Returns the calendar-day part of the due date (`YYYY-MM-DD`).
    #[must_use]
    pub fn due_day(&self) -> Option<&str> {
        self.due_date
            .as_deref()
            .map(|d| d.split('T').next().unwrap_or(d))
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn check_due_date(value: &str) -> DomainResult<()> {
    let parsed = NaiveDate::parse_from_str(value, "%Y-%m-%d").is_ok()
        || DateTime::parse_from_rfc3339(value).is_ok();
    if parsed {
        Ok(())
    } else {
        Err(DomainError::InvalidDate(value.to_string()))
    }
}

/// Body of `POST /tasks`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskCreate {
    /// Required title
    pub title: String,
    /// Optional description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Optional due date
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    /// Initial status; the backend defaults to `OPEN`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
}

impl TaskCreate {
    /// Creates a form with just a title.
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// Trims the form and checks it before submission.
    ///
    /// Blank description and due date are dropped rather than sent.
    ///
    /// # Errors
    ///
    /// Returns an error if the title is blank or the due date is not a date.
    pub fn normalized(self) -> DomainResult<Self> {
        let title = self.title.trim().to_string();
        if title.is_empty() {
            return Err(DomainError::MissingField { field: "Title" });
        }
        let due_date = non_blank(self.due_date);
        if let Some(date) = &due_date {
            check_due_date(date)?;
        }
        Ok(Self {
            title,
            description: non_blank(self.description),
            due_date,
            status: self.status,
        })
    }
}

/// Body of `PATCH /tasks/:id`. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskUpdate {
    /// New title
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// New description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// New due date
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    /// New status
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
}

impl TaskUpdate {
    /// Returns true if nothing would change.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.due_date.is_none()
            && self.status.is_none()
    }

    /// Trims the form and checks it before submission.
    ///
    /// # Errors
    ///
    /// Returns an error if a title is given but blank, or the due date is
    /// not a date.
    pub fn normalized(self) -> DomainResult<Self> {
        let title = match self.title {
            Some(title) if title.trim().is_empty() => {
                return Err(DomainError::MissingField { field: "Title" });
            }
            Some(title) => Some(title.trim().to_string()),
            None => None,
        };
        let due_date = non_blank(self.due_date);
        if let Some(date) = &due_date {
            check_due_date(date)?;
        }
        Ok(Self {
            title,
            description: self.description.map(|d| d.trim().to_string()),
            due_date,
            status: self.status,
        })
    }
}

/// Filters for `GET /tasks`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskQuery {
    /// 1-based page number
    pub page: Option<u32>,
    /// Page size
    pub limit: Option<u32>,
    /// Only tasks with this status
    pub status: Option<TaskStatus>,
    /// Free-text search
    pub search: Option<String>,
}

impl TaskQuery {
    /// The dashboard's query for `page`, with the default page size.
    #[must_use]
    pub fn dashboard(page: u32) -> Self {
        Self {
            page: Some(page.max(1)),
            limit: Some(DEFAULT_PAGE_SIZE),
            ..Self::default()
        }
    }

    /// Restricts to one status.
    #[must_use]
    pub const fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Adds a search term.
    #[must_use]
    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    /// Query-string pairs; unset filters and blank searches are omitted.
    #[must_use]
    pub fn to_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        if let Some(page) = self.page {
            pairs.push(("page".to_string(), page.to_string()));
        }
        if let Some(limit) = self.limit {
            pairs.push(("limit".to_string(), limit.to_string()));
        }
        if let Some(status) = self.status {
            pairs.push(("status".to_string(), status.as_str().to_string()));
        }
        if let Some(search) = self.search.as_deref().map(str::trim)
            && !search.is_empty()
        {
            pairs.push(("search".to_string(), search.to_string()));
        }
        pairs
    }
}

/// Counts per status, as returned by `GET /tasks/stats`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskStats {
    /// All tasks
    pub total: u64,
    /// Completed tasks
    pub completed: u64,
    /// Tasks in progress
    pub in_progress: u64,
    /// Open tasks
    pub open: u64,
}

/// Pagination details of a task listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pagination {
    /// Current page
    pub page: u32,
    /// Page size
    pub limit: u32,
    /// Matching tasks across all pages
    pub total: u64,
    /// Number of pages
    pub total_pages: u32,
    /// Whether a later page exists
    pub has_next: bool,
    /// Whether an earlier page exists
    pub has_prev: bool,
    /// Per-status counts, when the backend includes them
    pub stats: Option<TaskStats>,
}

/// One page of tasks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskPage {
    /// Tasks on this page
    pub tasks: Vec<Task>,
    /// Where this page sits in the listing
    pub pagination: Pagination,
}

/// Wire shape of `GET /tasks`.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskListEnvelope {
    /// Tasks on this page
    pub data: Vec<Task>,
    /// Listing metadata
    pub meta: ListMeta,
}

/// Metadata block of [`TaskListEnvelope`].
#[derive(Debug, Clone, Deserialize)]
pub struct ListMeta {
    /// Current page
    pub page: u32,
    /// Page size
    pub limit: u32,
    /// Matching tasks
    pub total: u64,
    /// Number of pages
    pub pages: u32,
    /// Per-status counts
    #[serde(default)]
    pub stats: Option<TaskStats>,
}

impl TaskListEnvelope {
    /// Converts the wire shape into a [`TaskPage`].
    #[must_use]
    pub fn into_page(self) -> TaskPage {
        let meta = self.meta;
        TaskPage {
            tasks: self.data,
            pagination: Pagination {
                page: meta.page,
                limit: meta.limit,
                total: meta.total,
                total_pages: meta.pages,
                has_next: meta.page < meta.pages,
                has_prev: meta.page > 1,
                stats: meta.stats,
            },
        }
    }
}
