//! To-do and reply-draft lists fetched from the service.
//!
//! Each list is fetched once per activation. A failed fetch is reported as
//! [`FetchOutcome::Failed`] carrying demonstration items so there is always something to
//! show, while a successful empty fetch stays [`FetchOutcome::Loaded`] with no items.

use crate::backend::{Backend, BackendError};
use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TodoStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
}

impl TodoStatus {
    /// Display label: the wire name with dashes replaced by spaces.
    pub fn label(&self) -> &'static str {
        match self {
            TodoStatus::Pending => "pending",
            TodoStatus::InProgress => "in progress",
            TodoStatus::Completed => "completed",
        }
    }
}

/// Missing, null, and unrecognized statuses read as pending.
fn deserialize_status<'de, D>(deserializer: D) -> Result<TodoStatus, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(match raw.as_deref().map(str::trim) {
        Some("in-progress") | Some("in_progress") | Some("in progress") => TodoStatus::InProgress,
        Some("completed") => TodoStatus::Completed,
        _ => TodoStatus::Pending,
    })
}

/// Null and missing text read as empty; the service's message columns are nullable.
fn deserialize_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

fn deserialize_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or_default())
}

/// A task extracted from email by the service. Read-only on this side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Todo {
    pub id: i64,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "deserialize_status")]
    pub status: TodoStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    /// Id of the email the task came from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
}

/// An AI-generated reply with the original message it answers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplyDraft {
    pub id: i64,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub message_id: String,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub reply_draft: String,
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub needs_reply: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processed_at: Option<String>,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub sender: String,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub subject: String,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub body: String,
}

/// Result of fetching a list.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome<T> {
    /// The service answered; the list may be empty.
    Loaded(Vec<T>),
    /// The fetch failed; `fallback` holds demonstration items.
    Failed { error: String, fallback: Vec<T> },
}

impl<T> FetchOutcome<T> {
    /// Items to display: the fetched list, or the demonstration list after a failure.
    pub fn items(&self) -> &[T] {
        match self {
            FetchOutcome::Loaded(items) => items,
            FetchOutcome::Failed { fallback, .. } => fallback,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            FetchOutcome::Loaded(_) => None,
            FetchOutcome::Failed { error, .. } => Some(error),
        }
    }

    /// True only for a successful fetch that returned nothing.
    pub fn is_empty_result(&self) -> bool {
        matches!(self, FetchOutcome::Loaded(items) if items.is_empty())
    }
}

fn settle<T>(what: &str, result: Result<Vec<T>, BackendError>, demo: fn() -> Vec<T>) -> FetchOutcome<T> {
    match result {
        Ok(items) => {
            log::debug!("lists: fetched {} {}", items.len(), what);
            FetchOutcome::Loaded(items)
        }
        Err(e) => {
            log::warn!("lists: fetching {} failed, showing demonstration data: {}", what, e);
            FetchOutcome::Failed {
                error: e.to_string(),
                fallback: demo(),
            }
        }
    }
}

/// GET the to-do list once.
pub async fn fetch_todos(backend: &dyn Backend) -> FetchOutcome<Todo> {
    settle("todos", backend.todos().await, demo_todos)
}

/// GET the reply drafts once.
pub async fn fetch_reply_drafts(backend: &dyn Backend) -> FetchOutcome<ReplyDraft> {
    settle("reply drafts", backend.reply_drafts().await, demo_reply_drafts)
}

/// Reply drafts plus which one (if any) shows its original message.
#[derive(Debug, Clone)]
pub struct ReplyDraftList {
    pub outcome: FetchOutcome<ReplyDraft>,
    expanded: Option<i64>,
}

impl ReplyDraftList {
    pub fn new(outcome: FetchOutcome<ReplyDraft>) -> Self {
        Self {
            outcome,
            expanded: None,
        }
    }

    pub fn drafts(&self) -> &[ReplyDraft] {
        self.outcome.items()
    }

    pub fn expanded(&self) -> Option<i64> {
        self.expanded
    }

    pub fn is_expanded(&self, id: i64) -> bool {
        self.expanded == Some(id)
    }

    /// Expand `id`, or collapse it if it is already the expanded draft. At most one draft is expanded.
    pub fn toggle(&mut self, id: i64) {
        self.expanded = if self.expanded == Some(id) { None } else { Some(id) };
    }
}

/// Shown when the to-do fetch fails.
pub fn demo_todos() -> Vec<Todo> {
    vec![
        Todo {
            id: 1,
            title: "Review email templates".to_string(),
            description: Some(
                "Update and optimize existing email templates for better engagement".to_string(),
            ),
            status: TodoStatus::Pending,
            created_at: Some("2024-01-15T10:30:00Z".to_string()),
            due_date: Some("2024-01-20".to_string()),
            message_id: None,
        },
        Todo {
            id: 2,
            title: "Organize inbox filters".to_string(),
            description: Some("Set up automated filters to categorize incoming emails".to_string()),
            status: TodoStatus::InProgress,
            created_at: Some("2024-01-14T14:20:00Z".to_string()),
            due_date: Some("2024-01-18".to_string()),
            message_id: None,
        },
        Todo {
            id: 3,
            title: "Schedule client follow-ups".to_string(),
            description: Some(
                "Send follow-up emails to clients from last week's meetings".to_string(),
            ),
            status: TodoStatus::Completed,
            created_at: Some("2024-01-12T09:15:00Z".to_string()),
            due_date: Some("2024-01-17".to_string()),
            message_id: None,
        },
    ]
}

/// Shown when the reply-draft fetch fails.
pub fn demo_reply_drafts() -> Vec<ReplyDraft> {
    vec![
        ReplyDraft {
            id: 1,
            message_id: "19811dc22e0d0e77".to_string(),
            reply_draft: "Thank you for your inquiry. I'll review your request and get back to you within 24 hours.".to_string(),
            needs_reply: true,
            processed_at: Some("2024-01-15T10:30:00Z".to_string()),
            sender: "Alice Smith <alice@example.com>".to_string(),
            subject: "Regarding your project proposal".to_string(),
            body: "Hi,\n\nI hope this email finds you well. I'm writing to follow up on the project proposal we discussed last week. Could you please provide an update on its status?\n\nBest regards,\nAlice".to_string(),
        },
        ReplyDraft {
            id: 2,
            message_id: "29822ec33f1e1f88".to_string(),
            reply_draft: "Hi there! I've received your application and will process it shortly. You should hear back from us by the end of the week.".to_string(),
            needs_reply: true,
            processed_at: Some("2024-01-14T14:20:00Z".to_string()),
            sender: "Job Applications <jobs@company.com>".to_string(),
            subject: "Your application for Software Engineer".to_string(),
            body: "Dear Applicant,\n\nWe have received your application for the Software Engineer position. Our team will review your qualifications and get back to you soon.\n\nThank you for your interest.\n\nSincerely,\nThe HR Team".to_string(),
        },
        ReplyDraft {
            id: 3,
            message_id: "39833fd44g2f2g99".to_string(),
            reply_draft: "Great to hear from you! Let me check our availability for the meeting you requested and I'll send you some time slots.".to_string(),
            needs_reply: false,
            processed_at: Some("2024-01-12T09:15:00Z".to_string()),
            sender: "Bob Johnson <bob@anotherco.com>".to_string(),
            subject: "Meeting request for Q3 review".to_string(),
            body: "Hi,\n\nCould we schedule a meeting next week to discuss the Q3 review? Please let me know your availability.\n\nThanks,\nBob".to_string(),
        },
    ]
}
