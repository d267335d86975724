//! Plain-text rendering of lists and chat logs for the terminal.

use crate::lists::{FetchOutcome, ReplyDraftList, Todo};
use crate::message_log::{Message, Role};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use std::fmt::Write;

/// Date part of an RFC 3339 timestamp, a naive ISO timestamp, or a plain date. Anything else is returned as-is.
pub fn format_date(raw: &str) -> String {
    let s = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return dt.date_naive().format("%Y-%m-%d").to_string();
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return dt.date().format("%Y-%m-%d").to_string();
    }
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return d.format("%Y-%m-%d").to_string();
    }
    s.to_string()
}

fn plural(n: usize, word: &str) -> String {
    format!("{} {}{}", n, word, if n == 1 { "" } else { "s" })
}

fn banner<T>(out: &mut String, outcome: &FetchOutcome<T>, what: &str) {
    if let Some(error) = outcome.error() {
        let _ = writeln!(out, "! Error loading {}: {}", what, error);
        let _ = writeln!(out, "! Showing demonstration data.");
        out.push('\n');
    }
}

fn render_todo(out: &mut String, todo: &Todo) {
    let _ = writeln!(out, "- {}", todo.title);
    if let Some(desc) = todo.description.as_deref().filter(|d| !d.is_empty()) {
        let _ = writeln!(out, "  {}", desc);
    }
    let _ = write!(out, "  [{}]", todo.status.label());
    if let Some(due) = todo.due_date.as_deref().filter(|d| !d.is_empty()) {
        let _ = write!(out, "  Due: {}", format_date(due));
    }
    out.push('\n');
}

/// To-do list with count header, error banner, or empty-state text.
pub fn render_todos(outcome: &FetchOutcome<Todo>) -> String {
    let mut out = String::from("To-Do List\n\n");
    banner(&mut out, outcome, "todos");
    let todos = outcome.items();
    if todos.is_empty() {
        out.push_str("No todos found. Todos extracted from your emails will appear here.\n");
        return out;
    }
    let _ = writeln!(out, "You have {}\n", plural(todos.len(), "todo"));
    for todo in todos {
        render_todo(&mut out, todo);
    }
    out
}

/// Reply drafts; the expanded draft also shows its original message.
pub fn render_reply_drafts(list: &ReplyDraftList) -> String {
    let mut out = String::from("AI Reply Drafts\n\n");
    banner(&mut out, &list.outcome, "reply drafts");
    let drafts = list.drafts();
    if drafts.is_empty() {
        out.push_str(
            "No reply drafts found. AI-generated replies will appear here once emails are analyzed!\n",
        );
        return out;
    }
    let _ = writeln!(
        out,
        "You have {}\n",
        plural(drafts.len(), "AI-generated reply draft")
    );
    for draft in drafts {
        let badge = if draft.needs_reply { "Needs Reply" } else { "Optional" };
        let _ = writeln!(out, "#{}  Message ID: {}  [{}]", draft.id, draft.message_id, badge);
        for line in draft.reply_draft.lines() {
            let _ = writeln!(out, "  | {}", line);
        }
        let _ = write!(out, "  Generated by AI");
        if let Some(at) = draft.processed_at.as_deref().filter(|s| !s.is_empty()) {
            let _ = write!(out, "  Processed: {}", format_date(at));
        }
        out.push('\n');
        if list.is_expanded(draft.id) {
            out.push_str("  Original Message\n");
            let _ = writeln!(out, "  From: {}", draft.sender);
            let _ = writeln!(out, "  Subject: {}", draft.subject);
            out.push_str("  Body:\n");
            for line in draft.body.lines() {
                let _ = writeln!(out, "    {}", line);
            }
        }
        out.push('\n');
    }
    out
}

/// One visible message as a prompt-style line.
pub fn render_message(message: &Message) -> Option<String> {
    match message.role {
        Role::System => None,
        Role::User => Some(format!("> {}", message.content)),
        Role::Assistant => Some(format!("< {}", message.content.trim())),
    }
}

/// Visible messages, one per line.
pub fn render_log(messages: &[Message]) -> String {
    messages
        .iter()
        .filter_map(render_message)
        .map(|line| line + "\n")
        .collect()
}
