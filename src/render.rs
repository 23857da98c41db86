//! Plain-text rendering of the history for simple sinks

use crate::session::{AttachmentMetadata, MessageEntry, Role};
use std::fmt::Write;

/// One line describing an attached file
pub fn attachment_line(meta: &AttachmentMetadata) -> String {
    format!(
        "Attached file: {} ({}, {} bytes)",
        meta.name(),
        meta.media_type(),
        meta.size_bytes()
    )
}

fn role_label(role: Role) -> &'static str {
    match role {
        Role::User => "User",
        Role::Assistant => "Assistant",
    }
}

pub fn render_entry(entry: &MessageEntry) -> String {
    let mut out = format!("{}: {}", role_label(entry.role()), entry.content());
    for meta in entry.attachments() {
        let _ = write!(out, "\n  {}", attachment_line(meta));
    }
    out
}

/// Entries separated by a blank line, oldest first
pub fn render_transcript(entries: &[MessageEntry]) -> String {
    entries
        .iter()
        .map(render_entry)
        .collect::<Vec<_>>()
        .join("\n\n")
}
