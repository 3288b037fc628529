use panelkit_core::config::TextLimits;
use panelkit_core::wire::SubmitEntry;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Appended after the kept characters when a field is cut.
pub const TRUNCATION_MARKER: &str = "...";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Rejected {
    #[error("name is empty")]
    EmptyName,
    #[error("body is empty")]
    EmptyBody,
    #[error("name is blank after trimming")]
    BlankName,
    #[error("body is blank after trimming")]
    BlankBody,
}

/// Validates and normalizes user text for a submit request.
///
/// Raw emptiness is checked first, then both fields are trimmed and checked
/// again. A trimmed field longer than its limit keeps exactly `max`
/// characters followed by [`TRUNCATION_MARKER`].
pub fn sanitize(name: &str, body: &str, limits: &TextLimits) -> Result<SubmitEntry, Rejected> {
    if name.is_empty() {
        return Err(Rejected::EmptyName);
    }
    if body.is_empty() {
        return Err(Rejected::EmptyBody);
    }

    let name = name.trim();
    let body = body.trim();
    if name.is_empty() {
        return Err(Rejected::BlankName);
    }
    if body.is_empty() {
        return Err(Rejected::BlankBody);
    }

    Ok(SubmitEntry {
        name: clamp_text(name, limits.max_name_length),
        body: clamp_text(body, limits.max_body_length),
    })
}

/// Counts characters, not bytes, so multi-byte text is never split.
pub fn clamp_text(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        None => text.to_string(),
        Some((cut, _)) => {
            let mut clamped = String::with_capacity(cut + TRUNCATION_MARKER.len());
            clamped.push_str(&text[..cut]);
            clamped.push_str(TRUNCATION_MARKER);
            clamped
        }
    }
}

/// Input buffers behind a writer panel's name and body fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Draft {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub body: String,
}

impl Draft {
    pub fn new(name: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            body: body.into(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_empty() && self.body.is_empty()
    }

    pub fn clear(&mut self) {
        self.name.clear();
        self.body.clear();
    }

    /// Sanitizes the buffers and clears them on success. A rejected draft
    /// is left as typed.
    pub fn take_submission(&mut self, limits: &TextLimits) -> Result<SubmitEntry, Rejected> {
        let entry = sanitize(&self.name, &self.body, limits)?;
        self.clear();
        Ok(entry)
    }
}
