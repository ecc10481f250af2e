//! Internal helpers for model validation and conversion.
//!
//! These utilities are **not** part of the public API. They centralize
//! validation and mapping logic so every entity module enforces the same
//! rules on names, notes and stored ids.

use uuid::Uuid;

use crate::{EngineError, ResultEngine};

/// Longest name accepted for wallets and categories.
pub(crate) const MAX_NAME_CHARS: usize = 50;
/// Longest free-text note accepted on any entity.
pub(crate) const MAX_NOTE_CHARS: usize = 300;

/// Parse a UUID from storage and return a labeled error on failure.
pub(crate) fn parse_uuid(value: &str, label: &str) -> ResultEngine<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| EngineError::InvalidArgument(format!("invalid {label} id: {value}")))
}

/// Parse an optional stored UUID.
pub(crate) fn parse_optional_uuid(value: Option<&str>, label: &str) -> ResultEngine<Option<Uuid>> {
    value.map(|v| parse_uuid(v, label)).transpose()
}

/// Trim a required display name and enforce its length.
pub(crate) fn normalize_required_name(value: &str, label: &str) -> ResultEngine<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(EngineError::InvalidArgument(format!(
            "{label} name must not be empty"
        )));
    }
    if trimmed.chars().count() > MAX_NAME_CHARS {
        return Err(EngineError::InvalidArgument(format!(
            "{label} name must be at most {MAX_NAME_CHARS} characters"
        )));
    }
    Ok(trimmed.to_string())
}

/// Trim an optional note, mapping blank input to `None`.
pub(crate) fn normalize_optional_text(value: Option<&str>) -> ResultEngine<Option<String>> {
    let note = value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string);
    if let Some(note) = &note
        && note.chars().count() > MAX_NOTE_CHARS
    {
        return Err(EngineError::InvalidArgument(format!(
            "note must be at most {MAX_NOTE_CHARS} characters"
        )));
    }
    Ok(note)
}
