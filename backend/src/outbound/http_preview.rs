//! Shared helper for quoting upstream response bodies in error messages.

const PREVIEW_CHAR_LIMIT: usize = 160;

/// Collapse whitespace and truncate `body` for inclusion in an error message.
pub(crate) fn body_preview(body: &[u8]) -> String {
    let compact = String::from_utf8_lossy(body)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let preview = compact.chars().take(PREVIEW_CHAR_LIMIT).collect::<String>();
    if compact.chars().count() > PREVIEW_CHAR_LIMIT {
        format!("{preview}...")
    } else {
        preview
    }
}
