//! Flattening error chains into the single message stored on a file.

use std::error::Error as StdError;

/// Column bound for stored error text.
pub const MAX_ERROR_LEN: usize = 1024;

const SEPARATOR: &str = ": ";

/// Describe `err` and its causes, innermost cause first, joined with `": "`.
/// Adjacent duplicates are collapsed (wrappers often repeat their source's
/// message) and the result is capped at [`MAX_ERROR_LEN`] characters.
pub fn describe(err: &(dyn StdError + 'static)) -> String {
    let mut messages: Vec<String> = Vec::new();
    let mut current: Option<&(dyn StdError + 'static)> = Some(err);
    while let Some(e) = current {
        let msg = e.to_string();
        if messages.last() != Some(&msg) && !msg.is_empty() {
            messages.push(msg);
        }
        current = e.source();
    }
    messages.reverse();
    truncate_chars(messages.join(SEPARATOR), MAX_ERROR_LEN)
}

/// Same as [`describe`] for an `anyhow::Error`.
pub fn describe_anyhow(err: &anyhow::Error) -> String {
    let mut messages: Vec<String> = Vec::new();
    for e in err.chain() {
        let msg = e.to_string();
        if messages.last() != Some(&msg) && !msg.is_empty() {
            messages.push(msg);
        }
    }
    messages.reverse();
    truncate_chars(messages.join(SEPARATOR), MAX_ERROR_LEN)
}

fn truncate_chars(s: String, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s,
    }
}
