//! Writing assistant: suggestions for a draft and explanations of short
//! selections. One request each, no retries.

use crate::api::{ApiClient, Transport};
use crate::error::ClientError;
use failure::Error;
use tracing::warn;

pub const SUGGESTION_FALLBACK: &str = "The AI assistant is not available right now.";
pub const EXPLANATION_FALLBACK: &str = "Could not get an explanation for this word.";

/// Selections this long or longer are not explained.
pub const MAX_SELECTION_CHARS: usize = 50;

/// Asks for writing help on `draft`. A blank prompt is refused locally.
pub fn suggest<T: Transport>(api: &ApiClient<T>, prompt: &str, draft: &str) -> Result<String, Error> {
    if prompt.trim().is_empty() {
        return Err(ClientError::invalid("Please write a request!"));
    }
    let context = if draft.trim().is_empty() { None } else { Some(draft) };
    match api.assist(prompt, context) {
        Ok(suggestion) => Ok(suggestion),
        Err(e) => {
            warn!(error = %e, "assist request failed");
            Ok(SUGGESTION_FALLBACK.to_string())
        }
    }
}

/// Returns the trimmed selection if it is worth explaining.
pub fn selection(raw: &str) -> Option<&str> {
    let text = raw.trim();
    let len = text.chars().count();
    if len > 0 && len < MAX_SELECTION_CHARS {
        Some(text)
    } else {
        None
    }
}

/// `None` means the selection was out of bounds and nothing was sent.
pub fn explain<T: Transport>(api: &ApiClient<T>, raw_selection: &str, context: &str) -> Option<String> {
    let word = selection(raw_selection)?;
    let explanation = api.explain(word, context).unwrap_or_else(|e| {
        warn!(error = %e, "explain request failed");
        EXPLANATION_FALLBACK.to_string()
    });
    Some(explanation)
}
