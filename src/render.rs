//! Turns a normalized worker response into the markdown string shown in the
//! chat, and maps transport failures to a user-visible message.

use crate::state::ChatMessage;
use crate::transport::{RagResponse, TransportError};

/// Substituted when the worker omits or empties the answer field.
pub const FALLBACK_TEXT: &str = "No response from AI.";

/// Fixed apology shown when the worker cannot be reached.
pub const APOLOGY_TEXT: &str =
    "I encountered an error connecting to the AI service. Please ensure the \
     worker endpoint is correct and the worker is online.";

/// At most this many citations are listed under Sources.
const MAX_CITATIONS: usize = 8;

/// Format one answer as display markdown: the answer text followed by a
/// Sources section when citations are present. Pure and total; formatting the
/// same response twice yields the same string.
pub fn format_answer(response: &RagResponse) -> String {
    let answer = response.text.trim();
    let answer = if answer.is_empty() { FALLBACK_TEXT } else { answer };

    // Citations with no tag carry nothing the user can follow; drop them
    // before applying the cap so they don't use up a slot.
    let citations: Vec<_> = response
        .citations
        .iter()
        .filter(|c| !c.tag.is_empty())
        .take(MAX_CITATIONS)
        .collect();

    if citations.is_empty() {
        return answer.to_string();
    }

    let mut out = String::from(answer);
    out.push_str("\n\n---\n### Sources");
    for citation in citations {
        let page = citation
            .page
            .map(|p| p.to_string())
            .unwrap_or_else(|| "?".to_string());
        out.push_str(&format!(
            "\n- {} **{}** (p. {})",
            citation.tag, citation.source, page
        ));
    }

    out
}

/// Map a transport failure to the chat message shown in place of an answer.
pub fn error_reply(error: &TransportError) -> ChatMessage {
    ChatMessage::error(format!("{}\n\n**Details:** {}", APOLOGY_TEXT, error))
}
