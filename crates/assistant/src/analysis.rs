//! Classification result parsing.
//!
//! The classifier is instructed to reply with JSON only, but in practice
//! wraps the object in prose or markdown fences. The parser extracts the
//! span from the first `{` to its balanced closing `}` and deserializes
//! that. A reply with no such span, or one that does not parse, is a hard
//! error with no retry.

use serde::Deserialize;

use crate::error::AssistantError;

/// What the classifier decided about one user message.
///
/// Field names are camelCase on the wire because that is the shape the
/// classifier prompt asks for. Booleans the model omits default to false,
/// matching a conservative reading of the reply.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Analysis {
    /// The question needs external information.
    #[serde(default)]
    pub needs_search: bool,
    /// Search terms to use; the raw message is the fallback.
    #[serde(default)]
    pub search_query: Option<String>,
    /// The message is a therapy or mental-health question.
    #[serde(default)]
    pub is_therapy_related: bool,
    /// A book or video recommendation would help.
    #[serde(default)]
    pub recommend_book_or_video: bool,
    /// Topic to search recommendations for.
    #[serde(default)]
    pub recommendation_topic: Option<String>,
}

impl Analysis {
    /// Parse an analysis out of a free-text classifier reply.
    pub fn parse(reply: &str) -> Result<Self, AssistantError> {
        let json = extract_embedded_json(reply).ok_or_else(|| {
            AssistantError::Classification(format!("no JSON object in reply: {reply}"))
        })?;

        serde_json::from_str(json)
            .map_err(|e| AssistantError::Classification(format!("{e}, reply was: {json}")))
    }
}

/// Extract the first balanced JSON object from free text.
///
/// Scans from the first `{` to its matching `}`, tracking string literals
/// and escapes so braces inside strings are not miscounted. Returns `None`
/// when no balanced object exists.
pub(crate) fn extract_embedded_json(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let candidate = &text[start..];

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escape_next = false;

    for (i, ch) in candidate.char_indices() {
        if escape_next {
            escape_next = false;
            continue;
        }

        match ch {
            '\\' if in_string => escape_next = true,
            '"' => in_string = !in_string,
            '{' if !in_string => depth += 1,
            '}' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some(&candidate[..=i]);
                }
            }
            _ => {}
        }
    }

    None
}
