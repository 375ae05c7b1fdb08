//! Per-turn context threaded through the pipeline stages.

use completion::ChatMessage;
use websearch::SearchResult;

use crate::analysis::Analysis;

/// Everything gathered for one user turn before synthesis.
#[derive(Debug, Clone, Default)]
pub struct TurnContext {
    /// Classifier output for the message.
    pub analysis: Analysis,
    /// Fact-finding search results, if any.
    pub search_results: Vec<SearchResult>,
    /// Filtered book/video recommendations, if any.
    pub recommendations: Vec<SearchResult>,
    /// Doctor referral suggestion, if the gate opened.
    pub referral_suggestion: Option<String>,
}

impl TurnContext {
    /// Compose the user-role content for the synthesis call.
    ///
    /// The question comes first; search results, recommendations, and the
    /// referral suggestion follow as labeled sections, each omitted when
    /// empty.
    pub fn compose_user_content(&self, prompt: &str) -> String {
        let mut content = format!("User question: {prompt}");

        if !self.search_results.is_empty() {
            content.push_str("\n\nRelevant search results:\n");
            content.push_str(&format_results(&self.search_results));
        }

        if !self.recommendations.is_empty() {
            content.push_str("\n\nRecommended books or videos:\n");
            content.push_str(&format_results(&self.recommendations));
        }

        if let Some(ref suggestion) = self.referral_suggestion {
            content.push_str("\n\nSpecialist suggestion to relay to the user:\n");
            content.push_str(suggestion);
        }

        content
    }
}

/// Build the message sequence for a completion call: the stage's system
/// prompt, every stored memory summary in chronological order, then the
/// user content.
pub(crate) fn build_messages(
    system_prompt: &str,
    memory_summaries: &[String],
    user_content: &str,
) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(memory_summaries.len() + 2);
    messages.push(ChatMessage::system(system_prompt));

    for summary in memory_summaries {
        messages.push(ChatMessage::system(format!(
            "Conversation memory: {summary}"
        )));
    }

    messages.push(ChatMessage::user(user_content));
    messages
}

fn format_results(results: &[SearchResult]) -> String {
    results
        .iter()
        .map(|result| {
            format!(
                "- {}\n  {}\n  Link: {}",
                result.title, result.snippet, result.link
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}
