//! The assistant pipeline.

use std::env;
use std::sync::Arc;

use completion::{ChatMessage, CompletionService};
use database::{exchange, Database};
use tracing::{debug, error, info, warn};
use websearch::{filter_recommendations, SearchService};

use crate::analysis::Analysis;
use crate::context::{build_messages, TurnContext};
use crate::error::AssistantError;
use crate::memory::MemoryStore;
use crate::prompts::{CLASSIFIER_SYSTEM_PROMPT, SUMMARY_INSTRUCTION, SYNTHESIS_SYSTEM_PROMPT};
use crate::referral::{should_refer, ReferralEngine};

/// Tunables for the pipeline.
#[derive(Debug, Clone)]
pub struct AssistantConfig {
    /// Cumulative question count (including the in-flight question) at
    /// which referral suggestions start.
    pub referral_threshold: i64,

    /// Organic results requested per search.
    pub search_result_limit: usize,

    /// Per-user memory retention cap.
    pub memory_max_entries: usize,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            referral_threshold: 3,
            search_result_limit: 3,
            memory_max_entries: 200,
        }
    }
}

impl AssistantConfig {
    /// Create configuration from environment variables, falling back to
    /// defaults for anything unset or unparseable.
    ///
    /// Optional environment variables:
    /// - `ASSISTANT_REFERRAL_THRESHOLD` (default: 3)
    /// - `ASSISTANT_SEARCH_RESULTS` (default: 3)
    /// - `ASSISTANT_MEMORY_MAX_ENTRIES` (default: 200)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            referral_threshold: env_parse("ASSISTANT_REFERRAL_THRESHOLD")
                .unwrap_or(defaults.referral_threshold),
            search_result_limit: env_parse("ASSISTANT_SEARCH_RESULTS")
                .unwrap_or(defaults.search_result_limit),
            memory_max_entries: env_parse("ASSISTANT_MEMORY_MAX_ENTRIES")
                .unwrap_or(defaults.memory_max_entries),
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok()?.parse().ok()
}

/// The assistant: one instance serves all users.
///
/// Generic over the completion and search backends so every stage can be
/// exercised with stubs.
pub struct Assistant<C, S> {
    completion: Arc<C>,
    search: Arc<S>,
    database: Database,
    memory: MemoryStore,
    referral: ReferralEngine,
    config: AssistantConfig,
}

impl<C, S> Assistant<C, S>
where
    C: CompletionService + 'static,
    S: SearchService + 'static,
{
    /// Create an assistant over the given backends and database.
    pub fn new(completion: C, search: S, database: Database, config: AssistantConfig) -> Self {
        let memory = MemoryStore::with_max_entries(database.clone(), config.memory_max_entries);
        let referral = ReferralEngine::new(database.clone());

        Self {
            completion: Arc::new(completion),
            search: Arc::new(search),
            database,
            memory,
            referral,
            config,
        }
    }

    /// Get the memory store.
    pub fn memory(&self) -> &MemoryStore {
        &self.memory
    }

    /// Process one user message end-to-end and return the answer.
    ///
    /// Every stage failure is logged with its cause and collapsed into a
    /// single generic error; callers never see stage internals.
    pub async fn handle_message(
        &self,
        user_id: &str,
        text: &str,
    ) -> Result<String, AssistantError> {
        match self.process(user_id, text).await {
            Ok(answer) => Ok(answer),
            Err(e) => {
                error!("Assistant turn failed for {}: {}", user_id, e);
                Err(AssistantError::ProcessingFailed)
            }
        }
    }

    async fn process(&self, user_id: &str, text: &str) -> Result<String, AssistantError> {
        info!("Processing message from {}", user_id);

        // Memory context is read once and reused by both completion calls.
        let summaries = self.memory.summaries(user_id).await?;
        debug!("Loaded {} memory summaries", summaries.len());

        let analysis = self.classify(&summaries, text).await?;
        debug!("Classification: {:?}", analysis);

        let mut context = TurnContext {
            analysis,
            ..Default::default()
        };

        self.enrich(text, &mut context).await;
        self.attach_referral(user_id, &mut context).await;

        let user_content = context.compose_user_content(text);
        let messages = build_messages(SYNTHESIS_SYSTEM_PROMPT, &summaries, &user_content);
        let answer = self.completion.complete(messages).await?.trim().to_string();

        exchange::insert_exchange(self.database.pool(), user_id, text, &answer).await?;
        self.memorize_detached(user_id, text, &answer);

        info!("Generated response: {} chars", answer.len());
        Ok(answer)
    }

    /// Classify the message. A reply without a parseable JSON object is a
    /// hard error; there is no retry and no fallback plan.
    async fn classify(
        &self,
        summaries: &[String],
        text: &str,
    ) -> Result<Analysis, AssistantError> {
        let messages = build_messages(CLASSIFIER_SYSTEM_PROMPT, summaries, text);
        let reply = self.completion.complete(messages).await?;
        Analysis::parse(&reply)
    }

    /// Run the enrichment searches the classifier asked for.
    ///
    /// A failed search degrades to an empty result set; it never aborts
    /// the turn.
    async fn enrich(&self, text: &str, context: &mut TurnContext) {
        if context.analysis.needs_search {
            let query = context
                .analysis
                .search_query
                .as_deref()
                .filter(|q| !q.trim().is_empty())
                .unwrap_or(text);

            match self
                .search
                .search(query, self.config.search_result_limit)
                .await
            {
                Ok(results) => {
                    debug!("Search '{}' returned {} results", query, results.len());
                    context.search_results = results;
                }
                Err(e) => warn!("Search failed for '{}': {}", query, e),
            }
        }

        let topic = context
            .analysis
            .recommendation_topic
            .as_deref()
            .filter(|t| !t.trim().is_empty());

        if context.analysis.recommend_book_or_video {
            if let Some(topic) = topic {
                let query = format!("Best books or videos on {topic}");

                match self
                    .search
                    .search(&query, self.config.search_result_limit)
                    .await
                {
                    Ok(results) => {
                        context.recommendations =
                            filter_recommendations(self.search.as_ref(), results).await;
                        debug!(
                            "Kept {} recommendations after filtering",
                            context.recommendations.len()
                        );
                    }
                    Err(e) => warn!("Recommendation search failed for '{}': {}", topic, e),
                }
            }
        }
    }

    /// Attach a doctor referral when the gate opens.
    ///
    /// The gate: the message is therapy-related and the user's cumulative
    /// question count (prior exchanges plus this one) has reached the
    /// threshold. Lookup failures are logged and swallowed.
    async fn attach_referral(&self, user_id: &str, context: &mut TurnContext) {
        if !context.analysis.is_therapy_related {
            return;
        }

        let question_count = match exchange::count_for_user(self.database.pool(), user_id).await {
            Ok(prior) => prior + 1,
            Err(e) => {
                warn!("Question count lookup failed for {}: {}", user_id, e);
                return;
            }
        };

        if !should_refer(question_count, self.config.referral_threshold, true) {
            return;
        }

        let topic = context.analysis.recommendation_topic.as_deref();
        match self.referral.suggest(user_id, topic).await {
            Ok(suggestion) => context.referral_suggestion = suggestion,
            Err(e) => warn!("Referral lookup failed for {}: {}", user_id, e),
        }
    }

    /// Condense the exchange into long-term memory, off the critical path.
    fn memorize_detached(&self, user_id: &str, question: &str, answer: &str) {
        let completion = Arc::clone(&self.completion);
        let memory = self.memory.clone();
        let user_id = user_id.to_string();
        let transcript = format!("User: {question}\nAssistant: {answer}");

        tokio::spawn(async move {
            let messages = vec![
                ChatMessage::system(SUMMARY_INSTRUCTION),
                ChatMessage::user(transcript),
            ];

            match completion.complete(messages).await {
                Ok(summary) => {
                    if let Err(e) = memory.append(&user_id, summary.trim()).await {
                        warn!("Memory write failed for {}: {}", user_id, e);
                    }
                }
                Err(e) => warn!("Summarization failed for {}: {}", user_id, e),
            }
        });
    }
}
