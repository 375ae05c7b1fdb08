//! AI assistant pipeline.
//!
//! One user turn flows through five strictly sequential stages:
//!
//! 1. **Classify** - a completion call that labels the message (search
//!    needed? therapy-related? recommend a book or video?), returning
//!    JSON embedded in free text.
//! 2. **Enrich** - optional web searches for facts and recommendations,
//!    with marketplace links and dead video links filtered out.
//! 3. **Referral** - once a user has asked enough questions, a connected
//!    or candidate doctor is suggested for therapy-related messages.
//! 4. **Synthesize** - a second completion call produces the final answer
//!    from the message plus everything gathered above.
//! 5. **Record & memorize** - the exchange is persisted, and a detached
//!    task condenses it into the user's long-term memory.
//!
//! The pipeline is generic over [`completion::CompletionService`] and
//! [`websearch::SearchService`], so every stage can be driven by stubs.

mod analysis;
mod context;
mod error;
mod memory;
mod pipeline;
mod prompts;
mod referral;

pub use analysis::Analysis;
pub use context::TurnContext;
pub use error::AssistantError;
pub use memory::MemoryStore;
pub use pipeline::{Assistant, AssistantConfig};
pub use prompts::{CLASSIFIER_SYSTEM_PROMPT, SUMMARY_INSTRUCTION, SYNTHESIS_SYSTEM_PROMPT};
pub use referral::ReferralEngine;
