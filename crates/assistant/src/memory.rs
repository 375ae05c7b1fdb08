//! Durable conversational memory for the pipeline.
//!
//! Reads are on the turn's critical path; writes are best-effort and run
//! as detached tasks so a slow or failing store never blocks the
//! user-visible answer.

use database::{memory, Database};
use tracing::{debug, warn};

/// Default per-user entry cap.
const DEFAULT_MAX_ENTRIES: usize = 200;

/// Durable memory store backed by SQLite.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    database: Database,
    max_entries: usize,
}

impl MemoryStore {
    /// Create a store with the default retention cap.
    pub fn new(database: Database) -> Self {
        Self::with_max_entries(database, DEFAULT_MAX_ENTRIES)
    }

    /// Create a store keeping at most `max_entries` summaries per user.
    pub fn with_max_entries(database: Database, max_entries: usize) -> Self {
        Self {
            database,
            max_entries,
        }
    }

    /// Fetch a user's summaries in ascending creation order.
    pub async fn summaries(&self, user_id: &str) -> database::Result<Vec<String>> {
        memory::list_summaries(self.database.pool(), user_id).await
    }

    /// Append a summary in a detached task.
    ///
    /// Failures are logged and never reach the caller. Retention is
    /// enforced after the append, oldest entries first.
    pub fn append_detached(&self, user_id: impl Into<String>, summary: impl Into<String>) {
        let database = self.database.clone();
        let max_entries = self.max_entries;
        let user_id = user_id.into();
        let summary = summary.into();

        tokio::spawn(async move {
            if let Err(e) = memory::insert_entry(database.pool(), &user_id, &summary).await {
                warn!("Memory append failed for {}: {}", user_id, e);
                return;
            }

            match memory::prune_over_limit(database.pool(), &user_id, max_entries).await {
                Ok(0) => {}
                Ok(removed) => debug!("Pruned {} memory entries for {}", removed, user_id),
                Err(e) => warn!("Memory prune failed for {}: {}", user_id, e),
            }
        });
    }

    /// Append a summary synchronously. Used where the caller needs to
    /// observe completion, e.g. tests.
    pub async fn append(&self, user_id: &str, summary: &str) -> database::Result<()> {
        memory::insert_entry(self.database.pool(), user_id, summary).await?;
        memory::prune_over_limit(self.database.pool(), user_id, self.max_entries).await?;
        Ok(())
    }
}
