//! Conversational memory persistence.
//!
//! The memory table is an append-only log of per-user exchange summaries.
//! Summaries are capped at [`MAX_SUMMARY_CHARS`] before storage to bound
//! the context fed into future requests, and each user's log is pruned to
//! a configurable entry count after every append.

use sqlx::SqlitePool;

use crate::models::MemoryEntry;
use crate::Result;

/// Maximum characters stored per summary.
pub const MAX_SUMMARY_CHARS: usize = 500;

/// Append a summary for a user.
///
/// The summary is truncated to [`MAX_SUMMARY_CHARS`] characters.
pub async fn insert_entry(pool: &SqlitePool, user_id: &str, summary: &str) -> Result<()> {
    let summary = truncate_chars(summary, MAX_SUMMARY_CHARS);

    sqlx::query(
        r#"
        INSERT INTO memory_entries (user_id, summary)
        VALUES (?, ?)
        "#,
    )
    .bind(user_id)
    .bind(&summary)
    .execute(pool)
    .await?;

    Ok(())
}

/// List a user's memory entries in ascending creation order.
pub async fn list_entries(pool: &SqlitePool, user_id: &str) -> Result<Vec<MemoryEntry>> {
    let entries = sqlx::query_as::<_, MemoryEntry>(
        r#"
        SELECT id, user_id, summary, created_at
        FROM memory_entries
        WHERE user_id = ?
        ORDER BY id ASC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(entries)
}

/// List a user's summaries in ascending creation order.
pub async fn list_summaries(pool: &SqlitePool, user_id: &str) -> Result<Vec<String>> {
    let entries = list_entries(pool, user_id).await?;
    Ok(entries.into_iter().map(|entry| entry.summary).collect())
}

/// Count a user's memory entries.
pub async fn count_entries(pool: &SqlitePool, user_id: &str) -> Result<i64> {
    let count: (i64,) = sqlx::query_as(
        r#"
        SELECT COUNT(*)
        FROM memory_entries
        WHERE user_id = ?
        "#,
    )
    .bind(user_id)
    .fetch_one(pool)
    .await?;

    Ok(count.0)
}

/// Prune a user's entries to a maximum count, oldest first.
pub async fn prune_over_limit(pool: &SqlitePool, user_id: &str, max_rows: usize) -> Result<u64> {
    let result = sqlx::query(
        r#"
        DELETE FROM memory_entries
        WHERE user_id = ?
          AND id NOT IN (
            SELECT id
            FROM memory_entries
            WHERE user_id = ?
            ORDER BY id DESC
            LIMIT ?
        )
        "#,
    )
    .bind(user_id)
    .bind(user_id)
    .bind(max_rows as i64)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

/// Truncate a string to a maximum character count.
fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        text.chars().take(max_chars).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_db;

    #[tokio::test]
    async fn test_append_and_list_in_order() {
        let db = test_db().await;

        insert_entry(db.pool(), "patient-1", "first").await.unwrap();
        insert_entry(db.pool(), "patient-1", "second").await.unwrap();
        insert_entry(db.pool(), "patient-2", "other user").await.unwrap();

        let summaries = list_summaries(db.pool(), "patient-1").await.unwrap();
        assert_eq!(summaries, vec!["first".to_string(), "second".to_string()]);

        assert_eq!(count_entries(db.pool(), "patient-1").await.unwrap(), 2);
        assert_eq!(count_entries(db.pool(), "patient-2").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_summary_is_capped() {
        let db = test_db().await;

        let long = "x".repeat(2 * MAX_SUMMARY_CHARS);
        insert_entry(db.pool(), "patient-1", &long).await.unwrap();

        let summaries = list_summaries(db.pool(), "patient-1").await.unwrap();
        assert_eq!(summaries[0].chars().count(), MAX_SUMMARY_CHARS);
    }

    #[tokio::test]
    async fn test_prune_keeps_newest() {
        let db = test_db().await;

        for i in 0..5 {
            insert_entry(db.pool(), "patient-1", &format!("entry {i}"))
                .await
                .unwrap();
        }

        let removed = prune_over_limit(db.pool(), "patient-1", 2).await.unwrap();
        assert_eq!(removed, 3);

        let summaries = list_summaries(db.pool(), "patient-1").await.unwrap();
        assert_eq!(summaries, vec!["entry 3".to_string(), "entry 4".to_string()]);
    }

    #[tokio::test]
    async fn test_prune_is_per_user() {
        let db = test_db().await;

        insert_entry(db.pool(), "patient-1", "keep").await.unwrap();
        insert_entry(db.pool(), "patient-2", "a").await.unwrap();
        insert_entry(db.pool(), "patient-2", "b").await.unwrap();

        prune_over_limit(db.pool(), "patient-2", 1).await.unwrap();

        assert_eq!(count_entries(db.pool(), "patient-1").await.unwrap(), 1);
        assert_eq!(count_entries(db.pool(), "patient-2").await.unwrap(), 1);
    }
}
