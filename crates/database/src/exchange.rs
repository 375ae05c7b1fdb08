//! AI chat exchange persistence.

use sqlx::SqlitePool;

use crate::models::Exchange;
use crate::Result;

/// Record a completed exchange for a user.
pub async fn insert_exchange(
    pool: &SqlitePool,
    user_id: &str,
    message: &str,
    response: &str,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO exchanges (user_id, message, response)
        VALUES (?, ?, ?)
        "#,
    )
    .bind(user_id)
    .bind(message)
    .bind(response)
    .execute(pool)
    .await?;

    Ok(())
}

/// List a user's exchanges in ascending creation order.
pub async fn list_exchanges(pool: &SqlitePool, user_id: &str) -> Result<Vec<Exchange>> {
    let exchanges = sqlx::query_as::<_, Exchange>(
        r#"
        SELECT id, user_id, message, response, created_at
        FROM exchanges
        WHERE user_id = ?
        ORDER BY id ASC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(exchanges)
}

/// Count a user's exchanges.
///
/// This is the cumulative question count consulted by referral gating.
pub async fn count_for_user(pool: &SqlitePool, user_id: &str) -> Result<i64> {
    let count: (i64,) = sqlx::query_as(
        r#"
        SELECT COUNT(*)
        FROM exchanges
        WHERE user_id = ?
        "#,
    )
    .bind(user_id)
    .fetch_one(pool)
    .await?;

    Ok(count.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_db;

    #[tokio::test]
    async fn test_insert_and_count() {
        let db = test_db().await;

        assert_eq!(count_for_user(db.pool(), "patient-1").await.unwrap(), 0);

        insert_exchange(db.pool(), "patient-1", "q1", "a1").await.unwrap();
        insert_exchange(db.pool(), "patient-1", "q2", "a2").await.unwrap();
        insert_exchange(db.pool(), "patient-2", "q", "a").await.unwrap();

        assert_eq!(count_for_user(db.pool(), "patient-1").await.unwrap(), 2);
        assert_eq!(count_for_user(db.pool(), "patient-2").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_list_in_creation_order() {
        let db = test_db().await;

        insert_exchange(db.pool(), "patient-1", "first", "r1").await.unwrap();
        insert_exchange(db.pool(), "patient-1", "second", "r2").await.unwrap();

        let exchanges = list_exchanges(db.pool(), "patient-1").await.unwrap();
        assert_eq!(exchanges.len(), 2);
        assert_eq!(exchanges[0].message, "first");
        assert_eq!(exchanges[1].message, "second");
    }
}
