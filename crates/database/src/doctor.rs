//! Doctor directory operations.

use sqlx::SqlitePool;

use crate::error::{DatabaseError, Result};
use crate::models::Doctor;

/// Create a doctor record.
pub async fn create_doctor(pool: &SqlitePool, doctor: &Doctor) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO doctors (id, name, profession, phone)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(&doctor.id)
    .bind(&doctor.name)
    .bind(&doctor.profession)
    .bind(&doctor.phone)
    .execute(pool)
    .await?;

    Ok(())
}

/// Get a doctor by ID.
pub async fn get_doctor(pool: &SqlitePool, id: &str) -> Result<Doctor> {
    sqlx::query_as::<_, Doctor>(
        r#"
        SELECT id, name, profession, phone
        FROM doctors
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DatabaseError::NotFound {
        entity: "Doctor",
        id: id.to_string(),
    })
}

/// List all doctors ordered by name.
pub async fn list_doctors(pool: &SqlitePool) -> Result<Vec<Doctor>> {
    let doctors = sqlx::query_as::<_, Doctor>(
        r#"
        SELECT id, name, profession, phone
        FROM doctors
        ORDER BY name
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(doctors)
}

/// Fetch the doctors with the given IDs, ordered by name.
pub async fn get_doctors_by_ids(pool: &SqlitePool, ids: &[String]) -> Result<Vec<Doctor>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    // sqlx has no array binding for SQLite; expand placeholders.
    let placeholders = vec!["?"; ids.len()].join(", ");
    let sql = format!(
        "SELECT id, name, profession, phone FROM doctors WHERE id IN ({placeholders}) ORDER BY name"
    );

    let mut query = sqlx::query_as::<_, Doctor>(&sql);
    for id in ids {
        query = query.bind(id);
    }

    Ok(query.fetch_all(pool).await?)
}

/// Search doctors whose profession contains the term, case-insensitively.
pub async fn search_by_profession(
    pool: &SqlitePool,
    term: &str,
    limit: usize,
) -> Result<Vec<Doctor>> {
    let pattern = format!("%{}%", term);

    let doctors = sqlx::query_as::<_, Doctor>(
        r#"
        SELECT id, name, profession, phone
        FROM doctors
        WHERE profession LIKE ? COLLATE NOCASE
        ORDER BY name
        LIMIT ?
        "#,
    )
    .bind(&pattern)
    .bind(limit as i64)
    .fetch_all(pool)
    .await?;

    Ok(doctors)
}
