//! Doctor-patient connection operations.
//!
//! Connections move `pending` -> `connected` and never backward; there is
//! no disconnect operation.

use sqlx::SqlitePool;

use crate::error::{DatabaseError, Result};
use crate::models::{DoctorConnection, STATUS_CONNECTED, STATUS_PENDING};

/// Create a pending connection request from a patient to a doctor.
pub async fn create_pending(pool: &SqlitePool, patient_id: &str, doctor_id: &str) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO doctor_connections (patient_id, doctor_id, status)
        VALUES (?, ?, ?)
        "#,
    )
    .bind(patient_id)
    .bind(doctor_id)
    .bind(STATUS_PENDING)
    .execute(pool)
    .await?;

    Ok(())
}

/// Accept a pending connection (doctor action).
///
/// Fails with [`DatabaseError::NotFound`] if no pending connection exists
/// for the pair; an already-connected pair is left unchanged.
pub async fn accept(pool: &SqlitePool, patient_id: &str, doctor_id: &str) -> Result<()> {
    let result = sqlx::query(
        r#"
        UPDATE doctor_connections
        SET status = ?
        WHERE patient_id = ? AND doctor_id = ? AND status = ?
        "#,
    )
    .bind(STATUS_CONNECTED)
    .bind(patient_id)
    .bind(doctor_id)
    .bind(STATUS_PENDING)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        // Distinguish "already connected" (no-op) from "no such request".
        if is_connected(pool, patient_id, doctor_id).await? {
            return Ok(());
        }
        return Err(DatabaseError::NotFound {
            entity: "DoctorConnection",
            id: format!("{patient_id}/{doctor_id}"),
        });
    }

    Ok(())
}

/// Get a patient's connections, in creation order.
pub async fn list_for_patient(pool: &SqlitePool, patient_id: &str) -> Result<Vec<DoctorConnection>> {
    let connections = sqlx::query_as::<_, DoctorConnection>(
        r#"
        SELECT id, patient_id, doctor_id, status, created_at
        FROM doctor_connections
        WHERE patient_id = ?
        ORDER BY id ASC
        "#,
    )
    .bind(patient_id)
    .fetch_all(pool)
    .await?;

    Ok(connections)
}

/// Get the IDs of doctors connected to a patient, in creation order.
pub async fn connected_doctor_ids(pool: &SqlitePool, patient_id: &str) -> Result<Vec<String>> {
    let rows: Vec<(String,)> = sqlx::query_as(
        r#"
        SELECT doctor_id
        FROM doctor_connections
        WHERE patient_id = ? AND status = ?
        ORDER BY id ASC
        "#,
    )
    .bind(patient_id)
    .bind(STATUS_CONNECTED)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(|(id,)| id).collect())
}

/// Check whether a specific doctor is connected to a patient.
pub async fn is_connected(pool: &SqlitePool, patient_id: &str, doctor_id: &str) -> Result<bool> {
    let count: (i64,) = sqlx::query_as(
        r#"
        SELECT COUNT(*)
        FROM doctor_connections
        WHERE patient_id = ? AND doctor_id = ? AND status = ?
        "#,
    )
    .bind(patient_id)
    .bind(doctor_id)
    .bind(STATUS_CONNECTED)
    .fetch_one(pool)
    .await?;

    Ok(count.0 > 0)
}
