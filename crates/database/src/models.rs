//! Database models.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Connection status: created by patient action.
pub const STATUS_PENDING: &str = "pending";

/// Connection status: accepted by the doctor. There is no backward
/// transition and no disconnect operation.
pub const STATUS_CONNECTED: &str = "connected";

/// One summarized AI exchange, kept as long-term context for a user.
///
/// Entries are append-only; they are never updated in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct MemoryEntry {
    /// Auto-incrementing ID.
    pub id: i64,
    /// Owning user.
    pub user_id: String,
    /// Condensed record of one exchange.
    pub summary: String,
    /// Creation timestamp.
    pub created_at: String,
}

/// A persisted AI chat turn (user question plus assistant answer).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Exchange {
    /// Auto-incrementing ID.
    pub id: i64,
    /// Owning user.
    pub user_id: String,
    /// The user's question.
    pub message: String,
    /// The assistant's answer.
    pub response: String,
    /// Creation timestamp.
    pub created_at: String,
}

/// A doctor available for connections and referrals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Doctor {
    /// Account UUID.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Specialty, e.g. "Cognitive Behavioral Therapy".
    pub profession: String,
    /// Contact phone number, if published.
    pub phone: Option<String>,
}

/// The authorization relationship between a patient and a doctor.
///
/// Gates chat and call eligibility. Created as `pending` by the patient,
/// moved to `connected` by the doctor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct DoctorConnection {
    /// Auto-incrementing ID.
    pub id: i64,
    /// Patient account UUID.
    pub patient_id: String,
    /// Doctor account UUID.
    pub doctor_id: String,
    /// "pending" or "connected".
    pub status: String,
    /// Creation timestamp.
    pub created_at: String,
}

impl DoctorConnection {
    /// Whether the doctor has accepted this connection.
    pub fn is_connected(&self) -> bool {
        self.status == STATUS_CONNECTED
    }
}
