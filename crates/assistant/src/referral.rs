//! Doctor referral engine.
//!
//! A pure read-and-format operation: given a patient, either list the
//! doctors they are already connected with, or propose one candidate whose
//! profession matches the conversation's topic.

use database::{connection, doctor, Database};

/// Profession search term used when the classifier produced no topic.
pub const FALLBACK_TOPIC: &str = "therapy";

/// Referral suggestion builder.
#[derive(Debug, Clone)]
pub struct ReferralEngine {
    database: Database,
}

impl ReferralEngine {
    /// Create an engine over the given database.
    pub fn new(database: Database) -> Self {
        Self { database }
    }

    /// Build a suggestion for a patient.
    ///
    /// Connected doctors win: all of them are listed. Otherwise the first
    /// doctor whose profession matches the topic (case-insensitive
    /// substring, falling back to "therapy") is proposed. Returns `None`
    /// when neither branch yields a doctor.
    pub async fn suggest(
        &self,
        patient_id: &str,
        topic: Option<&str>,
    ) -> database::Result<Option<String>> {
        let pool = self.database.pool();

        let connected_ids = connection::connected_doctor_ids(pool, patient_id).await?;

        if !connected_ids.is_empty() {
            let doctors = doctor::get_doctors_by_ids(pool, &connected_ids).await?;
            if !doctors.is_empty() {
                let listing = doctors
                    .iter()
                    .map(|d| format!("Dr. {} ({})", d.name, d.profession))
                    .collect::<Vec<_>>()
                    .join(", ");

                return Ok(Some(format!(
                    "The user is already connected with {listing}. Encourage them to reach out \
                     directly for professional support."
                )));
            }
        }

        let term = topic.filter(|t| !t.trim().is_empty()).unwrap_or(FALLBACK_TOPIC);
        let candidates = doctor::search_by_profession(pool, term, 1).await?;

        Ok(candidates.first().map(|d| {
            format!(
                "The user is not connected with a specialist yet. Suggest connecting with \
                 Dr. {} ({}) through the platform.",
                d.name, d.profession
            )
        }))
    }
}

/// Whether the referral stage should run for this turn.
///
/// `question_count` is cumulative and includes the in-flight question.
pub(crate) fn should_refer(question_count: i64, threshold: i64, is_therapy_related: bool) -> bool {
    is_therapy_related && question_count >= threshold
}
