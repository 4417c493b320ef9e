// ==========================================
// Mission Match Engine - Offer Domain Model
// ==========================================
// One offer per (mission, provider, wave). At most one offer per
// mission ever reaches `confirmed`.
// ==========================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::types::OfferStatus;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Offer {
    // ===== Identity =====
    pub offer_id: String,          // UUID
    pub mission_id: String,
    pub wave_number: i32,
    pub provider_id: String,

    // ===== Match quality =====
    pub match_score: f64,          // [0,1], computed at invitation time
    pub score_reasons: Vec<String>, // one line per sub-score, stored as JSON

    // ===== Response =====
    pub message: Option<String>,   // provider free text, set on respond
    pub status: OfferStatus,
    pub created_at: NaiveDateTime,
    pub responded_at: Option<NaiveDateTime>,
}

impl Offer {
    /// New pending offer created by a wave dispatch.
    pub fn invite(
        mission_id: &str,
        wave_number: i32,
        provider_id: &str,
        match_score: f64,
        score_reasons: Vec<String>,
    ) -> Self {
        Self {
            offer_id: uuid::Uuid::new_v4().to_string(),
            mission_id: mission_id.to_string(),
            wave_number,
            provider_id: provider_id.to_string(),
            match_score,
            score_reasons,
            message: None,
            status: OfferStatus::Pending,
            created_at: chrono::Utc::now().naive_utc(),
            responded_at: None,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == OfferStatus::Pending
    }

    pub fn is_confirmed(&self) -> bool {
        self.status == OfferStatus::Confirmed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invite_starts_pending() {
        let offer = Offer::invite("m-1", 1, "p-1", 0.82, vec!["skill overlap 0.75".into()]);
        assert!(offer.is_pending());
        assert!(offer.responded_at.is_none());
        assert!(offer.message.is_none());
    }
}
