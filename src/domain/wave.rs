// ==========================================
// Mission Match Engine - Wave Domain Model
// ==========================================
// A wave is one timed batch of invitations. Wave numbers are 1-based
// and strictly increasing per mission; at most one wave is open at a
// time.
// ==========================================

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::types::WaveCloseReason;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Wave {
    pub mission_id: String,
    pub wave_number: i32,          // 1-based, allocated as MAX+1 in the dispatch tx
    pub wave_size: i32,            // requested invitation count
    pub timeout_minutes: i32,
    pub opened_at: NaiveDateTime,
    pub expires_at: NaiveDateTime, // opened_at + timeout_minutes, persisted for re-checks
    pub closed_at: Option<NaiveDateTime>,
    pub close_reason: Option<WaveCloseReason>,
}

impl Wave {
    /// Open a new wave; `expires_at` is derived from the timeout.
    pub fn open(mission_id: &str, wave_number: i32, wave_size: i32, timeout_minutes: i32) -> Self {
        let now = chrono::Utc::now().naive_utc();
        Self {
            mission_id: mission_id.to_string(),
            wave_number,
            wave_size,
            timeout_minutes,
            opened_at: now,
            expires_at: now + Duration::minutes(timeout_minutes as i64),
            closed_at: None,
            close_reason: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.closed_at.is_none()
    }

    /// True once the deadline passed, whether or not the timer has fired.
    pub fn is_past_deadline(&self, now: NaiveDateTime) -> bool {
        now >= self.expires_at
    }

    /// Window check used by `respond`: the wave must still be open and
    /// the deadline not yet reached.
    pub fn accepts_responses(&self, now: NaiveDateTime) -> bool {
        self.is_open() && !self.is_past_deadline(now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_wave_window() {
        let wave = Wave::open("m-1", 1, 5, 30);
        assert!(wave.is_open());
        assert_eq!(wave.expires_at - wave.opened_at, Duration::minutes(30));
        assert!(wave.accepts_responses(wave.opened_at + Duration::minutes(29)));
        assert!(!wave.accepts_responses(wave.expires_at));
    }

    #[test]
    fn test_closed_wave_rejects_responses() {
        let mut wave = Wave::open("m-1", 1, 5, 30);
        wave.closed_at = Some(wave.opened_at + Duration::minutes(1));
        wave.close_reason = Some(WaveCloseReason::Confirmed);
        assert!(!wave.accepts_responses(wave.opened_at + Duration::minutes(2)));
    }
}
