// ==========================================
// Mission Match Engine - Wave Timeout Timers
// ==========================================
// One timer per open wave. The dispatcher schedules it when the wave
// opens; confirm and cancel tear it down. Firing runs the expiry
// service, which no-ops when the wave already closed, so a timer that
// loses the cancellation race stays harmless.
// ==========================================

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::engine::expiry::WaveExpiryService;

/// Timer seam for the dispatcher and confirmation guard. The concrete
/// runtime implementation is tokio-backed; tests that drive expiry by
/// hand plug in the no-op.
pub trait WaveTimer: Send + Sync {
    /// Arm the timeout for one wave.
    fn schedule(&self, mission_id: &str, wave_number: i32, fire_in: Duration);

    /// Disarm the timeout, if still armed.
    fn cancel(&self, mission_id: &str, wave_number: i32);
}

// ==========================================
// NoOpWaveTimer
// ==========================================

/// Timer that never fires. Deployments driving expiry via an external
/// sweep, and unit tests, use this.
#[derive(Debug, Clone, Default)]
pub struct NoOpWaveTimer;

impl WaveTimer for NoOpWaveTimer {
    fn schedule(&self, mission_id: &str, wave_number: i32, fire_in: Duration) {
        tracing::debug!(
            "NoOpWaveTimer: skipping timer: mission_id={}, wave_number={}, fire_in={}s",
            mission_id,
            wave_number,
            fire_in.as_secs()
        );
    }

    fn cancel(&self, _mission_id: &str, _wave_number: i32) {}
}

// ==========================================
// TokioWaveTimer
// ==========================================

/// Tokio-backed timer. Each scheduled wave holds one spawned task that
/// sleeps until the deadline, then runs the expiry service on the
/// blocking pool (SQLite work must stay off the async threads).
pub struct TokioWaveTimer {
    expiry: Arc<WaveExpiryService>,
    handles: Mutex<HashMap<(String, i32), JoinHandle<()>>>,
}

impl TokioWaveTimer {
    pub fn new(expiry: Arc<WaveExpiryService>) -> Self {
        Self {
            expiry,
            handles: Mutex::new(HashMap::new()),
        }
    }

    fn handles(&self) -> std::sync::MutexGuard<HashMap<(String, i32), JoinHandle<()>>> {
        match self.handles.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl WaveTimer for TokioWaveTimer {
    fn schedule(&self, mission_id: &str, wave_number: i32, fire_in: Duration) {
        let expiry = self.expiry.clone();
        let mission = mission_id.to_string();

        let task = tokio::spawn(async move {
            tokio::time::sleep(fire_in).await;

            let mission_for_expiry = mission.clone();
            let result = tokio::task::spawn_blocking(move || {
                expiry.expire_wave(&mission_for_expiry, wave_number)
            })
            .await;

            match result {
                Ok(Ok(Some(_))) => {}
                Ok(Ok(None)) => {
                    // wave was closed before the timer fired
                }
                Ok(Err(e)) => {
                    tracing::error!(
                        "wave timer expiry failed: mission_id={}, wave_number={}, error={}",
                        mission,
                        wave_number,
                        e
                    );
                }
                Err(e) => {
                    tracing::error!(
                        "wave timer task join failed: mission_id={}, wave_number={}, error={}",
                        mission,
                        wave_number,
                        e
                    );
                }
            }
        });

        let key = (mission_id.to_string(), wave_number);
        if let Some(stale) = self.handles().insert(key, task) {
            // one timer per wave; a stale handle for the same key is dead weight
            stale.abort();
        }

        tracing::debug!(
            "wave timer armed: mission_id={}, wave_number={}, fire_in={}s",
            mission_id,
            wave_number,
            fire_in.as_secs()
        );
    }

    fn cancel(&self, mission_id: &str, wave_number: i32) {
        let key = (mission_id.to_string(), wave_number);
        if let Some(handle) = self.handles().remove(&key) {
            handle.abort();
            tracing::debug!(
                "wave timer disarmed: mission_id={}, wave_number={}",
                mission_id,
                wave_number
            );
        }
    }
}
