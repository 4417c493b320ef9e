// ==========================================
// Integration test helpers
// ==========================================
// Temp database setup plus a deterministic provider pool shared by
// the integration tests.
// ==========================================

use std::error::Error;

use mission_match::api::CreateMissionRequest;
use mission_match::app::AppState;
use mission_match::domain::provider::ProviderProfile;
use mission_match::domain::types::WorkMode;
use tempfile::NamedTempFile;

/// Create a temp database and wire the full stack on top of it.
///
/// Timers are no-op: tests drive wave expiry by hand through
/// `state.expiry`, so nothing fires in the background.
///
/// # Returns
/// - NamedTempFile: the database file (keep it alive for the test)
/// - AppState: the wired stack
pub fn setup_app() -> Result<(NamedTempFile, AppState), Box<dyn Error>> {
    let temp_file = NamedTempFile::new()?;
    let db_path = temp_file.path().to_str().unwrap().to_string();
    let state = AppState::with_noop_timer(&db_path)?;
    Ok((temp_file, state))
}

/// Seed `count` providers that all pass the hard filters for
/// `standard_request`. Ranking is deterministic: p-001 carries the best
/// track record and every later provider is slightly worse.
pub fn seed_provider_pool(state: &AppState, count: usize) -> Result<(), Box<dyn Error>> {
    for i in 0..count {
        let provider = ProviderProfile::new(
            &format!("p-{:03}", i + 1),
            &format!("Provider {:03}", i + 1),
        )
        .with_skills(vec!["rust".to_string(), "sql".to_string()])
        .with_languages(vec!["en".to_string()])
        .with_work_modes(vec![WorkMode::Remote])
        .with_rates(Some(450.0), Some(350.0))
        .with_timezone_offset(0)
        .with_track_record((0.95 - i as f64 * 0.05).max(0.0), 10 + i as i32);
        state.repos.provider_repo.upsert(&provider)?;
    }
    Ok(())
}

/// A mission request every provider from `seed_provider_pool` is
/// eligible for.
pub fn standard_request(title: &str) -> CreateMissionRequest {
    CreateMissionRequest {
        requester: "req-tests".to_string(),
        title: title.to_string(),
        description: "integration test mission".to_string(),
        deliverables: vec![],
        keywords: vec!["rust".to_string(), "sql".to_string()],
        deadline: None,
        duration_days: Some(10),
        budget_min: Some(3000.0),
        budget_max: Some(5000.0),
        currency: Some("EUR".to_string()),
        language: Some("en".to_string()),
        work_mode: Some("REMOTE".to_string()),
        location_hint: None,
        allow_expansion: false,
        collect_multiple_quotes: Some(true),
    }
}
