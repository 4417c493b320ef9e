// ==========================================
// Mission Match Engine - Demo Entry Point
// ==========================================
// Runs one end-to-end scenario against a local database: seed a small
// provider pool, create a mission, dispatch an offer wave, collect
// responses, confirm a winner and drain the notification outbox. A
// second mission walks the timeout path. Useful as a smoke run and as
// living documentation of the API surface.
// ==========================================

use std::path::Path;

use mission_match::api::CreateMissionRequest;
use mission_match::app::AppState;
use mission_match::domain::types::WorkMode;
use mission_match::domain::ProviderProfile;
use mission_match::{db, logging};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init();

    tracing::info!("==================================================");
    tracing::info!("{} v{}", mission_match::APP_NAME, mission_match::VERSION);
    tracing::info!("==================================================");

    let db_path = resolve_db_path();
    if let Some(parent) = Path::new(&db_path).parent() {
        // best-effort; AppState::new reports the real error if this failed
        std::fs::create_dir_all(parent).ok();
    }
    tracing::info!("using database: {}", db_path);

    let state = AppState::new(&db_path)?;
    seed_providers_if_empty(&state)?;

    run_match_scenario(&state).await?;
    run_timeout_scenario(&state)?;

    let stats = state.mission_api.outbox_stats()?;
    tracing::info!(
        "outbox after demo: pending={}, sent={}, failed={}",
        stats.pending,
        stats.sent,
        stats.failed
    );

    Ok(())
}

/// CLI argument first, then MISSION_MATCH_DB_PATH, then the per-user
/// default location.
fn resolve_db_path() -> String {
    if let Some(path) = std::env::args().nth(1) {
        return path;
    }
    if let Ok(path) = std::env::var("MISSION_MATCH_DB_PATH") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }
    db::default_db_path()
}

fn seed_providers_if_empty(state: &AppState) -> anyhow::Result<()> {
    if state.repos.provider_repo.count()? > 0 {
        return Ok(());
    }

    tracing::info!("provider directory is empty, seeding demo providers");

    let providers = vec![
        ProviderProfile::new("p-aurora", "Aurora Data Studio")
            .with_skills(vec!["rust".into(), "sql".into(), "dashboards".into()])
            .with_languages(vec!["en".into(), "de".into()])
            .with_work_modes(vec![WorkMode::Remote, WorkMode::Hybrid])
            .with_rates(Some(450.0), Some(350.0))
            .with_timezone_offset(1)
            .with_track_record(0.93, 24),
        ProviderProfile::new("p-borealis", "Borealis Consulting")
            .with_skills(vec!["python".into(), "sql".into()])
            .with_languages(vec!["en".into()])
            .with_rates(Some(500.0), Some(400.0))
            .with_timezone_offset(-5)
            .with_track_record(0.88, 31),
        ProviderProfile::new("p-cinder", "Cinder Works")
            .with_skills(vec!["rust".into(), "embedded".into()])
            .with_languages(vec!["en".into(), "fr".into()])
            .with_timezone_offset(0)
            .with_track_record(0.75, 9),
        ProviderProfile::new("p-drift", "Drift Collective")
            .with_skills(vec!["dashboards".into(), "design".into()])
            .with_languages(vec!["en".into(), "es".into()])
            .with_rates(Some(380.0), None)
            .with_timezone_offset(2)
            .with_track_record(0.81, 14),
        ProviderProfile::new("p-ember", "Ember Solo")
            .with_skills(vec!["rust".into(), "sql".into()])
            .with_languages(vec!["en".into()])
            .with_timezone_offset(1),
        ProviderProfile::new("p-frost", "Frost Digital")
            .with_skills(vec!["rust".into(), "dashboards".into()])
            .with_languages(vec!["en".into()])
            .with_track_record(0.9, 40)
            .with_available(false),
    ];

    for provider in &providers {
        state.repos.provider_repo.upsert(provider)?;
    }
    tracing::info!("seeded {} providers", providers.len());

    Ok(())
}

/// Happy path: dispatch, one decline, one accept, confirm, deliver.
async fn run_match_scenario(state: &AppState) -> anyhow::Result<()> {
    let api = &state.mission_api;

    let mission = api.create_mission(CreateMissionRequest {
        requester: "requester-demo".into(),
        title: "Build a reporting dashboard".into(),
        description: "Web dashboard over an existing SQL warehouse.".into(),
        deliverables: vec!["dashboard".into(), "handover notes".into()],
        keywords: vec!["rust".into(), "sql".into(), "dashboards".into()],
        deadline: None,
        duration_days: Some(20),
        budget_min: Some(3000.0),
        budget_max: Some(5000.0),
        currency: None,
        language: Some("en".into()),
        work_mode: Some("REMOTE".into()),
        location_hint: None,
        allow_expansion: false,
        collect_multiple_quotes: Some(true),
    })?;
    tracing::info!("created mission {}: {}", mission.mission_id, mission.title);

    let mut feed = api.subscribe(&mission.mission_id);

    let outcome = api.dispatch(&mission.mission_id, None, None, "requester-demo")?;
    tracing::info!(
        "wave {} dispatched, invited {} providers (pool_exhausted={})",
        outcome.wave_number,
        outcome.invited,
        outcome.pool_exhausted
    );

    let detail = api.get_mission_detail(&mission.mission_id)?;
    let offers = &detail.offers;
    anyhow::ensure!(!offers.is_empty(), "dispatch produced no offers");

    if offers.len() > 1 {
        let declined = api.respond(
            &offers[offers.len() - 1].offer_id,
            "DECLINE",
            Some("Fully booked this quarter."),
        )?;
        tracing::info!("provider {} declined", declined.provider_id);
    }

    let accepted = api.respond(
        &offers[0].offer_id,
        "ACCEPT",
        Some("Can start next Monday."),
    )?;
    tracing::info!(
        "provider {} accepted offer {}",
        accepted.provider_id,
        accepted.offer_id
    );

    let confirmed = api.confirm(&mission.mission_id, &accepted.offer_id, "requester-demo")?;
    tracing::info!(
        "mission {} confirmed with {}",
        confirmed.mission_id,
        accepted.provider_id
    );

    api.upsert_milestone(
        &mission.mission_id,
        None,
        "First data model review",
        None,
        None,
    )?;

    let report = state.notification_worker.process_pending(50).await?;
    tracing::info!(
        "outbox drained: attempted={}, sent={}, failed={}",
        report.attempted,
        report.sent,
        report.failed
    );

    while let Ok(event) = feed.try_recv() {
        tracing::info!(
            "journal feed: seq={}, event={}",
            event.seq,
            event.event_type.to_db_str()
        );
    }

    println!("{}", api.export_mission_json(&mission.mission_id)?);
    Ok(())
}

/// Timeout path: dispatch, nobody answers, the wave is expired by the
/// sweep entry point, a follow-up wave goes out.
fn run_timeout_scenario(state: &AppState) -> anyhow::Result<()> {
    let api = &state.mission_api;

    let mission = api.create_mission(CreateMissionRequest {
        requester: "requester-demo".into(),
        title: "Migrate ETL jobs to Rust".into(),
        description: "Port a handful of nightly Python ETL jobs.".into(),
        deliverables: vec![],
        keywords: vec!["rust".into(), "sql".into()],
        deadline: None,
        duration_days: Some(10),
        budget_min: None,
        budget_max: Some(4000.0),
        currency: None,
        language: Some("en".into()),
        work_mode: Some("REMOTE".into()),
        location_hint: None,
        allow_expansion: true,
        collect_multiple_quotes: Some(true),
    })?;

    let first = api.dispatch(&mission.mission_id, Some(2), Some(1), "requester-demo")?;
    tracing::info!(
        "timeout demo: wave {} open with {} invites",
        first.wave_number,
        first.invited
    );

    // Force the timeout instead of waiting a minute of wall clock.
    let expired = state
        .expiry
        .expire_wave(&mission.mission_id, first.wave_number)?;
    anyhow::ensure!(expired.is_some(), "wave should have been open");

    let second = api.dispatch(&mission.mission_id, Some(2), Some(1), "requester-demo")?;
    tracing::info!(
        "timeout demo: follow-up wave {} open with {} invites (pool_exhausted={})",
        second.wave_number,
        second.invited,
        second.pool_exhausted
    );

    for event in api.journal(&mission.mission_id)? {
        tracing::info!(
            "timeout demo journal: seq={}, event={}",
            event.seq,
            event.event_type.to_db_str()
        );
    }

    api.cancel_mission(&mission.mission_id, "requester-demo")?;
    Ok(())
}
