// ==========================================
// Mission Match Engine - Demo Database Seeder
// ==========================================
// Resets the target database (after a timestamped backup) and seeds a
// provider pool plus three missions in different lifecycle stages:
// one confirmed, one with an open wave, one still draft. Gives demos
// and manual testing a deterministic starting point.
//
// Usage: seed_demo_db [db_path] [provider_count]
// ==========================================

use std::error::Error;
use std::fs;
use std::path::Path;

use chrono::Local;

use mission_match::api::CreateMissionRequest;
use mission_match::app::AppState;
use mission_match::config::config_keys;
use mission_match::db;
use mission_match::domain::types::{MissionStatus, WorkMode};
use mission_match::domain::ProviderProfile;

const DEFAULT_PROVIDER_COUNT: usize = 12;

fn main() -> Result<(), Box<dyn Error>> {
    mission_match::logging::init();

    let db_path = std::env::args().nth(1).unwrap_or_else(db::default_db_path);

    let provider_count = std::env::args()
        .nth(2)
        .and_then(|s| s.parse::<usize>().ok())
        .unwrap_or(DEFAULT_PROVIDER_COUNT)
        .max(6);

    backup_and_reset_db(&db_path)?;
    if let Some(parent) = Path::new(&db_path).parent() {
        fs::create_dir_all(parent)?;
    }

    // No background timers: the seeded open wave stays open until a
    // real runtime picks the database up.
    let state = AppState::with_noop_timer(&db_path)?;

    seed_config(&state)?;
    seed_providers(&state, provider_count)?;
    seed_missions(&state)?;

    print_quick_counts(&state)?;
    Ok(())
}

fn backup_and_reset_db(db_path: &str) -> Result<(), Box<dyn Error>> {
    let path = Path::new(db_path);
    if !path.exists() {
        return Ok(());
    }

    let ts = Local::now().format("%Y%m%d_%H%M%S").to_string();
    let backup_path = format!("{}.bak.{}", db_path, ts);
    fs::copy(path, &backup_path)?;
    fs::remove_file(path)?;

    eprintln!("Backed up {} -> {}", db_path, backup_path);
    Ok(())
}

/// Write the tunables explicitly so the config snapshot shows them.
fn seed_config(state: &AppState) -> Result<(), Box<dyn Error>> {
    let config = &state.config;
    config.set_config_value(config_keys::DEFAULT_WAVE_SIZE, "3")?;
    config.set_config_value(config_keys::DEFAULT_TIMEOUT_MINUTES, "60")?;
    config.set_config_value(config_keys::NOTIFY_MAX_RETRIES, "3")?;
    config.set_config_value(config_keys::SCORING_WEIGHT_SKILL, "0.4")?;
    config.set_config_value(config_keys::SCORING_WEIGHT_BUDGET, "0.25")?;
    config.set_config_value(config_keys::SCORING_WEIGHT_AVAILABILITY, "0.2")?;
    config.set_config_value(config_keys::SCORING_WEIGHT_RELIABILITY, "0.15")?;
    Ok(())
}

fn seed_providers(state: &AppState, count: usize) -> Result<(), Box<dyn Error>> {
    const NAME_STEMS: &[&str] = &[
        "Aurora", "Borealis", "Cinder", "Drift", "Ember", "Frost", "Gale", "Harbor", "Iris",
        "Juniper", "Krait", "Lumen",
    ];
    const SKILL_SETS: &[&[&str]] = &[
        &["rust", "sql"],
        &["rust", "dashboards"],
        &["python", "etl"],
        &["design", "dashboards"],
        &["rust", "embedded"],
        &["sql", "reporting"],
    ];
    const LANGUAGE_SETS: &[&[&str]] = &[&["en"], &["en", "de"], &["en", "fr"], &["en", "es"]];
    const TZ_OFFSETS: &[i32] = &[-8, -5, 0, 1, 2, 3, 5, 8];

    for i in 0..count {
        let stem = NAME_STEMS[i % NAME_STEMS.len()];
        let provider_id = format!("p-{:03}", i + 1);
        let display_name = format!("{} Studio {}", stem, i + 1);

        let skills: Vec<String> = SKILL_SETS[i % SKILL_SETS.len()]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let languages: Vec<String> = LANGUAGE_SETS[i % LANGUAGE_SETS.len()]
            .iter()
            .map(|s| s.to_string())
            .collect();

        let work_modes = match i % 4 {
            0 => vec![WorkMode::Remote],
            1 => vec![WorkMode::Remote, WorkMode::Hybrid],
            2 => vec![WorkMode::Local, WorkMode::Hybrid],
            _ => vec![WorkMode::Remote, WorkMode::Local, WorkMode::Hybrid],
        };

        let typical = 320.0 + (i as f64 * 23.0) % 260.0;
        let mut provider = ProviderProfile::new(&provider_id, &display_name)
            .with_skills(skills)
            .with_languages(languages)
            .with_work_modes(work_modes)
            .with_timezone_offset(TZ_OFFSETS[i % TZ_OFFSETS.len()])
            .with_rates(Some(typical), if i % 3 == 0 { Some(typical - 70.0) } else { None });

        // every sixth provider is brand new, every fifth is off market
        if i % 6 != 0 {
            let completion = (0.6 + (i % 35) as f64 / 100.0).min(0.99);
            provider = provider.with_track_record(completion, ((i * 3) % 50) as i32 + 1);
        }
        if i % 5 == 4 {
            provider = provider.with_available(false);
        }

        state.repos.provider_repo.upsert(&provider)?;
    }

    eprintln!("Seeded {} providers", count);
    Ok(())
}

fn seed_missions(state: &AppState) -> Result<(), Box<dyn Error>> {
    let api = &state.mission_api;

    // Mission 1: full happy path, ends CONFIRMED.
    let confirmed = api.create_mission(CreateMissionRequest {
        requester: "seed-requester".into(),
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
    api.dispatch(&confirmed.mission_id, Some(3), Some(60), "seed-requester")?;
    let detail = api.get_mission_detail(&confirmed.mission_id)?;
    let top_offer = detail
        .offers
        .first()
        .ok_or("seed dispatch produced no offers")?;
    api.respond(&top_offer.offer_id, "ACCEPT", Some("Seeded acceptance."))?;
    api.confirm(&confirmed.mission_id, &top_offer.offer_id, "seed-requester")?;
    api.upsert_milestone(
        &confirmed.mission_id,
        None,
        "First data model review",
        None,
        None,
    )?;

    // Mission 2: open wave, waiting on providers.
    let matching = api.create_mission(CreateMissionRequest {
        requester: "seed-requester".into(),
        title: "Migrate ETL jobs to Rust".into(),
        description: "Port a handful of nightly Python ETL jobs.".into(),
        deliverables: vec![],
        keywords: vec!["rust".into(), "etl".into()],
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
    api.dispatch(&matching.mission_id, Some(3), Some(60), "seed-requester")?;

    // Mission 3: draft only.
    api.create_mission(CreateMissionRequest {
        requester: "seed-requester".into(),
        title: "Quarterly data quality audit".into(),
        description: "Recurring audit of the reporting warehouse.".into(),
        deliverables: vec!["audit report".into()],
        keywords: vec!["sql".into(), "reporting".into()],
        deadline: None,
        duration_days: Some(5),
        budget_min: Some(1000.0),
        budget_max: Some(2000.0),
        currency: None,
        language: Some("en".into()),
        work_mode: Some("HYBRID".into()),
        location_hint: Some("Berlin".into()),
        allow_expansion: false,
        collect_multiple_quotes: Some(false),
    })?;

    eprintln!("Seeded 3 missions (confirmed / matching / draft)");
    Ok(())
}

fn print_quick_counts(state: &AppState) -> Result<(), Box<dyn Error>> {
    let repos = &state.repos;

    eprintln!("--- quick counts ---");
    eprintln!("providers: {}", repos.provider_repo.count()?);
    for status in [
        MissionStatus::Draft,
        MissionStatus::Matching,
        MissionStatus::Confirmed,
    ] {
        let missions = repos.mission_repo.list_by_status(status)?;
        eprintln!("missions {}: {}", status.to_db_str(), missions.len());
        for mission in &missions {
            let offers = repos.offer_repo.list_by_mission(&mission.mission_id)?;
            let journal = repos.journal_repo.list_by_mission(&mission.mission_id)?;
            eprintln!(
                "  {} \"{}\" offers={} journal={}",
                mission.mission_id,
                mission.title,
                offers.len(),
                journal.len()
            );
        }
    }
    let outbox = repos.outbox_repo.stats()?;
    eprintln!(
        "outbox: pending={} sent={} failed={}",
        outbox.pending, outbox.sent, outbox.failed
    );
    Ok(())
}
