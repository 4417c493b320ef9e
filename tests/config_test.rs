// ==========================================
// Configuration integration tests
// ==========================================
// Config is read at use, not at startup: defaults cover missing or
// malformed entries, and retuned scoring weights change the very next
// dispatch.
// ==========================================

#[path = "test_helpers.rs"]
mod test_helpers;

#[cfg(test)]
mod config_test {
    use mission_match::config::config_keys;
    use mission_match::domain::provider::ProviderProfile;
    use mission_match::domain::types::WorkMode;

    use crate::test_helpers::{seed_provider_pool, setup_app, standard_request};

    // ==========================================
    // Test 1: built-in defaults stand in for missing entries
    // ==========================================

    #[test]
    fn test_defaults_when_unset() {
        let (_db, state) = setup_app().unwrap();

        assert_eq!(state.config.get_default_wave_size().unwrap(), 3);
        assert_eq!(state.config.get_default_timeout_minutes().unwrap(), 60);
        assert_eq!(state.config.get_notify_max_retries().unwrap(), 3);

        let weights = state.config.get_scoring_weights().unwrap();
        assert!((weights.skill - 0.4).abs() < 1e-9);
        assert!((weights.budget - 0.25).abs() < 1e-9);
        assert!((weights.availability - 0.15).abs() < 1e-9);
        assert!((weights.reliability - 0.2).abs() < 1e-9);
    }

    // ==========================================
    // Test 2: set, read back, snapshot
    // ==========================================

    #[test]
    fn test_set_and_read_back() {
        let (_db, state) = setup_app().unwrap();
        let api = &state.mission_api;

        assert!(api
            .get_config_value(config_keys::DEFAULT_WAVE_SIZE)
            .unwrap()
            .is_none());

        api.set_config_value(config_keys::DEFAULT_WAVE_SIZE, "5")
            .unwrap();
        assert_eq!(
            api.get_config_value(config_keys::DEFAULT_WAVE_SIZE).unwrap(),
            Some("5".to_string())
        );
        assert_eq!(state.config.get_default_wave_size().unwrap(), 5);

        // upsert, not insert-only
        api.set_config_value(config_keys::DEFAULT_WAVE_SIZE, "4")
            .unwrap();
        assert_eq!(state.config.get_default_wave_size().unwrap(), 4);

        let snapshot = api.get_config_snapshot().unwrap();
        let value: serde_json::Value = serde_json::from_str(&snapshot).unwrap();
        assert_eq!(value[config_keys::DEFAULT_WAVE_SIZE], "4");
    }

    // ==========================================
    // Test 3: malformed values fall back with a warning
    // ==========================================

    #[test]
    fn test_malformed_value_falls_back() {
        let (_db, state) = setup_app().unwrap();

        state
            .config
            .set_config_value(config_keys::DEFAULT_WAVE_SIZE, "a handful")
            .unwrap();
        assert_eq!(state.config.get_default_wave_size().unwrap(), 3);

        state
            .config
            .set_config_value(config_keys::SCORING_WEIGHT_SKILL, "heavy")
            .unwrap();
        let weights = state.config.get_scoring_weights().unwrap();
        assert!((weights.skill - 0.4).abs() < 1e-9);
    }

    // ==========================================
    // Test 4: dispatch picks up configured defaults
    // ==========================================

    #[test]
    fn test_dispatch_uses_configured_wave_size() {
        let (_db, state) = setup_app().unwrap();
        seed_provider_pool(&state, 5).unwrap();
        let api = &state.mission_api;

        api.set_config_value(config_keys::DEFAULT_WAVE_SIZE, "2")
            .unwrap();

        let mission = api
            .create_mission(standard_request("Configured sizing"))
            .unwrap();
        let outcome = api
            .dispatch(&mission.mission_id, None, None, "req-tests")
            .unwrap();

        assert_eq!(outcome.invited, 2);

        let wave = state
            .repos
            .wave_repo
            .find(&mission.mission_id, 1)
            .unwrap()
            .unwrap();
        assert_eq!(wave.wave_size, 2);
        assert_eq!(wave.timeout_minutes, 60);
    }

    // ==========================================
    // Test 5: retuned weights flip the ranking on the next dispatch
    // ==========================================

    #[test]
    fn test_weight_override_changes_ranking() {
        let (_db, state) = setup_app().unwrap();
        let repo = &state.repos.provider_repo;

        // perfect skills, no track record
        repo.upsert(
            &ProviderProfile::new("p-sharp", "Sharp Skills")
                .with_skills(vec!["rust".into(), "sql".into()])
                .with_languages(vec!["en".into()])
                .with_work_modes(vec![WorkMode::Remote])
                .with_timezone_offset(0),
        )
        .unwrap();
        // zero skill overlap, flawless track record
        repo.upsert(
            &ProviderProfile::new("p-steady", "Steady Hands")
                .with_skills(vec!["legal".into()])
                .with_languages(vec!["en".into()])
                .with_work_modes(vec![WorkMode::Remote])
                .with_timezone_offset(0)
                .with_track_record(1.0, 50),
        )
        .unwrap();

        let api = &state.mission_api;

        // under the default weights, skill dominates
        let first = api
            .create_mission(standard_request("Default weighting"))
            .unwrap();
        api.dispatch(&first.mission_id, Some(1), Some(60), "req-tests")
            .unwrap();
        let offers = state
            .repos
            .offer_repo
            .list_by_wave(&first.mission_id, 1)
            .unwrap();
        assert_eq!(offers[0].provider_id, "p-sharp");

        // retune towards reliability; no restart, next dispatch obeys
        api.set_config_value(config_keys::SCORING_WEIGHT_SKILL, "0.05")
            .unwrap();
        api.set_config_value(config_keys::SCORING_WEIGHT_BUDGET, "0.05")
            .unwrap();
        api.set_config_value(config_keys::SCORING_WEIGHT_AVAILABILITY, "0.05")
            .unwrap();
        api.set_config_value(config_keys::SCORING_WEIGHT_RELIABILITY, "0.85")
            .unwrap();

        let second = api
            .create_mission(standard_request("Reliability weighting"))
            .unwrap();
        api.dispatch(&second.mission_id, Some(1), Some(60), "req-tests")
            .unwrap();
        let offers = state
            .repos
            .offer_repo
            .list_by_wave(&second.mission_id, 1)
            .unwrap();
        assert_eq!(offers[0].provider_id, "p-steady");

        println!("✓ weight retune: ranking flipped without a restart");
    }
}
