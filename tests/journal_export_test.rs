// ==========================================
// Journal and export tests
// ==========================================
// The per-mission journal is the audit trail: gap-free, ordered,
// payload-carrying, and still readable after archive. Export bundles
// the full dossier as JSON.
// ==========================================

#[path = "test_helpers.rs"]
mod test_helpers;

#[cfg(test)]
mod journal_export_test {
    use mission_match::api::ApiError;
    use mission_match::domain::types::{JournalEventType, MilestoneStatus, MissionStatus};

    use crate::test_helpers::{seed_provider_pool, setup_app, standard_request};

    // ==========================================
    // Test 1: the full lifecycle journals gap-free
    // ==========================================

    #[test]
    fn test_full_lifecycle_journal_is_gap_free() {
        let (_db, state) = setup_app().unwrap();
        seed_provider_pool(&state, 3).unwrap();
        let api = &state.mission_api;

        let mission = api
            .create_mission(standard_request("Cradle to grave"))
            .unwrap();
        api.dispatch(&mission.mission_id, Some(2), Some(60), "req-tests")
            .unwrap();
        let offers = state
            .repos
            .offer_repo
            .list_by_wave(&mission.mission_id, 1)
            .unwrap();
        api.respond(&offers[0].offer_id, "ACCEPT", None).unwrap();
        api.confirm(&mission.mission_id, &offers[0].offer_id, "req-tests")
            .unwrap();
        api.complete_mission(&mission.mission_id, "req-tests")
            .unwrap();

        let journal = api.journal(&mission.mission_id).unwrap();
        assert_eq!(journal[0].event_type, JournalEventType::MissionCreated);
        let last = journal.last().unwrap();
        assert_eq!(last.event_type, JournalEventType::StatusChanged);
        let payload = last.payload.as_ref().unwrap();
        assert_eq!(payload["from"], "CONFIRMED");
        assert_eq!(payload["to"], "COMPLETED");

        for (idx, event) in journal.iter().enumerate() {
            assert_eq!(event.seq, idx as i64 + 1, "seq gap at index {}", idx);
            assert_eq!(event.mission_id, mission.mission_id);
        }

        println!("✓ lifecycle journal: {} entries, gap-free", journal.len());
    }

    // ==========================================
    // Test 2: cancellation journals the teardown leaf-first
    // ==========================================

    #[test]
    fn test_cancel_journals_offers_wave_then_mission() {
        let (_db, state) = setup_app().unwrap();
        seed_provider_pool(&state, 3).unwrap();
        let api = &state.mission_api;

        let mission = api
            .create_mission(standard_request("Pulled by requester"))
            .unwrap();
        api.dispatch(&mission.mission_id, Some(2), Some(60), "req-tests")
            .unwrap();
        api.cancel_mission(&mission.mission_id, "req-tests").unwrap();

        let journal = api.journal(&mission.mission_id).unwrap();
        let tail: Vec<JournalEventType> = journal
            .iter()
            .skip(journal.len() - 4)
            .map(|e| e.event_type)
            .collect();
        assert_eq!(
            tail,
            vec![
                JournalEventType::OfferExpired,
                JournalEventType::OfferExpired,
                JournalEventType::WaveClosed,
                JournalEventType::MissionCancelled,
            ]
        );

        let expired = journal
            .iter()
            .find(|e| e.event_type == JournalEventType::OfferExpired)
            .unwrap();
        assert_eq!(
            expired.payload.as_ref().unwrap()["reason"],
            "mission_cancelled"
        );
        let closed = journal
            .iter()
            .find(|e| e.event_type == JournalEventType::WaveClosed)
            .unwrap();
        assert_eq!(
            closed.payload.as_ref().unwrap()["close_reason"],
            "CANCELLED"
        );

        let mission = api.get_mission(&mission.mission_id).unwrap();
        assert_eq!(mission.status, MissionStatus::Cancelled);
    }

    // ==========================================
    // Test 3: export bundles mission, offers, milestones and journal
    // ==========================================

    #[test]
    fn test_export_bundles_full_dossier() {
        let (_db, state) = setup_app().unwrap();
        seed_provider_pool(&state, 3).unwrap();
        let api = &state.mission_api;

        let mission = api
            .create_mission(standard_request("Exportable"))
            .unwrap();
        api.dispatch(&mission.mission_id, Some(2), Some(60), "req-tests")
            .unwrap();
        let offers = state
            .repos
            .offer_repo
            .list_by_wave(&mission.mission_id, 1)
            .unwrap();
        api.respond(&offers[0].offer_id, "ACCEPT", None).unwrap();
        api.confirm(&mission.mission_id, &offers[0].offer_id, "req-tests")
            .unwrap();
        api.upsert_milestone(
            &mission.mission_id,
            None,
            "First review",
            None,
            Some(MilestoneStatus::InProgress),
        )
        .unwrap();

        let export = api.export_mission(&mission.mission_id).unwrap();
        assert_eq!(export.mission.mission_id, mission.mission_id);
        assert_eq!(export.offers.len(), 2);
        assert_eq!(export.milestones.len(), 1);
        assert_eq!(export.milestones[0].title, "First review");
        assert!(!export.journal.is_empty());
        assert_eq!(export.journal.len() as i64, export.journal.last().unwrap().seq);

        let json = api.export_mission_json(&mission.mission_id).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["mission"]["mission_id"], mission.mission_id.as_str());
        assert_eq!(value["offers"].as_array().unwrap().len(), 2);
        assert!(value["exported_at"].is_string());

        println!("✓ export: dossier complete and parseable");
    }

    // ==========================================
    // Test 4: archive hides the mission but keeps the paper trail
    // ==========================================

    #[test]
    fn test_archive_keeps_journal_readable() {
        let (_db, state) = setup_app().unwrap();
        seed_provider_pool(&state, 3).unwrap();
        let api = &state.mission_api;

        let mission = api
            .create_mission(standard_request("Archive me"))
            .unwrap();
        api.dispatch(&mission.mission_id, Some(2), Some(60), "req-tests")
            .unwrap();
        let offers = state
            .repos
            .offer_repo
            .list_by_wave(&mission.mission_id, 1)
            .unwrap();
        api.respond(&offers[0].offer_id, "ACCEPT", None).unwrap();
        api.confirm(&mission.mission_id, &offers[0].offer_id, "req-tests")
            .unwrap();
        api.complete_mission(&mission.mission_id, "req-tests")
            .unwrap();
        api.archive_mission(&mission.mission_id).unwrap();

        // reads-as-absent for the live surface
        let result = api.get_mission(&mission.mission_id);
        assert!(matches!(result, Err(ApiError::NotFound { .. })));
        let listed = api.list_missions(MissionStatus::Completed).unwrap();
        assert!(listed.iter().all(|m| m.mission_id != mission.mission_id));

        // the audit trail stays
        let journal = api.journal(&mission.mission_id).unwrap();
        assert!(!journal.is_empty());
        let export = api.export_mission(&mission.mission_id).unwrap();
        assert!(export.mission.archived);

        println!("✓ archive: hidden from listings, journal intact");
    }

    // ==========================================
    // Test 5: archive is terminal-only
    // ==========================================

    #[test]
    fn test_archive_requires_terminal_status() {
        let (_db, state) = setup_app().unwrap();
        seed_provider_pool(&state, 3).unwrap();
        let api = &state.mission_api;

        let mission = api
            .create_mission(standard_request("Still running"))
            .unwrap();
        api.dispatch(&mission.mission_id, Some(2), Some(60), "req-tests")
            .unwrap();

        let result = api.archive_mission(&mission.mission_id);
        assert!(matches!(result, Err(ApiError::Conflict(_))));
    }

    // ==========================================
    // Test 6: subscribers see journal events live
    // ==========================================

    #[test]
    fn test_subscribe_receives_dispatch_events() {
        let (_db, state) = setup_app().unwrap();
        seed_provider_pool(&state, 3).unwrap();
        let api = &state.mission_api;

        let mission = api
            .create_mission(standard_request("Watched mission"))
            .unwrap();
        let mut feed = api.subscribe(&mission.mission_id);

        api.dispatch(&mission.mission_id, Some(2), Some(60), "req-tests")
            .unwrap();

        let mut received = Vec::new();
        while let Ok(event) = feed.try_recv() {
            received.push(event);
        }

        // creation predates the subscription; the dispatch burst arrives
        let types: Vec<JournalEventType> = received.iter().map(|e| e.event_type).collect();
        assert_eq!(
            types,
            vec![
                JournalEventType::StatusChanged,
                JournalEventType::StatusChanged,
                JournalEventType::WaveOpened,
                JournalEventType::OfferCreated,
                JournalEventType::OfferCreated,
            ]
        );
        let seqs: Vec<i64> = received.iter().map(|e| e.seq).collect();
        let mut sorted = seqs.clone();
        sorted.sort_unstable();
        assert_eq!(seqs, sorted, "events must arrive in seq order");
    }
}
