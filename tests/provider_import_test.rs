// ==========================================
// Provider import integration tests
// ==========================================
// CSV intake feeding the live directory: imported rows must be
// dispatchable immediately, re-imports repair in place, bad rows are
// reported and skipped.
// ==========================================

#[path = "test_helpers.rs"]
mod test_helpers;

#[cfg(test)]
mod provider_import_test {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use crate::test_helpers::{setup_app, standard_request};

    fn write_csv(lines: &[&str]) -> NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(".csv")
            .tempfile()
            .expect("create temp csv");
        for line in lines {
            writeln!(file, "{}", line).expect("write line");
        }
        file
    }

    const HEADER: &str = "provider_id,display_name,skills,languages,work_modes,available,typical_rate,floor_rate,timezone_offset_hours,completion_rate,completed_missions";

    // ==========================================
    // Test 1: imported providers are dispatchable right away
    // ==========================================

    #[test]
    fn test_import_then_dispatch() {
        let (_db, state) = setup_app().unwrap();

        let file = write_csv(&[
            HEADER,
            "csv-1,Ada Rust,rust;sql,en,REMOTE,1,450,350,0,0.95,20",
            "csv-2,Bob Queries,rust;sql,en,REMOTE,1,420,300,2,0.85,12",
            "csv-3,Cleo Data,rust;sql,en,REMOTE,1,480,380,1,0.75,7",
        ]);

        let report = state.provider_importer.import_from_csv(file.path()).unwrap();
        assert_eq!(report.total_rows, 3);
        assert_eq!(report.imported, 3);
        assert!(report.errors.is_empty());
        assert_eq!(state.repos.provider_repo.count().unwrap(), 3);

        let api = &state.mission_api;
        let mission = api
            .create_mission(standard_request("Staffed from CSV"))
            .unwrap();
        let outcome = api
            .dispatch(&mission.mission_id, Some(3), Some(60), "req-tests")
            .unwrap();

        assert_eq!(outcome.invited, 3);
        assert!(!outcome.pool_exhausted);

        let offers = state
            .repos
            .offer_repo
            .list_by_wave(&mission.mission_id, 1)
            .unwrap();
        // best track record first
        assert_eq!(offers[0].provider_id, "csv-1");

        println!("✓ import then dispatch: all 3 CSV providers invited");
    }

    // ==========================================
    // Test 2: re-importing a corrected file repairs in place
    // ==========================================

    #[test]
    fn test_reimport_repairs_directory() {
        let (_db, state) = setup_app().unwrap();

        let first = write_csv(&[
            HEADER,
            "csv-1,Ada,rust,en,REMOTE,1,450,350,0,0.5,4",
        ]);
        let second = write_csv(&[
            HEADER,
            "csv-1,Ada Rust,rust;sql,en,REMOTE,1,460,340,0,0.9,9",
        ]);

        state.provider_importer.import_from_csv(first.path()).unwrap();
        state.provider_importer.import_from_csv(second.path()).unwrap();

        assert_eq!(state.repos.provider_repo.count().unwrap(), 1);
        let ada = state
            .repos
            .provider_repo
            .find_by_id("csv-1")
            .unwrap()
            .unwrap();
        assert_eq!(ada.display_name, "Ada Rust");
        assert_eq!(ada.skills, vec!["rust", "sql"]);
        assert!((ada.completion_rate - 0.9).abs() < 1e-9);
    }

    // ==========================================
    // Test 3: bad rows are skipped, good rows still land
    // ==========================================

    #[test]
    fn test_partial_import_reports_bad_rows() {
        let (_db, state) = setup_app().unwrap();

        let file = write_csv(&[
            HEADER,
            "csv-1,Ada,rust;sql,en,REMOTE,1,450,350,0,0.9,10",
            "csv-2,Bob,rust;sql,en,TELEPATHIC,1,450,350,0,0.9,10",
            "csv-3,Cleo,rust;sql,en,REMOTE,1,450,350,0,1.7,10",
            "csv-4,Dana,rust;sql,en,REMOTE,1,450,350,0,0.8,6",
        ]);

        let report = state.provider_importer.import_from_csv(file.path()).unwrap();
        assert_eq!(report.total_rows, 4);
        assert_eq!(report.imported, 2);
        assert_eq!(report.skipped, 2);

        // header occupies line 1
        assert_eq!(report.errors[0].row, 3);
        assert_eq!(report.errors[0].field, "work_modes");
        assert_eq!(report.errors[1].row, 4);
        assert_eq!(report.errors[1].field, "completion_rate");

        assert!(state
            .repos
            .provider_repo
            .find_by_id("csv-2")
            .unwrap()
            .is_none());
        assert!(state
            .repos
            .provider_repo
            .find_by_id("csv-4")
            .unwrap()
            .is_some());

        // dispatch sees only the importable rows
        let api = &state.mission_api;
        let mission = api
            .create_mission(standard_request("Partially staffed"))
            .unwrap();
        let outcome = api
            .dispatch(&mission.mission_id, Some(4), Some(60), "req-tests")
            .unwrap();
        assert_eq!(outcome.invited, 2);
        assert!(outcome.pool_exhausted);
    }
}
