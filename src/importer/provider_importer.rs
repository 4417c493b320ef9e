// ==========================================
// Mission Match Engine - Provider CSV Importer
// ==========================================
// Loads the provider directory from a headered CSV. Columns:
//   provider_id, display_name            (required)
//   skills, languages, work_modes        (';'-separated lists)
//   available                            (1/0, true/false, yes/no)
//   typical_rate, floor_rate             (f64)
//   timezone_offset_hours                (i32 in [-12, 14])
//   completion_rate                      (f64 in [0, 1])
//   completed_missions                   (i32 >= 0)
// Bad rows are collected with their line numbers and skipped; the rest
// import. Rows upsert by provider_id, so re-importing a corrected file
// repairs the directory in place.
// ==========================================

use std::collections::HashMap;
use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use csv::ReaderBuilder;
use serde::Serialize;
use tracing::{info, warn};

use crate::domain::provider::ProviderProfile;
use crate::domain::types::WorkMode;
use crate::importer::error::ImportError;
use crate::repository::ProviderRepository;

// ==========================================
// Report types
// ==========================================

/// One rejected row.
#[derive(Debug, Clone, Serialize)]
pub struct RowError {
    /// 1-based file line number (the header is line 1).
    pub row: usize,
    pub field: String,
    pub message: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportReport {
    pub total_rows: usize,
    pub imported: usize,
    pub skipped: usize,
    pub errors: Vec<RowError>,
}

// ==========================================
// ProviderImporter
// ==========================================

pub struct ProviderImporter {
    provider_repo: Arc<ProviderRepository>,
}

impl ProviderImporter {
    pub fn new(provider_repo: Arc<ProviderRepository>) -> Self {
        Self { provider_repo }
    }

    /// Import a provider directory CSV.
    ///
    /// Row-level failures (bad number, unknown work mode, out-of-range
    /// rate) are reported and skipped. Database failures abort: they
    /// are systemic, not a property of one row.
    pub fn import_from_csv<P: AsRef<Path>>(
        &self,
        file_path: P,
    ) -> Result<ImportReport, ImportError> {
        let path = file_path.as_ref();

        if !path.exists() {
            return Err(ImportError::FileNotFound(path.display().to_string()));
        }
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();
        if ext != "csv" {
            return Err(ImportError::UnsupportedFormat(ext));
        }

        let file = File::open(path)?;
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(file);

        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.trim().to_lowercase())
            .collect();

        for required in ["provider_id", "display_name"] {
            if !headers.iter().any(|h| h == required) {
                return Err(ImportError::MissingColumn(required.to_string()));
            }
        }

        let mut report = ImportReport::default();

        for (idx, result) in reader.records().enumerate() {
            // header occupies line 1
            let row_number = idx + 2;
            let record = result?;

            let mut row: HashMap<String, String> = HashMap::new();
            for (col_idx, value) in record.iter().enumerate() {
                if let Some(header) = headers.get(col_idx) {
                    row.insert(header.clone(), value.trim().to_string());
                }
            }
            if row.values().all(|v| v.is_empty()) {
                continue;
            }
            report.total_rows += 1;

            match Self::map_row(&row, row_number) {
                Ok(provider) => {
                    self.provider_repo.upsert(&provider)?;
                    report.imported += 1;
                }
                Err(err) => {
                    warn!(
                        row = err.row,
                        field = %err.field,
                        message = %err.message,
                        "provider row rejected"
                    );
                    report.errors.push(err);
                    report.skipped += 1;
                }
            }
        }

        info!(
            file = %path.display(),
            total = report.total_rows,
            imported = report.imported,
            skipped = report.skipped,
            "provider import finished"
        );
        Ok(report)
    }

    fn map_row(row: &HashMap<String, String>, row_number: usize) -> Result<ProviderProfile, RowError> {
        let provider_id = Self::required(row, "provider_id", row_number)?;
        let display_name = Self::required(row, "display_name", row_number)?;

        let mut provider = ProviderProfile::new(&provider_id, &display_name)
            .with_skills(Self::list_field(row, "skills"))
            .with_languages(Self::list_field(row, "languages"));

        let mode_names = Self::list_field(row, "work_modes");
        if !mode_names.is_empty() {
            let mut modes = Vec::with_capacity(mode_names.len());
            for name in &mode_names {
                match WorkMode::from_str(name) {
                    Some(mode) => modes.push(mode),
                    None => {
                        return Err(RowError {
                            row: row_number,
                            field: "work_modes".to_string(),
                            message: format!("unknown work mode '{}'", name),
                        })
                    }
                }
            }
            provider = provider.with_work_modes(modes);
        }

        if let Some(raw) = Self::optional(row, "available") {
            provider = provider.with_available(Self::parse_flag(&raw, row_number)?);
        }

        let typical = Self::parse_f64_opt(row, "typical_rate", row_number)?;
        let floor = Self::parse_f64_opt(row, "floor_rate", row_number)?;
        provider = provider.with_rates(typical, floor);

        if let Some(tz) = Self::parse_i32_opt(row, "timezone_offset_hours", row_number)? {
            if !(-12..=14).contains(&tz) {
                return Err(RowError {
                    row: row_number,
                    field: "timezone_offset_hours".to_string(),
                    message: format!("offset {} outside [-12, 14]", tz),
                });
            }
            provider = provider.with_timezone_offset(tz);
        }

        let completion_rate = Self::parse_f64_opt(row, "completion_rate", row_number)?.unwrap_or(0.0);
        if !(0.0..=1.0).contains(&completion_rate) {
            return Err(RowError {
                row: row_number,
                field: "completion_rate".to_string(),
                message: format!("value {} outside [0, 1]", completion_rate),
            });
        }
        let completed = Self::parse_i32_opt(row, "completed_missions", row_number)?.unwrap_or(0);
        if completed < 0 {
            return Err(RowError {
                row: row_number,
                field: "completed_missions".to_string(),
                message: format!("negative count {}", completed),
            });
        }
        provider = provider.with_track_record(completion_rate, completed);

        Ok(provider)
    }

    fn required(
        row: &HashMap<String, String>,
        field: &str,
        row_number: usize,
    ) -> Result<String, RowError> {
        match row.get(field) {
            Some(v) if !v.is_empty() => Ok(v.clone()),
            _ => Err(RowError {
                row: row_number,
                field: field.to_string(),
                message: "must not be empty".to_string(),
            }),
        }
    }

    fn optional(row: &HashMap<String, String>, field: &str) -> Option<String> {
        row.get(field).filter(|v| !v.is_empty()).cloned()
    }

    /// ';'-separated list column; absent or empty reads as [].
    fn list_field(row: &HashMap<String, String>, field: &str) -> Vec<String> {
        row.get(field)
            .map(|v| {
                v.split(';')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }

    fn parse_flag(raw: &str, row_number: usize) -> Result<bool, RowError> {
        match raw.to_lowercase().as_str() {
            "1" | "true" | "yes" | "y" => Ok(true),
            "0" | "false" | "no" | "n" => Ok(false),
            other => Err(RowError {
                row: row_number,
                field: "available".to_string(),
                message: format!("expected a boolean, got '{}'", other),
            }),
        }
    }

    fn parse_f64_opt(
        row: &HashMap<String, String>,
        field: &str,
        row_number: usize,
    ) -> Result<Option<f64>, RowError> {
        match Self::optional(row, field) {
            None => Ok(None),
            Some(raw) => raw.parse::<f64>().map(Some).map_err(|_| RowError {
                row: row_number,
                field: field.to_string(),
                message: format!("not a number: '{}'", raw),
            }),
        }
    }

    fn parse_i32_opt(
        row: &HashMap<String, String>,
        field: &str,
        row_number: usize,
    ) -> Result<Option<i32>, RowError> {
        match Self::optional(row, field) {
            None => Ok(None),
            Some(raw) => raw.parse::<i32>().map(Some).map_err(|_| RowError {
                row: row_number,
                field: field.to_string(),
                message: format!("not an integer: '{}'", raw),
            }),
        }
    }
}

// ==========================================
// Tests
// ==========================================
#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;
    use std::io::Write;
    use std::sync::Mutex;
    use tempfile::NamedTempFile;

    fn test_repo() -> Arc<ProviderRepository> {
        let conn = Connection::open_in_memory().expect("open in-memory db");
        crate::db::init_schema(&conn).expect("init schema");
        Arc::new(ProviderRepository::new(Arc::new(Mutex::new(conn))))
    }

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

    #[test]
    fn test_import_valid_rows() {
        let repo = test_repo();
        let file = write_csv(&[
            "provider_id,display_name,skills,languages,work_modes,available,typical_rate,floor_rate,timezone_offset_hours,completion_rate,completed_missions",
            "p-1,Ada Design,logo;branding,en;fr,REMOTE;HYBRID,1,700,500,1,0.93,41",
            "p-2,Bob Films,video,en,REMOTE,1,650,,,0.80,12",
        ]);

        let importer = ProviderImporter::new(repo.clone());
        let report = importer.import_from_csv(file.path()).expect("import");

        assert_eq!(report.total_rows, 2);
        assert_eq!(report.imported, 2);
        assert_eq!(report.skipped, 0);
        assert!(report.errors.is_empty());

        let ada = repo.find_by_id("p-1").expect("query").expect("exists");
        assert_eq!(ada.display_name, "Ada Design");
        assert_eq!(ada.skills, vec!["logo", "branding"]);
        assert_eq!(ada.work_modes, vec![WorkMode::Remote, WorkMode::Hybrid]);
        assert_eq!(ada.floor_rate, Some(500.0));
        assert_eq!(ada.timezone_offset_hours, Some(1));
        assert_eq!(ada.completed_missions, 41);

        let bob = repo.find_by_id("p-2").expect("query").expect("exists");
        assert_eq!(bob.floor_rate, None);
        assert_eq!(bob.timezone_offset_hours, None);
    }

    #[test]
    fn test_bad_rows_are_collected_with_line_numbers() {
        let repo = test_repo();
        let file = write_csv(&[
            "provider_id,display_name,typical_rate,work_modes",
            "p-1,Ada,700,REMOTE",
            "p-2,Bob,not-a-number,REMOTE",
            "p-3,Cleo,500,TELEPATHIC",
            ",NoId,500,REMOTE",
            "p-5,Dana,450,LOCAL",
        ]);

        let importer = ProviderImporter::new(repo.clone());
        let report = importer.import_from_csv(file.path()).expect("import");

        assert_eq!(report.total_rows, 5);
        assert_eq!(report.imported, 2);
        assert_eq!(report.skipped, 3);
        assert_eq!(report.errors.len(), 3);

        // header is line 1, so the first bad row is line 3
        assert_eq!(report.errors[0].row, 3);
        assert_eq!(report.errors[0].field, "typical_rate");
        assert_eq!(report.errors[1].row, 4);
        assert_eq!(report.errors[1].field, "work_modes");
        assert_eq!(report.errors[2].row, 5);
        assert_eq!(report.errors[2].field, "provider_id");

        assert!(repo.find_by_id("p-2").expect("query").is_none());
        assert!(repo.find_by_id("p-5").expect("query").is_some());
    }

    #[test]
    fn test_reimport_upserts_by_provider_id() {
        let repo = test_repo();
        let first = write_csv(&[
            "provider_id,display_name,completion_rate",
            "p-1,Ada,0.5",
        ]);
        let second = write_csv(&[
            "provider_id,display_name,completion_rate",
            "p-1,Ada Design,0.9",
        ]);

        let importer = ProviderImporter::new(repo.clone());
        importer.import_from_csv(first.path()).expect("first import");
        importer.import_from_csv(second.path()).expect("second import");

        assert_eq!(repo.count().expect("count"), 1);
        let ada = repo.find_by_id("p-1").expect("query").expect("exists");
        assert_eq!(ada.display_name, "Ada Design");
        assert!((ada.completion_rate - 0.9).abs() < 1e-9);
    }

    #[test]
    fn test_missing_required_column_aborts() {
        let repo = test_repo();
        let file = write_csv(&["provider_id,skills", "p-1,logo"]);

        let importer = ProviderImporter::new(repo);
        let result = importer.import_from_csv(file.path());
        assert!(matches!(result, Err(ImportError::MissingColumn(col)) if col == "display_name"));
    }

    #[test]
    fn test_file_not_found() {
        let importer = ProviderImporter::new(test_repo());
        let result = importer.import_from_csv("no_such_file.csv");
        assert!(matches!(result, Err(ImportError::FileNotFound(_))));
    }

    #[test]
    fn test_blank_rows_are_skipped_silently() {
        let repo = test_repo();
        let file = write_csv(&[
            "provider_id,display_name",
            "p-1,Ada",
            ",",
            "p-2,Bob",
        ]);

        let importer = ProviderImporter::new(repo);
        let report = importer.import_from_csv(file.path()).expect("import");
        assert_eq!(report.total_rows, 2);
        assert_eq!(report.imported, 2);
    }
}
