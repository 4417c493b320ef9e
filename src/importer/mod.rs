// ==========================================
// Mission Match Engine - Importer Layer
// ==========================================
// External data in, directory rows out. The provider importer is the
// only write path into provider_directory besides seeding.
// ==========================================

pub mod error;
pub mod provider_importer;

pub use error::ImportError;
pub use provider_importer::{ImportReport, ProviderImporter, RowError};
