// ==========================================
// Mission Match Engine - Configuration Layer
// ==========================================
// Operator-tunable settings backed by the config_kv table.
// ==========================================

pub mod config_manager;

pub use config_manager::{config_keys, ConfigManager};
