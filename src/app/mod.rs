// ==========================================
// Mission Match Engine - Application Layer
// ==========================================
// Startup wiring shared by the binaries.
// ==========================================

pub mod state;

pub use state::AppState;
