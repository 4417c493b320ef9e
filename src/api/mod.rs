// ==========================================
// Mission Match Engine - API Layer
// ==========================================
// Surface callers program against; transports (REST, CLI, anything)
// map onto these methods one-for-one.
// ==========================================

pub mod error;
pub mod mission_api;

pub use error::{ApiError, ApiResult};
pub use mission_api::{CreateMissionRequest, MissionApi, MissionDetail};
