use std::sync::Arc;

use sea_orm::DatabaseConnection;

use super::security_config::SecurityConfig;
use crate::realtime::hub::RoomHub;
use crate::services::results::{MatchResultSink, TracingResultSink};

/// Application state containing shared resources.
pub struct AppState {
    pub db: DatabaseConnection,
    /// Security configuration including JWT settings
    pub security: SecurityConfig,
    /// Per-room change feed fan-out
    pub hub: Arc<RoomHub>,
    /// Stats/leaderboard collaborator; fire-and-forget
    pub results: Arc<dyn MatchResultSink>,
}

impl AppState {
    pub fn new(db: DatabaseConnection, security: SecurityConfig) -> Self {
        Self {
            db,
            security,
            hub: Arc::new(RoomHub::new()),
            results: Arc::new(TracingResultSink),
        }
    }

    #[cfg(test)]
    pub fn for_tests(db: DatabaseConnection) -> Self {
        Self::new(db, SecurityConfig::for_tests())
    }
}
