//! Match result sink: the stats/leaderboard collaborator boundary.
//!
//! Recording is fire-and-forget. The game-over transaction has already
//! committed by the time the sink runs; a sink failure is logged and
//! never blocks or rolls back game completion.

use async_trait::async_trait;
use serde::Serialize;
use time::Duration;

use crate::domain::Seat;

#[derive(Debug, Clone, Serialize)]
pub struct PlayerResult {
    pub seat: Seat,
    pub player_id: Option<i64>,
    pub display_name: String,
    pub score: i32,
}

#[derive(Debug, Clone, Serialize)]
pub struct MatchResult {
    pub room_id: i64,
    pub players: Vec<PlayerResult>,
    pub winner: Seat,
    pub duration: Duration,
}

#[async_trait]
pub trait MatchResultSink: Send + Sync {
    async fn record_match_result(&self, result: MatchResult);
}

/// Default sink: structured log line, picked up by the log pipeline.
pub struct TracingResultSink;

#[async_trait]
impl MatchResultSink for TracingResultSink {
    async fn record_match_result(&self, result: MatchResult) {
        tracing::info!(
            room_id = result.room_id,
            winner = result.winner,
            duration_s = result.duration.whole_seconds(),
            players = ?result.players,
            "match result recorded"
        );
    }
}
