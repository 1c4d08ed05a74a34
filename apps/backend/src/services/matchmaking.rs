//! Matchmaking: pair four compatible waiting players into a fresh room
//! and start it immediately (no ready step for matched games).

use serde::Serialize;
use time::{Duration, OffsetDateTime};

use crate::auth::Actor;
use crate::db::txn::with_txn;
use crate::entities::queue_entries::{self, QueueMode};
use crate::entities::rooms::RoomVisibility;
use crate::error::AppError;
use crate::realtime::hub::{RoomEvent, RoomEventKind};
use crate::repos;
use crate::services::game_flow::lifecycle;
use crate::services::rooms::{allocate_room, reclaim_in_txn};
use crate::state::app_state::AppState;

/// Entries older than this are purged before every attempt.
const QUEUE_TTL: Duration = Duration::minutes(5);
/// Maximum rating distance from the oldest (anchor) entry.
const RATING_BAND: i32 = 200;

#[derive(Debug, Clone, Serialize)]
pub struct MatchAttempt {
    pub matched: bool,
    pub room_code: Option<String>,
}

/// Pick four matchable entries from the FIFO-ordered queue: equal mode
/// and region, rating within the band of the oldest anchor, oldest
/// first. Returns indices into `entries`. Pure, tested separately.
pub fn select_match(entries: &[queue_entries::Model]) -> Option<[usize; 4]> {
    for (anchor_idx, anchor) in entries.iter().enumerate() {
        let mut group = [anchor_idx; 4];
        let mut found = 1;
        for (idx, cand) in entries.iter().enumerate().skip(anchor_idx + 1) {
            if cand.mode == anchor.mode
                && cand.region == anchor.region
                && (cand.rating - anchor.rating).abs() <= RATING_BAND
            {
                group[found] = idx;
                found += 1;
                if found == 4 {
                    return Some(group);
                }
            }
        }
    }
    None
}

/// Enqueue (idempotently) and attempt a match. On success the room is
/// created, all four are seated in enqueue order and the game starts in
/// the same transaction, so partial matches never escape.
pub async fn find_match(
    state: &AppState,
    player_id: i64,
    display_name: &str,
    rating: i32,
    region: &str,
    mode: QueueMode,
) -> Result<MatchAttempt, AppError> {
    let display_name = display_name.to_owned();
    let region = region.to_owned();
    let outcome = with_txn(&state.db, |txn| Box::pin(async move {
        let display_name = display_name.as_str();
        let region = region.as_str();
        let now = OffsetDateTime::now_utc();
        reclaim_in_txn(txn).await?;
        repos::queue::purge_stale(txn, now - QUEUE_TTL).await?;

        repos::queue::enqueue(
            txn,
            player_id,
            display_name.to_string(),
            rating,
            region.to_string(),
            mode,
        )
        .await?;

        let entries = repos::queue::list_ordered(txn).await?;
        let Some(group) = select_match(&entries) else {
            return Ok(None);
        };
        let matched: Vec<&queue_entries::Model> =
            group.iter().map(|idx| &entries[*idx]).collect();

        let room = allocate_room(
            txn,
            RoomVisibility::Private,
            true,
            mode == QueueMode::Ranked,
        )
        .await?;

        // Seat 0 is the earliest-enqueued entry.
        for (seat_idx, entry) in matched.iter().enumerate() {
            repos::seats::create(
                txn,
                repos::seats::SeatCreate {
                    room_id: room.id,
                    seat_idx: seat_idx as u8,
                    player_id: Some(entry.player_id),
                    display_name: entry.display_name.clone(),
                    is_human: true,
                    bot_difficulty: None,
                    is_owner: seat_idx == 0,
                },
            )
            .await?;
        }

        // Matched entries leave the queue as a unit.
        let ids: Vec<i64> = matched.iter().map(|e| e.id).collect();
        repos::queue::remove_entries(txn, &ids).await?;

        let lock_version = lifecycle::start_in_txn(txn, &room, Actor::Service, 0, 0).await?;
        tracing::info!(
            room_id = room.id,
            players = ?ids,
            "matchmade room started"
        );
        Ok(Some((room.id, room.join_code, lock_version)))
    }))
    .await?;

    match outcome {
        Some((room_id, room_code, lock_version)) => {
            state.hub.publish(RoomEvent {
                room_id,
                lock_version,
                kind: RoomEventKind::StateChanged,
            });
            Ok(MatchAttempt {
                matched: true,
                room_code: Some(room_code),
            })
        }
        None => Ok(MatchAttempt {
            matched: false,
            room_code: None,
        }),
    }
}

/// Leave the queue. Succeeds whether or not an entry existed.
pub async fn cancel_match(state: &AppState, player_id: i64) -> Result<bool, AppError> {
    with_txn(&state.db, |txn| Box::pin(async move {
        Ok(repos::queue::remove_by_player(txn, player_id).await?)
    }))
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: i64, rating: i32, region: &str, mode: QueueMode, order_s: i64) -> queue_entries::Model {
        queue_entries::Model {
            id,
            player_id: id,
            display_name: format!("p{id}"),
            rating,
            region: region.to_string(),
            mode,
            enqueued_at: OffsetDateTime::from_unix_timestamp(1_700_000_000 + order_s).unwrap(),
        }
    }

    #[test]
    fn matches_four_compatible_entries_fifo() {
        let entries = vec![
            entry(1, 1000, "eu", QueueMode::Casual, 0),
            entry(2, 1100, "eu", QueueMode::Casual, 1),
            entry(3, 950, "eu", QueueMode::Casual, 2),
            entry(4, 1050, "eu", QueueMode::Casual, 3),
            entry(5, 1000, "eu", QueueMode::Casual, 4),
        ];
        assert_eq!(select_match(&entries), Some([0, 1, 2, 3]));
    }

    #[test]
    fn needs_four() {
        let entries = vec![
            entry(1, 1000, "eu", QueueMode::Casual, 0),
            entry(2, 1000, "eu", QueueMode::Casual, 1),
            entry(3, 1000, "eu", QueueMode::Casual, 2),
        ];
        assert_eq!(select_match(&entries), None);
    }

    #[test]
    fn mode_and_region_must_match() {
        let entries = vec![
            entry(1, 1000, "eu", QueueMode::Casual, 0),
            entry(2, 1000, "us", QueueMode::Casual, 1),
            entry(3, 1000, "eu", QueueMode::Ranked, 2),
            entry(4, 1000, "eu", QueueMode::Casual, 3),
            entry(5, 1000, "eu", QueueMode::Casual, 4),
            entry(6, 1000, "eu", QueueMode::Casual, 5),
        ];
        // Anchor 1 matches 4, 5 and 6; the us and ranked entries are skipped.
        assert_eq!(select_match(&entries), Some([0, 3, 4, 5]));
    }

    #[test]
    fn rating_band_is_measured_from_the_anchor() {
        let entries = vec![
            entry(1, 1000, "eu", QueueMode::Casual, 0),
            entry(2, 1201, "eu", QueueMode::Casual, 1),
            entry(3, 1200, "eu", QueueMode::Casual, 2),
            entry(4, 800, "eu", QueueMode::Casual, 3),
            entry(5, 900, "eu", QueueMode::Casual, 4),
        ];
        // 1201 is out of band for anchor 1000; the rest qualify.
        assert_eq!(select_match(&entries), Some([0, 2, 3, 4]));
    }

    #[test]
    fn a_younger_anchor_can_match_when_the_oldest_cannot() {
        let entries = vec![
            entry(1, 100, "eu", QueueMode::Casual, 0),
            entry(2, 1000, "eu", QueueMode::Casual, 1),
            entry(3, 1000, "eu", QueueMode::Casual, 2),
            entry(4, 1000, "eu", QueueMode::Casual, 3),
            entry(5, 1000, "eu", QueueMode::Casual, 4),
        ];
        assert_eq!(select_match(&entries), Some([1, 2, 3, 4]));
    }
}
