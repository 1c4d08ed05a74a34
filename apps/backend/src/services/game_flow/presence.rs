//! Connection and presence handling.
//!
//! Per-seat machine: `connected → disconnected → bot_controlled`, with
//! `connected` reachable from any state on explicit reconnect. The
//! disconnect grace period is a stored deadline settled lazily during
//! room access, not a scheduled callback.

use sea_orm::DatabaseTransaction;
use serde::Serialize;
use time::{Duration, OffsetDateTime};

use crate::db::txn::with_txn;
use crate::entities::seats::{self, SeatPresence};
use crate::error::AppError;
use crate::errors::domain::{DomainError, NotFoundKind};
use crate::realtime::hub::{RoomEvent, RoomEventKind};
use crate::repos;
use crate::state::app_state::AppState;

/// How long a disconnected human seat waits before bot takeover.
pub const DISCONNECT_GRACE: Duration = Duration::seconds(15);

/// Difficulty assigned to a seat the server takes over.
const TAKEOVER_DIFFICULTY: i16 = 1;

#[derive(Debug, Clone, Copy, Serialize)]
pub struct ReconnectResult {
    pub is_spectator: bool,
}

pub(crate) fn promotion_due(disconnected_at: OffsetDateTime, now: OffsetDateTime) -> bool {
    now >= disconnected_at + DISCONNECT_GRACE
}

/// Promote every seat whose grace period has elapsed. Runs inside the
/// caller's transaction, before any validation.
pub(crate) async fn settle_presence(
    txn: &DatabaseTransaction,
    room_id: i64,
    now: OffsetDateTime,
) -> Result<bool, DomainError> {
    let mut changed = false;
    for seat in repos::seats::for_room(txn, room_id).await? {
        if seat.presence != SeatPresence::Disconnected || !seat.is_human {
            continue;
        }
        let overdue = match seat.disconnected_at {
            Some(at) => promotion_due(at, now),
            None => false,
        };
        if overdue {
            repos::seats::promote_to_bot(txn, &seat, TAKEOVER_DIFFICULTY).await?;
            tracing::info!(
                room_id,
                seat = seat.seat_idx,
                player_id = ?seat.player_id,
                "grace period elapsed, seat promoted to bot control"
            );
            changed = true;
        }
    }
    Ok(changed)
}

async fn require_own_seat(
    txn: &DatabaseTransaction,
    room_id: i64,
    player_id: i64,
) -> Result<Option<seats::Model>, DomainError> {
    let seats = repos::seats::for_room(txn, room_id).await?;
    Ok(seats.into_iter().find(|s| s.player_id == Some(player_id)))
}

/// Liveness ping: flips a disconnected (not yet promoted) seat back to
/// connected.
pub async fn heartbeat(
    state: &AppState,
    join_code: &str,
    player_id: i64,
) -> Result<(), AppError> {
    let join_code = join_code.to_owned();
    with_txn(&state.db, |txn| Box::pin(async move {
        let join_code = join_code.as_str();
        let room = repos::rooms::require_by_code(txn, join_code).await?;
        let seat = require_own_seat(txn, room.id, player_id)
            .await?
            .ok_or_else(|| {
                DomainError::not_found(NotFoundKind::Seat, "not seated in this room")
            })?;
        if seat.presence == SeatPresence::Disconnected {
            repos::seats::set_presence(txn, seat.id, SeatPresence::Connected, None).await?;
        }
        Ok(())
    }))
    .await
}

/// Start the grace period for the caller's seat.
pub async fn mark_disconnected(
    state: &AppState,
    join_code: &str,
    player_id: i64,
) -> Result<(), AppError> {
    let join_code = join_code.to_owned();
    let room_id = with_txn(&state.db, |txn| Box::pin(async move {
        let join_code = join_code.as_str();
        let room = repos::rooms::require_by_code(txn, join_code).await?;
        let seat = require_own_seat(txn, room.id, player_id)
            .await?
            .ok_or_else(|| {
                DomainError::not_found(NotFoundKind::Seat, "not seated in this room")
            })?;
        if seat.presence == SeatPresence::Connected {
            repos::seats::set_presence(
                txn,
                seat.id,
                SeatPresence::Disconnected,
                Some(OffsetDateTime::now_utc()),
            )
            .await?;
            tracing::info!(room_id = room.id, seat = seat.seat_idx, "seat disconnected");
        }
        Ok(room.id)
    }))
    .await?;

    state.hub.publish(RoomEvent {
        room_id,
        lock_version: 0,
        kind: RoomEventKind::SeatsChanged,
    });
    Ok(())
}

/// Explicit reconnect. Before promotion the seat simply returns to
/// connected; after promotion the identity observes as a spectator and
/// the bot keeps the seat for the rest of the match, so a returning
/// player can never race their own bot's in-flight move.
pub async fn reconnect(
    state: &AppState,
    join_code: &str,
    player_id: i64,
) -> Result<ReconnectResult, AppError> {
    let join_code = join_code.to_owned();
    let (room_id, result) = with_txn(&state.db, |txn| Box::pin(async move {
        let join_code = join_code.as_str();
        let room = repos::rooms::require_by_code(txn, join_code).await?;
        // Settle first: a reconnect arriving after the grace deadline is
        // a spectator reconnect even if no other access promoted us yet.
        settle_presence(txn, room.id, OffsetDateTime::now_utc()).await?;

        if let Some(seat) = require_own_seat(txn, room.id, player_id).await? {
            repos::seats::set_presence(txn, seat.id, SeatPresence::Connected, None).await?;
            return Ok((room.id, ReconnectResult { is_spectator: false }));
        }

        let taken_over = repos::seats::for_room(txn, room.id)
            .await?
            .into_iter()
            .find(|s| s.original_player_id == Some(player_id));
        match taken_over {
            Some(seat) => {
                repos::seats::mark_spectator(txn, seat.id).await?;
                tracing::info!(
                    room_id = room.id,
                    seat = seat.seat_idx,
                    player_id,
                    "reconnected as spectator after bot takeover"
                );
                Ok((room.id, ReconnectResult { is_spectator: true }))
            }
            None => Err(DomainError::not_found(
                NotFoundKind::Seat,
                "no seat for this player in the room",
            )
            .into()),
        }
    }))
    .await?;

    state.hub.publish(RoomEvent {
        room_id,
        lock_version: 0,
        kind: RoomEventKind::SeatsChanged,
    });
    Ok(result)
}
