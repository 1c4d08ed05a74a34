//! Room and seat allocation.
//!
//! Concurrent joins to one room serialize on the per-room advisory lock
//! (`db::locks::seat_join_lock`), a scope independent of the game-state
//! row lock so lobby churn never contends with move throughput.

use sea_orm::DatabaseTransaction;
use serde::Serialize;
use time::{Duration, OffsetDateTime};

use crate::db::locks::seat_join_lock;
use crate::db::txn::with_txn;
use crate::entities::rooms::{RoomStatus, RoomVisibility};
use crate::entities::seats;
use crate::error::AppError;
use crate::errors::domain::{DomainError, ValidationKind};
use crate::errors::ErrorCode;
use crate::realtime::hub::{RoomEvent, RoomEventKind};
use crate::repos;
use crate::state::app_state::AppState;
use crate::utils::join_code::generate_join_code;

/// Empty waiting rooms older than this are reclaimed.
const WAITING_ROOM_TTL: Duration = Duration::hours(2);
/// Rooms stuck mid-start longer than this fall back to waiting.
const STARTING_ROOM_TTL: Duration = Duration::minutes(10);

const JOIN_CODE_ATTEMPTS: usize = 5;

#[derive(Debug, Clone, Serialize)]
pub struct SeatAssignment {
    pub room_id: i64,
    pub join_code: String,
    pub seat_idx: u8,
    pub is_owner: bool,
}

/// Seat `player_id` in `room` under the join lock. Handles every join
/// rejection case and the idempotent re-join.
async fn seat_player(
    txn: &DatabaseTransaction,
    room: &crate::entities::rooms::Model,
    player_id: i64,
    display_name: &str,
) -> Result<SeatAssignment, DomainError> {
    seat_join_lock(txn, &room.join_code).await?;

    let display_name = display_name.trim();
    if display_name.is_empty() {
        return Err(DomainError::validation(
            ValidationKind::EmptyName,
            "display name must not be blank",
        ));
    }
    if room.status == RoomStatus::Finished {
        return Err(DomainError::validation(
            ValidationKind::RoomNotJoinable,
            format!("room {} is finished", room.join_code),
        ));
    }

    let occupied = repos::seats::for_room(txn, room.id).await?;

    // Idempotent re-join: already seated here, return the existing seat.
    if let Some(seat) = occupied
        .iter()
        .find(|s| s.player_id == Some(player_id))
    {
        return Ok(SeatAssignment {
            room_id: room.id,
            join_code: room.join_code.clone(),
            seat_idx: seat.seat_idx as u8,
            is_owner: seat.is_owner,
        });
    }

    if let Some(elsewhere) = repos::seats::find_by_player(txn, player_id).await? {
        if elsewhere.room_id != room.id {
            return Err(DomainError::validation(
                ValidationKind::AlreadySeated,
                "already seated in another room",
            ));
        }
    }

    if occupied
        .iter()
        .any(|s| s.display_name.eq_ignore_ascii_case(display_name))
    {
        return Err(DomainError::validation(
            ValidationKind::NameTaken,
            format!("name {display_name} is taken in this room"),
        ));
    }

    // Lowest unused index, so a seat vacated mid-lobby is reusable.
    let seat_idx = (0..crate::domain::SEAT_COUNT as u8)
        .find(|idx| !occupied.iter().any(|s| s.seat_idx == *idx as i16))
        .ok_or_else(|| {
            DomainError::validation(
                ValidationKind::RoomFull,
                format!("room {} is full", room.join_code),
            )
        })?;

    let is_owner = occupied.is_empty();
    let seat = repos::seats::create(
        txn,
        repos::seats::SeatCreate {
            room_id: room.id,
            seat_idx,
            player_id: Some(player_id),
            display_name: display_name.to_string(),
            is_human: true,
            bot_difficulty: None,
            is_owner,
        },
    )
    .await?;

    tracing::info!(
        room_id = room.id,
        player_id,
        seat = seat.seat_idx,
        is_owner,
        "player seated"
    );
    Ok(SeatAssignment {
        room_id: room.id,
        join_code: room.join_code.clone(),
        seat_idx,
        is_owner,
    })
}

/// Allocate a room under a fresh join code, retrying collisions before
/// giving up. Every room creation path goes through here.
pub(crate) async fn allocate_room(
    txn: &DatabaseTransaction,
    visibility: RoomVisibility,
    is_matchmaking: bool,
    is_ranked: bool,
) -> Result<crate::entities::rooms::Model, AppError> {
    for _ in 0..JOIN_CODE_ATTEMPTS {
        let code = generate_join_code();
        if repos::rooms::find_by_code(txn, &code).await?.is_none() {
            let room =
                repos::rooms::create(txn, code, visibility, is_matchmaking, is_ranked).await?;
            return Ok(room);
        }
    }
    Err(AppError::conflict(
        ErrorCode::JoinCodeConflict,
        "could not allocate a unique join code",
    ))
}

/// Create a room and seat the creator as its owner.
pub async fn create_room(
    state: &AppState,
    player_id: i64,
    display_name: &str,
    visibility: RoomVisibility,
    is_ranked: bool,
) -> Result<SeatAssignment, AppError> {
    let display_name = display_name.to_owned();
    let assignment = with_txn(&state.db, |txn| Box::pin(async move {
        let display_name = display_name.as_str();
        let room = allocate_room(txn, visibility, false, is_ranked).await?;
        let assignment = seat_player(txn, &room, player_id, display_name).await?;
        Ok(assignment)
    }))
    .await?;

    state.hub.publish(RoomEvent {
        room_id: assignment.room_id,
        lock_version: 0,
        kind: RoomEventKind::SeatsChanged,
    });
    Ok(assignment)
}

pub async fn join_room(
    state: &AppState,
    join_code: &str,
    player_id: i64,
    display_name: &str,
) -> Result<SeatAssignment, AppError> {
    let join_code = join_code.to_owned();
    let display_name = display_name.to_owned();
    let assignment = with_txn(&state.db, |txn| Box::pin(async move {
        let join_code = join_code.as_str();
        let display_name = display_name.as_str();
        let room = repos::rooms::require_by_code(txn, join_code).await?;
        let assignment = seat_player(txn, &room, player_id, display_name).await?;
        Ok(assignment)
    }))
    .await?;

    state.hub.publish(RoomEvent {
        room_id: assignment.room_id,
        lock_version: 0,
        kind: RoomEventKind::SeatsChanged,
    });
    Ok(assignment)
}

/// Remove the caller's seat. Owner departure promotes the lowest-indexed
/// remaining human seat; the last seat leaving a non-playing room
/// reclaims it.
pub async fn leave_room(
    state: &AppState,
    join_code: &str,
    player_id: i64,
) -> Result<(), AppError> {
    let join_code = join_code.to_owned();
    let (room_id, reclaimed) = with_txn(&state.db, |txn| Box::pin(async move {
        let join_code = join_code.as_str();
        let room = repos::rooms::require_by_code(txn, join_code).await?;
        seat_join_lock(txn, &room.join_code).await?;

        let seats = repos::seats::for_room(txn, room.id).await?;
        let leaving = seats
            .iter()
            .find(|s| s.player_id == Some(player_id))
            .ok_or_else(|| {
                DomainError::not_found(
                    crate::errors::domain::NotFoundKind::Seat,
                    "not seated in this room",
                )
            })?;

        let was_owner = leaving.is_owner;
        repos::seats::delete(txn, leaving.id).await?;

        let remaining: Vec<&seats::Model> =
            seats.iter().filter(|s| s.id != leaving.id).collect();

        if remaining.is_empty() && room.status != RoomStatus::Playing {
            repos::rooms::delete(txn, room.id).await?;
            tracing::info!(room_id = room.id, "room reclaimed after last seat left");
            return Ok((room.id, true));
        }

        if was_owner {
            if let Some(next_owner) = remaining
                .iter()
                .filter(|s| s.is_human && s.player_id.is_some())
                .min_by_key(|s| s.seat_idx)
            {
                repos::seats::set_owner(txn, next_owner.id, true).await?;
                tracing::info!(
                    room_id = room.id,
                    seat = next_owner.seat_idx,
                    "ownership transferred"
                );
            }
        }
        Ok((room.id, false))
    }))
    .await?;

    if reclaimed {
        state.hub.forget(room_id);
    } else {
        state.hub.publish(RoomEvent {
            room_id,
            lock_version: 0,
            kind: RoomEventKind::SeatsChanged,
        });
    }
    Ok(())
}

/// Janitor pass, shared between the periodic hook and matchmaking's
/// pre-attempt sweep. Rooms are only deleted once no identity is seated;
/// a room stuck mid-start falls back to waiting instead.
pub(crate) async fn reclaim_in_txn(txn: &DatabaseTransaction) -> Result<u64, DomainError> {
    let now = OffsetDateTime::now_utc();
    let mut reclaimed = 0;

    for room in
        repos::rooms::stuck_in_status(txn, RoomStatus::Waiting, now - WAITING_ROOM_TTL).await?
    {
        if repos::rooms::seat_count(txn, room.id).await? == 0 {
            repos::rooms::delete(txn, room.id).await?;
            reclaimed += 1;
        }
    }

    for room in
        repos::rooms::stuck_in_status(txn, RoomStatus::Starting, now - STARTING_ROOM_TTL).await?
    {
        if repos::rooms::seat_count(txn, room.id).await? == 0 {
            repos::rooms::delete(txn, room.id).await?;
            reclaimed += 1;
        } else {
            repos::rooms::set_status(txn, room.id, RoomStatus::Waiting).await?;
        }
    }

    if reclaimed > 0 {
        tracing::info!(reclaimed, "stale rooms reclaimed");
    }
    Ok(reclaimed)
}

/// Periodic janitor entry point, invoked outside the request hot path.
pub async fn reclaim_stale_rooms(state: &AppState) -> Result<u64, AppError> {
    with_txn(&state.db, |txn| Box::pin(async move {
        Ok(reclaim_in_txn(txn).await?)
    }))
    .await
}

#[cfg(test)]
mod tests {
    use sea_orm::{DatabaseBackend, MockDatabase, TransactionTrait};

    use super::*;
    use crate::entities::rooms;

    fn existing_room(id: i64, code: &str) -> rooms::Model {
        let now = OffsetDateTime::from_unix_timestamp(1_700_000_000).unwrap();
        rooms::Model {
            id,
            join_code: code.to_string(),
            status: RoomStatus::Waiting,
            visibility: RoomVisibility::Private,
            is_matchmaking: false,
            is_ranked: false,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn room_allocation_retries_a_colliding_join_code() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![existing_room(1, "TAKEN1")]])
            .append_query_results([Vec::<rooms::Model>::new()])
            .append_query_results([vec![existing_room(2, "FRESH2")]])
            .into_connection();
        let txn = db.begin().await.unwrap();

        let room = allocate_room(&txn, RoomVisibility::Private, true, false)
            .await
            .unwrap();
        assert_eq!(room.id, 2);
    }

    #[tokio::test]
    async fn room_allocation_gives_up_after_repeated_collisions() {
        let collisions: Vec<Vec<rooms::Model>> = (0..JOIN_CODE_ATTEMPTS as i64)
            .map(|n| vec![existing_room(n + 1, "TAKEN")])
            .collect();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results(collisions)
            .into_connection();
        let txn = db.begin().await.unwrap();

        let err = allocate_room(&txn, RoomVisibility::Public, false, false)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict { .. }));
    }
}
