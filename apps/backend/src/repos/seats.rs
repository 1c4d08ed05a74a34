//! Seat repository.

use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue::Set, ConnectionTrait, DatabaseTransaction, QueryOrder};
use time::OffsetDateTime;

use crate::entities::seats::{self, SeatPresence};
use crate::errors::domain::{DomainError, NotFoundKind};

pub async fn for_room<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    room_id: i64,
) -> Result<Vec<seats::Model>, DomainError> {
    let all = seats::Entity::find()
        .filter(seats::Column::RoomId.eq(room_id))
        .order_by_asc(seats::Column::SeatIdx)
        .all(conn)
        .await?;
    Ok(all)
}

pub async fn find_in_room<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    room_id: i64,
    seat_idx: u8,
) -> Result<Option<seats::Model>, DomainError> {
    let seat = seats::Entity::find()
        .filter(seats::Column::RoomId.eq(room_id))
        .filter(seats::Column::SeatIdx.eq(seat_idx as i16))
        .one(conn)
        .await?;
    Ok(seat)
}

pub async fn require_in_room<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    room_id: i64,
    seat_idx: u8,
) -> Result<seats::Model, DomainError> {
    find_in_room(conn, room_id, seat_idx).await?.ok_or_else(|| {
        DomainError::not_found(
            NotFoundKind::Seat,
            format!("seat {seat_idx} in room {room_id} not found"),
        )
    })
}

/// Any seat a player currently occupies, in any room. Occupancy means
/// `player_id` still points at them; a bot-taken seat does not count.
pub async fn find_by_player<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    player_id: i64,
) -> Result<Option<seats::Model>, DomainError> {
    let seat = seats::Entity::find()
        .filter(seats::Column::PlayerId.eq(player_id))
        .one(conn)
        .await?;
    Ok(seat)
}

pub struct SeatCreate {
    pub room_id: i64,
    pub seat_idx: u8,
    pub player_id: Option<i64>,
    pub display_name: String,
    pub is_human: bool,
    pub bot_difficulty: Option<i16>,
    pub is_owner: bool,
}

pub async fn create(
    txn: &DatabaseTransaction,
    dto: SeatCreate,
) -> Result<seats::Model, DomainError> {
    let now = OffsetDateTime::now_utc();
    let seat = seats::ActiveModel {
        room_id: Set(dto.room_id),
        seat_idx: Set(dto.seat_idx as i16),
        player_id: Set(dto.player_id),
        original_player_id: Set(None),
        display_name: Set(dto.display_name),
        is_human: Set(dto.is_human),
        bot_difficulty: Set(dto.bot_difficulty),
        is_owner: Set(dto.is_owner),
        presence: Set(SeatPresence::Connected),
        disconnected_at: Set(None),
        is_spectator: Set(false),
        joined_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    Ok(seat.insert(txn).await?)
}

pub async fn delete(txn: &DatabaseTransaction, seat_id: i64) -> Result<(), DomainError> {
    seats::Entity::delete_by_id(seat_id).exec(txn).await?;
    Ok(())
}

pub async fn set_owner(
    txn: &DatabaseTransaction,
    seat_id: i64,
    is_owner: bool,
) -> Result<(), DomainError> {
    let seat = seats::ActiveModel {
        id: Set(seat_id),
        is_owner: Set(is_owner),
        updated_at: Set(OffsetDateTime::now_utc()),
        ..Default::default()
    };
    seat.update(txn).await?;
    Ok(())
}

pub async fn set_presence(
    txn: &DatabaseTransaction,
    seat_id: i64,
    presence: SeatPresence,
    disconnected_at: Option<OffsetDateTime>,
) -> Result<(), DomainError> {
    let seat = seats::ActiveModel {
        id: Set(seat_id),
        presence: Set(presence),
        disconnected_at: Set(disconnected_at),
        updated_at: Set(OffsetDateTime::now_utc()),
        ..Default::default()
    };
    seat.update(txn).await?;
    Ok(())
}

/// Grace period elapsed: the seat stops being human and routes through
/// the bot coordinator. The original identity is remembered so a later
/// reconnect can be recognized.
pub async fn promote_to_bot(
    txn: &DatabaseTransaction,
    seat: &seats::Model,
    bot_difficulty: i16,
) -> Result<(), DomainError> {
    let update = seats::ActiveModel {
        id: Set(seat.id),
        player_id: Set(None),
        original_player_id: Set(seat.player_id),
        is_human: Set(false),
        bot_difficulty: Set(Some(bot_difficulty)),
        presence: Set(SeatPresence::BotControlled),
        disconnected_at: Set(None),
        updated_at: Set(OffsetDateTime::now_utc()),
        ..Default::default()
    };
    update.update(txn).await?;
    Ok(())
}

/// Reconnect after bot takeover: the identity observes as a spectator,
/// the seat stays bot-controlled.
pub async fn mark_spectator(
    txn: &DatabaseTransaction,
    seat_id: i64,
) -> Result<(), DomainError> {
    let update = seats::ActiveModel {
        id: Set(seat_id),
        is_spectator: Set(true),
        updated_at: Set(OffsetDateTime::now_utc()),
        ..Default::default()
    };
    update.update(txn).await?;
    Ok(())
}
