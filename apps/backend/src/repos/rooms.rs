//! Room repository.

use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue::Set, ConnectionTrait, DatabaseTransaction, PaginatorTrait, QueryOrder};
use time::OffsetDateTime;

use crate::entities::rooms::{self, RoomStatus, RoomVisibility};
use crate::entities::seats;
use crate::errors::domain::{DomainError, NotFoundKind};

pub async fn find_by_code<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    join_code: &str,
) -> Result<Option<rooms::Model>, DomainError> {
    let room = rooms::Entity::find()
        .filter(rooms::Column::JoinCode.eq(join_code))
        .one(conn)
        .await?;
    Ok(room)
}

pub async fn require_by_code<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    join_code: &str,
) -> Result<rooms::Model, DomainError> {
    find_by_code(conn, join_code).await?.ok_or_else(|| {
        DomainError::not_found(NotFoundKind::Room, format!("room {join_code} not found"))
    })
}

pub async fn create(
    txn: &DatabaseTransaction,
    join_code: String,
    visibility: RoomVisibility,
    is_matchmaking: bool,
    is_ranked: bool,
) -> Result<rooms::Model, DomainError> {
    let now = OffsetDateTime::now_utc();
    let room = rooms::ActiveModel {
        join_code: Set(join_code),
        status: Set(RoomStatus::Waiting),
        visibility: Set(visibility),
        is_matchmaking: Set(is_matchmaking),
        is_ranked: Set(is_ranked),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    Ok(room.insert(txn).await?)
}

pub async fn set_status(
    txn: &DatabaseTransaction,
    room_id: i64,
    status: RoomStatus,
) -> Result<(), DomainError> {
    let room = rooms::ActiveModel {
        id: Set(room_id),
        status: Set(status),
        updated_at: Set(OffsetDateTime::now_utc()),
        ..Default::default()
    };
    room.update(txn).await?;
    Ok(())
}

/// Delete a room; seats and game state follow via cascade.
pub async fn delete(txn: &DatabaseTransaction, room_id: i64) -> Result<(), DomainError> {
    rooms::Entity::delete_by_id(room_id).exec(txn).await?;
    Ok(())
}

pub async fn seat_count<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    room_id: i64,
) -> Result<u64, DomainError> {
    let count = seats::Entity::find()
        .filter(seats::Column::RoomId.eq(room_id))
        .count(conn)
        .await?;
    Ok(count)
}

/// Rooms sitting in `status` since before `cutoff`, oldest first.
/// Janitor input; the caller decides which are actually reclaimable.
pub async fn stuck_in_status<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    status: RoomStatus,
    cutoff: OffsetDateTime,
) -> Result<Vec<rooms::Model>, DomainError> {
    let stuck = rooms::Entity::find()
        .filter(rooms::Column::Status.eq(status))
        .filter(rooms::Column::UpdatedAt.lt(cutoff))
        .order_by_asc(rooms::Column::UpdatedAt)
        .all(conn)
        .await?;
    Ok(stuck)
}
