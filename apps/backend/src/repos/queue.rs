//! Matchmaking queue repository.

use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue::Set, ConnectionTrait, DatabaseTransaction, QueryOrder};
use time::OffsetDateTime;

use crate::entities::queue_entries::{self, QueueMode};
use crate::errors::domain::DomainError;

/// All entries, oldest first. Match selection is a pure function over
/// this ordering.
pub async fn list_ordered<C: ConnectionTrait + Send + Sync>(
    conn: &C,
) -> Result<Vec<queue_entries::Model>, DomainError> {
    let all = queue_entries::Entity::find()
        .order_by_asc(queue_entries::Column::EnqueuedAt)
        .order_by_asc(queue_entries::Column::Id)
        .all(conn)
        .await?;
    Ok(all)
}

pub async fn find_by_player<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    player_id: i64,
) -> Result<Option<queue_entries::Model>, DomainError> {
    let entry = queue_entries::Entity::find()
        .filter(queue_entries::Column::PlayerId.eq(player_id))
        .one(conn)
        .await?;
    Ok(entry)
}

/// Idempotent enqueue: an existing entry keeps its place in line.
pub async fn enqueue(
    txn: &DatabaseTransaction,
    player_id: i64,
    display_name: String,
    rating: i32,
    region: String,
    mode: QueueMode,
) -> Result<queue_entries::Model, DomainError> {
    if let Some(existing) = find_by_player(txn, player_id).await? {
        return Ok(existing);
    }
    let entry = queue_entries::ActiveModel {
        player_id: Set(player_id),
        display_name: Set(display_name),
        rating: Set(rating),
        region: Set(region),
        mode: Set(mode),
        enqueued_at: Set(OffsetDateTime::now_utc()),
        ..Default::default()
    };
    Ok(entry.insert(txn).await?)
}

pub async fn remove_by_player(
    txn: &DatabaseTransaction,
    player_id: i64,
) -> Result<bool, DomainError> {
    let result = queue_entries::Entity::delete_many()
        .filter(queue_entries::Column::PlayerId.eq(player_id))
        .exec(txn)
        .await?;
    Ok(result.rows_affected > 0)
}

/// Remove a matched set as a unit. The caller has already decided the
/// four belong together; a partial removal must not happen.
pub async fn remove_entries(
    txn: &DatabaseTransaction,
    ids: &[i64],
) -> Result<(), DomainError> {
    queue_entries::Entity::delete_many()
        .filter(queue_entries::Column::Id.is_in(ids.iter().copied()))
        .exec(txn)
        .await?;
    Ok(())
}

/// Drop entries enqueued before `cutoff`.
pub async fn purge_stale(
    txn: &DatabaseTransaction,
    cutoff: OffsetDateTime,
) -> Result<u64, DomainError> {
    let result = queue_entries::Entity::delete_many()
        .filter(queue_entries::Column::EnqueuedAt.lt(cutoff))
        .exec(txn)
        .await?;
    Ok(result.rows_affected)
}
