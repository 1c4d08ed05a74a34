//! Bot coordinator lease repository.
//!
//! The lease is a plain row with an expiry, swept and re-inserted inside
//! one transaction on every acquisition attempt. Expiry is the only
//! release path; a crashed holder simply stops renewing. Session-scoped
//! locks are deliberately not used here: with pooled connections a lock
//! can be acquired and released on different underlying sessions.

use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue::Set, ConnectionTrait, DatabaseTransaction};
use time::{Duration, OffsetDateTime};

use crate::entities::bot_leases;
use crate::errors::domain::{ConflictKind, DomainError};

/// How long a lease lives without renewal.
pub const LEASE_TTL: Duration = Duration::seconds(60);

pub async fn find<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    room_id: i64,
) -> Result<Option<bot_leases::Model>, DomainError> {
    let lease = bot_leases::Entity::find_by_id(room_id).one(conn).await?;
    Ok(lease)
}

/// Acquire the room's lease for `holder`. A live lease held by someone
/// else fails the attempt; re-acquiring one's own live lease renews it.
pub async fn acquire(
    txn: &DatabaseTransaction,
    room_id: i64,
    holder_player_id: i64,
    now: OffsetDateTime,
) -> Result<bot_leases::Model, DomainError> {
    // Sweep an expired lease first so the insert below can succeed.
    bot_leases::Entity::delete_many()
        .filter(bot_leases::Column::RoomId.eq(room_id))
        .filter(bot_leases::Column::ExpiresAt.lte(now))
        .exec(txn)
        .await?;

    if let Some(live) = find(txn, room_id).await? {
        if live.holder_player_id == holder_player_id {
            return renew(txn, room_id, holder_player_id, now).await;
        }
        return Err(DomainError::conflict(
            ConflictKind::LeaseHeld,
            format!(
                "room {room_id} lease held by player {} until {}",
                live.holder_player_id, live.expires_at
            ),
        ));
    }

    let lease = bot_leases::ActiveModel {
        room_id: Set(room_id),
        holder_player_id: Set(holder_player_id),
        acquired_at: Set(now),
        expires_at: Set(now + LEASE_TTL),
    };
    match lease.insert(txn).await {
        Ok(model) => Ok(model),
        // Insert raced a concurrent acquirer; the PK violation means a
        // live lease now exists.
        Err(err) => match DomainError::from(err) {
            DomainError::Conflict(_, _) => Err(DomainError::conflict(
                ConflictKind::LeaseHeld,
                format!("room {room_id} lease acquired concurrently"),
            )),
            other => Err(other),
        },
    }
}

/// Extend a lease the caller still holds.
pub async fn renew(
    txn: &DatabaseTransaction,
    room_id: i64,
    holder_player_id: i64,
    now: OffsetDateTime,
) -> Result<bot_leases::Model, DomainError> {
    let lease = find(txn, room_id).await?;
    match lease {
        Some(live) if live.holder_player_id == holder_player_id && live.expires_at > now => {
            let update = bot_leases::ActiveModel {
                room_id: Set(room_id),
                expires_at: Set(now + LEASE_TTL),
                ..Default::default()
            };
            Ok(update.update(txn).await?)
        }
        _ => Err(DomainError::conflict(
            ConflictKind::LeaseHeld,
            format!("room {room_id} lease not held by player {holder_player_id}"),
        )),
    }
}
