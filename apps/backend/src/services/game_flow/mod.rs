//! Game flow services: lifecycle, the move executor, presence, the
//! auto-pass timer and the bot coordinator.
//!
//! Shared here: seat authorization and lazy deadline settlement. Both
//! wall-clock timers (disconnect grace, auto-pass) are deadlines stored
//! in the database and settled inside the transaction of whichever
//! access touches the room next; no scheduled callback outlives a
//! request.

pub mod autopass;
pub mod bot_coordinator;
pub mod lifecycle;
pub mod player_actions;
pub mod presence;

use sea_orm::DatabaseTransaction;
use time::OffsetDateTime;

use crate::auth::Actor;
use crate::domain::state::GameState;
use crate::entities::seats;
use crate::errors::domain::DomainError;
use crate::repos;

/// May `actor` act for this seat right now?
///
/// Occupants act for their own seat; the lease-holding coordinator acts
/// for bot seats; the in-process service identity acts for any seat
/// (timeout passes). Checked before any state is touched.
pub(crate) async fn authorize_seat_actor(
    txn: &DatabaseTransaction,
    room_id: i64,
    seat: &seats::Model,
    actor: Actor,
    now: OffsetDateTime,
) -> Result<(), DomainError> {
    let player_id = match actor {
        Actor::Service => return Ok(()),
        Actor::Player(id) => id,
    };

    if seat.player_id == Some(player_id) {
        return Ok(());
    }

    if !seat.is_human {
        let lease = repos::leases::find(txn, room_id).await?;
        if let Some(lease) = lease {
            if lease.holder_player_id == player_id && lease.expires_at > now {
                return Ok(());
            }
        }
        return Err(DomainError::forbidden(format!(
            "player {player_id} does not hold the coordination lease for room {room_id}"
        )));
    }

    Err(DomainError::forbidden(format!(
        "player {player_id} does not own seat {}",
        seat.seat_idx
    )))
}

/// Settle every expired wall-clock deadline for the room before the
/// caller validates anything: overdue disconnect grace periods promote
/// seats to bot control, and an elapsed auto-pass countdown injects the
/// outstanding passes. Returns whether the domain state was mutated.
pub(crate) async fn settle_due_timers(
    txn: &DatabaseTransaction,
    room_id: i64,
    state: &mut GameState,
    now: OffsetDateTime,
) -> Result<bool, DomainError> {
    presence::settle_presence(txn, room_id, now).await?;
    autopass::fire_due(state, now)
}
