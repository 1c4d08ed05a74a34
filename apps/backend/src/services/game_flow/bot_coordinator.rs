//! Bot coordinator: exactly one driver computes and submits moves for
//! bot-controlled seats in a room.
//!
//! Exclusivity comes from the expiry-based lease row, not from any
//! in-process state, so it holds across server instances and pooled
//! connections. The holder is normally the earliest-joined connected
//! human; the service identity drives rooms with no eligible human.
//! Every chosen move goes through the regular executor and is
//! re-validated there.

use time::OffsetDateTime;

use crate::ai::{self, BotMove};
use crate::auth::Actor;
use crate::db::txn::{retry_contended, with_txn};
use crate::domain::state::Phase;
use crate::entities::seats;
use crate::error::AppError;
use crate::errors::domain::DomainError;
use crate::repos;
use crate::services::game_flow::{player_actions, presence};
use crate::state::app_state::AppState;

/// Lease holder id recorded for the in-process service identity.
pub const SERVICE_HOLDER_ID: i64 = 0;

/// Stop a runaway drive loop well past the longest possible game.
const MAX_MOVES_PER_DRIVE: u32 = 208;

/// The identity permitted to coordinate this room's bots: the
/// earliest-joined connected human, falling back to the service.
pub(crate) fn eligible_holder(seats: &[seats::Model]) -> i64 {
    seats
        .iter()
        .filter(|s| {
            s.is_human
                && s.presence == seats::SeatPresence::Connected
                && s.player_id.is_some()
        })
        .min_by_key(|s| (s.joined_at, s.seat_idx))
        .and_then(|s| s.player_id)
        .unwrap_or(SERVICE_HOLDER_ID)
}

/// One drive iteration's read: whose turn it is and whether a bot should
/// move at all.
enum TurnOwner {
    Bot { seat_idx: u8, difficulty: i16 },
    Human,
    GameDone,
}

async fn peek_turn(state: &AppState, join_code: &str) -> Result<(i64, TurnOwner), AppError> {
    let join_code = join_code.to_owned();
    with_txn(&state.db, |txn| Box::pin(async move {
        let join_code = join_code.as_str();
        let now = OffsetDateTime::now_utc();
        let room = repos::rooms::require_by_code(txn, join_code).await?;
        // Promote overdue disconnected seats so their turns route here.
        presence::settle_presence(txn, room.id, now).await?;

        let Some(model) = repos::game_states::find_by_room(txn, room.id).await? else {
            return Ok((room.id, TurnOwner::GameDone));
        };
        let game = repos::game_states::to_domain(&model)?;
        if !matches!(game.phase, Phase::FirstPlay | Phase::Playing) {
            return Ok((room.id, TurnOwner::GameDone));
        }

        let seat = repos::seats::require_in_room(txn, room.id, game.turn).await?;
        let owner = if seat.is_human {
            TurnOwner::Human
        } else {
            TurnOwner::Bot {
                seat_idx: seat.seat_idx as u8,
                difficulty: seat.bot_difficulty.unwrap_or(1),
            }
        };
        Ok((room.id, owner))
    }))
    .await
}

/// Acquire (or renew) the room's lease and submit bot moves until a
/// human turn, game over, or lease loss. Returns the number of moves
/// submitted.
pub async fn drive_room(
    state: &AppState,
    join_code: &str,
    actor: Actor,
) -> Result<u32, AppError> {
    let holder_id = match actor {
        Actor::Service => SERVICE_HOLDER_ID,
        Actor::Player(id) => id,
    };

    // Acquire, checking eligibility for player actors.
    let join_code_owned = join_code.to_owned();
    let acquired = with_txn(&state.db, |txn| Box::pin(async move {
        let join_code = join_code_owned.as_str();
        let room = repos::rooms::require_by_code(txn, join_code).await?;
        if let Actor::Player(player_id) = actor {
            let seats = repos::seats::for_room(txn, room.id).await?;
            if eligible_holder(&seats) != player_id {
                return Err(DomainError::forbidden(
                    "not the eligible bot coordinator for this room",
                )
                .into());
            }
        }
        repos::leases::acquire(txn, room.id, holder_id, OffsetDateTime::now_utc()).await?;
        Ok(room.id)
    }))
    .await;
    let room_id = match acquired {
        Ok(id) => id,
        // A live lease elsewhere means someone is already driving.
        Err(err) if matches!(&err, AppError::Conflict { .. }) => {
            tracing::debug!(join_code, "bot drive skipped, lease held elsewhere");
            return Ok(0);
        }
        Err(err) => return Err(err),
    };

    let mut moves = 0u32;
    for _ in 0..MAX_MOVES_PER_DRIVE {
        let (_, owner) = peek_turn(state, join_code).await?;
        let (seat_idx, difficulty) = match owner {
            TurnOwner::Bot {
                seat_idx,
                difficulty,
            } => (seat_idx, difficulty),
            TurnOwner::Human | TurnOwner::GameDone => break,
        };

        // Read the state again for move selection; the executor
        // re-validates under the row lock, so a stale choice is simply
        // rejected as out of turn.
        let game = with_txn(&state.db, |txn| Box::pin(async move {
            let Some(model) = repos::game_states::find_by_room(txn, room_id).await? else {
                return Err(DomainError::not_found(
                    crate::errors::domain::NotFoundKind::GameState,
                    format!("no game state for room {room_id}"),
                )
                .into());
            };
            Ok(repos::game_states::to_domain(&model)?)
        }))
        .await?;
        let chosen = ai::choose_move(&game, seat_idx, difficulty);

        let submitted = retry_contended(|| async {
            match &chosen {
                BotMove::Play(cards) => {
                    player_actions::play_cards(state, join_code, seat_idx, cards, actor).await
                }
                BotMove::Pass => {
                    player_actions::pass_turn(state, join_code, seat_idx, actor).await
                }
            }
        })
        .await;

        match submitted {
            Ok(applied) => {
                moves += 1;
                if applied.game_over {
                    break;
                }
            }
            // Someone else applied a move first; re-peek and continue.
            Err(AppError::Validation { .. }) => continue,
            // Lease lost mid-loop.
            Err(AppError::Forbidden { .. }) => break,
            Err(err) => return Err(err),
        }

        // Renew on activity; losing the lease stops the loop.
        let renewed = with_txn(&state.db, |txn| Box::pin(async move {
            repos::leases::renew(txn, room_id, holder_id, OffsetDateTime::now_utc()).await?;
            Ok(())
        }))
        .await;
        if renewed.is_err() {
            tracing::info!(room_id, holder_id, "coordination lease lost, stopping drive");
            break;
        }
    }

    tracing::debug!(room_id, moves, "bot drive finished");
    Ok(moves)
}

#[cfg(test)]
mod tests {
    use time::OffsetDateTime;

    use super::*;
    use crate::entities::seats::SeatPresence;

    fn seat(idx: i16, player_id: Option<i64>, human: bool, presence: SeatPresence, joined_s: i64) -> seats::Model {
        let t = OffsetDateTime::from_unix_timestamp(1_700_000_000 + joined_s).unwrap();
        seats::Model {
            id: idx as i64 + 1,
            room_id: 1,
            seat_idx: idx,
            player_id,
            original_player_id: None,
            display_name: format!("seat{idx}"),
            is_human: human,
            bot_difficulty: if human { None } else { Some(1) },
            is_owner: idx == 0,
            presence,
            disconnected_at: None,
            is_spectator: false,
            joined_at: t,
            updated_at: t,
        }
    }

    #[test]
    fn earliest_connected_human_is_eligible() {
        let seats = vec![
            seat(0, Some(10), true, SeatPresence::Disconnected, 0),
            seat(1, Some(11), true, SeatPresence::Connected, 5),
            seat(2, Some(12), true, SeatPresence::Connected, 2),
            seat(3, None, false, SeatPresence::BotControlled, 0),
        ];
        assert_eq!(eligible_holder(&seats), 12);
    }

    #[test]
    fn all_bot_rooms_fall_back_to_the_service() {
        let seats = vec![
            seat(0, None, false, SeatPresence::BotControlled, 0),
            seat(1, None, false, SeatPresence::BotControlled, 0),
        ];
        assert_eq!(eligible_holder(&seats), SERVICE_HOLDER_ID);
    }
}
