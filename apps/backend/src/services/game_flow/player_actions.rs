//! The move executor: the only path by which hands, turn and phase are
//! mutated during play.
//!
//! Both operations run as one transaction: lock the game-state row
//! (NOWAIT), settle expired deadlines, authorize the actor for the seat,
//! run the domain transition, persist with a version bump, and publish a
//! feed event after commit. Duplicate submissions are handled by turn
//! re-validation: a retry arriving after the turn advanced is rejected
//! as out-of-turn, which is correct and side-effect free.

use serde::Serialize;
use time::OffsetDateTime;

use crate::auth::Actor;
use crate::db::txn::with_txn;
use crate::domain::state::Seat;
use crate::domain::{apply_pass, apply_play, Card};
use crate::error::AppError;
use crate::realtime::hub::{RoomEvent, RoomEventKind};
use crate::repos;
use crate::services::game_flow::{authorize_seat_actor, autopass, lifecycle, settle_due_timers};
use crate::state::app_state::AppState;

#[derive(Debug, Clone, Serialize)]
pub struct MoveApplied {
    pub room_id: i64,
    pub lock_version: i32,
    pub game_over: bool,
}

enum Move {
    Play(Vec<Card>),
    Pass,
}

async fn execute(
    state: &AppState,
    join_code: &str,
    seat_idx: u8,
    actor: Actor,
    mv: Move,
) -> Result<MoveApplied, AppError> {
    let join_code = join_code.to_owned();
    let (applied, result) = with_txn(&state.db, |txn| Box::pin(async move {
        let join_code = join_code.as_str();
        let now = OffsetDateTime::now_utc();
        let room = repos::rooms::require_by_code(txn, join_code).await?;
        let locked = repos::game_states::lock_for_room(txn, room.id).await?;
        let mut game = repos::game_states::to_domain(&locked)?;

        // Expired deadlines settle before any validation, so a move that
        // raced the auto-pass countdown sees the post-countdown state.
        settle_due_timers(txn, room.id, &mut game, now).await?;

        let seat = repos::seats::require_in_room(txn, room.id, seat_idx).await?;
        authorize_seat_actor(txn, room.id, &seat, actor, now).await?;

        let seat_no = seat_idx as Seat;
        let mut game_over = false;
        let mut result = None;
        match mv {
            Move::Play(cards) => {
                let outcome = apply_play(&mut game, seat_no, &cards)?;
                if outcome.unbeatable {
                    autopass::arm(&mut game, now);
                }
                if outcome.hand_emptied {
                    match lifecycle::conclude_match(txn, &room, &mut game, locked.rng_seed, seat_no)
                        .await?
                    {
                        lifecycle::MatchConclusion::NextMatchDealt => {}
                        lifecycle::MatchConclusion::GameOver(r) => {
                            game_over = true;
                            result = Some(r);
                        }
                    }
                }
            }
            Move::Pass => {
                apply_pass(&mut game, seat_no)?;
            }
        }

        let lock_version = repos::game_states::save(txn, &locked, &game, None).await?;
        tracing::debug!(
            room_id = room.id,
            seat = seat_no,
            actor = ?actor,
            lock_version,
            "move applied"
        );
        Ok((
            MoveApplied {
                room_id: room.id,
                lock_version,
                game_over,
            },
            result,
        ))
    }))
    .await?;

    state.hub.publish(RoomEvent {
        room_id: applied.room_id,
        lock_version: applied.lock_version,
        kind: if applied.game_over {
            RoomEventKind::GameOver
        } else {
            RoomEventKind::StateChanged
        },
    });

    // Fire-and-forget: the game is complete whether or not the stats
    // collaborator hears about it.
    if let Some(result) = result {
        let sink = state.results.clone();
        tokio::spawn(async move { sink.record_match_result(result).await });
    }

    Ok(applied)
}

/// Play `cards` for `seat_idx`. See module docs for the transaction
/// shape; arming of the auto-pass countdown happens here when the domain
/// reports the play unbeatable.
pub async fn play_cards(
    state: &AppState,
    join_code: &str,
    seat_idx: u8,
    cards: &[Card],
    actor: Actor,
) -> Result<MoveApplied, AppError> {
    execute(state, join_code, seat_idx, actor, Move::Play(cards.to_vec())).await
}

/// Pass the turn for `seat_idx`.
pub async fn pass_turn(
    state: &AppState,
    join_code: &str,
    seat_idx: u8,
    actor: Actor,
) -> Result<MoveApplied, AppError> {
    execute(state, join_code, seat_idx, actor, Move::Pass).await
}
