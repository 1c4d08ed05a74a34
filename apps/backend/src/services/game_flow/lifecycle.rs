//! Game lifecycle: starting a room and settling finished matches.

use rand::Rng;
use sea_orm::DatabaseTransaction;
use serde::Serialize;
use time::OffsetDateTime;

use crate::auth::Actor;
use crate::db::locks::seat_join_lock;
use crate::db::txn::with_txn;
use crate::domain::state::{GameState, Phase, Seat, SEAT_COUNT};
use crate::domain::{begin_match, deal, opening_seat, settle_match, MatchOutcome};
use crate::entities::rooms::{self, RoomStatus};
use crate::error::AppError;
use crate::errors::domain::{DomainError, InfraErrorKind, ValidationKind};
use crate::errors::ErrorCode;
use crate::realtime::hub::{RoomEvent, RoomEventKind};
use crate::repos;
use crate::services::results::{MatchResult, PlayerResult};
use crate::state::app_state::AppState;

const BOT_NAMES: [&str; 3] = ["Bot Ada", "Bot Ben", "Bot Cleo"];

#[derive(Debug, Clone, Serialize)]
pub struct StartedGame {
    pub room_id: i64,
    pub join_code: String,
    pub lock_version: i32,
}

/// Start a room: fill the empty seats with bots, deal from a fresh seed
/// and flip the room to playing, all in the caller's transaction.
///
/// Authorization: the room owner, or the service identity (matchmaking).
/// Ranked rooms reject bots; exactly four seats must be filled.
pub(crate) async fn start_in_txn(
    txn: &DatabaseTransaction,
    room: &rooms::Model,
    actor: Actor,
    bot_count: u8,
    bot_difficulty: i16,
) -> Result<i32, AppError> {
    seat_join_lock(txn, &room.join_code).await?;

    if !matches!(room.status, RoomStatus::Waiting | RoomStatus::Starting) {
        return Err(DomainError::validation(
            ValidationKind::PhaseMismatch,
            format!("room {} is not waiting to start", room.join_code),
        )
        .into());
    }

    let seats = repos::seats::for_room(txn, room.id).await?;

    if let Actor::Player(player_id) = actor {
        let is_owner = seats
            .iter()
            .any(|s| s.is_owner && s.player_id == Some(player_id));
        if !is_owner {
            return Err(DomainError::forbidden("only the room owner may start the game").into());
        }
    }

    if room.is_ranked && bot_count > 0 {
        return Err(AppError::bad_request(
            ErrorCode::RankedNoBots,
            "ranked rooms do not allow bot seats",
        ));
    }

    let mut occupied: Vec<u8> = seats.iter().map(|s| s.seat_idx as u8).collect();
    for n in 0..bot_count {
        let Some(seat_idx) =
            (0..SEAT_COUNT as u8).find(|idx| !occupied.contains(idx))
        else {
            break;
        };
        occupied.push(seat_idx);
        repos::seats::create(
            txn,
            repos::seats::SeatCreate {
                room_id: room.id,
                seat_idx,
                player_id: None,
                display_name: BOT_NAMES
                    .get(n as usize)
                    .copied()
                    .unwrap_or("Bot")
                    .to_string(),
                is_human: false,
                bot_difficulty: Some(bot_difficulty),
                is_owner: false,
            },
        )
        .await?;
    }

    if occupied.len() != SEAT_COUNT {
        return Err(AppError::bad_request(
            ErrorCode::ValidationError,
            format!("room needs {SEAT_COUNT} seated players, has {}", occupied.len()),
        ));
    }

    let rng_seed: i64 = rand::rng().random();
    let hands = deal(rng_seed as u64, 1);
    let opening = opening_seat(&hands).ok_or_else(|| {
        DomainError::infra(InfraErrorKind::Other("DEAL".into()), "deal lost the 3 of diamonds")
    })?;

    let mut game = GameState {
        phase: Phase::Dealing,
        hands: Default::default(),
        turn: 0,
        last_play: None,
        pass_count: 0,
        match_no: 1,
        scores: [0; SEAT_COUNT],
        played: Vec::new(),
        last_match_winner: None,
        game_winner: None,
        auto_pass: None,
    };
    begin_match(&mut game, hands, opening);

    // Re-initialise in place when the room is restarting; the row is
    // never deleted while the room exists.
    let lock_version = match repos::game_states::find_by_room(txn, room.id).await? {
        Some(_) => {
            let locked = repos::game_states::lock_for_room(txn, room.id).await?;
            repos::game_states::save(txn, &locked, &game, Some(rng_seed)).await?
        }
        None => {
            repos::game_states::create_for_room(txn, room.id, rng_seed, &game)
                .await?
                .lock_version
        }
    };

    repos::rooms::set_status(txn, room.id, RoomStatus::Playing).await?;
    tracing::info!(
        room_id = room.id,
        opening_seat = opening,
        bot_count,
        "game started"
    );
    Ok(lock_version)
}

pub async fn start_game(
    state: &AppState,
    join_code: &str,
    actor: Actor,
    bot_count: u8,
    bot_difficulty: i16,
) -> Result<StartedGame, AppError> {
    let join_code = join_code.to_owned();
    let started = with_txn(&state.db, |txn| Box::pin(async move {
        let join_code = join_code.as_str();
        let room = repos::rooms::require_by_code(txn, join_code).await?;
        let lock_version = start_in_txn(txn, &room, actor, bot_count, bot_difficulty).await?;
        Ok(StartedGame {
            room_id: room.id,
            join_code: room.join_code,
            lock_version,
        })
    }))
    .await?;

    state.hub.publish(RoomEvent {
        room_id: started.room_id,
        lock_version: started.lock_version,
        kind: RoomEventKind::StateChanged,
    });
    Ok(started)
}

/// A finished match was settled inside the executor's transaction; on
/// game over this carries what the result sink needs.
pub(crate) enum MatchConclusion {
    NextMatchDealt,
    GameOver(MatchResult),
}

/// Settle a match the executor just finished: apply penalties, then
/// either redeal the next match or close out the room.
pub(crate) async fn conclude_match(
    txn: &DatabaseTransaction,
    room: &rooms::Model,
    game: &mut GameState,
    rng_seed: i64,
    winner: Seat,
) -> Result<MatchConclusion, DomainError> {
    match settle_match(game, winner) {
        MatchOutcome::NextMatch => {
            game.match_no += 1;
            let hands = deal(rng_seed as u64, game.match_no);
            let opening = opening_seat(&hands).ok_or_else(|| {
                DomainError::infra(
                    InfraErrorKind::Other("DEAL".into()),
                    "deal lost the 3 of diamonds",
                )
            })?;
            begin_match(game, hands, opening);
            tracing::info!(
                room_id = room.id,
                match_no = game.match_no,
                match_winner = winner,
                "match settled, next match dealt"
            );
            Ok(MatchConclusion::NextMatchDealt)
        }
        MatchOutcome::GameOver { winner: overall } => {
            repos::rooms::set_status(txn, room.id, RoomStatus::Finished).await?;
            let players = repos::seats::for_room(txn, room.id)
                .await?
                .into_iter()
                .map(|s| PlayerResult {
                    seat: s.seat_idx as Seat,
                    player_id: s.player_id.or(s.original_player_id),
                    display_name: s.display_name,
                    score: game
                        .scores
                        .get(s.seat_idx as usize)
                        .copied()
                        .unwrap_or_default(),
                })
                .collect();
            tracing::info!(room_id = room.id, winner = overall, "game over");
            Ok(MatchConclusion::GameOver(MatchResult {
                room_id: room.id,
                players,
                winner: overall,
                duration: OffsetDateTime::now_utc() - room.created_at,
            }))
        }
    }
}
