//! Read-side room snapshot: full own hand for the viewer, counts only
//! for everyone else.

use serde::Serialize;
use time::OffsetDateTime;

use crate::domain::state::{Phase, Seat, TablePlay, SEAT_COUNT};
use crate::domain::Card;
use crate::entities::rooms::{RoomStatus, RoomVisibility};
use crate::entities::seats::SeatPresence;
use crate::error::AppError;
use crate::repos;
use crate::state::app_state::AppState;

#[derive(Debug, Clone, Serialize)]
pub struct SeatView {
    pub seat_idx: u8,
    pub display_name: String,
    pub is_human: bool,
    pub is_owner: bool,
    pub presence: SeatPresence,
    pub is_spectator: bool,
    pub is_you: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct GameView {
    pub phase: Phase,
    pub turn: Seat,
    pub last_play: Option<TablePlay>,
    pub pass_count: u8,
    pub match_no: u8,
    pub scores: [i32; SEAT_COUNT],
    pub hand_counts: [usize; SEAT_COUNT],
    /// The viewer's own cards; absent for spectators and outsiders.
    pub your_seat: Option<u8>,
    pub your_hand: Option<Vec<Card>>,
    pub last_match_winner: Option<Seat>,
    pub game_winner: Option<Seat>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub auto_pass_deadline: Option<OffsetDateTime>,
    pub lock_version: i32,
}

#[derive(Debug, Clone, Serialize)]
pub struct RoomSnapshot {
    pub room_id: i64,
    pub join_code: String,
    pub status: RoomStatus,
    pub visibility: RoomVisibility,
    pub is_matchmaking: bool,
    pub is_ranked: bool,
    pub seats: Vec<SeatView>,
    pub game: Option<GameView>,
}

/// Build the viewer-specific snapshot. Plain reads, no locks: the writer
/// path keeps every committed row internally consistent.
pub async fn room_snapshot(
    state: &AppState,
    join_code: &str,
    viewer: Option<i64>,
) -> Result<RoomSnapshot, AppError> {
    let db = &state.db;
    let room = repos::rooms::require_by_code(db, join_code).await?;
    let seats = repos::seats::for_room(db, room.id).await?;

    let your_seat = viewer.and_then(|player_id| {
        seats
            .iter()
            .find(|s| s.player_id == Some(player_id) && !s.is_spectator)
            .map(|s| s.seat_idx as u8)
    });

    let seat_views = seats
        .iter()
        .map(|s| SeatView {
            seat_idx: s.seat_idx as u8,
            display_name: s.display_name.clone(),
            is_human: s.is_human,
            is_owner: s.is_owner,
            presence: s.presence,
            is_spectator: s.is_spectator,
            is_you: viewer.is_some() && s.player_id == viewer,
        })
        .collect();

    let game = match repos::game_states::find_by_room(db, room.id).await? {
        Some(model) => {
            let game = repos::game_states::to_domain(&model)?;
            let mut hand_counts = [0usize; SEAT_COUNT];
            for (idx, hand) in game.hands.iter().enumerate() {
                hand_counts[idx] = hand.len();
            }
            let your_hand =
                your_seat.map(|seat| game.hands[seat as usize].clone());
            Some(GameView {
                phase: game.phase,
                turn: game.turn,
                last_play: game.last_play,
                pass_count: game.pass_count,
                match_no: game.match_no,
                scores: game.scores,
                hand_counts,
                your_seat,
                your_hand,
                last_match_winner: game.last_match_winner,
                game_winner: game.game_winner,
                auto_pass_deadline: game.auto_pass.map(|ap| ap.deadline),
                lock_version: model.lock_version,
            })
        }
        None => None,
    };

    Ok(RoomSnapshot {
        room_id: room.id,
        join_code: room.join_code,
        status: room.status,
        visibility: room.visibility,
        is_matchmaking: room.is_matchmaking,
        is_ranked: room.is_ranked,
        seats: seat_views,
        game,
    })
}
