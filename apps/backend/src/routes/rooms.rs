//! Room lifecycle, seating, gameplay and presence routes.

use actix_web::{web, HttpResponse};
use serde::Deserialize;

use crate::auth::Actor;
use crate::domain::try_parse_cards;
use crate::entities::rooms::RoomVisibility;
use crate::error::AppError;
use crate::extractors::current_player::CurrentPlayer;
use crate::services::game_flow::{bot_coordinator, lifecycle, player_actions, presence};
use crate::services::{rooms, snapshot};
use crate::state::app_state::AppState;

/// Bots may be on turn after any successful mutation; kick a drive on a
/// background task so the response never waits on bot play.
fn spawn_bot_drive(state: &web::Data<AppState>, join_code: &str) {
    let state = web::Data::clone(state);
    let join_code = join_code.to_string();
    tokio::spawn(async move {
        if let Err(err) = bot_coordinator::drive_room(&state, &join_code, Actor::Service).await {
            tracing::warn!(join_code, error = %err, "background bot drive failed");
        }
    });
}

#[derive(Debug, Deserialize)]
struct CreateRoomRequest {
    #[serde(default)]
    visibility: Option<RoomVisibility>,
    #[serde(default)]
    ranked: bool,
}

async fn create_room(
    state: web::Data<AppState>,
    player: CurrentPlayer,
    body: web::Json<CreateRoomRequest>,
) -> Result<HttpResponse, AppError> {
    let assignment = rooms::create_room(
        &state,
        player.player_id,
        &player.name,
        body.visibility.unwrap_or(RoomVisibility::Private),
        body.ranked,
    )
    .await?;
    Ok(HttpResponse::Created().json(assignment))
}

async fn get_room(
    state: web::Data<AppState>,
    player: CurrentPlayer,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let snapshot =
        snapshot::room_snapshot(&state, &path.into_inner(), Some(player.player_id)).await?;
    Ok(HttpResponse::Ok().json(snapshot))
}

async fn join_room(
    state: web::Data<AppState>,
    player: CurrentPlayer,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let assignment = rooms::join_room(
        &state,
        &path.into_inner(),
        player.player_id,
        &player.name,
    )
    .await?;
    Ok(HttpResponse::Ok().json(assignment))
}

async fn leave_room(
    state: web::Data<AppState>,
    player: CurrentPlayer,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    rooms::leave_room(&state, &path.into_inner(), player.player_id).await?;
    Ok(HttpResponse::NoContent().finish())
}

#[derive(Debug, Deserialize)]
struct StartGameRequest {
    #[serde(default)]
    bot_count: u8,
    #[serde(default = "default_bot_difficulty")]
    bot_difficulty: i16,
}

fn default_bot_difficulty() -> i16 {
    1
}

async fn start_game(
    state: web::Data<AppState>,
    player: CurrentPlayer,
    path: web::Path<String>,
    body: web::Json<StartGameRequest>,
) -> Result<HttpResponse, AppError> {
    let join_code = path.into_inner();
    let started = lifecycle::start_game(
        &state,
        &join_code,
        player.actor(),
        body.bot_count,
        body.bot_difficulty,
    )
    .await?;
    // The opening seat may already be a bot.
    spawn_bot_drive(&state, &join_code);
    Ok(HttpResponse::Ok().json(started))
}

#[derive(Debug, Deserialize)]
struct PlayRequest {
    seat_idx: u8,
    cards: Vec<String>,
}

async fn play_cards(
    state: web::Data<AppState>,
    player: CurrentPlayer,
    path: web::Path<String>,
    body: web::Json<PlayRequest>,
) -> Result<HttpResponse, AppError> {
    let join_code = path.into_inner();
    let cards = try_parse_cards(&body.cards)?;
    let applied =
        player_actions::play_cards(&state, &join_code, body.seat_idx, &cards, player.actor())
            .await?;
    if !applied.game_over {
        spawn_bot_drive(&state, &join_code);
    }
    Ok(HttpResponse::Ok().json(applied))
}

#[derive(Debug, Deserialize)]
struct PassRequest {
    seat_idx: u8,
}

async fn pass_turn(
    state: web::Data<AppState>,
    player: CurrentPlayer,
    path: web::Path<String>,
    body: web::Json<PassRequest>,
) -> Result<HttpResponse, AppError> {
    let join_code = path.into_inner();
    let applied =
        player_actions::pass_turn(&state, &join_code, body.seat_idx, player.actor()).await?;
    if !applied.game_over {
        spawn_bot_drive(&state, &join_code);
    }
    Ok(HttpResponse::Ok().json(applied))
}

async fn heartbeat(
    state: web::Data<AppState>,
    player: CurrentPlayer,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    presence::heartbeat(&state, &path.into_inner(), player.player_id).await?;
    Ok(HttpResponse::NoContent().finish())
}

async fn disconnect(
    state: web::Data<AppState>,
    player: CurrentPlayer,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    presence::mark_disconnected(&state, &path.into_inner(), player.player_id).await?;
    Ok(HttpResponse::NoContent().finish())
}

async fn reconnect(
    state: web::Data<AppState>,
    player: CurrentPlayer,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let join_code = path.into_inner();
    let result = presence::reconnect(&state, &join_code, player.player_id).await?;
    // A promoted seat may be on turn right now.
    spawn_bot_drive(&state, &join_code);
    Ok(HttpResponse::Ok().json(result))
}

/// Explicit drive request for the eligible coordinating client; other
/// callers are rejected while a live lease is held elsewhere.
async fn drive(
    state: web::Data<AppState>,
    player: CurrentPlayer,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let moves =
        bot_coordinator::drive_room(&state, &path.into_inner(), player.actor()).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "moves": moves })))
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("", web::post().to(create_room))
        .route("/{code}", web::get().to(get_room))
        .route("/{code}/join", web::post().to(join_room))
        .route("/{code}/leave", web::post().to(leave_room))
        .route("/{code}/start", web::post().to(start_game))
        .route("/{code}/play", web::post().to(play_cards))
        .route("/{code}/pass", web::post().to(pass_turn))
        .route("/{code}/heartbeat", web::post().to(heartbeat))
        .route("/{code}/disconnect", web::post().to(disconnect))
        .route("/{code}/reconnect", web::post().to(reconnect))
        .route("/{code}/drive", web::post().to(drive));
}
