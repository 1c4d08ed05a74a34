//! Matchmaking queue routes.

use actix_web::{web, HttpResponse};
use serde::Deserialize;

use crate::entities::queue_entries::QueueMode;
use crate::error::AppError;
use crate::extractors::current_player::CurrentPlayer;
use crate::services::matchmaking;
use crate::state::app_state::AppState;

#[derive(Debug, Deserialize)]
struct FindMatchRequest {
    rating: i32,
    region: String,
    mode: QueueMode,
}

async fn find_match(
    state: web::Data<AppState>,
    player: CurrentPlayer,
    body: web::Json<FindMatchRequest>,
) -> Result<HttpResponse, AppError> {
    let attempt = matchmaking::find_match(
        &state,
        player.player_id,
        &player.name,
        body.rating,
        &body.region,
        body.mode,
    )
    .await?;
    Ok(HttpResponse::Ok().json(attempt))
}

async fn cancel_match(
    state: web::Data<AppState>,
    player: CurrentPlayer,
) -> Result<HttpResponse, AppError> {
    let removed = matchmaking::cancel_match(&state, player.player_id).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "removed": removed })))
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("", web::post().to(find_match))
        .route("", web::delete().to(cancel_match));
}
