//! Server-sent events feed for a room.
//!
//! Events are thin change notifications; clients refetch the snapshot
//! when one arrives. A lagged subscriber loses old notifications, never
//! state, so drops are skipped silently.

use std::convert::Infallible;

use actix_web::{web, HttpResponse};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;

use crate::error::AppError;
use crate::extractors::current_player::CurrentPlayer;
use crate::repos;
use crate::state::app_state::AppState;

async fn feed(
    state: web::Data<AppState>,
    _player: CurrentPlayer,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let room = repos::rooms::require_by_code(&state.db, &path.into_inner()).await?;
    let rx = state.hub.subscribe(room.id);

    let stream = BroadcastStream::new(rx).filter_map(|item| {
        let event = item.ok()?;
        let json = serde_json::to_string(&event).ok()?;
        Some(Ok::<_, Infallible>(web::Bytes::from(format!(
            "data: {json}\n\n"
        ))))
    });

    Ok(HttpResponse::Ok()
        .content_type("text/event-stream")
        .insert_header(("Cache-Control", "no-cache"))
        .streaming(stream))
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/{code}/feed", web::get().to(feed));
}
