//! Operational routes, meant to sit behind the deployment's internal
//! network boundary.

use actix_web::{web, HttpResponse};

use crate::error::AppError;
use crate::services::rooms;
use crate::state::app_state::AppState;

async fn reclaim(state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    let reclaimed = rooms::reclaim_stale_rooms(&state).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "reclaimed": reclaimed })))
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/reclaim", web::post().to(reclaim));
}
