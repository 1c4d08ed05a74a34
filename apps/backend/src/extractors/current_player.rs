//! Actix extractor that turns a Bearer token into the acting player.

use std::future::{ready, Ready};

use actix_web::{web, FromRequest, HttpRequest};

use crate::auth::{verify_access_token, Actor, Claims};
use crate::error::AppError;
use crate::state::app_state::AppState;

/// The authenticated player for this request.
#[derive(Debug, Clone)]
pub struct CurrentPlayer {
    pub player_id: i64,
    pub name: String,
}

impl CurrentPlayer {
    pub fn actor(&self) -> Actor {
        Actor::Player(self.player_id)
    }
}

impl From<Claims> for CurrentPlayer {
    fn from(claims: Claims) -> Self {
        Self {
            player_id: claims.sub,
            name: claims.name,
        }
    }
}

impl FromRequest for CurrentPlayer {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut actix_web::dev::Payload) -> Self::Future {
        ready(extract(req))
    }
}

fn extract(req: &HttpRequest) -> Result<CurrentPlayer, AppError> {
    let state = req
        .app_data::<web::Data<AppState>>()
        .ok_or_else(|| AppError::internal("AppState missing from request"))?;

    let header = req
        .headers()
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .ok_or(AppError::Unauthorized)?;

    let token = header.strip_prefix("Bearer ").ok_or(AppError::Unauthorized)?;

    let claims = verify_access_token(token, &state.security)?;
    Ok(CurrentPlayer::from(claims))
}
