//! Backend-issued HS256 access tokens carrying the player identity.
//!
//! Account management and login live outside this core; the board only
//! needs a verified `player_id` per request, plus the in-process service
//! identity used for system-triggered moves (timeout passes, auto-pass).

use std::time::{SystemTime, UNIX_EPOCH};

use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::state::security_config::SecurityConfig;
use crate::AppError;

/// Claims included in our backend-issued access tokens.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Player identity
    pub sub: i64,
    pub name: String,
    /// Issued-at (seconds since epoch)
    pub iat: i64,
    /// Expiry (seconds since epoch)
    pub exp: i64,
}

/// The identity on whose behalf a mutating procedure runs.
///
/// `Service` is never minted as a token; it exists in-process only, for
/// synthetic passes injected by the presence manager and auto-pass timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Actor {
    Player(i64),
    Service,
}

impl Actor {
    pub fn player_id(&self) -> Option<i64> {
        match self {
            Actor::Player(id) => Some(*id),
            Actor::Service => None,
        }
    }
}

/// Mint a HS256 JWT access token with a 24-hour TTL.
pub fn mint_access_token(
    player_id: i64,
    name: &str,
    now: SystemTime,
    security: &SecurityConfig,
) -> Result<String, AppError> {
    let iat = now
        .duration_since(UNIX_EPOCH)
        .map_err(|_| AppError::internal("Failed to get current time".to_string()))?
        .as_secs() as i64;

    let exp = iat + 24 * 60 * 60;

    let claims = Claims {
        sub: player_id,
        name: name.to_string(),
        iat,
        exp,
    };

    encode(
        &Header::new(security.algorithm),
        &claims,
        &EncodingKey::from_secret(&security.jwt_secret),
    )
    .map_err(|e| AppError::internal(format!("Failed to encode JWT: {e}")))
}

/// Verify JWT and return claims. Expiry is checked by the library.
pub fn verify_access_token(token: &str, security: &SecurityConfig) -> Result<Claims, AppError> {
    let validation = Validation::new(security.algorithm);

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(&security.jwt_secret),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|_| AppError::Unauthorized)
}

#[cfg(test)]
mod tests {
    use std::time::SystemTime;

    use super::*;

    #[test]
    fn mint_then_verify_round_trips_identity() {
        let security = SecurityConfig::for_tests();
        let token = mint_access_token(42, "Dana", SystemTime::now(), &security).unwrap();
        let claims = verify_access_token(&token, &security).unwrap();
        assert_eq!(claims.sub, 42);
        assert_eq!(claims.name, "Dana");
    }

    #[test]
    fn verify_rejects_garbage_token() {
        let security = SecurityConfig::for_tests();
        assert!(verify_access_token("not-a-token", &security).is_err());
    }

    #[test]
    fn verify_rejects_wrong_secret() {
        let security = SecurityConfig::for_tests();
        let other = SecurityConfig::new(b"a-different-secret");
        let token = mint_access_token(7, "Sam", SystemTime::now(), &security).unwrap();
        assert!(verify_access_token(&token, &other).is_err());
    }
}
