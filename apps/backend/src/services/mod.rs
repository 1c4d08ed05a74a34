//! Service layer: transactional procedures over repos and the domain.

pub mod game_flow;
pub mod matchmaking;
pub mod results;
pub mod rooms;
pub mod snapshot;
