//! Repository layer: narrow async functions over `ConnectionTrait` /
//! `DatabaseTransaction`. All writes happen inside a caller-owned
//! transaction (`db::txn::with_txn`).

pub mod game_states;
pub mod leases;
pub mod queue;
pub mod rooms;
pub mod seats;
