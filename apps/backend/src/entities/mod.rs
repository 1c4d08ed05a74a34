pub mod bot_leases;
pub mod game_states;
pub mod queue_entries;
pub mod rooms;
pub mod seats;
