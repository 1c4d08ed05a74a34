//! Domain layer: pure Big Two game logic. Nothing in here touches the
//! database or the clock; deadlines are data, set and read by callers.

pub mod cards;
pub mod combos;
pub mod dealing;
pub mod scoring;
pub mod state;
pub mod transition;

#[cfg(test)]
mod tests_props;
#[cfg(test)]
mod tests_scenarios;
#[cfg(test)]
mod tests_transitions;

// Re-exports for ergonomics
pub use cards::{full_deck, try_parse_cards, Card, Rank, Suit, THREE_OF_DIAMONDS};
pub use combos::{classify, is_unbeatable, Combo, ComboKind};
pub use dealing::{deal, opening_seat};
pub use state::{next_seat, AutoPass, GameState, Phase, Seat, TablePlay, SEAT_COUNT, SUCCESSOR};
pub use transition::{
    apply_pass, apply_play, begin_match, settle_match, MatchOutcome, PassOutcome, PlayOutcome,
};
