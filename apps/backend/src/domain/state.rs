//! Pure per-room game state and the seat successor order.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::cards::Card;
use super::combos::Combo;
use crate::errors::domain::{DomainError, ValidationKind};

pub type Seat = u8;

pub const SEAT_COUNT: usize = 4;

/// Fixed anticlockwise successor table for the physical seating. Every
/// component that advances the turn (play, pass, timeout-pass) goes
/// through [`next_seat`]; nothing may compute `(s + 1) % 4`.
pub const SUCCESSOR: [Seat; SEAT_COUNT] = [3, 0, 1, 2];

pub fn next_seat(seat: Seat) -> Seat {
    SUCCESSOR[seat as usize % SEAT_COUNT]
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Dealing,
    FirstPlay,
    Playing,
    Finished,
    GameOver,
}

/// The combination currently on the table and the seat that put it there.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TablePlay {
    pub seat: Seat,
    pub combo: Combo,
}

/// Armed when the table play is unbeatable: the remaining seats are
/// auto-passed once `deadline` elapses, unless a play supersedes it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutoPass {
    pub trigger: TablePlay,
    #[serde(with = "time::serde::rfc3339")]
    pub deadline: OffsetDateTime,
}

/// Canonical per-room state. One instance per room, re-initialised in
/// place between matches.
///
/// Invariant: hands are pairwise disjoint and, together with `played`,
/// partition the 52-card deck for the current match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    pub phase: Phase,
    pub hands: [Vec<Card>; SEAT_COUNT],
    pub turn: Seat,
    pub last_play: Option<TablePlay>,
    pub pass_count: u8,
    pub match_no: u8,
    pub scores: [i32; SEAT_COUNT],
    /// Cards played so far in the current match, in play order.
    pub played: Vec<Card>,
    pub last_match_winner: Option<Seat>,
    pub game_winner: Option<Seat>,
    pub auto_pass: Option<AutoPass>,
}

impl GameState {
    pub fn require_phase(&self, expected: &[Phase]) -> Result<(), DomainError> {
        if expected.contains(&self.phase) {
            Ok(())
        } else {
            Err(DomainError::validation(
                ValidationKind::PhaseMismatch,
                format!("phase is {:?}", self.phase),
            ))
        }
    }

    pub fn require_turn(&self, seat: Seat) -> Result<(), DomainError> {
        if self.turn == seat {
            Ok(())
        } else {
            Err(DomainError::validation(
                ValidationKind::OutOfTurn,
                format!("turn is seat {}, not seat {seat}", self.turn),
            ))
        }
    }

    pub fn hand(&self, seat: Seat) -> Result<&Vec<Card>, DomainError> {
        self.hands.get(seat as usize).ok_or_else(|| {
            DomainError::validation(ValidationKind::Other("BadSeat".into()), format!("seat {seat}"))
        })
    }

    /// All cards currently held by seats other than `seat`.
    pub fn outstanding_cards(&self, seat: Seat) -> Vec<Card> {
        self.hands
            .iter()
            .enumerate()
            .filter(|(idx, _)| *idx != seat as usize)
            .flat_map(|(_, hand)| hand.iter().copied())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn successor_table_is_a_single_cycle() {
        let mut seen = [false; SEAT_COUNT];
        let mut seat: Seat = 0;
        for _ in 0..SEAT_COUNT {
            assert!(!seen[seat as usize]);
            seen[seat as usize] = true;
            seat = next_seat(seat);
        }
        assert_eq!(seat, 0);
        assert!(seen.iter().all(|s| *s));
    }

    #[test]
    fn successor_is_not_modular_increment() {
        assert_ne!(next_seat(0), 1);
        assert_eq!(next_seat(0), 3);
        assert_eq!(next_seat(3), 2);
        assert_eq!(next_seat(2), 1);
        assert_eq!(next_seat(1), 0);
    }
}
