//! Auto-pass countdown for unbeatable plays.
//!
//! Armed by the executor when the domain reports an unbeatable play;
//! fired lazily during any later room access once the deadline elapses.
//! Any superseding play disarms it inside the domain transition, so a
//! crossed-wire client retry can neither re-arm nor double-fire.

use time::{Duration, OffsetDateTime};

use crate::domain::state::{AutoPass, GameState, Phase};
use crate::domain::transition::apply_pass;
use crate::errors::domain::DomainError;

pub const AUTO_PASS_DELAY: Duration = Duration::seconds(10);

/// Arm the countdown for the current table play. Call only after the
/// executor applied an unbeatable play.
pub fn arm(state: &mut GameState, now: OffsetDateTime) {
    if let Some(trigger) = state.last_play.clone() {
        state.auto_pass = Some(AutoPass {
            trigger,
            deadline: now + AUTO_PASS_DELAY,
        });
    }
}

/// Fire an elapsed countdown: pass every seat still required to act,
/// as the service identity, until the trick clears. Returns whether the
/// state was mutated.
pub fn fire_due(state: &mut GameState, now: OffsetDateTime) -> Result<bool, DomainError> {
    let due = match &state.auto_pass {
        Some(ap) => ap.deadline <= now,
        None => false,
    };
    if !due || state.phase != Phase::Playing {
        return Ok(false);
    }

    let winner = state.auto_pass.as_ref().map(|ap| ap.trigger.seat);
    loop {
        let outcome = apply_pass(state, state.turn)?;
        if outcome.trick_cleared {
            break;
        }
    }
    state.auto_pass = None;

    tracing::info!(winner = ?winner, "auto-pass fired, trick cleared");
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::state::SEAT_COUNT;
    use crate::domain::{apply_play, begin_match, deal, opening_seat, THREE_OF_DIAMONDS};

    fn armed_state(now: OffsetDateTime) -> GameState {
        let hands = deal(21, 1);
        let opening = opening_seat(&hands).unwrap();
        let mut state = GameState {
            phase: Phase::Dealing,
            hands: Default::default(),
            turn: 0,
            last_play: None,
            pass_count: 0,
            match_no: 1,
            scores: [0; SEAT_COUNT],
            played: Vec::new(),
            last_match_winner: None,
            game_winner: None,
            auto_pass: None,
        };
        begin_match(&mut state, hands, opening);
        let leader = state.turn;
        apply_play(&mut state, leader, &[THREE_OF_DIAMONDS]).unwrap();
        arm(&mut state, now);
        state
    }

    #[test]
    fn does_not_fire_before_the_deadline() {
        let now = OffsetDateTime::from_unix_timestamp(1_700_000_000).unwrap();
        let mut state = armed_state(now);
        assert!(!fire_due(&mut state, now + Duration::seconds(5)).unwrap());
        assert!(state.last_play.is_some());
    }

    #[test]
    fn fires_after_the_deadline_and_clears_the_trick() {
        let now = OffsetDateTime::from_unix_timestamp(1_700_000_000).unwrap();
        let mut state = armed_state(now);
        let leader = state.last_play.as_ref().unwrap().seat;

        assert!(fire_due(&mut state, now + AUTO_PASS_DELAY).unwrap());
        assert!(state.last_play.is_none());
        assert_eq!(state.pass_count, 0);
        assert_eq!(state.turn, leader);
        assert!(state.auto_pass.is_none());
    }

    #[test]
    fn firing_twice_is_a_no_op() {
        let now = OffsetDateTime::from_unix_timestamp(1_700_000_000).unwrap();
        let mut state = armed_state(now);
        assert!(fire_due(&mut state, now + AUTO_PASS_DELAY).unwrap());
        assert!(!fire_due(&mut state, now + AUTO_PASS_DELAY).unwrap());
    }

    #[test]
    fn disarmed_by_a_superseding_play() {
        let now = OffsetDateTime::from_unix_timestamp(1_700_000_000).unwrap();
        let mut state = armed_state(now);
        // A play that beats the table (possible here because the armed
        // trigger in this fixture is only the 3♦).
        let seat = state.turn;
        let card = *state.hands[seat as usize].last().unwrap();
        apply_play(&mut state, seat, &[card]).unwrap();
        assert!(state.auto_pass.is_none());
        assert!(!fire_due(&mut state, now + AUTO_PASS_DELAY).unwrap());
    }
}
