//! Explicit state transitions, invoked only by the move executor and the
//! lifecycle service. No storage-layer side effects: every phase change
//! happens in a named function here.

use super::cards::{Card, THREE_OF_DIAMONDS};
use super::combos::{classify, is_unbeatable};
use super::scoring::{match_penalty, BUST_THRESHOLD};
use super::state::{next_seat, GameState, Phase, Seat, TablePlay, SEAT_COUNT};
use crate::errors::domain::{DomainError, ValidationKind};

#[derive(Debug, Clone, PartialEq)]
pub struct PlayOutcome {
    /// The play emptied the acting hand; the caller must settle the match.
    pub hand_emptied: bool,
    /// No combination formable from the other hands can beat this play;
    /// the caller arms the auto-pass timer.
    pub unbeatable: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PassOutcome {
    /// Third consecutive pass: the table play was cleared and the next
    /// seat leads.
    pub trick_cleared: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MatchOutcome {
    /// Nobody busted; the caller deals a fresh match.
    NextMatch,
    /// A seat crossed the bust threshold; the room is done.
    GameOver { winner: Seat },
}

/// Reset per-match fields for a freshly dealt match. Scores, match
/// counter and winner records carry across.
pub fn begin_match(state: &mut GameState, hands: [Vec<Card>; SEAT_COUNT], opening: Seat) {
    state.hands = hands;
    state.played = Vec::new();
    state.last_play = None;
    state.pass_count = 0;
    state.turn = opening;
    state.phase = Phase::FirstPlay;
    state.auto_pass = None;
}

/// Validate and apply a play for `seat`.
///
/// Checks, in order: phase, turn, card ownership, combination shape,
/// 3♦ on the opening play, and strength against the table play. On
/// success the cards move from the hand to the play log, the turn
/// advances by the successor table and the pass counter resets.
pub fn apply_play(
    state: &mut GameState,
    seat: Seat,
    cards: &[Card],
) -> Result<PlayOutcome, DomainError> {
    state.require_phase(&[Phase::FirstPlay, Phase::Playing])?;
    state.require_turn(seat)?;

    let hand = state.hand(seat)?;
    for card in cards {
        if !hand.contains(card) {
            return Err(DomainError::validation(
                ValidationKind::CardNotInHand,
                format!("{card} is not in seat {seat}'s hand"),
            ));
        }
    }

    let combo = classify(cards)?;

    if state.phase == Phase::FirstPlay && !combo.cards.contains(&THREE_OF_DIAMONDS) {
        return Err(DomainError::validation(
            ValidationKind::IllegalFirstPlay,
            "opening play must include the 3 of diamonds",
        ));
    }

    if let Some(table) = &state.last_play {
        if !combo.beats(&table.combo) {
            return Err(DomainError::validation(
                ValidationKind::IllegalCombination,
                "play does not beat the table",
            ));
        }
    }

    let hand = &mut state.hands[seat as usize];
    hand.retain(|c| !combo.cards.contains(c));
    let hand_emptied = hand.is_empty();

    state.played.extend(combo.cards.iter().copied());
    state.pass_count = 0;
    // Any applied play supersedes a previously armed auto-pass.
    state.auto_pass = None;

    let unbeatable = !hand_emptied && is_unbeatable(&combo, &state.outstanding_cards(seat));
    state.last_play = Some(TablePlay { seat, combo });
    state.turn = next_seat(seat);
    state.phase = if hand_emptied {
        Phase::Finished
    } else {
        Phase::Playing
    };

    Ok(PlayOutcome {
        hand_emptied,
        unbeatable,
    })
}

/// Validate and apply a pass for `seat`. The leading seat may never
/// pass; the third consecutive pass clears the table play, so the
/// successor of the third passer (the trick winner) leads next.
pub fn apply_pass(state: &mut GameState, seat: Seat) -> Result<PassOutcome, DomainError> {
    state.require_phase(&[Phase::FirstPlay, Phase::Playing])?;
    state.require_turn(seat)?;

    if state.last_play.is_none() {
        return Err(DomainError::validation(
            ValidationKind::PassWhileLeading,
            "the leading seat may not pass",
        ));
    }

    state.pass_count += 1;
    let trick_cleared = state.pass_count >= 3;
    if trick_cleared {
        state.last_play = None;
        state.pass_count = 0;
        state.auto_pass = None;
    }
    state.turn = next_seat(seat);

    Ok(PassOutcome { trick_cleared })
}

/// Score a finished match: every other seat takes the remaining-card
/// penalty. A cumulative score at or past the bust threshold ends the
/// room; otherwise the caller deals the next match.
pub fn settle_match(state: &mut GameState, winner: Seat) -> MatchOutcome {
    for seat in 0..SEAT_COUNT {
        if seat != winner as usize {
            state.scores[seat] += match_penalty(state.hands[seat].len());
        }
    }
    state.last_match_winner = Some(winner);
    state.auto_pass = None;

    if state.scores.iter().any(|s| *s >= BUST_THRESHOLD) {
        let overall = state
            .scores
            .iter()
            .enumerate()
            .min_by_key(|(_, score)| **score)
            .map(|(seat, _)| seat as Seat)
            .unwrap_or(winner);
        state.phase = Phase::GameOver;
        state.game_winner = Some(overall);
        MatchOutcome::GameOver { winner: overall }
    } else {
        MatchOutcome::NextMatch
    }
}
