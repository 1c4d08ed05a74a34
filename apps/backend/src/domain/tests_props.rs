//! Property tests: card conservation and turn legality over random
//! sequences of legal moves.

use std::collections::HashSet;

use proptest::prelude::*;

use crate::domain::state::{next_seat, GameState, Phase, SEAT_COUNT};
use crate::domain::transition::{apply_pass, apply_play, begin_match};
use crate::domain::{classify, deal, opening_seat, Card, THREE_OF_DIAMONDS};

fn dealt_state(seed: u64) -> GameState {
    let hands = deal(seed, 1);
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
    state
}

fn assert_conserved(state: &GameState) {
    let held: usize = state.hands.iter().map(|h| h.len()).sum();
    assert_eq!(held + state.played.len(), 52);

    let mut seen: HashSet<Card> = HashSet::new();
    for card in state.hands.iter().flatten().chain(state.played.iter()) {
        assert!(seen.insert(*card), "card {card} appears twice");
    }
}

/// Singles from the current hand that would be legal now, lowest first.
fn legal_singles(state: &GameState) -> Vec<Card> {
    let hand = &state.hands[state.turn as usize];
    hand.iter()
        .copied()
        .filter(|card| {
            if state.phase == Phase::FirstPlay {
                return *card == THREE_OF_DIAMONDS;
            }
            match &state.last_play {
                None => true,
                Some(table) => {
                    let combo = classify(&[*card]).unwrap();
                    combo.beats(&table.combo)
                }
            }
        })
        .collect()
}

proptest! {
    /// Drive a match with arbitrary (but legal) single-card moves and
    /// passes. Conservation and successor-order turn advancement must
    /// hold after every applied move.
    #[test]
    fn random_games_conserve_cards_and_turn_order(
        seed in any::<u64>(),
        choices in proptest::collection::vec(any::<u8>(), 200),
    ) {
        let mut state = dealt_state(seed);
        assert_conserved(&state);

        for choice in choices {
            if state.phase == Phase::Finished {
                break;
            }
            let acting = state.turn;
            let singles = legal_singles(&state);
            let can_pass = state.last_play.is_some();

            let options = singles.len() + usize::from(can_pass);
            prop_assert!(options > 0, "no legal move for seat {}", acting);
            let pick = choice as usize % options;

            if pick < singles.len() {
                apply_play(&mut state, acting, &[singles[pick]]).unwrap();
            } else {
                let outcome = apply_pass(&mut state, acting).unwrap();
                if outcome.trick_cleared {
                    prop_assert!(state.last_play.is_none());
                    prop_assert_eq!(state.pass_count, 0);
                }
            }

            prop_assert_eq!(state.turn, next_seat(acting));
            assert_conserved(&state);
        }
    }

    /// A move by any seat other than the turn holder never succeeds.
    #[test]
    fn off_turn_moves_never_succeed(seed in any::<u64>(), offset in 1u8..4) {
        let mut state = dealt_state(seed);
        let wrong = (state.turn + offset) % 4;
        let card = state.hands[wrong as usize][0];
        prop_assert!(apply_play(&mut state, wrong, &[card]).is_err());
        prop_assert!(apply_pass(&mut state, wrong).is_err());
    }
}
