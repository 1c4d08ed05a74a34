//! End-to-end shaped domain scenarios: full tricks over realistic deals.

use crate::domain::state::{next_seat, GameState, Phase, SEAT_COUNT};
use crate::domain::transition::{apply_pass, apply_play, begin_match};
use crate::domain::{deal, opening_seat, Card, THREE_OF_DIAMONDS};

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

/// One human opener and three passing bots: the opening single is played,
/// the three other seats pass in successor order, the trick clears and
/// the lead returns to the opener.
#[test]
fn opening_trick_passes_back_to_leader() {
    let mut state = dealt_state(1234);
    let leader = state.turn;
    assert!(state.hands[leader as usize].contains(&THREE_OF_DIAMONDS));

    apply_play(&mut state, leader, &[THREE_OF_DIAMONDS]).unwrap();
    assert_eq!(state.phase, Phase::Playing);
    assert_eq!(state.turn, next_seat(leader));

    let mut seat = state.turn;
    for i in 0..3 {
        let outcome = apply_pass(&mut state, seat).unwrap();
        assert_eq!(outcome.trick_cleared, i == 2, "pass {i}");
        seat = next_seat(seat);
    }

    assert_eq!(state.turn, leader);
    assert!(state.last_play.is_none());
    assert_eq!(state.pass_count, 0);
    assert_eq!(state.played, vec![THREE_OF_DIAMONDS]);
}

/// Playing the top remaining single reports unbeatable so the executor
/// can arm the auto-pass countdown.
#[test]
fn top_single_reports_unbeatable() {
    let mut state = dealt_state(77);
    let leader = state.turn;
    apply_play(&mut state, leader, &[THREE_OF_DIAMONDS]).unwrap();
    for _ in 0..3 {
        let turn = state.turn;
        apply_pass(&mut state, turn).unwrap();
    }

    // The leader now leads again; find the highest card across all hands
    // and hand it to the leader if a bot holds it.
    let top: Card = state
        .hands
        .iter()
        .flatten()
        .copied()
        .max()
        .unwrap();
    let holder = state
        .hands
        .iter()
        .position(|h| h.contains(&top))
        .unwrap();
    if holder != leader as usize {
        state.hands[holder].retain(|c| *c != top);
        state.hands[leader as usize].push(top);
        // Keep the conservation invariant: swap a card back.
        let give = state.hands[leader as usize][0];
        state.hands[leader as usize].retain(|c| *c != give);
        state.hands[holder].push(give);
    }

    let outcome = apply_play(&mut state, leader, &[top]).unwrap();
    assert!(outcome.unbeatable);
    assert!(!outcome.hand_emptied);
}
