use crate::domain::cards::try_parse_cards;
use crate::domain::state::{next_seat, GameState, Phase, Seat, SEAT_COUNT};
use crate::domain::transition::{apply_pass, apply_play, begin_match, settle_match, MatchOutcome};
use crate::domain::{deal, opening_seat, Card};
use crate::errors::domain::{DomainError, ValidationKind};

fn hand(tokens: &[&str]) -> Vec<Card> {
    try_parse_cards(tokens.iter().copied()).unwrap()
}

/// A state with small, known hands. Seat 0 holds the 3♦ and leads.
fn fixture() -> GameState {
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
    begin_match(
        &mut state,
        [
            hand(&["3D", "5C", "9H"]),
            hand(&["4D", "8C", "KS"]),
            hand(&["6D", "TC", "AH"]),
            hand(&["7D", "JC", "2S"]),
        ],
        0,
    );
    state
}

fn assert_validation(result: Result<impl std::fmt::Debug, DomainError>, kind: ValidationKind) {
    match result {
        Err(DomainError::Validation(k, _)) => assert_eq!(k, kind),
        other => panic!("expected {kind:?}, got {other:?}"),
    }
}

#[test]
fn opening_play_must_include_three_of_diamonds() {
    let mut state = fixture();
    assert_validation(
        apply_play(&mut state, 0, &hand(&["5C"])),
        ValidationKind::IllegalFirstPlay,
    );
    let outcome = apply_play(&mut state, 0, &hand(&["3D"])).unwrap();
    assert!(!outcome.hand_emptied);
    assert_eq!(state.phase, Phase::Playing);
    assert_eq!(state.turn, next_seat(0));
    assert_eq!(state.played, hand(&["3D"]));
}

#[test]
fn out_of_turn_play_rejected() {
    let mut state = fixture();
    assert_validation(
        apply_play(&mut state, 1, &hand(&["4D"])),
        ValidationKind::OutOfTurn,
    );
}

#[test]
fn card_must_be_in_hand() {
    let mut state = fixture();
    assert_validation(
        apply_play(&mut state, 0, &hand(&["3C"])),
        ValidationKind::CardNotInHand,
    );
}

#[test]
fn play_must_beat_the_table() {
    let mut state = fixture();
    apply_play(&mut state, 0, &hand(&["3D"])).unwrap();
    // Seat 3 is next and holds only higher cards; a legal beat works.
    apply_play(&mut state, 3, &hand(&["7D"])).unwrap();
    // Seat 2 next: 6D does not beat 7D.
    assert_validation(
        apply_play(&mut state, 2, &hand(&["6D"])),
        ValidationKind::IllegalCombination,
    );
}

#[test]
fn leading_seat_may_not_pass() {
    let mut state = fixture();
    assert_validation(apply_pass(&mut state, 0), ValidationKind::PassWhileLeading);
}

#[test]
fn three_passes_clear_the_trick() {
    let mut state = fixture();
    apply_play(&mut state, 0, &hand(&["3D"])).unwrap();

    let mut seat: Seat = state.turn;
    for i in 0..3 {
        let outcome = apply_pass(&mut state, seat).unwrap();
        assert_eq!(outcome.trick_cleared, i == 2);
        seat = next_seat(seat);
    }
    assert!(state.last_play.is_none());
    assert_eq!(state.pass_count, 0);
    // The trick winner leads the next one.
    assert_eq!(state.turn, 0);
    // Leading again: anything goes.
    apply_play(&mut state, 0, &hand(&["9H"])).unwrap();
}

#[test]
fn pass_advances_turn_by_successor() {
    let mut state = fixture();
    apply_play(&mut state, 0, &hand(&["3D"])).unwrap();
    let acting = state.turn;
    apply_pass(&mut state, acting).unwrap();
    assert_eq!(state.turn, next_seat(acting));
}

#[test]
fn emptying_the_hand_finishes_the_match() {
    let mut state = fixture();
    state.hands[0] = hand(&["3D"]);
    let outcome = apply_play(&mut state, 0, &hand(&["3D"])).unwrap();
    assert!(outcome.hand_emptied);
    assert_eq!(state.phase, Phase::Finished);
}

#[test]
fn settle_match_applies_penalties() {
    let mut state = fixture();
    state.hands[0].clear();
    state.hands[1] = deal(1, 1)[0].clone(); // 13 cards
    state.hands[2] = hand(&["6D", "TC", "AH"]); // 3 cards
    state.hands[3] = state.hands[3][..2].to_vec(); // 2 cards

    let outcome = settle_match(&mut state, 0);
    assert_eq!(outcome, MatchOutcome::NextMatch);
    assert_eq!(state.scores, [0, 39, 3, 2]);
    assert_eq!(state.last_match_winner, Some(0));
}

#[test]
fn bust_ends_the_game_with_lowest_score_winning() {
    let mut state = fixture();
    state.scores = [70, 10, 40, 25];
    state.hands[1].clear();
    state.hands[0] = deal(2, 1)[0].clone(); // 13 left, 39 penalty: 70 -> 109

    let outcome = settle_match(&mut state, 1);
    assert_eq!(outcome, MatchOutcome::GameOver { winner: 1 });
    assert_eq!(state.phase, Phase::GameOver);
    assert_eq!(state.game_winner, Some(1));
}

#[test]
fn superseding_play_disarms_auto_pass() {
    use crate::domain::state::{AutoPass, TablePlay};
    use time::OffsetDateTime;

    let mut state = fixture();
    apply_play(&mut state, 0, &hand(&["3D"])).unwrap();
    let trigger = TablePlay {
        seat: 0,
        combo: crate::domain::classify(&hand(&["3D"])).unwrap(),
    };
    state.auto_pass = Some(AutoPass {
        trigger,
        deadline: OffsetDateTime::now_utc(),
    });

    let turn = state.turn;
    apply_play(&mut state, turn, &hand(&["7D"])).unwrap();
    assert!(state.auto_pass.is_none());
}

#[test]
fn unbeatable_single_is_reported() {
    let mut state = fixture();
    // Give seat 0 the top single alongside the 3♦ opener.
    state.hands[0] = hand(&["3D", "2S"]);
    apply_play(&mut state, 0, &hand(&["3D"])).unwrap();
    for _ in 0..3 {
        let turn = state.turn;
        apply_pass(&mut state, turn).unwrap();
    }
    let outcome = apply_play(&mut state, 0, &hand(&["2S"])).unwrap();
    // Hand emptied takes precedence over arming.
    assert!(outcome.hand_emptied);
    assert!(!outcome.unbeatable);
}

#[test]
fn begin_match_resets_per_match_fields() {
    let mut state = fixture();
    apply_play(&mut state, 0, &hand(&["3D"])).unwrap();
    state.scores = [5, 0, 0, 0];
    state.match_no = 2;

    let hands = deal(9, 2);
    let opening = opening_seat(&hands).unwrap();
    begin_match(&mut state, hands.clone(), opening);

    assert_eq!(state.phase, Phase::FirstPlay);
    assert_eq!(state.turn, opening);
    assert!(state.last_play.is_none());
    assert!(state.played.is_empty());
    assert_eq!(state.pass_count, 0);
    assert_eq!(state.hands, hands);
    // Carried across matches.
    assert_eq!(state.scores, [5, 0, 0, 0]);
    assert_eq!(state.match_no, 2);
}
