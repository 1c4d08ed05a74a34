//! Match scoring and the bust threshold.

/// Cumulative score at which a seat busts and the game ends.
pub const BUST_THRESHOLD: i32 = 101;

/// Penalty for a seat left holding `cards_left` cards when a match ends:
/// one point per card, doubled from 10 cards, tripled for a full hand.
pub fn match_penalty(cards_left: usize) -> i32 {
    let base = cards_left as i32;
    match cards_left {
        13 => base * 3,
        10..=12 => base * 2,
        _ => base,
    }
}
