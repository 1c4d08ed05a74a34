//! Core card types: `Card`, `Rank`, `Suit`, ordered for Big Two.

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::errors::domain::{DomainError, ValidationKind};

/// Suit order is Diamonds < Clubs < Hearts < Spades.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum Suit {
    Diamonds,
    Clubs,
    Hearts,
    Spades,
}

/// Rank order is Three < Four < ... < Ace < Two (Two is the highest rank).
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum Rank {
    Three,
    Four,
    Five,
    Six,
    Seven,
    Eight,
    Nine,
    Ten,
    Jack,
    Queen,
    King,
    Ace,
    Two,
}

impl Rank {
    /// Position in rank order, 0 (Three) through 12 (Two).
    pub fn index(self) -> u8 {
        self as u8
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct Card {
    pub rank: Rank,
    pub suit: Suit,
}

/// Total order: rank first, suit breaks ties. This IS the game comparison
/// for singles, so unlike a display ordering it is safe for rule logic.
impl Ord for Card {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        match self.rank.cmp(&other.rank) {
            std::cmp::Ordering::Equal => self.suit.cmp(&other.suit),
            ord => ord,
        }
    }
}

impl PartialOrd for Card {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

/// The card that must lead the opening trick of every match.
pub const THREE_OF_DIAMONDS: Card = Card {
    rank: Rank::Three,
    suit: Suit::Diamonds,
};

const RANKS: [Rank; 13] = [
    Rank::Three,
    Rank::Four,
    Rank::Five,
    Rank::Six,
    Rank::Seven,
    Rank::Eight,
    Rank::Nine,
    Rank::Ten,
    Rank::Jack,
    Rank::Queen,
    Rank::King,
    Rank::Ace,
    Rank::Two,
];

const SUITS: [Suit; 4] = [Suit::Diamonds, Suit::Clubs, Suit::Hearts, Suit::Spades];

/// The 52 distinct cards, in rank-then-suit order.
pub fn full_deck() -> Vec<Card> {
    let mut deck = Vec::with_capacity(52);
    for rank in RANKS {
        for suit in SUITS {
            deck.push(Card { rank, suit });
        }
    }
    deck
}

fn rank_char(rank: Rank) -> char {
    match rank {
        Rank::Two => '2',
        Rank::Three => '3',
        Rank::Four => '4',
        Rank::Five => '5',
        Rank::Six => '6',
        Rank::Seven => '7',
        Rank::Eight => '8',
        Rank::Nine => '9',
        Rank::Ten => 'T',
        Rank::Jack => 'J',
        Rank::Queen => 'Q',
        Rank::King => 'K',
        Rank::Ace => 'A',
    }
}

fn suit_char(suit: Suit) -> char {
    match suit {
        Suit::Diamonds => 'D',
        Suit::Clubs => 'C',
        Suit::Hearts => 'H',
        Suit::Spades => 'S',
    }
}

impl Display for Card {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}{}", rank_char(self.rank), suit_char(self.suit))
    }
}

impl FromStr for Card {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        let (rank_ch, suit_ch) = match (chars.next(), chars.next(), chars.next()) {
            (Some(r), Some(c), None) => (r, c),
            _ => {
                return Err(DomainError::validation(
                    ValidationKind::MalformedCards,
                    format!("parse card: {s}"),
                ))
            }
        };
        let rank = match rank_ch {
            '2' => Rank::Two,
            '3' => Rank::Three,
            '4' => Rank::Four,
            '5' => Rank::Five,
            '6' => Rank::Six,
            '7' => Rank::Seven,
            '8' => Rank::Eight,
            '9' => Rank::Nine,
            'T' => Rank::Ten,
            'J' => Rank::Jack,
            'Q' => Rank::Queen,
            'K' => Rank::King,
            'A' => Rank::Ace,
            _ => {
                return Err(DomainError::validation(
                    ValidationKind::MalformedCards,
                    format!("parse card: {s}"),
                ))
            }
        };
        let suit = match suit_ch {
            'D' => Suit::Diamonds,
            'C' => Suit::Clubs,
            'H' => Suit::Hearts,
            'S' => Suit::Spades,
            _ => {
                return Err(DomainError::validation(
                    ValidationKind::MalformedCards,
                    format!("parse card: {s}"),
                ))
            }
        };
        Ok(Card { rank, suit })
    }
}

impl Serialize for Card {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Card {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse::<Card>().map_err(DeError::custom)
    }
}

/// Parse card tokens (e.g. "3D", "TC") into cards. Any malformed token
/// rejects the whole batch.
pub fn try_parse_cards<I, S>(tokens: I) -> Result<Vec<Card>, DomainError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    tokens
        .into_iter()
        .map(|s| s.as_ref().parse::<Card>())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deck_has_52_distinct_cards() {
        let deck = full_deck();
        assert_eq!(deck.len(), 52);
        for i in 0..deck.len() {
            for j in (i + 1)..deck.len() {
                assert_ne!(deck[i], deck[j]);
            }
        }
    }

    #[test]
    fn two_of_spades_is_highest() {
        let top = Card {
            rank: Rank::Two,
            suit: Suit::Spades,
        };
        for card in full_deck() {
            assert!(card <= top);
        }
    }

    #[test]
    fn three_of_diamonds_is_lowest() {
        for card in full_deck() {
            assert!(card >= THREE_OF_DIAMONDS);
        }
    }

    #[test]
    fn rank_dominates_suit() {
        let four_d = "4D".parse::<Card>().unwrap();
        let three_s = "3S".parse::<Card>().unwrap();
        assert!(four_d > three_s);
    }

    #[test]
    fn round_trips_through_display() {
        for card in full_deck() {
            let parsed = card.to_string().parse::<Card>().unwrap();
            assert_eq!(parsed, card);
        }
    }

    #[test]
    fn rejects_malformed_tokens() {
        for tok in ["1H", "10H", "Ah", "ZZ", "", "3d", "3DX"] {
            assert!(tok.parse::<Card>().is_err(), "accepted {tok:?}");
        }
    }

    #[test]
    fn serde_uses_compact_strings() {
        let json = serde_json::to_string(&THREE_OF_DIAMONDS).unwrap();
        assert_eq!(json, "\"3D\"");
        let back: Card = serde_json::from_str("\"2S\"").unwrap();
        assert_eq!(
            back,
            Card {
                rank: Rank::Two,
                suit: Suit::Spades
            }
        );
        assert!(serde_json::from_str::<Card>("\"XX\"").is_err());
    }
}
