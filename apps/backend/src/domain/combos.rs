//! Combination classification and comparison.
//!
//! Legal plays are 1, 2, 3 or 5 cards. Five-card hands rank
//! StraightFlush > FourOfAKind > FullHouse > Flush > Straight; only
//! same-size plays are comparable at all.

use serde::{Deserialize, Serialize};

use super::cards::{Card, Rank};
use crate::errors::domain::{DomainError, ValidationKind};

#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub enum ComboKind {
    Single,
    Pair,
    Triple,
    Straight,
    Flush,
    FullHouse,
    FourOfAKind,
    StraightFlush,
}

impl ComboKind {
    /// Tier within the five-card size; None for sizes 1-3.
    fn five_card_tier(self) -> Option<u8> {
        match self {
            ComboKind::Straight => Some(0),
            ComboKind::Flush => Some(1),
            ComboKind::FullHouse => Some(2),
            ComboKind::FourOfAKind => Some(3),
            ComboKind::StraightFlush => Some(4),
            _ => None,
        }
    }
}

/// A classified play. Construct via [`classify`]; `cards` is sorted
/// ascending and `decisive` is the card that settles same-tier comparisons.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Combo {
    pub kind: ComboKind,
    pub cards: Vec<Card>,
    pub decisive: Card,
}

impl Combo {
    /// Whether this combo beats `incumbent` under Big Two rules.
    /// Different sizes never compare; a higher five-card tier always wins;
    /// within a tier the decisive card decides.
    pub fn beats(&self, incumbent: &Combo) -> bool {
        if self.cards.len() != incumbent.cards.len() {
            return false;
        }
        match (self.kind.five_card_tier(), incumbent.kind.five_card_tier()) {
            (Some(mine), Some(theirs)) if mine != theirs => mine > theirs,
            _ => self.decisive > incumbent.decisive,
        }
    }
}

fn reject(detail: impl Into<String>) -> DomainError {
    DomainError::validation(ValidationKind::IllegalCombination, detail)
}

/// Group sorted cards into (rank, count) runs, ascending by rank.
fn rank_runs(cards: &[Card]) -> Vec<(Rank, usize)> {
    let mut runs: Vec<(Rank, usize)> = Vec::new();
    for card in cards {
        match runs.last_mut() {
            Some((rank, count)) if *rank == card.rank => *count += 1,
            _ => runs.push((card.rank, 1)),
        }
    }
    runs
}

/// Five consecutive ranks in Big Two order, no wrap-around. Two never
/// appears in a straight.
fn is_straight(cards: &[Card]) -> bool {
    if cards.iter().any(|c| c.rank == Rank::Two) {
        return false;
    }
    cards
        .windows(2)
        .all(|w| w[1].rank.index() == w[0].rank.index() + 1)
}

fn is_flush(cards: &[Card]) -> bool {
    cards.windows(2).all(|w| w[0].suit == w[1].suit)
}

/// Highest card of the rank appearing `want` times. Classification
/// guarantees the run exists for the shapes that call this.
fn run_top(cards: &[Card], want: usize) -> Result<Card, DomainError> {
    let (rank, _) = rank_runs(cards)
        .into_iter()
        .find(|(_, count)| *count == want)
        .ok_or_else(|| reject("malformed rank group"))?;
    cards
        .iter()
        .filter(|c| c.rank == rank)
        .max()
        .copied()
        .ok_or_else(|| reject("malformed rank group"))
}

/// Classify a submitted set of cards as a legal combination.
/// Rejects wrong sizes, duplicate cards, and five-card sets that form
/// none of the recognized shapes.
pub fn classify(cards: &[Card]) -> Result<Combo, DomainError> {
    let mut sorted = cards.to_vec();
    sorted.sort();
    if sorted.windows(2).any(|w| w[0] == w[1]) {
        return Err(DomainError::validation(
            ValidationKind::MalformedCards,
            "duplicate card in play",
        ));
    }

    let highest = match sorted.last() {
        Some(card) => *card,
        None => return Err(reject("empty play")),
    };

    match sorted.len() {
        1 => Ok(Combo {
            kind: ComboKind::Single,
            cards: sorted,
            decisive: highest,
        }),
        2 => {
            if sorted[0].rank != sorted[1].rank {
                return Err(reject("pair ranks differ"));
            }
            Ok(Combo {
                kind: ComboKind::Pair,
                cards: sorted,
                decisive: highest,
            })
        }
        3 => {
            if sorted.iter().any(|c| c.rank != sorted[0].rank) {
                return Err(reject("triple ranks differ"));
            }
            Ok(Combo {
                kind: ComboKind::Triple,
                cards: sorted,
                decisive: highest,
            })
        }
        5 => {
            let straight = is_straight(&sorted);
            let flush = is_flush(&sorted);
            let runs = rank_runs(&sorted);
            let counts: Vec<usize> = runs.iter().map(|(_, c)| *c).collect();

            let (kind, decisive) = if straight && flush {
                (ComboKind::StraightFlush, highest)
            } else if counts.contains(&4) {
                (ComboKind::FourOfAKind, run_top(&sorted, 4)?)
            } else if counts.contains(&3) && counts.contains(&2) {
                (ComboKind::FullHouse, run_top(&sorted, 3)?)
            } else if flush {
                (ComboKind::Flush, highest)
            } else if straight {
                (ComboKind::Straight, highest)
            } else {
                return Err(reject("five cards form no legal hand"));
            };
            Ok(Combo {
                kind,
                cards: sorted,
                decisive,
            })
        }
        n => Err(reject(format!("illegal play size {n}"))),
    }
}

/// Whether `combo` can be beaten by any combination formable from
/// `outstanding` (the union of the other three hands).
///
/// Exact for singles, pairs and triples. Five-card plays are treated as
/// always beatable; the cost of the missed auto-pass is a 10s wait, the
/// cost of a wrong "unbeatable" call is a stolen trick.
pub fn is_unbeatable(combo: &Combo, outstanding: &[Card]) -> bool {
    match combo.kind {
        ComboKind::Single => outstanding.iter().all(|c| *c < combo.decisive),
        ComboKind::Pair => {
            let mut sorted = outstanding.to_vec();
            sorted.sort();
            !rank_runs(&sorted)
                .into_iter()
                .filter(|(_, count)| *count >= 2)
                .any(|(rank, _)| {
                    let best = sorted
                        .iter()
                        .filter(|c| c.rank == rank)
                        .max()
                        .copied();
                    match best {
                        Some(card) => card > combo.decisive,
                        None => false,
                    }
                })
        }
        ComboKind::Triple => {
            // Equal rank is impossible: we hold three of it already.
            let mut sorted = outstanding.to_vec();
            sorted.sort();
            !rank_runs(&sorted)
                .into_iter()
                .any(|(rank, count)| count >= 3 && rank > combo.decisive.rank)
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::cards::try_parse_cards;

    fn combo(tokens: &[&str]) -> Combo {
        classify(&try_parse_cards(tokens.iter().copied()).unwrap()).unwrap()
    }

    #[test]
    fn classifies_small_sizes() {
        assert_eq!(combo(&["3D"]).kind, ComboKind::Single);
        assert_eq!(combo(&["7C", "7H"]).kind, ComboKind::Pair);
        assert_eq!(combo(&["QD", "QH", "QS"]).kind, ComboKind::Triple);
    }

    #[test]
    fn classifies_five_card_shapes() {
        assert_eq!(combo(&["4D", "5C", "6H", "7S", "8D"]).kind, ComboKind::Straight);
        assert_eq!(combo(&["3H", "6H", "9H", "JH", "KH"]).kind, ComboKind::Flush);
        assert_eq!(
            combo(&["9D", "9C", "9H", "4C", "4S"]).kind,
            ComboKind::FullHouse
        );
        assert_eq!(
            combo(&["8D", "8C", "8H", "8S", "3C"]).kind,
            ComboKind::FourOfAKind
        );
        assert_eq!(
            combo(&["5S", "6S", "7S", "8S", "9S"]).kind,
            ComboKind::StraightFlush
        );
    }

    #[test]
    fn rejects_illegal_sets() {
        assert!(classify(&[]).is_err());
        assert!(classify(&try_parse_cards(["3D", "4D"]).unwrap()).is_err());
        assert!(classify(&try_parse_cards(["3D", "3C", "4D"]).unwrap()).is_err());
        assert!(classify(&try_parse_cards(["3D", "4D", "5D", "6D"]).unwrap()).is_err());
        assert!(classify(&try_parse_cards(["3D", "4C", "5H", "6S", "8D"]).unwrap()).is_err());
        assert!(classify(&try_parse_cards(["3D", "3D"]).unwrap()).is_err());
    }

    #[test]
    fn two_never_joins_a_straight() {
        // A-2-3-4-5 and 2-3-4-5-6 are not straights in this rule set.
        assert!(classify(&try_parse_cards(["AD", "2C", "3H", "4S", "5D"]).unwrap()).is_err());
        assert!(classify(&try_parse_cards(["2D", "3C", "4H", "5S", "6D"]).unwrap()).is_err());
        // T-J-Q-K-A is the highest straight.
        assert_eq!(
            combo(&["TD", "JC", "QH", "KS", "AD"]).kind,
            ComboKind::Straight
        );
    }

    #[test]
    fn singles_compare_by_rank_then_suit() {
        assert!(combo(&["3S"]).beats(&combo(&["3D"])));
        assert!(combo(&["4D"]).beats(&combo(&["3S"])));
        assert!(combo(&["2S"]).beats(&combo(&["AS"])));
        assert!(!combo(&["3D"]).beats(&combo(&["3S"])));
    }

    #[test]
    fn sizes_never_cross_compare() {
        assert!(!combo(&["2S"]).beats(&combo(&["3D", "3C"])));
        assert!(!combo(&["3D", "3C"]).beats(&combo(&["2S"])));
        assert!(!combo(&["5S", "6S", "7S", "8S", "9S"]).beats(&combo(&["2S"])));
    }

    #[test]
    fn five_card_tiers_dominate() {
        let straight = combo(&["TD", "JC", "QH", "KS", "AD"]);
        let flush = combo(&["3H", "6H", "9H", "JH", "KH"]);
        let full = combo(&["4D", "4C", "4H", "9C", "9S"]);
        let quads = combo(&["5D", "5C", "5H", "5S", "3C"]);
        let sflush = combo(&["5S", "6S", "7S", "8S", "9S"]);
        assert!(flush.beats(&straight));
        assert!(full.beats(&flush));
        assert!(quads.beats(&full));
        assert!(sflush.beats(&quads));
        assert!(!straight.beats(&flush));
    }

    #[test]
    fn full_house_compares_by_triple_rank() {
        let low = combo(&["9D", "9C", "9H", "AC", "AS"]);
        let high = combo(&["TD", "TC", "TH", "3C", "3S"]);
        assert!(high.beats(&low));
        assert!(!low.beats(&high));
    }

    #[test]
    fn top_single_is_unbeatable() {
        let two_s = combo(&["2S"]);
        let rest: Vec<_> = crate::domain::cards::full_deck()
            .into_iter()
            .filter(|c| !two_s.cards.contains(c))
            .collect();
        assert!(is_unbeatable(&two_s, &rest));

        let two_h = combo(&["2H"]);
        let rest: Vec<_> = crate::domain::cards::full_deck()
            .into_iter()
            .filter(|c| !two_h.cards.contains(c))
            .collect();
        assert!(!is_unbeatable(&two_h, &rest));
    }

    #[test]
    fn pair_unbeatable_only_without_higher_pair() {
        let pair = combo(&["2H", "2S"]);
        let outstanding = try_parse_cards(["2D", "2C", "AD", "AC"]).unwrap();
        assert!(is_unbeatable(&pair, &outstanding));

        let pair = combo(&["AD", "AC"]);
        let outstanding = try_parse_cards(["AH", "AS", "KD"]).unwrap();
        assert!(!is_unbeatable(&pair, &outstanding));
        // A lone higher card is not a pair.
        let outstanding = try_parse_cards(["AH", "2S", "KD"]).unwrap();
        assert!(is_unbeatable(&pair, &outstanding));
    }

    #[test]
    fn five_card_plays_stay_beatable() {
        let sflush = combo(&["TS", "JS", "QS", "KS", "AS"]);
        assert!(!is_unbeatable(&sflush, &[]));
    }
}
