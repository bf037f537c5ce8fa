//! Shape classification of a multi-card play: singles, sets of one
//! repeated card, and tractors (runs of equal-width sets on adjacent steps
//! of the same follow class).

use crate::model::card::Card;
use crate::model::rank::Rank;
use crate::model::trump::TrumpContext;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayShape {
    Single,
    /// `width` copies of one card (pair, triple).
    Set { width: usize },
    /// `length` sets of `width` copies on consecutive steps.
    Tractor { width: usize, length: usize },
    Mixed,
}

impl PlayShape {
    /// Copies per face a follower is asked to match; 1 for singles and
    /// unstructured plays.
    pub const fn width(self) -> usize {
        match self {
            PlayShape::Set { width } | PlayShape::Tractor { width, .. } => width,
            PlayShape::Single | PlayShape::Mixed => 1,
        }
    }

    pub const fn is_structured(self) -> bool {
        !matches!(self, PlayShape::Mixed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum TrumpStep {
    OffSuitTwo,
    TrumpSuitTwo,
    OffSuitActive,
    TrumpSuitActive,
    SmallJoker,
    BigJoker,
}

/// Ordinal used for tractor adjacency. Unlike `Card::power`, cards of the
/// same trump level (the off-suit active-rank cards, the off-suit twos)
/// share one step, and the active rank and the twos are skipped inside the
/// plain ranks so that e.g. 4-4-6-6 chains when 5 is the level.
pub fn sequence_index(card: Card, ctx: TrumpContext) -> u8 {
    let is_plain = |rank: Rank| rank != Rank::Two && rank != ctx.rank;
    let plain_count = Rank::ORDERED.iter().filter(|r| is_plain(**r)).count() as u8;

    let step = if card.is_big_joker() {
        TrumpStep::BigJoker
    } else if card.is_small_joker() {
        TrumpStep::SmallJoker
    } else if card.rank == ctx.rank {
        if ctx.is_trump_suit(card.suit) {
            TrumpStep::TrumpSuitActive
        } else {
            TrumpStep::OffSuitActive
        }
    } else if card.rank == Rank::Two {
        if ctx.is_trump_suit(card.suit) {
            TrumpStep::TrumpSuitTwo
        } else {
            TrumpStep::OffSuitTwo
        }
    } else {
        return Rank::ORDERED
            .iter()
            .filter(|r| is_plain(**r) && **r < card.rank)
            .count() as u8;
    };

    let present = [
        TrumpStep::OffSuitTwo,
        TrumpStep::TrumpSuitTwo,
        TrumpStep::OffSuitActive,
        TrumpStep::TrumpSuitActive,
        TrumpStep::SmallJoker,
        TrumpStep::BigJoker,
    ]
    .into_iter()
    .filter(|level| match level {
        TrumpStep::OffSuitTwo => ctx.rank != Rank::Two,
        TrumpStep::TrumpSuitTwo => ctx.rank != Rank::Two && ctx.suit.is_some(),
        TrumpStep::TrumpSuitActive => ctx.suit.is_some(),
        _ => true,
    })
    .take_while(|level| *level < step)
    .count() as u8;

    plain_count + present
}

/// Distinct faces with their multiplicity, in first-seen order.
pub fn group_faces(cards: &[Card]) -> Vec<(Card, usize)> {
    let mut groups: Vec<(Card, usize)> = Vec::new();
    for card in cards {
        match groups.iter_mut().find(|(face, _)| face == card) {
            Some((_, count)) => *count += 1,
            None => groups.push((*card, 1)),
        }
    }
    groups
}

pub fn classify(cards: &[Card], ctx: TrumpContext) -> PlayShape {
    match cards.len() {
        0 => return PlayShape::Mixed,
        1 => return PlayShape::Single,
        _ => {}
    }

    let groups = group_faces(cards);
    if groups.len() == 1 {
        return PlayShape::Set { width: cards.len() };
    }

    let width = groups[0].1;
    if width < 2 || groups.iter().any(|(_, count)| *count != width) {
        return PlayShape::Mixed;
    }

    let class = groups[0].0.effective_suit(ctx);
    if groups.iter().any(|(face, _)| face.effective_suit(ctx) != class) {
        return PlayShape::Mixed;
    }

    let mut steps: Vec<u8> = groups
        .iter()
        .map(|(face, _)| sequence_index(*face, ctx))
        .collect();
    steps.sort_unstable();
    if steps.windows(2).all(|pair| pair[1] == pair[0] + 1) {
        PlayShape::Tractor {
            width,
            length: groups.len(),
        }
    } else {
        PlayShape::Mixed
    }
}

/// True when `cards` holds at least one face `width` times.
pub fn has_set_of(cards: &[Card], width: usize) -> bool {
    width <= 1 || group_faces(cards).iter().any(|(_, count)| *count >= width)
}

#[cfg(test)]
mod tests {
    use super::{PlayShape, classify, has_set_of, sequence_index};
    use crate::model::card::Card;
    use crate::model::rank::Rank;
    use crate::model::suit::Suit;
    use crate::model::trump::TrumpContext;

    fn c(text: &str) -> Card {
        text.parse().unwrap()
    }

    #[test]
    fn single_and_sets() {
        let ctx = TrumpContext::new(Some(Suit::Hearts), Rank::Five);
        assert_eq!(classify(&[c("3S")], ctx), PlayShape::Single);
        assert_eq!(classify(&[c("3S"), c("3S")], ctx), PlayShape::Set { width: 2 });
        assert_eq!(
            classify(&[c("BJ"), c("BJ"), c("BJ")], ctx),
            PlayShape::Set { width: 3 }
        );
        assert_eq!(classify(&[c("3S"), c("4S")], ctx), PlayShape::Mixed);
        assert_eq!(classify(&[], ctx), PlayShape::Mixed);
    }

    #[test]
    fn tractor_skips_active_rank() {
        let ctx = TrumpContext::new(Some(Suit::Hearts), Rank::Five);
        let cards = [c("4S"), c("4S"), c("6S"), c("6S")];
        assert_eq!(
            classify(&cards, ctx),
            PlayShape::Tractor {
                width: 2,
                length: 2
            }
        );
    }

    #[test]
    fn side_pairs_with_gap_are_mixed() {
        let ctx = TrumpContext::new(Some(Suit::Hearts), Rank::Five);
        let cards = [c("7S"), c("7S"), c("9S"), c("9S")];
        assert_eq!(classify(&cards, ctx), PlayShape::Mixed);
    }

    #[test]
    fn tractor_requires_one_follow_class() {
        let ctx = TrumpContext::new(Some(Suit::Hearts), Rank::Five);
        let cards = [c("7S"), c("7S"), c("8D"), c("8D")];
        assert_eq!(classify(&cards, ctx), PlayShape::Mixed);
    }

    #[test]
    fn trump_ace_chains_into_off_suit_twos() {
        let ctx = TrumpContext::new(Some(Suit::Hearts), Rank::Five);
        let cards = [c("AH"), c("AH"), c("2S"), c("2S")];
        assert!(matches!(
            classify(&cards, ctx),
            PlayShape::Tractor { width: 2, length: 2 }
        ));
    }

    #[test]
    fn off_suit_level_cards_share_a_step() {
        let ctx = TrumpContext::new(Some(Suit::Hearts), Rank::Five);
        assert_eq!(
            sequence_index(c("5S"), ctx),
            sequence_index(c("5D"), ctx)
        );
        let cards = [c("5S"), c("5S"), c("5D"), c("5D")];
        assert_eq!(classify(&cards, ctx), PlayShape::Mixed);
    }

    #[test]
    fn jokers_sit_on_top() {
        let ctx = TrumpContext::new(Some(Suit::Hearts), Rank::Five);
        assert_eq!(
            sequence_index(c("BJ"), ctx),
            sequence_index(c("SJ"), ctx) + 1
        );
        assert_eq!(
            sequence_index(c("SJ"), ctx),
            sequence_index(c("5H"), ctx) + 1
        );
        let cards = [c("SJ"), c("SJ"), c("BJ"), c("BJ")];
        assert!(matches!(classify(&cards, ctx), PlayShape::Tractor { .. }));
    }

    #[test]
    fn undeclared_trump_has_no_trump_suit_steps() {
        let ctx = TrumpContext::undeclared(Rank::Five);
        assert_eq!(
            sequence_index(c("SJ"), ctx),
            sequence_index(c("5S"), ctx) + 1
        );
        assert_eq!(
            sequence_index(c("5S"), ctx),
            sequence_index(c("2D"), ctx) + 1
        );
    }

    #[test]
    fn set_detection() {
        let cards = [c("3S"), c("4S"), c("3S")];
        assert!(has_set_of(&cards, 2));
        assert!(!has_set_of(&cards, 3));
        assert!(has_set_of(&cards, 1));
    }
}
