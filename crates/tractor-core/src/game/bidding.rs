use crate::model::card::Card;
use crate::model::player::PlayerPosition;
use crate::model::rank::Rank;
use crate::model::suit::Suit;
use crate::model::trump::TrumpContext;
use core::fmt;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{Level, event};

/// Suit used when the bottom holds nothing but jokers.
pub const FALLBACK_TRUMP_SUIT: Suit = Suit::Spades;

/// Strength of an accepted declaration, weakest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BidLevel {
    /// The single big joker allowed in the session's opening round.
    OpeningBigJoker,
    Single,
    Pair,
    Triple,
    SmallJokers,
    BigJokers,
}

impl BidLevel {
    pub const fn strength(self) -> f32 {
        match self {
            BidLevel::OpeningBigJoker | BidLevel::Single => 1.0,
            BidLevel::Pair => 2.0,
            BidLevel::Triple => 3.0,
            BidLevel::SmallJokers => 3.5,
            BidLevel::BigJokers => 4.0,
        }
    }

    /// Declarations of strength two or more close bidding for the round.
    pub fn locks(self) -> bool {
        self.strength() >= 2.0
    }

    /// Classifies `count` copies of `card`; anything but 1-3 active-rank
    /// cards or exactly three of one joker is not a bid.
    pub fn evaluate(card: Card, count: usize, trump_rank: Rank) -> Option<BidLevel> {
        match (card.rank, count) {
            (Rank::BigJoker, 3) => Some(BidLevel::BigJokers),
            (Rank::SmallJoker, 3) => Some(BidLevel::SmallJokers),
            (rank, 1) if rank == trump_rank => Some(BidLevel::Single),
            (rank, 2) if rank == trump_rank => Some(BidLevel::Pair),
            (rank, 3) if rank == trump_rank => Some(BidLevel::Triple),
            _ => None,
        }
    }
}

impl fmt::Display for BidLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            BidLevel::OpeningBigJoker => "opening big joker",
            BidLevel::Single => "single",
            BidLevel::Pair => "pair",
            BidLevel::Triple => "triple",
            BidLevel::SmallJokers => "three small jokers",
            BidLevel::BigJokers => "three big jokers",
        };
        f.write_str(label)
    }
}

/// Cards shown by one player, plus the suit named for a joker bid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub player: PlayerPosition,
    pub cards: Vec<Card>,
    pub declared_suit: Option<Suit>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DeclarationOutcome {
    pub declarer: PlayerPosition,
    pub level: BidLevel,
    pub suit: Suit,
    pub locked: bool,
}

impl fmt::Display for DeclarationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} declared {} with a {}",
            self.declarer, self.suit, self.level
        )?;
        if self.locked {
            f.write_str(" (trump locked)")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeclarationError {
    #[error("trump can only be declared while dealing")]
    NotDealingPhase,
    #[error("unknown player {0}")]
    UnknownPlayer(usize),
    #[error("card index {index} is outside a hand of {hand_size}")]
    IndexOutOfRange { index: usize, hand_size: usize },
    #[error("card index {0} was given twice")]
    DuplicateIndex(usize),
    #[error("a declaration needs at least one card")]
    Empty,
    #[error("declared cards must all be the same card")]
    NotIdentical,
    #[error("{count} x {card} is not a valid declaration")]
    InvalidCombination { card: Card, count: usize },
    #[error("a joker declaration must name a suit")]
    SuitRequired,
    #[error("{0} cannot be declared as trump")]
    InvalidSuit(Suit),
    #[error("a {offered} does not beat the current {current}")]
    NotStronger { current: BidLevel, offered: BidLevel },
    #[error("trump is locked for this round")]
    Locked,
    #[error("the opening round only accepts a single big joker")]
    OpeningRoundRequiresBigJoker,
}

/// Round-scoped trump fields and the bidding protocol that sets them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrumpState {
    rank: Rank,
    suit: Option<Suit>,
    declarer: Option<PlayerPosition>,
    bid: Option<BidLevel>,
    locked: bool,
    opening_round: bool,
}

impl TrumpState {
    pub fn new(rank: Rank, opening_round: bool) -> Self {
        Self {
            rank,
            suit: None,
            declarer: None,
            bid: None,
            locked: false,
            opening_round,
        }
    }

    pub fn context(&self) -> TrumpContext {
        TrumpContext::new(self.suit, self.rank)
    }

    pub fn rank(&self) -> Rank {
        self.rank
    }

    pub fn suit(&self) -> Option<Suit> {
        self.suit
    }

    pub fn declarer(&self) -> Option<PlayerPosition> {
        self.declarer
    }

    pub fn bid(&self) -> Option<BidLevel> {
        self.bid
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn is_opening_round(&self) -> bool {
        self.opening_round
    }

    /// Accepts `declaration` if it is well formed and strictly stronger
    /// than the standing one. In the opening round a later big joker
    /// replaces the standing one. State is untouched on rejection.
    pub fn declare(
        &mut self,
        declaration: &Declaration,
    ) -> Result<DeclarationOutcome, DeclarationError> {
        let card = *declaration.cards.first().ok_or(DeclarationError::Empty)?;
        if declaration.cards.iter().any(|other| *other != card) {
            return Err(DeclarationError::NotIdentical);
        }
        if self.locked {
            return Err(DeclarationError::Locked);
        }

        let count = declaration.cards.len();
        let level = if self.opening_round {
            if !(card.is_big_joker() && count == 1) {
                return Err(DeclarationError::OpeningRoundRequiresBigJoker);
            }
            BidLevel::OpeningBigJoker
        } else {
            BidLevel::evaluate(card, count, self.rank)
                .ok_or(DeclarationError::InvalidCombination { card, count })?
        };

        let suit = if card.is_joker() {
            match declaration.declared_suit {
                None => return Err(DeclarationError::SuitRequired),
                Some(Suit::Joker) => return Err(DeclarationError::InvalidSuit(Suit::Joker)),
                Some(suit) => suit,
            }
        } else {
            card.suit
        };

        if let Some(current) = self.bid.filter(|_| !self.opening_round) {
            if level <= current {
                return Err(DeclarationError::NotStronger {
                    current,
                    offered: level,
                });
            }
        }

        self.suit = Some(suit);
        self.declarer = Some(declaration.player);
        self.bid = Some(level);
        self.locked = level.locks();

        event!(
            target: "tractor_core::bidding",
            Level::INFO,
            declarer = %declaration.player,
            suit = %suit,
            level = %level,
            locked = self.locked
        );

        Ok(DeclarationOutcome {
            declarer: declaration.player,
            level,
            suit,
            locked: self.locked,
        })
    }

    /// With no accepted declaration, trump becomes the suit of the first
    /// non-joker card of the bottom.
    pub fn infer_from_bottom(&mut self, bottom: &[Card]) -> Suit {
        if let Some(suit) = self.suit {
            return suit;
        }
        let suit = bottom
            .iter()
            .find(|card| !card.is_joker())
            .map(|card| card.suit)
            .unwrap_or(FALLBACK_TRUMP_SUIT);
        self.suit = Some(suit);
        suit
    }
}

#[cfg(test)]
mod tests {
    use super::{BidLevel, Declaration, DeclarationError, TrumpState};
    use crate::model::card::Card;
    use crate::model::player::PlayerPosition;
    use crate::model::rank::Rank;
    use crate::model::suit::Suit;

    fn offer(player: PlayerPosition, card: Card, count: usize, suit: Option<Suit>) -> Declaration {
        Declaration {
            player,
            cards: vec![card; count],
            declared_suit: suit,
        }
    }

    #[test]
    fn strengths_match_the_table() {
        let rank = Rank::Seven;
        let seven = Card::new(rank, Suit::Clubs);
        assert_eq!(BidLevel::evaluate(seven, 1, rank), Some(BidLevel::Single));
        assert_eq!(BidLevel::evaluate(seven, 2, rank), Some(BidLevel::Pair));
        assert_eq!(BidLevel::evaluate(seven, 3, rank), Some(BidLevel::Triple));
        assert_eq!(
            BidLevel::evaluate(Card::SMALL_JOKER, 3, rank),
            Some(BidLevel::SmallJokers)
        );
        assert_eq!(
            BidLevel::evaluate(Card::BIG_JOKER, 3, rank),
            Some(BidLevel::BigJokers)
        );
        assert_eq!(BidLevel::evaluate(Card::BIG_JOKER, 2, rank), None);
        assert_eq!(BidLevel::evaluate(Card::new(Rank::Eight, Suit::Clubs), 2, rank), None);
        assert_eq!(BidLevel::BigJokers.strength(), 4.0);
        assert_eq!(BidLevel::SmallJokers.strength(), 3.5);
        assert!(BidLevel::SmallJokers > BidLevel::Triple);
    }

    #[test]
    fn equal_strength_is_rejected_then_pair_locks() {
        let mut state = TrumpState::new(Rank::Two, false);
        state
            .declare(&offer(PlayerPosition::North, Card::new(Rank::Two, Suit::Clubs), 1, None))
            .unwrap();
        assert_eq!(state.suit(), Some(Suit::Clubs));
        assert!(!state.is_locked());

        let rejected = state.declare(&offer(
            PlayerPosition::East,
            Card::new(Rank::Two, Suit::Spades),
            1,
            None,
        ));
        assert_eq!(
            rejected,
            Err(DeclarationError::NotStronger {
                current: BidLevel::Single,
                offered: BidLevel::Single
            })
        );
        assert_eq!(state.declarer(), Some(PlayerPosition::North));

        let outcome = state
            .declare(&offer(
                PlayerPosition::South,
                Card::new(Rank::Two, Suit::Hearts),
                2,
                None,
            ))
            .unwrap();
        assert!(outcome.locked);
        assert_eq!(state.suit(), Some(Suit::Hearts));
        assert_eq!(state.declarer(), Some(PlayerPosition::South));

        assert_eq!(
            state.declare(&offer(PlayerPosition::West, Card::BIG_JOKER, 3, Some(Suit::Spades))),
            Err(DeclarationError::Locked)
        );
    }

    #[test]
    fn joker_bids_need_a_colored_suit() {
        let mut state = TrumpState::new(Rank::Two, false);
        assert_eq!(
            state.declare(&offer(PlayerPosition::North, Card::SMALL_JOKER, 3, None)),
            Err(DeclarationError::SuitRequired)
        );
        assert_eq!(
            state.declare(&offer(
                PlayerPosition::North,
                Card::SMALL_JOKER,
                3,
                Some(Suit::Joker)
            )),
            Err(DeclarationError::InvalidSuit(Suit::Joker))
        );
        let outcome = state
            .declare(&offer(
                PlayerPosition::North,
                Card::SMALL_JOKER,
                3,
                Some(Suit::Diamonds),
            ))
            .unwrap();
        assert_eq!(outcome.suit, Suit::Diamonds);
        assert_eq!(outcome.level, BidLevel::SmallJokers);
    }

    #[test]
    fn mixed_cards_are_not_a_declaration() {
        let mut state = TrumpState::new(Rank::Two, false);
        let declaration = Declaration {
            player: PlayerPosition::North,
            cards: vec![Card::new(Rank::Two, Suit::Clubs), Card::new(Rank::Two, Suit::Spades)],
            declared_suit: None,
        };
        assert_eq!(state.declare(&declaration), Err(DeclarationError::NotIdentical));
        assert_eq!(state.bid(), None);
    }

    #[test]
    fn opening_round_accepts_only_one_big_joker() {
        let mut state = TrumpState::new(Rank::Two, true);
        assert_eq!(
            state.declare(&offer(
                PlayerPosition::North,
                Card::new(Rank::Two, Suit::Clubs),
                2,
                None
            )),
            Err(DeclarationError::OpeningRoundRequiresBigJoker)
        );
        assert_eq!(
            state.declare(&offer(PlayerPosition::North, Card::BIG_JOKER, 1, None)),
            Err(DeclarationError::SuitRequired)
        );
        let outcome = state
            .declare(&offer(PlayerPosition::East, Card::BIG_JOKER, 1, Some(Suit::Hearts)))
            .unwrap();
        assert_eq!(outcome.level, BidLevel::OpeningBigJoker);
        assert!(!outcome.locked);
        assert!(!state.is_locked());
    }

    #[test]
    fn later_opening_big_joker_replaces_the_first() {
        let mut state = TrumpState::new(Rank::Two, true);
        state
            .declare(&offer(PlayerPosition::North, Card::BIG_JOKER, 1, Some(Suit::Hearts)))
            .unwrap();
        let second = state
            .declare(&offer(PlayerPosition::East, Card::BIG_JOKER, 1, Some(Suit::Spades)))
            .unwrap();
        assert_eq!(second.declarer, PlayerPosition::East);
        assert_eq!(state.suit(), Some(Suit::Spades));
        assert_eq!(state.declarer(), Some(PlayerPosition::East));
        assert!(!state.is_locked());
        assert_eq!(
            state.declare(&offer(PlayerPosition::South, Card::BIG_JOKER, 3, Some(Suit::Clubs))),
            Err(DeclarationError::OpeningRoundRequiresBigJoker)
        );
    }

    #[test]
    fn bottom_inference_skips_jokers() {
        let mut state = TrumpState::new(Rank::Two, false);
        let bottom = [Card::BIG_JOKER, Card::new(Rank::Nine, Suit::Diamonds)];
        assert_eq!(state.infer_from_bottom(&bottom), Suit::Diamonds);

        let mut jokers_only = TrumpState::new(Rank::Two, false);
        assert_eq!(
            jokers_only.infer_from_bottom(&[Card::SMALL_JOKER]),
            Suit::Spades
        );
    }
}
