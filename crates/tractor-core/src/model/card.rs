use crate::model::rank::Rank;
use crate::model::suit::Suit;
use crate::model::trump::{EffectiveSuit, TrumpContext};
use core::fmt;
use core::str::FromStr;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One physical card. Three decks are in play, so equal cards are
/// interchangeable: equality and hashing are by (rank, suit) only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Card {
    pub rank: Rank,
    pub suit: Suit,
}

// Power tiers, highest first. Gaps leave room for the rank/suit offsets.
const TIER_BIG_JOKER: u16 = 1000;
const TIER_SMALL_JOKER: u16 = 900;
const TIER_TRUMP_ACTIVE: u16 = 800;
const TIER_ACTIVE: u16 = 700;
const TIER_TRUMP_TWO: u16 = 600;
const TIER_TWO: u16 = 500;
const TIER_TRUMP_SUIT: u16 = 300;
const TIER_LEAD_SUIT: u16 = 200;
const TIER_OTHER: u16 = 100;

impl Card {
    pub const SMALL_JOKER: Card = Card::new(Rank::SmallJoker, Suit::Joker);
    pub const BIG_JOKER: Card = Card::new(Rank::BigJoker, Suit::Joker);

    pub const fn new(rank: Rank, suit: Suit) -> Self {
        Self { rank, suit }
    }

    /// A card is well formed when it carries the joker suit exactly when it
    /// has a joker rank.
    pub const fn is_well_formed(self) -> bool {
        self.rank.is_joker() == self.suit.is_joker()
    }

    pub const fn is_joker(self) -> bool {
        self.rank.is_joker()
    }

    pub const fn is_big_joker(self) -> bool {
        matches!(self.rank, Rank::BigJoker)
    }

    pub const fn is_small_joker(self) -> bool {
        matches!(self.rank, Rank::SmallJoker)
    }

    /// Jokers, every two and every card of the active rank: trump whatever
    /// suit was declared.
    pub fn is_active_trump(self, trump_rank: Rank) -> bool {
        self.is_joker() || self.rank == Rank::Two || self.rank == trump_rank
    }

    pub fn is_trump(self, ctx: TrumpContext) -> bool {
        self.is_active_trump(ctx.rank) || ctx.is_trump_suit(self.suit)
    }

    pub fn effective_suit(self, ctx: TrumpContext) -> EffectiveSuit {
        if self.is_trump(ctx) {
            EffectiveSuit::Trump
        } else {
            EffectiveSuit::Side(self.suit)
        }
    }

    /// Comparative strength of this card within a trick led in `lead`.
    ///
    /// Big joker, small joker, active rank of the trump suit, active rank of
    /// the other suits, two of the trump suit, other twos, the rest of the
    /// trump suit, the led side suit, everything else. Inside a tier the
    /// conventional rank decides; for the off-suit active-rank cards and twos
    /// the suit priority breaks the tie so that sorting is deterministic.
    pub fn power(self, ctx: TrumpContext, lead: Option<EffectiveSuit>) -> u16 {
        if self.is_big_joker() {
            return TIER_BIG_JOKER;
        }
        if self.is_small_joker() {
            return TIER_SMALL_JOKER;
        }

        let in_trump_suit = ctx.is_trump_suit(self.suit);
        let suit_priority = u16::from(self.suit.priority());
        let rank_value = u16::from(self.rank.value());

        if self.rank == ctx.rank {
            return if in_trump_suit {
                TIER_TRUMP_ACTIVE
            } else {
                TIER_ACTIVE + suit_priority
            };
        }
        if self.rank == Rank::Two {
            return if in_trump_suit {
                TIER_TRUMP_TWO
            } else {
                TIER_TWO + suit_priority
            };
        }
        if in_trump_suit {
            return TIER_TRUMP_SUIT + rank_value;
        }
        if lead == Some(EffectiveSuit::Side(self.suit)) {
            return TIER_LEAD_SUIT + rank_value;
        }
        TIER_OTHER + rank_value
    }

    /// 5 → 5 points, 10 and K → 10 points, everything else nothing.
    pub const fn point_value(self) -> u32 {
        match self.rank {
            Rank::Five => 5,
            Rank::Ten | Rank::King => 10,
            _ => 0,
        }
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.rank {
            Rank::SmallJoker => f.write_str("SJ"),
            Rank::BigJoker => f.write_str("BJ"),
            _ => write!(f, "{}{}", self.rank, self.suit),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot parse card from {0:?}")]
pub struct ParseCardError(pub String);

impl FromStr for Card {
    type Err = ParseCardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim();
        match text.to_ascii_uppercase().as_str() {
            "SJ" => return Ok(Card::SMALL_JOKER),
            "BJ" => return Ok(Card::BIG_JOKER),
            _ => {}
        }

        let mut chars = text.chars();
        let suit = chars
            .next_back()
            .and_then(Suit::from_symbol)
            .ok_or_else(|| ParseCardError(s.to_string()))?;
        let rank = Rank::from_label(chars.as_str()).ok_or_else(|| ParseCardError(s.to_string()))?;
        Ok(Card::new(rank, suit))
    }
}
