use crate::model::rank::Rank;
use crate::model::suit::Suit;
use core::fmt;
use serde::{Deserialize, Serialize};

/// The two values every power comparison depends on: the declared trump
/// suit (if any yet) and the active rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TrumpContext {
    pub suit: Option<Suit>,
    pub rank: Rank,
}

impl TrumpContext {
    pub const fn new(suit: Option<Suit>, rank: Rank) -> Self {
        Self { suit, rank }
    }

    pub const fn undeclared(rank: Rank) -> Self {
        Self { suit: None, rank }
    }

    pub fn is_trump_suit(&self, suit: Suit) -> bool {
        self.suit == Some(suit)
    }
}

/// Which follow class a card belongs to once trump is taken into account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectiveSuit {
    Trump,
    Side(Suit),
}

impl EffectiveSuit {
    pub const fn is_trump(self) -> bool {
        matches!(self, EffectiveSuit::Trump)
    }
}

impl fmt::Display for EffectiveSuit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EffectiveSuit::Trump => f.write_str("trump"),
            EffectiveSuit::Side(suit) => write!(f, "{suit}"),
        }
    }
}
