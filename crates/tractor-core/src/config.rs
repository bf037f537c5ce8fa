use crate::model::deck::CARDS_PER_DECK;
use crate::model::rank::Rank;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const PLAYER_COUNT: usize = 4;

/// How strictly a follower short of the lead's class is constrained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FollowPolicy {
    /// Holding at least the lead count of matching cards forces an
    /// all-matching play; holding fewer leaves the play unconstrained.
    AtLeastCount,
    /// A short follower must put every matching card in, then fill.
    #[default]
    Conventional,
}

/// Rule settings for one game session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub decks: usize,
    pub bottom_size: usize,
    pub starting_rank: Rank,
    pub follow_policy: FollowPolicy,
    pub tractor_leads: bool,
    pub first_round_big_joker_only: bool,
    pub score_bottom: bool,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            decks: 3,
            bottom_size: 6,
            starting_rank: Rank::Two,
            follow_policy: FollowPolicy::default(),
            tractor_leads: true,
            first_round_big_joker_only: false,
            score_bottom: true,
        }
    }
}

impl GameConfig {
    pub fn total_cards(&self) -> usize {
        self.decks * CARDS_PER_DECK
    }

    pub fn hand_size(&self) -> usize {
        self.total_cards().saturating_sub(self.bottom_size) / PLAYER_COUNT
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.decks == 0 {
            return Err(ConfigError::NoDecks);
        }
        let total = self.total_cards();
        if self.bottom_size >= total {
            return Err(ConfigError::BottomTooLarge {
                bottom: self.bottom_size,
                total,
            });
        }
        if (total - self.bottom_size) % PLAYER_COUNT != 0 {
            return Err(ConfigError::UnevenDeal {
                total,
                bottom: self.bottom_size,
            });
        }
        if self.starting_rank.is_joker() {
            return Err(ConfigError::JokerRank);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("at least one deck is required")]
    NoDecks,
    #[error("bottom of {bottom} cards leaves nothing to deal from {total}")]
    BottomTooLarge { bottom: usize, total: usize },
    #[error("{total} cards minus a bottom of {bottom} do not split evenly among 4 players")]
    UnevenDeal { total: usize, bottom: usize },
    #[error("the starting rank cannot be a joker")]
    JokerRank,
}
