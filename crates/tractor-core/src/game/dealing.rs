use crate::config::PLAYER_COUNT;
use crate::model::card::Card;
use crate::model::deck::Deck;
use crate::model::hand::Hand;
use serde::Serialize;
use std::array;
use thiserror::Error;

/// Cards handed out by one call, indexed by player id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DealBatch {
    pub cards: [Vec<Card>; PLAYER_COUNT],
    pub is_complete: bool,
    pub remaining: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DealError {
    #[error("dealing needs exactly 4 players, found {found}")]
    WrongPlayerCount { found: usize },
    #[error("dealing is already complete")]
    AlreadyComplete,
    #[error("a batch must deal at least one card per player")]
    EmptyBatch,
    #[error("{dealable} cards above the bottom cannot be split evenly among 4 players")]
    UnevenRemainder { dealable: usize },
}

/// Hands out a shuffled deck in rounds while holding back the bottom.
#[derive(Debug, Clone)]
pub struct DealingManager {
    deck: Deck,
    bottom_size: usize,
    complete: bool,
    bottom_taken: bool,
}

impl DealingManager {
    pub fn new(deck: Deck, bottom_size: usize) -> Self {
        let complete = deck.remaining() == bottom_size;
        Self {
            deck,
            bottom_size,
            complete,
            bottom_taken: false,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// Cards still in the deck, the reserved bottom included until taken.
    pub fn undealt(&self) -> usize {
        self.deck.remaining()
    }

    fn dealable(&self) -> usize {
        self.deck.remaining().saturating_sub(self.bottom_size)
    }

    /// Deals up to `per_player` cards to every player, clamped so the
    /// reserved bottom is never touched.
    pub fn deal_batch(&mut self, per_player: usize) -> Result<DealBatch, DealError> {
        if self.complete {
            return Err(DealError::AlreadyComplete);
        }
        if per_player == 0 {
            return Err(DealError::EmptyBatch);
        }

        let dealable = self.dealable();
        let max_per_player = dealable / PLAYER_COUNT;
        if max_per_player == 0 {
            return Err(DealError::UnevenRemainder { dealable });
        }

        let count = per_player.min(max_per_player);
        let mut cards: [Vec<Card>; PLAYER_COUNT] = array::from_fn(|_| Vec::with_capacity(count));
        for _ in 0..count {
            for hand in cards.iter_mut() {
                hand.extend(self.deck.draw(1));
            }
        }

        let remaining = self.deck.remaining();
        self.complete = remaining == self.bottom_size;
        Ok(DealBatch {
            cards,
            is_complete: self.complete,
            remaining,
        })
    }

    /// Deals everything above the bottom in one pass.
    pub fn deal_all(&mut self, hands: &mut [Hand]) -> Result<(), DealError> {
        if hands.len() != PLAYER_COUNT {
            return Err(DealError::WrongPlayerCount { found: hands.len() });
        }
        let dealable = self.dealable();
        if dealable % PLAYER_COUNT != 0 {
            return Err(DealError::UnevenRemainder { dealable });
        }

        let batch = self.deal_batch(dealable / PLAYER_COUNT)?;
        for (hand, cards) in hands.iter_mut().zip(batch.cards) {
            hand.add_all(cards);
        }
        Ok(())
    }

    /// The reserved bottom, available exactly once after dealing completes.
    pub fn take_bottom(&mut self) -> Option<Vec<Card>> {
        if !self.complete || self.bottom_taken {
            return None;
        }
        self.bottom_taken = true;
        Some(self.deck.draw(self.bottom_size))
    }
}

#[cfg(test)]
mod tests {
    use super::{DealError, DealingManager};
    use crate::model::deck::Deck;
    use crate::model::hand::Hand;

    fn manager() -> DealingManager {
        DealingManager::new(Deck::shuffled_with_seed(3, 7), 6)
    }

    fn deal_in_batches(size: usize) -> (Vec<usize>, usize) {
        let mut dealing = manager();
        let mut totals = vec![0usize; 4];
        let mut completions = 0;
        while !dealing.is_complete() {
            let batch = dealing.deal_batch(size).unwrap();
            for (total, cards) in totals.iter_mut().zip(batch.cards.iter()) {
                *total += cards.len();
            }
            if batch.is_complete {
                completions += 1;
                assert_eq!(batch.remaining, 6);
            } else {
                assert!(batch.remaining > 6);
            }
        }
        (totals, completions)
    }

    #[test]
    fn batch_size_does_not_change_hand_sizes() {
        for size in [1, 3, 5, 39, 100] {
            let (totals, completions) = deal_in_batches(size);
            assert_eq!(totals, vec![39; 4], "batch size {size}");
            assert_eq!(completions, 1, "batch size {size}");
        }
    }

    #[test]
    fn batches_are_equal_per_player() {
        let mut dealing = manager();
        let batch = dealing.deal_batch(3).unwrap();
        assert!(batch.cards.iter().all(|cards| cards.len() == 3));
        assert_eq!(batch.remaining, 150);
    }

    #[test]
    fn dealing_after_completion_fails() {
        let mut dealing = manager();
        dealing.deal_batch(39).unwrap();
        assert_eq!(dealing.deal_batch(3), Err(DealError::AlreadyComplete));
    }

    #[test]
    fn bottom_is_available_once() {
        let mut dealing = manager();
        assert!(dealing.take_bottom().is_none());
        dealing.deal_batch(39).unwrap();
        let bottom = dealing.take_bottom().unwrap();
        assert_eq!(bottom.len(), 6);
        assert_eq!(dealing.undealt(), 0);
        assert!(dealing.take_bottom().is_none());
    }

    #[test]
    fn bulk_deal_requires_four_hands() {
        let mut dealing = manager();
        let mut three = vec![Hand::new(), Hand::new(), Hand::new()];
        assert_eq!(
            dealing.deal_all(&mut three),
            Err(DealError::WrongPlayerCount { found: 3 })
        );

        let mut four = vec![Hand::new(), Hand::new(), Hand::new(), Hand::new()];
        dealing.deal_all(&mut four).unwrap();
        assert!(four.iter().all(|hand| hand.len() == 39));
        assert!(dealing.is_complete());
    }

    #[test]
    fn uneven_remainder_fails_loudly() {
        let mut dealing = DealingManager::new(Deck::standard(1), 6);
        // 48 dealable: 12 each.
        dealing.deal_batch(12).unwrap();
        assert!(dealing.is_complete());

        let mut odd = DealingManager::new(Deck::standard(1), 5);
        // 49 dealable: 12 each then one stray card.
        let batch = odd.deal_batch(20).unwrap();
        assert!(!batch.is_complete);
        assert_eq!(batch.remaining, 6);
        assert_eq!(
            odd.deal_batch(1),
            Err(DealError::UnevenRemainder { dealable: 1 })
        );
    }

    #[test]
    fn zero_batch_is_rejected() {
        let mut dealing = manager();
        assert_eq!(dealing.deal_batch(0), Err(DealError::EmptyBatch));
    }
}
