use crate::model::card::Card;
use crate::model::rank::Rank;
use crate::model::suit::Suit;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

pub const CARDS_PER_DECK: usize = 54;

/// The union of `decks` standard 54-card decks. Cards are drawn from the
/// back of the vector.
#[derive(Debug, Clone)]
pub struct Deck {
    cards: Vec<Card>,
}

impl Deck {
    pub fn standard(decks: usize) -> Self {
        let mut cards = Vec::with_capacity(decks * CARDS_PER_DECK);
        for _ in 0..decks {
            for suit in Suit::ALL.iter().copied() {
                for rank in Rank::ORDERED.iter().copied() {
                    cards.push(Card::new(rank, suit));
                }
            }
            cards.push(Card::SMALL_JOKER);
            cards.push(Card::BIG_JOKER);
        }
        Self { cards }
    }

    pub fn shuffled<R: rand::Rng + ?Sized>(decks: usize, rng: &mut R) -> Self {
        let mut deck = Self::standard(decks);
        deck.shuffle_in_place(rng);
        deck
    }

    pub fn shuffled_with_seed(decks: usize, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        Self::shuffled(decks, &mut rng)
    }

    pub fn shuffle_in_place<R: rand::Rng + ?Sized>(&mut self, rng: &mut R) {
        self.cards.shuffle(rng);
    }

    /// Removes up to `count` cards from the top of the deck.
    pub fn draw(&mut self, count: usize) -> Vec<Card> {
        let split = self.cards.len().saturating_sub(count);
        let mut drawn = self.cards.split_off(split);
        drawn.reverse();
        drawn
    }

    pub fn remaining(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }
}
