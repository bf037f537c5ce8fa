use crate::model::card::Card;
use crate::model::trump::TrumpContext;
use std::cmp::Reverse;
use std::vec::Vec;

/// A bag of cards. Storage is kept sorted by suit then rank so that card
/// indices stay stable between reads; `sorted_by_power` gives the display
/// order once trump is known.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Hand {
    cards: Vec<Card>,
}

impl Hand {
    pub fn new() -> Self {
        Self { cards: Vec::new() }
    }

    pub fn with_cards(cards: Vec<Card>) -> Self {
        let mut hand = Self { cards };
        hand.sort();
        hand
    }

    pub fn add(&mut self, card: Card) {
        self.cards.push(card);
        self.sort();
    }

    pub fn add_all<I: IntoIterator<Item = Card>>(&mut self, cards: I) {
        self.cards.extend(cards);
        self.sort();
    }

    pub fn remove(&mut self, card: Card) -> bool {
        if let Some(index) = self.cards.iter().position(|&c| c == card) {
            self.cards.remove(index);
            true
        } else {
            false
        }
    }

    /// Removes every card of `cards` (counting duplicates) or nothing at all.
    pub fn remove_all(&mut self, cards: &[Card]) -> bool {
        if !self.contains_all(cards) {
            return false;
        }
        for card in cards {
            self.remove(*card);
        }
        true
    }

    pub fn contains(&self, card: Card) -> bool {
        self.cards.contains(&card)
    }

    pub fn count_of(&self, card: Card) -> usize {
        self.cards.iter().filter(|&&c| c == card).count()
    }

    /// Multiset containment: three copies requested need three copies held.
    pub fn contains_all(&self, cards: &[Card]) -> bool {
        cards
            .iter()
            .all(|card| self.count_of(*card) >= cards.iter().filter(|c| *c == card).count())
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Card> {
        self.cards.iter()
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn get(&self, index: usize) -> Option<Card> {
        self.cards.get(index).copied()
    }

    pub fn clear(&mut self) {
        self.cards.clear();
    }

    /// Strongest first, ties kept in storage order.
    pub fn sorted_by_power(&self, ctx: TrumpContext) -> Vec<Card> {
        let mut sorted = self.cards.clone();
        sorted.sort_by_key(|card| Reverse(card.power(ctx, None)));
        sorted
    }

    fn sort(&mut self) {
        self.cards
            .sort_by(|a, b| a.suit.cmp(&b.suit).then(a.rank.cmp(&b.rank)));
    }
}
