use crate::model::card::Card;
use crate::model::player::PlayerPosition;
use crate::model::trump::{EffectiveSuit, TrumpContext};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const PLAYERS_PER_TRICK: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trick {
    leader: PlayerPosition,
    plays: Vec<Play>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Play {
    pub position: PlayerPosition,
    pub cards: Vec<Card>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TrickError {
    #[error("trick already complete")]
    TrickComplete,
    #[error("expected {expected} to play next but got {actual}")]
    OutOfTurn {
        expected: PlayerPosition,
        actual: PlayerPosition,
    },
    #[error("{0} has already played this trick")]
    AlreadyPlayed(PlayerPosition),
    #[error("a play needs at least one card")]
    EmptyPlay,
    #[error("the lead was {expected} card(s) but {actual} were played")]
    CountMismatch { expected: usize, actual: usize },
}

impl Trick {
    pub fn new(leader: PlayerPosition) -> Self {
        Self {
            leader,
            plays: Vec::with_capacity(PLAYERS_PER_TRICK),
        }
    }

    pub fn leader(&self) -> PlayerPosition {
        self.leader
    }

    pub fn plays(&self) -> &[Play] {
        &self.plays
    }

    pub fn is_empty(&self) -> bool {
        self.plays.is_empty()
    }

    pub fn is_complete(&self) -> bool {
        self.plays.len() == PLAYERS_PER_TRICK
    }

    pub fn lead_cards(&self) -> Option<&[Card]> {
        self.plays.first().map(|play| play.cards.as_slice())
    }

    /// Follow class fixed by the first card of the lead.
    pub fn lead_suit(&self, ctx: TrumpContext) -> Option<EffectiveSuit> {
        self.lead_cards()
            .and_then(|cards| cards.first())
            .map(|card| card.effective_suit(ctx))
    }

    pub fn card_count(&self) -> usize {
        self.plays.iter().map(|play| play.cards.len()).sum()
    }

    pub fn cards(&self) -> impl Iterator<Item = &Card> {
        self.plays.iter().flat_map(|play| play.cards.iter())
    }

    pub fn play(&mut self, position: PlayerPosition, cards: Vec<Card>) -> Result<(), TrickError> {
        if self.is_complete() {
            return Err(TrickError::TrickComplete);
        }

        if cards.is_empty() {
            return Err(TrickError::EmptyPlay);
        }

        if self.plays.iter().any(|play| play.position == position) {
            return Err(TrickError::AlreadyPlayed(position));
        }

        let expected = self.expected_position();
        if expected != position {
            return Err(TrickError::OutOfTurn {
                expected,
                actual: position,
            });
        }

        if let Some(lead) = self.lead_cards() {
            if lead.len() != cards.len() {
                return Err(TrickError::CountMismatch {
                    expected: lead.len(),
                    actual: cards.len(),
                });
            }
        }

        self.plays.push(Play { position, cards });
        Ok(())
    }

    /// Holder of the single strongest card on the table. Equal powers keep
    /// the first card seen in table order, so an earlier duplicate wins.
    pub fn winner(&self, ctx: TrumpContext) -> Option<PlayerPosition> {
        if !self.is_complete() {
            return None;
        }
        let lead = self.lead_suit(ctx);
        let mut best: Option<(u16, PlayerPosition)> = None;
        for play in &self.plays {
            for card in &play.cards {
                let power = card.power(ctx, lead);
                if best.is_none_or(|(top, _)| power > top) {
                    best = Some((power, play.position));
                }
            }
        }
        best.map(|(_, position)| position)
    }

    pub fn point_total(&self) -> u32 {
        self.cards().map(|card| card.point_value()).sum()
    }

    pub fn expected_position(&self) -> PlayerPosition {
        self.plays
            .last()
            .map(|play| play.position.next())
            .unwrap_or(self.leader)
    }
}

#[cfg(test)]
mod tests {
    use super::{Trick, TrickError};
    use crate::model::card::Card;
    use crate::model::player::PlayerPosition;
    use crate::model::rank::Rank;
    use crate::model::suit::Suit;
    use crate::model::trump::TrumpContext;

    fn c(text: &str) -> Card {
        text.parse().unwrap()
    }

    fn ctx() -> TrumpContext {
        TrumpContext::new(Some(Suit::Hearts), Rank::Two)
    }

    #[test]
    fn plays_follow_turn_order() {
        let mut trick = Trick::new(PlayerPosition::North);
        assert!(trick.play(PlayerPosition::North, vec![c("3C")]).is_ok());
        assert!(matches!(
            trick.play(PlayerPosition::South, vec![c("4C")]),
            Err(TrickError::OutOfTurn { .. })
        ));
    }

    #[test]
    fn follower_count_must_match_lead() {
        let mut trick = Trick::new(PlayerPosition::North);
        trick.play(PlayerPosition::North, vec![c("3C"), c("3C")]).unwrap();
        assert_eq!(
            trick.play(PlayerPosition::East, vec![c("4C")]),
            Err(TrickError::CountMismatch {
                expected: 2,
                actual: 1
            })
        );
        assert_eq!(
            trick.play(PlayerPosition::East, vec![]),
            Err(TrickError::EmptyPlay)
        );
    }

    #[test]
    fn winner_is_highest_power_card() {
        let mut trick = Trick::new(PlayerPosition::North);
        trick.play(PlayerPosition::North, vec![c("10C")]).unwrap();
        trick.play(PlayerPosition::East, vec![c("QC")]).unwrap();
        trick.play(PlayerPosition::South, vec![c("4H")]).unwrap();
        trick.play(PlayerPosition::West, vec![c("AS")]).unwrap();

        assert_eq!(trick.winner(ctx()), Some(PlayerPosition::South));
        assert_eq!(trick.point_total(), 10);
    }

    #[test]
    fn duplicate_top_card_goes_to_first_player() {
        let mut trick = Trick::new(PlayerPosition::East);
        trick.play(PlayerPosition::East, vec![c("KC")]).unwrap();
        trick.play(PlayerPosition::South, vec![c("KC")]).unwrap();
        trick.play(PlayerPosition::West, vec![c("5C")]).unwrap();
        trick.play(PlayerPosition::North, vec![c("3D")]).unwrap();

        assert_eq!(trick.winner(ctx()), Some(PlayerPosition::East));
        assert_eq!(trick.point_total(), 25);
    }

    #[test]
    fn incomplete_trick_has_no_winner() {
        let mut trick = Trick::new(PlayerPosition::North);
        trick.play(PlayerPosition::North, vec![c("BJ")]).unwrap();
        assert_eq!(trick.winner(ctx()), None);
        assert_eq!(trick.card_count(), 1);
        assert!(matches!(
            trick.play(PlayerPosition::North, vec![c("SJ")]),
            Err(TrickError::AlreadyPlayed(PlayerPosition::North))
        ));
    }
}
