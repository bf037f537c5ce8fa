use super::controller::GameController;
use crate::game::bidding::BidLevel;
use crate::game::phase::GamePhase;
use crate::game::round::CompletedTrick;
use crate::model::card::Card;
use crate::model::player::PlayerPosition;
use crate::model::rank::Rank;
use crate::model::score::TeamLevels;
use crate::model::suit::Suit;
use crate::model::trick::Trick;
use serde::{Deserialize, Serialize};

/// Point-in-time view of a session for hosts that persist or transmit it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RoundSnapshot {
    pub seed: u64,
    pub phase: GamePhase,
    pub round_number: u32,
    pub trump_rank: Rank,
    pub trump_suit: Option<Suit>,
    pub trump_declarer: Option<PlayerPosition>,
    pub trump_bid: Option<BidLevel>,
    pub trump_locked: bool,
    pub dealer: PlayerPosition,
    pub bottom: Vec<Card>,
    pub hands: Vec<Vec<Card>>,
    pub current_trick: Trick,
    #[serde(default)]
    pub completed_tricks: Vec<CompletedTrick>,
    pub collected_points: [u32; 2],
    pub levels: TeamLevels,
}

impl RoundSnapshot {
    pub fn capture(game: &GameController) -> Self {
        let round = game.round();
        let trump = round.trump();
        RoundSnapshot {
            seed: game.seed(),
            phase: game.phase(),
            round_number: round.round_number(),
            trump_rank: trump.rank(),
            trump_suit: trump.suit(),
            trump_declarer: trump.declarer(),
            trump_bid: trump.bid(),
            trump_locked: trump.is_locked(),
            dealer: round.dealer(),
            bottom: round.bottom().to_vec(),
            hands: game
                .players()
                .iter()
                .map(|player| player.hand().cards().to_vec())
                .collect(),
            current_trick: round.current_trick().clone(),
            completed_tricks: round.tricks().to_vec(),
            collected_points: *round.collected().totals(),
            levels: *game.levels(),
        }
    }

    pub fn to_json(game: &GameController) -> serde_json::Result<String> {
        let snapshot = Self::capture(game);
        serde_json::to_string_pretty(&snapshot)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// Cards held, on the table and in the bottom.
    pub fn card_count(&self) -> usize {
        self.hands.iter().map(Vec::len).sum::<usize>()
            + self.bottom.len()
            + self.current_trick.card_count()
            + self
                .completed_tricks
                .iter()
                .map(|done| done.trick.card_count())
                .sum::<usize>()
    }
}

#[cfg(test)]
mod tests {
    use super::RoundSnapshot;
    use crate::config::GameConfig;
    use crate::game::controller::GameController;
    use crate::game::phase::GamePhase;

    fn dealt_game(seed: u64) -> GameController {
        let mut game = GameController::with_seed(GameConfig::default(), seed).unwrap();
        game.initialize(&["n", "e", "s", "w"]).unwrap();
        game.start_round(3).unwrap();
        game.deal_next_batch(39).unwrap();
        game.complete_dealing().unwrap();
        game
    }

    #[test]
    fn snapshot_serializes_to_json() {
        let game = dealt_game(99);
        let json = RoundSnapshot::to_json(&game).unwrap();
        assert!(json.contains("\"seed\": 99"));
        assert!(json.contains("\"phase\": \"playing\""));
        assert!(json.contains("\"round_number\": 1"));
    }

    #[test]
    fn snapshot_roundtrip_keeps_every_card() {
        let mut game = dealt_game(42);
        let seat = game.current_player().unwrap().id();
        let lead = game.fallback_play(seat).unwrap();
        game.play_cards(seat, &lead).unwrap();

        let json = RoundSnapshot::to_json(&game).unwrap();
        let restored = RoundSnapshot::from_json(&json).unwrap();
        assert_eq!(restored, RoundSnapshot::capture(&game));
        assert_eq!(restored.card_count(), 162);
        assert_eq!(restored.phase, GamePhase::Playing);
        assert_eq!(restored.current_trick.card_count(), 1);
        assert!(restored.trump_suit.is_some());
    }
}
