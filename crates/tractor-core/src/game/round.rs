use crate::game::bidding::TrumpState;
use crate::model::card::Card;
use crate::model::player::{PlayerPosition, Team};
use crate::model::rank::Rank;
use crate::model::score::{LevelChange, ScoreBoard, TeamLevels, bottom_bonus};
use crate::model::suit::Suit;
use crate::model::trick::Trick;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletedTrick {
    pub trick: Trick,
    pub winner: PlayerPosition,
    pub points: u32,
}

/// Everything that lives for one round and is thrown away by the next
/// `start_round`. The dealer doubles as the declarer once trump is
/// declared; the dealer's team attacks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundContext {
    round_number: u32,
    dealer: PlayerPosition,
    trump: TrumpState,
    bottom: Vec<Card>,
    current_trick: Trick,
    tricks: Vec<CompletedTrick>,
    collected: ScoreBoard,
}

impl RoundContext {
    pub fn new(round_number: u32, dealer: PlayerPosition, trump: TrumpState) -> Self {
        Self {
            round_number,
            dealer,
            trump,
            bottom: Vec::new(),
            current_trick: Trick::new(dealer),
            tricks: Vec::new(),
            collected: ScoreBoard::new(),
        }
    }

    pub fn round_number(&self) -> u32 {
        self.round_number
    }

    pub fn dealer(&self) -> PlayerPosition {
        self.dealer
    }

    pub fn attackers(&self) -> Team {
        self.dealer.team()
    }

    pub fn trump(&self) -> &TrumpState {
        &self.trump
    }

    pub fn bottom(&self) -> &[Card] {
        &self.bottom
    }

    pub fn current_trick(&self) -> &Trick {
        &self.current_trick
    }

    pub fn tricks(&self) -> &[CompletedTrick] {
        &self.tricks
    }

    pub fn collected(&self) -> &ScoreBoard {
        &self.collected
    }

    pub(crate) fn trump_mut(&mut self) -> &mut TrumpState {
        &mut self.trump
    }

    pub(crate) fn set_dealer(&mut self, dealer: PlayerPosition) {
        self.dealer = dealer;
        if self.current_trick.is_empty() && self.tricks.is_empty() {
            self.current_trick = Trick::new(dealer);
        }
    }

    pub(crate) fn set_bottom(&mut self, bottom: Vec<Card>) {
        self.bottom = bottom;
    }

    pub(crate) fn current_trick_mut(&mut self) -> &mut Trick {
        &mut self.current_trick
    }

    /// Files the finished current trick under `winner` and opens the next
    /// one with the winner on lead.
    pub(crate) fn close_trick(&mut self, winner: PlayerPosition) -> &CompletedTrick {
        let trick = std::mem::replace(&mut self.current_trick, Trick::new(winner));
        let points = trick.point_total();
        self.collected.credit(winner.team(), points);
        self.tricks.push(CompletedTrick {
            trick,
            winner,
            points,
        });
        let last = self.tricks.len() - 1;
        &self.tricks[last]
    }

    /// Cards on the table: completed tricks plus the trick in progress.
    pub fn cards_played(&self) -> usize {
        self.tricks
            .iter()
            .map(|done| done.trick.card_count())
            .sum::<usize>()
            + self.current_trick.card_count()
    }

    /// Scores the round. When `score_bottom` is set and the defenders took
    /// the last trick, the bottom is paid out to them before the level
    /// change is read off their total.
    pub fn settle(&mut self, score_bottom: bool, levels: &mut TeamLevels) -> RoundSummary {
        let attackers = self.attackers();
        let defenders = attackers.other();

        let mut bonus = 0;
        if score_bottom {
            if let Some(last) = self.tricks.last() {
                if last.winner.team() == defenders {
                    let lead_size = last.trick.lead_cards().map_or(0, <[Card]>::len);
                    bonus = bottom_bonus(&self.bottom, lead_size);
                }
            }
        }
        self.collected.credit(defenders, bonus);

        let defender_points = self.collected.points(defenders);
        let level_change = LevelChange::from_defender_points(defender_points);
        levels.apply(level_change, attackers);

        RoundSummary {
            round_number: self.round_number,
            dealer: self.dealer,
            attackers,
            trump_suit: self.trump.suit(),
            trump_rank: self.trump.rank(),
            points: *self.collected.totals(),
            bottom_bonus: bonus,
            defender_points,
            level_change,
            levels: *levels,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundSummary {
    pub round_number: u32,
    pub dealer: PlayerPosition,
    pub attackers: Team,
    pub trump_suit: Option<Suit>,
    pub trump_rank: Rank,
    /// Per-team points, indexed by `Team::index`, bottom bonus included.
    pub points: [u32; 2],
    pub bottom_bonus: u32,
    pub defender_points: u32,
    pub level_change: LevelChange,
    pub levels: TeamLevels,
}

#[cfg(test)]
mod tests {
    use super::RoundContext;
    use crate::game::bidding::TrumpState;
    use crate::model::card::Card;
    use crate::model::player::{PlayerPosition, Team};
    use crate::model::rank::Rank;
    use crate::model::score::{LevelChange, TeamLevels};

    fn c(text: &str) -> Card {
        text.parse().unwrap()
    }

    fn play_trick(round: &mut RoundContext, cards: [&str; 4]) -> PlayerPosition {
        let ctx = round.trump().context();
        let mut seat = round.current_trick().leader();
        for text in cards {
            round.current_trick_mut().play(seat, vec![c(text)]).unwrap();
            seat = seat.next();
        }
        let winner = round.current_trick().winner(ctx).unwrap();
        round.close_trick(winner);
        winner
    }

    #[test]
    fn closing_a_trick_credits_the_winner_and_passes_the_lead() {
        let mut round = RoundContext::new(1, PlayerPosition::North, TrumpState::new(Rank::Two, false));
        let winner = play_trick(&mut round, ["KC", "AC", "5C", "3C"]);
        assert_eq!(winner, PlayerPosition::East);
        assert_eq!(round.collected().points(Team::EastWest), 15);
        assert_eq!(round.current_trick().leader(), PlayerPosition::East);
        assert_eq!(round.cards_played(), 4);
    }

    #[test]
    fn defenders_taking_the_last_trick_collect_the_bottom() {
        let mut round = RoundContext::new(1, PlayerPosition::North, TrumpState::new(Rank::Two, false));
        round.set_bottom(vec![c("KD"), c("10D"), c("5S"), c("3S"), c("4S"), c("6S")]);
        play_trick(&mut round, ["3C", "AC", "4C", "6C"]);

        let mut levels = TeamLevels::starting_at(Rank::Two);
        let summary = round.settle(true, &mut levels);
        assert_eq!(summary.attackers, Team::NorthSouth);
        assert_eq!(summary.bottom_bonus, 50);
        assert_eq!(summary.defender_points, 50);
        assert_eq!(summary.level_change, LevelChange::Attackers(2));
        assert_eq!(levels.level(Team::NorthSouth), Rank::Four);
    }

    #[test]
    fn bottom_is_ignored_when_disabled_or_kept_by_attackers() {
        let bottom = vec![c("KD"), c("10D")];

        let mut disabled = RoundContext::new(1, PlayerPosition::North, TrumpState::new(Rank::Two, false));
        disabled.set_bottom(bottom.clone());
        play_trick(&mut disabled, ["3C", "AC", "4C", "6C"]);
        let summary = disabled.settle(false, &mut TeamLevels::starting_at(Rank::Two));
        assert_eq!(summary.bottom_bonus, 0);

        let mut kept = RoundContext::new(1, PlayerPosition::North, TrumpState::new(Rank::Two, false));
        kept.set_bottom(bottom);
        play_trick(&mut kept, ["AC", "3C", "4C", "6C"]);
        let summary = kept.settle(true, &mut TeamLevels::starting_at(Rank::Two));
        assert_eq!(summary.bottom_bonus, 0);
        assert_eq!(summary.level_change, LevelChange::Attackers(3));
    }
}
