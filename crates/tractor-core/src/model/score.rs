use crate::model::card::Card;
use crate::model::player::Team;
use crate::model::rank::Rank;
use serde::{Deserialize, Serialize};

/// Points collected by each team during the current round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ScoreBoard {
    totals: [u32; 2],
}

impl ScoreBoard {
    pub const fn new() -> Self {
        Self { totals: [0; 2] }
    }

    pub fn credit(&mut self, team: Team, points: u32) {
        self.totals[team.index()] += points;
    }

    pub fn points(&self, team: Team) -> u32 {
        self.totals[team.index()]
    }

    pub fn totals(&self) -> &[u32; 2] {
        &self.totals
    }
}

pub fn points_in(cards: &[Card]) -> u32 {
    cards.iter().map(|card| card.point_value()).sum()
}

/// Bonus for the bottom when the defenders take the last trick: its points
/// doubled once per card in the winning lead.
pub fn bottom_bonus(bottom: &[Card], last_lead_size: usize) -> u32 {
    points_in(bottom) * 2 * last_lead_size as u32
}

/// Level movement derived from the defenders' total. Attackers are the
/// declaring (dealer's) side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "side", content = "levels")]
pub enum LevelChange {
    Attackers(u8),
    Hold,
    Defenders(u8),
}

impl LevelChange {
    pub const fn from_defender_points(points: u32) -> Self {
        match points {
            0..40 => LevelChange::Attackers(3),
            40..80 => LevelChange::Attackers(2),
            80..120 => LevelChange::Attackers(1),
            120..160 => LevelChange::Hold,
            _ => LevelChange::Defenders(1),
        }
    }
}

/// Per-team level counters; these outlive individual rounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamLevels {
    levels: [Rank; 2],
}

impl TeamLevels {
    pub const fn starting_at(rank: Rank) -> Self {
        Self {
            levels: [rank, rank],
        }
    }

    pub fn level(&self, team: Team) -> Rank {
        self.levels[team.index()]
    }

    pub fn apply(&mut self, change: LevelChange, attackers: Team) {
        let (team, steps) = match change {
            LevelChange::Attackers(steps) => (attackers, steps),
            LevelChange::Defenders(steps) => (attackers.other(), steps),
            LevelChange::Hold => return,
        };
        let slot = &mut self.levels[team.index()];
        *slot = slot.advance(steps);
    }
}

#[cfg(test)]
mod tests {
    use super::{LevelChange, ScoreBoard, TeamLevels, bottom_bonus};
    use crate::model::card::Card;
    use crate::model::player::Team;
    use crate::model::rank::Rank;
    use crate::model::suit::Suit;

    #[test]
    fn scoreboard_credits_teams() {
        let mut board = ScoreBoard::new();
        board.credit(Team::EastWest, 25);
        board.credit(Team::EastWest, 10);
        assert_eq!(board.points(Team::EastWest), 35);
        assert_eq!(board.points(Team::NorthSouth), 0);
    }

    #[test]
    fn thresholds_are_exclusive_upper_bounds() {
        assert_eq!(LevelChange::from_defender_points(0), LevelChange::Attackers(3));
        assert_eq!(LevelChange::from_defender_points(39), LevelChange::Attackers(3));
        assert_eq!(LevelChange::from_defender_points(40), LevelChange::Attackers(2));
        assert_eq!(LevelChange::from_defender_points(79), LevelChange::Attackers(2));
        assert_eq!(LevelChange::from_defender_points(80), LevelChange::Attackers(1));
        assert_eq!(LevelChange::from_defender_points(119), LevelChange::Attackers(1));
        assert_eq!(LevelChange::from_defender_points(120), LevelChange::Hold);
        assert_eq!(LevelChange::from_defender_points(159), LevelChange::Hold);
        assert_eq!(LevelChange::from_defender_points(160), LevelChange::Defenders(1));
        assert_eq!(LevelChange::from_defender_points(300), LevelChange::Defenders(1));
    }

    #[test]
    fn levels_move_for_the_right_team() {
        let mut levels = TeamLevels::starting_at(Rank::Two);
        levels.apply(LevelChange::Attackers(3), Team::NorthSouth);
        assert_eq!(levels.level(Team::NorthSouth), Rank::Five);
        levels.apply(LevelChange::Defenders(1), Team::NorthSouth);
        assert_eq!(levels.level(Team::EastWest), Rank::Three);
        levels.apply(LevelChange::Hold, Team::EastWest);
        assert_eq!(levels.level(Team::EastWest), Rank::Three);
    }

    #[test]
    fn bottom_bonus_scales_with_lead_size() {
        let bottom = [
            Card::new(Rank::King, Suit::Clubs),
            Card::new(Rank::Five, Suit::Hearts),
            Card::BIG_JOKER,
        ];
        assert_eq!(bottom_bonus(&bottom, 1), 30);
        assert_eq!(bottom_bonus(&bottom, 2), 60);
    }
}
