use core::fmt;
use serde::{Deserialize, Serialize};

/// Where a session stands. `Tribute`, `BottomReveal`, `BottomBury` and
/// `KingBury` are reserved: the controller goes from `Dealing` straight to
/// `Playing` and never enters them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GamePhase {
    #[default]
    Waiting,
    Dealing,
    Tribute,
    BottomReveal,
    BottomBury,
    KingBury,
    Playing,
    RoundEnd,
    GameEnd,
}

impl GamePhase {
    pub const fn as_str(self) -> &'static str {
        match self {
            GamePhase::Waiting => "waiting",
            GamePhase::Dealing => "dealing",
            GamePhase::Tribute => "tribute",
            GamePhase::BottomReveal => "bottom_reveal",
            GamePhase::BottomBury => "bottom_bury",
            GamePhase::KingBury => "king_bury",
            GamePhase::Playing => "playing",
            GamePhase::RoundEnd => "round_end",
            GamePhase::GameEnd => "game_end",
        }
    }

    /// Phases from which a new round may be started.
    pub const fn accepts_new_round(self) -> bool {
        matches!(self, GamePhase::Waiting | GamePhase::RoundEnd)
    }

    pub const fn is_reserved(self) -> bool {
        matches!(
            self,
            GamePhase::Tribute | GamePhase::BottomReveal | GamePhase::BottomBury | GamePhase::KingBury
        )
    }
}

impl fmt::Display for GamePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::GamePhase;

    #[test]
    fn serde_names_match_display() {
        for phase in [
            GamePhase::Waiting,
            GamePhase::BottomReveal,
            GamePhase::RoundEnd,
            GamePhase::GameEnd,
        ] {
            let json = serde_json::to_string(&phase).unwrap();
            assert_eq!(json, format!("\"{phase}\""));
        }
    }

    #[test]
    fn only_idle_phases_start_rounds() {
        assert!(GamePhase::Waiting.accepts_new_round());
        assert!(GamePhase::RoundEnd.accepts_new_round());
        assert!(!GamePhase::Playing.accepts_new_round());
        assert!(!GamePhase::GameEnd.accepts_new_round());
        assert!(GamePhase::KingBury.is_reserved());
        assert!(!GamePhase::Dealing.is_reserved());
    }
}
