pub mod config;
pub mod game;
pub mod model;

pub use config::{FollowPolicy, GameConfig};
pub use game::controller::{GameController, GameError, PlayOutcome};
pub use game::events::GameObserver;
pub use game::phase::GamePhase;

pub struct AppInfo;

impl AppInfo {
    pub const fn name() -> &'static str {
        "tractor"
    }

    pub const fn version() -> &'static str {
        env!("CARGO_PKG_VERSION")
    }
}

#[cfg(test)]
mod tests {
    use super::AppInfo;

    #[test]
    fn exposes_static_metadata() {
        assert_eq!(AppInfo::name(), "tractor");
        assert!(!AppInfo::version().is_empty());
    }
}
