use crate::game::dealing::DealBatch;
use crate::game::phase::GamePhase;
use crate::game::round::{CompletedTrick, RoundSummary};

/// Host callbacks, fired synchronously after the matching mutation has
/// been applied. Every hook defaults to doing nothing.
pub trait GameObserver {
    fn state_changed(&mut self, _phase: GamePhase) {}

    fn cards_dealt(&mut self, _batch: &DealBatch) {}

    fn trick_complete(&mut self, _trick: &CompletedTrick) {}

    fn round_ended(&mut self, _summary: &RoundSummary) {}
}
