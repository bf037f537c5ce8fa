pub mod bidding;
pub mod controller;
pub mod dealing;
pub mod events;
pub mod phase;
pub mod round;
pub mod rules;
pub mod serialization;
