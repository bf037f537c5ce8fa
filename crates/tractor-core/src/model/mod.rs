pub mod card;
pub mod deck;
pub mod hand;
pub mod player;
pub mod rank;
pub mod score;
pub mod shape;
pub mod suit;
pub mod trick;
pub mod trump;
