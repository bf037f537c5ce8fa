//! The session state machine and the only mutation surface a host uses.
//!
//! Every operation either applies in full or returns an error with the
//! session untouched. Observers are notified after the mutation lands.

use crate::config::{ConfigError, GameConfig, PLAYER_COUNT};
use crate::game::bidding::{Declaration, DeclarationError, DeclarationOutcome, TrumpState};
use crate::game::dealing::{DealBatch, DealError, DealingManager};
use crate::game::events::GameObserver;
use crate::game::phase::GamePhase;
use crate::game::round::{RoundContext, RoundSummary};
use crate::game::rules::{PlayError, RuleEngine};
use crate::model::card::Card;
use crate::model::deck::Deck;
use crate::model::player::{Player, PlayerPosition};
use crate::model::rank::Rank;
use crate::model::score::TeamLevels;
use crate::model::suit::Suit;
use rand::SeedableRng;
use rand::rngs::StdRng;
use thiserror::Error;
use tracing::{Level, event};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("must have 4 players, got {found}")]
    WrongPlayerCount { found: usize },
    #[error("players not ready")]
    PlayersNotReady,
    #[error("{operation} is not allowed during {phase}")]
    InvalidPhase {
        phase: GamePhase,
        operation: &'static str,
    },
    #[error("unknown player {0}")]
    UnknownPlayer(usize),
    #[error("dealing is not finished: {remaining} cards left above the bottom")]
    DealingIncomplete { remaining: usize },
    #[error("{0} cannot be the active rank")]
    InvalidTrumpRank(Rank),
    #[error(transparent)]
    Deal(#[from] DealError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayOutcome {
    Played,
    TrickCompleted {
        winner: PlayerPosition,
        points: u32,
    },
    RoundCompleted {
        winner: PlayerPosition,
        points: u32,
        summary: RoundSummary,
    },
}

pub struct GameController {
    config: GameConfig,
    rules: RuleEngine,
    seed: u64,
    rng: StdRng,
    phase: GamePhase,
    players: Vec<Player>,
    trump_rank: Rank,
    levels: TeamLevels,
    rounds_played: u32,
    round: RoundContext,
    dealing: Option<DealingManager>,
    last_summary: Option<RoundSummary>,
    observers: Vec<Box<dyn GameObserver>>,
}

impl GameController {
    pub fn new(config: GameConfig) -> Result<Self, GameError> {
        Self::with_seed(config, rand::random())
    }

    pub fn with_seed(config: GameConfig, seed: u64) -> Result<Self, GameError> {
        config.validate()?;
        let trump_rank = config.starting_rank;
        Ok(Self {
            rules: RuleEngine::new(&config),
            seed,
            rng: StdRng::seed_from_u64(seed),
            phase: GamePhase::Waiting,
            players: Vec::new(),
            trump_rank,
            levels: TeamLevels::starting_at(trump_rank),
            rounds_played: 0,
            round: RoundContext::new(0, PlayerPosition::North, TrumpState::new(trump_rank, false)),
            dealing: None,
            last_summary: None,
            observers: Vec::new(),
            config,
        })
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn rules(&self) -> &RuleEngine {
        &self.rules
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn player(&self, id: usize) -> Option<&Player> {
        self.players.get(id)
    }

    pub fn trump_rank(&self) -> Rank {
        self.trump_rank
    }

    pub fn levels(&self) -> &TeamLevels {
        &self.levels
    }

    pub fn round(&self) -> &RoundContext {
        &self.round
    }

    pub fn last_summary(&self) -> Option<&RoundSummary> {
        self.last_summary.as_ref()
    }

    pub fn add_observer(&mut self, observer: Box<dyn GameObserver>) {
        self.observers.push(observer);
    }

    /// Seats exactly four players, in id order.
    pub fn initialize<S: AsRef<str>>(&mut self, names: &[S]) -> Result<(), GameError> {
        if self.phase != GamePhase::Waiting {
            return Err(self.wrong_phase("initialize"));
        }
        if names.len() != PLAYER_COUNT {
            return Err(GameError::WrongPlayerCount { found: names.len() });
        }
        self.players = PlayerPosition::LOOP
            .iter()
            .zip(names)
            .map(|(position, name)| Player::new(*position, name.as_ref()))
            .collect();
        event!(
            target: "tractor_core::controller",
            Level::INFO,
            players = self.players.len(),
            seed = self.seed,
            "session initialized"
        );
        self.notify_state();
        Ok(())
    }

    /// Resets every round-scoped field, shuffles a fresh deck and opens the
    /// dealing phase with `dealer` as the provisional dealer.
    pub fn start_round(&mut self, dealer: usize) -> Result<(), GameError> {
        if self.players.len() != PLAYER_COUNT {
            return Err(GameError::PlayersNotReady);
        }
        if !self.phase.accepts_new_round() {
            return Err(self.wrong_phase("start_round"));
        }
        let dealer = PlayerPosition::from_index(dealer).ok_or(GameError::UnknownPlayer(dealer))?;

        for player in &mut self.players {
            player.reset_for_round();
        }
        self.rounds_played += 1;
        let opening_round = self.rounds_played == 1 && self.config.first_round_big_joker_only;
        let trump = TrumpState::new(self.trump_rank, opening_round);
        self.round = RoundContext::new(self.rounds_played, dealer, trump);

        let deck = Deck::shuffled(self.config.decks, &mut self.rng);
        self.dealing = Some(DealingManager::new(deck, self.config.bottom_size));
        self.phase = GamePhase::Dealing;

        event!(
            target: "tractor_core::controller",
            Level::INFO,
            round = self.rounds_played,
            dealer = %dealer,
            trump_rank = %self.trump_rank,
            "round started"
        );
        self.notify_state();
        Ok(())
    }

    /// Deals up to `per_player` cards to each seat. The bottom is set aside
    /// on the batch that completes the deal.
    pub fn deal_next_batch(&mut self, per_player: usize) -> Result<DealBatch, GameError> {
        if self.phase != GamePhase::Dealing {
            return Err(self.wrong_phase("deal_next_batch"));
        }
        let dealing = self.dealing.as_mut().ok_or(DealError::AlreadyComplete)?;
        let batch = dealing.deal_batch(per_player)?;
        if batch.is_complete {
            if let Some(bottom) = dealing.take_bottom() {
                self.round.set_bottom(bottom);
            }
        }

        for (player, cards) in self.players.iter_mut().zip(batch.cards.iter()) {
            player.hand_mut().add_all(cards.iter().copied());
        }

        event!(
            target: "tractor_core::controller",
            Level::DEBUG,
            per_player = batch.cards[0].len(),
            remaining = batch.remaining,
            complete = batch.is_complete,
            "batch dealt"
        );
        for observer in &mut self.observers {
            observer.cards_dealt(&batch);
        }
        Ok(batch)
    }

    /// Deals everything that is left above the bottom in one batch.
    pub fn deal_all(&mut self) -> Result<DealBatch, GameError> {
        let remaining = self
            .dealing
            .as_ref()
            .map_or(0, |dealing| dealing.undealt().saturating_sub(self.config.bottom_size));
        self.deal_next_batch((remaining / PLAYER_COUNT).max(1))
    }

    /// Shows the cards at `card_indices` of the player's hand as a trump
    /// claim. Only valid while dealing; an accepted claim makes the
    /// declarer the dealer.
    pub fn declare_trump(
        &mut self,
        player: usize,
        card_indices: &[usize],
        declared_suit: Option<Suit>,
    ) -> Result<DeclarationOutcome, DeclarationError> {
        let result = self
            .declaration_at(player, card_indices, declared_suit)
            .and_then(|declaration| self.round.trump_mut().declare(&declaration));
        match &result {
            Ok(outcome) => {
                self.round.set_dealer(outcome.declarer);
                self.notify_state();
            }
            Err(error) => {
                event!(
                    target: "tractor_core::controller",
                    Level::DEBUG,
                    player,
                    reason = %error,
                    "declaration rejected"
                );
            }
        }
        result
    }

    fn declaration_at(
        &self,
        player: usize,
        card_indices: &[usize],
        declared_suit: Option<Suit>,
    ) -> Result<Declaration, DeclarationError> {
        if self.phase != GamePhase::Dealing {
            return Err(DeclarationError::NotDealingPhase);
        }
        let seat = self
            .players
            .get(player)
            .ok_or(DeclarationError::UnknownPlayer(player))?;
        let hand = seat.hand();

        let mut cards = Vec::with_capacity(card_indices.len());
        for (position, &index) in card_indices.iter().enumerate() {
            if card_indices[..position].contains(&index) {
                return Err(DeclarationError::DuplicateIndex(index));
            }
            let card = hand.get(index).ok_or(DeclarationError::IndexOutOfRange {
                index,
                hand_size: hand.len(),
            })?;
            cards.push(card);
        }

        Ok(Declaration {
            player: seat.position(),
            cards,
            declared_suit,
        })
    }

    /// Moves a fully dealt round into play. Outside the dealing phase this
    /// does nothing. With no accepted declaration, trump is read off the
    /// bottom.
    pub fn complete_dealing(&mut self) -> Result<(), GameError> {
        if self.phase != GamePhase::Dealing {
            return Ok(());
        }
        let remaining = self
            .dealing
            .as_ref()
            .filter(|dealing| !dealing.is_complete())
            .map(|dealing| dealing.undealt().saturating_sub(self.config.bottom_size));
        if let Some(remaining) = remaining {
            return Err(GameError::DealingIncomplete { remaining });
        }

        if self.round.trump().suit().is_none() {
            let bottom = self.round.bottom().to_vec();
            let suit = self.round.trump_mut().infer_from_bottom(&bottom);
            event!(
                target: "tractor_core::controller",
                Level::INFO,
                suit = %suit,
                "trump inferred from bottom"
            );
        }
        let dealer = self.round.dealer();
        self.round.set_dealer(dealer);
        self.phase = GamePhase::Playing;

        event!(
            target: "tractor_core::controller",
            Level::INFO,
            dealer = %dealer,
            trump_suit = ?self.round.trump().suit(),
            trump_rank = %self.round.trump().rank(),
            "play begins"
        );
        self.notify_state();
        Ok(())
    }

    /// Checks a play without applying it.
    pub fn check_play(&self, player: usize, cards: &[Card]) -> Result<PlayerPosition, PlayError> {
        if self.phase != GamePhase::Playing {
            return Err(PlayError::NotInPlayPhase);
        }
        let seat = self
            .players
            .get(player)
            .ok_or(PlayError::UnknownPlayer(player))?;
        let expected = self.round.current_trick().expected_position();
        if seat.position() != expected {
            return Err(PlayError::OutOfTurn {
                expected,
                actual: seat.position(),
            });
        }
        self.rules.validate(
            seat.hand(),
            cards,
            self.round.current_trick(),
            self.round.trump().context(),
        )?;
        Ok(seat.position())
    }

    pub fn play_cards(&mut self, player: usize, cards: &[Card]) -> Result<PlayOutcome, PlayError> {
        let position = match self.check_play(player, cards) {
            Ok(position) => position,
            Err(error) => {
                event!(
                    target: "tractor_core::controller",
                    Level::DEBUG,
                    player,
                    reason = %error,
                    "play rejected"
                );
                return Err(error);
            }
        };

        self.round
            .current_trick_mut()
            .play(position, cards.to_vec())?;
        self.players[position.index()].hand_mut().remove_all(cards);

        if !self.round.current_trick().is_complete() {
            return Ok(PlayOutcome::Played);
        }

        let ctx = self.round.trump().context();
        let winner = self
            .rules
            .trick_winner(self.round.current_trick(), ctx)
            .unwrap_or(position);
        let completed = self.round.close_trick(winner);
        let points = completed.points;
        self.players[winner.index()].add_score(points);

        if tracing::enabled!(Level::INFO) {
            event!(
                target: "tractor_core::controller",
                Level::INFO,
                trick = self.round.tricks().len(),
                winner = %winner,
                points,
                "trick complete"
            );
        }
        if let Some(completed) = self.round.tricks().last() {
            for observer in &mut self.observers {
                observer.trick_complete(completed);
            }
        }

        if !self.is_round_over() {
            return Ok(PlayOutcome::TrickCompleted { winner, points });
        }

        let summary = self.round.settle(self.config.score_bottom, &mut self.levels);
        self.phase = GamePhase::RoundEnd;
        self.last_summary = Some(summary.clone());
        event!(
            target: "tractor_core::controller",
            Level::INFO,
            round = summary.round_number,
            attackers = %summary.attackers,
            defender_points = summary.defender_points,
            bottom_bonus = summary.bottom_bonus,
            level_change = ?summary.level_change,
            "round ended"
        );
        self.notify_state();
        for observer in &mut self.observers {
            observer.round_ended(&summary);
        }
        Ok(PlayOutcome::RoundCompleted {
            winner,
            points,
            summary,
        })
    }

    /// The seat expected to play next, while a round is being played.
    pub fn current_player(&self) -> Option<&Player> {
        if self.phase != GamePhase::Playing {
            return None;
        }
        let expected = self.round.current_trick().expected_position();
        self.players.get(expected.index())
    }

    /// Cards of `player` that can appear in a legal play on the current
    /// trick. Empty outside the playing phase or for an unknown player.
    pub fn valid_cards(&self, player: usize) -> Vec<Card> {
        match self.playing_seat(player) {
            Some(seat) => self.rules.valid_cards(
                seat.hand(),
                self.round.current_trick(),
                self.round.trump().context(),
            ),
            None => Vec::new(),
        }
    }

    /// Legal plays for `player`, enumerated lazily; long follows can have
    /// millions of them, so take what you need.
    pub fn legal_plays(&self, player: usize) -> Box<dyn Iterator<Item = Vec<Card>> + '_> {
        match self.playing_seat(player) {
            Some(seat) => self.rules.legal_plays(
                seat.hand(),
                self.round.current_trick(),
                self.round.trump().context(),
            ),
            None => Box::new(std::iter::empty()),
        }
    }

    /// A legal play for `player` built without enumeration, for hosts that
    /// have to move on behalf of a seat.
    pub fn fallback_play(&self, player: usize) -> Option<Vec<Card>> {
        let seat = self.playing_seat(player)?;
        self.rules.fallback_play(
            seat.hand(),
            self.round.current_trick(),
            self.round.trump().context(),
        )
    }

    pub fn is_round_over(&self) -> bool {
        self.rules.is_round_over(
            self.round.tricks().len(),
            self.players.iter().map(Player::hand),
        )
    }

    /// Cards accounted for anywhere in the round: hands, bottom, the table
    /// and whatever is still waiting to be dealt.
    pub fn card_census(&self) -> usize {
        let in_hands: usize = self.players.iter().map(|player| player.hand().len()).sum();
        let undealt = self.dealing.as_ref().map_or(0, DealingManager::undealt);
        in_hands + self.round.bottom().len() + self.round.cards_played() + undealt
    }

    /// Changes the session's active rank between rounds.
    pub fn set_trump_rank(&mut self, rank: Rank) -> Result<(), GameError> {
        if !self.phase.accepts_new_round() {
            return Err(self.wrong_phase("set_trump_rank"));
        }
        if rank.is_joker() {
            return Err(GameError::InvalidTrumpRank(rank));
        }
        self.trump_rank = rank;
        event!(
            target: "tractor_core::controller",
            Level::INFO,
            trump_rank = %rank,
            "active rank changed"
        );
        Ok(())
    }

    pub fn end_game(&mut self) -> Result<(), GameError> {
        if self.phase != GamePhase::RoundEnd {
            return Err(self.wrong_phase("end_game"));
        }
        self.phase = GamePhase::GameEnd;
        self.notify_state();
        Ok(())
    }

    fn playing_seat(&self, player: usize) -> Option<&Player> {
        if self.phase != GamePhase::Playing {
            return None;
        }
        self.players.get(player)
    }

    fn wrong_phase(&self, operation: &'static str) -> GameError {
        GameError::InvalidPhase {
            phase: self.phase,
            operation,
        }
    }

    fn notify_state(&mut self) {
        let phase = self.phase;
        for observer in &mut self.observers {
            observer.state_changed(phase);
        }
    }
}
