//! Play legality, trick resolution and round termination.

use crate::config::{FollowPolicy, GameConfig};
use crate::model::card::Card;
use crate::model::hand::Hand;
use crate::model::player::PlayerPosition;
use crate::model::shape::{PlayShape, classify, group_faces, has_set_of, sequence_index};
use crate::model::trick::{Trick, TrickError};
use crate::model::trump::{EffectiveSuit, TrumpContext};
use std::collections::BTreeMap;
use thiserror::Error;

/// Largest set of one card a lead may show (three decks in play).
pub const MAX_SET_WIDTH: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlayError {
    #[error("cards can only be played during the playing phase")]
    NotInPlayPhase,
    #[error("unknown player {0}")]
    UnknownPlayer(usize),
    #[error("expected {expected} to play but got {actual}")]
    OutOfTurn {
        expected: PlayerPosition,
        actual: PlayerPosition,
    },
    #[error("a play needs at least one card")]
    EmptyPlay,
    #[error("not all of the played cards are in the hand")]
    CardsNotInHand,
    #[error("a lead of {0} cards must be a tractor")]
    InvalidLeadCount(usize),
    #[error("a multi-card lead must be copies of one card or a tractor")]
    InvalidLeadShape,
    #[error("the lead was {expected} card(s) but {actual} were played")]
    WrongCount { expected: usize, actual: usize },
    #[error("must follow {0}")]
    MustFollow(EffectiveSuit),
    #[error("must follow with a set of {width} identical cards")]
    MustFollowShape { width: usize },
    #[error(transparent)]
    Trick(#[from] TrickError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuleEngine {
    follow_policy: FollowPolicy,
    tractor_leads: bool,
}

impl Default for RuleEngine {
    fn default() -> Self {
        Self::new(&GameConfig::default())
    }
}

impl RuleEngine {
    pub fn new(config: &GameConfig) -> Self {
        Self {
            follow_policy: config.follow_policy,
            tractor_leads: config.tractor_leads,
        }
    }

    pub fn follow_policy(&self) -> FollowPolicy {
        self.follow_policy
    }

    /// Checks `cards` from `hand` against the trick in progress.
    pub fn validate(
        &self,
        hand: &Hand,
        cards: &[Card],
        trick: &Trick,
        ctx: TrumpContext,
    ) -> Result<(), PlayError> {
        if cards.is_empty() {
            return Err(PlayError::EmptyPlay);
        }
        if !hand.contains_all(cards) {
            return Err(PlayError::CardsNotInHand);
        }
        match trick.lead_cards() {
            None => self.validate_lead(cards, ctx).map(|_| ()),
            Some(lead) => self.validate_follow(hand, cards, lead, ctx),
        }
    }

    /// A lead is one card, two or three copies of one card, or a tractor
    /// when tractor leads are enabled.
    pub fn validate_lead(&self, cards: &[Card], ctx: TrumpContext) -> Result<PlayShape, PlayError> {
        if cards.is_empty() {
            return Err(PlayError::EmptyPlay);
        }
        let shape = classify(cards, ctx);
        match shape {
            PlayShape::Single => Ok(shape),
            PlayShape::Set { width } if width <= MAX_SET_WIDTH => Ok(shape),
            PlayShape::Tractor { .. } if self.tractor_leads => Ok(shape),
            _ if cards.len() > MAX_SET_WIDTH && !self.tractor_leads => {
                Err(PlayError::InvalidLeadCount(cards.len()))
            }
            _ => Err(PlayError::InvalidLeadShape),
        }
    }

    pub fn validate_follow(
        &self,
        hand: &Hand,
        cards: &[Card],
        lead: &[Card],
        ctx: TrumpContext,
    ) -> Result<(), PlayError> {
        let required = lead.len();
        if cards.len() != required {
            return Err(PlayError::WrongCount {
                expected: required,
                actual: cards.len(),
            });
        }
        let Some(class) = lead.first().map(|card| card.effective_suit(ctx)) else {
            return Ok(());
        };

        let held = matching(hand.cards(), class, ctx);
        if held.is_empty() {
            return Ok(());
        }
        let played = matching(cards, class, ctx);

        if held.len() >= required {
            if played.len() != required {
                return Err(PlayError::MustFollow(class));
            }
        } else {
            match self.follow_policy {
                FollowPolicy::AtLeastCount => return Ok(()),
                FollowPolicy::Conventional if played.len() != held.len() => {
                    return Err(PlayError::MustFollow(class));
                }
                FollowPolicy::Conventional => {}
            }
        }

        if self.follow_policy == FollowPolicy::Conventional {
            let width = classify(lead, ctx).width();
            if width >= 2 && has_set_of(&held, width) && !has_set_of(&played, width) {
                return Err(PlayError::MustFollowShape { width });
            }
        }
        Ok(())
    }

    pub fn trick_winner(&self, trick: &Trick, ctx: TrumpContext) -> Option<PlayerPosition> {
        trick.winner(ctx)
    }

    /// Over once at least one trick has been taken and every hand is empty.
    pub fn is_round_over<'a, I>(&self, tricks_completed: usize, hands: I) -> bool
    where
        I: IntoIterator<Item = &'a Hand>,
    {
        tricks_completed > 0 && hands.into_iter().all(Hand::is_empty)
    }

    /// Every distinct legal play from `hand`, produced lazily. Follows
    /// of up to three free cards are picked directly; longer ones walk the
    /// multisets of the pool one at a time. A short follower under the
    /// conventional policy only varies the filler.
    pub fn legal_plays<'a>(
        &'a self,
        hand: &'a Hand,
        trick: &'a Trick,
        ctx: TrumpContext,
    ) -> Box<dyn Iterator<Item = Vec<Card>> + 'a> {
        let Some(lead) = trick.lead_cards() else {
            return Box::new(self.legal_leads(hand, ctx).into_iter());
        };
        let required = lead.len();
        if hand.len() < required {
            return Box::new(std::iter::empty());
        }
        let class = lead[0].effective_suit(ctx);
        let (held, rest): (Vec<Card>, Vec<Card>) = hand
            .cards()
            .iter()
            .copied()
            .partition(|card| card.effective_suit(ctx) == class);

        let (forced, pool) = if held.len() >= required {
            (Vec::new(), held)
        } else if !held.is_empty() && self.follow_policy == FollowPolicy::Conventional {
            (held, rest)
        } else {
            (Vec::new(), hand.cards().to_vec())
        };
        let size = required - forced.len();
        let faces = group_faces(&pool);
        let fillers: Box<dyn Iterator<Item = Vec<Card>>> = if size <= MAX_SET_WIDTH {
            Box::new(small_combinations(&faces, size).into_iter())
        } else {
            Box::new(MultisetCombinations::new(faces, size))
        };

        Box::new(
            fillers
                .map(move |filler| {
                    let mut play = forced.clone();
                    play.extend(filler);
                    play
                })
                .filter(move |cards| self.validate_follow(hand, cards, lead, ctx).is_ok()),
        )
    }

    /// Cards that may appear in some legal play.
    pub fn valid_cards(&self, hand: &Hand, trick: &Trick, ctx: TrumpContext) -> Vec<Card> {
        let Some(lead) = trick.lead_cards() else {
            return hand.cards().to_vec();
        };
        let class = lead[0].effective_suit(ctx);
        if lead.len() > MAX_SET_WIDTH {
            let held = matching(hand.cards(), class, ctx);
            return if held.len() >= lead.len() {
                held
            } else {
                hand.cards().to_vec()
            };
        }

        let plays: Vec<Vec<Card>> = self.legal_plays(hand, trick, ctx).collect();
        hand.cards()
            .iter()
            .copied()
            .filter(|card| plays.iter().any(|play| play.contains(card)))
            .collect()
    }

    /// One legal play built without enumeration: the lowest single when
    /// leading; otherwise the cheapest required set of the lead class, then
    /// the lowest matching cards, then the lowest of the rest.
    pub fn fallback_play(&self, hand: &Hand, trick: &Trick, ctx: TrumpContext) -> Option<Vec<Card>> {
        let lead_class = trick.lead_suit(ctx);
        let mut ascending = hand.cards().to_vec();
        ascending.sort_by_key(|card| card.power(ctx, lead_class));

        let Some(lead) = trick.lead_cards() else {
            return ascending.first().map(|card| vec![*card]);
        };
        let required = lead.len();
        if hand.len() < required {
            return None;
        }
        let class = lead[0].effective_suit(ctx);
        let (mut held, mut rest): (Vec<Card>, Vec<Card>) = ascending
            .into_iter()
            .partition(|card| card.effective_suit(ctx) == class);

        let mut picked = Vec::with_capacity(required);
        let width = classify(lead, ctx).width();
        if width >= 2 {
            let set_face = group_faces(&held)
                .into_iter()
                .find(|(_, count)| *count >= width)
                .map(|(face, _)| face);
            if let Some(face) = set_face {
                for _ in 0..width {
                    if let Some(index) = held.iter().position(|card| *card == face) {
                        picked.push(held.remove(index));
                    }
                }
            }
        }
        let fill = required - picked.len();
        let from_held: Vec<Card> = held.drain(..fill.min(held.len())).collect();
        picked.extend(from_held);
        let fill = required - picked.len();
        picked.extend(rest.drain(..fill.min(rest.len())));

        self.validate_follow(hand, &picked, lead, ctx)
            .ok()
            .map(|_| picked)
    }

    fn legal_leads(&self, hand: &Hand, ctx: TrumpContext) -> Vec<Vec<Card>> {
        let faces = group_faces(hand.cards());
        let mut plays = Vec::new();
        for (face, count) in &faces {
            for width in 1..=(*count).min(MAX_SET_WIDTH) {
                plays.push(vec![*face; width]);
            }
        }
        if self.tractor_leads {
            for width in 2..=MAX_SET_WIDTH {
                plays.extend(tractors(&faces, width, ctx));
            }
        }
        plays
    }
}

fn matching(cards: &[Card], class: EffectiveSuit, ctx: TrumpContext) -> Vec<Card> {
    cards
        .iter()
        .copied()
        .filter(|card| card.effective_suit(ctx) == class)
        .collect()
}

/// Every tractor of `width` that can be built from `faces`.
fn tractors(faces: &[(Card, usize)], width: usize, ctx: TrumpContext) -> Vec<Vec<Card>> {
    let mut by_class: BTreeMap<(u8, u8), Vec<Card>> = BTreeMap::new();
    for (face, _) in faces.iter().filter(|(_, count)| *count >= width) {
        let class_key = match face.effective_suit(ctx) {
            EffectiveSuit::Trump => 0,
            EffectiveSuit::Side(suit) => 1 + suit.priority(),
        };
        by_class
            .entry((class_key, sequence_index(*face, ctx)))
            .or_default()
            .push(*face);
    }

    let mut out = Vec::new();
    for (&(class_key, step), _) in by_class.iter() {
        // Grow runs from every starting step; each step may offer several
        // faces (e.g. off-suit twos) and every choice is a distinct tractor.
        let mut runs: Vec<Vec<Card>> = vec![Vec::new()];
        let mut next = step;
        while let Some(options) = by_class.get(&(class_key, next)) {
            runs = runs
                .iter()
                .flat_map(|run| {
                    options.iter().map(move |face| {
                        let mut extended = run.clone();
                        extended.push(*face);
                        extended
                    })
                })
                .collect();
            if runs[0].len() >= 2 {
                for run in &runs {
                    out.push(run.iter().flat_map(|face| vec![*face; width]).collect());
                }
            }
            next += 1;
        }
    }
    out
}

fn small_combinations(faces: &[(Card, usize)], size: usize) -> Vec<Vec<Card>> {
    let k = faces.len();
    let fits = |picks: &[usize]| {
        picks
            .iter()
            .all(|i| picks.iter().filter(|j| *j == i).count() <= faces[*i].1)
    };
    let mut out = Vec::new();
    match size {
        0 => out.push(Vec::new()),
        1 => {
            for i in 0..k {
                out.push(vec![faces[i].0]);
            }
        }
        2 => {
            for i in 0..k {
                for j in i..k {
                    if fits(&[i, j]) {
                        out.push(vec![faces[i].0, faces[j].0]);
                    }
                }
            }
        }
        3 => {
            for i in 0..k {
                for j in i..k {
                    for l in j..k {
                        if fits(&[i, j, l]) {
                            out.push(vec![faces[i].0, faces[j].0, faces[l].0]);
                        }
                    }
                }
            }
        }
        _ => {}
    }
    out
}

/// Multisets of `size` cards drawn from `faces`, walked from the
/// lexicographically largest pick count downwards without materialising
/// the whole family.
struct MultisetCombinations {
    faces: Vec<(Card, usize)>,
    taken: Vec<usize>,
    done: bool,
}

impl MultisetCombinations {
    fn new(faces: Vec<(Card, usize)>, size: usize) -> Self {
        let capacity: usize = faces.iter().map(|(_, count)| count).sum();
        let mut combos = Self {
            taken: vec![0; faces.len()],
            faces,
            done: capacity < size,
        };
        if !combos.done {
            combos.fill(0, size);
        }
        combos
    }

    /// Packs `amount` picks as far left as the counts allow, from `from` on.
    fn fill(&mut self, from: usize, mut amount: usize) {
        for index in from..self.faces.len() {
            let take = self.faces[index].1.min(amount);
            self.taken[index] = take;
            amount -= take;
        }
    }

    fn advance(&mut self) {
        let mut suffix_taken = 0;
        let mut suffix_capacity = 0;
        for index in (0..self.faces.len()).rev() {
            if self.taken[index] > 0 && suffix_capacity > suffix_taken {
                self.taken[index] -= 1;
                self.fill(index + 1, suffix_taken + 1);
                return;
            }
            suffix_taken += self.taken[index];
            suffix_capacity += self.faces[index].1;
        }
        self.done = true;
    }
}

impl Iterator for MultisetCombinations {
    type Item = Vec<Card>;

    fn next(&mut self) -> Option<Vec<Card>> {
        if self.done {
            return None;
        }
        let play = self
            .faces
            .iter()
            .zip(&self.taken)
            .flat_map(|((face, _), taken)| std::iter::repeat_n(*face, *taken))
            .collect();
        self.advance();
        Some(play)
    }
}
