use std::fmt::Write as _;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use rand::{RngCore, SeedableRng, rngs::StdRng};
use serde::Serialize;
use thiserror::Error;
use tracing::{Level, event};
use tractor_core::config::PLAYER_COUNT;
use tractor_core::game::bidding::BidLevel;
use tractor_core::game::controller::{GameController, PlayOutcome};
use tractor_core::game::round::RoundSummary;
use tractor_core::model::player::{Player, PlayerPosition, Team};
use tractor_core::model::rank::Rank;
use tractor_core::model::score::LevelChange;
use tractor_core::model::shape::group_faces;
use tractor_core::model::suit::Suit;

use crate::config::{ResolvedOutputs, SimConfig};

/// Plays seeded rounds through the controller and records one row each.
pub struct SimRunner {
    config: SimConfig,
    outputs: ResolvedOutputs,
}

/// Summary details returned after a run.
pub struct RunSummary {
    pub rounds_played: usize,
    pub games_played: usize,
    pub rows_written: usize,
    pub attacker_advances: usize,
    pub jsonl_path: PathBuf,
    pub summary_path: PathBuf,
}

#[derive(Debug, Clone, Serialize)]
struct RoundRow {
    run_id: String,
    game_index: usize,
    round_index: usize,
    game_seed: u64,
    dealer: String,
    declarer: Option<String>,
    trump_suit: Option<Suit>,
    trump_rank: Rank,
    bid: Option<BidLevel>,
    declarations: usize,
    tricks: usize,
    points_ns: u32,
    points_ew: u32,
    bottom_bonus: u32,
    defender_points: u32,
    level_change: LevelChange,
    level_ns: Rank,
    level_ew: Rank,
}

impl SimRunner {
    /// Build a runner from a validated configuration.
    pub fn new(config: SimConfig, outputs: ResolvedOutputs) -> Result<Self, RunnerError> {
        if config.players.len() != PLAYER_COUNT {
            return Err(RunnerError::SeatCount {
                found: config.players.len(),
            });
        }
        Ok(Self { config, outputs })
    }

    /// Execute the simulation, streaming JSONL rows to disk.
    pub fn run(&self) -> Result<RunSummary, RunnerError> {
        ensure_parent(self.outputs.jsonl.parent())?;
        ensure_parent(self.outputs.summary_md.parent())?;

        let mut writer = BufWriter::new(File::create(&self.outputs.jsonl)?);
        let mut rng = StdRng::seed_from_u64(self.config.rounds.seed.unwrap_or(0));
        let mut rows = Vec::with_capacity(self.config.rounds.count);
        let mut games_played = 0usize;

        while rows.len() < self.config.rounds.count {
            let game_seed = rng.next_u64();
            let mut game = GameController::with_seed(self.config.rules.clone(), game_seed)
                .map_err(|err| RunnerError::game(format!("session setup failed: {err}")))?;
            game.initialize(self.config.players.as_slice())
                .map_err(|err| RunnerError::game(format!("seating failed: {err}")))?;

            let mut dealer = PlayerPosition::North;
            for _ in 0..self.config.rounds.per_game {
                if rows.len() == self.config.rounds.count {
                    break;
                }
                let row = self.play_round(&mut game, games_played, rows.len(), game_seed, dealer)?;
                serde_json::to_writer(&mut writer, &row)?;
                writer.write_all(b"\n")?;
                rows.push(row);

                let summary = game
                    .last_summary()
                    .cloned()
                    .ok_or_else(|| RunnerError::game("round ended without a summary".to_string()))?;
                dealer = next_dealer(&summary);
                let rank = game.levels().level(dealer.team());
                game.set_trump_rank(rank)
                    .map_err(|err| RunnerError::game(format!("rank update failed: {err}")))?;
            }
            game.end_game()
                .map_err(|err| RunnerError::game(format!("closing session failed: {err}")))?;
            games_played += 1;
        }

        writer.flush()?;
        write_markdown(&self.outputs.summary_md, &self.config.run_id, &rows)?;

        Ok(RunSummary {
            rounds_played: rows.len(),
            games_played,
            rows_written: rows.len(),
            attacker_advances: rows
                .iter()
                .filter(|row| matches!(row.level_change, LevelChange::Attackers(_)))
                .count(),
            jsonl_path: self.outputs.jsonl.clone(),
            summary_path: self.outputs.summary_md.clone(),
        })
    }

    fn play_round(
        &self,
        game: &mut GameController,
        game_index: usize,
        round_index: usize,
        game_seed: u64,
        dealer: PlayerPosition,
    ) -> Result<RoundRow, RunnerError> {
        game.start_round(dealer.index())
            .map_err(|err| RunnerError::game(format!("start_round failed: {err}")))?;

        let mut declarations = 0usize;
        loop {
            let batch = game
                .deal_next_batch(self.config.rounds.batch_size)
                .map_err(|err| RunnerError::game(format!("dealing failed: {err}")))?;
            for seat in PlayerPosition::LOOP {
                if auto_declare(game, seat) {
                    declarations += 1;
                }
            }
            if batch.is_complete {
                break;
            }
        }
        game.complete_dealing()
            .map_err(|err| RunnerError::game(format!("complete_dealing failed: {err}")))?;

        let summary = loop {
            let seat = game
                .current_player()
                .map(Player::id)
                .ok_or_else(|| RunnerError::game("no seat is on turn".to_string()))?;
            let cards = game
                .fallback_play(seat)
                .ok_or_else(|| RunnerError::game(format!("seat {seat} has no legal play")))?;
            match game.play_cards(seat, &cards) {
                Ok(PlayOutcome::RoundCompleted { summary, .. }) => break summary,
                Ok(_) => {}
                Err(err) => {
                    let trick = game.round().current_trick();
                    return Err(RunnerError::game(format!(
                        "invalid play: {err} (seat: {seat}, cards: {cards:?}, leader: {}, plays: {:?})",
                        trick.leader(),
                        trick.plays()
                    )));
                }
            }
        };

        if tracing::enabled!(Level::INFO) {
            event!(
                target: "tractor_sim::round",
                Level::INFO,
                run_id = %self.config.run_id,
                game_index = game_index as u32,
                round_index = round_index as u32,
                dealer = %summary.dealer,
                defender_points = summary.defender_points,
                level_change = ?summary.level_change,
                declarations = declarations as u32
            );
        }

        let trump = game.round().trump();
        Ok(RoundRow {
            run_id: self.config.run_id.clone(),
            game_index,
            round_index,
            game_seed,
            dealer: summary.dealer.to_string(),
            declarer: trump.declarer().map(|seat| seat.to_string()),
            trump_suit: summary.trump_suit,
            trump_rank: summary.trump_rank,
            bid: trump.bid(),
            declarations,
            tricks: game.round().tricks().len(),
            points_ns: summary.points[Team::NorthSouth.index()],
            points_ew: summary.points[Team::EastWest.index()],
            bottom_bonus: summary.bottom_bonus,
            defender_points: summary.defender_points,
            level_change: summary.level_change,
            level_ns: summary.levels.level(Team::NorthSouth),
            level_ew: summary.levels.level(Team::EastWest),
        })
    }
}

/// Shows the seat's largest set of one active-rank card, capped at three.
/// Rejections are normal (a weaker or equal bid, a locked trump) and only
/// mean the seat passes this time.
fn auto_declare(game: &mut GameController, seat: PlayerPosition) -> bool {
    if game.round().trump().is_locked() {
        return false;
    }
    let rank = game.trump_rank();
    let Some(player) = game.player(seat.index()) else {
        return false;
    };
    let hand = player.hand().cards();
    let active: Vec<_> = hand.iter().copied().filter(|card| card.rank == rank).collect();
    let Some((face, count)) = group_faces(&active)
        .into_iter()
        .max_by_key(|(_, count)| *count)
    else {
        return false;
    };
    let indices: Vec<usize> = hand
        .iter()
        .enumerate()
        .filter(|(_, card)| **card == face)
        .map(|(index, _)| index)
        .take(count.min(3))
        .collect();
    game.declare_trump(seat.index(), &indices, None).is_ok()
}

/// Attackers who advance keep the deal on their side; otherwise it passes
/// to the next seat, on the other team.
fn next_dealer(summary: &RoundSummary) -> PlayerPosition {
    match summary.level_change {
        LevelChange::Attackers(_) => summary.dealer.opposite(),
        LevelChange::Hold | LevelChange::Defenders(_) => summary.dealer.next(),
    }
}

fn ensure_parent(path: Option<&Path>) -> Result<(), RunnerError> {
    if let Some(dir) = path.filter(|dir| !dir.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }
    Ok(())
}

fn write_markdown(path: &Path, run_id: &str, rows: &[RoundRow]) -> Result<(), RunnerError> {
    let mut out = String::new();
    writeln!(out, "# Simulation Summary\n")?;
    writeln!(out, "Run `{run_id}`: {} rounds\n", rows.len())?;

    let advances = rows
        .iter()
        .filter(|row| matches!(row.level_change, LevelChange::Attackers(_)))
        .count();
    let holds = rows
        .iter()
        .filter(|row| row.level_change == LevelChange::Hold)
        .count();
    let average = if rows.is_empty() {
        0.0
    } else {
        rows.iter().map(|row| f64::from(row.defender_points)).sum::<f64>() / rows.len() as f64
    };
    writeln!(
        out,
        "Attackers advanced in {advances}, held in {holds}, defenders advanced in {}. Average defender points: {average:.1}\n",
        rows.len() - advances - holds
    )?;

    out.push_str("| Game | Round | Dealer | Trump | Bid | Defender pts | Bottom bonus | Result | Levels (NS/EW) |\n");
    out.push_str("|------|-------|--------|-------|-----|--------------|--------------|--------|----------------|\n");
    for row in rows {
        let trump = match row.trump_suit {
            Some(suit) => format!("{}{}", row.trump_rank, suit),
            None => row.trump_rank.to_string(),
        };
        let bid = row
            .bid
            .map(|bid| bid.to_string())
            .unwrap_or_else(|| "bottom".to_string());
        let result = match row.level_change {
            LevelChange::Attackers(levels) => format!("attackers +{levels}"),
            LevelChange::Hold => "hold".to_string(),
            LevelChange::Defenders(levels) => format!("defenders +{levels}"),
        };
        writeln!(
            out,
            "| {} | {} | {} | {} | {} | {} | {} | {} | {}/{} |",
            row.game_index,
            row.round_index,
            row.dealer,
            trump,
            bid,
            row.defender_points,
            row.bottom_bonus,
            result,
            row.level_ns,
            row.level_ew
        )?;
    }

    fs::write(path, out)?;
    Ok(())
}

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
    #[error("failed to serialize log row: {source}")]
    Serialize {
        #[from]
        source: serde_json::Error,
    },
    #[error("failed to format summary: {source}")]
    Format {
        #[from]
        source: std::fmt::Error,
    },
    #[error("game execution failed: {message}")]
    Game { message: String },
    #[error("simulation requires exactly 4 players but found {found}")]
    SeatCount { found: usize },
}

impl RunnerError {
    fn game(message: String) -> Self {
        RunnerError::Game { message }
    }
}
