use std::fmt::Display;

use chrono::Utc;
use itertools::Itertools;
use log;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Club, GameError, PlayerEntry, Seat, VerificationResult};

pub const TARGET_SCORE: u32 = 501;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameStatus {
    SelectingClub,
    Playing,
    Finished,
}

impl Display for GameStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GameStatus::SelectingClub => write!(f, "selecting a club"),
            GameStatus::Playing => write!(f, "playing"),
            GameStatus::Finished => write!(f, "finished"),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    PerfectTarget { winner: Seat },
    Bust { buster: Seat, winner: Seat, total: u32 },
}

impl Outcome {
    pub fn winner(&self) -> Seat {
        match self {
            Outcome::PerfectTarget { winner } => *winner,
            Outcome::Bust { winner, .. } => *winner,
        }
    }
}

impl Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Outcome::PerfectTarget { winner } => {
                write!(f, "{winner} hit the perfect target of {TARGET_SCORE}!")
            }
            Outcome::Bust { buster, total, .. } => {
                write!(f, "{buster} went bust with {total} appearances!")
            }
        }
    }
}

/// What an accepted name did to the game.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TurnOutcome {
    Continue { next: Seat },
    Finished(Outcome),
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GameState {
    pub game_id: Uuid,
    pub status: GameStatus,
    pub selected_club: Option<Club>,
    pub current_player: Seat,
    pub total_score: u32,
    /// Accepted names in the order they were played.
    pub history: Vec<PlayerEntry>,
    pub winner: Option<Seat>,
    pub last_appearances: u32,
}

impl Default for GameState {
    fn default() -> Self {
        Self::new()
    }
}

impl GameState {
    pub fn new() -> Self {
        Self {
            game_id: Uuid::new_v4(),
            status: GameStatus::SelectingClub,
            selected_club: None,
            current_player: Seat::One,
            total_score: 0,
            history: Vec::new(),
            winner: None,
            last_appearances: 0,
        }
    }

    pub fn select_club(&mut self, club: Club) -> Result<(), GameError> {
        self.require(GameStatus::SelectingClub, "select a club")?;
        log::info!("Game {}: playing for {club}", self.game_id);
        self.selected_club = Some(club);
        self.status = GameStatus::Playing;
        self.current_player = Seat::One;
        self.total_score = 0;
        self.history.clear();
        self.winner = None;
        self.last_appearances = 0;
        Ok(())
    }

    /// Checks a raw name against the rules that need no verification and
    /// returns it trimmed. Never mutates the game.
    pub fn validate_submission(&self, name: &str) -> Result<String, GameError> {
        self.require(GameStatus::Playing, "submit a name")?;
        let name = name.trim();
        if name.is_empty() {
            return Err(GameError::EmptyName);
        }
        if self.is_used(name) {
            return Err(GameError::DuplicateName(name.to_string()));
        }
        Ok(name.to_string())
    }

    pub fn is_used(&self, name: &str) -> bool {
        self.history.iter().any(|entry| entry.same_name(name))
    }

    /// Applies a verification answer for `name` on behalf of the current
    /// player. An invalid answer leaves the game untouched.
    pub fn apply_verification(
        &mut self,
        name: &str,
        result: &VerificationResult,
    ) -> Result<TurnOutcome, GameError> {
        let name = self.validate_submission(name)?;
        let (appearances, source_url) = match result {
            VerificationResult::Invalid { error } => {
                log::info!("Rejected {name} for {}: {error}", self.current_player);
                return Err(GameError::DomainInvalid(error.clone()));
            }
            VerificationResult::Valid {
                appearances,
                source_url,
            } => (*appearances, source_url.clone()),
        };
        let total_score = match self.total_score.checked_add(appearances) {
            Some(total) if appearances >= 1 => total,
            _ => {
                log::warn!("Refusing {appearances} appearances for {name}");
                return Err(GameError::DomainInvalid(format!(
                    "{appearances} appearances for {name} is not a usable count."
                )));
            }
        };

        let player = self.current_player;
        self.history.push(PlayerEntry {
            name,
            appearances,
            added_by: player,
            sequence: self.history.len() as u64,
            created_at: Utc::now(),
            source_url,
        });
        self.total_score = total_score;
        self.last_appearances = appearances;
        log::info!(
            "{player} added {appearances}, total now {}",
            self.total_score
        );

        let turn = if self.total_score == TARGET_SCORE {
            self.finish(player)
        } else if self.total_score > TARGET_SCORE {
            self.finish(player.other())
        } else {
            self.current_player = player.other();
            TurnOutcome::Continue {
                next: self.current_player,
            }
        };
        Ok(turn)
    }

    fn finish(&mut self, winner: Seat) -> TurnOutcome {
        self.winner = Some(winner);
        self.status = GameStatus::Finished;
        let outcome = self
            .outcome()
            .expect("Finished game always has an outcome");
        log::info!("Game {} over! {outcome}", self.game_id);
        TurnOutcome::Finished(outcome)
    }

    pub fn reset(&mut self) {
        log::info!("Game {} reset", self.game_id);
        *self = Self::new();
    }

    pub fn outcome(&self) -> Option<Outcome> {
        if self.status != GameStatus::Finished {
            return None;
        }
        let winner = self.winner?;
        if self.total_score > TARGET_SCORE {
            Some(Outcome::Bust {
                buster: winner.other(),
                winner,
                total: self.total_score,
            })
        } else {
            Some(Outcome::PerfectTarget { winner })
        }
    }

    pub fn remaining(&self) -> u32 {
        TARGET_SCORE.saturating_sub(self.total_score)
    }

    /// Most recent entry first, for display.
    pub fn recent_history(&self) -> impl Iterator<Item = &PlayerEntry> {
        self.history.iter().rev()
    }

    fn require(&self, status: GameStatus, operation: &'static str) -> Result<(), GameError> {
        if self.status == status {
            Ok(())
        } else {
            Err(GameError::InvalidTransition {
                operation,
                status: self.status,
            })
        }
    }
}

impl Display for GameState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let club_str = self
            .selected_club
            .as_ref()
            .map(|club| club.to_string())
            .unwrap_or("None".to_string());
        let history_str = self.recent_history().map(|entry| format!("  {entry}")).join("\n");
        let status_str = match self.outcome() {
            Some(outcome) => format!("Game over: {outcome}"),
            None => format!("{}'s turn, {} to go", self.current_player, self.remaining()),
        };
        write!(
            f,
            "\nClub: {}\nScore: {}/{} (last +{})\n{}\nHistory:\n{}",
            club_str,
            self.total_score,
            TARGET_SCORE,
            self.last_appearances,
            status_str,
            history_str
        )
    }
}
