use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use tracing::{info, warn};

use crate::error::{Result, TourneyError};
use crate::ranking::StandingRow;
use crate::types::{PlayerId, TournamentId, PLAYOFF_FIELD_SIZE, PLAY_IN_GROUP_SIZE};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BracketState {
  #[serde(rename = "playin")]
  PlayIn,
  Semifinals,
  Final,
  Completed,
}

impl fmt::Display for BracketState {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      BracketState::PlayIn => write!(f, "playin"),
      BracketState::Semifinals => write!(f, "semifinals"),
      BracketState::Final => write!(f, "final"),
      BracketState::Completed => write!(f, "completed"),
    }
  }
}

/// Half of the bracket: picks a Play-In group or a semifinal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Pool {
  A,
  B,
}

impl FromStr for Pool {
  type Err = String;

  fn from_str(raw: &str) -> std::result::Result<Self, Self::Err> {
    match raw.trim().to_ascii_uppercase().as_str() {
      "A" => Ok(Pool::A),
      "B" => Ok(Pool::B),
      other => Err(format!("Unknown bracket pool: {other}")),
    }
  }
}

/// Four players, two fixed pairings: slots 0 v 1 and 2 v 3.
///
/// `results` has one entry per slot, each from that slot's point of view.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayInGroup {
  pub players: Vec<PlayerId>,
  pub results: Vec<Option<String>>,
  pub winners: Vec<PlayerId>,
}

impl PlayInGroup {
  fn seeded(players: &[StandingRow]) -> Self {
    PlayInGroup {
      players: players.iter().map(|row| row.player.clone()).collect(),
      results: vec![None; PLAY_IN_GROUP_SIZE],
      winners: Vec::new(),
    }
  }

  pub fn pairing(&self, pairing: usize) -> Option<(&PlayerId, &PlayerId)> {
    if pairing >= PLAY_IN_GROUP_SIZE / 2 {
      return None;
    }
    let first = pairing * 2;
    Some((self.players.get(first)?, self.players.get(first + 1)?))
  }

  pub fn is_complete(&self) -> bool {
    self.winners.len() == PLAY_IN_GROUP_SIZE / 2
  }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SingleMatch {
  pub players: Vec<PlayerId>,
  pub result: Option<String>,
  pub winner: Option<PlayerId>,
}

impl SingleMatch {
  fn record(&mut self, label: &str, first: u32, second: u32) -> Result<PlayerId> {
    if self.players.len() != 2 {
      return Err(TourneyError::precondition(format!("{label} has no players yet.")));
    }
    if self.result.is_some() {
      return Err(TourneyError::precondition(format!("{label} already has a result.")));
    }
    require_decisive(first, second)?;
    let winner = if first > second { self.players[0].clone() } else { self.players[1].clone() };
    self.result = Some(format!("{first}-{second}"));
    self.winner = Some(winner.clone());
    Ok(winner)
  }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalMatch {
  #[serde(flatten)]
  pub game: SingleMatch,
  pub champion: Option<PlayerId>,
}

/// Fixed 8-player playoff: two Play-In groups, two semifinals, one final.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayoffBracket {
  pub tournament_id: TournamentId,
  pub tournament_name: String,
  pub state: BracketState,
  pub play_in_a: PlayInGroup,
  pub play_in_b: PlayInGroup,
  pub semifinal_a: SingleMatch,
  pub semifinal_b: SingleMatch,
  #[serde(rename = "final")]
  pub final_match: FinalMatch,
  pub created_at: DateTime<Utc>,
}

fn require_decisive(first: u32, second: u32) -> Result<()> {
  if first == second {
    return Err(TourneyError::validation("Playoff matches cannot end in a draw."));
  }
  Ok(())
}

impl PlayoffBracket {
  /// Seed from the General table: rows 1-4 fill Play-In A, rows 5-8 Play-In B.
  pub fn create_from_standings(
    tournament_id: &str,
    tournament_name: &str,
    table: &[StandingRow],
    now: DateTime<Utc>,
  ) -> Result<Self> {
    if table.len() < PLAYOFF_FIELD_SIZE {
      return Err(TourneyError::precondition(format!(
        "Playoffs need {PLAYOFF_FIELD_SIZE} players; the table has {}.",
        table.len()
      )));
    }
    let (group_a, rest) = table.split_at(PLAY_IN_GROUP_SIZE);
    let group_b = &rest[..PLAY_IN_GROUP_SIZE];
    Ok(PlayoffBracket {
      tournament_id: tournament_id.to_string(),
      tournament_name: tournament_name.to_string(),
      state: BracketState::PlayIn,
      play_in_a: PlayInGroup::seeded(group_a),
      play_in_b: PlayInGroup::seeded(group_b),
      semifinal_a: SingleMatch::default(),
      semifinal_b: SingleMatch::default(),
      final_match: FinalMatch::default(),
      created_at: now,
    })
  }

  pub fn play_in(&self, pool: Pool) -> &PlayInGroup {
    match pool {
      Pool::A => &self.play_in_a,
      Pool::B => &self.play_in_b,
    }
  }

  pub fn semifinal(&self, pool: Pool) -> &SingleMatch {
    match pool {
      Pool::A => &self.semifinal_a,
      Pool::B => &self.semifinal_b,
    }
  }

  pub fn champion(&self) -> Option<&PlayerId> {
    self.final_match.champion.as_ref()
  }

  fn require_state(&self, expected: BracketState, action: &str) -> Result<()> {
    if self.state != expected {
      warn!("{action} rejected: bracket {} is in state {}", self.tournament_id, self.state);
      return Err(TourneyError::precondition(format!(
        "Cannot {action} while the bracket is in the {} stage.",
        self.state
      )));
    }
    Ok(())
  }

  /// Record one Play-In pairing (0 = slots 0 v 1, 1 = slots 2 v 3).
  /// `first` and `second` are the scores of the pairing's two players in slot order.
  pub fn record_play_in(&mut self, pool: Pool, pairing: usize, first: u32, second: u32) -> Result<PlayerId> {
    self.require_state(BracketState::PlayIn, "record a Play-In result")?;
    let group = match pool {
      Pool::A => &mut self.play_in_a,
      Pool::B => &mut self.play_in_b,
    };
    let (home, away) = group
      .pairing(pairing)
      .map(|(a, b)| (a.clone(), b.clone()))
      .ok_or_else(|| TourneyError::validation(format!("Play-In pairing {pairing} does not exist.")))?;
    let slot = pairing * 2;
    if group.results.get(slot).is_some_and(Option::is_some) {
      return Err(TourneyError::precondition(format!(
        "Play-In {home} vs {away} already has a result."
      )));
    }
    require_decisive(first, second)?;

    // Stored brackets may carry a short results list.
    if group.results.len() < PLAY_IN_GROUP_SIZE {
      group.results.resize(PLAY_IN_GROUP_SIZE, None);
    }
    let winner = if first > second { home } else { away };
    group.results[slot] = Some(format!("{first}-{second}"));
    group.results[slot + 1] = Some(format!("{second}-{first}"));
    group.winners.push(winner.clone());
    info!("Play-In {:?} pairing {pairing}: {first}-{second}, {winner} advances", pool);
    Ok(winner)
  }

  pub fn advance_to_semifinals(&mut self) -> Result<()> {
    self.require_state(BracketState::PlayIn, "advance to the semifinals")?;
    if !self.play_in_a.is_complete() || !self.play_in_b.is_complete() {
      return Err(TourneyError::precondition(
        "Complete every Play-In match before advancing to the semifinals.",
      ));
    }
    self.semifinal_a.players = self.play_in_a.winners.clone();
    self.semifinal_b.players = self.play_in_b.winners.clone();
    self.state = BracketState::Semifinals;
    info!("Bracket {} advanced to semifinals", self.tournament_id);
    Ok(())
  }

  pub fn record_semifinal(&mut self, pool: Pool, first: u32, second: u32) -> Result<PlayerId> {
    self.require_state(BracketState::Semifinals, "record a semifinal result")?;
    let (label, semifinal) = match pool {
      Pool::A => ("Semifinal A", &mut self.semifinal_a),
      Pool::B => ("Semifinal B", &mut self.semifinal_b),
    };
    let winner = semifinal.record(label, first, second)?;
    info!("{label}: {first}-{second}, {winner} advances");
    Ok(winner)
  }

  pub fn advance_to_final(&mut self) -> Result<()> {
    self.require_state(BracketState::Semifinals, "advance to the final")?;
    let (Some(a), Some(b)) = (&self.semifinal_a.winner, &self.semifinal_b.winner) else {
      return Err(TourneyError::precondition(
        "Complete both semifinals before advancing to the final.",
      ));
    };
    self.final_match.game.players = vec![a.clone(), b.clone()];
    self.state = BracketState::Final;
    info!("Bracket {} advanced to the final", self.tournament_id);
    Ok(())
  }

  /// Sets the final's winner; the champion is only crowned by `complete_tournament`.
  pub fn record_final(&mut self, first: u32, second: u32) -> Result<PlayerId> {
    self.require_state(BracketState::Final, "record the final result")?;
    let winner = self.final_match.game.record("The final", first, second)?;
    info!("Final: {first}-{second}, {winner} wins");
    Ok(winner)
  }

  pub fn complete_tournament(&mut self) -> Result<PlayerId> {
    if self.state == BracketState::Completed {
      return Err(TourneyError::precondition("The tournament is already completed."));
    }
    self.require_state(BracketState::Final, "crown a champion")?;
    let champion = self
      .final_match
      .game
      .winner
      .clone()
      .ok_or_else(|| TourneyError::precondition("Complete the final before crowning a champion."))?;
    self.final_match.champion = Some(champion.clone());
    self.state = BracketState::Completed;
    info!("Bracket {} completed, champion {champion}", self.tournament_id);
    Ok(champion)
  }
}
