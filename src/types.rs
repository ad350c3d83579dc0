use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use crate::error::{Result, TourneyError};
use crate::score::{MatchScore, RawScore, Side};

// ── Constants ──────────────────────────────────────────────────────────

pub const PLAYOFF_FIELD_SIZE: usize = 8;
pub const PLAY_IN_GROUP_SIZE: usize = 4;
pub const PLACEHOLDER_PLAYER: &str = "?";

// ── Ids ────────────────────────────────────────────────────────────────

pub type PlayerId = String;
pub type TournamentId = String;

// ── Roster ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Admin,
    Maestro,
    #[default]
    #[serde(rename = "ENTRENADOR")]
    Trainer,
}

impl Role {
    pub fn can_manage_tournaments(&self) -> bool {
        matches!(self, Role::Admin | Role::Maestro)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Admin => write!(f, "ADMIN"),
            Role::Maestro => write!(f, "MAESTRO"),
            Role::Trainer => write!(f, "ENTRENADOR"),
        }
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(raw: &str) -> std::result::Result<Self, Self::Err> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "ADMIN" => Ok(Role::Admin),
            "MAESTRO" => Ok(Role::Maestro),
            "ENTRENADOR" | "TRAINER" => Ok(Role::Trainer),
            other => Err(format!("Unknown role: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    #[serde(default)]
    pub role: Role,
}

/// Players in registration order. The order is significant: ranking ties
/// that survive every sort key keep it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Roster {
    players: Vec<Player>,
}

impl Roster {
    pub fn new() -> Self {
        Roster::default()
    }

    pub fn add(&mut self, id: &str, role: Role) -> Result<&Player> {
        let id = id.trim();
        if id.is_empty() || id == PLACEHOLDER_PLAYER {
            return Err(TourneyError::validation("Player name cannot be empty."));
        }
        if self.contains(id) {
            return Err(TourneyError::validation(format!("Player {id} already exists.")));
        }
        self.players.push(Player { id: id.to_string(), role });
        Ok(&self.players[self.players.len() - 1])
    }

    pub fn get(&self, id: &str) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn role_of(&self, id: &str) -> Option<Role> {
        self.get(id).map(|p| p.role)
    }

    pub fn ids(&self) -> Vec<PlayerId> {
        self.players.iter().map(|p| p.id.clone()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Player> {
        self.players.iter()
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }
}

impl FromIterator<Player> for Roster {
    fn from_iter<I: IntoIterator<Item = Player>>(iter: I) -> Self {
        Roster { players: iter.into_iter().collect() }
    }
}

// ── Matches ────────────────────────────────────────────────────────────

/// Cached outcome of a league match. Persisted as `"pending"`, `"draw"` or
/// the winning player's id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum MatchWinner {
    #[default]
    Pending,
    Draw,
    Player(PlayerId),
}

impl From<String> for MatchWinner {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "pending" => MatchWinner::Pending,
            "draw" => MatchWinner::Draw,
            _ => MatchWinner::Player(raw),
        }
    }
}

impl From<MatchWinner> for String {
    fn from(winner: MatchWinner) -> Self {
        match winner {
            MatchWinner::Pending => "pending".to_string(),
            MatchWinner::Draw => "draw".to_string(),
            MatchWinner::Player(id) => id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Match {
    pub id: u64,
    pub home_id: PlayerId,
    pub away_id: PlayerId,
    #[serde(default)]
    pub home_score: RawScore,
    #[serde(default)]
    pub away_score: RawScore,
    #[serde(default)]
    pub winner_id: MatchWinner,
}

impl Match {
    pub fn new(id: u64, home_id: impl Into<PlayerId>, away_id: impl Into<PlayerId>) -> Self {
        Match {
            id,
            home_id: home_id.into(),
            away_id: away_id.into(),
            home_score: RawScore::default(),
            away_score: RawScore::default(),
            winner_id: MatchWinner::Pending,
        }
    }

    pub fn score(&self) -> MatchScore {
        MatchScore::from_raw(&self.home_score, &self.away_score)
    }

    pub fn player_on(&self, side: Side) -> &PlayerId {
        match side {
            Side::Home => &self.home_id,
            Side::Away => &self.away_id,
        }
    }

    pub fn involves(&self, player: &str) -> bool {
        self.home_id == player || self.away_id == player
    }

    /// Winner as implied by the current scores.
    pub fn derived_winner(&self) -> MatchWinner {
        let score = self.score();
        if let Some(side) = score.winner_side() {
            MatchWinner::Player(self.player_on(side).clone())
        } else if score.is_draw() {
            MatchWinner::Draw
        } else {
            MatchWinner::Pending
        }
    }

    /// Refresh the cached `winner_id`. Must run after every score change.
    pub fn recompute_winner(&mut self) -> &MatchWinner {
        self.winner_id = self.derived_winner();
        &self.winner_id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Round {
    pub label: String,
    pub matches: Vec<Match>,
}

// ── Tournaments ────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tournament {
    pub id: TournamentId,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub created_by: Option<PlayerId>,
    #[serde(default)]
    pub schedule_generated: bool,
    #[serde(default)]
    pub rounds: Vec<Round>,
}

impl Tournament {
    pub fn new(id: TournamentId, name: &str, created_by: Option<PlayerId>, created_at: DateTime<Utc>) -> Self {
        Tournament {
            id,
            name: name.trim().to_string(),
            created_at,
            created_by,
            schedule_generated: false,
            rounds: Vec::new(),
        }
    }

    pub fn matches(&self) -> impl Iterator<Item = &Match> {
        self.rounds.iter().flat_map(|round| round.matches.iter())
    }

    pub fn match_count(&self) -> usize {
        self.rounds.iter().map(|round| round.matches.len()).sum()
    }

    pub fn match_at(&self, round: usize, index: usize) -> Result<&Match> {
        self.rounds
            .get(round)
            .and_then(|r| r.matches.get(index))
            .ok_or_else(|| TourneyError::not_found(format!("Match {index} of round {round}")))
    }

    pub fn match_at_mut(&mut self, round: usize, index: usize) -> Result<&mut Match> {
        self.rounds
            .get_mut(round)
            .and_then(|r| r.matches.get_mut(index))
            .ok_or_else(|| TourneyError::not_found(format!("Match {index} of round {round}")))
    }
}

/// Managers may edit any match; everyone else only the matches they play in.
pub fn can_edit_match(user: &str, role: Role, game: &Match) -> bool {
    role.can_manage_tournaments() || game.involves(user)
}
