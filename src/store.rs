use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fs, path::Path};
use tracing::{info, warn};

use crate::error::{Result, TourneyError};
use crate::playoffs::PlayoffBracket;
use crate::ranking::{rank, RankPolicy, StandingRow};
use crate::schedule::ScheduleTemplate;
use crate::score::RawScore;
use crate::standings::aggregate;
use crate::types::{can_edit_match, Match, Player, PlayerId, Role, Roster, Tournament, TournamentId};

/// Everything the application knows, loaded and saved as one document.
///
/// `current_user` is the acting user for permission checks. It is never
/// persisted; the caller sets it per session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppState {
    pub roster: Roster,
    pub tournaments: Vec<Tournament>,
    pub playoffs: BTreeMap<TournamentId, PlayoffBracket>,
    #[serde(skip)]
    pub current_user: Option<PlayerId>,
}

// ── Persistence ────────────────────────────────────────────────────────

impl AppState {
    pub fn load(path: &Path) -> Result<Self> {
        if !path.is_file() {
            info!("No data file at {}, starting empty", path.display());
            return Ok(AppState::default());
        }
        let data = fs::read_to_string(path)
            .map_err(|e| TourneyError::Storage(format!("read {}: {e}", path.display())))?;
        let state = serde_json::from_str::<AppState>(&data)
            .map_err(|e| TourneyError::Storage(format!("parse {}: {e}", path.display())))?;
        info!(
            "Loaded {} players and {} tournaments from {}",
            state.roster.len(),
            state.tournaments.len(),
            path.display()
        );
        Ok(state)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let payload = serde_json::to_string_pretty(self)?;
        fs::write(path, payload)
            .map_err(|e| TourneyError::Storage(format!("write {}: {e}", path.display())))?;
        info!("Saved state to {}", path.display());
        Ok(())
    }

    pub fn with_user(mut self, user: Option<PlayerId>) -> Self {
        self.current_user = user;
        self
    }
}

// ── Roster & permissions ───────────────────────────────────────────────

impl AppState {
    pub fn add_player(&mut self, id: &str, role: Role) -> Result<&Player> {
        let player = self.roster.add(id, role)?;
        info!("Player {} registered as {}", player.id, player.role);
        Ok(player)
    }

    fn acting_user(&self) -> Result<(PlayerId, Role)> {
        let user = self
            .current_user
            .clone()
            .ok_or_else(|| TourneyError::precondition("No acting user selected."))?;
        let role = self
            .roster
            .role_of(&user)
            .ok_or_else(|| TourneyError::precondition(format!("User {user} is not on the roster.")))?;
        Ok((user, role))
    }

    fn require_manager(&self, action: &str) -> Result<PlayerId> {
        let (user, role) = self.acting_user()?;
        if !role.can_manage_tournaments() {
            warn!("{user} ({role}) tried to {action}");
            return Err(TourneyError::precondition(format!(
                "Only admins and maestros may {action}."
            )));
        }
        Ok(user)
    }
}

// ── Tournaments ────────────────────────────────────────────────────────

impl AppState {
    pub fn tournament(&self, id: &str) -> Result<&Tournament> {
        self.tournaments
            .iter()
            .find(|t| t.id == id)
            .ok_or_else(|| TourneyError::not_found(format!("Tournament {id}")))
    }

    fn tournament_mut(&mut self, id: &str) -> Result<&mut Tournament> {
        self.tournaments
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| TourneyError::not_found(format!("Tournament {id}")))
    }

    /// Ids come from the creation time in milliseconds, bumped past any
    /// tournament already holding that id.
    pub fn create_tournament(&mut self, name: &str, now: DateTime<Utc>) -> Result<&Tournament> {
        if name.trim().is_empty() {
            return Err(TourneyError::validation("Tournament name cannot be empty."));
        }
        let creator = self.require_manager("create tournaments")?;
        let mut stamp = now.timestamp_millis();
        while self.tournaments.iter().any(|t| t.id == stamp.to_string()) {
            stamp += 1;
        }
        let tournament = Tournament::new(stamp.to_string(), name, Some(creator), now);
        info!("Tournament {} created: {}", tournament.id, tournament.name);
        self.tournaments.push(tournament);
        Ok(&self.tournaments[self.tournaments.len() - 1])
    }

    pub fn delete_tournament(&mut self, id: &str) -> Result<Tournament> {
        self.tournament(id)?;
        self.require_manager("delete tournaments")?;
        let idx = self
            .tournaments
            .iter()
            .position(|t| t.id == id)
            .ok_or_else(|| TourneyError::not_found(format!("Tournament {id}")))?;
        let removed = self.tournaments.remove(idx);
        if self.playoffs.remove(id).is_some() {
            info!("Playoff bracket of tournament {id} removed");
        }
        info!("Tournament {id} deleted");
        Ok(removed)
    }

    /// Lay down the league calendar. Only ever done once per tournament.
    pub fn generate_schedule(&mut self, id: &str, template: &ScheduleTemplate) -> Result<&Tournament> {
        template.validate()?;
        self.require_manager("generate schedules")?;
        let tournament = self.tournament_mut(id)?;
        if tournament.schedule_generated {
            return Err(TourneyError::precondition(format!(
                "The schedule of {} was already generated.",
                tournament.name
            )));
        }
        tournament.rounds = template.build_rounds(1);
        tournament.schedule_generated = true;
        info!(
            "Schedule generated for {}: {} rounds, {} matches",
            tournament.id,
            tournament.rounds.len(),
            tournament.match_count()
        );
        Ok(&*tournament)
    }

    /// Store both raw scores as entered and refresh the cached winner.
    pub fn record_match_score(
        &mut self,
        id: &str,
        round: usize,
        index: usize,
        home: RawScore,
        away: RawScore,
    ) -> Result<&Match> {
        check_score_entry(&home)?;
        check_score_entry(&away)?;
        let (user, role) = self.acting_user()?;
        let game = self.tournament_mut(id)?.match_at_mut(round, index)?;
        if !can_edit_match(&user, role, game) {
            warn!("{user} tried to edit match {} ({} vs {})", game.id, game.home_id, game.away_id);
            return Err(TourneyError::precondition(format!(
                "{user} may not edit {} vs {}.",
                game.home_id, game.away_id
            )));
        }
        game.home_score = home;
        game.away_score = away;
        game.recompute_winner();
        info!(
            "Match {} scored {}-{} ({})",
            game.id,
            game.home_score,
            game.away_score,
            String::from(game.winner_id.clone())
        );
        Ok(&*game)
    }

    pub fn standings(&self, id: &str, policy: RankPolicy) -> Result<Vec<StandingRow>> {
        let tournament = self.tournament(id)?;
        let ledger = aggregate(&self.roster.ids(), tournament.matches());
        Ok(rank(&ledger, policy))
    }
}

fn check_score_entry(raw: &RawScore) -> Result<()> {
    if raw.is_missing() {
        return Err(TourneyError::validation("Enter both scores."));
    }
    match raw.numeric() {
        None => Err(TourneyError::validation(format!("Score {raw} is not a number."))),
        Some(value) if value < 0.0 => Err(TourneyError::validation("Scores cannot be negative.")),
        Some(_) => Ok(()),
    }
}

// ── Playoffs ───────────────────────────────────────────────────────────

impl AppState {
    /// Seed a bracket from the current General table.
    pub fn generate_playoffs(&mut self, id: &str, now: DateTime<Utc>) -> Result<&PlayoffBracket> {
        let tournament = self.tournament(id)?;
        self.require_manager("generate playoffs")?;
        if self.playoffs.contains_key(id) {
            return Err(TourneyError::precondition(format!(
                "Playoffs for {} already exist.",
                tournament.name
            )));
        }
        let table = self.standings(id, RankPolicy::General)?;
        let bracket = PlayoffBracket::create_from_standings(id, &tournament.name, &table, now)?;
        info!("Playoffs generated for {id}");
        Ok(&*self.playoffs.entry(id.to_string()).or_insert(bracket))
    }

    pub fn bracket(&self, id: &str) -> Result<&PlayoffBracket> {
        self.playoffs
            .get(id)
            .ok_or_else(|| TourneyError::not_found(format!("Playoffs for tournament {id}")))
    }

    /// Mutable bracket access for the acting manager.
    pub fn bracket_mut(&mut self, id: &str) -> Result<&mut PlayoffBracket> {
        self.bracket(id)?;
        self.require_manager("run the playoffs")?;
        self.playoffs
            .get_mut(id)
            .ok_or_else(|| TourneyError::not_found(format!("Playoffs for tournament {id}")))
    }
}
