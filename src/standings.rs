use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, warn};

use crate::score::{MatchScore, Side};
use crate::types::{Match, PlayerId};

/// Cumulative league record for one player.
///
/// `point_diff` is a win/loss tally (+1 per win, -1 per loss), not
/// points-for minus points-against. Rankings and displays depend on that.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerStats {
    pub played: u32,
    pub won: u32,
    pub lost: u32,
    pub drawn: u32,
    pub points_for: u32,
    pub points_against: u32,
    pub point_diff: i32,
}

impl PlayerStats {
    fn record_win(&mut self, scored: u32, conceded: u32) {
        self.record_points(scored, conceded);
        self.won += 1;
        self.point_diff += 1;
    }

    fn record_loss(&mut self, scored: u32, conceded: u32) {
        self.record_points(scored, conceded);
        self.lost += 1;
        self.point_diff -= 1;
    }

    fn record_draw(&mut self, scored: u32, conceded: u32) {
        self.record_points(scored, conceded);
        self.drawn += 1;
    }

    fn record_points(&mut self, scored: u32, conceded: u32) {
        self.played += 1;
        self.points_for += scored;
        self.points_against += conceded;
    }
}

/// Per-player stats keyed by id, iterated in roster order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StatsLedger {
    order: Vec<PlayerId>,
    stats: HashMap<PlayerId, PlayerStats>,
}

impl StatsLedger {
    /// Zeroed stats for every player, whether or not they have played.
    pub fn new(players: &[PlayerId]) -> Self {
        let mut ledger = StatsLedger::default();
        for id in players {
            if ledger.stats.insert(id.clone(), PlayerStats::default()).is_none() {
                ledger.order.push(id.clone());
            }
        }
        ledger
    }

    pub fn get(&self, player: &str) -> Option<&PlayerStats> {
        self.stats.get(player)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PlayerId, &PlayerStats)> {
        self.order
            .iter()
            .filter_map(|id| self.stats.get(id).map(|stats| (id, stats)))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// Fold league matches into per-player stats.
///
/// Matches referencing a player outside `players` are skipped.
pub fn aggregate<'a, I>(players: &[PlayerId], matches: I) -> StatsLedger
where
    I: IntoIterator<Item = &'a Match>,
{
    let mut ledger = StatsLedger::new(players);
    for game in matches {
        apply_match(&mut ledger, game);
    }
    ledger
}

fn apply_match(ledger: &mut StatsLedger, game: &Match) {
    let score = game.score();
    if !score.is_played() {
        return;
    }
    let (Some(mut home), Some(mut away)) = (
        ledger.get(&game.home_id).copied(),
        ledger.get(&game.away_id).copied(),
    ) else {
        warn!(
            "Skipping match {} ({} vs {}): player not on roster",
            game.id, game.home_id, game.away_id
        );
        return;
    };
    if game.home_id == game.away_id {
        warn!("Skipping match {}: {} listed on both sides", game.id, game.home_id);
        return;
    }

    match score {
        MatchScore::Unplayed => return,
        MatchScore::Forfeit { side: Side::Home } => {
            home.record_loss(1, 1);
            away.record_win(1, 1);
        }
        MatchScore::Forfeit { side: Side::Away } => {
            home.record_win(1, 1);
            away.record_loss(1, 1);
        }
        MatchScore::Played { home: h, away: a, winner: Some(Side::Home) } => {
            home.record_win(h, a);
            away.record_loss(a, h);
        }
        MatchScore::Played { home: h, away: a, winner: Some(Side::Away) } => {
            home.record_loss(h, a);
            away.record_win(a, h);
        }
        MatchScore::Played { home: h, away: a, winner: None } => {
            home.record_draw(h, a);
            away.record_draw(a, h);
        }
    }
    debug!("Match {} applied as {:?}", game.id, score);
    ledger.stats.insert(game.home_id.clone(), home);
    ledger.stats.insert(game.away_id.clone(), away);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::score::RawScore;

    fn players(ids: &[&str]) -> Vec<PlayerId> {
        ids.iter().map(|id| id.to_string()).collect()
    }

    fn scored(id: u64, home: &str, away: &str, home_score: RawScore, away_score: RawScore) -> Match {
        let mut game = Match::new(id, home, away);
        game.home_score = home_score;
        game.away_score = away_score;
        game.recompute_winner();
        game
    }

    #[test]
    fn test_idle_players_get_zeroed_stats() {
        let roster = players(&["ASH", "MISTY", "BROCK"]);
        let games = vec![scored(1, "ASH", "MISTY", 3.0.into(), 1.0.into())];
        let ledger = aggregate(&roster, &games);
        assert_eq!(ledger.len(), 3);
        assert_eq!(ledger.get("BROCK"), Some(&PlayerStats::default()));
    }

    #[test]
    fn test_home_forfeit() {
        let roster = players(&["ASH", "MISTY"]);
        let games = vec![scored(1, "ASH", "MISTY", 0.1.into(), 0.0.into())];
        let ledger = aggregate(&roster, &games);
        let home = ledger.get("ASH").unwrap();
        let away = ledger.get("MISTY").unwrap();
        assert_eq!(
            *home,
            PlayerStats { played: 1, lost: 1, points_for: 1, points_against: 1, point_diff: -1, ..Default::default() }
        );
        assert_eq!(
            *away,
            PlayerStats { played: 1, won: 1, points_for: 1, points_against: 1, point_diff: 1, ..Default::default() }
        );
    }

    #[test]
    fn test_away_forfeit_ignores_home_score() {
        let roster = players(&["ASH", "MISTY"]);
        let games = vec![scored(1, "ASH", "MISTY", 5.0.into(), "0.1".into())];
        let ledger = aggregate(&roster, &games);
        let home = ledger.get("ASH").unwrap();
        let away = ledger.get("MISTY").unwrap();
        assert_eq!((home.won, home.points_for, home.points_against, home.point_diff), (1, 1, 1, 1));
        assert_eq!((away.lost, away.points_for, away.points_against, away.point_diff), (1, 1, 1, -1));
    }

    #[test]
    fn test_zero_zero_match_is_unplayed() {
        let roster = players(&["ASH", "MISTY"]);
        let unplayed = scored(1, "ASH", "MISTY", 0.0.into(), 0.0.into());
        let games = vec![unplayed.clone(), unplayed.clone(), unplayed];
        let ledger = aggregate(&roster, &games);
        assert_eq!(ledger.get("ASH"), Some(&PlayerStats::default()));
        assert_eq!(ledger.get("MISTY"), Some(&PlayerStats::default()));
    }

    #[test]
    fn test_normal_results_and_draws() {
        let roster = players(&["ASH", "MISTY", "BROCK"]);
        let games = vec![
            scored(1, "ASH", "MISTY", 3.0.into(), 1.0.into()),
            scored(2, "MISTY", "BROCK", 2.0.into(), 2.0.into()),
            scored(3, "BROCK", "ASH", 4.0.into(), 2.6.into()),
        ];
        let ledger = aggregate(&roster, &games);

        let ash = ledger.get("ASH").unwrap();
        assert_eq!(ash.played, ash.won + ash.lost + ash.drawn);
        assert_eq!((ash.won, ash.lost, ash.points_for, ash.points_against, ash.point_diff), (1, 1, 6, 5, 0));

        let misty = ledger.get("MISTY").unwrap();
        assert_eq!((misty.lost, misty.drawn, misty.point_diff), (1, 1, -1));

        let brock = ledger.get("BROCK").unwrap();
        assert_eq!((brock.won, brock.drawn, brock.points_for, brock.points_against, brock.point_diff), (1, 1, 6, 5, 1));
    }

    #[test]
    fn test_fractional_results_use_raw_comparison() {
        let roster = players(&["ASH", "MISTY", "BROCK"]);
        let games = vec![
            scored(1, "ASH", "MISTY", 2.4.into(), 2.2.into()),
            scored(2, "ASH", "BROCK", 0.4.into(), 0.0.into()),
        ];
        assert_eq!(games[0].winner_id, crate::types::MatchWinner::Player("ASH".into()));
        assert_eq!(games[1].winner_id, crate::types::MatchWinner::Player("ASH".into()));

        let ledger = aggregate(&roster, &games);
        let ash = ledger.get("ASH").unwrap();
        assert_eq!(
            *ash,
            PlayerStats { played: 2, won: 2, points_for: 2, points_against: 2, point_diff: 2, ..Default::default() }
        );
        let brock = ledger.get("BROCK").unwrap();
        assert_eq!((brock.lost, brock.points_for, brock.points_against, brock.point_diff), (1, 0, 0, -1));
    }

    #[test]
    fn test_point_diff_is_a_tally() {
        let roster = players(&["ASH", "MISTY"]);
        let games = vec![scored(1, "ASH", "MISTY", 9.0.into(), 1.0.into())];
        let ledger = aggregate(&roster, &games);
        assert_eq!(ledger.get("ASH").unwrap().point_diff, 1);
        assert_eq!(ledger.get("MISTY").unwrap().point_diff, -1);
    }

    #[test]
    fn test_unknown_players_are_skipped() {
        let roster = players(&["ASH"]);
        let games = vec![scored(1, "ASH", "?", 3.0.into(), 1.0.into())];
        let ledger = aggregate(&roster, &games);
        assert_eq!(ledger.get("ASH"), Some(&PlayerStats::default()));
        assert!(ledger.get("?").is_none());
    }

    #[test]
    fn test_aggregate_is_repeatable_and_order_free() {
        let roster = players(&["ASH", "MISTY", "BROCK"]);
        let mut games = vec![
            scored(1, "ASH", "MISTY", 3.0.into(), 1.0.into()),
            scored(2, "MISTY", "BROCK", 0.1.into(), 2.0.into()),
            scored(3, "BROCK", "ASH", 2.0.into(), 2.0.into()),
        ];
        let first = aggregate(&roster, &games);
        assert_eq!(first, aggregate(&roster, &games));
        games.reverse();
        assert_eq!(first, aggregate(&roster, &games));
    }
}
