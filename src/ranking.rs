use serde::{Deserialize, Serialize};
use std::{cmp::Ordering, fmt, str::FromStr};

use crate::standings::{PlayerStats, StatsLedger};
use crate::types::PlayerId;

/// Which table to build. Each is a stable sort, so rows tied on every key
/// keep roster order.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RankPolicy {
    /// Classification table: point diff, then wins.
    Statistics,
    /// Overview table, also used to seed the playoffs: wins, then point diff.
    #[default]
    General,
    /// Win percentage, then wins, then point diff.
    Advanced,
}

impl RankPolicy {
    fn compare(&self, a: &StandingRow, b: &StandingRow) -> Ordering {
        match self {
            RankPolicy::Statistics => b
                .point_diff
                .cmp(&a.point_diff)
                .then_with(|| b.won.cmp(&a.won)),
            RankPolicy::General => b
                .won
                .cmp(&a.won)
                .then_with(|| b.point_diff.cmp(&a.point_diff)),
            RankPolicy::Advanced => b
                .win_percentage
                .partial_cmp(&a.win_percentage)
                .unwrap_or(Ordering::Equal)
                .then_with(|| b.won.cmp(&a.won))
                .then_with(|| b.point_diff.cmp(&a.point_diff)),
        }
    }
}

impl fmt::Display for RankPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RankPolicy::Statistics => write!(f, "statistics"),
            RankPolicy::General => write!(f, "general"),
            RankPolicy::Advanced => write!(f, "advanced"),
        }
    }
}

impl FromStr for RankPolicy {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "statistics" | "stats" => Ok(RankPolicy::Statistics),
            "general" => Ok(RankPolicy::General),
            "advanced" => Ok(RankPolicy::Advanced),
            other => Err(format!("Unknown table policy: {other}")),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StandingRow {
    pub position: usize,
    pub player: PlayerId,
    pub played: u32,
    pub won: u32,
    pub lost: u32,
    pub drawn: u32,
    pub points_for: u32,
    pub points_against: u32,
    pub point_diff: i32,
    pub win_percentage: f64,
    pub average_for: f64,
    pub average_against: f64,
}

impl StandingRow {
    fn from_stats(player: &PlayerId, stats: &PlayerStats) -> Self {
        StandingRow {
            position: 0,
            player: player.clone(),
            played: stats.played,
            won: stats.won,
            lost: stats.lost,
            drawn: stats.drawn,
            points_for: stats.points_for,
            points_against: stats.points_against,
            point_diff: stats.point_diff,
            win_percentage: ratio(stats.won, stats.played, 100.0),
            average_for: ratio(stats.points_for, stats.played, 1.0),
            average_against: ratio(stats.points_against, stats.played, 1.0),
        }
    }
}

fn ratio(numerator: u32, played: u32, scale: f64) -> f64 {
    if played == 0 {
        return 0.0;
    }
    round_one_decimal(numerator as f64 / played as f64 * scale)
}

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Ordered table rows with 1-based positions.
pub fn rank(ledger: &StatsLedger, policy: RankPolicy) -> Vec<StandingRow> {
    let mut rows = ledger
        .iter()
        .map(|(player, stats)| StandingRow::from_stats(player, stats))
        .collect::<Vec<_>>();
    rows.sort_by(|a, b| policy.compare(a, b));
    for (idx, row) in rows.iter_mut().enumerate() {
        row.position = idx + 1;
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::score::RawScore;
    use crate::standings::aggregate;
    use crate::types::Match;

    fn game(id: u64, home: &str, away: &str, h: f64, a: f64) -> Match {
        let mut game = Match::new(id, home, away);
        game.home_score = RawScore::Number(h);
        game.away_score = RawScore::Number(a);
        game
    }

    fn roster(ids: &[&str]) -> Vec<PlayerId> {
        ids.iter().map(|id| id.to_string()).collect()
    }

    fn order(rows: &[StandingRow]) -> Vec<&str> {
        rows.iter().map(|row| row.player.as_str()).collect()
    }

    // A: 3-1-0 (W-D-L), diff +3. B: 3-1-1, diff +2. C: 1-0-3, diff -2.
    // D: 1-0-4, diff -3. E never plays.
    fn league() -> StatsLedger {
        let games = vec![
            game(1, "A", "C", 2.0, 1.0),
            game(2, "A", "D", 2.0, 1.0),
            game(3, "A", "B", 1.0, 1.0),
            game(4, "A", "D", 5.0, 0.0),
            game(5, "B", "C", 2.0, 0.0),
            game(6, "B", "D", 2.0, 0.0),
            game(7, "B", "D", 3.0, 1.0),
            game(8, "C", "B", 4.0, 1.0),
            game(9, "C", "D", 0.0, 3.0),
        ];
        aggregate(&roster(&["E", "D", "C", "B", "A"]), &games)
    }

    #[test]
    fn test_general_orders_by_wins_then_diff() {
        let rows = rank(&league(), RankPolicy::General);
        assert_eq!(order(&rows), vec!["A", "B", "C", "D", "E"]);
        assert_eq!(rows[0].position, 1);
        assert_eq!(rows[4].position, 5);
    }

    #[test]
    fn test_statistics_orders_by_diff_then_wins() {
        let ledger = league();
        let rows = rank(&ledger, RankPolicy::Statistics);
        assert_eq!(rows[0].player, "A");
        assert_eq!(rows[0].point_diff, 3);
        assert!(rows.windows(2).all(|w| w[0].point_diff >= w[1].point_diff));
    }

    #[test]
    fn test_tie_on_diff_broken_by_wins() {
        // B ends with diff +1 from 2 wins 1 loss; A with diff +1 from 1 win.
        let games = vec![
            game(1, "A", "C", 1.0, 0.0),
            game(2, "B", "C", 1.0, 0.0),
            game(3, "B", "C", 1.0, 0.0),
            game(4, "C", "B", 1.0, 0.0),
        ];
        let ledger = aggregate(&roster(&["A", "B", "C"]), &games);
        let stats = rank(&ledger, RankPolicy::Statistics);
        assert_eq!(order(&stats)[..2], ["B", "A"]);
        let general = rank(&ledger, RankPolicy::General);
        assert_eq!(order(&general)[..2], ["B", "A"]);
    }

    #[test]
    fn test_advanced_uses_win_percentage_first() {
        // A: 1-0 (100%). B: 2-1 (66.7%) with more wins.
        let games = vec![
            game(1, "A", "C", 1.0, 0.0),
            game(2, "B", "C", 1.0, 0.0),
            game(3, "B", "C", 1.0, 0.0),
            game(4, "C", "B", 1.0, 0.0),
        ];
        let ledger = aggregate(&roster(&["B", "A", "C"]), &games);
        let rows = rank(&ledger, RankPolicy::Advanced);
        assert_eq!(order(&rows), vec!["A", "B", "C"]);
        assert_eq!(rows[1].win_percentage, 66.7);
        assert_eq!(rows[1].average_for, 0.7);
        assert_eq!(rows[1].average_against, 0.3);
    }

    #[test]
    fn test_full_ties_keep_roster_order() {
        let ledger = aggregate(&roster(&["Z", "Y", "X"]), &Vec::<Match>::new());
        for policy in [RankPolicy::Statistics, RankPolicy::General, RankPolicy::Advanced] {
            assert_eq!(order(&rank(&ledger, policy)), vec!["Z", "Y", "X"]);
        }
    }

    #[test]
    fn test_idle_player_percentages_are_zero() {
        let rows = rank(&league(), RankPolicy::General);
        let idle = rows.iter().find(|row| row.player == "E").unwrap();
        assert_eq!((idle.win_percentage, idle.average_for, idle.average_against), (0.0, 0.0, 0.0));
    }

    #[test]
    fn test_policy_parse() {
        assert_eq!("Advanced".parse::<RankPolicy>().unwrap(), RankPolicy::Advanced);
        assert!("elo".parse::<RankPolicy>().is_err());
    }
}
