//! Raw score interpretation.
//!
//! Entered scores arrive loosely typed: numbers, numeric strings,
//! placeholders such as `"?"` or `"."`, or nothing at all. A score of
//! exactly `0.1` is the no-show marker: the side carrying it lost by
//! forfeit, and for statistics it counts as one point.

use serde::{Deserialize, Serialize};
use std::fmt;

pub const FORFEIT_SENTINEL: f64 = 0.1;
const FORFEIT_TEXT: &str = "0.1";
const PLACEHOLDERS: [&str; 3] = ["", "?", "."];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Side {
  Home,
  Away,
}

impl Side {
  pub fn opponent(self) -> Side {
    match self {
      Side::Home => Side::Away,
      Side::Away => Side::Home,
    }
  }
}

/// A score exactly as it was entered and persisted.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawScore {
  Missing,
  Number(f64),
  Text(String),
}

impl Default for RawScore {
  fn default() -> Self {
    RawScore::Number(0.0)
  }
}

impl From<f64> for RawScore {
  fn from(value: f64) -> Self {
    RawScore::Number(value)
  }
}

impl From<u32> for RawScore {
  fn from(value: u32) -> Self {
    RawScore::Number(value as f64)
  }
}

impl From<&str> for RawScore {
  fn from(value: &str) -> Self {
    RawScore::Text(value.to_string())
  }
}

impl RawScore {
  pub fn is_forfeit(&self) -> bool {
    match self {
      RawScore::Number(value) => *value == FORFEIT_SENTINEL,
      RawScore::Text(text) => text == FORFEIT_TEXT,
      RawScore::Missing => false,
    }
  }

  /// Numeric reading of the score; placeholders and garbage read as `None`.
  pub fn numeric(&self) -> Option<f64> {
    match self {
      RawScore::Missing => None,
      RawScore::Number(value) => Some(*value).filter(|v| v.is_finite()),
      RawScore::Text(text) => {
        let trimmed = text.trim();
        if PLACEHOLDERS.contains(&trimmed) {
          return None;
        }
        trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
      }
    }
  }

  pub fn is_missing(&self) -> bool {
    match self {
      RawScore::Missing => true,
      RawScore::Text(text) => text.trim().is_empty(),
      RawScore::Number(_) => false,
    }
  }
}

impl fmt::Display for RawScore {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      RawScore::Missing => Ok(()),
      RawScore::Number(value) if value.fract() == 0.0 => write!(f, "{}", *value as i64),
      RawScore::Number(value) => write!(f, "{value}"),
      RawScore::Text(text) => write!(f, "{text}"),
    }
  }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedScore {
  pub display_value: String,
  pub stats_value: u32,
  pub is_forfeit: bool,
}

pub fn normalize(raw: &RawScore) -> NormalizedScore {
  if raw.is_forfeit() {
    return NormalizedScore {
      display_value: FORFEIT_TEXT.to_string(),
      stats_value: 1,
      is_forfeit: true,
    };
  }
  NormalizedScore {
    display_value: raw.to_string(),
    stats_value: stats_value(raw.numeric().unwrap_or(0.0)),
    is_forfeit: false,
  }
}

fn stats_value(value: f64) -> u32 {
  value.round().max(0.0) as u32
}

/// Interpreted state of a league match's two scores.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum MatchScore {
  Unplayed,
  /// `side` did not show up and lost.
  Forfeit { side: Side },
  /// `home`/`away` are the rounded points; `winner` comes from the raw
  /// values, `None` on a draw.
  Played { home: u32, away: u32, winner: Option<Side> },
}

impl MatchScore {
  /// Home forfeit takes precedence when both sides carry the sentinel.
  /// A match with no positive score on either side counts as not played.
  pub fn from_raw(home: &RawScore, away: &RawScore) -> MatchScore {
    if home.is_forfeit() {
      return MatchScore::Forfeit { side: Side::Home };
    }
    if away.is_forfeit() {
      return MatchScore::Forfeit { side: Side::Away };
    }
    let home_value = home.numeric().unwrap_or(0.0);
    let away_value = away.numeric().unwrap_or(0.0);
    if home_value > 0.0 || away_value > 0.0 {
      let winner = if home_value > away_value {
        Some(Side::Home)
      } else if away_value > home_value {
        Some(Side::Away)
      } else {
        None
      };
      MatchScore::Played {
        home: stats_value(home_value),
        away: stats_value(away_value),
        winner,
      }
    } else {
      MatchScore::Unplayed
    }
  }

  pub fn is_played(&self) -> bool {
    !matches!(self, MatchScore::Unplayed)
  }

  pub fn winner_side(&self) -> Option<Side> {
    match *self {
      MatchScore::Unplayed => None,
      MatchScore::Forfeit { side } => Some(side.opponent()),
      MatchScore::Played { winner, .. } => winner,
    }
  }

  pub fn is_draw(&self) -> bool {
    matches!(self, MatchScore::Played { winner: None, .. })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_normalize_forfeit_number_and_text() {
    for raw in [RawScore::Number(0.1), RawScore::from("0.1")] {
      let normalized = normalize(&raw);
      assert_eq!(normalized.display_value, "0.1");
      assert_eq!(normalized.stats_value, 1);
      assert!(normalized.is_forfeit);
    }
  }

  #[test]
  fn test_normalize_rounds_fractional_scores() {
    let normalized = normalize(&RawScore::Number(2.6));
    assert_eq!(normalized.display_value, "2.6");
    assert_eq!(normalized.stats_value, 3);
    assert!(!normalized.is_forfeit);
    assert_eq!(normalize(&RawScore::Number(2.4)).stats_value, 2);
  }

  #[test]
  fn test_normalize_placeholders_and_missing() {
    assert_eq!(normalize(&RawScore::from("?")).stats_value, 0);
    assert_eq!(normalize(&RawScore::from("?")).display_value, "?");
    assert_eq!(normalize(&RawScore::from(".")).stats_value, 0);
    assert_eq!(normalize(&RawScore::Missing).stats_value, 0);
    assert_eq!(normalize(&RawScore::Missing).display_value, "");
    assert_eq!(normalize(&RawScore::from("4")).stats_value, 4);
    assert_eq!(normalize(&RawScore::Number(0.0)).stats_value, 0);
  }

  #[test]
  fn test_normalize_never_negative() {
    assert_eq!(normalize(&RawScore::Number(-3.0)).stats_value, 0);
    assert_eq!(normalize(&RawScore::from("-2")).stats_value, 0);
  }

  #[test]
  fn test_match_score_variants() {
    let zero = RawScore::Number(0.0);
    assert_eq!(MatchScore::from_raw(&zero, &zero), MatchScore::Unplayed);
    assert_eq!(
      MatchScore::from_raw(&RawScore::Number(0.1), &RawScore::Number(3.0)),
      MatchScore::Forfeit { side: Side::Home }
    );
    assert_eq!(
      MatchScore::from_raw(&RawScore::Number(2.0), &RawScore::from("0.1")),
      MatchScore::Forfeit { side: Side::Away }
    );
    assert_eq!(
      MatchScore::from_raw(&RawScore::Number(3.0), &RawScore::Number(1.0)),
      MatchScore::Played { home: 3, away: 1, winner: Some(Side::Home) }
    );
  }

  #[test]
  fn test_fractional_scores_decide_on_raw_values() {
    let close = MatchScore::from_raw(&RawScore::Number(2.4), &RawScore::Number(2.2));
    assert_eq!(close, MatchScore::Played { home: 2, away: 2, winner: Some(Side::Home) });
    assert!(!close.is_draw());

    let low = MatchScore::from_raw(&RawScore::Number(0.4), &RawScore::Number(0.0));
    assert_eq!(low, MatchScore::Played { home: 0, away: 0, winner: Some(Side::Home) });
    assert_eq!(low.winner_side(), Some(Side::Home));

    let level = MatchScore::from_raw(&RawScore::from("1.5"), &RawScore::Number(1.5));
    assert!(level.is_draw());
  }

  #[test]
  fn test_double_forfeit_is_home_forfeit() {
    let sentinel = RawScore::Number(FORFEIT_SENTINEL);
    let score = MatchScore::from_raw(&sentinel, &sentinel);
    assert_eq!(score, MatchScore::Forfeit { side: Side::Home });
    assert_eq!(score.winner_side(), Some(Side::Away));
  }

  #[test]
  fn test_raw_score_json_shapes() {
    let parsed: Vec<RawScore> = serde_json::from_str(r#"[3, 0.1, "?", null]"#).unwrap();
    assert_eq!(
      parsed,
      vec![
        RawScore::Number(3.0),
        RawScore::Number(0.1),
        RawScore::from("?"),
        RawScore::Missing,
      ]
    );
    let back = serde_json::to_string(&parsed).unwrap();
    assert_eq!(back, r#"[3.0,0.1,"?",null]"#);
  }
}
