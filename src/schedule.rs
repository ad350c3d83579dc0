use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

use crate::error::{Result, TourneyError};
use crate::types::{Match, PlayerId, Round, PLACEHOLDER_PLAYER};

/// Round sizes of the stock league calendar.
const BLANK_ROUND_SIZES: [usize; 5] = [12, 12, 12, 12, 6];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pairing {
    pub home: PlayerId,
    pub away: PlayerId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundTemplate {
    pub label: String,
    pub pairings: Vec<Pairing>,
}

/// Predefined league calendar. Pairings are data, never computed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleTemplate {
    pub rounds: Vec<RoundTemplate>,
}

impl ScheduleTemplate {
    /// Stock calendar shape with every pairing still to be decided.
    pub fn blank() -> Self {
        let rounds = BLANK_ROUND_SIZES
            .iter()
            .enumerate()
            .map(|(idx, &size)| RoundTemplate {
                label: format!("Round {}", idx + 1),
                pairings: (0..size)
                    .map(|_| Pairing {
                        home: PLACEHOLDER_PLAYER.to_string(),
                        away: PLACEHOLDER_PLAYER.to_string(),
                    })
                    .collect(),
            })
            .collect();
        ScheduleTemplate { rounds }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)
            .map_err(|e| TourneyError::Storage(format!("read schedule {}: {e}", path.display())))?;
        let template = serde_json::from_str::<ScheduleTemplate>(&data)
            .map_err(|e| TourneyError::Storage(format!("parse schedule {}: {e}", path.display())))?;
        template.validate()?;
        Ok(template)
    }

    pub fn validate(&self) -> Result<()> {
        if self.rounds.is_empty() {
            return Err(TourneyError::validation("Schedule template has no rounds."));
        }
        for round in &self.rounds {
            for pairing in &round.pairings {
                let home = pairing.home.trim();
                let away = pairing.away.trim();
                if home.is_empty() || away.is_empty() {
                    return Err(TourneyError::validation(format!(
                        "{} has a pairing with an empty side.",
                        round.label
                    )));
                }
                if home == away && home != PLACEHOLDER_PLAYER {
                    return Err(TourneyError::validation(format!(
                        "{} pairs {home} against themselves.",
                        round.label
                    )));
                }
            }
        }
        Ok(())
    }

    pub fn match_count(&self) -> usize {
        self.rounds.iter().map(|round| round.pairings.len()).sum()
    }

    /// Fresh 0-0 pending matches, ids numbered from `first_id`.
    pub fn build_rounds(&self, first_id: u64) -> Vec<Round> {
        let mut next_id = first_id;
        self.rounds
            .iter()
            .map(|round| Round {
                label: round.label.clone(),
                matches: round
                    .pairings
                    .iter()
                    .map(|pairing| {
                        let game = Match::new(next_id, pairing.home.trim(), pairing.away.trim());
                        next_id += 1;
                        game
                    })
                    .collect(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MatchWinner;
    use std::io::Write;

    #[test]
    fn test_blank_template_shape() {
        let template = ScheduleTemplate::blank();
        assert_eq!(template.rounds.len(), 5);
        assert_eq!(template.match_count(), 54);
        assert!(template.validate().is_ok());
    }

    #[test]
    fn test_build_rounds_numbers_matches() {
        let template = ScheduleTemplate {
            rounds: vec![RoundTemplate {
                label: "Round 1".into(),
                pairings: vec![
                    Pairing { home: "ASH".into(), away: "MISTY".into() },
                    Pairing { home: " BROCK ".into(), away: "GARY".into() },
                ],
            }],
        };
        let rounds = template.build_rounds(100);
        assert_eq!(rounds[0].matches[0].id, 100);
        assert_eq!(rounds[0].matches[1].id, 101);
        assert_eq!(rounds[0].matches[1].home_id, "BROCK");
        assert_eq!(rounds[0].matches[0].winner_id, MatchWinner::Pending);
        assert!(!rounds[0].matches[0].score().is_played());
    }

    #[test]
    fn test_validate_rejects_self_pairing() {
        let template = ScheduleTemplate {
            rounds: vec![RoundTemplate {
                label: "Round 1".into(),
                pairings: vec![Pairing { home: "ASH".into(), away: "ASH".into() }],
            }],
        };
        assert!(matches!(template.validate(), Err(TourneyError::Validation(_))));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"rounds":[{{"label":"Round 1","pairings":[{{"home":"ASH","away":"MISTY"}}]}}]}}"#
        )
        .unwrap();
        let template = ScheduleTemplate::load(file.path()).unwrap();
        assert_eq!(template.match_count(), 1);

        let missing = ScheduleTemplate::load(Path::new("/definitely/not/here.json"));
        assert!(matches!(missing, Err(TourneyError::Storage(_))));
    }
}
