pub mod config;
pub mod error;
pub mod playoffs;
pub mod ranking;
pub mod schedule;
pub mod score;
pub mod standings;
pub mod store;
pub mod types;

pub use config::AppConfig;
pub use error::{Result, TourneyError};
pub use playoffs::{BracketState, PlayoffBracket, Pool};
pub use ranking::{rank, RankPolicy, StandingRow};
pub use schedule::ScheduleTemplate;
pub use score::{normalize, MatchScore, NormalizedScore, RawScore, Side};
pub use standings::{aggregate, PlayerStats, StatsLedger};
pub use store::AppState;
pub use types::{Match, MatchWinner, Player, PlayerId, Role, Roster, Round, Tournament, TournamentId};

use std::{fs, path::Path};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

// ── Logging ────────────────────────────────────────────────────────────

/// Install the global subscriber writing to a daily rolling file under the
/// configured logs directory. Keep the guard alive until exit or buffered
/// lines are lost.
pub fn init_tracing(config: &AppConfig, base: &Path) -> WorkerGuard {
    let logs_dir = config.logs_dir(base);
    fs::create_dir_all(&logs_dir).ok();
    let file_appender = tracing_appender::rolling::daily(&logs_dir, "tourney.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_filter)),
        )
        .with_writer(non_blocking)
        .with_ansi(false)
        .init();
    guard
}
