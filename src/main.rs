//! `tourney` command-line front end.
//!
//! Every invocation loads the whole data file, applies one command and
//! writes the file back when the command changed something. Results are
//! printed as pretty JSON on stdout.

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::{env, path::PathBuf, process::ExitCode};
use tracing::{error, info};

use tourney_desk::config::{config_path, load_config, load_env_file};
use tourney_desk::{init_tracing, AppState, Pool, RankPolicy, RawScore, Role, ScheduleTemplate};

#[derive(Parser)]
#[command(name = "tourney")]
#[command(about = "League standings and playoff bracket manager", long_about = None)]
struct Cli {
    /// Config file (defaults to ./tourney.json or $TOURNEY_CONFIG_PATH)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Acting user for permission checks
    #[arg(long, global = true)]
    user: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage the roster
    Players {
        #[command(subcommand)]
        action: PlayerAction,
    },

    /// Create, list or delete tournaments
    Tournaments {
        #[command(subcommand)]
        action: TournamentAction,
    },

    /// Generate a tournament's league calendar (once)
    Schedule {
        id: String,

        /// Schedule template JSON; the blank calendar is used when omitted
        #[arg(long)]
        template: Option<PathBuf>,
    },

    /// Enter a league match result. Use 0.1 for a no-show.
    Score {
        id: String,
        round: usize,
        #[arg(value_name = "MATCH")]
        index: usize,
        home: String,
        away: String,
    },

    /// Print a standings table
    Table {
        id: String,

        #[arg(long, default_value = "general")]
        policy: RankPolicy,
    },

    /// Run the playoff bracket
    Playoffs {
        id: String,

        #[command(subcommand)]
        action: PlayoffAction,
    },
}

#[derive(Subcommand)]
enum PlayerAction {
    Add {
        id: String,

        #[arg(long, default_value = "ENTRENADOR")]
        role: Role,
    },
    List,
}

#[derive(Subcommand)]
enum TournamentAction {
    Create { name: String },
    List,
    Delete { id: String },
}

#[derive(Subcommand)]
enum PlayoffAction {
    /// Seed the bracket from the general table
    Generate,
    Show,
    /// Record a Play-In pairing (0 or 1) of pool A or B
    PlayIn {
        pool: Pool,
        pairing: usize,
        first: u32,
        second: u32,
    },
    Semifinal {
        pool: Pool,
        first: u32,
        second: u32,
    },
    Final {
        first: u32,
        second: u32,
    },
    AdvanceSemifinals,
    AdvanceFinal,
    Complete,
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err:#}");
            eprintln!("error: {err:#}");
            ExitCode::from(1)
        }
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let base = env::current_dir().context("resolve working directory")?;
    let env_keys = load_env_file(&base);

    let config_file = cli.config.clone().unwrap_or_else(|| config_path(&base));
    let config = load_config(&config_file)?;
    let _guard = init_tracing(&config, &base);
    info!("tourney starting with {}", config_file.display());
    if !env_keys.is_empty() {
        info!("Loaded {} from .env", env_keys.join(", "));
    }

    let data_path = config.data_path(&base);
    let mut state = AppState::load(&data_path)?.with_user(cli.user.clone());
    let changed = execute(&mut state, cli.command)?;
    if changed {
        state.save(&data_path)?;
    }
    Ok(())
}

/// Runs one command; returns whether the state must be written back.
fn execute(state: &mut AppState, command: Commands) -> Result<bool> {
    match command {
        Commands::Players { action } => match action {
            PlayerAction::Add { id, role } => {
                print_json(state.add_player(&id, role)?)?;
                Ok(true)
            }
            PlayerAction::List => {
                print_json(&state.roster)?;
                Ok(false)
            }
        },
        Commands::Tournaments { action } => match action {
            TournamentAction::Create { name } => {
                print_json(state.create_tournament(&name, Utc::now())?)?;
                Ok(true)
            }
            TournamentAction::List => {
                print_json(&state.tournaments)?;
                Ok(false)
            }
            TournamentAction::Delete { id } => {
                print_json(&state.delete_tournament(&id)?)?;
                Ok(true)
            }
        },
        Commands::Schedule { id, template } => {
            let template = match template {
                Some(path) => ScheduleTemplate::load(&path)?,
                None => ScheduleTemplate::blank(),
            };
            print_json(state.generate_schedule(&id, &template)?)?;
            Ok(true)
        }
        Commands::Score { id, round, index, home, away } => {
            let game = state.record_match_score(&id, round, index, parse_score(&home), parse_score(&away))?;
            print_json(game)?;
            Ok(true)
        }
        Commands::Table { id, policy } => {
            print_json(&state.standings(&id, policy)?)?;
            Ok(false)
        }
        Commands::Playoffs { id, action } => run_playoffs(state, &id, action),
    }
}

fn run_playoffs(state: &mut AppState, id: &str, action: PlayoffAction) -> Result<bool> {
    match action {
        PlayoffAction::Generate => {
            print_json(state.generate_playoffs(id, Utc::now())?)?;
            return Ok(true);
        }
        PlayoffAction::Show => {
            print_json(state.bracket(id)?)?;
            return Ok(false);
        }
        _ => {}
    }

    let bracket = state.bracket_mut(id)?;
    match action {
        PlayoffAction::PlayIn { pool, pairing, first, second } => {
            bracket.record_play_in(pool, pairing, first, second)?;
        }
        PlayoffAction::Semifinal { pool, first, second } => {
            bracket.record_semifinal(pool, first, second)?;
        }
        PlayoffAction::Final { first, second } => {
            bracket.record_final(first, second)?;
        }
        PlayoffAction::AdvanceSemifinals => bracket.advance_to_semifinals()?,
        PlayoffAction::AdvanceFinal => bracket.advance_to_final()?,
        PlayoffAction::Complete => {
            bracket.complete_tournament()?;
        }
        PlayoffAction::Generate | PlayoffAction::Show => {}
    }
    print_json(&*bracket)?;
    Ok(true)
}

/// Numbers are kept as numbers; anything else is passed through as text
/// and rejected by score validation.
fn parse_score(raw: &str) -> RawScore {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return RawScore::Missing;
    }
    match trimmed.parse::<f64>() {
        Ok(value) => RawScore::Number(value),
        Err(_) => RawScore::Text(trimmed.to_string()),
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
