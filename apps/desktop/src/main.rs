// Duel log CLI binary

use anyhow::Result;
use chrono::{Datelike, Local};
use clap::{Parser, Subcommand};
use duel_core::rank;
use duel_core::types::GameMode;
use duel_log_lib::commands::{self, FileOutcome};
use duel_log_lib::config::AppConfig;
use duel_log_lib::db::CsvExportOptions;
use duel_log_lib::{logging, open_state};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "duel-log")]
#[command(about = "Duel log - record duels and review win rates", long_about = None)]
#[command(version)]
struct Cli {
    /// Database file (overrides DUEL_LOG_DB_PATH)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List active decks
    Decks,

    /// Show dashboard statistics for a month
    Dashboard {
        /// Year (defaults to the current year)
        #[arg(long)]
        year: Option<i32>,
        /// Month 1-12 (defaults to the current month)
        #[arg(long)]
        month: Option<u32>,
        /// Game mode: RANK, RATE, EVENT or DC
        #[arg(long, value_parser = parse_mode)]
        mode: Option<GameMode>,
        /// Print the statistics as JSON
        #[arg(long)]
        json: bool,
    },

    /// Export duels as CSV
    Export {
        /// Output file (stdout when omitted)
        #[arg(short, long)]
        out: Option<PathBuf>,
        #[arg(long)]
        year: Option<i32>,
        #[arg(long)]
        month: Option<u32>,
        #[arg(long, value_parser = parse_mode)]
        mode: Option<GameMode>,
    },

    /// Import duels from a CSV file
    Import {
        /// CSV file path
        path: PathBuf,
    },

    /// Open the database, migrating it if needed, and report the schema version
    Migrate,
}

fn parse_mode(value: &str) -> std::result::Result<GameMode, String> {
    GameMode::parse(&value.to_uppercase()).map_err(|e| e.to_string())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = AppConfig::from_env();
    if let Some(db) = cli.db {
        config.db_path = db;
    }
    logging::init(&config.log_filter);

    match cli.command {
        Commands::Decks => cmd_decks(&config),
        Commands::Dashboard {
            year,
            month,
            mode,
            json,
        } => cmd_dashboard(&config, year, month, mode, json),
        Commands::Export {
            out,
            year,
            month,
            mode,
        } => cmd_export(&config, out, year, month, mode),
        Commands::Import { path } => cmd_import(&config, path),
        Commands::Migrate => cmd_migrate(&config),
    }
}

fn cmd_decks(config: &AppConfig) -> Result<()> {
    let state = open_state(config)?;
    let decks = commands::list_decks(&state)?;

    if decks.is_empty() {
        println!("No decks.");
        return Ok(());
    }

    println!("{:<6} {:<10} NAME", "ID", "SIDE");
    for deck in decks {
        let side = if deck.is_opponent { "opponent" } else { "own" };
        println!("{:<6} {:<10} {}", deck.id, side, deck.name);
    }
    Ok(())
}

fn cmd_dashboard(
    config: &AppConfig,
    year: Option<i32>,
    month: Option<u32>,
    mode: Option<GameMode>,
    json: bool,
) -> Result<()> {
    let today = Local::now().date_naive();
    let year = year.unwrap_or(today.year());
    let month = month.unwrap_or(today.month());
    if !(1..=12).contains(&month) {
        anyhow::bail!("month must be between 1 and 12, got {}", month);
    }

    let state = open_state(config)?;
    let stats = commands::get_dashboard(&state, year, month, mode)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    println!("{}-{:02}", year, month);
    println!("  Duels:           {}", stats.total_duels);
    println!("  Wins / losses:   {} / {}", stats.wins, stats.losses);
    println!("  Win rate:        {:.1}%", stats.win_rate);
    println!("  Coin toss won:   {:.1}%", stats.coin_win_rate);
    println!("  Going first:     {:.1}%", stats.first_turn_rate);

    if !stats.recent_duels.is_empty() {
        println!();
        println!("Recent duels:");
        for duel in &stats.recent_duels {
            let result = if duel.is_win { "W" } else { "L" };
            let value = match duel.game_mode {
                GameMode::Rank => duel.rank.map(rank::display),
                _ => duel.mode_value().map(|v| v.to_string()),
            };
            println!(
                "  {}  {}  {} vs {}  {}{}",
                duel.played_date.format("%m/%d %H:%M"),
                result,
                duel.deck_name,
                duel.opponent_deck_name,
                duel.game_mode.as_str(),
                value.map(|v| format!(" {}", v)).unwrap_or_default()
            );
        }
    }
    Ok(())
}

fn cmd_export(
    config: &AppConfig,
    out: Option<PathBuf>,
    year: Option<i32>,
    month: Option<u32>,
    mode: Option<GameMode>,
) -> Result<()> {
    let state = open_state(config)?;
    let options = CsvExportOptions {
        year,
        month,
        game_mode: mode,
        columns: Vec::new(),
    };

    match out {
        Some(path) => {
            if let FileOutcome::Completed(file) =
                commands::export_csv_file(&state, Some(path), options)?
            {
                println!("Wrote {} bytes to {}", file.bytes, file.path.display());
            }
        }
        None => print!("{}", commands::export_csv_text(&state, options)?),
    }
    Ok(())
}

fn cmd_import(config: &AppConfig, path: PathBuf) -> Result<()> {
    let state = open_state(config)?;
    let FileOutcome::Completed(summary) = commands::import_csv_file(&state, Some(path))? else {
        return Ok(());
    };

    println!("Import complete:");
    println!("  Created:  {}", summary.created);
    println!("  Skipped:  {}", summary.skipped);
    println!("  Errors:   {}", summary.errors.len());
    for error in &summary.errors {
        println!("    {}", error);
    }

    if !summary.success {
        std::process::exit(1);
    }
    Ok(())
}

fn cmd_migrate(config: &AppConfig) -> Result<()> {
    let state = open_state(config)?;
    let repo = state
        .repository
        .lock()
        .map_err(|_| anyhow::anyhow!("repository lock poisoned"))?;
    println!(
        "{}: schema version {}",
        config.db_path.display(),
        repo.schema_version()?
    );
    Ok(())
}
