mod schedule;
mod server;
mod settings;

use anyhow::{Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand};
use kickoff_acquire::espn::EspnSource;
use kickoff_acquire::sidearm::SidearmSource;
use kickoff_acquire::{Orchestrator, PageFetcher, ScheduleSource};
use kickoff_model::{season_for, AppConfig, GameRecord};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "kickoff")]
#[command(about = "Scrape a football schedule and publish it as a calendar feed")]
#[command(version)]
struct Cli {
    /// Log level: error, warn, info, debug, trace
    #[arg(long, global = true, default_value = "info", value_enum)]
    log_level: LogLevel,

    /// Use UTC timestamps instead of local time
    #[arg(long, global = true)]
    utc: bool,

    /// Configuration file (default: ./kickoff.toml if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, clap::ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

#[derive(Subcommand)]
enum Commands {
    /// Scrape the season, validate it, and rewrite the calendar file
    Refresh {
        /// Season (start year); defaults to the current season
        #[arg(short, long)]
        season: Option<i32>,
    },

    /// Run a single source and print what it found, without validating or writing
    Scrape {
        #[arg(short = 'S', long, value_enum)]
        source: SourceKind,

        /// Season (start year); defaults to the current season
        #[arg(short, long)]
        season: Option<i32>,

        /// Print the games as JSON
        #[arg(long)]
        json: bool,
    },

    /// Serve the calendar over HTTP and refresh it daily
    Serve {
        #[arg(long)]
        host: Option<String>,

        #[arg(short, long)]
        port: Option<u16>,
    },
}

#[derive(Clone, clap::ValueEnum)]
enum SourceKind {
    /// The athletics site's own schedule page
    Primary,
    /// ESPN team schedule table
    Backup,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Map log level, suppressing noisy HTML-parsing crates at debug/trace
    let level = match cli.log_level {
        LogLevel::Error => "error",
        LogLevel::Warn  => "warn",
        LogLevel::Info  => "info",
        LogLevel::Debug => "debug,selectors=warn,html5ever=warn",
        LogLevel::Trace => "trace,selectors=warn,html5ever=warn",
    };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    // Timestamp format: 2026-02-14 19:44:09.123 -08:00
    let time_format = "%Y-%m-%d %H:%M:%S%.3f %:z";

    if cli.utc {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_timer(tracing_subscriber::fmt::time::ChronoUtc::new(time_format.to_string()))
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_timer(tracing_subscriber::fmt::time::ChronoLocal::new(time_format.to_string()))
            .init();
    }

    let config = Arc::new(settings::load(cli.config.as_deref())?);
    let current_season = season_for(Local::now().date_naive());

    match cli.command {
        Commands::Refresh { season } => {
            let season = season.unwrap_or(current_season);
            tracing::info!(season, calendar = %config.calendar.path, "Refreshing calendar");
            let orchestrator = Orchestrator::from_config(config)?;
            let outcome = orchestrator.try_refresh(season).await?;
            println!(
                "Wrote {} games for {} from {} source",
                outcome.games.len(),
                season,
                outcome.source
            );
            for warning in &outcome.report.warnings {
                println!("warning: {warning}");
            }
        }
        Commands::Scrape { source, season, json } => {
            let season = season.unwrap_or(current_season);
            let fetcher = Arc::new(PageFetcher::new(&config.fetch)?);
            let adapter: Box<dyn ScheduleSource> = match source {
                SourceKind::Primary => Box::new(SidearmSource::new(fetcher, config.clone())),
                SourceKind::Backup => Box::new(EspnSource::new(fetcher, config.clone())),
            };
            tracing::info!(source = adapter.name(), season, "Scraping");
            let games = adapter.fetch_season(season).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&games)?);
            } else {
                print_games(&games);
            }
        }
        Commands::Serve { host, port } => {
            run_server(config, host, port).await?;
        }
    }

    Ok(())
}

async fn run_server(config: Arc<AppConfig>, host: Option<String>, port: Option<u16>) -> Result<()> {
    let host = host.unwrap_or_else(|| config.server.host.clone());
    let port = port.unwrap_or(config.server.port);
    let addr = SocketAddr::new(
        host.parse().with_context(|| format!("Invalid host address '{host}'"))?,
        port,
    );

    let orchestrator = Orchestrator::from_config(config.clone())?;
    let state = Arc::new(server::AppState::new(config, orchestrator));
    tokio::spawn(schedule::run_daily(state.clone()));

    let app = server::router(state);
    tracing::info!(addr = %addr, "Starting server");
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn print_games(games: &[GameRecord]) {
    println!("{:<40} {:<17} {:<30} {}", "GAME", "KICKOFF", "LOCATION", "BROADCAST");
    for g in games {
        println!(
            "{:<40} {:<17} {:<30} {}",
            g.title,
            g.start.format("%Y-%m-%d %H:%M"),
            g.location,
            g.broadcast
        );
    }
    println!("{} games", games.len());
}
