//! saber_slice: command-line entry point.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use saber_slice::app::{run, AppConfig};
use saber_slice::leaderboard::{ScoreBoard, DEFAULT_TOP};
use slice_sim::GameConfig;

#[derive(Parser, Debug)]
#[command(name = "saber_slice", version, about = "Slice falling objects with hand-tracked blades")]
struct Cli {
    /// JSON game config; unset fields keep their defaults.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the round length in seconds.
    #[arg(long)]
    duration: Option<u32>,

    /// Seed for a repeatable spawn sequence.
    #[arg(long)]
    seed: Option<u64>,

    /// Player name; created on first use.
    #[arg(long)]
    player: Option<String>,

    /// Leaderboard file.
    #[arg(long, default_value = "saber_scores.json")]
    leaderboard: PathBuf,

    #[arg(long, default_value_t = 1280)]
    width: usize,

    #[arg(long, default_value_t = 720)]
    height: usize,

    /// Print the top scores and exit.
    #[arg(long)]
    top: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::filter::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    let mut game = match &cli.config {
        Some(path) => GameConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => GameConfig::default(),
    };
    if let Some(secs) = cli.duration {
        game.round_duration_secs = secs;
    }
    game.validate().context("invalid game config")?;

    let cfg = AppConfig {
        game,
        width:       cli.width,
        height:      cli.height,
        seed:        cli.seed,
        player:      cli.player,
        leaderboard: Some(cli.leaderboard),
    };

    if cli.top {
        let board = cfg.open_scoreboard()?;
        for r in board.top(DEFAULT_TOP) {
            println!("{:>3}. {:<20} {}", r.rank, r.username, r.high_score);
        }
        return Ok(());
    }

    #[cfg(feature = "leap")]
    info!(mode = "leap", "starting");
    #[cfg(not(feature = "leap"))]
    info!(mode = "pointer", "starting (use --features leap for hardware)");

    run(cfg)
}
