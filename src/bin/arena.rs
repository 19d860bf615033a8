//! Arena CLI: play simulated Eriantys matches between bots.
//!
//! Usage:
//!   cargo run --release --bin eriantys-arena -- --games 200 --players 3
//!   cargo run --release --bin eriantys-arena -- --config eriantys.toml --bot hoarder

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use eriantys_turn_engine::engine::arena::run_arena;
use eriantys_turn_engine::engine::bot_strategy::{BotStrategy, HoarderBot, RandomBot};
use eriantys_turn_engine::engine::config::{load_config, load_default_config};
use eriantys_turn_engine::games::eriantys::EriantysRules;

#[derive(Parser)]
#[command(name = "eriantys-arena", about = "Run simulated Eriantys matches between bots")]
struct Cli {
    /// Number of games to play
    #[arg(long, default_value = "100")]
    games: usize,

    /// Players per game (overrides the config file)
    #[arg(long)]
    players: Option<usize>,

    /// Base random seed; game i uses seed + i
    #[arg(long, default_value = "42")]
    seed: u64,

    /// Path to eriantys.toml (default: auto-discover)
    #[arg(long, env = "ERIANTYS_CONFIG")]
    config: Option<PathBuf>,

    /// Bot in every seat: "random" or "hoarder"
    #[arg(long, default_value = "random")]
    bot: String,

    /// Play without character cards and coins
    #[arg(long)]
    no_expert: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("warn".parse()?))
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => load_default_config(),
    };
    if let Some(players) = cli.players {
        config.players_number = players;
    }
    if cli.no_expert {
        config.expert_mode = false;
    }
    config.validate()?;

    let strategy: Box<dyn BotStrategy> = match cli.bot.as_str() {
        "random" => Box::new(RandomBot),
        "hoarder" => Box::new(HoarderBot),
        other => return Err(format!("unknown bot '{other}' (expected random or hoarder)").into()),
    };

    println!(
        "Running {} games: {} players, bot={}, expert={}, seed={}",
        cli.games,
        config.players_number,
        strategy.name(),
        config.expert_mode,
        cli.seed
    );

    let step = (cli.games / 10).max(1);
    let progress = move |done: usize, total: usize| {
        if done % step == 0 || done == total {
            eprintln!("  {done}/{total} games");
        }
    };

    let expert_mode = config.expert_mode;
    let result = run_arena(
        &config,
        cli.games,
        cli.seed,
        |seed| EriantysRules::new(expert_mode, seed),
        strategy.as_ref(),
        Some(&progress),
    );

    println!("\n{}", result.summary());
    Ok(())
}
