//! Lacuna: headless games between bots.
//!
//! ## Usage
//!
//! - `lacuna` - Run the demo game
//! - `lacuna play --first minimax --second greedy` - Play one game
//! - `lacuna demo` - Seeded minimax-versus-greedy game

use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::prelude::*;

use lacuna::bots::BotKind;
use lacuna::config::{GameConfig, Rewards, SearchConfig};
use lacuna::constants::{
    DEFAULT_COLOURS, DEFAULT_PIECES_PER_COLOUR, DEFAULT_SEARCH_DEPTH, DEFAULT_TOKENS_PER_PLAYER,
    SEARCH_RESOLUTION,
};
use lacuna::game::{Game, GameOutcome};

/// Lacuna: a connect-and-capture board game with bots
#[derive(Parser)]
#[command(name = "lacuna")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log search and game details
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Play one game between two bots
    Play(PlayArgs),
    /// Run a seeded minimax-versus-greedy game
    Demo,
}

#[derive(Args)]
struct PlayArgs {
    /// Policy of the first player
    #[arg(long, value_enum, default_value_t = BotKind::Minimax)]
    first: BotKind,
    /// Policy of the second player
    #[arg(long, value_enum, default_value_t = BotKind::Greedy)]
    second: BotKind,
    /// Seed for board setup and random fallbacks
    #[arg(long)]
    seed: Option<u64>,
    #[arg(long, default_value_t = DEFAULT_COLOURS)]
    colours: usize,
    #[arg(long, default_value_t = DEFAULT_PIECES_PER_COLOUR)]
    pieces: usize,
    #[arg(long, default_value_t = DEFAULT_TOKENS_PER_PLAYER)]
    tokens: usize,
    /// Search depth in plies
    #[arg(long, default_value_t = DEFAULT_SEARCH_DEPTH)]
    depth: u32,
    /// Placement samples per connection during search
    #[arg(long, default_value_t = SEARCH_RESOLUTION)]
    resolution: usize,
    /// Disable cached move ordering and iterative deepening
    #[arg(long)]
    no_order_moves: bool,
    /// Disable one-ply lookahead ordering
    #[arg(long)]
    no_lookahead: bool,
    /// Wall-clock budget per search decision
    #[arg(long)]
    time_limit_ms: Option<u64>,
    /// Node budget per search decision
    #[arg(long)]
    node_limit: Option<u64>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Some(Commands::Play(args)) => run_play(args),
        Some(Commands::Demo) | None => run_demo(),
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose { LevelFilter::DEBUG } else { LevelFilter::INFO };
    tracing_subscriber::registry()
        .with(level)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();
}

fn run_play(args: PlayArgs) -> Result<()> {
    let config = GameConfig::new(args.colours, args.pieces, args.tokens)
        .context("invalid game configuration")?;
    let search = SearchConfig {
        max_depth: args.depth,
        resolution: args.resolution,
        order_moves: !args.no_order_moves,
        one_step_lookahead: !args.no_lookahead,
        time_limit: args.time_limit_ms.map(Duration::from_millis),
        node_limit: args.node_limit,
        rewards: Rewards::default(),
    }
    .validate()
    .context("invalid search configuration")?;

    let seed = args.seed.unwrap_or_else(|| fastrand::u64(..));
    play(config, search, args.first, args.second, seed)
}

fn run_demo() -> Result<()> {
    println!("Lacuna: connect-and-capture\n");
    let config = GameConfig::new(4, 5, 4)?;
    play(config, SearchConfig::default(), BotKind::Minimax, BotKind::Greedy, 2024)
}

fn play(
    config: GameConfig,
    search: SearchConfig,
    first: BotKind,
    second: BotKind,
    seed: u64,
) -> Result<()> {
    let mut game = Game::from_seed(
        config,
        first.build(seed, search)?,
        second.build(seed.wrapping_add(1), search)?,
        seed,
    )
    .context("board setup failed")?;

    let [a, b] = game.bot_names();
    println!("{a} (first) vs {b} (second), seed {seed}");
    let outcome = game.run();
    print_outcome(&game, &outcome);
    Ok(())
}

fn print_outcome(game: &Game, outcome: &GameOutcome) {
    let names = game.bot_names();
    for (i, name) in names.iter().enumerate() {
        println!(
            "{name}: {} colours, {} pieces, by colour {:?}",
            outcome.colour_wins[i],
            outcome.captured[i],
            game.state().players[i].by_colour
        );
    }
    println!("Moves: {}, fallbacks: {}", outcome.moves, outcome.fallbacks);
    println!("Winner: {} ({})", names[outcome.winner], outcome.winner + 1);
}
