use std::error::Error;

use clap::{Parser, Subcommand};
use rookery_lib::{
    agent::{play_game, RandomAgent},
    lookup_tables,
    options::PerftOptions,
    perft::perft,
    GameBoard,
};

#[derive(Parser)]
#[command(version, about = "Chess rules core: perft and random self-play")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Count the leaf nodes of the legal move tree
    Perft {
        /// Depth in plies
        depth: usize,

        /// Start position, defaults to the standard one
        #[arg(long)]
        fen: Option<String>,

        /// Spread the root moves over all cores
        #[arg(short, long)]
        parallel: bool,

        /// Print node counts per root move
        #[arg(short, long)]
        divide: bool,

        /// Count leaf positions in check
        #[arg(long)]
        checks: bool,

        /// Count leaf positions in checkmate
        #[arg(long)]
        mates: bool,
    },

    /// Play a game of random moves and print every position
    RandomGame {
        /// Start position, defaults to the standard one
        #[arg(long)]
        fen: Option<String>,

        /// Seed for the white player; black uses seed + 1
        #[arg(short, long, default_value_t = 0)]
        seed: u64,

        /// Stop after this many plies
        #[arg(short, long, default_value_t = 500)]
        max_plies: usize,
    },
}

fn load_board(fen: Option<&str>) -> Result<GameBoard, Box<dyn Error>> {
    Ok(match fen {
        Some(fen) => GameBoard::from_fen(fen)?,
        None => GameBoard::starting()?,
    })
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rookery=info".into()),
        )
        .init();

    let args = Args::parse();
    lookup_tables::init();

    match args.command {
        Command::Perft {
            depth,
            fen,
            parallel,
            divide,
            checks,
            mates,
        } => {
            let board = load_board(fen.as_deref())?;
            let options = PerftOptions::new(depth)
                .parallel(parallel)
                .divide(divide)
                .count_checks(checks)
                .count_checkmates(mates);
            let result = perft(&board, &options)?;

            if let Some(divide) = &result.divide {
                for (mv, nodes) in divide {
                    println!("{mv}: {nodes}");
                }
                println!();
            }
            println!("Nodes: {}", result.nodes);
            println!("Captures: {}", result.captures);
            println!("En passant: {}", result.en_passant);
            println!("Castles: {}", result.castles);
            println!("Promotions: {}", result.promotions);
            if let Some(checks) = result.checks {
                println!("Checks: {checks}");
            }
            if let Some(mates) = result.checkmates {
                println!("Checkmates: {mates}");
            }
        }
        Command::RandomGame {
            fen,
            seed,
            max_plies,
        } => {
            let board = load_board(fen.as_deref())?;
            let mut white = RandomAgent::new(seed);
            let mut black = RandomAgent::new(seed.wrapping_add(1));
            let last = play_game(board, &mut white, &mut black, max_plies)?;

            let mut boards: Vec<&GameBoard> = last.history().collect();
            boards.reverse();
            for board in boards {
                match board.last_move() {
                    Some(mv) => println!("{mv}\t{}", board.fen()),
                    None if board.is_null_move() => println!("0000\t{}", board.fen()),
                    None => println!("\t{}", board.fen()),
                }
            }

            let result = match (last.state(), last.auto_draw_type()) {
                (state, _) if state.is_terminal() => state.to_string(),
                (_, Some(draw)) => format!("draw by {draw}"),
                _ => String::from("unfinished"),
            };
            tracing::info!(plies = last.ply_count(), %result, "random game finished");
        }
    }
    Ok(())
}
