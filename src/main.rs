//! Gamma: a territorial board game played over a line protocol.
//!
//! The program reads its framing line from stdin: `B W H P A` starts batch
//! mode, `I W H P A` starts the interactive terminal mode.
//!
//! - `gamma-rust` - Run the protocol driver
//! - `gamma-rust demo` - Play a short random game and print the result

use std::io;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use gamma_rust::game::Game;
use gamma_rust::interactive;
use gamma_rust::protocol::{self, Session};

/// Gamma: a territorial board game engine
#[derive(Parser)]
#[command(name = "gamma-rust")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Read the framing line from stdin and run batch or interactive mode
    Play,
    /// Play a short random game and print the final board
    Demo,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Demo) => {
            run_demo();
            ExitCode::SUCCESS
        }
        Some(Commands::Play) | None => match run_driver() {
            Ok(()) => ExitCode::SUCCESS,
            Err(_) => {
                eprintln!("ERROR");
                ExitCode::FAILURE
            }
        },
    }
}

fn run_driver() -> anyhow::Result<()> {
    let stdin = io::stdin();
    let session = protocol::run_session(stdin.lock(), io::stdout().lock(), io::stderr().lock())?;
    if let Session::Interactive(game) = session {
        interactive::run(game)?;
    }
    Ok(())
}

fn run_demo() {
    println!("Gamma: random three-player game on an 8x6 board\n");

    let Ok(mut game) = Game::new(8, 6, 3, 4) else {
        return;
    };
    let mut rng = fastrand::Rng::with_seed(0xD1CE);

    let mut placed = 0;
    for _ in 0..400 {
        let player = rng.u32(1..=game.players());
        let x = rng.u32(0..game.width());
        let y = rng.u32(0..game.height());
        if game.make_move(player, x, y) {
            placed += 1;
            if placed == 30 {
                break;
            }
        }
    }

    if let Some(board) = game.board() {
        print!("{}", board);
    }
    println!();
    for player in 1..=game.players() {
        println!(
            "PLAYER {}  busy: {}  free: {}  golden move: {}",
            player,
            game.busy_fields(player),
            game.free_fields(player),
            if game.golden_possible(player) {
                "available"
            } else {
                "unavailable"
            },
        );
    }
}
