//! The `build-tablebase` binary: validates board/block
//! dimensions, then either reports whether a tablebase already exists at the
//! derived path or, given the explicit `build` subcommand, runs the
//! classifier pass and retrograde BFS and writes the result.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use log::{error, info};

use krktb::config::BoardArgs;
use krktb::record::RecordStore;
use krktb::{classifier, persistence, retrograde};

/// Builds a King+Rook vs King retrograde tablebase for a configurable board.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Directory under which `board{Bx}x{By}/partition{Px}x{Py}/` is created.
    prefix: PathBuf,

    #[command(flatten)]
    board: BoardArgs,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the classifier pass and retrograde BFS, then write the tablebase
    /// file. Refuses to run if the file already exists.
    Build,
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    let config = match cli.board.to_board_config() {
        Ok(config) => config,
        Err(err) => {
            error!("invalid board configuration: {err}");
            return ExitCode::from(2);
        }
    };

    let path = persistence::table_path(&cli.prefix, &config);

    match cli.command {
        None => {
            if path.exists() {
                info!("tablebase already present at {}", path.display());
                ExitCode::SUCCESS
            } else {
                error!(
                    "no tablebase at {} yet; re-run with the `build` subcommand to construct one",
                    path.display()
                );
                ExitCode::from(1)
            }
        }
        Some(Command::Build) => run_build(&path, &config),
    }
}

fn run_build(path: &std::path::Path, config: &krktb::geometry::BoardConfig) -> ExitCode {
    if path.exists() {
        error!("refusing to overwrite existing tablebase at {}", path.display());
        return ExitCode::from(1);
    }

    info!(
        "building {}x{} board ({}x{} blocks, {} positions per side)",
        config.board_x, config.board_y, config.block_x, config.block_y, config.total_positions
    );

    let store = match RecordStore::new_heap(config) {
        Ok(store) => store,
        Err(err) => {
            error!("failed to allocate record store: {err}");
            return ExitCode::from(1);
        }
    };

    let frontier = classifier::classify_all(&store, config);
    let level_count = retrograde::run(&store, config, frontier);

    if let Err(err) = persistence::write(&store, path, level_count) {
        error!("failed to persist tablebase: {err}");
        return ExitCode::from(1);
    }

    info!("wrote tablebase to {} after {level_count} retrograde levels", path.display());
    ExitCode::SUCCESS
}
