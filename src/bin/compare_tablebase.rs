//! The `compare-tablebase` binary: opens two completed builds for
//! the same board configuration and streams every differing record to
//! stdout. This doubles as a round-trip/byte-equality check between two
//! independently produced files rather than the same store written then
//! read back.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use log::{error, info, warn};

use krktb::config::BoardArgs;
use krktb::persistence;
use krktb::position::Side;

/// Diffs two King+Rook vs King tablebase builds for the same board.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Prefix directory of the first ("left") build.
    left_prefix: PathBuf,

    /// Prefix directory of the second ("right") build.
    right_prefix: PathBuf,

    #[command(flatten)]
    board: BoardArgs,
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

    let left_path = persistence::table_path(&cli.left_prefix, &config);
    let right_path = persistence::table_path(&cli.right_prefix, &config);

    let (left, left_levels) = match persistence::open_mmap(&left_path, &config) {
        Ok(pair) => pair,
        Err(err) => {
            error!("failed to open {}: {err}", left_path.display());
            return ExitCode::from(1);
        }
    };
    let (right, right_levels) = match persistence::open_mmap(&right_path, &config) {
        Ok(pair) => pair,
        Err(err) => {
            error!("failed to open {}: {err}", right_path.display());
            return ExitCode::from(1);
        }
    };

    if left_levels != right_levels {
        warn!("level counts differ: left={left_levels} right={right_levels}");
    }

    let mut differences = 0u64;
    for side in [Side::Black, Side::White] {
        for idx in 0..config.total_positions {
            let l = left.get_raw(side, idx);
            let r = right.get_raw(side, idx);
            if l == r {
                continue;
            }
            differences += 1;
            let (bk, wk, wr) = config.decode(idx);
            println!(
                "{side:?} idx={idx} bk={bk:?} wk={wk:?} wr={wr:?} left={:?} right={:?}",
                left.layout().decode(l),
                right.layout().decode(r),
            );
        }
    }

    if differences == 0 {
        info!("no differences across {} records", 2 * config.total_positions);
        ExitCode::SUCCESS
    } else {
        warn!("{differences} differing records");
        ExitCode::from(1)
    }
}
