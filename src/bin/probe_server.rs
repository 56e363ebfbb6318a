//! The `probe-server` binary: loads a completed tablebase
//! (mmap mode) and serves the probe protocol on `127.0.0.1:{2000 + board_x}`,
//! one thread per connection. Protocol errors close the offending connection
//! and are logged; they never bring the server down.

use std::net::{TcpListener, TcpStream};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use log::{error, info, warn};

use krktb::config::BoardArgs;
use krktb::error::ProtocolError;
use krktb::geometry::{BoardConfig, Square};
use krktb::persistence;
use krktb::position::Side;
use krktb::protocol::{ProbeRequest, ProbeResponse, ProbeResponseRecord};
use krktb::record::RecordStore;

/// Serves tablebase lookups for a completed King+Rook vs King build.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Prefix directory the tablebase was built under.
    prefix: PathBuf,

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

    let path = persistence::table_path(&cli.prefix, &config);
    let (store, level_count) = match persistence::open_mmap(&path, &config) {
        Ok(pair) => pair,
        Err(err) => {
            error!("failed to open tablebase at {}: {err}", path.display());
            return ExitCode::from(1);
        }
    };
    info!("loaded tablebase ({level_count} retrograde levels) for {}x{} board", config.board_x, config.board_y);

    let port = 2000 + config.board_x as u16;
    let listener = match TcpListener::bind(("127.0.0.1", port)) {
        Ok(listener) => listener,
        Err(err) => {
            error!("failed to bind 127.0.0.1:{port}: {err}");
            return ExitCode::from(1);
        }
    };
    info!("probe server listening on 127.0.0.1:{port}");

    let store = Arc::new(store);
    let config = Arc::new(config);
    for incoming in listener.incoming() {
        match incoming {
            Ok(stream) => {
                let store = Arc::clone(&store);
                let config = Arc::clone(&config);
                std::thread::spawn(move || {
                    if let Err(err) = serve_connection(stream, &store, &config) {
                        warn!("probe connection error: {err}");
                    }
                });
            }
            Err(err) => warn!("failed to accept connection: {err}"),
        }
    }
    ExitCode::SUCCESS
}

fn serve_connection(mut stream: TcpStream, store: &RecordStore, config: &BoardConfig) -> Result<(), ProtocolError> {
    loop {
        let request = match ProbeRequest::read_from(&mut stream)? {
            Some(request) => request,
            None => return Ok(()), // peer closed the connection cleanly between requests
        };

        let bk = Square::new(request.bkx as u32, request.bky as u32);
        let wk = Square::new(request.wkx as u32, request.wky as u32);
        let wr = Square::new(request.wrx as u32, request.wry as u32);
        if !config.in_bounds(bk) || !config.in_bounds(wk) || !config.in_bounds(wr) {
            warn!("probe request {request:?} out of bounds for {}x{} board", config.board_x, config.board_y);
            continue;
        }

        let idx = config.encode(bk, wk, wr);
        let response = ProbeResponse {
            black: ProbeResponseRecord::from_view(&store.get(Side::Black, idx)),
            white: ProbeResponseRecord::from_view(&store.get(Side::White, idx)),
        };
        response.write_to(&mut stream)?;
    }
}
