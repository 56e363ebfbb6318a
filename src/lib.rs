//! # KRK retrograde tablebase builder
//!
//! Exhaustively solves the King-and-Rook versus King endgame on a
//! configurable rectangular board. For every legal position, both sides to
//! move, the build pipeline records a classification (legal / check / mate /
//! stalemate / draw) and, for positions from which White forces mate, the
//! exact number of ply to mate under optimal play.
//!
//! The pipeline, leaves first:
//! - [`geometry`]: board/block/partition geometry and the dense position index.
//! - [`position`]: the decoded `Position` and `Side` types the rest of the
//!   crate operates on.
//! - [`predicates`]: legality, check, mate/stalemate and draw, with no move
//!   generation.
//! - [`movegen`]: forward children and backward parents for a position.
//! - [`record`]: the bit-packed per-position record and the dense store
//!   (heap or mmap-backed) that holds one array per side to move.
//! - [`classifier`]: the parallel sweep that seeds every record and the ply-0
//!   mate frontier.
//! - [`retrograde`]: the level-synchronous BFS that propagates mate-in-k
//!   backward from that frontier.
//! - [`persistence`]: the on-disk layout, write path, and mmap read path.
//! - [`protocol`]: wire framing for the probe server.
//! - [`config`]: the `clap`-derived board/block arguments shared by the
//!   three binaries.
//! - [`error`]: the error taxonomy (`ConfigError`, `PersistError`,
//!   `ProtocolError`) covering every fallible boundary in the pipeline.

pub mod classifier;
pub mod config;
pub mod error;
pub mod geometry;
pub mod movegen;
pub mod persistence;
pub mod position;
pub mod predicates;
pub mod protocol;
pub mod record;
pub mod retrograde;
