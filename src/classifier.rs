//! The initial parallel sweep: classify every position as legal/illegal,
//! check, mate, stalemate, or draw, and count each legal non-drawn
//! position's non-drawn children. Black-to-move mates become ply-0 seeds
//! for the retrograde BFS in `retrograde.rs`.

use indicatif::{ProgressBar, ProgressStyle};
use log::info;
use rayon::prelude::*;

use crate::geometry::BoardConfig;
use crate::movegen;
use crate::position::{Mate, Position, Side};
use crate::predicates;
use crate::record::{RecordStore, CLASS_CHECK, CLASS_DRAW, CLASS_LEGAL, CLASS_MATE, CLASS_STALEMATE};

/// Runs the classifier over every partition in parallel and returns the
/// dense indices of every black-to-move checkmate found, ready to seed the
/// retrograde BFS at ply 0.
pub fn classify_all(store: &RecordStore, config: &BoardConfig) -> Vec<u64> {
    info!(
        "classifying {} positions across {} partitions",
        config.total_positions, config.partition_count
    );
    let progress = ProgressBar::new(config.partition_count);
    if let Ok(style) = ProgressStyle::with_template("{bar:40} {pos}/{len} partitions ({eta})") {
        progress.set_style(style);
    }

    let frontiers: Vec<Vec<u64>> = (0..config.partition_count)
        .into_par_iter()
        .map(|partition| {
            let (start, end) = config.partition_bounds(partition);
            let mut local_frontier = Vec::new();
            for idx in start..end {
                classify_one(store, config, idx, &mut local_frontier);
            }
            progress.inc(1);
            local_frontier
        })
        .collect();

    progress.finish_and_clear();
    let frontier: Vec<u64> = frontiers.into_iter().flatten().collect();
    info!("classifier found {} black-to-move mates (ply 0)", frontier.len());
    frontier
}

fn classify_one(store: &RecordStore, config: &BoardConfig, idx: u64, frontier: &mut Vec<u64>) {
    let (bk, wk, wr) = config.decode(idx);

    for side in [Side::Black, Side::White] {
        let pos = Position::new(bk, wk, wr, side);
        if !predicates::is_legal(&pos) {
            continue; // record stays zeroed: illegal positions are never probed.
        }

        let mut classification = CLASS_LEGAL;
        if predicates::is_check(bk, wk, wr) {
            classification |= CLASS_CHECK;
        }
        let drawn = predicates::is_draw(&pos, config);
        if drawn {
            classification |= CLASS_DRAW;
        }

        let mut mate_ply0 = false;
        if side == Side::Black {
            debug_assert_eq!(
                predicates::black_has_moves(bk, wk, wr),
                predicates::black_has_moves_brute_force(bk, wk, wr, config),
                "black_has_moves case analysis disagrees with brute force at bk={bk:?} wk={wk:?} wr={wr:?}"
            );
            match predicates::determine_mate(&pos) {
                Mate::Yes => {
                    classification |= CLASS_MATE;
                    mate_ply0 = true;
                }
                Mate::Stalemate => {
                    classification |= CLASS_STALEMATE;
                    debug_assert!(drawn, "stalemate must also be classified as drawn");
                }
                Mate::No => {}
            }
        }

        let children_count = if drawn {
            0
        } else {
            movegen::children(&pos, config)
                .into_iter()
                .filter(|child| !predicates::is_draw(child, config))
                .count() as u32
        };

        store.set_classification(side, idx, classification, children_count);

        if mate_ply0 {
            store.set_ply_direct(side, idx, 0);
            frontier.push(idx);
        }
    }
}
