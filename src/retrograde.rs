//! The level-synchronous concurrent retrograde BFS: starting from the
//! ply-0 black-to-move mates the classifier found, repeatedly walk to
//! parents one ply further back until no new position resolves.
//!
//! White-to-move parents are resolved by first-writer-wins: White picks
//! whichever child gives the shortest mate, so the first child to claim an
//! unset ply field wins and later children are no-ops. Black-to-move
//! parents are resolved only once every non-drawn child has reported in,
//! since Black delays as long as possible and a parent's true ply is the
//! maximum over its children, not the minimum.

use log::{debug, info};
use rayon::prelude::*;

use crate::geometry::BoardConfig;
use crate::movegen;
use crate::position::{Position, Side};
use crate::record::RecordStore;

/// Runs the BFS to completion and returns the number of levels processed
/// (the highest mate-in-ply value reached, plus one for the ply-0 seed
/// level), for recording in the on-disk completion trailer.
pub fn run(store: &RecordStore, config: &BoardConfig, initial_frontier: Vec<u64>) -> u64 {
    let mut frontier = initial_frontier;
    let mut level: u32 = 0;

    while !frontier.is_empty() {
        let child_side = if level % 2 == 0 { Side::Black } else { Side::White };
        let parent_side = child_side.other();
        let next_ply = level + 1;

        let next_frontiers: Vec<Vec<u64>> = frontier
            .par_iter()
            .map(|&child_idx| {
                let (bk, wk, wr) = config.decode(child_idx);
                let child_pos = Position::new(bk, wk, wr, child_side);
                let mut local = Vec::new();

                for parent_pos in movegen::parents(&child_pos, config) {
                    debug_assert_eq!(parent_pos.side, parent_side);
                    let parent_idx = config.encode(parent_pos.bk, parent_pos.wk, parent_pos.wr);
                    let rec = store.get(parent_side, parent_idx);
                    if !rec.is_legal() || rec.is_draw() {
                        continue;
                    }

                    let resolved = match parent_side {
                        Side::White => store.try_set_ply(parent_side, parent_idx, next_ply),
                        Side::Black => {
                            let visited = store.atomic_increment_visited(parent_side, parent_idx);
                            if visited == rec.children {
                                store.set_ply_direct(parent_side, parent_idx, next_ply);
                                true
                            } else {
                                false
                            }
                        }
                    };

                    if resolved {
                        local.push(parent_idx);
                    }
                }

                local
            })
            .collect();

        frontier = next_frontiers.into_iter().flatten().collect();
        level += 1;
        debug!("retrograde level {level} resolved {} positions", frontier.len());
    }

    info!("retrograde BFS converged after {level} levels");
    level as u64
}
