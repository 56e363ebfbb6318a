//! Move generation: children (positions reachable by one move) and parents
//! (positions from which a single move reaches the given position), used by
//! the classifier pass and the retrograde BFS respectively.

use crate::geometry::{BoardConfig, Square};
use crate::position::{Position, Side};
use crate::predicates;

fn king_neighbors(sq: Square, config: &BoardConfig) -> Vec<Square> {
    let mut out = Vec::with_capacity(8);
    for dx in -1i32..=1 {
        for dy in -1i32..=1 {
            if dx == 0 && dy == 0 {
                continue;
            }
            let nx = sq.x as i32 + dx;
            let ny = sq.y as i32 + dy;
            if nx >= 0 && ny >= 0 && (nx as u32) < config.board_x && (ny as u32) < config.board_y {
                out.push(Square::new(nx as u32, ny as u32));
            }
        }
    }
    out
}

/// Squares a rook at `from` can reach or pass through, given the white
/// king as a hard blocker and the black king as a soft one: landing on the
/// black king's square is generated as a candidate (it gets filtered out
/// by legality downstream, since White-to-move can never leave the black
/// king captured) but the slide still stops there, same as it would for
/// any other occupied square.
fn rook_slides(from: Square, wk: Square, bk: Square, config: &BoardConfig) -> Vec<Square> {
    let mut out = Vec::new();
    for (dx, dy) in [(1, 0), (-1, 0), (0, 1), (0, -1)] {
        let mut x = from.x as i32;
        let mut y = from.y as i32;
        loop {
            x += dx;
            y += dy;
            if x < 0 || y < 0 || (x as u32) >= config.board_x || (y as u32) >= config.board_y {
                break;
            }
            let sq = Square::new(x as u32, y as u32);
            if sq == wk {
                break;
            }
            if sq == bk {
                out.push(sq);
                break;
            }
            out.push(sq);
        }
    }
    out
}

/// Positions reachable from `pos` by one legal move of the side to move.
/// Precondition: `pos` is legal and not drawn (callers never need children
/// of a terminal position).
pub fn children(pos: &Position, config: &BoardConfig) -> Vec<Position> {
    let next_side = pos.side.other();
    let mut out = Vec::new();
    match pos.side {
        Side::Black => {
            for nbk in king_neighbors(pos.bk, config) {
                let cand = Position::new(nbk, pos.wk, pos.wr, next_side);
                if predicates::is_legal(&cand) {
                    out.push(cand);
                }
            }
        }
        Side::White => {
            for nwk in king_neighbors(pos.wk, config) {
                let cand = Position::new(pos.bk, nwk, pos.wr, next_side);
                if predicates::is_legal(&cand) {
                    out.push(cand);
                }
            }
            for nwr in rook_slides(pos.wr, pos.wk, pos.bk, config) {
                let cand = Position::new(pos.bk, pos.wk, nwr, next_side);
                if predicates::is_legal(&cand) {
                    out.push(cand);
                }
            }
        }
    }
    out
}

/// Positions from which a single legal move produces `pos`. This mirrors
/// `children`: king adjacency is a symmetric relation and rook slide
/// reachability is symmetric for a fixed pair of kings, so the candidate
/// squares are generated with the exact same helpers, just interpreted as
/// origins rather than destinations.
pub fn parents(pos: &Position, config: &BoardConfig) -> Vec<Position> {
    let mover_side = pos.side.other();
    let mut out = Vec::new();
    match mover_side {
        Side::Black => {
            for parent_bk in king_neighbors(pos.bk, config) {
                let cand = Position::new(parent_bk, pos.wk, pos.wr, mover_side);
                if predicates::is_legal(&cand) {
                    out.push(cand);
                }
            }
        }
        Side::White => {
            for parent_wk in king_neighbors(pos.wk, config) {
                let cand = Position::new(pos.bk, parent_wk, pos.wr, mover_side);
                if predicates::is_legal(&cand) {
                    out.push(cand);
                }
            }
            for parent_wr in rook_slides(pos.wr, pos.wk, pos.bk, config) {
                let cand = Position::new(pos.bk, pos.wk, parent_wr, mover_side);
                if predicates::is_legal(&cand) {
                    out.push(cand);
                }
            }
        }
    }
    out
}
