//! Legality, check, mate/stalemate, and draw predicates.
//!
//! These are direct ports of the case analyses used by the retrograde
//! analysis this engine is modeled on: the board has exactly one real
//! corner, at (0, 0), where the black king can be driven into checkmate.
//! The far edges (`board_x - 1`, `board_y - 1`) are "virtual" edges: they
//! represent the black king escaping toward infinity on the unbounded
//! board this finite window stands in for, which is why a king stuck
//! there is a draw rather than a candidate for mate. Every case analysis
//! below only ever tests the near edges for mate/stalemate, and only ever
//! tests the far edges for the draw-by-escape rule; that's not an
//! oversight, it falls directly out of which edges are real.

use crate::geometry::{BoardConfig, Square};
use crate::position::{Mate, Position, Side};

/// Swaps the x/y axes of a (black king, white king, white rook) triple, the
/// same trick the case analyses below use to halve the number of branches:
/// solve the problem assuming the interesting edge is the left edge, and
/// swap first if it's actually the top edge.
fn swap_axes(bk: Square, wk: Square, wr: Square) -> (Square, Square, Square) {
    let flip = |s: Square| Square::new(s.y, s.x);
    (flip(bk), flip(wk), flip(wr))
}

/// True if the black king, having no legal move, would actually have one.
/// Only meaningful when it is black to move; callers must not call this
/// for a white-to-move position.
pub fn black_has_moves(bk: Square, wk: Square, wr: Square) -> bool {
    if bk.x > 0 && bk.y > 0 {
        return true;
    }

    let (bk, wk, wr) = if bk.x != 0 { swap_axes(bk, wk, wr) } else { (bk, wk, wr) };

    if bk.y != 0 {
        if wk.x != 2 || wk.y != bk.y {
            return true;
        }
        if wr.x != 0 {
            return true;
        }
        return (bk.y as i64 - wr.y as i64).abs() <= 1;
    }

    // Black king in the corner.
    if wk.x > 2 || wk.y > 2 {
        return true;
    }
    if wr.x == 1 && wr.y == 1 {
        return false;
    }
    if wk.y == 0 {
        return !((wr.x == 0 && wr.y > 1) || (wr.x > 0 && wr.y == 1));
    } else if wk.y == 1 {
        return !(wr.x == 0 && wr.y > 1);
    } else if wk.x == 1 {
        return !(wr.x > 1 && wr.y == 0);
    } else if wk.x == 0 {
        return !((wr.x > 1 && wr.y == 0) || (wr.x == 1 && wr.y > 0));
    }
    true
}

/// True if the white rook has a clear line of sight to the black king,
/// regardless of whose move it is. Works even for the "illegal" position
/// where the rook sits on the black king's square (same-square counts as
/// no check: the king is already gone).
pub fn is_check(bk: Square, wk: Square, wr: Square) -> bool {
    let same_file = bk.x == wr.x;
    let same_row = bk.y == wr.y;
    if same_file == same_row {
        return false;
    }

    let (bk, wk, wr) = if !same_row { swap_axes(bk, wk, wr) } else { (bk, wk, wr) };

    if wk.y != bk.y {
        return true;
    }
    let min_x = bk.x.min(wr.x);
    let max_x = bk.x.max(wr.x);
    !(min_x < wk.x && wk.x < max_x)
}

/// True if `pos` is a legal position: kings not adjacent or overlapping,
/// the white rook not sharing the white king's square, and (for
/// white-to-move positions) black not left in an unresolved check.
pub fn is_legal(pos: &Position) -> bool {
    if pos.bk.is_adjacent(&pos.wk) || pos.bk == pos.wk {
        return false;
    }
    if pos.wr == pos.wk {
        return false;
    }
    if pos.wr == pos.bk {
        return pos.side == Side::White;
    }
    if pos.side == Side::Black {
        return true;
    }
    !is_check(pos.bk, pos.wk, pos.wr)
}

/// Mate/stalemate classification. Only ever yields `Mate::Yes` or
/// `Mate::Stalemate` for black-to-move positions; white-to-move positions
/// are always `Mate::No`, since stalemate/checkmate are concepts that only
/// apply to the side on move.
pub fn determine_mate(pos: &Position) -> Mate {
    if pos.side != Side::Black {
        return Mate::No;
    }
    if black_has_moves(pos.bk, pos.wk, pos.wr) {
        return Mate::No;
    }
    if is_check(pos.bk, pos.wk, pos.wr) {
        Mate::Yes
    } else {
        Mate::Stalemate
    }
}

/// Draw classification. For white to move, true iff the rook has been
/// captured. For black to move, true on stalemate, or when the black king
/// sits on a virtual (far) edge with no way for White to stop it from
/// escaping further.
pub fn is_draw(pos: &Position, config: &BoardConfig) -> bool {
    if pos.side == Side::White {
        return pos.bk == pos.wr;
    }

    if determine_mate(pos) == Mate::Stalemate {
        return true;
    }

    let (bk, wk, wr, board_y) = if pos.bk.x == config.board_x - 1 {
        let (bk, wk, wr) = swap_axes(pos.bk, pos.wk, pos.wr);
        (bk, wk, wr, config.board_x)
    } else {
        (pos.bk, pos.wk, pos.wr, config.board_y)
    };

    if bk.y != board_y - 1 {
        return false;
    }

    !(bk.x == 0 && wk.x == 2 && wk.y == board_y - 1 && wr.x == 0)
}

/// Brute-force cross-check for [`black_has_moves`]: actually enumerates the
/// black king's up-to-8 neighbouring squares and tests each one for
/// legality with White to move next, the same way the Move Generator would.
/// Only ever called from `debug_assert!`s and tests guarding the fast
/// case-analysis path above — never from the hot classifier loop itself.
pub fn black_has_moves_brute_force(bk: Square, wk: Square, wr: Square, config: &BoardConfig) -> bool {
    for dx in -1i32..=1 {
        for dy in -1i32..=1 {
            if dx == 0 && dy == 0 {
                continue;
            }
            let nx = bk.x as i32 + dx;
            let ny = bk.y as i32 + dy;
            if nx < 0 || ny < 0 || (nx as u32) >= config.board_x || (ny as u32) >= config.board_y {
                continue;
            }
            let candidate = Square::new(nx as u32, ny as u32);
            let pos = Position::new(candidate, wk, wr, Side::White);
            if is_legal(&pos) {
                return true;
            }
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::BoardConfig;

    fn config() -> BoardConfig {
        BoardConfig::new(64, 64, 8, 8).unwrap()
    }

    #[test]
    fn classic_back_rank_mate_is_mate() {
        let bk = Square::new(0, 0);
        let wk = Square::new(2, 1);
        let wr = Square::new(5, 0);
        assert!(!black_has_moves(bk, wk, wr));
        assert!(is_check(bk, wk, wr));
        let pos = Position::new(bk, wk, wr, Side::Black);
        assert_eq!(determine_mate(&pos), Mate::Yes);
    }

    #[test]
    fn corner_stalemate() {
        let bk = Square::new(0, 0);
        let wk = Square::new(1, 2);
        let wr = Square::new(1, 1);
        let pos = Position::new(bk, wk, wr, Side::Black);
        assert_eq!(determine_mate(&pos), Mate::Stalemate);
        assert!(is_draw(&pos, &config()));
    }

    #[test]
    fn rook_captured_is_draw_for_white_to_move() {
        let bk = Square::new(10, 10);
        let wk = Square::new(30, 30);
        let wr = bk;
        let pos = Position::new(bk, wk, wr, Side::White);
        assert!(is_legal(&pos));
        assert!(is_draw(&pos, &config()));
    }

    #[test]
    fn adjacent_kings_are_illegal() {
        let pos = Position::new(Square::new(5, 5), Square::new(5, 6), Square::new(0, 0), Side::White);
        assert!(!is_legal(&pos));
    }

    #[test]
    fn black_king_on_virtual_edge_escapes_by_default() {
        let config = config();
        let bk = Square::new(30, config.board_y - 1);
        let wk = Square::new(10, 10);
        let wr = Square::new(20, 20);
        let pos = Position::new(bk, wk, wr, Side::Black);
        assert!(is_draw(&pos, &config));
    }

    #[test]
    fn black_has_moves_matches_brute_force_exhaustively() {
        // A small board keeps this exhaustive triple loop cheap while still
        // covering interior squares, both near edges, and all four corners.
        let config = BoardConfig::new(8, 8, 4, 4).unwrap();
        for bx in 0..config.board_x {
            for by in 0..config.board_y {
                let bk = Square::new(bx, by);
                for wx in 0..config.board_x {
                    for wy in 0..config.board_y {
                        let wk = Square::new(wx, wy);
                        if wk == bk || wk.is_adjacent(&bk) {
                            continue;
                        }
                        for wr in [Square::new(0, 0), Square::new(1, 1), Square::new(3, 0), Square::new(0, 3), wk] {
                            if wr == wk {
                                continue;
                            }
                            let fast = black_has_moves(bk, wk, wr);
                            let brute = black_has_moves_brute_force(bk, wk, wr, &config);
                            assert_eq!(
                                fast, brute,
                                "mismatch at bk={bk:?} wk={wk:?} wr={wr:?}: fast={fast} brute={brute}"
                            );
                        }
                    }
                }
            }
        }
    }
}
