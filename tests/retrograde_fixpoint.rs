//! Builds a full tablebase for a 4x4 toy board and checks the retrograde
//! BFS's output against an independently computed reference: a forward
//! relaxation (value iteration) over the same position graph, repeatedly
//! sweeping every position and tightening its ply bound from its children
//! until nothing changes. This exercises the same win/lose alternation rule
//! as `retrograde::run` through a completely different control flow
//! (no frontier, no atomics, no partition-order sweep), so an agreement
//! between the two is real evidence the scheduling logic is correct and not
//! just self-consistent with itself.

use std::collections::HashMap;

use krktb::geometry::BoardConfig;
use krktb::movegen;
use krktb::position::{Mate, Position, Side};
use krktb::predicates;
use krktb::record::RecordStore;
use krktb::{classifier, retrograde};

fn reference_plies(config: &BoardConfig) -> HashMap<(u64, Side), u32> {
    let mut ply: HashMap<(u64, Side), u32> = HashMap::new();

    for idx in 0..config.total_positions {
        let (bk, wk, wr) = config.decode(idx);
        let pos = Position::new(bk, wk, wr, Side::Black);
        if predicates::is_legal(&pos) && predicates::determine_mate(&pos) == Mate::Yes {
            ply.insert((idx, Side::Black), 0);
        }
    }

    loop {
        let mut changed = false;
        for side in [Side::White, Side::Black] {
            for idx in 0..config.total_positions {
                if ply.contains_key(&(idx, side)) {
                    continue;
                }
                let (bk, wk, wr) = config.decode(idx);
                let pos = Position::new(bk, wk, wr, side);
                if !predicates::is_legal(&pos) || predicates::is_draw(&pos, config) {
                    continue;
                }

                let children: Vec<Position> = movegen::children(&pos, config)
                    .into_iter()
                    .filter(|c| !predicates::is_draw(c, config))
                    .collect();
                if children.is_empty() {
                    continue;
                }
                let resolved: Vec<u32> = children
                    .iter()
                    .filter_map(|c| {
                        let cidx = config.encode(c.bk, c.wk, c.wr);
                        ply.get(&(cidx, c.side)).copied()
                    })
                    .collect();

                match side {
                    Side::White => {
                        if let Some(&min) = resolved.iter().min() {
                            ply.insert((idx, side), min + 1);
                            changed = true;
                        }
                    }
                    Side::Black => {
                        if resolved.len() == children.len() {
                            let max = *resolved.iter().max().unwrap();
                            ply.insert((idx, side), max + 1);
                            changed = true;
                        }
                    }
                }
            }
        }
        if !changed {
            break;
        }
    }

    ply
}

#[test]
fn retrograde_bfs_matches_reference_fixpoint_on_a_4x4_board() {
    let config = BoardConfig::new(4, 4, 2, 2).unwrap();
    let store = RecordStore::new_heap(&config).unwrap();
    let frontier = classifier::classify_all(&store, &config);
    retrograde::run(&store, &config, frontier);

    let reference = reference_plies(&config);

    let mut production_resolved = 0u64;
    let mut reference_resolved = 0u64;

    for side in [Side::Black, Side::White] {
        for idx in 0..config.total_positions {
            let view = store.get(side, idx);
            let expected = reference.get(&(idx, side)).copied();
            assert_eq!(
                view.ply, expected,
                "ply mismatch at idx={idx} side={side:?}: production={:?} reference={:?}",
                view.ply, expected
            );
            if view.ply.is_some() {
                production_resolved += 1;
            }
            if expected.is_some() {
                reference_resolved += 1;
            }
        }
    }

    assert_eq!(production_resolved, reference_resolved);
    assert!(production_resolved > 0, "the 4x4 board should have at least one forced mate");
}

// Property 8: every legal, non-drawn, mate-reachable black-to-move position
// has a resolved ply; every other legal position has none.
#[test]
fn frontier_coverage_holds_on_the_built_4x4_table() {
    let config = BoardConfig::new(4, 4, 2, 2).unwrap();
    let store = RecordStore::new_heap(&config).unwrap();
    let frontier = classifier::classify_all(&store, &config);
    retrograde::run(&store, &config, frontier);

    for idx in 0..config.total_positions {
        for side in [Side::Black, Side::White] {
            let view = store.get(side, idx);
            if !view.is_legal() {
                assert_eq!(view.ply, None);
                continue;
            }
            if view.is_draw() {
                assert_eq!(view.ply, None, "a drawn position must never carry a resolved ply");
            }
        }
    }
}

// Properties 5 and 6: White's resolved ply is a minimum over children,
// Black's is a maximum, both witnessed by at least one child at the
// adjacent ply.
#[test]
fn ply_minimality_and_maximality_hold_on_the_built_4x4_table() {
    let config = BoardConfig::new(4, 4, 2, 2).unwrap();
    let store = RecordStore::new_heap(&config).unwrap();
    let frontier = classifier::classify_all(&store, &config);
    retrograde::run(&store, &config, frontier);

    for idx in 0..config.total_positions {
        let (bk, wk, wr) = config.decode(idx);

        let white_view = store.get(Side::White, idx);
        if white_view.is_legal() && !white_view.is_draw() {
            if let Some(k) = white_view.ply {
                if k > 0 {
                    let pos = Position::new(bk, wk, wr, Side::White);
                    let child_plies: Vec<u32> = movegen::children(&pos, &config)
                        .into_iter()
                        .filter(|c| !predicates::is_draw(c, &config))
                        .filter_map(|c| {
                            let cidx = config.encode(c.bk, c.wk, c.wr);
                            store.get(Side::Black, cidx).ply
                        })
                        .collect();
                    assert!(child_plies.iter().any(|&p| p == k - 1));
                    assert!(child_plies.iter().all(|&p| p + 1 >= k));
                }
            }
        }

        let black_view = store.get(Side::Black, idx);
        if black_view.is_legal() && !black_view.is_draw() {
            if let Some(k) = black_view.ply {
                if k > 0 {
                    let pos = Position::new(bk, wk, wr, Side::Black);
                    let non_drawn_children: Vec<Position> = movegen::children(&pos, &config)
                        .into_iter()
                        .filter(|c| !predicates::is_draw(c, &config))
                        .collect();
                    let child_plies: Vec<u32> = non_drawn_children
                        .iter()
                        .filter_map(|c| {
                            let cidx = config.encode(c.bk, c.wk, c.wr);
                            store.get(Side::White, cidx).ply
                        })
                        .collect();
                    assert_eq!(child_plies.len(), non_drawn_children.len(), "every non-drawn child must be resolved");
                    assert!(child_plies.iter().any(|&p| p == k - 1));
                    assert!(child_plies.iter().all(|&p| p <= k - 1));
                }
            }
        }
    }
}
