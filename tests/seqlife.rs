use std::collections::HashSet;

use band_life::bandlife::SnapshotSchedule;
use band_life::board::Board;
use band_life::seqlife::SeqLife;
use rand::Rng;
use rand::SeedableRng;

fn board_with(rows: usize, cols: usize, cells: &[(usize, usize)]) -> Board {
    let mut board = Board::new(rows, cols);
    for &(r, c) in cells {
        board.set(r, c, true);
    }
    board
}

fn collect_live(board: &Board) -> HashSet<(usize, usize)> {
    let mut out = HashSet::new();
    for r in 0..board.rows() {
        for c in 0..board.cols() {
            if board.get(r as isize, c as isize) {
                out.insert((r, c));
            }
        }
    }
    out
}

fn step_naive(cells: &HashSet<(usize, usize)>, rows: usize, cols: usize) -> HashSet<(usize, usize)> {
    let mut next = HashSet::new();
    for r in 0..rows {
        for c in 0..cols {
            let mut neighbors = 0;
            for dr in [rows - 1, 0, 1] {
                for dc in [cols - 1, 0, 1] {
                    if dr == 0 && dc == 0 {
                        continue;
                    }
                    if cells.contains(&((r + dr) % rows, (c + dc) % cols)) {
                        neighbors += 1;
                    }
                }
            }
            let alive = cells.contains(&(r, c));
            let next_alive = if alive {
                neighbors == 2 || neighbors == 3
            } else {
                neighbors == 3
            };
            if next_alive {
                next.insert((r, c));
            }
        }
    }
    next
}

#[test]
fn block_is_stable() {
    let block = [(1, 1), (1, 2), (2, 1), (2, 2)];
    let board = board_with(6, 6, &block);
    let mut engine = SeqLife::new(board.clone());
    engine.step_n(25);
    assert_eq!(engine.board(), &board);
}

#[test]
fn blinker_alternates_through_snapshots() {
    let vertical = board_with(5, 5, &[(1, 2), (2, 2), (3, 2)]);
    let horizontal = board_with(5, 5, &[(2, 1), (2, 2), (2, 3)]);

    let mut seen = Vec::new();
    let mut engine = SeqLife::new(vertical.clone());
    engine.run(2, &SnapshotSchedule::new([0, 1, 2]), |generation, board| {
        seen.push((generation, board.clone()));
    });

    assert_eq!(
        seen,
        vec![(0, vertical.clone()), (1, horizontal.clone()), (2, vertical)]
    );
    // Inclusive bound: generations 0, 1 and 2 each step once.
    assert_eq!(engine.generation(), 3);
    assert_eq!(engine.board(), &horizontal);
}

#[test]
fn glider_wraps_back_to_start_on_torus() {
    let glider = board_with(8, 8, &[(0, 1), (1, 2), (2, 0), (2, 1), (2, 2)]);
    let mut engine = SeqLife::new(glider.clone());
    engine.step_n(4);
    assert_eq!(
        engine.board(),
        &board_with(8, 8, &[(1, 2), (2, 3), (3, 1), (3, 2), (3, 3)])
    );
    engine.step_n(28);
    assert_eq!(engine.board(), &glider);
}

#[test]
fn single_cell_dies() {
    let mut engine = SeqLife::new(board_with(3, 3, &[(0, 0)]));
    engine.step();
    assert_eq!(engine.population(), 0);
}

#[test]
fn matches_naive_on_small_random_seed() {
    let mut rng = rand::rngs::StdRng::seed_from_u64(0xBADC0FFEE);
    let (rows, cols) = (13, 17);
    let mut board = Board::new(rows, cols);
    let mut naive = HashSet::new();
    for r in 0..rows {
        for c in 0..cols {
            if rng.random::<f64>() < 0.33 {
                board.set(r, c, true);
                naive.insert((r, c));
            }
        }
    }

    let mut engine = SeqLife::new(board);
    for _ in 0..10 {
        assert_eq!(collect_live(engine.board()), naive);
        engine.step();
        naive = step_naive(&naive, rows, cols);
    }
}
