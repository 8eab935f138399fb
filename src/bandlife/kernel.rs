//! Local step kernel for one worker's band.
//!
//! Rows come from the buffer's own storage: the rows above the first owned
//! row and below the last one are the halo slots, so the kernel never wraps
//! vertically. Columns wrap around the torus.

use super::grid::{GridBuffer, Slot};
use crate::rules::next_state;

/// What changed during one band step.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StepOutcome {
    pub changed: bool,
    pub population: u64,
}

#[inline(always)]
fn row_triplet_count(row: &[bool], west: usize, j: usize, east: usize) -> u8 {
    row[west] as u8 + row[j] as u8 + row[east] as u8
}

/// Compute one row of the next generation from the rows around it.
#[inline(always)]
fn advance_row(above: &[bool], row: &[bool], below: &[bool], out: &mut [bool]) -> StepOutcome {
    let cols = row.len();
    let mut outcome = StepOutcome::default();
    for j in 0..cols {
        let west = (j + cols - 1) % cols;
        let east = (j + 1) % cols;
        let neighbors = row_triplet_count(above, west, j, east)
            + row[west] as u8
            + row[east] as u8
            + row_triplet_count(below, west, j, east);
        let alive = row[j];
        let next = next_state(alive, neighbors);
        out[j] = next;
        outcome.changed |= next != alive;
        outcome.population += next as u64;
    }
    outcome
}

/// Advance every owned row of `current` into `next`.
///
/// Only owned rows of `next` are written. Its halo slots keep whatever they
/// held until the exchange refreshes them.
pub fn step(current: &GridBuffer, next: &mut GridBuffer) -> StepOutcome {
    debug_assert_eq!(current.band(), next.band());
    debug_assert_eq!(current.cols(), next.cols());

    let mut outcome = StepOutcome::default();
    for i in 0..current.height() {
        let s = i + 1;
        let row_outcome = advance_row(
            current.storage_row(s - 1),
            current.storage_row(s),
            current.storage_row(s + 1),
            next.slot_mut(Slot::Owned(i)),
        );
        outcome.changed |= row_outcome.changed;
        outcome.population += row_outcome.population;
    }
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bandlife::partition::Band;
    use crate::board::Board;

    fn single_band(board: &Board) -> (GridBuffer, GridBuffer) {
        let band = Band {
            start: 0,
            end: board.rows(),
        };
        let mut current = GridBuffer::new(band, board.cols());
        current.load_band(board);
        (current, GridBuffer::new(band, board.cols()))
    }

    fn owned(grid: &GridBuffer) -> Vec<Vec<u8>> {
        grid.owned_rows()
            .map(|row| row.iter().map(|&c| c as u8).collect())
            .collect()
    }

    #[test]
    fn every_neighbor_count_follows_the_rule() {
        // Centre of a 3x3 window, with `n` live neighbors placed in a fixed order.
        let order = [(0, 0), (0, 1), (0, 2), (1, 0), (1, 2), (2, 0), (2, 1), (2, 2)];
        for alive in [false, true] {
            for n in 0..=8usize {
                let mut rows = [[false; 5]; 3];
                rows[1][2] = alive;
                for &(r, c) in &order[..n] {
                    rows[r][c + 1] = true;
                }
                let mut out = [false; 5];
                advance_row(&rows[0], &rows[1], &rows[2], &mut out);
                let expected = if alive { n == 2 || n == 3 } else { n == 3 };
                assert_eq!(out[2], expected, "alive={alive} neighbors={n}");
            }
        }
    }

    #[test]
    fn corner_cell_reaches_across_every_edge() {
        let board = Board::from_rows(&[[1u8, 0, 0], [0, 0, 0], [0, 0, 0]]).unwrap();
        let (current, _) = single_band(&board);
        // Every other cell of a 3x3 torus touches the corner exactly once.
        for i in 0..3 {
            for j in 0..3 {
                if (i, j) == (0, 0) {
                    continue;
                }
                let s = i + 1;
                let west = (j + 2) % 3;
                let east = (j + 1) % 3;
                let count = row_triplet_count(current.storage_row(s - 1), west, j, east)
                    + current.storage_row(s)[west] as u8
                    + current.storage_row(s)[east] as u8
                    + row_triplet_count(current.storage_row(s + 1), west, j, east);
                assert_eq!(count, 1, "cell ({i},{j})");
            }
        }
    }

    #[test]
    fn vertical_blinker_turns_horizontal() {
        let board = Board::from_rows(&[
            [0u8, 0, 0, 0, 0],
            [0, 0, 1, 0, 0],
            [0, 0, 1, 0, 0],
            [0, 0, 1, 0, 0],
            [0, 0, 0, 0, 0],
        ])
        .unwrap();
        let (current, mut next) = single_band(&board);
        let outcome = step(&current, &mut next);
        assert!(outcome.changed);
        assert_eq!(outcome.population, 3);
        assert_eq!(
            owned(&next),
            vec![
                vec![0, 0, 0, 0, 0],
                vec![0, 0, 0, 0, 0],
                vec![0, 1, 1, 1, 0],
                vec![0, 0, 0, 0, 0],
                vec![0, 0, 0, 0, 0],
            ]
        );
    }

    #[test]
    fn block_reports_no_change() {
        let board = Board::from_rows(&[[0u8, 0, 0, 0], [0, 1, 1, 0], [0, 1, 1, 0], [0, 0, 0, 0]]).unwrap();
        let (current, mut next) = single_band(&board);
        let outcome = step(&current, &mut next);
        assert!(!outcome.changed);
        assert_eq!(outcome.population, 4);
    }

    #[test]
    fn blinker_on_3x3_torus_touches_itself() {
        // Each column sees the whole blinker through the vertical wrap.
        let board = Board::from_rows(&[[0u8, 1, 0], [0, 1, 0], [0, 1, 0]]).unwrap();
        let (current, mut next) = single_band(&board);
        let outcome = step(&current, &mut next);
        assert_eq!(outcome.population, 9);
        assert_eq!(owned(&next), vec![vec![1, 1, 1]; 3]);
    }

    #[test]
    fn step_leaves_next_halos_untouched() {
        let board = Board::from_rows(&[[1u8, 1], [1, 1]]).unwrap();
        let (current, mut next) = single_band(&board);
        step(&current, &mut next);
        assert_eq!(next.top_halo(), &[false, false]);
        assert_eq!(next.bottom_halo(), &[false, false]);
    }
}
