//! SeqLife engine core.
//!
//! Steps the whole board in one thread with full toroidal wraparound. This is
//! the oracle the partitioned engine is checked against.

use crate::bandlife::SnapshotSchedule;
use crate::board::Board;
use crate::rules::next_state;

pub struct SeqLife {
    board: Board,
    next: Board,
    generation: u64,
}

impl SeqLife {
    pub fn new(board: Board) -> Self {
        let next = Board::new(board.rows(), board.cols());
        Self {
            board,
            next,
            generation: 0,
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn into_board(self) -> Board {
        self.board
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn population(&self) -> u64 {
        self.board.population()
    }

    #[inline]
    fn neighbors(&self, row: usize, col: usize) -> u8 {
        let (r, c) = (row as isize, col as isize);
        let mut count = 0u8;
        for dr in -1..=1 {
            for dc in -1..=1 {
                if dr == 0 && dc == 0 {
                    continue;
                }
                count += self.board.get(r + dr, c + dc) as u8;
            }
        }
        count
    }

    pub fn step(&mut self) {
        for row in 0..self.board.rows() {
            for col in 0..self.board.cols() {
                let alive = self.board.get(row as isize, col as isize);
                let next = next_state(alive, self.neighbors(row, col));
                self.next.set(row, col, next);
            }
        }
        std::mem::swap(&mut self.board, &mut self.next);
        self.generation += 1;
    }

    pub fn step_n(&mut self, n: u64) {
        for _ in 0..n {
            self.step();
        }
    }

    /// Run generations `0..=gens` with the same loop shape as `BandLife::run`:
    /// report a matching generation, then step.
    pub fn run<F: FnMut(u64, &Board)>(&mut self, gens: u64, schedule: &SnapshotSchedule, mut on_board: F) {
        let mut cursor = schedule.cursor();
        for generation in 0..=gens {
            if cursor.hit(generation) {
                on_board(generation, &self.board);
            }
            self.step();
        }
    }
}
