//! Per-worker grid storage.
//!
//! A `GridBuffer` holds a band's owned rows plus one halo row above and one
//! below, in a single flat allocation:
//! - storage row `0`: top halo (copy of the previous rank's last row)
//! - storage rows `1..=height`: owned rows, global row `start + i` at `i + 1`
//! - storage row `height + 1`: bottom halo (copy of the next rank's first row)
//!
//! `GridPair` double-buffers two of them with a phase bit; roles swap by
//! flipping the bit, never by copying cells.

use super::partition::Band;
use crate::board::Board;

/// A row slot in a `GridBuffer`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Slot {
    TopHalo,
    Owned(usize),
    BottomHalo,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GridBuffer {
    band: Band,
    cols: usize,
    cells: Vec<bool>,
}

impl GridBuffer {
    /// An all-dead buffer for `band`, halo rows included.
    pub fn new(band: Band, cols: usize) -> Self {
        Self {
            band,
            cols,
            cells: vec![false; (band.height() + 2) * cols],
        }
    }

    #[inline]
    pub fn band(&self) -> Band {
        self.band
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Number of owned rows.
    #[inline]
    pub fn height(&self) -> usize {
        self.band.height()
    }

    #[inline(always)]
    fn storage_index(&self, slot: Slot) -> usize {
        match slot {
            Slot::TopHalo => 0,
            Slot::Owned(i) => {
                debug_assert!(i < self.height());
                i + 1
            }
            Slot::BottomHalo => self.height() + 1,
        }
    }

    #[inline(always)]
    pub(crate) fn storage_row(&self, storage: usize) -> &[bool] {
        &self.cells[storage * self.cols..(storage + 1) * self.cols]
    }

    #[inline]
    pub fn slot(&self, slot: Slot) -> &[bool] {
        self.storage_row(self.storage_index(slot))
    }

    #[inline]
    pub fn slot_mut(&mut self, slot: Slot) -> &mut [bool] {
        let s = self.storage_index(slot);
        &mut self.cells[s * self.cols..(s + 1) * self.cols]
    }

    /// Read owned cell `(i, j)`; `i` is local (global row `start + i`).
    #[inline]
    pub fn get(&self, i: usize, j: usize) -> bool {
        self.slot(Slot::Owned(i))[j]
    }

    #[inline]
    pub fn set(&mut self, i: usize, j: usize, alive: bool) {
        self.slot_mut(Slot::Owned(i))[j] = alive;
    }

    #[inline]
    pub fn row(&self, i: usize) -> &[bool] {
        self.slot(Slot::Owned(i))
    }

    #[inline]
    pub fn top_halo(&self) -> &[bool] {
        self.slot(Slot::TopHalo)
    }

    #[inline]
    pub fn bottom_halo(&self) -> &[bool] {
        self.slot(Slot::BottomHalo)
    }

    /// First owned row, sent to the previous rank.
    #[inline]
    pub fn first_row(&self) -> &[bool] {
        self.slot(Slot::Owned(0))
    }

    /// Last owned row, sent to the next rank.
    #[inline]
    pub fn last_row(&self) -> &[bool] {
        self.slot(Slot::Owned(self.height() - 1))
    }

    /// Overwrite one row slot with `src`.
    #[inline]
    pub fn copy_row(&mut self, slot: Slot, src: &[bool]) {
        self.slot_mut(slot).copy_from_slice(src);
    }

    /// All owned rows, row-major.
    #[inline]
    pub fn owned_cells(&self) -> &[bool] {
        &self.cells[self.cols..(self.height() + 1) * self.cols]
    }

    pub fn owned_rows(&self) -> impl Iterator<Item = &[bool]> {
        self.owned_cells().chunks(self.cols.max(1))
    }

    /// Copy this band's rows from the global board, and fill both halo slots
    /// from the rows that wrap around the band's edges.
    pub fn load_band(&mut self, board: &Board) {
        debug_assert_eq!(board.cols(), self.cols);
        let rows = board.rows();
        let Band { start, end } = self.band;
        for (i, global) in (start..end).enumerate() {
            self.copy_row(Slot::Owned(i), board.row(global));
        }
        self.copy_row(Slot::TopHalo, board.row((start + rows - 1) % rows));
        self.copy_row(Slot::BottomHalo, board.row(end % rows));
    }
}

/// Current/next pair of grid buffers, indexed by phase.
#[derive(Clone, Debug)]
pub struct GridPair {
    bufs: [GridBuffer; 2],
    phase: u8,
}

impl GridPair {
    pub fn new(band: Band, cols: usize) -> Self {
        Self {
            bufs: [GridBuffer::new(band, cols), GridBuffer::new(band, cols)],
            phase: 0,
        }
    }

    /// Allocate both buffers and distribute `board` into the current one.
    pub fn from_board(board: &Board, band: Band) -> Self {
        let mut pair = Self::new(band, board.cols());
        pair.current_mut().load_band(board);
        pair
    }

    #[inline]
    pub fn current(&self) -> &GridBuffer {
        &self.bufs[self.phase as usize]
    }

    #[inline]
    pub fn current_mut(&mut self) -> &mut GridBuffer {
        &mut self.bufs[self.phase as usize]
    }

    #[inline]
    pub fn current_and_next_mut(&mut self) -> (&GridBuffer, &mut GridBuffer) {
        let (a, b) = self.bufs.split_at_mut(1);
        if self.phase == 0 {
            (&a[0], &mut b[0])
        } else {
            (&b[0], &mut a[0])
        }
    }

    #[inline]
    pub fn swap(&mut self) {
        self.phase ^= 1;
    }

    #[cfg(test)]
    pub(crate) fn phase(&self) -> u8 {
        self.phase
    }
}
