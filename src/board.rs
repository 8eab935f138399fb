//! The global board: loading, printing and reassembly of worker bands.
//!
//! A `Board` only exists at the edges of a run. It is loaded once, handed to
//! every worker for distribution into its band, and rebuilt from bands when a
//! snapshot or the final state is reported.

use std::collections::BTreeMap;
use std::io::{BufReader, Read};
use std::path::Path;
use std::sync::Mutex;

use crate::bandlife::{BandSnapshot, SnapshotSink};
use crate::error::{LifeError, Result};

/// Number of cells on a `rows x cols` board.
///
/// Fails when the count, or the count of a band buffer with its two halo
/// rows, does not fit in `usize`.
pub fn cell_count(rows: usize, cols: usize) -> Result<usize> {
    rows.checked_add(2)
        .and_then(|padded| padded.checked_mul(cols))
        .map(|_| rows * cols)
        .ok_or_else(|| LifeError::config(format!("board of {rows}x{cols} cells is too large")))
}

/// A row-major `rows x cols` toroidal grid of cells.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Board {
    rows: usize,
    cols: usize,
    cells: Vec<bool>,
}

impl Board {
    /// An all-dead board. Panics if `rows * cols` overflows; use `try_new`
    /// for dimensions that come from outside.
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            cells: vec![false; rows * cols],
        }
    }

    /// An all-dead board, or a config error when the dimensions overflow.
    pub fn try_new(rows: usize, cols: usize) -> Result<Self> {
        let count = cell_count(rows, cols)?;
        Ok(Self {
            rows,
            cols,
            cells: vec![false; count],
        })
    }

    pub fn from_cells(rows: usize, cols: usize, cells: Vec<bool>) -> Result<Self> {
        let count = cell_count(rows, cols)?;
        if cells.len() != count {
            return Err(LifeError::config(format!(
                "board of {rows}x{cols} needs {count} cells, got {}",
                cells.len()
            )));
        }
        Ok(Self { rows, cols, cells })
    }

    /// Build a board from nested 0/1 rows. Handy for small literal patterns.
    pub fn from_rows<R: AsRef<[u8]>>(rows: &[R]) -> Result<Self> {
        let cols = rows.first().map_or(0, |row| row.as_ref().len());
        let mut cells = Vec::with_capacity(rows.len() * cols);
        for (r, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            if row.len() != cols {
                return Err(LifeError::config(format!(
                    "row {r} has {} cells, expected {cols}",
                    row.len()
                )));
            }
            cells.extend(row.iter().map(|&v| v != 0));
        }
        Self::from_cells(rows.len(), cols, cells)
    }

    /// Read `rows * cols` cells from digit characters in stream order.
    ///
    /// Non-digit bytes are skipped, `0` is dead and any other digit is alive.
    /// Reading stops once the board is full; a short stream leaves the
    /// remaining cells dead.
    pub fn load<R: Read>(reader: R, rows: usize, cols: usize) -> Result<Self> {
        let mut board = Self::try_new(rows, cols)?;
        let max_size = board.cells.len();
        let mut filled = 0usize;
        for byte in BufReader::new(reader).bytes() {
            if filled == max_size {
                break;
            }
            let byte = byte.map_err(LifeError::Read)?;
            if byte.is_ascii_digit() {
                board.cells[filled] = byte != b'0';
                filled += 1;
            }
        }
        tracing::debug!(filled, max_size, "loaded board digits");
        Ok(board)
    }

    pub fn load_file<P: AsRef<Path>>(path: P, rows: usize, cols: usize) -> Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|e| LifeError::io(path, e))?;
        Self::load(file, rows, cols).map_err(|e| match e {
            LifeError::Read(source) => LifeError::io(path, source),
            other => other,
        })
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    pub fn cells(&self) -> &[bool] {
        &self.cells
    }

    /// Cell at `(row, col)`, wrapping both coordinates around the torus.
    #[inline]
    pub fn get(&self, row: isize, col: isize) -> bool {
        let r = row.rem_euclid(self.rows as isize) as usize;
        let c = col.rem_euclid(self.cols as isize) as usize;
        self.cells[r * self.cols + c]
    }

    pub fn set(&mut self, row: usize, col: usize, alive: bool) {
        self.cells[row * self.cols + col] = alive;
    }

    #[inline]
    pub fn row(&self, row: usize) -> &[bool] {
        &self.cells[row * self.cols..(row + 1) * self.cols]
    }

    pub fn row_mut(&mut self, row: usize) -> &mut [bool] {
        &mut self.cells[row * self.cols..(row + 1) * self.cols]
    }

    pub fn population(&self) -> u64 {
        self.cells.iter().filter(|&&alive| alive).count() as u64
    }

    pub fn render(&self, style: Render) -> String {
        render_rows(self.cells.chunks(self.cols.max(1)), style)
    }
}

/// How cells are drawn by the printer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Render {
    /// `1`/`0` separated by spaces.
    #[default]
    Digits,
    /// The marker for live cells, a blank for dead ones, also space separated.
    Marker(char),
}

/// Render rows one per line. Also used for a single worker's owned band.
pub fn render_rows<'a, I>(rows: I, style: Render) -> String
where
    I: IntoIterator<Item = &'a [bool]>,
{
    let mut out = String::new();
    for row in rows {
        for &alive in row {
            out.push(match style {
                Render::Digits if alive => '1',
                Render::Digits => '0',
                Render::Marker(marker) if alive => marker,
                Render::Marker(_) => ' ',
            });
            out.push(' ');
        }
        out.push('\n');
    }
    out
}

struct Pending {
    board: Board,
    remaining: usize,
}

/// Gathers per-worker snapshots into full boards.
///
/// Each generation's board is handed to `on_board` once every band has
/// reported. Workers run in lock-step, so generations complete in order.
/// `on_board` runs on the worker that delivered the last band, outside the
/// internal lock.
pub struct BoardAssembler<F> {
    rows: usize,
    cols: usize,
    bands: usize,
    pending: Mutex<BTreeMap<u64, Pending>>,
    on_board: F,
}

impl<F> BoardAssembler<F>
where
    F: Fn(u64, &Board) + Sync,
{
    /// `bands` is the number of snapshots that make up one board, one per
    /// worker.
    pub fn new(rows: usize, cols: usize, bands: usize, on_board: F) -> Self {
        Self {
            rows,
            cols,
            bands,
            pending: Mutex::new(BTreeMap::new()),
            on_board,
        }
    }
}

impl<F> SnapshotSink for BoardAssembler<F>
where
    F: Fn(u64, &Board) + Sync,
{
    fn on_snapshot(&self, snapshot: BandSnapshot<'_>) {
        let done = {
            let mut pending = match self.pending.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            let entry = pending.entry(snapshot.generation).or_insert_with(|| Pending {
                board: Board::new(self.rows, self.cols),
                remaining: self.bands,
            });
            for (offset, row) in snapshot.rows().enumerate() {
                entry
                    .board
                    .row_mut(snapshot.band.start + offset)
                    .copy_from_slice(row);
            }
            entry.remaining = entry.remaining.saturating_sub(1);
            if entry.remaining == 0 {
                pending.remove(&snapshot.generation)
            } else {
                None
            }
        };
        if let Some(done) = done {
            (self.on_board)(snapshot.generation, &done.board);
        }
    }
}
