//! Lock-step driver for the partitioned engine.
//!
//! One scoped thread per worker. Each owns its band's `GridPair` and
//! `HaloLink` and runs the same loop for `gen` in `0..=gens`:
//! snapshot (if requested), step, swap, exchange halos, barrier.

use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, error, info, trace};

use super::grid::GridPair;
use super::kernel;
use super::partition::{Band, plan_all};
use super::sync::{self, HaloLink, LockstepBarrier, validate_workers};
use crate::board::Board;
use crate::error::{LifeError, Result};

/// Configuration for a `BandLife` engine.
///
/// `BandLifeConfig::default()` picks the worker count from the physical core
/// count. Explicit counts are validated, never adjusted.
#[derive(Clone, Debug, Default)]
pub struct BandLifeConfig {
    /// Number of workers P. `None` means auto-detect.
    pub workers: Option<usize>,
    /// Upper bound applied to auto-detected or explicit counts.
    pub max_workers: Option<usize>,
}

impl BandLifeConfig {
    pub fn workers(mut self, n: usize) -> Self {
        self.workers = Some(n);
        self
    }

    pub fn max_workers(mut self, n: usize) -> Self {
        self.max_workers = Some(n);
        self
    }
}

/// Largest usable worker count for `physical` cores and `rows` rows:
/// 1 or even, and never more than the row count.
fn auto_worker_count_for(physical: usize, rows: usize) -> usize {
    let n = physical.min(rows).max(1);
    if n > 1 && n % 2 == 1 { n - 1 } else { n }
}

fn resolve_worker_count(config: &BandLifeConfig, rows: usize) -> Result<usize> {
    let workers = match config.workers {
        Some(n) => config.max_workers.map_or(n, |cap| n.min(cap)),
        None => {
            let physical = num_cpus::get_physical();
            let cap = config.max_workers.unwrap_or(physical);
            auto_worker_count_for(physical.min(cap), rows)
        }
    };
    validate_workers(workers)?;
    if workers > rows {
        return Err(LifeError::TooFewRows { rows, workers });
    }
    Ok(workers)
}

/// Ascending, deduplicated generations at which to report the board.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SnapshotSchedule {
    gens: Vec<u64>,
}

impl SnapshotSchedule {
    pub fn new<I: IntoIterator<Item = u64>>(gens: I) -> Self {
        let mut gens: Vec<u64> = gens.into_iter().collect();
        gens.sort_unstable();
        gens.dedup();
        Self { gens }
    }

    pub fn none() -> Self {
        Self::default()
    }

    pub fn gens(&self) -> &[u64] {
        &self.gens
    }

    pub fn len(&self) -> usize {
        self.gens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.gens.is_empty()
    }

    pub fn cursor(&self) -> SnapshotCursor<'_> {
        SnapshotCursor {
            gens: &self.gens,
            next: 0,
        }
    }
}

/// Forward-only position in a `SnapshotSchedule`.
#[derive(Clone, Debug)]
pub struct SnapshotCursor<'a> {
    gens: &'a [u64],
    next: usize,
}

impl SnapshotCursor<'_> {
    /// True, and advance, iff `generation` is the next pending entry.
    #[inline]
    pub fn hit(&mut self, generation: u64) -> bool {
        if self.gens.get(self.next) == Some(&generation) {
            self.next += 1;
            true
        } else {
            false
        }
    }
}

/// One worker's owned rows at a requested generation.
#[derive(Clone, Copy, Debug)]
pub struct BandSnapshot<'a> {
    pub generation: u64,
    pub rank: usize,
    pub band: Band,
    cols: usize,
    cells: &'a [bool],
}

impl<'a> BandSnapshot<'a> {
    pub fn new(generation: u64, rank: usize, band: Band, cols: usize, cells: &'a [bool]) -> Self {
        debug_assert_eq!(cells.len(), band.height() * cols);
        Self {
            generation,
            rank,
            band,
            cols,
            cells,
        }
    }

    pub fn cells(&self) -> &'a [bool] {
        self.cells
    }

    pub fn rows(&self) -> impl Iterator<Item = &'a [bool]> + use<'a> {
        self.cells.chunks(self.cols.max(1))
    }
}

/// Receives snapshots from every worker. Called concurrently.
pub trait SnapshotSink: Sync {
    fn on_snapshot(&self, snapshot: BandSnapshot<'_>);
}

impl<F> SnapshotSink for F
where
    F: Fn(BandSnapshot<'_>) + Sync,
{
    fn on_snapshot(&self, snapshot: BandSnapshot<'_>) {
        self(snapshot)
    }
}

/// Sink for runs without snapshots.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoSnapshots;

impl SnapshotSink for NoSnapshots {
    fn on_snapshot(&self, _snapshot: BandSnapshot<'_>) {}
}

/// Per-worker wall-clock figures. Delays are barrier stalls.
#[derive(Clone, Debug, PartialEq)]
pub struct WorkerTiming {
    pub rank: usize,
    pub total: Duration,
    pub generations: u64,
    pub min_delay: Duration,
    pub avg_delay: Duration,
    pub max_delay: Duration,
}

#[derive(Clone, Copy, Debug)]
struct DelayStats {
    count: u64,
    sum: Duration,
    min: Duration,
    max: Duration,
}

impl Default for DelayStats {
    fn default() -> Self {
        Self {
            count: 0,
            sum: Duration::ZERO,
            min: Duration::MAX,
            max: Duration::ZERO,
        }
    }
}

impl DelayStats {
    #[inline]
    fn record(&mut self, delay: Duration) {
        self.count += 1;
        self.sum += delay;
        self.min = self.min.min(delay);
        self.max = self.max.max(delay);
    }

    fn finish(self, rank: usize, total: Duration) -> WorkerTiming {
        let (min, avg) = if self.count == 0 {
            (Duration::ZERO, Duration::ZERO)
        } else {
            let avg = self.sum.as_nanos() / u128::from(self.count);
            (self.min, Duration::from_nanos(avg as u64))
        };
        WorkerTiming {
            rank,
            total,
            generations: self.count,
            min_delay: min,
            avg_delay: avg,
            max_delay: self.max,
        }
    }
}

/// Outcome of `BandLife::run`.
#[derive(Clone, Debug)]
pub struct RunReport {
    /// Board after the last step.
    pub board: Board,
    /// Generation index of `board`.
    pub generation: u64,
    pub workers: usize,
    /// Rank order.
    pub timings: Vec<WorkerTiming>,
    pub elapsed: Duration,
}

struct WorkerOutput {
    band: Band,
    cells: Vec<bool>,
    timing: WorkerTiming,
}

/// Tears the barrier down unless the worker finished cleanly.
struct AbortGuard<'a> {
    barrier: &'a LockstepBarrier,
    armed: bool,
}

impl Drop for AbortGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.barrier.abort();
        }
    }
}

struct WorkerCtx<'a, S: ?Sized> {
    board: &'a Board,
    barrier: &'a LockstepBarrier,
    schedule: &'a SnapshotSchedule,
    sink: &'a S,
    gens: u64,
}

fn run_worker<S: SnapshotSink + ?Sized>(
    ctx: &WorkerCtx<'_, S>,
    rank: usize,
    band: Band,
    link: HaloLink,
) -> Result<WorkerOutput> {
    let mut guard = AbortGuard {
        barrier: ctx.barrier,
        armed: true,
    };
    let start = Instant::now();
    let cols = ctx.board.cols();
    let mut grids = GridPair::from_board(ctx.board, band);
    let mut cursor = ctx.schedule.cursor();
    let mut delays = DelayStats::default();

    for generation in 0..=ctx.gens {
        if cursor.hit(generation) {
            debug!(rank, generation, "snapshot");
            ctx.sink.on_snapshot(BandSnapshot::new(
                generation,
                rank,
                band,
                cols,
                grids.current().owned_cells(),
            ));
        }

        let (current, next) = grids.current_and_next_mut();
        let outcome = kernel::step(current, next);
        grids.swap();
        sync::exchange(grids.current_mut(), &link)?;

        let stall = Instant::now();
        ctx.barrier.wait(rank)?;
        let delay = stall.elapsed();
        delays.record(delay);
        trace!(
            rank,
            generation,
            population = outcome.population,
            changed = outcome.changed,
            ?delay,
            "generation done"
        );
    }

    guard.armed = false;
    let timing = delays.finish(rank, start.elapsed());
    debug!(rank, total = ?timing.total, "worker finished");
    Ok(WorkerOutput {
        band,
        cells: grids.current().owned_cells().to_vec(),
        timing,
    })
}

/// Pick the error that started a failed run. Peers of a failed worker
/// report `Aborted` or a transfer error on the link to it.
fn root_cause(errors: Vec<LifeError>) -> Option<LifeError> {
    let mut fallback = None;
    for err in errors {
        match err {
            LifeError::Aborted { .. } | LifeError::Transfer { .. } => {
                fallback = fallback.or(Some(err));
            }
            other => return Some(other),
        }
    }
    fallback
}

/// Partitioned Game of Life on a toroidal board.
#[derive(Debug)]
pub struct BandLife {
    board: Board,
    workers: usize,
    bands: Vec<Band>,
    generation: u64,
}

impl BandLife {
    pub fn new(board: Board) -> Result<Self> {
        Self::with_config(board, BandLifeConfig::default())
    }

    /// Validate the configuration against the board and plan the bands.
    pub fn with_config(board: Board, config: BandLifeConfig) -> Result<Self> {
        if board.rows() == 0 || board.cols() == 0 {
            return Err(LifeError::config(format!(
                "board must have at least one row and column, got {}x{}",
                board.rows(),
                board.cols()
            )));
        }
        crate::board::cell_count(board.rows(), board.cols())?;
        let workers = resolve_worker_count(&config, board.rows())?;
        let bands = plan_all(board.rows(), workers)?;
        Ok(Self {
            board,
            workers,
            bands,
            generation: 0,
        })
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    pub fn bands(&self) -> &[Band] {
        &self.bands
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn population(&self) -> u64 {
        self.board.population()
    }

    /// Run generations `0..=gens`, one step each, and gather the result.
    ///
    /// Snapshots are taken before the step of a matching generation, so a
    /// snapshot at `g` shows the board `g` steps after this run started.
    pub fn run<S: SnapshotSink + ?Sized>(
        &mut self,
        gens: u64,
        schedule: &SnapshotSchedule,
        sink: &S,
    ) -> Result<RunReport> {
        info!(
            rows = self.board.rows(),
            cols = self.board.cols(),
            workers = self.workers,
            gens,
            snapshots = schedule.len(),
            "starting run"
        );
        let started = Instant::now();
        let links = sync::mesh(self.workers)?;
        let barrier = LockstepBarrier::new(self.workers);
        let ctx = WorkerCtx {
            board: &self.board,
            barrier: &barrier,
            schedule,
            sink,
            gens,
        };

        let results: Vec<Result<WorkerOutput>> = thread::scope(|scope| {
            let handles: Vec<_> = self
                .bands
                .iter()
                .zip(links)
                .enumerate()
                .map(|(rank, (&band, link))| {
                    let ctx = &ctx;
                    let handle = thread::Builder::new()
                        .name(format!("band-life-{rank}"))
                        .spawn_scoped(scope, move || run_worker(ctx, rank, band, link));
                    if handle.is_err() {
                        barrier.abort();
                    }
                    (rank, handle)
                })
                .collect();

            handles
                .into_iter()
                .map(|(rank, handle)| match handle {
                    Ok(handle) => handle.join().unwrap_or_else(|_| {
                        barrier.abort();
                        Err(LifeError::WorkerPanicked(rank))
                    }),
                    Err(e) => Err(LifeError::config(format!("cannot spawn worker {rank}: {e}"))),
                })
                .collect()
        });

        let mut outputs = Vec::with_capacity(results.len());
        let mut errors = Vec::new();
        for result in results {
            match result {
                Ok(output) => outputs.push(output),
                Err(err) => errors.push(err),
            }
        }
        if let Some(err) = root_cause(errors) {
            error!(%err, "run aborted");
            return Err(err);
        }

        let cols = self.board.cols();
        for output in &outputs {
            for (offset, row) in output.cells.chunks(cols).enumerate() {
                self.board
                    .row_mut(output.band.start + offset)
                    .copy_from_slice(row);
            }
        }
        self.generation += gens + 1;
        let elapsed = started.elapsed();
        info!(generation = self.generation, ?elapsed, "run finished");

        Ok(RunReport {
            board: self.board.clone(),
            generation: self.generation,
            workers: self.workers,
            timings: outputs.into_iter().map(|o| o.timing).collect(),
            elapsed,
        })
    }
}
