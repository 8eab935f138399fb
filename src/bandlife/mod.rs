//! Row-band partitioned engine: planner, grid buffers, kernel, halo sync, driver.

mod engine;
mod grid;
mod kernel;
mod partition;
mod sync;

pub use engine::{
    BandLife, BandLifeConfig, BandSnapshot, NoSnapshots, RunReport, SnapshotCursor,
    SnapshotSchedule, SnapshotSink, WorkerTiming,
};
pub use grid::{GridBuffer, GridPair, Slot};
pub use kernel::{StepOutcome, step};
pub use partition::{Band, plan, plan_all};
pub use sync::{HaloLink, LockstepBarrier, PeerLink, exchange, mesh, validate_workers};
