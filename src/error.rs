//! Error types for band-life.
//!
//! Every error is fatal: configuration problems stop the run before the
//! generation loop, I/O problems stop it at load time, and a failed halo
//! transfer aborts every worker.

use std::path::PathBuf;

use thiserror::Error;

/// Which boundary row a failed transfer was carrying.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    /// First owned row, travelling to the previous rank.
    Low,
    /// Last owned row, travelling to the next rank.
    High,
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Low => f.write_str("low"),
            Direction::High => f.write_str("high"),
        }
    }
}

#[derive(Error, Debug)]
pub enum LifeError {
    /// Invalid argument or dimension.
    #[error("configuration error: {0}")]
    Config(String),

    /// The parity protocol pairs ranks, so P must be 1 or even.
    #[error("configuration error: worker count must be 1 or even, got {0}")]
    OddWorkers(usize),

    #[error("configuration error: {workers} workers need at least {workers} rows, got {rows}")]
    TooFewRows { rows: usize, workers: usize },

    #[error("cannot read board file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A board stream failed mid-read. `Board::load_file` turns this into `Io`.
    #[error("cannot read board: {0}")]
    Read(#[source] std::io::Error),

    /// A halo row could not be delivered or received.
    #[error("halo transfer failed on rank {rank} ({direction} boundary)")]
    Transfer { rank: usize, direction: Direction },

    /// A peer failed and the lock-step barrier was torn down.
    #[error("rank {rank} aborted: a peer worker failed")]
    Aborted { rank: usize },

    #[error("worker {0} panicked")]
    WorkerPanicked(usize),
}

pub type Result<T> = std::result::Result<T, LifeError>;

impl LifeError {
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }

    pub fn io<P: Into<PathBuf>>(path: P, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// True for errors detected before any generation runs.
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            LifeError::Config(_) | LifeError::OddWorkers(_) | LifeError::TooFewRows { .. }
        )
    }
}
