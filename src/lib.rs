//! Conway's Game of Life (B3/S23) on a torus, partitioned into row bands
//! that advance in lock-step and trade halo rows with their neighbors.

pub mod bandlife;
pub mod board;
pub mod error;
pub mod rules;
pub mod seqlife;

pub use bandlife::{BandLife, BandLifeConfig, SnapshotSchedule};
pub use board::{Board, Render};
pub use error::{LifeError, Result};
pub use seqlife::SeqLife;
