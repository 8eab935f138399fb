//! Sequential reference engine over the whole board.

mod engine;

pub use engine::SeqLife;
