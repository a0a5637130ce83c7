pub mod commands;
pub mod writer;

pub use writer::{BatchWriter, WriteStats};
