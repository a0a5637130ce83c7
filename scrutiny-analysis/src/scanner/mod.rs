//! File discovery (spec §4.9 part 1, §6 "File discovery input").

mod walker;

pub use walker::{walk_directory, WalkOptions, DEFAULT_IGNORES};
