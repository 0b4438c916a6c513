//! Subcommand modules for the `vcftk` binary.

pub mod count;
pub mod merge;
pub mod sort;
