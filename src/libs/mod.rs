pub mod coord;
pub mod error;
pub mod header;
pub mod io;
pub mod merge;
pub mod record;
pub mod sort;
