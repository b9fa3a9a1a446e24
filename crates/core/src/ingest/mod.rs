pub mod extract;
pub mod fetch;
pub mod source;

pub use source::{LivePickemSource, SnapshotSource};
