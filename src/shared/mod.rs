//! Types handed across the logic thread boundary.

pub mod snapshot;

pub use snapshot::{SessionSnapshot, TileView};
