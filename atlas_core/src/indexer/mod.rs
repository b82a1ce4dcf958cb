//! The indexing core: history replay, bounded concurrent dispatch,
//! per-entity idempotent processing, and the tile projection pass.

pub mod coords;
pub mod engine;
pub mod models;
pub mod pool;
pub mod scene;
mod test_support;
pub mod tiles;
pub mod traits;
