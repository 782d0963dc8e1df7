//! Run controller and public entry points.

mod runner;
mod types;

pub use runner::{resolve_cached_releases, CacheResolver};
pub use types::*;
