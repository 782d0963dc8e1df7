//! Cache handler collaborator contract.

mod types;

pub use types::*;
