//! Cache probing.
//!
//! [`ProbeRun`] owns the per-run state (ledger, results, call counters) and
//! drives both the per-file tier walk and season-pack inspection against a
//! [`CacheHandler`](crate::handler::CacheHandler).

mod orchestrator;
mod run;
mod season_pack;
mod types;

pub(crate) use run::CallResult;
pub use run::ProbeRun;
pub use types::*;
