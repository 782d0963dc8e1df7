//! Quota accounting.
//!
//! Limits come from configuration, already-filled slots from the caller's
//! inventory ([`SatisfiedQuotas`]), and a fresh [`QuotaLedger`] per run
//! tracks what the run itself accepts.

mod ledger;
mod types;

pub use ledger::QuotaLedger;
pub use types::*;
