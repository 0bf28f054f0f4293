//! Lease-based leader election with leadership-gated periodic work.
//!
//! Candidates compete for a single lease record in a store that supports
//! compare-and-swap. The winner keeps renewing it; everyone else watches for
//! it to expire. [`Supervisor`] wires the election loop, the
//! [`LeadershipGate`] and the [`WorkScheduler`] into one process that does
//! its work only while leading and exits once leadership is gone.

mod config;
mod core;
mod errors;
mod lease;
pub mod metrics;
mod supervisor;
mod utils;

pub use self::config::*;
pub use self::core::*;
pub use errors::*;
pub use lease::*;
pub use supervisor::*;

//-----------------------------------------------------------
// Test utils

#[cfg(test)]
pub(crate) mod test_utils;
