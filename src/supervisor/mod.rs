//! Process wiring: one election loop, one gate, one work scheduler.

mod builder;
mod supervisor;

pub use builder::*;
pub use supervisor::*;
