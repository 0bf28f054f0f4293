//! Helpers shared by the unit tests
mod common;
mod stalling_store;

pub use common::*;
pub use stalling_store::*;
