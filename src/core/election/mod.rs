mod leader_elector;
pub use leader_elector::*;
