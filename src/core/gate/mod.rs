mod leadership_gate;
pub use leadership_gate::*;
