mod election;
mod event;
mod gate;
mod scheduler;
mod timer;

pub use election::*;
pub use event::*;
pub use gate::*;
pub use scheduler::*;
pub use timer::*;
