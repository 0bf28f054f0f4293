mod work_scheduler;
pub use work_scheduler::*;
