mod renew_timer;
pub use renew_timer::*;
