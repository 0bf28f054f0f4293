mod mem_lease_store;
pub use mem_lease_store::*;
