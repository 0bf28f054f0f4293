mod mem;
pub use mem::*;

#[cfg(feature = "kubernetes")]
mod k8s;
#[cfg(feature = "kubernetes")]
pub use k8s::*;
