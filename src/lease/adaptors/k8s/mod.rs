mod kube_lease_store;
pub use kube_lease_store::*;
