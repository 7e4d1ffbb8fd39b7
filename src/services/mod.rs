//! Store access, reconciliation and the version index built on top of them.

pub mod codec;
pub mod envelope;
pub mod ids;
pub mod reconcile;
pub mod store_client;
pub mod version_index;
