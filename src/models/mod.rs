//! Data models shared by the store client, the index, and the HTTP surface.
//!
//! `RemoteObject` mirrors the store's wire shape. `Document` is the content
//! written and read by the host. Entries and reports are derived in memory.

pub mod document;
pub mod entry;
pub mod remote_object;
