//! Crosspost activities - sync logic over the kernel traits
//!
//! `sync_event` is the entry point called by the queue worker; everything
//! else here serves it.

pub mod adapters;
pub mod classify;
pub mod sync_event;
pub mod transform;

pub use adapters::{adapter_for, PlatformAdapter};
pub use classify::{classify, Classified};
pub use sync_event::{sync_event, SyncError};
