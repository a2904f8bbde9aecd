//! Cross-platform post sync: mirrors home posts and engagement to Twitter
//! and Bluesky.

pub mod activities;
pub mod models;

pub use activities::{sync_event, SyncError};
