// Crosspost - cross-platform post sync engine
//
// Mirrors home-platform posts and engagement (create, reply, quote, delete,
// like, bookmark and their reversals) to linked Twitter and Bluesky accounts.
//
// Sync logic lives in domains/crosspost/activities; infrastructure traits and
// their implementations in kernel/.

pub mod common;
pub mod config;
pub mod domains;
pub mod kernel;

pub use config::*;
