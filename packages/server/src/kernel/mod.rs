//! Kernel module - sync infrastructure and dependencies.

pub mod deps;
pub mod federation;
pub mod home_links;
pub mod http_media;
pub mod pg_store;
pub mod test_dependencies;
pub mod traits;

pub use deps::{BlueskyService, SyncDeps, TwitterService};
pub use federation::LoggingFederation;
pub use home_links::HomeLinkResolver;
pub use http_media::HttpMediaFetcher;
pub use pg_store::{PgEntityReader, PgPostReader, PgSyncStore};
pub use test_dependencies::TestDependencies;
pub use traits::*;
