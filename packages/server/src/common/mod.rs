// Common types and utilities shared across the application

pub mod ids;
pub mod utils;

pub use ids::{ListId, PostId, ProjectId, UserId};
