pub mod credentials;
pub mod home_entity;
pub mod outcome;
pub mod platform;
pub mod post;
pub mod refs;
pub mod sync_audit;
pub mod sync_settings;

pub use credentials::*;
pub use home_entity::*;
pub use outcome::*;
pub use platform::*;
pub use post::*;
pub use refs::*;
pub use sync_audit::*;
pub use sync_settings::*;
