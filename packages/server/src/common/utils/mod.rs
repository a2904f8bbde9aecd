pub mod asset_url;
pub mod content;

pub use asset_url::*;
pub use content::*;
