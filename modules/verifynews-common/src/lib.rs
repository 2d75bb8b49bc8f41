pub mod config;
pub mod slug;
pub mod types;

pub use config::AppConfig;
pub use slug::{is_valid_slug, slugify, unique_slug};
pub use types::*;
