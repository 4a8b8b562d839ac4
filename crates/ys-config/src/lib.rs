pub mod collector;
pub mod paths;
pub mod phrases;

pub use collector::{CollectorConfig, API_KEY_ENV};
pub use paths::ConfigPaths;
pub use phrases::default_search_phrases;
