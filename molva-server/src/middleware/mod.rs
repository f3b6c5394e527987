mod auth_extractor;

pub use auth_extractor::*;
