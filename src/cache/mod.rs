pub mod error;
pub mod token;
pub mod token_cache;
