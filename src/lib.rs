//! # Avatar Sync Library
//!
//! Copies employee avatars from LES into Firebase storage and BaseData,
//! and repairs BaseData emails from Firebase auth records.
//!
//! Modules:
//! - `cache`: bearer token cache with double-checked refresh
//! - `sources`: login endpoints a cache refreshes from
//! - `secrets`: credential lookup by well-known key
//! - `clients`: BaseData, LES and Firebase HTTP clients
//! - `sync`: update images and validate emails workflows
//! - `console`: interactive menu
//! - `config`: YAML configuration, defaults and validation

pub mod app;
pub mod cache;
pub mod clients;
pub mod config;
pub mod console;
pub mod helpers;
pub mod observability;
pub mod parser;
pub mod secrets;
pub mod sources;
pub mod sync;
pub mod utils;

#[cfg(test)]
mod tests;


pub use crate::config::sources::AppConfig;
pub use crate::cache::token_cache::TokenCache;
