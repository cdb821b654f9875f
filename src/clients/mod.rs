//! HTTP clients for the three downstream APIs.
//!
//! Each client owns its own `TokenCache` instances; nothing is shared
//! between them.

pub mod base_data;
pub mod firebase;
pub mod les;
pub mod models;

pub use base_data::BaseDataClient;
pub use firebase::{FirebaseClient, FirebaseError};
pub use les::{LesClient, LesError};
pub use models::{FirebaseUser, UserProfile};
