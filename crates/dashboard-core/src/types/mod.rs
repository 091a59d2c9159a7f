//! Core types shared by the API clients, the store and the views

mod secret;
mod snapshot;

pub use secret::{Secret, SecretKey, SecretMetadata, ProviderInfo};
pub use snapshot::CollectionSnapshot;
