//! Remote secret API
//!
//! The store never talks to the network directly; it goes through a
//! `SecretApi`:
//! - `HttpSecretApi`: the dashboard backend's REST endpoints
//! - `MemorySecretApi`: in-process backend emulation for tests and demos

mod traits;
mod http;
mod memory;

pub use traits::{SecretApi, SecretApiError, SecretApiResult, SharedSecretApi};
pub use http::HttpSecretApi;
pub use memory::MemorySecretApi;
