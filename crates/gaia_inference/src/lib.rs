pub mod client;
pub mod models;
pub mod prompts;
pub mod retry;

pub use client::GenerationClient;
pub use models::create_backend;
pub use retry::RetryPolicy;

pub mod prelude {
    pub use super::client::GenerationClient;
    pub use super::models::create_backend;
    pub use super::retry::RetryPolicy;
    pub use gaia_core::{Error, GenerationBackend, GenerationRequest, Result};
}
