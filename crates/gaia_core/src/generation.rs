use std::fmt;

use async_trait::async_trait;

use crate::types::GenerationRequest;
use crate::Result;

#[async_trait]
pub trait GenerationBackend: Send + Sync + fmt::Debug {
    /// Human readable backend name, used in logs
    fn name(&self) -> &str;

    /// Sends one prompt and returns the raw generated text
    async fn generate(&self, request: &GenerationRequest) -> Result<String>;
}
