use std::sync::Arc;

use gaia_core::{Error, GenerationBackend, GenerationSettings, Result};

pub mod dummy;
pub mod gemini;

pub use dummy::DummyModel;
pub use gemini::GeminiModel;

/// Names accepted by [`create_backend`].
pub const AVAILABLE_BACKENDS: &[&str] = &["gemini", "dummy"];

pub fn create_backend(name: &str, settings: &GenerationSettings) -> Result<Arc<dyn GenerationBackend>> {
    match name.trim().to_ascii_lowercase().as_str() {
        "gemini" => Ok(Arc::new(GeminiModel::new(settings)?)),
        "dummy" => Ok(Arc::new(DummyModel::new())),
        other => Err(Error::Config(format!(
            "Unknown model '{}'. Available models: {}",
            other,
            AVAILABLE_BACKENDS.join(", ")
        ))),
    }
}
