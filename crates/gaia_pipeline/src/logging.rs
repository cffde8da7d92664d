use std::sync::Once;

use tracing_subscriber::EnvFilter;

static INIT: Once = Once::new();

/// Adds bracketed context such as `[batch 2/4]` in front of every line.
#[derive(Debug, Clone, Default)]
pub struct Logger {
    prefixes: Vec<String>,
}

impl Logger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefixes.push(prefix.into());
        self
    }

    fn prefix(&self) -> String {
        self.prefixes.iter().map(|p| format!("{} ", p)).collect()
    }

    pub fn info(&self, message: &str) {
        tracing::info!("{}{}", self.prefix(), message);
    }

    pub fn error(&self, message: &str) {
        tracing::error!("{}{}", self.prefix(), message);
    }

    pub fn warn(&self, message: &str) {
        tracing::warn!("{}{}", self.prefix(), message);
    }

    pub fn debug(&self, message: &str) {
        tracing::debug!("{}{}", self.prefix(), message);
    }
}

/// Installs the global fmt subscriber. `RUST_LOG` takes precedence over the
/// verbosity flag.
pub fn init_logging(verbose: bool) -> Logger {
    if !tracing::dispatcher::has_been_set() {
        INIT.call_once(|| {
            let fallback = if verbose { "debug" } else { "info" };
            let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
            let _ = tracing_subscriber::fmt().with_env_filter(filter).with_target(false).try_init();
        });
    }
    Logger::new()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefixes_stack() {
        let run = Logger::new().with_prefix("[regenerate]");
        let batch = run.clone().with_prefix("[batch 1/2]");
        assert_eq!(batch.prefix(), "[regenerate] [batch 1/2] ");
        assert_eq!(run.prefix(), "[regenerate] ");
        assert_eq!(Logger::new().prefix(), "");
    }

    #[test]
    fn test_init_logging_is_idempotent() {
        init_logging(false).info("first");
        init_logging(true).debug("second");
    }
}
