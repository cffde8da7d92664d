use std::sync::Arc;
use std::time::Duration;

use gaia_core::{Error, GenerationBackend, GenerationRequest, GenerationSettings, RequestKind, Result};

use crate::retry::RetryPolicy;

/// Backend wrapper applying per-request timeouts and the retry policy.
///
/// Callers get `None` whenever no usable text came back: retries exhausted,
/// a permanent failure, or an empty reply. Failures are logged here and never
/// propagated.
#[derive(Debug, Clone)]
pub struct GenerationClient {
    backend: Arc<dyn GenerationBackend>,
    retry: RetryPolicy,
    single_timeout: Duration,
    bulk_timeout: Duration,
}

impl GenerationClient {
    pub fn new(backend: Arc<dyn GenerationBackend>, settings: &GenerationSettings) -> Self {
        Self {
            backend,
            retry: RetryPolicy::from_settings(settings),
            single_timeout: settings.single_timeout,
            bulk_timeout: settings.bulk_timeout,
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_timeouts(mut self, single: Duration, bulk: Duration) -> Self {
        self.single_timeout = single;
        self.bulk_timeout = bulk;
        self
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    pub fn timeout_for(&self, kind: RequestKind) -> Duration {
        match kind {
            RequestKind::Single => self.single_timeout,
            RequestKind::Bulk => self.bulk_timeout,
        }
    }

    /// Structured prompts are treated as bulk requests and get the longer
    /// timeout.
    pub async fn generate(&self, prompt: &str, structured: bool) -> Option<String> {
        let request = if structured {
            GenerationRequest::bulk(prompt)
        } else {
            GenerationRequest::single(prompt)
        };
        self.generate_request(&request).await
    }

    pub async fn generate_request(&self, request: &GenerationRequest) -> Option<String> {
        match self.try_generate(request).await {
            Ok(text) if !text.trim().is_empty() => {
                tracing::debug!("Generated text length: {}", text.len());
                Some(text)
            }
            Ok(_) => {
                tracing::warn!("⚠️ {} returned an empty reply", self.backend.name());
                None
            }
            Err(e) => {
                tracing::error!("❌ Generation with {} failed: {}", self.backend.name(), e);
                None
            }
        }
    }

    async fn try_generate(&self, request: &GenerationRequest) -> Result<String> {
        let timeout = self.timeout_for(request.kind);
        self.retry
            .run(|attempt| async move {
                tracing::debug!(attempt, backend = self.backend.name(), "Sending generation request");
                match tokio::time::timeout(timeout, self.backend.generate(request)).await {
                    Ok(result) => result,
                    Err(_) => Err(Error::Timeout(timeout)),
                }
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[derive(Debug)]
    enum Behaviour {
        Hang,
        Unauthorized,
        Empty,
        Reply(&'static str),
    }

    #[derive(Debug)]
    struct MockBackend {
        behaviour: Behaviour,
        calls: AtomicU32,
    }

    impl MockBackend {
        fn new(behaviour: Behaviour) -> Arc<Self> {
            Arc::new(Self {
                behaviour,
                calls: AtomicU32::new(0),
            })
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl GenerationBackend for MockBackend {
        fn name(&self) -> &str {
            "mock"
        }

        async fn generate(&self, _request: &GenerationRequest) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.behaviour {
                Behaviour::Hang => {
                    tokio::time::sleep(Duration::from_secs(5)).await;
                    Ok("too late".to_string())
                }
                Behaviour::Unauthorized => Err(Error::Backend {
                    status: 401,
                    message: "API key not valid".to_string(),
                }),
                Behaviour::Empty => Ok("   \n".to_string()),
                Behaviour::Reply(text) => Ok(text.to_string()),
            }
        }
    }

    fn client(backend: Arc<MockBackend>, attempts: u32) -> GenerationClient {
        GenerationClient::new(backend, &GenerationSettings::default())
            .with_retry(RetryPolicy::new(attempts, Duration::ZERO))
            .with_timeouts(Duration::from_millis(20), Duration::from_millis(20))
    }

    #[tokio::test]
    async fn test_timeout_is_retried_then_gives_up() {
        let backend = MockBackend::new(Behaviour::Hang);
        let client = client(backend.clone(), 3);
        assert!(client.generate("prompt", true).await.is_none());
        assert_eq!(backend.calls(), 3);
    }

    #[tokio::test]
    async fn test_non_transient_error_is_not_retried() {
        let backend = MockBackend::new(Behaviour::Unauthorized);
        let client = client(backend.clone(), 5);
        assert!(client.generate("prompt", false).await.is_none());
        assert_eq!(backend.calls(), 1);
    }

    #[tokio::test]
    async fn test_empty_reply_is_no_content() {
        let backend = MockBackend::new(Behaviour::Empty);
        let client = client(backend.clone(), 5);
        assert!(client.generate("prompt", true).await.is_none());
        assert_eq!(backend.calls(), 1);
    }

    #[tokio::test]
    async fn test_reply_is_returned() {
        let backend = MockBackend::new(Behaviour::Reply("[]"));
        let client = client(backend, 5);
        assert_eq!(client.generate("prompt", true).await.as_deref(), Some("[]"));
    }

    #[test]
    fn test_bulk_timeout_is_longer_by_default() {
        let backend = MockBackend::new(Behaviour::Empty);
        let client = GenerationClient::new(backend, &GenerationSettings::default());
        assert!(client.timeout_for(RequestKind::Bulk) > client.timeout_for(RequestKind::Single));
        assert_eq!(client.retry_policy().max_attempts, 5);
    }
}
