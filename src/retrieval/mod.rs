pub mod llama_cloud;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use log::{info, warn};
use tokio::sync::OnceCell;
use tokio::time::timeout;

use crate::errors::RetrieveError;

pub use llama_cloud::{LlamaCloudIndex, LlamaCloudRetriever};

/// Anything that can hand back the text of a retrieved node.
///
/// The text may be stored inline or behind an accessor that has to do work
/// (and may fail) to produce it.
#[async_trait]
pub trait NodeText: Send + Sync {
    async fn text(&self) -> anyhow::Result<String>;
}

#[async_trait]
impl NodeText for String {
    async fn text(&self) -> anyhow::Result<String> {
        Ok(self.clone())
    }
}

/// One ranked retrieval result.
pub struct ScoredNode {
    pub node: Box<dyn NodeText>,
    pub score: Option<f64>,
}

impl ScoredNode {
    pub fn new(node: impl NodeText + 'static, score: Option<f64>) -> Self {
        Self {
            node: Box::new(node),
            score,
        }
    }
}

/// Ranked passage lookup against a document index.
#[async_trait]
pub trait Retriever: Send + Sync {
    async fn retrieve(&self, query: &str, top_k: usize) -> Result<Vec<ScoredNode>, RetrieveError>;
}

/// Builds the retriever handle on first use.
#[async_trait]
pub trait RetrieverProvider: Send + Sync {
    async fn connect(&self) -> Result<Arc<dyn Retriever>, RetrieveError>;
}

/// Wall-clock bound for building the retriever handle
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

// Construct-once holder for the retriever handle
pub struct RetrieverManager {
    provider: Box<dyn RetrieverProvider>,
    retriever: OnceCell<Arc<dyn Retriever>>,
    connect_timeout: Duration,
}

impl RetrieverManager {
    pub fn new(provider: impl RetrieverProvider + 'static) -> Self {
        Self {
            provider: Box::new(provider),
            retriever: OnceCell::new(),
            connect_timeout: CONNECT_TIMEOUT,
        }
    }

    pub fn with_connect_timeout(mut self, connect_timeout: Duration) -> Self {
        self.connect_timeout = connect_timeout;
        self
    }

    /// Returns the shared retriever, connecting on the first call.
    ///
    /// Concurrent first callers wait on the same initialization. A failed
    /// attempt leaves the cell empty so the next call tries again. A connect
    /// that outlives `connect_timeout` fails with `RetrieveError::Timeout`.
    pub async fn get(&self) -> Result<Arc<dyn Retriever>, RetrieveError> {
        let retriever = self
            .retriever
            .get_or_try_init(|| async {
                info!("Initializing document retriever");
                match timeout(self.connect_timeout, self.provider.connect()).await {
                    Ok(result) => result,
                    Err(_) => {
                        warn!("Retriever initialization timed out after {:?}", self.connect_timeout);
                        Err(RetrieveError::Timeout)
                    }
                }
            })
            .await?;
        Ok(Arc::clone(retriever))
    }

    pub fn is_initialized(&self) -> bool {
        self.retriever.initialized()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct EmptyRetriever;

    #[async_trait]
    impl Retriever for EmptyRetriever {
        async fn retrieve(&self, _query: &str, _top_k: usize) -> Result<Vec<ScoredNode>, RetrieveError> {
            Ok(Vec::new())
        }
    }

    struct CountingProvider {
        calls: Arc<AtomicUsize>,
        fail_first: bool,
    }

    #[async_trait]
    impl RetrieverProvider for CountingProvider {
        async fn connect(&self) -> Result<Arc<dyn Retriever>, RetrieveError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::task::yield_now().await;
            if self.fail_first && call == 0 {
                return Err(RetrieveError::Connection("refused".to_string()));
            }
            Ok(Arc::new(EmptyRetriever))
        }
    }

    #[tokio::test]
    async fn concurrent_first_calls_connect_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let manager = Arc::new(RetrieverManager::new(CountingProvider {
            calls: calls.clone(),
            fail_first: false,
        }));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let manager = manager.clone();
                tokio::spawn(async move { manager.get().await.is_ok() })
            })
            .collect();
        for handle in handles {
            assert!(handle.await.unwrap());
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(manager.is_initialized());
    }

    #[tokio::test]
    async fn failed_connect_is_retried_on_next_call() {
        let calls = Arc::new(AtomicUsize::new(0));
        let manager = RetrieverManager::new(CountingProvider {
            calls: calls.clone(),
            fail_first: true,
        });

        assert!(manager.get().await.is_err());
        assert!(!manager.is_initialized());
        assert!(manager.get().await.is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    struct StalledProvider;

    #[async_trait]
    impl RetrieverProvider for StalledProvider {
        async fn connect(&self) -> Result<Arc<dyn Retriever>, RetrieveError> {
            std::future::pending().await
        }
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_connect_times_out() {
        let manager = RetrieverManager::new(StalledProvider);
        let started = tokio::time::Instant::now();

        let err = manager.get().await.err().unwrap();

        assert!(matches!(err, RetrieveError::Timeout));
        assert!(started.elapsed() >= CONNECT_TIMEOUT);
        assert!(!manager.is_initialized());
    }

    #[tokio::test]
    async fn string_nodes_return_their_text() {
        let node = ScoredNode::new("Leave policy".to_string(), Some(0.9));
        assert_eq!(node.node.text().await.unwrap(), "Leave policy");
    }
}
