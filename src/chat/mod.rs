pub mod retry;
pub mod snippets;

use log::{debug, error, info};

use crate::errors::ChatError;
use crate::retrieval::{Retriever, RetrieverManager};

pub use retry::{AttemptError, RetryPolicy};
pub use snippets::{compose_answer, NO_POLICY_FOUND};

/// Scopes the user's question to the policy knowledge base.
pub fn policy_prompt(prompt: &str) -> String {
    format!(
        "Based on the following question, provide a very short and concise answer using only Proweaver's official policies and guidelines as context: {}",
        prompt
    )
}

// Answers policy questions from the document index
pub struct ChatService {
    retrievers: RetrieverManager,
    policy: RetryPolicy,
    top_k: usize,
}

impl ChatService {
    pub fn new(retrievers: RetrieverManager, top_k: usize) -> Self {
        Self {
            retrievers,
            policy: RetryPolicy::default(),
            top_k,
        }
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Runs one prompt through the retrieval pipeline.
    pub async fn handle(&self, prompt: Option<&str>) -> Result<String, ChatError> {
        let prompt = prompt
            .filter(|p| !p.trim().is_empty())
            .ok_or(ChatError::MissingPrompt)?;

        let retriever = self.retrievers.get().await.map_err(|e| {
            error!("Failed to initialize retriever: {}", e);
            ChatError::Initialization(e.to_string())
        })?;

        let query = policy_prompt(prompt);
        debug!("Retrieval query: {}", query);

        let nodes = self
            .policy
            .run(|| retriever.retrieve(&query, self.top_k))
            .await
            .map_err(|e| match e {
                AttemptError::Timeout => ChatError::Timeout,
                AttemptError::Connection(msg) => ChatError::ConnectionInterrupted(msg),
                AttemptError::Upstream(msg) => ChatError::Upstream(msg),
            })?;

        if nodes.is_empty() {
            info!("No documents matched the prompt");
            return Ok(NO_POLICY_FOUND.to_string());
        }

        Ok(compose_answer(&nodes).await)
    }
}
