use std::sync::Arc;

use anyhow::anyhow;
use async_trait::async_trait;
use log::{debug, info};
use reqwest::{Client, Response};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::config::LlamaCloudConfig;
use crate::errors::RetrieveError;
use crate::retrieval::{NodeText, Retriever, RetrieverProvider, ScoredNode};

#[derive(Debug, Deserialize)]
struct Pipeline {
    id: String,
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RetrieveResponse {
    #[serde(default)]
    retrieval_nodes: Vec<RetrievalNode>,
}

#[derive(Debug, Deserialize)]
struct RetrievalNode {
    node: Value,
    #[serde(default)]
    score: Option<f64>,
}

/// Raw node JSON as returned by LlamaCloud.
pub struct CloudNode(Value);

#[async_trait]
impl NodeText for CloudNode {
    async fn text(&self) -> anyhow::Result<String> {
        match self.0.get("text") {
            None | Some(Value::Null) => Ok(String::new()),
            Some(Value::String(text)) => Ok(text.clone()),
            Some(other) => Err(anyhow!("node text is not a string: {}", other)),
        }
    }
}

// Entry point to a LlamaCloud index; resolves the pipeline backing it
pub struct LlamaCloudIndex {
    config: LlamaCloudConfig,
    client: Client,
}

impl LlamaCloudIndex {
    pub fn new(config: LlamaCloudConfig) -> Self {
        Self {
            config,
            client: Client::new(),
        }
    }

    /// Looks up the pipeline id for the configured index name and project.
    pub async fn resolve_pipeline(&self) -> Result<String, RetrieveError> {
        let url = format!("{}/api/v1/pipelines", self.config.base_url);
        info!(
            "Resolving LlamaCloud index '{}' in project '{}'",
            self.config.index_name, self.config.project_name
        );

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.config.api_key)
            .query(&[
                ("project_name", self.config.project_name.as_str()),
                ("pipeline_name", self.config.index_name.as_str()),
                ("organization_id", self.config.organization_id.as_str()),
            ])
            .send()
            .await?;

        let pipelines: Vec<Pipeline> = checked(response).await?.json().await?;
        debug!("Pipelines returned: {:?}", pipelines);

        pipelines
            .into_iter()
            .find(|p| p.name.as_deref().map_or(true, |name| name == self.config.index_name))
            .map(|p| p.id)
            .ok_or_else(|| RetrieveError::PipelineNotFound {
                name: self.config.index_name.clone(),
                project: self.config.project_name.clone(),
            })
    }
}

#[async_trait]
impl RetrieverProvider for LlamaCloudIndex {
    async fn connect(&self) -> Result<Arc<dyn Retriever>, RetrieveError> {
        let pipeline_id = self.resolve_pipeline().await?;
        info!("Using LlamaCloud pipeline {}", pipeline_id);

        Ok(Arc::new(LlamaCloudRetriever {
            base_url: self.config.base_url.clone(),
            api_key: self.config.api_key.clone(),
            pipeline_id,
            client: self.client.clone(),
        }))
    }
}

pub struct LlamaCloudRetriever {
    base_url: String,
    api_key: String,
    pipeline_id: String,
    client: Client,
}

#[async_trait]
impl Retriever for LlamaCloudRetriever {
    async fn retrieve(&self, query: &str, top_k: usize) -> Result<Vec<ScoredNode>, RetrieveError> {
        let url = format!("{}/api/v1/pipelines/{}/retrieve", self.base_url, self.pipeline_id);
        let payload = json!({
            "query": query,
            "dense_similarity_top_k": top_k,
        });
        debug!("Retrieve payload: {}", payload);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await?;

        let body: RetrieveResponse = checked(response).await?.json().await?;
        info!("Retriever returned {} nodes", body.retrieval_nodes.len());

        Ok(body
            .retrieval_nodes
            .into_iter()
            .map(|n| ScoredNode::new(CloudNode(n.node), n.score))
            .collect())
    }
}

async fn checked(response: Response) -> Result<Response, RetrieveError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "<unable to read response body>".to_string());
    Err(RetrieveError::Status {
        status: status.as_u16(),
        body,
    })
}
