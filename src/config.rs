use std::env;
use std::str::FromStr;

use crate::errors::ConfigError;

const DEFAULT_BASE_URL: &str = "https://api.cloud.llamaindex.ai";
const DEFAULT_INDEX_NAME: &str = "Alvin";
const DEFAULT_PROJECT_NAME: &str = "Default";
const DEFAULT_ORGANIZATION_ID: &str = "c2031b56-4c79-42a9-82a1-36186df133cb";
const DEFAULT_TOP_K: usize = 5;

/// Selects which LlamaCloud index is queried.
#[derive(Debug, Clone)]
pub struct LlamaCloudConfig {
    pub api_key: String,
    pub base_url: String,
    pub index_name: String,
    pub project_name: String,
    pub organization_id: String,
    pub similarity_top_k: usize,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub llama_cloud: LlamaCloudConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup("LLAMA_CLOUD_API_KEY")
            .filter(|key| !key.trim().is_empty())
            .ok_or(ConfigError::Missing("LLAMA_CLOUD_API_KEY"))?;

        let text = |name: &str, default: &str| lookup(name).unwrap_or_else(|| default.to_string());

        let llama_cloud = LlamaCloudConfig {
            api_key,
            base_url: text("LLAMA_CLOUD_BASE_URL", DEFAULT_BASE_URL)
                .trim_end_matches('/')
                .to_string(),
            index_name: text("LLAMA_CLOUD_INDEX_NAME", DEFAULT_INDEX_NAME),
            project_name: text("LLAMA_CLOUD_PROJECT_NAME", DEFAULT_PROJECT_NAME),
            organization_id: text("LLAMA_CLOUD_ORGANIZATION_ID", DEFAULT_ORGANIZATION_ID),
            similarity_top_k: parsed(&lookup, "SIMILARITY_TOP_K", DEFAULT_TOP_K)?,
        };

        Ok(Self {
            host: text("HOST", "127.0.0.1"),
            port: parsed(&lookup, "PORT", 8080)?,
            llama_cloud,
        })
    }
}

fn parsed<F, T>(lookup: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(name) {
        Some(value) => value
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::Invalid { name, value }),
        None => Ok(default),
    }
}
