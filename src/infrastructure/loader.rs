//! Dataset loaders: HTTP endpoint or local JSON file.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, info};

use crate::domain::{expand_env_vars, Dataset, NodeSchema};
use crate::infrastructure::traits::DatasetLoader;
use crate::infrastructure::{InfraError, InfraResult};

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Loads the dataset with a single GET.
pub struct HttpDatasetLoader {
    url: String,
    client: Client,
    schema: NodeSchema,
}

impl HttpDatasetLoader {
    pub fn new(url: impl Into<String>, schema: NodeSchema) -> InfraResult<Self> {
        let url = url.into();
        let client = Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .map_err(|source| InfraError::Http {
                url: url.clone(),
                source,
            })?;

        Ok(Self {
            url,
            client,
            schema,
        })
    }
}

#[async_trait]
impl DatasetLoader for HttpDatasetLoader {
    async fn load(&self) -> InfraResult<Dataset> {
        info!("Fetching dataset from {}", self.url);
        let http_err = |source: reqwest::Error| InfraError::Http {
            url: self.url.clone(),
            source,
        };

        let response = self.client.get(&self.url).send().await.map_err(http_err)?;
        if !response.status().is_success() {
            return Err(InfraError::HttpStatus {
                url: self.url.clone(),
                status: response.status().as_u16(),
            });
        }

        let body = response.bytes().await.map_err(http_err)?;
        let value: Value = serde_json::from_slice(&body).map_err(|source| InfraError::Decode {
            origin: self.url.clone(),
            source,
        })?;
        decode(&self.schema, &value, &self.url)
    }

    fn origin(&self) -> String {
        self.url.clone()
    }
}

/// Loads the dataset from a JSON file on disk.
pub struct FileDatasetLoader {
    path: PathBuf,
    schema: NodeSchema,
}

impl FileDatasetLoader {
    /// `path` may contain `~` and environment variables.
    pub fn new(path: &str, schema: NodeSchema) -> Self {
        Self {
            path: PathBuf::from(expand_env_vars(path)),
            schema,
        }
    }
}

#[async_trait]
impl DatasetLoader for FileDatasetLoader {
    async fn load(&self) -> InfraResult<Dataset> {
        info!("Reading dataset from {}", self.path.display());
        let content = tokio::fs::read(&self.path)
            .await
            .map_err(|e| InfraError::io(format!("read {}", self.path.display()), e))?;
        let origin = self.origin();
        let value: Value = serde_json::from_slice(&content).map_err(|source| InfraError::Decode {
            origin: origin.clone(),
            source,
        })?;
        decode(&self.schema, &value, &origin)
    }

    fn origin(&self) -> String {
        self.path.display().to_string()
    }
}

fn decode(schema: &NodeSchema, value: &Value, origin: &str) -> InfraResult<Dataset> {
    let dataset = schema
        .decode_dataset(value)
        .map_err(|source| InfraError::InvalidDataset {
            origin: origin.to_string(),
            source,
        })?;
    debug!(
        "decoded {} top-level nodes ({} total) from {}",
        dataset.len(),
        dataset.node_count(),
        origin
    );
    Ok(dataset)
}

/// Pick a loader for a source string: `http(s)://` URLs are fetched,
/// anything else is read as a file path.
pub fn source_from_str(source: &str, schema: NodeSchema) -> InfraResult<Arc<dyn DatasetLoader>> {
    if source.starts_with("http://") || source.starts_with("https://") {
        Ok(Arc::new(HttpDatasetLoader::new(source, schema)?))
    } else {
        Ok(Arc::new(FileDatasetLoader::new(source, schema)))
    }
}
