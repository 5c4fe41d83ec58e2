//! Service container for dependency injection
//!
//! Builds every service from explicit settings; there is no process-wide
//! registry of enabled capabilities.

use std::sync::Arc;

use tracing::info;

use crate::application::services::MockHierarchicalDatasource;
use crate::config::Settings;
use crate::infrastructure::loader::source_from_str;
use crate::infrastructure::traits::{DatasetLoader, RowSink};
use crate::infrastructure::InfraResult;

/// Container holding the configured dependencies.
pub struct ServiceContainer {
    /// Application settings
    pub settings: Arc<Settings>,

    /// Dataset source
    pub loader: Arc<dyn DatasetLoader>,
}

impl ServiceContainer {
    /// Create a container with the loader the settings' source selects.
    pub fn new(settings: Settings) -> InfraResult<Self> {
        let loader = source_from_str(&settings.source, settings.schema.clone())?;
        Ok(Self::with_deps(settings, loader))
    }

    /// Create a container with a custom loader (for testing).
    pub fn with_deps(settings: Settings, loader: Arc<dyn DatasetLoader>) -> Self {
        Self {
            settings: Arc::new(settings),
            loader,
        }
    }

    /// Load the dataset once and build a datasource pushing into `sink`.
    pub async fn datasource(&self, sink: Arc<dyn RowSink>) -> InfraResult<MockHierarchicalDatasource> {
        let dataset = self.loader.load().await?;
        info!(
            "Loaded {} top-level nodes from {}",
            dataset.len(),
            self.loader.origin()
        );
        Ok(MockHierarchicalDatasource::new(
            Arc::new(dataset),
            sink,
            self.settings.datasource_options(),
        ))
    }
}
