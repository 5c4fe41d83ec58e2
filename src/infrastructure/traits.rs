//! I/O boundary traits for testability
//!
//! These traits abstract where the dataset comes from and where
//! route-scoped batches go, allowing services to be tested with in-memory
//! implementations.

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::domain::{Dataset, RouteBatch};
use crate::infrastructure::InfraResult;

/// The receiving side of a sink went away.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("row sink closed")]
pub struct SinkClosed;

/// Outbound route-scoped batch apply: the grid's side of a push.
#[async_trait]
pub trait RowSink: Send + Sync {
    /// Apply a complete child list at `batch.route`.
    async fn apply_route_batch(&self, batch: RouteBatch) -> Result<(), SinkClosed>;
}

/// One-time source of the dataset.
#[async_trait]
pub trait DatasetLoader: Send + Sync {
    async fn load(&self) -> InfraResult<Dataset>;

    /// Human readable origin, e.g. a URL or file path.
    fn origin(&self) -> String;
}

// ============================================================
// REAL IMPLEMENTATIONS
// ============================================================

/// Sink forwarding batches into an unbounded channel.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<RouteBatch>,
}

impl ChannelSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<RouteBatch>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

#[async_trait]
impl RowSink for ChannelSink {
    async fn apply_route_batch(&self, batch: RouteBatch) -> Result<(), SinkClosed> {
        self.tx.send(batch).map_err(|_| SinkClosed)
    }
}

/// Sink that drops every batch, for callers that only page.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

#[async_trait]
impl RowSink for NullSink {
    async fn apply_route_batch(&self, _batch: RouteBatch) -> Result<(), SinkClosed> {
        Ok(())
    }
}

/// Loader over a dataset already in memory.
#[derive(Debug, Clone, Default)]
pub struct StaticLoader {
    dataset: Dataset,
}

impl StaticLoader {
    pub fn new(dataset: Dataset) -> Self {
        Self { dataset }
    }
}

#[async_trait]
impl DatasetLoader for StaticLoader {
    async fn load(&self) -> InfraResult<Dataset> {
        Ok(self.dataset.clone())
    }

    fn origin(&self) -> String {
        "memory".into()
    }
}
