//! Hierarchy populator
//!
//! Delivers whole child lists of expandable nodes as route-scoped batches,
//! either on demand (`expand`) or eagerly for a whole subtree (`prefetch`).

use std::ops::Range;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::application::{ApplicationError, ApplicationResult};
use crate::domain::{
    DepthFirstBatches, Dataset, DomainError, DomainResult, HierarchyPath, RouteBatch,
};
use crate::infrastructure::traits::RowSink;

/// How a prefetch walk ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrefetchOutcome {
    /// Every expandable node in the subtree was pushed
    Completed { pushed: usize },
    /// The cancellation token fired before the walk finished
    Cancelled { pushed: usize },
    /// The sink stopped accepting batches
    SinkClosed { pushed: usize },
    /// The walk's starting level could not be resolved
    Failed(DomainError),
}

impl PrefetchOutcome {
    pub fn pushed(&self) -> usize {
        match self {
            Self::Completed { pushed } | Self::Cancelled { pushed } | Self::SinkClosed { pushed } => {
                *pushed
            }
            Self::Failed(_) => 0,
        }
    }
}

/// A running prefetch walk.
#[derive(Debug)]
pub struct PrefetchHandle {
    token: CancellationToken,
    join: JoinHandle<PrefetchOutcome>,
}

impl PrefetchHandle {
    /// Stop pushing; batches already delivered stay delivered.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Token that cancels this walk, usable after `wait` consumed the handle.
    pub fn cancel_token(&self) -> CancellationToken {
        self.token.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    /// Wait for the walk to end.
    pub async fn wait(self) -> ApplicationResult<PrefetchOutcome> {
        self.join
            .await
            .map_err(|e| ApplicationError::OperationFailed {
                context: "prefetch task".into(),
                source: Box::new(e),
            })
    }
}

/// Pushes child batches to a `RowSink`, each gated by the configured latency.
#[derive(Clone)]
pub struct HierarchyPopulator {
    dataset: Arc<Dataset>,
    sink: Arc<dyn RowSink>,
    latency: Duration,
}

impl HierarchyPopulator {
    pub fn new(dataset: Arc<Dataset>, sink: Arc<dyn RowSink>, latency: Duration) -> Self {
        Self {
            dataset,
            sink,
            latency,
        }
    }

    /// Resolve the node at `route` and return its whole child list.
    ///
    /// The root is not a node and cannot be expanded; page it with
    /// `get_rows` instead.
    pub async fn expand(&self, route: &HierarchyPath) -> DomainResult<RouteBatch> {
        debug!("expand: route={}", route);
        if self.dataset.is_empty() {
            return Err(DomainError::EmptyDataset);
        }
        if route.is_root() {
            return Err(DomainError::NotExpandable(route.clone()));
        }
        let node = self.dataset.find(route)?;
        if !node.is_expandable() {
            return Err(DomainError::NotExpandable(route.clone()));
        }

        tokio::time::sleep(self.latency).await;
        Ok(RouteBatch::for_node(route.clone(), node))
    }

    /// Expand `route` and hand the batch to the sink.
    pub async fn expand_and_apply(&self, route: &HierarchyPath) -> ApplicationResult<usize> {
        let batch = self.expand(route).await?;
        let row_count = batch.row_count;
        self.sink
            .apply_route_batch(batch)
            .await
            .map_err(|e| ApplicationError::OperationFailed {
                context: format!("apply batch for {}", route),
                source: Box::new(e),
            })?;
        Ok(row_count)
    }

    /// Spawn a depth-first walk over the nodes `window` selects below
    /// `parent`, pushing one batch per expandable node.
    pub fn prefetch(
        &self,
        parent: HierarchyPath,
        window: Range<usize>,
        token: CancellationToken,
    ) -> PrefetchHandle {
        let this = self.clone();
        let task_token = token.clone();
        let join = tokio::spawn(async move { this.push_depth_first(parent, window, task_token).await });
        PrefetchHandle { token, join }
    }

    async fn push_depth_first(
        &self,
        parent: HierarchyPath,
        window: Range<usize>,
        token: CancellationToken,
    ) -> PrefetchOutcome {
        let level = match self.dataset.level(&parent) {
            Ok(level) => level,
            Err(e) => {
                warn!("prefetch: cannot resolve {}: {}", parent, e);
                return PrefetchOutcome::Failed(e);
            }
        };
        let nodes = level.get(window).unwrap_or(&[]);

        let mut pushed = 0;
        for batch in DepthFirstBatches::for_nodes(&parent, nodes) {
            tokio::select! {
                _ = token.cancelled() => {
                    debug!("prefetch: cancelled after {} batches", pushed);
                    return PrefetchOutcome::Cancelled { pushed };
                }
                _ = tokio::time::sleep(self.latency) => {}
            }

            let route = batch.route.clone();
            if self.sink.apply_route_batch(batch).await.is_err() {
                debug!("prefetch: sink closed at {}", route);
                return PrefetchOutcome::SinkClosed { pushed };
            }
            debug!("prefetch: pushed {}", route);
            pushed += 1;
        }

        PrefetchOutcome::Completed { pushed }
    }
}
