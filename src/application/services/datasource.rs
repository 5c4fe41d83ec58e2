//! Mock server-side datasource
//!
//! Answers paged `get_rows` requests from an in-memory dataset after a
//! simulated network delay. In prefetch mode every group returned also
//! pushes its whole subtree through the populator.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, warn};

use crate::application::services::populator::{HierarchyPopulator, PrefetchHandle};
use crate::domain::{
    select_page, DataUnavailable, Dataset, DomainError, DomainResult, EmptyPagePolicy,
    ExpansionMode, HierarchyPath, RouteBatch, RowsRequest, RowsResponse,
};
use crate::infrastructure::traits::RowSink;

/// Capabilities the datasource is constructed with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DatasourceOptions {
    /// Simulated latency before each response and each push
    pub latency: Duration,
    pub empty_page: EmptyPagePolicy,
    pub expansion: ExpansionMode,
}

impl Default for DatasourceOptions {
    fn default() -> Self {
        Self {
            latency: Duration::from_millis(200),
            empty_page: EmptyPagePolicy::default(),
            expansion: ExpansionMode::default(),
        }
    }
}

/// Server-side row model emulation over a read-only dataset.
#[derive(Clone)]
pub struct MockHierarchicalDatasource {
    dataset: Arc<Dataset>,
    populator: HierarchyPopulator,
    options: DatasourceOptions,
    shutdown: CancellationToken,
}

impl MockHierarchicalDatasource {
    pub fn new(dataset: Arc<Dataset>, sink: Arc<dyn RowSink>, options: DatasourceOptions) -> Self {
        let populator = HierarchyPopulator::new(dataset.clone(), sink, options.latency);
        Self {
            dataset,
            populator,
            options,
            shutdown: CancellationToken::new(),
        }
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn options(&self) -> DatasourceOptions {
        self.options
    }

    /// Answer one page request.
    ///
    /// `Ok` carries the rows and the unsliced count of their level; `Err` is
    /// the fail contract. In prefetch mode the subtree pushes start after the
    /// response and run detached; use `get_rows_tracked` to observe them.
    pub async fn get_rows(&self, request: &RowsRequest) -> Result<RowsResponse, DataUnavailable> {
        self.get_rows_tracked(request)
            .await
            .map(|(response, _)| response)
    }

    /// Like `get_rows`, also returning the handle of the prefetch walk the
    /// response started, if any.
    #[instrument(level = "debug", skip(self), fields(path = %request.path))]
    pub async fn get_rows_tracked(
        &self,
        request: &RowsRequest,
    ) -> Result<(RowsResponse, Option<PrefetchHandle>), DataUnavailable> {
        debug!(
            "get_rows: start={} end={}",
            request.page.start_index, request.page.end_index
        );
        if self.dataset.is_empty() {
            warn!("No data available");
            return Err(DomainError::EmptyDataset);
        }

        tokio::time::sleep(self.options.latency).await;

        let page = select_page(&self.dataset, request, self.options.empty_page)
            .inspect_err(|e| warn!("get_rows failed: {}", e))?;
        let response = page.to_response();
        debug!(
            "get_rows: {} rows of {}",
            response.rows.len(),
            response.total_row_count
        );

        let handle = match self.options.expansion {
            ExpansionMode::Prefetch if !response.rows.is_empty() => {
                let window = request.page.clamp(page.total);
                Some(self.populator.prefetch(
                    request.path.clone(),
                    window,
                    self.shutdown.child_token(),
                ))
            }
            _ => None,
        };

        Ok((response, handle))
    }

    /// Children of one node, fetched on demand.
    pub async fn expand(&self, route: &HierarchyPath) -> DomainResult<RouteBatch> {
        self.populator.expand(route).await
    }

    pub fn populator(&self) -> &HierarchyPopulator {
        &self.populator
    }

    /// Cancel every pending and future prefetch push of this datasource.
    pub fn shutdown(&self) {
        debug!("datasource shutdown: cancelling pending pushes");
        self.shutdown.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Node, PageRequest};
    use crate::infrastructure::traits::ChannelSink;

    #[tokio::test(start_paused = true)]
    async fn given_lazy_mode_when_getting_rows_then_no_prefetch_started() {
        let (sink, _rx) = ChannelSink::new();
        let ds = MockHierarchicalDatasource::new(
            Arc::new(Dataset::new(vec![Node::group("A", vec![Node::leaf("A1")])])),
            Arc::new(sink),
            DatasourceOptions::default(),
        );

        let (response, handle) = ds
            .get_rows_tracked(&RowsRequest::root(PageRequest::new(0, 1).unwrap()))
            .await
            .unwrap();

        assert_eq!(response.rows.len(), 1);
        assert!(handle.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn given_latency_when_getting_rows_then_waits_before_answering() {
        let (sink, _rx) = ChannelSink::new();
        let ds = MockHierarchicalDatasource::new(
            Arc::new(Dataset::new(vec![Node::leaf("A")])),
            Arc::new(sink),
            DatasourceOptions::default(),
        );
        let started = tokio::time::Instant::now();

        ds.get_rows(&RowsRequest::root(PageRequest::new(0, 1).unwrap()))
            .await
            .unwrap();

        assert!(started.elapsed() >= Duration::from_millis(200));
    }
}
