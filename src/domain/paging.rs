//! Row window selection for `get_rows`.

use crate::domain::entities::{Dataset, EmptyPagePolicy, Node, Row, RowsRequest, RowsResponse};
use crate::domain::error::{DomainError, DomainResult};

/// A selected window of nodes and the unsliced size of their level.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<'a> {
    pub nodes: &'a [Node],
    pub total: usize,
}

impl Page<'_> {
    pub fn to_response(&self) -> RowsResponse {
        RowsResponse {
            rows: self.nodes.iter().map(Node::to_row).collect::<Vec<Row>>(),
            total_row_count: self.total,
        }
    }
}

/// Select the nodes a request addresses.
///
/// An empty dataset always fails. An empty window fails unless the policy
/// is `Succeed`.
pub fn select_page<'a>(
    dataset: &'a Dataset,
    request: &RowsRequest,
    policy: EmptyPagePolicy,
) -> DomainResult<Page<'a>> {
    if dataset.is_empty() {
        return Err(DomainError::EmptyDataset);
    }
    request.page.validate()?;

    let level = dataset.level(&request.path)?;
    let total = level.len();
    let window = request.page.clamp(total);
    let nodes = &level[window];

    if nodes.is_empty() && policy == EmptyPagePolicy::Fail {
        return Err(DomainError::EmptyPage {
            start: request.page.start_index,
            end: request.page.end_index,
            total,
        });
    }

    Ok(Page { nodes, total })
}
