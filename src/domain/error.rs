//! Domain-level errors (no external dependencies)

use thiserror::Error;

use crate::domain::HierarchyPath;

/// Domain errors represent data-access violations.
/// These are independent of infrastructure concerns.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("no data available: dataset is empty")]
    EmptyDataset,

    #[error("no data available: rows [{start}, {end}) of {total} yield an empty page")]
    EmptyPage {
        start: usize,
        end: usize,
        total: usize,
    },

    #[error("invalid row window: start {start} is past end {end}")]
    InvalidRange { start: usize, end: usize },

    #[error("route not found: '{missing}' under '{route}'")]
    RouteNotFound {
        route: HierarchyPath,
        missing: String,
    },

    #[error("node has no children: {0}")]
    NotExpandable(HierarchyPath),

    #[error("invalid node at {position}: {reason}")]
    InvalidNode { position: String, reason: String },
}

impl DomainError {
    /// True for every error the datasource reports through its fail contract.
    pub fn is_data_unavailable(&self) -> bool {
        !matches!(self, DomainError::InvalidNode { .. })
    }
}

/// The failure side of the `get_rows` contract.
pub type DataUnavailable = DomainError;

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
