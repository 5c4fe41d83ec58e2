//! Server-side row model datasource for hierarchical grids.
//!
//! A pre-loaded nested dataset is served as paged `get_rows` responses, and
//! the child lists of expandable nodes are delivered as route-scoped batches,
//! lazily on expansion or eagerly depth-first, after a simulated latency.

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;

pub use application::services::{DatasourceOptions, HierarchyPopulator, MockHierarchicalDatasource};
pub use domain::{
    DataUnavailable, Dataset, HierarchyPath, Node, PageRequest, RouteBatch, Row, RowsRequest,
    RowsResponse,
};
