//! Application services
//!
//! Concrete service implementations that orchestrate domain logic.
//! Services depend on I/O boundary traits (RowSink) but are themselves
//! concrete structs, not traits.

mod datasource;
mod populator;

pub use datasource::{DatasourceOptions, MockHierarchicalDatasource};
pub use populator::{HierarchyPopulator, PrefetchHandle, PrefetchOutcome};
