//! Domain layer: entities and paging/hierarchy logic
//!
//! This layer is independent of external concerns (no I/O, no timers, no config loading).

pub mod entities;
pub mod error;
pub mod hierarchy;
pub mod paging;
pub mod schema;

pub use entities::*;
pub use error::{DataUnavailable, DomainError, DomainResult};
pub use hierarchy::DepthFirstBatches;
pub use paging::{select_page, Page};
pub use schema::NodeSchema;

/// Expand `~`, `$VAR` and `${VAR}` in a path-like string.
pub fn expand_env_vars(path: &str) -> String {
    shellexpand::full(path)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| path.to_string())
}
