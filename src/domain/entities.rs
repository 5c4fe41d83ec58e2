//! Domain entities: core data structures

use std::fmt;
use std::ops::Range;
use std::str::FromStr;

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::error::{DomainError, DomainResult};

/// Arbitrary display attributes of a node.
pub type Attributes = Map<String, Value>;

/// A record in the hierarchy.
///
/// `child_nodes` is `None` for leaves. `Some(vec![])` is an expandable
/// group that happens to have no children.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Node {
    pub group_key: String,
    pub child_nodes: Option<Vec<Node>>,
    pub attributes: Attributes,
}

impl Node {
    pub fn leaf(group_key: impl Into<String>) -> Self {
        Self {
            group_key: group_key.into(),
            child_nodes: None,
            attributes: Attributes::new(),
        }
    }

    pub fn group(group_key: impl Into<String>, children: Vec<Node>) -> Self {
        Self {
            group_key: group_key.into(),
            child_nodes: Some(children),
            attributes: Attributes::new(),
        }
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn is_expandable(&self) -> bool {
        self.child_nodes.is_some()
    }

    /// Direct children; empty for leaves.
    pub fn children(&self) -> &[Node] {
        self.child_nodes.as_deref().unwrap_or(&[])
    }

    /// Row shape handed to the grid.
    pub fn to_row(&self) -> Row {
        Row {
            group_key: self.group_key.clone(),
            is_group: self.is_expandable(),
            child_count: self.children().len(),
            data: self.attributes.clone(),
        }
    }
}

/// Top-level nodes, loaded once and never mutated.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Dataset {
    nodes: Vec<Node>,
}

impl Dataset {
    pub fn new(nodes: Vec<Node>) -> Self {
        Self { nodes }
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Total number of nodes at every depth.
    pub fn node_count(&self) -> usize {
        fn count(nodes: &[Node]) -> usize {
            nodes.iter().map(|n| 1 + count(n.children())).sum()
        }
        count(&self.nodes)
    }

    /// Find the node a non-empty path points at.
    ///
    /// Fails closed: an unknown key is `RouteNotFound`, descending through a
    /// leaf is `NotExpandable`.
    pub fn find(&self, path: &HierarchyPath) -> DomainResult<&Node> {
        if self.is_empty() {
            return Err(DomainError::EmptyDataset);
        }
        let mut level = self.nodes.as_slice();
        let mut walked = HierarchyPath::root();
        let mut found: Option<&Node> = None;

        for key in path.keys() {
            if let Some(parent) = found {
                if !parent.is_expandable() {
                    return Err(DomainError::NotExpandable(walked));
                }
            }
            let node = level
                .iter()
                .find(|n| &n.group_key == key)
                .ok_or_else(|| DomainError::RouteNotFound {
                    route: walked.clone(),
                    missing: key.clone(),
                })?;
            walked = walked.child(key.clone());
            level = node.children();
            found = Some(node);
        }

        found.ok_or(DomainError::RouteNotFound {
            route: HierarchyPath::root(),
            missing: String::new(),
        })
    }

    /// Nodes at the level a path addresses: the root level for the empty
    /// path, otherwise the children of the node the path points at.
    pub fn level(&self, path: &HierarchyPath) -> DomainResult<&[Node]> {
        if self.is_empty() {
            return Err(DomainError::EmptyDataset);
        }
        if path.is_root() {
            return Ok(self.nodes.as_slice());
        }
        let node = self.find(path)?;
        match &node.child_nodes {
            Some(children) => Ok(children.as_slice()),
            None => Err(DomainError::NotExpandable(path.clone())),
        }
    }
}

/// Group keys identifying a node's ancestry, root-first.
///
/// Rendered and parsed as keys joined by `/`; the empty path is the root.
/// A `/` or `\` inside a key is escaped with a backslash (`login\/logout`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HierarchyPath(Vec<String>);

impl HierarchyPath {
    pub fn root() -> Self {
        Self(Vec::new())
    }

    pub fn new<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(keys.into_iter().map(Into::into).collect())
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn depth(&self) -> usize {
        self.0.len()
    }

    pub fn keys(&self) -> &[String] {
        &self.0
    }

    /// This path extended by one key.
    pub fn child(&self, key: impl Into<String>) -> Self {
        let mut keys = self.0.clone();
        keys.push(key.into());
        Self(keys)
    }
}

impl fmt::Display for HierarchyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_root() {
            return write!(f, "/");
        }
        write!(f, "{}", self.0.iter().map(|k| escape_key(k)).join("/"))
    }
}

fn escape_key(key: &str) -> String {
    key.replace('\\', "\\\\").replace('/', "\\/")
}

impl FromStr for HierarchyPath {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut keys = Vec::new();
        let mut key = String::new();
        let mut chars = s.chars();
        while let Some(c) = chars.next() {
            match c {
                // a trailing lone backslash is kept literally
                '\\' => key.push(chars.next().unwrap_or('\\')),
                '/' => {
                    if !key.is_empty() {
                        keys.push(std::mem::take(&mut key));
                    }
                }
                other => key.push(other),
            }
        }
        if !key.is_empty() {
            keys.push(key);
        }
        Ok(Self(keys))
    }
}

/// Half-open row window `[start_index, end_index)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub start_index: usize,
    pub end_index: usize,
}

impl PageRequest {
    /// Create a window, rejecting `start > end`.
    pub fn new(start_index: usize, end_index: usize) -> DomainResult<Self> {
        let page = Self {
            start_index,
            end_index,
        };
        page.validate()?;
        Ok(page)
    }

    pub fn validate(&self) -> DomainResult<()> {
        if self.start_index > self.end_index {
            return Err(DomainError::InvalidRange {
                start: self.start_index,
                end: self.end_index,
            });
        }
        Ok(())
    }

    /// The window clamped to `total` available rows.
    pub fn clamp(&self, total: usize) -> Range<usize> {
        let start = self.start_index.min(total);
        let end = self.end_index.min(total).max(start);
        start..end
    }
}

/// One `get_rows` request: a page of the children at `path`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowsRequest {
    pub path: HierarchyPath,
    pub page: PageRequest,
}

impl RowsRequest {
    pub fn root(page: PageRequest) -> Self {
        Self {
            path: HierarchyPath::root(),
            page,
        }
    }
}

/// A row as the grid receives it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Row {
    pub group_key: String,
    pub is_group: bool,
    pub child_count: usize,
    pub data: Attributes,
}

/// Success payload of `get_rows`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowsResponse {
    pub rows: Vec<Row>,
    /// Unsliced child count at the requested level, for scrollbar sizing.
    pub total_row_count: usize,
}

/// Route-scoped batch: the whole child list of the node at `route`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteBatch {
    pub route: HierarchyPath,
    pub rows: Vec<Row>,
    pub row_count: usize,
}

impl RouteBatch {
    pub fn for_node(route: HierarchyPath, node: &Node) -> Self {
        let rows: Vec<Row> = node.children().iter().map(Node::to_row).collect();
        let row_count = rows.len();
        Self {
            route,
            rows,
            row_count,
        }
    }
}

/// What `get_rows` does with a window that selects no rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmptyPagePolicy {
    /// Report `EmptyPage` through the fail contract.
    #[default]
    Fail,
    /// Answer with zero rows and the real total.
    Succeed,
}

/// How children of expandable nodes reach the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExpansionMode {
    /// Children are fetched when a node is expanded.
    #[default]
    Lazy,
    /// Every returned group pushes its whole subtree, depth-first.
    Prefetch,
}

impl FromStr for ExpansionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "lazy" => Ok(Self::Lazy),
            "prefetch" => Ok(Self::Prefetch),
            other => Err(format!("unknown expansion mode: {other}")),
        }
    }
}

impl FromStr for EmptyPagePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "fail" => Ok(Self::Fail),
            "succeed" => Ok(Self::Succeed),
            other => Err(format!("unknown empty page policy: {other}")),
        }
    }
}
