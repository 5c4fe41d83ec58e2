//! Mapping raw JSON records onto `Node`s.
//!
//! Datasets name their grouping key differently per level (e.g. `test_suite`
//! for suites, `test_case_name` for cases) and nest children under an
//! arbitrary field, so decoding is driven by a `NodeSchema`.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::entities::{Attributes, Dataset, Node};
use crate::domain::error::{DomainError, DomainResult};

/// Field names used to decode nodes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct NodeSchema {
    /// Candidate key fields, first present wins
    pub key_fields: Vec<String>,
    /// Field holding the child array
    pub children_field: String,
}

impl Default for NodeSchema {
    fn default() -> Self {
        Self {
            key_fields: vec![
                "group_key".into(),
                "test_suite".into(),
                "test_case_name".into(),
            ],
            children_field: "child_nodes".into(),
        }
    }
}

impl NodeSchema {
    /// Decode a top-level JSON array into a dataset.
    pub fn decode_dataset(&self, value: &Value) -> DomainResult<Dataset> {
        let items = value.as_array().ok_or_else(|| DomainError::InvalidNode {
            position: "$".into(),
            reason: format!("expected an array of nodes, found {}", kind(value)),
        })?;
        let nodes = self.decode_nodes(items, "$")?;
        Ok(Dataset::new(nodes))
    }

    /// Sibling keys must be unique: a route has to name exactly one node.
    fn decode_nodes(&self, items: &[Value], position: &str) -> DomainResult<Vec<Node>> {
        let mut seen = HashSet::new();
        let mut nodes = Vec::with_capacity(items.len());
        for (i, item) in items.iter().enumerate() {
            let item_position = format!("{position}[{i}]");
            let node = self.decode_node(item, &item_position)?;
            if !seen.insert(node.group_key.clone()) {
                return Err(DomainError::InvalidNode {
                    position: item_position,
                    reason: format!("duplicate key {:?} among siblings", node.group_key),
                });
            }
            nodes.push(node);
        }
        Ok(nodes)
    }

    /// Decode one record; `position` is a JSON-path-like locator for errors.
    pub fn decode_node(&self, value: &Value, position: &str) -> DomainResult<Node> {
        let object = value.as_object().ok_or_else(|| DomainError::InvalidNode {
            position: position.into(),
            reason: format!("expected an object, found {}", kind(value)),
        })?;

        let group_key = self
            .key_fields
            .iter()
            .find_map(|field| match object.get(field) {
                Some(Value::String(s)) => Some(s.clone()),
                Some(Value::Number(n)) => Some(n.to_string()),
                _ => None,
            })
            .ok_or_else(|| DomainError::InvalidNode {
                position: position.into(),
                reason: format!("none of the key fields {:?} is present", self.key_fields),
            })?;

        let child_nodes = match object.get(&self.children_field) {
            None | Some(Value::Null) => None,
            Some(Value::Array(items)) => {
                let child_position = format!("{position}.{}", self.children_field);
                Some(self.decode_nodes(items, &child_position)?)
            }
            Some(other) => {
                return Err(DomainError::InvalidNode {
                    position: format!("{position}.{}", self.children_field),
                    reason: format!("expected an array of children, found {}", kind(other)),
                })
            }
        };

        let attributes: Attributes = object
            .iter()
            .filter(|(name, _)| *name != &self.children_field)
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();

        Ok(Node {
            group_key,
            child_nodes,
            attributes,
        })
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn given_default_schema_when_decoding_then_reads_group_key_and_children() {
        let value = json!([{"group_key": "A", "child_nodes": [{"group_key": "A1", "status": "ok"}]}]);

        let dataset = NodeSchema::default().decode_dataset(&value).unwrap();

        let a = &dataset.nodes()[0];
        assert_eq!(a.group_key, "A");
        assert_eq!(a.children()[0].group_key, "A1");
        assert_eq!(a.children()[0].attributes.get("status"), Some(&json!("ok")));
        assert!(!a.attributes.contains_key("child_nodes"));
        assert!(a.children()[0].child_nodes.is_none());
    }

    #[test]
    fn given_test_suite_shape_when_decoding_then_key_differs_per_level() {
        let schema = NodeSchema {
            children_field: "testcases".into(),
            ..NodeSchema::default()
        };
        let value = json!([{
            "test_suite": "login",
            "testcases": [{"test_case_name": "valid password", "status": "passed"}]
        }]);

        let dataset = schema.decode_dataset(&value).unwrap();

        assert_eq!(dataset.nodes()[0].group_key, "login");
        assert_eq!(dataset.nodes()[0].children()[0].group_key, "valid password");
    }

    #[test]
    fn given_numeric_key_when_decoding_then_stringifies() {
        let node = NodeSchema::default()
            .decode_node(&json!({"group_key": 42}), "$[0]")
            .unwrap();
        assert_eq!(node.group_key, "42");
    }

    #[test]
    fn given_empty_children_when_decoding_then_expandable_without_rows() {
        let node = NodeSchema::default()
            .decode_node(&json!({"group_key": "A", "child_nodes": []}), "$[0]")
            .unwrap();
        assert!(node.is_expandable());
        assert!(node.children().is_empty());
    }

    #[test]
    fn given_missing_key_when_decoding_then_reports_position() {
        let err = NodeSchema::default()
            .decode_dataset(&json!([{"group_key": "A", "child_nodes": [{"name": "x"}]}]))
            .unwrap_err();
        match err {
            DomainError::InvalidNode { position, .. } => {
                assert_eq!(position, "$[0].child_nodes[0]")
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn given_duplicate_sibling_keys_when_decoding_then_fails_closed() {
        let value = json!([
            {"group_key": "A", "child_nodes": [{"group_key": "x"}]},
            {"group_key": "A", "child_nodes": [{"group_key": "y"}, {"group_key": "z"}]}
        ]);

        let err = NodeSchema::default().decode_dataset(&value).unwrap_err();

        match err {
            DomainError::InvalidNode { position, reason } => {
                assert_eq!(position, "$[1]");
                assert!(reason.contains("duplicate key"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn given_same_key_under_different_parents_when_decoding_then_accepted() {
        let value = json!([
            {"group_key": "A", "child_nodes": [{"group_key": "x"}]},
            {"group_key": "B", "child_nodes": [{"group_key": "x"}]}
        ]);

        let dataset = NodeSchema::default().decode_dataset(&value).unwrap();

        assert_eq!(dataset.node_count(), 4);
    }

    #[test]
    fn given_non_array_children_when_decoding_then_fails() {
        let err = NodeSchema::default()
            .decode_node(&json!({"group_key": "A", "child_nodes": "nope"}), "$[0]")
            .unwrap_err();
        assert!(!err.is_data_unavailable());
    }

    #[test]
    fn given_object_root_when_decoding_then_fails() {
        assert!(NodeSchema::default().decode_dataset(&json!({"a": 1})).is_err());
    }
}
