//! Depth-first walks over expandable nodes.

use termtree::Tree;

use crate::domain::entities::{Dataset, HierarchyPath, Node, RouteBatch};

/// Yields one `RouteBatch` per expandable node in a subtree, depth-first and
/// in dataset order, starting with the subtree root itself.
///
/// Stack based: children are pushed in reverse so the leftmost is visited
/// first.
pub struct DepthFirstBatches<'a> {
    stack: Vec<(HierarchyPath, &'a Node)>,
}

impl<'a> DepthFirstBatches<'a> {
    pub fn new(route: HierarchyPath, node: &'a Node) -> Self {
        Self {
            stack: vec![(route, node)],
        }
    }

    /// Walk several subtrees, each rooted at `parent.child(node.group_key)`.
    pub fn for_nodes(parent: &HierarchyPath, nodes: &'a [Node]) -> Self {
        let stack = nodes
            .iter()
            .rev()
            .map(|n| (parent.child(n.group_key.clone()), n))
            .collect();
        Self { stack }
    }
}

impl Iterator for DepthFirstBatches<'_> {
    type Item = RouteBatch;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((route, node)) = self.stack.pop() {
            if !node.is_expandable() {
                continue;
            }
            for child in node.children().iter().rev() {
                self.stack
                    .push((route.child(child.group_key.clone()), child));
            }
            return Some(RouteBatch::for_node(route, node));
        }
        None
    }
}

/// Render the hierarchy for terminal display.
pub fn to_tree_string(dataset: &Dataset, label: &str) -> Tree<String> {
    fn build(node: &Node) -> Tree<String> {
        let leaves: Vec<_> = node.children().iter().map(build).collect();
        let name = if node.is_expandable() {
            format!("{} ({})", node.group_key, node.children().len())
        } else {
            node.group_key.clone()
        };
        Tree::new(name).with_leaves(leaves)
    }

    Tree::new(label.to_string()).with_leaves(dataset.nodes().iter().map(build))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn routes(batches: impl Iterator<Item = RouteBatch>) -> Vec<String> {
        batches.map(|b| b.route.to_string()).collect()
    }

    #[test]
    fn given_nested_groups_when_walking_then_visits_depth_first() {
        let a = Node::group(
            "A",
            vec![
                Node::group("A1", vec![Node::group("A1x", vec![Node::leaf("deep")])]),
                Node::leaf("A2"),
                Node::group("A3", vec![Node::leaf("A3a")]),
            ],
        );

        let order = routes(DepthFirstBatches::new(HierarchyPath::new(["A"]), &a));

        assert_eq!(order, vec!["A", "A/A1", "A/A1/A1x", "A/A3"]);
    }

    #[test]
    fn given_leaf_when_walking_then_yields_nothing() {
        let leaf = Node::leaf("x");
        assert_eq!(DepthFirstBatches::new(HierarchyPath::new(["x"]), &leaf).count(), 0);
    }

    #[test]
    fn given_sibling_roots_when_walking_then_keeps_dataset_order() {
        let nodes = vec![
            Node::group("A", vec![Node::leaf("a")]),
            Node::leaf("B"),
            Node::group("C", vec![Node::leaf("c")]),
        ];

        let order = routes(DepthFirstBatches::for_nodes(&HierarchyPath::root(), &nodes));

        assert_eq!(order, vec!["A", "C"]);
    }

    #[test]
    fn given_group_when_walking_then_batch_holds_direct_children_only() {
        let a = Node::group("A", vec![Node::group("A1", vec![Node::leaf("A1a")])]);

        let first = DepthFirstBatches::new(HierarchyPath::new(["A"]), &a)
            .next()
            .unwrap();

        assert_eq!(first.row_count, 1);
        assert_eq!(first.rows[0].group_key, "A1");
        assert!(first.rows[0].is_group);
    }

    #[test]
    fn given_dataset_when_rendering_then_shows_child_counts() {
        let dataset = Dataset::new(vec![Node::group("A", vec![Node::leaf("A1")])]);
        let rendered = to_tree_string(&dataset, "root").to_string();
        assert!(rendered.contains("A (1)"));
        assert!(rendered.contains("A1"));
    }
}
