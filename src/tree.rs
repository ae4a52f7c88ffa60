use std::collections::HashMap;
use std::fmt;

use serde::Serialize;
use tracing::{debug, warn};

const LEAF_STYLE: &str = "shape=box, style=filled, color=lightgreen";
const INTERNAL_STYLE: &str = "shape=ellipse, style=filled, color=lightblue";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Node {
    Leaf { class: String },
    Internal {
        attribute: String,
        branches: Vec<Branch>,
    },
}

/// Edge of an internal node: the attribute value and the subtree it leads to.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Branch {
    pub value: String,
    pub node: Node,
}

impl Node {
    pub fn leaf(class: impl Into<String>) -> Self {
        Node::Leaf {
            class: class.into(),
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, Node::Leaf { .. })
    }

    pub fn num_children(&self) -> usize {
        match self {
            Node::Leaf { .. } => 0,
            Node::Internal { branches, .. } => branches.len(),
        }
    }

    pub fn branch(&self, value: &str) -> Option<&Node> {
        match self {
            Node::Leaf { .. } => None,
            Node::Internal { branches, .. } => branches
                .iter()
                .find(|b| b.value == value)
                .map(|b| &b.node),
        }
    }
}

/// Result of routing an example through a tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Prediction {
    Class(String),
    /// An internal node without branches was reached.
    Unresolved,
}

impl Prediction {
    pub fn class(&self) -> Option<&str> {
        match self {
            Prediction::Class(c) => Some(c),
            Prediction::Unresolved => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecisionTree {
    pub root: Node,
    pub unknown_marker: String,
}

impl DecisionTree {
    pub fn new(root: Node, unknown_marker: impl Into<String>) -> Self {
        DecisionTree {
            root,
            unknown_marker: unknown_marker.into(),
        }
    }

    /// Routes `example` to a leaf.
    ///
    /// When the example's value is missing, the unknown marker, or not a
    /// recorded branch, the walk continues down the marker branch if the
    /// node has one, else down the branch whose node has the most children
    /// (first branch on ties).
    pub fn predict(&self, example: &HashMap<String, String>) -> Prediction {
        let marker = self.unknown_marker.as_str();
        let mut node = &self.root;
        loop {
            let (attribute, branches) = match node {
                Node::Leaf { class } => return Prediction::Class(class.clone()),
                Node::Internal {
                    attribute,
                    branches,
                } => (attribute, branches),
            };

            let value = example.get(attribute).map(String::as_str);
            let exact = value
                .filter(|v| *v != marker)
                .and_then(|v| branches.iter().find(|b| b.value == v));

            let next = match exact {
                Some(branch) => branch,
                None => match fallback_branch(branches, marker) {
                    Some(branch) => {
                        debug!(
                            "No branch of '{}' for {:?}, following '{}'",
                            attribute, value, branch.value
                        );
                        branch
                    }
                    None => {
                        warn!("Node '{}' has no branches, cannot predict", attribute);
                        return Prediction::Unresolved;
                    }
                },
            };
            node = &next.node;
        }
    }

    /// Leaf classes in depth-first branch order.
    pub fn leaves(&self) -> Vec<&str> {
        fn walk<'a>(node: &'a Node, out: &mut Vec<&'a str>) {
            match node {
                Node::Leaf { class } => out.push(class),
                Node::Internal { branches, .. } => {
                    for branch in branches {
                        walk(&branch.node, out);
                    }
                }
            }
        }
        let mut out = Vec::new();
        walk(&self.root, &mut out);
        out
    }

    /// Number of edges on the longest root-to-leaf path.
    pub fn depth(&self) -> usize {
        fn depth(node: &Node) -> usize {
            match node {
                Node::Leaf { .. } => 0,
                Node::Internal { branches, .. } => {
                    1 + branches.iter().map(|b| depth(&b.node)).max().unwrap_or(0)
                }
            }
        }
        depth(&self.root)
    }

    /// Graphviz DOT source with a `Start` node above the root.
    pub fn to_dot(&self) -> String {
        fn emit(node: &Node, parent: usize, label: &str, next_id: &mut usize, out: &mut String) {
            let id = *next_id;
            *next_id += 1;
            match node {
                Node::Leaf { class } => out.push_str(&format!(
                    "    n{} [label=\"Category: {}\", {}];\n",
                    id,
                    escape(class),
                    LEAF_STYLE
                )),
                Node::Internal { attribute, .. } => out.push_str(&format!(
                    "    n{} [label=\"{}\", {}];\n",
                    id,
                    escape(attribute),
                    INTERNAL_STYLE
                )),
            }
            out.push_str(&format!(
                "    n{} -> n{} [label=\"{}\"];\n",
                parent,
                id,
                escape(label)
            ));
            if let Node::Internal { branches, .. } = node {
                for branch in branches {
                    emit(&branch.node, id, &branch.value, next_id, out);
                }
            }
        }

        let mut out = String::from("digraph {\n    n0 [label=\"Start\"];\n");
        let mut next_id = 1;
        emit(&self.root, 0, "", &mut next_id, &mut out);
        out.push_str("}\n");
        out
    }
}

fn fallback_branch<'a>(branches: &'a [Branch], marker: &str) -> Option<&'a Branch> {
    if let Some(unknown) = branches.iter().find(|b| b.value == marker) {
        return Some(unknown);
    }
    let mut best: Option<&Branch> = None;
    for branch in branches {
        match best {
            Some(b) if branch.node.num_children() <= b.node.num_children() => {}
            _ => best = Some(branch),
        }
    }
    best
}

fn escape(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

impl fmt::Display for DecisionTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn write_node(f: &mut fmt::Formatter<'_>, node: &Node, depth: usize) -> fmt::Result {
            match node {
                Node::Leaf { class } => writeln!(f, "{}Category: {}", "    ".repeat(depth), class),
                Node::Internal {
                    attribute,
                    branches,
                } => {
                    writeln!(f, "{}{}", "    ".repeat(depth), attribute)?;
                    for branch in branches {
                        writeln!(f, "{}= {}", "    ".repeat(depth + 1), branch.value)?;
                        write_node(f, &branch.node, depth + 2)?;
                    }
                    Ok(())
                }
            }
        }
        write_node(f, &self.root, 0)
    }
}

/// Builds an example from `(attribute, value)` pairs.
pub fn example<'a, I>(pairs: I) -> HashMap<String, String>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn branch(value: &str, node: Node) -> Branch {
        Branch {
            value: value.to_string(),
            node,
        }
    }

    fn internal(attribute: &str, branches: Vec<Branch>) -> Node {
        Node::Internal {
            attribute: attribute.to_string(),
            branches,
        }
    }

    fn outlook_tree() -> DecisionTree {
        DecisionTree::new(
            internal(
                "Outlook",
                vec![
                    branch("Overcast", Node::leaf("Yes")),
                    branch(
                        "Sunny",
                        internal(
                            "Humidity",
                            vec![
                                branch("High", Node::leaf("No")),
                                branch("Normal", Node::leaf("Yes")),
                            ],
                        ),
                    ),
                    branch("Rain", Node::leaf("Yes")),
                ],
            ),
            "?",
        )
    }

    #[test]
    fn test_exact_route() {
        let tree = outlook_tree();
        let p = tree.predict(&example([("Outlook", "Sunny"), ("Humidity", "High")]));
        assert_eq!(p, Prediction::Class("No".to_string()));
    }

    #[test]
    fn test_unknown_follows_most_populated_branch() {
        let tree = outlook_tree();
        // Outlook unknown -> Sunny (two children); Humidity missing -> first branch.
        let p = tree.predict(&example([("Outlook", "?")]));
        assert_eq!(p.class(), Some("No"));
        let unseen = tree.predict(&example([("Outlook", "Fog"), ("Humidity", "Normal")]));
        assert_eq!(unseen.class(), Some("Yes"));
    }

    #[test]
    fn test_marker_branch_preferred() {
        let tree = DecisionTree::new(
            internal(
                "a",
                vec![
                    branch("x", internal("b", vec![branch("p", Node::leaf("1"))])),
                    branch("?", Node::leaf("2")),
                ],
            ),
            "?",
        );
        assert_eq!(tree.predict(&example([])).class(), Some("2"));
    }

    #[test]
    fn test_childless_node_is_unresolved() {
        let tree = DecisionTree::new(internal("a", vec![]), "?");
        assert_eq!(tree.predict(&example([("a", "x")])), Prediction::Unresolved);
    }

    #[test]
    fn test_prediction_is_deterministic() {
        let tree = outlook_tree();
        let e = example([("Outlook", "?"), ("Humidity", "?")]);
        assert_eq!(tree.predict(&e), tree.predict(&e));
    }

    #[test]
    fn test_shape_helpers() {
        let tree = outlook_tree();
        assert_eq!(tree.leaves(), vec!["Yes", "No", "Yes", "Yes"]);
        assert_eq!(tree.depth(), 2);
    }

    #[test]
    fn test_dot_output() {
        let dot = outlook_tree().to_dot();
        assert!(dot.starts_with("digraph {"));
        assert!(dot.contains("n0 [label=\"Start\"]"));
        assert!(dot.contains("n1 [label=\"Outlook\", shape=ellipse"));
        assert!(dot.contains("[label=\"Category: Yes\", shape=box"));
        assert!(dot.contains("n1 -> n3 [label=\"Sunny\"]"));
    }

    #[test]
    fn test_display() {
        let text = outlook_tree().to_string();
        assert!(text.starts_with("Outlook\n    = Overcast\n        Category: Yes\n"));
    }
}
