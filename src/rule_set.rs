// rule_set.rs

use serde::Serialize;

use crate::rule::{Condition, Rule};
use crate::tree::{DecisionTree, Node};

/// Rules read off a tree, one per leaf, in depth-first branch order.
#[derive(Clone, Default, PartialEq, Serialize)]
pub struct RuleSet {
    pub rules: Vec<Rule>,
}

impl RuleSet {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn from_tree(tree: &DecisionTree) -> Self {
        let mut rules = Vec::new();
        let mut path = Vec::new();
        collect(&tree.root, &mut path, &mut rules);
        RuleSet { rules }
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Rule> {
        self.rules.iter()
    }
}

fn collect(node: &Node, path: &mut Vec<Condition>, rules: &mut Vec<Rule>) {
    match node {
        Node::Leaf { class } => rules.push(Rule {
            antds: path.clone(),
            consequent: class.clone(),
        }),
        Node::Internal {
            attribute,
            branches,
        } => {
            for branch in branches {
                path.push(Condition {
                    attribute: attribute.clone(),
                    value: branch.value.clone(),
                });
                collect(&branch.node, path, rules);
                path.pop();
            }
        }
    }
}

impl std::fmt::Debug for RuleSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "RuleSet {{ rules: {:?} }}", self.rules)
    }
}

impl std::fmt::Display for RuleSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, rule) in self.rules.iter().enumerate() {
            writeln!(f, "Rule {}: {}", i + 1, rule)?;
        }
        Ok(())
    }
}
