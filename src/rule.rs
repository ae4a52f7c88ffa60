use itertools::Itertools;
use serde::Serialize;

/// `attribute = value` test on one edge of the tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Condition {
    pub attribute: String,
    pub value: String,
}

impl std::fmt::Display for Condition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} = {}", self.attribute, self.value)
    }
}

#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct Rule {
    pub antds: Vec<Condition>,
    pub consequent: String,
}

impl std::fmt::Debug for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "({}) => {}",
            self.antds.iter().map(|a| a.to_string()).join(" & "),
            self.consequent,
        )
    }
}

impl std::fmt::Display for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let antecedent = if self.antds.is_empty() {
            "(no condition)".to_string()
        } else {
            self.antds.iter().map(|a| a.to_string()).join(" and ")
        };
        write!(f, "If {}, then Category = {}", antecedent, self.consequent)
    }
}

impl Rule {
    pub fn new(consequent: impl Into<String>) -> Self {
        Rule {
            consequent: consequent.into(),
            antds: Vec::new(),
        }
    }

    /// True when every condition holds for `example`.
    pub fn covers(&self, example: &std::collections::HashMap<String, String>) -> bool {
        self.antds
            .iter()
            .all(|a| example.get(&a.attribute) == Some(&a.value))
    }
}
