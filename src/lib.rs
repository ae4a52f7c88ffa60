//! From-scratch ID3 decision trees and k-means / k-modes clustering that
//! record every intermediate calculation for step-by-step display.

use std::collections::HashMap;

use itertools::Itertools;
use serde::Serialize;
use tracing::{debug, info, warn};

pub mod cluster;
pub mod config;
pub mod entropy;
pub mod error;
pub mod gain;
pub mod kmeans;
pub mod kmodes;
pub mod loader;
pub mod normalize;
pub mod rule;
pub mod rule_set;
pub mod session;
pub mod table;
pub mod tree;

mod attribute;
mod attribute_info;
mod instance;

pub use cluster::{ClusterOutcome, ImputedRow, IterationSnapshot, RowAssignment};
pub use config::{ClusterConfig, Id3Config, InitPolicy, UnknownValuePolicy};
pub use entropy::{Entropy, LogBase};
pub use error::{Error, Result};
pub use gain::{GainReport, ValueBreakdown};
pub use kmeans::KMeans;
pub use kmodes::{KModes, ModeCounts};
pub use rule::{Condition, Rule};
pub use rule_set::RuleSet;
pub use session::{Clustering, Session};
pub use table::{Column, ColumnData, Table};
pub use tree::{example, Branch, DecisionTree, Node, Prediction};

use gain::{best_attribute, information_gain};
use instance::{validate_selection, Instances};

/// Why the builder stopped and emitted a leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LeafReason {
    /// Every row reaching the node had an unknown target.
    NoKnownTarget,
    /// All known targets agree.
    Pure,
    /// No candidate attributes left; majority class.
    NoAttributes,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum StepKind {
    Leaf {
        reason: LeafReason,
        class: String,
        rows: usize,
    },
    Evaluated {
        total_entropy: f64,
        reports: Vec<GainReport>,
    },
    Selected {
        attribute: String,
        gain: f64,
    },
    Partition {
        attribute: String,
        value: String,
        rows: usize,
    },
    UnknownBranch {
        attribute: String,
        class: String,
        rows: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BuildStep {
    pub depth: usize,
    pub kind: StepKind,
}

/// Ordered log of every decision taken while growing a tree.
pub type BuildTrace = Vec<BuildStep>;

/// A fitted tree together with everything derived from it.
#[derive(Debug, Clone, Serialize)]
pub struct TreeModel {
    pub target: String,
    pub features: Vec<String>,
    pub tree: DecisionTree,
    pub rules: RuleSet,
    pub trace: BuildTrace,
}

impl TreeModel {
    pub fn predict(&self, example: &HashMap<String, String>) -> Prediction {
        self.tree.predict(example)
    }
}

/// ID3 decision-tree induction.
#[derive(Debug, Clone, Default)]
pub struct Id3 {
    config: Id3Config,
}

impl Id3 {
    pub fn new() -> Self {
        Id3::default()
    }

    pub fn with_config(config: Id3Config) -> Result<Self> {
        config.validate()?;
        Ok(Id3 { config })
    }

    pub fn config(&self) -> &Id3Config {
        &self.config
    }

    /// Builds a tree predicting `target` from `features`, in that order of
    /// preference when gains tie.
    pub fn build(&self, table: &Table, target: &str, features: &[String]) -> Result<TreeModel> {
        validate_selection(table, features, target)?;
        let data = Instances::from_table(table, features, target, &self.config.unknown_marker)?;
        debug!(
            "Building a tree for '{}' from {} rows and {} attributes",
            target,
            data.len(),
            features.len()
        );

        let (tree, trace) = self.build_instances(&data);
        let rules = RuleSet::from_tree(&tree);
        info!(
            "Built tree for '{}': depth {}, {} leaves",
            target,
            tree.depth(),
            rules.len()
        );

        Ok(TreeModel {
            target: target.to_string(),
            features: features.to_vec(),
            tree,
            rules,
            trace,
        })
    }

    fn build_instances(&self, data: &Instances) -> (DecisionTree, BuildTrace) {
        let mut trace = Vec::new();
        let candidates = (0..data.header.attributes.len()).collect_vec();
        let root = self.grow(data, &candidates, 0, &mut trace);
        (
            DecisionTree::new(root, self.config.unknown_marker.clone()),
            trace,
        )
    }

    fn grow(
        &self,
        data: &Instances,
        candidates: &[usize],
        depth: usize,
        trace: &mut BuildTrace,
    ) -> Node {
        let data = data.with_known_class();

        if data.is_empty() {
            warn!("No rows with a known target, leaf gets '{}'", self.config.unknown_class);
            let class = self.config.unknown_class.clone();
            return self.leaf(LeafReason::NoKnownTarget, class, 0, depth, trace);
        }

        let frequencies = data.class_frequencies();
        if frequencies.len() == 1 {
            let class = data.class_name(frequencies[0].0).to_string();
            return self.leaf(LeafReason::Pure, class, data.len(), depth, trace);
        }

        if candidates.is_empty() {
            let class = self.majority(&data);
            return self.leaf(LeafReason::NoAttributes, class, data.len(), depth, trace);
        }

        let entropy = Entropy::new(self.config.log_base, self.config.epsilon);
        let total_entropy =
            entropy.of_counts(&frequencies.iter().map(|(_, n)| *n).collect_vec());
        debug!("{}Total entropy: {:.4}", "    ".repeat(depth), total_entropy);

        let reports = candidates
            .iter()
            .map(|&i| {
                let attr = data.attribute(i);
                let known = data.with_known(attr);
                if known.is_empty() {
                    warn!("Attribute '{}' is unknown in every row at this node", attr.name);
                }
                information_gain(&known, attr, &entropy)
            })
            .collect_vec();

        // candidates is non-empty, so there is always a best report
        let best = best_attribute(&reports).unwrap_or(0);
        let attr = data.attribute(candidates[best]);
        let gain = reports[best].gain;
        trace.push(BuildStep {
            depth,
            kind: StepKind::Evaluated {
                total_entropy,
                reports,
            },
        });
        debug!(
            "{}Best attribute to split: '{}' (gain {:.4})",
            "    ".repeat(depth),
            attr.name,
            gain
        );
        trace.push(BuildStep {
            depth,
            kind: StepKind::Selected {
                attribute: attr.name.clone(),
                gain,
            },
        });

        let remaining = candidates
            .iter()
            .copied()
            .filter(|&i| i != attr.index)
            .collect_vec();

        let mut branches = Vec::new();
        for (value, subset) in data.partition(attr) {
            let value = attr.value_name(value).to_string();
            debug!(
                "{}Partition {} = {} ({} rows)",
                "    ".repeat(depth),
                attr.name,
                value,
                subset.len()
            );
            trace.push(BuildStep {
                depth,
                kind: StepKind::Partition {
                    attribute: attr.name.clone(),
                    value: value.clone(),
                    rows: subset.len(),
                },
            });
            let node = self.grow(&subset, &remaining, depth + 1, trace);
            branches.push(Branch { value, node });
        }

        if self.config.unknown_policy == UnknownValuePolicy::ExplicitBranch
            && data.has_missing(attr)
        {
            let class = self.majority(&data);
            debug!(
                "{}Branch {} = {} imputes majority class '{}'",
                "    ".repeat(depth),
                attr.name,
                self.config.unknown_marker,
                class
            );
            trace.push(BuildStep {
                depth,
                kind: StepKind::UnknownBranch {
                    attribute: attr.name.clone(),
                    class: class.clone(),
                    rows: data.len() - data.with_known(attr).len(),
                },
            });
            branches.push(Branch {
                value: self.config.unknown_marker.clone(),
                node: Node::leaf(class),
            });
        }

        Node::Internal {
            attribute: attr.name.clone(),
            branches,
        }
    }

    fn majority(&self, data: &Instances) -> String {
        data.majority_class()
            .map(|c| data.class_name(c).to_string())
            .unwrap_or_else(|| self.config.unknown_class.clone())
    }

    fn leaf(
        &self,
        reason: LeafReason,
        class: String,
        rows: usize,
        depth: usize,
        trace: &mut BuildTrace,
    ) -> Node {
        debug!("{}Leaf ({:?}) with class: {}", "    ".repeat(depth), reason, class);
        trace.push(BuildStep {
            depth,
            kind: StepKind::Leaf {
                reason,
                class: class.clone(),
                rows,
            },
        });
        Node::leaf(class)
    }
}
