use itertools::Itertools;
use serde::Serialize;
use tracing::debug;

use crate::{attribute::Attribute, entropy::Entropy, instance::Instances};

/// One row of the per-value table shown next to a gain computation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValueBreakdown {
    pub value: String,
    pub count: usize,
    /// `|S_v| / |S|`
    pub weight: f64,
    pub entropy: f64,
    pub class_counts: Vec<(String, usize)>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GainReport {
    pub attribute: String,
    pub rows: usize,
    pub total_entropy: f64,
    /// `E(S|A)`; ranking by its minimum selects the same attribute as
    /// ranking by maximum gain.
    pub conditional_entropy: f64,
    pub gain: f64,
    pub breakdown: Vec<ValueBreakdown>,
}

/// `Gain(S, A) = E(S) - Σ_v |S_v|/|S| · E(S_v)`.
///
/// `data` must already exclude rows where either `attr` or the class is the
/// unknown marker.
pub fn information_gain(data: &Instances, attr: &Attribute, entropy: &Entropy) -> GainReport {
    let total = data.len();
    if total == 0 {
        return GainReport {
            attribute: attr.name.clone(),
            rows: 0,
            total_entropy: 0.0,
            conditional_entropy: 0.0,
            gain: 0.0,
            breakdown: Vec::new(),
        };
    }

    let counts = counts_only(&class_counts(data, data));
    let entropy = entropy.pinned(counts.len());
    let total_entropy = entropy.of_counts(&counts);

    let mut conditional_entropy = 0.0;
    let mut breakdown = Vec::new();
    for (value, subset) in data.partition(attr) {
        let counts = class_counts(data, &subset);
        let subset_entropy = entropy.of_counts(&counts_only(&counts));
        let weight = subset.len() as f64 / total as f64;
        conditional_entropy += weight * subset_entropy;
        breakdown.push(ValueBreakdown {
            value: attr.value_name(value).to_string(),
            count: subset.len(),
            weight,
            entropy: subset_entropy,
            class_counts: counts,
        });
    }

    let gain = total_entropy - conditional_entropy;
    debug!(
        "Test of '{}': E(S) = {:.4} | E(S|A) = {:.4} | gain = {:.4}",
        attr.name, total_entropy, conditional_entropy, gain
    );

    GainReport {
        attribute: attr.name.clone(),
        rows: total,
        total_entropy,
        conditional_entropy,
        gain,
        breakdown,
    }
}

fn class_counts(data: &Instances, subset: &Instances) -> Vec<(String, usize)> {
    subset
        .class_frequencies()
        .into_iter()
        .map(|(c, n)| (data.class_name(c).to_string(), n))
        .collect_vec()
}

fn counts_only(counts: &[(String, usize)]) -> Vec<usize> {
    counts.iter().map(|(_, n)| *n).collect_vec()
}

/// Index of the report with the highest gain; the earliest one wins ties.
pub fn best_attribute(reports: &[GainReport]) -> Option<usize> {
    let mut best: Option<usize> = None;
    for (i, report) in reports.iter().enumerate() {
        match best {
            Some(b) if report.gain <= reports[b].gain => {}
            _ => best = Some(i),
        }
    }
    best
}
