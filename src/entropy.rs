use std::collections::HashMap;
use std::hash::Hash;

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Base of the logarithm used by [`Entropy`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub enum LogBase {
    /// Number of distinct labels in the multiset, never below 2.
    #[default]
    DistinctLabels,
    Fixed(f64),
}

/// Shannon entropy of a label multiset.
#[derive(Debug, Clone, Copy)]
pub struct Entropy {
    pub base: LogBase,
    pub epsilon: f64,
}

impl Default for Entropy {
    fn default() -> Self {
        Entropy {
            base: LogBase::DistinctLabels,
            epsilon: 1e-9,
        }
    }
}

impl Entropy {
    pub fn new(base: LogBase, epsilon: f64) -> Self {
        Entropy { base, epsilon }
    }

    /// Entropy from per-label counts. Zero counts are skipped.
    pub fn of_counts(&self, counts: &[usize]) -> f64 {
        let total: usize = counts.iter().sum();
        if total == 0 {
            warn!("Entropy requested for an empty label set");
            return 0.0;
        }

        let distinct = counts.iter().filter(|&&c| c > 0).count();
        if distinct <= 1 {
            return 0.0;
        }

        let k = match self.base {
            LogBase::DistinctLabels => distinct.max(2) as f64,
            LogBase::Fixed(k) if k >= 2.0 => k,
            LogBase::Fixed(_) => return 0.0,
        };
        let ln_k = k.ln();

        let entropy = counts
            .iter()
            .filter(|&&c| c > 0)
            .map(|&c| {
                let p = c as f64 / total as f64;
                -p * (p + self.epsilon).ln() / ln_k
            })
            .sum::<f64>();

        entropy.max(0.0)
    }

    pub fn of_labels<T, I>(&self, labels: I) -> f64
    where
        T: Eq + Hash + Clone,
        I: IntoIterator<Item = T>,
    {
        let counts = label_counts(labels)
            .into_iter()
            .map(|(_, c)| c)
            .collect::<Vec<_>>();
        self.of_counts(&counts)
    }

    /// Same calculator with `DistinctLabels` resolved to a fixed base for a
    /// set with `distinct` labels. Entropies of a set and of its subsets
    /// are only comparable when measured in one base.
    pub fn pinned(&self, distinct: usize) -> Entropy {
        match self.base {
            LogBase::DistinctLabels => Entropy {
                base: LogBase::Fixed(distinct.max(2) as f64),
                epsilon: self.epsilon,
            },
            LogBase::Fixed(_) => *self,
        }
    }

    /// Upper bound `log_k(c)` for `c` distinct labels under this base.
    pub fn max_for(&self, distinct: usize) -> f64 {
        if distinct <= 1 {
            return 0.0;
        }
        match self.base {
            LogBase::DistinctLabels => 1.0,
            LogBase::Fixed(k) if k >= 2.0 => (distinct as f64).ln() / k.ln(),
            LogBase::Fixed(_) => 0.0,
        }
    }
}

/// Counts per distinct label, in order of first appearance.
pub fn label_counts<T, I>(labels: I) -> Vec<(T, usize)>
where
    T: Eq + Hash + Clone,
    I: IntoIterator<Item = T>,
{
    let mut index: HashMap<T, usize> = HashMap::new();
    let mut counts: Vec<(T, usize)> = Vec::new();
    for label in labels {
        match index.get(&label) {
            Some(&i) => counts[i].1 += 1,
            None => {
                index.insert(label.clone(), counts.len());
                counts.push((label, 1));
            }
        }
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOL: f64 = 1e-6;

    #[test]
    fn test_two_even_classes_is_one_bit() {
        let e = Entropy::new(LogBase::Fixed(2.0), 1e-9);
        let h = e.of_labels(["Yes", "Yes", "No", "No"]);
        assert!((h - 1.0).abs() < TOL, "{}", h);
    }

    #[test]
    fn test_single_label_is_zero() {
        let e = Entropy::default();
        assert_eq!(e.of_labels(["a", "a", "a"]), 0.0);
        assert_eq!(e.of_counts(&[5, 0, 0]), 0.0);
    }

    #[test]
    fn test_distinct_label_base_normalises() {
        let e = Entropy::default();
        let h = e.of_counts(&[2, 2, 2]);
        assert!((h - 1.0).abs() < TOL, "{}", h);
    }

    #[test]
    fn test_degenerate_base_short_circuits() {
        let e = Entropy::new(LogBase::Fixed(1.0), 0.0);
        assert_eq!(e.of_counts(&[1, 1]), 0.0);
    }

    #[test]
    fn test_empty_is_zero() {
        assert_eq!(Entropy::default().of_counts(&[]), 0.0);
    }

    #[test]
    fn test_bounds() {
        let e = Entropy::new(LogBase::Fixed(2.0), 1e-9);
        for counts in [vec![1, 3], vec![5, 1, 1], vec![2, 2, 2, 2], vec![9, 1]] {
            let distinct = counts.len();
            let h = e.of_counts(&counts);
            assert!(h > 0.0);
            assert!(h <= e.max_for(distinct) + TOL, "{:?} -> {}", counts, h);
        }
    }

    #[test]
    fn test_label_counts_keep_first_seen_order() {
        let counts = label_counts(["b", "a", "b", "c", "a", "b"]);
        assert_eq!(counts, vec![("b", 3), ("a", 2), ("c", 1)]);
    }
}
