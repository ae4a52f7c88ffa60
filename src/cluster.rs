//! Iterative partitional clustering shared by k-means and k-modes.
//!
//! The two algorithms differ only in their [`ClusterMetric`]: how far a row
//! is from a centre and how a centre is re-estimated from its members.
//! Everything else (initialisation, assignment, convergence, imputation of
//! incomplete rows) lives here.

use std::fmt::Debug;

use itertools::Itertools;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::{ClusterConfig, InitPolicy};
use crate::entropy::label_counts;
use crate::error::{Error, Result};
use crate::table::{Column, ColumnData, Table};

/// A feature value a centre can hold and write back into a table.
pub trait FeatureValue: Clone + PartialEq + Debug + Serialize {
    fn write(column: &mut ColumnData, row: usize, value: &Self);
}

impl FeatureValue for f64 {
    fn write(column: &mut ColumnData, row: usize, value: &Self) {
        if let ColumnData::Numeric(values) = column {
            values[row] = Some(*value);
        }
    }
}

impl FeatureValue for String {
    fn write(column: &mut ColumnData, row: usize, value: &Self) {
        if let ColumnData::Categorical(values) = column {
            values[row] = Some(value.clone());
        }
    }
}

pub trait ClusterMetric {
    type Value: FeatureValue;

    fn distance(&self, row: &[Self::Value], centre: &[Self::Value]) -> f64;

    /// New centre for `members`, or `None` when the cluster is empty.
    fn centre(&self, members: &[&[Self::Value]]) -> Option<Vec<Self::Value>>;
}

/// Feature vectors extracted from a table, split by completeness.
#[derive(Debug, Clone)]
pub(crate) struct Dataset<V> {
    pub features: Vec<String>,
    /// Table row index and values of rows without missing features.
    pub complete: Vec<(usize, Vec<V>)>,
    /// Table row index and partial values of the other rows.
    pub incomplete: Vec<(usize, Vec<Option<V>>)>,
    /// Class label per table row, when the class column is in use.
    pub classes: Option<Vec<Option<String>>>,
}

impl<V: Clone> Dataset<V> {
    pub fn from_rows(
        features: Vec<String>,
        rows: Vec<Vec<Option<V>>>,
        classes: Option<Vec<Option<String>>>,
    ) -> Self {
        let mut complete = Vec::new();
        let mut incomplete = Vec::new();
        for (i, row) in rows.into_iter().enumerate() {
            if row.iter().all(Option::is_some) {
                complete.push((i, row.into_iter().flatten().collect()));
            } else {
                incomplete.push((i, row));
            }
        }
        Dataset {
            features,
            complete,
            incomplete,
            classes,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IterationSnapshot<V> {
    pub iteration: usize,
    /// Centres the distances of this iteration were measured against.
    pub centres: Vec<Vec<V>>,
    /// One row per complete table row, one column per cluster.
    pub distances: Vec<Vec<f64>>,
    pub assignments: Vec<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RowAssignment {
    /// Assigned by the iterative loop.
    Clustered(usize),
    /// Incomplete row placed by its class and filled from the centre.
    Imputed(usize),
    /// Incomplete row with no usable class.
    Unresolved,
}

impl RowAssignment {
    pub fn cluster(&self) -> Option<usize> {
        match self {
            RowAssignment::Clustered(c) | RowAssignment::Imputed(c) => Some(*c),
            RowAssignment::Unresolved => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImputedRow<V> {
    pub row: usize,
    pub cluster: usize,
    /// Full feature vector after filling.
    pub values: Vec<V>,
    /// Indices of the features that were filled.
    pub filled: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClusterOutcome<V> {
    pub features: Vec<String>,
    /// Display label per cluster: the class value when class-seeded, else the index.
    pub labels: Vec<String>,
    pub centres: Vec<Vec<V>>,
    pub snapshots: Vec<IterationSnapshot<V>>,
    /// One entry per table row.
    pub assignments: Vec<RowAssignment>,
    pub imputed: Vec<ImputedRow<V>>,
    pub converged: bool,
    pub iterations: usize,
}

impl<V: FeatureValue> ClusterOutcome<V> {
    pub fn k(&self) -> usize {
        self.centres.len()
    }

    pub fn label(&self, row: usize) -> Option<&str> {
        self.assignments
            .get(row)
            .and_then(RowAssignment::cluster)
            .map(|c| self.labels[c].as_str())
    }

    /// Copy of `table` with a cluster label column appended and imputed
    /// feature values written in.
    pub fn labelled_table(&self, table: &Table, column_name: &str) -> Result<Table> {
        let mut out = table.clone();
        for (f, feature) in self.features.iter().enumerate() {
            let mut column = table.require(feature)?.clone();
            for imputed in &self.imputed {
                if imputed.filled.contains(&f) {
                    V::write(&mut column.data, imputed.row, &imputed.values[f]);
                }
            }
            out = out.with_column(column)?;
        }
        let labels = (0..table.num_rows())
            .map(|row| self.label(row).map(str::to_string))
            .collect();
        out.with_column(Column::categorical(column_name, labels))
    }
}

/// Distance table and arg-min assignment, lowest index on ties.
pub(crate) fn assign<M: ClusterMetric>(
    metric: &M,
    rows: &[&[M::Value]],
    centres: &[Vec<M::Value>],
) -> (Vec<Vec<f64>>, Vec<usize>) {
    let distances = rows
        .iter()
        .map(|row| centres.iter().map(|c| metric.distance(row, c)).collect_vec())
        .collect_vec();
    let assignments = distances
        .iter()
        .map(|d| {
            let mut best = 0;
            for (j, &dist) in d.iter().enumerate() {
                if dist < d[best] {
                    best = j;
                }
            }
            best
        })
        .collect_vec();
    (distances, assignments)
}

struct Seed<V> {
    labels: Vec<String>,
    centres: Vec<Vec<V>>,
    previous: Option<Vec<usize>>,
}

fn seed<M: ClusterMetric>(
    metric: &M,
    data: &Dataset<M::Value>,
    init: &InitPolicy,
) -> Result<Seed<M::Value>> {
    let n = data.complete.len();
    match init {
        InitPolicy::Random { k, seed } => {
            if *k == 0 || *k > n {
                return Err(Error::InvalidClusterCount { k: *k, rows: n });
            }
            let mut rng = StdRng::seed_from_u64(*seed);
            let indices = (0..n).collect_vec();
            let chosen = indices.choose_multiple(&mut rng, *k).copied().collect_vec();
            debug!("Random initial rows: {:?}", chosen);
            Ok(Seed {
                labels: (0..*k).map(|j| j.to_string()).collect(),
                centres: chosen
                    .into_iter()
                    .map(|i| data.complete[i].1.clone())
                    .collect(),
                previous: None,
            })
        }
        InitPolicy::ClassSeeded { class_column } => {
            let classes = data
                .classes
                .as_ref()
                .ok_or_else(|| Error::ClassColumnMissing(class_column.clone()))?;
            let row_classes = data
                .complete
                .iter()
                .map(|(row, _)| classes[*row].as_deref())
                .collect_vec();
            let labels = label_counts(row_classes.iter().flatten().copied())
                .into_iter()
                .map(|(c, _)| c.to_string())
                .collect_vec();
            if labels.is_empty() {
                return Err(Error::InvalidClusterCount { k: 0, rows: n });
            }

            let mut centres = Vec::with_capacity(labels.len());
            for label in &labels {
                let members = data
                    .complete
                    .iter()
                    .zip(&row_classes)
                    .filter(|(_, c)| **c == Some(label.as_str()))
                    .map(|((_, values), _)| values.as_slice())
                    .collect_vec();
                // every label was observed on at least one complete row
                let centre = metric
                    .centre(&members)
                    .ok_or(Error::InvalidClusterCount { k: labels.len(), rows: n })?;
                centres.push(centre);
            }

            let previous = row_classes
                .iter()
                .map(|c| c.and_then(|c| labels.iter().position(|l| l == c)))
                .collect::<Option<Vec<_>>>();
            Ok(Seed {
                labels,
                centres,
                previous,
            })
        }
    }
}

pub(crate) fn run<M: ClusterMetric>(
    metric: &M,
    data: Dataset<M::Value>,
    config: &ClusterConfig,
    total_rows: usize,
) -> Result<ClusterOutcome<M::Value>> {
    config.validate()?;
    if data.complete.is_empty() {
        return Err(Error::NoCompleteRows);
    }

    let Seed {
        labels,
        mut centres,
        mut previous,
    } = seed(metric, &data, &config.init)?;
    let k = centres.len();
    info!(
        "Clustering {} complete rows into {} clusters ({} incomplete rows)",
        data.complete.len(),
        k,
        data.incomplete.len()
    );

    let rows = data.complete.iter().map(|(_, v)| v.as_slice()).collect_vec();
    let mut snapshots = Vec::new();
    let mut converged = false;
    let mut assignments = Vec::new();

    for iteration in 1..=config.max_iterations {
        let (distances, current) = assign(metric, &rows, &centres);
        snapshots.push(IterationSnapshot {
            iteration,
            centres: centres.clone(),
            distances,
            assignments: current.clone(),
        });
        assignments = current;

        if previous.as_ref() == Some(&assignments) {
            debug!("Converged at iteration {}", iteration);
            converged = true;
            break;
        }
        previous = Some(assignments.clone());
        // Out of iterations: keep the centres the returned assignment was made against.
        if iteration == config.max_iterations {
            break;
        }

        for (j, centre) in centres.iter_mut().enumerate() {
            let members = rows
                .iter()
                .zip(&assignments)
                .filter(|(_, a)| **a == j)
                .map(|(r, _)| *r)
                .collect_vec();
            match metric.centre(&members) {
                Some(updated) => *centre = updated,
                None => warn!("Cluster {} has no members, keeping its centre", labels[j]),
            }
        }
    }

    if !converged {
        warn!(
            "No convergence within {} iterations, keeping the last assignment",
            config.max_iterations
        );
    }

    let mut per_row = vec![RowAssignment::Unresolved; total_rows];
    for ((row, _), cluster) in data.complete.iter().zip(&assignments) {
        per_row[*row] = RowAssignment::Clustered(*cluster);
    }

    let class_seeded = matches!(config.init, InitPolicy::ClassSeeded { .. });
    let mut imputed = Vec::new();
    for (row, values) in &data.incomplete {
        let cluster = data
            .classes
            .as_ref()
            .filter(|_| class_seeded)
            .and_then(|classes| classes[*row].as_deref())
            .and_then(|class| labels.iter().position(|l| l == class));
        let Some(cluster) = cluster else {
            debug!("Row {} has missing features and no usable class", row);
            continue;
        };
        let filled = values
            .iter()
            .enumerate()
            .filter(|(_, v)| v.is_none())
            .map(|(f, _)| f)
            .collect_vec();
        let values = values
            .iter()
            .zip(&centres[cluster])
            .map(|(v, c)| v.clone().unwrap_or_else(|| c.clone()))
            .collect_vec();
        per_row[*row] = RowAssignment::Imputed(cluster);
        imputed.push(ImputedRow {
            row: *row,
            cluster,
            values,
            filled,
        });
    }

    let iterations = snapshots.len();
    info!(
        "Clustering finished after {} iterations (converged: {}), {} rows imputed",
        iterations,
        converged,
        imputed.len()
    );

    Ok(ClusterOutcome {
        features: data.features,
        labels,
        centres,
        snapshots,
        assignments: per_row,
        imputed,
        converged,
        iterations,
    })
}

/// Class labels for every row, or `None` when the init policy ignores them.
pub(crate) fn class_labels(
    table: &Table,
    config: &ClusterConfig,
) -> Result<Option<Vec<Option<String>>>> {
    let InitPolicy::ClassSeeded { class_column } = &config.init else {
        return Ok(None);
    };
    let column = table
        .column(class_column)
        .ok_or_else(|| Error::ClassColumnMissing(class_column.clone()))?;
    Ok(Some(
        (0..table.num_rows())
            .map(|row| {
                if column.is_missing(row, &config.unknown_marker) {
                    None
                } else {
                    Some(column.text(row, &config.unknown_marker))
                }
            })
            .collect(),
    ))
}

/// Checks the selected columns exist and satisfy `is_kind`.
pub(crate) fn validate_features(
    table: &Table,
    features: &[String],
    is_kind: fn(&Column) -> bool,
    expected: &'static str,
) -> Result<()> {
    if features.is_empty() {
        return Err(Error::NoFeatures);
    }
    for feature in features {
        let column = table.require(feature)?;
        if !is_kind(column) {
            return Err(Error::ColumnKind {
                column: feature.clone(),
                expected,
            });
        }
    }
    Ok(())
}
