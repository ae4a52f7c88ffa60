use itertools::Itertools;
use serde::Serialize;

use crate::cluster::{self, class_labels, validate_features, ClusterMetric, ClusterOutcome, Dataset};
use crate::config::ClusterConfig;
use crate::entropy::label_counts;
use crate::error::{Error, Result};
use crate::table::{Column, Table};

/// Number of features on which two rows disagree.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimpleMatching;

impl ClusterMetric for SimpleMatching {
    type Value = String;

    fn distance(&self, row: &[String], centre: &[String]) -> f64 {
        row.iter().zip(centre).filter(|(a, b)| a != b).count() as f64
    }

    fn centre(&self, members: &[&[String]]) -> Option<Vec<String>> {
        let first = members.first()?;
        Some(
            (0..first.len())
                .map(|f| mode(members.iter().map(|m| m[f].as_str())))
                .collect(),
        )
    }
}

/// Most frequent value, first seen on ties.
fn mode<'a>(values: impl IntoIterator<Item = &'a str>) -> String {
    let mut best: Option<(&str, usize)> = None;
    for (value, count) in label_counts(values) {
        if best.map_or(true, |(_, c)| count > c) {
            best = Some((value, count));
        }
    }
    best.map(|(v, _)| v.to_string()).unwrap_or_default()
}

/// Per-cluster value counts of one feature.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModeCounts {
    pub feature: String,
    /// `clusters[j]` lists (value, count) for cluster `j`, first-seen order.
    pub clusters: Vec<Vec<(String, usize)>>,
}

impl ModeCounts {
    pub fn count(&self, cluster: usize, value: &str) -> usize {
        self.clusters
            .get(cluster)
            .and_then(|counts| counts.iter().find(|(v, _)| v == value))
            .map_or(0, |(_, c)| *c)
    }
}

/// k-modes over categorical columns.
#[derive(Debug, Clone, Default)]
pub struct KModes {
    config: ClusterConfig,
}

impl KModes {
    pub fn new(config: ClusterConfig) -> Result<Self> {
        config.validate()?;
        Ok(KModes { config })
    }

    pub fn config(&self) -> &ClusterConfig {
        &self.config
    }

    pub fn run(&self, table: &Table, features: &[String]) -> Result<ClusterOutcome<String>> {
        let rows = self.rows(table, features)?;
        let classes = class_labels(table, &self.config)?;
        let data = Dataset::from_rows(features.to_vec(), rows, classes);
        cluster::run(&SimpleMatching, data, &self.config, table.num_rows())
    }

    /// Value counts per cluster for the assignment made in `iteration`.
    pub fn mode_counts(
        &self,
        table: &Table,
        outcome: &ClusterOutcome<String>,
        iteration: usize,
    ) -> Result<Vec<ModeCounts>> {
        let snapshot = outcome
            .snapshots
            .iter()
            .find(|s| s.iteration == iteration)
            .ok_or(Error::UnknownIteration {
                iteration,
                recorded: outcome.snapshots.len(),
            })?;
        let complete = self
            .rows(table, &outcome.features)?
            .into_iter()
            .filter_map(|row| row.into_iter().collect::<Option<Vec<_>>>())
            .collect_vec();

        Ok(outcome
            .features
            .iter()
            .enumerate()
            .map(|(f, feature)| ModeCounts {
                feature: feature.clone(),
                clusters: (0..outcome.k())
                    .map(|j| {
                        label_counts(
                            complete
                                .iter()
                                .zip(&snapshot.assignments)
                                .filter(|(_, a)| **a == j)
                                .map(|(row, _)| row[f].clone()),
                        )
                    })
                    .collect(),
            })
            .collect())
    }

    fn rows(&self, table: &Table, features: &[String]) -> Result<Vec<Vec<Option<String>>>> {
        if table.categorical_columns().is_empty() {
            return Err(Error::NoCategoricalColumns);
        }
        validate_features(table, features, Column::is_categorical, "categorical")?;
        let marker = &self.config.unknown_marker;
        let columns = features
            .iter()
            .map(|f| table.require(f))
            .collect::<Result<Vec<_>>>()?;
        Ok((0..table.num_rows())
            .map(|row| {
                columns
                    .iter()
                    .map(|c| {
                        if c.is_missing(row, marker) {
                            None
                        } else {
                            c.category(row).map(str::to_string)
                        }
                    })
                    .collect_vec()
            })
            .collect_vec())
    }
}
