//! The state one interactive user works against: a table and the latest
//! results computed from it.

use std::collections::HashMap;
use std::io;
use std::path::Path;

use serde::Serialize;
use tracing::info;

use crate::cluster::ClusterOutcome;
use crate::config::{ClusterConfig, Id3Config};
use crate::error::{Error, Result};
use crate::kmeans::KMeans;
use crate::kmodes::KModes;
use crate::loader;
use crate::normalize::TextNormalizer;
use crate::table::Table;
use crate::tree::Prediction;
use crate::{Id3, TreeModel};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "algorithm", rename_all = "snake_case")]
pub enum Clustering {
    KMeans(ClusterOutcome<f64>),
    KModes(ClusterOutcome<String>),
}

impl Clustering {
    pub fn label(&self, row: usize) -> Option<&str> {
        match self {
            Clustering::KMeans(o) => o.label(row),
            Clustering::KModes(o) => o.label(row),
        }
    }

    pub fn converged(&self) -> bool {
        match self {
            Clustering::KMeans(o) => o.converged,
            Clustering::KModes(o) => o.converged,
        }
    }

    pub fn labelled_table(&self, table: &Table, column_name: &str) -> Result<Table> {
        match self {
            Clustering::KMeans(o) => o.labelled_table(table, column_name),
            Clustering::KModes(o) => o.labelled_table(table, column_name),
        }
    }
}

/// Each action replaces one slot, and only when it succeeds.
#[derive(Debug, Default)]
pub struct Session {
    table: Option<Table>,
    model: Option<TreeModel>,
    clustering: Option<Clustering>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn table(&self) -> Option<&Table> {
        self.table.as_ref()
    }

    pub fn model(&self) -> Option<&TreeModel> {
        self.model.as_ref()
    }

    pub fn clustering(&self) -> Option<&Clustering> {
        self.clustering.as_ref()
    }

    /// Installs a new table. Results computed from the old one are dropped.
    pub fn load_table(&mut self, table: Table) -> &Table {
        info!(
            "Session table replaced: {} rows, {} columns",
            table.num_rows(),
            table.num_columns()
        );
        self.model = None;
        self.clustering = None;
        self.table.insert(table)
    }

    pub fn load_csv<R: io::Read>(&mut self, reader: R) -> Result<&Table> {
        let table = loader::read_csv(reader)?;
        Ok(self.load_table(table))
    }

    pub fn load_csv_path(&mut self, path: impl AsRef<Path>) -> Result<&Table> {
        let table = loader::read_csv_path(path)?;
        Ok(self.load_table(table))
    }

    /// Cleans categorical columns in place. Existing results are kept.
    pub fn normalize(&mut self, normalizer: &TextNormalizer, columns: &[String]) -> Result<&Table> {
        let table = normalizer.normalize_table(self.current_table()?, columns)?;
        Ok(self.table.insert(table))
    }

    pub fn build_tree(
        &mut self,
        target: &str,
        features: &[String],
        config: Id3Config,
    ) -> Result<&TreeModel> {
        let model = Id3::with_config(config)?.build(self.current_table()?, target, features)?;
        Ok(self.model.insert(model))
    }

    pub fn predict(&self, example: &HashMap<String, String>) -> Result<Prediction> {
        let model = self.model.as_ref().ok_or(Error::NoModel)?;
        Ok(model.predict(example))
    }

    pub fn run_kmeans(
        &mut self,
        features: &[String],
        config: ClusterConfig,
    ) -> Result<&Clustering> {
        let outcome = KMeans::new(config)?.run(self.current_table()?, features)?;
        Ok(self.clustering.insert(Clustering::KMeans(outcome)))
    }

    pub fn run_kmodes(
        &mut self,
        features: &[String],
        config: ClusterConfig,
    ) -> Result<&Clustering> {
        let outcome = KModes::new(config)?.run(self.current_table()?, features)?;
        Ok(self.clustering.insert(Clustering::KModes(outcome)))
    }

    /// Current table with the latest cluster labels and imputations applied.
    pub fn labelled_table(&self, column_name: &str) -> Result<Table> {
        let table = self.current_table()?;
        match &self.clustering {
            Some(clustering) => clustering.labelled_table(table, column_name),
            None => Ok(table.clone()),
        }
    }

    fn current_table(&self) -> Result<&Table> {
        self.table.as_ref().ok_or(Error::NoTable)
    }
}
