use itertools::Itertools;

use crate::cluster::{self, class_labels, validate_features, ClusterMetric, ClusterOutcome, Dataset};
use crate::config::ClusterConfig;
use crate::error::{Error, Result};
use crate::table::{Column, Table};

/// Straight-line distance; centres are coordinate-wise means.
#[derive(Debug, Clone, Copy, Default)]
pub struct Euclidean;

impl ClusterMetric for Euclidean {
    type Value = f64;

    fn distance(&self, row: &[f64], centre: &[f64]) -> f64 {
        row.iter()
            .zip(centre)
            .map(|(a, b)| (a - b) * (a - b))
            .sum::<f64>()
            .sqrt()
    }

    fn centre(&self, members: &[&[f64]]) -> Option<Vec<f64>> {
        let first = members.first()?;
        let n = members.len() as f64;
        Some(
            (0..first.len())
                .map(|f| members.iter().map(|m| m[f]).sum::<f64>() / n)
                .collect(),
        )
    }
}

/// k-means over numeric columns.
#[derive(Debug, Clone, Default)]
pub struct KMeans {
    config: ClusterConfig,
}

impl KMeans {
    pub fn new(config: ClusterConfig) -> Result<Self> {
        config.validate()?;
        Ok(KMeans { config })
    }

    pub fn config(&self) -> &ClusterConfig {
        &self.config
    }

    pub fn run(&self, table: &Table, features: &[String]) -> Result<ClusterOutcome<f64>> {
        if table.numeric_columns().is_empty() {
            return Err(Error::NoNumericColumns);
        }
        validate_features(table, features, Column::is_numeric, "numeric")?;
        let classes = class_labels(table, &self.config)?;

        let columns = features
            .iter()
            .map(|f| table.require(f))
            .collect::<Result<Vec<_>>>()?;
        let rows = (0..table.num_rows())
            .map(|row| columns.iter().map(|c| c.number(row)).collect_vec())
            .collect_vec();

        let data = Dataset::from_rows(features.to_vec(), rows, classes);
        cluster::run(&Euclidean, data, &self.config, table.num_rows())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::{assign, RowAssignment};

    fn names(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    fn line() -> Table {
        Table::new(vec![Column::from_f64s("x", &[1.0, 2.0, 3.0, 10.0, 11.0, 12.0])]).unwrap()
    }

    #[test]
    fn test_two_groups_converge_for_any_seed() {
        for seed in 0..10 {
            let kmeans = KMeans::new(ClusterConfig::default().random(2, seed)).unwrap();
            let outcome = kmeans.run(&line(), &names(&["x"])).unwrap();
            assert!(outcome.converged, "seed {}", seed);

            let mut centres = outcome.centres.iter().map(|c| c[0]).collect_vec();
            centres.sort_by(f64::total_cmp);
            assert_eq!(centres, vec![2.0, 11.0], "seed {}", seed);

            let clusters = outcome.assignments.iter().map(|a| a.cluster()).collect_vec();
            assert!(clusters[..3].iter().all(|c| *c == clusters[0]));
            assert!(clusters[3..].iter().all(|c| *c == clusters[3]));
            assert_ne!(clusters[0], clusters[3]);
        }
    }

    #[test]
    fn test_converged_assignment_is_a_fixed_point() {
        let kmeans = KMeans::new(ClusterConfig::default().random(2, 42)).unwrap();
        let outcome = kmeans.run(&line(), &names(&["x"])).unwrap();
        let rows = [1.0, 2.0, 3.0, 10.0, 11.0, 12.0].map(|x| vec![x]);
        let rows = rows.iter().map(Vec::as_slice).collect_vec();
        let (_, again) = assign(&Euclidean, &rows, &outcome.centres);
        let last = &outcome.snapshots.last().unwrap().assignments;
        assert_eq!(&again, last);
        assert!(outcome.iterations <= 20);
    }

    #[test]
    fn test_class_seeded_starts_from_class_means() {
        let table = line()
            .with_column(Column::from_strs("Clase", &["a", "a", "a", "b", "b", "b"]))
            .unwrap();
        let kmeans = KMeans::new(ClusterConfig::default().class_seeded("Clase")).unwrap();
        let outcome = kmeans.run(&table, &names(&["x"])).unwrap();
        assert_eq!(outcome.labels, vec!["a", "b"]);
        assert_eq!(outcome.snapshots[0].centres, vec![vec![2.0], vec![11.0]]);
        assert!(outcome.converged);
        assert_eq!(outcome.iterations, 1);
    }

    #[test]
    fn test_two_dimensional_distances() {
        let table = Table::new(vec![
            Column::from_f64s("x", &[0.0, 3.0]),
            Column::from_f64s("y", &[0.0, 4.0]),
        ])
        .unwrap();
        let kmeans = KMeans::new(ClusterConfig::default().random(1, 0)).unwrap();
        let outcome = kmeans.run(&table, &names(&["x", "y"])).unwrap();
        assert_eq!(outcome.centres, vec![vec![1.5, 2.0]]);
        let first = &outcome.snapshots[0];
        assert!(first.distances.iter().any(|d| (d[0] - 5.0).abs() < 1e-12));
    }

    #[test]
    fn test_missing_rows_are_imputed_from_their_class() {
        let table = Table::new(vec![
            Column::numeric("x", vec![Some(1.0), Some(3.0), Some(10.0), Some(12.0), None]),
            Column::numeric("y", vec![Some(0.0), Some(2.0), Some(5.0), Some(7.0), Some(6.0)]),
            Column::from_strs("Clase", &["lo", "lo", "hi", "hi", "hi"]),
        ])
        .unwrap();
        let kmeans = KMeans::new(ClusterConfig::default().class_seeded("Clase")).unwrap();
        let outcome = kmeans.run(&table, &names(&["x", "y"])).unwrap();
        assert_eq!(outcome.assignments[4], RowAssignment::Imputed(1));
        assert_eq!(outcome.imputed[0].values, vec![11.0, 6.0]);

        let labelled = outcome.labelled_table(&table, "Cluster").unwrap();
        assert_eq!(labelled.column("x").unwrap().number(4), Some(11.0));
        assert_eq!(labelled.column("y").unwrap().number(4), Some(6.0));
        assert_eq!(labelled.column("Cluster").unwrap().category(0), Some("lo"));
        assert_eq!(table.column("x").unwrap().number(4), None);
    }

    #[test]
    fn test_random_mode_leaves_incomplete_rows_unresolved() {
        let table = Table::new(vec![Column::numeric(
            "x",
            vec![Some(1.0), Some(2.0), None, Some(10.0)],
        )])
        .unwrap();
        let kmeans = KMeans::new(ClusterConfig::default().random(2, 5)).unwrap();
        let outcome = kmeans.run(&table, &names(&["x"])).unwrap();
        assert_eq!(outcome.assignments[2], RowAssignment::Unresolved);
        assert!(outcome.imputed.is_empty());
    }

    #[test]
    fn test_validation() {
        let text = Table::new(vec![Column::from_strs("c", &["a", "b"])]).unwrap();
        assert!(matches!(
            KMeans::default().run(&text, &names(&["c"])),
            Err(Error::NoNumericColumns)
        ));

        let mixed = line()
            .with_column(Column::from_strs("c", &["a", "a", "a", "b", "b", "b"]))
            .unwrap();
        assert!(matches!(
            KMeans::default().run(&mixed, &names(&["c"])),
            Err(Error::ColumnKind { .. })
        ));
        assert!(matches!(KMeans::default().run(&mixed, &[]), Err(Error::NoFeatures)));

        let seeded = KMeans::new(ClusterConfig::default().class_seeded("Clase")).unwrap();
        assert!(matches!(
            seeded.run(&mixed, &names(&["x"])),
            Err(Error::ClassColumnMissing(_))
        ));
    }
}
