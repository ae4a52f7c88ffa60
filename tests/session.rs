//! End-to-end tests driving a session from CSV files.

use id3_lab::normalize::TextNormalizer;
use id3_lab::session::Clustering;
use id3_lab::{
    example, ClusterConfig, Error, Id3Config, Prediction, RowAssignment, Session,
    UnknownValuePolicy,
};
use pretty_assertions::assert_eq;
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

// ============================================================================
// Helper Functions
// ============================================================================

fn init_tracing() {
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_test_writer())
        .with(EnvFilter::new("id3_lab=debug"))
        .try_init();
}

fn fixtures_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn load(filename: &str) -> Session {
    let mut session = Session::new();
    session
        .load_csv_path(fixtures_path().join(filename))
        .expect("Failed to read CSV file");
    session
}

fn names(names: &[&str]) -> Vec<String> {
    names.iter().map(|n| n.to_string()).collect()
}

// ============================================================================
// Decision Tree
// ============================================================================

#[test]
fn test_play_tennis_from_csv() {
    init_tracing();
    let mut session = load("play_tennis.csv");
    let features = names(&["Outlook", "Temperature", "Humidity", "Wind"]);
    let model = session
        .build_tree("Play", &features, Id3Config::default())
        .unwrap();

    assert_eq!(model.tree.root.num_children(), 3);
    assert_eq!(model.rules.len(), 5);
    assert_eq!(
        model.rules.rules[2].to_string(),
        "If Outlook = Overcast, then Category = Yes"
    );

    let dot = model.tree.to_dot();
    assert!(dot.starts_with("digraph"));
    assert!(dot.contains("Start"));
    assert!(dot.contains("Category: No"));

    let json = serde_json::to_value(&model.tree).unwrap();
    assert_eq!(json["root"]["attribute"], "Outlook");

    let sunny = example([("Outlook", "Sunny"), ("Humidity", "Normal")]);
    assert_eq!(session.predict(&sunny).unwrap(), Prediction::Class("Yes".to_string()));
}

#[test]
fn test_unknown_outlook_uses_the_deepest_branch() {
    let mut session = load("play_tennis.csv");
    session
        .build_tree("Play", &names(&["Outlook", "Humidity", "Wind"]), Id3Config::default())
        .unwrap();
    // Sunny and Rain both split again; Sunny comes first.
    let prediction = session
        .predict(&example([("Outlook", "?"), ("Humidity", "High")]))
        .unwrap();
    assert_eq!(prediction, Prediction::Class("No".to_string()));
}

#[test]
fn test_explicit_branch_on_incomplete_data() {
    let mut session = load("teachers.csv");
    let config = Id3Config::default().unknown_policy(UnknownValuePolicy::ExplicitBranch);
    let model = session
        .build_tree("Clase", &names(&["Categoria"]), config)
        .unwrap();
    // Three rows per class at the root, so the first class seen wins.
    assert_eq!(model.tree.root.branch("?"), Some(&id3_lab::Node::leaf("1")));
    let asociado = session.predict(&example([("Categoria", "Asociado")])).unwrap();
    assert_eq!(asociado, Prediction::Class("2".to_string()));
    let unknown = session.predict(&example([("Categoria", "?")])).unwrap();
    assert_eq!(unknown, Prediction::Class("1".to_string()));
}

// ============================================================================
// Clustering
// ============================================================================

#[test]
fn test_kmeans_imputes_missing_hours() {
    init_tracing();
    let mut session = load("teachers.csv");
    let clustering = session
        .run_kmeans(
            &names(&["Edad", "Horas"]),
            ClusterConfig::default().class_seeded("Clase"),
        )
        .unwrap();
    let Clustering::KMeans(outcome) = clustering else {
        panic!("expected a k-means outcome");
    };
    assert!(outcome.converged);
    assert_eq!(outcome.iterations, 1);
    assert_eq!(outcome.labels, vec!["1", "2"]);
    assert_eq!(outcome.assignments[2], RowAssignment::Imputed(0));

    let table = session.labelled_table("Cluster").unwrap();
    assert_eq!(table.column("Horas").unwrap().number(2), Some(21.0));
    assert_eq!(table.column("Cluster").unwrap().category(5), Some("2"));
}

#[test]
fn test_kmodes_after_normalization() {
    let mut session = load("teachers.csv");
    let columns = names(&["Nivel", "Categoria"]);
    session.normalize(&TextNormalizer::new(), &columns).unwrap();

    let nivel = session.table().unwrap().column("Nivel").unwrap();
    assert_eq!(nivel.category(0), Some("magister"));
    assert_eq!(nivel.category(2), Some("magister"));

    let clustering = session
        .run_kmodes(&columns, ClusterConfig::default().class_seeded("Clase"))
        .unwrap();
    let Clustering::KModes(outcome) = clustering else {
        panic!("expected a k-modes outcome");
    };
    assert!(outcome.converged);
    assert_eq!(
        outcome.centres,
        vec![names(&["magister", "titular"]), names(&["doctorado", "asociado"])]
    );
    assert_eq!(outcome.imputed.len(), 1);
    assert_eq!(outcome.imputed[0].row, 5);
    assert_eq!(outcome.imputed[0].values, names(&["doctorado", "asociado"]));
}

#[test]
fn test_wrong_column_kind_leaves_session_untouched() {
    let mut session = load("teachers.csv");
    let err = session
        .run_kmeans(&names(&["Nivel"]), ClusterConfig::default())
        .unwrap_err();
    assert!(matches!(err, Error::ColumnKind { .. }));
    assert_eq!(err.error_code(), "COLUMN_KIND");
    assert!(session.clustering().is_none());
}
