//! Initial-cohort store tests.

mod common;

use postsim_core::{
    cohort_store::{read_initial_cohort, CohortStore, InitialCohortSummary},
    error::PostsimError,
};
use rusqlite::Connection;
use tempfile::tempdir;

#[test]
fn counts_acute_and_chronic_statuses_only() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("inputs.db");
    // 0 = none, 1 = acute, 2 = chronic
    common::write_store(
        &path,
        &[(0, Some(0)), (1, Some(1)), (2, Some(0)), (2, Some(1)), (0, Some(1))],
    );

    let summary = read_initial_cohort(&path).unwrap();
    assert_eq!(
        summary,
        InitialCohortSummary {
            initial_infections: 3,
            initial_identified: 3,
        }
    );
}

#[test]
fn missing_store_defaults_to_zero() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("input9").join("inputs.db");

    let summary = read_initial_cohort(&path).unwrap();
    assert_eq!(summary, InitialCohortSummary::default());
    assert!(!path.exists(), "reading must never create the store");
}

#[test]
fn open_reports_missing_store() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("inputs.db");

    match CohortStore::open(&path) {
        Err(PostsimError::MissingStore { path: p }) => assert_eq!(p, path),
        other => panic!("expected MissingStore, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn empty_cohort_sums_to_zero_not_null() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("inputs.db");
    common::write_store(&path, &[]);

    let store = CohortStore::open(&path).unwrap();
    assert_eq!(store.initial_infections().unwrap(), 0);
    assert_eq!(store.initial_identified().unwrap(), 0);
}

#[test]
fn null_identification_flags_contribute_nothing() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("inputs.db");
    common::write_store(&path, &[(1, None), (2, Some(1)), (0, None)]);

    let summary = read_initial_cohort(&path).unwrap();
    assert_eq!(summary.initial_infections, 2);
    assert_eq!(summary.initial_identified, 1);
}

#[test]
fn store_without_cohort_table_is_a_database_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("inputs.db");
    Connection::open(&path)
        .unwrap()
        .execute_batch("CREATE TABLE unrelated (x INTEGER);")
        .unwrap();

    let err = read_initial_cohort(&path).unwrap_err();
    assert!(
        matches!(err, PostsimError::Database(_)),
        "expected Database error, got {err}"
    );
}
