//! Configuration loading tests.

use postsim_core::{
    config::{PostsimConfig, CONFIG_FILE_NAME, DEFAULT_DATAPOINTS},
    error::PostsimError,
};
use std::fs;
use tempfile::tempdir;

#[test]
fn defaults_match_the_simulation_layout() {
    let config = PostsimConfig::default();
    assert_eq!(config.output_prefix, "output");
    assert_eq!(config.input_prefix, "input");
    assert_eq!(config.population_file, "population.csv");
    assert_eq!(config.store_file, "inputs.db");
    assert_eq!(config.stats_file_name("4"), "general_stats4.csv");
    assert_eq!(config.table_name, "organized_outputs.csv");
    assert_eq!(config.datapoints.len(), DEFAULT_DATAPOINTS.len());
}

#[test]
fn partial_file_keeps_remaining_defaults() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("custom.json");
    fs::write(
        &path,
        r#"{ "table_name": "summary.csv", "datapoints": ["number of SVR cases"] }"#,
    )
    .unwrap();

    let config = PostsimConfig::load(&path).unwrap();
    assert_eq!(config.table_name, "summary.csv");
    assert_eq!(config.datapoints, vec!["number of SVR cases".to_string()]);
    assert_eq!(config.output_prefix, "output");
}

#[test]
fn empty_output_prefix_is_rejected() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("custom.json");
    fs::write(&path, r#"{ "output_prefix": "" }"#).unwrap();
    assert!(PostsimConfig::load(&path).is_err());
}

#[test]
fn load_or_default_uses_root_file_when_present() {
    let dir = tempdir().unwrap();
    assert_eq!(
        PostsimConfig::load_or_default(dir.path()).unwrap(),
        PostsimConfig::default()
    );

    fs::write(
        dir.path().join(CONFIG_FILE_NAME),
        r#"{ "output_prefix": "run" }"#,
    )
    .unwrap();
    let config = PostsimConfig::load_or_default(dir.path()).unwrap();
    assert_eq!(config.output_prefix, "run");
}

#[test]
fn malformed_file_is_an_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("custom.json");
    fs::write(&path, "{ not json").unwrap();
    assert!(PostsimConfig::load(&path).is_err());
}

#[test]
fn load_errors_are_classified() {
    let dir = tempdir().unwrap();

    let malformed = dir.path().join("malformed.json");
    fs::write(&malformed, "{ not json").unwrap();
    assert!(matches!(
        PostsimConfig::load(&malformed),
        Err(PostsimError::Serialization(_))
    ));

    let empty_prefix = dir.path().join("empty.json");
    fs::write(&empty_prefix, r#"{ "output_prefix": "" }"#).unwrap();
    match PostsimConfig::load(&empty_prefix) {
        Err(PostsimError::Other(e)) => assert!(e.to_string().contains("output_prefix")),
        other => panic!("expected Other, got {other:?}"),
    }

    assert!(matches!(
        PostsimConfig::load(&dir.path().join("absent.json")),
        Err(PostsimError::Other(_))
    ));
}
