//! Integration tests for loading run configuration from TOML files.

use orphan_finder::core::config::RunConfig;
use orphan_finder::core::identity::IdentityMode;
use orphan_finder::core::pipeline::Pipeline;
use orphan_finder::error::{ConfigError, OrphanFinderError};
use std::fs;
use tempfile::TempDir;

fn toml_path(value: &std::path::Path) -> String {
    value.display().to_string().replace('\\', "/")
}

#[test]
fn config_file_drives_a_full_run() {
    let temp = TempDir::new().unwrap();
    let source = temp.path().join("incoming");
    let albums = temp.path().join("albums");
    let output = temp.path().join("out");
    fs::create_dir_all(&source).unwrap();
    fs::create_dir_all(&albums).unwrap();
    fs::write(albums.join("kept.jpg"), b"kept").unwrap();
    fs::write(source.join("kept.jpg"), b"kept").unwrap();
    fs::write(source.join("notes.txt"), b"ignored by extension").unwrap();
    fs::write(source.join("new.jpg"), b"new").unwrap();

    let config_path = temp.path().join("orphans.toml");
    fs::write(
        &config_path,
        format!(
            r#"
source = "{}"
albums = ["{}"]
output = "{}"
mode = "full"
ignored_extensions = ["txt"]
workers = 1
"#,
            toml_path(&source),
            toml_path(&albums),
            toml_path(&output)
        ),
    )
    .unwrap();

    let config = RunConfig::load(&config_path).unwrap();
    assert_eq!(config.mode, IdentityMode::Full);

    let report = Pipeline::builder(config).build().unwrap().run().unwrap();

    assert_eq!(report.scan_files, 2);
    assert_eq!(report.classification.duplicates.len(), 1);
    assert_eq!(report.classification.orphans.len(), 1);
    assert!(output.join("new.jpg").exists());
    assert!(!output.join("notes.txt").exists());
}

#[test]
fn scalar_album_value_is_a_config_error() {
    let temp = TempDir::new().unwrap();
    let config_path = temp.path().join("bad.toml");
    fs::write(&config_path, "albums = \"/photos\"\n").unwrap();

    let error = RunConfig::load(&config_path).unwrap_err();

    assert!(matches!(error, ConfigError::Parse { .. }));
}

#[test]
fn zero_ceiling_in_bounded_mode_is_rejected_before_scanning() {
    let temp = TempDir::new().unwrap();
    let source = temp.path().join("incoming");
    let albums = temp.path().join("albums");
    fs::create_dir_all(&source).unwrap();
    fs::create_dir_all(&albums).unwrap();

    let config = RunConfig {
        source,
        albums: vec![albums],
        output: temp.path().join("out"),
        hash_ceiling: 0,
        ..Default::default()
    };

    let result = Pipeline::builder(config).build();

    assert!(matches!(
        result,
        Err(OrphanFinderError::Config(ConfigError::InvalidValue {
            field: "hash_ceiling",
            ..
        }))
    ));
    assert!(!temp.path().join("out").exists());
}
