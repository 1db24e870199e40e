//! Integration tests for the pipeline module.
//!
//! These tests run complete orphan finding passes over scratch trees:
//! - Direct, timestamp and size matches
//! - Orphans and same-name files that match nothing
//! - Ignore rules, album collisions and identity modes

use assert_fs::prelude::*;
use assert_fs::TempDir;
use filetime::{set_file_mtime, FileTime};
use orphan_finder::core::classifier::DuplicateReason;
use orphan_finder::core::config::RunConfig;
use orphan_finder::core::identity::{IdentityMode, DEFAULT_HASH_CEILING};
use orphan_finder::core::pipeline::{Pipeline, RunReport};
use orphan_finder::core::similarity::SimilarityRule;
use predicates::prelude::*;
use std::path::Path;

/// `incoming/`, `albums/` and `out/` under one temp dir
fn workspace() -> TempDir {
    let temp = TempDir::new().unwrap();
    temp.child("incoming").create_dir_all().unwrap();
    temp.child("albums").create_dir_all().unwrap();
    temp
}

fn config(temp: &TempDir) -> RunConfig {
    RunConfig {
        source: temp.child("incoming").path().to_path_buf(),
        albums: vec![temp.child("albums").path().to_path_buf()],
        output: temp.child("out").path().to_path_buf(),
        workers: 2,
        ..Default::default()
    }
}

fn run(config: RunConfig) -> RunReport {
    Pipeline::builder(config).build().unwrap().run().unwrap()
}

fn pin_mtime(path: &Path, secs: i64) {
    set_file_mtime(path, FileTime::from_unix_time(secs, 0)).unwrap();
}

#[test]
fn same_name_with_equal_timestamps_is_duplicate() {
    let temp = workspace();
    let album = temp.child("albums/2019 Summer/IMG_01.jpg");
    let scan = temp.child("incoming/img_01.jpg");
    album.write_binary(&vec![0u8; 500_000]).unwrap();
    scan.write_binary(&vec![1u8; 520_000]).unwrap();
    pin_mtime(album.path(), 1_560_000_000);
    pin_mtime(scan.path(), 1_560_000_000);

    let report = run(config(&temp));

    assert_eq!(report.classification.duplicates.len(), 1);
    assert_eq!(
        report.classification.duplicates[0].reason,
        DuplicateReason::Similar {
            album: album.path().to_path_buf(),
            rule: SimilarityRule::Timestamp,
        }
    );
    temp.child("out").assert(predicate::path::missing());
}

#[test]
fn same_name_with_close_size_is_duplicate() {
    let temp = workspace();
    let album = temp.child("albums/IMG_02.jpg");
    let scan = temp.child("incoming/IMG_02.jpg");
    album.write_binary(&vec![0u8; 10_000]).unwrap();
    scan.write_binary(&vec![1u8; 12_000]).unwrap();
    pin_mtime(album.path(), 1_000_000_000);
    pin_mtime(scan.path(), 1_500_000_000);

    let report = run(config(&temp));

    assert!(matches!(
        report.classification.duplicates[0].reason,
        DuplicateReason::Similar {
            rule: SimilarityRule::Size,
            ..
        }
    ));
}

#[test]
fn unknown_file_is_copied_as_orphan() {
    let temp = workspace();
    temp.child("albums/a.jpg").write_str("album").unwrap();
    let orphan = temp.child("incoming/holiday.jpg");
    orphan.write_str("never seen").unwrap();
    pin_mtime(orphan.path(), 1_400_000_000);

    let report = run(config(&temp));

    assert_eq!(report.classification.orphans.len(), 1);
    let copied = temp.child("out/holiday.jpg");
    copied.assert("never seen");
    let mtime = FileTime::from_last_modification_time(&std::fs::metadata(copied.path()).unwrap());
    assert_eq!(mtime, FileTime::from_unix_time(1_400_000_000, 0));
    orphan.assert(predicate::path::exists());
}

#[test]
fn exact_copy_is_direct_duplicate_under_any_name() {
    let temp = workspace();
    temp.child("albums/deep/nested/original.png")
        .write_str("pixels")
        .unwrap();
    temp.child("incoming/renamed.png").write_str("pixels").unwrap();

    let report = run(config(&temp));

    assert_eq!(report.classification.duplicates.len(), 1);
    assert!(matches!(
        report.classification.duplicates[0].reason,
        DuplicateReason::TokenMatch { .. }
    ));
    assert_eq!(report.classification.orphans.len(), 0);
}

#[test]
fn same_name_that_matches_nothing_goes_to_review_folder() {
    let temp = workspace();
    let album = temp.child("albums/DSC_0001.jpg");
    let scan = temp.child("incoming/DSC_0001.jpg");
    album.write_binary(&vec![7u8; 1_000]).unwrap();
    scan.write_binary(&vec![8u8; 900_000]).unwrap();
    pin_mtime(album.path(), 1_000_000_000);
    pin_mtime(scan.path(), 1_700_000_000);

    let report = run(config(&temp));

    assert_eq!(report.classification.ambiguous.len(), 1);
    assert_eq!(
        report.classification.ambiguous[0].same_name,
        vec![album.path().to_path_buf()]
    );
    temp.child("out/same filename/DSC_0001.jpg")
        .assert(predicate::path::is_file());
    temp.child("out/DSC_0001.jpg").assert(predicate::path::missing());
}

#[test]
fn disabled_similarity_sends_close_files_to_review() {
    let temp = workspace();
    temp.child("albums/IMG_03.jpg").write_binary(&[1; 100]).unwrap();
    temp.child("incoming/IMG_03.jpg").write_binary(&[2; 100]).unwrap();

    let report = run(RunConfig {
        check_similar: false,
        ..config(&temp)
    });

    assert_eq!(report.classification.ambiguous.len(), 1);
    assert_eq!(report.classification.duplicates.len(), 0);
}

#[test]
fn ignored_files_never_reach_any_bucket() {
    let temp = workspace();
    temp.child("albums/Thumbs.db").write_str("cache").unwrap();
    temp.child("incoming/Thumbs.db").write_str("other cache").unwrap();
    temp.child("incoming/desktop.ini").write_str("[x]").unwrap();
    temp.child("incoming/link.URL").write_str("[InternetShortcut]").unwrap();
    temp.child("incoming/kept.jpg").write_str("kept").unwrap();

    let report = run(config(&temp));

    assert_eq!(report.album_files, 0);
    assert_eq!(report.scan_files, 1);
    assert_eq!(report.classification.classified(), 1);
    temp.child("out/Thumbs.db").assert(predicate::path::missing());
    temp.child("out/link.URL").assert(predicate::path::missing());
    temp.child("out/kept.jpg").assert(predicate::path::exists());
}

#[test]
fn source_subdirectories_are_not_scanned() {
    let temp = workspace();
    temp.child("incoming/top.jpg").write_str("top").unwrap();
    temp.child("incoming/sub/nested.jpg")
        .write_str("nested")
        .unwrap();

    let report = run(config(&temp));

    assert_eq!(report.scan_files, 1);
    temp.child("out/nested.jpg").assert(predicate::path::missing());
}

#[test]
fn identical_album_files_keep_first_path() {
    let temp = workspace();
    temp.child("albums/a/x.jpg").write_str("same").unwrap();
    temp.child("albums/b/x.jpg").write_str("same").unwrap();
    temp.child("incoming/x.jpg").write_str("same").unwrap();

    let report = run(config(&temp));

    assert_eq!(report.album_files, 2);
    assert_eq!(report.unique_album_files, 1);
    assert_eq!(report.collisions.len(), 1);
    assert!(report.collisions[0].kept.ends_with("a/x.jpg"));
    assert!(report.collisions[0].skipped.ends_with("b/x.jpg"));
    assert_eq!(
        report.classification.duplicates[0].reason.album_path(),
        &report.collisions[0].kept
    );
}

#[test]
fn bytes_past_the_ceiling_only_matter_in_full_mode() {
    let temp = workspace();
    let size = DEFAULT_HASH_CEILING as usize + 50_000;
    let mut album_bytes = vec![3u8; size];
    let mut scan_bytes = album_bytes.clone();
    album_bytes[size - 1] = 4;
    scan_bytes[size - 1] = 5;
    temp.child("albums/master.raw").write_binary(&album_bytes).unwrap();
    temp.child("incoming/export.raw").write_binary(&scan_bytes).unwrap();

    let bounded = run(config(&temp));
    assert_eq!(bounded.classification.duplicates.len(), 1);
    assert_eq!(bounded.classification.orphans.len(), 0);

    let full = run(RunConfig {
        mode: IdentityMode::Full,
        ..config(&temp)
    });
    assert_eq!(full.classification.duplicates.len(), 0);
    assert_eq!(full.classification.orphans.len(), 1);
}

#[test]
fn every_scan_file_lands_in_exactly_one_bucket() {
    let temp = workspace();
    temp.child("albums/one.jpg").write_str("one").unwrap();
    temp.child("albums/two.jpg").write_binary(&[2; 10]).unwrap();
    temp.child("albums/three.jpg").write_binary(&[3; 10]).unwrap();
    temp.child("incoming/one-copy.jpg").write_str("one").unwrap();
    temp.child("incoming/two.jpg").write_binary(&[9; 20]).unwrap();
    temp.child("incoming/three.jpg")
        .write_binary(&vec![8; 800_000])
        .unwrap();
    temp.child("incoming/four.jpg").write_str("four").unwrap();
    temp.child("incoming/five.mov").write_str("five").unwrap();
    pin_mtime(temp.child("albums/three.jpg").path(), 1_000_000_000);
    pin_mtime(temp.child("incoming/three.jpg").path(), 1_100_000_000);

    let report = run(config(&temp));
    let classification = &report.classification;

    assert!(classification.skipped.is_empty());
    assert_eq!(classification.classified(), report.scan_files);
    assert_eq!(classification.duplicates.len(), 2);
    assert_eq!(classification.orphans.len(), 2);
    assert_eq!(classification.ambiguous.len(), 1);

    let summary = report.summary();
    assert_eq!(
        summary.duplicates + summary.orphans + summary.ambiguous,
        summary.scan_files
    );
}

#[test]
fn skip_existing_leaves_previous_output_alone() {
    let temp = workspace();
    temp.child("incoming/new.jpg").write_str("fresh").unwrap();
    temp.child("out/new.jpg").write_str("earlier run").unwrap();

    let report = run(RunConfig {
        existing: orphan_finder::core::copier::ExistingFilePolicy::Skip,
        ..config(&temp)
    });

    assert_eq!(report.copies.kept.len(), 1);
    temp.child("out/new.jpg").assert("earlier run");
}

#[test]
fn pipeline_rejects_missing_album_root() {
    let temp = workspace();
    let mut config = config(&temp);
    config.albums.push(temp.child("not-there").path().to_path_buf());

    let error = Pipeline::builder(config).build().err().unwrap();

    assert!(predicate::str::contains("Album root not found").eval(&error.to_string()));
}
