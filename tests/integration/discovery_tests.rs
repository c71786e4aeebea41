use dupecmp::clusters::{find_clusters, ClusterOptions};
use dupecmp::compare::{CompareConfig, Comparator};
use dupecmp::discovery::{read_paths, Discovery, DiscoveryOptions};
use dupecmp::warnings::{CollectedWarnings, Warnings};
use std::fs;
use std::io::Cursor;
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::tempdir;

fn recursive() -> DiscoveryOptions {
    DiscoveryOptions {
        recursive: true,
        ..Default::default()
    }
}

#[test]
fn test_walk_order_is_sorted_by_name() {
    let dir = tempdir().unwrap();
    for name in ["c", "a", "b"] {
        fs::write(dir.path().join(name), name).unwrap();
    }

    let mut discovery = Discovery::new(recursive(), Warnings::to_log(true));
    discovery.add_path(dir.path());
    let (entries, stats) = discovery.finish();

    let names: Vec<_> = entries
        .iter()
        .map(|e| e.path().file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["a", "b", "c"]);
    assert_eq!(stats.files, 3);
}

#[test]
fn test_nested_duplicates_found_across_operands() {
    let first = tempdir().unwrap();
    let second = tempdir().unwrap();
    fs::create_dir_all(first.path().join("deep/er")).unwrap();
    fs::write(first.path().join("deep/er/copy.bin"), b"payload").unwrap();
    fs::write(second.path().join("copy.bin"), b"payload").unwrap();
    fs::write(second.path().join("other.bin"), b"PAYLOAD").unwrap();

    let sink = Arc::new(CollectedWarnings::new());
    let mut discovery = Discovery::new(recursive(), Warnings::new(sink.clone(), false));
    discovery.add_paths([first.path(), second.path()]);
    let (entries, _) = discovery.finish();
    assert_eq!(entries.len(), 3);

    let comparator = Comparator::with_warning_sink(&CompareConfig::default(), sink.clone());
    let (clusters, _) = find_clusters(entries, &comparator, &ClusterOptions::default());

    assert_eq!(clusters.len(), 1);
    assert_eq!(clusters[0].entries[0].path(), first.path().join("deep/er/copy.bin"));
    assert_eq!(clusters[0].entries[1].path(), second.path().join("copy.bin"));
    assert!(sink.is_empty());
}

#[test]
fn test_same_file_named_twice_is_a_duplicate_of_itself() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("twice");
    fs::write(&path, b"again").unwrap();

    let mut discovery = Discovery::new(DiscoveryOptions::default(), Warnings::to_log(true));
    discovery.add_paths([&path, &path]);
    let (entries, _) = discovery.finish();

    let comparator = Comparator::new(&CompareConfig::default());
    let (clusters, _) = find_clusters(entries, &comparator, &ClusterOptions::default());
    assert_eq!(clusters.len(), 1);

    let options = DiscoveryOptions {
        physical: true,
        ..Default::default()
    };
    let mut discovery = Discovery::new(options, Warnings::to_log(true));
    discovery.add_paths([&path, &path]);
    let (entries, _) = discovery.finish();
    assert_eq!(entries.len(), if cfg!(unix) { 1 } else { 2 });
}

#[test]
fn test_read_paths_from_stream() {
    let lines = read_paths(Cursor::new("one\n\ntwo/\r\nthree"), false).unwrap();
    assert_eq!(
        lines,
        vec![PathBuf::from("one"), PathBuf::from("two"), PathBuf::from("three")]
    );

    let records = read_paths(Cursor::new("with\nnewline\0plain\0"), true).unwrap();
    assert_eq!(
        records,
        vec![PathBuf::from("with\nnewline"), PathBuf::from("plain")]
    );
}
