use dupecmp::clusters::{find_clusters, ClusterOptions};
use dupecmp::compare::{CompareConfig, Comparator};
use dupecmp::entry::Entry;
use dupecmp::warnings::{CollectedWarnings, WarningSink};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::thread::{self, ThreadId};
use tempfile::tempdir;

fn entry(path: &Path, content: &[u8]) -> Entry {
    fs::write(path, content).unwrap();
    Entry::new(path, content.len() as u64)
}

fn comparator(thorough: bool) -> (Comparator, Arc<CollectedWarnings>) {
    let sink = Arc::new(CollectedWarnings::new());
    let config = CompareConfig::default().with_thorough(thorough);
    (Comparator::with_warning_sink(&config, sink.clone()), sink)
}

#[test]
fn test_no_input_no_clusters() {
    let (comparator, _) = comparator(false);
    let (clusters, stats) = find_clusters(Vec::new(), &comparator, &ClusterOptions::default());
    assert!(clusters.is_empty());
    assert_eq!(stats.input_files, 0);
}

#[test]
fn test_clusters_keep_input_order() {
    let dir = tempdir().unwrap();
    let p = dir.path();
    let entries = vec![
        entry(&p.join("one"), b"alpha"),
        entry(&p.join("two"), b"bravo"),
        entry(&p.join("three"), b"alpha"),
        entry(&p.join("four"), b"bravo"),
        entry(&p.join("five"), b"charlie"),
        entry(&p.join("six"), b"alpha"),
    ];

    for thorough in [false, true] {
        let (comparator, sink) = comparator(thorough);
        let (clusters, stats) =
            find_clusters(entries.clone(), &comparator, &ClusterOptions::default());

        assert_eq!(clusters.len(), 2);
        let names: Vec<Vec<&str>> = clusters
            .iter()
            .map(|c| {
                c.entries
                    .iter()
                    .map(|e| e.path().file_name().unwrap().to_str().unwrap())
                    .collect()
            })
            .collect();
        assert_eq!(names, vec![vec!["one", "three", "six"], vec!["two", "four"]]);
        assert_eq!(stats.clusters, 2);
        assert_eq!(stats.duplicate_files, 3);
        assert!(sink.is_empty());
    }
}

#[test]
fn test_each_file_digested_once() {
    let dir = tempdir().unwrap();
    let entries: Vec<Entry> = (0..6)
        .map(|i| entry(&dir.path().join(format!("f{}", i)), &[b'a' + (i % 2) as u8; 64]))
        .collect();

    let (comparator, _) = comparator(false);
    let (clusters, _) = find_clusters(entries, &comparator, &ClusterOptions::default());

    assert_eq!(clusters.len(), 2);
    assert_eq!(comparator.digester().stats().files_opened, 6);
    assert_eq!(comparator.digester().stats().files_digested, 6);
}

#[test]
fn test_unique_sizes_never_opened() {
    let dir = tempdir().unwrap();
    let entries = vec![
        entry(&dir.path().join("a"), b"1"),
        entry(&dir.path().join("b"), b"22"),
        entry(&dir.path().join("c"), b"333"),
    ];

    let (comparator, _) = comparator(true);
    let (clusters, stats) = find_clusters(entries, &comparator, &ClusterOptions::default());

    assert!(clusters.is_empty());
    assert_eq!(stats.candidate_buckets, 0);
    assert_eq!(comparator.digester().stats().files_opened, 0);
}

#[test]
fn test_unreadable_member_warned_once_and_skipped() {
    let dir = tempdir().unwrap();
    let mut entries = vec![
        entry(&dir.path().join("a"), b"same"),
        entry(&dir.path().join("b"), b"same"),
    ];
    entries.push(Entry::new(dir.path().join("missing"), 4));

    let (comparator, sink) = comparator(false);
    let (clusters, stats) = find_clusters(entries, &comparator, &ClusterOptions::default());

    assert_eq!(clusters.len(), 1);
    assert_eq!(clusters[0].len(), 2);
    assert_eq!(stats.unreadable_files, 1);
    assert_eq!(sink.len(), 1);
    assert!(sink.messages()[0].contains("missing"));
}

#[test]
fn test_ignore_empty_files() {
    let dir = tempdir().unwrap();
    let entries = vec![
        entry(&dir.path().join("e1"), b""),
        entry(&dir.path().join("e2"), b""),
    ];

    let (comparator, _) = comparator(false);
    let (clusters, _) = find_clusters(entries.clone(), &comparator, &ClusterOptions::default());
    assert_eq!(clusters.len(), 1);

    let options = ClusterOptions::default().with_ignore_empty(true);
    let (clusters, stats) = find_clusters(entries, &comparator, &options);
    assert!(clusters.is_empty());
    assert_eq!(stats.ignored_empty, 2);
}

#[test]
fn test_cluster_reports_digest_and_reclaimable() {
    let dir = tempdir().unwrap();
    let entries = vec![
        entry(&dir.path().join("a"), b"0123456789"),
        entry(&dir.path().join("b"), b"0123456789"),
        entry(&dir.path().join("c"), b"0123456789"),
    ];

    let (comparator, _) = comparator(false);
    let (clusters, _) = find_clusters(entries, &comparator, &ClusterOptions::default());

    let cluster = &clusters[0];
    assert_eq!(cluster.size, 10);
    assert_eq!(cluster.reclaimable(), 20);
    assert_eq!(
        cluster.digest.unwrap(),
        comparator.digester().function().digest_bytes(b"0123456789")
    );
}

/// Records which threads emitted warnings.
#[derive(Default)]
struct ThreadTrackingSink {
    threads: Mutex<HashSet<ThreadId>>,
    count: Mutex<usize>,
}

impl WarningSink for ThreadTrackingSink {
    fn warn(&self, _message: &str) {
        self.threads.lock().unwrap().insert(thread::current().id());
        *self.count.lock().unwrap() += 1;
    }
}

#[test]
fn test_digest_threads_shared_across_buckets() {
    let dir = tempdir().unwrap();
    // 40 two-file buckets of unreadable files: every digest attempt warns
    // from the thread that ran it.
    let entries: Vec<Entry> = (0..40u64)
        .flat_map(|i| {
            let root = dir.path().to_path_buf();
            (0..2).map(move |j| Entry::new(root.join(format!("missing-{}-{}", i, j)), i + 1))
        })
        .collect();

    let sink = Arc::new(ThreadTrackingSink::default());
    let comparator = Comparator::with_warning_sink(&CompareConfig::default(), sink.clone());
    let options = ClusterOptions::default().with_io_threads(2);
    let (clusters, stats) = find_clusters(entries, &comparator, &options);

    assert!(clusters.is_empty());
    assert_eq!(stats.candidate_buckets, 40);
    assert_eq!(stats.unreadable_files, 80);
    assert_eq!(*sink.count.lock().unwrap(), 80);
    let threads = sink.threads.lock().unwrap().len();
    assert!(threads <= 2, "digest work ran on {} threads", threads);
}
