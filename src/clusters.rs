//! Grouping entries into duplicate clusters.
//!
//! # Overview
//!
//! Entries are bucketed by size in discovery order. Buckets with a single
//! entry are dropped without any I/O. Larger buckets are digested in
//! parallel up front (the digests are memoized on the entries, so the
//! comparisons that follow hit the cache) and then split into clusters by
//! comparing each remaining entry with the head of a new cluster.
//!
//! # Example
//!
//! ```no_run
//! use dupecmp::clusters::{find_clusters, ClusterOptions};
//! use dupecmp::compare::{CompareConfig, Comparator};
//! use dupecmp::entry::Entry;
//!
//! let entries = vec![Entry::new("/tmp/a", 12), Entry::new("/tmp/b", 12)];
//! let comparator = Comparator::new(&CompareConfig::default());
//! let (clusters, stats) = find_clusters(entries, &comparator, &ClusterOptions::default());
//!
//! println!("{} clusters from {} files", clusters.len(), stats.input_files);
//! ```

use std::collections::HashMap;

use crate::compare::{Comparator, Verdict};
use crate::digest::Digest;
use crate::entry::Entry;

/// Options for clustering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClusterOptions {
    /// Leave zero-length files out entirely.
    pub ignore_empty: bool,
    /// Threads used to digest same-size buckets.
    pub io_threads: usize,
}

impl Default for ClusterOptions {
    fn default() -> Self {
        Self {
            ignore_empty: false,
            io_threads: 4,
        }
    }
}

impl ClusterOptions {
    /// Set whether empty files are ignored.
    #[must_use]
    pub fn with_ignore_empty(mut self, ignore: bool) -> Self {
        self.ignore_empty = ignore;
        self
    }

    /// Set the digest thread count (at least one).
    #[must_use]
    pub fn with_io_threads(mut self, threads: usize) -> Self {
        self.io_threads = threads.max(1);
        self
    }
}

/// A set of two or more files with identical content.
#[derive(Debug, Clone)]
pub struct Cluster {
    /// Size in bytes shared by every file
    pub size: u64,
    /// Digest of the cluster's first file
    pub digest: Option<Digest>,
    /// Files in discovery order
    pub entries: Vec<Entry>,
}

impl Cluster {
    /// Number of files in the cluster.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cluster holds no files.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Bytes that would be freed by keeping a single copy.
    #[must_use]
    pub fn reclaimable(&self) -> u64 {
        self.size * self.entries.len().saturating_sub(1) as u64
    }
}

/// Statistics from a clustering run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClusterStats {
    /// Entries handed in
    pub input_files: usize,
    /// Empty files skipped because of `ignore_empty`
    pub ignored_empty: usize,
    /// Size buckets holding two or more entries
    pub candidate_buckets: usize,
    /// Pairwise comparisons made
    pub comparisons: usize,
    /// Comparisons rejected by digest
    pub digest_mismatches: usize,
    /// Comparisons rejected by byte comparison
    pub content_mismatches: usize,
    /// Entries that could not be read
    pub unreadable_files: usize,
    /// Clusters found
    pub clusters: usize,
    /// Files that are copies of another file (cluster size minus one, summed)
    pub duplicate_files: usize,
}

impl ClusterStats {
    fn record(&mut self, verdict: Verdict) {
        self.comparisons += 1;
        match verdict {
            Verdict::DigestMismatch => self.digest_mismatches += 1,
            Verdict::ContentMismatch => self.content_mismatches += 1,
            Verdict::Duplicate | Verdict::SizeMismatch | Verdict::Unreadable => {}
        }
    }
}

/// Bucket entries by size, keeping the order in which sizes first appear.
#[must_use]
pub fn group_by_size(entries: Vec<Entry>) -> Vec<(u64, Vec<Entry>)> {
    let mut index: HashMap<u64, usize> = HashMap::new();
    let mut buckets: Vec<(u64, Vec<Entry>)> = Vec::new();

    for entry in entries {
        let slot = *index.entry(entry.size()).or_insert_with(|| {
            buckets.push((entry.size(), Vec::new()));
            buckets.len() - 1
        });
        buckets[slot].1.push(entry);
    }

    buckets
}

/// Find every cluster of duplicates among `entries`.
///
/// Entries not belonging to any cluster are dropped. Unreadable entries are
/// counted and otherwise ignored.
#[must_use]
pub fn find_clusters(
    entries: Vec<Entry>,
    comparator: &Comparator,
    options: &ClusterOptions,
) -> (Vec<Cluster>, ClusterStats) {
    let mut stats = ClusterStats {
        input_files: entries.len(),
        ..Default::default()
    };

    let entries: Vec<Entry> = if options.ignore_empty {
        entries
            .into_iter()
            .filter(|entry| {
                let keep = entry.size() > 0;
                if !keep {
                    stats.ignored_empty += 1;
                }
                keep
            })
            .collect()
    } else {
        entries
    };

    let buckets: Vec<(u64, Vec<Entry>)> = group_by_size(entries)
        .into_iter()
        .filter(|(_, bucket)| bucket.len() >= 2)
        .collect();
    stats.candidate_buckets = buckets.len();
    let has_work = !buckets.is_empty();

    let mut clusters = Vec::new();
    let run = || {
        for (size, mut bucket) in buckets {
            log::debug!("Comparing {} files of {} bytes", bucket.len(), size);

            comparator.digester().digest_all(&mut bucket);
            stats.unreadable_files += bucket.iter().filter(|e| e.is_invalid()).count();

            split_bucket(bucket, size, comparator, &mut stats, &mut clusters);
        }
    };

    // One pool serves every bucket.
    if has_work {
        match digest_pool(options.io_threads) {
            Some(pool) => pool.install(run),
            None => run(),
        }
    }

    stats.clusters = clusters.len();
    stats.duplicate_files = clusters.iter().map(|c| c.len() - 1).sum();
    log::info!(
        "Found {} clusters ({} duplicate files) in {} files",
        stats.clusters,
        stats.duplicate_files,
        stats.input_files
    );

    (clusters, stats)
}

/// Bounded pool for the digest phase, or `None` to use the global pool.
fn digest_pool(threads: usize) -> Option<rayon::ThreadPool> {
    let threads = threads.max(1);
    match rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .thread_name(|i| format!("dupecmp-digest-{}", i))
        .build()
    {
        Ok(pool) => Some(pool),
        Err(e) => {
            log::warn!(
                "Failed to create digest thread pool, using global pool with {} threads: {}",
                rayon::current_num_threads(),
                e
            );
            None
        }
    }
}

fn split_bucket(
    bucket: Vec<Entry>,
    size: u64,
    comparator: &Comparator,
    stats: &mut ClusterStats,
    clusters: &mut Vec<Cluster>,
) {
    let mut pending: Vec<Entry> = bucket.into_iter().filter(|e| !e.is_invalid()).collect();

    while !pending.is_empty() {
        let mut head = pending.remove(0);
        let mut members = Vec::new();
        let mut rest = Vec::with_capacity(pending.len());

        for mut candidate in pending.drain(..) {
            let verdict = comparator.compare(&mut head, &mut candidate);
            stats.record(verdict);
            if verdict.is_duplicate() {
                members.push(candidate);
            } else {
                rest.push(candidate);
            }
        }
        pending = rest;

        if !members.is_empty() {
            let digest = head.digest().copied();
            let mut entries = Vec::with_capacity(members.len() + 1);
            entries.push(head);
            entries.extend(members);
            log::trace!("Cluster of {} files, {} bytes each", entries.len(), size);
            clusters.push(Cluster {
                size,
                digest,
                entries,
            });
        }
    }
}
