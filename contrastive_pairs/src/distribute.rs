use log::{error, info};
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;

use crate::adapter::{Adapter, ShardReport};
use crate::error::ConvertError;
use crate::progress::Progress;

/// Deal items out one at a time: item `i` goes to shard `i % n`.
pub fn split_round_robin(items: &[PathBuf], n: usize) -> Vec<Vec<PathBuf>> {
    let n = n.max(1);
    let mut shards = vec![Vec::new(); n];
    for (i, item) in items.iter().enumerate() {
        shards[i % n].push(item.clone());
    }
    shards
}

/// Contiguous chunks of `len / n` items; the last shard also takes the
/// remainder.
pub fn split_chunks(items: &[PathBuf], n: usize) -> Vec<Vec<PathBuf>> {
    let n = n.max(1);
    let per = items.len() / n;
    (0..n)
        .map(|i| {
            let start = per * i;
            let end = if i + 1 == n { items.len() } else { per * (i + 1) };
            items[start..end].to_vec()
        })
        .collect()
}

#[derive(Debug, Default)]
pub struct RunReport {
    pub shards: Vec<ShardReport>,
    /// Workers that panicked instead of returning a report.
    pub panicked: Vec<ConvertError>,
}

impl RunReport {
    pub fn files_completed(&self) -> usize {
        self.shards.iter().map(|s| s.files_completed).sum()
    }

    pub fn pairs_written(&self) -> usize {
        self.shards.iter().map(|s| s.pairs_written).sum()
    }

    pub fn pairs_skipped(&self) -> usize {
        self.shards.iter().map(|s| s.pairs_skipped).sum()
    }

    pub fn failed(&self) -> impl Iterator<Item = &(PathBuf, String)> {
        self.shards.iter().flat_map(|s| s.failed.iter())
    }

    pub fn aborted(&self) -> impl Iterator<Item = &ConvertError> {
        self.shards
            .iter()
            .filter_map(|s| s.aborted.as_ref())
            .chain(self.panicked.iter())
    }

    pub fn is_clean(&self) -> bool {
        self.aborted().next().is_none()
    }
}

/// Run one adapter per shard on its own thread and wait for all of them.
/// Workers share nothing but the progress counter.
pub fn run_sharded(adapter: Arc<Adapter>, shards: Vec<Vec<PathBuf>>, progress: Arc<Progress>) -> RunReport {
    for (i, shard) in shards.iter().enumerate() {
        info!("[{}] Thread {}: {} files", adapter.dataset(), i, shard.len());
    }
    let mut handles = Vec::with_capacity(shards.len());
    for shard in shards {
        let adapter_c = adapter.clone();
        let progress_c = progress.clone();
        let handle = thread::spawn(move || adapter_c.run_shard(&shard, Some(&progress_c)));
        handles.push(handle);
    }
    let mut report = RunReport::default();
    for (i, h) in handles.into_iter().enumerate() {
        match h.join() {
            Ok(shard_report) => report.shards.push(shard_report),
            Err(_) => {
                error!("[{}] worker {} panicked", adapter.dataset(), i);
                report.panicked.push(ConvertError::WorkerPanicked(i));
            }
        }
    }
    report
}
