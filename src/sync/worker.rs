//! Worker threads draining the sync queue.
//!
//! Each worker handles one bundle at a time; parallelism comes only from the
//! number of workers. Workers share nothing mutable besides the queue and the
//! report sink.

use std::io::Write;
use std::thread;

use crossbeam_channel::{Receiver, bounded};

use crate::config::Config;
use crate::git::Vcs;
use crate::report::ReportSink;
use crate::types::BundleDescriptor;

use super::{SyncSummary, sync_bundle};

/// Queued bundles not yet picked up by a worker.
const QUEUE_CAPACITY: usize = 9;

/// A single sync worker.
struct Worker<'a, V: Vcs, W: Write + Send> {
    receiver: Receiver<&'a BundleDescriptor>,
    config: &'a Config,
    vcs: &'a V,
    sink: &'a ReportSink<W>,
}

impl<V: Vcs, W: Write + Send> Worker<'_, V, W> {
    /// Run until the queue is closed and drained.
    fn run(self) -> SyncSummary {
        log::debug!("Worker started");
        let mut summary = SyncSummary::default();

        for bundle in self.receiver.iter() {
            let outcome = sync_bundle(bundle, self.config, self.vcs);
            if outcome.is_failure() {
                log::warn!("Sync failed for {}: {:?}", bundle, outcome);
            }
            self.sink.emit(&outcome.render(&bundle.url()));
            summary.record(&outcome);
        }

        log::debug!("Worker queue drained, exiting");
        summary
    }
}

/// Sync `bundles` on at most `config.max_parallel` threads and wait for all
/// of them to finish.
pub(super) fn run_pool<'a, V, W>(
    bundles: Vec<&'a BundleDescriptor>,
    config: &'a Config,
    vcs: &'a V,
    sink: &'a ReportSink<W>,
) -> SyncSummary
where
    V: Vcs,
    W: Write + Send,
{
    if bundles.is_empty() {
        return SyncSummary::default();
    }

    let workers = config.max_parallel.max(1).min(bundles.len());
    let (sender, receiver) = bounded(QUEUE_CAPACITY);

    thread::scope(|s| {
        let mut handles = Vec::with_capacity(workers);
        for id in 0..workers {
            let worker = Worker {
                receiver: receiver.clone(),
                config,
                vcs,
                sink,
            };
            match thread::Builder::new()
                .name(format!("vundle-worker-{}", id))
                .spawn_scoped(s, move || worker.run())
            {
                Ok(handle) => handles.push(handle),
                Err(e) => log::warn!("Failed to spawn sync worker {}: {}", id, e),
            }
        }
        drop(receiver);

        for bundle in bundles {
            if sender.send(bundle).is_err() {
                log::error!("No sync workers running, {} and later bundles skipped", bundle);
                break;
            }
        }
        drop(sender);

        let mut summary = SyncSummary::default();
        for handle in handles {
            match handle.join() {
                Ok(worker_summary) => summary.merge(worker_summary),
                Err(_) => log::error!("Sync worker panicked"),
            }
        }
        summary
    })
}
