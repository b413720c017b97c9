// ── Progress monitor ──
//
// Polls on a fixed interval: note whether every worker has exited, drain
// whatever results are queued, publish progress. Once the workers are
// gone it does a final drain, accounts for sites that never reported
// (a panicked worker), sorts the rows and marks the batch complete.

use std::collections::{BTreeMap, HashSet};

use tokio::sync::mpsc::UnboundedReceiver;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};

use super::{BatchHandle, BatchReport, BatchState, Progress, SiteResult};
use crate::model::{MetricSeries, ReportRow};

/// Message recorded on rows of sites whose worker died before reporting.
pub(crate) const WORKER_LOST: &str = "worker terminated before reporting this site";

#[derive(Default)]
struct Collected {
    rows: Vec<ReportRow>,
    series: BTreeMap<usize, Vec<MetricSeries>>,
    failed: usize,
}

impl Collected {
    /// Move every queued result into the collection. Returns how many moved.
    fn drain(&mut self, rx: &mut UnboundedReceiver<SiteResult>) -> usize {
        let mut drained = 0;
        while let Ok(result) = rx.try_recv() {
            if result.row.is_failure() {
                self.failed += 1;
            }
            if !result.series.is_empty() {
                self.series.insert(result.row.index, result.series);
            }
            self.rows.push(result.row);
            drained += 1;
        }
        drained
    }

    fn publish(&self, progress: &watch::Sender<Progress>, state: BatchState) {
        progress.send_modify(|p| {
            p.completed = self.rows.len();
            p.failed = self.failed;
            p.state = state;
        });
    }
}

pub(super) async fn run(handle: BatchHandle) -> BatchReport {
    let BatchHandle {
        workers,
        mut rx,
        sites,
        columns,
        progress,
        poll_interval,
        started,
    } = handle;

    let mut collected = Collected::default();
    let mut ticker = tokio::time::interval(poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        // Sample before draining: anything a finished worker sent is
        // already in the channel.
        let finished = workers.iter().all(tokio::task::JoinHandle::is_finished);
        if collected.drain(&mut rx) > 0 {
            collected.publish(&progress, BatchState::Running);
        }
        if finished {
            break;
        }
    }

    collected.publish(&progress, BatchState::Draining);
    for (worker, handle) in workers.into_iter().enumerate() {
        if let Err(e) = handle.await {
            error!(worker, error = %e, "worker task did not complete");
        }
    }
    collected.drain(&mut rx);

    let reported: HashSet<usize> = collected.rows.iter().map(|r| r.index).collect();
    for (index, site) in sites.into_iter().enumerate() {
        if !reported.contains(&index) {
            warn!(index, site = %site.name, "no result received, recording empty row");
            collected
                .rows
                .push(ReportRow::failed(index, site, &columns, WORKER_LOST));
            collected.failed += 1;
        }
    }
    collected.rows.sort_by_key(|r| r.index);
    collected.publish(&progress, BatchState::Complete);

    let elapsed = started.elapsed();
    info!(
        sites = collected.rows.len(),
        failed = collected.failed,
        elapsed_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
        "batch complete"
    );

    BatchReport {
        rows: collected.rows,
        series: collected.series,
        elapsed,
    }
}
