// ── Batch scheduler ──
//
// Splits the site list into contiguous groups, one tokio task per group.
// Each task walks its sites strictly in order and sends one result per
// site over an unbounded channel; a failing site becomes a null row and
// the task moves on. The monitor (see `monitor.rs`) is the only consumer.

mod monitor;

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use strum::{Display, EnumString};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::collector::{MetricSource, collect_site};
use crate::config::ReportConfig;
use crate::model::{MetricSeries, MetricWindow, ReportRow, Site};

/// Tuning for one batch run.
#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// Upper bound on concurrent workers; capped by the site count.
    pub workers: usize,
    /// How often the monitor drains the result channel.
    pub poll_interval: Duration,
    /// Keep each site's series for charting.
    pub keep_series: bool,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            workers: 4,
            poll_interval: Duration::from_millis(100),
            keep_series: false,
        }
    }
}

/// Lifecycle of a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize)]
#[strum(serialize_all = "lowercase")]
pub enum BatchState {
    Idle,
    Running,
    /// Every worker has exited; the channel is being emptied.
    Draining,
    Complete,
}

/// Snapshot published by the monitor after every drain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Progress {
    pub completed: usize,
    pub failed: usize,
    pub total: usize,
    pub state: BatchState,
}

impl Progress {
    /// `completed / total`; an empty batch counts as done.
    #[allow(clippy::cast_precision_loss, clippy::as_conversions)]
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            self.completed as f64 / self.total as f64
        }
    }

    pub fn is_complete(&self) -> bool {
        self.state == BatchState::Complete
    }
}

/// Consolidated output of a finished batch.
#[derive(Debug, Clone)]
pub struct BatchReport {
    /// One row per input site, sorted by input index.
    pub rows: Vec<ReportRow>,
    /// Series per site index, when `keep_series` was set.
    pub series: BTreeMap<usize, Vec<MetricSeries>>,
    pub elapsed: Duration,
}

impl BatchReport {
    pub fn failed(&self) -> usize {
        self.rows.iter().filter(|r| r.is_failure()).count()
    }
}

/// One site's outcome, as sent by a worker.
#[derive(Debug)]
pub(crate) struct SiteResult {
    pub row: ReportRow,
    pub series: Vec<MetricSeries>,
}

/// Number of workers for `sites` sites: at most `requested`, at least one
/// when there is work.
pub fn worker_count(requested: usize, sites: usize) -> usize {
    requested.max(1).min(sites)
}

/// Split `items` into `groups` contiguous runs whose sizes differ by at
/// most one, larger runs first. Each item keeps its input index.
pub fn partition<T: Clone>(items: &[T], groups: usize) -> Vec<Vec<(usize, T)>> {
    if items.is_empty() || groups == 0 {
        return Vec::new();
    }
    let groups = groups.min(items.len());
    let base = items.len() / groups;
    let extra = items.len() % groups;

    let mut out = Vec::with_capacity(groups);
    let mut iter = items.iter().cloned().enumerate();
    for g in 0..groups {
        let size = base + usize::from(g < extra);
        out.push(iter.by_ref().take(size).collect());
    }
    out
}

/// A batch that has not started yet.
pub struct BatchJob<S> {
    sites: Vec<Site>,
    source: Arc<S>,
    window: Arc<MetricWindow>,
    report: Arc<ReportConfig>,
    config: BatchConfig,
    progress: watch::Sender<Progress>,
}

impl<S: MetricSource> BatchJob<S> {
    pub fn new(
        sites: Vec<Site>,
        source: Arc<S>,
        window: MetricWindow,
        report: ReportConfig,
        config: BatchConfig,
    ) -> Self {
        let (progress, _) = watch::channel(Progress {
            completed: 0,
            failed: 0,
            total: sites.len(),
            state: BatchState::Idle,
        });
        Self {
            sites,
            source,
            window: Arc::new(window),
            report: Arc::new(report),
            config,
            progress,
        }
    }

    /// Progress updates for this batch, from `Idle` to `Complete`.
    pub fn subscribe(&self) -> watch::Receiver<Progress> {
        self.progress.subscribe()
    }

    /// Dispatch the workers. Must be called from within a tokio runtime.
    pub fn start(self) -> BatchHandle {
        let total = self.sites.len();
        let workers = worker_count(self.config.workers, total);
        let columns: Arc<[String]> = self.report.columns().into();
        let (tx, rx) = mpsc::unbounded_channel();

        info!(sites = total, workers, "starting batch");
        let handles = partition(&self.sites, workers)
            .into_iter()
            .enumerate()
            .map(|(worker, group)| {
                let ctx = WorkerContext {
                    worker,
                    source: Arc::clone(&self.source),
                    window: Arc::clone(&self.window),
                    report: Arc::clone(&self.report),
                    columns: Arc::clone(&columns),
                    keep_series: self.config.keep_series,
                    tx: tx.clone(),
                };
                tokio::spawn(run_worker(ctx, group))
            })
            .collect();
        drop(tx);

        self.progress.send_modify(|p| p.state = BatchState::Running);

        BatchHandle {
            workers: handles,
            rx,
            sites: self.sites,
            columns,
            progress: self.progress,
            poll_interval: self.config.poll_interval,
            started: Instant::now(),
        }
    }
}

/// A running batch.
pub struct BatchHandle {
    workers: Vec<JoinHandle<()>>,
    rx: mpsc::UnboundedReceiver<SiteResult>,
    sites: Vec<Site>,
    columns: Arc<[String]>,
    progress: watch::Sender<Progress>,
    poll_interval: Duration,
    started: Instant,
}

impl BatchHandle {
    pub fn progress(&self) -> watch::Receiver<Progress> {
        self.progress.subscribe()
    }

    /// Run the progress monitor until every site has a row.
    pub async fn wait(self) -> BatchReport {
        monitor::run(self).await
    }
}

struct WorkerContext<S> {
    worker: usize,
    source: Arc<S>,
    window: Arc<MetricWindow>,
    report: Arc<ReportConfig>,
    columns: Arc<[String]>,
    keep_series: bool,
    tx: mpsc::UnboundedSender<SiteResult>,
}

async fn run_worker<S: MetricSource>(ctx: WorkerContext<S>, group: Vec<(usize, Site)>) {
    debug!(worker = ctx.worker, sites = group.len(), "worker started");
    for (index, site) in group {
        let started = Instant::now();
        let outcome =
            collect_site(ctx.source.as_ref(), index, &site, &ctx.window, &ctx.report).await;
        let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        let result = match outcome {
            Ok((row, raw)) => {
                info!(worker = ctx.worker, index, site = %site.name, elapsed_ms, "site collected");
                SiteResult {
                    row,
                    series: if ctx.keep_series { raw.series() } else { Vec::new() },
                }
            }
            Err(e) => {
                warn!(
                    worker = ctx.worker,
                    index,
                    site = %site.name,
                    elapsed_ms,
                    error = %e,
                    "site failed, recording empty row"
                );
                SiteResult {
                    row: ReportRow::failed(index, site, &ctx.columns, e.to_string()),
                    series: Vec::new(),
                }
            }
        };

        if ctx.tx.send(result).is_err() {
            debug!(worker = ctx.worker, "result channel closed, stopping");
            return;
        }
    }
    debug!(worker = ctx.worker, "worker finished");
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sizes<T>(groups: &[Vec<T>]) -> Vec<usize> {
        groups.iter().map(Vec::len).collect()
    }

    #[test]
    fn partition_is_contiguous_and_balanced() {
        let items: Vec<u32> = (0..10).collect();
        let groups = partition(&items, 4);
        assert_eq!(sizes(&groups), vec![3, 3, 2, 2]);
        let flat: Vec<usize> = groups.iter().flatten().map(|(i, _)| *i).collect();
        assert_eq!(flat, (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn partition_caps_groups_at_item_count() {
        let groups = partition(&["a", "b"], 4);
        assert_eq!(sizes(&groups), vec![1, 1]);
        assert!(partition::<u8>(&[], 4).is_empty());
    }

    #[test]
    fn worker_count_is_capped_by_sites() {
        assert_eq!(worker_count(4, 10), 4);
        assert_eq!(worker_count(4, 3), 3);
        assert_eq!(worker_count(0, 3), 1);
        assert_eq!(worker_count(4, 0), 0);
    }

    #[test]
    fn progress_fraction() {
        let p = Progress {
            completed: 3,
            failed: 1,
            total: 4,
            state: BatchState::Running,
        };
        assert!((p.fraction() - 0.75).abs() < f64::EPSILON);
        assert_eq!(BatchState::Draining.to_string(), "draining");
    }
}
