#![allow(clippy::unwrap_used)]
// Batch scheduler and progress monitor, driven by an in-memory metric source.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use serde_json::json;

use sitepulse_core::{
    BatchConfig, BatchJob, BatchState, CoreError, MetricSource, MetricWindow, RawSiteMetrics,
    ReportConfig, Site,
};

// ── Helpers ─────────────────────────────────────────────────────────

#[derive(Clone, Copy)]
enum Fault {
    None,
    Error(usize),
    Panic(usize),
}

struct FakeSource {
    fault: Fault,
    calls: AtomicUsize,
}

impl FakeSource {
    fn new(fault: Fault) -> Arc<Self> {
        Arc::new(Self {
            fault,
            calls: AtomicUsize::new(0),
        })
    }
}

fn site_number(site: &Site) -> usize {
    site.site_id.trim_start_matches("site-").parse().unwrap()
}

impl MetricSource for FakeSource {
    async fn fetch(
        &self,
        site: &Site,
        _window: &MetricWindow,
        _report: &ReportConfig,
    ) -> Result<RawSiteMetrics, CoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let n = site_number(site);
        tokio::time::sleep(Duration::from_millis(5)).await;

        match self.fault {
            Fault::Error(bad) if bad == n => {
                return Err(CoreError::Upstream {
                    status: 500,
                    endpoint: "/sdwan/monitor/v2.3/api/monitor/sys_metrics".into(),
                });
            }
            Fault::Panic(bad) if bad == n => panic!("injected worker crash"),
            _ => {}
        }

        let value = f64::from(u32::try_from(n).unwrap());
        let series = |name: &str| {
            json!({"series": [{"name": name, "unit": "percentage", "data": [{"datapoints": [
                {"time": "2024-01-01T00:00:00Z", "value": value},
                {"time": "2024-01-02T00:00:00Z", "value": value + 2.0}
            ]}]}]})
        };
        Ok(serde_json::from_value(json!({
            "metrics": [
                series("CPUUsage"),
                series("MemoryUsage"),
                series("DiskUsage"),
                series("InterfaceBandwidthUsage")
            ],
            "interfaces": []
        }))
        .unwrap())
    }
}

fn sites(n: usize) -> Vec<Site> {
    (0..n)
        .map(|i| Site::new(format!("site-{i}"), format!("elem-{i}"), format!("Branch-{i}")))
        .collect()
}

fn window() -> MetricWindow {
    let end = NaiveDate::from_ymd_opt(2024, 1, 3).unwrap();
    MetricWindow::ending_on(end, 2, "1day", end).unwrap()
}

fn config() -> BatchConfig {
    BatchConfig {
        workers: 4,
        poll_interval: Duration::from_millis(10),
        keep_series: true,
    }
}

// ── Batch tests ─────────────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_one_row_per_site_with_injected_failure() {
    let source = FakeSource::new(Fault::Error(7));
    let job = BatchJob::new(
        sites(10),
        Arc::clone(&source),
        window(),
        ReportConfig::default(),
        config(),
    );
    let progress = job.subscribe();
    assert_eq!(progress.borrow().state, BatchState::Idle);

    let report = job.start().wait().await;

    assert_eq!(report.rows.len(), 10);
    assert_eq!(report.failed(), 1);
    assert_eq!(source.calls.load(Ordering::SeqCst), 10);

    let indices: Vec<usize> = report.rows.iter().map(|r| r.index).collect();
    assert_eq!(indices, (0..10).collect::<Vec<_>>());

    let failed = &report.rows[7];
    assert!(failed.is_failure());
    assert!(failed.metrics.values().all(Option::is_none));
    assert!(!failed.metrics.is_empty());

    for row in report.rows.iter().filter(|r| r.index != 7) {
        assert!(!row.is_failure(), "row {} should succeed", row.index);
        let expected = f64::from(u32::try_from(row.index).unwrap()) + 1.0;
        assert_eq!(row.metric("CPUUsage"), Some(expected));
        assert_eq!(row.metric("MemoryUsage"), Some(expected));
    }

    let last = *progress.borrow();
    assert_eq!(last.state, BatchState::Complete);
    assert_eq!(last.completed, 10);
    assert!((last.fraction() - 1.0).abs() < f64::EPSILON);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_panicked_worker_still_yields_rows() {
    // 10 sites over 4 workers: [0,1,2] [3,4,5] [6,7] [8,9].
    // A crash on site 3 loses sites 3, 4 and 5.
    let source = FakeSource::new(Fault::Panic(3));
    let report = BatchJob::new(
        sites(10),
        source,
        window(),
        ReportConfig::default(),
        config(),
    )
    .start()
    .wait()
    .await;

    assert_eq!(report.rows.len(), 10);
    let failed: Vec<usize> = report
        .rows
        .iter()
        .filter(|r| r.is_failure())
        .map(|r| r.index)
        .collect();
    assert_eq!(failed, vec![3, 4, 5]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_series_kept_for_successful_sites() {
    let report = BatchJob::new(
        sites(3),
        FakeSource::new(Fault::None),
        window(),
        ReportConfig::default(),
        config(),
    )
    .start()
    .wait()
    .await;

    assert_eq!(report.failed(), 0);
    assert_eq!(report.series.len(), 3);
    assert_eq!(report.series[&0].len(), 4);
    assert_eq!(report.series[&0][0].name, "CPUUsage");
}

#[tokio::test]
async fn test_empty_batch_completes_immediately() {
    let job = BatchJob::new(
        Vec::new(),
        FakeSource::new(Fault::None),
        window(),
        ReportConfig::default(),
        config(),
    );
    let progress = job.subscribe();
    let report = job.start().wait().await;

    assert!(report.rows.is_empty());
    assert!(progress.borrow().is_complete());
    assert!((progress.borrow().fraction() - 1.0).abs() < f64::EPSILON);
}
