//! `report`: the bulk run over every element in the tenant.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use indicatif::{ProgressBar, ProgressStyle};
use regex::Regex;
use tokio::sync::watch;
use tracing::{info, warn};

use sitepulse_core::{ApiMetricSource, BatchConfig, BatchJob, BatchReport, Progress, Site};

use crate::cli::{GlobalOpts, ReportArgs};
use crate::commands::util;
use crate::config::Context;
use crate::error::CliError;
use crate::output;
use crate::report::{self, CsvWriter, SpreadsheetWriter, Table, chart};

pub async fn handle(args: ReportArgs, mut ctx: Context, global: &GlobalOpts) -> Result<(), CliError> {
    let window = util::window(&args.window, &ctx)?;
    let report_cfg = ctx.config.report_config()?;
    let columns = report_cfg.columns();
    let plots = args.plots || ctx.config.ui.defaults.generate_plots;
    let workers = args.workers.unwrap_or(ctx.config.report.workers);
    if workers == 0 {
        return Err(CliError::Validation {
            field: "workers".into(),
            reason: "must be at least 1".into(),
        });
    }
    let site_filter = args
        .site_filter
        .as_deref()
        .map(Regex::new)
        .transpose()
        .map_err(|e| CliError::Validation {
            field: "site-filter".into(),
            reason: e.to_string(),
        })?;

    let session = util::connect(&ctx, global).await?;
    let sites = select_sites(session.sites().await?, site_filter.as_ref());
    info!(
        sites = sites.len(),
        workers,
        start = %window.start_time(),
        end = %window.end_time(),
        "collecting metrics"
    );

    let source = Arc::new(ApiMetricSource::new(session.client().clone()));
    let job = BatchJob::new(
        sites,
        source,
        window,
        report_cfg,
        BatchConfig {
            workers,
            keep_series: plots,
            ..BatchConfig::default()
        },
    );
    let bar = tokio::spawn(show_progress(job.subscribe(), global.quiet));
    let batch = job.start().wait().await;
    if let Err(e) = bar.await {
        warn!(error = %e, "progress display stopped");
    }

    // ── Export ──
    let dir = util::export_dir(&args.export, &ctx);
    let csv_path = dir.join(util::export_name(report::REPORT_FILE, &args.export));
    CsvWriter.write_table(&csv_path, &Table::from_report(&columns, &batch.rows))?;

    let charts = if plots {
        render_charts(dir.clone(), &batch).await
    } else {
        0
    };
    util::remember_export_dir(&mut ctx, &dir);

    print_summary(&batch, &csv_path, charts, global);
    Ok(())
}

/// Keep sites whose name matches `filter`, if any.
fn select_sites(sites: Vec<Site>, filter: Option<&Regex>) -> Vec<Site> {
    match filter {
        Some(re) => sites.into_iter().filter(|s| re.is_match(&s.name)).collect(),
        None => sites,
    }
}

async fn show_progress(mut rx: watch::Receiver<Progress>, quiet: bool) {
    let total = u64::try_from(rx.borrow().total).unwrap_or(u64::MAX);
    let bar = if quiet {
        ProgressBar::hidden()
    } else {
        ProgressBar::new(total)
    };
    if let Ok(style) =
        ProgressStyle::with_template("{spinner} [{elapsed_precise}] {bar:40} {pos}/{len} {percent}% {msg}")
    {
        bar.set_style(style);
    }

    while rx.changed().await.is_ok() {
        let p = *rx.borrow_and_update();
        bar.set_position(u64::try_from(p.completed).unwrap_or(u64::MAX));
        bar.set_message(format!("{} failed, {}", p.failed, p.state));
        if p.is_complete() {
            break;
        }
    }
    bar.finish_and_clear();
}

/// Render charts for every site that kept its series. Returns the number written.
async fn render_charts(dir: PathBuf, batch: &BatchReport) -> usize {
    let jobs: Vec<(String, Vec<_>)> = batch
        .rows
        .iter()
        .filter_map(|row| {
            let series = batch.series.get(&row.index)?;
            Some((row.site.name.clone(), series.clone()))
        })
        .collect();

    let rendered = tokio::task::spawn_blocking(move || {
        jobs.iter()
            .map(|(site, series)| chart::render_site(&dir, site, series).len())
            .sum::<usize>()
    })
    .await;

    rendered.unwrap_or_else(|e| {
        warn!(error = %e, "chart rendering aborted");
        0
    })
}

fn print_summary(batch: &BatchReport, csv_path: &Path, charts: usize, global: &GlobalOpts) {
    if global.quiet {
        return;
    }
    let color = output::should_color(&global.color);
    let failed = batch.failed();
    let total = batch.rows.len();
    let elapsed = humantime::format_duration(std::time::Duration::from_secs(batch.elapsed.as_secs()));

    eprintln!(
        "{} {} sites in {elapsed}",
        output::ok("✓", color),
        total - failed
    );
    if failed > 0 {
        eprintln!("{} {failed} sites failed (empty metric columns)", output::bad("✗", color));
        for row in batch.rows.iter().filter(|r| r.is_failure()) {
            eprintln!(
                "    #{} {}: {}",
                row.index,
                row.site.name,
                row.error.as_deref().unwrap_or_default()
            );
        }
    }
    eprintln!("  Report: {}", csv_path.display());
    if charts > 0 {
        eprintln!("  Charts: {charts}");
    }
}
