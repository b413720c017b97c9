//! `metrics`: collect and reduce one element, print its row.

use std::fmt::Write as _;

use sitepulse_core::{ApiMetricSource, ReportRow, Site, collector::collect_site};

use crate::cli::{GlobalOpts, MetricsArgs};
use crate::commands::util;
use crate::config::Context;
use crate::error::CliError;
use crate::output;

pub async fn handle(args: MetricsArgs, ctx: &Context, global: &GlobalOpts) -> Result<(), CliError> {
    let window = util::window(&args.window, ctx)?;
    let report_cfg = ctx.config.report_config()?;
    let session = util::connect(ctx, global).await?;

    let site = match args.name {
        Some(name) => Site::new(args.site_id, args.element_id, name),
        None => {
            // Interface rules match on the element name
            let known = session
                .sites()
                .await?
                .into_iter()
                .find(|s| s.element_id == args.element_id && s.site_id == args.site_id);
            known.unwrap_or_else(|| {
                let name = args.site_id.clone();
                Site::new(args.site_id, args.element_id, name)
            })
        }
    };

    let source = ApiMetricSource::new(session.client().clone());
    let (row, _) = collect_site(&source, 0, &site, &window, &report_cfg).await?;

    let out = output::render_single(&global.output, &row, detail, |r| {
        r.site.element_id.clone()
    })?;
    output::print_output(&out, global.quiet);
    Ok(())
}

fn detail(row: &ReportRow) -> String {
    let mut out = format!(
        "{} (site {}, element {})\n",
        row.site.name, row.site.site_id, row.site.element_id
    );
    for (name, value) in &row.metrics {
        let _ = writeln!(out, "  {name:<34} {}", output::metric_cell(*value));
    }
    for (label, addr) in [("port 1", &row.ipv4_port1), ("port 2", &row.ipv4_port2)] {
        if let Some(addr) = addr {
            let _ = writeln!(out, "  {label:<34} {addr}");
        }
    }
    out.trim_end().to_owned()
}
