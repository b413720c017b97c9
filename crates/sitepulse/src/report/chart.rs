//! Per-site line charts.
//!
//! One PNG per metric series at `<out>/<site>/<metric>.png`, with the
//! highest and lowest samples marked. A chart that fails to render is
//! logged and skipped.

use std::path::{Path, PathBuf};

use plotters::prelude::*;
use tracing::{debug, warn};

use sitepulse_core::MetricSeries;

use crate::error::CliError;

const SIZE: (u32, u32) = (900, 300);

/// Render every series of one site. Returns the files written.
pub fn render_site(out: &Path, site_name: &str, series: &[MetricSeries]) -> Vec<PathBuf> {
    let dir = out.join(file_safe(site_name));
    series
        .iter()
        .filter_map(|s| {
            let path = dir.join(format!("{}.png", file_safe(&s.name)));
            match render_series(&path, site_name, s) {
                Ok(true) => Some(path),
                Ok(false) => {
                    debug!(site = site_name, metric = %s.name, "no samples, chart skipped");
                    None
                }
                Err(e) => {
                    warn!(site = site_name, metric = %s.name, error = %e, "chart failed");
                    None
                }
            }
        })
        .collect()
}

/// Draw `series` to `path`. `Ok(false)` when there is nothing to plot.
pub fn render_series(path: &Path, site_name: &str, series: &MetricSeries) -> Result<bool, CliError> {
    let samples: Vec<_> = series.values().collect();
    let Some(extremes) = Extremes::of(samples.iter().map(|(_, v)| *v)) else {
        return Ok(false);
    };

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let labels: Vec<String> = samples
        .iter()
        .map(|(t, _)| t.format("%Y-%m-%d").to_string())
        .collect();
    let values: Vec<f64> = samples.iter().map(|(_, v)| *v).collect();
    let (y_min, y_max) = extremes.y_range();
    let x_max = values.len().max(2) - 1;
    let unit = series.unit.as_deref().unwrap_or("value");

    let root = BitMapBackend::new(path, SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(chart_err)?;
    let mut chart = ChartBuilder::on(&root)
        .caption(format!("{site_name} - {}", series.name), ("sans-serif", 22))
        .margin(12)
        .x_label_area_size(30)
        .y_label_area_size(60)
        .build_cartesian_2d(0..x_max, y_min..y_max)
        .map_err(chart_err)?;
    chart
        .configure_mesh()
        .x_labels(8)
        .x_label_formatter(&|idx| labels.get(*idx).cloned().unwrap_or_default())
        .x_desc("Date")
        .y_desc(unit)
        .draw()
        .map_err(chart_err)?;
    chart
        .draw_series(LineSeries::new(
            values.iter().enumerate().map(|(i, v)| (i, *v)),
            &BLUE,
        ))
        .map_err(chart_err)?;

    for (idx, value, label, color) in [
        (extremes.max_at, extremes.max, "max", RED),
        (extremes.min_at, extremes.min, "min", GREEN),
    ] {
        chart
            .draw_series(std::iter::once(Circle::new((idx, value), 4, color.filled())))
            .map_err(chart_err)?;
        chart
            .draw_series(std::iter::once(Text::new(
                format!("{label} {value:.2}"),
                (idx, value),
                ("sans-serif", 14).into_font(),
            )))
            .map_err(chart_err)?;
    }

    root.present().map_err(chart_err)?;
    Ok(true)
}

fn chart_err(e: impl std::fmt::Debug) -> CliError {
    CliError::Internal(format!("chart rendering failed: {e:?}"))
}

/// Replace characters that are not safe in a file name.
fn file_safe(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    let trimmed = cleaned.trim().trim_matches('.');
    if trimmed.is_empty() {
        "unnamed".into()
    } else {
        trimmed.into()
    }
}

/// Highest and lowest samples, first occurrence wins.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Extremes {
    min: f64,
    min_at: usize,
    max: f64,
    max_at: usize,
}

impl Extremes {
    fn of(values: impl Iterator<Item = f64>) -> Option<Self> {
        values.enumerate().fold(None, |acc, (i, v)| {
            Some(match acc {
                None => Self {
                    min: v,
                    min_at: i,
                    max: v,
                    max_at: i,
                },
                Some(mut e) => {
                    if v < e.min {
                        e.min = v;
                        e.min_at = i;
                    }
                    if v > e.max {
                        e.max = v;
                        e.max_at = i;
                    }
                    e
                }
            })
        })
    }

    /// Axis range with some headroom; a flat line gets a unit band.
    fn y_range(&self) -> (f64, f64) {
        let span = self.max - self.min;
        if span.abs() < f64::EPSILON {
            (self.min - 1.0, self.max + 1.0)
        } else {
            let pad = span * 0.1;
            (self.min - pad, self.max + pad)
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn extremes_track_first_occurrence() {
        let e = Extremes::of([3.0, 9.0, 1.0, 9.0, 1.0].into_iter()).unwrap();
        assert_eq!((e.max, e.max_at), (9.0, 1));
        assert_eq!((e.min, e.min_at), (1.0, 2));
        assert!(Extremes::of(std::iter::empty()).is_none());
    }

    #[test]
    fn flat_series_gets_a_band() {
        let e = Extremes::of([5.0, 5.0].into_iter()).unwrap();
        assert_eq!(e.y_range(), (4.0, 6.0));
    }

    #[test]
    fn file_names_are_sanitized() {
        assert_eq!(file_safe("DC/1: main"), "DC_1_ main");
        assert_eq!(file_safe(" .. "), "unnamed");
        assert_eq!(file_safe("Branch-7"), "Branch-7");
    }

    #[test]
    fn series_without_samples_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let series = MetricSeries {
            name: "CPUUsage".into(),
            unit: Some("percentage".into()),
            points: Vec::new(),
        };
        let written = render_site(dir.path(), "DC-1", &[series]);
        assert!(written.is_empty());
        assert!(!dir.path().join("DC-1").exists());
    }
}
