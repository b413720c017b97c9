use chrono::{DateTime, Days, NaiveDate, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use sitepulse_api::{Datapoint, InterfaceResponse, MetricGroup, Series};

use crate::error::CoreError;

/// Longest window the monitoring API accepts.
pub const MAX_WINDOW_DAYS: u32 = 90;

/// One named time series, kept after reduction only for charting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSeries {
    pub name: String,
    pub unit: Option<String>,
    pub points: Vec<Datapoint>,
}

impl MetricSeries {
    /// Take the first data block of `series`. `None` if it has none.
    pub fn from_series(series: &Series) -> Option<Self> {
        let data = series.data.first()?;
        Some(Self {
            name: series.name.clone(),
            unit: series.unit.clone(),
            points: data.datapoints.clone(),
        })
    }

    /// Points with a value, in time order as received.
    pub fn values(&self) -> impl Iterator<Item = (DateTime<Utc>, f64)> + '_ {
        self.points.iter().filter_map(|p| p.value.map(|v| (p.time, v)))
    }
}

/// Everything the metric client returned for one site.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawSiteMetrics {
    pub metrics: Vec<MetricGroup>,
    pub interfaces: Vec<InterfaceResponse>,
}

impl RawSiteMetrics {
    /// Every chartable series, first series of each group.
    pub fn series(&self) -> Vec<MetricSeries> {
        self.metrics
            .iter()
            .filter_map(|g| g.series.first())
            .filter_map(MetricSeries::from_series)
            .collect()
    }
}

/// Query window `[start, end)` at a sampling interval.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub interval: String,
}

impl MetricWindow {
    /// The `days` whole days ending at midnight UTC on `end_date`.
    ///
    /// `days` must be in `1..=90` and `end_date` may not be after `today`.
    pub fn ending_on(
        end_date: NaiveDate,
        days: u32,
        interval: impl Into<String>,
        today: NaiveDate,
    ) -> Result<Self, CoreError> {
        if !(1..=MAX_WINDOW_DAYS).contains(&days) {
            return Err(CoreError::ValidationFailed {
                message: format!("duration must be between 1 and {MAX_WINDOW_DAYS} days, got {days}"),
            });
        }
        if end_date > today {
            return Err(CoreError::ValidationFailed {
                message: format!("end date {end_date} is in the future"),
            });
        }
        let end = end_date.and_time(chrono::NaiveTime::MIN).and_utc();
        let start = end
            .checked_sub_days(Days::new(u64::from(days)))
            .ok_or_else(|| CoreError::ValidationFailed {
                message: format!("window of {days} days before {end_date} is out of range"),
            })?;
        Ok(Self {
            start,
            end,
            interval: interval.into(),
        })
    }

    /// `start` as sent on the wire: `2024-01-01T00:00:00.000Z`.
    pub fn start_time(&self) -> String {
        self.start.to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    pub fn end_time(&self) -> String {
        self.end.to_rfc3339_opts(SecondsFormat::Millis, true)
    }
}
