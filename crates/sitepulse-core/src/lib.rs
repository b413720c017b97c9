//! Metric collection pipeline between `sitepulse-api` and the CLI.
//!
//! - **[`Session`]** authenticates once and hands out an API client shared
//!   by every worker.
//! - **[`InterfaceFilter`]** picks the interfaces whose bandwidth is queried,
//!   from an ordered site-name → interface-name rule table.
//! - **[`MetricSource`]** is the seam the scheduler pulls raw metrics
//!   through; [`ApiMetricSource`] is the HTTP-backed implementation.
//! - **[`reduce`]** flattens one site's raw response into a [`ReportRow`].
//! - **[`BatchJob`]** partitions the site list across worker tasks and
//!   drives the progress monitor until every site has a row.

pub mod batch;
pub mod collector;
pub mod config;
pub mod error;
pub mod filter;
pub mod model;
pub mod reduce;
pub mod session;

// ── Primary re-exports ──────────────────────────────────────────────
pub use batch::{BatchConfig, BatchHandle, BatchJob, BatchReport, BatchState, Progress};
pub use collector::{ApiMetricSource, MetricSource};
pub use config::{ApiConfig, Credentials, ReportConfig};
pub use error::{CoreError, ReduceError};
pub use filter::{InterfaceFilter, InterfaceRule};
pub use model::{Interface, MetricSeries, MetricWindow, RawSiteMetrics, ReportRow, Site};
pub use session::Session;

// API types that appear in the pipeline configuration.
pub use sitepulse_api::{DEFAULT_AUTH_URL, DEFAULT_BASE_URL, MetricSpec, RetryPolicy, TlsMode};
