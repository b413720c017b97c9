// sitepulse-api: Async Rust client for the Prisma SD-WAN REST APIs
//
// Covers the handful of endpoints the reporting pipeline consumes:
// OAuth token exchange, inventory listing, element interfaces, and the
// `sys_metrics` time-series query.

pub mod auth;
pub mod client;
pub mod error;
pub mod inventory;
pub mod models;
pub mod monitor;
pub mod retry;
pub mod transport;

pub use auth::{AccessToken, DEFAULT_AUTH_URL, TokenClient};
pub use client::{DEFAULT_BASE_URL, SdwanClient};
pub use error::Error;
pub use models::{
    Datapoint, ElementResponse, InterfaceResponse, Ipv4Config, MetricFilter, MetricGroup,
    MetricSpec, MetricView, Series, SeriesData, StaticIpv4Config, SysMetricsQuery,
    SysMetricsResponse,
};
pub use retry::{RetryOutcome, RetryPolicy};
pub use transport::{TlsMode, TransportConfig};
