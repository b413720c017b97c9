// Domain model for the collection pipeline.

mod interface;
mod metric;
mod report;
mod site;

pub use interface::Interface;
pub use metric::{MetricSeries, MetricWindow, RawSiteMetrics};
pub use report::ReportRow;
pub use site::Site;
