pub mod cluster;
pub mod metrics;

pub use cluster::*;
pub use metrics::*;
