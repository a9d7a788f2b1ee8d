//! Observability module
//!
//! Logging, metrics, and the structured session event log.

pub mod events;
pub mod logging;
pub mod metrics;

pub use events::{EventLog, StampedEvents};
pub use logging::{LogFormat, init_logging};
pub use metrics::init_metrics;
