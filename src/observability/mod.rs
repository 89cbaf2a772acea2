//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! receiver and http layers produce:
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (counters and histograms via the metrics facade)
//!
//! Consumers:
//!     → stdout (tracing-subscriber fmt layer)
//!     → Prometheus scrape endpoint (when enabled)
//! ```
//!
//! Every request carries an `x-request-id` that appears in its trace span.

pub mod logging;
pub mod metrics;
