//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! rpc, exchange, api
//!     → logging.rs (tracing events with txid/method fields)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → stderr (text or JSON lines)
//!     → Prometheus scrape (asset-api only, when enabled)
//! ```

pub mod logging;
pub mod metrics;
