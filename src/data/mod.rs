//! Data models and processing for broker snapshots.
//!
//! ## Submodules
//!
//! - [`format`]: Human-readable sizes, uptimes and rates
//! - [`severity`]: Threshold classification ([`SeverityBand`], [`Thresholds`])
//! - [`snapshot`]: Core data model ([`Snapshot`], [`NodeStats`], [`QueueStats`])
//!
//! ## Data Flow
//!
//! ```text
//! Management API (JSON)
//!        │
//!        ▼
//! SnapshotSource::fetch()
//!        │
//!        ▼
//! Snapshot ──▶ layout (severity computed per frame from Thresholds)
//! ```

pub mod format;
pub mod severity;
pub mod snapshot;

pub use severity::{
    classify, classify_ratio, DivisionByZero, SeverityBand, ThresholdPair, Thresholds,
};
pub use snapshot::{
    CountRate, DeliveryRates, MessageTotals, NodeStats, ObjectTotals, QueueStats, Snapshot, Usage,
    IDLE_STATE,
};
