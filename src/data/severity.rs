//! Severity classification for metric values.
//!
//! Maps a raw value (or a value/limit ratio) and a pair of thresholds to a
//! [`SeverityBand`]. Bands are half-open intervals:
//!
//! ```text
//!   [0, warning)      -> Ok
//!   [warning, error)  -> Warning
//!   [error, inf)      -> Critical
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Severity band for a metric value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SeverityBand {
    Ok,
    Warning,
    Critical,
}

/// A ratio was requested against a zero denominator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("division by zero in ratio classification")]
pub struct DivisionByZero;

/// Warning and error thresholds for a single metric.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdPair {
    pub warning: f64,
    pub error: f64,
}

impl ThresholdPair {
    pub const fn new(warning: f64, error: f64) -> Self {
        Self { warning, error }
    }

    /// Classify a raw value against this pair.
    pub fn classify(&self, value: f64) -> SeverityBand {
        classify(value, self.warning, self.error)
    }

    /// Classify `numerator / denominator` as a percentage, falling back to
    /// [`SeverityBand::Ok`] when the denominator is zero.
    pub fn classify_ratio_or_ok(&self, numerator: f64, denominator: f64) -> SeverityBand {
        classify_ratio(numerator, denominator, self.warning, self.error)
            .unwrap_or(SeverityBand::Ok)
    }
}

/// Thresholds for every colorized metric on the dashboard.
///
/// Resource pairs (disk, memory, process, socket) are percentages of the
/// node's limit. Message pairs are raw message counts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    pub disk: ThresholdPair,
    pub memory: ThresholdPair,
    pub process: ThresholdPair,
    pub socket: ThresholdPair,
    pub messages_total: ThresholdPair,
    pub messages_ready: ThresholdPair,
    pub messages_unacked: ThresholdPair,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            disk: ThresholdPair::new(75.0, 95.0),
            memory: ThresholdPair::new(75.0, 95.0),
            process: ThresholdPair::new(75.0, 95.0),
            socket: ThresholdPair::new(75.0, 95.0),
            messages_total: ThresholdPair::new(75.0, 95.0),
            messages_ready: ThresholdPair::new(10.0, 15.0),
            messages_unacked: ThresholdPair::new(10.0, 15.0),
        }
    }
}

impl Thresholds {
    /// Every pair with its config key, in display order.
    pub fn pairs(&self) -> [(&'static str, ThresholdPair); 7] {
        [
            ("disk", self.disk),
            ("memory", self.memory),
            ("process", self.process),
            ("socket", self.socket),
            ("messages_total", self.messages_total),
            ("messages_ready", self.messages_ready),
            ("messages_unacked", self.messages_unacked),
        ]
    }
}

/// Classify a raw value.
pub fn classify(value: f64, threshold_warning: f64, threshold_error: f64) -> SeverityBand {
    if value >= threshold_error {
        SeverityBand::Critical
    } else if value >= threshold_warning {
        SeverityBand::Warning
    } else {
        SeverityBand::Ok
    }
}

/// Classify `100 * numerator / denominator`.
///
/// Returns [`DivisionByZero`] when `denominator == 0`; callers substitute a
/// band rather than propagate.
pub fn classify_ratio(
    numerator: f64,
    denominator: f64,
    threshold_warning: f64,
    threshold_error: f64,
) -> Result<SeverityBand, DivisionByZero> {
    if denominator == 0.0 {
        return Err(DivisionByZero);
    }
    let percent = 100.0 * numerator / denominator;
    Ok(classify(percent, threshold_warning, threshold_error))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_bands_are_half_open() {
        assert_eq!(classify(74.999, 75.0, 95.0), SeverityBand::Ok);
        assert_eq!(classify(75.0, 75.0, 95.0), SeverityBand::Warning);
        assert_eq!(classify(94.999, 75.0, 95.0), SeverityBand::Warning);
        assert_eq!(classify(95.0, 75.0, 95.0), SeverityBand::Critical);
    }

    #[test]
    fn test_value_at_error_threshold_is_critical_only() {
        // Exactly at the error threshold must not fall into the warning band.
        assert_eq!(classify(15.0, 10.0, 15.0), SeverityBand::Critical);
    }

    #[test]
    fn test_ratio_memory_at_eighty_percent_is_warning() {
        assert_eq!(classify_ratio(80.0, 100.0, 75.0, 95.0), Ok(SeverityBand::Warning));
    }

    #[test]
    fn test_ratio_zero_denominator() {
        assert_eq!(classify_ratio(10.0, 0.0, 75.0, 95.0), Err(DivisionByZero));
        let pair = ThresholdPair::new(75.0, 95.0);
        assert_eq!(pair.classify_ratio_or_ok(10.0, 0.0), SeverityBand::Ok);
    }

    #[test]
    fn test_default_thresholds() {
        let t = Thresholds::default();
        assert_eq!(t.memory, ThresholdPair::new(75.0, 95.0));
        assert_eq!(t.messages_ready, ThresholdPair::new(10.0, 15.0));
        assert_eq!(t.messages_unacked, ThresholdPair::new(10.0, 15.0));
    }

    #[test]
    fn test_severity_ordering() {
        assert!(SeverityBand::Ok < SeverityBand::Warning);
        assert!(SeverityBand::Warning < SeverityBand::Critical);
    }

    proptest! {
        #[test]
        fn prop_ratio_is_monotonic(
            limit in 1u32..1_000_000,
            a in 0u32..2_000_000,
            b in 0u32..2_000_000,
            warn in 0u32..100,
            span in 1u32..100,
        ) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            let warn = f64::from(warn);
            let err = warn + f64::from(span);
            let limit = f64::from(limit);
            let low = classify_ratio(f64::from(lo), limit, warn, err).unwrap();
            let high = classify_ratio(f64::from(hi), limit, warn, err).unwrap();
            prop_assert!(low <= high);
        }

        #[test]
        fn prop_bands_partition_without_overlap(
            value in 0.0f64..1_000.0,
            warn in 0.0f64..500.0,
            span in 0.001f64..500.0,
        ) {
            let err = warn + span;
            let band = classify(value, warn, err);
            let in_ok = value < warn;
            let in_warning = value >= warn && value < err;
            let in_critical = value >= err;
            // Exactly one interval holds the value, and it matches the band.
            prop_assert_eq!(u8::from(in_ok) + u8::from(in_warning) + u8::from(in_critical), 1);
            match band {
                SeverityBand::Ok => prop_assert!(in_ok),
                SeverityBand::Warning => prop_assert!(in_warning),
                SeverityBand::Critical => prop_assert!(in_critical),
            }
        }

        #[test]
        fn prop_zero_denominator_never_panics(value in any::<f64>(), warn in 0.0f64..100.0) {
            let pair = ThresholdPair::new(warn, warn + 1.0);
            prop_assert_eq!(pair.classify_ratio_or_ok(value, 0.0), SeverityBand::Ok);
        }
    }
}
