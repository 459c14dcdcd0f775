use serde::{Deserialize, Serialize};

use crate::aggregation::structs::{format_timestamp, Bucket, TimestampMS};
use crate::technical_analysis::structs::{PivotSide, SweepResult};
use crate::volume_profile::structs::ProfileSnapshot;

/// Thresholds of the candidate/confirmation lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SignalConfig {
    /// Minimum pivots a bucket must sweep to become a candidate
    pub min_levels_swept: usize,
    /// Imbalance must exceed mean |imbalance| times this
    pub delta_multiplier: f64,
    /// Volume must exceed mean volume times this
    pub volume_multiplier: f64,
    /// Buckets a candidate may wait before it is dropped
    pub max_confirmation_buckets: u32,
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            min_levels_swept: 2,
            delta_multiplier: 1.5,
            volume_multiplier: 2.0,
            max_confirmation_buckets: 2,
        }
    }
}

/// Which side's liquidity was swept
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignalDirection {
    /// Bucket high ran through resting high pivots
    UpperSweep,
    /// Bucket low ran through resting low pivots
    LowerSweep,
}

impl SignalDirection {
    /// Pivot pool consumed by this direction
    pub fn pivot_side(&self) -> PivotSide {
        match self {
            SignalDirection::UpperSweep => PivotSide::High,
            SignalDirection::LowerSweep => PivotSide::Low,
        }
    }
}

impl std::fmt::Display for SignalDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SignalDirection::UpperSweep => write!(f, "Upper Sweep"),
            SignalDirection::LowerSweep => write!(f, "Lower Sweep"),
        }
    }
}

/// Lifecycle state of the detector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignalState {
    Idle,
    PendingUpper,
    PendingLower,
}

impl std::fmt::Display for SignalState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SignalState::Idle => write!(f, "IDLE"),
            SignalState::PendingUpper => write!(f, "PENDING_UPPER"),
            SignalState::PendingLower => write!(f, "PENDING_LOWER"),
        }
    }
}

/// Why a pending candidate was dropped without a signal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CancelReason {
    /// A later bucket pushed beyond the sweep extreme
    SweepExtended,
    /// Confirmation window elapsed
    Timeout,
}

impl std::fmt::Display for CancelReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CancelReason::SweepExtended => write!(f, "sweep extended"),
            CancelReason::Timeout => write!(f, "confirmation timeout"),
        }
    }
}

/// Sweep hypothesis awaiting confirmation by the following bucket(s)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingCandidate {
    pub direction: SignalDirection,
    pub anchor_bucket: Bucket,
    pub anchor_snapshot: ProfileSnapshot,
    pub swept: SweepResult,
    /// Bucket high (upper) or low (lower) that ran the pivots
    pub sweep_price: f64,
    /// Buckets evaluated since candidacy
    pub buckets_observed: u32,
    /// Rolling means as of the anchor bucket
    pub anchor_mean_volume: f64,
    pub anchor_mean_abs_imbalance: f64,
}

/// Outcome of a confirmation pass
#[derive(Debug, Clone, PartialEq)]
pub enum ConfirmationOutcome {
    /// Nothing was pending
    NoCandidate,
    Confirmed(Box<AbsorptionSignal>),
    Cancelled {
        direction: SignalDirection,
        reason: CancelReason,
    },
}

/// Fully evidenced absorption signal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AbsorptionSignal {
    pub direction: SignalDirection,
    /// Swept pivot prices, ascending
    pub swept_prices: Vec<f64>,
    pub swept_count: usize,
    /// Highest swept pivot price
    pub swing_level: f64,
    pub sweep_price: f64,
    pub signed_imbalance: f64,
    pub total_volume: f64,
    /// Rolling mean volume as of the anchor bucket, not the confirming one
    pub anchor_mean_volume: f64,
    /// Rolling mean |imbalance| as of the anchor bucket
    pub anchor_mean_abs_imbalance: f64,
    /// total_volume / anchor_mean_volume
    pub volume_ratio: f64,
    /// |signed_imbalance| / anchor_mean_abs_imbalance
    pub imbalance_ratio: f64,
    pub poc_price: f64,
    pub anchor_close: f64,
    /// Close time of the bucket that confirmed the candidate
    pub confirmed_at: TimestampMS,
    pub anchor_bucket: Bucket,
    pub anchor_snapshot: ProfileSnapshot,
}

impl AbsorptionSignal {
    /// Build the payload from a candidate confirmed by `confirming`
    pub fn from_candidate(candidate: PendingCandidate, confirming: &Bucket) -> Self {
        let snapshot = &candidate.anchor_snapshot;
        let volume_ratio = ratio(snapshot.total_volume, candidate.anchor_mean_volume);
        let imbalance_ratio = ratio(snapshot.signed_imbalance.abs(), candidate.anchor_mean_abs_imbalance);

        Self {
            direction: candidate.direction,
            swept_prices: candidate.swept.sorted_prices(),
            swept_count: candidate.swept.count,
            swing_level: candidate.swept.max_price.unwrap_or(candidate.sweep_price),
            sweep_price: candidate.sweep_price,
            signed_imbalance: snapshot.signed_imbalance,
            total_volume: snapshot.total_volume,
            anchor_mean_volume: candidate.anchor_mean_volume,
            anchor_mean_abs_imbalance: candidate.anchor_mean_abs_imbalance,
            volume_ratio,
            imbalance_ratio,
            poc_price: snapshot.poc_price,
            anchor_close: candidate.anchor_bucket.close,
            confirmed_at: confirming.close_time,
            anchor_bucket: candidate.anchor_bucket,
            anchor_snapshot: candidate.anchor_snapshot,
        }
    }
}

fn ratio(value: f64, baseline: f64) -> f64 {
    if baseline > 0.0 {
        value / baseline
    } else {
        0.0
    }
}

impl std::fmt::Display for AbsorptionSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let levels: Vec<String> = self.swept_prices.iter().map(|p| format!("{:.2}", p)).collect();
        write!(
            f,
            "{} absorption at {}: swept {} level(s) [{}], swing {:.2}, extreme {:.2}, \
             delta {:+.2} ({:.1}x), volume {:.2} ({:.1}x), POC {:.2}, close {:.2}",
            self.direction,
            format_timestamp(self.anchor_bucket.open_time),
            self.swept_count,
            levels.join(", "),
            self.swing_level,
            self.sweep_price,
            self.signed_imbalance,
            self.imbalance_ratio,
            self.total_volume,
            self.volume_ratio,
            self.poc_price,
            self.anchor_close,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::technical_analysis::structs::Pivot;

    fn anchor() -> (Bucket, ProfileSnapshot) {
        let bucket = Bucket {
            open_time: 0,
            close_time: 59_999,
            open: 104.0,
            high: 105.0,
            low: 103.5,
            close: 103.8,
            volume: 40.0,
            closed: true,
        };
        let snapshot = ProfileSnapshot {
            clusters: Vec::new(),
            poc_price: 104.5,
            poc_volume: 20.0,
            total_buy_volume: 30.0,
            total_sell_volume: 10.0,
            total_volume: 40.0,
            signed_imbalance: 20.0,
            trade_count: 12,
        };
        (bucket, snapshot)
    }

    #[test]
    fn test_signal_from_candidate() {
        let (bucket, snapshot) = anchor();
        let swept = SweepResult::from_pivots(vec![
            Pivot { price: 104.6, timestamp: 1, index: 0 },
            Pivot { price: 104.2, timestamp: 2, index: 1 },
        ]);
        let candidate = PendingCandidate {
            direction: SignalDirection::UpperSweep,
            anchor_bucket: bucket,
            anchor_snapshot: snapshot,
            swept,
            sweep_price: 105.0,
            buckets_observed: 1,
            anchor_mean_volume: 10.0,
            anchor_mean_abs_imbalance: 5.0,
        };
        let confirming = Bucket {
            open_time: 60_000,
            close_time: 119_999,
            open: 103.8,
            high: 104.9,
            low: 103.0,
            close: 103.2,
            volume: 8.0,
            closed: true,
        };

        let signal = AbsorptionSignal::from_candidate(candidate, &confirming);
        assert_eq!(signal.swept_prices, vec![104.2, 104.6]);
        assert_eq!(signal.swing_level, 104.6);
        assert_eq!(signal.volume_ratio, 4.0);
        assert_eq!(signal.imbalance_ratio, 4.0);
        assert_eq!(signal.anchor_close, 103.8);
        assert_eq!(signal.confirmed_at, 119_999);

        let text = signal.to_string();
        assert!(text.starts_with("Upper Sweep absorption at 1970-01-01 00:00:00 UTC"));
        assert!(text.contains("[104.20, 104.60]"));
    }

    #[test]
    fn test_zero_baseline_ratio() {
        assert_eq!(ratio(5.0, 0.0), 0.0);
        assert_eq!(ratio(5.0, 2.5), 2.0);
    }
}
